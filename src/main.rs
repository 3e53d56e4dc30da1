use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scheduling_backend::app_state::AppState;
use scheduling_backend::db::repositories::{MemoryStore, PgStore, SchedulingStore};
use scheduling_backend::email::{LogMailer, Mailer, SmtpMailer};
use scheduling_backend::events::EventBus;
use scheduling_backend::modules::scheduling::verification::VerificationGate;
use scheduling_backend::{app, config, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=debug", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenv().ok();

    let env = config::init().context("Failed to load configuration")?.clone();

    let store: Arc<dyn SchedulingStore> = match env.database.url.as_deref() {
        Some(url) => {
            let pool = db::init_pool(url)
                .await
                .context("Failed to initialize database")?;
            Arc::new(PgStore::new(pool))
        }
        None => {
            if env.is_production() {
                warn!("DATABASE_URL not set in production; bookings will not survive restarts");
            } else {
                warn!("DATABASE_URL not set, falling back to the in-memory store");
            }
            Arc::new(MemoryStore::new())
        }
    };

    let mailer: Arc<dyn Mailer> = match &env.smtp {
        Some(smtp) => Arc::new(SmtpMailer::new(smtp).context("Failed to configure SMTP mailer")?),
        None => {
            warn!("SMTP not configured, verification codes will only be logged");
            Arc::new(LogMailer)
        }
    };

    let events = EventBus::new(64);
    let verification = Arc::new(VerificationGate::new(
        mailer,
        env.scheduling.verification_ttl(),
    ));
    let state = AppState::new(store, env.clone(), events, verification);

    let app = app::create_router(state);

    let addr = env.server_addr();
    info!("{} listening on {}", env.app.name, addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .await
        .context("Failed to serve application")?;

    Ok(())
}
