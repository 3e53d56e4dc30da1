use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use rand::Rng;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::info;

use crate::db::models::VerificationChallenge;
use crate::email::Mailer;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerificationError {
    #[error("No verification in progress for this email")]
    NotFound,

    #[error("Verification code expired")]
    Expired,

    #[error("Verification code does not match")]
    Mismatch,

    #[error("Verification code already used")]
    AlreadyConsumed,
}

/// Issues and checks the short-lived email codes that gate the booking
/// write. The challenge table is a mutex-guarded map keyed by email, so
/// check-then-consume is atomic per address: two concurrent attempts on
/// the same code cannot both pass.
pub struct VerificationGate {
    mailer: Arc<dyn Mailer>,
    ttl: Duration,
    challenges: Mutex<HashMap<String, VerificationChallenge>>,
}

impl VerificationGate {
    pub fn new(mailer: Arc<dyn Mailer>, ttl: Duration) -> Self {
        Self {
            mailer,
            ttl,
            challenges: Mutex::new(HashMap::new()),
        }
    }

    /// Issues a fresh code and hands it to the mail collaborator. Any
    /// previous challenge for the email is overwritten, so only the
    /// latest code is ever valid.
    pub async fn request_code(
        &self,
        email: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<()> {
        let code = generate_code();
        let challenge = VerificationChallenge {
            email: email.to_owned(),
            code: code.clone(),
            expires_at: now + self.ttl,
            consumed: false,
        };
        self.lock().insert(email.to_owned(), challenge);
        self.mailer.send_verification_code(email, &code).await?;
        info!(email, "verification code issued");
        Ok(())
    }

    /// Validates the code for the pre-check endpoint. Success flips
    /// `consumed`, making the success itself a one-time token: a second
    /// call with the same code fails with `AlreadyConsumed`.
    pub fn verify_code(
        &self,
        email: &str,
        code: &str,
        now: OffsetDateTime,
    ) -> Result<(), VerificationError> {
        let mut challenges = self.lock();
        let challenge = challenges
            .get_mut(email)
            .ok_or(VerificationError::NotFound)?;
        if now > challenge.expires_at {
            challenges.remove(email);
            return Err(VerificationError::Expired);
        }
        if challenge.code != code {
            return Err(VerificationError::Mismatch);
        }
        if challenge.consumed {
            return Err(VerificationError::AlreadyConsumed);
        }
        challenge.consumed = true;
        Ok(())
    }

    /// One-time redemption backing the booking commit; the challenge is
    /// destroyed on success, so one verification buys exactly one booking.
    ///
    /// With a code this verifies and consumes in a single atomic step.
    /// Without one it accepts a challenge already consumed through
    /// [`Self::verify_code`] (the site's two-step flow) and fails with
    /// `NotFound` when the email was never verified.
    pub fn redeem(
        &self,
        email: &str,
        code: Option<&str>,
        now: OffsetDateTime,
    ) -> Result<(), VerificationError> {
        let mut challenges = self.lock();
        let challenge = challenges.get(email).ok_or(VerificationError::NotFound)?;
        if now > challenge.expires_at {
            challenges.remove(email);
            return Err(VerificationError::Expired);
        }
        match code {
            Some(code) => {
                if challenge.code != code {
                    return Err(VerificationError::Mismatch);
                }
                if challenge.consumed {
                    return Err(VerificationError::AlreadyConsumed);
                }
            }
            None => {
                if !challenge.consumed {
                    return Err(VerificationError::NotFound);
                }
            }
        }
        challenges.remove(email);
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, VerificationChallenge>> {
        self.challenges
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn generate_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}
