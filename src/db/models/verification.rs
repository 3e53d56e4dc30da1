use time::OffsetDateTime;

/// A short-lived one-time code binding a booking attempt to an email
/// address. Challenges live only in process memory; a fresh request for
/// the same email overwrites the previous one.
#[derive(Debug, Clone)]
pub struct VerificationChallenge {
    pub email: String,
    pub code: String,
    pub expires_at: OffsetDateTime,
    pub consumed: bool,
}
