use thiserror::Error;

/// Errors raised while handling credentials.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The bearer token is well-formed but past its expiry.
    #[error("Token expired")]
    Expired,

    /// The bearer token is missing, malformed or badly signed.
    #[error("Invalid token")]
    Invalid,

    /// Hashing a password failed.
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    /// Signing a token failed.
    #[error("Token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    /// The identity provider rejected the exchange or returned garbage.
    #[error("Identity provider error: {0}")]
    Provider(String),

    /// The identity provider could not be reached.
    #[error("Identity provider unreachable: {0}")]
    Http(#[from] reqwest::Error),
}
