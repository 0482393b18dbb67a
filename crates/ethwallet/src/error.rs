//! Error types for wallet encoding and decoding.

use thiserror::Error;

/// Wallet codec errors.
#[derive(Error, Debug)]
pub enum WalletError {
    /// Unknown container version or vendor marker.
    #[error("Unsupported wallet format: {0}")]
    UnsupportedFormat(String),

    /// Unknown KDF, PRF or cipher name.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// MAC, checksum or address mismatch.
    #[error("{0} - possibly wrong passphrase")]
    AuthenticationFailed(String),

    /// Malformed field, wrong length or missing value.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Passphrase or user id below the minimum length.
    #[error("Input too short (minimum {0} characters required)")]
    PassphraseTooShort(usize),

    /// PKCS#7 padding did not validate after CBC decryption.
    #[error("Invalid padding in decrypted data")]
    InvalidPadding,

    /// Key derivation parameters rejected by the KDF.
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    /// Rejection sampling hit its attempt limit.
    #[error("Key generation exhausted after {0} attempts")]
    GenerationExhausted(usize),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WalletError {
    /// True when the failure means the passphrase (or the data it protects)
    /// did not check out, as opposed to a structural problem.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, WalletError::AuthenticationFailed(_))
    }

    /// True for malformed input, including minimum-length violations.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            WalletError::InvalidInput(_) | WalletError::PassphraseTooShort(_)
        )
    }

    pub(crate) fn auth(what: &str) -> Self {
        WalletError::AuthenticationFailed(what.to_string())
    }
}

/// Result type for wallet operations.
pub type WalletResult<T> = Result<T, WalletError>;
