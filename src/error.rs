use thiserror::Error;

use crate::kms::KmsError;

pub type Result<T> = std::result::Result<T, KeyError>;

/// Failures surfaced by the key provider. None of these are retried
/// internally and none carry key material.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("unsupported encryption algorithm: {cipher} with {bit_length} bits")]
    UnsupportedAlgorithm { cipher: String, bit_length: u32 },

    #[error("unknown key: {0:?}")]
    UnknownKey(String),

    #[error("key version {name}@{version} is not available")]
    VersionMismatch { name: String, version: u32 },

    #[error("key service unavailable")]
    KeyServiceUnavailable(#[source] KmsError),

    #[error("failed to decrypt local key for {name}@{version}")]
    DecryptionFailed { name: String, version: u32 },

    #[error("random source failed")]
    EntropyUnavailable(#[source] anyhow::Error),
}

impl KeyError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            KeyError::KeyServiceUnavailable(_) | KeyError::VersionMismatch { .. }
        )
    }
}
