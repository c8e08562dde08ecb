pub mod memory;

use std::fmt;

use thiserror::Error;

/// Which family of KMS sits behind a client.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq)]
pub enum KeyProviderKind {
    #[default]
    Unknown,
    Hadoop,
    Aws,
    Gcp,
    Azure,
}

impl fmt::Display for KeyProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyProviderKind::Unknown => "unknown",
            KeyProviderKind::Hadoop => "hadoop",
            KeyProviderKind::Aws => "aws",
            KeyProviderKind::Gcp => "gcp",
            KeyProviderKind::Azure => "azure",
        };
        f.write_str(name)
    }
}

/// What the KMS reports about a master key.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MasterKeyInfo {
    /// Cipher transform, e.g. `AES/CTR/NoPadding`.
    pub cipher: String,
    pub bit_length: u32,
    /// Number of versions; the newest is `versions - 1`.
    pub versions: u32,
}

/// Errors a KMS client reports back to the provider.
#[derive(Debug, Error)]
pub enum KmsError {
    #[error("no such key: {0:?}")]
    NoSuchKey(String),

    #[error("no such key version: {name}@{version}")]
    NoSuchVersion { name: String, version: u32 },

    #[error("wrapped key rejected")]
    Rejected,

    #[error("request cancelled")]
    Cancelled,

    #[error("KMS request failed: {0}")]
    Unavailable(#[source] anyhow::Error),
}

/// Synchronous interface to an external key-management service.
///
/// Implementations own transport concerns: timeouts, retries,
/// authentication. Calls may block on network I/O.
pub trait KmsClient: Send + Sync + 'static {
    fn kind(&self) -> KeyProviderKind {
        KeyProviderKind::Unknown
    }

    /// Names of every master key in the catalogue.
    fn key_names(&self) -> Result<Vec<String>, KmsError>;

    fn metadata(&self, name: &str) -> Result<MasterKeyInfo, KmsError>;

    /// Encrypt `plaintext` under the given master key version.
    fn wrap(&self, name: &str, version: u32, plaintext: &[u8]) -> Result<Vec<u8>, KmsError>;

    /// Reverse of [`KmsClient::wrap`]. Must return
    /// [`KmsError::Rejected`] for ciphertext that does not authenticate.
    fn unwrap(&self, name: &str, version: u32, wrapped: &[u8]) -> Result<Vec<u8>, KmsError>;
}
