use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    algorithm::EncryptionAlgorithm,
    error::{KeyError, Result},
};

/// One version of a named master key, plus the algorithm its data
/// keys use.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawKeyMetadata")]
pub struct KeyMetadata {
    name: String,
    version: u32,
    algorithm: EncryptionAlgorithm,
}

#[derive(Deserialize)]
struct RawKeyMetadata {
    name: String,
    version: u32,
    algorithm: EncryptionAlgorithm,
}

impl TryFrom<RawKeyMetadata> for KeyMetadata {
    type Error = KeyError;

    fn try_from(raw: RawKeyMetadata) -> Result<Self> {
        KeyMetadata::new(raw.name, raw.version, raw.algorithm)
    }
}

impl KeyMetadata {
    pub fn new(
        name: impl Into<String>,
        version: u32,
        algorithm: EncryptionAlgorithm,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(KeyError::UnknownKey(name));
        }
        Ok(Self {
            name,
            version,
            algorithm,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn algorithm(&self) -> EncryptionAlgorithm {
        self.algorithm
    }

    /// Key-version name as the KMS spells it: `name@version`.
    pub fn version_name(&self) -> String {
        version_name(&self.name, self.version)
    }
}

impl fmt::Display for KeyMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

pub(crate) fn version_name(name: &str, version: u32) -> String {
    format!("{name}@{version}")
}

/// A freshly generated data key and its wrapped form. The plaintext is
/// zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DataKey {
    plaintext: Vec<u8>,
    #[zeroize(skip)]
    wrapped: Vec<u8>,
    #[zeroize(skip)]
    algorithm: EncryptionAlgorithm,
}

impl DataKey {
    pub(crate) fn new(algorithm: EncryptionAlgorithm, plaintext: Vec<u8>, wrapped: Vec<u8>) -> Self {
        debug_assert_eq!(plaintext.len(), algorithm.key_length());
        Self {
            plaintext,
            wrapped,
            algorithm,
        }
    }

    pub fn algorithm(&self) -> EncryptionAlgorithm {
        self.algorithm
    }

    pub fn plaintext(&self) -> &[u8] {
        &self.plaintext
    }

    /// The wrapped key; safe to persist next to the data it protects.
    pub fn wrapped(&self) -> &[u8] {
        &self.wrapped
    }

    /// Drop the plaintext and keep only the wrapped bytes.
    pub fn into_wrapped(mut self) -> Vec<u8> {
        std::mem::take(&mut self.wrapped)
    }
}

impl fmt::Debug for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataKey")
            .field("algorithm", &self.algorithm)
            .field("plaintext", &"***")
            .field("wrapped_len", &self.wrapped.len())
            .finish()
    }
}
