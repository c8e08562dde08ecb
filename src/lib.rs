//! Envelope-encryption key provider for columnar file encryption.
//!
//! A [`KeyProviderShim`] sits in front of any [`KmsClient`]. It resolves
//! which [`EncryptionAlgorithm`] a master key implies, creates random
//! data keys wrapped under a specific master key version, and unwraps
//! them again later.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use kms_shim::{KeyProviderBuilder, kms::memory::{KeyOptions, MemoryKms}};
//!
//! let kms = MemoryKms::new();
//! kms.create_key("pii", &[7u8; 16], KeyOptions::default())?;
//!
//! let provider = KeyProviderBuilder::new(Arc::new(kms)).build();
//! let meta = provider.current_key_version("pii")?;
//! let key = provider.create_local_key(&meta)?;
//! let again = provider.decrypt_local_key(&meta, key.wrapped())?;
//! assert_eq!(key.plaintext(), again.as_slice());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod algorithm;
pub mod crypto;
pub mod error;
pub mod kms;
pub mod provider;

use std::sync::Arc;

pub use algorithm::{EncryptionAlgorithm, resolve};
pub use crypto::{
    keys::{DataKey, KeyMetadata},
    random::{OsRandom, RandomSource, SeededRandom},
};
pub use error::{KeyError, Result};
pub use kms::{KeyProviderKind, KmsClient, KmsError, MasterKeyInfo};
pub use provider::KeyProviderShim;

/// Where data key bytes come from.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Randomness {
    /// Operating system CSPRNG.
    #[default]
    Os,
    /// Fixed-seed generator. Data keys become predictable; tests only.
    Seeded(u64),
}

pub struct KeyProviderBuilder {
    client: Arc<dyn KmsClient>,
    randomness: Randomness,
}

impl KeyProviderBuilder {
    pub fn new(client: Arc<dyn KmsClient>) -> Self {
        Self {
            client,
            randomness: Randomness::Os,
        }
    }

    pub fn randomness(mut self, randomness: Randomness) -> Self {
        self.randomness = randomness;
        self
    }

    pub fn build(self) -> KeyProviderShim {
        let random: Arc<dyn RandomSource> = match self.randomness {
            Randomness::Os => Arc::new(OsRandom),
            Randomness::Seeded(seed) => {
                log::warn!("key provider using seeded randomness; data keys are predictable");
                Arc::new(SeededRandom::from_seed(seed))
            }
        };
        log::info!("key provider built over {} KMS", self.client.kind());
        KeyProviderShim::with_random(self.client, random)
    }
}
