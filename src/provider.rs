use std::{collections::BTreeSet, sync::Arc};

use zeroize::Zeroizing;

use crate::{
    algorithm,
    crypto::{
        keys::{DataKey, KeyMetadata},
        random::{OsRandom, RandomSource},
    },
    error::{KeyError, Result},
    kms::{KeyProviderKind, KmsClient, KmsError},
};

/// Envelope-encryption front end over a [`KmsClient`].
///
/// Holds no key material and no mutable state, so one instance can be
/// shared freely between threads.
#[derive(Clone)]
pub struct KeyProviderShim {
    client: Arc<dyn KmsClient>,
    random: Arc<dyn RandomSource>,
}

impl KeyProviderShim {
    /// Provider drawing data keys from the OS CSPRNG.
    pub fn new(client: Arc<dyn KmsClient>) -> Self {
        Self::with_random(client, Arc::new(OsRandom))
    }

    /// Provider with an explicit random source. Only tests should pass
    /// anything other than [`OsRandom`].
    pub fn with_random(client: Arc<dyn KmsClient>, random: Arc<dyn RandomSource>) -> Self {
        Self { client, random }
    }

    pub fn kind(&self) -> KeyProviderKind {
        self.client.kind()
    }

    pub fn key_names(&self) -> Result<BTreeSet<String>> {
        let names = self
            .client
            .key_names()
            .map_err(KeyError::KeyServiceUnavailable)?;
        Ok(names.into_iter().collect())
    }

    /// Metadata for the newest version of `name`.
    pub fn current_key_version(&self, name: &str) -> Result<KeyMetadata> {
        let info = self.client.metadata(name).map_err(|e| match e {
            KmsError::NoSuchKey(name) => KeyError::UnknownKey(name),
            other => KeyError::KeyServiceUnavailable(other),
        })?;
        let algorithm = algorithm::resolve(&info.cipher, info.bit_length).inspect_err(|_| {
            log::warn!(
                "key {name:?} uses unsupported cipher {} ({} bits)",
                info.cipher,
                info.bit_length
            );
        })?;
        let version = info
            .versions
            .checked_sub(1)
            .ok_or_else(|| KeyError::UnknownKey(name.to_owned()))?;
        log::debug!("current version of {name:?} is {version} ({algorithm})");
        KeyMetadata::new(name, version, algorithm)
    }

    /// Generate a random data key and wrap it under `metadata`'s key
    /// version.
    pub fn create_local_key(&self, metadata: &KeyMetadata) -> Result<DataKey> {
        let algorithm = metadata.algorithm();
        let mut plaintext = Zeroizing::new(vec![0u8; algorithm.key_length()]);
        self.random
            .fill(&mut plaintext)
            .map_err(KeyError::EntropyUnavailable)?;

        let wrapped = self
            .client
            .wrap(metadata.name(), metadata.version(), &plaintext)
            .map_err(version_error)?;
        log::debug!("created local key under {metadata}");
        Ok(DataKey::new(algorithm, std::mem::take(&mut *plaintext), wrapped))
    }

    /// Recover the plaintext of a key previously made by
    /// [`KeyProviderShim::create_local_key`].
    pub fn decrypt_local_key(
        &self,
        metadata: &KeyMetadata,
        wrapped: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>> {
        let plaintext = self
            .client
            .unwrap(metadata.name(), metadata.version(), wrapped)
            .map(Zeroizing::new)
            .map_err(|e| match e {
                KmsError::Rejected => {
                    log::warn!("KMS rejected wrapped key for {metadata}");
                    decryption_failed(metadata)
                }
                other => version_error(other),
            })?;
        let expected = metadata.algorithm().key_length();
        if plaintext.len() != expected {
            log::warn!(
                "unwrapped key for {metadata} is {} bytes, expected {expected}",
                plaintext.len()
            );
            return Err(decryption_failed(metadata));
        }
        log::debug!("decrypted local key under {metadata}");
        Ok(plaintext)
    }
}

fn version_error(err: KmsError) -> KeyError {
    match err {
        KmsError::NoSuchKey(name) => KeyError::UnknownKey(name),
        KmsError::NoSuchVersion { name, version } => KeyError::VersionMismatch { name, version },
        other => KeyError::KeyServiceUnavailable(other),
    }
}

fn decryption_failed(metadata: &KeyMetadata) -> KeyError {
    KeyError::DecryptionFailed {
        name: metadata.name().to_owned(),
        version: metadata.version(),
    }
}
