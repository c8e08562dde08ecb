use std::collections::BTreeMap;

use parking_lot::RwLock;
use zeroize::Zeroizing;

use super::{KeyProviderKind, KmsClient, KmsError, MasterKeyInfo};
use crate::{
    algorithm::AES_CTR_TRANSFORM,
    crypto::{envelope, keys::version_name},
};

/// Cipher and length a key is created with.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyOptions {
    pub cipher: String,
    pub bit_length: u32,
}

impl Default for KeyOptions {
    fn default() -> Self {
        Self {
            cipher: AES_CTR_TRANSFORM.into(),
            bit_length: 128,
        }
    }
}

struct StoredKey {
    options: KeyOptions,
    /// Material per version, oldest first.
    versions: Vec<Zeroizing<Vec<u8>>>,
}

/// In-process KMS holding master keys in memory. Wrapping is AES-GCM
/// under the version's material, bound to `name@version`.
///
/// The reported cipher and bit length are whatever the key was created
/// with; only the material length (16 or 32 bytes) matters for wrapping.
#[derive(Default)]
pub struct MemoryKms {
    kind: KeyProviderKind,
    keys: RwLock<BTreeMap<String, StoredKey>>,
}

impl MemoryKms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a different provider kind, e.g. when standing in for a
    /// specific backend.
    pub fn with_kind(mut self, kind: KeyProviderKind) -> Self {
        self.kind = kind;
        self
    }

    /// Add a key with its first version (0). Returns that version.
    pub fn create_key(&self, name: &str, material: &[u8], options: KeyOptions) -> anyhow::Result<u32> {
        anyhow::ensure!(!name.is_empty(), "key name must not be empty");
        check_material(material)?;
        let mut keys = self.keys.write();
        anyhow::ensure!(!keys.contains_key(name), "key {name:?} already exists");
        keys.insert(
            name.to_owned(),
            StoredKey {
                options,
                versions: vec![Zeroizing::new(material.to_vec())],
            },
        );
        log::debug!("created key {}", version_name(name, 0));
        Ok(0)
    }

    /// Rotate: append a new version, which becomes current. Older
    /// versions stay available for unwrapping.
    pub fn roll_new_version(&self, name: &str, material: &[u8]) -> anyhow::Result<u32> {
        check_material(material)?;
        let mut keys = self.keys.write();
        let key = keys
            .get_mut(name)
            .ok_or_else(|| anyhow::anyhow!("unknown key {name:?}"))?;
        key.versions.push(Zeroizing::new(material.to_vec()));
        let version = key.versions.len() as u32 - 1;
        log::debug!("rolled key to {}", version_name(name, version));
        Ok(version)
    }

    fn with_material<T>(
        &self,
        name: &str,
        version: u32,
        f: impl FnOnce(&[u8]) -> Result<T, KmsError>,
    ) -> Result<T, KmsError> {
        let keys = self.keys.read();
        let key = keys
            .get(name)
            .ok_or_else(|| KmsError::NoSuchKey(name.to_owned()))?;
        let material = key
            .versions
            .get(version as usize)
            .ok_or_else(|| KmsError::NoSuchVersion {
                name: name.to_owned(),
                version,
            })?;
        f(material.as_slice())
    }
}

fn check_material(material: &[u8]) -> anyhow::Result<()> {
    anyhow::ensure!(
        material.len() == 16 || material.len() == 32,
        "key material must be 16 or 32 bytes, got {}",
        material.len()
    );
    Ok(())
}

impl KmsClient for MemoryKms {
    fn kind(&self) -> KeyProviderKind {
        self.kind
    }

    fn key_names(&self) -> Result<Vec<String>, KmsError> {
        Ok(self.keys.read().keys().cloned().collect())
    }

    fn metadata(&self, name: &str) -> Result<MasterKeyInfo, KmsError> {
        let keys = self.keys.read();
        let key = keys
            .get(name)
            .ok_or_else(|| KmsError::NoSuchKey(name.to_owned()))?;
        Ok(MasterKeyInfo {
            cipher: key.options.cipher.clone(),
            bit_length: key.options.bit_length,
            versions: key.versions.len() as u32,
        })
    }

    fn wrap(&self, name: &str, version: u32, plaintext: &[u8]) -> Result<Vec<u8>, KmsError> {
        let aad = version_name(name, version);
        self.with_material(name, version, |material| {
            envelope::seal(material, aad.as_bytes(), plaintext).map_err(KmsError::Unavailable)
        })
    }

    fn unwrap(&self, name: &str, version: u32, wrapped: &[u8]) -> Result<Vec<u8>, KmsError> {
        let aad = version_name(name, version);
        self.with_material(name, version, |material| {
            envelope::open(material, aad.as_bytes(), wrapped).map_err(|_| KmsError::Rejected)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalogue() -> MemoryKms {
        let kms = MemoryKms::new();
        kms.create_key("pii", &[1u8; 16], KeyOptions::default()).unwrap();
        kms.roll_new_version("pii", &[2u8; 16]).unwrap();
        kms.create_key("secret", &[3u8; 16], KeyOptions::default()).unwrap();
        kms
    }

    #[test]
    fn lists_names() {
        let kms = catalogue();
        assert_eq!(kms.key_names().unwrap(), vec!["pii".to_string(), "secret".to_string()]);
    }

    #[test]
    fn metadata_counts_versions() {
        let kms = catalogue();
        let pii = kms.metadata("pii").unwrap();
        assert_eq!(pii.versions, 2);
        assert_eq!(pii.cipher, "AES/CTR/NoPadding");
        assert_eq!(pii.bit_length, 128);
        assert_eq!(kms.metadata("secret").unwrap().versions, 1);
        assert!(matches!(kms.metadata("nope"), Err(KmsError::NoSuchKey(_))));
    }

    #[test]
    fn wrap_unwrap_each_version() {
        let kms = catalogue();
        for version in 0..2 {
            let wrapped = kms.wrap("pii", version, &[9u8; 16]).unwrap();
            assert_eq!(kms.unwrap("pii", version, &wrapped).unwrap(), vec![9u8; 16]);
        }
    }

    #[test]
    fn unwrap_under_other_version_rejected() {
        let kms = catalogue();
        let wrapped = kms.wrap("pii", 0, &[9u8; 16]).unwrap();
        assert!(matches!(kms.unwrap("pii", 1, &wrapped), Err(KmsError::Rejected)));
    }

    #[test]
    fn missing_version() {
        let kms = catalogue();
        assert!(matches!(
            kms.wrap("secret", 1, &[0u8; 16]),
            Err(KmsError::NoSuchVersion { version: 1, .. })
        ));
        assert!(matches!(kms.wrap("nope", 0, &[0u8; 16]), Err(KmsError::NoSuchKey(_))));
    }

    #[test]
    fn create_rejects_bad_input() {
        let kms = catalogue();
        assert!(kms.create_key("pii", &[0u8; 16], KeyOptions::default()).is_err());
        assert!(kms.create_key("", &[0u8; 16], KeyOptions::default()).is_err());
        assert!(kms.create_key("short", &[0u8; 8], KeyOptions::default()).is_err());
        assert!(kms.roll_new_version("nope", &[0u8; 16]).is_err());
    }

    #[test]
    fn reports_kind() {
        assert_eq!(MemoryKms::new().kind(), KeyProviderKind::Unknown);
        assert_eq!(
            MemoryKms::new().with_kind(KeyProviderKind::Hadoop).kind(),
            KeyProviderKind::Hadoop
        );
    }
}
