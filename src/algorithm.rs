use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{KeyError, Result};

/// The only cipher transform a master key may declare.
pub const AES_CTR_TRANSFORM: &str = "AES/CTR/NoPadding";

/// Symmetric algorithm used for data keys derived from a master key.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum EncryptionAlgorithm {
    AesCtr128,
    AesCtr256,
}

impl EncryptionAlgorithm {
    pub fn algorithm(self) -> &'static str {
        "AES"
    }

    pub fn mode(self) -> &'static str {
        "CTR/NoPadding"
    }

    /// Full cipher transform, e.g. `AES/CTR/NoPadding`.
    pub fn transform(self) -> &'static str {
        AES_CTR_TRANSFORM
    }

    /// Data key length in bytes.
    pub fn key_length(self) -> usize {
        match self {
            EncryptionAlgorithm::AesCtr128 => 16,
            EncryptionAlgorithm::AesCtr256 => 32,
        }
    }

    pub fn iv_length(self) -> usize {
        16
    }

    /// Stable id written into file footers.
    pub fn serialization(self) -> u32 {
        match self {
            EncryptionAlgorithm::AesCtr128 => 1,
            EncryptionAlgorithm::AesCtr256 => 2,
        }
    }

    pub fn from_serialization(id: u32) -> Option<Self> {
        match id {
            1 => Some(EncryptionAlgorithm::AesCtr128),
            2 => Some(EncryptionAlgorithm::AesCtr256),
            _ => None,
        }
    }
}

impl fmt::Display for EncryptionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncryptionAlgorithm::AesCtr128 => f.write_str("AES_CTR_128"),
            EncryptionAlgorithm::AesCtr256 => f.write_str("AES_CTR_256"),
        }
    }
}

/// Map a master key's declared cipher and bit length to the algorithm
/// its data keys use.
///
/// Some KMS backends report 512 bits for 256-bit AES keys (they count a
/// doubled internal buffer), so 512 is accepted as an alias for 256.
/// No other lengths are aliased.
pub fn resolve(cipher: &str, bit_length: u32) -> Result<EncryptionAlgorithm> {
    if cipher == AES_CTR_TRANSFORM {
        match bit_length {
            128 => return Ok(EncryptionAlgorithm::AesCtr128),
            256 | 512 => return Ok(EncryptionAlgorithm::AesCtr256),
            _ => {}
        }
    }
    Err(KeyError::UnsupportedAlgorithm {
        cipher: cipher.to_owned(),
        bit_length,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_aes_ctr_lengths() {
        assert_eq!(
            resolve("AES/CTR/NoPadding", 128).unwrap(),
            EncryptionAlgorithm::AesCtr128
        );
        assert_eq!(
            resolve("AES/CTR/NoPadding", 256).unwrap(),
            EncryptionAlgorithm::AesCtr256
        );
        assert_eq!(
            resolve("AES/CTR/NoPadding", 512).unwrap(),
            EncryptionAlgorithm::AesCtr256
        );
    }

    #[test]
    fn unknown_cipher_is_rejected() {
        let err = resolve("XXX/CTR/NoPadding", 128).unwrap_err();
        assert!(matches!(
            err,
            KeyError::UnsupportedAlgorithm { ref cipher, bit_length: 128 } if cipher == "XXX/CTR/NoPadding"
        ));
    }

    #[test]
    fn near_matches_are_rejected() {
        for cipher in ["aes/ctr/nopadding", "AES/CTR/NoPadding ", "AES/GCM/NoPadding", "AES", ""] {
            for bits in [128, 256, 512] {
                assert!(resolve(cipher, bits).is_err(), "{cipher:?} {bits}");
            }
        }
    }

    #[test]
    fn other_lengths_are_rejected() {
        for bits in [0, 64, 192, 384, 1024] {
            assert!(matches!(
                resolve(AES_CTR_TRANSFORM, bits),
                Err(KeyError::UnsupportedAlgorithm { .. })
            ));
        }
    }

    #[test]
    fn algorithm_constants() {
        let aes128 = EncryptionAlgorithm::AesCtr128;
        let aes256 = EncryptionAlgorithm::AesCtr256;
        assert_eq!(aes128.key_length(), 16);
        assert_eq!(aes256.key_length(), 32);
        assert_eq!(aes256.iv_length(), 16);
        assert_eq!(aes128.transform(), "AES/CTR/NoPadding");
        assert_eq!(format!("{}/{}", aes256.algorithm(), aes256.mode()), aes256.transform());
        assert_eq!(aes128.to_string(), "AES_CTR_128");
        assert_eq!(aes256.to_string(), "AES_CTR_256");
    }

    #[test]
    fn serialization_ids() {
        for alg in [EncryptionAlgorithm::AesCtr128, EncryptionAlgorithm::AesCtr256] {
            assert_eq!(EncryptionAlgorithm::from_serialization(alg.serialization()), Some(alg));
        }
        assert_eq!(EncryptionAlgorithm::from_serialization(0), None);
        assert_eq!(EncryptionAlgorithm::from_serialization(3), None);
    }
}
