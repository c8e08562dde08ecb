//! AES-GCM sealing of data keys under master key material.
//!
//! Sealed layout: `[ nonce (12) | ciphertext | tag (16) ]`. The caller's
//! associated data binds the blob to one key version.

use aes_gcm::{
    Aes128Gcm, Aes256Gcm, KeyInit, Nonce,
    aead::{Aead, Payload},
};

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Seal `plaintext` under a 16- or 32-byte master key.
pub fn seal(master: &[u8], aad: &[u8], plaintext: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut nonce = [0u8; NONCE_LEN];
    getrandom::getrandom(&mut nonce).map_err(|e| anyhow::anyhow!("getrandom failed: {e}"))?;
    let payload = Payload {
        msg: plaintext,
        aad,
    };
    let nonce_ref = Nonce::from_slice(&nonce);
    let ciphertext = match master.len() {
        16 => Aes128Gcm::new_from_slice(master).map_err(invalid_key)?.encrypt(nonce_ref, payload),
        32 => Aes256Gcm::new_from_slice(master).map_err(invalid_key)?.encrypt(nonce_ref, payload),
        n => anyhow::bail!("master key must be 16 or 32 bytes, got {n}"),
    }
    .map_err(|e| anyhow::anyhow!("seal failed: {e}"))?;

    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Open a blob produced by [`seal`]. Fails on any tampering, on the
/// wrong master key, or on mismatched associated data.
pub fn open(master: &[u8], aad: &[u8], sealed: &[u8]) -> anyhow::Result<Vec<u8>> {
    anyhow::ensure!(
        sealed.len() >= NONCE_LEN + TAG_LEN,
        "sealed key too short: {} bytes",
        sealed.len()
    );
    let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce);
    let payload = Payload {
        msg: ciphertext,
        aad,
    };
    let plaintext = match master.len() {
        16 => Aes128Gcm::new_from_slice(master).map_err(invalid_key)?.decrypt(nonce, payload),
        32 => Aes256Gcm::new_from_slice(master).map_err(invalid_key)?.decrypt(nonce, payload),
        n => anyhow::bail!("master key must be 16 or 32 bytes, got {n}"),
    }
    .map_err(|e| anyhow::anyhow!("open failed: {e}"))?;
    Ok(plaintext)
}

fn invalid_key(e: impl std::fmt::Display) -> anyhow::Error {
    anyhow::anyhow!("invalid master key: {e}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER_128: [u8; 16] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];

    #[test]
    fn round_trip() {
        let sealed = seal(&MASTER_128, b"pii@0", b"0123456789abcdef").unwrap();
        assert_eq!(sealed.len(), NONCE_LEN + 16 + TAG_LEN);
        let opened = open(&MASTER_128, b"pii@0", &sealed).unwrap();
        assert_eq!(opened, b"0123456789abcdef");
    }

    #[test]
    fn round_trip_256() {
        let master = [0x42u8; 32];
        let sealed = seal(&master, b"secret@0", &[7u8; 32]).unwrap();
        assert_eq!(open(&master, b"secret@0", &sealed).unwrap(), vec![7u8; 32]);
    }

    #[test]
    fn wrong_aad_fails() {
        let sealed = seal(&MASTER_128, b"pii@0", &[1u8; 16]).unwrap();
        assert!(open(&MASTER_128, b"pii@1", &sealed).is_err());
    }

    #[test]
    fn wrong_key_fails() {
        let sealed = seal(&MASTER_128, b"pii@0", &[1u8; 16]).unwrap();
        assert!(open(&[0xFFu8; 16], b"pii@0", &sealed).is_err());
    }

    #[test]
    fn truncated_fails() {
        let sealed = seal(&MASTER_128, b"pii@0", &[1u8; 16]).unwrap();
        assert!(open(&MASTER_128, b"pii@0", &sealed[..20]).is_err());
    }

    #[test]
    fn bad_master_length_fails() {
        assert!(seal(&[0u8; 24], b"", &[1u8; 16]).is_err());
    }
}
