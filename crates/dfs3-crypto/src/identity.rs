//! # Node Identity
//!
//! Derives a node's Ed25519 signing key from a passphrase via Argon2id,
//! and seals/unseals the private key at rest. Two independently-salted
//! Argon2id derivations are used: one for the signing seed, one for the
//! at-rest sealing key. Keeping them independent means rotating the
//! sealing passphrase material never has to touch, and can never change,
//! the derived `node_id`.

use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::RngCore;

use crate::hashing::node_id_from_public_key;
use crate::signatures::Ed25519KeyPair;
use crate::symmetric::{decrypt, encrypt, Nonce, SecretKey};
use crate::CryptoError;

/// Length in bytes of the random salt used for each Argon2id derivation.
pub const SALT_LEN: usize = 16;

fn kdf() -> Argon2<'static> {
    // Roughly libsodium's argon2id "moderate" profile, scaled down to a
    // memory cost that is comfortable for a background server process.
    let params = Params::new(65536, 3, 1, Some(32)).expect("static argon2 params are valid");
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
}

/// Derives a fresh 32-byte key from `passphrase` under a newly generated
/// random salt. Returns `(key, salt)`.
pub fn derive_key_from_passphrase(passphrase: &str) -> Result<([u8; 32], [u8; SALT_LEN]), CryptoError> {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let key = derive_key_with_salt(passphrase, &salt)?;
    Ok((key, salt))
}

/// Derives a 32-byte key from `passphrase` under an existing `salt`,
/// reproducing the same key every time for the same inputs.
pub fn derive_key_with_salt(passphrase: &str, salt: &[u8]) -> Result<[u8; 32], CryptoError> {
    let mut out = [0u8; 32];
    kdf()
        .hash_password_into(passphrase.as_bytes(), salt, &mut out)
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;
    Ok(out)
}

/// A node's identity material as persisted to `node.json`: everything
/// needed to unseal the private key given the passphrase, plus the public
/// identity (`node_id`, `public_key`).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SealedIdentity {
    pub node_id: String,
    pub public_key_b64: String,
    pub salt_private_key_b64: String,
    pub salt_encryption_b64: String,
    /// Base64 of `nonce (24 bytes) || ciphertext`.
    pub encrypted_private_key_b64: String,
}

/// Generates a brand-new node identity from a passphrase: derives the
/// Ed25519 signing seed, computes `node_id = sha256(public_key)`, and
/// seals the signing key under an independently-derived key.
pub fn generate_node_identity(passphrase: &str) -> Result<(SealedIdentity, Ed25519KeyPair), CryptoError> {
    let (seed, salt_private_key) = derive_key_from_passphrase(passphrase)?;
    let keypair = Ed25519KeyPair::from_seed(seed);
    let public_key_bytes = *keypair.public_key().as_bytes();
    let node_id = node_id_from_public_key(&public_key_bytes);

    let (sealing_key_bytes, salt_encryption) = derive_key_from_passphrase(passphrase)?;
    let sealing_key = SecretKey::from_bytes(sealing_key_bytes);
    let (ciphertext, nonce) = encrypt(&sealing_key, &keypair.to_seed())?;

    let mut sealed_bytes = nonce.as_bytes().to_vec();
    sealed_bytes.extend_from_slice(&ciphertext);

    let sealed = SealedIdentity {
        node_id,
        public_key_b64: STANDARD.encode(public_key_bytes),
        salt_private_key_b64: STANDARD.encode(salt_private_key),
        salt_encryption_b64: STANDARD.encode(salt_encryption),
        encrypted_private_key_b64: STANDARD.encode(sealed_bytes),
    };

    Ok((sealed, keypair))
}

/// Unseals a node's private signing key given its stored identity and the
/// passphrase that sealed it. Derives the sealing key from
/// `salt_encryption` and decrypts `encrypted_private_key` to recover the
/// original Ed25519 seed bytes.
pub fn unseal_node_identity(sealed: &SealedIdentity, passphrase: &str) -> Result<Ed25519KeyPair, CryptoError> {
    let salt_encryption = STANDARD
        .decode(&sealed.salt_encryption_b64)
        .map_err(|e| CryptoError::InvalidBase64(e.to_string()))?;
    let sealing_key_bytes = derive_key_with_salt(passphrase, &salt_encryption)?;
    let sealing_key = SecretKey::from_bytes(sealing_key_bytes);

    let sealed_bytes = STANDARD
        .decode(&sealed.encrypted_private_key_b64)
        .map_err(|e| CryptoError::InvalidBase64(e.to_string()))?;
    if sealed_bytes.len() < 24 {
        return Err(CryptoError::InvalidPrivateKey);
    }
    let (nonce_bytes, ciphertext) = sealed_bytes.split_at(24);
    let nonce = Nonce::from_bytes(
        nonce_bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidPrivateKey)?,
    );

    let seed_bytes = decrypt(&sealing_key, ciphertext, &nonce)
        .map_err(|_| CryptoError::DecryptionFailed("wrong passphrase or corrupt identity file".into()))?;
    let seed: [u8; 32] = seed_bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidPrivateKey)?;

    Ok(Ed25519KeyPair::from_seed(seed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_then_unseal_recovers_same_keypair() {
        let (sealed, original) = generate_node_identity("correct horse battery staple").unwrap();
        let unsealed = unseal_node_identity(&sealed, "correct horse battery staple").unwrap();
        assert_eq!(original.public_key(), unsealed.public_key());
    }

    #[test]
    fn unseal_with_wrong_passphrase_fails() {
        let (sealed, _) = generate_node_identity("right passphrase").unwrap();
        let result = unseal_node_identity(&sealed, "wrong passphrase");
        assert!(result.is_err());
    }

    #[test]
    fn node_id_is_sha256_of_public_key() {
        let (sealed, keypair) = generate_node_identity("another passphrase").unwrap();
        let expected = node_id_from_public_key(keypair.public_key().as_bytes());
        assert_eq!(sealed.node_id, expected);
    }

    #[test]
    fn changing_sealing_passphrase_does_not_change_node_id() {
        // Two independent derivations from the same passphrase still use
        // distinct random salts, so node_id only depends on the
        // signing-seed derivation, not the sealing derivation.
        let (sealed_a, keypair_a) = generate_node_identity("shared passphrase").unwrap();
        let (sealed_b, keypair_b) = generate_node_identity("shared passphrase").unwrap();
        assert_eq!(sealed_a.node_id, sealed_b.node_id);
        assert_eq!(keypair_a.public_key(), keypair_b.public_key());
        assert_ne!(
            sealed_a.encrypted_private_key_b64,
            sealed_b.encrypted_private_key_b64
        );
    }
}
