//! # dfs3-crypto
//!
//! Cryptographic primitives for dfs3 nodes.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `symmetric` | XChaCha20-Poly1305 | Sealing private keys / file content at rest |
//! | `hashing` | SHA-256 | Content-addressed ids (`node_id`, `user_id`, `file_id`) |
//! | `signatures` | Ed25519 | Event and message signing |
//! | `identity` | Argon2id + Ed25519 | Deriving and sealing a node's identity from a passphrase |
//!
//! ## Security Properties
//!
//! - **XChaCha20-Poly1305**: 192-bit nonce, constant-time, side-channel immune
//! - **Ed25519**: Deterministic nonces, no RNG dependency
//! - **Argon2id**: Memory-hard, resistant to GPU/ASIC brute force

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod identity;
pub mod signatures;
pub mod symmetric;

// Re-exports
pub use errors::CryptoError;
pub use hashing::{sha256, sha256_hex, Hash};
pub use identity::{derive_key_from_passphrase, derive_key_with_salt, generate_node_identity, unseal_node_identity, SealedIdentity};
pub use signatures::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
pub use symmetric::{decrypt, encrypt, Cipher, Nonce, SecretKey};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
