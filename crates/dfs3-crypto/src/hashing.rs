//! # SHA-256 Content Addressing
//!
//! Every dfs3 identifier (`node_id`, `user_id`, `file_id`) is a lowercase
//! hex SHA-256 digest of some canonical input (a public key, or a file's
//! ciphertext). This module is the single place that computes them.

use sha2::{Digest, Sha256};

/// Raw SHA-256 output.
pub type Hash = [u8; 32];

/// Hash arbitrary bytes with SHA-256.
pub fn sha256(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash arbitrary bytes with SHA-256 and render as lowercase hex, the form
/// used for `node_id`, `user_id` and `file_id`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// `node_id = SHA-256(public_key)`.
pub fn node_id_from_public_key(public_key: &[u8]) -> String {
    sha256_hex(public_key)
}

/// `user_id = SHA-256(public_key)`.
pub fn user_id_from_public_key(public_key: &[u8]) -> String {
    sha256_hex(public_key)
}

/// `file_id = SHA-256(ciphertext)`.
pub fn file_id_from_ciphertext(ciphertext: &[u8]) -> String {
    sha256_hex(ciphertext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_hex_is_lowercase_and_64_chars() {
        let digest = sha256_hex(b"hello world");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn sha256_is_deterministic() {
        assert_eq!(sha256_hex(b"same input"), sha256_hex(b"same input"));
    }

    #[test]
    fn different_inputs_hash_differently() {
        assert_ne!(sha256_hex(b"input1"), sha256_hex(b"input2"));
    }

    #[test]
    fn file_id_matches_node_id_algorithm() {
        // Both are SHA-256 over raw bytes; only the semantic input differs.
        let bytes = b"arbitrary ciphertext bytes";
        assert_eq!(file_id_from_ciphertext(bytes), sha256_hex(bytes));
    }
}
