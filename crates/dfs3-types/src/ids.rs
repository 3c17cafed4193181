//! # Typed Identifiers
//!
//! Newtype wrappers around the hex/base64 identifiers that flow through
//! every dfs3 component, so an invalid id cannot be constructed in the
//! first place instead of being checked ad hoc at each call site.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ValidationError;

macro_rules! regex_id {
    ($name:ident, $re:expr, $kind:expr) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }

            fn pattern() -> &'static Regex {
                static RE: Lazy<Regex> = Lazy::new(|| Regex::new($re).unwrap());
                &RE
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                if $name::pattern().is_match(&value) {
                    Ok($name(value))
                } else {
                    Err(ValidationError::PatternMismatch {
                        field: $kind,
                        value,
                    })
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::try_from(s.to_string())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// SHA-256 hex digest, lowercase, no prefix. Shared by node_id, user_id and file_id.
regex_id!(NodeId, r"^[a-f0-9]{64}$", "node_id");
regex_id!(UserId, r"^[a-f0-9]{64}$", "user_id");
regex_id!(FileId, r"^[a-f0-9]{64}$", "file_id");

// Ledger block id: 0x-prefixed SHA-256 hex digest.
regex_id!(BlockId, r"^0x[a-f0-9]{64}$", "block_id");

regex_id!(Alias, r"^[a-z0-9_-]{3,20}$", "alias");

// Same structure as the original's RE_FILENAME: no path separators, no
// leading '.', no leading '/', 1-254 bytes of the remainder.
regex_id!(
    Filename,
    r#"^[^\\/:*?"<>|.][^\\/:*?"<>|\r\n]{0,254}$"#,
    "filename"
);

regex_id!(Tag, r"^[\w\-.]{1,20}$", "tag");

regex_id!(
    MimeType,
    r"^[a-zA-Z0-9!#$&^_-]+/[a-zA-Z0-9!#$&^_.+-]+$",
    "mimetype"
);

regex_id!(
    Hostname,
    r"^(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
    "hostname"
);

regex_id!(Base64Blob, r"^[A-Za-z0-9+/]{4,}={0,2}$", "base64");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_accepts_lowercase_hex64() {
        let hex = "a".repeat(64);
        assert!(NodeId::try_from(hex).is_ok());
    }

    #[test]
    fn node_id_rejects_uppercase() {
        let hex = "A".repeat(64);
        assert!(NodeId::try_from(hex).is_err());
    }

    #[test]
    fn node_id_rejects_wrong_length() {
        assert!(NodeId::try_from("abc".to_string()).is_err());
    }

    #[test]
    fn block_id_requires_0x_prefix() {
        let hex = "f".repeat(64);
        assert!(BlockId::try_from(hex.clone()).is_err());
        assert!(BlockId::try_from(format!("0x{hex}")).is_ok());
    }

    #[test]
    fn alias_rejects_uppercase_and_short_values() {
        assert!(Alias::try_from("ab".to_string()).is_err());
        assert!(Alias::try_from("Node1".to_string()).is_err());
        assert!(Alias::try_from("node-1_ok".to_string()).is_ok());
    }

    #[test]
    fn filename_rejects_path_traversal_shapes() {
        assert!(Filename::try_from("../etc/passwd".to_string()).is_err());
        assert!(Filename::try_from(".hidden".to_string()).is_err());
        assert!(Filename::try_from("report.pdf".to_string()).is_ok());
    }

    #[test]
    fn mimetype_matches_allowed_shapes() {
        assert!(MimeType::try_from("application/pdf".to_string()).is_ok());
        assert!(MimeType::try_from("not-a-mimetype".to_string()).is_err());
    }
}
