use std::fs;
use std::path::Path;

use dfs3_crypto::{generate_node_identity, unseal_node_identity, Ed25519KeyPair, SealedIdentity};
use dfs3_types::Alias;

use crate::error::NodeError;

/// Everything bootstrap recovers or creates about this node's identity.
pub struct NodeIdentity {
    pub sealed: SealedIdentity,
    pub key_pair: Ed25519KeyPair,
    pub alias: String,
    pub tags: Vec<String>,
    /// `true` the first time this identity is minted, so callers can
    /// decide whether to skip prompts that only make sense on first boot.
    pub freshly_created: bool,
}

/// Loads the identity sealed at `config_path`, prompting for the
/// passphrase that unseals it; or, if no identity exists yet, prompts for
/// a fresh passphrase (entered twice for confirmation) plus an alias and
/// tags, mints a new identity, and persists it.
pub fn init_or_load_identity(config_path: &Path) -> Result<NodeIdentity, NodeError> {
    if config_path.exists() {
        let raw = fs::read_to_string(config_path)?;
        let stored: StoredIdentity = serde_json::from_str(&raw)?;
        let passphrase = rpassword::prompt_password("Enter passphrase to decrypt private key: ")?;
        let key_pair = unseal_node_identity(&stored.sealed, &passphrase)?;
        return Ok(NodeIdentity {
            sealed: stored.sealed,
            key_pair,
            alias: stored.alias,
            tags: stored.tags,
            freshly_created: false,
        });
    }

    let passphrase = loop {
        let first = rpassword::prompt_password("Enter new passphrase to protect your private key: ")?;
        let second = rpassword::prompt_password("Repeat passphrase: ")?;
        if first == second {
            break first;
        }
        tracing::warn!("passphrases do not match, try again");
    };

    let alias = prompt_alias()?;
    let tags = prompt_tags()?;

    let (sealed, key_pair) = generate_node_identity(&passphrase)?;

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let stored = StoredIdentity {
        sealed: sealed.clone(),
        alias: alias.clone(),
        tags: tags.clone(),
    };
    fs::write(config_path, serde_json::to_string_pretty(&stored)?)?;

    Ok(NodeIdentity {
        sealed,
        key_pair,
        alias,
        tags,
        freshly_created: true,
    })
}

fn prompt_alias() -> Result<String, NodeError> {
    loop {
        print!("Enter a friendly alias for this node: ");
        use std::io::Write;
        std::io::stdout().flush()?;
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        let candidate = line.trim().to_lowercase();
        if Alias::try_from(candidate.clone()).is_ok() {
            return Ok(candidate);
        }
        tracing::warn!("alias must be 3-20 lowercase letters, digits, '_' or '-'; try again");
    }
}

fn prompt_tags() -> Result<Vec<String>, NodeError> {
    print!("Enter tags for this node (comma-separated): ");
    use std::io::Write;
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect())
}

/// On-disk shape of the identity file: the sealed crypto material plus
/// the human-facing fields a node only ever sets once, at creation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct StoredIdentity {
    sealed: SealedIdentity,
    alias: String,
    #[serde(default)]
    tags: Vec<String>,
}
