//! File metadata and user-visible entries: one JSON metadata record per
//! `file_id` under `.meta/`, hard-linked into `.users/<user_id>/<filename>`
//! for every user that can see it. Grounded in `core/files.py`.

use std::convert::TryFrom;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use lru::LruCache;

use dfs3_types::{
    AuthorizedUserEntry, FileCreatedPayload, FileDeletedPayload, FileEntry, FileId,
    FileMetadata, FileRenamedPayload, FileReplicatedPayload, FileSharedPayload, Filename, NodeId,
    UserId,
};

use crate::errors::StoreError;

const METADATA_CACHE_CAPACITY: usize = 100;

pub struct FileMetadataStore {
    meta_dir: PathBuf,
    users_dir: PathBuf,
    cache: Mutex<LruCache<FileId, FileMetadata>>,
}

impl FileMetadataStore {
    pub fn new(meta_dir: impl Into<PathBuf>, users_dir: impl Into<PathBuf>) -> Self {
        Self {
            meta_dir: meta_dir.into(),
            users_dir: users_dir.into(),
            cache: Mutex::new(LruCache::new(
                std::num::NonZeroUsize::new(METADATA_CACHE_CAPACITY).unwrap(),
            )),
        }
    }

    fn meta_path(&self, file_id: &FileId) -> PathBuf {
        self.meta_dir.join(format!("{}.json", file_id.as_str()))
    }

    fn user_dir(&self, user_id: &UserId) -> PathBuf {
        self.users_dir.join(user_id.as_str())
    }

    /// Returns an unused path for `desired_name` in the user's directory,
    /// appending " (N)" before the extension on collision, matching
    /// `get_available_filename_path`.
    fn available_filename_path(&self, user_id: &UserId, desired_name: &str) -> PathBuf {
        let user_dir = self.user_dir(user_id);
        let path = Path::new(desired_name);
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(desired_name);
        let ext = path.extension().and_then(|s| s.to_str());

        let mut candidate = user_dir.join(desired_name);
        let mut counter = 1;
        while candidate.exists() {
            let name = match ext {
                Some(ext) => format!("{stem} ({counter}).{ext}"),
                None => format!("{stem} ({counter})"),
            };
            candidate = user_dir.join(name);
            counter += 1;
        }
        candidate
    }

    fn invalidate(&self, file_id: &FileId) {
        self.cache.lock().unwrap().pop(file_id);
    }

    fn save_metadata(&self, metadata: &FileMetadata) -> Result<(), StoreError> {
        self.invalidate(&metadata.file_id);
        std::fs::create_dir_all(&self.meta_dir)?;
        let bytes = serde_json::to_vec_pretty(metadata)?;
        std::fs::write(self.meta_path(&metadata.file_id), bytes)?;
        Ok(())
    }

    /// Registers new metadata and a user-visible entry from a
    /// `file_created` event. Mirrors `core/files.py: create()`.
    pub fn create(
        &self,
        payload: &FileCreatedPayload,
        originating_node: &NodeId,
        creation_date: i64,
    ) -> Result<FileMetadata, StoreError> {
        let metadata = FileMetadata {
            file_id: payload.file_id.clone(),
            owner: payload.user_id.clone(),
            mimetype: payload.mimetype.clone(),
            size: payload.size,
            iv: payload.iv.clone(),
            creation_date,
            replica_nodes: vec![originating_node.clone()],
            authorized_users: payload.authorized_users.clone(),
            version: 1,
        };
        self.save_metadata(&metadata)?;

        std::fs::create_dir_all(self.user_dir(&payload.user_id))?;
        let entry_path = self.available_filename_path(&payload.user_id, payload.filename.as_str());
        std::fs::hard_link(self.meta_path(&metadata.file_id), entry_path)?;

        Ok(metadata)
    }

    /// Merges newly authorized users into a file's metadata and hard-links
    /// a user-visible entry under `filename` for each of them, from a
    /// `file_shared` event. Mirrors `core/files.py: share()`.
    pub fn share(&self, payload: &FileSharedPayload) -> Result<FileMetadata, StoreError> {
        let mut metadata = self.get_metadata_by_id(&payload.file_id)?;
        let meta_path = self.meta_path(&payload.file_id);

        let mut by_user: std::collections::BTreeMap<String, AuthorizedUserEntry> = metadata
            .authorized_users
            .into_iter()
            .map(|u| (u.user_id.as_str().to_string(), u))
            .collect();
        for user in &payload.authorized_users {
            by_user.insert(user.user_id.as_str().to_string(), user.clone());

            std::fs::create_dir_all(self.user_dir(&user.user_id))?;
            let entry_path = self.available_filename_path(&user.user_id, payload.filename.as_str());
            std::fs::hard_link(&meta_path, entry_path)?;
        }
        metadata.authorized_users = by_user.into_values().collect();

        self.save_metadata(&metadata)?;
        Ok(metadata)
    }

    /// Updates a file's replica set from a `file_replicated` event.
    pub fn replicate(&self, payload: &FileReplicatedPayload, node_id: &NodeId) -> Result<(), StoreError> {
        let mut metadata = self.get_metadata_by_id(&payload.file_id)?;
        if !metadata.replica_nodes.contains(node_id) {
            metadata.replica_nodes.push(node_id.clone());
            self.save_metadata(&metadata)?;
        }
        Ok(())
    }

    /// Renames a user's entry from a `file_renamed` event.
    pub fn rename(&self, payload: &FileRenamedPayload) -> Result<(), StoreError> {
        let (entry_path, _) = self.resolve_entry(&payload.user_id, payload.old_filename.as_str())?;
        let new_path = self.available_filename_path(&payload.user_id, payload.new_filename.as_str());
        std::fs::rename(entry_path, new_path)?;
        Ok(())
    }

    /// Unlinks a user's entry from a `file_deleted` event. The blob and
    /// other users' entries are untouched.
    pub fn delete(&self, payload: &FileDeletedPayload) -> Result<(), StoreError> {
        let (entry_path, _) = self.resolve_entry(&payload.user_id, payload.filename.as_str())?;
        std::fs::remove_file(entry_path)?;
        Ok(())
    }

    pub fn get_metadata_by_id(&self, file_id: &FileId) -> Result<FileMetadata, StoreError> {
        if let Some(hit) = self.cache.lock().unwrap().get(file_id) {
            return Ok(hit.clone());
        }

        let path = self.meta_path(file_id);
        if !path.exists() {
            return Err(StoreError::NotFound {
                kind: "file",
                id: file_id.to_string(),
            });
        }
        let bytes = std::fs::read(&path)?;
        let metadata: FileMetadata = serde_json::from_slice(&bytes)?;
        self.cache.lock().unwrap().put(file_id.clone(), metadata.clone());
        Ok(metadata)
    }

    /// Resolves a user-visible filename to its backing entry path and
    /// metadata, rejecting any name that would resolve outside the
    /// user's own directory (`core/files.py: get_metadata_by_name`).
    fn resolve_entry(&self, user_id: &UserId, filename: &str) -> Result<(PathBuf, FileMetadata), StoreError> {
        let user_dir = self.user_dir(user_id);
        std::fs::create_dir_all(&user_dir)?;
        let user_dir = user_dir.canonicalize()?;
        let candidate = user_dir.join(filename);

        let resolved = candidate
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| user_dir.clone());
        if !resolved.starts_with(&user_dir) {
            return Err(StoreError::PathTraversal);
        }

        if !candidate.exists() {
            return Err(StoreError::NotFound {
                kind: "entry",
                id: filename.to_string(),
            });
        }
        let canonical = candidate.canonicalize()?;
        if !canonical.starts_with(&user_dir) {
            return Err(StoreError::PathTraversal);
        }

        let bytes = std::fs::read(&canonical)?;
        let metadata: FileMetadata = serde_json::from_slice(&bytes)?;
        Ok((candidate, metadata))
    }

    pub fn get_metadata_by_name(&self, user_id: &UserId, filename: &str) -> Result<FileMetadata, StoreError> {
        self.resolve_entry(user_id, filename).map(|(_, metadata)| metadata)
    }

    /// The user-visible directory listing, one row per hard-linked entry.
    pub fn list_files(&self, user_id: &UserId) -> Result<Vec<FileEntry>, StoreError> {
        let user_dir = self.user_dir(user_id);
        std::fs::create_dir_all(&user_dir)?;

        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&user_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let bytes = std::fs::read(entry.path())?;
            let metadata: FileMetadata = serde_json::from_slice(&bytes)?;
            entries.push(FileEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                file_id: metadata.file_id,
                size: metadata.size,
                mimetype: metadata.mimetype,
                creation_date: metadata.creation_date,
            });
        }
        Ok(entries)
    }

    pub fn get_owner(&self, file_id: &FileId) -> Result<UserId, StoreError> {
        Ok(self.get_metadata_by_id(file_id)?.owner)
    }

    /// Returns the recipient-wrapped content key and IV for `user_id`, if
    /// they are an authorized reader of `file_id`.
    pub fn get_user_crypto(&self, user_id: &UserId, file_id: &FileId) -> Result<Option<(Vec<u8>, Vec<u8>)>, StoreError> {
        let metadata = self.get_metadata_by_id(file_id)?;
        Ok(metadata
            .authorized_users
            .into_iter()
            .find(|u| &u.user_id == user_id)
            .map(|u| (u.encrypted_key, u.iv)))
    }

    pub fn user_has_access(&self, user_id: &UserId, file_id: &FileId) -> Result<bool, StoreError> {
        Ok(self.get_user_crypto(user_id, file_id)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dfs3_types::MimeType;

    fn store() -> (FileMetadataStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileMetadataStore::new(dir.path().join("meta"), dir.path().join("users"));
        (store, dir)
    }

    fn user(id: &str) -> UserId {
        UserId::try_from(id.repeat(64 / id.len())).unwrap()
    }

    fn file(id: &str) -> FileId {
        FileId::try_from(id.repeat(64 / id.len())).unwrap()
    }

    fn node(id: &str) -> NodeId {
        NodeId::try_from(id.repeat(64 / id.len())).unwrap()
    }

    fn created_payload(user_id: UserId, file_id: FileId, filename: &str) -> FileCreatedPayload {
        FileCreatedPayload {
            user_id,
            filename: Filename::try_from(filename.to_string()).unwrap(),
            file_id,
            mimetype: MimeType::try_from("text/plain".to_string()).unwrap(),
            size: 10,
            iv: vec![9, 9, 9, 9],
            authorized_users: vec![],
            version: 1,
        }
    }

    #[test]
    fn create_registers_metadata_and_hardlinked_entry() {
        let (store, _dir) = store();
        let payload = created_payload(user("a"), file("b"), "notes.txt");
        store.create(&payload, &node("c"), 1_700_000_000).unwrap();

        let metadata = store.get_metadata_by_id(&payload.file_id).unwrap();
        assert_eq!(metadata.owner, payload.user_id);

        let entry = store.get_metadata_by_name(&payload.user_id, "notes.txt").unwrap();
        assert_eq!(entry.file_id, payload.file_id);
    }

    #[test]
    fn duplicate_filename_gets_a_counter_suffix() {
        let (store, _dir) = store();
        let first = created_payload(user("a"), file("b"), "notes.txt");
        store.create(&first, &node("c"), 1).unwrap();

        let second = created_payload(user("a"), file("d"), "notes.txt");
        store.create(&second, &node("c"), 2).unwrap();

        let listing = store.list_files(&first.user_id).unwrap();
        assert_eq!(listing.len(), 2);
        assert!(listing.iter().any(|e| e.name == "notes (1).txt"));
    }

    #[test]
    fn path_traversal_is_rejected() {
        let (store, _dir) = store();
        let payload = created_payload(user("a"), file("b"), "notes.txt");
        store.create(&payload, &node("c"), 1).unwrap();

        let err = store.get_metadata_by_name(&payload.user_id, "../../../etc/passwd");
        assert!(err.is_err());
    }

    #[test]
    fn replicate_adds_node_once() {
        let (store, _dir) = store();
        let payload = created_payload(user("a"), file("b"), "notes.txt");
        store.create(&payload, &node("c"), 1).unwrap();

        let replicated = FileReplicatedPayload { file_id: payload.file_id.clone() };
        store.replicate(&replicated, &node("d")).unwrap();
        store.replicate(&replicated, &node("d")).unwrap();

        let metadata = store.get_metadata_by_id(&payload.file_id).unwrap();
        assert_eq!(metadata.replica_nodes.iter().filter(|n| **n == node("d")).count(), 1);
    }

    #[test]
    fn share_hardlinks_a_visible_entry_for_each_new_user() {
        let (store, _dir) = store();
        let owner = user("a");
        let payload = created_payload(owner.clone(), file("b"), "notes.txt");
        store.create(&payload, &node("c"), 1).unwrap();

        let bob = user("d");
        let shared = FileSharedPayload {
            user_id: owner.clone(),
            file_id: payload.file_id.clone(),
            filename: payload.filename.clone(),
            authorized_users: vec![AuthorizedUserEntry {
                user_id: bob.clone(),
                encrypted_key: vec![1, 2, 3],
                iv: vec![4, 5, 6],
            }],
        };
        let metadata = store.share(&shared).unwrap();
        assert_eq!(metadata.authorized_users.len(), 1);

        let entry = store.get_metadata_by_name(&bob, "notes.txt").unwrap();
        assert_eq!(entry.file_id, payload.file_id);
    }

    #[test]
    fn delete_unlinks_entry_but_keeps_metadata() {
        let (store, _dir) = store();
        let payload = created_payload(user("a"), file("b"), "notes.txt");
        store.create(&payload, &node("c"), 1).unwrap();

        let deleted = FileDeletedPayload {
            user_id: payload.user_id.clone(),
            file_id: payload.file_id.clone(),
            filename: payload.filename.clone(),
        };
        store.delete(&deleted).unwrap();

        assert!(store.get_metadata_by_name(&payload.user_id, "notes.txt").is_err());
        assert!(store.get_metadata_by_id(&payload.file_id).is_ok());
    }
}
