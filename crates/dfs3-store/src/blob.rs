//! Content-addressed ciphertext blob store: one file per `file_id` under
//! `<storage>/<file_id>.dat`, written atomically via a temp-file rename
//! (mirrors the teacher's file-backed KV adapter) and verified against
//! its own SHA-256 digest on the way in.

use std::path::PathBuf;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use dfs3_crypto::sha256_hex;
use dfs3_types::FileId;

use crate::errors::StoreError;

/// Maximum ciphertext size accepted for a single blob.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

pub struct BlobStore {
    storage_dir: PathBuf,
}

impl BlobStore {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
        }
    }

    pub fn path_for(&self, file_id: &FileId) -> PathBuf {
        self.storage_dir.join(format!("{}.dat", file_id.as_str()))
    }

    pub async fn exists(&self, file_id: &FileId) -> bool {
        tokio::fs::metadata(self.path_for(file_id)).await.is_ok()
    }

    /// Writes `bytes` as `file_id`'s blob after checking its size and that
    /// `sha256(bytes) == file_id`.
    pub async fn write_verified(&self, file_id: &FileId, bytes: &[u8]) -> Result<(), StoreError> {
        if bytes.len() as u64 > MAX_FILE_SIZE {
            return Err(StoreError::SizeExceeded {
                limit: MAX_FILE_SIZE,
                actual: bytes.len() as u64,
            });
        }
        let digest = sha256_hex(bytes);
        if digest != file_id.as_str() {
            return Err(StoreError::IntegrityMismatch {
                expected: file_id.to_string(),
                actual: digest,
            });
        }

        tokio::fs::create_dir_all(&self.storage_dir).await?;
        let final_path = self.path_for(file_id);
        let temp_path = final_path.with_extension("dat.tmp");

        let mut file = tokio::fs::File::create(&temp_path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&temp_path, &final_path).await?;
        Ok(())
    }

    pub async fn read(&self, file_id: &FileId) -> Result<Vec<u8>, StoreError> {
        let path = self.path_for(file_id);
        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound {
                    kind: "blob",
                    id: file_id.to_string(),
                }
            } else {
                StoreError::Io(e)
            }
        })
    }

    pub async fn open_read(&self, file_id: &FileId) -> Result<tokio::fs::File, StoreError> {
        tokio::fs::File::open(self.path_for(file_id)).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound {
                    kind: "blob",
                    id: file_id.to_string(),
                }
            } else {
                StoreError::Io(e)
            }
        })
    }

    /// Tees an incoming peer-fetch stream to both the caller (`sink`, e.g.
    /// the proxied HTTP response body) and to disk, verifying the full
    /// ciphertext's digest only once the stream is exhausted. A failed
    /// verification deletes the partial file; the bytes already forwarded
    /// to `sink` are unaffected, matching the "proxy-while-store" download
    /// path: a client in flight is served regardless of whether the local
    /// replica ends up being kept.
    pub async fn store_while_streaming<R, W>(
        &self,
        file_id: &FileId,
        mut source: R,
        mut sink: W,
    ) -> Result<(), StoreError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tokio::fs::create_dir_all(&self.storage_dir).await?;
        let final_path = self.path_for(file_id);
        let temp_path = final_path.with_extension("dat.tmp");

        let mut temp_file = tokio::fs::File::create(&temp_path).await?;
        let mut buf = [0u8; 64 * 1024];
        let mut total = 0u64;

        loop {
            let n = source.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            total += n as u64;
            if total > MAX_FILE_SIZE {
                drop(temp_file);
                let _ = tokio::fs::remove_file(&temp_path).await;
                return Err(StoreError::SizeExceeded {
                    limit: MAX_FILE_SIZE,
                    actual: total,
                });
            }
            sink.write_all(&buf[..n]).await?;
            temp_file.write_all(&buf[..n]).await?;
        }
        temp_file.sync_all().await?;
        drop(temp_file);

        let bytes = tokio::fs::read(&temp_path).await?;
        let digest = sha256_hex(&bytes);
        if digest != file_id.as_str() {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(StoreError::IntegrityMismatch {
                expected: file_id.to_string(),
                actual: digest,
            });
        }

        tokio::fs::rename(&temp_path, &final_path).await?;
        Ok(())
    }
}
