//! `/files` and `/file(s)/{..}` routes: the bulk of the surface, grounded
//! in `core/files.py` for the on-disk semantics and spec.md §6/§8 for the
//! wire shapes, headers and scenario behaviour (rewritten from scratch
//! here since the original's `api/routes/files.py` was only ever a stub).

use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tokio_util::io::ReaderStream;

use dfs3_store::{race_fetch, PEER_RACE_TIMEOUT};
use dfs3_types::events::{
    EventType, FileAccessedPayload, FileCreatedPayload, FileDeletedPayload, FileRenamedPayload, FileReplicatedPayload,
};
use dfs3_types::ids::FileId;
use dfs3_types::{ApiError, FileEntry, FileMetadata};

use crate::dto::{
    RenameFileRequest, ShareFileRequest, ShareFileResponse, SimpleStatusResponse, UploadFileMetadata, UploadFileResponse,
};
use crate::error::AppError;
use crate::extract::AuthenticatedUser;
use crate::state::AppState;

pub async fn list_files(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<Json<Vec<FileEntry>>, AppError> {
    Ok(Json(state.files.list_files(&caller)?))
}

/// `POST /files`: a `data` part (ciphertext) and a `metadata` part (JSON
/// of [`UploadFileMetadata`]). Writes the blob, then publishes
/// `file_created` — the metadata document and the uploader's own
/// directory entry are created when this node's own listener ingests
/// that event back off the bus, not synchronously here.
pub async fn upload(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadFileResponse>), AppError> {
    let mut metadata: Option<UploadFileMetadata> = None;
    let mut data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::from(ApiError::Validation(e.to_string())))?
    {
        match field.name() {
            Some("metadata") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::from(ApiError::Validation(e.to_string())))?;
                metadata = Some(
                    serde_json::from_str(&text)
                        .map_err(|e| AppError::from(ApiError::Validation(format!("invalid metadata: {e}"))))?,
                );
            }
            Some("data") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::from(ApiError::Validation(e.to_string())))?;
                data = Some(bytes.to_vec());
            }
            _ => {}
        }
    }

    let metadata = metadata.ok_or_else(|| AppError::from(ApiError::Validation("missing metadata part".into())))?;
    let data = data.ok_or_else(|| AppError::from(ApiError::Validation("missing data part".into())))?;

    if metadata.owner != caller {
        return Err(AppError::from(ApiError::Forbidden(
            "metadata.owner must match the authenticated caller".into(),
        )));
    }
    if metadata.sha256.as_str() != metadata.file_id.as_str() {
        return Err(AppError::from(ApiError::Validation(
            "metadata.sha256 must match metadata.file_id".into(),
        )));
    }
    if metadata.size != data.len() as u64 {
        return Err(AppError::from(ApiError::Validation(
            "metadata.size does not match the uploaded payload length".into(),
        )));
    }

    state.blobs.write_verified(&metadata.file_id, &data).await?;

    let payload = FileCreatedPayload {
        user_id: caller,
        filename: metadata.filename,
        file_id: metadata.file_id,
        mimetype: metadata.mimetype,
        size: metadata.size,
        iv: metadata.iv,
        authorized_users: metadata.authorized_users,
        version: 1,
    };
    state.publisher.publish(EventType::FileCreated, payload).await?;

    Ok((StatusCode::CREATED, Json(UploadFileResponse { status: "stored" })))
}

/// `GET /files/{filename}`: resolves the caller's own hard-linked entry
/// (which is itself the access check — an entry only exists for users
/// the file has been shared with), serves the blob locally if present,
/// otherwise races the known replica nodes, persists the winner, and
/// announces the new replica.
pub async fn download_by_name(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let metadata = state.files.get_metadata_by_name(&caller, &filename)?;
    let (encrypted_key, iv_key) = state
        .files
        .get_user_crypto(&caller, &metadata.file_id)?
        .ok_or_else(|| AppError::from(ApiError::Forbidden("not an authorized reader of this file".into())))?;

    let fetched_remotely = !state.blobs.exists(&metadata.file_id).await;
    let body = if fetched_remotely {
        let candidates: Vec<_> = metadata
            .replica_nodes
            .iter()
            .filter(|n| **n != state.local_node_id)
            .cloned()
            .collect();
        let bytes = race_fetch(state.fetcher.clone(), &candidates, &metadata.file_id, PEER_RACE_TIMEOUT).await?;

        // Proxy-while-store: tee the winner's body to the caller and to
        // disk at once, over a pipe, instead of persisting first and
        // serving only once the local replica is fully written.
        let (writer, reader) = tokio::io::duplex(64 * 1024);
        let blobs = state.blobs.clone();
        let publisher = state.publisher.clone();
        let file_id = metadata.file_id.clone();
        tokio::spawn(async move {
            match blobs.store_while_streaming(&file_id, bytes.as_slice(), writer).await {
                Ok(()) => {
                    let replicated = FileReplicatedPayload {
                        file_id: file_id.clone(),
                    };
                    if let Err(e) = publisher.publish(EventType::FileReplicated, replicated).await {
                        tracing::warn!(error = %e, %file_id, "failed to publish file_replicated");
                    }
                }
                Err(e) => tracing::warn!(error = %e, %file_id, "failed to persist proxied download locally"),
            }
        });
        Body::from_stream(ReaderStream::new(reader))
    } else {
        let file = state.blobs.open_read(&metadata.file_id).await?;
        Body::from_stream(ReaderStream::new(file))
    };

    let accessed = FileAccessedPayload {
        user_id: caller.clone(),
        file_id: metadata.file_id.clone(),
    };
    // Per design decision, a failed `file_accessed` publish aborts the
    // download rather than silently serving anyway.
    state.publisher.publish(EventType::FileAccessed, accessed).await?;

    let owner_public_key = state.users.get_public_key(&metadata.owner)?.unwrap_or_default();

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_DISPOSITION,
        header_value(&format!("attachment; filename=\"{filename}\"")),
    );
    headers.insert("X-DFS3-File-ID", header_value(metadata.file_id.as_str()));
    headers.insert("X-DFS3-Owner", header_value(metadata.owner.as_str()));
    headers.insert("X-DFS3-Public-Key", header_value(&owner_public_key));
    headers.insert("X-DFS3-Size", header_value(&metadata.size.to_string()));
    headers.insert("X-DFS3-IV", header_value(&STANDARD.encode(&metadata.iv)));
    headers.insert("X-DFS3-SHA256", header_value(metadata.file_id.as_str()));
    headers.insert("X-DFS3-Mimetype", header_value(metadata.mimetype.as_str()));
    headers.insert("X-DFS3-Encrypted-Key", header_value(&STANDARD.encode(&encrypted_key)));
    headers.insert("X-DFS3-IV-Key", header_value(&STANDARD.encode(&iv_key)));

    Ok((headers, body).into_response())
}

fn header_value(value: &str) -> HeaderValue {
    HeaderValue::from_str(value).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// `GET /files/{file_id}/data`: the unauthenticated peer-to-peer blob
/// route other nodes fetch from during the multi-peer race. Ciphertext
/// is content-addressed and opaque without the recipient's wrapped key,
/// so no caller identity is required here.
pub async fn download_by_id(
    State(state): State<AppState>,
    Path(file_id): Path<FileId>,
) -> Result<Response, AppError> {
    let file = state.blobs.open_read(&file_id).await?;
    let body = Body::from_stream(ReaderStream::new(file));
    Ok(body.into_response())
}

pub async fn get_meta(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(file_id): Path<FileId>,
) -> Result<Json<FileMetadata>, AppError> {
    let metadata = state.files.get_metadata_by_id(&file_id)?;
    let authorized = metadata.owner == caller || state.files.user_has_access(&caller, &file_id)?;
    if !authorized {
        return Err(AppError::from(ApiError::Forbidden(
            "not authorized to read this file's metadata".into(),
        )));
    }
    Ok(Json(metadata))
}

pub async fn share(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(body): Json<ShareFileRequest>,
) -> Result<Json<ShareFileResponse>, AppError> {
    let owner = state.files.get_owner(&body.file_id)?;
    if owner != caller {
        return Err(AppError::from(ApiError::Forbidden(
            "only the owner may share this file".into(),
        )));
    }

    let payload = dfs3_types::events::FileSharedPayload {
        user_id: caller,
        file_id: body.file_id,
        filename: body.filename,
        authorized_users: body.authorized_users,
    };
    state.publisher.publish(EventType::FileShared, payload).await?;

    Ok(Json(ShareFileResponse { status: "shared" }))
}

pub async fn rename(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(filename): Path<String>,
    Json(body): Json<RenameFileRequest>,
) -> Result<Json<SimpleStatusResponse>, AppError> {
    let metadata = state.files.get_metadata_by_name(&caller, &filename)?;
    let old_filename = dfs3_types::ids::Filename::try_from(filename)
        .map_err(|e| AppError::from(ApiError::Validation(e.to_string())))?;

    let payload = FileRenamedPayload {
        user_id: caller,
        file_id: metadata.file_id,
        old_filename,
        new_filename: body.new_name,
    };
    state.publisher.publish(EventType::FileRenamed, payload).await?;

    Ok(Json(SimpleStatusResponse { status: "renamed" }))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(filename): Path<String>,
) -> Result<Json<SimpleStatusResponse>, AppError> {
    let metadata = state.files.get_metadata_by_name(&caller, &filename)?;
    let filename = dfs3_types::ids::Filename::try_from(filename)
        .map_err(|e| AppError::from(ApiError::Validation(e.to_string())))?;

    let payload = FileDeletedPayload {
        user_id: caller,
        file_id: metadata.file_id,
        filename,
    };
    state.publisher.publish(EventType::FileDeleted, payload).await?;

    Ok(Json(SimpleStatusResponse { status: "deleted" }))
}
