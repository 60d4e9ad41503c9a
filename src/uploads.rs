//! Uploaded media lives on the local filesystem under the configured
//! upload directory and is served back at `/uploads/...`.

use bytes::Bytes;
use std::path::Path;
use uuid::Uuid;

use crate::{AppError, Result};

const ALLOWED_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "webp", "mp4", "webm"];

/// Writes one uploaded file under `<dir>/<kind>/` and returns its public
/// path. The stored name is a fresh uuid; only the extension survives
/// from the client-supplied filename.
pub async fn save_upload(dir: &Path, kind: &str, filename: &str, data: Bytes) -> Result<String> {
    if data.is_empty() {
        return Err(AppError::Validation("empty upload".to_string()));
    }
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| AppError::Validation(format!("unsupported file type: {filename}")))?;
    let kind = sanitize_kind(kind);
    let target_dir = dir.join(&kind);
    tokio::fs::create_dir_all(&target_dir).await?;
    let name = format!("{}.{extension}", Uuid::new_v4());
    tokio::fs::write(target_dir.join(&name), &data).await?;
    Ok(format!("/uploads/{kind}/{name}"))
}

/// Best-effort removal of a previously stored file. A missing file is
/// fine; other filesystem errors are logged and swallowed so the owning
/// database mutation is never blocked.
pub async fn remove_upload(dir: &Path, public_path: &str) {
    let Some(relative) = public_path.strip_prefix("/uploads/") else {
        return;
    };
    if relative.is_empty() || relative.contains("..") {
        return;
    }
    if let Err(e) = tokio::fs::remove_file(dir.join(relative)).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("failed to remove upload {public_path}: {e}");
        }
    }
}

/// Removes the old file when an image reference changed or went away.
pub async fn remove_replaced(dir: &Path, old: &str, new: &str) {
    if !old.is_empty() && old != new {
        remove_upload(dir, old).await;
    }
}

fn sanitize_kind(kind: &str) -> String {
    let cleaned: String = kind
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if cleaned.is_empty() {
        "misc".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_and_remove_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_upload(dir.path(), "carousel", "banner.PNG", Bytes::from_static(b"img"))
            .await
            .unwrap();
        assert!(path.starts_with("/uploads/carousel/"));
        assert!(path.ends_with(".png"));
        let on_disk = dir.path().join(path.strip_prefix("/uploads/").unwrap());
        assert!(on_disk.exists());
        remove_upload(dir.path(), &path).await;
        assert!(!on_disk.exists());
    }

    #[tokio::test]
    async fn missing_file_does_not_error() {
        let dir = tempfile::tempdir().unwrap();
        // Must not panic or log an error path besides NotFound.
        remove_upload(dir.path(), "/uploads/carousel/gone.png").await;
    }

    #[tokio::test]
    async fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let result = save_upload(dir.path(), "video", "run.exe", Bytes::from_static(b"x")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn replaced_image_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let old = save_upload(dir.path(), "carousel", "a.jpg", Bytes::from_static(b"a"))
            .await
            .unwrap();
        let on_disk = dir.path().join(old.strip_prefix("/uploads/").unwrap());
        remove_replaced(dir.path(), &old, "/uploads/carousel/other.jpg").await;
        assert!(!on_disk.exists());
    }

    #[tokio::test]
    async fn unchanged_image_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_upload(dir.path(), "carousel", "a.jpg", Bytes::from_static(b"a"))
            .await
            .unwrap();
        let on_disk = dir.path().join(path.strip_prefix("/uploads/").unwrap());
        remove_replaced(dir.path(), &path, &path).await;
        assert!(on_disk.exists());
    }
}
