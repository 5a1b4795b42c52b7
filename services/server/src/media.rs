use std::path::PathBuf;

use sha2::{Digest, Sha256};

/// File storage for media blobs and thumbnail generation live outside
/// this core; this trait is the seam imposed on that external
/// collaborator, mirroring [`crate::auth::TokenVerifier`].
///
/// A production deployment plugs in an implementation backed by object
/// storage and a real thumbnailer; [`LocalFsMediaStorage`] is the
/// local-disk implementation suitable for development and integration
/// tests.
#[async_trait::async_trait]
pub trait MediaStorage: Send + Sync + 'static {
    async fn store(&self, owner_id: i64, content_type: &str, bytes: &[u8]) -> std::io::Result<StoredMedia>;
}

#[derive(Debug, Clone)]
pub struct StoredMedia {
    pub storage_path: String,
    pub thumbnail_path: Option<String>,
}

/// Writes uploads under `root/<owner_id>/<sha256-of-bytes>`, content-addressed
/// so re-uploading identical bytes is a cheap no-op write. No thumbnail is
/// generated here — thumbnailing lives outside this core.
pub struct LocalFsMediaStorage {
    root: PathBuf,
}

impl LocalFsMediaStorage {
    pub fn new(root: PathBuf) -> Self {
        LocalFsMediaStorage { root }
    }
}

#[async_trait::async_trait]
impl MediaStorage for LocalFsMediaStorage {
    async fn store(&self, owner_id: i64, content_type: &str, bytes: &[u8]) -> std::io::Result<StoredMedia> {
        let digest = hex::encode(Sha256::digest(bytes));
        let ext = extension_for(content_type);
        let dir = self.root.join(owner_id.to_string());
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(format!("{digest}{ext}"));
        tokio::fs::write(&path, bytes).await?;
        Ok(StoredMedia {
            storage_path: path.to_string_lossy().into_owned(),
            thumbnail_path: None,
        })
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => ".png",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        "video/mp4" => ".mp4",
        "audio/mpeg" => ".mp3",
        "audio/ogg" => ".ogg",
        _ => ".bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_writes_content_addressed_file_under_owner_directory() {
        let dir = std::env::temp_dir().join(format!("rt-media-test-{}", std::process::id()));
        let storage = LocalFsMediaStorage::new(dir.clone());
        let stored = storage.store(42, "image/png", b"hello").await.unwrap();
        assert!(stored.storage_path.contains("42"));
        assert!(stored.storage_path.ends_with(".png"));
        assert!(tokio::fs::try_exists(&stored.storage_path).await.unwrap());
        tokio::fs::remove_dir_all(&dir).await.ok();
    }
}
