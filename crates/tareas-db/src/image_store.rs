//! Filesystem store for task image attachments.
//!
//! Images are stored under a base directory and referenced from the
//! task row by a relative path of the form `/images/<uuid>.<ext>`.
//! Writes are atomic (temp file + rename) and deletes are idempotent,
//! so a missing file never fails a delete.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use tareas_core::{Error, Result};

/// URL prefix under which stored images are referenced and served.
pub const IMAGE_PATH_PREFIX: &str = "/images/";

/// File store contract for task attachments.
///
/// Allows abstracting over filesystem or other storage providers, and
/// lets the record mutator be tested against a fake.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store an uploaded image under a fresh unique name.
    ///
    /// Returns the relative reference path (`/images/<name>`) to put
    /// in the task row.
    async fn store(&self, original_filename: &str, data: &[u8]) -> Result<String>;

    /// Delete the image at the given reference path.
    ///
    /// Deleting a path whose file is already absent is not an error.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Check whether a file exists at the given reference path.
    async fn exists(&self, path: &str) -> Result<bool>;
}

/// Generate a unique stored filename, keeping a sanitized extension
/// from the client-supplied name.
pub fn generate_image_name(original_filename: &str) -> String {
    let ext = Path::new(original_filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| !e.is_empty() && e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()));

    match ext {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    }
}

/// Filesystem image store.
///
/// Stores files flat under `{base_path}` and serves them from the
/// `/images` prefix.
pub struct FilesystemImageStore {
    base_path: PathBuf,
}

impl FilesystemImageStore {
    /// Create a new filesystem store rooted at the given directory.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Resolve a reference path (`/images/<name>`) to the on-disk
    /// location, rejecting anything outside the base directory.
    fn full_path(&self, path: &str) -> Result<PathBuf> {
        let name = path
            .strip_prefix(IMAGE_PATH_PREFIX)
            .ok_or_else(|| Error::Attachment(format!("invalid image reference: {}", path)))?;
        if name.is_empty() || name.contains('/') || name.contains("..") {
            return Err(Error::Attachment(format!(
                "invalid image reference: {}",
                path
            )));
        }
        Ok(self.base_path.join(name))
    }

    /// Validate that the store can write, read, and delete files.
    ///
    /// Performs a full round-trip at startup to catch filesystem
    /// issues (permission errors, missing directories) early.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        let probe = self.base_path.join(".store-probe");
        let payload = b"probe";

        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| format!("cannot create {}: {}", self.base_path.display(), e))?;
        fs::write(&probe, payload)
            .await
            .map_err(|e| format!("cannot write under {}: {}", self.base_path.display(), e))?;
        let read_back = fs::read(&probe)
            .await
            .map_err(|e| format!("cannot read back probe file: {}", e))?;
        if read_back != payload {
            return Err("probe file read back different contents".to_string());
        }
        fs::remove_file(&probe)
            .await
            .map_err(|e| format!("cannot delete probe file: {}", e))?;

        Ok(())
    }
}

#[async_trait]
impl ImageStore for FilesystemImageStore {
    async fn store(&self, original_filename: &str, data: &[u8]) -> Result<String> {
        let name = generate_image_name(original_filename);
        let ref_path = format!("{}{}", IMAGE_PATH_PREFIX, name);
        let full_path = self.base_path.join(&name);
        debug!(image_path = %ref_path, size = data.len(), "image_store: write");

        fs::create_dir_all(&self.base_path).await.map_err(|e| {
            warn!(base = %self.base_path.display(), error = %e, "image_store: create_dir_all failed");
            e
        })?;

        // Atomic write: temp file + rename
        let temp_path = full_path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            warn!(temp_path = %temp_path.display(), error = %e, "image_store: File::create failed");
            e
        })?;
        file.write_all(data).await.map_err(|e| {
            warn!(error = %e, "image_store: write_all failed");
            e
        })?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &full_path).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "image_store: rename failed");
            e
        })?;

        // Set permissions to 0644 (rw-r--r--, no execute)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&full_path, std::fs::Permissions::from_mode(0o644)).await?;
        }

        Ok(ref_path)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full_path = self.full_path(path)?;
        if fs::try_exists(&full_path).await? {
            fs::remove_file(full_path).await?;
        }
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let full_path = self.full_path(path)?;
        Ok(fs::try_exists(full_path).await?)
    }
}
