//! Local staging of uploaded images
//!
//! The relay writes each upload to `UPLOAD_DIR/<uuid>.<ext>` before handing
//! the path to the generation job, and removes it once the job has settled.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::{debug, warn};
use uuid::Uuid;

/// An image received from a client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl ImageUpload {
    /// File extension to stage under: taken from the client's file name when it
    /// is plain alphanumeric, otherwise derived from the content type.
    pub fn extension(&self) -> String {
        let from_name = Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty() && e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|e| e.to_ascii_lowercase());

        from_name
            .or_else(|| {
                mime_guess::get_mime_extensions_str(&self.content_type)
                    .and_then(|exts| exts.first())
                    .map(|e| e.to_string())
            })
            .unwrap_or_else(|| "bin".to_string())
    }
}

/// A staged upload on disk.
///
/// [`StagedUpload::discard`] removes the file without blocking. A staged
/// upload that is dropped without being discarded (the request future was
/// cancelled, or staging failed halfway) removes its file synchronously.
#[derive(Debug)]
pub struct StagedUpload {
    path: PathBuf,
    removed: bool,
}

impl StagedUpload {
    pub async fn stage(dir: &Path, upload: &ImageUpload) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(dir).await?;

        let staged = Self {
            path: dir.join(format!("{}.{}", Uuid::new_v4(), upload.extension())),
            removed: false,
        };
        // A partial write is cleaned up when `staged` drops on the error path.
        tokio::fs::write(&staged.path, &upload.data).await?;

        debug!(path = %staged.path.display(), bytes = upload.data.len(), "Staged upload");
        Ok(staged)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the staged file. Failure is logged, not returned.
    pub async fn discard(mut self) {
        self.removed = true;
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            log_removal_error(&self.path, &e);
        }
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed abandoned upload"),
            Err(e) => log_removal_error(&self.path, &e),
        }
    }
}

fn log_removal_error(path: &Path, err: &std::io::Error) {
    if err.kind() != std::io::ErrorKind::NotFound {
        warn!(path = %path.display(), error = %err, "Error deleting staged upload");
    }
}
