use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::validator::{UploadError, ValidatedName};

/// URL prefix the upload directory is mounted under.
pub const UPLOAD_URL_PREFIX: &str = "/static/uploads";

/// An image accepted for this request and written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    pub path: PathBuf,
    pub stored_name: String,
    pub original_filename: String,
    pub size: usize,
    pub extension: String,
}

impl StoredUpload {
    pub fn url(&self) -> String {
        format!("{}/{}", UPLOAD_URL_PREFIX, self.stored_name)
    }
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure_dir(&self) -> Result<(), UploadError> {
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Request-unique name so concurrent uploads of the same file never collide.
    pub fn generate_stored_name(sanitized: &str) -> String {
        format!("{}_{}", Uuid::new_v4().simple(), sanitized)
    }

    pub fn save(&self, name: &ValidatedName, data: &[u8]) -> Result<StoredUpload, UploadError> {
        if data.is_empty() {
            return Err(UploadError::EmptyFile);
        }
        self.ensure_dir()?;

        let stored_name = Self::generate_stored_name(&name.sanitized);
        let path = self.dir.join(&stored_name);
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;
        file.write_all(data)?;

        log::info!(
            "Stored upload {:?} as {} ({} bytes)",
            name.original,
            stored_name,
            data.len()
        );
        Ok(StoredUpload {
            path,
            stored_name,
            original_filename: name.original.clone(),
            size: data.len(),
            extension: name.extension.clone(),
        })
    }

    /// Best-effort removal of an upload whose request failed.
    pub fn remove(&self, upload: &StoredUpload) {
        match fs::remove_file(&upload.path) {
            Ok(()) => log::debug!("Removed orphaned upload {}", upload.stored_name),
            Err(e) => log::error!(
                "Failed to remove orphaned upload {}: {}",
                upload.path.display(),
                e
            ),
        }
    }
}
