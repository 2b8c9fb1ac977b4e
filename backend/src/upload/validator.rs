use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::config::UploadConfig;

lazy_static! {
    static ref UNSAFE_FILENAME_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_.-]").unwrap();
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("no file field in request")]
    MissingFile,
    #[error("empty filename")]
    EmptyFilename,
    #[error("extension not allowed: {0:?}")]
    DisallowedExtension(String),
    #[error("upload exceeds {limit} bytes")]
    TooLarge { limit: usize },
    #[error("uploaded file is empty")]
    EmptyFile,
    #[error("malformed multipart payload: {0}")]
    Multipart(String),
    #[error("failed to store upload: {0}")]
    Storage(#[from] std::io::Error),
}

/// Filename that passed validation, with its sanitized form and extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedName {
    pub original: String,
    pub sanitized: String,
    pub extension: String,
}

#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_bytes: usize,
    pub allowed_extensions: Vec<String>,
}

impl From<&UploadConfig> for UploadPolicy {
    fn from(config: &UploadConfig) -> Self {
        Self {
            max_bytes: config.max_bytes,
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|e| e.to_ascii_lowercase())
                .collect(),
        }
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::from(&UploadConfig::default())
    }
}

impl UploadPolicy {
    pub fn validate_filename(&self, filename: Option<&str>) -> Result<ValidatedName, UploadError> {
        let original = filename.unwrap_or_default();
        if original.is_empty() {
            return Err(UploadError::EmptyFilename);
        }
        let extension = extension_of(original)
            .filter(|ext| self.allowed_extensions.iter().any(|a| a == ext))
            .ok_or_else(|| UploadError::DisallowedExtension(original.to_string()))?;

        Ok(ValidatedName {
            original: original.to_string(),
            sanitized: sanitize_filename(original, &extension),
            extension,
        })
    }

    pub fn check_size(&self, size: usize) -> Result<(), UploadError> {
        if size > self.max_bytes {
            return Err(UploadError::TooLarge {
                limit: self.max_bytes,
            });
        }
        Ok(())
    }
}

/// Lowercased text after the last dot, if any.
pub fn extension_of(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Reduces a client filename to `[A-Za-z0-9_.-]`, flattening any path
/// components. Accented letters keep their base letter (NFKD). Falls back to
/// `upload.<ext>` when nothing usable is left.
pub fn sanitize_filename(filename: &str, extension: &str) -> String {
    let ascii: String = filename
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(&joined, "");
    let trimmed = cleaned.trim_matches(|c: char| c == '.' || c == '_');

    if trimmed.is_empty() {
        return format!("upload.{}", extension);
    }
    if extension_of(trimmed).as_deref() == Some(extension) {
        trimmed.to_string()
    } else {
        format!("{}.{}", trimmed, extension)
    }
}
