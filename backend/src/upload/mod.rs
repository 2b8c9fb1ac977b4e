pub mod multipart;
pub mod storage;
pub mod validator;

pub use multipart::{FILE_FIELD, UploadedFile, read_upload};
pub use storage::{StoredUpload, UPLOAD_URL_PREFIX, UploadStore};
pub use validator::{UploadError, UploadPolicy, ValidatedName};
