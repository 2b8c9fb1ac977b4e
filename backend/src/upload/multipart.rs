use actix_multipart::{Field, Multipart, MultipartError};
use futures::TryStreamExt;

use super::validator::{UploadError, UploadPolicy, ValidatedName};

/// Multipart field carrying the image.
pub const FILE_FIELD: &str = "file";

#[derive(Debug)]
pub struct UploadedFile {
    pub name: ValidatedName,
    pub bytes: Vec<u8>,
}

/// Pulls the `file` field out of the form. The filename is validated before
/// any of its bytes are buffered, and reading stops as soon as the size limit
/// is crossed.
pub async fn read_upload(
    mut payload: Multipart,
    policy: &UploadPolicy,
) -> Result<UploadedFile, UploadError> {
    while let Some(mut field) = payload.try_next().await.map_err(multipart_error)? {
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_owned);
        // A `file` part without a filename is a plain form value, not an upload.
        let Some(filename) = filename.filter(|_| field.name() == Some(FILE_FIELD)) else {
            read_limited(&mut field, policy).await?;
            continue;
        };

        let name = policy.validate_filename(Some(&filename))?;
        let bytes = read_limited(&mut field, policy).await?;
        if bytes.is_empty() {
            return Err(UploadError::EmptyFile);
        }
        return Ok(UploadedFile { name, bytes });
    }
    Err(UploadError::MissingFile)
}

async fn read_limited(field: &mut Field, policy: &UploadPolicy) -> Result<Vec<u8>, UploadError> {
    let mut data = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
        policy.check_size(data.len() + chunk.len())?;
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

fn multipart_error(err: MultipartError) -> UploadError {
    UploadError::Multipart(err.to_string())
}
