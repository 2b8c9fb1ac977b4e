use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use shared::ErrorResponse;

use crate::inference::engine::InferenceError;
use crate::inference::preprocess::PreprocessError;
use crate::upload::UploadError;

/// Failure kinds a prediction request can end in. Advisory failures are
/// absorbed by the generator and never show up here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    ImageDecode,
    ClassifierFailure,
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("upload rejected: {0}")]
    Upload(#[from] UploadError),
    #[error("image decode failed: {0}")]
    ImageDecode(#[from] PreprocessError),
    #[error("classifier failed: {0}")]
    Classifier(#[from] InferenceError),
    #[error("blocking task failed: {0}")]
    Blocking(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Upload(UploadError::Storage(_)) => ErrorKind::Internal,
            AppError::Upload(_) => ErrorKind::InvalidInput,
            AppError::ImageDecode(_) => ErrorKind::ImageDecode,
            AppError::Classifier(_) => ErrorKind::ClassifierFailure,
            AppError::Blocking(_) => ErrorKind::Internal,
        }
    }

    /// The status and message a client sees. All user-facing error text is
    /// produced here.
    pub fn report(&self) -> (StatusCode, String) {
        match self {
            AppError::Upload(err) => match err {
                UploadError::MissingFile => (StatusCode::BAD_REQUEST, "No file uploaded".into()),
                UploadError::EmptyFilename => (StatusCode::BAD_REQUEST, "No file selected".into()),
                UploadError::DisallowedExtension(_) => (
                    StatusCode::BAD_REQUEST,
                    "Invalid file type. Please upload a PNG, JPG, or JPEG image.".into(),
                ),
                UploadError::TooLarge { limit } => (
                    StatusCode::PAYLOAD_TOO_LARGE,
                    format!(
                        "File too large. Maximum upload size is {}.",
                        describe_limit(*limit)
                    ),
                ),
                UploadError::EmptyFile => {
                    (StatusCode::BAD_REQUEST, "Uploaded file is empty".into())
                }
                UploadError::Multipart(_) => {
                    (StatusCode::BAD_REQUEST, "Malformed multipart upload".into())
                }
                UploadError::Storage(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to store upload".into(),
                ),
            },
            AppError::ImageDecode(err) => prediction_failure(err),
            AppError::Classifier(err) => prediction_failure(err),
            AppError::Blocking(msg) => prediction_failure(msg),
        }
    }
}

const MIB: usize = 1024 * 1024;

/// Whole MiB print as `16 MB`, other sizes of at least 1 MiB with one
/// decimal, and anything smaller in bytes.
fn describe_limit(limit: usize) -> String {
    if limit >= MIB && limit % MIB == 0 {
        format!("{} MB", limit / MIB)
    } else if limit >= MIB {
        format!("{:.1} MB", limit as f64 / MIB as f64)
    } else {
        format!("{} bytes", limit)
    }
}

fn prediction_failure(detail: impl std::fmt::Display) -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Error during prediction: {}", detail),
    )
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.report().0
    }

    fn error_response(&self) -> HttpResponse {
        let (status, error) = self.report();
        if status.is_server_error() {
            log::error!("Prediction request failed ({:?}): {}", self.kind(), self);
        } else {
            log::info!("Prediction request rejected ({:?}): {}", self.kind(), self);
        }
        HttpResponse::build(status).json(ErrorResponse { error })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_maps_to_client_errors() {
        let cases = [
            (UploadError::MissingFile, "No file uploaded"),
            (UploadError::EmptyFilename, "No file selected"),
            (
                UploadError::DisallowedExtension("leaf.gif".into()),
                "Invalid file type. Please upload a PNG, JPG, or JPEG image.",
            ),
        ];
        for (err, message) in cases {
            let err = AppError::from(err);
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
            assert_eq!(err.report(), (StatusCode::BAD_REQUEST, message.to_string()));
        }
    }

    #[test]
    fn oversize_is_413() {
        let err = AppError::from(UploadError::TooLarge {
            limit: 16 * 1024 * 1024,
        });
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.report().1, "File too large. Maximum upload size is 16 MB.");
    }

    #[test]
    fn oversize_message_reflects_odd_limits() {
        let message = |limit| AppError::from(UploadError::TooLarge { limit }).report().1;
        assert_eq!(
            message(10_000_000),
            "File too large. Maximum upload size is 9.5 MB."
        );
        assert_eq!(
            message(1024),
            "File too large. Maximum upload size is 1024 bytes."
        );
        assert_eq!(
            message(3 * 1024 * 1024),
            "File too large. Maximum upload size is 3 MB."
        );
    }

    #[test]
    fn processing_failures_are_500_with_prefix() {
        let err = AppError::from(InferenceError::Model("boom".into()));
        assert_eq!(err.kind(), ErrorKind::ClassifierFailure);
        let (status, message) = err.report();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Error during prediction: model error: boom");

        let decode = image::load_from_memory(b"nope").unwrap_err();
        let err = AppError::from(PreprocessError::from(decode));
        assert_eq!(err.kind(), ErrorKind::ImageDecode);
        assert!(err.report().1.starts_with("Error during prediction: failed to decode image"));
    }

    #[test]
    fn storage_failure_is_internal() {
        let err = AppError::from(UploadError::Storage(std::io::Error::other("disk full")));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.report().1, "Failed to store upload");
    }
}
