//! Multipart image extractor for avatar and logo uploads.
//!
//! Reads the part named `file` into an [`ImageUpload`]. Content type and
//! size rules are applied by the upload service, not here.

use axum::{
    async_trait,
    extract::{
        multipart::{Multipart, MultipartError},
        FromRequest, Request,
    },
    http::StatusCode,
};

use crate::error::{ApiError, ErrorCode};
use crate::services::ImageUpload;

/// Name of the multipart part carrying the image.
pub const IMAGE_FIELD: &str = "file";

/// An image pulled out of a `multipart/form-data` body.
#[derive(Debug, Clone)]
pub struct ImageForm(pub ImageUpload);

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::new(ErrorCode::PayloadTooLarge, err.body_text())
    } else {
        ApiError::invalid_input(err.body_text())
    }
}

#[async_trait]
impl<S> FromRequest<S> for ImageForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| ApiError::invalid_input(e.body_text()))?;

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            if field.name() != Some(IMAGE_FIELD) {
                continue;
            }
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let file_name = field.file_name().map(str::to_string);
            let bytes = field.bytes().await.map_err(multipart_error)?;
            return Ok(ImageForm(ImageUpload {
                bytes: bytes.to_vec(),
                content_type,
                file_name,
            }));
        }

        Err(ApiError::missing_field(IMAGE_FIELD))
    }
}
