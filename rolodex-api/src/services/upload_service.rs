//! Upload Service
//!
//! Contact avatars and company logos go to public buckets; the public URL
//! is then written to the owning row.

use rolodex_core::{now, ActivityAction, Company, Contact, EntityId, EntityType, Table};
use rolodex_storage::{Backend, ObjectStore};
use serde_json::json;

use super::{fetch_owned, owned_id, ActivityLogger};
use crate::auth::AuthContext;
use crate::error::{ApiError, ApiResult};
use crate::types::UploadResponse;

pub const AVATAR_BUCKET: &str = "avatars";
pub const COMPANY_LOGO_BUCKET: &str = "company-logos";

/// An image received from a multipart form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub file_name: Option<String>,
}

impl ImageUpload {
    /// Reject non-images, empty files and files over `max_bytes`.
    pub fn check(&self, max_bytes: usize) -> ApiResult<()> {
        if !self.content_type.starts_with("image/") {
            return Err(ApiError::unsupported_media_type(&self.content_type));
        }
        if self.bytes.is_empty() {
            return Err(ApiError::invalid_input("Uploaded file is empty"));
        }
        if self.bytes.len() > max_bytes {
            return Err(ApiError::payload_too_large(max_bytes));
        }
        Ok(())
    }

    /// File extension, from the file name if it has a sane one, else from the content type.
    pub fn extension(&self) -> String {
        let from_name = self
            .file_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()));
        if let Some(ext) = from_name {
            return ext;
        }

        let subtype = self
            .content_type
            .strip_prefix("image/")
            .unwrap_or("bin")
            .split(['+', ';'])
            .next()
            .unwrap_or("bin");
        match subtype {
            "jpeg" => "jpg".to_string(),
            "" => "bin".to_string(),
            other => other.to_ascii_lowercase(),
        }
    }
}

/// `{user_id}/{entity_id}-{uuid}.{ext}`
pub fn object_path(auth: &AuthContext, entity_id: EntityId, extension: &str) -> String {
    format!(
        "{}/{}-{}.{}",
        auth.user_id,
        entity_id,
        uuid::Uuid::new_v4(),
        extension
    )
}

/// Upload, then point `column` of the row at the public URL.
///
/// If the row update fails the uploaded object is removed again.
async fn store_image(
    backend: &dyn Backend,
    objects: &dyn ObjectStore,
    auth: &AuthContext,
    target: (Table, &str, EntityId),
    bucket: &str,
    upload: ImageUpload,
) -> ApiResult<UploadResponse> {
    let (table, column, entity_id) = target;
    let path = object_path(auth, entity_id, &upload.extension());
    let stored = objects
        .upload(bucket, &path, upload.bytes, &upload.content_type)
        .await?;
    let url = objects.public_url(bucket, &stored);

    let patch = rolodex_storage::to_row(table, &json!({ column: url, "updated_at": now() }))?;
    if let Err(e) = backend.update(table, &owned_id(auth, entity_id), patch).await {
        if let Err(cleanup) = objects.remove(bucket, &[stored.clone()]).await {
            tracing::warn!(error = %cleanup, %bucket, path = %stored, "Failed to remove orphaned upload");
        }
        return Err(e.into());
    }

    Ok(UploadResponse {
        bucket: bucket.to_string(),
        path: stored,
        url,
    })
}

pub async fn upload_contact_avatar(
    backend: &dyn Backend,
    objects: &dyn ObjectStore,
    auth: &AuthContext,
    contact_id: EntityId,
    upload: ImageUpload,
    max_bytes: usize,
) -> ApiResult<UploadResponse> {
    upload.check(max_bytes)?;
    let _contact: Contact = fetch_owned(backend, auth, contact_id, "contact").await?;

    let response = store_image(
        backend,
        objects,
        auth,
        (Table::Contacts, "avatar_url", contact_id),
        AVATAR_BUCKET,
        upload,
    )
    .await?;

    ActivityLogger::new(backend)
        .log(
            auth,
            ActivityAction::ContactAvatarUploaded,
            EntityType::Contact,
            Some(contact_id),
            json!({ "path": response.path }),
        )
        .await;
    Ok(response)
}

pub async fn upload_company_logo(
    backend: &dyn Backend,
    objects: &dyn ObjectStore,
    auth: &AuthContext,
    company_id: EntityId,
    upload: ImageUpload,
    max_bytes: usize,
) -> ApiResult<UploadResponse> {
    upload.check(max_bytes)?;
    let _company: Company = fetch_owned(backend, auth, company_id, "company").await?;

    let response = store_image(
        backend,
        objects,
        auth,
        (Table::Companies, "logo_url", company_id),
        COMPANY_LOGO_BUCKET,
        upload,
    )
    .await?;

    ActivityLogger::new(backend)
        .log(
            auth,
            ActivityAction::CompanyLogoUploaded,
            EntityType::Company,
            Some(company_id),
            json!({ "path": response.path }),
        )
        .await;
    Ok(response)
}
