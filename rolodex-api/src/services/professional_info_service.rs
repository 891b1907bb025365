//! Professional Info Service
//!
//! At most one row per contact. Nothing in the database enforces that;
//! `upsert_professional_info` keeps it true by updating an existing row
//! instead of inserting a second one.

use rolodex_core::{
    clean_optional, new_entity_id, now, ActivityAction, Contact, EntityId, EntityType,
    ProfessionalInfo, ProfessionalInfoForm, Table,
};
use rolodex_storage::{Backend, BackendExt, Filter};
use serde_json::json;

use super::{fetch_owned, ActivityLogger};
use crate::auth::AuthContext;
use crate::error::{ApiError, ApiResult};

fn by_contact(auth: &AuthContext, contact_id: EntityId) -> Filter {
    Filter::owned_by(auth.user_id).eq("contact_id", contact_id)
}

pub async fn get_professional_info(
    backend: &dyn Backend,
    auth: &AuthContext,
    contact_id: EntityId,
) -> ApiResult<Option<ProfessionalInfo>> {
    Ok(backend
        .fetch_one::<ProfessionalInfo>(by_contact(auth, contact_id))
        .await?)
}

/// Replace the contact's professional details, creating the row if needed.
pub async fn upsert_professional_info(
    backend: &dyn Backend,
    auth: &AuthContext,
    contact_id: EntityId,
    form: ProfessionalInfoForm,
) -> ApiResult<ProfessionalInfo> {
    form.validate()?;
    let _contact: Contact = fetch_owned(backend, auth, contact_id, "contact").await?;

    let timestamp = now();
    let fields = ProfessionalInfoForm {
        job_title: clean_optional(form.job_title),
        department: clean_optional(form.department),
        work_email: clean_optional(form.work_email),
        work_phone: clean_optional(form.work_phone),
        linkedin_url: clean_optional(form.linkedin_url),
    };

    let existing = get_professional_info(backend, auth, contact_id).await?;
    let (info, action) = match existing {
        Some(existing) => {
            let mut patch = rolodex_storage::to_row(Table::ProfessionalInfo, &fields)?;
            patch.insert("updated_at".to_string(), json!(timestamp));
            let info = backend
                .update_records::<ProfessionalInfo>(
                    &Filter::owned_by(auth.user_id).eq("id", existing.id),
                    patch,
                )
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| ApiError::entity_not_found("professional_info", existing.id))?;
            (info, ActivityAction::ProfessionalInfoUpdated)
        }
        None => {
            let info = ProfessionalInfo {
                id: new_entity_id(),
                user_id: auth.user_id,
                contact_id,
                job_title: fields.job_title,
                department: fields.department,
                work_email: fields.work_email,
                work_phone: fields.work_phone,
                linkedin_url: fields.linkedin_url,
                created_at: timestamp,
                updated_at: timestamp,
            };
            let info = backend.insert_record(&info).await?;
            (info, ActivityAction::ProfessionalInfoCreated)
        }
    };

    ActivityLogger::new(backend)
        .log(
            auth,
            action,
            EntityType::ProfessionalInfo,
            Some(info.id),
            json!({ "contact_id": contact_id }),
        )
        .await;
    Ok(info)
}

pub async fn delete_professional_info(
    backend: &dyn Backend,
    auth: &AuthContext,
    contact_id: EntityId,
) -> ApiResult<()> {
    let removed = backend
        .delete(Table::ProfessionalInfo, &by_contact(auth, contact_id))
        .await?;
    if removed == 0 {
        return Err(ApiError::entity_not_found("professional_info", contact_id));
    }

    ActivityLogger::new(backend)
        .log(
            auth,
            ActivityAction::ProfessionalInfoDeleted,
            EntityType::ProfessionalInfo,
            None,
            json!({ "contact_id": contact_id }),
        )
        .await;
    Ok(())
}
