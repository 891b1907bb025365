//! Note Service

use rolodex_core::{
    new_entity_id, now, ActivityAction, EntityId, EntityType, Note, NoteForm, NoteUpdate, Table,
};
use rolodex_storage::{Backend, BackendExt, Filter, Query};
use serde_json::json;

use super::{owned_id, trimmed, ActivityLogger};
use crate::auth::AuthContext;
use crate::error::{ApiError, ApiResult};

/// Notes attached to one entity, newest first.
pub async fn list_notes(
    backend: &dyn Backend,
    auth: &AuthContext,
    entity_type: EntityType,
    entity_id: EntityId,
) -> ApiResult<Vec<Note>> {
    let query = Query::table(Table::Notes)
        .filter(
            Filter::owned_by(auth.user_id)
                .eq("entity_type", entity_type)
                .eq("entity_id", entity_id),
        )
        .order_by("created_at", false);
    Ok(backend.fetch_query::<Note>(&query).await?)
}

pub async fn create_note(backend: &dyn Backend, auth: &AuthContext, form: NoteForm) -> ApiResult<Note> {
    form.validate()?;
    let timestamp = now();
    let note = Note {
        id: new_entity_id(),
        user_id: auth.user_id,
        entity_type: form.entity_type,
        entity_id: form.entity_id,
        content: trimmed(&form.content),
        created_at: timestamp,
        updated_at: timestamp,
    };
    let note = backend.insert_record(&note).await?;

    ActivityLogger::new(backend)
        .log(
            auth,
            ActivityAction::NoteCreated,
            EntityType::Note,
            Some(note.id),
            json!({ "entity_type": note.entity_type, "entity_id": note.entity_id }),
        )
        .await;
    Ok(note)
}

pub async fn update_note(
    backend: &dyn Backend,
    auth: &AuthContext,
    note_id: EntityId,
    update: NoteUpdate,
) -> ApiResult<Note> {
    update.validate()?;
    let patch = rolodex_storage::to_row(
        Table::Notes,
        &json!({ "content": trimmed(&update.content), "updated_at": now() }),
    )?;
    let note = backend
        .update_records::<Note>(&owned_id(auth, note_id), patch)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::entity_not_found("note", note_id))?;

    ActivityLogger::new(backend)
        .log(
            auth,
            ActivityAction::NoteUpdated,
            EntityType::Note,
            Some(note_id),
            json!({ "entity_type": note.entity_type, "entity_id": note.entity_id }),
        )
        .await;
    Ok(note)
}

pub async fn delete_note(backend: &dyn Backend, auth: &AuthContext, note_id: EntityId) -> ApiResult<()> {
    let removed = backend.delete(Table::Notes, &owned_id(auth, note_id)).await?;
    if removed == 0 {
        return Err(ApiError::entity_not_found("note", note_id));
    }

    ActivityLogger::new(backend)
        .log(auth, ActivityAction::NoteDeleted, EntityType::Note, Some(note_id), json!({}))
        .await;
    Ok(())
}
