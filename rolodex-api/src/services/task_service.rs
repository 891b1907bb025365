//! Task Service
//!
//! Tasks attach to a contact, company, group or tag like notes do, and
//! additionally carry a due date, a priority and a completion state.

use rolodex_core::{
    clean_optional, new_entity_id, now, ActivityAction, EntityId, EntityType, Table, Task,
    TaskForm, TaskUpdate,
};
use rolodex_storage::{Backend, BackendExt, Filter, Query, Row};
use serde_json::{json, Value};

use super::{owned_id, trimmed, ActivityLogger};
use crate::auth::AuthContext;
use crate::error::{ApiError, ApiResult};
use crate::types::ListTasksRequest;

/// The caller's tasks, earliest due first.
pub async fn list_tasks(
    backend: &dyn Backend,
    auth: &AuthContext,
    params: &ListTasksRequest,
) -> ApiResult<Vec<Task>> {
    let mut filter = Filter::owned_by(auth.user_id);
    if let Some(entity_type) = params.entity_type {
        filter = filter.eq("entity_type", entity_type);
    }
    if let Some(entity_id) = params.entity_id {
        filter = filter.eq("entity_id", entity_id);
    }
    if let Some(completed) = params.completed {
        filter = filter.eq("is_completed", completed);
    }

    let query = Query::table(Table::Tasks)
        .filter(filter)
        .order_by("due_date", true)
        .order_by("created_at", false);
    Ok(backend.fetch_query::<Task>(&query).await?)
}

pub async fn create_task(backend: &dyn Backend, auth: &AuthContext, form: TaskForm) -> ApiResult<Task> {
    form.validate()?;
    let timestamp = now();
    let task = Task {
        id: new_entity_id(),
        user_id: auth.user_id,
        entity_type: form.entity_type,
        entity_id: form.entity_id,
        title: trimmed(&form.title),
        description: clean_optional(form.description),
        due_date: form.due_date,
        priority: form.priority,
        is_completed: false,
        completed_at: None,
        created_at: timestamp,
        updated_at: timestamp,
    };
    let task = backend.insert_record(&task).await?;

    ActivityLogger::new(backend)
        .log(
            auth,
            ActivityAction::TaskCreated,
            EntityType::Task,
            Some(task.id),
            json!({ "title": task.title, "entity_type": task.entity_type, "entity_id": task.entity_id }),
        )
        .await;
    Ok(task)
}

async fn patch_task(
    backend: &dyn Backend,
    auth: &AuthContext,
    task_id: EntityId,
    mut patch: Row,
) -> ApiResult<Task> {
    patch.insert("updated_at".to_string(), json!(now()));
    backend
        .update_records::<Task>(&owned_id(auth, task_id), patch)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::entity_not_found("task", task_id))
}

pub async fn update_task(
    backend: &dyn Backend,
    auth: &AuthContext,
    task_id: EntityId,
    update: TaskUpdate,
) -> ApiResult<Task> {
    update.validate()?;

    let mut patch = Row::new();
    if let Some(title) = &update.title {
        patch.insert("title".to_string(), Value::String(trimmed(title)));
    }
    if update.description.is_some() {
        let description = clean_optional(update.description.clone());
        patch.insert("description".to_string(), json!(description));
    }
    if let Some(due_date) = update.due_date {
        patch.insert("due_date".to_string(), json!(due_date));
    }
    if let Some(priority) = update.priority {
        patch.insert("priority".to_string(), json!(priority));
    }
    let fields: Vec<String> = patch.keys().cloned().collect();

    let task = patch_task(backend, auth, task_id, patch).await?;

    ActivityLogger::new(backend)
        .log(
            auth,
            ActivityAction::TaskUpdated,
            EntityType::Task,
            Some(task_id),
            json!({ "title": task.title, "fields": fields }),
        )
        .await;
    Ok(task)
}

/// Mark a task done (stamping `completed_at`) or reopen it.
pub async fn set_task_completed(
    backend: &dyn Backend,
    auth: &AuthContext,
    task_id: EntityId,
    completed: bool,
) -> ApiResult<Task> {
    let completed_at = if completed { Some(now()) } else { None };
    let mut patch = Row::new();
    patch.insert("is_completed".to_string(), Value::Bool(completed));
    patch.insert("completed_at".to_string(), json!(completed_at));

    let task = patch_task(backend, auth, task_id, patch).await?;

    let action = if completed {
        ActivityAction::TaskCompleted
    } else {
        ActivityAction::TaskReopened
    };
    ActivityLogger::new(backend)
        .log(auth, action, EntityType::Task, Some(task_id), json!({ "title": task.title }))
        .await;
    Ok(task)
}

pub async fn delete_task(backend: &dyn Backend, auth: &AuthContext, task_id: EntityId) -> ApiResult<()> {
    let removed = backend.delete(Table::Tasks, &owned_id(auth, task_id)).await?;
    if removed == 0 {
        return Err(ApiError::entity_not_found("task", task_id));
    }

    ActivityLogger::new(backend)
        .log(auth, ActivityAction::TaskDeleted, EntityType::Task, Some(task_id), json!({}))
        .await;
    Ok(())
}
