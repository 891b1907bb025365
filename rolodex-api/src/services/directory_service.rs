//! Directory Service
//!
//! CRUD for the three kinds a contact can be assigned to: companies,
//! groups and tags. List views carry how many contacts each one has.

use std::collections::HashMap;

use rolodex_core::{
    clean_optional, new_entity_id, now, ActivityAction, AssignableKind, Company, CompanyForm,
    CompanyUpdate, EntityId, Group, GroupForm, GroupUpdate, Table, Tag, TagForm, TagUpdate,
};
use rolodex_storage::{Backend, BackendExt, Filter, Query, Row};
use serde_json::{json, Value};

use super::{fetch_owned, owned_id, tally_by, trimmed, ActivityLogger};
use crate::auth::AuthContext;
use crate::error::{ApiError, ApiResult};
use crate::types::{
    CompanySummary, GroupSummary, ListCompaniesResponse, ListDirectoryRequest, ListGroupsResponse,
    ListTagsResponse, TagSummary,
};

pub const DEFAULT_DIRECTORY_PAGE: usize = 100;
pub const MAX_DIRECTORY_PAGE: usize = 500;

// ============================================================================
// SHARED
// ============================================================================

fn list_query(table: Table, auth: &AuthContext, params: &ListDirectoryRequest) -> (Filter, Query) {
    let mut filter = Filter::owned_by(auth.user_id);
    if let Some(term) = params.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        filter = filter.search(&["name"], term);
    }
    let limit = params
        .limit
        .unwrap_or(DEFAULT_DIRECTORY_PAGE)
        .clamp(1, MAX_DIRECTORY_PAGE);
    let mut query = Query::table(table)
        .filter(filter.clone())
        .order_by("name", true)
        .limit(limit);
    if let Some(offset) = params.offset {
        query = query.offset(offset);
    }
    (filter, query)
}

/// Number of linked contacts per entity of `kind`.
pub async fn member_counts(
    backend: &dyn Backend,
    auth: &AuthContext,
    kind: AssignableKind,
) -> ApiResult<HashMap<EntityId, u64>> {
    let rows = backend
        .select(&Query::table(kind.join_table()).filter(Filter::owned_by(auth.user_id)))
        .await?;
    Ok(tally_by(&rows, kind.join_column()))
}

async fn member_count(
    backend: &dyn Backend,
    auth: &AuthContext,
    kind: AssignableKind,
    entity_id: EntityId,
) -> ApiResult<u64> {
    Ok(backend
        .count(
            kind.join_table(),
            &Filter::owned_by(auth.user_id).eq(kind.join_column(), entity_id),
        )
        .await?)
}

fn deleted_action(kind: AssignableKind) -> ActivityAction {
    match kind {
        AssignableKind::Company => ActivityAction::CompanyDeleted,
        AssignableKind::Group => ActivityAction::GroupDeleted,
        AssignableKind::Tag => ActivityAction::TagDeleted,
    }
}

/// Delete a company, group or tag.
///
/// Join rows are removed first, then notes and tasks attached to the entity,
/// then the entity row, each as a separate call. If a later call fails the
/// earlier deletes stand and the entity row remains; if the first fails
/// nothing changed.
pub async fn delete_assignable(
    backend: &dyn Backend,
    auth: &AuthContext,
    kind: AssignableKind,
    entity_id: EntityId,
) -> ApiResult<u64> {
    let filter = owned_id(auth, entity_id);
    if backend.count(kind.entity_table(), &filter).await? == 0 {
        return Err(ApiError::entity_not_found(kind.as_db_str(), entity_id));
    }

    let unlinked = backend
        .delete(
            kind.join_table(),
            &Filter::owned_by(auth.user_id).eq(kind.join_column(), entity_id),
        )
        .await?;

    let attached = Filter::owned_by(auth.user_id)
        .eq("entity_type", kind.entity_type())
        .eq("entity_id", entity_id);
    backend.delete(Table::Notes, &attached).await?;
    backend.delete(Table::Tasks, &attached).await?;

    backend.delete(kind.entity_table(), &filter).await?;

    ActivityLogger::new(backend)
        .log(
            auth,
            deleted_action(kind),
            kind.entity_type(),
            Some(entity_id),
            json!({ "unlinked_contacts": unlinked }),
        )
        .await;

    tracing::info!(%kind, %entity_id, unlinked, "Entity deleted");
    Ok(unlinked)
}

/// Build an update patch from the present fields. Blank optional text clears the column.
struct Patch {
    row: Row,
    fields: Vec<&'static str>,
}

impl Patch {
    fn new(stamp_updated_at: bool) -> Self {
        let mut row = Row::new();
        if stamp_updated_at {
            row.insert("updated_at".to_string(), json!(now()));
        }
        Self {
            row,
            fields: Vec::new(),
        }
    }

    fn text(&mut self, column: &'static str, value: &Option<String>) {
        if let Some(v) = value {
            self.row.insert(column.to_string(), Value::String(trimmed(v)));
            self.fields.push(column);
        }
    }

    fn optional_text(&mut self, column: &'static str, value: &Option<String>) {
        if value.is_some() {
            let cleaned = clean_optional(value.clone()).map_or(Value::Null, Value::String);
            self.row.insert(column.to_string(), cleaned);
            self.fields.push(column);
        }
    }
}

// ============================================================================
// COMPANIES
// ============================================================================

pub async fn list_companies(
    backend: &dyn Backend,
    auth: &AuthContext,
    params: &ListDirectoryRequest,
) -> ApiResult<ListCompaniesResponse> {
    let (filter, query) = list_query(Table::Companies, auth, params);
    let total = backend.count(Table::Companies, &filter).await?;
    let companies = backend.fetch_query::<Company>(&query).await?;
    let counts = member_counts(backend, auth, AssignableKind::Company).await?;

    Ok(ListCompaniesResponse {
        companies: companies
            .into_iter()
            .map(|company| CompanySummary {
                contact_count: counts.get(&company.id).copied().unwrap_or(0),
                company,
            })
            .collect(),
        total,
    })
}

pub async fn get_company(
    backend: &dyn Backend,
    auth: &AuthContext,
    company_id: EntityId,
) -> ApiResult<CompanySummary> {
    let company: Company = fetch_owned(backend, auth, company_id, "company").await?;
    let contact_count = member_count(backend, auth, AssignableKind::Company, company_id).await?;
    Ok(CompanySummary {
        company,
        contact_count,
    })
}

pub async fn create_company(
    backend: &dyn Backend,
    auth: &AuthContext,
    form: CompanyForm,
) -> ApiResult<Company> {
    form.validate()?;
    let timestamp = now();
    let company = Company {
        id: new_entity_id(),
        user_id: auth.user_id,
        name: trimmed(&form.name),
        industry: clean_optional(form.industry),
        website: clean_optional(form.website),
        description: clean_optional(form.description),
        logo_url: None,
        is_demo: false,
        created_at: timestamp,
        updated_at: timestamp,
    };
    let company = backend.insert_record(&company).await?;

    ActivityLogger::new(backend)
        .log(
            auth,
            ActivityAction::CompanyCreated,
            AssignableKind::Company.entity_type(),
            Some(company.id),
            json!({ "name": company.name }),
        )
        .await;
    Ok(company)
}

pub async fn update_company(
    backend: &dyn Backend,
    auth: &AuthContext,
    company_id: EntityId,
    update: CompanyUpdate,
) -> ApiResult<Company> {
    update.validate()?;
    let mut patch = Patch::new(true);
    patch.text("name", &update.name);
    patch.optional_text("industry", &update.industry);
    patch.optional_text("website", &update.website);
    patch.optional_text("description", &update.description);

    let company = backend
        .update_records::<Company>(&owned_id(auth, company_id), patch.row)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::entity_not_found("company", company_id))?;

    ActivityLogger::new(backend)
        .log(
            auth,
            ActivityAction::CompanyUpdated,
            AssignableKind::Company.entity_type(),
            Some(company_id),
            json!({ "name": company.name, "fields": patch.fields }),
        )
        .await;
    Ok(company)
}

// ============================================================================
// GROUPS
// ============================================================================

pub async fn list_groups(
    backend: &dyn Backend,
    auth: &AuthContext,
    params: &ListDirectoryRequest,
) -> ApiResult<ListGroupsResponse> {
    let (filter, query) = list_query(Table::Groups, auth, params);
    let total = backend.count(Table::Groups, &filter).await?;
    let groups = backend.fetch_query::<Group>(&query).await?;
    let counts = member_counts(backend, auth, AssignableKind::Group).await?;

    Ok(ListGroupsResponse {
        groups: groups
            .into_iter()
            .map(|group| GroupSummary {
                contact_count: counts.get(&group.id).copied().unwrap_or(0),
                group,
            })
            .collect(),
        total,
    })
}

pub async fn get_group(
    backend: &dyn Backend,
    auth: &AuthContext,
    group_id: EntityId,
) -> ApiResult<GroupSummary> {
    let group: Group = fetch_owned(backend, auth, group_id, "group").await?;
    let contact_count = member_count(backend, auth, AssignableKind::Group, group_id).await?;
    Ok(GroupSummary {
        group,
        contact_count,
    })
}

pub async fn create_group(
    backend: &dyn Backend,
    auth: &AuthContext,
    form: GroupForm,
) -> ApiResult<Group> {
    form.validate()?;
    let group = Group {
        id: new_entity_id(),
        user_id: auth.user_id,
        name: trimmed(&form.name),
        description: clean_optional(form.description),
        is_demo: false,
        created_at: now(),
    };
    let group = backend.insert_record(&group).await?;

    ActivityLogger::new(backend)
        .log(
            auth,
            ActivityAction::GroupCreated,
            AssignableKind::Group.entity_type(),
            Some(group.id),
            json!({ "name": group.name }),
        )
        .await;
    Ok(group)
}

pub async fn update_group(
    backend: &dyn Backend,
    auth: &AuthContext,
    group_id: EntityId,
    update: GroupUpdate,
) -> ApiResult<Group> {
    update.validate()?;
    // Groups carry no updated_at column.
    let mut patch = Patch::new(false);
    patch.text("name", &update.name);
    patch.optional_text("description", &update.description);

    let group = backend
        .update_records::<Group>(&owned_id(auth, group_id), patch.row)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::entity_not_found("group", group_id))?;

    ActivityLogger::new(backend)
        .log(
            auth,
            ActivityAction::GroupUpdated,
            AssignableKind::Group.entity_type(),
            Some(group_id),
            json!({ "name": group.name, "fields": patch.fields }),
        )
        .await;
    Ok(group)
}

// ============================================================================
// TAGS
// ============================================================================

pub async fn list_tags(
    backend: &dyn Backend,
    auth: &AuthContext,
    params: &ListDirectoryRequest,
) -> ApiResult<ListTagsResponse> {
    let (filter, query) = list_query(Table::Tags, auth, params);
    let total = backend.count(Table::Tags, &filter).await?;
    let tags = backend.fetch_query::<Tag>(&query).await?;
    let counts = member_counts(backend, auth, AssignableKind::Tag).await?;

    Ok(ListTagsResponse {
        tags: tags
            .into_iter()
            .map(|tag| TagSummary {
                contact_count: counts.get(&tag.id).copied().unwrap_or(0),
                tag,
            })
            .collect(),
        total,
    })
}

pub async fn get_tag(
    backend: &dyn Backend,
    auth: &AuthContext,
    tag_id: EntityId,
) -> ApiResult<TagSummary> {
    let tag: Tag = fetch_owned(backend, auth, tag_id, "tag").await?;
    let contact_count = member_count(backend, auth, AssignableKind::Tag, tag_id).await?;
    Ok(TagSummary { tag, contact_count })
}

pub async fn create_tag(backend: &dyn Backend, auth: &AuthContext, form: TagForm) -> ApiResult<Tag> {
    form.validate()?;
    let tag = Tag {
        id: new_entity_id(),
        user_id: auth.user_id,
        name: trimmed(&form.name),
        color: form.color.trim().to_lowercase(),
        is_demo: false,
        created_at: now(),
    };
    let tag = backend.insert_record(&tag).await?;

    ActivityLogger::new(backend)
        .log(
            auth,
            ActivityAction::TagCreated,
            AssignableKind::Tag.entity_type(),
            Some(tag.id),
            json!({ "name": tag.name, "color": tag.color }),
        )
        .await;
    Ok(tag)
}

pub async fn update_tag(
    backend: &dyn Backend,
    auth: &AuthContext,
    tag_id: EntityId,
    update: TagUpdate,
) -> ApiResult<Tag> {
    update.validate()?;
    let mut patch = Patch::new(false);
    patch.text("name", &update.name);
    if let Some(color) = &update.color {
        patch
            .row
            .insert("color".to_string(), Value::String(color.trim().to_lowercase()));
        patch.fields.push("color");
    }

    let tag = backend
        .update_records::<Tag>(&owned_id(auth, tag_id), patch.row)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::entity_not_found("tag", tag_id))?;

    ActivityLogger::new(backend)
        .log(
            auth,
            ActivityAction::TagUpdated,
            AssignableKind::Tag.entity_type(),
            Some(tag_id),
            json!({ "name": tag.name, "fields": patch.fields }),
        )
        .await;
    Ok(tag)
}
