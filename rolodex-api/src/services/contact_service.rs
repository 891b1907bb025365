//! Contact Service
//!
//! Create, read, list, edit and delete contacts together with their tag,
//! group and company links and professional details.

use std::collections::{HashMap, HashSet};

use rolodex_core::{
    clean_optional, new_entity_id, now, ActivityAction, Company, Contact, ContactCompany,
    ContactForm, ContactGroup, ContactTag, ContactUpdate, EntityId, EntityType, Group,
    ProfessionalInfo, ProfessionalInfoForm, Table, Tag,
};
use rolodex_storage::{to_row, Backend, BackendExt, Filter, Query};
use serde_json::{json, Value};

use super::{fetch_owned, owned_id, push_warning, trimmed, ActivityLogger};
use crate::auth::AuthContext;
use crate::error::{ApiError, ApiResult};
use crate::types::{
    ContactDetail, ContactMutationResponse, ContactSort, ContactSummary, ListContactsRequest,
    ListContactsResponse,
};

/// Page size when the client does not ask for one.
pub const DEFAULT_CONTACT_PAGE: usize = 100;
pub const MAX_CONTACT_PAGE: usize = 500;

const SEARCH_COLUMNS: &[&str] = &["first_name", "surname", "email"];

// ============================================================================
// CREATE
// ============================================================================

/// Create a contact and everything the add-contact form links to it.
///
/// Validation runs before any backend call. Only the contact insert is
/// fatal; tag, group, company and professional info writes that fail are
/// returned as warnings.
pub async fn create_contact(
    backend: &dyn Backend,
    auth: &AuthContext,
    form: ContactForm,
) -> ApiResult<ContactMutationResponse> {
    form.validate()?;
    let gender = form.gender.ok_or_else(|| ApiError::missing_field("gender"))?;

    let timestamp = now();
    let contact = Contact {
        id: new_entity_id(),
        user_id: auth.user_id,
        first_name: trimmed(&form.first_name),
        surname: trimmed(&form.surname),
        email: trimmed(&form.email),
        phone: clean_optional(form.phone),
        gender,
        birthday: form.birthday,
        address: clean_optional(form.address),
        avatar_url: None,
        is_favourite: false,
        is_demo: false,
        created_at: timestamp,
        updated_at: timestamp,
    };
    let contact = backend.insert_record(&contact).await?;

    let mut warnings = Vec::new();

    if let Err(e) = link_tags(backend, auth, contact.id, &form.tag_ids).await {
        push_warning(&mut warnings, "Contact created but tags could not be assigned", e);
    }
    if let Some(group_id) = form.group_id {
        if let Err(e) = link_group(backend, auth, contact.id, group_id).await {
            push_warning(&mut warnings, "Contact created but group could not be assigned", e);
        }
    }
    if let Some(company_id) = form.company_id {
        if let Err(e) = link_company(backend, auth, contact.id, company_id).await {
            push_warning(&mut warnings, "Contact created but company could not be assigned", e);
        }
    }
    if !form.professional.is_empty() {
        if let Err(e) = insert_professional(backend, auth, contact.id, form.professional).await {
            push_warning(
                &mut warnings,
                "Contact created but professional info could not be saved",
                e,
            );
        }
    }

    ActivityLogger::new(backend)
        .log(
            auth,
            ActivityAction::ContactCreated,
            EntityType::Contact,
            Some(contact.id),
            json!({ "name": contact.full_name() }),
        )
        .await;

    tracing::info!(contact_id = %contact.id, warnings = warnings.len(), "Contact created");
    Ok(ContactMutationResponse { contact, warnings })
}

async fn link_tags(
    backend: &dyn Backend,
    auth: &AuthContext,
    contact_id: EntityId,
    tag_ids: &[EntityId],
) -> ApiResult<()> {
    let timestamp = now();
    let rows: Vec<ContactTag> = tag_ids
        .iter()
        .map(|tag_id| ContactTag {
            id: new_entity_id(),
            user_id: auth.user_id,
            contact_id,
            tag_id: *tag_id,
            is_demo: false,
            created_at: timestamp,
        })
        .collect();
    backend.insert_records(&rows).await?;
    Ok(())
}

async fn link_group(
    backend: &dyn Backend,
    auth: &AuthContext,
    contact_id: EntityId,
    group_id: EntityId,
) -> ApiResult<()> {
    let row = ContactGroup {
        id: new_entity_id(),
        user_id: auth.user_id,
        contact_id,
        group_id,
        is_demo: false,
        created_at: now(),
    };
    backend.insert_record(&row).await?;
    Ok(())
}

async fn link_company(
    backend: &dyn Backend,
    auth: &AuthContext,
    contact_id: EntityId,
    company_id: EntityId,
) -> ApiResult<()> {
    let row = ContactCompany {
        id: new_entity_id(),
        user_id: auth.user_id,
        contact_id,
        company_id,
        is_demo: false,
        created_at: now(),
    };
    backend.insert_record(&row).await?;
    Ok(())
}

async fn insert_professional(
    backend: &dyn Backend,
    auth: &AuthContext,
    contact_id: EntityId,
    form: ProfessionalInfoForm,
) -> ApiResult<()> {
    let timestamp = now();
    let info = ProfessionalInfo {
        id: new_entity_id(),
        user_id: auth.user_id,
        contact_id,
        job_title: clean_optional(form.job_title),
        department: clean_optional(form.department),
        work_email: clean_optional(form.work_email),
        work_phone: clean_optional(form.work_phone),
        linkedin_url: clean_optional(form.linkedin_url),
        created_at: timestamp,
        updated_at: timestamp,
    };
    backend.insert_record(&info).await?;
    Ok(())
}

// ============================================================================
// READ
// ============================================================================

/// A contact with its tags, group, company and professional details.
pub async fn get_contact_detail(
    backend: &dyn Backend,
    auth: &AuthContext,
    contact_id: EntityId,
) -> ApiResult<ContactDetail> {
    let contact: Contact = fetch_owned(backend, auth, contact_id, "contact").await?;
    let by_contact = Filter::owned_by(auth.user_id).eq("contact_id", contact_id);

    let (tag_links, group_link, company_link, professional_info) = tokio::try_join!(
        backend.fetch::<ContactTag>(by_contact.clone()),
        backend.fetch_one::<ContactGroup>(by_contact.clone()),
        backend.fetch_one::<ContactCompany>(by_contact.clone()),
        backend.fetch_one::<ProfessionalInfo>(by_contact),
    )?;

    let tags = fetch_tags(backend, auth, tag_links.iter().map(|l| l.tag_id)).await?;
    let group = match group_link {
        Some(link) => backend.fetch_one::<Group>(owned_id(auth, link.group_id)).await?,
        None => None,
    };
    let company = match company_link {
        Some(link) => backend.fetch_one::<Company>(owned_id(auth, link.company_id)).await?,
        None => None,
    };

    Ok(ContactDetail {
        contact,
        tags,
        group,
        company,
        professional_info,
    })
}

async fn fetch_tags(
    backend: &dyn Backend,
    auth: &AuthContext,
    tag_ids: impl IntoIterator<Item = EntityId>,
) -> ApiResult<Vec<Tag>> {
    let ids: Vec<EntityId> = tag_ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let query = Query::table(Table::Tags)
        .filter(Filter::owned_by(auth.user_id).is_in("id", ids))
        .order_by("name", true);
    Ok(backend.fetch_query::<Tag>(&query).await?)
}

/// Contacts linked to a group, tag or company through `join_table`.
async fn linked_contact_ids(
    backend: &dyn Backend,
    auth: &AuthContext,
    join_table: Table,
    column: &str,
    entity_id: EntityId,
) -> ApiResult<Vec<EntityId>> {
    let rows = backend
        .select(
            &Query::table(join_table)
                .filter(Filter::owned_by(auth.user_id).eq(column, entity_id)),
        )
        .await?;
    Ok(rows
        .iter()
        .filter_map(|row| super::row_uuid(row, "contact_id"))
        .collect())
}

/// Search, filter and page the caller's contacts.
pub async fn list_contacts(
    backend: &dyn Backend,
    auth: &AuthContext,
    params: &ListContactsRequest,
) -> ApiResult<ListContactsResponse> {
    let mut filter = Filter::owned_by(auth.user_id);

    if let Some(term) = params.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        filter = filter.search(SEARCH_COLUMNS, term);
    }
    if let Some(favourite) = params.favourite {
        filter = filter.eq("is_favourite", favourite);
    }

    let link_filters = [
        (params.tag_id, Table::ContactTags, "tag_id"),
        (params.group_id, Table::ContactGroups, "group_id"),
        (params.company_id, Table::ContactCompanies, "company_id"),
    ];
    for (entity_id, join_table, column) in link_filters {
        let Some(entity_id) = entity_id else { continue };
        let ids = linked_contact_ids(backend, auth, join_table, column, entity_id).await?;
        if ids.is_empty() {
            return Ok(ListContactsResponse {
                contacts: Vec::new(),
                total: 0,
            });
        }
        filter = filter.is_in("id", ids);
    }

    let total = backend.count(Table::Contacts, &filter).await?;

    let limit = params
        .limit
        .unwrap_or(DEFAULT_CONTACT_PAGE)
        .clamp(1, MAX_CONTACT_PAGE);
    let mut query = Query::table(Table::Contacts).filter(filter).limit(limit);
    query = match params.sort.unwrap_or_default() {
        ContactSort::Name => query.order_by("first_name", true).order_by("surname", true),
        ContactSort::Recent => query.order_by("created_at", false),
    };
    if let Some(offset) = params.offset {
        query = query.offset(offset);
    }

    let contacts = backend.fetch_query::<Contact>(&query).await?;
    let contacts = attach_tags(backend, auth, contacts).await?;

    Ok(ListContactsResponse { contacts, total })
}

/// Pair each contact with its tags using two batched selects.
async fn attach_tags(
    backend: &dyn Backend,
    auth: &AuthContext,
    contacts: Vec<Contact>,
) -> ApiResult<Vec<ContactSummary>> {
    if contacts.is_empty() {
        return Ok(Vec::new());
    }

    let links = backend
        .fetch::<ContactTag>(
            Filter::owned_by(auth.user_id).is_in("contact_id", contacts.iter().map(|c| c.id)),
        )
        .await?;
    let tag_ids: HashSet<EntityId> = links.iter().map(|l| l.tag_id).collect();
    let tags: HashMap<EntityId, Tag> = fetch_tags(backend, auth, tag_ids)
        .await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();

    let mut by_contact: HashMap<EntityId, Vec<Tag>> = HashMap::new();
    for link in &links {
        if let Some(tag) = tags.get(&link.tag_id) {
            by_contact.entry(link.contact_id).or_default().push(tag.clone());
        }
    }

    Ok(contacts
        .into_iter()
        .map(|contact| {
            let mut tags = by_contact.remove(&contact.id).unwrap_or_default();
            tags.sort_by(|a, b| a.name.cmp(&b.name));
            ContactSummary { contact, tags }
        })
        .collect())
}

// ============================================================================
// UPDATE
// ============================================================================

fn nullable(value: Option<String>) -> Value {
    clean_optional(value).map_or(Value::Null, Value::String)
}

/// Patch a contact.
///
/// Fields absent from `update` are untouched. A present `tag_ids` replaces
/// the whole tag set; a present `group_id`/`company_id` replaces the single
/// link (delete, then insert unless cleared).
pub async fn update_contact(
    backend: &dyn Backend,
    auth: &AuthContext,
    contact_id: EntityId,
    update: ContactUpdate,
) -> ApiResult<ContactMutationResponse> {
    update.validate()?;
    let existing: Contact = fetch_owned(backend, auth, contact_id, "contact").await?;

    let mut patch = to_row(Table::Contacts, &json!({ "updated_at": now() }))?;
    let mut changed: Vec<&str> = Vec::new();
    let mut set = |column: &'static str, value: Value| {
        patch.insert(column.to_string(), value);
        changed.push(column);
    };
    if let Some(v) = &update.first_name {
        set("first_name", Value::String(trimmed(v)));
    }
    if let Some(v) = &update.surname {
        set("surname", Value::String(trimmed(v)));
    }
    if let Some(v) = &update.email {
        set("email", Value::String(trimmed(v)));
    }
    if update.phone.is_some() {
        set("phone", nullable(update.phone.clone()));
    }
    if let Some(gender) = update.gender {
        set("gender", Value::String(gender.as_db_str().to_string()));
    }
    if let Some(birthday) = update.birthday {
        set("birthday", Value::String(birthday.to_string()));
    }
    if update.address.is_some() {
        set("address", nullable(update.address.clone()));
    }

    let contact = backend
        .update_records::<Contact>(&owned_id(auth, contact_id), patch)
        .await?
        .into_iter()
        .next()
        .unwrap_or(existing);

    let mut warnings = Vec::new();
    let by_contact = Filter::owned_by(auth.user_id).eq("contact_id", contact_id);

    if let Some(tag_ids) = &update.tag_ids {
        changed.push("tag_ids");
        let result: ApiResult<()> = async {
            backend.delete(Table::ContactTags, &by_contact).await?;
            link_tags(backend, auth, contact_id, tag_ids).await
        }
        .await;
        if let Err(e) = result {
            push_warning(&mut warnings, "Contact updated but tags could not be replaced", e);
        }
    }
    if let Some(group_id) = update.group_id {
        changed.push("group_id");
        let result: ApiResult<()> = async {
            backend.delete(Table::ContactGroups, &by_contact).await?;
            match group_id {
                Some(group_id) => link_group(backend, auth, contact_id, group_id).await,
                None => Ok(()),
            }
        }
        .await;
        if let Err(e) = result {
            push_warning(&mut warnings, "Contact updated but group could not be changed", e);
        }
    }
    if let Some(company_id) = update.company_id {
        changed.push("company_id");
        let result: ApiResult<()> = async {
            backend.delete(Table::ContactCompanies, &by_contact).await?;
            match company_id {
                Some(company_id) => link_company(backend, auth, contact_id, company_id).await,
                None => Ok(()),
            }
        }
        .await;
        if let Err(e) = result {
            push_warning(&mut warnings, "Contact updated but company could not be changed", e);
        }
    }

    ActivityLogger::new(backend)
        .log(
            auth,
            ActivityAction::ContactUpdated,
            EntityType::Contact,
            Some(contact_id),
            json!({ "name": contact.full_name(), "fields": changed }),
        )
        .await;

    Ok(ContactMutationResponse { contact, warnings })
}

// ============================================================================
// DELETE
// ============================================================================

/// Delete a contact and everything hanging off it.
///
/// Dependents go first so a failure leaves the contact row in place and
/// the request can be repeated.
pub async fn delete_contact(
    backend: &dyn Backend,
    auth: &AuthContext,
    contact_id: EntityId,
) -> ApiResult<()> {
    let contact: Contact = fetch_owned(backend, auth, contact_id, "contact").await?;

    let by_contact = Filter::owned_by(auth.user_id).eq("contact_id", contact_id);
    for table in [
        Table::ContactTags,
        Table::ContactGroups,
        Table::ContactCompanies,
        Table::ProfessionalInfo,
    ] {
        backend.delete(table, &by_contact).await?;
    }

    let attached = Filter::owned_by(auth.user_id)
        .eq("entity_type", EntityType::Contact)
        .eq("entity_id", contact_id);
    backend.delete(Table::Notes, &attached).await?;
    backend.delete(Table::Tasks, &attached).await?;

    backend.delete(Table::Contacts, &owned_id(auth, contact_id)).await?;

    ActivityLogger::new(backend)
        .log(
            auth,
            ActivityAction::ContactDeleted,
            EntityType::Contact,
            Some(contact_id),
            json!({ "name": contact.full_name() }),
        )
        .await;

    tracing::info!(%contact_id, "Contact deleted");
    Ok(())
}
