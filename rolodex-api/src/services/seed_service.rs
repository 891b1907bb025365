//! Demo Data Loader
//!
//! Replaces the caller's demo rows (`is_demo = true`) with a fixed fictional
//! dataset. Entities the user created themselves are never touched; their
//! links to demo entities go with the demo entities.

use chrono::NaiveDate;
use rolodex_core::{
    new_entity_id, now, ActivityAction, Company, Contact, ContactCompany, ContactGroup, ContactTag,
    EntityId, EntityType, Gender, Group, Table, Tag,
};
use rolodex_storage::{Backend, BackendExt, Filter, Query};
use serde_json::json;

use super::{row_uuid, ActivityLogger};
use crate::auth::AuthContext;
use crate::error::ApiResult;
use crate::types::SeedSummary;

struct DemoCompany {
    name: &'static str,
    industry: &'static str,
    website: &'static str,
    description: &'static str,
}

struct DemoContact {
    first_name: &'static str,
    surname: &'static str,
    email: &'static str,
    phone: &'static str,
    gender: Gender,
    birthday: Option<(i32, u32, u32)>,
    favourite: bool,
    company: Option<usize>,
    group: Option<usize>,
    tags: &'static [usize],
}

const DEMO_COMPANIES: [DemoCompany; 4] = [
    DemoCompany {
        name: "Northwind Analytics",
        industry: "Software",
        website: "https://northwind.example.com",
        description: "Dashboards for logistics teams.",
    },
    DemoCompany {
        name: "Bluefin Marine Supply",
        industry: "Retail",
        website: "https://bluefin.example.com",
        description: "Boat parts and chandlery.",
    },
    DemoCompany {
        name: "Kestrel Design Studio",
        industry: "Design",
        website: "https://kestrel.example.com",
        description: "Brand identity and print.",
    },
    DemoCompany {
        name: "Harbour Street Legal",
        industry: "Legal Services",
        website: "https://harbourlegal.example.com",
        description: "Contract and property law.",
    },
];

const DEMO_GROUPS: [(&str, &str); 3] = [
    ("Clients", "People we currently bill"),
    ("Suppliers", "Vendors and contractors"),
    ("Book Club", "Second Thursday of the month"),
];

const DEMO_TAGS: [(&str, &str); 5] = [
    ("VIP", "#e11d48"),
    ("Follow up", "#f59e0b"),
    ("Prospect", "#3b82f6"),
    ("Friend", "#10b981"),
    ("Newsletter", "#8b5cf6"),
];

const DEMO_CONTACTS: [DemoContact; 8] = [
    DemoContact {
        first_name: "Amelia",
        surname: "Hartley",
        email: "amelia.hartley@example.com",
        phone: "+44 20 7946 0011",
        gender: Gender::Female,
        birthday: Some((1988, 3, 14)),
        favourite: true,
        company: Some(0),
        group: Some(0),
        tags: &[0, 1],
    },
    DemoContact {
        first_name: "Marcus",
        surname: "Okafor",
        email: "marcus.okafor@example.com",
        phone: "+44 20 7946 0012",
        gender: Gender::Male,
        birthday: Some((1979, 11, 2)),
        favourite: false,
        company: Some(0),
        group: Some(0),
        tags: &[2],
    },
    DemoContact {
        first_name: "Priya",
        surname: "Raman",
        email: "priya.raman@example.com",
        phone: "+44 161 496 0013",
        gender: Gender::Female,
        birthday: None,
        favourite: true,
        company: Some(1),
        group: Some(1),
        tags: &[1],
    },
    DemoContact {
        first_name: "Tomasz",
        surname: "Nowak",
        email: "tomasz.nowak@example.com",
        phone: "+44 161 496 0014",
        gender: Gender::Male,
        birthday: Some((1992, 7, 30)),
        favourite: false,
        company: Some(1),
        group: Some(1),
        tags: &[],
    },
    DemoContact {
        first_name: "Grace",
        surname: "Whitfield",
        email: "grace.whitfield@example.com",
        phone: "+44 113 496 0015",
        gender: Gender::Female,
        birthday: Some((1985, 1, 21)),
        favourite: false,
        company: Some(2),
        group: Some(2),
        tags: &[3, 4],
    },
    DemoContact {
        first_name: "Daniel",
        surname: "Mercer",
        email: "daniel.mercer@example.com",
        phone: "+44 113 496 0016",
        gender: Gender::Male,
        birthday: None,
        favourite: false,
        company: Some(3),
        group: None,
        tags: &[2, 4],
    },
    DemoContact {
        first_name: "Sofia",
        surname: "Lindqvist",
        email: "sofia.lindqvist@example.com",
        phone: "+44 131 496 0017",
        gender: Gender::Female,
        birthday: Some((1995, 9, 8)),
        favourite: true,
        company: None,
        group: Some(2),
        tags: &[3],
    },
    DemoContact {
        first_name: "Owen",
        surname: "Pritchard",
        email: "owen.pritchard@example.com",
        phone: "+44 29 2018 0018",
        gender: Gender::Male,
        birthday: Some((1970, 5, 17)),
        favourite: false,
        company: Some(3),
        group: None,
        tags: &[0, 2, 4],
    },
];

/// Ids of the caller's demo rows in `table`.
async fn demo_ids(
    backend: &dyn Backend,
    auth: &AuthContext,
    table: Table,
) -> ApiResult<Vec<EntityId>> {
    let query = Query::table(table).filter(Filter::owned_by(auth.user_id).eq("is_demo", true));
    let rows = backend.select(&query).await?;
    Ok(rows.iter().filter_map(|row| row_uuid(row, "id")).collect())
}

/// Delete the caller's rows of `table` whose `column` is one of `ids`.
async fn delete_referencing(
    backend: &dyn Backend,
    auth: &AuthContext,
    table: Table,
    column: &str,
    ids: &[EntityId],
) -> ApiResult<u64> {
    if ids.is_empty() {
        return Ok(0);
    }
    let filter = Filter::owned_by(auth.user_id).is_in(column, ids.iter().copied());
    Ok(backend.delete(table, &filter).await?)
}

/// Delete demo entities along with every row pointing at them, including
/// links, notes and tasks the user added to demo rows.
async fn remove_demo_rows(backend: &dyn Backend, auth: &AuthContext) -> ApiResult<u64> {
    let contacts = demo_ids(backend, auth, Table::Contacts).await?;
    let companies = demo_ids(backend, auth, Table::Companies).await?;
    let groups = demo_ids(backend, auth, Table::Groups).await?;
    let tags = demo_ids(backend, auth, Table::Tags).await?;

    let mut removed = 0;
    let dependents: [(Table, &str, &[EntityId]); 7] = [
        (Table::ContactTags, "contact_id", &contacts),
        (Table::ContactTags, "tag_id", &tags),
        (Table::ContactGroups, "contact_id", &contacts),
        (Table::ContactGroups, "group_id", &groups),
        (Table::ContactCompanies, "contact_id", &contacts),
        (Table::ContactCompanies, "company_id", &companies),
        (Table::ProfessionalInfo, "contact_id", &contacts),
    ];
    for (table, column, ids) in dependents {
        removed += delete_referencing(backend, auth, table, column, ids).await?;
    }

    for (entity_type, ids) in [
        (EntityType::Contact, &contacts),
        (EntityType::Company, &companies),
        (EntityType::Group, &groups),
        (EntityType::Tag, &tags),
    ] {
        if ids.is_empty() {
            continue;
        }
        let attached = Filter::owned_by(auth.user_id)
            .eq("entity_type", entity_type)
            .is_in("entity_id", ids.iter().copied());
        removed += backend.delete(Table::Notes, &attached).await?;
        removed += backend.delete(Table::Tasks, &attached).await?;
    }

    for (table, ids) in [
        (Table::Contacts, &contacts),
        (Table::Companies, &companies),
        (Table::Groups, &groups),
        (Table::Tags, &tags),
    ] {
        removed += delete_referencing(backend, auth, table, "id", ids).await?;
    }
    Ok(removed)
}

/// The fixed demo dataset with fresh ids, owned by `auth`.
struct DemoSet {
    companies: Vec<Company>,
    groups: Vec<Group>,
    tags: Vec<Tag>,
    contacts: Vec<Contact>,
    contact_companies: Vec<ContactCompany>,
    contact_groups: Vec<ContactGroup>,
    contact_tags: Vec<ContactTag>,
}

fn build_demo_set(auth: &AuthContext) -> DemoSet {
    let user_id = auth.user_id;
    let timestamp = now();

    let companies: Vec<Company> = DEMO_COMPANIES
        .iter()
        .map(|c| Company {
            id: new_entity_id(),
            user_id,
            name: c.name.to_string(),
            industry: Some(c.industry.to_string()),
            website: Some(c.website.to_string()),
            description: Some(c.description.to_string()),
            logo_url: None,
            is_demo: true,
            created_at: timestamp,
            updated_at: timestamp,
        })
        .collect();

    let groups: Vec<Group> = DEMO_GROUPS
        .iter()
        .map(|(name, description)| Group {
            id: new_entity_id(),
            user_id,
            name: name.to_string(),
            description: Some(description.to_string()),
            is_demo: true,
            created_at: timestamp,
        })
        .collect();

    let tags: Vec<Tag> = DEMO_TAGS
        .iter()
        .map(|(name, color)| Tag {
            id: new_entity_id(),
            user_id,
            name: name.to_string(),
            color: color.to_string(),
            is_demo: true,
            created_at: timestamp,
        })
        .collect();

    let mut set = DemoSet {
        companies,
        groups,
        tags,
        contacts: Vec::with_capacity(DEMO_CONTACTS.len()),
        contact_companies: Vec::new(),
        contact_groups: Vec::new(),
        contact_tags: Vec::new(),
    };

    for demo in &DEMO_CONTACTS {
        let contact_id = new_entity_id();
        set.contacts.push(Contact {
            id: contact_id,
            user_id,
            first_name: demo.first_name.to_string(),
            surname: demo.surname.to_string(),
            email: demo.email.to_string(),
            phone: Some(demo.phone.to_string()),
            gender: demo.gender,
            birthday: demo
                .birthday
                .and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            address: None,
            avatar_url: None,
            is_favourite: demo.favourite,
            is_demo: true,
            created_at: timestamp,
            updated_at: timestamp,
        });

        if let Some(company) = demo.company.and_then(|i| set.companies.get(i)) {
            set.contact_companies.push(ContactCompany {
                id: new_entity_id(),
                user_id,
                contact_id,
                company_id: company.id,
                is_demo: true,
                created_at: timestamp,
            });
        }
        if let Some(group) = demo.group.and_then(|i| set.groups.get(i)) {
            set.contact_groups.push(ContactGroup {
                id: new_entity_id(),
                user_id,
                contact_id,
                group_id: group.id,
                is_demo: true,
                created_at: timestamp,
            });
        }
        for tag in demo.tags.iter().filter_map(|i| set.tags.get(*i)) {
            set.contact_tags.push(ContactTag {
                id: new_entity_id(),
                user_id,
                contact_id,
                tag_id: tag.id,
                is_demo: true,
                created_at: timestamp,
            });
        }
    }

    set
}

/// Replace the caller's demo data with a fresh copy.
///
/// Seeding twice leaves exactly one demo set.
pub async fn seed_mock_data(backend: &dyn Backend, auth: &AuthContext) -> ApiResult<SeedSummary> {
    let removed = remove_demo_rows(backend, auth).await?;
    let set = build_demo_set(auth);

    backend.insert_records(&set.companies).await?;
    backend.insert_records(&set.groups).await?;
    backend.insert_records(&set.tags).await?;
    backend.insert_records(&set.contacts).await?;
    backend.insert_records(&set.contact_companies).await?;
    backend.insert_records(&set.contact_groups).await?;
    backend.insert_records(&set.contact_tags).await?;

    let summary = SeedSummary {
        contacts: set.contacts.len(),
        companies: set.companies.len(),
        groups: set.groups.len(),
        tags: set.tags.len(),
        contact_tags: set.contact_tags.len(),
        contact_groups: set.contact_groups.len(),
        contact_companies: set.contact_companies.len(),
        removed,
    };

    ActivityLogger::new(backend)
        .log(
            auth,
            ActivityAction::DemoDataSeeded,
            EntityType::DemoData,
            None,
            json!(summary),
        )
        .await;

    tracing::info!(user_id = %auth.user_id, removed, contacts = summary.contacts, "Demo data seeded");
    Ok(summary)
}

/// Remove the caller's demo data. Returns the number of rows deleted.
pub async fn clear_mock_data(backend: &dyn Backend, auth: &AuthContext) -> ApiResult<u64> {
    let removed = remove_demo_rows(backend, auth).await?;

    ActivityLogger::new(backend)
        .log(
            auth,
            ActivityAction::DemoDataCleared,
            EntityType::DemoData,
            None,
            json!({ "removed": removed }),
        )
        .await;
    Ok(removed)
}
