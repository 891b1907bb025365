//! Dashboard Service

use chrono::Utc;
use rolodex_core::{ActivityLog, AssignableKind, Contact, Table, Tag, Task};
use rolodex_storage::{Backend, BackendExt, Filter, Query};

use super::member_counts;
use crate::auth::AuthContext;
use crate::error::ApiResult;
use crate::types::{DashboardSummary, TagUsage};

const RECENT_CONTACTS: usize = 5;
const UPCOMING_TASKS: usize = 5;
const RECENT_ACTIVITY: usize = 10;

/// Counts and short lists for the dashboard widgets.
pub async fn dashboard_summary(
    backend: &dyn Backend,
    auth: &AuthContext,
) -> ApiResult<DashboardSummary> {
    let owned = Filter::owned_by(auth.user_id);
    let today = Utc::now().date_naive();
    let open_tasks = owned.clone().eq("is_completed", false);
    let overdue_tasks = open_tasks.clone().lt("due_date", today);
    let favourites = owned.clone().eq("is_favourite", true);

    let (
        contact_count,
        company_count,
        group_count,
        tag_count,
        favourite_count,
        open_task_count,
        overdue_task_count,
    ) = tokio::try_join!(
        backend.count(Table::Contacts, &owned),
        backend.count(Table::Companies, &owned),
        backend.count(Table::Groups, &owned),
        backend.count(Table::Tags, &owned),
        backend.count(Table::Contacts, &favourites),
        backend.count(Table::Tasks, &open_tasks),
        backend.count(Table::Tasks, &overdue_tasks),
    )?;

    let recent_contacts = Query::table(Table::Contacts)
        .filter(owned.clone())
        .order_by("created_at", false)
        .limit(RECENT_CONTACTS);
    let upcoming_tasks = Query::table(Table::Tasks)
        .filter(open_tasks.clone().gte("due_date", today))
        .order_by("due_date", true)
        .limit(UPCOMING_TASKS);
    let recent_activity = Query::table(Table::ActivityLogs)
        .filter(owned.clone())
        .order_by("created_at", false)
        .limit(RECENT_ACTIVITY);

    let (recent_contacts, upcoming_tasks, recent_activity, tags) = tokio::try_join!(
        backend.fetch_query::<Contact>(&recent_contacts),
        backend.fetch_query::<Task>(&upcoming_tasks),
        backend.fetch_query::<ActivityLog>(&recent_activity),
        backend.fetch::<Tag>(owned.clone()),
    )?;

    let counts = member_counts(backend, auth, AssignableKind::Tag).await?;
    let mut tag_usage: Vec<TagUsage> = tags
        .into_iter()
        .map(|tag| TagUsage {
            contact_count: counts.get(&tag.id).copied().unwrap_or(0),
            tag_id: tag.id,
            name: tag.name,
            color: tag.color,
        })
        .collect();
    tag_usage.sort_by(|a, b| {
        b.contact_count
            .cmp(&a.contact_count)
            .then_with(|| a.name.cmp(&b.name))
    });

    Ok(DashboardSummary {
        contact_count,
        company_count,
        group_count,
        tag_count,
        favourite_count,
        open_task_count,
        overdue_task_count,
        recent_contacts,
        upcoming_tasks,
        recent_activity,
        tag_usage,
    })
}
