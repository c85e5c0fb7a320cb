//! Filter stage: narrows activities and subfolders by an [`AnalyticsFilter`].
//!
//! Each predicate is independent and all of them are ANDed together, so the
//! result is the same whatever order they are evaluated in. Inputs are never
//! mutated; the survivors are cloned into a new list.

use std::cmp::Ordering;

use folderlens_core::{ActivityItem, AnalyticsFilter, FolderItem, SortDirection, SortKey};

/// Check whether an activity passes every predicate of the filter.
pub fn activity_matches(activity: &ActivityItem, filter: &AnalyticsFilter) -> bool {
    if let Some(range) = &filter.date_range {
        if !range.contains(activity.updated_at) {
            return false;
        }
    }

    // Unset level never matches a non-empty level set.
    if !filter.gept_levels.is_empty()
        && !activity
            .gept_level
            .is_some_and(|level| filter.gept_levels.contains(&level))
    {
        return false;
    }

    if !filter.activity_types.is_empty() && !filter.activity_types.contains(&activity.activity_type)
    {
        return false;
    }

    if !filter.tags.is_empty() && !activity.tags.iter().any(|t| filter.tags.contains(t)) {
        return false;
    }

    if !filter.collaborators.is_empty() {
        let shares_identity = activity.collaboration_data.as_ref().is_some_and(|c| {
            c.permissions
                .iter()
                .any(|identity| filter.collaborators.contains(identity))
        });
        if !shares_identity {
            return false;
        }
    }

    if filter.min_size.is_some_and(|min| activity.size < min) {
        return false;
    }
    if filter.max_size.is_some_and(|max| activity.size > max) {
        return false;
    }

    true
}

/// Check whether a folder passes the predicates that apply to folders.
///
/// Folders have no size, type or level, so only the date range, tags and
/// collaborators constrain them.
pub fn folder_matches(folder: &FolderItem, filter: &AnalyticsFilter) -> bool {
    if !filter.include_subfolders {
        return false;
    }

    if let Some(range) = &filter.date_range {
        if !range.contains(folder.updated_at) {
            return false;
        }
    }

    if !filter.tags.is_empty() && !folder.tags.iter().any(|t| filter.tags.contains(t)) {
        return false;
    }

    if !filter.collaborators.is_empty()
        && !folder
            .permissions
            .identities()
            .any(|identity| filter.collaborators.contains(identity))
    {
        return false;
    }

    true
}

/// Apply the filter to a list of activities, then order the survivors.
pub fn apply_filter(activities: &[ActivityItem], filter: &AnalyticsFilter) -> Vec<ActivityItem> {
    let mut result: Vec<ActivityItem> = activities
        .iter()
        .filter(|a| activity_matches(a, filter))
        .cloned()
        .collect();

    if let Some(key) = filter.sort_by {
        sort_activities(&mut result, key, filter.sort_direction);
    }

    result
}

/// Apply the filter to a list of folders, then order the survivors.
pub fn apply_folder_filter(folders: &[FolderItem], filter: &AnalyticsFilter) -> Vec<FolderItem> {
    let mut result: Vec<FolderItem> = folders
        .iter()
        .filter(|f| folder_matches(f, filter))
        .cloned()
        .collect();

    if let Some(key) = filter.sort_by {
        sort_folders(&mut result, key, filter.sort_direction);
    }

    result
}

/// Stable sort of activities by key and direction.
pub fn sort_activities(activities: &mut [ActivityItem], key: SortKey, direction: SortDirection) {
    activities.sort_by(|a, b| {
        let ord = match key {
            SortKey::Name => a.name.cmp(&b.name),
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortKey::Size => a.size.cmp(&b.size),
            SortKey::Type => a.activity_type.cmp(&b.activity_type),
            SortKey::Views => a.view_count().cmp(&b.view_count()),
        };
        directed(ord, direction)
    });
}

/// Stable sort of folders. Keys with no folder counterpart keep input order.
pub fn sort_folders(folders: &mut [FolderItem], key: SortKey, direction: SortDirection) {
    folders.sort_by(|a, b| {
        let ord = match key {
            SortKey::Name => a.name.cmp(&b.name),
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortKey::Size | SortKey::Type | SortKey::Views => Ordering::Equal,
        };
        directed(ord, direction)
    });
}

fn directed(ord: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
    }
}
