//! Folder types.

use std::fmt;

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ViolationKind};
use crate::item::ActivityItem;

/// Unique identifier for a folder.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderId(pub CompactString);

impl FolderId {
    /// Create a new FolderId.
    pub fn new(id: impl Into<CompactString>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FolderId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Access roles on a folder. Carried as opaque data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolderPermissions {
    pub owner: CompactString,
    pub viewers: Vec<CompactString>,
    pub editors: Vec<CompactString>,
    pub managers: Vec<CompactString>,
}

impl FolderPermissions {
    /// Create permissions with only an owner.
    pub fn owned_by(owner: impl Into<CompactString>) -> Self {
        Self {
            owner: owner.into(),
            ..Self::default()
        }
    }

    /// Iterate every identity mentioned, owner first.
    pub fn identities(&self) -> impl Iterator<Item = &CompactString> {
        std::iter::once(&self.owner)
            .filter(|o| !o.is_empty())
            .chain(&self.viewers)
            .chain(&self.editors)
            .chain(&self.managers)
    }
}

/// Public sharing settings for a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareSettings {
    pub is_public: bool,
    #[serde(default)]
    pub share_url: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// A container of activities and nested folders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderItem {
    pub id: FolderId,
    #[serde(default)]
    pub parent_id: Option<FolderId>,
    pub name: CompactString,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: IndexSet<CompactString>,
    #[serde(default)]
    pub color: Option<CompactString>,
    #[serde(default)]
    pub icon: Option<CompactString>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: FolderPermissions,
    #[serde(default)]
    pub share_settings: Option<ShareSettings>,
}

impl FolderItem {
    /// Create a folder with default permissions and no metadata.
    pub fn new(
        id: impl Into<CompactString>,
        name: impl Into<CompactString>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: FolderId::new(id),
            parent_id: None,
            name: name.into(),
            created_at,
            updated_at: created_at,
            tags: IndexSet::new(),
            color: None,
            icon: None,
            description: None,
            permissions: FolderPermissions::default(),
            share_settings: None,
        }
    }

    /// Set the parent folder.
    pub fn with_parent(mut self, parent: impl Into<CompactString>) -> Self {
        self.parent_id = Some(FolderId::new(parent));
        self
    }

    /// Replace the tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the last update time.
    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = updated_at;
        self
    }

    /// Set the permissions.
    pub fn with_permissions(mut self, permissions: FolderPermissions) -> Self {
        self.permissions = permissions;
        self
    }

    /// Check whether the folder carries a tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Check the domain invariants of this folder.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.updated_at < self.created_at {
            errors.push(ValidationError::new(
                self.id.as_str(),
                "updated_at",
                format!("{} is earlier than created_at {}", self.updated_at, self.created_at),
                ViolationKind::TimestampsOutOfOrder,
            ));
        }
        errors
    }
}

/// A folder together with its direct activities and nested child snapshots.
///
/// This is the pre-flattened input for recursive rollups; the aggregation
/// itself only ever looks at one level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderSnapshot {
    pub folder: FolderItem,
    #[serde(default)]
    pub activities: Vec<ActivityItem>,
    #[serde(default)]
    pub children: Vec<FolderSnapshot>,
}

impl FolderSnapshot {
    /// Create a snapshot with no content.
    pub fn new(folder: FolderItem) -> Self {
        Self {
            folder,
            activities: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Folder items of the direct children.
    pub fn subfolders(&self) -> Vec<FolderItem> {
        self.children.iter().map(|c| c.folder.clone()).collect()
    }

    /// Total number of folders in this subtree, including this one.
    pub fn folder_count(&self) -> usize {
        1 + self.children.iter().map(FolderSnapshot::folder_count).sum::<usize>()
    }

    /// Validate every folder and activity in this subtree.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = self.folder.validate();
        for activity in &self.activities {
            errors.extend(activity.validate());
        }
        for child in &self.children {
            errors.extend(child.validate());
        }
        errors
    }
}
