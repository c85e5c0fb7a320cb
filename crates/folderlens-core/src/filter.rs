//! Analytics filter types.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::{ValidationError, ViolationKind};
use crate::item::GeptLevel;

/// Inclusive time range. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Create a closed range.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Range open at the end.
    pub fn since(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    /// Range open at the start.
    pub fn until(end: DateTime<Utc>) -> Self {
        Self {
            start: None,
            end: Some(end),
        }
    }

    /// Check whether an instant falls inside the range.
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start.is_none_or(|s| t >= s) && self.end.is_none_or(|e| t <= e)
    }
}

/// Key used to order filtered activities.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SortKey {
    Name,
    CreatedAt,
    UpdatedAt,
    Size,
    Type,
    Views,
}

/// Direction of a sort.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Declarative filter over a folder's activities and subfolders.
///
/// Every field is independently optional: an unset field, or an empty set,
/// imposes no constraint. All predicates combine with logical AND.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct AnalyticsFilter {
    /// Range compared against `updated_at`.
    #[builder(default)]
    #[serde(default)]
    pub date_range: Option<DateRange>,

    /// Allowed GEPT levels. Activities with no level never match a non-empty set.
    #[builder(default, setter(each(name = "gept_level", into)))]
    #[serde(default)]
    pub gept_levels: BTreeSet<GeptLevel>,

    /// Allowed activity types.
    #[builder(default, setter(each(name = "activity_type", into)))]
    #[serde(default)]
    pub activity_types: BTreeSet<CompactString>,

    /// Required tags, matched if at least one is present.
    #[builder(default, setter(each(name = "tag", into)))]
    #[serde(default)]
    pub tags: BTreeSet<CompactString>,

    /// Allowed collaborator identities, matched if at least one is present.
    #[builder(default, setter(each(name = "collaborator", into)))]
    #[serde(default)]
    pub collaborators: BTreeSet<CompactString>,

    /// Minimum activity size in bytes (inclusive).
    #[builder(default)]
    #[serde(default)]
    pub min_size: Option<u64>,

    /// Maximum activity size in bytes (inclusive).
    #[builder(default)]
    #[serde(default)]
    pub max_size: Option<u64>,

    /// Whether subfolders take part in the report.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_subfolders: bool,

    /// Ordering applied to the surviving items.
    #[builder(default)]
    #[serde(default)]
    pub sort_by: Option<SortKey>,

    #[builder(default)]
    #[serde(default)]
    pub sort_direction: SortDirection,
}

fn default_true() -> bool {
    true
}

impl AnalyticsFilterBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(Some(range)) = &self.date_range {
            if let (Some(start), Some(end)) = (range.start, range.end) {
                if start > end {
                    return Err(format!("Date range start {start} is after end {end}"));
                }
            }
        }
        if let (Some(Some(min)), Some(Some(max))) = (self.min_size, self.max_size) {
            if min > max {
                return Err(format!("Minimum size {min} exceeds maximum size {max}"));
            }
        }
        Ok(())
    }
}

impl Default for AnalyticsFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyticsFilter {
    /// Create a filter builder.
    pub fn builder() -> AnalyticsFilterBuilder {
        AnalyticsFilterBuilder::default()
    }

    /// Create a filter that imposes no constraint.
    pub fn new() -> Self {
        Self {
            date_range: None,
            gept_levels: BTreeSet::new(),
            activity_types: BTreeSet::new(),
            tags: BTreeSet::new(),
            collaborators: BTreeSet::new(),
            min_size: None,
            max_size: None,
            include_subfolders: true,
            sort_by: None,
            sort_direction: SortDirection::Asc,
        }
    }

    /// Check whether this filter constrains anything.
    pub fn is_unconstrained(&self) -> bool {
        self.date_range.is_none()
            && self.gept_levels.is_empty()
            && self.activity_types.is_empty()
            && self.tags.is_empty()
            && self.collaborators.is_empty()
            && self.min_size.is_none()
            && self.max_size.is_none()
            && self.include_subfolders
    }

    /// Canonical serialization used as a cache key.
    ///
    /// Set-valued fields are ordered sets and struct fields serialize in
    /// declaration order, so logically identical filters yield identical keys.
    pub fn cache_key(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"))
    }

    /// Check the filter for inverted ranges.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if let Some(DateRange {
            start: Some(start),
            end: Some(end),
        }) = self.date_range
        {
            if start > end {
                errors.push(ValidationError::new(
                    "filter",
                    "date_range",
                    format!("start {start} is after end {end}"),
                    ViolationKind::InvertedRange,
                ));
            }
        }
        if let (Some(min), Some(max)) = (self.min_size, self.max_size) {
            if min > max {
                errors.push(ValidationError::new(
                    "filter",
                    "min_size",
                    format!("{min} exceeds max_size {max}"),
                    ViolationKind::InvertedRange,
                ));
            }
        }
        errors
    }
}
