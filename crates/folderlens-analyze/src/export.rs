//! Report export to JSON and flat CSV.

use std::fmt::Display;
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumString};

use folderlens_core::{ActivityRef, AnalyticsError, FolderStatistics};

/// Export file format.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, StrumDisplay, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

/// Write a report in the given format.
pub fn export<W: Write>(
    report: &FolderStatistics,
    format: ExportFormat,
    writer: W,
) -> Result<(), AnalyticsError> {
    match format {
        ExportFormat::Json => export_json(report, writer),
        ExportFormat::Csv => export_csv(report, writer),
    }
}

/// Write a report as pretty-printed JSON.
pub fn export_json<W: Write>(report: &FolderStatistics, mut writer: W) -> Result<(), AnalyticsError> {
    serde_json::to_writer_pretty(&mut writer, report)?;
    writeln!(writer)?;
    Ok(())
}

/// Write a report as `section,metric,value` rows, one per metric and one per trend point.
pub fn export_csv<W: Write>(report: &FolderStatistics, writer: W) -> Result<(), AnalyticsError> {
    let mut rows = Rows {
        inner: csv::Writer::from_writer(writer),
    };
    rows.row("section", "metric", "value")?;

    rows.row("report", "generated_at", report.generated_at.to_rfc3339())?;

    let basic = &report.basic;
    rows.row("basic", "total_activities", basic.total_activities)?;
    rows.row("basic", "total_subfolders", basic.total_subfolders)?;
    rows.row("basic", "total_size", basic.total_size)?;
    rows.row("basic", "average_activity_size", basic.average_activity_size)?;

    let time = &report.time;
    rows.time("oldest_activity", time.oldest_activity)?;
    rows.time("newest_activity", time.newest_activity)?;
    rows.time("last_modified", time.last_modified)?;
    rows.time("last_accessed", time.last_accessed)?;

    for (activity_type, count) in &report.distributions.by_type {
        rows.row("type", activity_type, count)?;
    }
    let gept = &report.distributions.by_gept_level;
    rows.row("gept", "elementary", gept.elementary)?;
    rows.row("gept", "intermediate", gept.intermediate)?;
    rows.row("gept", "high-intermediate", gept.high_intermediate)?;
    rows.row("gept", "unspecified", gept.unspecified)?;

    let learning = &report.learning;
    rows.row("learning", "average_completion_rate", learning.average_completion_rate)?;
    rows.row("learning", "average_score", learning.average_score)?;
    rows.row("learning", "total_attempts", learning.total_attempts)?;
    rows.row("learning", "total_time_spent", learning.total_time_spent)?;
    rows.row("learning", "average_retention_rate", learning.average_retention_rate)?;
    rows.row("learning", "average_difficulty_level", learning.average_difficulty_level)?;
    rows.row(
        "learning",
        "activities_with_learning_data",
        learning.activities_with_learning_data,
    )?;
    rows.row("learning", "recent_activity", learning.recent_activity)?;

    let usage = &report.usage;
    rows.row("usage", "total_views", usage.total_views)?;
    rows.row("usage", "total_edits", usage.total_edits)?;
    rows.row("usage", "total_shares", usage.total_shares)?;
    rows.row("usage", "total_downloads", usage.total_downloads)?;
    rows.row("usage", "total_favorites", usage.total_favorites)?;
    rows.row("usage", "total_comments", usage.total_comments)?;
    rows.row("usage", "average_views_per_activity", usage.average_views_per_activity)?;
    rows.activity("usage", "most_viewed", usage.most_viewed.as_ref())?;
    rows.activity("usage", "most_edited", usage.most_edited.as_ref())?;

    let collab = &report.collaboration;
    rows.row("collaboration", "total_collaborators", collab.total_collaborators)?;
    rows.row(
        "collaboration",
        "activities_with_collaborators",
        collab.activities_with_collaborators,
    )?;
    rows.row("collaboration", "shared_activities", collab.shared_activities)?;
    rows.row("collaboration", "public_activities", collab.public_activities)?;
    rows.row("collaboration", "private_activities", collab.private_activities)?;
    rows.row("collaboration", "class_activities", collab.class_activities)?;
    rows.row("collaboration", "recent_collaborations", collab.recent_collaborations)?;
    rows.activity(
        "collaboration",
        "most_collaborative",
        collab.most_collaborative.as_ref(),
    )?;

    rows.row("tags", "total_tags", report.tags.total_tags)?;
    rows.row("tags", "total_occurrences", report.tags.total_occurrences)?;
    for (tag, count) in &report.tags.tag_distribution {
        rows.row("tag", tag, count)?;
    }

    for point in &report.trends.activity_creation {
        rows.row("trend.creation", point.date, point.count)?;
    }
    for point in &report.trends.usage {
        rows.row("trend.views", point.date, point.views)?;
        rows.row("trend.edits", point.date, point.edits)?;
    }
    for point in &report.trends.learning_progress {
        rows.row("trend.score", point.date, point.average_score)?;
        rows.row("trend.completion", point.date, point.completion_rate)?;
    }

    let health = &report.health;
    rows.row("health", "activity_freshness", health.activity_freshness)?;
    rows.row("health", "learning_engagement", health.learning_engagement)?;
    rows.row("health", "collaboration_health", health.collaboration_health)?;
    rows.row("health", "content_quality", health.content_quality)?;
    rows.row("health", "overall_health", health.overall_health)?;

    rows.inner.flush()?;
    Ok(())
}

struct Rows<W: Write> {
    inner: csv::Writer<W>,
}

impl<W: Write> Rows<W> {
    fn row(
        &mut self,
        section: &str,
        metric: impl Display,
        value: impl Display,
    ) -> Result<(), AnalyticsError> {
        self.inner
            .write_record([section, metric.to_string().as_str(), value.to_string().as_str()])
            .map_err(csv_error)
    }

    fn time(&mut self, metric: &str, value: Option<DateTime<Utc>>) -> Result<(), AnalyticsError> {
        let value = value.map(|t| t.to_rfc3339()).unwrap_or_default();
        self.row("time", metric, value)
    }

    fn activity(
        &mut self,
        section: &str,
        metric: &str,
        value: Option<&ActivityRef>,
    ) -> Result<(), AnalyticsError> {
        let value = value.map(|r| r.id.to_string()).unwrap_or_default();
        self.row(section, metric, value)
    }
}

fn csv_error(err: csv::Error) -> AnalyticsError {
    AnalyticsError::Export {
        source: Box::new(err),
    }
}
