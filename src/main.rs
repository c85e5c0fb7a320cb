//! folderlens - analytics for folders of learning content.
//!
//! Usage:
//!   folderlens stats INPUT       Statistics for one folder level
//!   folderlens rollup INPUT      Statistics for a whole folder subtree
//!   folderlens validate INPUT    Check input against the domain rules
//!   folderlens --help            Show help

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use folderlens_analyze::{
    ExportFormat, FolderRollup, StatisticsCache, StatisticsCalculator, export, rollup,
};
use folderlens_core::{
    ActivityItem, AnalyticsConfig, AnalyticsError, AnalyticsFilter, DateRange, FolderId,
    FolderItem, FolderSnapshot, FolderStatistics, GeptLevel, SortDirection, SortKey,
    ValidationError,
};

#[derive(Parser)]
#[command(
    name = "folderlens",
    version,
    about = "Statistics, trends and health scores for content folders",
    long_about = "folderlens summarizes the activities and subfolders of a folder.\n\n\
                  Input is JSON exported from the content repository. Use `stats` \
                  for one folder level or `rollup` for a whole subtree."
)]
struct Cli {
    /// Analytics config file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Statistics for one folder level
    Stats {
        /// Folder JSON: { folder_id, activities, subfolders }
        input: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: StatsFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Statistics for a folder and every descendant
    Rollup {
        /// Folder snapshot JSON: { folder, activities, children }
        input: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Validate a folder or snapshot file without analyzing it
    Validate {
        /// Folder or folder snapshot JSON
        input: PathBuf,
    },
}

#[derive(Debug, Default, Args)]
struct FilterArgs {
    /// Only items updated at or after this time (RFC 3339)
    #[arg(long)]
    since: Option<DateTime<Utc>>,

    /// Only items updated at or before this time (RFC 3339)
    #[arg(long)]
    until: Option<DateTime<Utc>>,

    /// Allowed GEPT level (repeatable)
    #[arg(long = "gept")]
    gept_levels: Vec<GeptLevel>,

    /// Allowed activity type (repeatable)
    #[arg(long = "type")]
    activity_types: Vec<String>,

    /// Required tag, any of (repeatable)
    #[arg(long = "tag")]
    tags: Vec<String>,

    /// Collaborator identity, any of (repeatable)
    #[arg(long = "collaborator")]
    collaborators: Vec<String>,

    /// Minimum activity size (e.g., "1KB", "10MB")
    #[arg(long)]
    min_size: Option<String>,

    /// Maximum activity size (e.g., "1KB", "10MB")
    #[arg(long)]
    max_size: Option<String>,

    /// Leave subfolders out of the report
    #[arg(long)]
    no_subfolders: bool,

    /// Sort key for the filtered activities
    #[arg(long)]
    sort: Option<SortKey>,

    /// Sort descending
    #[arg(long)]
    desc: bool,
}

impl FilterArgs {
    fn to_filter(&self) -> Result<AnalyticsFilter> {
        let mut builder = AnalyticsFilter::builder();

        if self.since.is_some() || self.until.is_some() {
            builder.date_range(DateRange {
                start: self.since,
                end: self.until,
            });
        }
        for level in &self.gept_levels {
            builder.gept_level::<GeptLevel, _>(*level);
        }
        for activity_type in &self.activity_types {
            builder.activity_type(activity_type.as_str());
        }
        for tag in &self.tags {
            builder.tag(tag.as_str());
        }
        for collaborator in &self.collaborators {
            builder.collaborator(collaborator.as_str());
        }
        if let Some(min) = &self.min_size {
            builder.min_size(parse_size(min)?);
        }
        if let Some(max) = &self.max_size {
            builder.max_size(parse_size(max)?);
        }

        builder
            .include_subfolders(!self.no_subfolders)
            .sort_by(self.sort)
            .sort_direction(if self.desc {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            })
            .build()
            .context("Invalid filter")
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum StatsFormat {
    #[default]
    Text,
    Json,
    Csv,
}

/// One folder level as exported by the content repository.
#[derive(Debug, Deserialize)]
struct FolderInput {
    folder_id: FolderId,
    #[serde(default)]
    activities: Vec<ActivityItem>,
    #[serde(default)]
    subfolders: Vec<FolderItem>,
}

impl FolderInput {
    fn validate(&self) -> Vec<ValidationError> {
        self.activities
            .iter()
            .flat_map(ActivityItem::validate)
            .chain(self.subfolders.iter().flat_map(FolderItem::validate))
            .collect()
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Stats {
            input,
            filter,
            format,
            output,
        } => {
            run_stats(&input, &filter, format, output.as_deref(), config)?;
        }
        Command::Rollup {
            input,
            filter,
            format,
        } => {
            run_rollup(&input, &filter, format, config)?;
        }
        Command::Validate { input } => {
            run_validate(&input)?;
        }
    }

    Ok(())
}

/// Log to stderr. `RUST_LOG` overrides the verbosity flag.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(io::stderr)
        .try_init();
}

/// Load the analytics config, falling back to defaults without a file.
fn load_config(path: Option<&Path>) -> Result<AnalyticsConfig> {
    let Some(path) = path else {
        return Ok(AnalyticsConfig::default());
    };

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: AnalyticsConfig = toml::from_str(&text)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    config.validate()?;

    info!(path = %path.display(), "Loaded analytics config");
    Ok(config)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(io::BufReader::new(file))
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Report every violation, then fail with the bundled error.
fn reject_invalid(errors: Vec<ValidationError>) -> Result<()> {
    if !errors.is_empty() {
        warn!(count = errors.len(), "Rejected invalid input");
    }
    for error in &errors {
        eprintln!("  {error}");
    }
    match AnalyticsError::from_validation(errors) {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

/// Compute and print statistics for one folder level.
fn run_stats(
    input: &Path,
    filter_args: &FilterArgs,
    format: StatsFormat,
    output: Option<&Path>,
    config: AnalyticsConfig,
) -> Result<()> {
    let folder: FolderInput = read_json(input)?;
    let filter = filter_args.to_filter()?;

    let mut errors = folder.validate();
    errors.extend(filter.validate());
    reject_invalid(errors)?;

    let cache = StatisticsCache::with_config(config);
    let report = cache.get_folder_statistics(
        &folder.folder_id,
        &folder.activities,
        &folder.subfolders,
        &filter,
    );

    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    match format {
        StatsFormat::Text => print_report(&mut writer, &folder.folder_id, &report)?,
        StatsFormat::Json => export(&report, ExportFormat::Json, &mut writer)?,
        StatsFormat::Csv => export(&report, ExportFormat::Csv, &mut writer)?,
    }
    writer.flush()?;

    if let Some(path) = output {
        eprintln!("Exported to {}", path.display());
    }

    Ok(())
}

/// Compute and print statistics for a whole subtree.
fn run_rollup(
    input: &Path,
    filter_args: &FilterArgs,
    format: OutputFormat,
    config: AnalyticsConfig,
) -> Result<()> {
    let snapshot: FolderSnapshot = read_json(input)?;
    let filter = filter_args.to_filter()?;

    let mut errors = snapshot.validate();
    errors.extend(filter.validate());
    reject_invalid(errors)?;

    eprintln!("Analyzing {} folders...", snapshot.folder_count());

    let calculator = StatisticsCalculator::with_config(config);
    let result = rollup(&snapshot, &filter, &calculator, Utc::now());

    match format {
        OutputFormat::Text => {
            println!();
            println!("{}", "─".repeat(70));
            println!(
                " {} - {} activities, {}",
                result.name,
                result.recursive_activities,
                format_size(result.recursive_size)
            );
            println!("{}", "─".repeat(70));
            println!();
            print_rollup(&result, 0);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

/// Validate an input file, accepting either a folder or a snapshot.
fn run_validate(input: &Path) -> Result<()> {
    let value: serde_json::Value = read_json(input)?;

    let errors = if value.get("folder").is_some() {
        serde_json::from_value::<FolderSnapshot>(value)
            .context("Not a valid folder snapshot")?
            .validate()
    } else if value.get("folder_id").is_some() {
        serde_json::from_value::<FolderInput>(value)
            .context("Not a valid folder")?
            .validate()
    } else {
        bail!("Expected a folder (folder_id) or a folder snapshot (folder)");
    };

    if errors.is_empty() {
        println!("{}: ok", input.display());
        return Ok(());
    }

    println!("{}: {} problem(s)", input.display(), errors.len());
    reject_invalid(errors)
}

/// Print a statistics report as text.
fn print_report(out: &mut dyn Write, folder_id: &FolderId, report: &FolderStatistics) -> Result<()> {
    let rule = "─".repeat(70);
    writeln!(out)?;
    writeln!(out, "{rule}")?;
    writeln!(out, " Folder Statistics - {folder_id}")?;
    writeln!(out, "{rule}")?;
    writeln!(out)?;

    let basic = &report.basic;
    writeln!(
        out,
        " {} activities, {} subfolders, {} (avg {})",
        basic.total_activities,
        basic.total_subfolders,
        format_size(basic.total_size),
        format_size(basic.average_activity_size.round() as u64)
    )?;
    if let (Some(oldest), Some(newest)) = (report.time.oldest_activity, report.time.newest_activity) {
        writeln!(
            out,
            " Created {} .. {}",
            oldest.format("%Y-%m-%d"),
            newest.format("%Y-%m-%d")
        )?;
    }
    writeln!(out)?;

    if !report.distributions.by_type.is_empty() {
        writeln!(out, " Types:")?;
        for (activity_type, count) in &report.distributions.by_type {
            writeln!(out, "   {:<20} {:>6}", activity_type, count)?;
        }
        writeln!(out)?;
    }

    let gept = &report.distributions.by_gept_level;
    writeln!(out, " GEPT Levels:")?;
    writeln!(out, "   {:<20} {:>6}", "elementary", gept.elementary)?;
    writeln!(out, "   {:<20} {:>6}", "intermediate", gept.intermediate)?;
    writeln!(out, "   {:<20} {:>6}", "high-intermediate", gept.high_intermediate)?;
    writeln!(out, "   {:<20} {:>6}", "unspecified", gept.unspecified)?;
    writeln!(out)?;

    let learning = &report.learning;
    writeln!(
        out,
        " Learning: {} activities, avg score {:.1}, completion {:.0}%, {} studied recently",
        learning.activities_with_learning_data,
        learning.average_score,
        learning.average_completion_rate * 100.0,
        learning.recent_activity
    )?;

    let usage = &report.usage;
    writeln!(
        out,
        " Usage: {} views, {} edits, {} shares",
        usage.total_views, usage.total_edits, usage.total_shares
    )?;
    if let Some(most_viewed) = &usage.most_viewed {
        writeln!(out, "   most viewed: {} ({} views)", most_viewed.name, most_viewed.value)?;
    }

    let collab = &report.collaboration;
    writeln!(
        out,
        " Collaboration: {} shared, {} collaborators across {} activities",
        collab.shared_activities, collab.total_collaborators, collab.activities_with_collaborators
    )?;
    writeln!(out)?;

    if !report.tags.most_used_tags.is_empty() {
        writeln!(out, " Top Tags:")?;
        for tag in &report.tags.most_used_tags {
            writeln!(out, "   {:<20} {:>6} {:>5.1}%", tag.tag, tag.count, tag.percentage)?;
        }
        writeln!(out)?;
    }

    let health = &report.health;
    writeln!(out, " Health: {:.0}/100", health.overall_health)?;
    for (name, score) in [
        ("freshness", health.activity_freshness),
        ("engagement", health.learning_engagement),
        ("collaboration", health.collaboration_health),
        ("content quality", health.content_quality),
    ] {
        writeln!(out, "   {:<20} {:>5.1} {}", name, score, make_bar(score / 100.0, 20))?;
    }
    writeln!(out)?;

    Ok(())
}

/// Print a rollup node and its children.
fn print_rollup(node: &FolderRollup, depth: usize) {
    let indent = "  ".repeat(depth);
    println!(
        "{}{:<40} {:>6} {:>10}  health {:>3.0}",
        indent,
        truncate(&node.name, 40),
        node.recursive_activities,
        format_size(node.recursive_size),
        node.statistics.health.overall_health
    );
    for child in &node.children {
        print_rollup(child, depth + 1);
    }
}

/// Create a simple ASCII bar.
fn make_bar(ratio: f64, width: usize) -> String {
    let filled = (ratio.clamp(0.0, 1.0) * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Truncate a string to max characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{head}…")
    }
}

/// Parse a size string (e.g., "1KB", "10MB", "1GB").
fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_uppercase();
    let number = s.trim_end_matches(|c: char| c.is_ascii_alphabetic());

    let multiplier: u64 = match &s[number.len()..] {
        "" | "B" => 1,
        "K" | "KB" => 1024,
        "M" | "MB" => 1024 * 1024,
        "G" | "GB" => 1024 * 1024 * 1024,
        unit => bail!("Unknown size unit '{unit}'"),
    };
    let num: f64 = number
        .trim()
        .parse()
        .with_context(|| format!("Invalid size '{s}'"))?;
    if !num.is_finite() || num < 0.0 {
        bail!("Invalid size '{s}'");
    }

    Ok((num * multiplier as f64) as u64)
}
