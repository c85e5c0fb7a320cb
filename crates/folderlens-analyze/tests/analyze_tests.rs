use std::collections::BTreeSet;
use std::fs;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use compact_str::CompactString;
use folderlens_analyze::{
    AnalyticsConfig, AnalyticsFilter, ExportFormat, StatisticsCache, StatisticsCalculator,
    apply_filter, export, rollup, tag_statistics,
};
use folderlens_core::{
    ActivityItem, CollaborationData, DateRange, FolderId, FolderItem, FolderSnapshot, GeptLevel,
    LearningData, ManualClock, ShareType, UsageStats,
};
use tempfile::TempDir;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 15, 12, 0, 0).unwrap()
}

fn learning(score: f64, completion: f64, studied: DateTime<Utc>) -> LearningData {
    LearningData {
        completion_rate: completion,
        average_score: score,
        total_attempts: 10,
        successful_attempts: 7,
        time_spent: 30,
        retention_rate: 0.8,
        difficulty_level: 4.0,
        last_studied_at: Some(studied),
    }
}

/// A mixed folder: some activities carry every optional block, some none.
fn sample_activities() -> Vec<ActivityItem> {
    vec![
        ActivityItem::new("a1", "Past tense", "quiz", 2048, now() - TimeDelta::days(3))
            .with_gept_level(GeptLevel::Elementary)
            .with_tags(["grammar", "verbs"])
            .with_last_accessed_at(now() - TimeDelta::hours(2))
            .with_learning_data(learning(80.0, 0.9, now() - TimeDelta::days(1)))
            .with_usage_stats(UsageStats {
                view_count: 120,
                edit_count: 4,
                share_count: 2,
                ..UsageStats::default()
            }),
        ActivityItem::new("a2", "Reading 1", "reading", 4096, now() - TimeDelta::days(40))
            .with_gept_level(GeptLevel::Intermediate)
            .with_tags(["reading"])
            .with_collaboration_data(CollaborationData {
                collaborator_count: 3,
                last_collaborated_at: Some(now() - TimeDelta::days(2)),
                is_shared: true,
                share_type: ShareType::Class,
                permissions: BTreeSet::from([
                    CompactString::from("tutor-1"),
                    CompactString::from("tutor-2"),
                ]),
            }),
        ActivityItem::new("a3", "Flashcards", "flashcard", 512, now() - TimeDelta::days(10))
            .with_tags(["verbs"])
            .with_updated_at(now() - TimeDelta::days(5))
            .with_usage_stats(UsageStats {
                view_count: 300,
                edit_count: 1,
                ..UsageStats::default()
            }),
        ActivityItem::new("a4", "Listening", "quiz", 1024, now() - TimeDelta::days(90))
            .with_gept_level(GeptLevel::HighIntermediate),
    ]
}

#[test]
fn test_empty_folder_report() {
    let report = StatisticsCalculator::new().analyze(&[], &[], &AnalyticsFilter::default(), now());

    assert!(report.is_empty());
    assert_eq!(report.basic.total_activities, 0);
    assert_eq!(report.basic.average_activity_size, 0.0);
    assert!(report.health.all_scores().iter().all(|&s| s == 0.0));
    assert!(report.distributions.by_type.is_empty());
    assert_eq!(report.distributions.by_gept_level.total(), 0);
    assert_eq!(report.time.oldest_activity, None);
    assert_eq!(report.trends.activity_creation.len(), 30);
    assert!(report.trends.activity_creation.iter().all(|p| p.count == 0));
    assert_eq!(report.trends.usage.len(), 7);
    assert_eq!(report.trends.learning_progress.len(), 7);
    assert!(report.usage.most_viewed.is_none());
}

#[test]
fn test_single_activity_without_optional_blocks() {
    let activity = ActivityItem::new("a", "Quiz", "quiz", 1000, now())
        .with_gept_level(GeptLevel::Elementary);
    let report =
        StatisticsCalculator::new().analyze(&[activity], &[], &AnalyticsFilter::default(), now());

    assert_eq!(report.basic.total_activities, 1);
    assert_eq!(report.basic.total_size, 1000);
    assert_eq!(report.basic.average_activity_size, 1000.0);
    assert_eq!(report.distributions.by_type.len(), 1);
    assert_eq!(report.distributions.by_type["quiz"], 1);
    assert_eq!(report.distributions.by_gept_level.elementary, 1);
    assert_eq!(report.learning.average_completion_rate, 0.0);
    assert_eq!(report.learning.activities_with_learning_data, 0);
    assert_eq!(report.trends.activity_creation[29].count, 1);
}

#[test]
fn test_tag_scenario() {
    let activities = vec![
        ActivityItem::new("1", "One", "quiz", 1, now()).with_tags(["math"]),
        ActivityItem::new("2", "Two", "quiz", 1, now()).with_tags(["math", "fun"]),
        ActivityItem::new("3", "Three", "quiz", 1, now()).with_tags(["fun"]),
    ];
    let report =
        StatisticsCalculator::new().analyze(&activities, &[], &AnalyticsFilter::default(), now());

    let tags = &report.tags;
    assert_eq!(tags.total_tags, 2);
    assert_eq!(tags.tag_distribution["math"], 2);
    assert_eq!(tags.tag_distribution["fun"], 2);
    assert!(tags.most_used_tags.iter().all(|t| t.percentage == 50.0));
    // Tie keeps first-seen order.
    assert_eq!(report.top_tag().map(|t| t.tag.as_str()), Some("math"));
}

#[test]
fn test_gept_filter_excludes_unset_level() {
    let activities = vec![
        ActivityItem::new("i", "I", "quiz", 1, now()).with_gept_level(GeptLevel::Intermediate),
        ActivityItem::new("u", "U", "quiz", 1, now()),
    ];
    let filter = AnalyticsFilter::builder()
        .gept_level::<GeptLevel, _>(GeptLevel::Intermediate)
        .build()
        .unwrap();

    let filtered = apply_filter(&activities, &filter);
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].id.as_str(), "i");
}

#[test]
fn test_cache_freshness_window() {
    let clock = Arc::new(ManualClock::new(now()));
    let cache = StatisticsCache::with_clock(AnalyticsConfig::default(), clock.clone());
    let folder = FolderId::new("f1");
    let filter = AnalyticsFilter::default();
    let mut activities = sample_activities();

    let first = cache.get_folder_statistics(&folder, &activities, &[], &filter);
    clock.advance(TimeDelta::milliseconds(500));
    let second = cache.get_folder_statistics(&folder, &activities, &[], &filter);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.stats().computations, 1);

    activities.pop();
    clock.advance(TimeDelta::minutes(5));
    let third = cache.get_folder_statistics(&folder, &activities, &[], &filter);
    assert_eq!(cache.stats().computations, 2);
    assert_eq!(third.basic.total_activities, 3);
    assert_eq!(first.basic.total_activities, 4);
}

#[test]
fn test_equivalent_filters_share_cache_entry() {
    let clock = Arc::new(ManualClock::new(now()));
    let cache = StatisticsCache::with_clock(AnalyticsConfig::default(), clock);
    let folder = FolderId::new("f1");

    let a = AnalyticsFilter::builder().tag("verbs").tag("grammar").build().unwrap();
    let b = AnalyticsFilter::builder().tag("grammar").tag("verbs").build().unwrap();

    let first = cache.get_folder_statistics(&folder, &sample_activities(), &[], &a);
    let second = cache.get_folder_statistics(&folder, &sample_activities(), &[], &b);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_filter_is_idempotent_subset() {
    let activities = sample_activities();
    let filter = AnalyticsFilter::builder()
        .tag("verbs")
        .min_size(600u64)
        .build()
        .unwrap();

    let once = apply_filter(&activities, &filter);
    let twice = apply_filter(&once, &filter);
    assert_eq!(once, twice);
    assert!(once.iter().all(|a| activities.contains(a)));
    assert_eq!(once.len(), 1);
}

#[test]
fn test_filter_monotonicity() {
    let activities = sample_activities();
    let wide = AnalyticsFilter::builder()
        .date_range(DateRange::since(now() - TimeDelta::days(60)))
        .build()
        .unwrap();
    let narrow = AnalyticsFilter::builder()
        .date_range(DateRange::since(now() - TimeDelta::days(7)))
        .build()
        .unwrap();
    let narrower = AnalyticsFilter::builder()
        .date_range(DateRange::since(now() - TimeDelta::days(7)))
        .activity_type("quiz")
        .build()
        .unwrap();

    let all = apply_filter(&activities, &AnalyticsFilter::default()).len();
    let w = apply_filter(&activities, &wide).len();
    let n = apply_filter(&activities, &narrow).len();
    let nn = apply_filter(&activities, &narrower).len();
    assert!(all >= w && w >= n && n >= nn);
    assert_eq!((all, w, n, nn), (4, 3, 2, 1));
}

#[test]
fn test_report_invariants() {
    let report = StatisticsCalculator::new().analyze(
        &sample_activities(),
        &[FolderItem::new("sub", "Sub", now())],
        &AnalyticsFilter::default(),
        now(),
    );

    assert_eq!(report.basic.total_subfolders, 1);
    assert_eq!(
        report.distributions.by_gept_level.total(),
        report.basic.total_activities
    );
    assert_eq!(report.distributions.by_gept_level.unspecified, 1);

    let full = tag_statistics(&sample_activities(), usize::MAX);
    let pct: f64 = full.most_used_tags.iter().map(|t| t.percentage).sum();
    assert!((pct - 100.0).abs() < 1e-9);
    assert_eq!(
        report.tags.most_used_tags,
        full.most_used_tags[..report.tags.most_used_tags.len()]
    );

    for score in report.health.all_scores() {
        assert!(score.is_finite());
        assert!((0.0..=100.0).contains(&score));
    }
    assert!(report.basic.average_activity_size.is_finite());
    assert!(report.usage.average_views_per_activity.is_finite());
}

#[test]
fn test_tag_percentages_over_many_tags() {
    // Tag t{i} is carried by (i % 4) + 1 activities.
    let activities: Vec<ActivityItem> = (0..12)
        .flat_map(|i| {
            (0..=(i % 4)).map(move |k| {
                ActivityItem::new(format!("a{i}-{k}"), "x", "quiz", 1, now())
                    .with_tags([format!("t{i}")])
            })
        })
        .collect();

    let full = tag_statistics(&activities, usize::MAX);
    assert_eq!(full.total_tags, 12);
    assert_eq!(full.total_occurrences, 30);
    assert_eq!(full.most_used_tags.len(), 12);
    let pct: f64 = full.most_used_tags.iter().map(|t| t.percentage).sum();
    assert!((pct - 100.0).abs() < 1e-9);

    let top = tag_statistics(&activities, 10);
    assert_eq!(top.most_used_tags.len(), 10);
    assert!(
        top.most_used_tags
            .windows(2)
            .all(|pair| pair[0].count >= pair[1].count)
    );
    let leaders: Vec<&str> = top.most_used_tags[..3].iter().map(|t| t.tag.as_str()).collect();
    assert_eq!(leaders, ["t3", "t7", "t11"]);
    for entry in &top.most_used_tags {
        assert!((entry.percentage - entry.count as f64 / 30.0 * 100.0).abs() < 1e-9);
    }
}

#[test]
fn test_duplicate_tags_count_once() {
    let json = r#"[
        { "id": "a", "name": "A", "type": "quiz", "tags": ["math", "math"], "size": 1,
          "created_at": "2024-04-01T00:00:00Z", "updated_at": "2024-04-01T00:00:00Z" },
        { "id": "b", "name": "B", "type": "quiz", "tags": ["fun"], "size": 1,
          "created_at": "2024-04-01T00:00:00Z", "updated_at": "2024-04-01T00:00:00Z" }
    ]"#;
    let activities: Vec<ActivityItem> = serde_json::from_str(json).unwrap();
    assert_eq!(activities[0].tags.len(), 1);

    let report = StatisticsCalculator::new().analyze(
        &activities,
        &[],
        &AnalyticsFilter::default(),
        now(),
    );
    assert_eq!(report.tags.tag_distribution.get("math"), Some(&1));
    assert_eq!(report.tags.total_occurrences, 2);
    assert!(report.tags.most_used_tags.iter().all(|t| t.percentage == 50.0));
    assert_eq!(report.tags.most_used_tags[0].tag, "math");
}

#[test]
fn test_sample_roll_ups() {
    let report = StatisticsCalculator::new().analyze(
        &sample_activities(),
        &[],
        &AnalyticsFilter::default(),
        now(),
    );

    assert_eq!(report.usage.total_views, 420);
    assert_eq!(report.usage.average_views_per_activity, 210.0);
    assert_eq!(report.usage.most_viewed.as_ref().map(|r| r.id.as_str()), Some("a3"));
    assert_eq!(report.usage.most_edited.as_ref().map(|r| r.id.as_str()), Some("a1"));

    assert_eq!(report.learning.activities_with_learning_data, 1);
    assert_eq!(report.learning.recent_activity, 1);
    assert_eq!(report.learning.average_score, 80.0);

    assert_eq!(report.collaboration.total_collaborators, 3);
    assert_eq!(report.collaboration.class_activities, 1);
    assert_eq!(report.collaboration.recent_collaborations, 1);

    // a1 and a3 updated within 30 days.
    assert_eq!(report.health.activity_freshness, 50.0);
    assert_eq!(report.health.learning_engagement, 25.0);
    assert_eq!(report.health.collaboration_health, 25.0);
    assert_eq!(report.health.content_quality, 85.0);
}

#[test]
fn test_rollup_and_export() {
    let mut child = FolderSnapshot::new(FolderItem::new("c", "Child", now()).with_parent("root"));
    child.activities = sample_activities();
    let mut root = FolderSnapshot::new(FolderItem::new("root", "Root", now()));
    root.activities = vec![ActivityItem::new("r1", "Root quiz", "quiz", 100, now())];
    root.children.push(child);

    let result = rollup(
        &root,
        &AnalyticsFilter::default(),
        &StatisticsCalculator::new(),
        now(),
    );
    assert_eq!(result.recursive_activities, 5);
    assert_eq!(result.recursive_size, 100 + 2048 + 4096 + 512 + 1024);

    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("report.csv");
    let json_path = dir.path().join("report.json");

    export(
        &result.children[0].statistics,
        ExportFormat::Csv,
        fs::File::create(&csv_path).unwrap(),
    )
    .unwrap();
    export(
        &result.statistics,
        ExportFormat::Json,
        fs::File::create(&json_path).unwrap(),
    )
    .unwrap();

    let csv = fs::read_to_string(&csv_path).unwrap();
    assert!(csv.starts_with("section,metric,value"));
    assert!(csv.lines().any(|l| l == "basic,total_activities,4"));
    assert_eq!(csv.lines().filter(|l| l.starts_with("trend.creation,")).count(), 30);

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json["basic"]["total_activities"], 1);
    assert_eq!(json["basic"]["total_subfolders"], 1);
}
