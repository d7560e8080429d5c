use super::*;
use crate::sorting::{sort_reports, SortConfig, SortDirection, SortKey};
use anyhow::Result;
use async_trait::async_trait;
use shared::{
    domain::{MediaDescriptor, MediaKind, ReportCategory, Severity},
    error::ErrorCode,
    protocol::TrendDirection,
};
use tokio::sync::broadcast::error::TryRecvError;

struct RecordingPreferenceStore {
    saved: Mutex<Vec<Theme>>,
}

impl RecordingPreferenceStore {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            saved: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl PreferenceStore for RecordingPreferenceStore {
    async fn load_theme(&self) -> Result<Option<Theme>> {
        Ok(None)
    }

    async fn save_theme(&self, theme: Theme) -> Result<()> {
        self.saved.lock().await.push(theme);
        Ok(())
    }
}

struct StaticPreferenceStore {
    theme: Theme,
}

#[async_trait]
impl PreferenceStore for StaticPreferenceStore {
    async fn load_theme(&self) -> Result<Option<Theme>> {
        Ok(Some(self.theme))
    }

    async fn save_theme(&self, _theme: Theme) -> Result<()> {
        Ok(())
    }
}

fn ui_store() -> UiStore {
    UiStore::new(Arc::new(MissingPreferenceStore))
}

fn report_draft(title: &str) -> ReportDraft {
    ReportDraft {
        category: ReportCategory::SuspiciousActivity,
        title: title.to_string(),
        description: "White van parked for hours".to_string(),
        location: "Oak Street & 5th Ave".to_string(),
        severity: Severity::Medium,
        anonymous: true,
        media: Vec::new(),
    }
}

fn comment_draft(text: &str) -> CommentDraft {
    CommentDraft {
        text: text.to_string(),
        author: "Neighbor".to_string(),
        anonymous: false,
    }
}

fn report_aged(title: &str, severity: Severity, age: chrono::Duration) -> Report {
    Report {
        id: ReportId::generate(),
        category: ReportCategory::SafetyHazard,
        title: title.to_string(),
        description: "aged".to_string(),
        location: "somewhere".to_string(),
        severity,
        verified: false,
        anonymous: false,
        updates: 0,
        media: Vec::new(),
        submitted_at: Utc::now() - age,
    }
}

#[tokio::test]
async fn toggle_theme_twice_restores_original() {
    let store = ui_store();
    let original = store.snapshot().await.theme;
    store.toggle_theme().await;
    assert_ne!(store.snapshot().await.theme, original);
    store.toggle_theme().await;
    assert_eq!(store.snapshot().await.theme, original);
}

#[tokio::test]
async fn theme_changes_persist_through_preference_store() {
    let prefs = RecordingPreferenceStore::new();
    let store = UiStore::new(prefs.clone());
    store.toggle_theme().await;
    store.set_theme(Theme::Dark).await;
    let saved = prefs.saved.lock().await.clone();
    assert_eq!(saved, vec![Theme::Light, Theme::Dark]);
}

#[tokio::test]
async fn theme_change_survives_persistence_failure() {
    let store = ui_store();
    store.toggle_theme().await;
    assert_eq!(store.snapshot().await.theme, Theme::Light);
}

#[tokio::test]
async fn restore_preferences_applies_persisted_theme() {
    let store = UiStore::new(Arc::new(StaticPreferenceStore {
        theme: Theme::Light,
    }));
    assert_eq!(store.snapshot().await.theme, Theme::Dark);
    store.restore_preferences().await;
    assert_eq!(store.snapshot().await.theme, Theme::Light);
}

#[tokio::test]
async fn sidebar_and_scroll_flags_mutate_directly() {
    let store = ui_store();
    store.toggle_sidebar().await;
    store.set_scroll_to_top(true).await;
    let snapshot = store.snapshot().await;
    assert!(snapshot.sidebar_open);
    assert!(snapshot.scroll_to_top);
    store.toggle_sidebar().await;
    assert!(!store.snapshot().await.sidebar_open);
}

#[tokio::test]
async fn add_notification_defaults_duration_and_preserves_order() {
    let store = ui_store();
    store
        .add_notification(NotificationKind::Success, "Saved", "first", None)
        .await;
    store
        .add_notification(
            NotificationKind::Info,
            "Heads up",
            "second",
            Some(Duration::from_secs(60)),
        )
        .await;

    let notifications = store.snapshot().await.notifications;
    assert_eq!(notifications.len(), 2);
    assert_eq!(notifications[0].message, "first");
    assert_eq!(notifications[0].duration_ms, 5000);
    assert_eq!(notifications[1].message, "second");
    assert_eq!(notifications[1].duration_ms, 60_000);
}

#[tokio::test]
async fn notification_expires_after_duration() {
    let store = ui_store();
    store
        .add_notification(
            NotificationKind::Info,
            "Saved",
            "Your changes were saved",
            Some(Duration::from_millis(50)),
        )
        .await;
    assert_eq!(store.snapshot().await.notifications.len(), 1);

    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if store.snapshot().await.notifications.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("notification should auto-expire");
}

#[tokio::test]
async fn remove_notification_is_idempotent() {
    let store = ui_store();
    store
        .add_notification(
            NotificationKind::Warning,
            "Lingering",
            "stays until removed",
            Some(Duration::from_secs(60)),
        )
        .await;
    let id = store.snapshot().await.notifications[0].id;

    store.remove_notification(id).await;
    store.remove_notification(id).await;
    assert!(store.snapshot().await.notifications.is_empty());
}

#[tokio::test]
async fn explicit_removal_cancels_expiry_timer() {
    let store = ui_store();
    let mut events = store.subscribe_events();
    store
        .add_notification(
            NotificationKind::Info,
            "Short",
            "racing the timer",
            Some(Duration::from_millis(50)),
        )
        .await;
    let id = store.snapshot().await.notifications[0].id;
    store.remove_notification(id).await;

    let added = tokio::time::timeout(Duration::from_secs(1), events.recv())
        .await
        .expect("added event timeout")
        .expect("added event");
    assert!(matches!(added, UiEvent::NotificationAdded(_)));
    let removed = tokio::time::timeout(Duration::from_secs(1), events.recv())
        .await
        .expect("removed event timeout")
        .expect("removed event");
    assert!(matches!(removed, UiEvent::NotificationRemoved(got) if got == id));

    // The aborted timer must not publish a second removal.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn notification_count_tracks_adds_minus_removals() {
    let store = ui_store();
    for message in ["one", "two", "three"] {
        store
            .add_notification(
                NotificationKind::Info,
                "Counted",
                message,
                Some(Duration::from_secs(60)),
            )
            .await;
    }
    let id = store.snapshot().await.notifications[1].id;
    store.remove_notification(id).await;

    let notifications = store.snapshot().await.notifications;
    assert_eq!(notifications.len(), 2);
    assert!(notifications.iter().all(|n| n.id != id));
}

#[tokio::test]
async fn submit_report_prepends_with_forced_fields() {
    let board = ReportBoard::new();
    board
        .submit_report(report_draft("Older report"))
        .await
        .expect("first submit");
    let report = board
        .submit_report(report_draft("Newer report"))
        .await
        .expect("second submit");

    let listed = board.list_reports(&ReportFilter::default()).await;
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, report.id);
    assert_eq!(listed[0].title, "Newer report");
    assert!(!listed[0].verified);
    assert_eq!(listed[0].updates, 0);
    assert!(board.comments_for(report.id).await.is_empty());
}

#[tokio::test]
async fn submit_report_rejects_blank_title_without_mutation() {
    let board = ReportBoard::new();
    let draft = report_draft("   ");
    let err = board.submit_report(draft).await.expect_err("should reject");
    assert_eq!(err.code, ErrorCode::Validation);
    assert!(board.list_reports(&ReportFilter::default()).await.is_empty());
}

#[tokio::test]
async fn list_reports_filters_by_category() {
    let board = ReportBoard::new();
    let mut theft = report_draft("Stolen bike");
    theft.category = ReportCategory::Theft;
    board.submit_report(theft).await.expect("theft");
    board
        .submit_report(report_draft("Suspicious vehicle"))
        .await
        .expect("suspicious");

    let all = board.list_reports(&ReportFilter::default()).await;
    assert_eq!(all.len(), 2);

    let thefts = board
        .list_reports(&ReportFilter::for_category(ReportCategory::Theft))
        .await;
    assert_eq!(thefts.len(), 1);
    assert_eq!(thefts[0].title, "Stolen bike");
}

#[tokio::test]
async fn search_matches_title_description_and_location_case_insensitively() {
    let board = ReportBoard::new();
    let mut draft = report_draft("Broken Fence");
    draft.category = ReportCategory::SafetyHazard;
    draft.severity = Severity::Low;
    let report = board.submit_report(draft).await.expect("submit");
    board
        .submit_report(report_draft("Suspicious vehicle"))
        .await
        .expect("other");

    let hits = board.list_reports(&ReportFilter::for_search("fence")).await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, report.id);

    let by_location = board.list_reports(&ReportFilter::for_search("OAK STREET")).await;
    assert_eq!(by_location.len(), 2);

    board.delete_report(report.id).await;
    let remaining = board.list_reports(&ReportFilter::default()).await;
    assert!(remaining.iter().all(|r| r.id != report.id));
    assert!(board.comments_for(report.id).await.is_empty());
}

#[tokio::test]
async fn delete_report_cascades_comment_thread() {
    let board = ReportBoard::new();
    let report = board
        .submit_report(report_draft("Graffiti"))
        .await
        .expect("submit");
    board
        .add_comment(report.id, comment_draft("I saw this too"))
        .await
        .expect("comment");
    board.delete_report(report.id).await;

    assert!(board.list_reports(&ReportFilter::default()).await.is_empty());
    assert!(board.comments_for(report.id).await.is_empty());

    let err = board
        .add_comment(report.id, comment_draft("too late"))
        .await
        .expect_err("commenting on a deleted report is rejected");
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn delete_report_with_unknown_id_is_noop() {
    let board = ReportBoard::new();
    board
        .submit_report(report_draft("Keeps existing"))
        .await
        .expect("submit");
    board.delete_report(ReportId::generate()).await;
    assert_eq!(board.list_reports(&ReportFilter::default()).await.len(), 1);
}

#[tokio::test]
async fn comments_append_oldest_first_and_delete_individually() {
    let board = ReportBoard::new();
    let report = board
        .submit_report(report_draft("Streetlight out"))
        .await
        .expect("submit");
    let first = board
        .add_comment(report.id, comment_draft("Reported to the city"))
        .await
        .expect("first");
    let second = board
        .add_comment(report.id, comment_draft("Still dark tonight"))
        .await
        .expect("second");

    let thread = board.comments_for(report.id).await;
    assert_eq!(thread.len(), 2);
    assert_eq!(thread[0].id, first.id);
    assert_eq!(thread[1].id, second.id);

    board.delete_comment(report.id, first.id).await;
    let thread = board.comments_for(report.id).await;
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0].id, second.id);

    // Unknown ids on either side are silent no-ops.
    board.delete_comment(report.id, first.id).await;
    board
        .delete_comment(ReportId::generate(), second.id)
        .await;
    assert_eq!(board.comments_for(report.id).await.len(), 1);
}

#[tokio::test]
async fn add_comment_rejects_blank_text() {
    let board = ReportBoard::new();
    let report = board
        .submit_report(report_draft("Needs context"))
        .await
        .expect("submit");
    let err = board
        .add_comment(report.id, comment_draft("   "))
        .await
        .expect_err("blank comment");
    assert_eq!(err.code, ErrorCode::Validation);
    assert!(board.comments_for(report.id).await.is_empty());
}

#[tokio::test]
async fn board_events_published_on_mutations() {
    let board = ReportBoard::new();
    let mut events = board.subscribe_events();
    let report = board
        .submit_report(report_draft("Watched"))
        .await
        .expect("submit");
    board.delete_report(report.id).await;

    let submitted = tokio::time::timeout(Duration::from_secs(1), events.recv())
        .await
        .expect("submit event timeout")
        .expect("submit event");
    assert!(matches!(submitted, BoardEvent::ReportSubmitted(r) if r.id == report.id));
    let deleted = tokio::time::timeout(Duration::from_secs(1), events.recv())
        .await
        .expect("delete event timeout")
        .expect("delete event");
    assert!(matches!(deleted, BoardEvent::ReportDeleted(id) if id == report.id));
}

#[tokio::test]
async fn media_descriptors_survive_submission() {
    let board = ReportBoard::new();
    let mut draft = report_draft("With evidence");
    draft.media = vec![
        MediaDescriptor {
            kind: MediaKind::Image,
            name: "fence.jpg".to_string(),
        },
        MediaDescriptor {
            kind: MediaKind::Video,
            name: "clip.mp4".to_string(),
        },
    ];
    let report = board.submit_report(draft).await.expect("submit");
    assert_eq!(report.media.len(), 2);
    assert_eq!(report.media[0].kind, MediaKind::Image);
}

#[test]
fn stats_weekly_windows_and_trend() {
    let now = Utc::now();
    let reports = vec![
        report_aged("today", Severity::Low, chrono::Duration::hours(2)),
        report_aged("this week", Severity::Low, chrono::Duration::days(5)),
        report_aged("last week", Severity::Low, chrono::Duration::days(9)),
        report_aged("ancient", Severity::Low, chrono::Duration::days(30)),
    ];

    let stats = compute_stats(&reports, now);
    assert_eq!(stats.total, 4);
    assert_eq!(stats.this_week, 2);
    assert_eq!(stats.last_week, 1);
    assert_eq!(stats.trend, 1);
    assert_eq!(stats.direction(), TrendDirection::Rising);

    let falling = compute_stats(&reports[2..3], now);
    assert_eq!(falling.trend, -1);
    assert_eq!(falling.direction(), TrendDirection::Falling);
    assert_eq!(compute_stats(&[], now).direction(), TrendDirection::Flat);
}

#[test]
fn sort_click_toggles_direction_on_same_column() {
    let config = SortConfig::clicked(None, SortKey::Title);
    assert_eq!(config.direction, SortDirection::Ascending);

    let flipped = SortConfig::clicked(Some(config), SortKey::Title);
    assert_eq!(flipped.direction, SortDirection::Descending);

    let other = SortConfig::clicked(Some(flipped), SortKey::Severity);
    assert_eq!(other.key, SortKey::Severity);
    assert_eq!(other.direction, SortDirection::Ascending);

    let reset = SortConfig::clicked(Some(flipped), SortKey::Title);
    assert_eq!(reset.direction, SortDirection::Ascending);
}

#[test]
fn sort_reports_orders_severity_by_rank() {
    let mut reports = vec![
        report_aged("a", Severity::High, chrono::Duration::hours(1)),
        report_aged("b", Severity::Low, chrono::Duration::hours(2)),
        report_aged("c", Severity::Medium, chrono::Duration::hours(3)),
    ];
    sort_reports(&mut reports, SortConfig::ascending(SortKey::Severity));
    let severities: Vec<_> = reports.iter().map(|r| r.severity).collect();
    assert_eq!(severities, vec![Severity::Low, Severity::Medium, Severity::High]);

    sort_reports(
        &mut reports,
        SortConfig {
            key: SortKey::Severity,
            direction: SortDirection::Descending,
        },
    );
    assert_eq!(reports[0].severity, Severity::High);
}

#[test]
fn sort_reports_compares_titles_case_insensitively() {
    let mut reports = vec![
        report_aged("zebra crossing", Severity::Low, chrono::Duration::hours(1)),
        report_aged("Alley light", Severity::Low, chrono::Duration::hours(2)),
        report_aged("broken fence", Severity::Low, chrono::Duration::hours(3)),
    ];
    sort_reports(&mut reports, SortConfig::ascending(SortKey::Title));
    let titles: Vec<_> = reports.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Alley light", "broken fence", "zebra crossing"]);
}
