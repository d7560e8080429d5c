use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use shared::{
    domain::{
        Comment, CommentId, Notification, NotificationId, NotificationKind, Report, ReportId,
        Theme,
    },
    error::DomainError,
    protocol::{CommentDraft, ReportDraft, ReportFilter, ReportStats},
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::warn;

pub mod preferences;
pub mod sorting;

pub use preferences::{DurablePreferenceStore, MissingPreferenceStore, PreferenceStore};

const EVENT_CHANNEL_CAPACITY: usize = 1024;
const DEFAULT_NOTIFICATION_TTL: Duration = Duration::from_millis(5000);

/// Published by [`UiStore`] on every mutation.
#[derive(Debug, Clone)]
pub enum UiEvent {
    ThemeChanged(Theme),
    SidebarToggled(bool),
    ScrollToTopChanged(bool),
    NotificationAdded(Notification),
    NotificationRemoved(NotificationId),
}

#[derive(Debug, Clone)]
pub enum BoardEvent {
    ReportSubmitted(Report),
    ReportDeleted(ReportId),
    CommentAdded(Comment),
    CommentDeleted {
        report_id: ReportId,
        comment_id: CommentId,
    },
}

#[derive(Debug, Clone)]
pub struct UiSnapshot {
    pub theme: Theme,
    pub sidebar_open: bool,
    pub scroll_to_top: bool,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone)]
pub struct BoardSnapshot {
    pub reports: Vec<Report>,
    pub comments: HashMap<ReportId, Vec<Comment>>,
}

struct UiState {
    theme: Theme,
    sidebar_open: bool,
    scroll_to_top: bool,
    notifications: Vec<Notification>,
}

/// Global UI state: theme, sidebar, scroll-to-top, and the active
/// notification collection with its auto-expiry timers.
///
/// The theme is written through the [`PreferenceStore`] on every change so
/// the next process start reads it back; persistence failures are logged and
/// never block the in-memory change.
pub struct UiStore {
    state: Arc<Mutex<UiState>>,
    expiry_tasks: Arc<Mutex<HashMap<NotificationId, JoinHandle<()>>>>,
    preferences: Arc<dyn PreferenceStore>,
    events: broadcast::Sender<UiEvent>,
}

impl UiStore {
    pub fn new(preferences: Arc<dyn PreferenceStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(UiState {
                theme: Theme::Dark,
                sidebar_open: false,
                scroll_to_top: false,
                notifications: Vec::new(),
            })),
            expiry_tasks: Arc::new(Mutex::new(HashMap::new())),
            preferences,
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<UiEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> UiSnapshot {
        let state = self.state.lock().await;
        UiSnapshot {
            theme: state.theme,
            sidebar_open: state.sidebar_open,
            scroll_to_top: state.scroll_to_top,
            notifications: state.notifications.clone(),
        }
    }

    /// Reads the persisted theme back into the store. Called once at startup;
    /// a missing or unreadable preference leaves the default in place.
    pub async fn restore_preferences(&self) {
        match self.preferences.load_theme().await {
            Ok(Some(theme)) => {
                self.state.lock().await.theme = theme;
                let _ = self.events.send(UiEvent::ThemeChanged(theme));
            }
            Ok(None) => {}
            Err(err) => warn!("failed to load persisted theme: {err:#}"),
        }
    }

    pub async fn set_theme(&self, theme: Theme) {
        self.state.lock().await.theme = theme;
        let _ = self.events.send(UiEvent::ThemeChanged(theme));
        self.persist_theme(theme).await;
    }

    pub async fn toggle_theme(&self) {
        let theme = {
            let mut state = self.state.lock().await;
            state.theme = state.theme.toggled();
            state.theme
        };
        let _ = self.events.send(UiEvent::ThemeChanged(theme));
        self.persist_theme(theme).await;
    }

    async fn persist_theme(&self, theme: Theme) {
        if let Err(err) = self.preferences.save_theme(theme).await {
            warn!("failed to persist theme preference: {err:#}");
        }
    }

    pub async fn toggle_sidebar(&self) {
        let open = {
            let mut state = self.state.lock().await;
            state.sidebar_open = !state.sidebar_open;
            state.sidebar_open
        };
        let _ = self.events.send(UiEvent::SidebarToggled(open));
    }

    pub async fn set_scroll_to_top(&self, show: bool) {
        self.state.lock().await.scroll_to_top = show;
        let _ = self.events.send(UiEvent::ScrollToTopChanged(show));
    }

    /// Inserts a notification and schedules its removal once `duration`
    /// (default 5 seconds) has elapsed. The pending timer is aborted if the
    /// notification is removed explicitly first.
    pub async fn add_notification(
        &self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        duration: Option<Duration>,
    ) {
        let ttl = duration.unwrap_or(DEFAULT_NOTIFICATION_TTL);
        let notification = Notification {
            id: NotificationId::generate(),
            kind,
            title: title.into(),
            message: message.into(),
            duration_ms: ttl.as_millis() as u64,
            created_at: Utc::now(),
        };
        let id = notification.id;

        // Hold the state lock until the timer handle is registered so the
        // expiry path cannot observe the notification before its handle
        // exists in the map.
        let mut state = self.state.lock().await;
        state.notifications.push(notification.clone());

        let state_handle = Arc::clone(&self.state);
        let tasks_handle = Arc::clone(&self.expiry_tasks);
        let events = self.events.clone();
        let expiry = tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            remove_notification_inner(&state_handle, &tasks_handle, &events, id).await;
        });
        self.expiry_tasks.lock().await.insert(id, expiry);
        drop(state);

        let _ = self.events.send(UiEvent::NotificationAdded(notification));
    }

    /// Idempotent: removing an unknown or already-removed id is a no-op.
    pub async fn remove_notification(&self, id: NotificationId) {
        remove_notification_inner(&self.state, &self.expiry_tasks, &self.events, id).await;
    }
}

async fn remove_notification_inner(
    state: &Mutex<UiState>,
    expiry_tasks: &Mutex<HashMap<NotificationId, JoinHandle<()>>>,
    events: &broadcast::Sender<UiEvent>,
    id: NotificationId,
) {
    let removed = {
        let mut state = state.lock().await;
        let before = state.notifications.len();
        state.notifications.retain(|n| n.id != id);
        state.notifications.len() != before
    };
    if let Some(task) = expiry_tasks.lock().await.remove(&id) {
        task.abort();
    }
    if removed {
        let _ = events.send(UiEvent::NotificationRemoved(id));
    }
}

struct BoardState {
    reports: Vec<Report>,
    comments: HashMap<ReportId, Vec<Comment>>,
}

/// In-memory registry of safety reports and their comment threads.
///
/// Reports are held newest-first; every report id in `reports` has a
/// (possibly empty) entry in `comments`, maintained by every insert and
/// delete path.
pub struct ReportBoard {
    inner: Mutex<BoardState>,
    events: broadcast::Sender<BoardEvent>,
}

impl Default for ReportBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportBoard {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Mutex::new(BoardState {
                reports: Vec::new(),
                comments: HashMap::new(),
            }),
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<BoardEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> BoardSnapshot {
        let state = self.inner.lock().await;
        BoardSnapshot {
            reports: state.reports.clone(),
            comments: state.comments.clone(),
        }
    }

    /// Validates the draft, assigns identifier and timestamp, forces
    /// `verified = false` and `updates = 0`, and prepends the report
    /// (newest first). The draft is rejected before any state mutation.
    pub async fn submit_report(&self, draft: ReportDraft) -> Result<Report, DomainError> {
        draft.validate()?;
        let report = Report {
            id: ReportId::generate(),
            category: draft.category,
            title: draft.title,
            description: draft.description,
            location: draft.location,
            severity: draft.severity,
            verified: false,
            anonymous: draft.anonymous,
            updates: 0,
            media: draft.media,
            submitted_at: Utc::now(),
        };

        let mut state = self.inner.lock().await;
        state.reports.insert(0, report.clone());
        state.comments.insert(report.id, Vec::new());
        drop(state);

        let _ = self.events.send(BoardEvent::ReportSubmitted(report.clone()));
        Ok(report)
    }

    /// Removes the report and its entire comment thread. Unknown ids are a
    /// silent no-op.
    pub async fn delete_report(&self, id: ReportId) {
        let removed = {
            let mut state = self.inner.lock().await;
            let before = state.reports.len();
            state.reports.retain(|r| r.id != id);
            state.comments.remove(&id);
            state.reports.len() != before
        };
        if removed {
            let _ = self.events.send(BoardEvent::ReportDeleted(id));
        }
    }

    /// Appends a comment to the report's thread (oldest-first display
    /// order). Commenting on an unknown or deleted report is rejected.
    pub async fn add_comment(
        &self,
        report_id: ReportId,
        draft: CommentDraft,
    ) -> Result<Comment, DomainError> {
        draft.validate()?;
        let comment = Comment {
            id: CommentId::generate(),
            report_id,
            text: draft.text,
            author: draft.author,
            anonymous: draft.anonymous,
            posted_at: Utc::now(),
        };

        {
            let mut state = self.inner.lock().await;
            let Some(thread) = state.comments.get_mut(&report_id) else {
                return Err(DomainError::not_found(format!(
                    "report {report_id} does not exist"
                )));
            };
            thread.push(comment.clone());
        }

        let _ = self.events.send(BoardEvent::CommentAdded(comment.clone()));
        Ok(comment)
    }

    /// Removes a single comment. Unknown report or comment ids are a silent
    /// no-op.
    pub async fn delete_comment(&self, report_id: ReportId, comment_id: CommentId) {
        let removed = {
            let mut state = self.inner.lock().await;
            match state.comments.get_mut(&report_id) {
                Some(thread) => {
                    let before = thread.len();
                    thread.retain(|c| c.id != comment_id);
                    thread.len() != before
                }
                None => false,
            }
        };
        if removed {
            let _ = self.events.send(BoardEvent::CommentDeleted {
                report_id,
                comment_id,
            });
        }
    }

    /// Reports matching the filter, in the underlying insertion order
    /// (newest first). Never re-sorted.
    pub async fn list_reports(&self, filter: &ReportFilter) -> Vec<Report> {
        let state = self.inner.lock().await;
        state
            .reports
            .iter()
            .filter(|report| report_matches(report, filter))
            .cloned()
            .collect()
    }

    /// The report's comment thread, oldest first; empty when the report is
    /// unknown.
    pub async fn comments_for(&self, report_id: ReportId) -> Vec<Comment> {
        let state = self.inner.lock().await;
        state.comments.get(&report_id).cloned().unwrap_or_default()
    }

    pub async fn stats(&self, now: DateTime<Utc>) -> ReportStats {
        let state = self.inner.lock().await;
        compute_stats(&state.reports, now)
    }
}

/// Category must match exactly (absent = all categories) and the search text
/// must appear, case-insensitively, in the title, description, or location.
/// An empty search matches every report.
pub fn report_matches(report: &Report, filter: &ReportFilter) -> bool {
    if let Some(category) = filter.category {
        if report.category != category {
            return false;
        }
    }
    let needle = filter.search.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    report.title.to_lowercase().contains(&needle)
        || report.description.to_lowercase().contains(&needle)
        || report.location.to_lowercase().contains(&needle)
}

/// Weekly activity counts: `this_week` is reports younger than 7 days,
/// `last_week` the 7-to-14-day window, `trend` their difference.
pub fn compute_stats(reports: &[Report], now: DateTime<Utc>) -> ReportStats {
    let week = chrono::Duration::days(7);
    let this_week = reports
        .iter()
        .filter(|r| now - r.submitted_at < week)
        .count();
    let last_week = reports
        .iter()
        .filter(|r| {
            let age = now - r.submitted_at;
            age >= week && age < week + week
        })
        .count();
    ReportStats {
        total: reports.len(),
        this_week,
        last_week,
        trend: this_week as i64 - last_week as i64,
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
