use std::{collections::HashMap, path::Path, sync::Arc, thread, time::Duration};

use app_core::{
    report_matches,
    sorting::{sort_reports, SortConfig, SortKey},
    BoardSnapshot, DurablePreferenceStore, MissingPreferenceStore, PreferenceStore, ReportBoard,
    UiSnapshot, UiStore,
};
use chrono::{DateTime, Utc};
use clap::Parser;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use eframe::egui;
use egui::{Align2, Color32, RichText};
use shared::{
    domain::{
        CommentId, MediaDescriptor, MediaKind, NotificationId, NotificationKind, ReportCategory,
        ReportId, Severity, Theme,
    },
    protocol::{CommentDraft, ReportDraft, ReportFilter, ReportStats, TrendDirection},
};
use tokio::sync::broadcast::error::RecvError;

const APP_TITLE: &str = "SafetyTracker Desktop";
const SCROLL_TO_TOP_THRESHOLD: f32 = 300.0;

enum BackendCommand {
    ToggleTheme,
    ToggleSidebar,
    SetScrollToTop(bool),
    DismissNotification(NotificationId),
    SubmitReport(ReportDraft),
    DeleteReport(ReportId),
    SubmitComment {
        report_id: ReportId,
        draft: CommentDraft,
    },
    DeleteComment {
        report_id: ReportId,
        comment_id: CommentId,
    },
}

enum UiEvent {
    Ui(UiSnapshot),
    Board(BoardSnapshot),
    Info(String),
    Error(String),
}

fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut Option<String>,
) {
    let cmd_name = match &cmd {
        BackendCommand::ToggleTheme => "toggle_theme",
        BackendCommand::ToggleSidebar => "toggle_sidebar",
        BackendCommand::SetScrollToTop(_) => "set_scroll_to_top",
        BackendCommand::DismissNotification(_) => "dismiss_notification",
        BackendCommand::SubmitReport(_) => "submit_report",
        BackendCommand::DeleteReport(_) => "delete_report",
        BackendCommand::SubmitComment { .. } => "submit_comment",
        BackendCommand::DeleteComment { .. } => "delete_comment",
    };

    match cmd_tx.try_send(cmd) {
        Ok(()) => tracing::debug!(command = cmd_name, "queued ui->backend command"),
        Err(TrySendError::Full(_)) => {
            *status = Some("UI command queue is full; please retry".to_string());
        }
        Err(TrySendError::Disconnected(_)) => {
            *status = Some(
                "Backend worker disconnected (possible startup failure); restart the app"
                    .to_string(),
            );
        }
    }
}

fn resolve_default_database_url() -> String {
    match dirs::home_dir() {
        Some(home) => {
            let path = home.join(".safety_tracker").join("preferences.db");
            format!("sqlite://{}", path.to_string_lossy().replace('\\', "/"))
        }
        None => "sqlite://safety_tracker_preferences.db".to_string(),
    }
}

/// Sample reports and comments shown on first launch, submitted oldest first
/// so the board lists the suspicious-vehicle report on top.
async fn seed_demo_board(board: &ReportBoard) {
    let seeds = [
        (
            ReportCategory::SafetyHazard,
            "Broken Streetlight",
            "Streetlight out creating dark spot on walking path",
            "Elm Street near park entrance",
            Severity::Medium,
            true,
            vec![("Reported to city maintenance", "Admin", false)],
        ),
        (
            ReportCategory::Vandalism,
            "Graffiti on Community Center",
            "Fresh graffiti appeared overnight on the east wall",
            "Community Center, Main St",
            Severity::Low,
            false,
            vec![],
        ),
        (
            ReportCategory::SuspiciousActivity,
            "Suspicious Vehicle",
            "White van parked for hours, occupants watching houses",
            "Oak Street & 5th Ave",
            Severity::Medium,
            true,
            vec![
                ("I saw this too yesterday", "Neighbor", false),
                ("Police were notified", "Anonymous", true),
            ],
        ),
    ];

    for (category, title, description, location, severity, anonymous, comments) in seeds {
        let draft = ReportDraft {
            category,
            title: title.to_string(),
            description: description.to_string(),
            location: location.to_string(),
            severity,
            anonymous,
            media: Vec::new(),
        };
        let report = match board.submit_report(draft).await {
            Ok(report) => report,
            Err(err) => {
                tracing::error!("failed to seed demo report '{title}': {err}");
                continue;
            }
        };
        for (text, author, anonymous) in comments {
            if let Err(err) = board
                .add_comment(
                    report.id,
                    CommentDraft {
                        text: text.to_string(),
                        author: author.to_string(),
                        anonymous,
                    },
                )
                .await
            {
                tracing::error!("failed to seed demo comment on '{title}': {err}");
            }
        }
    }
}

fn start_backend_bridge(
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    database_url: String,
) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(format!(
                    "backend worker startup failure: failed to build runtime: {err}"
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let preferences: Arc<dyn PreferenceStore> =
                match storage::Storage::new(&database_url).await {
                    Ok(storage) => Arc::new(DurablePreferenceStore::new(storage)),
                    Err(err) => {
                        tracing::warn!(
                            "preference database '{database_url}' unavailable, theme will not persist: {err:#}"
                        );
                        let _ = ui_tx.try_send(UiEvent::Info(
                            "Preference database unavailable; theme changes will not persist"
                                .to_string(),
                        ));
                        Arc::new(MissingPreferenceStore)
                    }
                };

            let ui = Arc::new(UiStore::new(preferences));
            let board = Arc::new(ReportBoard::new());
            ui.restore_preferences().await;
            seed_demo_board(&board).await;

            // Forward every store mutation to the paint thread as a fresh
            // snapshot; a lagged receiver just re-snapshots on the next event.
            let mut ui_events = ui.subscribe_events();
            let ui_for_events = Arc::clone(&ui);
            let ui_tx_clone = ui_tx.clone();
            tokio::spawn(async move {
                loop {
                    match ui_events.recv().await {
                        Ok(_) | Err(RecvError::Lagged(_)) => {
                            let snapshot = ui_for_events.snapshot().await;
                            let _ = ui_tx_clone.try_send(UiEvent::Ui(snapshot));
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            });

            let mut board_events = board.subscribe_events();
            let board_for_events = Arc::clone(&board);
            let ui_tx_clone = ui_tx.clone();
            tokio::spawn(async move {
                loop {
                    match board_events.recv().await {
                        Ok(_) | Err(RecvError::Lagged(_)) => {
                            let snapshot = board_for_events.snapshot().await;
                            let _ = ui_tx_clone.try_send(UiEvent::Board(snapshot));
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            });

            let _ = ui_tx.try_send(UiEvent::Ui(ui.snapshot().await));
            let _ = ui_tx.try_send(UiEvent::Board(board.snapshot().await));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::ToggleTheme => ui.toggle_theme().await,
                    BackendCommand::ToggleSidebar => ui.toggle_sidebar().await,
                    BackendCommand::SetScrollToTop(show) => ui.set_scroll_to_top(show).await,
                    BackendCommand::DismissNotification(id) => ui.remove_notification(id).await,
                    BackendCommand::SubmitReport(draft) => {
                        match board.submit_report(draft).await {
                            Ok(report) => {
                                ui.add_notification(
                                    NotificationKind::Success,
                                    "Report submitted",
                                    format!("\"{}\" is now visible to neighbors", report.title),
                                    None,
                                )
                                .await;
                            }
                            Err(err) => {
                                tracing::warn!("report submission rejected: {err}");
                                ui.add_notification(
                                    NotificationKind::Error,
                                    "Submission failed",
                                    err.message.clone(),
                                    None,
                                )
                                .await;
                            }
                        }
                    }
                    BackendCommand::DeleteReport(id) => {
                        board.delete_report(id).await;
                        ui.add_notification(
                            NotificationKind::Info,
                            "Report deleted",
                            "The report and its comments were removed",
                            None,
                        )
                        .await;
                    }
                    BackendCommand::SubmitComment { report_id, draft } => {
                        if let Err(err) = board.add_comment(report_id, draft).await {
                            tracing::warn!("comment rejected for report {report_id}: {err}");
                            ui.add_notification(
                                NotificationKind::Error,
                                "Comment failed",
                                err.message.clone(),
                                None,
                            )
                            .await;
                        }
                    }
                    BackendCommand::DeleteComment {
                        report_id,
                        comment_id,
                    } => board.delete_comment(report_id, comment_id).await,
                }
            }
        });
    });
}

struct ReportFormState {
    open: bool,
    category: ReportCategory,
    title: String,
    description: String,
    location: String,
    severity: Severity,
    anonymous: bool,
    media: Vec<MediaDescriptor>,
    error: Option<String>,
}

impl Default for ReportFormState {
    fn default() -> Self {
        Self {
            open: false,
            category: ReportCategory::SuspiciousActivity,
            title: String::new(),
            description: String::new(),
            location: String::new(),
            severity: Severity::Medium,
            anonymous: true,
            media: Vec::new(),
            error: None,
        }
    }
}

impl ReportFormState {
    fn to_draft(&self) -> ReportDraft {
        ReportDraft {
            category: self.category,
            title: self.title.clone(),
            description: self.description.clone(),
            location: self.location.clone(),
            severity: self.severity,
            anonymous: self.anonymous,
            media: self.media.clone(),
        }
    }
}

struct CommentInput {
    text: String,
    anonymous: bool,
}

struct SafetyTrackerApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    ui: UiSnapshot,
    board: BoardSnapshot,
    status: Option<String>,
    search: String,
    selected_category: Option<ReportCategory>,
    form: ReportFormState,
    comment_inputs: HashMap<ReportId, CommentInput>,
    table_view: bool,
    sort: Option<SortConfig>,
    pending_scroll_reset: bool,
}

impl SafetyTrackerApp {
    fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            ui: UiSnapshot {
                theme: Theme::Dark,
                sidebar_open: false,
                scroll_to_top: false,
                notifications: Vec::new(),
            },
            board: BoardSnapshot {
                reports: Vec::new(),
                comments: HashMap::new(),
            },
            status: None,
            search: String::new(),
            selected_category: None,
            form: ReportFormState::default(),
            comment_inputs: HashMap::new(),
            table_view: false,
            sort: None,
            pending_scroll_reset: false,
        }
    }

    fn drain_backend_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Ui(snapshot) => self.ui = snapshot,
                UiEvent::Board(snapshot) => {
                    self.comment_inputs
                        .retain(|report_id, _| snapshot.comments.contains_key(report_id));
                    self.board = snapshot;
                }
                UiEvent::Info(message) => self.status = Some(message),
                UiEvent::Error(message) => self.status = Some(message),
            }
        }
    }

    fn current_filter(&self) -> ReportFilter {
        ReportFilter {
            category: self.selected_category,
            search: self.search.clone(),
        }
    }

    fn filtered_reports(&self) -> Vec<shared::domain::Report> {
        let filter = self.current_filter();
        let mut reports: Vec<_> = self
            .board
            .reports
            .iter()
            .filter(|report| report_matches(report, &filter))
            .cloned()
            .collect();
        if self.table_view {
            if let Some(config) = self.sort {
                sort_reports(&mut reports, config);
            }
        }
        reports
    }

    fn header_panel(&mut self, ctx: &egui::Context, pending: &mut Vec<BackendCommand>) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("☰").clicked() {
                    pending.push(BackendCommand::ToggleSidebar);
                }
                ui.heading("SafetyTracker");
                ui.label(RichText::new("Community Safety Network").weak());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Report Issue").clicked() {
                        self.form = ReportFormState {
                            open: true,
                            ..ReportFormState::default()
                        };
                    }
                    let theme_label = match self.ui.theme {
                        Theme::Dark => "Light mode",
                        Theme::Light => "Dark mode",
                    };
                    if ui.button(theme_label).clicked() {
                        pending.push(BackendCommand::ToggleTheme);
                    }
                    ui.selectable_value(&mut self.table_view, false, "Cards");
                    ui.selectable_value(&mut self.table_view, true, "Table");
                });
            });
        });
    }

    fn sidebar_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("sidebar")
            .resizable(false)
            .default_width(200.0)
            .show_animated(ctx, self.ui.sidebar_open, |ui| {
                ui.heading("Categories");
                ui.separator();
                if ui
                    .selectable_label(self.selected_category.is_none(), "All Reports")
                    .clicked()
                {
                    self.selected_category = None;
                }
                for category in ReportCategory::ALL {
                    let count = self
                        .board
                        .reports
                        .iter()
                        .filter(|r| r.category == category)
                        .count();
                    let label = format!("{} ({count})", category.label());
                    if ui
                        .selectable_label(self.selected_category == Some(category), label)
                        .clicked()
                    {
                        self.selected_category = Some(category);
                    }
                }
            });
    }

    fn stats_row(&self, ui: &mut egui::Ui, stats: &ReportStats) {
        ui.horizontal(|ui| {
            stat_card(ui, "Total Reports", stats.total.to_string(), Color32::from_rgb(59, 130, 246));
            stat_card(ui, "This Week", stats.this_week.to_string(), Color32::from_rgb(34, 197, 94));
            let trend_color = match stats.direction() {
                TrendDirection::Rising => Color32::from_rgb(239, 68, 68),
                TrendDirection::Falling => Color32::from_rgb(34, 197, 94),
                TrendDirection::Flat => Color32::GRAY,
            };
            stat_card(ui, "Trend", trend_label(stats), trend_color);
        });
    }

    fn filter_row(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("🔍");
            ui.add(
                egui::TextEdit::singleline(&mut self.search)
                    .hint_text("Search reports...")
                    .desired_width(240.0),
            );
            if ui
                .selectable_label(self.selected_category.is_none(), "All Reports")
                .clicked()
            {
                self.selected_category = None;
            }
            for category in ReportCategory::ALL {
                if ui
                    .selectable_label(self.selected_category == Some(category), category.label())
                    .clicked()
                {
                    self.selected_category = Some(category);
                }
            }
        });
    }

    fn report_card(
        &mut self,
        ui: &mut egui::Ui,
        report: &shared::domain::Report,
        now: DateTime<Utc>,
        pending: &mut Vec<BackendCommand>,
    ) {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(&report.title).strong().size(16.0));
                severity_badge(ui, report.severity);
                if report.verified {
                    ui.label(RichText::new("Verified").color(Color32::from_rgb(34, 197, 94)));
                }
                if report.anonymous {
                    ui.label(RichText::new("Anonymous").weak());
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Delete").clicked() {
                        pending.push(BackendCommand::DeleteReport(report.id));
                    }
                    ui.label(RichText::new(format_relative_time(report.submitted_at, now)).weak());
                });
            });
            ui.label(RichText::new(report.category.label()).weak());
            ui.label(&report.description);
            ui.horizontal(|ui| {
                ui.label("📍");
                ui.label(&report.location);
                if report.updates > 0 {
                    ui.label(RichText::new(format!("{} update(s)", report.updates)).weak());
                }
            });
            if !report.media.is_empty() {
                ui.horizontal(|ui| {
                    for media in &report.media {
                        let icon = match media.kind {
                            MediaKind::Image => "🖼",
                            MediaKind::Video => "🎞",
                        };
                        ui.label(format!("{icon} {}", media.name));
                    }
                });
            }

            ui.separator();
            self.comment_section(ui, report.id, now, pending);
        });
        ui.add_space(8.0);
    }

    fn comment_section(
        &mut self,
        ui: &mut egui::Ui,
        report_id: ReportId,
        now: DateTime<Utc>,
        pending: &mut Vec<BackendCommand>,
    ) {
        let comments = self
            .board
            .comments
            .get(&report_id)
            .cloned()
            .unwrap_or_default();
        ui.label(RichText::new(format!("Comments ({})", comments.len())).strong());
        for comment in &comments {
            ui.horizontal(|ui| {
                ui.label(RichText::new(&comment.author).strong());
                ui.label(RichText::new(format_relative_time(comment.posted_at, now)).weak());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("✕").clicked() {
                        pending.push(BackendCommand::DeleteComment {
                            report_id,
                            comment_id: comment.id,
                        });
                    }
                });
            });
            ui.label(&comment.text);
        }

        let input = self.comment_inputs.entry(report_id).or_insert_with(|| {
            CommentInput {
                text: String::new(),
                anonymous: true,
            }
        });
        ui.horizontal(|ui| {
            ui.add(
                egui::TextEdit::singleline(&mut input.text)
                    .hint_text("Add a comment...")
                    .desired_width(280.0),
            );
            ui.checkbox(&mut input.anonymous, "Anonymous");
            if ui.button("Send").clicked() && !input.text.trim().is_empty() {
                let draft = CommentDraft {
                    text: input.text.clone(),
                    author: if input.anonymous {
                        "Anonymous".to_string()
                    } else {
                        "User".to_string()
                    },
                    anonymous: input.anonymous,
                };
                pending.push(BackendCommand::SubmitComment { report_id, draft });
                input.text.clear();
            }
        });
    }

    fn report_table(
        &mut self,
        ui: &mut egui::Ui,
        reports: &[shared::domain::Report],
        now: DateTime<Utc>,
        pending: &mut Vec<BackendCommand>,
    ) {
        egui::Grid::new("report_table")
            .striped(true)
            .min_col_width(90.0)
            .show(ui, |ui| {
                let headers = [
                    ("Title", SortKey::Title),
                    ("Category", SortKey::Category),
                    ("Severity", SortKey::Severity),
                    ("Location", SortKey::Location),
                    ("Submitted", SortKey::SubmittedAt),
                    ("Updates", SortKey::Updates),
                ];
                for (label, key) in headers {
                    let marker = match self.sort {
                        Some(config) if config.key == key => match config.direction {
                            app_core::sorting::SortDirection::Ascending => " ↑",
                            app_core::sorting::SortDirection::Descending => " ↓",
                        },
                        _ => "",
                    };
                    if ui.button(format!("{label}{marker}")).clicked() {
                        self.sort = Some(SortConfig::clicked(self.sort, key));
                    }
                }
                ui.label("");
                ui.end_row();

                for report in reports {
                    ui.label(&report.title);
                    ui.label(report.category.label());
                    ui.label(report.severity.label());
                    ui.label(&report.location);
                    ui.label(format_relative_time(report.submitted_at, now));
                    ui.label(report.updates.to_string());
                    if ui.small_button("Delete").clicked() {
                        pending.push(BackendCommand::DeleteReport(report.id));
                    }
                    ui.end_row();
                }
            });
    }

    fn report_form_window(&mut self, ctx: &egui::Context, pending: &mut Vec<BackendCommand>) {
        if !self.form.open {
            return;
        }
        let mut open = true;
        let mut submitted = false;
        egui::Window::new("Report Safety Issue")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                egui::ComboBox::from_label("Issue Type")
                    .selected_text(self.form.category.label())
                    .show_ui(ui, |ui| {
                        for category in ReportCategory::ALL {
                            ui.selectable_value(
                                &mut self.form.category,
                                category,
                                category.label(),
                            );
                        }
                    });
                ui.add(
                    egui::TextEdit::singleline(&mut self.form.title).hint_text("Title"),
                );
                ui.add(
                    egui::TextEdit::multiline(&mut self.form.description)
                        .hint_text("Description")
                        .desired_rows(3),
                );
                ui.add(
                    egui::TextEdit::singleline(&mut self.form.location).hint_text("Location"),
                );
                egui::ComboBox::from_label("Severity")
                    .selected_text(self.form.severity.label())
                    .show_ui(ui, |ui| {
                        for severity in [Severity::Low, Severity::Medium, Severity::High] {
                            ui.selectable_value(
                                &mut self.form.severity,
                                severity,
                                severity.label(),
                            );
                        }
                    });

                ui.horizontal(|ui| {
                    if ui.button("Attach images/videos").clicked() {
                        if let Some(paths) = rfd::FileDialog::new().pick_files() {
                            for path in paths {
                                let Some(kind) = media_kind_for(&path) else {
                                    continue;
                                };
                                let name = path
                                    .file_name()
                                    .map(|n| n.to_string_lossy().into_owned())
                                    .unwrap_or_else(|| path.to_string_lossy().into_owned());
                                self.form.media.push(MediaDescriptor { kind, name });
                            }
                        }
                    }
                    ui.checkbox(&mut self.form.anonymous, "Submit anonymously");
                });
                let mut removed_media = None;
                for (index, media) in self.form.media.iter().enumerate() {
                    ui.horizontal(|ui| {
                        let icon = match media.kind {
                            MediaKind::Image => "🖼",
                            MediaKind::Video => "🎞",
                        };
                        ui.label(format!("{icon} {}", media.name));
                        if ui.small_button("Remove").clicked() {
                            removed_media = Some(index);
                        }
                    });
                }
                if let Some(index) = removed_media {
                    self.form.media.remove(index);
                }

                if let Some(error) = &self.form.error {
                    ui.colored_label(Color32::from_rgb(239, 68, 68), error);
                }

                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        submitted = true; // close without dispatching
                        self.form.error = None;
                    }
                    if ui.button("Submit Report").clicked() {
                        let draft = self.form.to_draft();
                        match draft.validate() {
                            Ok(()) => {
                                pending.push(BackendCommand::SubmitReport(draft));
                                submitted = true;
                            }
                            // Keep the form open with its state intact so the
                            // user can fix the field and retry.
                            Err(err) => self.form.error = Some(err.message),
                        }
                    }
                });
            });
        self.form.open = open && !submitted;
    }

    fn notification_toasts(&self, ctx: &egui::Context, pending: &mut Vec<BackendCommand>) {
        if self.ui.notifications.is_empty() {
            return;
        }
        egui::Area::new(egui::Id::new("notification_toasts"))
            .anchor(Align2::RIGHT_BOTTOM, egui::vec2(-16.0, -16.0))
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                for notification in &self.ui.notifications {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.set_min_width(240.0);
                        ui.horizontal(|ui| {
                            ui.label(
                                RichText::new(&notification.title)
                                    .strong()
                                    .color(notification_color(notification.kind)),
                            );
                            ui.with_layout(
                                egui::Layout::right_to_left(egui::Align::Center),
                                |ui| {
                                    if ui.small_button("✕").clicked() {
                                        pending.push(BackendCommand::DismissNotification(
                                            notification.id,
                                        ));
                                    }
                                },
                            );
                        });
                        ui.label(&notification.message);
                    });
                    ui.add_space(6.0);
                }
            });
    }

    fn scroll_to_top_button(&mut self, ctx: &egui::Context) {
        if !self.ui.scroll_to_top {
            return;
        }
        egui::Area::new(egui::Id::new("scroll_to_top"))
            .anchor(Align2::RIGHT_BOTTOM, egui::vec2(-16.0, -96.0))
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                if ui.button("⬆ Top").clicked() {
                    self.pending_scroll_reset = true;
                }
            });
    }
}

impl eframe::App for SafetyTrackerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_backend_events();
        apply_theme(ctx, self.ui.theme);

        let now = Utc::now();
        let mut pending: Vec<BackendCommand> = Vec::new();

        self.header_panel(ctx, &mut pending);
        self.sidebar_panel(ctx);

        let stats = app_core::compute_stats(&self.board.reports, now);
        let reports = self.filtered_reports();

        egui::CentralPanel::default().show(ctx, |ui| {
            self.stats_row(ui, &stats);
            ui.add_space(8.0);
            self.filter_row(ui);
            ui.separator();

            let mut scroll_area = egui::ScrollArea::vertical().id_salt("report_feed");
            if self.pending_scroll_reset {
                scroll_area = scroll_area.vertical_scroll_offset(0.0);
                self.pending_scroll_reset = false;
            }
            let output = scroll_area.show(ui, |ui| {
                if reports.is_empty() {
                    ui.add_space(32.0);
                    ui.vertical_centered(|ui| {
                        ui.label(RichText::new("No reports found matching your criteria").weak());
                    });
                } else if self.table_view {
                    self.report_table(ui, &reports, now, &mut pending);
                } else {
                    for report in &reports {
                        self.report_card(ui, report, now, &mut pending);
                    }
                }
            });

            let scrolled_past_threshold = output.state.offset.y > SCROLL_TO_TOP_THRESHOLD;
            if scrolled_past_threshold != self.ui.scroll_to_top {
                pending.push(BackendCommand::SetScrollToTop(scrolled_past_threshold));
            }
        });

        if let Some(status) = self.status.clone() {
            egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(status);
                    if ui.small_button("Dismiss").clicked() {
                        self.status = None;
                    }
                });
            });
        }

        self.report_form_window(ctx, &mut pending);
        self.notification_toasts(ctx, &mut pending);
        self.scroll_to_top_button(ctx);

        for cmd in pending {
            dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status);
        }

        // Poll the backend channel even while the user is idle.
        ctx.request_repaint_after(Duration::from_millis(150));
    }
}

fn stat_card(ui: &mut egui::Ui, title: &str, value: String, color: Color32) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.set_min_width(140.0);
        ui.vertical(|ui| {
            ui.label(RichText::new(title).weak());
            ui.label(RichText::new(value).strong().size(22.0).color(color));
        });
    });
}

fn severity_badge(ui: &mut egui::Ui, severity: Severity) {
    let color = match severity {
        Severity::Low => Color32::from_rgb(34, 197, 94),
        Severity::Medium => Color32::from_rgb(249, 115, 22),
        Severity::High => Color32::from_rgb(239, 68, 68),
    };
    ui.label(RichText::new(severity.label()).color(color));
}

fn notification_color(kind: NotificationKind) -> Color32 {
    match kind {
        NotificationKind::Success => Color32::from_rgb(34, 197, 94),
        NotificationKind::Error => Color32::from_rgb(239, 68, 68),
        NotificationKind::Warning => Color32::from_rgb(249, 115, 22),
        NotificationKind::Info => Color32::from_rgb(59, 130, 246),
    }
}

fn apply_theme(ctx: &egui::Context, theme: Theme) {
    match theme {
        Theme::Dark => ctx.set_visuals(egui::Visuals::dark()),
        Theme::Light => ctx.set_visuals(egui::Visuals::light()),
    }
}

fn format_relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now - timestamp;
    let days = elapsed.num_days();
    if days > 0 {
        return format!("{days}d ago");
    }
    let hours = elapsed.num_hours();
    if hours > 0 {
        return format!("{hours}h ago");
    }
    "Just now".to_string()
}

fn trend_label(stats: &ReportStats) -> String {
    if stats.trend > 0 {
        format!("+{}", stats.trend)
    } else {
        stats.trend.to_string()
    }
}

fn media_kind_for(path: &Path) -> Option<MediaKind> {
    let mime = mime_guess::from_path(path).first()?;
    match mime.type_().as_str() {
        "image" => Some(MediaKind::Image),
        "video" => Some(MediaKind::Video),
        _ => None,
    }
}

#[derive(Parser, Debug)]
struct Args {
    /// Preference database URL; defaults to ~/.safety_tracker/preferences.db.
    #[arg(long)]
    database_url: Option<String>,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();
    let database_url = args
        .database_url
        .unwrap_or_else(resolve_default_database_url);

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    start_backend_bridge(cmd_rx, ui_tx, database_url);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(APP_TITLE)
            .with_inner_size([1180.0, 780.0])
            .with_min_inner_size([900.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(
        APP_TITLE,
        options,
        Box::new(|_cc| Ok(Box::new(SafetyTrackerApp::new(cmd_tx, ui_rx)))),
    )
}
