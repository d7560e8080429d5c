use std::{sync::Arc, time::Duration};

use anyhow::Result;
use app_core::{DurablePreferenceStore, ReportBoard, UiStore};
use clap::Parser;
use shared::{
    domain::{NotificationKind, ReportCategory, Severity},
    protocol::{CommentDraft, ReportDraft, ReportFilter},
};
use storage::Storage;

/// Headless walk through the tracker core: durable theme, report board, and
/// notification expiry, without the GUI shell.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "sqlite://safety_tracker.db")]
    database_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let storage = Storage::new(&args.database_url).await?;
    let ui = UiStore::new(Arc::new(DurablePreferenceStore::new(storage)));
    ui.restore_preferences().await;
    println!(
        "Restored theme preference: {}",
        ui.snapshot().await.theme.as_str()
    );

    let board = ReportBoard::new();
    let report = board
        .submit_report(ReportDraft {
            category: ReportCategory::SafetyHazard,
            title: "Broken Streetlight".to_string(),
            description: "Streetlight out creating dark spot on walking path".to_string(),
            location: "Elm Street near park entrance".to_string(),
            severity: Severity::Medium,
            anonymous: true,
            media: Vec::new(),
        })
        .await?;
    println!("Submitted report {} ({})", report.id, report.title);

    let comment = board
        .add_comment(
            report.id,
            CommentDraft {
                text: "Reported to city maintenance".to_string(),
                author: "Admin".to_string(),
                anonymous: false,
            },
        )
        .await?;
    println!("Added comment {} to report {}", comment.id, report.id);

    let listed = board
        .list_reports(&ReportFilter::for_search("streetlight"))
        .await;
    println!("Search 'streetlight' matched {} report(s)", listed.len());
    println!(
        "Stats: {}",
        serde_json::to_string(&board.stats(chrono::Utc::now()).await)?
    );

    ui.add_notification(
        NotificationKind::Info,
        "Saved",
        "Your changes were saved",
        Some(Duration::from_millis(100)),
    )
    .await;
    println!(
        "Active notifications before expiry: {}",
        ui.snapshot().await.notifications.len()
    );
    tokio::time::sleep(Duration::from_millis(300)).await;
    println!(
        "Active notifications after expiry: {}",
        ui.snapshot().await.notifications.len()
    );

    Ok(())
}
