//! Client-side sort for the report table view. The board's own listing
//! order (newest first) is never affected; this is a view-owned transform.

use std::cmp::Ordering;

use shared::domain::Report;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Title,
    Category,
    Severity,
    Location,
    SubmittedAt,
    Updates,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortConfig {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortConfig {
    pub fn ascending(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Ascending,
        }
    }

    /// Header-click rule: clicking the current ascending column flips it to
    /// descending; any other click starts ascending on the clicked column.
    pub fn clicked(current: Option<SortConfig>, key: SortKey) -> SortConfig {
        match current {
            Some(config)
                if config.key == key && config.direction == SortDirection::Ascending =>
            {
                SortConfig {
                    key,
                    direction: SortDirection::Descending,
                }
            }
            _ => SortConfig::ascending(key),
        }
    }
}

/// Stable sort by the configured column. Severity sorts by rank (low <
/// medium < high), timestamps chronologically, text columns
/// case-insensitively.
pub fn sort_reports(reports: &mut [Report], config: SortConfig) {
    reports.sort_by(|a, b| {
        let ordering = compare_by_key(a, b, config.key);
        match config.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

fn compare_by_key(a: &Report, b: &Report, key: SortKey) -> Ordering {
    match key {
        SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortKey::Category => a.category.label().cmp(b.category.label()),
        SortKey::Severity => a.severity.cmp(&b.severity),
        SortKey::Location => a.location.to_lowercase().cmp(&b.location.to_lowercase()),
        SortKey::SubmittedAt => a.submitted_at.cmp(&b.submitted_at),
        SortKey::Updates => a.updates.cmp(&b.updates),
    }
}
