use serde::{Deserialize, Serialize};

use crate::{
    domain::{MediaDescriptor, ReportCategory, Severity},
    error::DomainError,
};

/// Caller-supplied report input prior to identifier/timestamp assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDraft {
    pub category: ReportCategory,
    pub title: String,
    pub description: String,
    pub location: String,
    pub severity: Severity,
    pub anonymous: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<MediaDescriptor>,
}

impl ReportDraft {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::validation("title"));
        }
        if self.description.trim().is_empty() {
            return Err(DomainError::validation("description"));
        }
        if self.location.trim().is_empty() {
            return Err(DomainError::validation("location"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentDraft {
    pub text: String,
    pub author: String,
    pub anonymous: bool,
}

impl CommentDraft {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.text.trim().is_empty() {
            return Err(DomainError::validation("comment text"));
        }
        Ok(())
    }
}

/// Listing filter. `category: None` means all categories; an empty search
/// string matches every report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportFilter {
    pub category: Option<ReportCategory>,
    #[serde(default)]
    pub search: String,
}

impl ReportFilter {
    pub fn for_category(category: ReportCategory) -> Self {
        Self {
            category: Some(category),
            search: String::new(),
        }
    }

    pub fn for_search(search: impl Into<String>) -> Self {
        Self {
            category: None,
            search: search.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Rising,
    Falling,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStats {
    pub total: usize,
    pub this_week: usize,
    pub last_week: usize,
    pub trend: i64,
}

impl ReportStats {
    pub fn direction(&self) -> TrendDirection {
        match self.trend {
            t if t > 0 => TrendDirection::Rising,
            t if t < 0 => TrendDirection::Falling,
            _ => TrendDirection::Flat,
        }
    }
}
