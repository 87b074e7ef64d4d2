use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

// ============================================================================
// Wire types
// ============================================================================

/// Severity attached to an alert. `info` is the creation default; the
/// server-side summary only aggregates `medium` and above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
    #[default]
    Info,
    Low,
    Medium,
    High,
    Critical,
}

/// A server-persisted alert record surfaced to the user (budget breach,
/// transaction event, system message). The server is the sole source of
/// truth for existence and read state; the client only caches copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub priority: Option<AlertPriority>,
    #[serde(default)]
    pub alert_type: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Server-computed aggregate over the current alert set, fetched
/// independently of the full list. The two views may transiently disagree;
/// nothing reconciles them at any instant. `Default` is the zero state used
/// when the summary endpoint is unreachable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertSummary {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub critical: u64,
    #[serde(default)]
    pub high: u64,
    #[serde(default)]
    pub medium: u64,
    #[serde(default)]
    pub recent: Vec<Alert>,
}

// ============================================================================
// Batch reports
// ============================================================================

/// Outcome of one request within a client-orchestrated batch.
#[derive(Debug)]
pub struct BatchOutcome {
    pub id: String,
    pub result: Result<(), AppError>,
}

/// Per-id results of a batch fan-out. The server sees N independent
/// requests with no transactional grouping, so partial success is a normal
/// outcome and callers patch exactly the ids that went through.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<BatchOutcome>,
}

impl BatchReport {
    pub fn succeeded_ids(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_ok())
            .map(|o| o.id.as_str())
            .collect()
    }

    pub fn failures(&self) -> Vec<(&str, &AppError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.id.as_str(), e)))
            .collect()
    }

    pub fn all_ok(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}
