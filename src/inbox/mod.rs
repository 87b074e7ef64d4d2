//! In-memory reconciliation of the user's alert inbox.
//!
//! Holds the session's merged view of the alert list, the server summary,
//! and the set of alert ids already surfaced as OS notifications. The
//! server stays the source of truth for existence and read state; this
//! module only decides which fetched alerts still need a popup and keeps
//! the cached view consistent with the writes it issues.

mod bus;

pub use bus::{AlertsBus, AlertsChanged};

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::api::client::{self, AlertsApi};
use crate::api::models::{Alert, AlertPriority, AlertSummary, BatchReport};
use crate::error::AppError;
use crate::notifications::Notifier;

/// Which slice of the cached list a display layer wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertFilter {
    All,
    Unread,
    Priority(AlertPriority),
}

/// Cloned view of the cached state for display layers.
#[derive(Debug, Clone, Default)]
pub struct InboxSnapshot {
    pub alerts: Vec<Alert>,
    pub summary: AlertSummary,
}

#[derive(Default)]
struct InboxState {
    alerts: Vec<Alert>,
    summary: AlertSummary,
    /// Ids already pushed to the OS notification layer this session.
    /// Deliberately not persisted: restarting the agent starts a fresh
    /// session and may re-notify still-unread alerts.
    shown: HashSet<String>,
    /// Generation of the refresh that last wrote `alerts`/`summary`.
    applied_generation: u64,
}

/// The session-scoped alert view driving the notification pipeline.
///
/// All I/O happens outside the internal lock; the lock only guards the
/// cached state and is never held across an `.await`.
pub struct AlertInbox {
    api: Arc<dyn AlertsApi>,
    notifier: Arc<dyn Notifier>,
    bus: AlertsBus,
    state: Mutex<InboxState>,
    /// Monotonic fetch counter; newer refreshes win over stale completions.
    generation: AtomicU64,
}

impl AlertInbox {
    pub fn new(api: Arc<dyn AlertsApi>, notifier: Arc<dyn Notifier>, bus: AlertsBus) -> Self {
        Self {
            api,
            notifier,
            bus,
            state: Mutex::new(InboxState::default()),
            generation: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, InboxState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Refetch list and summary, then reconcile.
    ///
    /// Each call takes a fresh generation token; a fetch that completes
    /// after a newer one has already applied is discarded, so the cached
    /// view is last-issued-wins rather than last-resolved-wins. On apply,
    /// every unread alert not yet in the shown-set gets exactly one popup,
    /// oldest first, and enters the set before anything renders.
    pub async fn refresh(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (alerts, summary) = tokio::join!(self.api.list_alerts(), self.api.alert_summary());

        let to_notify = {
            let mut state = self.lock();
            if generation <= state.applied_generation {
                tracing::debug!(generation, "Dropping stale alert fetch");
                return;
            }
            state.applied_generation = generation;

            let mut fresh: Vec<Alert> = alerts
                .iter()
                .filter(|a| !a.is_read && !state.shown.contains(&a.id))
                .cloned()
                .collect();
            // Oldest first, so a burst notifies in event order.
            fresh.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            for alert in &fresh {
                state.shown.insert(alert.id.clone());
            }

            state.alerts = alerts;
            state.summary = summary;
            fresh
        };

        for alert in &to_notify {
            self.notifier.show(&alert.title, &alert.message, alert.priority);
        }
        if !to_notify.is_empty() {
            tracing::info!(count = to_notify.len(), "Surfaced new alerts");
        }
    }

    /// Mark one alert read and patch the cached copy with the server's
    /// response. Errors propagate to the caller.
    pub async fn mark_read(&self, id: &str) -> Result<(), AppError> {
        let updated = self.api.mark_read(id).await?;
        let mut state = self.lock();
        if let Some(slot) = state.alerts.iter_mut().find(|a| a.id == id) {
            *slot = updated;
        }
        Ok(())
    }

    /// Delete one alert and drop it from the cache. Errors propagate.
    pub async fn dismiss(&self, id: &str) -> Result<(), AppError> {
        self.api.delete_alert(id).await?;
        self.lock().alerts.retain(|a| a.id != id);
        Ok(())
    }

    /// Mark every currently-unread alert read. An empty unread set is a
    /// no-op without any network traffic. Only ids whose request succeeded
    /// are patched locally; the report carries the rest.
    pub async fn mark_all_read(&self) -> BatchReport {
        let targets: Vec<String> = {
            let state = self.lock();
            state
                .alerts
                .iter()
                .filter(|a| !a.is_read)
                .map(|a| a.id.clone())
                .collect()
        };
        if targets.is_empty() {
            return BatchReport::default();
        }

        let report = client::mark_read_batch(self.api.as_ref(), &targets).await;
        let ok: HashSet<&str> = report.succeeded_ids().into_iter().collect();
        let mut state = self.lock();
        for alert in state.alerts.iter_mut() {
            if ok.contains(alert.id.as_str()) {
                alert.is_read = true;
            }
        }
        report
    }

    /// Delete every cached alert. Same no-op and per-id patching rules as
    /// [`AlertInbox::mark_all_read`].
    pub async fn dismiss_all(&self) -> BatchReport {
        let targets: Vec<String> = {
            let state = self.lock();
            state.alerts.iter().map(|a| a.id.clone()).collect()
        };
        if targets.is_empty() {
            return BatchReport::default();
        }

        let report = client::delete_batch(self.api.as_ref(), &targets).await;
        let ok: HashSet<&str> = report.succeeded_ids().into_iter().collect();
        self.lock().alerts.retain(|a| !ok.contains(a.id.as_str()));
        report
    }

    /// Create an alert on behalf of another feature (account opened,
    /// transaction posted, ...) and signal the change. Creation failures
    /// propagate; the caller decides whether to surface or ignore them.
    pub async fn create_alert(
        &self,
        title: &str,
        message: &str,
        priority: AlertPriority,
    ) -> Result<Alert, AppError> {
        let alert = self.api.create_alert(title, message, priority).await?;
        self.bus.publish();
        Ok(alert)
    }

    /// Kick off the server-side bill-reminder scan, which may create new
    /// alerts, then signal the change. Errors propagate.
    pub async fn run_bill_reminder_scan(&self) -> Result<(), AppError> {
        self.api.run_bill_reminder_scan().await?;
        self.bus.publish();
        Ok(())
    }

    /// Order-preserving filter over the cached list. Never refetches.
    pub fn filtered(&self, filter: AlertFilter) -> Vec<Alert> {
        let state = self.lock();
        state
            .alerts
            .iter()
            .filter(|a| match filter {
                AlertFilter::All => true,
                AlertFilter::Unread => !a.is_read,
                AlertFilter::Priority(p) => a.priority == Some(p),
            })
            .cloned()
            .collect()
    }

    pub fn snapshot(&self) -> InboxSnapshot {
        let state = self.lock();
        InboxSnapshot {
            alerts: state.alerts.clone(),
            summary: state.summary.clone(),
        }
    }

    pub fn unread_count(&self) -> usize {
        self.lock().alerts.iter().filter(|a| !a.is_read).count()
    }
}
