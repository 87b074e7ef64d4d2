//! OS notification surface.
//!
//! The notifier is an explicitly constructed, injected service rather than
//! a process-wide global, so display layers and tests can substitute their
//! own implementation. Delivery is fire-and-forget: nothing here ever
//! reports a failure to its caller.

use std::sync::Mutex;

use crate::api::models::AlertPriority;
use crate::config::AppConfig;

/// How long a popup stays on screen before it is dismissed, regardless of
/// user interaction.
const AUTO_DISMISS_MS: u32 = 5_000;

/// Budget usage ratio (spent/limit) at which a warning fires. Inclusive.
const BUDGET_WARNING_RATIO: f64 = 0.8;
/// Ratio at which the budget counts as exceeded. Inclusive.
const BUDGET_EXCEEDED_RATIO: f64 = 1.0;

// ============================================================================
// Permission
// ============================================================================

/// Permission to render popups: `Unknown` until the backend has been
/// probed, then `Default`, `Granted`, or `Denied`. `Granted` and `Denied`
/// are terminal for the session; only an explicit [`Notifier::request_permission`]
/// re-probes from a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Unknown,
    Default,
    Granted,
    Denied,
}

// ============================================================================
// Notifier
// ============================================================================

/// Where alert popups go.
pub trait Notifier: Send + Sync {
    /// Current permission state.
    fn permission(&self) -> PermissionState;

    /// Manually (re-)request permission. Returns the resulting state.
    fn request_permission(&self) -> PermissionState;

    /// Render a popup iff permission is granted; silent no-op otherwise.
    /// Delivery failures are logged, never propagated.
    fn show(&self, title: &str, body: &str, priority: Option<AlertPriority>);
}

// ============================================================================
// DesktopNotifier
// ============================================================================

/// Notifier backed by the desktop notification daemon.
pub struct DesktopNotifier {
    state: Mutex<PermissionState>,
    enabled: bool,
    sound: bool,
}

impl DesktopNotifier {
    /// Permission is requested once up front; afterwards the state only
    /// changes through an explicit `request_permission`.
    pub fn new(config: &AppConfig) -> Self {
        let notifier = Self {
            state: Mutex::new(PermissionState::Unknown),
            enabled: config.notifications_enabled,
            sound: config.notification_sound,
        };
        if notifier.enabled {
            notifier.probe();
        } else {
            notifier.set_state(PermissionState::Denied);
        }
        notifier
    }

    fn set_state(&self, next: PermissionState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = next;
    }

    /// Ask the notification backend whether it will take our popups.
    fn probe(&self) -> PermissionState {
        let next = if backend_available() {
            PermissionState::Granted
        } else {
            tracing::warn!("Notification backend unavailable; popups disabled");
            PermissionState::Denied
        };
        self.set_state(next);
        next
    }
}

impl Notifier for DesktopNotifier {
    fn permission(&self) -> PermissionState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn request_permission(&self) -> PermissionState {
        if !self.enabled {
            return PermissionState::Denied;
        }
        self.probe()
    }

    fn show(&self, title: &str, body: &str, priority: Option<AlertPriority>) {
        if self.permission() != PermissionState::Granted {
            return;
        }
        if let Err(e) = deliver(title, body, priority, self.sound) {
            tracing::warn!("Failed to send OS notification: {}", e);
        }
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
fn backend_available() -> bool {
    notify_rust::get_capabilities().is_ok()
}

#[cfg(any(not(unix), target_os = "macos"))]
fn backend_available() -> bool {
    true
}

#[cfg(all(unix, not(target_os = "macos")))]
fn deliver(
    title: &str,
    body: &str,
    priority: Option<AlertPriority>,
    sound: bool,
) -> Result<(), notify_rust::error::Error> {
    use notify_rust::{Hint, Notification, Timeout, Urgency};

    let urgency = match priority {
        Some(AlertPriority::Critical) | Some(AlertPriority::High) => Urgency::Critical,
        Some(AlertPriority::Medium) => Urgency::Normal,
        _ => Urgency::Low,
    };

    let mut note = Notification::new();
    note.summary(title)
        .body(body)
        .icon("dialog-information")
        .urgency(urgency)
        .timeout(Timeout::Milliseconds(AUTO_DISMISS_MS));
    if sound {
        note.hint(Hint::SoundName("message-new-instant".into()));
    }
    note.show().map(|_| ())
}

#[cfg(any(not(unix), target_os = "macos"))]
fn deliver(
    title: &str,
    body: &str,
    _priority: Option<AlertPriority>,
    _sound: bool,
) -> Result<(), notify_rust::error::Error> {
    use notify_rust::Notification;

    Notification::new().summary(title).body(body).show().map(|_| ())
}

// ============================================================================
// Domain notification helpers
// ============================================================================

/// Standing of a budget after a spend update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStanding {
    WithinBudget,
    Warning,
    Exceeded,
}

/// Classify spend against limit. Both thresholds are inclusive lower
/// bounds with no upper bound: 80% usage is already a warning, 100% is
/// already exceeded.
pub fn classify_budget_usage(spent: f64, limit: f64) -> BudgetStanding {
    if limit <= 0.0 {
        // A zero-limit budget has nothing to spend against.
        return if spent > 0.0 {
            BudgetStanding::Exceeded
        } else {
            BudgetStanding::WithinBudget
        };
    }
    let ratio = spent / limit;
    if ratio >= BUDGET_EXCEEDED_RATIO {
        BudgetStanding::Exceeded
    } else if ratio >= BUDGET_WARNING_RATIO {
        BudgetStanding::Warning
    } else {
        BudgetStanding::WithinBudget
    }
}

/// Notify the user about budget usage. Below the warning threshold this is
/// silent.
pub fn notify_budget_status(notifier: &dyn Notifier, category: &str, spent: f64, limit: f64) {
    let (title, body) = match classify_budget_usage(spent, limit) {
        BudgetStanding::WithinBudget => return,
        BudgetStanding::Warning => (
            "Budget warning",
            format!(
                "{} budget at {:.0}%: {:.2} of {:.2} spent",
                category,
                spent / limit * 100.0,
                spent,
                limit
            ),
        ),
        BudgetStanding::Exceeded => (
            "Budget exceeded",
            format!("{} budget exceeded: {:.2} spent of {:.2}", category, spent, limit),
        ),
    };
    notifier.show(title, &body, Some(AlertPriority::High));
}

/// Notify the user about a transaction event.
pub fn notify_transaction(notifier: &dyn Notifier, description: &str, amount: f64) {
    notifier.show(
        "Transaction alert",
        &format!("{}: {:.2}", description, amount),
        Some(AlertPriority::Medium),
    );
}
