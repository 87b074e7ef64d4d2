//! Property test for the reconciliation pipeline: across any sequence of
//! fetched alert lists, an alert id is surfaced as a popup at most once
//! per session, and only if some fetch returned it unread.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use bankwatch::api::client::AlertsApi;
use bankwatch::api::models::{Alert, AlertPriority, AlertSummary};
use bankwatch::error::AppError;
use bankwatch::inbox::{AlertInbox, AlertsBus};
use bankwatch::notifications::{Notifier, PermissionState};

fn make_alert(id: u8, is_read: bool) -> Alert {
    Alert {
        id: format!("a{}", id),
        title: format!("a{}", id),
        message: "generated".into(),
        priority: Some(AlertPriority::Medium),
        alert_type: None,
        is_read,
        created_at: Utc.timestamp_opt(1_700_000_000 + id as i64, 0).unwrap(),
    }
}

/// Replays a scripted sequence of list responses; exhausted scripts
/// return an empty list.
struct ScriptedApi {
    lists: Mutex<VecDeque<Vec<Alert>>>,
}

#[async_trait::async_trait]
impl AlertsApi for ScriptedApi {
    async fn list_alerts(&self) -> Vec<Alert> {
        self.lists
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default()
    }

    async fn alert_summary(&self) -> AlertSummary {
        AlertSummary::default()
    }

    async fn create_alert(
        &self,
        _title: &str,
        _message: &str,
        _priority: AlertPriority,
    ) -> Result<Alert, AppError> {
        Err(AppError::Internal("not scripted".into()))
    }

    async fn mark_read(&self, _id: &str) -> Result<Alert, AppError> {
        Err(AppError::Internal("not scripted".into()))
    }

    async fn delete_alert(&self, _id: &str) -> Result<(), AppError> {
        Err(AppError::Internal("not scripted".into()))
    }

    async fn run_bill_reminder_scan(&self) -> Result<(), AppError> {
        Err(AppError::Internal("not scripted".into()))
    }
}

struct CountingNotifier {
    titles: Mutex<Vec<String>>,
}

impl Notifier for CountingNotifier {
    fn permission(&self) -> PermissionState {
        PermissionState::Granted
    }

    fn request_permission(&self) -> PermissionState {
        PermissionState::Granted
    }

    fn show(&self, title: &str, _body: &str, _priority: Option<AlertPriority>) {
        self.titles.lock().unwrap().push(title.into());
    }
}

/// One fetch: up to 6 distinct alerts out of a pool of 6 ids, each either
/// read or unread. Duplicate ids within a fetch keep their first flag.
fn fetch_strategy() -> impl Strategy<Value = Vec<(u8, bool)>> {
    proptest::collection::vec((0u8..6, any::<bool>()), 0..6).prop_map(|raw| {
        let mut seen = HashSet::new();
        raw.into_iter()
            .filter(|(id, _)| seen.insert(*id))
            .collect()
    })
}

proptest! {
    #[test]
    fn notify_at_most_once_per_id(fetches in proptest::collection::vec(fetch_strategy(), 1..8)) {
        let ever_unread: HashSet<String> = fetches
            .iter()
            .flatten()
            .filter(|&&(_, is_read)| !is_read)
            .map(|&(id, _)| format!("a{}", id))
            .collect();

        let lists: VecDeque<Vec<Alert>> = fetches
            .iter()
            .map(|fetch| {
                fetch
                    .iter()
                    .map(|&(id, is_read)| make_alert(id, is_read))
                    .collect()
            })
            .collect();

        let api = Arc::new(ScriptedApi { lists: Mutex::new(lists) });
        let notifier = Arc::new(CountingNotifier { titles: Mutex::new(Vec::new()) });
        let inbox = AlertInbox::new(api, notifier.clone(), AlertsBus::new());

        let rounds = fetches.len();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        runtime.block_on(async {
            for _ in 0..rounds {
                inbox.refresh().await;
            }
        });

        let titles = notifier.titles.lock().unwrap().clone();

        // At most one popup per id.
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for title in &titles {
            *counts.entry(title.as_str()).or_default() += 1;
        }
        for (id, count) in &counts {
            prop_assert!(*count <= 1, "alert {} notified {} times", id, count);
        }

        // Only ids that were fetched unread at least once may notify.
        for title in &titles {
            prop_assert!(
                ever_unread.contains(title),
                "alert {} notified but never fetched unread",
                title
            );
        }
    }
}
