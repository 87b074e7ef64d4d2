use std::time::Duration;

use futures_util::{stream, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::models::{Alert, AlertPriority, AlertSummary, BatchOutcome, BatchReport};
use crate::config::AppConfig;
use crate::error::AppError;

/// Convert any displayable error into `AppError::Transport`.
fn transport_err(e: impl std::fmt::Display) -> AppError {
    AppError::Transport(e.to_string())
}

/// Maximum number of batch requests in flight at once.
pub const BATCH_CONCURRENCY: usize = 8;

// ============================================================================
// AlertsApi
// ============================================================================

/// Client-side contract for the alerts resource.
///
/// Reads are best-effort: a failure degrades to an empty/zero value so a
/// broken alerts backend never breaks the caller. Writes propagate their
/// error so the caller can surface it. No operation is ever retried.
#[async_trait::async_trait]
pub trait AlertsApi: Send + Sync {
    /// Full alert list, in whatever order the server returns.
    async fn list_alerts(&self) -> Vec<Alert>;

    /// Aggregate counts over the current alert set.
    async fn alert_summary(&self) -> AlertSummary;

    /// Create an alert on the server. Callers creating alerts as a side
    /// effect of another action want to know when it failed, so this
    /// propagates instead of swallowing.
    async fn create_alert(
        &self,
        title: &str,
        message: &str,
        priority: AlertPriority,
    ) -> Result<Alert, AppError>;

    /// Mark one alert read; returns the updated record.
    async fn mark_read(&self, id: &str) -> Result<Alert, AppError>;

    /// Delete one alert.
    async fn delete_alert(&self, id: &str) -> Result<(), AppError>;

    /// Kick off the server-side scan for due bill reminders.
    async fn run_bill_reminder_scan(&self) -> Result<(), AppError>;
}

// ============================================================================
// Batch helpers
// ============================================================================

/// Mark every id in `ids` as read, at most [`BATCH_CONCURRENCY`] requests in
/// flight at once and no ordering guarantee between them. An empty id set
/// issues no request at all. Already-finished requests are not rolled back
/// when a later one fails; the report says per id what happened.
pub async fn mark_read_batch(api: &dyn AlertsApi, ids: &[String]) -> BatchReport {
    if ids.is_empty() {
        return BatchReport::default();
    }
    let outcomes = stream::iter(ids.to_vec())
        .map(|id| async move {
            let result = api.mark_read(&id).await.map(|_| ());
            BatchOutcome { id, result }
        })
        .buffer_unordered(BATCH_CONCURRENCY)
        .collect::<Vec<_>>()
        .await;
    BatchReport { outcomes }
}

/// Delete every id in `ids`. Same dispatch and reporting rules as
/// [`mark_read_batch`].
pub async fn delete_batch(api: &dyn AlertsApi, ids: &[String]) -> BatchReport {
    if ids.is_empty() {
        return BatchReport::default();
    }
    let outcomes = stream::iter(ids.to_vec())
        .map(|id| async move {
            let result = api.delete_alert(&id).await;
            BatchOutcome { id, result }
        })
        .buffer_unordered(BATCH_CONCURRENCY)
        .collect::<Vec<_>>()
        .await;
    BatchReport { outcomes }
}

// ============================================================================
// Internal request bodies
// ============================================================================

#[derive(Serialize)]
struct CreateAlertBody<'a> {
    title: &'a str,
    message: &'a str,
    priority: AlertPriority,
}

// ============================================================================
// AlertsClient
// ============================================================================

/// HTTP client that wraps the banking backend's alerts endpoints.
pub struct AlertsClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl AlertsClient {
    /// Create a new `AlertsClient` with the given backend base URL and
    /// optional bearer token.
    ///
    /// The underlying `reqwest::Client` is configured with a 30-second timeout.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build reqwest client");

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            token,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.api_base_url, config.api_token.clone())
    }

    // --------------------------------------------------------------------
    // Private HTTP helpers
    // --------------------------------------------------------------------

    /// Build a request to the given endpoint path, attaching the bearer
    /// token when one is configured.
    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let req = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Send a request, check the status code, and deserialize the JSON response.
    async fn send_json<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, AppError> {
        req.send()
            .await
            .map_err(transport_err)?
            .error_for_status()
            .map_err(transport_err)?
            .json()
            .await
            .map_err(transport_err)
    }

    /// Send a request, check the status code, and discard the response body.
    async fn send_ok(&self, req: reqwest::RequestBuilder) -> Result<(), AppError> {
        req.send()
            .await
            .map_err(transport_err)?
            .error_for_status()
            .map_err(transport_err)?;
        Ok(())
    }

    /// `GET /api/alerts` -- the fallible inner fetch behind `list_alerts`.
    async fn fetch_alerts(&self) -> Result<Vec<Alert>, AppError> {
        self.send_json(self.request(reqwest::Method::GET, "/api/alerts"))
            .await
    }

    /// `GET /api/alerts/summary/` -- the fallible inner fetch behind
    /// `alert_summary`.
    async fn fetch_summary(&self) -> Result<AlertSummary, AppError> {
        self.send_json(self.request(reqwest::Method::GET, "/api/alerts/summary/"))
            .await
    }
}

#[async_trait::async_trait]
impl AlertsApi for AlertsClient {
    async fn list_alerts(&self) -> Vec<Alert> {
        match self.fetch_alerts().await {
            Ok(alerts) => alerts,
            Err(e) => {
                tracing::warn!("Alert list fetch failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn alert_summary(&self) -> AlertSummary {
        match self.fetch_summary().await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!("Alert summary fetch failed: {}", e);
                AlertSummary::default()
            }
        }
    }

    /// `POST /api/alerts/` -- create an alert.
    async fn create_alert(
        &self,
        title: &str,
        message: &str,
        priority: AlertPriority,
    ) -> Result<Alert, AppError> {
        let req = self
            .request(reqwest::Method::POST, "/api/alerts/")
            .json(&CreateAlertBody {
                title,
                message,
                priority,
            });
        self.send_json(req).await
    }

    /// `PATCH /api/alerts/{id}/read` -- mark one alert read.
    async fn mark_read(&self, id: &str) -> Result<Alert, AppError> {
        let path = format!("/api/alerts/{}/read", id);
        self.send_json(self.request(reqwest::Method::PATCH, &path))
            .await
    }

    /// `DELETE /api/alerts/{id}` -- delete one alert.
    async fn delete_alert(&self, id: &str) -> Result<(), AppError> {
        let path = format!("/api/alerts/{}", id);
        self.send_ok(self.request(reqwest::Method::DELETE, &path))
            .await
    }

    /// `POST /api/alerts/bill-reminders` -- trigger the reminder scan.
    async fn run_bill_reminder_scan(&self) -> Result<(), AppError> {
        self.send_ok(self.request(reqwest::Method::POST, "/api/alerts/bill-reminders"))
            .await
    }
}
