use url::Url;

use crate::error::AppError;

/// Fallback backend address for local development.
const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Agent configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the banking backend, without a trailing slash.
    pub api_base_url: String,
    /// Bearer token attached to every request when present.
    pub api_token: Option<String>,
    /// Master switch for OS notification popups.
    pub notifications_enabled: bool,
    /// Attach a notification sound to each popup.
    pub notification_sound: bool,
}

impl AppConfig {
    /// Read configuration from the environment (a local `.env` file is
    /// honored when present).
    ///
    /// - `BANKWATCH_API_URL` — backend base URL, default `http://localhost:8000`
    /// - `BANKWATCH_API_TOKEN` — optional bearer token
    /// - `BANKWATCH_NOTIFICATIONS` — popups on/off, default on
    /// - `BANKWATCH_NOTIFY_SOUND` — popup sound on/off, default off
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let api_base_url = std::env::var("BANKWATCH_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Url::parse(&api_base_url)
            .map_err(|e| AppError::Validation(format!("invalid BANKWATCH_API_URL: {e}")))?;
        let api_base_url = api_base_url.trim_end_matches('/').to_string();

        let api_token = std::env::var("BANKWATCH_API_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());

        Ok(Self {
            api_base_url,
            api_token,
            notifications_enabled: flag_value(
                std::env::var("BANKWATCH_NOTIFICATIONS").ok().as_deref(),
                true,
            ),
            notification_sound: flag_value(
                std::env::var("BANKWATCH_NOTIFY_SOUND").ok().as_deref(),
                false,
            ),
        })
    }
}

/// Interpret a boolean env value. Unset falls back to `default`.
fn flag_value(value: Option<&str>, default: bool) -> bool {
    match value {
        Some(v) => matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        None => default,
    }
}
