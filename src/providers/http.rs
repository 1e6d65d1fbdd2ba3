//! HTTP plumbing shared by the remote tiers.

use std::time::Duration;

use reqwest::{Client, Response};
use serde_json::Value;

use crate::{Result, SproutError};

/// Default per-request timeout for tier HTTP clients.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

pub(crate) fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .user_agent(crate::version::user_agent())
        .build()
        .expect("failed to build HTTP client")
}

/// Pass successful responses through; turn everything else into an error.
///
/// The body of a failed response is read for a JSON `error` (or
/// `error.message`) field so the user sees the service's own message.
pub(crate) async fn check_status(response: Response, service: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status.as_u16() {
        401 | 403 => Err(SproutError::AuthenticationFailed),
        429 => {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs);
            Err(SproutError::RateLimited { retry_after })
        }
        code => {
            let body = response.text().await.unwrap_or_default();
            Err(SproutError::Api {
                status: code,
                message: error_message(&body)
                    .unwrap_or_else(|| format!("{service} error: {status}")),
            })
        }
    }
}

fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    error
        .as_str()
        .or_else(|| error.get("message").and_then(Value::as_str))
        .map(str::to_string)
}
