use reqwest::{Response, StatusCode};
use serde::Deserialize;
use time::{Duration, OffsetDateTime};

static RESET_HEADER: &str = "x-rate-limit-reset";

/// Wait applied when a 429 arrives without a usable reset header.
const FALLBACK_WAIT: Duration = Duration::seconds(60);

/// Reset time of the rate limit window if `resp` is a 429.
pub(crate) fn check_rate_limit(resp: &Response) -> Option<OffsetDateTime> {
    if resp.status() != StatusCode::TOO_MANY_REQUESTS {
        return None;
    }

    let reset = resp
        .headers()
        .get(RESET_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
        .and_then(|ts| OffsetDateTime::from_unix_timestamp(ts).ok())
        .unwrap_or_else(|| OffsetDateTime::now_utc() + FALLBACK_WAIT);
    Some(reset)
}

#[derive(Deserialize, Debug)]
pub(crate) struct ApiErrors {
    #[serde(default)]
    pub errors: Vec<ApiErrorEntry>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ApiErrorEntry {
    pub message: String,
}

/// Join the `errors[].message` fields of an error body, if it has any.
pub(crate) fn api_error_message(body: &str) -> Option<String> {
    let parsed: ApiErrors = serde_json::from_str(body).ok()?;
    if parsed.errors.is_empty() {
        return None;
    }
    Some(
        parsed
            .errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; "),
    )
}
