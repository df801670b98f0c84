//! Helpers shared by the REST clients of the hosted backend platform.

use reqwest::{RequestBuilder, Response};
use serde_json::Value;

/// Adds the platform's API key headers to a request.
pub fn with_api_key(request: RequestBuilder, api_key: &str, bearer: &str) -> RequestBuilder {
    request
        .header("apikey", api_key)
        .bearer_auth(bearer)
}

/// Extracts the human-readable message from a failed response.
///
/// The platform's services do not agree on a field name, so the usual candidates
/// are tried in order before falling back to the status line.
pub async fn error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|json| {
            ["msg", "message", "error_description", "error"]
                .iter()
                .find_map(|key| json.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| format!("request failed with status {status}"))
}
