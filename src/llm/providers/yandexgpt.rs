//! YandexGPT Foundation Models completion provider (`/foundationModels/v1/completion`).
//!
//! One call = one single-turn, non-streaming request. All wire types are
//! private to this module; callers only see [`Completion`].

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::llm::{Completion, ProviderError};

/// Header naming the cloud folder the request is billed to.
const FOLDER_ID_HEADER: &str = "x-folder-id";

const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 100;

// ── Public provider ───────────────────────────────────────────────────────────

/// Adapter for the YandexGPT completion endpoint.
///
/// Constructed once at startup, then cheaply cloned because
/// `reqwest::Client` is an `Arc` internally.
#[derive(Clone)]
pub struct YandexGptProvider {
    client: Client,
    api_url: String,
    model: String,
    folder_id: String,
    api_key: String,
}

impl fmt::Debug for YandexGptProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YandexGptProvider")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("folder_id", &self.folder_id)
            .finish_non_exhaustive()
    }
}

impl YandexGptProvider {
    /// Build a provider from config values.
    ///
    /// `timeout_seconds` bounds every request end to end, including reading
    /// the body.
    pub fn new(
        api_url: String,
        model: String,
        folder_id: String,
        api_key: String,
        timeout_seconds: u64,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, api_url, model, folder_id, api_key })
    }

    /// Send `content` as the only user message and parse the reply.
    pub async fn complete(&self, content: &str) -> Result<Completion, ProviderError> {
        let payload = build_request(&self.folder_id, &self.model, content);

        debug!(
            model_uri = %payload.model_uri,
            content_len = content.len(),
            "sending completion request"
        );

        let body = serde_json::to_vec(&payload)
            .map_err(|e| ProviderError::Serialization(e.to_string()))?;

        if tracing::enabled!(tracing::Level::TRACE) {
            trace!(payload = %String::from_utf8_lossy(&body), "full completion request payload");
        }

        let response = self
            .client
            .post(&self.api_url)
            .header(AUTHORIZATION, format!("Api-Key {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .header(FOLDER_ID_HEADER, &self.folder_id)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                debug!(url = %self.api_url, timeout = e.is_timeout(), "completion send failed");
                ProviderError::Transport(e.to_string())
            })?;

        let response = check_status(response).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Transport(format!("failed to read response body: {e}")))?;

        if tracing::enabled!(tracing::Level::TRACE) {
            trace!(response = %String::from_utf8_lossy(&bytes), "full completion response payload");
        }

        parse_completion(&bytes)
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionRequest {
    model_uri: String,
    completion_options: CompletionOptions,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionOptions {
    stream: bool,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    text: String,
}

fn build_request(folder_id: &str, model: &str, content: &str) -> CompletionRequest {
    CompletionRequest {
        model_uri: format!("gpt://{folder_id}/{model}"),
        completion_options: CompletionOptions {
            stream: false,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        },
        messages: vec![Message { role: "user", text: content.to_string() }],
    }
}

// Every field is optional: a missing piece means "unexpected shape", not a
// decode failure.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    result: Option<CompletionResult>,
}

#[derive(Debug, Deserialize)]
struct CompletionResult {
    #[serde(default)]
    alternatives: Option<Vec<Alternative>>,
    #[serde(default)]
    usage: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    message: Option<AlternativeMessage>,
}

#[derive(Debug, Deserialize)]
struct AlternativeMessage {
    #[serde(default)]
    text: Option<String>,
}

/// Interpret a response body.
///
/// Only a body that is not JSON at all is an error. Valid JSON that does not
/// follow `result.alternatives[0].message.text` becomes
/// [`Completion::UnexpectedShape`]; an empty `alternatives` list becomes
/// [`Completion::NoAlternatives`].
pub fn parse_completion(body: &[u8]) -> Result<Completion, ProviderError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| ProviderError::Decode(e.to_string()))?;

    let Ok(parsed) = serde_json::from_value::<CompletionResponse>(value) else {
        return Ok(Completion::UnexpectedShape);
    };
    let Some(result) = parsed.result else {
        return Ok(Completion::UnexpectedShape);
    };
    if let Some(usage) = &result.usage {
        debug!(%usage, "completion usage");
    }
    let Some(alternatives) = result.alternatives else {
        return Ok(Completion::UnexpectedShape);
    };

    debug!(alternatives = alternatives.len(), "received completion response");

    match alternatives.into_iter().next() {
        None => Ok(Completion::NoAlternatives),
        Some(first) => Ok(first
            .message
            .and_then(|m| m.text)
            .map_or(Completion::UnexpectedShape, Completion::Reply)),
    }
}

// Error envelope used by Yandex Cloud APIs.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Pass a successful response through, or turn a non-2xx one into
/// [`ProviderError::Status`].
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());

    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(env) => format!("HTTP {status}: {}", env.error.message),
        Err(_) => format!("HTTP {status}: {body}"),
    };

    debug!(%status, "completion request returned HTTP error");
    Err(ProviderError::Status(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn to_value(req: &CompletionRequest) -> Value {
        serde_json::from_slice(&serde_json::to_vec(req).unwrap()).unwrap()
    }

    #[test]
    fn request_has_expected_shape() {
        let v = to_value(&build_request("b1gfolder", "yandexgpt-lite", "hi"));
        assert_eq!(
            v,
            json!({
                "modelUri": "gpt://b1gfolder/yandexgpt-lite",
                "completionOptions": { "stream": false, "temperature": 0.7, "maxTokens": 100 },
                "messages": [{ "role": "user", "text": "hi" }]
            })
        );
    }

    #[test]
    fn special_characters_survive_encoding() {
        let text = "say \"hi\"\nthen \\ leave\t{}";
        let v = to_value(&build_request("f", "m", text));
        assert_eq!(v["messages"][0]["text"].as_str(), Some(text));
    }

    #[test]
    fn parses_first_alternative_text() {
        let body = br#"{"result":{"alternatives":[
            {"message":{"role":"assistant","text":"hello"},"status":"ALTERNATIVE_STATUS_FINAL"},
            {"message":{"role":"assistant","text":"second"}}
        ],"usage":{"inputTextTokens":"3","completionTokens":"1","totalTokens":"4"},"modelVersion":"23.10.2024"}}"#;
        assert_eq!(parse_completion(body).unwrap(), Completion::Reply("hello".into()));
    }

    #[test]
    fn empty_object_is_unexpected_shape() {
        let completion = parse_completion(b"{}").unwrap();
        assert_eq!(completion, Completion::UnexpectedShape);
        assert_eq!(completion.into_text(), "no reply received");
    }

    #[test]
    fn empty_alternatives_is_no_alternatives() {
        let body = br#"{"result":{"alternatives":[]}}"#;
        assert_eq!(parse_completion(body).unwrap(), Completion::NoAlternatives);
    }

    #[test]
    fn wrong_types_are_unexpected_shape() {
        for body in [
            &br#"{"result":5}"#[..],
            br#"{"result":{"alternatives":{"message":"x"}}}"#,
            br#"{"result":{"alternatives":[{"message":{"text":42}}]}}"#,
            br#"{"result":{"alternatives":[{"status":"ALTERNATIVE_STATUS_FINAL"}]}}"#,
            b"[]",
        ] {
            assert_eq!(
                parse_completion(body).unwrap(),
                Completion::UnexpectedShape,
                "body: {}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn non_json_body_is_decode_error() {
        let err = parse_completion(b"<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
    }

    #[test]
    fn debug_hides_api_key() {
        let p = YandexGptProvider::new(
            "http://127.0.0.1:1/completion".into(),
            "yandexgpt-lite".into(),
            "folder".into(),
            "very-secret".into(),
            5,
        )
        .unwrap();
        assert!(!format!("{p:?}").contains("very-secret"));
    }
}
