//! Stateless translation of one browser chat turn into one upstream completion call.
//!
//! [`relay`] is a pure function of the request, the static [`RelayConfig`] and the injected
//! [`CompletionTransport`]: it stores nothing and never retries.

use axum::http::Method;
use log::{ debug, info, warn };
use serde_json::{ Map, Value };
use uuid::Uuid;

use crate::config::RelayConfig;
use crate::error::{ RelayError, MISSING_API_KEY, UPSTREAM_FAILED };
use crate::llm::chat::{ CompletionRequest, CompletionTransport, UpstreamRequest, UpstreamResponse };
use crate::models::chat::{ truncate_chars, ChatMessage, Role, MAX_CONTENT_CHARS, MAX_HISTORY };

/// Runs one relay invocation and returns the trimmed assistant reply.
pub async fn relay(
    method: &Method,
    body: &[u8],
    config: &RelayConfig,
    transport: &dyn CompletionTransport
) -> Result<String, RelayError> {
    if *method != Method::POST {
        return Err(RelayError::MethodNotAllowed);
    }

    let api_key = config.api_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| RelayError::ServerMisconfigured(MISSING_API_KEY.to_string()))?;

    let payload = parse_body(body)?;
    let message = extract_message(&payload)?;
    let history = sanitize_history(payload.get("history"));

    let request_id = Uuid::new_v4();
    debug!(
        "[{}] relaying message of {} chars with {} history entries",
        request_id,
        message.chars().count(),
        history.len()
    );

    let request = UpstreamRequest {
        url: config.api_url.clone(),
        api_key: api_key.to_string(),
        headers: config.site_headers(),
        payload: CompletionRequest {
            model: config.model.clone(),
            messages: build_messages(&config.system_prompt, history, &message),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        },
    };

    let response = transport.post(&request).await.map_err(|e| {
        warn!("[{}] upstream {} unreachable: {}", request_id, config.api_url, e);
        RelayError::UpstreamUnavailable(e.to_string())
    })?;

    info!("[{}] upstream responded with status {}", request_id, response.status);
    map_response(response)
}

fn parse_body(body: &[u8]) -> Result<Value, RelayError> {
    if body.is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json
        ::from_slice(body)
        .map_err(|_| RelayError::InvalidRequest("Invalid JSON body.".to_string()))
}

fn extract_message(payload: &Value) -> Result<String, RelayError> {
    payload
        .get("message")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(|m| truncate_chars(m, MAX_CONTENT_CHARS).to_string())
        .ok_or_else(|| RelayError::InvalidRequest("Message is required.".to_string()))
}

/// Keeps well-formed user/assistant entries, then the last [`MAX_HISTORY`] of those, each cut
/// to [`MAX_CONTENT_CHARS`].
pub fn sanitize_history(history: Option<&Value>) -> Vec<ChatMessage> {
    let entries = match history.and_then(Value::as_array) {
        Some(entries) => entries,
        None => {
            return Vec::new();
        }
    };

    let valid: Vec<ChatMessage> = entries
        .iter()
        .filter_map(|entry| {
            let role = entry.get("role").and_then(Value::as_str).and_then(Role::from_history)?;
            let content = entry.get("content").and_then(Value::as_str)?;
            Some(ChatMessage::new(role, truncate_chars(content, MAX_CONTENT_CHARS)))
        })
        .collect();

    let skip = valid.len().saturating_sub(MAX_HISTORY);
    valid.into_iter().skip(skip).collect()
}

/// System prompt first, then history, then the current user turn.
pub fn build_messages(
    system_prompt: &str,
    history: Vec<ChatMessage>,
    message: &str
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend(history);
    messages.push(ChatMessage::user(message));
    messages
}

fn map_response(response: UpstreamResponse) -> Result<String, RelayError> {
    if !response.is_success() {
        return Err(RelayError::UpstreamError(upstream_error_text(&response.body)));
    }

    response.body
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|reply| !reply.is_empty())
        .map(str::to_owned)
        .ok_or(RelayError::EmptyUpstreamReply)
}

/// `error.message`, else `error` when it is a plain string, else a generic message.
fn upstream_error_text(body: &Value) -> String {
    let error = body.get("error");
    error
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .or_else(|| error.and_then(Value::as_str).filter(|m| !m.is_empty()))
        .unwrap_or(UPSTREAM_FAILED)
        .to_string()
}
