use async_trait::async_trait;
use log::debug;
use reqwest::Client as HttpClient;
use serde_json::Value;

use super::RelayClient;
use crate::error::ClientError;
use crate::models::chat::RelayRequest;

pub const UNAVAILABLE: &str = "Assistant is unavailable right now.";

/// Posts chat turns to a relay endpoint over HTTP.
#[derive(Clone)]
pub struct HttpRelayClient {
    http: HttpClient,
    endpoint: String,
}

impl HttpRelayClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { http: HttpClient::new(), endpoint: endpoint.into() }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RelayClient for HttpRelayClient {
    async fn send(&self, request: &RelayRequest) -> Result<String, ClientError> {
        let resp = self.http
            .post(&self.endpoint)
            .json(request)
            .send().await
            .map_err(ClientError::Connect)?;

        let status = resp.status();
        let data = resp.json::<Value>().await.unwrap_or_else(|e| {
            debug!("Relay body from {} is not JSON: {}", self.endpoint, e);
            Value::Null
        });

        let reply = data
            .get("reply")
            .and_then(Value::as_str)
            .filter(|r| !r.is_empty());

        match reply {
            Some(reply) if status.is_success() => Ok(reply.to_string()),
            _ => {
                let error = data
                    .get("error")
                    .and_then(Value::as_str)
                    .filter(|e| !e.is_empty())
                    .unwrap_or(UNAVAILABLE);
                Err(ClientError::Rejected(error.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::ChatMessage;
    use axum::{ http::StatusCode, routing::post, Json, Router };
    use serde_json::json;

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/chat", addr)
    }

    fn request() -> RelayRequest {
        RelayRequest { message: "Hello".into(), history: vec![ChatMessage::assistant("Hi")] }
    }

    #[tokio::test]
    async fn returns_reply_and_sends_history() {
        let app = Router::new().route(
            "/chat",
            post(|Json(body): Json<RelayRequest>| async move {
                Json(json!({ "reply": format!("{}/{}", body.message, body.history.len()) }))
            })
        );
        let client = HttpRelayClient::new(spawn(app).await);
        assert_eq!(client.send(&request()).await.unwrap(), "Hello/1");
    }

    #[tokio::test]
    async fn surfaces_relay_error_text() {
        let app = Router::new().route(
            "/chat",
            post(|| async { (StatusCode::BAD_GATEWAY, Json(json!({ "error": "X" }))) })
        );
        let client = HttpRelayClient::new(spawn(app).await);
        let err = client.send(&request()).await.unwrap_err();
        assert_eq!(err.to_string(), "X");
    }

    #[tokio::test]
    async fn missing_reply_falls_back() {
        let app = Router::new().route("/chat", post(|| async { Json(json!({ "reply": "" })) }));
        let client = HttpRelayClient::new(spawn(app).await);
        let err = client.send(&request()).await.unwrap_err();
        assert_eq!(err.to_string(), UNAVAILABLE);
    }

    #[tokio::test]
    async fn unreachable_relay_is_connect_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpRelayClient::new(format!("http://{}/chat", addr));
        let err = client.send(&request()).await.unwrap_err();
        assert!(matches!(err, ClientError::Connect(_)));
        assert_eq!(err.to_string(), "Unable to connect to assistant.");
    }
}
