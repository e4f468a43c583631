use async_trait::async_trait;
use log::debug;
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };
use serde_json::Value;

use super::{ CompletionTransport, TransportError, UpstreamRequest, UpstreamResponse };

/// reqwest transport for OpenAI-compatible chat completion endpoints.
#[derive(Clone)]
pub struct OpenAIChatClient {
    http: HttpClient,
}

impl OpenAIChatClient {
    pub fn new() -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = HttpClient::builder().default_headers(headers).build()?;

        Ok(Self { http })
    }

    fn request_headers(request: &UpstreamRequest) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", request.api_key)).map_err(|e|
                TransportError::InvalidHeader(AUTHORIZATION.to_string(), e.to_string())
            )?
        );
        for (name, value) in &request.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e|
                TransportError::InvalidHeader(name.clone(), e.to_string())
            )?;
            let header_value = HeaderValue::from_str(value).map_err(|e|
                TransportError::InvalidHeader(name.clone(), e.to_string())
            )?;
            headers.insert(header_name, header_value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl CompletionTransport for OpenAIChatClient {
    async fn post(&self, request: &UpstreamRequest) -> Result<UpstreamResponse, TransportError> {
        let headers = Self::request_headers(request)?;

        let resp = self.http
            .post(&request.url)
            .headers(headers)
            .json(&request.payload)
            .send().await?;

        let status = resp.status().as_u16();
        let body = match resp.json::<Value>().await {
            Ok(body) => body,
            Err(e) => {
                debug!("Upstream body from {} is not JSON: {}", request.url, e);
                Value::Object(Default::default())
            }
        };

        Ok(UpstreamResponse { status, body })
    }
}
