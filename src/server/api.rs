use crate::config::RelayConfig;
use crate::llm::chat::CompletionTransport;
use crate::models::chat::RelayResponse;
use crate::relay::relay;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use axum::{
    body::Bytes,
    extract::State,
    http::{ Method, StatusCode },
    response::{ IntoResponse, Response },
    routing::any,
    Json,
    Router,
};
use tower_http::cors::{ Any, CorsLayer };
use log::info;

pub const CHAT_PATH: &str = "/chat";
/// Path the site's front end was first deployed against.
pub const LEGACY_CHAT_PATH: &str = "/.netlify/functions/chat";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub transport: Arc<dyn CompletionTransport>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    // `any` so that other methods reach the handler and get the JSON 405.
    Router::new()
        .route(CHAT_PATH, any(chat_handler))
        .route(LEGACY_CHAT_PATH, any(chat_handler))
        .layer(cors)
        .with_state(state)
}

async fn chat_handler(State(state): State<AppState>, method: Method, body: Bytes) -> Response {
    match relay(&method, &body, &state.config, state.transport.as_ref()).await {
        Ok(reply) => (StatusCode::OK, Json(RelayResponse::Reply { reply })).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn start_http_server(
    addr: SocketAddr,
    state: AppState,
    tls: Option<(String, String)>
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let app = router(state);

    match tls {
        Some((cert_path, key_path)) => {
            info!("Loading TLS certificate from '{}' and key from '{}'", cert_path, key_path);
            let tls_config = axum_server::tls_rustls::RustlsConfig
                ::from_pem_file(&cert_path, &key_path).await
                .map_err(|e| format!("Failed to load TLS files: {}", e))?;

            info!("Chat relay listening on: https://{}{}", addr, CHAT_PATH);
            axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service()).await?;
        }
        None => {
            let listener = tokio::net::TcpListener
                ::bind(addr).await
                .map_err(|e| format!("Failed to bind HTTP server to {}: {}", addr, e))?;

            info!("Chat relay listening on: http://{}{}", addr, CHAT_PATH);
            axum::serve(listener, app.into_make_service()).await?;
        }
    }

    Ok(())
}
