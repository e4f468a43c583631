pub mod api;

use crate::cli::ServeArgs;
use crate::config::RelayConfig;
use crate::llm::chat::CompletionTransport;
use self::api::AppState;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use log::{ info, warn, error };

pub struct Server {
    addr: String,
    state: AppState,
    args: ServeArgs,
}

impl Server {
    pub fn new(
        args: ServeArgs,
        config: RelayConfig,
        transport: Arc<dyn CompletionTransport>
    ) -> Self {
        if config.api_key.is_some() {
            info!("Relay configured with an upstream API key.");
        } else {
            warn!("Relay configured WITHOUT an upstream API key. Every chat request will fail with 500.");
        }

        Self {
            addr: args.server_addr.clone(),
            state: AppState { config: Arc::new(config), transport },
            args,
        }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.addr.parse::<SocketAddr>()?;
        let tls = self.tls_paths()?;
        if tls.is_none() {
            info!("TLS not enabled. Running plain HTTP server.");
        }
        api::start_http_server(addr, self.state.clone(), tls).await
    }

    fn tls_paths(&self) -> Result<Option<(String, String)>, Box<dyn Error + Send + Sync>> {
        if !self.args.enable_tls {
            return Ok(None);
        }
        match (&self.args.tls_cert_path, &self.args.tls_key_path) {
            (Some(cert_path), Some(key_path)) => Ok(Some((cert_path.clone(), key_path.clone()))),
            (Some(_), None) | (None, Some(_)) => {
                error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
                Err("Missing TLS certificate or key path".into())
            }
            (None, None) => {
                error!("--enable-tls was set but no certificate/key paths provided.");
                Err("TLS enabled without cert/key".into())
            }
        }
    }
}
