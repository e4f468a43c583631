use clap::{ Args as ClapArgs, Parser, Subcommand };

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the chat relay HTTP server.
    Serve(ServeArgs),
    /// Chat with a running relay from the terminal.
    Chat(ChatArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ServeArgs {
    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:8888")]
    pub server_addr: String,

    // --- Upstream Provider Args ---
    /// API key for the upstream completion provider. Requests fail with 500 while unset.
    #[arg(long, env = "OPEN_SOURCE_API_KEY")]
    pub api_key: Option<String>,

    /// Chat completions URL (defaults to OpenRouter)
    #[arg(long, env = "OPEN_SOURCE_API_URL")]
    pub api_url: Option<String>,

    /// Model identifier (e.g., meta-llama/llama-3.1-8b-instruct:free)
    #[arg(long, env = "OPEN_SOURCE_MODEL")]
    pub model: Option<String>,

    /// Site URL sent as HTTP-Referer to OpenRouter.
    #[arg(long, env = "OPEN_SOURCE_SITE_URL")]
    pub site_url: Option<String>,

    /// Site name sent as X-Title to OpenRouter.
    #[arg(long, env = "OPEN_SOURCE_SITE_NAME")]
    pub site_name: Option<String>,

    /// Optional JSON file (`{"system_prompt": "..."}`) replacing the built-in assistant prompt.
    #[arg(long, env = "SYSTEM_PROMPT_PATH")]
    pub system_prompt_path: Option<String>,

    // --- TLS Args ---
    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ChatArgs {
    /// Relay endpoint the terminal widget posts to.
    #[arg(long, env = "CHAT_ENDPOINT", default_value = "http://127.0.0.1:8888/chat")]
    pub endpoint: String,
}
