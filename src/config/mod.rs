pub mod prompt;

use crate::cli::ServeArgs;
use std::error::Error;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "meta-llama/llama-3.1-8b-instruct:free";
const DEFAULT_PROVIDER_HOST: &str = "openrouter.ai";

/// Static relay configuration, built once at startup and shared read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayConfig {
    /// Absent keys are reported per request rather than failing startup.
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub site_url: Option<String>,
    pub site_name: Option<String>,
    pub system_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            site_url: None,
            site_name: None,
            system_prompt: prompt::DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: 0.5,
            max_tokens: 260,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

impl RelayConfig {
    pub fn from_args(args: &ServeArgs) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let defaults = Self::default();
        let system_prompt = match non_empty(&args.system_prompt_path) {
            Some(path) => prompt::load_system_prompt(path)?,
            None => defaults.system_prompt,
        };

        Ok(Self {
            api_key: non_empty(&args.api_key),
            api_url: non_empty(&args.api_url).unwrap_or(defaults.api_url),
            model: non_empty(&args.model).unwrap_or(defaults.model),
            site_url: non_empty(&args.site_url),
            site_name: non_empty(&args.site_name),
            system_prompt,
            ..defaults
        })
    }

    /// True when `api_url` points at the default provider or one of its subdomains.
    pub fn is_default_provider(&self) -> bool {
        Url::parse(&self.api_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
            .map(|host| {
                host == DEFAULT_PROVIDER_HOST ||
                    host.ends_with(&format!(".{}", DEFAULT_PROVIDER_HOST))
            })
            .unwrap_or(false)
    }

    /// Attribution headers sent only to the default provider.
    pub fn site_headers(&self) -> Vec<(String, String)> {
        if !self.is_default_provider() {
            return Vec::new();
        }
        let mut headers = Vec::new();
        if let Some(site_url) = &self.site_url {
            headers.push(("HTTP-Referer".to_string(), site_url.clone()));
        }
        if let Some(site_name) = &self.site_name {
            headers.push(("X-Title".to_string(), site_name.clone()));
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serve_args() -> ServeArgs {
        ServeArgs {
            server_addr: "127.0.0.1:0".into(),
            api_key: None,
            api_url: None,
            model: None,
            site_url: None,
            site_name: None,
            system_prompt_path: None,
            tls_cert_path: None,
            tls_key_path: None,
            enable_tls: false,
        }
    }

    #[test]
    fn unset_values_fall_back_to_defaults() {
        let config = RelayConfig::from_args(&serve_args()).unwrap();
        assert_eq!(config.api_key, None);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.temperature, 0.5);
        assert_eq!(config.max_tokens, 260);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let mut args = serve_args();
        args.api_key = Some("   ".into());
        args.api_url = Some("".into());
        args.model = Some(" ".into());
        let config = RelayConfig::from_args(&args).unwrap();
        assert_eq!(config.api_key, None);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn overrides_are_used() {
        let mut args = serve_args();
        args.api_key = Some("sk-test".into());
        args.api_url = Some("http://localhost:11434/v1/chat/completions".into());
        args.model = Some("llama3".into());
        let config = RelayConfig::from_args(&args).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.api_url, "http://localhost:11434/v1/chat/completions");
        assert_eq!(config.model, "llama3");
    }

    #[test]
    fn site_headers_only_for_default_provider() {
        let mut config = RelayConfig {
            site_url: Some("https://example.com".into()),
            site_name: Some("Example".into()),
            ..RelayConfig::default()
        };
        assert_eq!(
            config.site_headers(),
            vec![
                ("HTTP-Referer".to_string(), "https://example.com".to_string()),
                ("X-Title".to_string(), "Example".to_string())
            ]
        );

        config.api_url = "https://api.groq.com/openai/v1/chat/completions".into();
        assert!(config.site_headers().is_empty());

        config.api_url = "https://openrouter.ai.evil.test/v1".into();
        assert!(!config.is_default_provider());
    }

    #[test]
    fn site_headers_skip_unset_values() {
        let config = RelayConfig {
            site_name: Some("Example".into()),
            ..RelayConfig::default()
        };
        assert_eq!(config.site_headers(), vec![("X-Title".to_string(), "Example".to_string())]);
    }
}
