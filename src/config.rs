use log::warn;
use std::env;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_FALLBACK_TEXT: &str =
    "I'm a helpful AI assistant. Please configure your Gemini API key to enable full functionality.";
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 2] = ["https://www.lilitools.com", "https://lilitools.com"];

/// Shape of a successful `/api/ai` response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// `{ "text": "..." }`
    Text,
    /// `{ "candidates": [{ "content": { "parts": [{ "text": "..." }] } }] }`
    Candidates,
}

impl ResponseFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Some(ResponseFormat::Text),
            "candidates" => Some(ResponseFormat::Candidates),
            _ => None,
        }
    }
}

/// Settings for the generative-language backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    /// Refuse to start without an API key instead of serving the fallback text.
    pub require_api_key: bool,
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub backend: BackendConfig,
    pub response_format: ResponseFormat,
    pub fallback_text: String,
    pub static_dir: String,
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values are treated as unset
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get("API_KEY").or_else(|| get("GEMINI_API_KEY"));

        let port = parse_or_default(get("PORT"), "PORT", DEFAULT_PORT);
        let timeout_secs = match parse_or_default(
            get("BACKEND_TIMEOUT_SECS"),
            "BACKEND_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        ) {
            0 => {
                warn!("BACKEND_TIMEOUT_SECS must be positive, using {}", DEFAULT_TIMEOUT_SECS);
                DEFAULT_TIMEOUT_SECS
            }
            secs => secs,
        };

        let response_format = match get("RESPONSE_FORMAT") {
            Some(raw) => ResponseFormat::parse(&raw).unwrap_or_else(|| {
                warn!("Unknown RESPONSE_FORMAT '{}', using 'text'", raw);
                ResponseFormat::Text
            }),
            None => ResponseFormat::Text,
        };

        let require_api_key = get("REQUIRE_API_KEY")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let allowed_origins = match get("ALLOWED_ORIGINS") {
            Some(list) => list
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            None => DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            backend: BackendConfig {
                api_key,
                model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                base_url: get("GEMINI_API_BASE_URL")
                    .map(|u| u.trim_end_matches('/').to_string())
                    .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
                timeout: Duration::from_secs(timeout_secs),
                require_api_key,
            },
            response_format,
            fallback_text: get("FALLBACK_TEXT").unwrap_or_else(|| DEFAULT_FALLBACK_TEXT.to_string()),
            static_dir: get("STATIC_DIR").unwrap_or_else(|| "./public".to_string()),
            allowed_origins,
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or_default<T: std::str::FromStr + Copy + std::fmt::Display>(
    raw: Option<String>,
    key: &str,
    default: T,
) -> T {
    match raw {
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid {} '{}', using {}", key, value, default);
            default
        }),
        None => default,
    }
}
