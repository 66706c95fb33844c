use serde::Deserialize;
use validator::Validate;

/// Main configuration for the Aramiyot service
#[derive(Debug, Deserialize, Validate, Clone)]
pub struct Config {
    /// HTTP server port
    #[validate(range(min = 1024, max = 65535))]
    pub server_port: u16,

    /// Database URL (SeaORM / SQLite) holding per-user board documents
    pub database_url: String,

    /// Base URL of the Gemini-compatible generative backend
    pub genai_base_url: String,

    /// Model used by every flow
    pub genai_model: String,

    /// API key sent to the generative backend; `None` for local gateways
    pub genai_api_key: Option<String>,

    /// Secret used to sign anonymous identity tokens
    #[validate(length(min = 32))]
    pub token_secret: String,

    /// Largest accepted request body, sized for inline image uploads
    #[validate(range(min = 1024))]
    pub max_request_bytes: usize,

    /// Requests per minute per client IP on the AI endpoints
    #[validate(range(min = 1))]
    pub ai_rate_limit_per_minute: u32,

    /// Whether permissive CORS is applied to the router
    pub cors_enabled: bool,

    /// Key rate limits on `x-forwarded-for`; only set behind a proxy that overwrites it
    pub trust_forwarded_for: bool,

    /// Log level (e.g., info, debug, trace)
    pub log_level: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration, reading `path` instead of `~/.aramiyot/config` when given.
    pub fn load_from(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let default_file = format!(
            "{}/.aramiyot/config",
            std::env::var("HOME").unwrap_or_else(|_| ".".to_string())
        );

        let settings = config::Config::builder()
            .set_default("server_port", 8080)?
            .set_default("database_url", "sqlite://aramiyot.db")?
            .set_default(
                "genai_base_url",
                "https://generativelanguage.googleapis.com/v1beta",
            )?
            .set_default("genai_model", "gemini-2.0-flash")?
            .set_default("max_request_bytes", 10 * 1024 * 1024)?
            .set_default("ai_rate_limit_per_minute", 30u32)?
            .set_default("cors_enabled", true)?
            .set_default("trust_forwarded_for", false)?
            .set_default("log_level", "info")?
            .add_source(config::File::with_name(path.unwrap_or(&default_file)).required(false))
            // Environment overrides: ARAMIYOT__SERVER_PORT, ARAMIYOT__TOKEN_SECRET, etc.
            .add_source(config::Environment::with_prefix("ARAMIYOT").separator("__"))
            .build()?;

        let cfg: Config = settings.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Default tracing directives when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> String {
        format!("aramiyot={},tower_http=info", self.log_level)
    }

    /// Endpoint prefix for a model, e.g. `{base}/models/gemini-2.0-flash`.
    pub fn model_endpoint(&self) -> String {
        format!(
            "{}/models/{}",
            self.genai_base_url.trim_end_matches('/'),
            self.genai_model
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8080,
            database_url: "sqlite::memory:".to_string(),
            genai_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            genai_model: "gemini-2.0-flash".to_string(),
            genai_api_key: None,
            token_secret: "change-me-change-me-change-me-change-me".to_string(),
            max_request_bytes: 10 * 1024 * 1024,
            ai_rate_limit_per_minute: 30,
            cors_enabled: true,
            trust_forwarded_for: false,
            log_level: "info".to_string(),
        }
    }
}
