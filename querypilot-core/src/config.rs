//! Pipeline configuration sourced from the environment.
//!
//! Configuration is read once at startup via [`PipelineConfig::from_env`]
//! and is immutable afterwards; nothing in the pipeline reads the
//! environment again. A local `.env` file is honored when present.
//!
//! # Security
//! The admin credential and the LLM API key live in [`zeroize`]-backed
//! containers and are cleared from memory on drop. Neither appears in
//! `Debug` output, logs, or serialized form.

use zeroize::Zeroizing;

use crate::error::{QueryPilotError, Result};

/// Environment variable holding the database connection URL.
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
/// Environment variable holding the admin credential.
pub const ADMIN_CREDENTIAL_VAR: &str = "ADMIN_CREDENTIAL";
/// Environment variable holding the LLM API key.
pub const LLM_API_KEY_VAR: &str = "LLM_API_KEY";
/// Environment variable overriding the chat-completions endpoint.
pub const LLM_BASE_URL_VAR: &str = "LLM_BASE_URL";
/// Environment variable overriding the model identifier.
pub const LLM_MODEL_VAR: &str = "LLM_MODEL";

const DEFAULT_LLM_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_LLM_MODEL: &str = "google/gemini-2.0-flash-001";

/// Reference credential the validator and executor compare against.
///
/// Stored in a [`Zeroizing`] container so the secret is cleared from memory
/// on drop. Comparison is exact string equality; there is no hashing layer
/// because the credential is a shared operator secret, not a user password
/// database.
///
/// # Example
///
/// ```rust
/// use querypilot_core::config::AdminCredential;
///
/// let credential = AdminCredential::new("s3cret".to_string());
/// assert!(credential.matches("s3cret"));
/// assert!(!credential.matches("S3CRET"));
/// assert_eq!(format!("{credential:?}"), "AdminCredential(<redacted>)");
/// ```
#[derive(Clone)]
pub struct AdminCredential {
    secret: Zeroizing<String>,
}

impl AdminCredential {
    /// Wraps a secret in zeroize-on-drop storage.
    pub fn new(secret: String) -> Self {
        Self {
            secret: Zeroizing::new(secret),
        }
    }

    /// True when the supplied credential exactly equals the configured one.
    pub fn matches(&self, supplied: &str) -> bool {
        self.secret.as_str() == supplied
    }
}

impl std::fmt::Debug for AdminCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AdminCredential(<redacted>)")
    }
}

/// Connection settings for the chat-completions endpoint used to turn
/// questions into SQL.
#[derive(Clone)]
pub struct LlmConfig {
    /// API key sent as a bearer token. Zeroized on drop.
    api_key: Zeroizing<String>,
    /// Endpoint base, without the `/chat/completions` suffix.
    pub base_url: String,
    /// Model identifier passed in the request payload.
    pub model: String,
}

impl LlmConfig {
    /// Creates a config with the default endpoint and model.
    pub fn new(api_key: String) -> Self {
        Self {
            api_key: Zeroizing::new(api_key),
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
        }
    }

    /// Bearer token for the Authorization header.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Full URL of the chat-completions endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

/// Immutable configuration for one pipeline instance.
///
/// Built once at startup; stages borrow from it and never mutate it.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Database connection URL. Redact with
    /// [`crate::error::redact_database_url`] before logging.
    pub database_url: String,
    /// Reference admin credential for the validation and execution gates.
    pub admin_credential: AdminCredential,
    /// LLM endpoint settings.
    pub llm: LlmConfig,
}

impl PipelineConfig {
    /// Builds the configuration from the process environment.
    ///
    /// A `.env` file in the working directory is loaded first when present
    /// (existing process variables win over file entries). Startup fails
    /// hard when any required variable is missing, naming the variable but
    /// never echoing a value.
    ///
    /// # Errors
    /// Returns [`QueryPilotError::Configuration`] when `DATABASE_URL`,
    /// `ADMIN_CREDENTIAL`, or `LLM_API_KEY` is unset or empty.
    pub fn from_env() -> Result<Self> {
        // Missing .env is the normal deployed case, not an error.
        let _ = dotenvy::dotenv();

        let database_url = require_var(DATABASE_URL_VAR)?;
        let admin_credential = AdminCredential::new(require_var(ADMIN_CREDENTIAL_VAR)?);

        let mut llm = LlmConfig::new(require_var(LLM_API_KEY_VAR)?);
        if let Ok(base_url) = std::env::var(LLM_BASE_URL_VAR) {
            if !base_url.trim().is_empty() {
                llm.base_url = base_url;
            }
        }
        if let Ok(model) = std::env::var(LLM_MODEL_VAR) {
            if !model.trim().is_empty() {
                llm.model = model;
            }
        }

        Ok(Self {
            database_url,
            admin_credential,
            llm,
        })
    }
}

fn require_var(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(QueryPilotError::configuration(format!(
            "required environment variable {name} is not set"
        ))),
    }
}
