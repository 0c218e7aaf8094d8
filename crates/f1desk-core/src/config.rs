use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AppError, Result};

/// Top-level configuration for the f1desk service.
///
/// Loaded from `~/.f1desk/config.toml` by default. Credentials are usually
/// left out of the file and supplied through environment variables instead
/// (see [`F1DeskConfig::apply_env_overrides`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct F1DeskConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub intent: IntentConfig,
    #[serde(default)]
    pub generative: GenerativeConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl F1DeskConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: F1DeskConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// `OPENAI_API_KEY` takes precedence over `XAI_API_KEY`. An xAI key also
    /// points the responder at xAI unless the file chose another endpoint or
    /// model. Empty values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(port) = get("F1DESK_PORT").and_then(|v| v.parse::<u16>().ok()) {
            self.general.port = port;
        }
        if let Some(key) = get("OPENAI_API_KEY") {
            self.generative.api_key = Some(key);
        } else if let Some(key) = get("XAI_API_KEY") {
            // An xAI key only works against xAI; keep endpoints set in the file.
            if self.generative.base_url == OPENAI_BASE_URL {
                self.generative.base_url = XAI_BASE_URL.to_string();
            }
            if self.generative.model == OPENAI_MODEL {
                self.generative.model = XAI_MODEL.to_string();
            }
            self.generative.api_key = Some(key);
        }
        if let Some(project) = get("GOOGLE_CLOUD_PROJECT_ID") {
            self.intent.project_id = Some(project);
        }
        if let Some(token) = get("DIALOGFLOW_ACCESS_TOKEN") {
            self.intent.access_token = Some(token);
        }
        if let Some(token) = get("F1DESK_ADMIN_TOKEN") {
            self.api.admin_token = Some(token);
        }
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.chat.confidence_threshold) {
            return Err(AppError::Config(format!(
                "chat.confidence_threshold must be within [0, 1], got {}",
                self.chat.confidence_threshold
            )));
        }
        if self.chat.stage_timeout_secs == 0 {
            return Err(AppError::Config(
                "chat.stage_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.chat.max_message_length == 0 {
            return Err(AppError::Config(
                "chat.max_message_length must be greater than zero".to_string(),
            ));
        }
        if self
            .api
            .admin_token
            .as_deref()
            .is_some_and(|t| t.trim().is_empty())
        {
            return Err(AppError::Config(
                "api.admin_token must not be empty; remove it to generate one".to_string(),
            ));
        }
        if !["memory", "sqlite"].contains(&self.storage.backend.as_str()) {
            return Err(AppError::Config(format!(
                "storage.backend must be 'memory' or 'sqlite', got '{}'",
                self.storage.backend
            )));
        }
        Ok(())
    }
}

/// General service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Address the HTTP server binds to.
    pub host: String,
    /// HTTP server port.
    pub port: u16,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            log_level: "info".to_string(),
        }
    }
}

/// Backing store selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// "memory" or "sqlite".
    pub backend: String,
    /// Database file used by the sqlite backend.
    pub sqlite_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            sqlite_path: "~/.f1desk/f1desk.db".to_string(),
        }
    }
}

/// Response pipeline tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Longest accepted message, in characters.
    pub max_message_length: usize,
    /// Per-stage deadline for external calls.
    pub stage_timeout_secs: u64,
    /// Classifier answers are used only above this confidence.
    pub confidence_threshold: f32,
    /// Enable the whole-word keyword scan after the substring scan misses.
    pub keyword_fallback: bool,
    /// Pass matching reference passages to the generative responder.
    pub reference_context: bool,
    /// Sessions idle longer than this are dropped by the sweeper.
    pub session_idle_minutes: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_length: 2000,
            stage_timeout_secs: 20,
            confidence_threshold: 0.7,
            keyword_fallback: true,
            reference_context: true,
            session_idle_minutes: 60,
        }
    }
}

/// Intent-detection service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentConfig {
    pub enabled: bool,
    pub base_url: String,
    pub project_id: Option<String>,
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    pub language_code: String,
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://dialogflow.googleapis.com/v2".to_string(),
            project_id: None,
            access_token: None,
            language_code: "en-US".to_string(),
        }
    }
}

impl IntentConfig {
    /// True when the classifier can be constructed.
    pub fn is_usable(&self) -> bool {
        self.enabled
            && self.project_id.as_deref().is_some_and(|p| !p.is_empty())
            && self.access_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OPENAI_MODEL: &str = "gpt-3.5-turbo";
const XAI_BASE_URL: &str = "https://api.x.ai/v1";
const XAI_MODEL: &str = "grok-2-1212";

/// Generative responder settings (any OpenAI-compatible endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerativeConfig {
    pub enabled: bool,
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerativeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: OPENAI_BASE_URL.to_string(),
            api_key: None,
            model: OPENAI_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 500,
        }
    }
}

impl GenerativeConfig {
    /// True when the responder can be constructed.
    pub fn is_usable(&self) -> bool {
        self.enabled && self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// HTTP surface settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Bearer token for write routes. Generated at startup when absent.
    #[serde(skip_serializing)]
    pub admin_token: Option<String>,
    /// Requests per second across rate-limited routes.
    pub rate_limit_per_sec: u64,
    /// Extra CORS origins besides localhost on the configured port.
    pub allowed_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            admin_token: None,
            rate_limit_per_sec: 50,
            allowed_origins: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = F1DeskConfig::default();
        assert_eq!(config.general.port, 5000);
        assert_eq!(config.storage.backend, "memory");
        assert!((config.chat.confidence_threshold - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.generative.max_tokens, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: F1DeskConfig = toml::from_str(
            r#"
            [general]
            port = 8080

            [chat]
            keyword_fallback = false
            "#,
        )
        .unwrap();
        assert_eq!(config.general.port, 8080);
        assert_eq!(config.general.host, "127.0.0.1");
        assert!(!config.chat.keyword_fallback);
        assert_eq!(config.chat.max_message_length, 2000);
    }

    #[test]
    fn test_save_and_load_roundtrip_omits_secrets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = F1DeskConfig::default();
        config.general.port = 9000;
        config.generative.api_key = Some("sk-secret".to_string());
        config.save(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("sk-secret"));

        let loaded = F1DeskConfig::load(&path).unwrap();
        assert_eq!(loaded.general.port, 9000);
        assert!(loaded.generative.api_key.is_none());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = F1DeskConfig::load_or_default(&dir.path().join("absent.toml"));
        assert_eq!(config.general.port, 5000);
    }

    #[test]
    fn test_load_invalid_toml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[general\nport = ").unwrap();
        assert!(matches!(F1DeskConfig::load(&path), Err(AppError::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("F1DESK_PORT", "7070"),
            ("XAI_API_KEY", "xai-key"),
            ("GOOGLE_CLOUD_PROJECT_ID", "visa-bot"),
            ("DIALOGFLOW_ACCESS_TOKEN", "ya29.token"),
            ("F1DESK_ADMIN_TOKEN", "admin"),
        ]
        .into_iter()
        .collect();

        let mut config = F1DeskConfig::default();
        config.apply_env_with(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.general.port, 7070);
        assert_eq!(config.generative.api_key.as_deref(), Some("xai-key"));
        assert!(config.generative.is_usable());
        assert!(config.intent.is_usable());
        assert_eq!(config.api.admin_token.as_deref(), Some("admin"));
    }

    #[test]
    fn test_openai_key_wins_over_xai() {
        let mut config = F1DeskConfig::default();
        config.apply_env_with(|k| match k {
            "OPENAI_API_KEY" => Some("openai".to_string()),
            "XAI_API_KEY" => Some("xai".to_string()),
            _ => None,
        });
        assert_eq!(config.generative.api_key.as_deref(), Some("openai"));
    }

    #[test]
    fn test_xai_key_selects_xai_endpoint() {
        let mut config = F1DeskConfig::default();
        config.apply_env_with(|k| (k == "XAI_API_KEY").then(|| "xai-abc".to_string()));
        assert_eq!(config.generative.api_key.as_deref(), Some("xai-abc"));
        assert_eq!(config.generative.base_url, "https://api.x.ai/v1");
        assert_eq!(config.generative.model, "grok-2-1212");
    }

    #[test]
    fn test_xai_key_keeps_endpoint_from_file() {
        let mut config: F1DeskConfig = toml::from_str(
            r#"
            [generative]
            base_url = "https://gateway.example.edu/v1"
            model = "grok-beta"
            "#,
        )
        .unwrap();
        config.apply_env_with(|k| (k == "XAI_API_KEY").then(|| "xai-abc".to_string()));
        assert_eq!(config.generative.base_url, "https://gateway.example.edu/v1");
        assert_eq!(config.generative.model, "grok-beta");
    }

    #[test]
    fn test_openai_key_keeps_openai_endpoint() {
        let mut config = F1DeskConfig::default();
        config.apply_env_with(|k| match k {
            "OPENAI_API_KEY" => Some("sk-1".to_string()),
            "XAI_API_KEY" => Some("xai-1".to_string()),
            _ => None,
        });
        assert_eq!(config.generative.base_url, "https://api.openai.com/v1");
        assert_eq!(config.generative.model, "gpt-3.5-turbo");
    }

    #[test]
    fn test_validate_rejects_empty_admin_token() {
        let config: F1DeskConfig = toml::from_str(
            r#"
            [api]
            admin_token = ""
            "#,
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        let mut config = F1DeskConfig::default();
        config.api.admin_token = Some("   ".to_string());
        assert!(config.validate().is_err());
        config.api.admin_token = Some("s3cret".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_ignores_empty_and_bad_port() {
        let mut config = F1DeskConfig::default();
        config.apply_env_with(|k| match k {
            "F1DESK_PORT" => Some("not-a-port".to_string()),
            "OPENAI_API_KEY" => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.general.port, 5000);
        assert!(config.generative.api_key.is_none());
        assert!(!config.generative.is_usable());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = F1DeskConfig::default();
        config.chat.confidence_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = F1DeskConfig::default();
        config.chat.stage_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = F1DeskConfig::default();
        config.storage.backend = "postgres".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_disabled_services_not_usable() {
        let mut config = F1DeskConfig::default();
        config.generative.api_key = Some("k".to_string());
        config.generative.enabled = false;
        assert!(!config.generative.is_usable());
        assert!(!config.intent.is_usable());
    }
}
