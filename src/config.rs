use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    /// Resolution Service connection settings
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Editor behavior settings
    #[serde(default)]
    pub editor: EditorConfig,
}

/// Where and how inline queries are resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResolverConfig {
    /// URL the JSON request is POSTed to
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Transport timeout in milliseconds (default: none, wait indefinitely)
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:3000/api/resolve".to_string()
}

fn default_user_agent() -> String {
    format!("seemless/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_ms: None,
            user_agent: default_user_agent(),
        }
    }
}

/// Editor behavior settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EditorConfig {
    /// Number of earlier non-empty paragraphs sent as context (default: 5)
    #[serde(default = "default_preceding_block_limit")]
    pub preceding_block_limit: usize,

    /// Hint shown while the document is empty
    #[serde(default = "default_empty_document_hint")]
    pub empty_document_hint: String,

    /// Title given to new documents
    #[serde(default = "default_title")]
    pub default_title: String,
}

fn default_preceding_block_limit() -> usize {
    crate::query::context::DEFAULT_PRECEDING_LIMIT
}

fn default_empty_document_hint() -> String {
    "Type your first thought".to_string()
}

fn default_title() -> String {
    "Untitled".to_string()
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            preceding_block_limit: default_preceding_block_limit(),
            empty_document_hint: default_empty_document_hint(),
            default_title: default_title(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_config_path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|d| d.join("seemless").join("config.json"))
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let config: Config =
            serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults
    ///
    /// A file that exists but fails to load is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!(
                "No config at {}, using defaults",
                path.as_ref().display()
            );
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path.as_ref(), contents).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// JSON Schema describing the config file
    pub fn json_schema() -> Result<String, ConfigError> {
        let schema = schemars::schema_for!(Config);
        serde_json::to_string_pretty(&schema).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = url::Url::parse(&self.resolver.endpoint).map_err(|e| {
            ConfigError::ValidationError(format!(
                "resolver.endpoint '{}' is not a valid URL: {e}",
                self.resolver.endpoint
            ))
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::ValidationError(format!(
                "resolver.endpoint must use http or https, got '{}'",
                endpoint.scheme()
            )));
        }

        if self.resolver.timeout_ms == Some(0) {
            return Err(ConfigError::ValidationError(
                "resolver.timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.editor.preceding_block_limit == 0 {
            return Err(ConfigError::ValidationError(
                "editor.preceding_block_limit must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(msg) => write!(f, "IO error: {msg}"),
            ConfigError::ParseError(msg) => write!(f, "Parse error: {msg}"),
            ConfigError::SerializeError(msg) => write!(f, "Serialize error: {msg}"),
            ConfigError::ValidationError(msg) => write!(f, "Validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
