//! Service configuration.
//!
//! Settings come from a YAML file. Every field has a default, so an empty
//! file (or no file at all) yields a working configuration.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file names looked up in the working directory, in order.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["codexplain.yaml", ".codexplain.yaml"];

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted JSON body
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Settings for the chat-completions collaborator.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneratorConfig {
    /// Set to false to always answer from heuristics
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Pick a listed model when the configured one is not offered
    #[serde(default = "default_true")]
    pub auto_select_model: bool,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Replies this short or shorter are treated as no reply
    #[serde(default = "default_min_response_chars")]
    pub min_response_chars: usize,
    /// Ignore proxy environment variables
    #[serde(default = "default_true")]
    pub bypass_proxy: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_endpoint(),
            model: default_model(),
            auto_select_model: true,
            api_key_env: default_api_key_env(),
            timeout_ms: default_timeout_ms(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            min_response_chars: default_min_response_chars(),
            bypass_proxy: true,
        }
    }
}

impl GeneratorConfig {
    /// The API key from the configured environment variable, if set and non-empty.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, used when `RUST_LOG` is unset
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

fn default_endpoint() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_model() -> String {
    "compound-beta".to_string()
}

fn default_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_min_response_chars() -> usize {
    10
}

fn default_filter() -> String {
    "info".to_string()
}

impl Config {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a config from YAML text. Blank text gives the defaults.
    pub fn parse_str(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Load from `explicit` if given, else from the first discovered file,
    /// else the defaults. Returns the file actually used.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => discover(),
        };

        let config = match &path {
            Some(p) => Self::parse_file(p)?,
            None => Self::default(),
        };
        config.validate()?;

        Ok((config, path))
    }

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be non-zero".to_string()));
        }
        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_body_bytes must be non-zero".to_string(),
            ));
        }
        if self.generator.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "generator.timeout_ms must be non-zero".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.generator.temperature) {
            return Err(ConfigError::Invalid(format!(
                "generator.temperature {} is outside 0.0..=2.0",
                self.generator.temperature
            )));
        }
        Ok(())
    }
}

/// Find a config file in the working directory, then the user config dir.
pub fn discover() -> Option<PathBuf> {
    discover_in(Path::new(".")).or_else(|| {
        let dirs = ProjectDirs::from("", "", "codexplain")?;
        let path = dirs.config_dir().join(DEFAULT_CONFIG_NAMES[0]);
        path.is_file().then_some(path)
    })
}

/// Find a config file directly inside `dir`.
pub fn discover_in(dir: &Path) -> Option<PathBuf> {
    DEFAULT_CONFIG_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.generator.model, "compound-beta");
        assert_eq!(config.generator.api_key_env, "GROQ_API_KEY");
        assert_eq!(config.generator.min_response_chars, 10);
        assert_eq!(config.generator.max_tokens, 1024);
        assert!(config.generator.enabled);
        assert_eq!(config.logging.filter, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
server:
  port: 8080
generator:
  model: llama-3.1-8b-instant
  temperature: 0.7
"#;
        let config = Config::parse_str(yaml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.generator.model, "llama-3.1-8b-instant");
        assert!((config.generator.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.generator.timeout_ms, 30_000);
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = Config::parse_str("  \n").unwrap();
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.generator.temperature = 2.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.generator.timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.max_body_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_file_and_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("codexplain.yaml");
        std::fs::write(&path, "generator:\n  enabled: false\n").unwrap();

        let config = Config::parse_file(&path).unwrap();
        assert!(!config.generator.enabled);

        std::fs::write(&path, "server: [not, a, map]\n").unwrap();
        assert!(matches!(
            Config::parse_file(&path),
            Err(ConfigError::Parse { .. })
        ));

        assert!(matches!(
            Config::parse_file(dir.path().join("missing.yaml")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_load_explicit_validates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "server:\n  port: 0\n").unwrap();
        assert!(matches!(
            Config::load(Some(&path)),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_discover_in_prefers_first_name() {
        let dir = TempDir::new().unwrap();
        assert!(discover_in(dir.path()).is_none());

        std::fs::write(dir.path().join(".codexplain.yaml"), "").unwrap();
        assert_eq!(
            discover_in(dir.path()),
            Some(dir.path().join(".codexplain.yaml"))
        );

        std::fs::write(dir.path().join("codexplain.yaml"), "").unwrap();
        assert_eq!(
            discover_in(dir.path()),
            Some(dir.path().join("codexplain.yaml"))
        );
    }

    #[test]
    fn test_api_key_from_env() {
        let mut generator = GeneratorConfig::default();
        generator.api_key_env = "CODEXPLAIN_TEST_KEY_UNSET_9F2".to_string();
        assert!(generator.api_key().is_none());

        generator.api_key_env = "CODEXPLAIN_TEST_KEY_SET_9F2".to_string();
        std::env::set_var("CODEXPLAIN_TEST_KEY_SET_9F2", "secret");
        assert_eq!(generator.api_key().as_deref(), Some("secret"));
    }
}
