use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CollectiveConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub cache_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GenerationConfig {
    pub provider: String,
    pub model: String,
    pub cache_dir: String,
    pub max_new_tokens: usize,
    pub temperature: f32,
    pub top_k: usize,
    pub top_p: f32,
    pub system_prompt: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of documents pulled into the chat context.
    pub context_results: usize,
    /// Contributions shorter than this (after trimming) are rejected.
    pub min_contribution_chars: usize,
    /// Contributions longer than this are rejected.
    pub max_contribution_chars: usize,
}

impl Default for CollectiveConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            embedding: EmbeddingConfig::default(),
            generation: GenerationConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_collective_dir()
            .join("collective_memory.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let cache_dir = default_collective_dir()
            .join("models/embedding")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "local".into(),
            model: "all-MiniLM-L6-v2".into(),
            cache_dir,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let cache_dir = default_collective_dir()
            .join("models/generator")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "local".into(),
            model: "TinyLlama-1.1B-Chat-v1.0".into(),
            cache_dir,
            max_new_tokens: 300,
            temperature: 0.7,
            top_k: 50,
            top_p: 0.95,
            system_prompt: "You are Collective AI, a wise assistant. Use the provided \
                            Context from the community to answer the user."
                .into(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            context_results: 2,
            min_contribution_chars: 10,
            max_contribution_chars: 10_000,
        }
    }
}

/// Returns `~/.collective/`
pub fn default_collective_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".collective")
}

/// Returns the default config file path: `~/.collective/config.toml`
pub fn default_config_path() -> PathBuf {
    default_collective_dir().join("config.toml")
}

impl CollectiveConfig {
    /// Load config from the default path, with env var overrides applied.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, with env var overrides applied.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse the TOML file at `path`; defaults when the file does not exist.
    ///
    /// Env overrides are a separate step
    /// ([`apply_env_overrides`](Self::apply_env_overrides)) so startup can
    /// bring up logging in between and the override warnings are not lost.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).context("failed to read config file")?;
        toml::from_str(&contents).context("failed to parse config TOML")
    }

    /// Apply environment variable overrides (COLLECTIVE_DB, COLLECTIVE_PORT,
    /// COLLECTIVE_LOG_LEVEL).
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("COLLECTIVE_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("COLLECTIVE_PORT") {
            match val.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %val, "ignoring invalid COLLECTIVE_PORT"),
            }
        }
        if let Ok(val) = std::env::var("COLLECTIVE_LOG_LEVEL") {
            self.server.log_level = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = CollectiveConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.retrieval.context_results, 2);
        assert_eq!(config.retrieval.min_contribution_chars, 10);
        assert_eq!(config.generation.max_new_tokens, 300);
        assert!((config.generation.temperature - 0.7).abs() < f32::EPSILON);
        assert!(config.storage.db_path.ends_with("collective_memory.db"));
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[server]
port = 8080
log_level = "debug"

[storage]
db_path = "/tmp/test.db"

[generation]
temperature = 0.2
max_new_tokens = 64

[retrieval]
context_results = 5
"#;
        let config: CollectiveConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.storage.db_path, "/tmp/test.db");
        assert!((config.generation.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.generation.max_new_tokens, 64);
        assert_eq!(config.retrieval.context_results, 5);
        // defaults still apply for unset fields
        assert_eq!(config.generation.top_k, 50);
        assert_eq!(config.retrieval.min_contribution_chars, 10);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = CollectiveConfig::default();
        std::env::set_var("COLLECTIVE_DB", "/tmp/override.db");
        std::env::set_var("COLLECTIVE_PORT", "4001");
        std::env::set_var("COLLECTIVE_LOG_LEVEL", "trace");

        config.apply_env_overrides();

        assert_eq!(config.storage.db_path, "/tmp/override.db");
        assert_eq!(config.server.port, 4001);
        assert_eq!(config.server.log_level, "trace");

        // load_file alone must not consume the environment; overrides are a
        // separate step so startup can initialize logging in between
        let fresh = CollectiveConfig::load_file("/nonexistent/collective.toml").unwrap();
        assert_eq!(fresh.server.port, 3000);
        assert_eq!(fresh.server.log_level, "info");

        // An unparseable port must leave the previous value in place
        std::env::set_var("COLLECTIVE_PORT", "not-a-port");
        config.apply_env_overrides();
        assert_eq!(config.server.port, 4001);

        // Clean up
        std::env::remove_var("COLLECTIVE_DB");
        std::env::remove_var("COLLECTIVE_PORT");
        std::env::remove_var("COLLECTIVE_LOG_LEVEL");
    }

    #[test]
    fn expand_tilde_replaces_home() {
        let expanded = expand_tilde("~/foo/bar.db");
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().ends_with("foo/bar.db"));
        assert_eq!(expand_tilde("/abs/path.db"), PathBuf::from("/abs/path.db"));
    }
}
