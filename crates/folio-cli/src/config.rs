//! Configuration for the Folio CLI.
//!
//! [`FolioConfig`] loads from TOML files, environment variables, and defaults
//! using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `FOLIO_CONFIG` environment variable
//! 3. XDG default: `~/.config/folio/config.toml`
//! 4. Built-in defaults
//!
//! Environment variables `FOLIO_<SECTION>_<KEY>` overlay the file. confyg
//! passes env values as strings, so the overlay is meant for string fields
//! such as `FOLIO_EMBEDDING_API_KEY` or `FOLIO_STORE_DATA_DIR`.

use confyg::{Confygery, env};
use folio_core::{Error, Result};
use folio_llm::LlmConfig;
use folio_review::{RetrievalConfig, RevisionConfig};
use folio_vector::EmbeddingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const REDACTED: &str = "********";

// ============================================================================
// Configuration structs
// ============================================================================

/// Main configuration for the Folio CLI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    /// Embedding provider and gateway limits.
    pub embedding: EmbeddingConfig,

    /// Chat provider used for re-analysis.
    pub llm: LlmConfig,

    /// Retrieval limits.
    pub retrieval: RetrievalConfig,

    /// Re-analysis settings.
    pub revision: RevisionConfig,

    /// Snapshot storage.
    pub store: StoreConfig,
}

/// Snapshot storage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding the JSON snapshots. Defaults to the platform data
    /// directory (`~/.local/share/folio` on Linux).
    pub data_dir: Option<String>,

    /// How long to wait for another folio process to release the data
    /// directory, in seconds.
    pub lock_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            lock_timeout_secs: 30,
        }
    }
}

// ============================================================================
// Config loading
// ============================================================================

impl FolioConfig {
    /// Load configuration from file, environment, and defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path)
            && path.exists()
        {
            builder
                .add_file(&path.to_string_lossy())
                .map_err(|e| Error::config(format!("config file: {e}")))?;
        }

        let mut env_opts = env::Options::with_top_level("FOLIO");
        for section in ["embedding", "llm", "retrieval", "revision", "store"] {
            env_opts.add_section(section);
        }
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var("FOLIO_CONFIG") {
            return Some(PathBuf::from(path));
        }
        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("folio").join("config.toml"))
    }

    /// Directory holding the JSON snapshots.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.store.data_dir {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => dirs::data_dir()
                .map(|d| d.join("folio"))
                .ok_or_else(|| Error::config("Could not determine data directory for this platform")),
        }
    }

    /// A copy with credentials masked, for display.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.embedding.api_key.is_some() {
            config.embedding.api_key = Some(REDACTED.to_string());
        }
        if config.llm.api_key.is_some() {
            config.llm.api_key = Some(REDACTED.to_string());
        }
        config
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Flatten this config into environment variable pairs with `FOLIO_` prefix.
    pub fn to_env_vars(&self) -> Result<Vec<(String, String)>> {
        let value: toml::Value =
            toml::Value::try_from(self).map_err(|e| Error::config(e.to_string()))?;
        let mut vars = Vec::new();
        flatten_toml_value(&value, "FOLIO", &mut vars);
        Ok(vars)
    }
}

// ============================================================================
// Helper: flatten TOML to env vars
// ============================================================================

/// Recursively flatten a TOML value into `KEY=value` pairs.
fn flatten_toml_value(value: &toml::Value, prefix: &str, out: &mut Vec<(String, String)>) {
    match value {
        toml::Value::Table(table) => {
            for (key, val) in table {
                let env_key = format!("{}_{}", prefix, key.to_uppercase());
                flatten_toml_value(val, &env_key, out);
            }
        }
        toml::Value::Array(arr) => {
            if let Ok(json) = serde_json::to_string(arr) {
                out.push((prefix.to_string(), json));
            }
        }
        toml::Value::String(s) => out.push((prefix.to_string(), s.clone())),
        toml::Value::Integer(i) => out.push((prefix.to_string(), i.to_string())),
        toml::Value::Float(f) => out.push((prefix.to_string(), f.to_string())),
        toml::Value::Boolean(b) => out.push((prefix.to_string(), b.to_string())),
        toml::Value::Datetime(dt) => out.push((prefix.to_string(), dt.to_string())),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_folio_config_default() {
        let config = FolioConfig::default();
        assert!(config.embedding.api_key.is_none());
        assert_eq!(config.embedding.timeout_ms, 15_000);
        assert_eq!(config.revision.timeout_secs, 120);
        assert_eq!(config.retrieval.max_top_k, 20);
        assert!(config.store.data_dir.is_none());
        assert_eq!(config.store.lock_timeout_secs, 30);
    }

    #[test]
    fn test_folio_config_from_toml() {
        let toml_str = r#"
            [embedding]
            api_key = "sk-embed"
            dimension = 256

            [llm]
            model = "gpt-4o"

            [retrieval]
            max_top_k = 10

            [store]
            data_dir = "/var/lib/folio"
        "#;

        let config: FolioConfig = toml::from_str(toml_str).unwrap();
        assert!(config.embedding.is_configured());
        assert_eq!(config.embedding.dimension, 256);
        assert_eq!(config.embedding.model, "text-embedding-3-small");
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.retrieval.max_top_k, 10);
        assert_eq!(config.retrieval.min_top_k, 1);
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/var/lib/folio"));
    }

    #[test]
    fn test_folio_config_to_toml_round_trip() {
        let config = FolioConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("[embedding]"));
        assert!(toml_str.contains("[revision]"));

        let parsed: FolioConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_folio_config_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
                [llm]
                model = "local-model"
                [store]
                data_dir = "/tmp/folio-data"
            "#,
        )
        .unwrap();

        let config = FolioConfig::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.llm.model, "local-model");
        assert_eq!(config.store.data_dir.as_deref(), Some("/tmp/folio-data"));
    }

    #[test]
    fn test_folio_config_load_defaults() {
        let config = FolioConfig::load(Some("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.embedding.dimension, 1536);
    }

    #[test]
    fn test_resolve_config_path_explicit() {
        let path = FolioConfig::resolve_config_path(Some("/explicit/config.toml"));
        assert_eq!(path, Some(PathBuf::from("/explicit/config.toml")));
    }

    #[test]
    fn test_default_config_path_shape() {
        if let Some(p) = FolioConfig::default_config_path() {
            assert!(p.ends_with("folio/config.toml"));
        }
    }

    #[test]
    fn test_redacted_masks_keys() {
        let mut config = FolioConfig::default();
        config.embedding.api_key = Some("sk-secret".into());

        let shown = config.redacted();
        assert_eq!(shown.embedding.api_key.as_deref(), Some(REDACTED));
        assert!(shown.llm.api_key.is_none());
        assert!(!shown.to_toml_string().unwrap().contains("sk-secret"));
    }

    #[test]
    fn test_to_env_vars() {
        let config = FolioConfig::default();
        let map: HashMap<_, _> = config.to_env_vars().unwrap().into_iter().collect();
        assert_eq!(map.get("FOLIO_LLM_MODEL").unwrap(), "gpt-4o-mini");
        assert_eq!(map.get("FOLIO_EMBEDDING_DIMENSION").unwrap(), "1536");
        assert_eq!(map.get("FOLIO_RETRIEVAL_MAX_TOP_K").unwrap(), "20");
    }

    #[test]
    fn test_folio_config_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FolioConfig>();
    }
}
