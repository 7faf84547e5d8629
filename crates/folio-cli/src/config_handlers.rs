//! Handlers for `folio config {path,init,show}`.
//!
//! These run before any service is opened, so they take the raw `--config`
//! path rather than a loaded config.

use crate::cli::ConfigAction;
use crate::config::FolioConfig;
use folio_core::{Error, Result};
use std::path::{Path, PathBuf};

/// Handle a config subcommand, printing its output.
pub fn handle_config_command(config_path: Option<&str>, action: ConfigAction) -> Result<()> {
    let output = match action {
        ConfigAction::Path => {
            let path = cmd_config_path(config_path)?;
            if !path.exists() {
                eprintln!("(file does not exist, run `folio config init` to create it)");
            }
            path.display().to_string()
        }
        ConfigAction::Init { file, force } => {
            let path = cmd_config_init(file.as_deref(), force)?;
            format!("Config file created at {}", path.display())
        }
        ConfigAction::Show { env } => cmd_config_show(&FolioConfig::load(config_path)?, env)?,
    };
    println!("{output}");
    Ok(())
}

/// The config file path that would be read.
fn cmd_config_path(config_path: Option<&str>) -> Result<PathBuf> {
    FolioConfig::resolve_config_path(config_path)
        .ok_or_else(|| Error::config("Could not determine config directory for this platform"))
}

/// Write a default config file and return where it went.
fn cmd_config_init(file: Option<&str>, force: bool) -> Result<PathBuf> {
    let path = match file {
        Some(p) => PathBuf::from(p),
        None => FolioConfig::default_config_path()
            .ok_or_else(|| Error::config("Could not determine config directory"))?,
    };
    write_default_config(&path, force)?;
    Ok(path)
}

fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
    }
    let toml_str = FolioConfig::default().to_toml_string()?;
    std::fs::write(path, toml_str).map_err(|e| Error::io_with_path(e, path))?;
    log::info!("Wrote default config to {}", path.display());
    Ok(())
}

/// The effective config with credentials masked, as TOML or `KEY=value` lines.
fn cmd_config_show(config: &FolioConfig, env: bool) -> Result<String> {
    let shown = config.redacted();
    if env {
        let lines: Vec<String> = shown
            .to_env_vars()?
            .into_iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        Ok(lines.join("\n"))
    } else {
        shown.to_toml_string()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_explicit() {
        let path = cmd_config_path(Some("/etc/folio.toml")).unwrap();
        assert_eq!(path, PathBuf::from("/etc/folio.toml"));
    }

    #[test]
    fn test_config_init_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let written = cmd_config_init(Some(path.to_str().unwrap()), false).unwrap();
        assert_eq!(written, path);

        let parsed: FolioConfig = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, FolioConfig::default());
    }

    #[test]
    fn test_config_init_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "# mine").unwrap();

        let err = cmd_config_init(Some(path.to_str().unwrap()), false).unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine");

        cmd_config_init(Some(path.to_str().unwrap()), true).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("[llm]"));
    }

    #[test]
    fn test_config_show_masks_credentials() {
        let mut config = FolioConfig::default();
        config.llm.api_key = Some("sk-live".into());

        let toml_out = cmd_config_show(&config, false).unwrap();
        assert!(toml_out.contains("[llm]"));
        assert!(!toml_out.contains("sk-live"));

        let env_out = cmd_config_show(&config, true).unwrap();
        assert!(env_out.contains("FOLIO_LLM_MODEL=gpt-4o-mini"));
        assert!(!env_out.contains("sk-live"));
    }
}
