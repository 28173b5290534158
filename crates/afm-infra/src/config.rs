//! Configuration loader for the `afm` binary.
//!
//! Looks for `afm.toml` in this order: the `AFM_CONFIG` path, the agent
//! file's directory, then `{config_dir}/afm/afm.toml`. Falls back to
//! defaults when no file exists or the file is malformed.

use std::path::{Path, PathBuf};

use afm_types::config::AfmConfig;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "AFM_CONFIG";

/// Config file name looked up next to the agent file.
pub const CONFIG_FILE_NAME: &str = "afm.toml";

/// Pick the config file to read for `agent_path`.
///
/// An explicit override is returned even if it does not exist, so that the
/// loader can report it.
pub fn resolve_config_path(agent_path: &Path, explicit: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path);
    }

    let beside_agent = agent_path
        .parent()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .filter(|p| p.is_file());
    if beside_agent.is_some() {
        return beside_agent;
    }

    dirs::config_dir()
        .map(|dir| dir.join("afm").join(CONFIG_FILE_NAME))
        .filter(|p| p.is_file())
}

/// Load configuration for the agent at `agent_path`.
pub async fn load_config(agent_path: &Path) -> AfmConfig {
    let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    match resolve_config_path(agent_path, explicit) {
        Some(path) => load_config_file(&path).await,
        None => {
            tracing::debug!("no {CONFIG_FILE_NAME} found, using defaults");
            AfmConfig::default()
        }
    }
}

/// Load configuration from `path`.
///
/// - Missing file: defaults.
/// - Unreadable or unparsable file: a warning, then defaults.
pub async fn load_config_file(path: &Path) -> AfmConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("config file {} not found, using defaults", path.display());
            return AfmConfig::default();
        }
        Err(err) => {
            tracing::warn!("failed to read {}: {err}, using defaults", path.display());
            return AfmConfig::default();
        }
    };

    match toml::from_str::<AfmConfig>(&content) {
        Ok(config) => {
            tracing::debug!("loaded configuration from {}", path.display());
            config
        }
        Err(err) => {
            tracing::warn!("failed to parse {}: {err}, using defaults", path.display());
            AfmConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_config_file_missing_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config_file(&tmp.path().join("afm.toml")).await;
        assert_eq!(config, AfmConfig::default());
    }

    #[tokio::test]
    async fn load_config_file_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("afm.toml");
        tokio::fs::write(
            &path,
            r#"
[server]
port = 9090

[websub]
max_attempts = 5
retry_delay_secs = 1
"#,
        )
        .await
        .unwrap();

        let config = load_config_file(&path).await;
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.websub.max_attempts, 5);
        assert_eq!(config.websub.retry_delay_secs, 1);
        assert!(config.webhook.verify_signatures);
    }

    #[tokio::test]
    async fn load_config_file_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("afm.toml");
        tokio::fs::write(&path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config_file(&path).await;
        assert_eq!(config, AfmConfig::default());
    }

    #[test]
    fn resolve_prefers_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let agent = tmp.path().join("agent.afm.md");
        std::fs::write(tmp.path().join("afm.toml"), "").unwrap();

        let explicit = tmp.path().join("custom.toml");
        let resolved = resolve_config_path(&agent, Some(explicit.clone()));
        assert_eq!(resolved, Some(explicit));
    }

    #[test]
    fn resolve_finds_file_beside_agent() {
        let tmp = TempDir::new().unwrap();
        let agent = tmp.path().join("agent.afm.md");
        std::fs::write(tmp.path().join("afm.toml"), "").unwrap();

        let resolved = resolve_config_path(&agent, None);
        assert_eq!(resolved, Some(tmp.path().join("afm.toml")));
    }
}
