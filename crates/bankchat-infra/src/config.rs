//! Configuration loader for BankChat.
//!
//! Reads a TOML file into [`BankChatConfig`]. Falls back to the defaults
//! when the file is missing or malformed, so the server always starts.

use std::path::{Path, PathBuf};

use bankchat_types::config::BankChatConfig;

/// `{config_dir}/bankchat/config.toml`, or `config.toml` in the working
/// directory when the platform has no config dir.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("bankchat").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

/// Load configuration from `path`.
///
/// - If the file does not exist, returns [`BankChatConfig::default()`].
/// - If the file cannot be read or parsed, logs a warning and returns the default.
pub async fn load_config(path: &Path) -> BankChatConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config found at {}, using defaults", path.display());
            return BankChatConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return BankChatConfig::default();
        }
    };

    match toml::from_str::<BankChatConfig>(&content) {
        Ok(config) => {
            tracing::debug!("Loaded config from {}", path.display());
            config
        }
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            BankChatConfig::default()
        }
    }
}

/// Render a configuration back to TOML.
pub fn render_config(config: &BankChatConfig) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("config.toml")).await;
        assert_eq!(config, BankChatConfig::default());
    }

    #[tokio::test]
    async fn valid_toml_is_parsed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        tokio::fs::write(
            &path,
            r#"
[server]
port = 9000

[sessions]
max_active = 2

[generator]
url = "http://ollama:11434/api/generate"
model = "mistral"
"#,
        )
        .await
        .unwrap();

        let config = load_config(&path).await;
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.sessions.max_active, 2);
        assert_eq!(config.sessions.ttl_secs, 86_400);
        assert_eq!(config.generator.model, "mistral");
    }

    #[tokio::test]
    async fn invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        tokio::fs::write(&path, "this is not { valid toml !!!").await.unwrap();

        assert_eq!(load_config(&path).await, BankChatConfig::default());
    }

    #[tokio::test]
    async fn directory_in_place_of_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(load_config(tmp.path()).await, BankChatConfig::default());
    }

    #[test]
    fn rendered_config_parses_back() {
        let mut config = BankChatConfig::default();
        config.intent.execution_threshold = 0.8;
        let rendered = render_config(&config).unwrap();
        let parsed: BankChatConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn default_path_ends_in_config_toml() {
        assert!(default_config_path().ends_with("config.toml"));
    }
}
