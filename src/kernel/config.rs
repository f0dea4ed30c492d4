//! `factotum.toml` configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactotumConfig {
    pub logging: LoggingConfig,
    pub http: HttpConfig,
    pub crypto: CryptoConfig,
    pub github: GithubConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Append-only task log
    pub file: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("factotum.log"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("factotum/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    pub api_base: String,
    /// Quote currency passed to CoinGecko as `vs_currencies`
    pub currency: String,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.coingecko.com/api/v3".to_string(),
            currency: "cad".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub api_base: String,
    /// Environment variable holding a personal access token
    pub token_env: String,
    pub default_output_dir: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            token_env: "GITHUB_TOKEN".to_string(),
            default_output_dir: "cloned_repos".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Answers allowed per parameter before the session gives up
    pub max_prompt_attempts: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { max_prompt_attempts: 3 }
    }
}

impl FactotumConfig {
    /// Parse and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.http.timeout_secs == 0 {
            anyhow::bail!("http.timeout_secs must be greater than zero");
        }
        if self.session.max_prompt_attempts == 0 {
            anyhow::bail!("session.max_prompt_attempts must be at least 1");
        }
        if self.crypto.currency.trim().is_empty() {
            anyhow::bail!("crypto.currency must not be empty");
        }
        for (key, url) in [("crypto.api_base", &self.crypto.api_base), ("github.api_base", &self.github.api_base)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                anyhow::bail!("{key} must be an http(s) URL, got '{url}'");
            }
        }
        if self.github.token_env.trim().is_empty() {
            anyhow::bail!("github.token_env must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = FactotumConfig::default();
        config.validate().unwrap();
        assert_eq!(config.logging.file, PathBuf::from("factotum.log"));
        assert_eq!(config.crypto.currency, "cad");
        assert_eq!(config.github.token_env, "GITHUB_TOKEN");
        assert_eq!(config.session.max_prompt_attempts, 3);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = FactotumConfig::from_toml(
            r#"
            [crypto]
            currency = "usd"

            [session]
            max_prompt_attempts = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.crypto.currency, "usd");
        assert_eq!(config.crypto.api_base, "https://api.coingecko.com/api/v3");
        assert_eq!(config.session.max_prompt_attempts, 5);
        assert_eq!(config.http.timeout_secs, 30);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(FactotumConfig::from_toml("[http]\ntimeout_secs = 0").is_err());
        assert!(FactotumConfig::from_toml("[session]\nmax_prompt_attempts = 0").is_err());
        assert!(FactotumConfig::from_toml("[github]\napi_base = \"ftp://nope\"").is_err());
        assert!(FactotumConfig::from_toml("[crypto]\ncurrency = \"  \"").is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = FactotumConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, FactotumConfig::default());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("factotum.toml");
        std::fs::write(&path, "[logging]\nfile = \"tasks.log\"\n").unwrap();

        let config = FactotumConfig::load(&path).unwrap();
        assert_eq!(config.logging.file, PathBuf::from("tasks.log"));
    }
}
