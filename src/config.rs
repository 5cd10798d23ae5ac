//! Configuration loaded from `labflow.toml`.
//!
//! [`LabflowConfig`] holds every tunable. Keys missing from the file fall
//! back to defaults. The `LABFLOW_API_TOKEN` environment variable takes
//! precedence over the file for the API token.

use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

/// Top-level configuration loaded from `labflow.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct LabflowConfig {
    /// Root URL of the consultation REST API, no trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token for the API. Empty means unauthenticated.
    #[serde(default)]
    pub api_token: String,

    /// Operator name stamped on follow-ups and created records.
    #[serde(default = "default_operator")]
    pub operator: String,

    /// Prefix for synthesized quotation numbers.
    #[serde(default = "default_quotation_prefix")]
    pub quotation_prefix: String,

    /// Default page size for list queries.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_operator() -> String {
    "admin".to_string()
}

fn default_quotation_prefix() -> String {
    "BJ".to_string()
}

fn default_page_size() -> u32 {
    20
}

impl Default for LabflowConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_token: String::new(),
            operator: default_operator(),
            quotation_prefix: default_quotation_prefix(),
            page_size: default_page_size(),
        }
    }
}

impl LabflowConfig {
    /// Load configuration from `labflow.toml` in the current directory,
    /// falling back to defaults when the file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("labflow.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<LabflowConfig>(&contents)?
        } else {
            Self::default()
        };

        // Environment takes precedence over the file for the token.
        if let Ok(token) = std::env::var("LABFLOW_API_TOKEN")
            && !token.is_empty()
        {
            config.api_token = token;
        }

        Ok(config)
    }

    /// The token as the store client expects it: `None` when empty.
    pub fn token(&self) -> Option<String> {
        if self.api_token.is_empty() {
            None
        } else {
            Some(self.api_token.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_values() {
        let config = LabflowConfig::default();
        assert_eq!(config.base_url, "http://localhost:8080/api");
        assert_eq!(config.operator, "admin");
        assert_eq!(config.quotation_prefix, "BJ");
        assert_eq!(config.page_size, 20);
        assert!(config.api_token.is_empty());
        assert!(config.token().is_none());
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            base_url = "https://lab.example.com/api"
            operator = "li.na"
        "#;
        let config: LabflowConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.base_url, "https://lab.example.com/api");
        assert_eq!(config.operator, "li.na");
        assert_eq!(config.quotation_prefix, "BJ");
        assert_eq!(config.page_size, 20);
    }

    #[test]
    fn load_from_reads_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labflow.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, r#"quotation_prefix = "SH""#).unwrap();
        writeln!(file, "page_size = 50").unwrap();

        let config = LabflowConfig::load_from(&path).unwrap();
        assert_eq!(config.quotation_prefix, "SH");
        assert_eq!(config.page_size, 50);
    }

    #[test]
    fn load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = LabflowConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.quotation_prefix, "BJ");
    }
}
