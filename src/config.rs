//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/abstract-explorer/abstract-explorer.toml`
//! 3. Environment variables: `ABX_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::application::services::DEFAULT_LAYER_LIMIT;
use crate::application::ApplicationError;
use crate::domain::LinkSettings;

/// Secret store entry holding the API token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct KeychainConfig {
    pub service: String,
    pub account: String,
}

impl Default for KeychainConfig {
    fn default() -> Self {
        Self {
            service: "com.goabstract.apiToken".into(),
            account: "AbstractApiToken".into(),
        }
    }
}

/// Raw keychain config for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawKeychainConfig {
    pub service: Option<String>,
    pub account: Option<String>,
}

/// Raw settings for intermediate parsing (`None` → not specified, keep base).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub api_base_url: Option<String>,
    pub previews_base_url: Option<String>,
    pub web_base_url: Option<String>,
    pub app_scheme: Option<String>,
    pub api_version: Option<String>,
    pub layer_page_limit: Option<u32>,
    pub opener: Option<String>,
    pub remember_token: Option<bool>,
    pub keychain: RawKeychainConfig,
}

/// Unified configuration for abstract-explorer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// REST API root
    pub api_base_url: String,
    /// Layer preview root
    pub previews_base_url: String,
    /// Web app root used for open-in-web
    pub web_base_url: String,
    /// URI scheme of app deep links
    pub app_scheme: String,
    /// Value of the API version header
    pub api_version: String,
    /// Page size for layer listings
    pub layer_page_limit: u32,
    /// Application used to open URLs (default: OS handler)
    pub opener: Option<String>,
    /// Save interactively entered tokens to the secret store
    pub remember_token: bool,
    pub keychain: KeychainConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.goabstract.com".into(),
            previews_base_url: "https://previews.goabstract.com".into(),
            web_base_url: "https://app.goabstract.com".into(),
            app_scheme: "abstract".into(),
            api_version: "8".into(),
            layer_page_limit: DEFAULT_LAYER_LIMIT,
            opener: None,
            remember_token: true,
            keychain: KeychainConfig::default(),
        }
    }
}

/// Get the XDG config directory for abstract-explorer.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "abstract-explorer").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("abstract-explorer.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Overlay values that are specified; keep the rest.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            api_base_url: overlay
                .api_base_url
                .clone()
                .unwrap_or_else(|| self.api_base_url.clone()),
            previews_base_url: overlay
                .previews_base_url
                .clone()
                .unwrap_or_else(|| self.previews_base_url.clone()),
            web_base_url: overlay
                .web_base_url
                .clone()
                .unwrap_or_else(|| self.web_base_url.clone()),
            app_scheme: overlay
                .app_scheme
                .clone()
                .unwrap_or_else(|| self.app_scheme.clone()),
            api_version: overlay
                .api_version
                .clone()
                .unwrap_or_else(|| self.api_version.clone()),
            layer_page_limit: overlay.layer_page_limit.unwrap_or(self.layer_page_limit),
            opener: overlay.opener.clone().or_else(|| self.opener.clone()),
            remember_token: overlay.remember_token.unwrap_or(self.remember_token),
            keychain: KeychainConfig {
                service: overlay
                    .keychain
                    .service
                    .clone()
                    .unwrap_or_else(|| self.keychain.service.clone()),
                account: overlay
                    .keychain
                    .account
                    .clone()
                    .unwrap_or_else(|| self.keychain.account.clone()),
            },
        }
    }

    /// Load settings with layered precedence from the default global config location.
    pub fn load() -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref())
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Optional config file (missing files are skipped)
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. `config_file`
    /// 3. Environment variables: `ABX_*` prefix
    pub fn load_from(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(path) = config_file {
            if path.exists() {
                let raw = load_raw_settings(path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.validate()?;
        Ok(current)
    }

    /// Apply ABX_* environment variables as explicit overrides.
    fn apply_env_overrides(settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("ABX").separator("__"))
            .build()
            .map_err(config_err)?;

        let raw = RawSettings {
            api_base_url: config.get_string("api_base_url").ok(),
            previews_base_url: config.get_string("previews_base_url").ok(),
            web_base_url: config.get_string("web_base_url").ok(),
            app_scheme: config.get_string("app_scheme").ok(),
            api_version: config.get_string("api_version").ok(),
            layer_page_limit: config.get::<u32>("layer_page_limit").ok(),
            opener: config.get_string("opener").ok(),
            remember_token: config.get_bool("remember_token").ok(),
            keychain: RawKeychainConfig {
                service: config.get_string("keychain.service").ok(),
                account: config.get_string("keychain.account").ok(),
            },
        };
        Ok(settings.merge_with(&raw))
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        for (name, value) in [
            ("api_base_url", &self.api_base_url),
            ("previews_base_url", &self.previews_base_url),
            ("web_base_url", &self.web_base_url),
        ] {
            Url::parse(value).map_err(|e| ApplicationError::Config {
                message: format!("{name} '{value}': {e}"),
            })?;
        }
        if self.app_scheme.is_empty()
            || !self
                .app_scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        {
            return Err(ApplicationError::Config {
                message: format!("app_scheme '{}' is not a valid URI scheme", self.app_scheme),
            });
        }
        if self.layer_page_limit == 0 {
            return Err(ApplicationError::Config {
                message: "layer_page_limit must be positive".into(),
            });
        }
        Ok(())
    }

    /// Link targets for the resolver.
    pub fn link_settings(&self) -> Result<LinkSettings, ApplicationError> {
        let web_base_url = Url::parse(&self.web_base_url).map_err(|e| ApplicationError::Config {
            message: format!("web_base_url '{}': {e}", self.web_base_url),
        })?;
        Ok(LinkSettings {
            web_base_url,
            app_scheme: self.app_scheme.clone(),
        })
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# abstract-explorer configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/abstract-explorer/abstract-explorer.toml
#   Env:    ABX_* environment variables (ABX_KEYCHAIN__SERVICE for nested keys)

# REST API and preview endpoints
# api_base_url = "https://api.goabstract.com"
# previews_base_url = "https://previews.goabstract.com"
# api_version = "8"

# Targets of open-in-web and open-in-app
# web_base_url = "https://app.goabstract.com"
# app_scheme = "abstract"

# Page size when listing the layers of a page
# layer_page_limit = 500

# Application used to open URLs (default: the OS handler for the URL scheme)
# opener = "firefox"

# Save a token entered at the prompt to the OS secret store
# remember_token = true

[keychain]
# service = "com.goabstract.apiToken"
# account = "AbstractApiToken"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
