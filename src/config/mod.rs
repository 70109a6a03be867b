//! Configuration loading for the HubSpot workflow actions service.
//!
//! Loads layered `.env` files and environment variables prefixed with
//! `HUBSPOT_`, producing a typed [`AppConfig`].

use std::{collections::BTreeMap, env, net::SocketAddr, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application configuration derived from `HUBSPOT_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AppConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_api_bind_addr")]
    pub api_bind_addr: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_acquire_timeout_ms")]
    pub db_acquire_timeout_ms: u64,
    /// OAuth app client id (`HUBSPOT_CLIENT_ID`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// OAuth app client secret (`HUBSPOT_CLIENT_SECRET`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    /// OAuth redirect URI registered with the app (`HUBSPOT_REDIRECT_URI`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
    /// Developer API key used for workflow action registration
    /// (`HUBSPOT_DEVELOPER_API_KEY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub developer_api_key: Option<String>,
    /// Numeric app id the workflow action definition is registered under
    /// (`HUBSPOT_APP_ID`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    /// Base URL of the HubSpot REST API (`HUBSPOT_API_BASE`)
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Base URL of the HubSpot web app, used for the post-install redirect
    /// (`HUBSPOT_APP_BASE`)
    #[serde(default = "default_app_base")]
    pub app_base: String,
    /// Publicly reachable base URL of this service, embedded in the workflow
    /// action definition as `actionUrl`/`optionsUrl` (`HUBSPOT_ACTION_BASE_URL`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_base_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            api_bind_addr: default_api_bind_addr(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            database_url: default_database_url(),
            db_max_connections: default_db_max_connections(),
            db_acquire_timeout_ms: default_db_acquire_timeout_ms(),
            client_id: None,
            client_secret: None,
            redirect_uri: None,
            developer_api_key: None,
            app_id: None,
            api_base: default_api_base(),
            app_base: default_app_base(),
            action_base_url: None,
        }
    }
}

impl AppConfig {
    /// Returns the configured bind address as a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.api_bind_addr.parse()
    }

    /// Returns a redacted JSON representation (secrets are redacted).
    pub fn redacted_json(&self) -> serde_json::Result<String> {
        let mut config = self.clone();
        if config.client_secret.is_some() {
            config.client_secret = Some("[REDACTED]".to_string());
        }
        if config.developer_api_key.is_some() {
            config.developer_api_key = Some("[REDACTED]".to_string());
        }
        serde_json::to_string_pretty(&config)
    }

    /// Validates the configuration, returning an error if required settings are missing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // OAuth app credentials are only required outside local/test profiles;
        // tests construct clients pointing at mock servers.
        if !matches!(self.profile.as_str(), "local" | "test") {
            if self.client_id.is_none() {
                return Err(ConfigError::MissingClientId);
            }
            if self.client_secret.is_none() {
                return Err(ConfigError::MissingClientSecret);
            }
            if self.redirect_uri.is_none() {
                return Err(ConfigError::MissingRedirectUri);
            }
        }

        if self.api_base.is_empty() {
            return Err(ConfigError::InvalidApiBase);
        }

        Ok(())
    }
}

fn default_profile() -> String {
    "local".to_string()
}

fn default_api_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_database_url() -> String {
    "sqlite://hubspot-actions.db?mode=rwc".to_string()
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_acquire_timeout_ms() -> u64 {
    5000
}

fn default_api_base() -> String {
    "https://api.hubapi.com".to_string()
}

fn default_app_base() -> String {
    "https://app.hubspot.com".to_string()
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
    #[error("invalid api bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("OAuth client id is missing; set HUBSPOT_CLIENT_ID")]
    MissingClientId,
    #[error("OAuth client secret is missing; set HUBSPOT_CLIENT_SECRET")]
    MissingClientSecret,
    #[error("OAuth redirect URI is missing; set HUBSPOT_REDIRECT_URI")]
    MissingRedirectUri,
    #[error("API base URL must not be empty; set HUBSPOT_API_BASE")]
    InvalidApiBase,
}

/// Loads configuration using layered `.env` files and `HUBSPOT_*` env vars.
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a new loader rooted at the current working directory.
    pub fn new() -> Self {
        Self {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Creates a loader rooted at the provided directory (useful for tests).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Loads configuration from layered env files plus the process environment.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let (mut layered, profile_hint) = self.collect_layered_env()?;

        // Overlay process environment last so it wins.
        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix("HUBSPOT_") {
                layered.insert(stripped.to_string(), value);
            }
        }

        let profile = layered
            .remove("PROFILE")
            .filter(|v| !v.is_empty())
            .unwrap_or(profile_hint);
        let api_bind_addr = layered
            .remove("API_BIND_ADDR")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_api_bind_addr);
        let log_level = layered
            .remove("LOG_LEVEL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_log_level);
        let log_format = layered
            .remove("LOG_FORMAT")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_log_format);
        let database_url = layered
            .remove("DATABASE_URL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_database_url);
        let db_max_connections = layered
            .remove("DB_MAX_CONNECTIONS")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_db_max_connections);
        let db_acquire_timeout_ms = layered
            .remove("DB_ACQUIRE_TIMEOUT_MS")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_db_acquire_timeout_ms);

        let client_id = layered.remove("CLIENT_ID").and_then(non_empty);
        let client_secret = layered.remove("CLIENT_SECRET").and_then(non_empty);
        let redirect_uri = layered.remove("REDIRECT_URI").and_then(non_empty);
        let developer_api_key = layered.remove("DEVELOPER_API_KEY").and_then(non_empty);
        let app_id = layered.remove("APP_ID").and_then(non_empty);
        let api_base = layered
            .remove("API_BASE")
            .and_then(non_empty)
            .unwrap_or_else(default_api_base);
        let app_base = layered
            .remove("APP_BASE")
            .and_then(non_empty)
            .unwrap_or_else(default_app_base);
        let action_base_url = layered.remove("ACTION_BASE_URL").and_then(non_empty);

        let config = AppConfig {
            profile,
            api_bind_addr,
            log_level,
            log_format,
            database_url,
            db_max_connections,
            db_acquire_timeout_ms,
            client_id,
            client_secret,
            redirect_uri,
            developer_api_key,
            app_id,
            api_base,
            app_base,
            action_base_url,
        };

        config.validate()?;

        match config.bind_addr() {
            Ok(_) => Ok(config),
            Err(source) => Err(ConfigError::InvalidBindAddr {
                value: config.api_bind_addr.clone(),
                source,
            }),
        }
    }

    fn collect_layered_env(&self) -> Result<(BTreeMap<String, String>, String), ConfigError> {
        let mut values = BTreeMap::new();

        self.merge_dotenv(self.base_dir.join(".env"), &mut values)?;
        self.merge_dotenv(self.base_dir.join(".env.local"), &mut values)?;

        let profile = env::var("HUBSPOT_PROFILE")
            .ok()
            .or_else(|| values.get("PROFILE").cloned())
            .unwrap_or_else(default_profile);

        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}", &profile)),
            &mut values,
        )?;
        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}.local", &profile)),
            &mut values,
        )?;

        Ok((values, profile))
    }

    fn merge_dotenv(
        &self,
        path: PathBuf,
        values: &mut BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) = item.map_err(|source| ConfigError::EnvFile {
                        path: path.clone(),
                        source,
                    })?;
                    if let Some(stripped) = key.strip_prefix("HUBSPOT_") {
                        values.insert(stripped.to_string(), value);
                    }
                }
                Ok(())
            }
            Err(dotenvy::Error::Io(ref io_err))
                if io_err.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(())
            }
            Err(err) => Err(ConfigError::EnvFile { path, source: err }),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_requires_oauth_settings_outside_local() {
        let config = AppConfig {
            profile: "production".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingClientId)
        ));

        let config = AppConfig {
            profile: "production".to_string(),
            client_id: Some("id".to_string()),
            client_secret: Some("secret".to_string()),
            redirect_uri: Some("https://example.com/cb".to_string()),
            ..AppConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_allows_bare_local_profile() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn redacted_json_hides_secrets() {
        let config = AppConfig {
            client_secret: Some("super-secret".to_string()),
            developer_api_key: Some("key-123".to_string()),
            ..AppConfig::default()
        };

        let json = config.redacted_json().unwrap();
        assert!(!json.contains("super-secret"));
        assert!(!json.contains("key-123"));
        assert!(json.contains("[REDACTED]"));
    }
}
