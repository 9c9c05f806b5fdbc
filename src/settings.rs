use crate::storage::DEFAULT_PROVIDER_KEY_PATTERN;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CaregateSettings {
    #[serde(default)]
    pub routes: RouteSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// View paths the session core navigates between
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteSettings {
    pub root: String,
    pub sign_in: String,
    pub sign_up: String,
    pub forbidden: String,
    pub patient_home: String,
    pub doctor_home: String,
    pub hospital_home: String,
    pub admin_home: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Regex matched against client storage keys owned by the identity provider
    pub storage_key_pattern: String,
    /// Absolute URL the verification email links back to after sign-up
    pub email_redirect_url: String,
    /// Delay before navigating to sign-in after a successful sign-up, so the
    /// success notification stays visible
    pub signup_redirect_delay_ms: u64,
    /// Extra delay before a deferred profile fetch; 0 still defers to the
    /// next scheduling turn
    pub profile_fetch_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `env_logger` filter directives, e.g. `info` or `warn,caregate=debug`
    pub level: String,
}

impl LoggingSettings {
    /// Logger builder filtered by the configured directives
    #[must_use]
    pub fn logger_builder(&self) -> env_logger::Builder {
        let mut builder = env_logger::Builder::new();
        builder.parse_filters(&self.level);
        builder
    }
}

impl Default for RouteSettings {
    fn default() -> Self {
        Self {
            root: "/".to_string(),
            sign_in: "/login".to_string(),
            sign_up: "/signup".to_string(),
            forbidden: "/unauthorized".to_string(),
            patient_home: "/patient/dashboard".to_string(),
            doctor_home: "/doctor/dashboard".to_string(),
            hospital_home: "/hospital/dashboard".to_string(),
            admin_home: "/admin/dashboard".to_string(),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            storage_key_pattern: DEFAULT_PROVIDER_KEY_PATTERN.to_string(),
            email_redirect_url: "http://localhost:5173/login".to_string(),
            signup_redirect_delay_ms: 2000,
            profile_fetch_delay_ms: 0,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl CaregateSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Logger initialization fails
    /// - Settings file cannot be read or parsed
    pub fn load() -> Result<Self> {
        Self::load_env_file();

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);
        Self::initialize_logger(&settings.logging)?;

        log::info!("✓ Logging initialized at '{}'", settings.logging.level);
        Ok(settings)
    }

    /// Install the global logger with the configured filter
    ///
    /// # Errors
    ///
    /// Returns an error if a logger is already installed
    fn initialize_logger(logging: &LoggingSettings) -> Result<()> {
        logging
            .logger_builder()
            .try_init()
            .context("Failed to initialize logger")
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `CAREGATE_CONFIG_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file cannot be read or parsed
    fn load_base_settings() -> Result<Self> {
        let mut settings = Self::default();

        let default_config_path = std::path::PathBuf::from("Settings.toml");
        if default_config_path.exists() {
            settings = Self::from_file(&default_config_path)?;
            log::info!(
                "✓ Loaded base settings from {}",
                default_config_path.display()
            );
        }

        if let Ok(config_dir) = std::env::var("CAREGATE_CONFIG_DIR") {
            let config_path = std::path::Path::new(&config_dir).join("Settings.toml");
            if config_path.exists() {
                settings = Self::from_file(&config_path)?;
                log::info!("✓ Overriding settings from {}", config_path.display());
            } else {
                log::info!(
                    "ℹ CAREGATE_CONFIG_DIR set but no Settings.toml found at: {}",
                    config_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Parse a single TOML settings file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let toml_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        basic_toml::from_str(&toml_content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_route_env_overrides(&mut settings.routes);
        Self::apply_auth_env_overrides(&mut settings.auth);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    /// Apply environment overrides for route settings
    pub fn apply_route_env_overrides(routes: &mut RouteSettings) {
        Self::apply_string_env_override("ROOT_PATH", &mut routes.root);
        Self::apply_string_env_override("SIGN_IN_PATH", &mut routes.sign_in);
        Self::apply_string_env_override("SIGN_UP_PATH", &mut routes.sign_up);
        Self::apply_string_env_override("FORBIDDEN_PATH", &mut routes.forbidden);
    }

    /// Apply environment overrides for auth settings
    pub fn apply_auth_env_overrides(auth: &mut AuthSettings) {
        Self::apply_string_env_override("STORAGE_KEY_PATTERN", &mut auth.storage_key_pattern);
        Self::apply_string_env_override("EMAIL_REDIRECT_URL", &mut auth.email_redirect_url);
        Self::apply_numeric_env_override(
            "SIGNUP_REDIRECT_DELAY_MS",
            &mut auth.signup_redirect_delay_ms,
        );
        Self::apply_numeric_env_override(
            "PROFILE_FETCH_DELAY_MS",
            &mut auth.profile_fetch_delay_ms,
        );
    }

    /// Apply environment overrides for logging settings
    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        Self::apply_string_env_override("RUST_LOG", &mut logging_settings.level);
    }

    fn apply_string_env_override(env_var: &str, target: &mut String) {
        if let Ok(value) = std::env::var(env_var) {
            if !value.is_empty() {
                *target = value;
            }
        }
    }

    fn apply_numeric_env_override(env_var: &str, target: &mut u64) {
        if let Ok(value_str) = std::env::var(env_var) {
            if let Ok(value) = value_str.parse::<u64>() {
                *target = value;
            }
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                if line.trim_start().starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }
}
