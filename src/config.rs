use std::fs;
use std::path::{Path, PathBuf};

use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ConfigError;
use crate::model::SenderConfig;

pub const MONGO_URI_ENV: &str = "ESTIMATOR_MONGO_URI";
pub const SMTP_PASSWORD_ENV: &str = "ESTIMATOR_SMTP_PASSWORD";

const DEFAULT_SENDER_TEMPLATE: &str = include_str!("../sender.toml");

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MongoSettings {
    pub uri: String,
    pub database: String,
    pub collection: String,
}

impl Default for MongoSettings {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017/".to_string(),
            database: "constructionestimator".to_string(),
            collection: "quotations".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
    /// Connect over TLS directly instead of upgrading with STARTTLS.
    pub implicit_tls: bool,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            username: String::new(),
            password: String::new(),
            from_email: String::new(),
            from_name: String::new(),
            implicit_tls: false,
        }
    }
}

impl SmtpSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("SMTP host cannot be empty".to_string()));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid("SMTP port must be greater than 0".to_string()));
        }
        if self.from_email.trim().is_empty() {
            return Err(ConfigError::Invalid("Sender email is not configured".to_string()));
        }
        if self.username.is_empty() != self.password.is_empty() {
            return Err(ConfigError::Invalid(
                "SMTP username and password must be set together".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MailSettings {
    pub subject: String,
    pub attachment_name: String,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            subject: "Construction Quotation".to_string(),
            attachment_name: "quotation.pdf".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    pub data_root: String,
    pub mongo: MongoSettings,
    pub smtp: SmtpSettings,
    pub mail: MailSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            data_root: "~/Documents/Quotations".to_string(),
            mongo: MongoSettings::default(),
            smtp: SmtpSettings::default(),
            mail: MailSettings::default(),
        }
    }
}

impl AppSettings {
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Secrets may come from the environment instead of the settings file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(uri) = std::env::var(MONGO_URI_ENV) {
            debug!("Using MongoDB URI from {}", MONGO_URI_ENV);
            self.mongo.uri = uri;
        }
        if let Ok(password) = std::env::var(SMTP_PASSWORD_ENV) {
            debug!("Using SMTP password from {}", SMTP_PASSWORD_ENV);
            self.smtp.password = password;
        }
    }

    pub fn root(&self) -> PathBuf {
        PathBuf::from(expand_home_dir(&self.data_root))
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "construction-estimator", "app") {
        let config_dir = proj_dirs.config_dir();
        if !config_dir.exists() {
            fs::create_dir_all(config_dir).ok();
        }
        return config_dir.join("settings.toml");
    }
    PathBuf::from("settings.toml")
}

/// Loads `settings.toml`, falling back to defaults when it doesn't exist yet.
/// Environment overrides are not applied here.
pub fn load_settings() -> Result<AppSettings, ConfigError> {
    let path = get_config_path();
    let settings = if path.exists() {
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        AppSettings::from_toml(&content, &path)?
    } else {
        warn!(path = %path.display(), "No settings file found, using defaults");
        AppSettings::default()
    };
    Ok(settings)
}

pub fn save_settings(settings: &AppSettings) -> Result<PathBuf, ConfigError> {
    let path = get_config_path();
    let toml_str = toml::to_string_pretty(settings)?;
    fs::write(&path, toml_str).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    info!(path = %path.display(), "Settings saved");
    Ok(path)
}

pub fn default_sender() -> Result<SenderConfig, ConfigError> {
    toml::from_str(DEFAULT_SENDER_TEMPLATE).map_err(|source| ConfigError::Parse {
        path: "sender.toml (embedded)".to_string(),
        source,
    })
}

/// Reads `sender.toml` from the data root, writing the default one first
/// if it is missing.
pub fn load_sender_config(root: &Path) -> Result<SenderConfig, ConfigError> {
    let path = root.join("sender.toml");
    if path.exists() {
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    } else {
        info!(path = %path.display(), "Initializing default sender configuration");
        let io_err = |source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        };
        fs::create_dir_all(root).map_err(io_err)?;
        fs::write(&path, DEFAULT_SENDER_TEMPLATE).map_err(io_err)?;
        default_sender()
    }
}

pub fn expand_home_dir(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(base_dirs) = BaseDirs::new() {
            let home = base_dirs.home_dir().to_string_lossy();
            return path.replacen('~', &home, 1);
        }
    }
    path.to_string()
}
