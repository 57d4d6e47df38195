use crate::utils::error::{DirectoryError, Result};
use crate::utils::logger::LogFormat;
use crate::utils::validation::{
    validate_email, validate_non_empty_string, validate_path, validate_required_field,
    validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com";
pub const DEFAULT_STORAGE_URL: &str = "https://firebasestorage.googleapis.com";
pub const DEFAULT_COLLECTION: &str = "Users";
pub const DEFAULT_PICTURE_FOLDER: &str = "ProfilePicture";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub backend: BackendConfig,
    pub firestore: Option<FirestoreConfig>,
    pub storage: Option<StorageConfig>,
    pub local: Option<LocalConfig>,
    pub mail: Option<MailConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Firestore,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub kind: BackendKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub collection: Option<String>,
    pub base_url: Option<String>,
    pub auth_token: Option<String>,
}

impl FirestoreConfig {
    pub fn collection(&self) -> &str {
        self.collection.as_deref().unwrap_or(DEFAULT_COLLECTION)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_FIRESTORE_URL)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub bucket: String,
    pub folder: Option<String>,
    pub base_url: Option<String>,
    pub auth_token: Option<String>,
}

impl StorageConfig {
    pub fn folder(&self) -> &str {
        self.folder.as_deref().unwrap_or(DEFAULT_PICTURE_FOLDER)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_STORAGE_URL)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    pub records_file: String,
    pub pictures_dir: String,
    pub folder: Option<String>,
}

impl LocalConfig {
    pub fn folder(&self) -> &str {
        self.folder.as_deref().unwrap_or(DEFAULT_PICTURE_FOLDER)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub endpoint: String,
    pub api_key: String,
    pub from_email: String,
    pub from_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub format: Option<String>,
    pub verbose: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DirectoryError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DirectoryError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${FIREBASE_TOKEN})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DirectoryError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn log_format(&self) -> LogFormat {
        self.logging
            .as_ref()
            .and_then(|l| l.format.as_deref())
            .and_then(LogFormat::parse)
            .unwrap_or_default()
    }

    pub fn verbose(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.verbose)
            .unwrap_or(false)
    }

    pub fn validate_config(&self) -> Result<()> {
        match self.backend.kind {
            BackendKind::Firestore => {
                let firestore = validate_required_field("firestore", &self.firestore)?;
                validate_non_empty_string("firestore.project_id", &firestore.project_id)?;
                validate_non_empty_string("firestore.collection", firestore.collection())?;
                validate_url("firestore.base_url", firestore.base_url())?;

                let storage = validate_required_field("storage", &self.storage)?;
                validate_non_empty_string("storage.bucket", &storage.bucket)?;
                validate_url("storage.base_url", storage.base_url())?;
            }
            BackendKind::Local => {
                let local = validate_required_field("local", &self.local)?;
                validate_path("local.records_file", &local.records_file)?;
                validate_path("local.pictures_dir", &local.pictures_dir)?;
            }
        }

        if let Some(mail) = &self.mail {
            validate_url("mail.endpoint", &mail.endpoint)?;
            validate_non_empty_string("mail.api_key", &mail.api_key)?;
            validate_email("mail.from_email", &mail.from_email)?;
        }

        if let Some(format) = self.logging.as_ref().and_then(|l| l.format.as_deref()) {
            if LogFormat::parse(format).is_none() {
                return Err(DirectoryError::InvalidConfigValueError {
                    field: "logging.format".to_string(),
                    value: format.to_string(),
                    reason: "Valid formats: compact, json".to_string(),
                });
            }
        }

        Ok(())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
