use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub storage: StorageConfig,
    pub slack: SlackConfig,
    /// Where `/download` writes the exported CSV before uploading it.
    pub export_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    S3,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Object key of the phone book CSV
    pub object_key: String,
    /// Directory for local storage backend
    pub local_storage_path: String,
    pub s3: S3Config,
}

/// Credentials are not part of this config: the AWS default provider chain
/// resolves them (`AWS_ACCESS_KEY_ID`/`AWS_SECRET_ACCESS_KEY`/`AWS_SESSION_TOKEN`,
/// profiles, instance or task roles).
#[derive(Debug, Clone, Default)]
pub struct S3Config {
    /// Bucket name (required when backend is s3)
    pub bucket: Option<String>,
    /// Overrides the region resolved by the AWS provider chain
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible services; defaults to AWS
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SlackConfig {
    pub api_token: String,
    pub api_base_url: String,
    /// When set, slash-command requests must carry a valid Slack signature.
    pub signing_secret: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::S3,
            object_key: "phonebook.csv".to_string(),
            local_storage_path: "./files".to_string(),
            s3: S3Config::default(),
        }
    }
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            api_base_url: "https://slack.com/api".to_string(),
            signing_secret: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, after applying any
    /// `.env` file in the working directory.
    pub fn load() -> Result<Self, ConfigError> {
        load_dotenv_if_present(Path::new(".env"));

        let bind_address = env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let backend = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "s3".to_string())
            .to_lowercase()
            .as_str()
        {
            "local" => StorageBackend::Local,
            _ => StorageBackend::S3,
        };

        let object_key = env::var("S3_FILE").unwrap_or_else(|_| "phonebook.csv".to_string());
        let local_storage_path =
            env::var("LOCAL_STORAGE_PATH").unwrap_or_else(|_| "./files".to_string());

        let s3 = S3Config {
            bucket: env_non_empty("BUCKET_NAME"),
            region: env_non_empty("AWS_REGION"),
            endpoint: env_non_empty("AWS_ENDPOINT_URL"),
        };

        let slack = SlackConfig {
            api_token: env::var("SLACK_API_TOKEN").unwrap_or_default(),
            api_base_url: env::var("SLACK_API_URL")
                .unwrap_or_else(|_| "https://slack.com/api".to_string()),
            signing_secret: env_non_empty("SLACK_SIGNING_SECRET"),
        };

        let export_path = env_non_empty("EXPORT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_export_path);

        let config = Config {
            bind_address,
            storage: StorageConfig {
                backend,
                object_key,
                local_storage_path,
                s3,
            },
            slack,
            export_path,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.object_key.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "S3_FILE cannot be empty".to_string(),
            ));
        }

        if self.storage.backend == StorageBackend::S3 && self.storage.s3.bucket.is_none() {
            return Err(ConfigError::ValidationError(
                "BUCKET_NAME is required when STORAGE_BACKEND=s3".to_string(),
            ));
        }

        if self.slack.api_token.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "SLACK_API_TOKEN is required".to_string(),
            ));
        }

        if self.slack.signing_secret.is_none() {
            tracing::warn!(
                "SLACK_SIGNING_SECRET is not set. Slash-command requests will not be verified."
            );
        }

        Ok(())
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn default_export_path() -> PathBuf {
    let home = env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join("Downloads").join("phonebook.csv")
}

/// Apply `KEY=value` lines from `path` to the process environment.
/// Variables already set in the environment take precedence.
fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, value) in parse_dotenv(&contents) {
        if env::var_os(&key).is_none() {
            env::set_var(key, value);
        }
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (k, v) = line.split_once('=')?;
            let key = k.trim();
            if key.is_empty() {
                return None;
            }

            let mut value = v.trim();
            // Strip optional surrounding quotes.
            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = &value[1..value.len() - 1];
            }
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}
