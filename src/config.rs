use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, Result};

/// Frontend settings. Keys map one-to-one onto environment variables
/// (`API_HOST` -> `api_host`), so the service runs with no config file.
#[derive(Debug, Deserialize, Clone)]
pub struct FrontendConfig {
    /// Either an absolute `http(s)://` URL or a bare path on the backend.
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default = "default_api_host")]
    pub api_host: String,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default = "default_api_path")]
    pub api_path: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: f64,
    /// `FLASK_HOST`, `FLASK_PORT` and `FLASK_DEBUG` are still honoured.
    /// Setting both spellings of one key is rejected.
    #[serde(default = "default_host", alias = "flask_host")]
    pub frontend_host: String,
    #[serde(default = "default_port", alias = "flask_port")]
    pub frontend_port: u16,
    #[serde(default, alias = "flask_debug")]
    pub frontend_debug: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

fn default_api_host() -> String {
    "backend".to_string()
}

fn default_api_port() -> u16 {
    7070
}

fn default_api_path() -> String {
    "random_phrase".to_string()
}

fn default_request_timeout() -> f64 {
    3.0
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_host: default_api_host(),
            api_port: default_api_port(),
            api_path: default_api_path(),
            request_timeout_seconds: default_request_timeout(),
            frontend_host: default_host(),
            frontend_port: default_port(),
            frontend_debug: false,
            log_dir: default_log_dir(),
            static_dir: default_static_dir(),
        }
    }
}

impl FrontendConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            builder = builder.add_source(
                config::File::with_name("phrase-frontend")
                    .required(false),
            );
        }

        // Plain environment variables, no prefix
        builder = builder.add_source(config::Environment::default().try_parsing(true));

        let source = builder
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;
        Self::from_source(source)
    }

    fn from_source(source: config::Config) -> Result<Self> {
        let config: Self = source
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !self.request_timeout_seconds.is_finite() || self.request_timeout_seconds <= 0.0 {
            return Err(AppError::Config(format!(
                "request_timeout_seconds must be positive, got {}",
                self.request_timeout_seconds
            )));
        }
        Ok(())
    }

    /// Resolve the backend phrase endpoint.
    pub fn api_url(&self) -> String {
        let explicit = self.api_url.as_deref().map(str::trim).unwrap_or("");
        if explicit.starts_with("http://") || explicit.starts_with("https://") {
            return explicit.to_string();
        }

        let path = if explicit.is_empty() {
            self.api_path.as_str()
        } else {
            explicit
        };
        format!(
            "http://{}:{}/{}",
            self.api_host,
            self.api_port,
            path.trim_matches('/')
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout_seconds)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.frontend_host, self.frontend_port)
    }
}
