//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend location and transport settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Session expiry handling
    #[serde(default)]
    pub session: SessionConfig,

    /// List screen settings
    #[serde(default)]
    pub list: ListConfig,

    /// Diary editor limits
    #[serde(default)]
    pub editor: EditorConfig,

    /// Login backend selection
    #[serde(default)]
    pub auth: AuthConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.api.timeout_secs == 0 {
            return Err(AppError::config("api.timeout_secs must be > 0"));
        }
        if self.api.backend_port == 0 {
            return Err(AppError::config("api.backend_port must be > 0"));
        }
        if !self.api.api_prefix.starts_with('/') {
            return Err(AppError::config("api.api_prefix must start with '/'"));
        }
        let mini = self.api.mini_program_base_url.as_str();
        if !(mini.starts_with("http://") || mini.starts_with("https://")) {
            return Err(AppError::config(
                "api.mini_program_base_url must be an absolute http(s) URL",
            ));
        }
        url::Url::parse(mini)
            .map_err(|e| AppError::config(format!("api.mini_program_base_url: {e}")))?;
        if self.list.page_size == 0 {
            return Err(AppError::config("list.page_size must be > 0"));
        }
        if self.list.max_pages == 0 {
            return Err(AppError::config("list.max_pages must be > 0"));
        }
        if self.editor.max_images == 0 {
            return Err(AppError::config("editor.max_images must be > 0"));
        }
        if self.editor.max_title_len == 0 || self.editor.max_content_len == 0 {
            return Err(AppError::config("editor length limits must be > 0"));
        }
        if self.session.login_route.trim().is_empty() {
            return Err(AppError::config("session.login_route is empty"));
        }
        Ok(())
    }
}

/// Backend location and transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Port the backend listens on when reached directly from a web host
    #[serde(default = "defaults::backend_port")]
    pub backend_port: u16,

    /// Path prefix under which the REST API is mounted
    #[serde(default = "defaults::api_prefix")]
    pub api_prefix: String,

    /// Web dev-server ports that proxy `/api` to the backend
    #[serde(default = "defaults::dev_server_ports")]
    pub dev_server_ports: Vec<u16>,

    /// Fixed API base used inside a mini-program host
    #[serde(default = "defaults::mini_program_base_url")]
    pub mini_program_base_url: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            backend_port: defaults::backend_port(),
            api_prefix: defaults::api_prefix(),
            dev_server_ports: defaults::dev_server_ports(),
            mini_program_base_url: defaults::mini_program_base_url(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Session expiry handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Delay before redirecting to the login screen after a 401
    #[serde(default = "defaults::redirect_delay")]
    pub redirect_delay_ms: u64,

    /// Route of the login screen
    #[serde(default = "defaults::login_route")]
    pub login_route: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            redirect_delay_ms: defaults::redirect_delay(),
            login_route: defaults::login_route(),
        }
    }
}

/// List screen settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListConfig {
    #[serde(default = "defaults::page_size")]
    pub page_size: u32,

    /// Upper bound on pages fetched when collecting a whole list
    #[serde(default = "defaults::max_pages")]
    pub max_pages: u32,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: defaults::page_size(),
            max_pages: defaults::max_pages(),
        }
    }
}

/// Diary editor limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Maximum number of images per diary
    #[serde(default = "defaults::max_images")]
    pub max_images: usize,

    /// Maximum title length in characters
    #[serde(default = "defaults::max_title_len")]
    pub max_title_len: usize,

    /// Maximum content length in characters
    #[serde(default = "defaults::max_content_len")]
    pub max_content_len: usize,

    /// Length of list summaries in characters
    #[serde(default = "defaults::summary_len")]
    pub summary_len: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_images: defaults::max_images(),
            max_title_len: defaults::max_title_len(),
            max_content_len: defaults::max_content_len(),
            summary_len: defaults::summary_len(),
        }
    }
}

/// Which backend answers login and registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// The REST backend
    #[default]
    Remote,
    /// Built-in demo accounts, no network
    Mock,
}

/// Login backend selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub mode: AuthMode,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    // Api defaults
    pub fn backend_port() -> u16 {
        5000
    }
    pub fn api_prefix() -> String {
        "/api".into()
    }
    pub fn dev_server_ports() -> Vec<u16> {
        vec![10086]
    }
    pub fn mini_program_base_url() -> String {
        "http://192.168.1.100:5000/api".into()
    }
    pub fn timeout() -> u64 {
        10
    }

    // Session defaults
    pub fn redirect_delay() -> u64 {
        1500
    }
    pub fn login_route() -> String {
        "/pages/login/index".into()
    }

    // List defaults
    pub fn page_size() -> u32 {
        10
    }
    pub fn max_pages() -> u32 {
        50
    }

    // Editor defaults
    pub fn max_images() -> usize {
        9
    }
    pub fn max_title_len() -> usize {
        50
    }
    pub fn max_content_len() -> usize {
        5000
    }
    pub fn summary_len() -> usize {
        60
    }

    pub fn log_level() -> String {
        "info".into()
    }
}
