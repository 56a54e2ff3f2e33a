//! Application configuration read from the environment

use crate::error::{Error, Result};
use crate::model::DEFAULT_COMPLETION_MODEL;

/// Database file used when `SITECHAT_DATABASE` is unset
pub const DEFAULT_DATABASE_PATH: &str = "sitechat.db";

/// Base URL used in image links when `BASE_URL` is unset
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Settings shared by every command
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Path of the libsql database file
    pub database_path: String,

    pub max_depth: u32,
    pub max_pages: u32,

    /// Public base URL of the service, used for "view all images" links
    pub base_url: String,

    /// Gemini completion model name
    pub model: String,

    pub api_key: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            max_depth: 2,
            max_pages: 50,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_COMPLETION_MODEL.to_string(),
            api_key: None,
        }
    }
}

impl AppConfig {
    /// Read `SITECHAT_DATABASE`, `MAX_DEPTH`, `MAX_PAGES`, `BASE_URL`,
    /// `GEMINI_MODEL` and `GEMINI_API_KEY`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Self {
            database_path: value("SITECHAT_DATABASE").unwrap_or(defaults.database_path),
            max_depth: parse_number("MAX_DEPTH", value("MAX_DEPTH"), defaults.max_depth)?,
            max_pages: parse_number("MAX_PAGES", value("MAX_PAGES"), defaults.max_pages)?,
            base_url: value("BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            model: value("GEMINI_MODEL").unwrap_or(defaults.model),
            api_key: value("GEMINI_API_KEY"),
        })
    }

    /// The API key, or an input error naming the variable to set
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            Error::InvalidInput("GEMINI_API_KEY environment variable must be set".to_string())
        })
    }
}

fn parse_number(key: &str, value: Option<String>, default: u32) -> Result<u32> {
    match value {
        Some(value) => value.trim().parse().map_err(|_| {
            Error::InvalidInput(format!(
                "{} must be a non-negative integer, got '{}'",
                key, value
            ))
        }),
        None => Ok(default),
    }
}
