//! Configuration parsed from environment variables.
//!
//! Missing or unparseable values fall back to the defaults below, so a bare
//! environment yields a working local setup.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

use crate::media::UploadPolicy;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:3000/api";
pub const DEFAULT_API_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_API_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_AUTOSAVE_DELAY_MS: u64 = 100_000;
pub const DEFAULT_FRAME_RENDER_MS: u64 = 100;
pub const DEFAULT_SHOT_RENDER_MS: u64 = 1000;
pub const DEFAULT_UPLOAD_MAX_BYTES: u64 = 5 * 1024 * 1024;

/// Remote API location and HTTP timeouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL without a trailing slash.
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl ApiConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = std::env::var("STORYBOARD_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned());
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            request_timeout_secs: env_parse("API_REQUEST_TIMEOUT_SECS", DEFAULT_API_REQUEST_TIMEOUT_SECS),
            connect_timeout_secs: env_parse("API_CONNECT_TIMEOUT_SECS", DEFAULT_API_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_owned(),
            request_timeout_secs: DEFAULT_API_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_API_CONNECT_TIMEOUT_SECS,
        }
    }
}

/// Debounce tuning for the autosave collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosaveConfig {
    /// Quiet period after the last edit to an item before it is saved.
    pub save_delay_ms: u64,
    /// Render-state coalescing interval for the frame collection.
    pub frame_render_ms: u64,
    /// Render-state coalescing interval for the shot collection.
    pub shot_render_ms: u64,
}

impl AutosaveConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            save_delay_ms: env_parse("AUTOSAVE_DELAY_MS", DEFAULT_AUTOSAVE_DELAY_MS),
            frame_render_ms: env_parse("FRAME_RENDER_MS", DEFAULT_FRAME_RENDER_MS),
            shot_render_ms: env_parse("SHOT_RENDER_MS", DEFAULT_SHOT_RENDER_MS),
        }
    }

    #[must_use]
    pub fn save_delay(&self) -> Duration {
        Duration::from_millis(self.save_delay_ms)
    }

    #[must_use]
    pub fn frame_render_delay(&self) -> Duration {
        Duration::from_millis(self.frame_render_ms)
    }

    #[must_use]
    pub fn shot_render_delay(&self) -> Duration {
        Duration::from_millis(self.shot_render_ms)
    }
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            save_delay_ms: DEFAULT_AUTOSAVE_DELAY_MS,
            frame_render_ms: DEFAULT_FRAME_RENDER_MS,
            shot_render_ms: DEFAULT_SHOT_RENDER_MS,
        }
    }
}

/// Everything a session needs, grouped by concern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub api: ApiConfig,
    pub autosave: AutosaveConfig,
    pub upload: UploadPolicy,
}

impl Config {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `STORYBOARD_API_URL`: default `http://127.0.0.1:3000/api`
    /// - `API_REQUEST_TIMEOUT_SECS`: default 30
    /// - `API_CONNECT_TIMEOUT_SECS`: default 10
    /// - `AUTOSAVE_DELAY_MS`: default 100000
    /// - `FRAME_RENDER_MS`: default 100
    /// - `SHOT_RENDER_MS`: default 1000
    /// - `UPLOAD_MAX_BYTES`: default 5 MiB
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            autosave: AutosaveConfig::from_env(),
            upload: UploadPolicy { max_bytes: env_parse("UPLOAD_MAX_BYTES", DEFAULT_UPLOAD_MAX_BYTES) },
        }
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}
