//! Configuration file handling for virtual-tryon.
//!
//! Loads configuration from `~/.config/virtual-tryon/config.toml` or a custom path.
//! Every field has a default, so an empty or missing file is a valid config.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::capture::{DEFAULT_JPEG_QUALITY, DEFAULT_SAMPLE_RATE_HZ};
use crate::channel::DEFAULT_CONNECT_RETRIES;
use crate::overlay::{OverlayStyle, DEFAULT_TRYON_OPACITY};
use crate::pose::DEFAULT_VISIBILITY_THRESHOLD;
use crate::session::{SessionSettings, DEFAULT_PREFERRED_FIT};

/// Overrides `channel.address`.
pub const SERVER_ENV: &str = "TRYON_SERVER";
/// Overrides `api.base_url`.
pub const API_URL_ENV: &str = "TRYON_API_URL";

/// Configuration file structure for virtual-tryon.
/// Loaded from ~/.config/virtual-tryon/config.toml (or custom path via --config).
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub estimation: EstimationConfig,
    #[serde(default)]
    pub tryon: TryOnConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ChannelConfig {
    /// `host:port` of the detection service.
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_connect_retries")]
    pub connect_retries: u32,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CaptureConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate_hz: u32,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    #[serde(default = "default_threshold")]
    pub confidence_threshold: f32,
    #[serde(default = "default_true")]
    pub detection: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct OverlayConfig {
    #[serde(default = "default_point_radius")]
    pub point_radius: f32,
    #[serde(default = "default_line_width")]
    pub line_width: f32,
    #[serde(default = "default_threshold")]
    pub visibility_threshold: f32,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct EstimationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_preferred_fit")]
    pub preferred_fit: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TryOnConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ApiConfig {
    #[serde(default = "default_api_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_address() -> String {
    "127.0.0.1:5001".to_string()
}

fn default_connect_retries() -> u32 {
    DEFAULT_CONNECT_RETRIES
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE_HZ
}

fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

fn default_threshold() -> f32 {
    DEFAULT_VISIBILITY_THRESHOLD
}

fn default_point_radius() -> f32 {
    OverlayStyle::default().point_radius
}

fn default_line_width() -> f32 {
    OverlayStyle::default().line_width
}

fn default_preferred_fit() -> String {
    DEFAULT_PREFERRED_FIT.to_string()
}

fn default_opacity() -> f32 {
    DEFAULT_TRYON_OPACITY
}

fn default_api_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            connect_retries: default_connect_retries(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: default_sample_rate(),
            jpeg_quality: default_jpeg_quality(),
            confidence_threshold: default_threshold(),
            detection: true,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            point_radius: default_point_radius(),
            line_width: default_line_width(),
            visibility_threshold: default_threshold(),
        }
    }
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            preferred_fit: default_preferred_fit(),
        }
    }
}

impl Default for TryOnConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            opacity: default_opacity(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed or holds
    /// out-of-range values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        let config = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            Self::parse(&content).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                source: e,
            })?
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            Config::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply `TRYON_SERVER` / `TRYON_API_URL` from the environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(SERVER_ENV).ok(),
            std::env::var(API_URL_ENV).ok(),
        );
    }

    fn apply_overrides(&mut self, server: Option<String>, api_url: Option<String>) {
        if let Some(server) = server.filter(|s| !s.trim().is_empty()) {
            self.channel.address = server;
        }
        if let Some(url) = api_url.filter(|s| !s.trim().is_empty()) {
            self.api.base_url = url;
        }
    }

    /// Reject values the session cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = 0.0..=1.0;
        if self.capture.sample_rate_hz == 0 || self.capture.sample_rate_hz > 60 {
            return Err(invalid("capture.sample_rate_hz", "must be between 1 and 60"));
        }
        if !(1..=100).contains(&self.capture.jpeg_quality) {
            return Err(invalid("capture.jpeg_quality", "must be between 1 and 100"));
        }
        if !unit.contains(&self.capture.confidence_threshold) {
            return Err(invalid("capture.confidence_threshold", "must be between 0 and 1"));
        }
        if !unit.contains(&self.overlay.visibility_threshold) {
            return Err(invalid("overlay.visibility_threshold", "must be between 0 and 1"));
        }
        if self.overlay.point_radius <= 0.0 || self.overlay.line_width <= 0.0 {
            return Err(invalid("overlay", "point_radius and line_width must be positive"));
        }
        if !unit.contains(&self.tryon.opacity) {
            return Err(invalid("tryon.opacity", "must be between 0 and 1"));
        }
        if self.estimation.preferred_fit.trim().is_empty() {
            return Err(invalid("estimation.preferred_fit", "must not be empty"));
        }
        Ok(())
    }

    /// Session settings described by this config.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            sample_rate_hz: self.capture.sample_rate_hz,
            jpeg_quality: self.capture.jpeg_quality,
            confidence_threshold: self.capture.confidence_threshold,
            detection_enabled: self.capture.detection,
            estimation_enabled: self.estimation.enabled,
            preferred_fit: self.estimation.preferred_fit.clone(),
            tryon_enabled: self.tryon.enabled,
            tryon_opacity: self.tryon.opacity,
            style: OverlayStyle {
                point_radius: self.overlay.point_radius,
                line_width: self.overlay.line_width,
                visibility_threshold: self.overlay.visibility_threshold,
                ..OverlayStyle::default()
            },
        }
    }
}

fn invalid(field: &'static str, reason: &'static str) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::Invalid { field, reason } => {
                write!(f, "Invalid config value '{}': {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
            ConfigError::Invalid { .. } => None,
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("virtual-tryon").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/virtual-tryon/config.toml")
        })
}
