//! Server configuration types.

use serde::{Deserialize, Serialize};
use std::net::{AddrParseError, SocketAddr};
use std::time::Duration;

/// JWT secret shipped in `defaults.toml`; refused in production.
pub const PLACEHOLDER_JWT_SECRET: &str = "natours-development-secret-change-me-please";

/// Main server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server binding configuration.
    pub server: ServerBindConfig,
    /// Authentication configuration.
    pub auth: AuthConfig,
    /// Rate limiting configuration.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Request body configuration.
    #[serde(default)]
    pub body: BodyConfig,
    /// Query parameter pollution guard.
    #[serde(default)]
    pub params: ParamsConfig,
    /// Security header policy.
    #[serde(default)]
    pub security: SecurityConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Runtime mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_development(self) -> bool {
        self == Self::Development
    }
}

/// Server binding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerBindConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Runtime mode.
    #[serde(default)]
    pub environment: Environment,
    /// Request timeout.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_request_timeout() -> u64 {
    30
}

impl ServerBindConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// JWT secret key.
    pub jwt_secret: String,
    /// Token lifetime (seconds).
    #[serde(default = "default_jwt_expiry")]
    pub jwt_expires_in_secs: u64,
    /// Lifetime of the `jwt` cookie (days).
    #[serde(default = "default_cookie_expiry")]
    pub cookie_expires_in_days: i64,
    /// Mark the session cookie `Secure`.
    #[serde(default)]
    pub cookie_secure: bool,
}

fn default_jwt_expiry() -> u64 {
    90 * 24 * 60 * 60 // 90 days
}

fn default_cookie_expiry() -> i64 {
    90
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Requests allowed per window.
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    /// Window length (seconds).
    #[serde(default = "default_window")]
    pub window_secs: u64,
    /// Only paths under this prefix are counted.
    #[serde(default = "default_rate_limit_prefix")]
    pub path_prefix: String,
    /// Message sent with a 429.
    #[serde(default = "default_rate_limit_message")]
    pub message: String,
    /// Take the client id from `X-Forwarded-For`.
    #[serde(default)]
    pub trust_proxy: bool,
    /// How often expired windows are evicted (seconds).
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_max_requests() -> u32 {
    100
}

fn default_window() -> u64 {
    3600
}

fn default_rate_limit_prefix() -> String {
    "/api".to_string()
}

fn default_rate_limit_message() -> String {
    "Too many requests from this IP, please try again in an hour!".to_string()
}

fn default_sweep_interval() -> u64 {
    60
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            max_requests: default_max_requests(),
            window_secs: default_window(),
            path_prefix: default_rate_limit_prefix(),
            message: default_rate_limit_message(),
            trust_proxy: false,
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

/// Request body configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyConfig {
    /// Maximum accepted JSON or form body.
    #[serde(default = "default_body_limit")]
    pub limit_bytes: usize,
}

fn default_body_limit() -> usize {
    10 * 1024
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            limit_bytes: default_body_limit(),
        }
    }
}

/// Query parameter guard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamsConfig {
    /// Keys allowed to repeat.
    #[serde(default = "default_whitelist")]
    pub whitelist: Vec<String>,
}

fn default_whitelist() -> Vec<String> {
    [
        "duration",
        "ratingsQuantity",
        "ratingsAverage",
        "maxGroupSize",
        "difficulty",
        "price",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for ParamsConfig {
    fn default() -> Self {
        Self {
            whitelist: default_whitelist(),
        }
    }
}

/// Content-Security-Policy source lists, one per resource type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default = "default_self_src")]
    pub default_src: Vec<String>,
    #[serde(default = "default_connect_src")]
    pub connect_src: Vec<String>,
    #[serde(default = "default_script_src")]
    pub script_src: Vec<String>,
    #[serde(default = "default_style_src")]
    pub style_src: Vec<String>,
    #[serde(default = "default_style_src")]
    pub style_src_elem: Vec<String>,
    #[serde(default = "default_font_src")]
    pub font_src: Vec<String>,
    #[serde(default = "default_img_src")]
    pub img_src: Vec<String>,
    /// `max-age` of `Strict-Transport-Security`.
    #[serde(default = "default_hsts_max_age")]
    pub hsts_max_age_secs: u64,
}

fn sources(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn default_self_src() -> Vec<String> {
    sources(&["'self'"])
}

fn default_connect_src() -> Vec<String> {
    sources(&["'self'", "http://127.0.0.1:3000", "https://cdnjs.cloudflare.com"])
}

fn default_script_src() -> Vec<String> {
    sources(&["'self'", "https://cdnjs.cloudflare.com", "https://unpkg.com"])
}

fn default_style_src() -> Vec<String> {
    sources(&[
        "'self'",
        "https://fonts.googleapis.com",
        "https://unpkg.com",
        "'unsafe-inline'",
    ])
}

fn default_font_src() -> Vec<String> {
    sources(&["'self'", "https://fonts.gstatic.com"])
}

fn default_img_src() -> Vec<String> {
    sources(&["'self'", "data:", "https://*.openstreetmap.org", "https://unpkg.com"])
}

fn default_hsts_max_age() -> u64 {
    15_552_000 // 180 days
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            default_src: default_self_src(),
            connect_src: default_connect_src(),
            script_src: default_script_src(),
            style_src: default_style_src(),
            style_src_elem: default_style_src(),
            font_src: default_font_src(),
            img_src: default_img_src(),
            hsts_max_age_secs: default_hsts_max_age(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty, compact, json).
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Paths the development request logger skips.
    #[serde(default)]
    pub exclude_paths: Vec<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            exclude_paths: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Configuration with every default and the given secret.
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            server: ServerBindConfig {
                host: default_host(),
                port: default_port(),
                environment: Environment::default(),
                request_timeout_secs: default_request_timeout(),
            },
            auth: AuthConfig {
                jwt_secret: jwt_secret.into(),
                jwt_expires_in_secs: default_jwt_expiry(),
                cookie_expires_in_days: default_cookie_expiry(),
                cookie_secure: false,
            },
            rate_limit: RateLimitConfig::default(),
            body: BodyConfig::default(),
            params: ParamsConfig::default(),
            security: SecurityConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_deserializes_lowercase() {
        let env: Environment = serde_json::from_str("\"production\"").unwrap();
        assert_eq!(env, Environment::Production);
        assert!(!env.is_development());
        assert!(Environment::default().is_development());
    }

    #[test]
    fn test_defaults_match_hardening_profile() {
        let config = ServerConfig::with_secret("x".repeat(32));
        assert_eq!(config.rate_limit.max_requests, 100);
        assert_eq!(config.rate_limit.window_secs, 3600);
        assert_eq!(config.rate_limit.path_prefix, "/api");
        assert_eq!(config.body.limit_bytes, 10_240);
        assert!(config.params.whitelist.contains(&"price".to_string()));
        assert!(!config.params.whitelist.contains(&"page".to_string()));
        assert_eq!(config.security.style_src, config.security.style_src_elem);
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig::with_secret("x".repeat(32));
        assert_eq!(config.server.socket_addr().unwrap().port(), 3000);
    }
}
