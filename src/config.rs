use std::{env, path::PathBuf, str::FromStr, time::Duration};

use crate::{
    error::{SentryError, SentryResult},
    reputation::ReputationConfig,
};

/// What to answer when an uploaded image holds no readable QR code and no inline text was sent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodeFailurePolicy {
    #[default]
    Error,
    DefaultLow,
}

impl FromStr for DecodeFailurePolicy {
    type Err = SentryError;

    fn from_str(s: &str) -> SentryResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "default_low" => Ok(Self::DefaultLow),
            other => Err(SentryError::Config(format!(
                "invalid ON_DECODE_FAILURE: {other} (expected error or default_low)"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub tips_path: PathBuf,
    pub reputation: ReputationConfig,
    pub on_decode_failure: DecodeFailurePolicy,
    pub sandbox_dir: Option<PathBuf>, // None disables spooling uploads to disk
    pub max_upload_bytes: usize,
    pub cors_allowed_origins: Vec<String>, // Empty allows any origin
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 8000,
            log_level: "info".to_owned(),
            tips_path: PathBuf::from("assets/qr_tips.json"),
            reputation: ReputationConfig::default(),
            on_decode_failure: DecodeFailurePolicy::Error,
            sandbox_dir: Some(PathBuf::from("sandbox")),
            max_upload_bytes: 10 * 1024 * 1024,
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    /// Loads `.env` file if present. Every variable has a default, but values that are set must
    /// parse.
    pub fn from_env() -> SentryResult<Self> {
        // Best-effort .env load; ignore if missing
        let _ = dotenvy::dotenv();

        let defaults = Self::default();

        let api_key = get_var_or("REPUTATION_API_KEY", "");
        let timeout_ms: u64 = parse_var("REPUTATION_TIMEOUT_MS", defaults.reputation.timeout.as_millis() as u64)?;

        let sandbox_dir = match env::var("SANDBOX_DIR") {
            Ok(v) if v.trim().is_empty() => None,
            Ok(v) => Some(PathBuf::from(v)),
            Err(_) => defaults.sandbox_dir,
        };

        Ok(Self {
            host: get_var_or("HOST", &defaults.host),
            port: parse_var("PORT", defaults.port)?,
            log_level: get_var_or("LOG_LEVEL", &defaults.log_level),
            tips_path: env::var("TIPS_PATH").map(PathBuf::from).unwrap_or(defaults.tips_path),
            reputation: ReputationConfig {
                base_url: get_var_or("REPUTATION_BASE_URL", &defaults.reputation.base_url)
                    .trim_end_matches('/')
                    .to_owned(),
                api_key,
                timeout: Duration::from_millis(timeout_ms),
            },
            on_decode_failure: match env::var("ON_DECODE_FAILURE") {
                Ok(v) => v.parse()?,
                Err(_) => defaults.on_decode_failure,
            },
            sandbox_dir,
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            cors_allowed_origins: parse_csv(&get_var_or("CORS_ALLOWED_ORIGINS", "")),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn get_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_var<T>(key: &str, default: T) -> SentryResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(v) => v.trim().parse().map_err(|e| SentryError::Config(format!("invalid {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',').map(|s| s.trim().to_owned()).filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
mod config_tests {
    use std::env;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::Duration;

    use test_case::test_case;

    use super::{parse_csv, AppConfig, DecodeFailurePolicy};
    use crate::error::SentryError;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const VARS: [&str; 11] = [
        "HOST",
        "PORT",
        "LOG_LEVEL",
        "TIPS_PATH",
        "REPUTATION_BASE_URL",
        "REPUTATION_API_KEY",
        "REPUTATION_TIMEOUT_MS",
        "ON_DECODE_FAILURE",
        "SANDBOX_DIR",
        "MAX_UPLOAD_BYTES",
        "CORS_ALLOWED_ORIGINS",
    ];

    fn clear_env() {
        for key in VARS {
            env::remove_var(key);
        }
    }

    #[test]
    fn config_defaults() {
        let _guard = ENV_LOCK.lock().expect("env lock poisoned");
        clear_env();

        let cfg = AppConfig::from_env().expect("should parse config");
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8000");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.tips_path, PathBuf::from("assets/qr_tips.json"));
        assert_eq!(cfg.reputation.base_url, "https://www.virustotal.com/api/v3");
        assert_eq!(cfg.reputation.timeout, Duration::from_millis(2000));
        assert_eq!(cfg.on_decode_failure, DecodeFailurePolicy::Error);
        assert_eq!(cfg.sandbox_dir, Some(PathBuf::from("sandbox")));
        assert_eq!(cfg.max_upload_bytes, 10_485_760);
        assert!(cfg.cors_allowed_origins.is_empty());
    }

    #[test]
    fn config_overrides() {
        let _guard = ENV_LOCK.lock().expect("env lock poisoned");
        clear_env();

        env::set_var("PORT", "9000");
        env::set_var("REPUTATION_BASE_URL", "http://localhost:8089/api/v3/");
        env::set_var("REPUTATION_API_KEY", "secret");
        env::set_var("REPUTATION_TIMEOUT_MS", "750");
        env::set_var("ON_DECODE_FAILURE", "default_low");
        env::set_var("SANDBOX_DIR", "");
        env::set_var("CORS_ALLOWED_ORIGINS", "http://localhost:3000, https://app.example ,");

        let cfg = AppConfig::from_env().expect("should parse config");
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.reputation.base_url, "http://localhost:8089/api/v3");
        assert_eq!(cfg.reputation.api_key, "secret");
        assert_eq!(cfg.reputation.timeout, Duration::from_millis(750));
        assert_eq!(cfg.on_decode_failure, DecodeFailurePolicy::DefaultLow);
        assert_eq!(cfg.sandbox_dir, None);
        assert_eq!(cfg.cors_allowed_origins, vec!["http://localhost:3000", "https://app.example"]);

        clear_env();
    }

    #[test_case("PORT", "eighty")]
    #[test_case("PORT", "70000")]
    #[test_case("REPUTATION_TIMEOUT_MS", "-5")]
    #[test_case("MAX_UPLOAD_BYTES", "10MB")]
    #[test_case("ON_DECODE_FAILURE", "ignore")]
    fn config_rejects_invalid_values(key: &str, value: &str) {
        let _guard = ENV_LOCK.lock().expect("env lock poisoned");
        clear_env();

        env::set_var(key, value);
        let res = AppConfig::from_env();
        assert!(matches!(res, Err(SentryError::Config(ref msg)) if msg.contains(key)));

        clear_env();
    }

    #[test_case("error", DecodeFailurePolicy::Error)]
    #[test_case("DEFAULT_LOW", DecodeFailurePolicy::DefaultLow)]
    fn policy_parse(s: &str, exp: DecodeFailurePolicy) {
        assert_eq!(s.parse::<DecodeFailurePolicy>().unwrap(), exp);
    }

    #[test]
    fn csv_parse() {
        assert!(parse_csv("").is_empty());
        assert_eq!(parse_csv("a,,b"), vec!["a", "b"]);
    }
}
