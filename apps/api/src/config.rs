use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::analysis::details::{DEFAULT_DETAIL_MATCH_SCORE, DEFAULT_DETAIL_WEIGHT};
use crate::storage::yandex::YANDEX_DISK_API;

const MAX_TIMEOUT_SECS: u64 = 60 * 60;
const MAX_SCORING_RETRIES: u32 = 10;

/// Where uploaded resume files go.
#[derive(Debug, Clone)]
pub enum FileStoreConfig {
    S3 {
        bucket: String,
        endpoint: String,
        region: String,
        /// Base of the URLs handed back to clients. Defaults to `endpoint`.
        public_url: String,
        access_key_id: String,
        secret_access_key: String,
    },
    Yandex {
        token: String,
        folder: String,
        api_base: String,
    },
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    pub scoring_host: String,
    pub scoring_port: u16,
    pub scoring_timeout: Duration,
    pub scoring_max_retries: u32,
    pub analysis_timeout: Duration,
    pub max_upload_bytes: usize,
    pub parse_on_upload: bool,
    pub detail_match_score: f64,
    pub detail_weight: f64,
    pub file_store: FileStoreConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env = Env(&lookup);

        let file_store = match env.or("FILE_STORE", "s3").to_ascii_lowercase().as_str() {
            "s3" => {
                let endpoint = env.require("S3_ENDPOINT")?;
                FileStoreConfig::S3 {
                    bucket: env.require("S3_BUCKET")?,
                    region: env.or("S3_REGION", "us-east-1"),
                    public_url: env.or("S3_PUBLIC_URL", &endpoint),
                    endpoint,
                    access_key_id: env.require("AWS_ACCESS_KEY_ID")?,
                    secret_access_key: env.require("AWS_SECRET_ACCESS_KEY")?,
                }
            }
            "yandex" => FileStoreConfig::Yandex {
                token: env.require("YANDEX_DISK_TOKEN")?,
                folder: env.or("YANDEX_DISK_FOLDER", "hr-ai"),
                api_base: env.or("YANDEX_DISK_API", YANDEX_DISK_API),
            },
            other => bail!("FILE_STORE must be 's3' or 'yandex', got '{other}'"),
        };

        let detail_match_score = env.parse("DETAIL_MATCH_SCORE", DEFAULT_DETAIL_MATCH_SCORE)?;
        let detail_weight = env.parse("DETAIL_WEIGHT", DEFAULT_DETAIL_WEIGHT)?;
        for (key, value) in [
            ("DETAIL_MATCH_SCORE", detail_match_score),
            ("DETAIL_WEIGHT", detail_weight),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("{key} must be within [0, 1], got {value}");
            }
        }

        let scoring_max_retries = env.parse("SCORING_MAX_RETRIES", 2)?;
        if scoring_max_retries > MAX_SCORING_RETRIES {
            bail!(
                "SCORING_MAX_RETRIES must be at most {MAX_SCORING_RETRIES}, got {scoring_max_retries}"
            );
        }

        Ok(Config {
            database_url: env.require("DATABASE_URL")?,
            port: env.parse("PORT", 8080)?,
            rust_log: env.or("RUST_LOG", "info"),
            scoring_host: env.or("SCORING_HOST", "scoring-service").trim().to_string(),
            scoring_port: env.parse("SCORING_PORT", 50051)?,
            scoring_timeout: env.timeout_secs("SCORING_TIMEOUT_SECS", 30)?,
            scoring_max_retries,
            analysis_timeout: env.timeout_secs("ANALYSIS_TIMEOUT_SECS", 60)?,
            max_upload_bytes: env.parse("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            parse_on_upload: env.parse("PARSE_ON_UPLOAD", true)?,
            detail_match_score,
            detail_weight,
            file_store,
        })
    }

    /// `host:port` of the scoring service; IPv6 literals are bracketed.
    pub fn scoring_address(&self) -> String {
        if self.scoring_host.contains(':') && !self.scoring_host.starts_with('[') {
            format!("[{}]:{}", self.scoring_host, self.scoring_port)
        } else {
            format!("{}:{}", self.scoring_host, self.scoring_port)
        }
    }
}

struct Env<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn require(&self, key: &str) -> Result<String> {
        self.get(key)
            .with_context(|| format!("Required environment variable '{key}' is not set"))
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Whole seconds in `1..=MAX_TIMEOUT_SECS`.
    fn timeout_secs(&self, key: &str, default: u64) -> Result<Duration> {
        let secs: u64 = self.parse(key, default)?;
        if secs == 0 || secs > MAX_TIMEOUT_SECS {
            bail!("{key} must be between 1 and {MAX_TIMEOUT_SECS} seconds, got {secs}");
        }
        Ok(Duration::from_secs(secs))
    }

    fn parse<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("{key} has invalid value '{raw}': {e}")),
        }
    }
}

#[cfg(test)]
impl Config {
    /// Minimal config for router tests; never touches the environment.
    pub fn for_tests() -> Self {
        Self::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost/test".to_string()),
            "FILE_STORE" => Some("yandex".to_string()),
            "YANDEX_DISK_TOKEN" => Some("token".to_string()),
            _ => None,
        })
        .expect("test config")
    }
}
