use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::ranking::bias::BiasConfig;

const DEFAULT_MODEL_PATH: &str = "decision_tree_model.json";

/// Where the scoring model comes from. Chosen once at startup.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelSource {
    /// Remote predict endpoint.
    Http { url: String },
    /// Tree artifact stored in S3 / MinIO.
    S3 {
        bucket: String,
        key: String,
        endpoint: String,
        region: String,
        access_key_id: String,
        secret_access_key: String,
    },
    /// Tree artifact on local disk.
    File { path: PathBuf },
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub model_source: ModelSource,
    pub bias: BiasConfig,
    pub audit_lock_ttl_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key → value lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            lookup(key)
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let defaults = BiasConfig::default();
        let bias = BiasConfig {
            min_sample_size: parse_or(&lookup, "BIAS_MIN_SAMPLE_SIZE", defaults.min_sample_size)?,
            threshold: parse_or(&lookup, "BIAS_THRESHOLD", defaults.threshold)?,
        };

        let model_source = if let Some(url) = lookup("SCORING_MODEL_URL") {
            ModelSource::Http { url }
        } else if let Some(bucket) = lookup("MODEL_S3_BUCKET") {
            ModelSource::S3 {
                bucket,
                key: require("MODEL_S3_KEY")?,
                endpoint: require("S3_ENDPOINT")?,
                region: lookup("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                access_key_id: require("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require("AWS_SECRET_ACCESS_KEY")?,
            }
        } else {
            ModelSource::File {
                path: lookup("MODEL_PATH")
                    .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string())
                    .into(),
            }
        };

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            redis_url: require("REDIS_URL")?,
            model_source,
            bias,
            audit_lock_ttl_secs: parse_or(&lookup, "BIAS_LOCK_TTL_SECS", 60)?,
            port: parse_or(&lookup, "PORT", 8080)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
