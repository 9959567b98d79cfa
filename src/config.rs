//! Configuration objects.
//!
//! [`DesignOptions`] tunes the core pipeline. [`ServiceConfig`] describes the
//! HTTP collaborator that wraps it; it is built from an explicit key lookup so
//! nothing in the crate reads process-wide state.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codegen::TargetFormat;
use crate::extract::KeywordTable;

const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
const FIVE_MIB: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Failed to parse design options: {0}")]
    Parse(String),

    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct DesignOptions {
    /// Renderings to produce on success.
    pub formats: BTreeSet<TargetFormat>,
    /// Classifications below this confidence are reported as ambiguous.
    pub confidence_threshold: f32,
    pub keywords: KeywordTable,
    pub max_attachment_bytes: u64,
}

impl Default for DesignOptions {
    fn default() -> Self {
        DesignOptions {
            formats: TargetFormat::ALL.into_iter().collect(),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            keywords: KeywordTable::default(),
            max_attachment_bytes: FIVE_MIB,
        }
    }
}

impl DesignOptions {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimit {
    pub window_secs: u64,
    pub max_requests: u32,
}

impl Default for RateLimit {
    fn default() -> Self {
        RateLimit {
            window_secs: 15 * 60,
            max_requests: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    pub owner_email: String,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
}

/// Settings for the HTTP layer in front of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    pub port: u16,
    pub json_body_limit: u64,
    pub rate_limit: RateLimit,
    /// `None` leaves `/design` open and `/login` disabled.
    pub auth: Option<AuthConfig>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            port: 3000,
            json_body_limit: FIVE_MIB,
            rate_limit: RateLimit::default(),
            auth: None,
        }
    }
}

impl ServiceConfig {
    /// Build from a key lookup such as `|k| std::env::var(k).ok()`.
    ///
    /// Auth is enabled only when both `OWNER_EMAIL` and `JWT_SECRET` are set
    /// and non-empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ServiceConfig::default();

        if let Some(port) = lookup("PORT") {
            config.port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT".into(),
                value: port.clone(),
            })?;
        }

        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let (Some(owner_email), Some(jwt_secret)) = (non_empty("OWNER_EMAIL"), non_empty("JWT_SECRET")) {
            config.auth = Some(AuthConfig {
                owner_email,
                jwt_secret,
            });
        }

        Ok(config)
    }

    pub fn auth_enabled(&self) -> bool {
        self.auth.is_some()
    }
}
