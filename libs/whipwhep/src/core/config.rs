// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Client configuration via `whipwhep.yaml`.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::{Result, RtcError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Upper bound for the offer/answer HTTP exchange. `None` waits forever.
    pub timeout_ms: Option<u64>,
    /// Optional Bearer token for authentication.
    pub auth_token: Option<String>,
    /// Origin the client runs under, used for the secure-context check
    /// (e.g. `http://192.168.1.10:8080`). `None` skips the check.
    pub page_origin: Option<String>,
}

impl ClientConfig {
    /// Configuration file name.
    pub const FILE_NAME: &'static str = "whipwhep.yaml";

    pub fn exchange_timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn page_origin_url(&self) -> Result<Option<Url>> {
        self.page_origin
            .as_deref()
            .map(|origin| {
                Url::parse(origin).map_err(|e| {
                    RtcError::Configuration(format!("Invalid page_origin {}: {}", origin, e))
                })
            })
            .transpose()
    }

    /// Load configuration from an explicit file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RtcError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| {
            RtcError::Configuration(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        tracing::info!("Loaded client config from {}", path.display());
        Ok(config)
    }

    /// Load `whipwhep.yaml` from a directory, returning defaults if the file
    /// is missing or unparseable.
    pub fn load_or_default(dir: &Path) -> Self {
        let config_path = dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            tracing::debug!(
                "No {} found in {}, using defaults",
                Self::FILE_NAME,
                dir.display()
            );
            return Self::default();
        }

        match Self::from_file(&config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }
}
