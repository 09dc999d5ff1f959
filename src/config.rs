// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::metrics::{secs, MetricsThresholds};
use crate::tutor::PASS_MARKER;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("config value `{0}` must be greater than zero")]
    ZeroInterval(&'static str),
    #[error("pass marker must not be empty")]
    EmptyMarker,
    #[error("short message threshold ({short}) must be below the long one ({long})")]
    MessageThresholds { short: usize, long: usize },
}

/// Tunables for one learning session. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    /// Language tag passed to the tutor with every request.
    pub language: String,
    pub pass_marker: String,
    /// Time without a structural edit before an idle nudge fires.
    #[serde(with = "secs")]
    pub idle_threshold: Duration,
    #[serde(with = "secs")]
    pub idle_poll: Duration,
    #[serde(with = "millis")]
    pub render_debounce: Duration,
    pub metrics: MetricsThresholds,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            language: "en".to_owned(),
            pass_marker: PASS_MARKER.to_owned(),
            idle_threshold: Duration::from_secs(120),
            idle_poll: Duration::from_secs(30),
            render_debounce: Duration::from_millis(600),
            metrics: MetricsThresholds::default(),
        }
    }
}

impl SessionConfig {
    pub fn from_json(input: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(input)
            .map_err(|source| ConfigError::Json { path: path.to_path_buf(), source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let input = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_json(&input, path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pass_marker.trim().is_empty() {
            return Err(ConfigError::EmptyMarker);
        }
        for (name, value) in [
            ("idleThreshold", self.idle_threshold),
            ("idlePoll", self.idle_poll),
            ("renderDebounce", self.render_debounce),
            ("metrics.maxGap", self.metrics.max_gap),
        ] {
            if value.is_zero() {
                return Err(ConfigError::ZeroInterval(name));
            }
        }
        let (short, long) = (self.metrics.short_message_chars, self.metrics.long_message_chars);
        if short >= long {
            return Err(ConfigError::MessageThresholds { short, long });
        }
        Ok(())
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis().min(u128::from(u64::MAX)) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
