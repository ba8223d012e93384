// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Plugin configuration via `unitex.toml` and environment overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::{Result, UnitexError};

/// Settings read once at `UnityPluginLoad`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UnitexConfig {
    /// `tracing` filter directive, e.g. `"unitex=debug"`.
    pub log_filter: Option<String>,
    /// Upper bound on the D3D12 fence wait before reusing the command
    /// allocator. Unset waits forever.
    pub fence_timeout_ms: Option<u64>,
    /// Ask OpenGL Core for the bound texture's real size instead of trusting
    /// the registered one.
    pub query_gl_texture_size: bool,
}

impl Default for UnitexConfig {
    fn default() -> Self {
        Self {
            log_filter: None,
            fence_timeout_ms: None,
            query_gl_texture_size: true,
        }
    }
}

impl UnitexConfig {
    /// Configuration file name.
    pub const FILE_NAME: &'static str = "unitex.toml";
    /// Environment variable holding an explicit config file path.
    pub const ENV_CONFIG: &'static str = "UNITEX_CONFIG";
    /// Environment variable overriding `log_filter`.
    pub const ENV_LOG: &'static str = "UNITEX_LOG";
    /// Environment variable overriding `fence_timeout_ms`.
    pub const ENV_FENCE_TIMEOUT: &'static str = "UNITEX_FENCE_TIMEOUT_MS";

    const DEFAULT_LOG_FILTER: &'static str = "info";

    /// Parse a config file. Errors if it is missing or malformed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            UnitexError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            UnitexError::Configuration(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse a config file, falling back to defaults when it is missing or
    /// malformed.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!("No {} found, using defaults", path.display());
            return Self::default();
        }

        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Resolve the config the plugin runs with: file from `UNITEX_CONFIG`
    /// (or `unitex.toml` in the working directory), then environment
    /// overrides. `lookup` reads a variable, normally `std::env::var`.
    pub fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let path = lookup(Self::ENV_CONFIG)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(Self::FILE_NAME));

        let mut config = Self::load_or_default(&path);
        config.apply_overrides(lookup);
        config
    }

    /// Apply `UNITEX_LOG` and `UNITEX_FENCE_TIMEOUT_MS`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(filter) = lookup(Self::ENV_LOG).filter(|s| !s.trim().is_empty()) {
            self.log_filter = Some(filter);
        }

        if let Some(raw) = lookup(Self::ENV_FENCE_TIMEOUT) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => self.fence_timeout_ms = Some(ms),
                Err(e) => tracing::warn!(
                    "Ignoring {}={:?}: {}",
                    Self::ENV_FENCE_TIMEOUT,
                    raw,
                    e
                ),
            }
        }
    }

    /// Filter directive for the log subscriber.
    pub fn log_directive(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(Self::DEFAULT_LOG_FILTER)
    }

    pub fn fence_timeout(&self) -> Option<Duration> {
        self.fence_timeout_ms.map(Duration::from_millis)
    }
}
