//! Process-wide enforcement mode.
//!
//! The mode is fixed once per process, either explicitly through [`init`] at
//! startup or lazily on first use from the `PACTUM_CONTRACTS` environment
//! variable. Contract constructors sample it when they build a wrapper, never
//! per call. Changing the mode therefore requires a new process; wrappers
//! built under one mode keep that behavior for their lifetime.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable consulted when no mode was fixed explicitly.
pub const ENV_VAR: &str = "PACTUM_CONTRACTS";

static MODE: OnceLock<EnforcementMode> = OnceLock::new();

/// Whether contracts materialize any runtime checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnforcementMode {
    Enabled,
    Disabled,
}

/// Errors from fixing or parsing the enforcement mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnforcementError {
    #[error("enforcement mode is already fixed to {current}, cannot switch to {requested}")]
    AlreadyFixed {
        current: EnforcementMode,
        requested: EnforcementMode,
    },

    #[error("invalid enforcement mode '{value}', expected enabled or disabled")]
    InvalidMode { value: String },
}

impl EnforcementMode {
    pub fn is_enabled(self) -> bool {
        self == EnforcementMode::Enabled
    }

    /// Mode used when nothing is configured: enabled with debug assertions,
    /// disabled in optimized builds.
    pub fn build_default() -> Self {
        if cfg!(debug_assertions) {
            EnforcementMode::Enabled
        } else {
            EnforcementMode::Disabled
        }
    }

    /// Reads [`ENV_VAR`], falling back to [`build_default`](Self::build_default).
    pub fn from_env() -> Self {
        EnforcementMode::resolve(std::env::var(ENV_VAR).ok().as_deref())
    }

    /// Mode for a raw [`ENV_VAR`] value. Unset or unparseable values give
    /// the build default.
    fn resolve(raw: Option<&str>) -> Self {
        match raw {
            Some(raw) => raw.parse().unwrap_or_else(|err: EnforcementError| {
                tracing::warn!(error = %err, "ignoring {}", ENV_VAR);
                EnforcementMode::build_default()
            }),
            None => EnforcementMode::build_default(),
        }
    }
}

impl fmt::Display for EnforcementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnforcementMode::Enabled => f.write_str("enabled"),
            EnforcementMode::Disabled => f.write_str("disabled"),
        }
    }
}

impl FromStr for EnforcementMode {
    type Err = EnforcementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on" | "enabled" | "true" | "1" => Ok(EnforcementMode::Enabled),
            "off" | "disabled" | "false" | "0" => Ok(EnforcementMode::Disabled),
            _ => Err(EnforcementError::InvalidMode {
                value: s.to_string(),
            }),
        }
    }
}

/// Fixes the process-wide mode. Must run before any contract is built to
/// take effect.
///
/// Calling it again with the mode already in force is a no-op; asking for
/// the other mode fails.
pub fn init(mode: EnforcementMode) -> Result<(), EnforcementError> {
    let current = *MODE.get_or_init(|| {
        tracing::debug!(%mode, "contract enforcement fixed at startup");
        mode
    });
    if current == mode {
        Ok(())
    } else {
        Err(EnforcementError::AlreadyFixed {
            current,
            requested: mode,
        })
    }
}

/// The process-wide mode, resolving it from the environment on first use.
pub fn mode() -> EnforcementMode {
    *MODE.get_or_init(|| {
        let mode = EnforcementMode::from_env();
        tracing::debug!(%mode, "contract enforcement resolved from environment");
        mode
    })
}
