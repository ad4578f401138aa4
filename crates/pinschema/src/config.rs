//! CLI configuration using Figment
//!
//! Settings are read from:
//! 1. `pinschema.toml` (or the file given with `--config`)
//! 2. Environment variables prefixed with `PINSCHEMA_`, e.g.
//!    `PINSCHEMA_CALLING_CONTEXT=Pawn`
//!
//! Command line flags override both.

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};

/// Settings shared by every subcommand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinschemaConfig {
    /// Type manifest to load instead of the bare engine types
    #[serde(default)]
    pub types: Option<PathBuf>,
    /// Class that `self` pins resolve to
    #[serde(default)]
    pub calling_context: Option<String>,
    /// Tracing filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_log_filter() -> String {
    "pinschema=info".to_string()
}

impl Default for PinschemaConfig {
    fn default() -> Self {
        Self {
            types: None,
            calling_context: None,
            log_filter: default_log_filter(),
        }
    }
}

impl PinschemaConfig {
    /// Load from `path` (if it exists) and the environment
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("PINSCHEMA_"))
            .extract()
    }

    /// Reject settings that cannot be acted on
    pub fn validate(&self) -> Result<(), String> {
        if self.calling_context.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err("calling_context must name a class".to_string());
        }
        if self.log_filter.trim().is_empty() {
            return Err("log_filter must not be empty".to_string());
        }
        Ok(())
    }
}
