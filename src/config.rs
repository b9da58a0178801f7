//! Compiler configuration, loaded from `sqlexpr.toml`.
//!
//! ```toml
//! dialect = "oracle"
//! strip_upper_in_like = false
//! max_depth = 256
//! oracle_compact_guid = true
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ConfigError;
use crate::transpiler::sql::oracle::OracleDialect;
use crate::transpiler::{CompileOptions, DEFAULT_MAX_DEPTH, Dialect, SqlDialect};

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "sqlexpr.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub dialect: Dialect,
    /// Suppress `upper(...)` around both sides of LIKE templates.
    pub strip_upper_in_like: bool,
    pub max_depth: usize,
    /// Oracle only: GUIDs as raw hex instead of `CAST(... AS VARCHAR2(37))`.
    pub oracle_compact_guid: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            strip_upper_in_like: false,
            max_depth: DEFAULT_MAX_DEPTH,
            oracle_compact_guid: false,
        }
    }
}

impl CompilerConfig {
    pub fn builder() -> CompilerConfigBuilder {
        CompilerConfigBuilder::default()
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: CompilerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// `./sqlexpr.toml`, then `<config dir>/sqlexpr/config.toml`, else defaults.
    pub fn discover() -> Result<Self, ConfigError> {
        match Self::candidate_paths().into_iter().find(|p| p.is_file()) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading compiler config");
                Self::load(path)
            }
            None => Ok(Self::default()),
        }
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("sqlexpr").join("config.toml"));
        }
        paths
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid("max_depth must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn dialect_provider(&self) -> Arc<dyn SqlDialect> {
        match self.dialect {
            Dialect::Oracle => Arc::new(OracleDialect::with_compact_guid(self.oracle_compact_guid)),
            other => other.provider(),
        }
    }

    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            strip_upper_in_like: self.strip_upper_in_like,
            max_depth: self.max_depth,
        }
    }
}

#[derive(Debug, Default)]
pub struct CompilerConfigBuilder {
    config: CompilerConfig,
}

impl CompilerConfigBuilder {
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.config.dialect = dialect;
        self
    }

    pub fn strip_upper_in_like(mut self, strip: bool) -> Self {
        self.config.strip_upper_in_like = strip;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    pub fn oracle_compact_guid(mut self, compact: bool) -> Self {
        self.config.oracle_compact_guid = compact;
        self
    }

    pub fn build(self) -> Result<CompilerConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
