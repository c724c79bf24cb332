//! Runtime configuration consumed by the bootstrap sequence.

use tracing::level_filters::LevelFilter;

use crate::error::ConfigError;
use crate::id::Rank;

/// Diagnostic verbosity, matching the numeric levels of the C ABI.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// No diagnostics.
    Off = 0,
    /// Progress messages.
    #[default]
    Info = 1,
    /// Progress plus warnings.
    Warning = 2,
    /// Everything, including module and dictionary setup.
    Debug = 3,
}

impl Verbosity {
    /// Parse the numeric level used by `yt_param_libyt.verbose`.
    pub fn from_level(level: i32) -> Result<Self, ConfigError> {
        match level {
            0 => Ok(Self::Off),
            1 => Ok(Self::Info),
            2 => Ok(Self::Warning),
            3 => Ok(Self::Debug),
            _ => Err(ConfigError::InvalidVerbosity { level }),
        }
    }

    /// The `tracing` filter this level enables.
    pub fn level_filter(self) -> LevelFilter {
        match self {
            Self::Off => LevelFilter::OFF,
            Self::Info => LevelFilter::INFO,
            Self::Warning => LevelFilter::WARN,
            Self::Debug => LevelFilter::DEBUG,
        }
    }
}

/// Configuration for starting an in-situ session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitConfig {
    /// Name of the analysis script module, without the `.py` extension.
    pub script: String,
    /// Diagnostic verbosity.
    pub verbose: Verbosity,
    /// This process's rank, used in diagnostics.
    pub rank: Rank,
}

impl InitConfig {
    /// Configuration for `script` at the default verbosity on rank 0.
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            verbose: Verbosity::default(),
            rank: Rank::default(),
        }
    }

    /// Check that the script name can be imported as a module.
    ///
    /// Accepts dotted paths of identifiers (`pkg.analysis`). A trailing
    /// `.py` is reported separately since it is the usual mistake.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let script = self.script.as_str();
        if script.is_empty() {
            return Err(ConfigError::EmptyScript);
        }
        if script.ends_with(".py") {
            return Err(ConfigError::ScriptHasExtension {
                script: script.to_string(),
            });
        }
        if !script.split('.').all(is_identifier) {
            return Err(ConfigError::InvalidScriptName {
                script: script.to_string(),
            });
        }
        Ok(())
    }
}

fn is_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_alphanumeric())
}
