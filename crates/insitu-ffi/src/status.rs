//! Return convention and error codes of the C ABI.
//!
//! Every protocol operation returns [`YT_SUCCESS`] or [`YT_FAIL`]. The
//! finer-grained [`YtErrorCode`] of the last failure is read back with
//! `yt_last_error()`. Conversions from the core error enums are provided.

use std::ffi::c_int;

use insitu_core::{AccessError, BootstrapError, ConfigError, LifecycleError, RegistryError};

/// Returned by a protocol operation that completed.
pub const YT_SUCCESS: c_int = 1;
/// Returned by a protocol operation that failed.
pub const YT_FAIL: c_int = 0;

/// Why the last operation on this thread failed.
///
/// `None` = 0, all errors are negative. Values are ABI-stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum YtErrorCode {
    /// No failure recorded.
    None = 0,
    /// A pointer is null, a count is negative, or a string is not UTF-8.
    InvalidArgument = -1,
    /// `yt_param_libyt` was rejected.
    Config = -2,
    /// A bootstrap phase ran out of order.
    Sequence = -3,
    /// The `libyt` module could not be imported.
    ModuleLoad = -4,
    /// The analysis script could not be imported.
    ScriptImport = -5,
    /// `yt_init` was called twice.
    AlreadyInitialized = -6,
    /// `yt_init` has not been called.
    NotInitialized = -7,
    /// `yt_set_parameter` has not been called.
    ParametersNotSet = -8,
    /// There are no particle species to hand out.
    NoParticleSpecies = -9,
    /// Field, grid or species descriptors were rejected.
    Registry = -10,
    /// `yt_commit_particles` was called before `yt_get_particlesPtr`.
    ParticlesNotReleased = -11,
    /// Internal error (a poisoned lock after a prior panic).
    Internal = -20,
    /// A Rust panic was caught at the C boundary.
    Panicked = -128,
}

impl From<&ConfigError> for YtErrorCode {
    fn from(_e: &ConfigError) -> Self {
        YtErrorCode::Config
    }
}

impl From<&RegistryError> for YtErrorCode {
    fn from(_e: &RegistryError) -> Self {
        YtErrorCode::Registry
    }
}

impl From<&LifecycleError> for YtErrorCode {
    fn from(e: &LifecycleError) -> Self {
        match e {
            LifecycleError::AlreadyInitialized => YtErrorCode::AlreadyInitialized,
            LifecycleError::NotInitialized { .. } => YtErrorCode::NotInitialized,
        }
    }
}

impl From<&AccessError> for YtErrorCode {
    fn from(e: &AccessError) -> Self {
        match e {
            AccessError::NotInitialized { .. } => YtErrorCode::NotInitialized,
            AccessError::ParametersNotSet { .. } => YtErrorCode::ParametersNotSet,
            AccessError::NoParticleSpecies { .. } => YtErrorCode::NoParticleSpecies,
        }
    }
}

impl From<&BootstrapError> for YtErrorCode {
    fn from(e: &BootstrapError) -> Self {
        match e {
            BootstrapError::Sequence { .. } => YtErrorCode::Sequence,
            BootstrapError::ModuleLoad { .. } => YtErrorCode::ModuleLoad,
            BootstrapError::ScriptImport { .. } => YtErrorCode::ScriptImport,
            BootstrapError::Config(c) => YtErrorCode::from(c),
            BootstrapError::Lifecycle(l) => YtErrorCode::from(l),
        }
    }
}
