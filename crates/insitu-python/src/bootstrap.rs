//! Two-phase runtime bootstrap.
//!
//! ```text
//! Unregistered --register()--> Registered --activate()--> Activated
//!                                   |
//!                                   +--(import failure)--> Aborted
//! ```
//!
//! Every out-of-order call fails with [`BootstrapError::Sequence`] and
//! leaves the phase unchanged. `Aborted` is terminal.

use std::ffi::CString;
use std::sync::{Mutex, MutexGuard, PoisonError};

use pyo3::prelude::*;

use insitu_core::{BootstrapError, InitConfig};

use crate::module::{libyt as libyt_module, MODULE_NAME};
use crate::session::{install_context, withdraw_context, SharedContext};

/// Where the process is in the bootstrap sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootstrapPhase {
    /// Nothing has been registered yet.
    Unregistered,
    /// `libyt` is in the init table; the script is not loaded.
    Registered,
    /// `libyt` and the analysis script are imported.
    Activated,
    /// An import failed. No further phase may run.
    Aborted,
}

impl BootstrapPhase {
    fn check_register(self, runtime_running: bool) -> Result<(), BootstrapError> {
        match self {
            Self::Unregistered if runtime_running => Err(sequence(
                "register",
                "the interpreter is already running, register before starting it",
            )),
            Self::Unregistered => Ok(()),
            Self::Registered | Self::Activated => {
                Err(sequence("register", "libyt is already registered"))
            }
            Self::Aborted => Err(sequence("register", "bootstrap was aborted")),
        }
    }

    fn check_activate(self, runtime_running: bool) -> Result<(), BootstrapError> {
        match self {
            Self::Unregistered => Err(sequence("activate", "libyt is not registered")),
            Self::Registered if !runtime_running => {
                Err(sequence("activate", "the interpreter has not been started"))
            }
            Self::Registered => Ok(()),
            Self::Activated => Err(sequence("activate", "already activated")),
            Self::Aborted => Err(sequence("activate", "bootstrap was aborted")),
        }
    }
}

fn sequence(operation: &'static str, reason: &'static str) -> BootstrapError {
    BootstrapError::Sequence { operation, reason }
}

static PHASE: Mutex<BootstrapPhase> = Mutex::new(BootstrapPhase::Unregistered);

fn lock_phase() -> MutexGuard<'static, BootstrapPhase> {
    PHASE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Current bootstrap phase.
pub fn phase() -> BootstrapPhase {
    *lock_phase()
}

fn runtime_running() -> bool {
    // SAFETY: Py_IsInitialized may be called at any time, with or without
    // the GIL.
    unsafe { pyo3::ffi::Py_IsInitialized() != 0 }
}

/// Phase A: add `libyt` to the interpreter's init table.
///
/// Must run before the interpreter starts, and only once.
pub fn register() -> Result<(), BootstrapError> {
    let mut phase = lock_phase();
    phase.check_register(runtime_running())?;

    pyo3::append_to_inittab!(libyt_module);
    *phase = BootstrapPhase::Registered;
    tracing::debug!(module = MODULE_NAME, "registering module ... done");
    Ok(())
}

/// Phase B: import `libyt`, then the analysis script.
///
/// `script` is a module name without the `.py` extension. On an import
/// failure the Python traceback is printed and the sequence is aborted.
pub fn activate(script: &str) -> Result<(), BootstrapError> {
    let mut phase = lock_phase();
    phase.check_activate(runtime_running())?;

    match Python::attach(|py| import_all(py, script)) {
        Ok(()) => {
            *phase = BootstrapPhase::Activated;
            Ok(())
        }
        Err(e) => {
            *phase = BootstrapPhase::Aborted;
            tracing::error!(error = %e, "bootstrap aborted");
            Err(e)
        }
    }
}

fn import_all(py: Python<'_>, script: &str) -> Result<(), BootstrapError> {
    py.import(MODULE_NAME).map_err(|e| {
        e.print(py);
        BootstrapError::ModuleLoad {
            module: MODULE_NAME.to_string(),
            reason: e.to_string(),
        }
    })?;
    tracing::debug!("import {MODULE_NAME} ... done");

    let statement =
        CString::new(format!("import {script}")).map_err(|_| BootstrapError::ScriptImport {
            script: script.to_string(),
            reason: "script name contains a NUL byte".to_string(),
        })?;
    py.run(&statement, None, None).map_err(|e| {
        e.print(py);
        BootstrapError::ScriptImport {
            script: script.to_string(),
            reason: e.to_string(),
        }
    })?;
    tracing::debug!(script, "importing inline analysis script ... done");
    Ok(())
}

/// Run the whole sequence for a host that does not start the interpreter
/// itself.
///
/// Validates `config`, registers `libyt`, publishes `ctx`, starts the
/// interpreter, activates, and finally marks `ctx` as initialized. On
/// failure `ctx` is withdrawn again. The
/// context lock is not held while the script is imported, so the script
/// may call `derived_func` (which reports missing parameters).
pub fn start(ctx: &SharedContext, config: &InitConfig) -> Result<(), BootstrapError> {
    config.validate()?;
    register()?;
    install_context(ctx.clone());
    Python::initialize();
    let activated = activate(&config.script).and_then(|()| {
        ctx.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .mark_runtime_initialized()
            .map_err(BootstrapError::from)
    });
    if let Err(e) = activated {
        withdraw_context(ctx);
        return Err(e);
    }
    tracing::info!(rank = %config.rank, script = %config.script, "in-situ runtime initialized");
    Ok(())
}
