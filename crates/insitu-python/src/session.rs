//! The context slot read by `libyt.derived_func`.
//!
//! The module initializer runs inside the interpreter and cannot capture
//! host state, so the active [`InSituContext`] is published through a
//! single process-wide slot. Everything behind the slot is an ordinary
//! context object owned by the host.

use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

use insitu_core::{DeriveError, DerivedField, GridId, InSituContext};

/// A context shared between the host and the interpreter bridge.
pub type SharedContext = Arc<Mutex<InSituContext>>;

static ACTIVE: Mutex<Option<SharedContext>> = Mutex::new(None);

/// Why a `derived_func` call could not produce an array.
#[derive(Debug, Error)]
pub(crate) enum CallError {
    #[error("no in-situ context is installed")]
    NoContext,
    #[error("in-situ context is poisoned by an earlier panic")]
    Poisoned,
    #[error(transparent)]
    Derive(#[from] DeriveError),
}

/// Publish `ctx` as the context served to the interpreter.
///
/// Returns the previously installed context, if any.
pub fn install_context(ctx: SharedContext) -> Option<SharedContext> {
    ACTIVE
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .replace(ctx)
}

/// Withdraw the installed context.
pub fn uninstall_context() -> Option<SharedContext> {
    ACTIVE.lock().unwrap_or_else(PoisonError::into_inner).take()
}

/// Withdraw `ctx` if it is the installed context.
///
/// Returns whether it was. A different installed context stays in place.
pub fn withdraw_context(ctx: &SharedContext) -> bool {
    let mut slot = ACTIVE.lock().unwrap_or_else(PoisonError::into_inner);
    match slot.as_ref() {
        Some(active) if Arc::ptr_eq(active, ctx) => {
            *slot = None;
            true
        }
        _ => false,
    }
}

/// The currently installed context.
pub fn active_context() -> Option<SharedContext> {
    ACTIVE.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Derive a field through the installed context.
///
/// The slot lock is released before the context lock is taken.
pub(crate) fn derive(grid: GridId, field_name: &str) -> Result<DerivedField, CallError> {
    let ctx = active_context().ok_or(CallError::NoContext)?;
    let ctx = ctx.lock().map_err(|_| CallError::Poisoned)?;
    Ok(ctx.compute_derived_field(grid, field_name)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use insitu_core::Rank;
    use insitu_test_utils::{density_scenario, ready_context};

    // The slot is process-wide; keep every slot assertion in one test.
    #[test]
    fn slot_install_derive_uninstall() {
        uninstall_context();
        assert!(matches!(
            derive(GridId(7), "density"),
            Err(CallError::NoContext)
        ));

        let ctx = Arc::new(Mutex::new(ready_context(0, density_scenario())));
        assert!(install_context(ctx.clone()).is_none());
        assert!(Arc::ptr_eq(&active_context().unwrap(), &ctx));

        let out = derive(GridId(7), "density").unwrap();
        assert_eq!(out.shape(), [2, 2, 2]);
        assert!(matches!(
            derive(GridId(7), "temperature"),
            Err(CallError::Derive(DeriveError::UnknownField { .. }))
        ));

        let other = Arc::new(Mutex::new(InSituContext::new(Rank(1))));
        let previous = install_context(other.clone()).unwrap();
        assert!(Arc::ptr_eq(&previous, &ctx));
        // Withdrawing a stale context leaves the installed one alone.
        assert!(!withdraw_context(&ctx));
        assert!(Arc::ptr_eq(&active_context().unwrap(), &other));
        assert!(matches!(
            derive(GridId(7), "density"),
            Err(CallError::Derive(DeriveError::ParametersNotSet))
        ));

        assert!(withdraw_context(&other));
        assert!(active_context().is_none());
        assert!(!withdraw_context(&other));

        install_context(ctx);
        assert!(uninstall_context().is_some());
        assert!(active_context().is_none());
    }
}
