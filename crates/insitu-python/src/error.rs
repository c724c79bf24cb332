//! DeriveError -> Python exception mapping with recovery hints.

use pyo3::exceptions::{PyAttributeError, PyRuntimeError, PyValueError};
use pyo3::PyErr;

use insitu_core::DeriveError;

use crate::session::CallError;

/// Convert a failed `derived_func` call into a typed Python exception.
pub(crate) fn call_error_to_py(err: &CallError) -> PyErr {
    match err {
        CallError::Derive(e) => derive_error_to_py(e),
        other => PyRuntimeError::new_err(format!("libyt error: {other}")),
    }
}

/// Raise a typed Python exception for a bridge error.
///
/// Argument shape errors are `ValueError`; lookup failures are
/// `AttributeError` so scripts can treat a missing field like a missing
/// attribute.
pub(crate) fn derive_error_to_py(err: &DeriveError) -> PyErr {
    let full = format!("libyt error: {err}\n  Hint: {}", hint(err));
    match err {
        DeriveError::InvalidArgument { .. } => PyValueError::new_err(full),
        DeriveError::UnknownField { .. }
        | DeriveError::FieldNotDerivable { .. }
        | DeriveError::GridNotLocal { .. } => PyAttributeError::new_err(full),
        DeriveError::ParametersNotSet => PyRuntimeError::new_err(full),
    }
}

fn hint(err: &DeriveError) -> &'static str {
    match err {
        DeriveError::InvalidArgument { .. } => {
            "Call libyt.derived_func(gid, field_name) with an integer grid id \
             and a string field name."
        }
        DeriveError::UnknownField { .. } => {
            "Field names are case-sensitive and must match an entry the \
             simulation passed to yt_set_parameter()."
        }
        DeriveError::FieldNotDerivable { .. } => {
            "The field is registered without a derived_func. Read it from \
             libyt.grid_data instead, or register a derivation routine."
        }
        DeriveError::GridNotLocal { .. } => {
            "Each rank can only derive fields on the grids it owns. Iterate \
             over the local grids listed in libyt.hierarchy."
        }
        DeriveError::ParametersNotSet => {
            "derived_func is only usable during an analysis step, after the \
             simulation has called yt_set_parameter()."
        }
    }
}
