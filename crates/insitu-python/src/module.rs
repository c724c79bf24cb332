//! The `libyt` module exposed to analysis scripts.

use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyTuple};

use numpy::ndarray::{Array3, ShapeError};
use numpy::PyArray3;

use insitu_core::{DeriveError, DerivedField, GridId};

use crate::error::{call_error_to_py, derive_error_to_py};
use crate::session;

/// Name under which the module is registered and imported.
pub const MODULE_NAME: &str = "libyt";

/// The dictionaries attached to `libyt` at creation.
///
/// They start empty; the simulation side fills them each analysis step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SharedDict {
    /// Raw field data per grid.
    GridData,
    /// Grid hierarchy description.
    Hierarchy,
    /// yt-facing run parameters.
    ParamYt,
    /// User-defined parameters.
    ParamUser,
}

impl SharedDict {
    /// Every shared dictionary, in attachment order.
    pub const ALL: [SharedDict; 4] = [
        SharedDict::GridData,
        SharedDict::Hierarchy,
        SharedDict::ParamYt,
        SharedDict::ParamUser,
    ];

    /// Attribute name on the module.
    pub fn name(self) -> &'static str {
        match self {
            SharedDict::GridData => "grid_data",
            SharedDict::Hierarchy => "hierarchy",
            SharedDict::ParamYt => "param_yt",
            SharedDict::ParamUser => "param_user",
        }
    }
}

/// Fetch one of the shared dictionaries from the imported `libyt` module.
pub fn shared_dict<'py>(py: Python<'py>, dict: SharedDict) -> PyResult<Bound<'py, PyDict>> {
    let module = py.import(MODULE_NAME)?;
    Ok(module.getattr(dict.name())?.cast_into::<PyDict>()?)
}

/// libyt: the in-situ bridge between a running simulation and yt.
#[pymodule]
pub(crate) fn libyt(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(derived_func, m)?)?;
    tracing::debug!(module = MODULE_NAME, "creating module ... done");

    for dict in SharedDict::ALL {
        m.add(dict.name(), PyDict::new(m.py()))?;
    }
    tracing::debug!("attaching empty dictionaries to {MODULE_NAME} ... done");
    Ok(())
}

/// Compute `field_name` on local grid `gid` and return it as a float64
/// array shaped like the grid.
#[pyfunction]
#[pyo3(signature = (*args))]
fn derived_func<'py>(
    py: Python<'py>,
    args: &Bound<'py, PyTuple>,
) -> PyResult<Bound<'py, PyArray3<f64>>> {
    let (gid, field_name) = parse_args(args).map_err(|e| derive_error_to_py(&e))?;

    let field = py
        .detach(|| session::derive(GridId(gid), &field_name))
        .map_err(|e| call_error_to_py(&e))?;

    let array = into_array(field).map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
    Ok(PyArray3::from_owned_array(py, array))
}

/// Reinterpret the derived buffer as a row-major 3-D array without copying.
fn into_array(field: DerivedField) -> Result<Array3<f64>, ShapeError> {
    let (shape, data) = field.into_parts();
    Array3::from_shape_vec(shape, data)
}

fn parse_args(args: &Bound<'_, PyTuple>) -> Result<(i64, String), DeriveError> {
    if args.len() != 2 {
        return Err(DeriveError::InvalidArgument {
            reason: format!("expected 2 arguments, got {}", args.len()),
        });
    }
    let gid = args
        .get_item(0)
        .ok()
        .and_then(|a| a.extract::<i64>().ok())
        .ok_or_else(|| DeriveError::InvalidArgument {
            reason: "gid must be an int".into(),
        })?;
    let field_name = args
        .get_item(1)
        .ok()
        .and_then(|a| a.extract::<String>().ok())
        .ok_or_else(|| DeriveError::InvalidArgument {
            reason: "field_name must be a str".into(),
        })?;
    Ok((gid, field_name))
}
