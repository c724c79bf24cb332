//! Adapters from C function pointers to the core capability traits.

use std::ffi::{c_long, CString};

use insitu_core::{AttributeGetter, Derivation, GridId};

use crate::types::{YtAttributeGetter, YtDerivedFunc};

/// A C `derived_func` called in place on the bridge's buffer.
#[derive(Clone, Copy)]
pub(crate) struct CDerivation(pub(crate) YtDerivedFunc);

impl Derivation for CDerivation {
    #[allow(unsafe_code)]
    fn derive(&self, grid: GridId, out: &mut [f64]) {
        // SAFETY: the simulation registered this routine for a buffer of
        // exactly the grid's cell count, which is `out.len()`.
        unsafe { (self.0)(grid.0 as c_long, out.as_mut_ptr()) }
    }
}

/// A C `get_attr` routine.
#[derive(Clone, Copy)]
pub(crate) struct CAttributeGetter(pub(crate) YtAttributeGetter);

impl AttributeGetter for CAttributeGetter {
    #[allow(unsafe_code)]
    fn get(&self, grid: GridId, attribute: &str, out: &mut [f64]) {
        let Ok(attribute) = CString::new(attribute) else {
            tracing::warn!(
                grid = %grid,
                attribute,
                "attribute name contains a NUL byte; get_attr not called"
            );
            return;
        };
        // SAFETY: `attribute` outlives the call and `out` is a valid
        // buffer of the length the simulation asked for.
        unsafe { (self.0)(grid.0 as c_long, attribute.as_ptr(), out.as_mut_ptr()) }
    }
}
