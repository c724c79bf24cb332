//! insitu: hand simulation data to Python analysis without leaving the
//! simulation process.
//!
//! This is the facade crate that re-exports the public API of the insitu
//! sub-crates. Simulation codes written in C or Fortran link `insitu-ffi`
//! instead.
//!
//! # Quick start
//!
//! ```rust
//! use insitu::prelude::*;
//!
//! // Rank 0 owns one 2x2x2 grid; `density` is computed on request.
//! let params = ParameterSet::new(
//!     vec![FieldDescriptor::derived("density", |_: GridId, out: &mut [f64]| out.fill(1.0))],
//!     vec![GridDescriptor::new(GridId(7), [2, 2, 2]).unwrap()],
//!     vec![],
//! )
//! .unwrap();
//!
//! let mut ctx = InSituContext::new(Rank(0));
//! ctx.mark_runtime_initialized().unwrap();
//! ctx.set_parameters(params).unwrap();
//!
//! let field = ctx.compute_derived_field(GridId(7), "density").unwrap();
//! assert_eq!(field.shape(), [2, 2, 2]);
//! assert_eq!(field.get(1, 1, 1), Some(1.0));
//!
//! assert!(matches!(
//!     ctx.compute_derived_field(GridId(3), "density"),
//!     Err(DeriveError::GridNotLocal { .. })
//! ));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `insitu-core` | IDs, registries, lifecycle, the bridge, errors |
//! | [`python`] | `insitu-python` | The `libyt` module and the bootstrap sequence |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, registries and the derived-field bridge (`insitu-core`).
pub use insitu_core as types;

/// Embedded interpreter bridge (`insitu-python`).
///
/// [`python::start`] runs the whole bootstrap for hosts that do not start
/// the interpreter themselves; [`python::register`] and
/// [`python::activate`] run the phases individually.
pub use insitu_python as python;

/// Common imports for typical insitu usage.
///
/// ```rust
/// use insitu::prelude::*;
/// ```
pub mod prelude {
    // Identifiers and configuration
    pub use insitu_core::{GridId, InitConfig, Rank, Verbosity};

    // Registries
    pub use insitu_core::{
        Derivation, FieldDescriptor, GridDescriptor, ParameterSet, ParticleAttribute,
        ParticleSpecies,
    };

    // Session and bridge
    pub use insitu_core::{DerivedField, InSituContext};

    // Errors
    pub use insitu_core::{AccessError, BootstrapError, DeriveError, LifecycleError};

    // Interpreter
    pub use insitu_python::{install_context, start, SharedContext};
}
