//! Core types for the insitu analysis bridge.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! data a simulation rank exposes to an embedded analysis runtime and the
//! rules for handing it over: the field registry, the local grid table,
//! the particle species table, the lifecycle flags guarding them, and the
//! derived-field bridge that turns a registered derivation into an owned
//! `f64` buffer.
//!
//! Nothing here touches the interpreter. The PyO3 layer (`insitu-python`)
//! and the C ABI (`insitu-ffi`) are thin adapters over [`InSituContext`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod bridge;
pub mod config;
pub mod context;
pub mod error;
pub mod field;
pub mod grid;
pub mod id;
pub mod lifecycle;
pub mod params;
pub mod particle;

pub use bridge::{Bridge, DerivedField};
pub use config::{InitConfig, Verbosity};
pub use context::InSituContext;
pub use error::{
    AccessError, BootstrapError, ConfigError, DeriveError, LifecycleError, RegistryError,
};
pub use field::{Derivation, FieldDescriptor, FieldRegistry};
pub use grid::{GridDescriptor, LocalGridTable};
pub use id::{GridId, Rank};
pub use lifecycle::LifecycleState;
pub use params::ParameterSet;
pub use particle::{AttributeGetter, ParticleAttribute, ParticleSpecies, ParticleSpeciesTable};
