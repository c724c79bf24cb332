//! Test utilities for insitu development.
//!
//! Provides reusable derivation fixtures (see [`fixtures`]) and a
//! [`TestParamsBuilder`] for assembling registries and ready-to-use
//! contexts in tests.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use insitu_core::{
    Derivation, FieldDescriptor, GridDescriptor, GridId, InSituContext, ParameterSet,
    ParticleSpecies, Rank,
};

use fixtures::ConstDerivation;

/// Builder for a [`ParameterSet`] with panicking validation.
///
/// Intended for tests only: invalid registries panic with the registry
/// error instead of returning it.
#[derive(Default)]
pub struct TestParamsBuilder {
    fields: Vec<FieldDescriptor>,
    grids: Vec<GridDescriptor>,
    species: Vec<ParticleSpecies>,
}

impl TestParamsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field computed by `derivation`.
    pub fn derived(mut self, name: &str, derivation: impl Derivation + 'static) -> Self {
        self.fields.push(FieldDescriptor::derived(name, derivation));
        self
    }

    /// Add a field with no derivation routine.
    pub fn raw(mut self, name: &str) -> Self {
        self.fields.push(FieldDescriptor::raw(name));
        self
    }

    /// Add a prebuilt field descriptor.
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a local grid.
    pub fn grid(mut self, id: i64, dimensions: [i64; 3]) -> Self {
        let grid = GridDescriptor::new(GridId(id), dimensions)
            .unwrap_or_else(|e| panic!("invalid test grid: {e}"));
        self.grids.push(grid);
        self
    }

    /// Add an empty particle species.
    pub fn species(mut self, name: &str) -> Self {
        self.species.push(ParticleSpecies::new(name));
        self
    }

    pub fn build(self) -> ParameterSet {
        ParameterSet::new(self.fields, self.grids, self.species)
            .unwrap_or_else(|e| panic!("invalid test registries: {e}"))
    }
}

/// The reference scenario: `density` fills every cell with `1.0`, and
/// grid 7 with dimensions `(2, 2, 2)` is the only local grid.
pub fn density_scenario() -> ParameterSet {
    TestParamsBuilder::new()
        .derived("density", ConstDerivation::new(1.0))
        .grid(7, [2, 2, 2])
        .build()
}

/// A context for `rank` with the runtime marked initialized and `params`
/// installed.
pub fn ready_context(rank: i32, params: ParameterSet) -> InSituContext {
    let mut ctx = InSituContext::new(Rank(rank));
    ctx.mark_runtime_initialized()
        .unwrap_or_else(|e| panic!("fresh context refused init: {e}"));
    ctx.set_parameters(params)
        .unwrap_or_else(|e| panic!("initialized context refused parameters: {e}"));
    ctx
}
