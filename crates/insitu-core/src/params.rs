//! The [`ParameterSet`] produced by one parameter-setting phase.

use crate::error::RegistryError;
use crate::field::{FieldDescriptor, FieldRegistry};
use crate::grid::{GridDescriptor, LocalGridTable};
use crate::particle::{ParticleSpecies, ParticleSpeciesTable};

/// Registries populated for one analysis step.
///
/// Immutable once handed to [`InSituContext::set_parameters`](crate::InSituContext::set_parameters)
/// except for the particle species list, which the simulation fills in
/// through the accessor.
#[derive(Debug, Default)]
pub struct ParameterSet {
    fields: FieldRegistry,
    grids: LocalGridTable,
    particles: ParticleSpeciesTable,
}

impl ParameterSet {
    /// Validate and assemble all three registries.
    pub fn new(
        fields: Vec<FieldDescriptor>,
        grids: Vec<GridDescriptor>,
        species: Vec<ParticleSpecies>,
    ) -> Result<Self, RegistryError> {
        Ok(Self {
            fields: FieldRegistry::new(fields)?,
            grids: LocalGridTable::new(grids)?,
            particles: ParticleSpeciesTable::new(species)?,
        })
    }

    /// Assemble from registries that were already validated.
    pub fn from_parts(
        fields: FieldRegistry,
        grids: LocalGridTable,
        particles: ParticleSpeciesTable,
    ) -> Self {
        Self {
            fields,
            grids,
            particles,
        }
    }

    /// The field registry.
    pub fn fields(&self) -> &FieldRegistry {
        &self.fields
    }

    /// The grids owned by this rank.
    pub fn grids(&self) -> &LocalGridTable {
        &self.grids
    }

    /// The particle species table.
    pub fn particles(&self) -> &ParticleSpeciesTable {
        &self.particles
    }

    pub(crate) fn particles_mut(&mut self) -> &mut ParticleSpeciesTable {
        &mut self.particles
    }
}
