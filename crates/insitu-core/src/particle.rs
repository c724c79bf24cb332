//! Particle species descriptions and the [`ParticleSpeciesTable`].
//!
//! The table is created during the parameter-setting phase with one entry
//! per species name. The simulation then obtains the list through
//! [`InSituContext::release_particle_list`](crate::InSituContext::release_particle_list)
//! and fills in attribute names, coordinate labels and the getter.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::error::RegistryError;
use crate::id::GridId;

/// Reads one particle attribute for one grid into a caller buffer.
///
/// Implemented for every `Fn(GridId, &str, &mut [f64]) + Send + Sync`.
pub trait AttributeGetter: Send + Sync {
    /// Fill `out` with the values of `attribute` for the particles in `grid`.
    fn get(&self, grid: GridId, attribute: &str, out: &mut [f64]);
}

impl<F> AttributeGetter for F
where
    F: Fn(GridId, &str, &mut [f64]) + Send + Sync,
{
    fn get(&self, grid: GridId, attribute: &str, out: &mut [f64]) {
        self(grid, attribute, out)
    }
}

/// A named per-particle quantity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParticleAttribute {
    /// Attribute name as seen by the analysis runtime.
    pub name: String,
    /// Optional unit annotation (e.g. `"code_mass"`).
    pub unit: Option<String>,
}

impl ParticleAttribute {
    /// An attribute without a unit annotation.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: None,
        }
    }
}

/// One particle species exposed to the analysis runtime.
#[derive(Clone)]
pub struct ParticleSpecies {
    /// Species name (e.g. `"io"`, `"star"`).
    pub species_name: String,
    /// Attributes the getter can produce.
    pub attributes: Vec<ParticleAttribute>,
    /// Names of the x, y and z position attributes.
    pub coordinate_names: Option<[String; 3]>,
    /// Routine reading attribute values, supplied by the simulation.
    pub attribute_getter: Option<Arc<dyn AttributeGetter>>,
}

impl ParticleSpecies {
    /// A species with no attributes filled in yet.
    pub fn new(species_name: impl Into<String>) -> Self {
        Self {
            species_name: species_name.into(),
            attributes: Vec::new(),
            coordinate_names: None,
            attribute_getter: None,
        }
    }

    /// Look up an attribute by exact name.
    pub fn attribute(&self, name: &str) -> Option<&ParticleAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

impl fmt::Debug for ParticleSpecies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParticleSpecies")
            .field("species_name", &self.species_name)
            .field("attributes", &self.attributes)
            .field("coordinate_names", &self.coordinate_names)
            .field("has_getter", &self.attribute_getter.is_some())
            .finish()
    }
}

/// The species list handed out by the particle pointer accessor.
///
/// May be empty. Storage is owned by the table and only ever exposed by
/// reference; nothing in this crate clones the list.
#[derive(Debug, Default)]
pub struct ParticleSpeciesTable {
    species: Vec<ParticleSpecies>,
}

impl ParticleSpeciesTable {
    /// Create a table with no species.
    pub const fn empty() -> Self {
        Self {
            species: Vec::new(),
        }
    }

    /// Build a table, rejecting duplicated species names.
    pub fn new(species: Vec<ParticleSpecies>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::with_capacity(species.len());
        for s in &species {
            if !seen.insert(s.species_name.as_str()) {
                return Err(RegistryError::DuplicateSpecies {
                    name: s.species_name.clone(),
                });
            }
        }
        Ok(Self { species })
    }

    /// Build a table with one empty entry per name.
    pub fn from_names<I, S>(names: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names.into_iter().map(ParticleSpecies::new).collect())
    }

    /// Number of species.
    pub fn len(&self) -> usize {
        self.species.len()
    }

    /// Returns `true` if there are no species.
    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    /// Read-only view of the species list.
    pub fn as_slice(&self) -> &[ParticleSpecies] {
        &self.species
    }

    /// Look up a species by exact name.
    pub fn lookup(&self, name: &str) -> Option<&ParticleSpecies> {
        self.species.iter().find(|s| s.species_name == name)
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [ParticleSpecies] {
        &mut self.species
    }
}
