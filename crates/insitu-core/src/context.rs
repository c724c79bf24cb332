//! [`InSituContext`]: the per-rank session holding registries and lifecycle.
//!
//! The context is the only owner of the registries and the lifecycle
//! flags. It is created before the embedded runtime starts, marked
//! initialized once the runtime is up, receives a fresh [`ParameterSet`]
//! each analysis step, and is read by every derived-field request.

use crate::bridge::{Bridge, DerivedField};
use crate::error::{AccessError, DeriveError, LifecycleError};
use crate::id::{GridId, Rank};
use crate::lifecycle::LifecycleState;
use crate::params::ParameterSet;
use crate::particle::ParticleSpecies;

/// Operation name reported by particle accessor errors.
const PARTICLE_ACCESSOR: &str = "yt_get_particlesPtr";

/// One rank's in-situ session.
#[derive(Debug)]
pub struct InSituContext {
    rank: Rank,
    lifecycle: LifecycleState,
    params: Option<ParameterSet>,
}

impl InSituContext {
    /// Create a session for `rank` with all lifecycle flags clear.
    pub fn new(rank: Rank) -> Self {
        Self {
            rank,
            lifecycle: LifecycleState::default(),
            params: None,
        }
    }

    /// This session's rank.
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// Current lifecycle flags.
    pub fn lifecycle(&self) -> LifecycleState {
        self.lifecycle
    }

    /// Record that the embedded runtime is up. One-shot.
    pub fn mark_runtime_initialized(&mut self) -> Result<(), LifecycleError> {
        if self.lifecycle.runtime_initialized() {
            return Err(LifecycleError::AlreadyInitialized);
        }
        self.lifecycle.mark_runtime_initialized();
        Ok(())
    }

    /// Install the registries for the current analysis step.
    ///
    /// Replaces any previous set; the lifecycle flags are unaffected
    /// beyond `parameters_set` becoming true.
    pub fn set_parameters(&mut self, params: ParameterSet) -> Result<(), LifecycleError> {
        if !self.lifecycle.runtime_initialized() {
            return Err(LifecycleError::NotInitialized {
                operation: "yt_set_parameter",
            });
        }
        tracing::debug!(
            fields = params.fields().len(),
            grids = params.grids().len(),
            species = params.particles().len(),
            "parameters set"
        );
        self.params = Some(params);
        self.lifecycle.mark_parameters_set();
        Ok(())
    }

    /// Drop the registries at the end of an analysis step.
    pub fn free_parameters(&mut self) -> Option<ParameterSet> {
        self.params.take()
    }

    /// The registries of the current step, if set.
    pub fn parameters(&self) -> Option<&ParameterSet> {
        self.params.as_ref()
    }

    /// A bridge over the current registries.
    pub fn bridge(&self) -> Result<Bridge<'_>, DeriveError> {
        let params = self.params.as_ref().ok_or(DeriveError::ParametersNotSet)?;
        Ok(Bridge::new(params.fields(), params.grids(), self.rank))
    }

    /// Compute `field_name` on local grid `grid`.
    ///
    /// See [`Bridge::compute_derived_field`].
    pub fn compute_derived_field(
        &self,
        grid: GridId,
        field_name: &str,
    ) -> Result<DerivedField, DeriveError> {
        self.bridge()?.compute_derived_field(grid, field_name)
    }

    /// Hand the particle species list to the simulation.
    ///
    /// Preconditions are checked in order: runtime initialized, parameters
    /// set, at least one species. On success the returned slice is the
    /// table's own storage and `particle_pointer_released` becomes true.
    pub fn release_particle_list(&mut self) -> Result<&mut [ParticleSpecies], AccessError> {
        if !self.lifecycle.runtime_initialized() {
            return Err(AccessError::NotInitialized {
                operation: PARTICLE_ACCESSOR,
            });
        }
        let params = match self.params.as_mut() {
            Some(p) if self.lifecycle.parameters_set() => p,
            _ => {
                return Err(AccessError::ParametersNotSet {
                    operation: PARTICLE_ACCESSOR,
                })
            }
        };
        let count = params.particles().len();
        if count == 0 {
            return Err(AccessError::NoParticleSpecies { count });
        }

        tracing::info!(species = count, "handing out particle list");
        self.lifecycle.mark_particle_pointer_released();
        Ok(params.particles_mut().as_mut_slice())
    }
}
