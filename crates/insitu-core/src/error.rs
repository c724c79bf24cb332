//! Error types for the insitu bridge.
//!
//! Organized by subsystem: derived-field computation, runtime bootstrap,
//! particle list access, registry construction, lifecycle transitions and
//! configuration. Every variant carries enough context for a diagnostic
//! that names the offending field, grid, script or missing call.

use thiserror::Error;

use crate::id::{GridId, Rank};

/// Errors from [`Bridge::compute_derived_field`](crate::Bridge::compute_derived_field).
///
/// Each error aborts only the single invocation; the analysis script may
/// catch it and continue.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DeriveError {
    /// The caller supplied arguments of the wrong shape or type.
    #[error("wrong input type, expect to be libyt.derived_func(int, str): {reason}")]
    InvalidArgument {
        /// What was wrong with the arguments.
        reason: String,
    },
    /// No field with this name is registered.
    #[error("cannot find field_name [ {name} ] in field_list")]
    UnknownField {
        /// The requested field name.
        name: String,
    },
    /// The field is registered but has no derivation routine.
    #[error("in field_list, field_name [ {name} ], derived_func is not set")]
    FieldNotDerivable {
        /// The requested field name.
        name: String,
    },
    /// The grid is not owned by this rank.
    #[error("cannot find grid with GID [ {grid} ] on MPI rank [ {rank} ]")]
    GridNotLocal {
        /// The requested grid id.
        grid: GridId,
        /// The rank that handled the request.
        rank: Rank,
    },
    /// The registries have not been populated for this analysis step.
    #[error("field and grid registries are not set, invoke yt_set_parameter() first")]
    ParametersNotSet,
}

/// Errors from the two-phase runtime bootstrap.
///
/// All of these are fatal to the bootstrap sequence.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BootstrapError {
    /// A phase was invoked out of order or repeated.
    #[error("bootstrap sequence error in {operation}: {reason}")]
    Sequence {
        /// The phase that was invoked.
        operation: &'static str,
        /// Why the call is not allowed in the current state.
        reason: &'static str,
    },
    /// The registered module could not be imported into the runtime.
    #[error("importing module \"{module}\" failed: {reason}")]
    ModuleLoad {
        /// The module identifier.
        module: String,
        /// Runtime-provided failure description.
        reason: String,
    },
    /// The user analysis script could not be imported.
    #[error(
        "importing inline analysis script \"{script}\" failed \
         (please do not include the \".py\" extension): {reason}"
    )]
    ScriptImport {
        /// The configured script name.
        script: String,
        /// Runtime-provided failure description.
        reason: String,
    },
    /// The bootstrap configuration was rejected.
    #[error("invalid bootstrap configuration: {0}")]
    Config(#[from] ConfigError),
    /// The context refused the lifecycle transition.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// Errors from [`InSituContext::release_particle_list`](crate::InSituContext::release_particle_list).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AccessError {
    /// The runtime has not been initialized.
    #[error("please invoke yt_init() before calling {operation}()")]
    NotInitialized {
        /// The operation that was attempted.
        operation: &'static str,
    },
    /// The parameter-setting phase has not run.
    #[error("please invoke yt_set_parameter() before calling {operation}()")]
    ParametersNotSet {
        /// The operation that was attempted.
        operation: &'static str,
    },
    /// There are no particle species, so there is no list to hand out.
    #[error("num_species == {count} <= 0, particle_list is not initialized")]
    NoParticleSpecies {
        /// The actual species count.
        count: usize,
    },
}

/// Errors detected while building the registries of a
/// [`ParameterSet`](crate::ParameterSet).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A field name is empty.
    #[error("field at position {index} has an empty name")]
    EmptyFieldName {
        /// Position in the field list.
        index: usize,
    },
    /// Two fields share a name.
    #[error("field_name [ {name} ] appears more than once in field_list")]
    DuplicateField {
        /// The duplicated name.
        name: String,
    },
    /// Two local grids share an id.
    #[error("grid GID [ {grid} ] appears more than once in grids_local")]
    DuplicateGrid {
        /// The duplicated id.
        grid: GridId,
    },
    /// A grid has a non-positive dimension.
    #[error("grid GID [ {grid} ] has non-positive dimensions {dimensions:?}")]
    InvalidDimensions {
        /// The grid id.
        grid: GridId,
        /// The rejected dimensions.
        dimensions: [i64; 3],
    },
    /// A grid's cell count does not fit an addressable `f64` buffer.
    #[error("grid GID [ {grid} ] with dimensions {dimensions:?} is too large to allocate")]
    CellCountOverflow {
        /// The grid id.
        grid: GridId,
        /// The rejected dimensions.
        dimensions: [i64; 3],
    },
    /// Two particle species share a name.
    #[error("species_name [ {name} ] appears more than once in species_list")]
    DuplicateSpecies {
        /// The duplicated name.
        name: String,
    },
}

/// Errors from lifecycle transitions on [`InSituContext`](crate::InSituContext).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// `yt_init` ran twice.
    #[error("runtime is already initialized, yt_init() must only be invoked once")]
    AlreadyInitialized,
    /// A transition required the runtime to be initialized first.
    #[error("please invoke yt_init() before calling {operation}()")]
    NotInitialized {
        /// The operation that was attempted.
        operation: &'static str,
    },
}

/// Errors from [`InitConfig::validate`](crate::InitConfig::validate).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No script name was configured.
    #[error("script name is empty")]
    EmptyScript,
    /// The script name carries a `.py` suffix.
    #[error("script name \"{script}\" must not include the \".py\" extension")]
    ScriptHasExtension {
        /// The configured name.
        script: String,
    },
    /// The script name is not an importable dotted module path.
    #[error("script name \"{script}\" is not a valid python module name")]
    InvalidScriptName {
        /// The configured name.
        script: String,
    },
    /// The numeric verbosity level is out of range.
    #[error("verbose level {level} is out of range (expected 0..=3)")]
    InvalidVerbosity {
        /// The configured level.
        level: i32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_not_local_names_grid_and_rank() {
        let msg = DeriveError::GridNotLocal {
            grid: GridId(3),
            rank: Rank(1),
        }
        .to_string();
        assert!(msg.contains("[ 3 ]"));
        assert!(msg.contains("rank [ 1 ]"));
    }

    #[test]
    fn field_errors_name_the_field() {
        let unknown = DeriveError::UnknownField {
            name: "temperature".into(),
        };
        let underivable = DeriveError::FieldNotDerivable {
            name: "density".into(),
        };
        assert!(unknown.to_string().contains("temperature"));
        assert!(underivable.to_string().contains("density"));
    }

    #[test]
    fn script_import_reminds_about_extension() {
        let msg = BootstrapError::ScriptImport {
            script: "inline_script".into(),
            reason: "No module named 'inline_script'".into(),
        }
        .to_string();
        assert!(msg.contains("inline_script"));
        assert!(msg.contains(".py"));
    }

    #[test]
    fn access_errors_name_the_required_call() {
        let op = "yt_get_particlesPtr";
        assert!(AccessError::NotInitialized { operation: op }
            .to_string()
            .contains("yt_init()"));
        assert!(AccessError::ParametersNotSet { operation: op }
            .to_string()
            .contains("yt_set_parameter()"));
        assert!(AccessError::NoParticleSpecies { count: 0 }
            .to_string()
            .contains("num_species == 0"));
    }

    #[test]
    fn lifecycle_error_converts_into_bootstrap_error() {
        let err: BootstrapError = LifecycleError::AlreadyInitialized.into();
        assert_eq!(
            err,
            BootstrapError::Lifecycle(LifecycleError::AlreadyInitialized)
        );
    }
}
