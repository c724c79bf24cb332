//! Session lifecycle FFI: init, set parameters, particle list, finalize.
//!
//! One session per process. The session owns the shared
//! [`InSituContext`] that the `libyt` module serves, plus the C mirror of
//! the particle species list handed out by `yt_get_particlesPtr`.

use std::ffi::{c_char, c_int, CStr, CString};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use insitu_core::{
    AccessError, AttributeGetter, BootstrapError, ConfigError, FieldDescriptor, GridDescriptor,
    GridId, InSituContext, InitConfig, LifecycleError, ParameterSet, ParticleAttribute,
    ParticleSpecies, Rank, RegistryError, Verbosity,
};
use insitu_python::SharedContext;

use crate::derive::{CAttributeGetter, CDerivation};
use crate::status::{YtErrorCode, YT_FAIL, YT_SUCCESS};
use crate::types::{YtAttribute, YtField, YtGrid, YtParamLibyt, YtParamYt, YtParticle};

const GET_PARTICLES: &str = "yt_get_particlesPtr";

/// Everything that can make a C entry point fail.
#[derive(Debug, Error)]
pub(crate) enum FfiError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("please invoke yt_get_particlesPtr() before calling yt_commit_particles()")]
    ParticlesNotReleased,
    #[error("session state is poisoned by an earlier panic")]
    Poisoned,
}

impl From<&FfiError> for YtErrorCode {
    fn from(e: &FfiError) -> Self {
        match e {
            FfiError::InvalidArgument(_) => YtErrorCode::InvalidArgument,
            FfiError::Config(c) => YtErrorCode::from(c),
            FfiError::Bootstrap(b) => YtErrorCode::from(b),
            FfiError::Lifecycle(l) => YtErrorCode::from(l),
            FfiError::Access(a) => YtErrorCode::from(a),
            FfiError::Registry(r) => YtErrorCode::from(r),
            FfiError::ParticlesNotReleased => YtErrorCode::ParticlesNotReleased,
            FfiError::Poisoned => YtErrorCode::Internal,
        }
    }
}

/// The C view of the species list and the name strings it points into.
struct ParticleMirror {
    _names: Vec<CString>,
    list: Vec<YtParticle>,
}

impl ParticleMirror {
    fn new(species: &[ParticleSpecies]) -> Result<Self, FfiError> {
        let names = species
            .iter()
            .map(|s| CString::new(s.species_name.as_str()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| FfiError::InvalidArgument("species name contains NUL"))?;
        let list = names.iter().map(|n| YtParticle::named(n.as_ptr())).collect();
        Ok(Self {
            _names: names,
            list,
        })
    }
}

struct Session {
    ctx: SharedContext,
    particles: Option<ParticleMirror>,
}

// SAFETY: the mirror's raw pointers refer to the session's own `CString`s
// or to simulation memory that is only read under the session lock.
#[allow(unsafe_code)]
unsafe impl Send for Session {}

static SESSION: Mutex<Option<Session>> = Mutex::new(None);

fn status(operation: &str, result: Result<(), FfiError>) -> c_int {
    match result {
        Ok(()) => YT_SUCCESS,
        Err(e) => {
            tracing::error!(operation, error = %e, "operation failed");
            crate::set_last_error(YtErrorCode::from(&e));
            YT_FAIL
        }
    }
}

#[allow(unsafe_code)]
fn read_str<'a>(ptr: *const c_char, what: &'static str) -> Result<&'a str, FfiError> {
    if ptr.is_null() {
        return Err(FfiError::InvalidArgument(what));
    }
    // SAFETY: caller guarantees a NUL-terminated string that outlives the call.
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| FfiError::InvalidArgument(what))
}

#[allow(unsafe_code)]
fn read_slice<'a, T>(ptr: *const T, len: c_int, what: &'static str) -> Result<&'a [T], FfiError> {
    let len = usize::try_from(len).map_err(|_| FfiError::InvalidArgument(what))?;
    if len == 0 {
        return Ok(&[]);
    }
    if ptr.is_null() {
        return Err(FfiError::InvalidArgument(what));
    }
    // SAFETY: caller guarantees `len` initialized elements at `ptr`.
    Ok(unsafe { std::slice::from_raw_parts(ptr, len) })
}

fn install_subscriber(verbose: Verbosity) {
    let filter = EnvFilter::builder()
        .with_default_directive(verbose.level_filter().into())
        .from_env_lossy();
    // A host that installed its own subscriber keeps it.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

type StartFn<'a> = &'a dyn Fn(&SharedContext, &InitConfig) -> Result<(), BootstrapError>;

#[allow(unsafe_code)]
fn init(param_libyt: *const YtParamLibyt, start: StartFn<'_>) -> Result<(), FfiError> {
    if param_libyt.is_null() {
        return Err(FfiError::InvalidArgument("param_libyt is null"));
    }
    // SAFETY: checked non-null; caller guarantees a valid struct.
    let param = unsafe { &*param_libyt };
    let config = InitConfig {
        script: read_str(param.script, "script is null or not UTF-8")?.to_string(),
        verbose: Verbosity::from_level(param.verbose)?,
        rank: Rank(param.rank),
    };
    config.validate()?;
    install_subscriber(config.verbose);

    let mut slot = ffi_lock!(SESSION);
    if slot.is_some() {
        return Err(LifecycleError::AlreadyInitialized.into());
    }
    let ctx = Arc::new(Mutex::new(InSituContext::new(config.rank)));
    start(&ctx, &config)?;
    *slot = Some(Session {
        ctx,
        particles: None,
    });
    Ok(())
}

fn set_parameter(param: &YtParamYt) -> Result<(), FfiError> {
    let fields = read_slice(param.field_list, param.num_fields, "field_list")?
        .iter()
        .map(field_descriptor)
        .collect::<Result<Vec<_>, _>>()?;
    let grids = read_slice(param.grids_local, param.num_grids_local, "grids_local")?
        .iter()
        .map(grid_descriptor)
        .collect::<Result<Vec<_>, _>>()?;
    let species = read_slice(param.species_list, param.num_species, "species_list")?
        .iter()
        .map(|&name| {
            read_str(name, "species name is null or not UTF-8").map(ParticleSpecies::new)
        })
        .collect::<Result<Vec<_>, _>>()?;
    let params = ParameterSet::new(fields, grids, species)?;

    let mut slot = ffi_lock!(SESSION);
    let session = slot.as_mut().ok_or(LifecycleError::NotInitialized {
        operation: "yt_set_parameter",
    })?;
    ffi_lock!(session.ctx).set_parameters(params)?;
    // Pointers handed out for the previous step are no longer valid.
    session.particles = None;
    Ok(())
}

fn field_descriptor(field: &YtField) -> Result<FieldDescriptor, FfiError> {
    let name = read_str(field.field_name, "field_name is null or not UTF-8")?;
    Ok(match field.derived_func {
        Some(f) => FieldDescriptor::derived(name, CDerivation(f)),
        None => FieldDescriptor::raw(name),
    })
}

fn grid_descriptor(grid: &YtGrid) -> Result<GridDescriptor, FfiError> {
    let [d0, d1, d2] = grid.grid_dimensions;
    Ok(GridDescriptor::new(
        GridId(i64::from(grid.id)),
        [i64::from(d0), i64::from(d1), i64::from(d2)],
    )?)
}

fn get_particles() -> Result<*mut YtParticle, FfiError> {
    let mut slot = ffi_lock!(SESSION);
    let session = slot.as_mut().ok_or(AccessError::NotInitialized {
        operation: GET_PARTICLES,
    })?;
    let mut ctx = ffi_lock!(session.ctx);
    let species = ctx.release_particle_list()?;

    let mirror = match session.particles.take() {
        Some(mirror) => mirror,
        None => ParticleMirror::new(species)?,
    };
    Ok(session.particles.insert(mirror).list.as_mut_ptr())
}

fn commit_particles() -> Result<(), FfiError> {
    let mut slot = ffi_lock!(SESSION);
    let session = slot.as_mut().ok_or(AccessError::NotInitialized {
        operation: "yt_commit_particles",
    })?;
    let mirror = session
        .particles
        .as_ref()
        .ok_or(FfiError::ParticlesNotReleased)?;
    let mut ctx = ffi_lock!(session.ctx);
    let species = ctx.release_particle_list()?;

    // Read every entry before touching the table, so a bad entry leaves
    // all species as they were.
    let staged = mirror
        .list
        .iter()
        .map(staged_species)
        .collect::<Result<Vec<_>, _>>()?;
    for (target, (attributes, coordinate_names, getter)) in species.iter_mut().zip(staged) {
        target.attributes = attributes;
        target.coordinate_names = coordinate_names;
        target.attribute_getter = getter;
    }
    tracing::debug!(species = species.len(), "particle list committed");
    Ok(())
}

type StagedSpecies = (
    Vec<ParticleAttribute>,
    Option<[String; 3]>,
    Option<Arc<dyn AttributeGetter>>,
);

fn staged_species(source: &YtParticle) -> Result<StagedSpecies, FfiError> {
    let attributes = read_slice(source.attr_list, source.num_attr, "attr_list")?
        .iter()
        .map(particle_attribute)
        .collect::<Result<Vec<_>, _>>()?;
    let getter = source
        .get_attr
        .map(|f| -> Arc<dyn AttributeGetter> { Arc::new(CAttributeGetter(f)) });
    Ok((attributes, coordinate_names(source)?, getter))
}

fn particle_attribute(attr: &YtAttribute) -> Result<ParticleAttribute, FfiError> {
    let mut out = ParticleAttribute::new(read_str(
        attr.attr_name,
        "attr_name is null or not UTF-8",
    )?);
    if !attr.attr_unit.is_null() {
        out.unit = Some(read_str(attr.attr_unit, "attr_unit is not UTF-8")?.to_string());
    }
    Ok(out)
}

fn coordinate_names(p: &YtParticle) -> Result<Option<[String; 3]>, FfiError> {
    if p.coor_x.is_null() || p.coor_y.is_null() || p.coor_z.is_null() {
        return Ok(None);
    }
    Ok(Some([
        read_str(p.coor_x, "coor_x is not UTF-8")?.to_string(),
        read_str(p.coor_y, "coor_y is not UTF-8")?.to_string(),
        read_str(p.coor_z, "coor_z is not UTF-8")?.to_string(),
    ]))
}

fn free_grids() -> Result<(), FfiError> {
    let mut slot = ffi_lock!(SESSION);
    let session = slot.as_mut().ok_or(LifecycleError::NotInitialized {
        operation: "yt_free_gridsPtr",
    })?;
    ffi_lock!(session.ctx).free_parameters();
    session.particles = None;
    Ok(())
}

fn finalize() -> Result<(), FfiError> {
    let session = ffi_lock!(SESSION)
        .take()
        .ok_or(LifecycleError::NotInitialized {
            operation: "yt_finalize",
        })?;
    insitu_python::withdraw_context(&session.ctx);
    tracing::info!("in-situ session finalized");
    Ok(())
}

// ── FFI functions ───────────────────────────────────────────────

/// Start the embedded interpreter, register and import `libyt`, then
/// import the analysis script.
///
/// Must be the first call, and only once per process.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn yt_init(param_libyt: *const YtParamLibyt) -> c_int {
    ffi_guard!({ status("yt_init", init(param_libyt, &insitu_python::start)) })
}

/// Install the fields, local grids and particle species of this step.
///
/// Replaces the previous step's registries. Particle list pointers from
/// an earlier `yt_get_particlesPtr` become invalid.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn yt_set_parameter(param_yt: *const YtParamYt) -> c_int {
    ffi_guard!({
        if param_yt.is_null() {
            return status(
                "yt_set_parameter",
                Err(FfiError::InvalidArgument("param_yt is null")),
            );
        }
        // SAFETY: checked non-null; caller guarantees a valid struct.
        status("yt_set_parameter", set_parameter(unsafe { &*param_yt }))
    })
}

/// Hand out the particle species list for the simulation to fill.
///
/// Writes an array of `num_species` entries to `*particle_list`. The array
/// stays valid until the next `yt_set_parameter`, `yt_free_gridsPtr` or
/// `yt_finalize`.
#[no_mangle]
#[allow(unsafe_code, non_snake_case)]
pub extern "C" fn yt_get_particlesPtr(particle_list: *mut *mut YtParticle) -> c_int {
    ffi_guard!({
        if particle_list.is_null() {
            return status(
                GET_PARTICLES,
                Err(FfiError::InvalidArgument("particle_list is null")),
            );
        }
        match get_particles() {
            Ok(ptr) => {
                // SAFETY: checked non-null; caller guarantees it is writable.
                unsafe { *particle_list = ptr };
                YT_SUCCESS
            }
            Err(e) => status(GET_PARTICLES, Err(e)),
        }
    })
}

/// Read back the particle list filled through `yt_get_particlesPtr`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn yt_commit_particles() -> c_int {
    ffi_guard!({ status("yt_commit_particles", commit_particles()) })
}

/// Drop this step's registries.
#[no_mangle]
#[allow(unsafe_code, non_snake_case)]
pub extern "C" fn yt_free_gridsPtr() -> c_int {
    ffi_guard!({ status("yt_free_gridsPtr", free_grids()) })
}

/// End the session and withdraw its context from `libyt`.
///
/// The interpreter keeps running; it cannot be restarted in-process.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn yt_finalize() -> c_int {
    ffi_guard!({ status("yt_finalize", finalize()) })
}
