//! `#[repr(C)]` descriptors exchanged with the simulation.

use std::ffi::{c_char, c_int, c_long};

/// `void derived_func(long gid, double *data)`.
///
/// Fills `data`, a zeroed row-major buffer of the grid's cell count.
pub type YtDerivedFunc = unsafe extern "C" fn(gid: c_long, data: *mut f64);

/// `void get_attr(long gid, char *attribute, double *data)`.
pub type YtAttributeGetter =
    unsafe extern "C" fn(gid: c_long, attribute: *const c_char, data: *mut f64);

/// Arguments of `yt_init`.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct YtParamLibyt {
    /// Verbosity level, 0 (off) to 3 (debug).
    pub verbose: c_int,
    /// Analysis script module name, without `.py`.
    pub script: *const c_char,
    /// MPI rank of this process.
    pub rank: c_int,
}

/// One field the simulation can provide.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct YtField {
    /// Field name, unique within `field_list`.
    pub field_name: *const c_char,
    /// Derivation routine, or null for a raw field.
    pub derived_func: Option<YtDerivedFunc>,
}

/// One grid owned by this rank.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct YtGrid {
    /// Global grid id.
    pub id: c_long,
    /// Cells along each axis.
    pub grid_dimensions: [c_int; 3],
}

/// Arguments of `yt_set_parameter`.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct YtParamYt {
    /// Number of entries in `field_list`.
    pub num_fields: c_int,
    /// Field descriptors.
    pub field_list: *const YtField,
    /// Number of entries in `grids_local`.
    pub num_grids_local: c_int,
    /// Grids owned by this rank.
    pub grids_local: *const YtGrid,
    /// Number of entries in `species_list`.
    pub num_species: c_int,
    /// Particle species names.
    pub species_list: *const *const c_char,
}

/// One particle attribute, filled by the simulation.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct YtAttribute {
    /// Attribute name.
    pub attr_name: *const c_char,
    /// Unit string, or null.
    pub attr_unit: *const c_char,
}

/// One particle species, handed out by `yt_get_particlesPtr`.
///
/// `species_name` is owned by the library. Every other member is filled
/// by the simulation and must stay valid until `yt_commit_particles`.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct YtParticle {
    /// Species name.
    pub species_name: *const c_char,
    /// Attribute descriptors.
    pub attr_list: *const YtAttribute,
    /// Number of entries in `attr_list`.
    pub num_attr: c_int,
    /// Attribute holding the x coordinate.
    pub coor_x: *const c_char,
    /// Attribute holding the y coordinate.
    pub coor_y: *const c_char,
    /// Attribute holding the z coordinate.
    pub coor_z: *const c_char,
    /// Attribute reader.
    pub get_attr: Option<YtAttributeGetter>,
}

impl YtParticle {
    pub(crate) fn named(species_name: *const c_char) -> Self {
        Self {
            species_name,
            attr_list: std::ptr::null(),
            num_attr: 0,
            coor_x: std::ptr::null(),
            coor_y: std::ptr::null(),
            coor_z: std::ptr::null(),
            get_attr: None,
        }
    }
}
