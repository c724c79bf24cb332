//! Field descriptors, derivation routines, and the [`FieldRegistry`].

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::error::RegistryError;
use crate::id::GridId;

/// A routine that fills a field's values for one grid on demand.
///
/// `out` is a zero-initialized, row-major flattened 3-D block with exactly
/// one slot per cell of `grid`. The routine writes in place and may leave
/// any subset of slots untouched, in which case they stay `0.0`. The slice
/// bounds the write and the borrow ends on return, so the routine can
/// neither write past the last cell nor keep the buffer.
///
/// Implemented for every `Fn(GridId, &mut [f64]) + Send + Sync`.
pub trait Derivation: Send + Sync {
    /// Fill `out` with this field's values for `grid`.
    fn derive(&self, grid: GridId, out: &mut [f64]);
}

impl<F> Derivation for F
where
    F: Fn(GridId, &mut [f64]) + Send + Sync,
{
    fn derive(&self, grid: GridId, out: &mut [f64]) {
        self(grid, out)
    }
}

/// Definition of a field the simulation exposes to the analysis runtime.
///
/// A field without a derivation is still a valid registry entry (it may
/// be served as raw data by other collaborators) but cannot be computed
/// through the bridge.
#[derive(Clone)]
pub struct FieldDescriptor {
    /// Exact, case-sensitive lookup key.
    pub name: String,
    /// Routine computing the field on demand, if any.
    pub derivation: Option<Arc<dyn Derivation>>,
}

impl FieldDescriptor {
    /// A field with no derivation routine.
    pub fn raw(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            derivation: None,
        }
    }

    /// A field computed on demand by `derivation`.
    pub fn derived(name: impl Into<String>, derivation: impl Derivation + 'static) -> Self {
        Self {
            name: name.into(),
            derivation: Some(Arc::new(derivation)),
        }
    }

    /// Returns `true` if the field has a derivation routine.
    pub fn is_derivable(&self) -> bool {
        self.derivation.is_some()
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("derivable", &self.is_derivable())
            .finish()
    }
}

/// Ordered, write-once collection of [`FieldDescriptor`]s.
///
/// Built by the parameter-setting phase and read by every derived-field
/// request until the next rebuild. Names are unique: duplicates are
/// rejected at construction rather than shadowed.
#[derive(Clone, Debug, Default)]
pub struct FieldRegistry {
    fields: Vec<FieldDescriptor>,
}

impl FieldRegistry {
    /// Create an empty registry.
    pub const fn empty() -> Self {
        Self { fields: Vec::new() }
    }

    /// Build a registry, rejecting empty and duplicated names.
    pub fn new(fields: Vec<FieldDescriptor>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::with_capacity(fields.len());
        for (index, field) in fields.iter().enumerate() {
            if field.name.is_empty() {
                return Err(RegistryError::EmptyFieldName { index });
            }
            if !seen.insert(field.name.as_str()) {
                return Err(RegistryError::DuplicateField {
                    name: field.name.clone(),
                });
            }
        }
        Ok(Self { fields })
    }

    /// Look up a field by exact name.
    pub fn lookup(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Number of registered fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if no fields are registered.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over the fields in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ones(_: GridId, out: &mut [f64]) {
        out.fill(1.0);
    }

    #[test]
    fn lookup_is_exact_and_case_sensitive() {
        let reg = FieldRegistry::new(vec![
            FieldDescriptor::derived("density", ones),
            FieldDescriptor::raw("Temperature"),
        ])
        .unwrap();
        assert!(reg.lookup("density").is_some());
        assert!(reg.lookup("Density").is_none());
        assert!(reg.lookup("dens").is_none());
        assert!(reg.lookup("temperature").is_none());
        assert_eq!(reg.lookup("Temperature").unwrap().name, "Temperature");
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = FieldRegistry::new(vec![
            FieldDescriptor::raw("density"),
            FieldDescriptor::derived("density", ones),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateField {
                name: "density".into()
            }
        );
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = FieldRegistry::new(vec![
            FieldDescriptor::raw("density"),
            FieldDescriptor::raw(""),
        ])
        .unwrap_err();
        assert_eq!(err, RegistryError::EmptyFieldName { index: 1 });
    }

    #[test]
    fn derivable_flag_tracks_routine() {
        assert!(FieldDescriptor::derived("a", ones).is_derivable());
        assert!(!FieldDescriptor::raw("b").is_derivable());
    }

    #[test]
    fn closure_derivation_runs_in_place() {
        let field = FieldDescriptor::derived("gid", |grid: GridId, out: &mut [f64]| {
            out[0] = grid.0 as f64;
        });
        let mut buf = vec![0.0; 2];
        field.derivation.unwrap().derive(GridId(5), &mut buf);
        assert_eq!(buf, vec![5.0, 0.0]);
    }

    #[test]
    fn debug_hides_routine() {
        let s = format!("{:?}", FieldDescriptor::derived("density", ones));
        assert!(s.contains("density"));
        assert!(s.contains("derivable: true"));
    }

    #[test]
    fn iteration_preserves_order() {
        let reg = FieldRegistry::new(vec![
            FieldDescriptor::raw("c"),
            FieldDescriptor::raw("a"),
            FieldDescriptor::raw("b"),
        ])
        .unwrap();
        let names: Vec<&str> = reg.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["c", "a", "b"]);
        assert_eq!(reg.len(), 3);
        assert!(!reg.is_empty());
        assert!(FieldRegistry::empty().is_empty());
    }
}
