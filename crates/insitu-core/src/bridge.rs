//! The derived-field computation bridge.
//!
//! [`Bridge::compute_derived_field`] resolves a field and a local grid,
//! allocates a zeroed `f64` buffer sized to the grid, lets the field's
//! derivation fill it in place, and returns a [`DerivedField`] that owns
//! the buffer outright. [`DerivedField::into_parts`] is the single point
//! where the buffer leaves the bridge; adapters move the `Vec` straight
//! into their runtime's array type without copying.

use std::alloc::{handle_alloc_error, Layout};

use crate::error::DeriveError;
use crate::field::FieldRegistry;
use crate::grid::LocalGridTable;
use crate::id::{GridId, Rank};

/// A computed field: a row-major 3-D block of `f64` with a known shape.
#[derive(Clone, Debug, PartialEq)]
pub struct DerivedField {
    shape: [usize; 3],
    data: Vec<f64>,
}

impl DerivedField {
    /// Array shape (cells along each axis).
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    /// Flattened row-major values.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Value at `(i, j, k)`, or `None` if out of bounds.
    pub fn get(&self, i: usize, j: usize, k: usize) -> Option<f64> {
        let [d0, d1, d2] = self.shape;
        if i >= d0 || j >= d1 || k >= d2 {
            return None;
        }
        self.data.get((i * d1 + j) * d2 + k).copied()
    }

    /// Give up the buffer, transferring ownership to the caller.
    pub fn into_parts(self) -> ([usize; 3], Vec<f64>) {
        (self.shape, self.data)
    }
}

/// Read-only view over the registries needed to derive fields.
#[derive(Clone, Copy, Debug)]
pub struct Bridge<'a> {
    fields: &'a FieldRegistry,
    grids: &'a LocalGridTable,
    rank: Rank,
}

impl<'a> Bridge<'a> {
    /// Create a bridge over `fields` and `grids` for `rank`.
    pub fn new(fields: &'a FieldRegistry, grids: &'a LocalGridTable, rank: Rank) -> Self {
        Self {
            fields,
            grids,
            rank,
        }
    }

    /// Compute `field_name` on local grid `grid`.
    ///
    /// The field is resolved before the grid, so an unknown field on a
    /// remote grid reports [`DeriveError::UnknownField`]. Cells the
    /// derivation does not write are `0.0` in the result.
    pub fn compute_derived_field(
        &self,
        grid: GridId,
        field_name: &str,
    ) -> Result<DerivedField, DeriveError> {
        let field = self
            .fields
            .lookup(field_name)
            .ok_or_else(|| DeriveError::UnknownField {
                name: field_name.to_string(),
            })?;
        let derivation =
            field
                .derivation
                .as_ref()
                .ok_or_else(|| DeriveError::FieldNotDerivable {
                    name: field_name.to_string(),
                })?;
        let desc = self
            .grids
            .lookup(grid)
            .ok_or(DeriveError::GridNotLocal {
                grid,
                rank: self.rank,
            })?;

        let mut data = zeroed_buffer(desc.cell_count());
        derivation.derive(grid, &mut data);
        tracing::trace!(%grid, field = field_name, cells = data.len(), "derived field");

        Ok(DerivedField {
            shape: desc.shape(),
            data,
        })
    }
}

/// Allocate `cells` zeroed slots or terminate the process.
///
/// A partially computed field would silently corrupt downstream
/// analysis, so there is no degraded path.
fn zeroed_buffer(cells: usize) -> Vec<f64> {
    let mut data = Vec::new();
    if data.try_reserve_exact(cells).is_err() {
        tracing::error!(cells, "allocating derived field buffer failed");
        match Layout::array::<f64>(cells) {
            Ok(layout) => handle_alloc_error(layout),
            Err(_) => std::process::abort(),
        }
    }
    data.resize(cells, 0.0);
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldDescriptor;
    use crate::grid::GridDescriptor;

    fn ones(_: GridId, out: &mut [f64]) {
        out.fill(1.0);
    }

    fn first_cell(_: GridId, out: &mut [f64]) {
        out[0] = 42.0;
    }

    fn linear_index(_: GridId, out: &mut [f64]) {
        for (i, v) in out.iter_mut().enumerate() {
            *v = i as f64;
        }
    }

    fn registries() -> (FieldRegistry, LocalGridTable) {
        let fields = FieldRegistry::new(vec![
            FieldDescriptor::derived("density", ones),
            FieldDescriptor::derived("first", first_cell),
            FieldDescriptor::derived("index", linear_index),
            FieldDescriptor::raw("pressure"),
        ])
        .unwrap();
        let grids = LocalGridTable::new(vec![
            GridDescriptor::new(GridId(7), [2, 2, 2]).unwrap(),
            GridDescriptor::new(GridId(8), [2, 3, 4]).unwrap(),
        ])
        .unwrap();
        (fields, grids)
    }

    #[test]
    fn density_on_local_grid_is_all_ones() {
        let (fields, grids) = registries();
        let bridge = Bridge::new(&fields, &grids, Rank(0));
        let out = bridge.compute_derived_field(GridId(7), "density").unwrap();
        assert_eq!(out.shape(), [2, 2, 2]);
        assert_eq!(out.as_slice(), &[1.0; 8]);
    }

    #[test]
    fn unknown_field_is_reported_by_name() {
        let (fields, grids) = registries();
        let bridge = Bridge::new(&fields, &grids, Rank(0));
        assert_eq!(
            bridge.compute_derived_field(GridId(7), "temperature"),
            Err(DeriveError::UnknownField {
                name: "temperature".into()
            })
        );
    }

    #[test]
    fn raw_field_is_not_derivable() {
        let (fields, grids) = registries();
        let bridge = Bridge::new(&fields, &grids, Rank(0));
        assert_eq!(
            bridge.compute_derived_field(GridId(7), "pressure"),
            Err(DeriveError::FieldNotDerivable {
                name: "pressure".into()
            })
        );
    }

    #[test]
    fn remote_grid_reports_grid_and_rank() {
        let (fields, grids) = registries();
        let bridge = Bridge::new(&fields, &grids, Rank(3));
        assert_eq!(
            bridge.compute_derived_field(GridId(3), "density"),
            Err(DeriveError::GridNotLocal {
                grid: GridId(3),
                rank: Rank(3)
            })
        );
    }

    #[test]
    fn field_is_resolved_before_grid() {
        let (fields, grids) = registries();
        let bridge = Bridge::new(&fields, &grids, Rank(0));
        assert!(matches!(
            bridge.compute_derived_field(GridId(3), "temperature"),
            Err(DeriveError::UnknownField { .. })
        ));
        assert!(matches!(
            bridge.compute_derived_field(GridId(3), "pressure"),
            Err(DeriveError::FieldNotDerivable { .. })
        ));
    }

    #[test]
    fn untouched_cells_stay_zero() {
        let (fields, grids) = registries();
        let bridge = Bridge::new(&fields, &grids, Rank(0));
        let out = bridge.compute_derived_field(GridId(7), "first").unwrap();
        assert_eq!(out.as_slice()[0], 42.0);
        assert!(out.as_slice()[1..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn layout_is_row_major() {
        let (fields, grids) = registries();
        let bridge = Bridge::new(&fields, &grids, Rank(0));
        let out = bridge.compute_derived_field(GridId(8), "index").unwrap();
        assert_eq!(out.shape(), [2, 3, 4]);
        assert_eq!(out.get(0, 0, 1), Some(1.0));
        assert_eq!(out.get(0, 1, 0), Some(4.0));
        assert_eq!(out.get(1, 0, 0), Some(12.0));
        assert_eq!(out.get(1, 2, 3), Some(23.0));
        assert_eq!(out.get(2, 0, 0), None);
    }

    #[test]
    fn into_parts_hands_over_the_buffer() {
        let (fields, grids) = registries();
        let bridge = Bridge::new(&fields, &grids, Rank(0));
        let out = bridge.compute_derived_field(GridId(8), "density").unwrap();
        let ptr = out.as_slice().as_ptr();
        let (shape, data) = out.into_parts();
        assert_eq!(shape, [2, 3, 4]);
        assert_eq!(data.len(), 24);
        assert_eq!(data.as_ptr(), ptr);
    }

    #[test]
    fn zeroed_buffer_has_exact_length() {
        let buf = zeroed_buffer(5);
        assert_eq!(buf, vec![0.0; 5]);
        assert!(zeroed_buffer(0).is_empty());
    }
}
