//! Local grid metadata and the [`LocalGridTable`].

use std::collections::HashSet;

use crate::error::RegistryError;
use crate::id::GridId;

/// Largest cell count whose `f64` buffer stays within `isize::MAX` bytes.
const MAX_CELLS: u128 = (isize::MAX as u128) / (std::mem::size_of::<f64>() as u128);

/// Metadata for one grid owned by the current rank.
///
/// Dimensions are validated on construction, so [`cell_count`](Self::cell_count)
/// is always a size the bridge can allocate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridDescriptor {
    id: GridId,
    dimensions: [u32; 3],
    cells: usize,
}

impl GridDescriptor {
    /// Describe a grid with `dimensions` cells along its three axes.
    ///
    /// Every dimension must be positive, and the product must be
    /// addressable as an `f64` buffer.
    pub fn new(id: GridId, dimensions: [i64; 3]) -> Result<Self, RegistryError> {
        if dimensions.iter().any(|&d| d <= 0) {
            return Err(RegistryError::InvalidDimensions {
                grid: id,
                dimensions,
            });
        }
        let overflow = || RegistryError::CellCountOverflow {
            grid: id,
            dimensions,
        };
        let mut dims = [0u32; 3];
        for (slot, &d) in dims.iter_mut().zip(dimensions.iter()) {
            *slot = u32::try_from(d).map_err(|_| overflow())?;
        }
        let cells: u128 = dims.iter().map(|&d| d as u128).product();
        if cells > MAX_CELLS {
            return Err(overflow());
        }
        Ok(Self {
            id,
            dimensions: dims,
            cells: cells as usize,
        })
    }

    /// The grid's process-wide id.
    pub fn id(&self) -> GridId {
        self.id
    }

    /// Cell counts along the three axes.
    pub fn dimensions(&self) -> [u32; 3] {
        self.dimensions
    }

    /// Dimensions as an array shape.
    pub fn shape(&self) -> [usize; 3] {
        self.dimensions.map(|d| d as usize)
    }

    /// Total number of cells (`d0 * d1 * d2`).
    pub fn cell_count(&self) -> usize {
        self.cells
    }
}

/// Ordered, write-once collection of the grids this rank owns.
///
/// Rebuilt whenever the parameter-setting phase re-runs. Never contains
/// remote grids; ids are unique.
#[derive(Clone, Debug, Default)]
pub struct LocalGridTable {
    grids: Vec<GridDescriptor>,
}

impl LocalGridTable {
    /// Create an empty table.
    pub const fn empty() -> Self {
        Self { grids: Vec::new() }
    }

    /// Build a table, rejecting duplicated grid ids.
    pub fn new(grids: Vec<GridDescriptor>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::with_capacity(grids.len());
        for grid in &grids {
            if !seen.insert(grid.id) {
                return Err(RegistryError::DuplicateGrid { grid: grid.id });
            }
        }
        Ok(Self { grids })
    }

    /// Look up a local grid by id.
    pub fn lookup(&self, id: GridId) -> Option<&GridDescriptor> {
        self.grids.iter().find(|g| g.id == id)
    }

    /// Number of local grids.
    pub fn len(&self) -> usize {
        self.grids.len()
    }

    /// Returns `true` if this rank owns no grids.
    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }

    /// Iterate over the grids in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &GridDescriptor> {
        self.grids.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn cell_count_is_product_of_dimensions() {
        let g = GridDescriptor::new(GridId(7), [2, 3, 4]).unwrap();
        assert_eq!(g.cell_count(), 24);
        assert_eq!(g.dimensions(), [2, 3, 4]);
        assert_eq!(g.shape(), [2, 3, 4]);
        assert_eq!(g.id(), GridId(7));
    }

    #[test]
    fn non_positive_dimension_is_rejected() {
        for dims in [[0, 2, 2], [2, -1, 2], [2, 2, 0]] {
            let err = GridDescriptor::new(GridId(1), dims).unwrap_err();
            assert_eq!(
                err,
                RegistryError::InvalidDimensions {
                    grid: GridId(1),
                    dimensions: dims
                }
            );
        }
    }

    #[test]
    fn oversized_grid_is_rejected() {
        let dims = [u32::MAX as i64, u32::MAX as i64, u32::MAX as i64];
        assert!(matches!(
            GridDescriptor::new(GridId(1), dims),
            Err(RegistryError::CellCountOverflow { .. })
        ));
        let wide = [i64::from(u32::MAX) + 1, 1, 1];
        assert!(matches!(
            GridDescriptor::new(GridId(1), wide),
            Err(RegistryError::CellCountOverflow { .. })
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let a = GridDescriptor::new(GridId(4), [1, 1, 1]).unwrap();
        let b = GridDescriptor::new(GridId(4), [2, 2, 2]).unwrap();
        let err = LocalGridTable::new(vec![a, b]).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateGrid { grid: GridId(4) });
    }

    #[test]
    fn lookup_finds_only_local_grids() {
        let table = LocalGridTable::new(vec![
            GridDescriptor::new(GridId(7), [2, 2, 2]).unwrap(),
            GridDescriptor::new(GridId(9), [1, 2, 3]).unwrap(),
        ])
        .unwrap();
        assert_eq!(table.lookup(GridId(9)).unwrap().cell_count(), 6);
        assert!(table.lookup(GridId(3)).is_none());
        assert_eq!(table.len(), 2);
        assert!(LocalGridTable::empty().is_empty());
    }

    proptest! {
        #[test]
        fn shape_product_matches_cell_count(
            a in 1i64..64,
            b in 1i64..64,
            c in 1i64..64,
        ) {
            let g = GridDescriptor::new(GridId(0), [a, b, c]).unwrap();
            prop_assert_eq!(g.shape().iter().product::<usize>(), g.cell_count());
        }
    }
}
