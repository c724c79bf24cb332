//! Reusable derivation fixtures.
//!
//! - [`ConstDerivation`]: fills every cell with a constant.
//! - [`FirstCellDerivation`]: writes only index 0, leaving the rest untouched.
//! - [`LinearIndexDerivation`]: writes each cell's flattened index.
//! - [`GridIdDerivation`]: fills every cell with the grid id.
//! - [`CountingDerivation`]: counts calls and records the last grid.

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use insitu_core::{Derivation, GridId};

/// Fills every cell with `value`.
#[derive(Clone, Copy, Debug)]
pub struct ConstDerivation {
    pub value: f64,
}

impl ConstDerivation {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl Derivation for ConstDerivation {
    fn derive(&self, _grid: GridId, out: &mut [f64]) {
        out.fill(self.value);
    }
}

/// Writes `value` to index 0 only.
///
/// Useful for checking that untouched cells come back as `0.0`.
#[derive(Clone, Copy, Debug)]
pub struct FirstCellDerivation {
    pub value: f64,
}

impl FirstCellDerivation {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl Derivation for FirstCellDerivation {
    fn derive(&self, _grid: GridId, out: &mut [f64]) {
        if let Some(first) = out.first_mut() {
            *first = self.value;
        }
    }
}

/// Writes each cell's row-major flattened index as its value.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinearIndexDerivation;

impl Derivation for LinearIndexDerivation {
    fn derive(&self, _grid: GridId, out: &mut [f64]) {
        for (i, v) in out.iter_mut().enumerate() {
            *v = i as f64;
        }
    }
}

/// Fills every cell with the grid id it was invoked for.
#[derive(Clone, Copy, Debug, Default)]
pub struct GridIdDerivation;

impl Derivation for GridIdDerivation {
    fn derive(&self, grid: GridId, out: &mut [f64]) {
        out.fill(grid.0 as f64);
    }
}

/// Fills with `1.0` and counts invocations.
///
/// Share it through an `Arc` to inspect the counter after registering
/// the same instance in a field descriptor.
#[derive(Debug)]
pub struct CountingDerivation {
    calls: AtomicUsize,
    last_grid: AtomicI64,
}

impl CountingDerivation {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            last_grid: AtomicI64::new(i64::MIN),
        }
    }

    /// How many times `derive()` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// The grid of the most recent call, if any.
    pub fn last_grid(&self) -> Option<GridId> {
        match self.last_grid.load(Ordering::Relaxed) {
            i64::MIN => None,
            id => Some(GridId(id)),
        }
    }
}

impl Default for CountingDerivation {
    fn default() -> Self {
        Self::new()
    }
}

impl Derivation for CountingDerivation {
    fn derive(&self, grid: GridId, out: &mut [f64]) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.last_grid.store(grid.0, Ordering::Relaxed);
        out.fill(1.0);
    }
}
