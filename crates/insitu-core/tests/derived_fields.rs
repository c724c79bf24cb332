use std::sync::Arc;

use insitu_core::{DeriveError, FieldDescriptor, GridId, Rank};
use insitu_test_utils::fixtures::{
    ConstDerivation, CountingDerivation, FirstCellDerivation, GridIdDerivation,
    LinearIndexDerivation,
};
use insitu_test_utils::{density_scenario, ready_context, TestParamsBuilder};
use proptest::prelude::*;

#[test]
fn density_scenario_end_to_end() {
    let ctx = ready_context(0, density_scenario());

    let out = ctx.compute_derived_field(GridId(7), "density").unwrap();
    assert_eq!(out.shape(), [2, 2, 2]);
    assert!(out.as_slice().iter().all(|&v| v == 1.0));

    assert_eq!(
        ctx.compute_derived_field(GridId(7), "temperature"),
        Err(DeriveError::UnknownField {
            name: "temperature".into()
        })
    );
    assert_eq!(
        ctx.compute_derived_field(GridId(3), "density"),
        Err(DeriveError::GridNotLocal {
            grid: GridId(3),
            rank: Rank(0)
        })
    );
}

#[test]
fn single_cell_write_leaves_rest_zero() {
    let params = TestParamsBuilder::new()
        .derived("first", FirstCellDerivation::new(5.0))
        .grid(1, [2, 2, 2])
        .build();
    let ctx = ready_context(0, params);
    let out = ctx.compute_derived_field(GridId(1), "first").unwrap();
    assert_eq!(out.as_slice(), &[5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
}

#[test]
fn repeated_calls_yield_identical_arrays() {
    let params = TestParamsBuilder::new()
        .derived("index", LinearIndexDerivation)
        .grid(2, [3, 1, 2])
        .build();
    let ctx = ready_context(0, params);
    let a = ctx.compute_derived_field(GridId(2), "index").unwrap();
    let b = ctx.compute_derived_field(GridId(2), "index").unwrap();
    assert_eq!(a, b);
    assert_ne!(a.as_slice().as_ptr(), b.as_slice().as_ptr());
}

#[test]
fn each_call_gets_a_fresh_zeroed_buffer() {
    let counter = Arc::new(CountingDerivation::new());
    let params = TestParamsBuilder::new()
        .field(FieldDescriptor {
            name: "counted".into(),
            derivation: Some(counter.clone()),
        })
        .derived("first", FirstCellDerivation::new(9.0))
        .grid(4, [1, 1, 2])
        .grid(5, [1, 1, 3])
        .build();
    let ctx = ready_context(2, params);

    ctx.compute_derived_field(GridId(4), "counted").unwrap();
    ctx.compute_derived_field(GridId(5), "counted").unwrap();
    assert_eq!(counter.calls(), 2);
    assert_eq!(counter.last_grid(), Some(GridId(5)));

    // A previous all-ones result must not leak into the next buffer.
    let out = ctx.compute_derived_field(GridId(5), "first").unwrap();
    assert_eq!(out.as_slice(), &[9.0, 0.0, 0.0]);
}

#[test]
fn failed_lookups_never_invoke_the_routine() {
    let counter = Arc::new(CountingDerivation::new());
    let params = TestParamsBuilder::new()
        .field(FieldDescriptor {
            name: "counted".into(),
            derivation: Some(counter.clone()),
        })
        .grid(4, [1, 1, 1])
        .build();
    let ctx = ready_context(0, params);
    assert!(ctx.compute_derived_field(GridId(99), "counted").is_err());
    assert_eq!(counter.calls(), 0);
}

#[test]
fn routine_receives_requested_grid_id() {
    let params = TestParamsBuilder::new()
        .derived("gid", GridIdDerivation)
        .grid(11, [1, 2, 1])
        .grid(12, [2, 1, 1])
        .build();
    let ctx = ready_context(0, params);
    assert_eq!(
        ctx.compute_derived_field(GridId(12), "gid").unwrap().as_slice(),
        &[12.0, 12.0]
    );
}

proptest! {
    #[test]
    fn shape_matches_grid_dimensions(
        dims in prop::array::uniform3(1i64..8),
        value in -1.0e6f64..1.0e6,
    ) {
        let params = TestParamsBuilder::new()
            .derived("c", ConstDerivation::new(value))
            .grid(1, dims)
            .build();
        let ctx = ready_context(0, params);
        let out = ctx.compute_derived_field(GridId(1), "c").unwrap();
        prop_assert_eq!(out.shape(), dims.map(|d| d as usize));
        prop_assert_eq!(out.as_slice().len(), (dims[0] * dims[1] * dims[2]) as usize);
        prop_assert!(out.as_slice().iter().all(|&v| v == value));
    }

    #[test]
    fn absent_field_is_always_unknown(name in "[a-z]{1,12}", grid in any::<i64>()) {
        prop_assume!(name != "density");
        let ctx = ready_context(0, density_scenario());
        prop_assert_eq!(
            ctx.compute_derived_field(GridId(grid), &name),
            Err(DeriveError::UnknownField { name: name.clone() })
        );
    }

    #[test]
    fn absent_grid_is_always_remote(grid in any::<i64>(), rank in 0i32..1024) {
        prop_assume!(grid != 7);
        let ctx = ready_context(rank, density_scenario());
        prop_assert_eq!(
            ctx.compute_derived_field(GridId(grid), "density"),
            Err(DeriveError::GridNotLocal { grid: GridId(grid), rank: Rank(rank) })
        );
    }
}
