//! Bootstrap and `derived_func` through a real embedded interpreter.
//!
//! The interpreter and the init table are process-wide, so the whole
//! sequence lives in one test function. The NumPy success path is in
//! `numpy_handoff.rs`.

use std::sync::{Arc, Mutex};

use insitu_core::{BootstrapError, InSituContext, Rank};
use insitu_python::{
    activate, install_context, phase, register, shared_dict, BootstrapPhase, SharedDict,
};
use insitu_test_utils::density_scenario;
use pyo3::exceptions::{PyAttributeError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;

const PROBE: &str = r#"
import libyt

SHARED = sorted(
    name
    for name in ("grid_data", "hierarchy", "param_yt", "param_user")
    if isinstance(getattr(libyt, name), dict)
)
"#;

fn is_sequence(r: Result<(), BootstrapError>) -> bool {
    matches!(r, Err(BootstrapError::Sequence { .. }))
}

#[test]
fn bootstrap_then_derive() {
    // Phase B before Phase A.
    assert!(is_sequence(activate("insitu_probe")));
    assert_eq!(phase(), BootstrapPhase::Unregistered);

    register().unwrap();
    assert!(is_sequence(register()));
    // Interpreter not started yet.
    assert!(is_sequence(activate("insitu_probe")));
    assert_eq!(phase(), BootstrapPhase::Registered);

    Python::initialize();

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("insitu_probe.py"), PROBE).unwrap();
    let dir_name = dir.path().to_string_lossy().into_owned();
    Python::attach(|py| {
        py.import("sys")
            .unwrap()
            .getattr("path")
            .unwrap()
            .call_method1("insert", (0, dir_name))
            .unwrap();
    });

    let ctx = Arc::new(Mutex::new(InSituContext::new(Rank(0))));
    install_context(ctx.clone());

    activate("insitu_probe").unwrap();
    assert_eq!(phase(), BootstrapPhase::Activated);
    assert!(is_sequence(activate("insitu_probe")));

    Python::attach(|py| {
        let probe = py.import("insitu_probe").unwrap();
        let shared: Vec<String> = probe.getattr("SHARED").unwrap().extract().unwrap();
        assert_eq!(shared, ["grid_data", "hierarchy", "param_user", "param_yt"]);
        for dict in SharedDict::ALL {
            assert!(shared_dict(py, dict).unwrap().is_empty());
        }

        let libyt = py.import("libyt").unwrap();

        // Registries not set yet.
        let err = libyt
            .call_method1("derived_func", (7, "density"))
            .unwrap_err();
        assert!(err.is_instance_of::<PyRuntimeError>(py));
    });

    {
        let mut ctx = ctx.lock().unwrap();
        ctx.mark_runtime_initialized().unwrap();
        ctx.set_parameters(density_scenario()).unwrap();
    }

    Python::attach(|py| {
        let libyt = py.import("libyt").unwrap();

        let err = libyt.call_method1("derived_func", (7,)).unwrap_err();
        assert!(err.is_instance_of::<PyValueError>(py));
        let err = libyt
            .call_method1("derived_func", ("seven", "density"))
            .unwrap_err();
        assert!(err.is_instance_of::<PyValueError>(py));
        let err = libyt.call_method1("derived_func", (7, 1)).unwrap_err();
        assert!(err.is_instance_of::<PyValueError>(py));

        let err = libyt
            .call_method1("derived_func", (7, "temperature"))
            .unwrap_err();
        assert!(err.is_instance_of::<PyAttributeError>(py));
        assert!(err.value(py).to_string().contains("temperature"));

        let err = libyt
            .call_method1("derived_func", (3, "density"))
            .unwrap_err();
        assert!(err.is_instance_of::<PyAttributeError>(py));
        let msg = err.value(py).to_string();
        assert!(msg.contains("GID [ 3 ]"), "{msg}");
        assert!(msg.contains("rank [ 0 ]"), "{msg}");
    });
}
