// Python-binding. Tynne wrappere rundt json_api; all logikk ligger i kjernen.
use once_cell::sync::OnceCell;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::wrap_pyfunction;

use crate::catalog::ExerciseCatalog;
use crate::json_api;
use crate::metrics::Metrics;

// ──────────────────────────────────────────────────────────────────────────────
// Delte ressurser (én per prosess)
// ──────────────────────────────────────────────────────────────────────────────

static METRICS: OnceCell<Metrics> = OnceCell::new();

fn metrics() -> Result<&'static Metrics, String> {
    METRICS.get_or_try_init(Metrics::new).map_err(|e| format!("metrics init: {e}"))
}

fn catalog() -> Result<&'static ExerciseCatalog, String> {
    ExerciseCatalog::builtin().map_err(|e| format!("catalog: {e}"))
}

// ──────────────────────────────────────────────────────────────────────────────
// PyO3-funksjoner
// ──────────────────────────────────────────────────────────────────────────────

#[pyfunction]
fn analyze_segments(json_in: &str) -> PyResult<String> {
    let run = || json_api::analyze_segments_json(json_in, catalog()?, metrics()?);
    run().map_err(PyValueError::new_err)
}

#[pyfunction]
fn session_activation(json_in: &str) -> PyResult<String> {
    let run = || json_api::session_activation_json(json_in, catalog()?, metrics()?);
    run().map_err(PyValueError::new_err)
}

#[pyfunction]
fn balance_report(json_in: &str) -> PyResult<String> {
    json_api::balance_report_json(json_in).map_err(PyValueError::new_err)
}

/// Prometheus tekstformat for tellerne i denne prosessen.
#[pyfunction]
fn metrics_text() -> PyResult<String> {
    metrics().map(Metrics::render).map_err(PyValueError::new_err)
}

#[pymodule]
fn liftgraph_core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(analyze_segments, m)?)?;
    m.add_function(wrap_pyfunction!(session_activation, m)?)?;
    m.add_function(wrap_pyfunction!(balance_report, m)?)?;
    m.add_function(wrap_pyfunction!(metrics_text, m)?)?;
    Ok(())
}
