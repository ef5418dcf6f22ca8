//! Learned reducer backed by Python umap-learn through PyO3.

use std::future::Future;

use embedproj_core::{ExternalReducer, ReducerError, ReducerParams};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};
use tracing::debug;

/// UMAP with cosine metric. Each batch fits a fresh model; nothing is kept
/// between calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct UmapReducer;

impl UmapReducer {
    pub fn new() -> Self {
        Self
    }

    /// Check whether the `umap` module can be imported.
    pub fn is_available() -> bool {
        Python::with_gil(|py| py.import("umap").is_ok())
    }
}

impl ExternalReducer for UmapReducer {
    fn name(&self) -> &'static str {
        "umap-learn"
    }

    fn fit_transform(
        &self,
        vectors: &[Vec<f32>],
        params: &ReducerParams,
    ) -> impl Future<Output = Result<Vec<Vec<f32>>, ReducerError>> + Send {
        let vectors = vectors.to_vec();
        let params = params.clone();

        async move {
            // The blocking task runs to completion even if this future is dropped.
            tokio::task::spawn_blocking(move || fit_transform_blocking(&vectors, &params))
                .await
                .map_err(|e| ReducerError::Failed(format!("umap worker failed: {}", e)))?
        }
    }
}

fn fit_transform_blocking(
    vectors: &[Vec<f32>],
    params: &ReducerParams,
) -> Result<Vec<Vec<f32>>, ReducerError> {
    debug!(
        n_points = vectors.len(),
        n_components = params.n_components,
        n_neighbors = params.n_neighbors,
        "Running umap fit_transform"
    );

    Python::with_gil(|py| {
        let umap_mod = py
            .import("umap")
            .map_err(|e| ReducerError::Unavailable(format!("umap-learn not importable: {}", e)))?;

        run_umap(py, &umap_mod, vectors, params)
            .map_err(|e| ReducerError::Failed(format!("umap fit_transform failed: {}", e)))
    })
}

fn run_umap(
    py: Python<'_>,
    umap_mod: &Bound<'_, PyModule>,
    vectors: &[Vec<f32>],
    params: &ReducerParams,
) -> PyResult<Vec<Vec<f32>>> {
    let np = py.import("numpy")?;

    let inner_lists: Vec<Bound<'_, PyList>> = vectors
        .iter()
        .map(|row| PyList::new(py, row.iter()))
        .collect::<PyResult<Vec<_>>>()?;
    let py_list = PyList::new(py, inner_lists.iter())?;
    let np_array = np.call_method1("array", (py_list, "float32"))?;

    let kwargs = PyDict::new(py);
    kwargs.set_item("n_components", params.n_components)?;
    kwargs.set_item("n_neighbors", params.n_neighbors)?;
    kwargs.set_item("min_dist", params.min_dist)?;
    kwargs.set_item("spread", params.spread)?;
    kwargs.set_item("metric", "cosine")?;
    if let Some(seed) = params.seed {
        kwargs.set_item("random_state", seed)?;
    }

    let reducer = umap_mod.getattr("UMAP")?.call((), Some(&kwargs))?;
    let result = reducer.call_method1("fit_transform", (np_array,))?;
    result.call_method0("tolist")?.extract()
}
