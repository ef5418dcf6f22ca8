use std::future::Future;

use crate::error::ReducerError;

/// Parameters handed to a learned reducer for one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ReducerParams {
    /// Output dimensionality of every row
    pub n_components: usize,
    /// Neighborhood size, already clamped to `n_points - 1`
    pub n_neighbors: usize,
    pub min_dist: f32,
    pub spread: f32,
    /// Random seed; `None` lets the backend pick
    pub seed: Option<u64>,
}

/// Contract for learned dimensionality reduction backends.
///
/// Current implementation: Python umap-learn via the reduce plugin (PyO3).
/// The pipeline treats the backend as opaque: any error, or output that does
/// not match the request, sends the batch to the fallback projection.
///
/// Implementations must not rely on the returned future being polled to
/// completion. A caller may drop it at any time.
pub trait ExternalReducer: Send + Sync {
    /// Short backend name for health and status reporting.
    fn name(&self) -> &'static str {
        "external"
    }

    /// Fit on `vectors` and return one row of `params.n_components` floats
    /// per input vector.
    fn fit_transform(
        &self,
        vectors: &[Vec<f32>],
        params: &ReducerParams,
    ) -> impl Future<Output = Result<Vec<Vec<f32>>, ReducerError>> + Send;
}

/// Reducer used when no learned backend is compiled in. Always fails, so
/// every batch takes the fallback path.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableReducer;

impl ExternalReducer for UnavailableReducer {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    async fn fit_transform(
        &self,
        _vectors: &[Vec<f32>],
        _params: &ReducerParams,
    ) -> Result<Vec<Vec<f32>>, ReducerError> {
        Err(ReducerError::Unavailable(
            "no learned reducer backend configured".to_string(),
        ))
    }
}
