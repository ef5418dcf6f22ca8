//! Batch reduction: validation, learned/fallback dispatch, failure recovery.

use tracing::{debug, warn};

use crate::config::ReductionConfig;
use crate::error::{ProjectionError, ReducerError, Result};
use crate::fallback::FallbackProjector;
use crate::reducer::{ExternalReducer, ReducerParams};
use crate::types::{Provenance, Reduction, ACCEPTED_WIDTHS};

/// Routes batches to a learned reducer, recovering with the fallback
/// projection whenever the reducer cannot be used or fails.
///
/// Holds no state besides the reducer handle; concurrent calls are
/// independent.
#[derive(Debug, Clone, Default)]
pub struct ReductionOrchestrator<R> {
    reducer: R,
}

impl<R: ExternalReducer> ReductionOrchestrator<R> {
    pub fn new(reducer: R) -> Self {
        Self { reducer }
    }

    pub fn reducer(&self) -> &R {
        &self.reducer
    }

    /// Reduce `vectors` to `config.dimensions` coordinates each.
    ///
    /// Fails only on an unsupported embedding width or method. Once those
    /// checks pass the call always returns one row per input vector.
    pub async fn reduce(
        &self,
        vectors: &[Vec<f32>],
        config: &ReductionConfig,
    ) -> Result<Vec<Vec<f32>>> {
        self.reduce_tagged(vectors, config)
            .await
            .map(|reduction| reduction.coordinates)
    }

    /// Same as [`reduce`](Self::reduce), also reporting which projection
    /// produced the batch.
    pub async fn reduce_tagged(
        &self,
        vectors: &[Vec<f32>],
        config: &ReductionConfig,
    ) -> Result<Reduction> {
        let Some(first) = vectors.first() else {
            return Ok(Reduction {
                coordinates: Vec::new(),
                method: Provenance::Learned,
            });
        };

        // All vectors are assumed to share the first one's width
        if !ACCEPTED_WIDTHS.contains(&first.len()) {
            return Err(ProjectionError::InvalidDimension { width: first.len() });
        }

        if !config.method.is_supported() {
            return Err(ProjectionError::UnsupportedMethod(
                config.method.to_string(),
            ));
        }

        let n_points = vectors.len();
        if n_points < config.n_neighbors.saturating_add(1) {
            debug!(
                n_points,
                n_neighbors = config.n_neighbors,
                "Too few samples for learned reducer, using fallback projection"
            );
            return Ok(Self::fallback(vectors, config));
        }

        let params = ReducerParams {
            n_components: config.dimensions.get(),
            n_neighbors: config.n_neighbors.min(n_points - 1),
            min_dist: config.min_dist,
            spread: config.spread,
            seed: config.seed,
        };

        let outcome = self
            .reducer
            .fit_transform(vectors, &params)
            .await
            .and_then(|rows| check_output(rows, n_points, params.n_components));

        match outcome {
            Ok(coordinates) => Ok(Reduction {
                coordinates,
                method: Provenance::Learned,
            }),
            Err(e) => {
                warn!(
                    method = %config.method,
                    n_points,
                    error = %e,
                    "Learned reducer failed, using fallback projection"
                );
                Ok(Self::fallback(vectors, config))
            }
        }
    }

    fn fallback(vectors: &[Vec<f32>], config: &ReductionConfig) -> Reduction {
        Reduction {
            coordinates: FallbackProjector::project(vectors, config.dimensions),
            method: Provenance::Fallback,
        }
    }
}

/// Reject reducer output that does not have one finite row of
/// `n_components` values per input point.
fn check_output(
    rows: Vec<Vec<f32>>,
    n_points: usize,
    n_components: usize,
) -> std::result::Result<Vec<Vec<f32>>, ReducerError> {
    if rows.len() != n_points {
        return Err(ReducerError::Malformed(format!(
            "expected {} rows, got {}",
            n_points,
            rows.len()
        )));
    }

    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_components) {
        return Err(ReducerError::Malformed(format!(
            "row {} has {} components, expected {}",
            i,
            row.len(),
            n_components
        )));
    }

    if rows.iter().flatten().any(|v| !v.is_finite()) {
        return Err(ReducerError::Malformed(
            "non-finite coordinate in output".to_string(),
        ));
    }

    Ok(rows)
}
