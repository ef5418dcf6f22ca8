//! Incremental placement of a single vector into an existing coordinate space.
//!
//! The new point is the inverse-distance weighted average of the coordinates
//! of its nearest reference vectors under cosine distance. No learned reducer
//! runs, but the result still lives in the reference space, so it carries
//! [`Provenance::Learned`].

use tracing::{debug, warn};

use crate::config::Dimensions;
use crate::fallback::FallbackProjector;
use crate::metric::CosineMetric;
use crate::types::{CoordinateResult, Coordinates, Provenance, ReferenceSet};

/// Maximum number of neighbors contributing to a placement.
pub const DEFAULT_K: usize = 5;

/// Added to every distance so an exact duplicate (distance 0) gets a large
/// but finite weight.
pub const DISTANCE_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy)]
pub struct NeighborInterpolator {
    k: usize,
    epsilon: f32,
}

impl Default for NeighborInterpolator {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            epsilon: DISTANCE_EPSILON,
        }
    }
}

impl NeighborInterpolator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `query` into the space described by `reference`. Never fails.
    ///
    /// Falls back to a 3-dimensional segment-average projection when the
    /// reference set is empty or its vectors do not share the query's width.
    pub fn place_single(&self, query: &[f32], reference: &ReferenceSet<'_>) -> CoordinateResult {
        if reference.is_empty() {
            debug!("Empty reference set, placing with fallback projection");
            return Self::fallback(query);
        }

        if let Some(other) = reference
            .vectors()
            .iter()
            .find(|v| v.len() != query.len())
        {
            warn!(
                query_width = query.len(),
                reference_width = other.len(),
                "Reference width mismatch, placing with fallback projection"
            );
            return Self::fallback(query);
        }

        let k = self.k.min(reference.len());

        let mut distances: Vec<(usize, f32)> = reference
            .vectors()
            .iter()
            .enumerate()
            .map(|(i, v)| (i, CosineMetric::distance(query, v)))
            .collect();
        // Stable: equal distances keep reference order
        distances.sort_by(|a, b| a.1.total_cmp(&b.1));

        let coordinates = reference.coordinates();
        let has_z = coordinates.first().is_some_and(|c| c.len() >= 3);

        let mut acc = [0.0f64; 3];
        let mut total_weight = 0.0f64;
        for &(i, dist) in distances.iter().take(k) {
            let weight = 1.0 / (dist as f64 + self.epsilon as f64);
            let point = Coordinates::from_slice(&coordinates[i]).to_array();
            for (slot, value) in acc.iter_mut().zip(point) {
                *slot += weight * value as f64;
            }
            total_weight += weight;
        }

        let component = |d: usize| (acc[d] / total_weight) as f32;

        CoordinateResult {
            coordinates: Coordinates {
                x: component(0),
                y: component(1),
                z: if has_z { component(2) } else { 0.0 },
            },
            method: Provenance::Learned,
        }
    }

    fn fallback(query: &[f32]) -> CoordinateResult {
        let row = FallbackProjector::project_one(query, Dimensions::Three.get());
        CoordinateResult {
            coordinates: Coordinates::from_slice(&row),
            method: Provenance::Fallback,
        }
    }
}
