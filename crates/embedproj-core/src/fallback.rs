//! Deterministic segment-average projection.
//!
//! Each vector of length `L` is cut into `dimensions` disjoint segments of
//! `L / dimensions` elements (floor). Output component `i` is the mean of
//! segment `i`. When `L` is not a multiple of `dimensions` the trailing
//! `L % dimensions` elements belong to no segment and are ignored; the last
//! segment is not widened to absorb them.

use crate::config::Dimensions;

#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackProjector;

impl FallbackProjector {
    /// Project every vector independently.
    pub fn project(vectors: &[Vec<f32>], dimensions: Dimensions) -> Vec<Vec<f32>> {
        vectors
            .iter()
            .map(|v| Self::project_one(v, dimensions.get()))
            .collect()
    }

    /// Project a single vector into `dimensions` segment means.
    ///
    /// An empty segment (only when `v.len() < dimensions`) yields 0.0.
    pub fn project_one(v: &[f32], dimensions: usize) -> Vec<f32> {
        let step = v.len() / dimensions;

        (0..dimensions)
            .map(|i| {
                let start = i * step;
                let end = (start + step).min(v.len());
                let segment = &v[start..end];
                if segment.is_empty() {
                    0.0
                } else {
                    segment.iter().sum::<f32>() / segment.len() as f32
                }
            })
            .collect()
    }
}
