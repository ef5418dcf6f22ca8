//! Shared data types for the projection pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{ProjectionError, Result};

/// Embedding widths accepted for batch reduction.
pub const ACCEPTED_WIDTHS: [usize; 2] = [384, 1536];

/// Provenance of a coordinate space.
///
/// Records which kind of projection produced the space a point lives in,
/// not the computation that placed that particular point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Learned,
    Fallback,
}

impl Provenance {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Provenance::Learned => "learned",
            Provenance::Fallback => "fallback",
        }
    }
}

/// A single placed point. `z` is 0.0 when the space is two-dimensional.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Coordinates {
    /// Build from a coordinate row, padding missing components with 0.0
    /// and ignoring anything past the third.
    pub fn from_slice(row: &[f32]) -> Self {
        let at = |i: usize| row.get(i).copied().unwrap_or(0.0);
        Self {
            x: at(0),
            y: at(1),
            z: at(2),
        }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

/// Result of placing a single vector into an existing coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateResult {
    pub coordinates: Coordinates,
    pub method: Provenance,
}

/// Result of a batch reduction together with the provenance of its space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reduction {
    pub coordinates: Vec<Vec<f32>>,
    pub method: Provenance,
}

/// Previously computed (vector, coordinate) pairs used to place new points.
///
/// Borrowed from the caller; index `i` describes the same entity in both
/// slices.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceSet<'a> {
    vectors: &'a [Vec<f32>],
    coordinates: &'a [Vec<f32>],
}

impl<'a> ReferenceSet<'a> {
    pub fn new(vectors: &'a [Vec<f32>], coordinates: &'a [Vec<f32>]) -> Result<Self> {
        if vectors.len() != coordinates.len() {
            return Err(ProjectionError::ReferenceMismatch {
                vectors: vectors.len(),
                coordinates: coordinates.len(),
            });
        }
        Ok(Self {
            vectors,
            coordinates,
        })
    }

    pub fn empty() -> Self {
        Self {
            vectors: &[],
            coordinates: &[],
        }
    }

    pub fn vectors(&self) -> &'a [Vec<f32>] {
        self.vectors
    }

    pub fn coordinates(&self) -> &'a [Vec<f32>] {
        self.coordinates
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// Numeric range that normalized coordinates are mapped into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetRange {
    pub min: f32,
    pub max: f32,
}

impl TargetRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn midpoint(&self) -> f32 {
        self.min + (self.max - self.min) / 2.0
    }
}

impl Default for TargetRange {
    fn default() -> Self {
        Self::new(-10.0, 10.0)
    }
}
