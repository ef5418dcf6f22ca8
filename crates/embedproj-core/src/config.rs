//! Reduction configuration records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProjectionError;

/// Reduction methods the pipeline recognizes.
///
/// Only [`ReductionMethod::Umap`] is supported. The others parse so that
/// callers get `UnsupportedMethod` instead of a generic parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ReductionMethod {
    /// Learned neighborhood-preserving projection
    #[default]
    Umap,
    Tsne,
    Pca,
}

impl ReductionMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ReductionMethod::Umap => "umap",
            ReductionMethod::Tsne => "tsne",
            ReductionMethod::Pca => "pca",
        }
    }

    pub const fn is_supported(&self) -> bool {
        matches!(self, ReductionMethod::Umap)
    }
}

impl fmt::Display for ReductionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReductionMethod {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "umap" | "learned-projection" => Ok(ReductionMethod::Umap),
            "tsne" | "t-sne" => Ok(ReductionMethod::Tsne),
            "pca" => Ok(ReductionMethod::Pca),
            _ => Err(ProjectionError::UnsupportedMethod(s.to_string())),
        }
    }
}

impl TryFrom<String> for ReductionMethod {
    type Error = ProjectionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReductionMethod> for String {
    fn from(method: ReductionMethod) -> Self {
        method.as_str().to_string()
    }
}

/// Output dimensionality of a projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum Dimensions {
    Two,
    #[default]
    Three,
}

impl Dimensions {
    pub const fn get(self) -> usize {
        match self {
            Dimensions::Two => 2,
            Dimensions::Three => 3,
        }
    }
}

impl TryFrom<usize> for Dimensions {
    type Error = ProjectionError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(Dimensions::Two),
            3 => Ok(Dimensions::Three),
            other => Err(ProjectionError::InvalidOutputDimensions(other)),
        }
    }
}

impl From<Dimensions> for usize {
    fn from(dims: Dimensions) -> Self {
        dims.get()
    }
}

/// Configuration for a batch reduction.
///
/// Missing fields deserialize to the values of [`ReductionConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReductionConfig {
    /// Output dimensionality (2 or 3)
    pub dimensions: Dimensions,
    /// Reduction method
    pub method: ReductionMethod,
    /// Neighborhood size requested from the learned reducer
    pub n_neighbors: usize,
    /// Minimum distance between embedded points
    pub min_dist: f32,
    /// Effective scale of embedded points
    pub spread: f32,
    /// Random seed forwarded to the learned reducer
    pub seed: Option<u64>,
}

impl Default for ReductionConfig {
    fn default() -> Self {
        Self {
            dimensions: Dimensions::Three,
            method: ReductionMethod::Umap,
            n_neighbors: 15,
            min_dist: 0.1,
            spread: 1.0,
            seed: None,
        }
    }
}
