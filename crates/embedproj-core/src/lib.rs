//! Embedding Projection Core
//!
//! Turns high-dimensional embedding vectors (width 384 or 1536) into 2D or 3D
//! coordinates for visualization. The learned reducer itself is an external
//! collaborator behind [`ExternalReducer`]; this crate provides everything
//! around it:
//!
//! - [`ReductionOrchestrator`] - validation and learned/fallback dispatch
//! - [`FallbackProjector`] - deterministic segment-average projection
//! - [`CoordinateNormalizer`] - per-dimension min-max rescaling
//! - [`NeighborInterpolator`] - placement of one new vector into an existing space
//! - [`CosineMetric`] - distance used by neighbor search
//!
//! # Example
//!
//! ```rust
//! use embedproj_core::{
//!     CoordinateNormalizer, ReductionConfig, ReductionOrchestrator, TargetRange,
//!     UnavailableReducer,
//! };
//!
//! # tokio_test_block(async {
//! let orchestrator = ReductionOrchestrator::new(UnavailableReducer);
//! let vectors = vec![vec![0.5; 384], vec![-0.5; 384]];
//! let coords = orchestrator
//!     .reduce(&vectors, &ReductionConfig::default())
//!     .await
//!     .unwrap();
//! assert_eq!(coords.len(), 2);
//!
//! let scaled = CoordinateNormalizer::normalize(&coords, TargetRange::default());
//! assert_eq!(scaled[0], vec![10.0, 10.0, 10.0]);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

pub mod config;
pub mod error;
pub mod fallback;
pub mod interpolate;
pub mod metric;
pub mod normalize;
pub mod orchestrator;
pub mod reducer;
pub mod types;

// Re-export main types at crate root
pub use config::{Dimensions, ReductionConfig, ReductionMethod};
pub use error::{ProjectionError, ReducerError, Result};
pub use fallback::FallbackProjector;
pub use interpolate::NeighborInterpolator;
pub use metric::CosineMetric;
pub use normalize::CoordinateNormalizer;
pub use orchestrator::ReductionOrchestrator;
pub use reducer::{ExternalReducer, ReducerParams, UnavailableReducer};
pub use types::{
    CoordinateResult, Coordinates, Provenance, Reduction, ReferenceSet, TargetRange,
    ACCEPTED_WIDTHS,
};
