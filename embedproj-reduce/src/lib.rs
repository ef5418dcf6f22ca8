//! Embedding Projection Plugin
//!
//! Serves the projection pipeline from `embedproj-core` over the plugin gRPC
//! protocol. Operations are JSON endpoints tunnelled through `HandleHttp`:
//!
//! - `POST /reduce` - batch reduction (learned with deterministic fallback)
//! - `POST /normalize` - per-dimension min-max rescaling
//! - `POST /place` - place one embedding into an existing coordinate space
//! - `GET /status` - request counters
//!
//! Build with the `umap` feature to use Python umap-learn as the learned
//! reducer. Without it every batch is projected by the fallback.

pub mod config;
pub mod handlers;
pub mod logging;
pub mod service;

#[cfg(feature = "umap")]
pub mod umap;

pub mod proto {
    tonic::include_proto!("embedproj.reduce");
}

pub use service::ReducePluginService;

#[cfg(feature = "umap")]
pub use umap::UmapReducer;

/// Learned reducer selected at compile time.
#[cfg(feature = "umap")]
pub type DefaultReducer = umap::UmapReducer;

/// Learned reducer selected at compile time.
#[cfg(not(feature = "umap"))]
pub type DefaultReducer = embedproj_core::UnavailableReducer;
