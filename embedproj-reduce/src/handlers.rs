use crate::proto::{HttpHeader, HttpResponse};
use embedproj_core::{
    CoordinateNormalizer, CoordinateResult, Dimensions, ExternalReducer, NeighborInterpolator,
    ProjectionError, Provenance, ReductionConfig, ReductionMethod, ReductionOrchestrator,
    ReferenceSet, TargetRange,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tonic::Status;
use tracing::info;

/// Summary of the most recent batch reduction. Never holds vectors.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct LastReduction {
    pub n_points: usize,
    pub dimensions: usize,
    pub method: Provenance,
    pub reduce_ms: u64,
}

/// Request counters reported by /status and Health.
#[derive(Debug, Clone, Default, Serialize)]
pub(crate) struct ReduceStats {
    pub reductions: u64,
    pub fallbacks: u64,
    pub normalizations: u64,
    pub placements: u64,
    pub last_reduction: Option<LastReduction>,
}

/// Handler context wrapping the pipeline and shared counters.
pub struct HandlerContext<R> {
    orchestrator: ReductionOrchestrator<R>,
    interpolator: NeighborInterpolator,
    pub(crate) stats: Arc<RwLock<ReduceStats>>,
}

impl<R: ExternalReducer> HandlerContext<R> {
    pub(crate) fn new(reducer: R, stats: Arc<RwLock<ReduceStats>>) -> Self {
        Self {
            orchestrator: ReductionOrchestrator::new(reducer),
            interpolator: NeighborInterpolator::new(),
            stats,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.orchestrator.reducer().name()
    }

    /// POST /reduce - project a batch of embeddings to 2D or 3D.
    pub async fn handle_reduce(&self, body: serde_json::Value) -> Result<HttpResponse, Status> {
        #[derive(Deserialize)]
        struct ReduceRequest {
            embeddings: Vec<Vec<f32>>,
            method: Option<String>,
            dimensions: Option<usize>,
            n_neighbors: Option<usize>,
            min_dist: Option<f32>,
            spread: Option<f32>,
            seed: Option<u64>,
            normalize: Option<TargetRange>,
        }

        let req: ReduceRequest = serde_json::from_value(body)
            .map_err(|e| Status::invalid_argument(format!("Invalid reduce request: {}", e)))?;

        let defaults = ReductionConfig::default();
        let config = ReductionConfig {
            dimensions: req
                .dimensions
                .map(Dimensions::try_from)
                .transpose()
                .map_err(invalid_argument)?
                .unwrap_or(defaults.dimensions),
            method: req
                .method
                .as_deref()
                .map(str::parse::<ReductionMethod>)
                .transpose()
                .map_err(invalid_argument)?
                .unwrap_or(defaults.method),
            n_neighbors: req.n_neighbors.unwrap_or(defaults.n_neighbors),
            min_dist: req.min_dist.unwrap_or(defaults.min_dist),
            spread: req.spread.unwrap_or(defaults.spread),
            seed: req.seed.or(defaults.seed),
        };

        let n_points = req.embeddings.len();
        let start = Instant::now();

        let reduction = self
            .orchestrator
            .reduce_tagged(&req.embeddings, &config)
            .await
            .map_err(invalid_argument)?;

        let projections = match req.normalize {
            Some(range) => CoordinateNormalizer::normalize(&reduction.coordinates, range),
            None => reduction.coordinates,
        };

        let reduce_ms = start.elapsed().as_millis() as u64;

        {
            let mut stats = self.stats.write();
            stats.reductions += 1;
            if reduction.method == Provenance::Fallback {
                stats.fallbacks += 1;
            }
            stats.last_reduction = Some(LastReduction {
                n_points,
                dimensions: config.dimensions.get(),
                method: reduction.method,
                reduce_ms,
            });
        }

        info!(
            method = reduction.method.as_str(),
            n_points,
            dimensions = config.dimensions.get(),
            reduce_ms,
            "Reduce complete"
        );

        #[derive(Serialize)]
        struct ReduceResponse {
            method: Provenance,
            projections: Vec<Vec<f32>>,
            n_points: usize,
            dimensions: usize,
            reduce_ms: u64,
        }

        json_response(
            200,
            &ReduceResponse {
                method: reduction.method,
                projections,
                n_points,
                dimensions: config.dimensions.get(),
                reduce_ms,
            },
        )
    }

    /// POST /normalize - rescale coordinates into a target range.
    pub fn handle_normalize(&self, body: serde_json::Value) -> Result<HttpResponse, Status> {
        #[derive(Deserialize)]
        struct NormalizeRequest {
            coordinates: Vec<Vec<f32>>,
            min: Option<f32>,
            max: Option<f32>,
        }

        let req: NormalizeRequest = serde_json::from_value(body)
            .map_err(|e| Status::invalid_argument(format!("Invalid normalize request: {}", e)))?;

        let defaults = TargetRange::default();
        let range = TargetRange::new(
            req.min.unwrap_or(defaults.min),
            req.max.unwrap_or(defaults.max),
        );

        let coordinates = CoordinateNormalizer::normalize(&req.coordinates, range);
        self.stats.write().normalizations += 1;

        #[derive(Serialize)]
        struct NormalizeResponse {
            coordinates: Vec<Vec<f32>>,
        }

        json_response(200, &NormalizeResponse { coordinates })
    }

    /// POST /place - place one embedding into a previously reduced space.
    pub fn handle_place(&self, body: serde_json::Value) -> Result<HttpResponse, Status> {
        #[derive(Deserialize, Default)]
        struct ReferencePayload {
            #[serde(default)]
            vectors: Vec<Vec<f32>>,
            #[serde(default)]
            coordinates: Vec<Vec<f32>>,
        }

        #[derive(Deserialize)]
        struct PlaceRequest {
            embedding: Vec<f32>,
            #[serde(default)]
            reference: ReferencePayload,
        }

        let req: PlaceRequest = serde_json::from_value(body)
            .map_err(|e| Status::invalid_argument(format!("Invalid place request: {}", e)))?;

        let reference = ReferenceSet::new(&req.reference.vectors, &req.reference.coordinates)
            .map_err(invalid_argument)?;

        let start = Instant::now();
        let CoordinateResult {
            coordinates,
            method,
        } = self.interpolator.place_single(&req.embedding, &reference);
        let place_ms = start.elapsed().as_millis() as u64;

        self.stats.write().placements += 1;

        info!(
            method = method.as_str(),
            n_reference = reference.len(),
            place_ms,
            "Place complete"
        );

        #[derive(Serialize)]
        struct PlaceResponse {
            coordinates: embedproj_core::Coordinates,
            method: Provenance,
            place_ms: u64,
        }

        json_response(
            200,
            &PlaceResponse {
                coordinates,
                method,
                place_ms,
            },
        )
    }

    /// GET /status - request counters and the last reduction summary.
    pub fn handle_status(&self) -> Result<HttpResponse, Status> {
        #[derive(Serialize)]
        struct StatusResponse {
            backend: &'static str,
            #[serde(flatten)]
            stats: ReduceStats,
        }

        let stats = self.stats.read().clone();
        json_response(
            200,
            &StatusResponse {
                backend: self.backend_name(),
                stats,
            },
        )
    }

    /// Reset counters.
    pub fn reset_stats(&self) {
        *self.stats.write() = ReduceStats::default();
    }
}

fn invalid_argument(e: ProjectionError) -> Status {
    Status::invalid_argument(e.to_string())
}

/// Create a JSON HTTP response.
fn json_response<T: Serialize>(status_code: i32, data: &T) -> Result<HttpResponse, Status> {
    let body = serde_json::to_vec(data)
        .map_err(|e| Status::internal(format!("Failed to serialize response: {}", e)))?;

    Ok(HttpResponse {
        status_code,
        headers: vec![HttpHeader {
            name: "Content-Type".to_string(),
            values: vec!["application/json".to_string()],
        }],
        body,
    })
}
