use crate::handlers::{HandlerContext, ReduceStats};
use crate::proto::{
    projection_plugin_service_server::ProjectionPluginService, Empty, HealthResponse, HttpHeader,
    HttpRequest, HttpResponse, MetadataResponse,
};
use crate::DefaultReducer;
use embedproj_core::ExternalReducer;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::{debug, info};

/// Embedding projection plugin gRPC service.
pub struct ReducePluginService<R = DefaultReducer> {
    handlers: HandlerContext<R>,
}

impl<R: ExternalReducer> ReducePluginService<R> {
    pub fn new(reducer: R) -> Self {
        let stats = Arc::new(RwLock::new(ReduceStats::default()));

        Self {
            handlers: HandlerContext::new(reducer, stats),
        }
    }

    /// Name of the learned reducer backend.
    pub fn backend_name(&self) -> &'static str {
        self.handlers.backend_name()
    }
}

impl Default for ReducePluginService<DefaultReducer> {
    fn default() -> Self {
        Self::new(DefaultReducer::default())
    }
}

#[tonic::async_trait]
impl<R: ExternalReducer + 'static> ProjectionPluginService for ReducePluginService<R> {
    async fn metadata(
        &self,
        _request: Request<Empty>,
    ) -> Result<Response<MetadataResponse>, Status> {
        debug!("Metadata request received");
        Ok(Response::new(MetadataResponse {
            name: "reduce".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: "Embedding projection plugin (learned reduction with deterministic fallback)"
                .to_string(),
            author: "embedproj Contributors".to_string(),
            license: "MIT".to_string(),
        }))
    }

    async fn shutdown(&self, _request: Request<Empty>) -> Result<Response<Empty>, Status> {
        info!("Shutting down Reduce plugin");
        self.handlers.reset_stats();
        Ok(Response::new(Empty {}))
    }

    async fn handle_http(
        &self,
        request: Request<HttpRequest>,
    ) -> Result<Response<HttpResponse>, Status> {
        let req = request.into_inner();
        let path = &req.path;
        let method = &req.method;

        debug!("HTTP request: {} {}", method, path);

        let body: Result<serde_json::Value, Status> = if req.body.is_empty() {
            Ok(serde_json::Value::Null)
        } else {
            serde_json::from_slice(&req.body)
                .map_err(|e| Status::invalid_argument(format!("Invalid JSON body: {}", e)))
        };

        let result = match body {
            Ok(body) => match (method.as_str(), path.as_str()) {
                ("POST", "/reduce") => self.handlers.handle_reduce(body).await,
                ("POST", "/normalize") => self.handlers.handle_normalize(body),
                ("POST", "/place") => self.handlers.handle_place(body),
                ("GET", "/status") => self.handlers.handle_status(),
                _ => Err(Status::not_found(format!(
                    "Unknown endpoint: {} {}",
                    method, path
                ))),
            },
            Err(status) => Err(status),
        };

        match result {
            Ok(response) => Ok(Response::new(response)),
            Err(status) => {
                let error_body = serde_json::json!({
                    "error": status.message()
                });
                Ok(Response::new(HttpResponse {
                    status_code: match status.code() {
                        tonic::Code::NotFound => 404,
                        tonic::Code::InvalidArgument => 400,
                        tonic::Code::FailedPrecondition => 412,
                        _ => 500,
                    },
                    headers: vec![HttpHeader {
                        name: "Content-Type".to_string(),
                        values: vec!["application/json".to_string()],
                    }],
                    body: serde_json::to_vec(&error_body).unwrap_or_default(),
                }))
            }
        }
    }

    async fn health(&self, _request: Request<Empty>) -> Result<Response<HealthResponse>, Status> {
        let stats = self.handlers.stats.read();

        let mut details = HashMap::new();
        details.insert(
            "learned_backend".to_string(),
            self.handlers.backend_name().to_string(),
        );
        details.insert("reductions".to_string(), stats.reductions.to_string());
        details.insert("fallbacks".to_string(), stats.fallbacks.to_string());
        details.insert("placements".to_string(), stats.placements.to_string());

        Ok(Response::new(HealthResponse {
            healthy: true,
            message: "OK".to_string(),
            details,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedproj_core::{FallbackProjector, ReducerError, ReducerParams, ReductionConfig};
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    /// Learned reducer stand-in returning the first components of each vector.
    struct PrefixReducer;

    impl ExternalReducer for PrefixReducer {
        fn name(&self) -> &'static str {
            "prefix"
        }

        async fn fit_transform(
            &self,
            vectors: &[Vec<f32>],
            params: &ReducerParams,
        ) -> Result<Vec<Vec<f32>>, ReducerError> {
            Ok(vectors
                .iter()
                .map(|v| v[..params.n_components].to_vec())
                .collect())
        }
    }

    fn http(method: &str, path: &str, body: serde_json::Value) -> Request<HttpRequest> {
        Request::new(HttpRequest {
            method: method.to_string(),
            path: path.to_string(),
            headers: vec![],
            body: if body.is_null() {
                Vec::new()
            } else {
                serde_json::to_vec(&body).unwrap()
            },
        })
    }

    async fn call(
        service: &ReducePluginService<impl ExternalReducer + 'static>,
        method: &str,
        path: &str,
        body: serde_json::Value,
    ) -> (i32, serde_json::Value) {
        let response = service
            .handle_http(http(method, path, body))
            .await
            .unwrap()
            .into_inner();
        let json = serde_json::from_slice(&response.body).unwrap();
        (response.status_code, json)
    }

    fn batch(n: usize, width: usize) -> Vec<Vec<f32>> {
        (0..n)
            .map(|i| (0..width).map(|j| (i + j) as f32).collect())
            .collect()
    }

    #[tokio::test]
    async fn test_metadata() {
        let service = ReducePluginService::new(PrefixReducer);
        let response = service.metadata(Request::new(Empty {})).await.unwrap();
        let meta = response.into_inner();
        assert_eq!(meta.name, "reduce");
        assert!(!meta.version.is_empty());
    }

    #[tokio::test]
    async fn test_health_reports_backend() {
        let service = ReducePluginService::new(PrefixReducer);
        let health = service
            .health(Request::new(Empty {}))
            .await
            .unwrap()
            .into_inner();
        assert!(health.healthy);
        assert_eq!(health.details["learned_backend"], "prefix");
        assert_eq!(health.details["reductions"], "0");
    }

    #[tokio::test]
    async fn test_reduce_learned() {
        let service = ReducePluginService::new(PrefixReducer);
        let body = serde_json::json!({
            "embeddings": batch(4, 384),
            "dimensions": 2,
            "n_neighbors": 3,
        });

        let (status, json) = call(&service, "POST", "/reduce", body).await;
        assert_eq!(status, 200);

        #[derive(Deserialize)]
        struct ReduceResponse {
            method: String,
            projections: Vec<Vec<f32>>,
            n_points: usize,
            dimensions: usize,
        }

        let response: ReduceResponse = serde_json::from_value(json).unwrap();
        assert_eq!(response.method, "learned");
        assert_eq!(response.n_points, 4);
        assert_eq!(response.dimensions, 2);
        assert_eq!(response.projections[1], vec![1.0, 2.0]);
    }

    #[tokio::test]
    async fn test_reduce_small_batch_falls_back() {
        let service = ReducePluginService::new(PrefixReducer);
        let embeddings = batch(3, 1536);
        let body = serde_json::json!({ "embeddings": embeddings });

        let (status, json) = call(&service, "POST", "/reduce", body).await;
        assert_eq!(status, 200);
        assert_eq!(json["method"], "fallback");

        let projections: Vec<Vec<f32>> =
            serde_json::from_value(json["projections"].clone()).unwrap();
        let config = ReductionConfig::default();
        assert_eq!(
            projections,
            FallbackProjector::project(&embeddings, config.dimensions)
        );
    }

    #[tokio::test]
    async fn test_reduce_with_normalization() {
        let service = ReducePluginService::new(PrefixReducer);
        let body = serde_json::json!({
            "embeddings": batch(3, 384),
            "dimensions": 2,
            "n_neighbors": 2,
            "normalize": { "min": -1.0, "max": 1.0 },
        });

        let (_, json) = call(&service, "POST", "/reduce", body).await;
        let projections: Vec<Vec<f32>> =
            serde_json::from_value(json["projections"].clone()).unwrap();
        assert_eq!(
            projections,
            vec![vec![-1.0, -1.0], vec![0.0, 0.0], vec![1.0, 1.0]]
        );
    }

    #[tokio::test]
    async fn test_reduce_rejects_invalid_input() {
        let service = ReducePluginService::new(PrefixReducer);

        let (status, json) = call(
            &service,
            "POST",
            "/reduce",
            serde_json::json!({ "embeddings": batch(2, 100) }),
        )
        .await;
        assert_eq!(status, 400);
        assert!(json["error"].as_str().unwrap().contains("width 100"));

        let (status, json) = call(
            &service,
            "POST",
            "/reduce",
            serde_json::json!({ "embeddings": batch(2, 384), "method": "tsne" }),
        )
        .await;
        assert_eq!(status, 400);
        assert!(json["error"]
            .as_str()
            .unwrap()
            .contains("unsupported reduction method"));

        let (status, _) = call(
            &service,
            "POST",
            "/reduce",
            serde_json::json!({ "embeddings": [], "dimensions": 5 }),
        )
        .await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_reduce_empty_batch() {
        let service = ReducePluginService::new(PrefixReducer);
        let (status, json) = call(
            &service,
            "POST",
            "/reduce",
            serde_json::json!({ "embeddings": [] }),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(json["n_points"], 0);
        assert_eq!(json["projections"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_normalize_endpoint() {
        let service = ReducePluginService::new(PrefixReducer);
        let body = serde_json::json!({
            "coordinates": [[5.0, 0.0], [5.0, 10.0]],
            "min": -1.0,
            "max": 1.0,
        });

        let (status, json) = call(&service, "POST", "/normalize", body).await;
        assert_eq!(status, 200);
        assert_eq!(
            json["coordinates"],
            serde_json::json!([[0.0, -1.0], [0.0, 1.0]])
        );
    }

    #[tokio::test]
    async fn test_place_endpoint() {
        let service = ReducePluginService::new(PrefixReducer);

        let (status, json) = call(
            &service,
            "POST",
            "/place",
            serde_json::json!({ "embedding": [1.0, 1.0, 2.0, 2.0, 3.0, 3.0] }),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(json["method"], "fallback");
        assert_eq!(
            json["coordinates"],
            serde_json::json!({ "x": 1.0, "y": 2.0, "z": 3.0 })
        );

        let (status, json) = call(
            &service,
            "POST",
            "/place",
            serde_json::json!({
                "embedding": [0.0, 1.0],
                "reference": {
                    "vectors": [[0.0, 1.0], [1.0, 0.0]],
                    "coordinates": [[2.0, 2.0], [2.0, 2.0]],
                },
            }),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(json["method"], "learned");
        assert_eq!(json["coordinates"]["z"], 0.0);
    }

    #[tokio::test]
    async fn test_place_rejects_uneven_reference() {
        let service = ReducePluginService::new(PrefixReducer);
        let (status, json) = call(
            &service,
            "POST",
            "/place",
            serde_json::json!({
                "embedding": [0.0, 1.0],
                "reference": { "vectors": [[0.0, 1.0]], "coordinates": [] },
            }),
        )
        .await;
        assert_eq!(status, 400);
        assert!(json["error"].as_str().unwrap().contains("reference set mismatch"));
    }

    #[tokio::test]
    async fn test_status_tracks_requests() {
        let service = ReducePluginService::new(PrefixReducer);
        call(
            &service,
            "POST",
            "/reduce",
            serde_json::json!({ "embeddings": batch(2, 384) }),
        )
        .await;

        let (status, json) = call(&service, "GET", "/status", serde_json::Value::Null).await;
        assert_eq!(status, 200);
        assert_eq!(json["backend"], "prefix");
        assert_eq!(json["reductions"], 1);
        assert_eq!(json["fallbacks"], 1);
        assert_eq!(json["last_reduction"]["n_points"], 2);
        assert_eq!(json["last_reduction"]["method"], "fallback");

        service.shutdown(Request::new(Empty {})).await.unwrap();
        let (_, json) = call(&service, "GET", "/status", serde_json::Value::Null).await;
        assert_eq!(json["reductions"], 0);
        assert!(json["last_reduction"].is_null());
    }

    #[tokio::test]
    async fn test_unknown_endpoint() {
        let service = ReducePluginService::new(PrefixReducer);
        let (status, json) = call(&service, "DELETE", "/reduce", serde_json::Value::Null).await;
        assert_eq!(status, 404);
        assert!(json["error"].as_str().unwrap().contains("Unknown endpoint"));
    }

    #[tokio::test]
    async fn test_invalid_json_body() {
        let service = ReducePluginService::new(PrefixReducer);
        let request = Request::new(HttpRequest {
            method: "POST".to_string(),
            path: "/reduce".to_string(),
            headers: vec![],
            body: b"{not json".to_vec(),
        });
        let response = service.handle_http(request).await.unwrap().into_inner();
        assert_eq!(response.status_code, 400);
        assert_eq!(response.headers[0].values, vec!["application/json".to_string()]);

        let json: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        let message = json["error"].as_str().unwrap();
        assert!(message.starts_with("Invalid JSON body"), "got {}", message);
        assert_eq!(service.handlers.stats.read().reductions, 0);
    }
}
