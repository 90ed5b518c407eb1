//! Registry Routes
//!
//! # Endpoints
//! - `POST /services` - Register an instance
//! - `DELETE /services` - Deregister an instance
//! - `GET /services` - Resolve the instance owning a key (query string)
//! - `GET /services/list` - List services and their instances
//! - `GET /services/get` - Same as `GET /services`
//! - `POST /services/get` - Resolve the instance owning a key (JSON body)
//! - `GET /healthy` - Health check

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    routing::get,
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::error::{CacheError, Result};
use crate::models::{
    Envelope, HealthResponse, RegistrationRequest, ResolveRequest, ResolvedInstance,
};
use crate::registry::Registry;

#[derive(Clone)]
pub struct RegistryState {
    pub registry: Arc<Registry>,
}

/// Creates the registry router.
pub fn create_registry_router(registry: Arc<Registry>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/services",
            get(resolve_query_handler)
                .post(register_handler)
                .delete(deregister_handler),
        )
        .route("/services/list", get(list_handler))
        .route("/services/get", get(resolve_query_handler).post(resolve_json_handler))
        .route("/healthy", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(RegistryState { registry })
}

fn registration(
    payload: std::result::Result<Json<RegistrationRequest>, JsonRejection>,
) -> Result<RegistrationRequest> {
    let Json(req) = payload.map_err(|e| CacheError::RegistryValidation(e.body_text()))?;
    if let Some(reason) = req.validate() {
        return Err(CacheError::RegistryValidation(reason));
    }
    Ok(req)
}

/// Handler for POST /services
pub async fn register_handler(
    State(state): State<RegistryState>,
    payload: std::result::Result<Json<RegistrationRequest>, JsonRejection>,
) -> Result<Json<Envelope<()>>> {
    let req = registration(payload)?;
    state.registry.add(&req.service_name, &req.service_url).await?;
    Ok(Json(Envelope::ok()))
}

/// Handler for DELETE /services
pub async fn deregister_handler(
    State(state): State<RegistryState>,
    payload: std::result::Result<Json<RegistrationRequest>, JsonRejection>,
) -> Result<Json<Envelope<()>>> {
    let req = registration(payload)?;
    state
        .registry
        .remove(&req.service_name, &req.service_url)
        .await?;
    Ok(Json(Envelope::ok()))
}

/// Handler for GET /services/list
pub async fn list_handler(
    State(state): State<RegistryState>,
) -> Json<Envelope<HashMap<String, Vec<String>>>> {
    Json(Envelope::success(state.registry.services().await))
}

async fn resolve(
    state: &RegistryState,
    req: ResolveRequest,
) -> Result<Json<Envelope<ResolvedInstance>>> {
    if let Some(reason) = req.validate() {
        return Err(CacheError::RegistryValidation(reason));
    }
    let url = state.registry.resolve(&req.service_name, &req.key).await?;
    Ok(Json(Envelope::success(ResolvedInstance { url })))
}

/// Handler for GET /services and GET /services/get
pub async fn resolve_query_handler(
    State(state): State<RegistryState>,
    query: std::result::Result<Query<ResolveRequest>, QueryRejection>,
) -> Result<Json<Envelope<ResolvedInstance>>> {
    let Query(req) = query.map_err(|e| CacheError::RegistryValidation(e.body_text()))?;
    resolve(&state, req).await
}

/// Handler for POST /services/get
pub async fn resolve_json_handler(
    State(state): State<RegistryState>,
    payload: std::result::Result<Json<ResolveRequest>, JsonRejection>,
) -> Result<Json<Envelope<ResolvedInstance>>> {
    let Json(req) = payload.map_err(|e| CacheError::RegistryValidation(e.body_text()))?;
    resolve(&state, req).await
}

/// Handler for GET /healthy
pub async fn health_handler() -> Json<Envelope<HealthResponse>> {
    Json(Envelope::success(HealthResponse::healthy()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    fn create_test_app() -> (Router, Arc<Registry>) {
        let registry = Arc::new(Registry::default());
        (create_registry_router(registry.clone()), registry)
    }

    fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_register_and_resolve() {
        let (app, registry) = create_test_app();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/services",
                r#"{"serviceName":"cache","serviceUrl":"http://localhost:8881"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(registry.instances("cache").await, vec!["http://localhost:8881"]);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/services/get?serviceName=cache&key=demo")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["code"], 200);
        assert_eq!(body["data"]["url"], "http://localhost:8881");

        let response = app
            .oneshot(json_request(
                "POST",
                "/services/get",
                r#"{"serviceName":"cache","key":"demo"}"#,
            ))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["data"]["url"], "http://localhost:8881");
    }

    #[tokio::test]
    async fn test_malformed_registration_is_rejected() {
        let (app, registry) = create_test_app();

        let response = app
            .clone()
            .oneshot(json_request("POST", "/services", "{not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["code"], 400);

        let response = app
            .oneshot(json_request(
                "POST",
                "/services",
                r#"{"serviceName":"cache","serviceUrl":"ftp://nope"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(registry.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_deregister_absent_is_not_found() {
        let (app, _) = create_test_app();

        let response = app
            .oneshot(json_request(
                "DELETE",
                "/services",
                r#"{"serviceName":"cache","serviceUrl":"http://localhost:8881"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_deregister_removes_instance() {
        let (app, registry) = create_test_app();
        registry.add("cache", "http://localhost:8881").await.unwrap();

        let response = app
            .oneshot(json_request(
                "DELETE",
                "/services",
                r#"{"serviceName":"cache","serviceUrl":"http://localhost:8881"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(registry.instances("cache").await.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_unknown_service() {
        let (app, _) = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/services/get?serviceName=nope&key=k")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_services() {
        let (app, registry) = create_test_app();
        registry.add("cache", "http://a:1").await.unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/services/list")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["data"]["cache"][0], "http://a:1");
    }

    #[tokio::test]
    async fn test_get_services_resolves_by_name() {
        let (app, registry) = create_test_app();
        registry.add("cache", "http://a:1").await.unwrap();

        // key is optional; an empty key still lands on the ring
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/services?serviceName=cache")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["code"], 200);
        assert_eq!(body["data"]["url"], "http://a:1");

        let response = app
            .oneshot(Request::builder().uri("/services").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
