//! HTTP API for editing posts
//!
//! Routes live under a prefix (`/api/github` by default):
//!
//! | Method | Path      | Input          | Output                 |
//! |--------|-----------|----------------|------------------------|
//! | GET    | `/list`   |                | `{"posts": [...]}`     |
//! | GET    | `/get`    | `?slug=`       | post fields + content  |
//! | POST   | `/save`   | post JSON      | `{"success": true}`    |
//! | POST   | `/delete` | `{"slug": ..}` | `{"success": true}`    |
//!
//! Anything else answers `404 {"error": "Not found"}`. Every response is JSON
//! and carries permissive CORS headers; OPTIONS always succeeds.

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{
        header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::content::{Post, PostInput};
use crate::error::CmsError;
use crate::repository::PostRepository;

pub const DEFAULT_PREFIX: &str = "/api/github";

/// Server state
pub struct AppState {
    /// `None` when the store configuration was rejected at startup
    repository: Option<PostRepository>,
}

impl AppState {
    pub fn new(repository: Option<PostRepository>) -> Self {
        Self { repository }
    }

    /// Whether the store settings were accepted
    pub fn is_configured(&self) -> bool {
        self.repository.is_some()
    }

    fn repository(&self) -> Result<&PostRepository, CmsError> {
        self.repository
            .as_ref()
            .ok_or_else(|| CmsError::Configuration("GitHub configuration missing".to_string()))
    }
}

impl IntoResponse for CmsError {
    fn into_response(self) -> Response {
        let status = match &self {
            CmsError::Validation(_) => StatusCode::BAD_REQUEST,
            CmsError::NotFound(_) => StatusCode::NOT_FOUND,
            CmsError::Remote(_)
            | CmsError::Format(_)
            | CmsError::Configuration(_)
            | CmsError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = self.to_string();
        let message = if message.is_empty() {
            "Internal server error".to_string()
        } else {
            message
        };
        tracing::error!("API error ({}): {}", status.as_u16(), message);

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct SlugParams {
    slug: Option<String>,
}

impl SlugParams {
    fn require(self) -> Result<String, CmsError> {
        self.slug
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CmsError::validation("Slug required"))
    }
}

/// Build the API router
pub fn router(state: Arc<AppState>, prefix: &str) -> Router {
    let api = Router::new()
        .route("/list", get(list_posts).fallback(not_found))
        .route("/get", get(get_post).fallback(not_found))
        .route("/save", post(save_post).fallback(not_found))
        .route("/delete", post(delete_post).fallback(not_found));

    let prefix = prefix.trim_end_matches('/');
    let app = if prefix.is_empty() {
        api.fallback(not_found)
    } else {
        Router::new().nest(prefix, api).fallback(not_found)
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    // CorsLayer only sends the full header set on preflight; repeat it on
    // every response, preflight included, along with the JSON content type.
    app.layer(cors)
        .layer(SetResponseHeaderLayer::if_not_present(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("content-type"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the API server
pub async fn start(state: Arc<AppState>, ip: &str, port: u16, prefix: &str) -> Result<()> {
    let app = router(state, prefix);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    tracing::info!("API listening on http://{}{}", addr, prefix);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn list_posts(State(state): State<Arc<AppState>>) -> Result<Response, CmsError> {
    let posts = state.repository()?.list().await?;
    Ok(Json(json!({ "posts": posts })).into_response())
}

async fn get_post(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SlugParams>,
) -> Result<Json<Post>, CmsError> {
    let repository = state.repository()?;
    let slug = params.require()?;
    Ok(Json(repository.get(&slug).await?))
}

async fn save_post(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response, CmsError> {
    let repository = state.repository()?;
    let input: PostInput = serde_json::from_slice(&body)
        .map_err(|e| CmsError::validation(format!("Invalid request body: {}", e)))?;

    repository.save(&input).await?;
    Ok(Json(json!({ "success": true })).into_response())
}

async fn delete_post(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, CmsError> {
    let repository = state.repository()?;
    let params: SlugParams = serde_json::from_slice(&body)
        .map_err(|e| CmsError::validation(format!("Invalid request body: {}", e)))?;
    let slug = params.require()?;

    repository.delete(&slug).await?;
    Ok(Json(json!({ "success": true })).into_response())
}

async fn not_found(State(state): State<Arc<AppState>>) -> Result<Response, CmsError> {
    state.repository()?;
    Ok((StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> (Arc<MemoryStore>, Router) {
        let store = Arc::new(MemoryStore::new());
        let repository = PostRepository::new(store.clone());
        let state = Arc::new(AppState::new(Some(repository)));
        (store, router(state, DEFAULT_PREFIX))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn post_json(slug: &str) -> Value {
        json!({
            "slug": slug,
            "title": "Hello",
            "date": "2024-01-01",
            "tags": ["rust"],
            "summary": "Greeting",
            "content": "Body text"
        })
    }

    #[tokio::test]
    async fn test_options_returns_cors_headers() {
        let (_store, app) = app();
        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/github/anything")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert!(headers.contains_key("access-control-allow-methods"));
        assert!(headers.contains_key("access-control-allow-headers"));
        assert_eq!(headers[CONTENT_TYPE], "application/json");
    }

    #[tokio::test]
    async fn test_every_response_carries_cors_headers() {
        let (_store, app) = app();

        for (method, uri) in [("GET", "/api/github/list"), ("GET", "/api/github/unknown")] {
            let response = app
                .clone()
                .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            let headers = response.headers();
            assert_eq!(headers["access-control-allow-origin"], "*", "{}", uri);
            assert_eq!(headers["access-control-allow-methods"], "GET, POST, OPTIONS", "{}", uri);
            assert_eq!(headers["access-control-allow-headers"], "content-type", "{}", uri);
            assert_eq!(headers[CONTENT_TYPE], "application/json", "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_header_content_key_does_not_replace_body() {
        let (store, app) = app();
        store.insert(
            "content/posts/p.md",
            "---\ntitle: \"T\"\ncontent: \"header value\"\n---\n\nreal body",
        );

        let (status, body) = send(&app, "GET", "/api/github/get?slug=p", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["content"], "real body");
    }

    #[tokio::test]
    async fn test_save_get_list_delete() {
        let (store, app) = app();

        let (status, body) = send(&app, "POST", "/api/github/save", Some(post_json("hello"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));
        assert!(store.contents("content/posts/hello.md").is_some());

        let (status, body) = send(&app, "GET", "/api/github/get?slug=hello", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Hello");
        assert_eq!(body["summary"], "Greeting");
        assert_eq!(body["content"], "Body text");

        let (status, body) = send(&app, "GET", "/api/github/list", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["posts"][0]["slug"], "hello");
        assert_eq!(body["posts"][0]["draft"], false);

        let (status, _) = send(&app, "POST", "/api/github/delete", Some(json!({ "slug": "hello" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(store.contents("content/posts/hello.md").is_none());
    }

    #[tokio::test]
    async fn test_bad_requests() {
        let (store, app) = app();

        let (status, body) = send(&app, "GET", "/api/github/get", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Slug required");

        let (status, body) = send(&app, "POST", "/api/github/save", Some(post_json("Bad Slug"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid slug format");

        let (status, _) = send(&app, "POST", "/api/github/delete", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "POST", "/api/github/save", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_posts() {
        let (_store, app) = app();

        let (status, body) = send(&app, "GET", "/api/github/get?slug=nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Post not found");

        let (status, body) = send(&app, "POST", "/api/github/delete", Some(json!({ "slug": "nope" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "File not found");
    }

    #[tokio::test]
    async fn test_unknown_routes() {
        let (_store, app) = app();

        for (method, uri) in [
            ("GET", "/api/github/unknown"),
            ("GET", "/api/github/save"),
            ("POST", "/api/github/list"),
            ("GET", "/elsewhere"),
        ] {
            let (status, body) = send(&app, method, uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{} {}", method, uri);
            assert_eq!(body, json!({ "error": "Not found" }));
        }
    }

    #[tokio::test]
    async fn test_missing_configuration() {
        let app = router(Arc::new(AppState::new(None)), DEFAULT_PREFIX);

        for (method, uri) in [("GET", "/api/github/list"), ("GET", "/api/github/unknown")] {
            let (status, body) = send(&app, method, uri, None).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body["error"], "GitHub configuration missing");
        }
    }

    #[tokio::test]
    async fn test_store_conflict_is_server_error() {
        let (_store, app) = app();
        send(&app, "POST", "/api/github/save", Some(post_json("dup"))).await;

        let (status, body) = send(&app, "POST", "/api/github/save", Some(post_json("dup"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("sha"));
    }
}
