//! Test application factory for integration tests.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use http_body_util::BodyExt;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use photomosaic::models::{AppConfig, CorpusPhotoEntry, JobId, JobStatus, ColorSampleGrid};
use photomosaic::server::{build_router, AppState};
use photomosaic::services::{InMemoryCorpus, InMemoryJobStore, JobStore};

use super::fixtures;

/// Test application with router and direct access to services
pub struct TestApp {
    router: axum::Router,
    pub state: AppState,
    /// Scratch directory for source images
    pub dir: TempDir,
    /// Port of the image host serving files from `dir`
    image_port: u16,
}

impl TestApp {
    /// App over the palette corpus with 2-pixel sampling and 1-row chunks
    pub fn new() -> Self {
        Self::with_corpus(fixtures::palette_corpus())
    }

    pub fn with_corpus(entries: Vec<CorpusPhotoEntry>) -> Self {
        Self::with_config(Self::test_config(), entries)
    }

    pub fn with_config(config: AppConfig, entries: Vec<CorpusPhotoEntry>) -> Self {
        let jobs: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
        let corpus = Arc::new(InMemoryCorpus::new(entries));
        let state = AppState::with_stores(config, jobs, corpus);
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let image_port = spawn_image_host(dir.path().to_path_buf());

        Self {
            router: build_router(state.clone()),
            state,
            dir,
            image_port,
        }
    }

    /// Defaults with source images kept at their native 2-pixel short side
    pub fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.sampling.target_size = 2;
        config.assembly.row_step = 1;
        config
    }

    /// Make a GET request to the given path
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(Request::get(path).body(Body::empty()).unwrap())
            .await
    }

    /// Make a POST request with JSON body
    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> TestResponse {
        let request = Request::post(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.request(request).await
    }

    /// Send a request to the router
    async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Write a PNG source image and return the URL it is served at
    pub fn source_image(&self, name: &str, rows: &[&[(u8, u8, u8)]]) -> String {
        fixtures::write_png(self.dir.path(), name, rows);
        self.image_url(name)
    }

    /// URL of `name` on the image host, whether or not the file exists
    pub fn image_url(&self, name: &str) -> String {
        format!("http://127.0.0.1:{}/images/{name}", self.image_port)
    }

    /// Create a mosaic through the API and return its id
    pub async fn create_mosaic(&self, input_img: &str, input_url: &str) -> String {
        let response = self
            .post_json(
                "/api/mosaics",
                &serde_json::json!({ "inputImg": input_img, "inputURL": input_url }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.text());

        let json: serde_json::Value = response.json();
        json["_id"].as_str().unwrap().to_string()
    }

    /// Store a queued job with a prepared grid, bypassing image sampling
    pub async fn seed_job(&self, input_url: &str, grid: ColorSampleGrid) -> JobId {
        let job = self
            .state
            .jobs
            .create_job(fixtures::new_job(input_url, grid))
            .await
            .expect("create job");
        self.state
            .jobs
            .advance_status(&job.id, JobStatus::Queued)
            .await
            .expect("queue job");
        job.id
    }
}

/// Serve files from `dir` under `/images/:name`.
///
/// Must be called from within a tokio runtime.
fn spawn_image_host(dir: PathBuf) -> u16 {
    async fn serve_file(
        State(dir): State<Arc<PathBuf>>,
        Path(name): Path<String>,
    ) -> Result<Vec<u8>, StatusCode> {
        tokio::fs::read(dir.join(name))
            .await
            .map_err(|_| StatusCode::NOT_FOUND)
    }

    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    listener.set_nonblocking(true).expect("Failed to set nonblocking");
    let port = listener.local_addr().unwrap().port();
    let listener = tokio::net::TcpListener::from_std(listener).expect("Failed to adopt listener");

    let router = Router::new()
        .route("/images/:name", get(serve_file))
        .with_state(Arc::new(dir));
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    port
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Test response with convenience methods
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Parse body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON response")
    }

    /// Get body as string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}
