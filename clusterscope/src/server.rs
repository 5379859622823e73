use std::sync::Arc;

use anyhow::{anyhow, Result};
use rocket::http::Status;
use rocket::response::content::RawHtml;
use rocket::serde::json::Json;
use rocket::{get, post, routes, Build, Rocket, State};
use serde::{Deserialize, Serialize};

use common::Config;

use crate::error::PipelineError;
use crate::ingestion::FeedSource;
use crate::pipeline::{Outcome, Pipeline};
use crate::presenter::{render_page, PageBody};

/// Application state stored inside Rocket managed state.
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Pipeline,
}

impl AppState {
    pub fn new(config: Arc<Config>, source: Arc<dyn FeedSource>) -> Self {
        let pipeline = Pipeline::from_config(source, &config);
        Self { config, pipeline }
    }
}

/// Request body for `/api/v1/cluster`.
#[derive(Deserialize)]
struct ClusterRequest {
    url: String,
    num_clusters: Option<usize>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_status(err: &PipelineError) -> Status {
    match err {
        PipelineError::Fetch { .. } => Status::BadGateway,
        PipelineError::EmptyVocabulary | PipelineError::InvalidClusterCount { .. } => {
            Status::BadRequest
        }
        PipelineError::Clustering(_) => Status::InternalServerError,
    }
}

#[get("/")]
fn index(state: &State<AppState>) -> RawHtml<String> {
    RawHtml(render_page(
        state.config.server.default_url(),
        state.config.clustering.num_clusters(),
        PageBody::Empty,
    ))
}

#[get("/health")]
fn health() -> &'static str {
    "OK"
}

/// Form target: runs the pipeline and renders the results page.
#[get("/clusters?<url>&<clusters>")]
async fn clusters_page(
    state: &State<AppState>,
    url: Option<String>,
    clusters: Option<usize>,
) -> (Status, RawHtml<String>) {
    let num_clusters = clusters.unwrap_or_else(|| state.config.clustering.num_clusters());
    let url = match url.filter(|u| !u.trim().is_empty()) {
        Some(u) => u,
        None => {
            let page = render_page(state.config.server.default_url(), num_clusters, PageBody::Empty);
            return (Status::Ok, RawHtml(page));
        }
    };

    match state.pipeline.run(&url, num_clusters).await {
        Ok(outcome) => (
            Status::Ok,
            RawHtml(render_page(&url, num_clusters, PageBody::Outcome(&outcome))),
        ),
        Err(e) => {
            tracing::warn!("server: clustering {} failed: {}", url, e);
            let message = e.to_string();
            (
                error_status(&e),
                RawHtml(render_page(&url, num_clusters, PageBody::Error(&message))),
            )
        }
    }
}

#[post("/api/v1/cluster", data = "<req>")]
async fn cluster_api(
    state: &State<AppState>,
    req: Json<ClusterRequest>,
) -> Result<Json<Outcome>, (Status, Json<ErrorResponse>)> {
    let num_clusters = req
        .num_clusters
        .unwrap_or_else(|| state.config.clustering.num_clusters());

    state
        .pipeline
        .run(&req.url, num_clusters)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::warn!("server: clustering {} failed: {}", req.url, e);
            (error_status(&e), Json(ErrorResponse { error: e.to_string() }))
        })
}

/// Rocket instance with all routes mounted and `[server]` bind/port applied.
pub fn build_rocket(state: AppState) -> Rocket<Build> {
    let fig = rocket::Config::figment()
        .merge(("address", state.config.server.bind().to_string()))
        .merge(("port", state.config.server.port()));

    rocket::custom(fig)
        .manage(state)
        .mount("/", routes![index, health, clusters_page, cluster_api])
}

/// Build and launch the Rocket server. Blocks until Rocket shuts down.
pub async fn launch_rocket(config: Arc<Config>, source: Arc<dyn FeedSource>) -> Result<()> {
    let state = AppState::new(config, source);

    tracing::info!("Starting Rocket HTTP server");
    build_rocket(state)
        .launch()
        .await
        .map_err(|e| anyhow!("Rocket failed: {}", e))?;

    tracing::info!("Rocket HTTP server has shut down");
    Ok(())
}
