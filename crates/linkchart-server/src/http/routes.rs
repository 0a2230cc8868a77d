use super::{AppError, AppResult, AppState, JsonResponse, GRAPH_VIZ_HTML};
use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Json},
    routing::{delete, get, post},
    Router,
};
use linkchart_core::{
    Detection, EntityType, GraphModel, GraphStateStore, LayoutNode, ManualConnection, ManualNode,
    NodeDetails, NodeKind, ReportArchive, ReportScope, Visibility,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/graph", get(graph))
        .route("/graph/version", get(graph_version))
        .route("/graph/layout", get(graph_layout))
        .route("/viz", get(graph_viz))
        .route("/graph/viz", get(graph_viz))
        .route("/nodes/:id", get(inspect_node))
        .route("/nodes/:id/hidden", post(toggle_hidden))
        .route("/nodes/:id/flagged", post(toggle_flagged))
        .route("/clusters", get(list_clusters))
        .route("/clusters/merge", post(merge_cluster))
        .route("/clusters/merge-all", post(merge_all))
        .route("/clusters/ignore", post(ignore_cluster))
        .route("/aliases", get(list_aliases))
        .route("/aliases/:variant", delete(unmerge))
        .route("/manual/nodes", post(create_manual_node))
        .route("/manual/links", post(create_manual_link))
        .route("/entities/rename", post(rename_entity))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    healthy: bool,
    version: String,
    uptime_seconds: u64,
    state_version: u64,
    report_count: usize,
}

async fn health(State(state): State<AppState>) -> AppResult<Json<JsonResponse<HealthResponse>>> {
    let report_count = state.engine.archive().reports()?.len();
    Ok(Json(JsonResponse::ok(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        state_version: state.engine.store().version(),
        report_count,
    })))
}

// --- Graph ---

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GraphQuery {
    case: Option<String>,
    show_singletons: bool,
    show_hidden: bool,
    show_flagged_only: bool,
}

impl GraphQuery {
    fn scope(&self) -> ReportScope {
        ReportScope::from_case(self.case.clone())
    }

    fn visibility(&self) -> Visibility {
        Visibility::new()
            .with_singletons(self.show_singletons)
            .with_hidden_nodes(self.show_hidden)
            .with_flagged_only(self.show_flagged_only)
    }

    fn build(&self, state: &AppState) -> linkchart_core::Result<GraphModel> {
        state.engine.build_graph(&self.scope(), self.visibility())
    }
}

/// Run graph building, detection, or layout on the blocking pool.
async fn blocking<T, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

async fn graph(
    State(state): State<AppState>,
    Query(query): Query<GraphQuery>,
) -> AppResult<Json<JsonResponse<GraphModel>>> {
    let graph = blocking(move || Ok(query.build(&state)?)).await?;
    Ok(Json(JsonResponse::ok(graph)))
}

#[derive(Serialize)]
struct VersionResponse {
    version: u64,
}

async fn graph_version(State(state): State<AppState>) -> Json<JsonResponse<VersionResponse>> {
    Json(JsonResponse::ok(VersionResponse {
        version: state.engine.store().version(),
    }))
}

#[derive(Serialize)]
struct LayoutResponse {
    ticks: usize,
    settled: bool,
    nodes: Vec<LayoutNode>,
    graph: GraphModel,
}

const MAX_LAYOUT_TICKS: usize = 2_000;

async fn graph_layout(
    State(state): State<AppState>,
    Query(query): Query<GraphQuery>,
) -> AppResult<Json<JsonResponse<LayoutResponse>>> {
    let layout = blocking(move || {
        let graph = query.build(&state)?;
        let mut simulation = state.engine.layout(&graph);
        let ticks = simulation.run_to_rest(MAX_LAYOUT_TICKS);
        Ok(LayoutResponse {
            ticks,
            settled: simulation.is_settled(),
            nodes: simulation.nodes().to_vec(),
            graph,
        })
    })
    .await?;
    Ok(Json(JsonResponse::ok(layout)))
}

async fn graph_viz() -> impl IntoResponse {
    Html(GRAPH_VIZ_HTML)
}

async fn inspect_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<GraphQuery>,
) -> AppResult<Json<JsonResponse<NodeDetails>>> {
    let details = blocking(move || {
        let graph = query.build(&state)?;
        state
            .engine
            .inspect(&id, &graph)?
            .ok_or_else(|| AppError::not_found(format!("Node not found: {}", id)))
    })
    .await?;
    Ok(Json(JsonResponse::ok(details)))
}

#[derive(Serialize)]
struct ToggleResponse {
    id: String,
    value: bool,
}

async fn toggle_hidden(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<JsonResponse<ToggleResponse>>> {
    let value = state.engine.toggle_hidden(&id)?;
    Ok(Json(JsonResponse::ok(ToggleResponse { id, value })))
}

async fn toggle_flagged(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<JsonResponse<ToggleResponse>>> {
    let value = state.engine.toggle_flagged(&id)?;
    Ok(Json(JsonResponse::ok(ToggleResponse { id, value })))
}

// --- Resolution ---

async fn list_clusters(State(state): State<AppState>) -> AppResult<Json<JsonResponse<Detection>>> {
    let detection = blocking(move || Ok(state.engine.detect_clusters()?)).await?;
    Ok(Json(JsonResponse::ok(detection)))
}

#[derive(Deserialize)]
struct MergeRequest {
    key: String,
    target: Option<String>,
    #[serde(default)]
    excluded: Vec<String>,
}

#[derive(Serialize)]
struct MergeResponse {
    merged: usize,
}

async fn merge_cluster(
    State(state): State<AppState>,
    Json(req): Json<MergeRequest>,
) -> AppResult<Json<JsonResponse<MergeResponse>>> {
    let merged = blocking(move || {
        let mut cluster = state
            .engine
            .find_cluster(&req.key)?
            .ok_or_else(|| AppError::not_found(format!("No current cluster with key '{}'", req.key)))?;

        if let Some(target) = &req.target {
            if !cluster.set_target(target) {
                return Err(AppError::bad_request(format!(
                    "'{}' is not a member of the cluster",
                    target
                )));
            }
        }
        for variant in &req.excluded {
            cluster.set_included(variant, false);
        }

        let merged = state.engine.merge_cluster(&cluster)?;
        info!("Merged cluster '{}' into '{}'", cluster.key, cluster.target);
        Ok(merged)
    })
    .await?;
    Ok(Json(JsonResponse::ok(MergeResponse { merged })))
}

async fn merge_all(State(state): State<AppState>) -> AppResult<Json<JsonResponse<MergeResponse>>> {
    let merged = blocking(move || Ok(state.engine.merge_all()?)).await?;
    Ok(Json(JsonResponse::ok(MergeResponse { merged })))
}

#[derive(Deserialize)]
struct IgnoreRequest {
    key: String,
}

#[derive(Serialize)]
struct IgnoreResponse {
    ignored: bool,
}

async fn ignore_cluster(
    State(state): State<AppState>,
    Json(req): Json<IgnoreRequest>,
) -> AppResult<Json<JsonResponse<IgnoreResponse>>> {
    let ignored = blocking(move || {
        let cluster = state
            .engine
            .find_cluster(&req.key)?
            .ok_or_else(|| AppError::not_found(format!("No current cluster with key '{}'", req.key)))?;
        Ok(state.engine.ignore_cluster(&cluster)?)
    })
    .await?;
    Ok(Json(JsonResponse::ok(IgnoreResponse { ignored })))
}

async fn list_aliases(
    State(state): State<AppState>,
) -> AppResult<Json<JsonResponse<BTreeMap<String, String>>>> {
    let aliases = state.engine.store().get()?.aliases.into_iter().collect();
    Ok(Json(JsonResponse::ok(aliases)))
}

#[derive(Serialize)]
struct UnmergeResponse {
    variant: String,
    target: String,
}

async fn unmerge(
    State(state): State<AppState>,
    Path(variant): Path<String>,
) -> AppResult<Json<JsonResponse<UnmergeResponse>>> {
    match state.engine.unmerge(&variant)? {
        Some(target) => Ok(Json(JsonResponse::ok(UnmergeResponse { variant, target }))),
        None => Err(AppError::not_found(format!("No alias for '{}'", variant))),
    }
}

// --- Manual annotations ---

#[derive(Deserialize)]
struct CreateNodeRequest {
    kind: NodeKind,
    label: String,
    subtype: Option<EntityType>,
}

async fn create_manual_node(
    State(state): State<AppState>,
    Json(req): Json<CreateNodeRequest>,
) -> AppResult<Json<JsonResponse<ManualNode>>> {
    let node = state.engine.add_manual_node(req.kind, &req.label, req.subtype)?;
    Ok(Json(JsonResponse::ok(node)))
}

#[derive(Deserialize)]
struct CreateLinkRequest {
    source: String,
    target: String,
}

async fn create_manual_link(
    State(state): State<AppState>,
    Json(req): Json<CreateLinkRequest>,
) -> AppResult<Json<JsonResponse<ManualConnection>>> {
    let link = state.engine.add_manual_connection(&req.source, &req.target)?;
    Ok(Json(JsonResponse::ok(link)))
}

#[derive(Deserialize)]
struct RenameRequest {
    old: String,
    new: String,
}

#[derive(Serialize)]
struct RenameResponse {
    renamed: usize,
}

async fn rename_entity(
    State(state): State<AppState>,
    Json(req): Json<RenameRequest>,
) -> AppResult<Json<JsonResponse<RenameResponse>>> {
    let renamed = state.engine.rename_entity(&req.old, &req.new)?;
    Ok(Json(JsonResponse::ok(RenameResponse { renamed })))
}
