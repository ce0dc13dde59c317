//! HTTP routes for the dashboard
//!
//! Provides API endpoints for every dashboard section and static file serving.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::correlation::CorrelationMethod;
use crate::dataset::{Dataset, parse_delimiter};
use crate::profile::{self, Description, Histogram, Overview};

use super::chart::{self, BarChart, HeatmapData};
use super::server::AppState;

/// Embedded static assets
#[derive(RustEmbed)]
#[folder = "web-assets/"]
struct Assets;

/// Frontend configuration
#[derive(Serialize)]
struct FrontendConfig {
    api_endpoint: Option<String>,
    method: CorrelationMethod,
    label_threshold: f64,
    preview_rows: usize,
    dataset_loaded: bool,
}

/// Query parameters for an upload
#[derive(Deserialize)]
struct UploadQuery {
    sep: Option<String>,
}

/// Query parameters for the preview
#[derive(Deserialize)]
struct HeadQuery {
    rows: Option<usize>,
}

/// Query parameters for per-column sections
#[derive(Deserialize)]
struct ColumnQuery {
    column: Option<String>,
    bins: Option<usize>,
}

/// Query parameters for the correlation heatmap
#[derive(Deserialize)]
struct CorrelationQuery {
    method: Option<String>,
}

/// Overview plus the NaN bar chart
#[derive(Serialize)]
struct OverviewResponse {
    #[serde(flatten)]
    overview: Overview,
    missing_chart: BarChart,
}

#[derive(Serialize)]
struct HeadResponse {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

#[derive(Serialize)]
struct DescribeResponse {
    column: String,
    description: Description,
}

/// Create API routes
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/config", get(get_config))
        .route("/api/dataset", axum::routing::post(upload_dataset))
        .route("/api/overview", get(get_overview))
        .route("/api/head", get(get_head))
        .route("/api/value-counts", get(get_value_counts))
        .route("/api/describe", get(get_describe))
        .route("/api/histogram", get(get_histogram))
        .route("/api/correlation", get(get_correlation))
}

/// Create static file routes
pub fn static_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index_html))
        .route("/{*path}", get(static_handler))
}

fn error_response(status: StatusCode, message: impl ToString) -> Response {
    (
        status,
        Json(serde_json::json!({"error": message.to_string()})),
    )
        .into_response()
}

fn bad_request(message: impl ToString) -> Response {
    error_response(StatusCode::BAD_REQUEST, message)
}

fn current_dataset(state: &AppState) -> Result<Arc<Dataset>, Response> {
    state
        .current()
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "No dataset loaded"))
}

/// A column must be explicitly selected
fn selected_column(query: &ColumnQuery) -> Result<&str, Response> {
    query
        .column
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| bad_request("No column selected"))
}

fn overview_response(dataset: &Dataset) -> OverviewResponse {
    let overview = profile::overview(dataset);
    let missing_chart = chart::missing_values_chart(&overview.missing);
    OverviewResponse {
        overview,
        missing_chart,
    }
}

/// GET /api/health - Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}

/// GET /api/config - Returns frontend configuration
async fn get_config(State(state): State<Arc<AppState>>) -> Json<FrontendConfig> {
    Json(FrontendConfig {
        api_endpoint: state.api_endpoint.clone(),
        method: state.config.method,
        label_threshold: state.config.label_threshold,
        preview_rows: state.config.preview_rows,
        dataset_loaded: state.current().is_some(),
    })
}

/// POST /api/dataset - Load CSV text from the request body
async fn upload_dataset(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UploadQuery>,
    body: String,
) -> Result<Json<OverviewResponse>, Response> {
    let mut options = state.config.csv.clone();
    if let Some(sep) = &query.sep {
        options.delimiter = parse_delimiter(sep)
            .ok_or_else(|| bad_request(format!("Invalid separator '{}'", sep)))?;
    }

    let mut dataset = Dataset::from_reader(body.as_bytes(), &options).map_err(bad_request)?;
    state.config.apply_exclusions(&mut dataset);

    let shape = dataset.shape();
    info!(rows = shape.rows, columns = shape.columns, "dataset uploaded");

    let dataset = state.replace(dataset);
    Ok(Json(overview_response(&dataset)))
}

/// GET /api/overview - Shape, dtypes and missing values
async fn get_overview(
    State(state): State<Arc<AppState>>,
) -> Result<Json<OverviewResponse>, Response> {
    let dataset = current_dataset(&state)?;
    Ok(Json(overview_response(&dataset)))
}

/// GET /api/head - First rows of the dataset
async fn get_head(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HeadQuery>,
) -> Result<Json<HeadResponse>, Response> {
    let dataset = current_dataset(&state)?;
    let rows = query.rows.unwrap_or(state.config.preview_rows);

    Ok(Json(HeadResponse {
        columns: dataset.column_names().into_iter().map(String::from).collect(),
        rows: dataset.head(rows),
    }))
}

/// GET /api/value-counts - Bar chart of one column's values
async fn get_value_counts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ColumnQuery>,
) -> Result<Json<BarChart>, Response> {
    let dataset = current_dataset(&state)?;
    let name = selected_column(&query)?;
    let column = profile::find_column(&dataset, name).map_err(bad_request)?;

    let counts = profile::value_counts(column);
    Ok(Json(chart::value_counts_chart(name, &counts)))
}

/// GET /api/describe - Univariate statistics of one column
async fn get_describe(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ColumnQuery>,
) -> Result<Json<DescribeResponse>, Response> {
    let dataset = current_dataset(&state)?;
    let name = selected_column(&query)?;
    let column = profile::find_column(&dataset, name).map_err(bad_request)?;

    Ok(Json(DescribeResponse {
        column: name.to_string(),
        description: profile::describe(column),
    }))
}

/// GET /api/histogram - Distribution of one numeric column
async fn get_histogram(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ColumnQuery>,
) -> Result<Json<Histogram>, Response> {
    let dataset = current_dataset(&state)?;
    let name = selected_column(&query)?;
    let column = profile::find_column(&dataset, name).map_err(bad_request)?;

    let bins = query.bins.or(state.config.histogram_bins);
    profile::histogram(column, bins)
        .map(Json)
        .map_err(bad_request)
}

/// GET /api/correlation - Heatmap data for the chosen method
async fn get_correlation(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CorrelationQuery>,
) -> Result<Json<HeatmapData>, Response> {
    let dataset = current_dataset(&state)?;
    let method = match query.method.as_deref() {
        Some(name) => name.parse::<CorrelationMethod>().map_err(bad_request)?,
        None => state.config.method,
    };

    chart::correlation_heatmap(&dataset, method, state.config.label_threshold)
        .map(Json)
        .map_err(bad_request)
}

/// GET / - Serve index.html
async fn index_html() -> impl IntoResponse {
    match Assets::get("index.html") {
        Some(content) => Html(content.data.into_owned()).into_response(),
        None => (StatusCode::NOT_FOUND, "index.html not found").into_response(),
    }
}

/// Static file handler for embedded assets
async fn static_handler(
    axum::extract::Path(path): axum::extract::Path<String>,
) -> impl IntoResponse {
    let path = path.trim_start_matches('/');

    match Assets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.as_ref().to_string())],
                content.data.into_owned(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, format!("File not found: {}", path)).into_response(),
    }
}
