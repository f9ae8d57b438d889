//! HTTP boot endpoints
//!
//! Every handler resolves the request's labels (query parameters, or the
//! MAC path segment for Pixiecore), runs its pipeline on the blocking pool
//! and maps the outcome onto a status code. Failure detail is logged, never
//! returned.

use crate::error::{BootcfgError, ErrorKind, Result};
use crate::pipeline::{self, Payload};
use crate::server::Server;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use bootcfg_model::{Labels, MacAddr, MAC_LABEL};
use std::sync::Arc;
use tracing::{debug, error};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub server: Arc<Server>,
}

impl AppState {
    pub fn new(server: Server) -> Self {
        Self {
            server: Arc::new(server),
        }
    }
}

/// Boot endpoint routes
pub fn boot_router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/boot.ipxe", get(bootstrap_handler))
        .route("/boot.ipxe.0", get(bootstrap_handler))
        .route("/ipxe", get(ipxe_handler))
        .route("/pixiecore/v1/boot/", get(pixiecore_empty_handler))
        .route("/pixiecore/v1/boot/{mac}", get(pixiecore_handler))
        .route("/ignition", get(ignition_handler))
        .route("/cloud", get(cloud_handler))
        .route("/generic", get(generic_handler))
        .route("/metadata", get(metadata_handler))
}

/// Labels from query parameters; the first value of a repeated key wins.
/// A parseable `mac` label is normalized to lower-case colon form.
pub fn labels_from_query(query: Vec<(String, String)>) -> Labels {
    let mut labels = Labels::new();
    for (key, value) in query {
        labels.entry(key).or_insert(value);
    }
    if let Some(mac) = labels.get_mut(MAC_LABEL) {
        if let Ok(parsed) = MacAddr::parse(mac) {
            *mac = parsed.to_string();
        }
    }
    labels
}

async fn home() -> &'static str {
    "bootcfg\n"
}

async fn bootstrap_handler() -> Response {
    pipeline::bootstrap().into_response()
}

async fn ipxe_handler(
    State(state): State<AppState>,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    let labels = labels_from_query(query);
    respond(state, move |server| pipeline::ipxe(server, &labels)).await
}

async fn pixiecore_handler(
    State(state): State<AppState>,
    Path(mac): Path<String>,
) -> Response {
    // Path has already percent-decoded the segment (%3A is ':')
    respond(state, move |server| {
        pipeline::pixiecore(server, &mac, Labels::new())
    })
    .await
}

async fn pixiecore_empty_handler(State(state): State<AppState>) -> Response {
    respond(state, |server| pipeline::pixiecore(server, "", Labels::new())).await
}

async fn ignition_handler(
    State(state): State<AppState>,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    let labels = labels_from_query(query);
    respond(state, move |server| pipeline::ignition(server, &labels)).await
}

async fn cloud_handler(
    State(state): State<AppState>,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    let labels = labels_from_query(query);
    respond(state, move |server| pipeline::cloud(server, &labels)).await
}

async fn generic_handler(
    State(state): State<AppState>,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    let labels = labels_from_query(query);
    respond(state, move |server| pipeline::generic(server, &labels)).await
}

async fn metadata_handler(
    State(state): State<AppState>,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    let labels = labels_from_query(query);
    respond(state, move |server| pipeline::metadata(server, &labels)).await
}

/// Run a pipeline off the async runtime; store calls block
async fn respond<F>(state: AppState, pipeline: F) -> Response
where
    F: FnOnce(&Server) -> Result<Payload> + Send + 'static,
{
    let server = state.server.clone();
    let result = tokio::task::spawn_blocking(move || pipeline(&server))
        .await
        .unwrap_or_else(|e| Err(BootcfgError::Internal(format!("pipeline task failed: {}", e))));

    match result {
        Ok(payload) => payload.into_response(),
        Err(err) => error_response(err),
    }
}

/// Map a core error onto a status code
pub fn error_response(err: BootcfgError) -> Response {
    match err.kind() {
        ErrorKind::MalformedRequest => {
            debug!(error = %err, "malformed request");
            (StatusCode::BAD_REQUEST, format!("{}\n", err)).into_response()
        }
        ErrorKind::Internal => {
            error!(error = %err, "request failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        ErrorKind::NotFound | ErrorKind::Invalid | ErrorKind::Render | ErrorKind::Validation => {
            debug!(error = %err, kind = ?err.kind(), "not found");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

impl IntoResponse for Payload {
    fn into_response(self) -> Response {
        match self.content_type {
            Some(content_type) => {
                (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], self.body).into_response()
            }
            // A bare body leaves Content-Type unset
            None => Response::new(Body::from(self.body)),
        }
    }
}
