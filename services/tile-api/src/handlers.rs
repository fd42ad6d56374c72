//! HTTP handlers: single-tile GET with conditional-GET semantics, and bulk
//! generation POST.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use tile_common::{
    Envelope, ProjectionConverter, ProjectionId, TileAddress, TileError, TileKind,
    MAX_SCALE_LEVEL, MIN_SCALE_LEVEL,
};

use crate::state::AppState;

/// Reserved `attr` values selecting the non-attribute tile kinds.
const GEOMETRY_ATTR: &str = "@geom";
const COMPONENTS_ATTR: &str = "@components";

#[derive(Debug, Deserialize)]
pub struct TileParams {
    /// Feature class name, case-sensitive.
    pub class: String,
    /// Attribute name; absent or "@geom" for geometry, "@components" for
    /// the component-attribute tile.
    pub attr: Option<String>,
}

/// GET /tiles/{scale}/{col}/{row}?class=...&attr=...
pub async fn get_tile(
    State(state): State<Arc<AppState>>,
    Path((scale_level, col, row)): Path<(u8, u32, u32)>,
    Query(params): Query<TileParams>,
    headers: HeaderMap,
) -> Response {
    let kind = match params.attr.as_deref() {
        None | Some(GEOMETRY_ATTR) => TileKind::Geometry,
        Some(COMPONENTS_ATTR) => TileKind::ComponentAttributes,
        Some(name) => TileKind::Attribute(name.to_string()),
    };
    let address = TileAddress::new(scale_level, row, col, params.class, kind);

    let tile = match state.filler.fetch(&address).await {
        Ok(tile) => tile,
        Err(err) => return error_response(&err),
    };

    let Some(hash) = tile.address.hash.as_deref() else {
        return error_response(&TileError::Internal("stored tile without hash".into()));
    };
    let etag = format!("\"{hash}\"");

    // Conditional GET against the content-hash tag. max-age=0 keeps the
    // validation round-trip itself out of intermediate caches on hosts that
    // drop validators.
    let if_none_match = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok());
    if if_none_match == Some(etag.as_str()) {
        return Response::builder()
            .status(StatusCode::NOT_MODIFIED)
            .header(header::ETAG, &etag)
            .header(header::CACHE_CONTROL, "public, max-age=0")
            .body(axum::body::Body::empty())
            .unwrap()
    }

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::ETAG, &etag)
        .header(header::CACHE_CONTROL, "public, max-age=0")
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(tile.content.into())
        .unwrap()
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// Geographic extent "minx,miny,maxx,maxy"; mutually exclusive with
    /// `project_syscode`.
    pub extent: Option<String>,
    /// Map project branch syscode; enables presentation-derived attribute
    /// tiles.
    pub project_syscode: Option<i64>,
    pub feature_classes: Vec<String>,
    pub from_level: Option<u8>,
    pub to_level: Option<u8>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub tiles_saved: u64,
}

/// POST /generator
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateRequest>,
) -> Response {
    let from_level = request.from_level.unwrap_or(MIN_SCALE_LEVEL);
    let to_level = request.to_level.unwrap_or(MAX_SCALE_LEVEL);

    let sequence = match (&request.extent, request.project_syscode) {
        (Some(extent), None) => {
            let geographic = match Envelope::parse(extent) {
                Ok(envelope) => envelope,
                Err(err) => {
                    return error_response(&TileError::InvalidExtent(err.to_string()));
                }
            };
            let converter =
                ProjectionConverter::new(ProjectionId::Geographic, ProjectionId::WorldMercator);
            let projected = match converter.convert_envelope(&geographic) {
                Ok(envelope) => envelope,
                Err(err) => return error_response(&err),
            };

            info!(extent = %extent, classes = ?request.feature_classes, "bulk generation over extent");
            state
                .generator
                .generate_for_extent(&projected, &request.feature_classes, from_level, to_level)
                .await
        }
        (None, Some(project_syscode)) => {
            info!(project_syscode, classes = ?request.feature_classes, "bulk generation for project");
            state
                .generator
                .generate_for_project(
                    project_syscode,
                    &request.feature_classes,
                    from_level,
                    to_level,
                )
                .await
        }
        _ => {
            return error_response(&TileError::InvalidExtent(
                "exactly one of 'extent' and 'project_syscode' is required".into(),
            ));
        }
    };

    let mut sequence = match sequence {
        Ok(sequence) => sequence,
        Err(err) => return error_response(&err),
    };

    match state.filler.save_sequence(&mut sequence).await {
        Ok(tiles_saved) => {
            info!(tiles_saved, "bulk generation finished");
            Json(GenerateResponse { tiles_saved }).into_response()
        }
        Err(err) => error_response(&err),
    }
}

fn error_response(err: &TileError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!(error = %err, "request failed");
    }

    let body = serde_json::json!({ "error": err.to_string() });
    (status, Json(body)).into_response()
}
