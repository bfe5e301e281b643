//! Asset register endpoints

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use grc_registers::assets::{AssetDraft, AssetFilter, AssetSortKey, AssetStatus};
use grc_registers::Page;

use crate::error::ApiResult;
use crate::models::{AssetView, Authored};
use crate::routes::{
    console_actor, default_page, default_per_page, export_content_type, parse_direction,
    parse_format, parse_opt,
};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_assets).post(create_asset))
        .route("/trash", get(list_trash))
        .route("/export", get(export_assets))
        .route("/:id", get(get_asset).put(update_asset).delete(delete_asset))
        .route("/:id/status", put(set_status))
        .route("/:id/restore", post(restore_asset))
        .route("/:id/purge", delete(purge_asset))
}

/// Table query parameters for the asset register
#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(rename = "type")]
    asset_type: Option<String>,
    status: Option<String>,
    owner: Option<String>,
    band: Option<String>,
    q: Option<String>,
    #[serde(default)]
    has_open_risks: bool,
    #[serde(default)]
    has_open_high_risks: bool,
    sort: Option<String>,
    dir: Option<String>,
    #[serde(default = "default_page")]
    page: usize,
    #[serde(default = "default_per_page")]
    per_page: usize,
}

async fn list_assets(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<AssetView>>> {
    let filter = AssetFilter {
        asset_type: parse_opt(&params.asset_type)?,
        status: parse_opt(&params.status)?,
        owner: params.owner.clone(),
        value_band: parse_opt(&params.band)?,
        search: params.q.clone(),
        has_open_risks: params.has_open_risks,
        has_open_high_risks: params.has_open_high_risks,
    };
    let sort = parse_opt(&params.sort)?.unwrap_or(AssetSortKey::Name);
    let direction = parse_direction(&params.dir)?;

    let page = state
        .engine
        .assets
        .query(&filter, sort, direction, params.per_page, params.page);
    Ok(Json(Page {
        items: page.items.into_iter().map(AssetView::from).collect(),
        current_page: page.current_page,
        total_pages: page.total_pages,
        total_items: page.total_items,
    }))
}

async fn list_trash(State(state): State<AppState>) -> Json<Vec<AssetView>> {
    Json(
        state
            .engine
            .assets
            .trash()
            .into_iter()
            .map(AssetView::from)
            .collect(),
    )
}

async fn get_asset(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> ApiResult<Json<AssetView>> {
    state
        .engine
        .assets
        .get(id)
        .map(|a| Json(AssetView::from(a)))
        .ok_or_else(|| grc_common::GrcError::NotFound(id.to_string()).into())
}

async fn create_asset(
    State(state): State<AppState>,
    Json(request): Json<Authored<AssetDraft>>,
) -> ApiResult<(StatusCode, Json<AssetView>)> {
    let asset = state.engine.create_asset(request.body, &request.actor)?;
    Ok((StatusCode::CREATED, Json(AssetView::from(asset))))
}

async fn update_asset(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<Authored<AssetDraft>>,
) -> ApiResult<Json<AssetView>> {
    let asset = state.engine.update_asset(id, request.body, &request.actor)?;
    Ok(Json(AssetView::from(asset)))
}

/// Lifecycle status update request
#[derive(Debug, Deserialize)]
struct StatusUpdate {
    status: AssetStatus,
    #[serde(default = "console_actor")]
    actor: String,
}

async fn set_status(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<StatusUpdate>,
) -> ApiResult<Json<AssetView>> {
    let asset = state
        .engine
        .set_asset_status(id, request.status, &request.actor)?;
    Ok(Json(AssetView::from(asset)))
}

/// Actor query parameter for body-less mutations
#[derive(Debug, Deserialize)]
struct ActorParams {
    #[serde(default = "console_actor")]
    actor: String,
}

async fn delete_asset(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Query(params): Query<ActorParams>,
) -> ApiResult<StatusCode> {
    state.engine.delete_asset(id, &params.actor)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn restore_asset(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Query(params): Query<ActorParams>,
) -> ApiResult<Json<AssetView>> {
    let asset = state.engine.restore_asset(id, &params.actor)?;
    Ok(Json(AssetView::from(asset)))
}

async fn purge_asset(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Query(params): Query<ActorParams>,
) -> ApiResult<StatusCode> {
    state.engine.purge_asset(id, &params.actor)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Export query parameters
#[derive(Debug, Deserialize)]
pub struct ExportParams {
    pub format: Option<String>,
    #[serde(default = "console_actor")]
    pub actor: String,
}

async fn export_assets(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let format = parse_format(&params.format)?;
    let body = state.engine.export_assets(format, &params.actor)?;
    Ok(([export_content_type(format)], body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_router, AppState};
    use axum_test::TestServer;
    use grc_registers::GrcEngine;
    use serde_json::json;

    fn server() -> TestServer {
        let engine = GrcEngine::new();
        grc_registers::seed::seed_demo_data(&engine).unwrap();
        TestServer::new(build_router(AppState { engine })).unwrap()
    }

    #[tokio::test]
    async fn test_list_returns_page_metadata() {
        let server = server();
        let response = server.get("/api/assets").await;
        response.assert_status_ok();
        let page: Page<AssetView> = response.json();
        assert_eq!(page.current_page, 1);
        assert_eq!(page.total_items, 6);
        assert_eq!(page.total_pages, 1);
    }

    #[tokio::test]
    async fn test_create_then_fetch() {
        let server = server();
        let response = server
            .post("/api/assets")
            .json(&json!({
                "name": "VPN concentrator",
                "asset_type": "Hardware",
                "owner": "netops",
                "confidentiality": 4,
                "integrity": 4,
                "availability": 5,
                "actor": "tester"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: AssetView = response.json();
        assert_eq!(created.asset_value, 13);
        assert_eq!(created.value_band.to_string(), "High");

        let fetched: AssetView = server
            .get(&format!("/api/assets/{}", created.id))
            .await
            .json();
        assert_eq!(fetched.name, "VPN concentrator");
    }

    #[tokio::test]
    async fn test_create_missing_field_is_422() {
        let server = server();
        let response = server
            .post("/api/assets")
            .json(&json!({
                "name": "",
                "asset_type": "Hardware",
                "owner": "netops",
                "confidentiality": 3,
                "integrity": 3,
                "availability": 3
            }))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_out_of_range_rating_is_rejected() {
        let server = server();
        let response = server
            .post("/api/assets")
            .json(&json!({
                "name": "Bad ratings",
                "asset_type": "Hardware",
                "owner": "netops",
                "confidentiality": 9,
                "integrity": 3,
                "availability": 3
            }))
            .await;
        // serde rejects the rating before the handler runs
        assert!(response.status_code().is_client_error());
    }

    #[tokio::test]
    async fn test_filter_and_sort_pipeline() {
        let server = server();
        let response = server
            .get("/api/assets")
            .add_query_param("band", "critical")
            .add_query_param("sort", "value")
            .add_query_param("dir", "desc")
            .await;
        let page: Page<AssetView> = response.json();
        assert!(!page.items.is_empty());
        assert!(page.items.iter().all(|a| a.value_band.to_string() == "Critical"));
    }

    #[tokio::test]
    async fn test_trash_flow() {
        let server = server();
        let page: Page<AssetView> = server.get("/api/assets").await.json();
        let id = page.items[0].id;

        server
            .delete(&format!("/api/assets/{}", id))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let trash: Vec<AssetView> = server.get("/api/assets/trash").await.json();
        assert_eq!(trash.len(), 1);
        assert_eq!(trash[0].id, id);

        server
            .post(&format!("/api/assets/{}/restore", id))
            .await
            .assert_status_ok();
        let trash: Vec<AssetView> = server.get("/api/assets/trash").await.json();
        assert!(trash.is_empty());
    }

    #[tokio::test]
    async fn test_export_unsupported_format_is_400() {
        let server = server();
        let response = server
            .get("/api/assets/export")
            .add_query_param("format", "pdf")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_export_csv_has_header() {
        let server = server();
        let response = server.get("/api/assets/export").await;
        response.assert_status_ok();
        let body = response.text();
        assert!(body.starts_with("\"id\",\"name\""));
    }
}
