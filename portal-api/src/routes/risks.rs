//! Risk register endpoints

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use grc_registers::risks::{RiskDraft, RiskFilter, RiskSortKey};
use grc_registers::Page;

use crate::error::ApiResult;
use crate::models::{Authored, RiskView};
use crate::routes::{
    default_page, default_per_page, export_content_type, parse_direction, parse_format, parse_opt,
};
use crate::AppState;

use super::assets::ExportParams;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_risks).post(create_risk))
        .route("/export", get(export_risks))
        .route("/:id", get(get_risk).put(update_risk).delete(delete_risk))
}

/// Table query parameters for the risk register
#[derive(Debug, Deserialize)]
pub struct ListParams {
    category: Option<String>,
    status: Option<String>,
    owner: Option<String>,
    treatment: Option<String>,
    band: Option<String>,
    residual_band: Option<String>,
    related_asset: Option<Uuid>,
    q: Option<String>,
    sort: Option<String>,
    dir: Option<String>,
    #[serde(default = "default_page")]
    page: usize,
    #[serde(default = "default_per_page")]
    per_page: usize,
}

async fn list_risks(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<RiskView>>> {
    let filter = RiskFilter {
        category: parse_opt(&params.category)?,
        status: parse_opt(&params.status)?,
        owner: params.owner.clone(),
        treatment_decision: parse_opt(&params.treatment)?,
        inherent_band: parse_opt(&params.band)?,
        residual_band: parse_opt(&params.residual_band)?,
        related_asset: params.related_asset,
        search: params.q.clone(),
    };
    let sort = parse_opt(&params.sort)?.unwrap_or(RiskSortKey::InherentScore);
    let direction = parse_direction(&params.dir)?;

    let page = state
        .engine
        .risks
        .query(&filter, sort, direction, params.per_page, params.page);
    Ok(Json(Page {
        items: page.items.into_iter().map(RiskView::from).collect(),
        current_page: page.current_page,
        total_pages: page.total_pages,
        total_items: page.total_items,
    }))
}

async fn get_risk(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> ApiResult<Json<RiskView>> {
    state
        .engine
        .risks
        .get(id)
        .map(|r| Json(RiskView::from(r)))
        .ok_or_else(|| grc_common::GrcError::NotFound(id.to_string()).into())
}

async fn create_risk(
    State(state): State<AppState>,
    Json(request): Json<Authored<RiskDraft>>,
) -> ApiResult<(StatusCode, Json<RiskView>)> {
    let risk = state.engine.create_risk(request.body, &request.actor)?;
    Ok((StatusCode::CREATED, Json(RiskView::from(risk))))
}

async fn update_risk(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<Authored<RiskDraft>>,
) -> ApiResult<Json<RiskView>> {
    let risk = state.engine.update_risk(id, request.body, &request.actor)?;
    Ok(Json(RiskView::from(risk)))
}

#[derive(Debug, Deserialize)]
struct ActorParams {
    #[serde(default = "crate::routes::console_actor")]
    actor: String,
}

async fn delete_risk(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Query(params): Query<ActorParams>,
) -> ApiResult<StatusCode> {
    state.engine.delete_risk(id, &params.actor)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn export_risks(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let format = parse_format(&params.format)?;
    let body = state.engine.export_risks(format, &params.actor)?;
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
    async fn test_scores_in_list_response() {
        let server = server();
        let page: Page<RiskView> = server
            .get("/api/risks")
            .add_query_param("q", "exfiltration")
            .await
            .json();
        assert_eq!(page.total_items, 1);
        let risk = &page.items[0];
        assert_eq!(risk.inherent_score, 25);
        assert_eq!(risk.inherent_band.to_string(), "High");
        assert_eq!(risk.residual_score, 15);
        assert_eq!(risk.residual_band.to_string(), "Medium");
    }

    #[tokio::test]
    async fn test_default_sort_is_inherent_score() {
        let server = server();
        let page: Page<RiskView> = server
            .get("/api/risks")
            .add_query_param("dir", "desc")
            .await
            .json();
        let scores: Vec<u8> = page.items.iter().map(|r| r.inherent_score).collect();
        let mut sorted = scores.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(scores, sorted);
    }

    #[tokio::test]
    async fn test_unknown_control_mapping_is_422() {
        let server = server();
        let response = server
            .post("/api/risks")
            .json(&json!({
                "title": "Bad control reference",
                "category": "Security",
                "owner": "ciso",
                "likelihood": 3,
                "impact": 3,
                "treatment_decision": "Mitigate",
                "iso_mapping": ["A.99.1"]
            }))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_delete_removes_asset_references() {
        let server = server();
        let page: Page<RiskView> = server
            .get("/api/risks")
            .add_query_param("q", "Ransomware")
            .await
            .json();
        let risk = &page.items[0];
        let asset_id = risk.related_assets[0];

        server
            .delete(&format!("/api/risks/{}", risk.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let asset: crate::models::AssetView = server
            .get(&format!("/api/assets/{}", asset_id))
            .await
            .json();
        assert!(asset.associated_risks.iter().all(|r| r.risk_id != risk.id));
    }
}
