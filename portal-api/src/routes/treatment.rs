//! Treatment plan endpoints

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use grc_registers::treatment::{ActionItemDraft, PlanDraft, PlanFilter, PlanSortKey};
use grc_registers::Page;

use crate::error::ApiResult;
use crate::models::{Authored, MilestoneCreate, PlanView, ProgressUpdate};
use crate::routes::{
    default_page, default_per_page, export_content_type, parse_direction, parse_format, parse_opt,
};
use crate::AppState;

use super::assets::ExportParams;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_plans).post(create_plan))
        .route("/export", get(export_plans))
        .route("/:id", get(get_plan).put(update_plan).delete(delete_plan))
        .route("/:id/actions", post(add_action_item))
        .route("/:id/actions/:item_id", put(update_action_item))
        .route("/:id/milestones", post(add_milestone))
        .route("/:id/milestones/:milestone_id", put(update_milestone))
}

/// Table query parameters for the treatment tracker
#[derive(Debug, Deserialize)]
pub struct ListParams {
    status: Option<String>,
    owner: Option<String>,
    risk_id: Option<Uuid>,
    q: Option<String>,
    sort: Option<String>,
    dir: Option<String>,
    #[serde(default = "default_page")]
    page: usize,
    #[serde(default = "default_per_page")]
    per_page: usize,
}

async fn list_plans(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<PlanView>>> {
    let filter = PlanFilter {
        status: parse_opt(&params.status)?,
        owner: params.owner.clone(),
        risk_id: params.risk_id,
        search: params.q.clone(),
    };
    let sort = parse_opt(&params.sort)?.unwrap_or(PlanSortKey::Title);
    let direction = parse_direction(&params.dir)?;

    let page = state
        .engine
        .treatment
        .query(&filter, sort, direction, params.per_page, params.page);
    Ok(Json(Page {
        items: page.items.into_iter().map(PlanView::from).collect(),
        current_page: page.current_page,
        total_pages: page.total_pages,
        total_items: page.total_items,
    }))
}

async fn get_plan(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> ApiResult<Json<PlanView>> {
    state
        .engine
        .treatment
        .get(id)
        .map(|p| Json(PlanView::from(p)))
        .ok_or_else(|| grc_common::GrcError::NotFound(id.to_string()).into())
}

async fn create_plan(
    State(state): State<AppState>,
    Json(request): Json<Authored<PlanDraft>>,
) -> ApiResult<(StatusCode, Json<PlanView>)> {
    let plan = state.engine.create_plan(request.body, &request.actor)?;
    Ok((StatusCode::CREATED, Json(PlanView::from(plan))))
}

async fn update_plan(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<Authored<PlanDraft>>,
) -> ApiResult<Json<PlanView>> {
    let plan = state.engine.update_plan(id, request.body, &request.actor)?;
    Ok(Json(PlanView::from(plan)))
}

#[derive(Debug, Deserialize)]
struct ActorParams {
    #[serde(default = "crate::routes::console_actor")]
    actor: String,
}

async fn delete_plan(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Query(params): Query<ActorParams>,
) -> ApiResult<StatusCode> {
    state.engine.delete_plan(id, &params.actor)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_action_item(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<Authored<ActionItemDraft>>,
) -> ApiResult<(StatusCode, Json<PlanView>)> {
    state
        .engine
        .add_action_item(id, request.body, &request.actor)?;
    let plan = state
        .engine
        .treatment
        .get(id)
        .ok_or_else(|| grc_common::GrcError::NotFound(id.to_string()))?;
    Ok((StatusCode::CREATED, Json(PlanView::from(plan))))
}

async fn update_action_item(
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    State(state): State<AppState>,
    Json(request): Json<ProgressUpdate>,
) -> ApiResult<Json<PlanView>> {
    state
        .engine
        .update_action_item(id, item_id, request.status, request.progress, &request.actor)?;
    let plan = state
        .engine
        .treatment
        .get(id)
        .ok_or_else(|| grc_common::GrcError::NotFound(id.to_string()))?;
    Ok(Json(PlanView::from(plan)))
}

async fn add_milestone(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<MilestoneCreate>,
) -> ApiResult<(StatusCode, Json<PlanView>)> {
    state
        .engine
        .add_milestone(id, request.title, request.due_date, &request.actor)?;
    let plan = state
        .engine
        .treatment
        .get(id)
        .ok_or_else(|| grc_common::GrcError::NotFound(id.to_string()))?;
    Ok((StatusCode::CREATED, Json(PlanView::from(plan))))
}

async fn update_milestone(
    Path((id, milestone_id)): Path<(Uuid, Uuid)>,
    State(state): State<AppState>,
    Json(request): Json<ProgressUpdate>,
) -> ApiResult<Json<PlanView>> {
    state.engine.update_milestone(
        id,
        milestone_id,
        request.status,
        request.progress,
        &request.actor,
    )?;
    let plan = state
        .engine
        .treatment
        .get(id)
        .ok_or_else(|| grc_common::GrcError::NotFound(id.to_string()))?;
    Ok(Json(PlanView::from(plan)))
}

async fn export_plans(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let format = parse_format(&params.format)?;
    let body = state.engine.export_plans(format, &params.actor)?;
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
    async fn test_plan_progress_reflects_items() {
        let server = server();
        let page: Page<PlanView> = server.get("/api/plans").await.json();
        assert_eq!(page.total_items, 1);
        let plan = &page.items[0];
        // seeded items at 100, 40, 0 -> mean 46
        assert_eq!(plan.progress, 46);
    }

    #[tokio::test]
    async fn test_updating_item_moves_plan_progress() {
        let server = server();
        let page: Page<PlanView> = server.get("/api/plans").await.json();
        let plan = &page.items[0];
        let open_item = plan
            .action_items
            .iter()
            .find(|a| a.progress == 0)
            .unwrap();

        let updated: PlanView = server
            .put(&format!(
                "/api/plans/{}/actions/{}",
                plan.id, open_item.id
            ))
            .json(&json!({"status": "InProgress", "progress": 60, "actor": "pm"}))
            .await
            .json();
        assert_eq!(updated.progress, (100 + 40 + 60) / 3);
    }

    #[tokio::test]
    async fn test_backwards_dates_rejected() {
        let server = server();
        let page: Page<PlanView> = server.get("/api/plans").await.json();
        let plan_id = page.items[0].id;

        let response = server
            .post(&format!("/api/plans/{}/actions", plan_id))
            .json(&json!({
                "title": "Time travel",
                "owner": "pm",
                "start_date": "2026-09-01",
                "due_date": "2026-08-01"
            }))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}
