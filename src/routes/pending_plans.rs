use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::pending_plan_dto::{
        ActivationResponse, BatchActivationResponse, PendingPlanQuery, PendingPlanResponse,
        UpdatePendingPlanPayload,
    },
    dto::webhook_dto::BatchIdsPayload,
    error::{Error, Result},
    middleware::auth::Claims,
    models::pending_plan::PendingPlanStatus,
    utils::pagination::Page,
    AppState,
};

const ENTITY: &str = "pending_plan";

pub async fn list_pending_plans(
    State(state): State<AppState>,
    Query(query): Query<PendingPlanQuery>,
) -> Result<Json<Page<PendingPlanResponse>>> {
    let page = state.pending_plan_service.list(&query).await?;
    Ok(Json(page.map(PendingPlanResponse::from)))
}

pub async fn get_pending_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PendingPlanResponse>> {
    let plan = state.pending_plan_service.get_by_id(id).await?;
    Ok(Json(plan.into()))
}

pub async fn update_pending_plan(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePendingPlanPayload>,
) -> Result<Json<PendingPlanResponse>> {
    payload.validate()?;
    let plan = state
        .pending_plan_service
        .update_email(id, &payload.email)
        .await?;
    state
        .audit_service
        .record(
            claims.user_id(),
            "pending_plan.update_email",
            ENTITY,
            id,
            Some(json!({ "email": plan.email })),
        )
        .await;
    Ok(Json(plan.into()))
}

/// Activates every pending plan sharing this plan's e-mail.
pub async fn activate_pending_plan(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActivationResponse>> {
    let plan = state.pending_plan_service.get_by_id(id).await?;
    if !plan
        .status
        .eq_ignore_ascii_case(PendingPlanStatus::Pending.as_str())
    {
        return Err(Error::BadRequest(format!(
            "Pending plan is already {}",
            plan.status
        )));
    }

    let activated_count = state
        .reconciliation_service
        .activate_by_email(&plan.email)
        .await?;
    state
        .audit_service
        .record(
            claims.user_id(),
            "pending_plan.activate",
            ENTITY,
            id,
            Some(json!({ "email": plan.email, "activated_count": activated_count })),
        )
        .await;

    let message = if activated_count > 0 {
        format!("{} plano(s) ativado(s) para {}", activated_count, plan.email)
    } else {
        format!("Nenhum usuário cadastrado com o e-mail {}", plan.email)
    };
    Ok(Json(ActivationResponse {
        activated_count,
        message,
    }))
}

pub async fn activate_pending_plans(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<BatchIdsPayload>,
) -> Result<Json<BatchActivationResponse>> {
    payload.validate()?;
    let report = state.reconciliation_service.activate_batch(&payload.ids).await;
    state
        .audit_service
        .record(
            claims.user_id(),
            "pending_plan.activate_batch",
            ENTITY,
            Uuid::nil(),
            Some(json!({
                "submitted": report.submitted,
                "activated_count": report.activated_count,
                "failed_count": report.failed_count,
            })),
        )
        .await;

    let message = format!(
        "{} ativado(s), {} falha(s)",
        report.activated_count, report.failed_count
    );
    Ok(Json(BatchActivationResponse { message, report }))
}
