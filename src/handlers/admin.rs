use axum::{extract::State, response::Json};

use crate::errors::AppResult;
use crate::middleware::{AppJson, AppQuery, CurrentAdmin};
use crate::models::{
    AdminDashboard, AnalyticsParams, JobStats, JobsList, JobsParams, UpdateStatusRequest,
    UpdateStatusResponse,
};
use crate::state::AppState;

pub async fn dashboard(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<AdminDashboard>> {
    tracing::debug!("Admin dashboard for '{}'", admin.username);
    let dashboard = state.store.admin_dashboard().await?;
    Ok(Json(dashboard))
}

pub async fn update_status(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    AppJson(request): AppJson<UpdateStatusRequest>,
) -> AppResult<Json<UpdateStatusResponse>> {
    let (job, old_status) = state
        .store
        .update_status(request.request_id, request.status)
        .await?;

    tracing::info!(
        "Admin '{}' moved job {} from '{}' to '{}'",
        admin.username,
        job.id,
        old_status,
        job.status
    );

    Ok(Json(UpdateStatusResponse {
        success: true,
        message: format!(
            "Job {} status updated from '{}' to '{}'",
            job.id, old_status, job.status
        ),
        job,
    }))
}

pub async fn analytics(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<AnalyticsParams>,
) -> AppResult<Json<JobStats>> {
    let stats = state.store.analytics(params.days).await?;
    Ok(Json(stats))
}

pub async fn jobs(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<JobsParams>,
) -> AppResult<Json<JobsList>> {
    let listing = state
        .store
        .list_jobs(
            params.status,
            params.student_id.as_deref(),
            params.page,
            params.page_size,
        )
        .await?;
    Ok(Json(listing))
}
