use axum::{
    extract::{Path, State},
    response::Json,
};

use crate::errors::{AppError, AppResult};
use crate::middleware::{AppJson, AppQuery, CurrentStudent};
use crate::models::{HistoryParams, JobDetail, JobList, SubmitRequest, SubmitResponse, UserDashboard};
use crate::state::AppState;

pub async fn dashboard(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> AppResult<Json<UserDashboard>> {
    tracing::debug!("Dashboard for student {}", student.student_id);
    let dashboard = state.store.student_dashboard(&student).await?;
    Ok(Json(dashboard))
}

pub async fn submit(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    AppJson(request): AppJson<SubmitRequest>,
) -> AppResult<Json<SubmitResponse>> {
    let (job, remaining_quota) = state
        .store
        .submit_job(&student, request.num_clothes, request.notes, request.priority)
        .await?;

    Ok(Json(SubmitResponse {
        success: true,
        message: format!(
            "Request submitted successfully. {} clothes remaining in quota.",
            remaining_quota
        ),
        job_id: job.id,
        remaining_quota,
        job,
    }))
}

pub async fn history(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<HistoryParams>,
) -> AppResult<Json<JobList>> {
    let history = state
        .store
        .job_history(&student, params.status, params.page, params.page_size)
        .await?;
    Ok(Json(history))
}

pub async fn job_detail(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    Path(job_id): Path<i64>,
) -> AppResult<Json<JobDetail>> {
    let job = state
        .store
        .job_for_user(job_id, student.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", job_id)))?;

    Ok(Json(JobDetail { success: true, job }))
}
