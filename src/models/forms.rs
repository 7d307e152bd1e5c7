use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::auth::UserType;
use crate::models::{JobPriority, JobStatus, LaundryJob};

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

fn default_days() -> i64 {
    7
}

// =====================================================
// Authentication
// =====================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub user_type: UserType,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub access_token: String,
    pub token_type: String,
    pub user_type: UserType,
    pub user_id: i64,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterAdminRequest {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterAdminResponse {
    pub success: bool,
    pub message: String,
    pub admin_id: i64,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenParams {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyTokenResponse {
    pub success: bool,
    pub valid: bool,
    pub user_id: i64,
    pub username: String,
    pub user_type: UserType,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

// =====================================================
// Student
// =====================================================

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub num_clothes: i64,
    pub notes: Option<String>,
    #[serde(default)]
    pub priority: JobPriority,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
    pub job_id: i64,
    pub remaining_quota: i64,
    pub job: LaundryJob,
}

#[derive(Debug, Serialize)]
pub struct RecentJob {
    pub id: i64,
    pub num_clothes: i64,
    pub status: JobStatus,
    pub submission_date: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct UserDashboard {
    pub success: bool,
    pub id: i64,
    pub student_id: String,
    pub name: String,
    pub email: Option<String>,
    pub remaining_quota: i64,
    pub total_requests: i64,
    pub pending_requests: i64,
    pub completed_requests: i64,
    pub recent_jobs: Vec<RecentJob>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    pub status: Option<JobStatus>,
}

#[derive(Debug, Serialize)]
pub struct JobList {
    pub success: bool,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub jobs: Vec<LaundryJob>,
}

#[derive(Debug, Serialize)]
pub struct JobDetail {
    pub success: bool,
    #[serde(flatten)]
    pub job: LaundryJob,
}

// =====================================================
// Admin
// =====================================================

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub request_id: i64,
    pub status: JobStatus,
}

#[derive(Debug, Serialize)]
pub struct UpdateStatusResponse {
    pub success: bool,
    pub message: String,
    pub job: LaundryJob,
}

/// One row of the admin work queues, joined with the owning user's name.
#[derive(Debug, Serialize, FromRow)]
pub struct QueuedJob {
    pub id: i64,
    pub student_id: String,
    pub student_name: String,
    pub num_clothes: i64,
    pub status: JobStatus,
    pub priority: JobPriority,
    pub submission_date: DateTime<Utc>,
    pub started_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdminDashboard {
    pub success: bool,
    pub pending_requests: Vec<QueuedJob>,
    pub processing_requests: Vec<QueuedJob>,
    pub total_pending: i64,
    pub total_processing: i64,
    pub total_completed_today: i64,
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsParams {
    #[serde(default = "default_days")]
    pub days: i64,
}

#[derive(Debug, Serialize)]
pub struct JobStats {
    pub success: bool,
    pub total_jobs: i64,
    pub submitted: i64,
    pub processing: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub total_clothes_processed: i64,
}

#[derive(Debug, Deserialize)]
pub struct JobsParams {
    pub status: Option<JobStatus>,
    pub student_id: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct JobWithUser {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub job: LaundryJob,
    pub student_name: String,
    pub remaining_quota: i64,
}

#[derive(Debug, Serialize)]
pub struct JobsList {
    pub success: bool,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub jobs: Vec<JobWithUser>,
}
