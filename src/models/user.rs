use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Student account. `password_hash` is optional: accounts imported without a
/// credential authenticate by student id alone.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub student_id: String,
    pub name: String,
    pub email: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub remaining_quota: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New student payload used at registration/seeding time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub student_id: String,
    pub name: String,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub remaining_quota: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PlanTier {
    Basic,
    Premium,
    Unlimited,
}

/// Subscription plan governing quota replenishment. Stored and owned by the
/// user, but not read by any business operation yet.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub id: i64,
    pub user_id: i64,
    pub plan_type: PlanTier,
    pub quota_limit: i64,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
