use chrono::{NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::config::DatabaseConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{Admin, LaundryJob, NewUser, PlanTier, Subscription, User};

/// Quota granted to a new student when none is specified.
pub const DEFAULT_QUOTA: i64 = 30;

// The invariants below are also enforced as CHECK constraints so that no
// writer can corrupt state, not just request validation.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        student_id TEXT NOT NULL UNIQUE CHECK (student_id GLOB 'STU[0-9][0-9][0-9]*'),
        name TEXT NOT NULL,
        email TEXT UNIQUE,
        password_hash TEXT,
        remaining_quota INTEGER NOT NULL DEFAULT 30 CHECK (remaining_quota >= 0),
        is_active BOOLEAN NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS subscriptions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        plan_type TEXT NOT NULL DEFAULT 'basic'
            CHECK (plan_type IN ('basic', 'premium', 'unlimited')),
        quota_limit INTEGER NOT NULL DEFAULT 30 CHECK (quota_limit > 0),
        start_date TEXT NOT NULL,
        end_date TEXT CHECK (end_date IS NULL OR end_date >= start_date),
        is_active BOOLEAN NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS laundry_jobs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id),
        student_id TEXT NOT NULL,
        num_clothes INTEGER NOT NULL CHECK (num_clothes BETWEEN 1 AND 50),
        status TEXT NOT NULL DEFAULT 'submitted'
            CHECK (status IN ('submitted', 'processing', 'completed', 'cancelled')),
        priority TEXT NOT NULL DEFAULT 'normal'
            CHECK (priority IN ('low', 'normal', 'high', 'urgent')),
        notes TEXT CHECK (notes IS NULL OR LENGTH(notes) <= 500),
        submission_date TEXT NOT NULL,
        started_date TEXT CHECK (started_date IS NULL OR started_date >= submission_date),
        completed_date TEXT CHECK (completed_date IS NULL OR completed_date >= submission_date),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS admins (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE CHECK (LENGTH(username) >= 3),
        email TEXT UNIQUE,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'admin'
            CHECK (role IN ('admin', 'super_admin', 'operator')),
        is_active BOOLEAN NOT NULL DEFAULT 1,
        last_login TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_users_email ON users (email)",
    "CREATE INDEX IF NOT EXISTS idx_users_active ON users (is_active)",
    "CREATE INDEX IF NOT EXISTS idx_subscriptions_user_id ON subscriptions (user_id)",
    "CREATE INDEX IF NOT EXISTS idx_laundry_jobs_user_id ON laundry_jobs (user_id)",
    "CREATE INDEX IF NOT EXISTS idx_laundry_jobs_student_id ON laundry_jobs (student_id)",
    "CREATE INDEX IF NOT EXISTS idx_laundry_jobs_status ON laundry_jobs (status)",
    "CREATE INDEX IF NOT EXISTS idx_laundry_jobs_submission_date ON laundry_jobs (submission_date)",
    "CREATE INDEX IF NOT EXISTS idx_laundry_jobs_status_date ON laundry_jobs (status, submission_date)",
];

/// Durable storage for users, subscriptions, jobs and admins, backed by a
/// SQLite connection pool.
pub struct LaundryStore {
    pool: SqlitePool,
}

impl LaundryStore {
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Create all tables and indexes if they do not exist.
    pub async fn init_schema(&self) -> AppResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }

    // =====================================================
    // Users
    // =====================================================

    pub async fn create_user(&self, new: NewUser) -> AppResult<User> {
        if !is_valid_student_id(&new.student_id) {
            return Err(AppError::InvalidInput(
                "Student ID must be in format STU### (e.g., STU001)".to_string(),
            ));
        }

        let now = Utc::now();
        let quota = new.remaining_quota.unwrap_or(DEFAULT_QUOTA);

        let result = sqlx::query(
            "INSERT INTO users (student_id, name, email, password_hash, remaining_quota, \
             is_active, created_at, updated_at) VALUES (?, ?, ?, ?, ?, 1, ?, ?)",
        )
        .bind(&new.student_id)
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(quota)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.user_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| AppError::Internal("Created user not found".to_string()))
    }

    pub async fn user_by_id(&self, id: i64) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn user_by_student_id(&self, student_id: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE student_id = ?")
            .bind(student_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Remove a user together with everything it owns, in one transaction.
    /// Ownership is explicit here; the engine-side cascade is not relied on.
    pub async fn delete_user(&self, user_id: i64) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM laundry_jobs WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM subscriptions WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        tx.commit().await?;
        Ok(())
    }

    // =====================================================
    // Subscriptions
    // =====================================================

    pub async fn create_subscription(
        &self,
        user_id: i64,
        plan_type: PlanTier,
        quota_limit: i64,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> AppResult<Subscription> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO subscriptions (user_id, plan_type, quota_limit, start_date, end_date, \
             is_active, created_at, updated_at) VALUES (?, ?, ?, ?, ?, 1, ?, ?)",
        )
        .bind(user_id)
        .bind(plan_type)
        .bind(quota_limit)
        .bind(start_date)
        .bind(end_date)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let subscription =
            sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE id = ?")
                .bind(result.last_insert_rowid())
                .fetch_one(&self.pool)
                .await?;
        Ok(subscription)
    }

    pub async fn subscriptions_for_user(&self, user_id: i64) -> AppResult<Vec<Subscription>> {
        let subscriptions = sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE user_id = ? ORDER BY start_date DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(subscriptions)
    }

    // =====================================================
    // Admins
    // =====================================================

    pub async fn create_admin(
        &self,
        username: &str,
        email: Option<&str>,
        password_hash: &str,
    ) -> AppResult<Admin> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO admins (username, email, password_hash, role, is_active, created_at, \
             updated_at) VALUES (?, ?, ?, 'admin', 1, ?, ?)",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(&self.pool)
            .await?;
        Ok(admin)
    }

    pub async fn admin_by_id(&self, id: i64) -> AppResult<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(admin)
    }

    pub async fn admin_by_username(&self, username: &str) -> AppResult<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(admin)
    }

    pub async fn admin_by_email(&self, email: &str) -> AppResult<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(admin)
    }

    // =====================================================
    // Jobs (read side; mutation lives in the lifecycle module)
    // =====================================================

    pub async fn job_by_id(&self, job_id: i64) -> AppResult<Option<LaundryJob>> {
        let job = sqlx::query_as::<_, LaundryJob>("SELECT * FROM laundry_jobs WHERE id = ?")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(job)
    }

    /// A job visible to its owner only.
    pub async fn job_for_user(&self, job_id: i64, user_id: i64) -> AppResult<Option<LaundryJob>> {
        let job = sqlx::query_as::<_, LaundryJob>(
            "SELECT * FROM laundry_jobs WHERE id = ? AND user_id = ?",
        )
        .bind(job_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }
}

impl Clone for LaundryStore {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
        }
    }
}

// Format STU followed by at least three digits.
fn is_valid_student_id(student_id: &str) -> bool {
    match student_id.strip_prefix("STU") {
        Some(digits) => digits.len() >= 3 && digits.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;

    /// In-memory store for single-connection tests.
    pub(crate) async fn memory_store() -> LaundryStore {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        };
        let store = LaundryStore::connect(&config).await.unwrap();
        store.init_schema().await.unwrap();
        store
    }

    /// File-backed store for tests exercising concurrent connections.
    pub(crate) async fn file_store() -> (LaundryStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            url: format!("sqlite://{}", dir.path().join("laundry.db").display()),
            max_connections: 5,
        };
        let store = LaundryStore::connect(&config).await.unwrap();
        store.init_schema().await.unwrap();
        (store, dir)
    }

    pub(crate) async fn seed_student(
        store: &LaundryStore,
        student_id: &str,
        quota: i64,
    ) -> User {
        store
            .create_user(NewUser {
                student_id: student_id.to_string(),
                name: format!("Student {}", student_id),
                email: None,
                password_hash: None,
                remaining_quota: Some(quota),
            })
            .await
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::*;
    use super::*;
    use crate::models::JobStatus;

    #[tokio::test]
    async fn health_check_reports_reachable_storage() {
        let store = memory_store().await;
        assert!(store.health_check().await);
    }

    #[tokio::test]
    async fn create_user_rejects_malformed_student_id() {
        let store = memory_store().await;

        for bad in ["BAD123", "STU12", "STUxyz", "stu123"] {
            let result = store
                .create_user(NewUser {
                    student_id: bad.to_string(),
                    name: "Nobody".to_string(),
                    email: None,
                    password_hash: None,
                    remaining_quota: None,
                })
                .await;
            assert!(
                matches!(result, Err(AppError::InvalidInput(_))),
                "expected {} to be rejected",
                bad
            );
        }
    }

    #[tokio::test]
    async fn create_user_applies_default_quota() {
        let store = memory_store().await;

        let user = store
            .create_user(NewUser {
                student_id: "STU100".to_string(),
                name: "Defaulted".to_string(),
                email: None,
                password_hash: None,
                remaining_quota: None,
            })
            .await
            .unwrap();

        assert_eq!(user.remaining_quota, DEFAULT_QUOTA);
        assert!(user.is_active);
    }

    #[tokio::test]
    async fn schema_rejects_invalid_rows_from_any_writer() {
        let store = memory_store().await;
        let user = seed_student(&store, "STU001", 30).await;
        let now = Utc::now();

        // Clothing count outside [1, 50]
        let result = sqlx::query(
            "INSERT INTO laundry_jobs (user_id, student_id, num_clothes, status, priority, \
             submission_date, created_at, updated_at) VALUES (?, ?, 0, 'submitted', 'normal', ?, ?, ?)",
        )
        .bind(user.id)
        .bind(&user.student_id)
        .bind(now)
        .bind(now)
        .bind(now)
        .execute(store.pool())
        .await;
        assert!(result.is_err());

        // Status outside the enumerated set
        let result = sqlx::query(
            "INSERT INTO laundry_jobs (user_id, student_id, num_clothes, status, priority, \
             submission_date, created_at, updated_at) VALUES (?, ?, 5, 'misplaced', 'normal', ?, ?, ?)",
        )
        .bind(user.id)
        .bind(&user.student_id)
        .bind(now)
        .bind(now)
        .bind(now)
        .execute(store.pool())
        .await;
        assert!(result.is_err());

        // Quota driven negative by a direct write
        let result = sqlx::query("UPDATE users SET remaining_quota = -1 WHERE id = ?")
            .bind(user.id)
            .execute(store.pool())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn delete_user_removes_owned_rows_in_one_transaction() {
        let store = memory_store().await;
        let user = seed_student(&store, "STU001", 30).await;

        store
            .create_subscription(
                user.id,
                PlanTier::Basic,
                30,
                Utc::now().date_naive(),
                None,
            )
            .await
            .unwrap();
        store
            .submit_job(&user, 5, None, Default::default())
            .await
            .unwrap();

        store.delete_user(user.id).await.unwrap();

        assert!(store.user_by_id(user.id).await.unwrap().is_none());
        assert!(store.subscriptions_for_user(user.id).await.unwrap().is_empty());
        let jobs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM laundry_jobs WHERE user_id = ?")
            .bind(user.id)
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(jobs, 0);
    }

    #[tokio::test]
    async fn delete_unknown_user_is_not_found() {
        let store = memory_store().await;
        let result = store.delete_user(999).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn job_for_user_hides_other_owners() {
        let store = memory_store().await;
        let alice = seed_student(&store, "STU001", 30).await;
        let bob = seed_student(&store, "STU002", 30).await;

        let (job, _) = store
            .submit_job(&alice, 3, None, Default::default())
            .await
            .unwrap();

        assert!(store.job_for_user(job.id, alice.id).await.unwrap().is_some());
        assert!(store.job_for_user(job.id, bob.id).await.unwrap().is_none());

        let visible = store.job_by_id(job.id).await.unwrap().unwrap();
        assert_eq!(visible.status, JobStatus::Submitted);
    }
}
