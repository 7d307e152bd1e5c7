//! Job lifecycle operations: submission with atomic quota accounting, and
//! admin status transitions. All quota and status mutation goes through this
//! module; nothing else writes these fields.

use chrono::Utc;

use crate::errors::{AppError, AppResult};
use crate::models::{JobPriority, JobStatus, LaundryJob, User};
use crate::services::LaundryStore;

pub const MIN_CLOTHES_PER_REQUEST: i64 = 1;
pub const MAX_CLOTHES_PER_REQUEST: i64 = 50;
pub const MAX_NOTES_LENGTH: usize = 500;

impl LaundryStore {
    /// Create a new job for `user` and deduct its clothing count from the
    /// user's quota, atomically. Returns the created job and the new quota.
    ///
    /// The decrement is a guarded update on the quota column, so two racing
    /// submissions for the same user cannot jointly overdraw it: whichever
    /// lands second re-checks against the already-decremented value.
    pub async fn submit_job(
        &self,
        user: &User,
        num_clothes: i64,
        notes: Option<String>,
        priority: JobPriority,
    ) -> AppResult<(LaundryJob, i64)> {
        if !(MIN_CLOTHES_PER_REQUEST..=MAX_CLOTHES_PER_REQUEST).contains(&num_clothes) {
            return Err(AppError::InvalidInput(format!(
                "Number of clothes must be between {} and {}",
                MIN_CLOTHES_PER_REQUEST, MAX_CLOTHES_PER_REQUEST
            )));
        }

        if let Some(notes) = &notes {
            if notes.len() > MAX_NOTES_LENGTH {
                return Err(AppError::InvalidInput(format!(
                    "Notes cannot exceed {} characters",
                    MAX_NOTES_LENGTH
                )));
            }
        }

        let now = Utc::now();
        let mut tx = self.pool().begin().await?;

        let updated = sqlx::query(
            "UPDATE users SET remaining_quota = remaining_quota - ?, updated_at = ? \
             WHERE id = ? AND remaining_quota >= ?",
        )
        .bind(num_clothes)
        .bind(now)
        .bind(user.id)
        .bind(num_clothes)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let available: i64 =
                sqlx::query_scalar("SELECT remaining_quota FROM users WHERE id = ?")
                    .bind(user.id)
                    .fetch_one(&mut *tx)
                    .await?;
            return Err(AppError::QuotaExceeded {
                available,
                requested: num_clothes,
            });
        }

        let inserted = sqlx::query(
            "INSERT INTO laundry_jobs (user_id, student_id, num_clothes, status, priority, \
             notes, submission_date, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id)
        .bind(&user.student_id)
        .bind(num_clothes)
        .bind(JobStatus::Submitted)
        .bind(priority)
        .bind(&notes)
        .bind(now)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let job = sqlx::query_as::<_, LaundryJob>("SELECT * FROM laundry_jobs WHERE id = ?")
            .bind(inserted.last_insert_rowid())
            .fetch_one(&mut *tx)
            .await?;

        let remaining: i64 = sqlx::query_scalar("SELECT remaining_quota FROM users WHERE id = ?")
            .bind(user.id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Job {} submitted by {} ({} clothes, {} remaining)",
            job.id,
            user.student_id,
            num_clothes,
            remaining
        );

        Ok((job, remaining))
    }

    /// Move a job to `new_status`, applying the timestamp rules for the
    /// transition. Status and timestamps update together or not at all.
    ///
    /// Returns the updated job and the status it moved from. Cancelling a job
    /// does not restore the owner's quota.
    pub async fn update_status(
        &self,
        job_id: i64,
        new_status: JobStatus,
    ) -> AppResult<(LaundryJob, JobStatus)> {
        let mut tx = self.pool().begin().await?;

        let job = sqlx::query_as::<_, LaundryJob>("SELECT * FROM laundry_jobs WHERE id = ?")
            .bind(job_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job {} not found", job_id)))?;

        let old_status = job.status;
        let now = Utc::now();
        let mut started_date = job.started_date;
        let mut completed_date = job.completed_date;

        match new_status {
            // The admin is starting the job; a job already past `submitted`
            // keeps its original start time.
            JobStatus::Processing if old_status == JobStatus::Submitted => {
                started_date = Some(now);
            }
            JobStatus::Completed => {
                if started_date.is_none() {
                    started_date = Some(now);
                }
                completed_date = Some(now);
            }
            JobStatus::Cancelled => {
                if completed_date.is_none() {
                    completed_date = Some(now);
                }
            }
            _ => {}
        }

        sqlx::query(
            "UPDATE laundry_jobs SET status = ?, started_date = ?, completed_date = ?, \
             updated_at = ? WHERE id = ?",
        )
        .bind(new_status)
        .bind(started_date)
        .bind(completed_date)
        .bind(now)
        .bind(job_id)
        .execute(&mut *tx)
        .await?;

        let job = sqlx::query_as::<_, LaundryJob>("SELECT * FROM laundry_jobs WHERE id = ?")
            .bind(job_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Job {} status updated from '{}' to '{}'",
            job_id,
            old_status,
            new_status
        );

        Ok((job, old_status))
    }
}
