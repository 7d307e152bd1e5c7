//! Read-only queries over the job ledger: dashboards, analytics and
//! paginated listings.

use chrono::Utc;

use crate::errors::{AppError, AppResult};
use crate::models::{
    AdminDashboard, JobList, JobStats, JobStatus, JobWithUser, JobsList, LaundryJob, QueuedJob,
    RecentJob, User, UserDashboard,
};
use crate::services::LaundryStore;

pub const MAX_PAGE_SIZE: i64 = 100;
pub const MAX_ANALYTICS_DAYS: i64 = 365;
const RECENT_JOBS_LIMIT: i64 = 5;

fn validate_pagination(page: i64, page_size: i64) -> AppResult<i64> {
    if page < 1 {
        return Err(AppError::InvalidInput(
            "Page number must be at least 1".to_string(),
        ));
    }
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(AppError::InvalidInput(format!(
            "Page size must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }
    Ok((page - 1) * page_size)
}

impl LaundryStore {
    /// Quota, request counts and the most recent jobs for one student.
    pub async fn student_dashboard(&self, user: &User) -> AppResult<UserDashboard> {
        let total_requests: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM laundry_jobs WHERE user_id = ?")
                .bind(user.id)
                .fetch_one(self.pool())
                .await?;

        let pending_requests: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM laundry_jobs WHERE user_id = ? AND status = ?",
        )
        .bind(user.id)
        .bind(JobStatus::Submitted)
        .fetch_one(self.pool())
        .await?;

        let completed_requests: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM laundry_jobs WHERE user_id = ? AND status = ?",
        )
        .bind(user.id)
        .bind(JobStatus::Completed)
        .fetch_one(self.pool())
        .await?;

        let recent = sqlx::query_as::<_, LaundryJob>(
            "SELECT * FROM laundry_jobs WHERE user_id = ? \
             ORDER BY submission_date DESC LIMIT ?",
        )
        .bind(user.id)
        .bind(RECENT_JOBS_LIMIT)
        .fetch_all(self.pool())
        .await?;

        let recent_jobs = recent
            .into_iter()
            .map(|job| RecentJob {
                id: job.id,
                num_clothes: job.num_clothes,
                status: job.status,
                submission_date: job.submission_date,
            })
            .collect();

        Ok(UserDashboard {
            success: true,
            id: user.id,
            student_id: user.student_id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            remaining_quota: user.remaining_quota,
            total_requests,
            pending_requests,
            completed_requests,
            recent_jobs,
        })
    }

    /// Work queues for the admin dashboard: pending jobs in FIFO order,
    /// processing jobs by start time, and today's completion count.
    pub async fn admin_dashboard(&self) -> AppResult<AdminDashboard> {
        let pending = sqlx::query_as::<_, QueuedJob>(
            "SELECT j.id, j.student_id, u.name AS student_name, j.num_clothes, j.status, \
             j.priority, j.submission_date, j.started_date, j.notes \
             FROM laundry_jobs j JOIN users u ON j.user_id = u.id \
             WHERE j.status = ? ORDER BY j.submission_date ASC",
        )
        .bind(JobStatus::Submitted)
        .fetch_all(self.pool())
        .await?;

        let processing = sqlx::query_as::<_, QueuedJob>(
            "SELECT j.id, j.student_id, u.name AS student_name, j.num_clothes, j.status, \
             j.priority, j.submission_date, j.started_date, j.notes \
             FROM laundry_jobs j JOIN users u ON j.user_id = u.id \
             WHERE j.status = ? ORDER BY j.started_date ASC",
        )
        .bind(JobStatus::Processing)
        .fetch_all(self.pool())
        .await?;

        let today_start = Utc::now()
            .date_naive()
            .and_time(chrono::NaiveTime::MIN)
            .and_utc();

        let total_completed_today: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM laundry_jobs WHERE status = ? AND completed_date >= ?",
        )
        .bind(JobStatus::Completed)
        .bind(today_start)
        .fetch_one(self.pool())
        .await?;

        Ok(AdminDashboard {
            success: true,
            total_pending: pending.len() as i64,
            total_processing: processing.len() as i64,
            pending_requests: pending,
            processing_requests: processing,
            total_completed_today,
        })
    }

    /// Job statistics. `days` is bounded to [1, 365]; note the aggregates are
    /// lifetime totals and are not windowed to `days`.
    pub async fn analytics(&self, days: i64) -> AppResult<JobStats> {
        if !(1..=MAX_ANALYTICS_DAYS).contains(&days) {
            return Err(AppError::InvalidInput(format!(
                "Days must be between 1 and {}",
                MAX_ANALYTICS_DAYS
            )));
        }

        let total_jobs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM laundry_jobs")
            .fetch_one(self.pool())
            .await?;

        let status_counts = sqlx::query_as::<_, (JobStatus, i64)>(
            "SELECT status, COUNT(*) FROM laundry_jobs GROUP BY status",
        )
        .fetch_all(self.pool())
        .await?;

        let mut stats = JobStats {
            success: true,
            total_jobs,
            submitted: 0,
            processing: 0,
            completed: 0,
            cancelled: 0,
            total_clothes_processed: 0,
        };

        for (status, count) in status_counts {
            match status {
                JobStatus::Submitted => stats.submitted = count,
                JobStatus::Processing => stats.processing = count,
                JobStatus::Completed => stats.completed = count,
                JobStatus::Cancelled => stats.cancelled = count,
            }
        }

        let total_clothes: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(num_clothes) FROM laundry_jobs WHERE status = ?",
        )
        .bind(JobStatus::Completed)
        .fetch_one(self.pool())
        .await?;
        stats.total_clothes_processed = total_clothes.unwrap_or(0);

        Ok(stats)
    }

    /// All jobs, optionally filtered by status and student, joined with the
    /// owning user, newest submissions first.
    pub async fn list_jobs(
        &self,
        status: Option<JobStatus>,
        student_id: Option<&str>,
        page: i64,
        page_size: i64,
    ) -> AppResult<JobsList> {
        let offset = validate_pagination(page, page_size)?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM laundry_jobs j \
             WHERE (? IS NULL OR j.status = ?) AND (? IS NULL OR j.student_id = ?)",
        )
        .bind(status)
        .bind(status)
        .bind(student_id)
        .bind(student_id)
        .fetch_one(self.pool())
        .await?;

        let jobs = sqlx::query_as::<_, JobWithUser>(
            "SELECT j.*, u.name AS student_name, u.remaining_quota \
             FROM laundry_jobs j JOIN users u ON j.user_id = u.id \
             WHERE (? IS NULL OR j.status = ?) AND (? IS NULL OR j.student_id = ?) \
             ORDER BY j.submission_date DESC LIMIT ? OFFSET ?",
        )
        .bind(status)
        .bind(status)
        .bind(student_id)
        .bind(student_id)
        .bind(page_size)
        .bind(offset)
        .fetch_all(self.pool())
        .await?;

        Ok(JobsList {
            success: true,
            total,
            page,
            page_size,
            jobs,
        })
    }

    /// One student's job history, optionally filtered by status, newest
    /// submissions first.
    pub async fn job_history(
        &self,
        user: &User,
        status: Option<JobStatus>,
        page: i64,
        page_size: i64,
    ) -> AppResult<JobList> {
        let offset = validate_pagination(page, page_size)?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM laundry_jobs \
             WHERE user_id = ? AND (? IS NULL OR status = ?)",
        )
        .bind(user.id)
        .bind(status)
        .bind(status)
        .fetch_one(self.pool())
        .await?;

        let jobs = sqlx::query_as::<_, LaundryJob>(
            "SELECT * FROM laundry_jobs \
             WHERE user_id = ? AND (? IS NULL OR status = ?) \
             ORDER BY submission_date DESC LIMIT ? OFFSET ?",
        )
        .bind(user.id)
        .bind(status)
        .bind(status)
        .bind(page_size)
        .bind(offset)
        .fetch_all(self.pool())
        .await?;

        Ok(JobList {
            success: true,
            total,
            page,
            page_size,
            jobs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobPriority;
    use crate::services::testutil::*;

    #[tokio::test]
    async fn dashboard_counts_and_recent_jobs() {
        let store = memory_store().await;
        let user = seed_student(&store, "STU001", 50).await;

        let mut last_job_id = 0;
        for _ in 0..7 {
            let (job, _) = store
                .submit_job(&user, 1, None, JobPriority::Normal)
                .await
                .unwrap();
            last_job_id = job.id;
        }
        store
            .update_status(last_job_id, JobStatus::Completed)
            .await
            .unwrap();

        let user = store.user_by_id(user.id).await.unwrap().unwrap();
        let dashboard = store.student_dashboard(&user).await.unwrap();

        assert_eq!(dashboard.total_requests, 7);
        assert_eq!(dashboard.pending_requests, 6);
        assert_eq!(dashboard.completed_requests, 1);
        assert_eq!(dashboard.remaining_quota, 43);

        // Five most recent, newest first.
        assert_eq!(dashboard.recent_jobs.len(), 5);
        assert_eq!(dashboard.recent_jobs[0].id, last_job_id);
        for pair in dashboard.recent_jobs.windows(2) {
            assert!(pair[0].submission_date >= pair[1].submission_date);
        }
    }

    #[tokio::test]
    async fn admin_dashboard_orders_queues_fifo() {
        let store = memory_store().await;
        let alice = seed_student(&store, "STU001", 30).await;
        let bob = seed_student(&store, "STU002", 30).await;

        let (first, _) = store
            .submit_job(&alice, 2, None, JobPriority::Normal)
            .await
            .unwrap();
        let (second, _) = store
            .submit_job(&bob, 3, None, JobPriority::Urgent)
            .await
            .unwrap();
        let (third, _) = store
            .submit_job(&alice, 4, None, JobPriority::Normal)
            .await
            .unwrap();

        // Start the later submission first; the processing queue orders by
        // start time, not submission time.
        store
            .update_status(third.id, JobStatus::Processing)
            .await
            .unwrap();
        store
            .update_status(first.id, JobStatus::Processing)
            .await
            .unwrap();
        store
            .update_status(first.id, JobStatus::Completed)
            .await
            .unwrap();

        let dashboard = store.admin_dashboard().await.unwrap();

        assert_eq!(dashboard.total_pending, 1);
        assert_eq!(dashboard.pending_requests[0].id, second.id);
        assert_eq!(dashboard.pending_requests[0].student_name, "Student STU002");

        assert_eq!(dashboard.total_processing, 1);
        assert_eq!(dashboard.processing_requests[0].id, third.id);

        assert_eq!(dashboard.total_completed_today, 1);
    }

    #[tokio::test]
    async fn admin_dashboard_pending_queue_is_oldest_first() {
        let store = memory_store().await;
        let user = seed_student(&store, "STU001", 30).await;

        let (first, _) = store
            .submit_job(&user, 1, None, JobPriority::Normal)
            .await
            .unwrap();
        let (second, _) = store
            .submit_job(&user, 1, None, JobPriority::Normal)
            .await
            .unwrap();

        let dashboard = store.admin_dashboard().await.unwrap();
        assert_eq!(dashboard.pending_requests[0].id, first.id);
        assert_eq!(dashboard.pending_requests[1].id, second.id);
    }

    #[tokio::test]
    async fn analytics_counts_by_status_and_sums_completed_clothes() {
        let store = memory_store().await;
        let user = seed_student(&store, "STU001", 30).await;

        let (job, _) = store
            .submit_job(&user, 5, None, JobPriority::Normal)
            .await
            .unwrap();
        store
            .update_status(job.id, JobStatus::Processing)
            .await
            .unwrap();
        store
            .update_status(job.id, JobStatus::Completed)
            .await
            .unwrap();

        store
            .submit_job(&user, 2, None, JobPriority::Normal)
            .await
            .unwrap();
        let (cancelled, _) = store
            .submit_job(&user, 3, None, JobPriority::Normal)
            .await
            .unwrap();
        store
            .update_status(cancelled.id, JobStatus::Cancelled)
            .await
            .unwrap();

        let stats = store.analytics(7).await.unwrap();
        assert_eq!(stats.total_jobs, 3);
        assert_eq!(stats.submitted, 1);
        assert_eq!(stats.processing, 0);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.cancelled, 1);
        // Only completed jobs count toward processed clothes.
        assert_eq!(stats.total_clothes_processed, 5);
    }

    #[tokio::test]
    async fn analytics_rejects_out_of_range_days() {
        let store = memory_store().await;
        for bad in [0, -1, 366] {
            let result = store.analytics(bad).await;
            assert!(matches!(result, Err(AppError::InvalidInput(_))));
        }
    }

    #[tokio::test]
    async fn history_pagination_returns_exact_window() {
        let store = memory_store().await;
        let user = seed_student(&store, "STU001", 50).await;

        let mut ids = Vec::new();
        for _ in 0..45 {
            let (job, _) = store
                .submit_job(&user, 1, None, JobPriority::Normal)
                .await
                .unwrap();
            ids.push(job.id);
        }

        let page2 = store.job_history(&user, None, 2, 20).await.unwrap();
        assert_eq!(page2.total, 45);
        assert_eq!(page2.page, 2);
        assert_eq!(page2.jobs.len(), 20);

        // Newest first: page 2 holds items 21-40 of the descending set.
        let descending: Vec<i64> = ids.iter().rev().copied().collect();
        let expected: Vec<i64> = descending[20..40].to_vec();
        let got: Vec<i64> = page2.jobs.iter().map(|j| j.id).collect();
        assert_eq!(got, expected);

        let page3 = store.job_history(&user, None, 3, 20).await.unwrap();
        assert_eq!(page3.jobs.len(), 5);
    }

    #[tokio::test]
    async fn history_filters_by_status_and_owner() {
        let store = memory_store().await;
        let alice = seed_student(&store, "STU001", 30).await;
        let bob = seed_student(&store, "STU002", 30).await;

        let (done, _) = store
            .submit_job(&alice, 2, None, JobPriority::Normal)
            .await
            .unwrap();
        store
            .update_status(done.id, JobStatus::Completed)
            .await
            .unwrap();
        store
            .submit_job(&alice, 3, None, JobPriority::Normal)
            .await
            .unwrap();
        store
            .submit_job(&bob, 4, None, JobPriority::Normal)
            .await
            .unwrap();

        let all = store.job_history(&alice, None, 1, 20).await.unwrap();
        assert_eq!(all.total, 2);
        assert!(all.jobs.iter().all(|j| j.user_id == alice.id));

        let completed = store
            .job_history(&alice, Some(JobStatus::Completed), 1, 20)
            .await
            .unwrap();
        assert_eq!(completed.total, 1);
        assert_eq!(completed.jobs[0].id, done.id);
    }

    #[tokio::test]
    async fn history_rejects_bad_pagination() {
        let store = memory_store().await;
        let user = seed_student(&store, "STU001", 30).await;

        assert!(matches!(
            store.job_history(&user, None, 0, 20).await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            store.job_history(&user, None, 1, 0).await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            store.job_history(&user, None, 1, 101).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn list_jobs_filters_and_joins_user_fields() {
        let store = memory_store().await;
        let alice = seed_student(&store, "STU001", 30).await;
        let bob = seed_student(&store, "STU002", 30).await;

        store
            .submit_job(&alice, 2, None, JobPriority::Normal)
            .await
            .unwrap();
        let (bobs, _) = store
            .submit_job(&bob, 3, None, JobPriority::High)
            .await
            .unwrap();
        store
            .update_status(bobs.id, JobStatus::Processing)
            .await
            .unwrap();

        let everything = store.list_jobs(None, None, 1, 20).await.unwrap();
        assert_eq!(everything.total, 2);

        let only_bob = store.list_jobs(None, Some("STU002"), 1, 20).await.unwrap();
        assert_eq!(only_bob.total, 1);
        assert_eq!(only_bob.jobs[0].job.id, bobs.id);
        assert_eq!(only_bob.jobs[0].student_name, "Student STU002");
        assert_eq!(only_bob.jobs[0].remaining_quota, 27);

        let processing = store
            .list_jobs(Some(JobStatus::Processing), None, 1, 20)
            .await
            .unwrap();
        assert_eq!(processing.total, 1);
        assert_eq!(processing.jobs[0].job.id, bobs.id);

        let none = store
            .list_jobs(Some(JobStatus::Cancelled), Some("STU001"), 1, 20)
            .await
            .unwrap();
        assert_eq!(none.total, 0);
        assert!(none.jobs.is_empty());
    }
}
