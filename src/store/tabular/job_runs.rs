use sqlx::PgPool;

use crate::jobs::orchestrator::JobSummary;

/// Started/completed/failed bookkeeping for every scheduled job run,
/// grounded in the teacher's `job_scheduler_service.rs`
/// `record_job_start`/`record_job_success`/`record_job_failure` trio.
/// Purely observational: nothing downstream reads this table back.
pub async fn start(pool: &PgPool, job_name: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO job_runs (job_name, status) VALUES ($1, 'running') RETURNING id",
    )
    .bind(job_name)
    .fetch_one(pool)
    .await
}

pub async fn complete_success(pool: &PgPool, id: i64, summary: JobSummary) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE job_runs SET status = 'completed', completed_at = now(), \
         processed = $2, skipped = $3, failed = $4 WHERE id = $1",
    )
    .bind(id)
    .bind(summary.processed as i32)
    .bind(summary.skipped as i32)
    .bind(summary.failed as i32)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn complete_failure(pool: &PgPool, id: i64, error: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE job_runs SET status = 'failed', completed_at = now(), error = $2 WHERE id = $1")
        .bind(id)
        .bind(error)
        .execute(pool)
        .await?;
    Ok(())
}
