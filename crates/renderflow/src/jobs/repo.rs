use crate::jobs::model::{NewVideo, Video, VideoStatus};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct VideosRepo {
    pool: PgPool,
}

impl VideosRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ----------------------------
    // Enqueue + reads
    // ----------------------------

    pub async fn enqueue(&self, video: NewVideo) -> anyhow::Result<i64> {
        let status = video.status.unwrap_or(VideoStatus::Queued);

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO videos (
                status, scheduled_at, script, hook,
                captions_on, hook_overlay_on, hook_pos, render_service
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(status.as_str())
        .bind(video.scheduled_at)
        .bind(&video.script)
        .bind(&video.hook)
        .bind(video.captions_on)
        .bind(video.hook_overlay_on)
        .bind(&video.hook_pos)
        .bind(&video.render_service)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    pub async fn get(&self, id: i64) -> anyhow::Result<Option<Video>> {
        let video = sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(video)
    }

    pub async fn count_by_status(&self) -> anyhow::Result<Vec<(String, i64)>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT status, COUNT(*)
            FROM videos
            GROUP BY status
            ORDER BY status
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ----------------------------
    // Claiming
    // ----------------------------

    /// Whether any job is waiting for this service.
    pub async fn has_pending(&self, service: &str, now: DateTime<Utc>) -> anyhow::Result<bool> {
        let pending: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM videos
                WHERE (
                    status = 'QUEUED'
                    OR (status = 'INIT' AND (scheduled_at IS NULL OR scheduled_at <= $2))
                  )
                  AND (render_service = $1 OR render_service IS NULL)
            )
            "#,
        )
        .bind(service)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(pending)
    }

    /// Moves the next pending job to RENDERING under `claim_token` and
    /// returns it, or `None` when nothing is left.
    ///
    /// QUEUED rows come before due INIT rows; inside each group rows without a
    /// schedule come first, then ascending `scheduled_at`. Rows locked by a
    /// concurrent claim are skipped, not waited on. One job per call, so a
    /// caller that stops early leaves the rest pending.
    pub async fn claim_next(
        &self,
        service: &str,
        now: DateTime<Utc>,
        claim_token: Uuid,
    ) -> anyhow::Result<Option<Video>> {
        let video = sqlx::query_as::<_, Video>(
            r#"
            UPDATE videos
            SET status = 'RENDERING',
                claim_token = $3,
                updated_at = now()
            WHERE id = (
                SELECT id
                FROM videos
                WHERE (
                    status = 'QUEUED'
                    OR (status = 'INIT' AND (scheduled_at IS NULL OR scheduled_at <= $2))
                  )
                  AND (render_service = $1 OR render_service IS NULL)
                ORDER BY (status = 'QUEUED') DESC, scheduled_at ASC NULLS FIRST, id ASC
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
              AND status IN ('QUEUED', 'INIT')
            RETURNING *
            "#,
        )
        .bind(service)
        .bind(now)
        .bind(claim_token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(video)
    }

    // ----------------------------
    // State transitions
    // ----------------------------

    /// RENDERING -> READY. The token guard keeps another invocation from
    /// finishing a job it does not own. Returns false if nothing changed.
    pub async fn mark_ready(
        &self,
        id: i64,
        claim_token: Uuid,
        file_url: &str,
        render_id: &str,
    ) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE videos
            SET status = 'READY',
                file_url = $3,
                render_id = $4,
                link = NULL,
                updated_at = now()
            WHERE id = $1
              AND claim_token = $2
              AND status = 'RENDERING'
            "#,
        )
        .bind(id)
        .bind(claim_token)
        .bind(file_url)
        .bind(render_id)
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected() == 1)
    }

    /// RENDERING -> ERROR with the failure text stored in `link`.
    pub async fn mark_error(
        &self,
        id: i64,
        claim_token: Uuid,
        message: &str,
        render_id: Option<&str>,
    ) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE videos
            SET status = 'ERROR',
                link = $3,
                render_id = COALESCE($4, render_id),
                updated_at = now()
            WHERE id = $1
              AND claim_token = $2
              AND status = 'RENDERING'
            "#,
        )
        .bind(id)
        .bind(claim_token)
        .bind(message)
        .bind(render_id)
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected() == 1)
    }
}
