use sqlx::PgPool;
use uuid::Uuid;

use crate::jobs::model::Integration;

pub const DEFAULT_BASE_URL: &str = "https://api.heygen.com";
pub const DEFAULT_VOICE_ID: &str = "de-DE-Neural2-D";

/// Provider credentials as the worker uses them, defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationConfig {
    pub api_key: String,
    pub base_url: String,
    pub avatar_id: Option<String>,
    pub voice_id: String,
}

impl IntegrationConfig {
    pub fn from_row(row: &Integration) -> Self {
        let base = row
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_BASE_URL);

        Self {
            api_key: row.api_key.clone(),
            base_url: base.trim_end_matches('/').to_string(),
            avatar_id: row.presenter_id.clone().filter(|s| !s.is_empty()),
            voice_id: row
                .voice_id
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_VOICE_ID.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewIntegration {
    pub service: String,
    pub api_key: String,
    pub base_url: Option<String>,
    pub presenter_id: Option<String>,
    pub voice_id: Option<String>,
}

#[derive(Clone)]
pub struct IntegrationsRepo {
    pool: PgPool,
}

impl IntegrationsRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Most recently created record for `service`.
    pub async fn latest_for(
        &self,
        service: &str,
    ) -> anyhow::Result<Option<Integration>> {
        let row = sqlx::query_as::<_, Integration>(
            r#"
            SELECT *
            FROM integrations
            WHERE service = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(service)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn insert(&self, new: NewIntegration) -> anyhow::Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO integrations (id, service, api_key, base_url, presenter_id, voice_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.service)
        .bind(&new.api_key)
        .bind(&new.base_url)
        .bind(&new.presenter_id)
        .bind(&new.voice_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }
}
