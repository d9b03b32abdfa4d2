//! Postgres implementation of the store interface.

use async_trait::async_trait;
use sqlx::PgPool;

use herald_common::error::AppError;
use herald_common::types::{
    Amendment, AppUser, Component, FeatureEntry, Gate, GateType, Stage, StageType,
};

use crate::store::NotifierStore;

/// Postgres-backed store shared across request handlers.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// All registered users. Used by the inactive-user cron sweep.
    pub async fn users(&self) -> Result<Vec<AppUser>, AppError> {
        let users: Vec<AppUser> = sqlx::query_as("SELECT * FROM app_users ORDER BY email")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    /// Remember that an inactivity notice went out, so the user is not
    /// warned again.
    pub async fn mark_notified_inactive(&self, email: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE app_users SET notified_inactive = true WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl NotifierStore for PgStore {
    async fn feature_by_id(&self, feature_id: i64) -> Result<Option<FeatureEntry>, AppError> {
        let fe: Option<FeatureEntry> =
            sqlx::query_as("SELECT * FROM features WHERE id = $1 AND NOT deleted")
                .bind(feature_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(fe)
    }

    async fn ship_stages(&self, feature_id: i64) -> Result<Vec<Stage>, AppError> {
        let stages: Vec<Stage> = sqlx::query_as(
            "SELECT * FROM stages WHERE feature_id = $1 AND stage_type = $2 ORDER BY id",
        )
        .bind(feature_id)
        .bind(StageType::Shipping.to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(stages)
    }

    async fn stage_by_id(&self, stage_id: i64) -> Result<Option<Stage>, AppError> {
        let stage: Option<Stage> = sqlx::query_as("SELECT * FROM stages WHERE id = $1")
            .bind(stage_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(stage)
    }

    async fn gate_by_id(&self, gate_id: i64) -> Result<Option<Gate>, AppError> {
        let gate: Option<Gate> = sqlx::query_as("SELECT * FROM gates WHERE id = $1")
            .bind(gate_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(gate)
    }

    async fn gate_for(
        &self,
        feature_id: i64,
        gate_type: GateType,
    ) -> Result<Option<Gate>, AppError> {
        let gate: Option<Gate> = sqlx::query_as(
            "SELECT * FROM gates WHERE feature_id = $1 AND gate_type = $2 ORDER BY id LIMIT 1",
        )
        .bind(feature_id)
        .bind(gate_type.to_string())
        .fetch_optional(&self.pool)
        .await?;
        Ok(gate)
    }

    async fn component_by_name(&self, name: &str) -> Result<Option<Component>, AppError> {
        let component: Option<Component> =
            sqlx::query_as("SELECT * FROM components WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;
        Ok(component)
    }

    async fn watcher_emails(&self) -> Result<Vec<String>, AppError> {
        let emails: Vec<String> = sqlx::query_scalar(
            "SELECT email FROM app_users WHERE watching_all_features ORDER BY email",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(emails)
    }

    async fn starrer_emails(&self, feature_id: i64) -> Result<Vec<String>, AppError> {
        let emails: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT u.email
            FROM feature_stars fs
            JOIN app_users u ON u.email = fs.email
            WHERE fs.feature_id = $1
              AND fs.starred
              AND u.notify_as_starrer
              AND NOT u.bounced
            ORDER BY u.email
            "#,
        )
        .bind(feature_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(emails)
    }

    async fn can_create_feature(&self, email: &str) -> Result<bool, AppError> {
        let registered: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM app_users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(registered)
    }

    async fn record_activity(
        &self,
        feature_id: i64,
        gate_id: Option<i64>,
        author: Option<&str>,
        content: &str,
        amendments: &[Amendment],
    ) -> Result<i64, AppError> {
        let amendments_json = serde_json::to_value(amendments)
            .map_err(|e| AppError::Internal(format!("Failed to serialize amendments: {e}")))?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO activities (feature_id, gate_id, author, content, amendments)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(feature_id)
        .bind(gate_id)
        .bind(author)
        .bind(content)
        .bind(&amendments_json)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(activity_id = id, feature_id, "Activity recorded");
        Ok(id)
    }
}
