//! Feature stars — one user's interest in one feature.

use sqlx::PgPool;

use herald_common::error::AppError;
use herald_common::types::{AppUser, FeatureStar};

/// Service layer for star operations.
pub struct StarService;

impl StarService {
    /// If that user starred that feature, return the row.
    pub async fn get_star(
        pool: &PgPool,
        email: &str,
        feature_id: i64,
    ) -> Result<Option<FeatureStar>, AppError> {
        let star: Option<FeatureStar> =
            sqlx::query_as("SELECT * FROM feature_stars WHERE email = $1 AND feature_id = $2")
                .bind(email)
                .bind(feature_id)
                .fetch_optional(pool)
                .await?;
        Ok(star)
    }

    /// Set or clear a star for the given user and feature, keeping the
    /// feature's star count in step.
    pub async fn set_star(
        pool: &PgPool,
        email: &str,
        feature_id: i64,
        starred: bool,
    ) -> Result<(), AppError> {
        let existing = Self::get_star(pool, email, feature_id).await?;

        match existing {
            None if starred => {
                sqlx::query(
                    "INSERT INTO feature_stars (email, feature_id, starred) VALUES ($1, $2, true)",
                )
                .bind(email)
                .bind(feature_id)
                .execute(pool)
                .await?;
            }
            Some(star) if star.starred != starred => {
                sqlx::query(
                    "UPDATE feature_stars SET starred = $1 WHERE email = $2 AND feature_id = $3",
                )
                .bind(starred)
                .bind(email)
                .bind(feature_id)
                .execute(pool)
                .await?;
            }
            // Nothing to update.
            _ => return Ok(()),
        }

        let delta: i32 = if starred { 1 } else { -1 };
        let current: Option<i32> =
            sqlx::query_scalar("SELECT star_count FROM features WHERE id = $1")
                .bind(feature_id)
                .fetch_optional(pool)
                .await?;

        let Some(current) = current else {
            tracing::warn!(feature_id, "Starred feature not found; count not updated");
            return Ok(());
        };
        if current + delta < 0 {
            tracing::error!(email, feature_id, starred, "Star count would drop below zero");
            return Ok(());
        }

        sqlx::query("UPDATE features SET star_count = star_count + $1 WHERE id = $2")
            .bind(delta)
            .bind(feature_id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Ids of all features the user has starred, newest first.
    pub async fn get_user_stars(pool: &PgPool, email: &str) -> Result<Vec<i64>, AppError> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT feature_id FROM feature_stars WHERE email = $1 AND starred ORDER BY feature_id DESC",
        )
        .bind(email)
        .fetch_all(pool)
        .await?;

        tracing::info!(count = ids.len(), email, "Found stars for user");
        Ok(ids)
    }

    /// Starrers of a feature that still want notifications.
    pub async fn get_feature_starrers(
        pool: &PgPool,
        feature_id: i64,
    ) -> Result<Vec<AppUser>, AppError> {
        let users: Vec<AppUser> = sqlx::query_as(
            r#"
            SELECT u.*
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
        .fetch_all(pool)
        .await?;

        tracing::info!(count = users.len(), feature_id, "Found starrers for feature");
        Ok(users)
    }
}
