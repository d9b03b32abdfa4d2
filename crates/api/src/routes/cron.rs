//! Cron handlers.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::json;

use herald_common::error::AppError;
use herald_notifier::inactive;

use crate::middleware::internal::CronRequest;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/cron/notify-inactive-users", get(notify_inactive_users))
}

/// GET /cron/notify-inactive-users — warn users idle for six months.
async fn notify_inactive_users(
    State(state): State<AppState>,
    _cron: CronRequest,
) -> Result<Json<serde_json::Value>, AppError> {
    let users = state.store.users().await?;
    let to_notify = inactive::determine_users_to_notify(&users, Utc::now());

    let mut email_tasks = Vec::with_capacity(to_notify.len());
    for email in &to_notify {
        state.store.mark_notified_inactive(email).await?;
        email_tasks.push(inactive::build_inactive_email(email, &state.config.site_url));
    }
    state.queue.send(&email_tasks).await?;

    let mut message_parts = vec![
        format!("{} users notified of inactivity.", email_tasks.len()),
        "Notified users:".to_string(),
    ];
    message_parts.extend(to_notify.iter().cloned());
    let message = message_parts.join("\n");
    tracing::info!(notified = email_tasks.len(), "Inactive-user sweep finished");

    Ok(Json(json!({ "message": message })))
}
