//! Inbound task-queue handlers.
//!
//! The task-queue broker POSTs JSON payloads describing notification events
//! here. Each handler reloads the feature from storage (never trusting a
//! possibly stale payload copy), builds the email tasks, and hands them to
//! the outbound queue. A feature that has vanished is logged and skipped.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use herald_common::error::AppError;
use herald_common::types::{FieldChange, GateType};
use herald_notifier::dispatch::{
    EMAIL_ASSIGNED_TASK, EMAIL_COMMENTS_TASK, EMAIL_INTENT_COMMENT_TASK,
    EMAIL_OT_CREATION_REQUEST_TASK, EMAIL_OT_EXTENSION_REQUEST_TASK, EMAIL_REVIEWERS_TASK,
    EMAIL_SUBSCRIBERS_TASK,
};
use herald_notifier::ot::{self, OtExtensionPayload, OtRequestPayload};
use herald_store::NotifierStore;

use crate::middleware::internal::TaskRequest;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(EMAIL_SUBSCRIBERS_TASK, post(email_subscribers))
        .route(EMAIL_REVIEWERS_TASK, post(email_reviewers))
        .route(EMAIL_ASSIGNED_TASK, post(email_assigned))
        .route(EMAIL_COMMENTS_TASK, post(email_comments))
        .route(EMAIL_OT_CREATION_REQUEST_TASK, post(email_ot_creation_request))
        .route(EMAIL_OT_EXTENSION_REQUEST_TASK, post(email_ot_extension_request))
        .route(EMAIL_INTENT_COMMENT_TASK, post(email_intent_comment))
}

/// Payloads carry the full serialized feature, but only the id is trusted;
/// the entity is reloaded from storage.
#[derive(Debug, Deserialize)]
struct FeatureParam {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct FeatureChangePayload {
    feature: FeatureParam,
    is_update: bool,
    #[serde(default)]
    changes: Vec<FieldChange>,
}

/// POST /tasks/email-subscribers — feature created or updated.
async fn email_subscribers(
    State(state): State<AppState>,
    _task: TaskRequest,
    Json(payload): Json<FeatureChangePayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!(
        feature_id = payload.feature.id,
        "Starting to notify subscribers for feature"
    );

    let fe = state.store.feature_by_id(payload.feature.id).await?;
    let Some(fe) = fe else {
        tracing::warn!(feature_id = payload.feature.id, "Feature not found; nothing to notify");
        return Ok(Json(json!({ "message": "Done" })));
    };

    // Only email subscribers if there were actual changes on an update.
    if !payload.is_update || !payload.changes.is_empty() {
        let tasks = state
            .composer
            .make_feature_changes_email(&fe, payload.is_update, &payload.changes)
            .await?;
        state.queue.send(&tasks).await?;
    }

    Ok(Json(json!({ "message": "Done" })))
}

#[derive(Debug, Deserialize)]
struct ReviewPayload {
    feature: FeatureParam,
    gate_type: GateType,
    #[serde(default)]
    changes: Vec<FieldChange>,
}

/// POST /tasks/email-reviewers — review requested on a gate.
async fn email_reviewers(
    State(state): State<AppState>,
    _task: TaskRequest,
    Json(payload): Json<ReviewPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!(
        feature_id = payload.feature.id,
        "Starting to notify reviewers for feature"
    );

    if let Some(fe) = state.store.feature_by_id(payload.feature.id).await? {
        let tasks = state
            .composer
            .make_review_requests_email(&fe, payload.gate_type, &payload.changes)
            .await?;
        state.queue.send(&tasks).await?;
    }

    Ok(Json(json!({ "message": "Done" })))
}

#[derive(Debug, Deserialize)]
struct AssignmentPayload {
    feature: FeatureParam,
    triggering_user_email: String,
    old_assignees: Vec<String>,
    new_assignees: Vec<String>,
}

/// POST /tasks/email-assigned — review assignment changed.
async fn email_assigned(
    State(state): State<AppState>,
    _task: TaskRequest,
    Json(payload): Json<AssignmentPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!(
        feature_id = payload.feature.id,
        "Starting to notify assignees for feature"
    );

    if let Some(fe) = state.store.feature_by_id(payload.feature.id).await? {
        let tasks = state
            .composer
            .make_review_assignment_email(
                &fe,
                &payload.triggering_user_email,
                &payload.old_assignees,
                &payload.new_assignees,
            )
            .await?;
        state.queue.send(&tasks).await?;
    }

    Ok(Json(json!({ "message": "Done" })))
}

/// POST /tasks/email-comments — new comments on a review gate.
async fn email_comments(
    State(state): State<AppState>,
    _task: TaskRequest,
    Json(payload): Json<ReviewPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!(
        feature_id = payload.feature.id,
        "Starting to notify of comments for feature"
    );

    if let Some(fe) = state.store.feature_by_id(payload.feature.id).await? {
        let tasks = state
            .composer
            .make_new_comments_email(&fe, payload.gate_type, &payload.changes)
            .await?;
        state.queue.send(&tasks).await?;
    }

    Ok(Json(json!({ "message": "Done" })))
}

#[derive(Debug, Deserialize)]
struct IntentCommentPayload {
    feature: FeatureParam,
    gate_id: i64,
    author_addr: String,
    comment: String,
}

/// POST /tasks/email-intent-comment — relay a review comment to the intent
/// thread on the mailing list.
///
/// Unlike the fan-out handlers, a dangling gate or stage reference here is a
/// configuration error and fails the request.
async fn email_intent_comment(
    State(state): State<AppState>,
    _task: TaskRequest,
    Json(payload): Json<IntentCommentPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!(
        feature_id = payload.feature.id,
        gate_id = payload.gate_id,
        "Posting review comment to the intent thread"
    );

    let fe = state
        .store
        .feature_by_id(payload.feature.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Feature {} not found", payload.feature.id)))?;

    let task = state
        .composer
        .post_comment_to_mailing_list(
            &fe,
            payload.gate_id,
            &payload.author_addr,
            &payload.comment,
            &state.config.review_comment_mailing_list,
        )
        .await?;
    state.queue.send(std::slice::from_ref(&task)).await?;

    Ok(Json(json!({ "message": "Done" })))
}

#[derive(Debug, Deserialize)]
struct OtCreationPayload {
    stage: OtRequestPayload,
}

/// POST /tasks/email-ot-creation-request — origin trial requested.
async fn email_ot_creation_request(
    State(state): State<AppState>,
    _task: TaskRequest,
    Json(payload): Json<OtCreationPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("Starting to notify about origin trial creation request");

    let task = ot::make_creation_request_email(&payload.stage, &state.config.site_url);
    state.queue.send(std::slice::from_ref(&task)).await?;

    Ok(Json(json!({ "message": "OK" })))
}

#[derive(Debug, Deserialize)]
struct OtExtensionTaskPayload {
    stage: OtExtensionPayload,
    ot_stage: OtRequestPayload,
}

/// POST /tasks/email-ot-extension-request — origin trial extension requested.
async fn email_ot_extension_request(
    State(state): State<AppState>,
    _task: TaskRequest,
    Json(payload): Json<OtExtensionTaskPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("Starting to notify about origin trial extension request");

    let task = ot::make_extension_request_email(
        &payload.stage,
        &payload.ot_stage,
        &state.config.site_url,
    );
    state.queue.send(std::slice::from_ref(&task)).await?;

    Ok(Json(json!({ "message": "OK" })))
}
