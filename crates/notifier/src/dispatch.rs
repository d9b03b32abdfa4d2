//! Inbound-event dispatch.
//!
//! The rest of the application calls these helpers when something
//! notification-worthy happens. Each one records a change-log activity where
//! appropriate and enqueues a JSON task onto the external task-queue broker,
//! which later POSTs it back to the handlers in `herald-api`.

use serde_json::json;

use herald_common::error::AppError;
use herald_common::types::{Amendment, FeatureEntry, FieldChange, Gate, Stage, VoteState};
use herald_store::NotifierStore;

pub const EMAIL_SUBSCRIBERS_TASK: &str = "/tasks/email-subscribers";
pub const EMAIL_REVIEWERS_TASK: &str = "/tasks/email-reviewers";
pub const EMAIL_ASSIGNED_TASK: &str = "/tasks/email-assigned";
pub const EMAIL_COMMENTS_TASK: &str = "/tasks/email-comments";
pub const EMAIL_OT_CREATION_REQUEST_TASK: &str = "/tasks/email-ot-creation-request";
pub const EMAIL_OT_EXTENSION_REQUEST_TASK: &str = "/tasks/email-ot-extension-request";
pub const EMAIL_INTENT_COMMENT_TASK: &str = "/tasks/email-intent-comment";

/// Client for the external task-queue broker.
#[derive(Clone)]
pub struct TaskDispatcher {
    http: reqwest::Client,
    base_url: String,
}

impl TaskDispatcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &herald_common::config::AppConfig) -> Self {
        Self::new(config.taskqueue_url.clone())
    }

    /// Enqueue a task that the broker will POST back to `path`.
    pub async fn enqueue(&self, path: &str, payload: serde_json::Value) -> Result<(), AppError> {
        let url = format!("{}/enqueue", self.base_url.trim_end_matches('/'));
        let body = json!({ "path": path, "payload": payload });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Queue(format!("Failed to reach task queue: {e}")))?;
        response
            .error_for_status()
            .map_err(|e| AppError::Queue(format!("Task queue rejected task: {e}")))?;

        tracing::info!(path, "Task enqueued");
        Ok(())
    }
}

/// One field-level diff as observed by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedField {
    pub field: String,
    pub old: Option<String>,
    pub new: Option<String>,
}

fn is_falsey(value: &Option<String>) -> bool {
    match value {
        None => true,
        Some(s) => s.is_empty(),
    }
}

/// Convert observed field diffs to amendments worth recording.
///
/// Unchanged values are dropped, as are fields going from null to another
/// empty value.
pub fn changes_as_amendments(changed_fields: &[ChangedField]) -> Vec<Amendment> {
    changed_fields
        .iter()
        .filter(|c| c.new != c.old)
        .filter(|c| !(c.old.is_none() && is_falsey(&c.new)))
        .map(|c| Amendment {
            field_name: c.field.clone(),
            old_value: c.old.clone().unwrap_or_else(|| "None".to_string()),
            new_value: c.new.clone().unwrap_or_else(|| "None".to_string()),
        })
        .collect()
}

fn amendments_to_field_changes(amendments: &[Amendment]) -> Vec<FieldChange> {
    amendments
        .iter()
        .map(|a| FieldChange {
            prop_name: a.field_name.clone(),
            old_val: Some(a.old_value.clone()),
            new_val: Some(a.new_value.clone()),
        })
        .collect()
}

/// Record amendments on the feature's change log and notify subscribers.
pub async fn notify_subscribers_and_save_amendments<S: NotifierStore>(
    store: &S,
    dispatcher: &TaskDispatcher,
    fe: &FeatureEntry,
    changed_fields: &[ChangedField],
    author: Option<&str>,
    notify: bool,
    is_update: bool,
) -> Result<(), AppError> {
    let amendments = changes_as_amendments(changed_fields);

    if !amendments.is_empty() {
        store
            .record_activity(fe.id, None, author, "", &amendments)
            .await?;
    }

    if notify {
        let params = json!({
            "changes": amendments_to_field_changes(&amendments),
            "is_update": is_update,
            "feature": fe,
        });
        dispatcher.enqueue(EMAIL_SUBSCRIBERS_TASK, params).await?;
    }
    Ok(())
}

/// Notify approvers that a review was requested on a gate.
pub async fn notify_approvers_of_reviews<S: NotifierStore>(
    store: &S,
    dispatcher: &TaskDispatcher,
    fe: &FeatureEntry,
    gate: &Gate,
    new_state: VoteState,
    email: &str,
    site_url: &str,
) -> Result<(), AppError> {
    let amendment = Amendment {
        field_name: "review_status".to_string(),
        old_value: "None".to_string(),
        new_value: new_state.label().to_string(),
    };
    store
        .record_activity(fe.id, Some(gate.id), Some(email), "", &[amendment])
        .await?;

    let gate_url = format!("{site_url}feature/{}?gate={}", gate.feature_id, gate.id);
    let params = json!({
        "changes": [FieldChange {
            prop_name: format!("Review status change in {gate_url}"),
            old_val: Some("na".to_string()),
            new_val: Some(new_state.label().to_string()),
        }],
        "gate_type": gate.gate_type,
        "feature": fe,
    });
    dispatcher.enqueue(EMAIL_REVIEWERS_TASK, params).await
}

/// Notify subscribers of a vote change and save the amendment.
pub async fn notify_subscribers_of_vote_changes<S: NotifierStore>(
    store: &S,
    dispatcher: &TaskDispatcher,
    fe: &FeatureEntry,
    gate: &Gate,
    email: &str,
    new_state: VoteState,
    old_state: VoteState,
    site_url: &str,
) -> Result<(), AppError> {
    let amendment = Amendment {
        field_name: "review_status".to_string(),
        old_value: old_state.label().to_string(),
        new_value: new_state.label().to_string(),
    };
    store
        .record_activity(fe.id, Some(gate.id), Some(email), "", &[amendment])
        .await?;

    let gate_url = format!("{site_url}feature/{}?gate={}", gate.feature_id, gate.id);
    let params = json!({
        "changes": [FieldChange {
            prop_name: format!("{email} set review status in {gate_url}"),
            old_val: Some(old_state.label().to_string()),
            new_val: Some(new_state.label().to_string()),
        }],
        // Subscribers are only notified on feature update.
        "is_update": true,
        "feature": fe,
    });
    dispatcher.enqueue(EMAIL_SUBSCRIBERS_TASK, params).await
}

/// Notify previous and newly assigned reviewers.
pub async fn notify_assignees(
    dispatcher: &TaskDispatcher,
    fe: &FeatureEntry,
    gate: &Gate,
    triggering_user_email: &str,
    old_assignees: &[String],
    new_assignees: &[String],
) -> Result<(), AppError> {
    let params = json!({
        "triggering_user_email": triggering_user_email,
        "old_assignees": old_assignees,
        "new_assignees": new_assignees,
        "gate_type": gate.gate_type,
        "feature": fe,
    });
    dispatcher.enqueue(EMAIL_ASSIGNED_TASK, params).await
}

/// Notify subscribers of a new review comment.
pub async fn notify_subscribers_of_new_comments(
    dispatcher: &TaskDispatcher,
    fe: &FeatureEntry,
    gate: &Gate,
    email: &str,
    comment: &str,
    site_url: &str,
) -> Result<(), AppError> {
    let gate_url = format!("{site_url}feature/{}?gate={}", fe.id, gate.id);
    let params = json!({
        "changes": [FieldChange {
            prop_name: format!("{email} posted a new comment in {gate_url}"),
            old_val: Some("na".to_string()),
            new_val: Some(comment.to_string()),
        }],
        "gate_type": gate.gate_type,
        "feature": fe,
    });
    dispatcher.enqueue(EMAIL_COMMENTS_TASK, params).await
}

/// Ask the notifier to post a review comment to the intent thread.
pub async fn notify_intent_thread_of_comment(
    dispatcher: &TaskDispatcher,
    fe: &FeatureEntry,
    gate_id: i64,
    author_addr: &str,
    comment: &str,
) -> Result<(), AppError> {
    let params = json!({
        "feature": fe,
        "gate_id": gate_id,
        "author_addr": author_addr,
        "comment": comment,
    });
    dispatcher.enqueue(EMAIL_INTENT_COMMENT_TASK, params).await
}

/// Route an origin-trial stage to the right support notification.
///
/// Extension stages also carry the original trial stage so the notification
/// can name the trial being extended.
pub async fn send_ot_notification<S: NotifierStore>(
    store: &S,
    dispatcher: &TaskDispatcher,
    stage: &Stage,
) -> Result<(), AppError> {
    let stage_json = serde_json::to_value(stage)
        .map_err(|e| AppError::Internal(format!("Failed to serialize stage: {e}")))?;

    if stage.stage_type.is_ot_extension() {
        let ot_stage_id = stage.ot_stage_id.ok_or_else(|| {
            AppError::Config(format!(
                "Extension stage {} has no origin-trial stage reference",
                stage.id
            ))
        })?;
        let ot_stage = store.stage_by_id(ot_stage_id).await?.ok_or_else(|| {
            AppError::Config(format!("Origin-trial stage {ot_stage_id} not found"))
        })?;
        let params = json!({
            "stage": stage_json,
            "ot_stage": ot_stage,
        });
        dispatcher
            .enqueue(EMAIL_OT_EXTENSION_REQUEST_TASK, params)
            .await
    } else {
        let params = json!({ "stage": stage_json });
        dispatcher
            .enqueue(EMAIL_OT_CREATION_REQUEST_TASK, params)
            .await
    }
}
