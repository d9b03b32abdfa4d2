use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Broad category assigned to a feature entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FeatureCategory {
    Misc,
    WebComponents,
    Css,
    Dom,
    JavaScript,
    Multimedia,
    Network,
    Performance,
    Security,
    Storage,
    Iwa,
}

/// How a feature entry is being developed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FeatureType {
    Incubation,
    Existing,
    CodeChange,
    Deprecation,
    Enterprise,
}

/// Implementation status shown in notification emails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ImplStatus {
    NoActiveDevelopment,
    Proposed,
    InDevelopment,
    BehindAFlag,
    OriginTrial,
    EnabledByDefault,
    Deprecated,
    Removed,
}

impl ImplStatus {
    /// Human-readable status string for email bodies.
    pub fn label(&self) -> &'static str {
        match self {
            ImplStatus::NoActiveDevelopment => "No active development",
            ImplStatus::Proposed => "Proposed",
            ImplStatus::InDevelopment => "In development",
            ImplStatus::BehindAFlag => "Behind a flag",
            ImplStatus::OriginTrial => "Origin trial",
            ImplStatus::EnabledByDefault => "Enabled by default",
            ImplStatus::Deprecated => "Deprecated",
            ImplStatus::Removed => "Removed",
        }
    }
}

/// Phase of a feature's rollout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StageType {
    Prototype,
    DevTrial,
    OriginTrial,
    OriginTrialExtension,
    Shipping,
}

impl StageType {
    pub fn is_ot_extension(&self) -> bool {
        matches!(self, StageType::OriginTrialExtension)
    }
}

impl std::fmt::Display for StageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageType::Prototype => write!(f, "prototype"),
            StageType::DevTrial => write!(f, "dev_trial"),
            StageType::OriginTrial => write!(f, "origin_trial"),
            StageType::OriginTrialExtension => write!(f, "origin_trial_extension"),
            StageType::Shipping => write!(f, "shipping"),
        }
    }
}

/// Review checkpoint kinds that a feature passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GateType {
    Prototype,
    OriginTrial,
    ExtendOriginTrial,
    Ship,
    Privacy,
    Security,
}

impl std::fmt::Display for GateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateType::Prototype => write!(f, "prototype"),
            GateType::OriginTrial => write!(f, "origin_trial"),
            GateType::ExtendOriginTrial => write!(f, "extend_origin_trial"),
            GateType::Ship => write!(f, "ship"),
            GateType::Privacy => write!(f, "privacy"),
            GateType::Security => write!(f, "security"),
        }
    }
}

/// Review vote state on a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VoteState {
    NoResponse,
    NaRequested,
    ReviewRequested,
    ReviewStarted,
    NeedsWork,
    InternalReview,
    Approved,
    Denied,
}

impl VoteState {
    /// Human-readable vote name used in change descriptions.
    pub fn label(&self) -> &'static str {
        match self {
            VoteState::NoResponse => "No response",
            VoteState::NaRequested => "N/A requested",
            VoteState::ReviewRequested => "Review requested",
            VoteState::ReviewStarted => "Review started",
            VoteState::NeedsWork => "Needs work",
            VoteState::InternalReview => "Internal review",
            VoteState::Approved => "Approved",
            VoteState::Denied => "Denied",
        }
    }
}

/// A tracked unit of product work with owners, editors, and reviewers.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FeatureEntry {
    pub id: i64,
    pub name: String,
    pub summary: String,
    pub category: FeatureCategory,
    pub feature_type: FeatureType,
    pub impl_status: ImplStatus,
    pub owner_emails: Vec<String>,
    pub editor_emails: Vec<String>,
    pub cc_emails: Vec<String>,
    pub devrel_emails: Vec<String>,
    pub components: Vec<String>,
    pub doc_links: Vec<String>,
    pub creator_email: Option<String>,
    pub updater_email: Option<String>,
    pub star_count: i32,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Milestone numbers attached to a stage. Absent fields mean "not planned".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneSet {
    pub desktop_first: Option<i32>,
    pub desktop_last: Option<i32>,
    pub android_first: Option<i32>,
    pub webview_first: Option<i32>,
}

/// A phase of a feature's rollout, carrying milestone and intent-thread data.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Stage {
    pub id: i64,
    pub feature_id: i64,
    pub stage_type: StageType,
    pub desktop_first: Option<i32>,
    pub desktop_last: Option<i32>,
    pub android_first: Option<i32>,
    pub webview_first: Option<i32>,
    pub intent_thread_url: Option<String>,
    pub intent_subject_line: Option<String>,
    /// For extension stages, the origin-trial stage being extended.
    pub ot_stage_id: Option<i64>,
    pub ot_display_name: Option<String>,
    pub ot_description: Option<String>,
    pub ot_owner_email: Option<String>,
    pub ot_emails: Vec<String>,
    pub ot_trial_name: Option<String>,
    pub ot_webfeature_use_counter: Option<String>,
    pub ot_documentation_url: Option<String>,
    pub ot_feedback_submission_url: Option<String>,
    pub ot_request_note: Option<String>,
    pub ot_is_deprecation_trial: bool,
    pub ot_has_third_party_support: bool,
    pub ot_is_critical_trial: bool,
    pub created_at: DateTime<Utc>,
}

impl Stage {
    pub fn milestones(&self) -> MilestoneSet {
        MilestoneSet {
            desktop_first: self.desktop_first,
            desktop_last: self.desktop_last,
            android_first: self.android_first,
            webview_first: self.webview_first,
        }
    }
}

/// A review checkpoint on a feature, with assignable reviewers and vote state.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Gate {
    pub id: i64,
    pub feature_id: i64,
    pub stage_id: i64,
    pub gate_type: GateType,
    pub state: VoteState,
    pub assignee_emails: Vec<String>,
    pub requested_on: Option<DateTime<Utc>>,
}

/// A registered user account with notification preferences.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AppUser {
    pub email: String,
    pub is_admin: bool,
    pub is_site_editor: bool,
    pub watching_all_features: bool,
    pub notify_as_starrer: bool,
    pub bounced: bool,
    pub notified_inactive: bool,
    pub last_visit: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
}

/// A product area that features belong to, with owners and subscribers.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Component {
    pub name: String,
    pub owner_emails: Vec<String>,
    pub subscriber_emails: Vec<String>,
}

/// One user's interest in one feature.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FeatureStar {
    pub email: String,
    pub feature_id: i64,
    pub starred: bool,
}

/// A change-log row recorded when a notification-worthy event happens.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Activity {
    pub id: i64,
    pub feature_id: i64,
    pub gate_id: Option<i64>,
    pub author: Option<String>,
    pub content: String,
    /// JSON array of [`Amendment`] values.
    pub amendments: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// A single field-level change recorded on an [`Activity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amendment {
    pub field_name: String,
    pub old_value: String,
    pub new_value: String,
}

/// One changed property as carried in inbound task payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub prop_name: String,
    #[serde(default)]
    pub old_val: Option<String>,
    #[serde(default)]
    pub new_val: Option<String>,
}

/// One outbound email, entirely derived and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTask {
    pub to: String,
    pub subject: String,
    pub reply_to: Option<String>,
    pub html: String,
    /// Display name for intent-thread posts; absent for notification mail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_user: Option<String>,
    /// `References` message-id header for threading intent replies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<String>,
}

impl EmailTask {
    pub fn new(to: String, subject: String, reply_to: Option<String>, html: String) -> Self {
        Self {
            to,
            subject,
            reply_to,
            html,
            from_user: None,
            references: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_type_display_round_trips_serde() {
        let g = GateType::ExtendOriginTrial;
        let json = serde_json::to_string(&g).unwrap();
        assert_eq!(json, format!("\"{}\"", g));
    }

    #[test]
    fn test_stage_milestones_projection() {
        let json = serde_json::json!({
            "id": 1, "feature_id": 2, "stage_type": "shipping",
            "desktop_first": 120, "desktop_last": null,
            "android_first": 121, "webview_first": null,
            "intent_thread_url": null, "intent_subject_line": null,
            "ot_stage_id": null, "ot_display_name": null, "ot_description": null,
            "ot_owner_email": null, "ot_emails": [], "ot_trial_name": null,
            "ot_webfeature_use_counter": null, "ot_documentation_url": null,
            "ot_feedback_submission_url": null, "ot_request_note": null,
            "ot_is_deprecation_trial": false, "ot_has_third_party_support": false,
            "ot_is_critical_trial": false,
            "created_at": "2025-01-01T00:00:00Z"
        });
        let stage: Stage = serde_json::from_value(json).unwrap();
        let ms = stage.milestones();
        assert_eq!(ms.desktop_first, Some(120));
        assert_eq!(ms.android_first, Some(121));
        assert_eq!(ms.webview_first, None);
    }

    #[test]
    fn test_field_change_defaults_absent_values() {
        let fc: FieldChange = serde_json::from_str(r#"{"prop_name": "summary"}"#).unwrap();
        assert_eq!(fc.old_val, None);
        assert_eq!(fc.new_val, None);
    }

    #[test]
    fn test_email_task_omits_thread_fields_when_absent() {
        let task = EmailTask::new(
            "user@example.com".to_string(),
            "subject".to_string(),
            None,
            "<p>hi</p>".to_string(),
        );
        let json = serde_json::to_value(&task).unwrap();
        assert!(json.get("from_user").is_none());
        assert!(json.get("references").is_none());
        assert!(json.get("reply_to").is_some());
    }
}
