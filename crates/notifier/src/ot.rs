//! Origin-trial request notifications.
//!
//! Creation and extension requests are routed to the trial support team with
//! the stage's details; the payloads arrive verbatim from the task queue.

use serde::{Deserialize, Serialize};

use herald_common::types::EmailTask;

pub const OT_SUPPORT_EMAIL: &str = "origin-trials-support@herald.dev";

/// Origin-trial stage fields as carried in task payloads.
///
/// Field names match the serialized [`herald_common::types::Stage`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtRequestPayload {
    pub feature_id: i64,
    #[serde(default)]
    pub ot_owner_email: Option<String>,
    #[serde(default)]
    pub ot_emails: Vec<String>,
    #[serde(default)]
    pub ot_display_name: Option<String>,
    #[serde(default)]
    pub ot_description: Option<String>,
    #[serde(default)]
    pub desktop_first: Option<i32>,
    #[serde(default)]
    pub desktop_last: Option<i32>,
    #[serde(default)]
    pub ot_trial_name: Option<String>,
    #[serde(default)]
    pub ot_webfeature_use_counter: Option<String>,
    #[serde(default)]
    pub ot_documentation_url: Option<String>,
    #[serde(default)]
    pub ot_feedback_submission_url: Option<String>,
    #[serde(default)]
    pub intent_thread_url: Option<String>,
    #[serde(default)]
    pub ot_request_note: Option<String>,
    #[serde(default)]
    pub ot_is_deprecation_trial: bool,
    #[serde(default)]
    pub ot_has_third_party_support: bool,
    #[serde(default)]
    pub ot_is_critical_trial: bool,
}

/// Extension-stage fields used when a trial extension is requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtExtensionPayload {
    #[serde(default)]
    pub ot_owner_email: Option<String>,
    #[serde(default)]
    pub intent_thread_url: Option<String>,
    #[serde(default)]
    pub desktop_last: Option<i32>,
    #[serde(default)]
    pub ot_request_note: Option<String>,
}

fn yes_or_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

fn or_none(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("None")
}

fn milestone_or_none(value: Option<i32>) -> String {
    value.map(|m| m.to_string()).unwrap_or_else(|| "None".to_string())
}

fn lines_to_body(lines: Vec<String>) -> String {
    format!("<p>\n{}\n</p>", lines.join("\n<br>\n"))
}

/// Email asking the support team to set up a newly requested trial.
pub fn make_creation_request_email(stage: &OtRequestPayload, site_url: &str) -> EmailTask {
    let display_name = or_none(&stage.ot_display_name).to_string();
    let dashboard_url = format!("{site_url}feature/{}", stage.feature_id);

    let lines = vec![
        format!("Requested by: {}", or_none(&stage.ot_owner_email)),
        format!(
            "Additional contacts for your team?: {}",
            stage.ot_emails.join(",")
        ),
        format!("Feature name: {display_name}"),
        format!("Feature description: {}", or_none(&stage.ot_description)),
        format!("Start milestone: {}", milestone_or_none(stage.desktop_first)),
        format!("End milestone: {}", milestone_or_none(stage.desktop_last)),
        format!("Trial name: {}", or_none(&stage.ot_trial_name)),
        format!(
            "Is this a deprecation trial?: {}",
            yes_or_no(stage.ot_is_deprecation_trial)
        ),
        format!(
            "Third party origin support: {}",
            yes_or_no(stage.ot_has_third_party_support)
        ),
        format!(
            "WebFeature UseCounter value: {}",
            or_none(&stage.ot_webfeature_use_counter)
        ),
        format!(
            "Documentation link: {}",
            or_none(&stage.ot_documentation_url)
        ),
        format!("Dashboard link: {dashboard_url}"),
        format!(
            "Feature feedback link: {}",
            or_none(&stage.ot_feedback_submission_url)
        ),
        format!(
            "Intent to Experiment link: {}",
            or_none(&stage.intent_thread_url)
        ),
        format!(
            "Is this a critical trial?: {}",
            yes_or_no(stage.ot_is_critical_trial)
        ),
        format!("Anything else?: {}", or_none(&stage.ot_request_note)),
        format!(
            "Instructions for handling this request can be found at: {site_url}docs/trial-admin"
        ),
    ];

    EmailTask::new(
        OT_SUPPORT_EMAIL.to_string(),
        format!("New Trial Creation Request for {display_name}"),
        None,
        lines_to_body(lines),
    )
}

/// Email asking the support team to extend an existing trial.
pub fn make_extension_request_email(
    extension_stage: &OtExtensionPayload,
    ot_stage: &OtRequestPayload,
    site_url: &str,
) -> EmailTask {
    let display_name = or_none(&ot_stage.ot_display_name).to_string();

    let lines = vec![
        format!("Requested by: {}", or_none(&extension_stage.ot_owner_email)),
        format!("Feature name: {display_name}"),
        format!(
            "Intent to Extend Experiment URL: {}",
            or_none(&extension_stage.intent_thread_url)
        ),
        format!(
            "New end milestone: {}",
            milestone_or_none(extension_stage.desktop_last)
        ),
        format!("Anything else?: {}", or_none(&extension_stage.ot_request_note)),
        format!(
            "Instructions for handling this request can be found at: {site_url}docs/trial-admin"
        ),
    ];

    EmailTask::new(
        OT_SUPPORT_EMAIL.to_string(),
        format!("New Trial Extension Request for {display_name}"),
        None,
        lines_to_body(lines),
    )
}
