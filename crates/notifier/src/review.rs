//! Static review-gate metadata and intent-thread helpers.

use herald_common::types::{FeatureEntry, FeatureType, GateType, Stage};

/// Definition of one review gate kind: its intent phrase and the standing
/// review group that handles it when no reviewer is assigned.
#[derive(Debug, Clone, Copy)]
pub struct GateDef {
    pub gate_type: GateType,
    pub name: &'static str,
    pub approvers: &'static [&'static str],
}

pub const GATE_DEFS: &[GateDef] = &[
    GateDef {
        gate_type: GateType::Prototype,
        name: "Intent to Prototype",
        approvers: &["api-owners@herald.dev"],
    },
    GateDef {
        gate_type: GateType::OriginTrial,
        name: "Intent to Experiment",
        approvers: &["api-owners@herald.dev"],
    },
    GateDef {
        gate_type: GateType::ExtendOriginTrial,
        name: "Intent to Extend Experiment",
        approvers: &["api-owners@herald.dev"],
    },
    GateDef {
        gate_type: GateType::Ship,
        name: "Intent to Ship",
        approvers: &["api-owners@herald.dev"],
    },
    GateDef {
        gate_type: GateType::Privacy,
        name: "Privacy Review",
        approvers: &["privacy-review@herald.dev"],
    },
    GateDef {
        gate_type: GateType::Security,
        name: "Security Review",
        approvers: &["security-review@herald.dev"],
    },
];

pub fn gate_def(gate_type: GateType) -> &'static GateDef {
    // GATE_DEFS covers every GateType variant.
    GATE_DEFS
        .iter()
        .find(|d| d.gate_type == gate_type)
        .unwrap_or(&GATE_DEFS[0])
}

/// Standing approver addresses for a gate type.
pub fn get_approvers(gate_type: GateType) -> Vec<String> {
    gate_def(gate_type)
        .approvers
        .iter()
        .map(|a| a.to_string())
        .collect()
}

/// The expected intent-thread subject for a feature and gate type.
///
/// Deprecation features use their own intent phrases.
pub fn generate_thread_subject(fe: &FeatureEntry, gate_type: GateType) -> String {
    let mut intent_phrase = gate_def(gate_type).name;
    if fe.feature_type == FeatureType::Deprecation {
        intent_phrase = match gate_type {
            GateType::Prototype => "Intent to Deprecate and Remove",
            GateType::OriginTrial => "Request for Deprecation Trial",
            GateType::ExtendOriginTrial => "Intent to Extend Deprecation Trial",
            other => gate_def(other).name,
        };
    }

    format!("{}: {}", intent_phrase, fe.name)
}

pub const ARCHIVE_URL_PREFIX: &str =
    "https://groups.google.com/a/herald.dev/d/msgid/intents/";
pub const TEST_ARCHIVE_URL_PREFIX: &str = "https://groups.google.com/d/msgid/herald-test/";

/// If we have the URL of the mailing-list thread, extract its message id.
pub fn get_thread_id(stage: &Stage) -> Option<String> {
    let thread_url = stage.intent_thread_url.as_deref()?;

    // Chop off any anchor, then any query string params.
    let thread_url = thread_url.split('#').next().unwrap_or(thread_url);
    let thread_url = thread_url.split('?').next().unwrap_or(thread_url);
    // Convert %40 and friends back to their characters.
    let thread_url = urlencoding::decode(thread_url)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| thread_url.to_string());

    thread_url
        .strip_prefix(ARCHIVE_URL_PREFIX)
        .or_else(|| thread_url.strip_prefix(TEST_ARCHIVE_URL_PREFIX))
        .map(str::to_string)
}
