//! Static subscription rules.
//!
//! Each rule is an independent check against the feature's current attributes
//! and the changed-field names; rules are non-exclusive. Hard-coded for now,
//! eventually configurable through user preferences.

use herald_common::types::{FeatureCategory, FeatureEntry, FieldChange, MilestoneSet};

pub const WEBVIEW_RULE_REASON: &str =
    "This feature has an android milestone, but not a webview milestone";
pub const WEBVIEW_RULE_ADDRS: &[&str] = &["webview-leads@herald.dev"];

pub const IWA_RULE_REASON: &str = "You are subscribed to all IWA features";
pub const IWA_RULE_ADDRS: &[&str] = &["iwa-dev@herald.dev"];

/// Changed fields that make the webview rule relevant.
const WEBVIEW_MILESTONE_FIELDS: &[&str] = &["shipped_android_milestone"];

/// One matched rule: the reason text and the addresses subscribed to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub reason: &'static str,
    pub addresses: Vec<String>,
}

impl RuleMatch {
    fn new(reason: &'static str, addresses: &[&str]) -> Self {
        Self {
            reason,
            addresses: addresses.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Evaluate every rule against a feature snapshot and the changed fields.
///
/// `ship_milestones` is the first shipping stage's milestone set, supplied by
/// the caller so this stays a pure function of its inputs.
pub fn apply_subscription_rules(
    fe: &FeatureEntry,
    ship_milestones: Option<&MilestoneSet>,
    changes: &[FieldChange],
) -> Vec<RuleMatch> {
    let mut matches = Vec::new();

    // Rule 1: IWA features notify the IWA list regardless of what changed.
    if fe.category == FeatureCategory::Iwa {
        matches.push(RuleMatch::new(IWA_RULE_REASON, IWA_RULE_ADDRS));
    }

    // Rule 2: an android milestone without a webview milestone, when the
    // android milestone is among the changed fields.
    if let Some(ms) = ship_milestones
        && ms.android_first.is_some()
        && ms.webview_first.is_none()
    {
        let relevant = changes
            .iter()
            .any(|c| WEBVIEW_MILESTONE_FIELDS.contains(&c.prop_name.as_str()));
        if relevant {
            matches.push(RuleMatch::new(WEBVIEW_RULE_REASON, WEBVIEW_RULE_ADDRS));
        }
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use herald_common::types::{FeatureType, ImplStatus};

    fn make_feature(category: FeatureCategory) -> FeatureEntry {
        FeatureEntry {
            id: 1,
            name: "feature one".to_string(),
            summary: "sum".to_string(),
            category,
            feature_type: FeatureType::Incubation,
            impl_status: ImplStatus::InDevelopment,
            owner_emails: vec![],
            editor_emails: vec![],
            cc_emails: vec![],
            devrel_emails: vec![],
            components: vec![],
            doc_links: vec![],
            creator_email: None,
            updater_email: None,
            star_count: 0,
            deleted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn change(prop_name: &str) -> FieldChange {
        FieldChange {
            prop_name: prop_name.to_string(),
            old_val: None,
            new_val: None,
        }
    }

    #[test]
    fn test_iwa_category_always_matches() {
        let fe = make_feature(FeatureCategory::Iwa);
        let changes = vec![change("shipped_android_milestone")];

        let matches = apply_subscription_rules(&fe, None, &changes);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].reason, IWA_RULE_REASON);
        assert_eq!(matches[0].addresses, vec!["iwa-dev@herald.dev"]);
    }

    #[test]
    fn test_android_without_webview_matches_on_relevant_change() {
        let fe = make_feature(FeatureCategory::Misc);
        let ms = MilestoneSet {
            android_first: Some(88),
            ..Default::default()
        };
        let changes = vec![change("shipped_android_milestone")];

        let matches = apply_subscription_rules(&fe, Some(&ms), &changes);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].reason, WEBVIEW_RULE_REASON);
        assert_eq!(matches[0].addresses, vec!["webview-leads@herald.dev"]);
    }

    #[test]
    fn test_irrelevant_change_skips_webview_rule() {
        let fe = make_feature(FeatureCategory::Misc);
        let ms = MilestoneSet {
            android_first: Some(88),
            ..Default::default()
        };
        let changes = vec![change("some_other_field")];

        assert!(apply_subscription_rules(&fe, Some(&ms), &changes).is_empty());
    }

    #[test]
    fn test_no_milestones_no_match() {
        let fe = make_feature(FeatureCategory::Misc);
        let changes = vec![change("shipped_android_milestone")];

        assert!(apply_subscription_rules(&fe, None, &changes).is_empty());
        assert!(
            apply_subscription_rules(&fe, Some(&MilestoneSet::default()), &changes).is_empty()
        );
    }

    #[test]
    fn test_webview_already_set_no_match() {
        let fe = make_feature(FeatureCategory::Misc);
        let ms = MilestoneSet {
            android_first: Some(88),
            webview_first: Some(89),
            ..Default::default()
        };
        let changes = vec![change("shipped_android_milestone")];

        assert!(apply_subscription_rules(&fe, Some(&ms), &changes).is_empty());
    }

    #[test]
    fn test_rules_are_non_exclusive() {
        let fe = make_feature(FeatureCategory::Iwa);
        let ms = MilestoneSet {
            android_first: Some(90),
            ..Default::default()
        };
        let changes = vec![change("shipped_android_milestone")];

        let matches = apply_subscription_rules(&fe, Some(&ms), &changes);
        let reasons: Vec<&str> = matches.iter().map(|m| m.reason).collect();
        assert_eq!(reasons, vec![IWA_RULE_REASON, WEBVIEW_RULE_REASON]);
    }
}
