//! Email-task builders, one per notification event kind.
//!
//! Each builder gathers the recipient categories for its event into a
//! [`ReasonTable`] and renders one task per unique recipient. Missing
//! referenced entities (a component that was deleted, say) are logged and
//! skipped, never fatal.

use std::collections::BTreeSet;

use herald_common::error::AppError;
use herald_common::types::{EmailTask, FeatureEntry, FieldChange, GateType};
use herald_store::NotifierStore;

use crate::agg::ReasonTable;
use crate::email::{self, BodyKind};
use crate::review;
use crate::rules;

/// Builds notification email tasks against an injected store.
#[derive(Clone)]
pub struct Composer<S> {
    store: S,
    site_url: String,
}

impl<S: NotifierStore> Composer<S> {
    pub fn new(store: S, site_url: impl Into<String>) -> Self {
        Self {
            store,
            site_url: site_url.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    /// People who are on the feature itself.
    fn add_core_receivers(fe: &FeatureEntry, table: &mut ReasonTable) {
        table.accumulate(&fe.owner_emails, "You are listed as an owner of this feature");
        table.accumulate(&fe.editor_emails, "You are listed as an editor of this feature");
        table.accumulate(&fe.cc_emails, "You are CC'd on this feature");
        table.accumulate(&fe.devrel_emails, "You are a devrel contact for this feature.");
    }

    /// People who will do the review: the gate's assignees when it has any,
    /// otherwise the standing approvers for the gate type.
    async fn add_reviewers(
        &self,
        fe: &FeatureEntry,
        gate_type: GateType,
        table: &mut ReasonTable,
    ) -> Result<(), AppError> {
        let gate = self.store.gate_for(fe.id, gate_type).await?;
        match gate {
            Some(gate) if !gate.assignee_emails.is_empty() => {
                table.accumulate(&gate.assignee_emails, "This review is assigned to you");
            }
            _ => {
                table.accumulate(
                    &review::get_approvers(gate_type),
                    "You are a reviewer for this type of gate",
                );
            }
        }
        Ok(())
    }

    /// Render the table into tasks, resolving reply permission per recipient.
    async fn render(
        &self,
        table: ReasonTable,
        email_html: &str,
        subject: &str,
        triggering_user_email: Option<&str>,
    ) -> Result<Vec<EmailTask>, AppError> {
        let mut may_reply = BTreeSet::new();
        for addr in table.addresses() {
            if self.store.can_create_feature(addr).await? {
                may_reply.insert(addr.to_string());
            }
        }
        Ok(table.into_tasks(email_html, subject, triggering_user_email, &may_reply, &self.site_url))
    }

    /// Tasks notifying everyone interested in a created or updated feature.
    pub async fn make_feature_changes_email(
        &self,
        fe: &FeatureEntry,
        is_update: bool,
        changes: &[FieldChange],
    ) -> Result<Vec<EmailTask>, AppError> {
        let (subject, triggering_user_email, kind) = if is_update {
            (
                format!("updated feature: {}", fe.name),
                fe.updater_email.clone(),
                BodyKind::UpdatedFeature,
            )
        } else {
            (
                format!("new feature: {}", fe.name),
                fe.creator_email.clone(),
                BodyKind::NewFeature,
            )
        };

        let ship_stages = self.store.ship_stages(fe.id).await?;
        let email_html =
            email::format_email_body(kind, fe, &ship_stages, changes, None, &self.site_url);

        let mut table = ReasonTable::new();
        Self::add_core_receivers(fe, &mut table);

        let watchers = self.store.watcher_emails().await?;
        table.accumulate(&watchers, "You are watching all feature changes");

        // There will usually be at least one component.
        for component_name in &fe.components {
            let Some(component) = self.store.component_by_name(component_name).await? else {
                tracing::warn!(
                    component = %component_name,
                    "Component not found. Not sending email to subscribers"
                );
                continue;
            };
            table.accumulate(
                &component.owner_emails,
                "You are an owner of this feature's component",
            );
            table.accumulate(
                &component.subscriber_emails,
                "You subscribe to this feature's component",
            );
        }

        let starrers = self.store.starrer_emails(fe.id).await?;
        table.accumulate(&starrers, "You starred this feature");

        let ship_milestones = ship_stages.first().map(|s| s.milestones());
        for rule in rules::apply_subscription_rules(fe, ship_milestones.as_ref(), changes) {
            table.accumulate(&rule.addresses, rule.reason);
        }

        self.render(table, &email_html, &subject, triggering_user_email.as_deref())
            .await
    }

    /// Tasks notifying approvers that a review has been requested.
    pub async fn make_review_requests_email(
        &self,
        fe: &FeatureEntry,
        gate_type: GateType,
        changes: &[FieldChange],
    ) -> Result<Vec<EmailTask>, AppError> {
        let ship_stages = self.store.ship_stages(fe.id).await?;
        let email_html = email::format_email_body(
            BodyKind::UpdatedFeature,
            fe,
            &ship_stages,
            changes,
            None,
            &self.site_url,
        );

        let subject = format!("Review Request for feature: {}", fe.name);

        let mut table = ReasonTable::new();
        self.add_reviewers(fe, gate_type, &mut table).await?;

        self.render(table, &email_html, &subject, fe.updater_email.as_deref())
            .await
    }

    /// Tasks notifying previous and new assignees of a review assignment.
    pub async fn make_review_assignment_email(
        &self,
        fe: &FeatureEntry,
        triggering_user_email: &str,
        old_assignees: &[String],
        new_assignees: &[String],
    ) -> Result<Vec<EmailTask>, AppError> {
        let join = |addrs: &[String]| {
            if addrs.is_empty() {
                "None".to_string()
            } else {
                addrs.join(", ")
            }
        };
        let change = FieldChange {
            prop_name: "Assigned reviewer".to_string(),
            old_val: Some(join(old_assignees)),
            new_val: Some(join(new_assignees)),
        };

        let ship_stages = self.store.ship_stages(fe.id).await?;
        let email_html = email::format_email_body(
            BodyKind::UpdatedFeature,
            fe,
            &ship_stages,
            std::slice::from_ref(&change),
            Some(triggering_user_email),
            &self.site_url,
        );

        let subject = format!("Review assigned for feature: {}", fe.name);

        let mut table = ReasonTable::new();
        table.accumulate(old_assignees, "The review was previously assigned to you");
        table.accumulate(new_assignees, "The review is now assigned to you");

        self.render(table, &email_html, &subject, Some(triggering_user_email))
            .await
    }

    /// Tasks notifying the feature's people and its reviewers of new comments.
    pub async fn make_new_comments_email(
        &self,
        fe: &FeatureEntry,
        gate_type: GateType,
        changes: &[FieldChange],
    ) -> Result<Vec<EmailTask>, AppError> {
        let ship_stages = self.store.ship_stages(fe.id).await?;
        let email_html = email::format_email_body(
            BodyKind::UpdatedFeature,
            fe,
            &ship_stages,
            changes,
            None,
            &self.site_url,
        );

        let subject = format!("New comments for feature: {}", fe.name);

        let mut table = ReasonTable::new();
        Self::add_core_receivers(fe, &mut table);
        self.add_reviewers(fe, gate_type, &mut table).await?;

        self.render(table, &email_html, &subject, fe.updater_email.as_deref())
            .await
    }

    /// Post a review comment to the intent mailing-list thread.
    ///
    /// Every gate must have a matching stage; a dangling reference here is a
    /// configuration error, not a skippable condition.
    pub async fn post_comment_to_mailing_list(
        &self,
        fe: &FeatureEntry,
        gate_id: i64,
        author_addr: &str,
        comment_content: &str,
        mailing_list: &str,
    ) -> Result<EmailTask, AppError> {
        let gate = self
            .store
            .gate_by_id(gate_id)
            .await?
            .ok_or_else(|| AppError::Config(format!("No gate found for id {gate_id}")))?;
        let stage = self
            .store
            .stage_by_id(gate.stage_id)
            .await?
            .ok_or_else(|| {
                AppError::Config("No matching stage entity found for given gate id".to_string())
            })?;

        let mut subject = stage
            .intent_subject_line
            .clone()
            .unwrap_or_else(|| review::generate_thread_subject(fe, gate.gate_type));
        if !subject.starts_with("Re: ") {
            subject = format!("Re: {subject}");
        }

        let references = review::get_thread_id(&stage).map(|id| format!("<{id}>"));
        let html = format!("<p>{}</p>", email::escape_html(comment_content));
        let from_user = author_addr
            .split('@')
            .next()
            .unwrap_or(author_addr)
            .to_string();

        let mut task = EmailTask::new(mailing_list.to_string(), subject, None, html);
        task.from_user = Some(from_user);
        task.references = references;
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_common::types::{Component, MilestoneSet};

    use crate::testutil::{MemStore, make_feature, make_gate, make_stage};

    const SITE: &str = "https://herald.example.com/";

    fn store_with_everything() -> MemStore {
        let mut store = MemStore {
            features: vec![make_feature(1)],
            watchers: vec!["watcher_1@example.com".to_string()],
            components: vec![Component {
                name: "Layout".to_string(),
                owner_emails: vec!["component_owner@example.com".to_string()],
                subscriber_emails: vec!["component_sub@example.com".to_string()],
            }],
            ..Default::default()
        };
        store
            .starrers
            .insert(1, vec!["starrer@example.com".to_string()]);
        store.creators.insert("feature_owner@example.com".to_string());
        store
    }

    #[tokio::test]
    async fn test_feature_changes_email_new() {
        let store = store_with_everything();
        let composer = Composer::new(store, SITE);
        let fe = make_feature(1);

        let tasks = composer
            .make_feature_changes_email(&fe, false, &[])
            .await
            .unwrap();

        let addrs: Vec<&str> = tasks.iter().map(|t| t.to.as_str()).collect();
        assert!(addrs.contains(&"feature_owner@example.com"));
        assert!(addrs.contains(&"feature_editor@example.com"));
        assert!(addrs.contains(&"cc@example.com"));
        assert!(addrs.contains(&"devrel@example.com"));
        assert!(addrs.contains(&"watcher_1@example.com"));
        assert!(addrs.contains(&"component_owner@example.com"));
        assert!(addrs.contains(&"component_sub@example.com"));
        assert!(addrs.contains(&"starrer@example.com"));

        for task in &tasks {
            assert_eq!(task.subject, "new feature: feature one");
            assert!(task.html.contains("You are receiving this email because"));
        }

        // Addresses are sorted for deterministic output.
        let mut sorted = addrs.clone();
        sorted.sort();
        assert_eq!(addrs, sorted);
    }

    #[tokio::test]
    async fn test_feature_changes_email_update_subject_and_reply() {
        let store = store_with_everything();
        let composer = Composer::new(store, SITE);
        let fe = make_feature(1);

        let tasks = composer
            .make_feature_changes_email(&fe, true, &[])
            .await
            .unwrap();

        let owner = tasks
            .iter()
            .find(|t| t.to == "feature_owner@example.com")
            .unwrap();
        assert_eq!(owner.subject, "updated feature: feature one");
        // Owner is a registered creator, so reply-to points at the updater.
        assert_eq!(owner.reply_to.as_deref(), Some("editor@example.com"));

        let watcher = tasks
            .iter()
            .find(|t| t.to == "watcher_1@example.com")
            .unwrap();
        assert_eq!(watcher.reply_to, None);
    }

    #[tokio::test]
    async fn test_feature_changes_email_missing_component_skipped() {
        let mut store = store_with_everything();
        store.components.clear();
        let composer = Composer::new(store, SITE);
        let fe = make_feature(1);

        let tasks = composer
            .make_feature_changes_email(&fe, false, &[])
            .await
            .unwrap();

        assert!(!tasks.iter().any(|t| t.to == "component_owner@example.com"));
        // Everyone else still gets mail.
        assert!(tasks.iter().any(|t| t.to == "feature_owner@example.com"));
    }

    #[tokio::test]
    async fn test_feature_changes_email_applies_rules() {
        let mut store = store_with_everything();
        store.stages.push(make_stage(
            10,
            1,
            MilestoneSet {
                android_first: Some(88),
                ..Default::default()
            },
        ));
        let composer = Composer::new(store, SITE);
        let fe = make_feature(1);
        let changes = vec![FieldChange {
            prop_name: "shipped_android_milestone".to_string(),
            old_val: None,
            new_val: Some("88".to_string()),
        }];

        let tasks = composer
            .make_feature_changes_email(&fe, true, &changes)
            .await
            .unwrap();

        let webview = tasks
            .iter()
            .find(|t| t.to == "webview-leads@herald.dev")
            .unwrap();
        assert!(webview.html.contains(crate::rules::WEBVIEW_RULE_REASON));
    }

    #[tokio::test]
    async fn test_feature_changes_email_idempotent() {
        let fe = make_feature(1);
        let changes: Vec<FieldChange> = vec![];

        let first = Composer::new(store_with_everything(), SITE)
            .make_feature_changes_email(&fe, true, &changes)
            .await
            .unwrap();
        let second = Composer::new(store_with_everything(), SITE)
            .make_feature_changes_email(&fe, true, &changes)
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_review_requests_email_unassigned_goes_to_approvers() {
        let store = store_with_everything();
        let composer = Composer::new(store, SITE);
        let fe = make_feature(1);

        let tasks = composer
            .make_review_requests_email(&fe, GateType::Ship, &[])
            .await
            .unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].to, "api-owners@herald.dev");
        assert_eq!(tasks[0].subject, "Review Request for feature: feature one");
        assert!(tasks[0].html.contains("You are a reviewer for this type of gate"));
    }

    #[tokio::test]
    async fn test_review_requests_email_assigned_goes_to_assignees() {
        let mut store = store_with_everything();
        let mut gate = make_gate(5, 1, 10, GateType::Ship);
        gate.assignee_emails = vec!["assignee@example.com".to_string()];
        store.gates.push(gate);
        let composer = Composer::new(store, SITE);
        let fe = make_feature(1);

        let tasks = composer
            .make_review_requests_email(&fe, GateType::Ship, &[])
            .await
            .unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].to, "assignee@example.com");
        assert!(tasks[0].html.contains("This review is assigned to you"));
    }

    #[tokio::test]
    async fn test_review_assignment_email() {
        let store = store_with_everything();
        let composer = Composer::new(store, SITE);
        let fe = make_feature(1);

        let tasks = composer
            .make_review_assignment_email(
                &fe,
                "assigner@example.com",
                &["old@example.com".to_string()],
                &["new@example.com".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(tasks.len(), 2);
        let old = tasks.iter().find(|t| t.to == "old@example.com").unwrap();
        assert!(old.html.contains("The review was previously assigned to you"));
        let new = tasks.iter().find(|t| t.to == "new@example.com").unwrap();
        assert!(new.html.contains("The review is now assigned to you"));
        assert_eq!(new.subject, "Review assigned for feature: feature one");
        assert!(new.html.contains("Assigned reviewer"));
    }

    #[tokio::test]
    async fn test_new_comments_email_includes_core_and_reviewers() {
        let store = store_with_everything();
        let composer = Composer::new(store, SITE);
        let fe = make_feature(1);

        let tasks = composer
            .make_new_comments_email(&fe, GateType::Privacy, &[])
            .await
            .unwrap();

        let addrs: Vec<&str> = tasks.iter().map(|t| t.to.as_str()).collect();
        assert!(addrs.contains(&"feature_owner@example.com"));
        assert!(addrs.contains(&"privacy-review@herald.dev"));
        assert_eq!(tasks[0].subject, "New comments for feature: feature one");
    }

    #[tokio::test]
    async fn test_post_comment_missing_stage_is_config_error() {
        let mut store = store_with_everything();
        // Gate points at a stage that does not exist.
        store.gates.push(make_gate(5, 1, 999, GateType::Ship));
        let composer = Composer::new(store, SITE);
        let fe = make_feature(1);

        let result = composer
            .post_comment_to_mailing_list(&fe, 5, "author@example.com", "lgtm", "intents@herald.dev")
            .await;
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_post_comment_builds_threaded_reply() {
        let mut store = store_with_everything();
        let mut stage = make_stage(10, 1, MilestoneSet::default());
        stage.intent_thread_url = Some(format!(
            "{}msg-id%40herald.dev",
            crate::review::ARCHIVE_URL_PREFIX
        ));
        stage.intent_subject_line = Some("Intent to Ship: feature one".to_string());
        store.stages.push(stage);
        store.gates.push(make_gate(5, 1, 10, GateType::Ship));
        let composer = Composer::new(store, SITE);
        let fe = make_feature(1);

        let task = composer
            .post_comment_to_mailing_list(
                &fe,
                5,
                "author@example.com",
                "<looks good>",
                "intents@herald.dev",
            )
            .await
            .unwrap();

        assert_eq!(task.to, "intents@herald.dev");
        assert_eq!(task.subject, "Re: Intent to Ship: feature one");
        assert_eq!(task.references.as_deref(), Some("<msg-id@herald.dev>"));
        assert_eq!(task.from_user.as_deref(), Some("author"));
        assert!(task.html.contains("&lt;looks good&gt;"));
    }

    #[tokio::test]
    async fn test_post_comment_generates_subject_when_stage_has_none() {
        let mut store = store_with_everything();
        store.stages.push(make_stage(10, 1, MilestoneSet::default()));
        store.gates.push(make_gate(5, 1, 10, GateType::Ship));
        let composer = Composer::new(store, SITE);
        let fe = make_feature(1);

        let task = composer
            .post_comment_to_mailing_list(&fe, 5, "author@example.com", "ok", "intents@herald.dev")
            .await
            .unwrap();
        assert_eq!(task.subject, "Re: Intent to Ship: feature one");
        assert_eq!(task.references, None);
    }
}
