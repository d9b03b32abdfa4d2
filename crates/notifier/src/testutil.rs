//! In-memory store fixture for notifier unit tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use herald_common::error::AppError;
use herald_common::types::{
    Amendment, Component, FeatureCategory, FeatureEntry, FeatureType, Gate, GateType, ImplStatus,
    MilestoneSet, Stage, StageType, VoteState,
};
use herald_store::NotifierStore;

#[derive(Default)]
pub struct MemStore {
    pub features: Vec<FeatureEntry>,
    pub stages: Vec<Stage>,
    pub gates: Vec<Gate>,
    pub components: Vec<Component>,
    pub watchers: Vec<String>,
    pub starrers: HashMap<i64, Vec<String>>,
    pub creators: BTreeSet<String>,
    pub activities: Mutex<Vec<(i64, Option<i64>, Vec<Amendment>)>>,
}

#[async_trait]
impl NotifierStore for MemStore {
    async fn feature_by_id(&self, feature_id: i64) -> Result<Option<FeatureEntry>, AppError> {
        Ok(self
            .features
            .iter()
            .find(|f| f.id == feature_id && !f.deleted)
            .cloned())
    }

    async fn ship_stages(&self, feature_id: i64) -> Result<Vec<Stage>, AppError> {
        Ok(self
            .stages
            .iter()
            .filter(|s| s.feature_id == feature_id && s.stage_type == StageType::Shipping)
            .cloned()
            .collect())
    }

    async fn stage_by_id(&self, stage_id: i64) -> Result<Option<Stage>, AppError> {
        Ok(self.stages.iter().find(|s| s.id == stage_id).cloned())
    }

    async fn gate_by_id(&self, gate_id: i64) -> Result<Option<Gate>, AppError> {
        Ok(self.gates.iter().find(|g| g.id == gate_id).cloned())
    }

    async fn gate_for(
        &self,
        feature_id: i64,
        gate_type: GateType,
    ) -> Result<Option<Gate>, AppError> {
        Ok(self
            .gates
            .iter()
            .find(|g| g.feature_id == feature_id && g.gate_type == gate_type)
            .cloned())
    }

    async fn component_by_name(&self, name: &str) -> Result<Option<Component>, AppError> {
        Ok(self.components.iter().find(|c| c.name == name).cloned())
    }

    async fn watcher_emails(&self) -> Result<Vec<String>, AppError> {
        Ok(self.watchers.clone())
    }

    async fn starrer_emails(&self, feature_id: i64) -> Result<Vec<String>, AppError> {
        Ok(self.starrers.get(&feature_id).cloned().unwrap_or_default())
    }

    async fn can_create_feature(&self, email: &str) -> Result<bool, AppError> {
        Ok(self.creators.contains(email))
    }

    async fn record_activity(
        &self,
        feature_id: i64,
        gate_id: Option<i64>,
        _author: Option<&str>,
        _content: &str,
        amendments: &[Amendment],
    ) -> Result<i64, AppError> {
        let mut activities = self
            .activities
            .lock()
            .map_err(|_| AppError::Internal("poisoned".to_string()))?;
        activities.push((feature_id, gate_id, amendments.to_vec()));
        Ok(activities.len() as i64)
    }
}

pub fn make_feature(id: i64) -> FeatureEntry {
    FeatureEntry {
        id,
        name: "feature one".to_string(),
        summary: "sum".to_string(),
        category: FeatureCategory::Misc,
        feature_type: FeatureType::Incubation,
        impl_status: ImplStatus::InDevelopment,
        owner_emails: vec!["feature_owner@example.com".to_string()],
        editor_emails: vec!["feature_editor@example.com".to_string()],
        cc_emails: vec!["cc@example.com".to_string()],
        devrel_emails: vec!["devrel@example.com".to_string()],
        components: vec!["Layout".to_string()],
        doc_links: vec![],
        creator_email: Some("creator@example.com".to_string()),
        updater_email: Some("editor@example.com".to_string()),
        star_count: 0,
        deleted: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn make_stage(id: i64, feature_id: i64, milestones: MilestoneSet) -> Stage {
    Stage {
        id,
        feature_id,
        stage_type: StageType::Shipping,
        desktop_first: milestones.desktop_first,
        desktop_last: milestones.desktop_last,
        android_first: milestones.android_first,
        webview_first: milestones.webview_first,
        intent_thread_url: None,
        intent_subject_line: None,
        ot_stage_id: None,
        ot_display_name: None,
        ot_description: None,
        ot_owner_email: None,
        ot_emails: vec![],
        ot_trial_name: None,
        ot_webfeature_use_counter: None,
        ot_documentation_url: None,
        ot_feedback_submission_url: None,
        ot_request_note: None,
        ot_is_deprecation_trial: false,
        ot_has_third_party_support: false,
        ot_is_critical_trial: false,
        created_at: Utc::now(),
    }
}

pub fn make_gate(id: i64, feature_id: i64, stage_id: i64, gate_type: GateType) -> Gate {
    Gate {
        id,
        feature_id,
        stage_id,
        gate_type,
        state: VoteState::NoResponse,
        assignee_emails: vec![],
        requested_on: None,
    }
}
