//! Storage interface consumed by the notifier core.

use async_trait::async_trait;

use herald_common::error::AppError;
use herald_common::types::{Amendment, Component, FeatureEntry, Gate, GateType, Stage};

/// Everything the notification builders need from storage.
///
/// Kept narrow on purpose: recipient computation itself is pure, and this
/// trait only covers the entity fetches feeding it. Tests implement it with
/// in-memory fixtures.
#[async_trait]
pub trait NotifierStore: Send + Sync {
    /// Fetch a feature entry by id. `None` when it does not exist or was
    /// soft-deleted.
    async fn feature_by_id(&self, feature_id: i64) -> Result<Option<FeatureEntry>, AppError>;

    /// Shipping stages of a feature, oldest first.
    async fn ship_stages(&self, feature_id: i64) -> Result<Vec<Stage>, AppError>;

    async fn stage_by_id(&self, stage_id: i64) -> Result<Option<Stage>, AppError>;

    async fn gate_by_id(&self, gate_id: i64) -> Result<Option<Gate>, AppError>;

    /// The gate of the given type on a feature, if one has been opened.
    async fn gate_for(&self, feature_id: i64, gate_type: GateType)
    -> Result<Option<Gate>, AppError>;

    async fn component_by_name(&self, name: &str) -> Result<Option<Component>, AppError>;

    /// Emails of users watching all feature changes.
    async fn watcher_emails(&self) -> Result<Vec<String>, AppError>;

    /// Emails of users who starred the feature and still want star
    /// notifications (opted in, not bounced).
    async fn starrer_emails(&self, feature_id: i64) -> Result<Vec<String>, AppError>;

    /// Whether this address belongs to a registered user allowed to create
    /// feature entries. Controls whether reply-to is exposed to them.
    async fn can_create_feature(&self, email: &str) -> Result<bool, AppError>;

    /// Persist a change-log row; returns the new activity id.
    async fn record_activity(
        &self,
        feature_id: i64,
        gate_id: Option<i64>,
        author: Option<&str>,
        content: &str,
        amendments: &[Amendment],
    ) -> Result<i64, AppError>;
}
