//! Notification core.
//!
//! Given a changed feature entry and the event that changed it, compute the
//! set of interested recipients, the reason each is notified, and produce one
//! outbound email task per unique recipient:
//!
//! 1. Builders gather recipient addresses per category (owners, watchers,
//!    component subscribers, starrers, reviewers, rule matches) into a
//!    [`agg::ReasonTable`].
//! 2. The table renders one [`herald_common::types::EmailTask`] per address
//!    with a footer listing that recipient's deduplicated reasons.
//! 3. [`queue::EmailQueue`] either enqueues the tasks for the external
//!    delivery workers or logs them (dry run).
//!
//! Delivery retries and confirmations are the queue infrastructure's job, not
//! ours.

pub mod agg;
pub mod builders;
pub mod dispatch;
pub mod email;
pub mod inactive;
pub mod ot;
pub mod queue;
pub mod review;
pub mod rules;

#[cfg(test)]
pub(crate) mod testutil;
