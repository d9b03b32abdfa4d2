//! HTTP surface of the notification service.
//!
//! Inbound task-queue handlers (one per notification event kind), cron
//! handlers, and the small feature-star API. Each inbound task is handled
//! synchronously within its request: fetch the entities, build the email
//! tasks, hand them to the outbound queue.

pub mod middleware;
pub mod routes;
pub mod state;
