//! Outbound email queue.
//!
//! Tasks are pushed onto a Redis list consumed by external delivery workers.
//! Retry, backoff, and delivery confirmation all live on that side of the
//! fence. With sending disabled the queue logs each task instead, which is
//! the default in development.

use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use herald_common::error::AppError;
use herald_common::types::EmailTask;
use herald_common::{MAX_LOG_LINE, log_prefix};

/// Queue entry envelope: the task plus a delivery id for worker-side tracing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedEmail {
    pub id: Uuid,
    pub enqueued_at: DateTime<Utc>,
    #[serde(flatten)]
    pub task: EmailTask,
}

/// Redis-backed outbound email queue.
#[derive(Clone)]
pub struct EmailQueue {
    redis: Option<ConnectionManager>,
    queue_key: String,
}

impl EmailQueue {
    /// A queue that actually enqueues for delivery.
    pub fn new(redis: ConnectionManager, queue_key: impl Into<String>) -> Self {
        Self {
            redis: Some(redis),
            queue_key: queue_key.into(),
        }
    }

    /// A queue that only logs what it would send.
    pub fn dry_run() -> Self {
        Self {
            redis: None,
            queue_key: String::new(),
        }
    }

    /// Process a list of email tasks (enqueue or log).
    ///
    /// Returns the number of tasks actually enqueued; zero in dry-run mode.
    pub async fn send(&self, tasks: &[EmailTask]) -> Result<usize, AppError> {
        tracing::info!(count = tasks.len(), "Processing email tasks");

        let Some(redis) = &self.redis else {
            for task in tasks {
                tracing::info!(
                    to = %task.to,
                    from_user = task.from_user.as_deref(),
                    references = task.references.as_deref(),
                    reply_to = task.reply_to.as_deref(),
                    subject = %task.subject,
                    body = log_prefix(&task.html, MAX_LOG_LINE),
                    "Would send the following email"
                );
            }
            return Ok(0);
        };

        let mut conn = redis.clone();
        let mut enqueued = 0;
        for task in tasks {
            let entry = QueuedEmail {
                id: Uuid::new_v4(),
                enqueued_at: Utc::now(),
                task: task.clone(),
            };
            let payload = serde_json::to_string(&entry)
                .map_err(|e| AppError::Internal(format!("Failed to serialize email task: {e}")))?;
            conn.lpush::<_, _, ()>(&self.queue_key, payload).await?;
            enqueued += 1;
        }

        tracing::info!(enqueued, queue = %self.queue_key, "Email tasks enqueued");
        Ok(enqueued)
    }
}
