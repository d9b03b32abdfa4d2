//! Guards for internal-only endpoints.
//!
//! The task-queue broker and the cron scheduler set these headers on the
//! requests they originate, and the edge proxy strips them from anything
//! arriving from outside. Header presence therefore proves the request came
//! from our own infrastructure.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use herald_common::error::AppError;

use crate::state::AppState;

/// Header set by the task-queue broker on task POSTs.
pub const TASK_QUEUE_HEADER: &str = "x-taskqueue-name";

/// Header set by the cron scheduler.
pub const CRON_HEADER: &str = "x-herald-cron";

/// Extractor that rejects task requests not originating from the task queue.
#[derive(Debug, Clone, Copy)]
pub struct TaskRequest;

impl FromRequestParts<AppState> for TaskRequest {
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let present = parts.headers.contains_key(TASK_QUEUE_HEADER);
        async move {
            if present {
                Ok(TaskRequest)
            } else {
                Err(AppError::Forbidden(
                    "Lacking task header. This handler only accepts requests from the task queue"
                        .to_string(),
                ))
            }
        }
    }
}

/// Extractor that rejects cron requests not originating from the scheduler.
#[derive(Debug, Clone, Copy)]
pub struct CronRequest;

impl FromRequestParts<AppState> for CronRequest {
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let present = parts.headers.contains_key(CRON_HEADER);
        async move {
            if present {
                Ok(CronRequest)
            } else {
                Err(AppError::Forbidden(
                    "Lacking cron header. This handler only accepts requests from the scheduler"
                        .to_string(),
                ))
            }
        }
    }
}
