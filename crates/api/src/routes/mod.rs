pub mod cron;
pub mod health;
pub mod stars;
pub mod tasks;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(tasks::router())
        .merge(cron::router())
        .merge(stars::router())
        .with_state(state)
}
