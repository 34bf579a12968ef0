pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod store;
mod views;

use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    handlers::bill_routes()
}
