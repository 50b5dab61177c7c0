pub mod dto;
pub mod error;
pub mod handlers;
pub mod lease;
pub mod parser;
pub mod prompt;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    handlers::routes(max_upload_bytes)
}
