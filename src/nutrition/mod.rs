pub mod aggregate;
pub mod error;
pub mod handlers;
pub mod inference;
pub mod mock;
pub mod prompt;
pub mod registry;
pub mod service;
pub mod types;
pub mod validate;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::scan_routes())
}
