use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod store;

pub use store::{normalize_name, NameStore};

pub fn router() -> Router<AppState> {
    handlers::identity_routes()
}
