use crate::state::AppState;
use axum::Router;

pub mod aggregate;
pub mod categories;
pub mod dto;
pub mod export;
pub mod handlers;
pub mod repo;
pub mod services;

pub use aggregate::{CategoryGroup, ShoppingListItem};
pub use categories::Category;

pub fn router() -> Router<AppState> {
    handlers::shopping_list_routes()
}
