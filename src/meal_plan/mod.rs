use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod repo;

pub use repo::MealType;

pub fn router() -> Router<AppState> {
    handlers::meal_plan_routes()
}
