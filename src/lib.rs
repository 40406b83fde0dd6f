pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod dates;
pub mod error;
pub mod meal_plan;
pub mod pagination;
pub mod recipes;
pub mod shopping_lists;
pub mod state;
pub mod validation;
