use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{ListQuery, RecipeInput, RecipeListResponse, RecipeResponse};
use super::services;
use crate::{
    auth::{dto::MessageResponse, AuthUser},
    error::AppResult,
    state::AppState,
    validation::{ValidJson, ValidPath, ValidQuery},
};

pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route(
            "/recipes/:id",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
}

#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidQuery(query): ValidQuery<ListQuery>,
) -> AppResult<Json<RecipeListResponse>> {
    let params = query.params()?;
    let (data, pagination) = services::list_recipes(&state.db, user_id, &params).await?;
    Ok(Json(RecipeListResponse {
        success: true,
        data,
        pagination,
    }))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidPath(id): ValidPath<Uuid>,
) -> AppResult<Json<RecipeResponse>> {
    let data = services::get_recipe(&state.db, user_id, id).await?;
    Ok(Json(RecipeResponse { success: true, data }))
}

#[instrument(skip(state, payload))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidJson(payload): ValidJson<RecipeInput>,
) -> AppResult<(StatusCode, HeaderMap, Json<RecipeResponse>)> {
    let data = services::create_recipe(&state.db, user_id, &payload).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/recipes/{}", data.id)) {
        headers.insert(header::LOCATION, location);
    }
    Ok((
        StatusCode::CREATED,
        headers,
        Json(RecipeResponse { success: true, data }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(payload): ValidJson<RecipeInput>,
) -> AppResult<Json<RecipeResponse>> {
    let data = services::update_recipe(&state.db, user_id, id, &payload).await?;
    Ok(Json(RecipeResponse { success: true, data }))
}

#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidPath(id): ValidPath<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    services::delete_recipe(&state.db, user_id, id).await?;
    Ok(Json(MessageResponse::ok("Recipe deleted")))
}
