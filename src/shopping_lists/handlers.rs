use anyhow::Context;
use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{
    CreateShoppingListRequest, PageQuery, PreviewRequest, PreviewResponse, ShoppingListResponse,
    ShoppingListsResponse, UpdateItemRequest,
};
use super::export::{self, document_lines, pdf, text};
use super::services;
use crate::{
    auth::{dto::MessageResponse, AuthUser},
    error::{AppError, AppResult},
    state::AppState,
    validation::{ValidJson, ValidPath, ValidQuery},
};

pub fn shopping_list_routes() -> Router<AppState> {
    Router::new()
        .route("/shopping-lists", get(list_lists).post(create_list))
        .route("/shopping-lists/preview", post(preview))
        .route("/shopping-lists/:id", get(get_list).delete(delete_list))
        .route("/shopping-lists/:id/items/:index", patch(update_item))
        .route("/shopping-lists/:id/export/pdf", get(export_pdf))
        .route("/shopping-lists/:id/export/text", get(export_text))
}

#[instrument(skip(state, payload))]
pub async fn preview(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidJson(payload): ValidJson<PreviewRequest>,
) -> AppResult<Json<PreviewResponse>> {
    let data = services::preview(&state.db, user_id, &payload).await?;
    info!(
        recipes = data.recipes.len(),
        items = data.items.len(),
        "shopping list preview built"
    );
    Ok(Json(PreviewResponse { success: true, data }))
}

#[instrument(skip(state, payload))]
pub async fn create_list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidJson(payload): ValidJson<CreateShoppingListRequest>,
) -> AppResult<(StatusCode, HeaderMap, Json<ShoppingListResponse>)> {
    let data = services::create_list(&state.db, user_id, &payload).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/shopping-lists/{}", data.id)) {
        headers.insert(header::LOCATION, location);
    }
    Ok((
        StatusCode::CREATED,
        headers,
        Json(ShoppingListResponse { success: true, data }),
    ))
}

#[instrument(skip(state))]
pub async fn list_lists(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidQuery(query): ValidQuery<PageQuery>,
) -> AppResult<Json<ShoppingListsResponse>> {
    let (page, limit, offset) = query.params()?;
    let (data, pagination) = services::list_lists(&state.db, user_id, page, limit, offset).await?;
    Ok(Json(ShoppingListsResponse {
        success: true,
        data,
        pagination,
    }))
}

#[instrument(skip(state))]
pub async fn get_list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidPath(id): ValidPath<Uuid>,
) -> AppResult<Json<ShoppingListResponse>> {
    let data = services::get_list(&state.db, user_id, id).await?;
    Ok(Json(ShoppingListResponse { success: true, data }))
}

#[instrument(skip(state, payload))]
pub async fn update_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidPath((id, index)): ValidPath<(Uuid, usize)>,
    ValidJson(payload): ValidJson<UpdateItemRequest>,
) -> AppResult<Json<ShoppingListResponse>> {
    let is_checked = payload
        .is_checked
        .ok_or_else(|| AppError::BadRequest("is_checked is required".into()))?;
    let data = services::set_item_checked(&state.db, user_id, id, index, is_checked).await?;
    Ok(Json(ShoppingListResponse { success: true, data }))
}

#[instrument(skip(state))]
pub async fn delete_list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidPath(id): ValidPath<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    services::delete_list(&state.db, user_id, id).await?;
    Ok(Json(MessageResponse::ok("Shopping list deleted")))
}

fn download_headers(content_type: &'static str, file_name: &str) -> AppResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\""))
        .context("content-disposition header")?;
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    Ok(headers)
}

#[instrument(skip(state))]
pub async fn export_pdf(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidPath(id): ValidPath<Uuid>,
) -> AppResult<(HeaderMap, Vec<u8>)> {
    let list = services::get_list(&state.db, user_id, id).await?;
    let headers = download_headers("application/pdf", &export::file_name(&list.name, "pdf"))?;

    let lines = document_lines(&list);
    let title = list.name;
    let bytes = tokio::task::spawn_blocking(move || pdf::render(&title, &lines))
        .await
        .context("pdf render task")??;

    info!(list_id = %id, bytes = bytes.len(), "shopping list exported as pdf");
    Ok((headers, bytes))
}

#[instrument(skip(state))]
pub async fn export_text(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidPath(id): ValidPath<Uuid>,
) -> AppResult<(HeaderMap, String)> {
    let list = services::get_list(&state.db, user_id, id).await?;
    let headers = download_headers("text/plain; charset=utf-8", &export::file_name(&list.name, "txt"))?;
    Ok((headers, text::render(&document_lines(&list))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::JwtKeys;
    use axum::{
        body::{to_bytes, Body},
        extract::FromRef,
        http::Request,
    };
    use tower::ServiceExt;

    fn bearer(state: &AppState) -> String {
        let token = JwtKeys::from_ref(state).sign_access(Uuid::new_v4()).unwrap();
        format!("Bearer {token}")
    }

    async fn post_json(uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let state = AppState::fake();
        let req = Request::post(uri)
            .header(header::AUTHORIZATION, bearer(&state))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let res = shopping_list_routes().with_state(state).oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    #[tokio::test]
    async fn calendar_preview_rejects_non_monday() {
        let (status, body) = post_json(
            "/shopping-lists/preview",
            serde_json::json!({
                "source": "calendar",
                "week_start_date": "2024-01-02",
                "selections": [{"day_of_week": 1, "meal_type": "lunch"}]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["details"]["week_start_date"][0],
            "Week start date must be a Monday"
        );
    }

    #[tokio::test]
    async fn recipe_preview_needs_at_least_one_id() {
        let (status, body) = post_json(
            "/shopping-lists/preview",
            serde_json::json!({"source": "recipes", "recipe_ids": []}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"]["recipe_ids"].is_array());
    }

    #[tokio::test]
    async fn malformed_item_index_is_a_json_bad_request() {
        let state = AppState::fake();
        let uri = format!("/shopping-lists/{}/items/-1", Uuid::new_v4());
        let req = Request::patch(uri)
            .header(header::AUTHORIZATION, bearer(&state))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"is_checked":true}"#))
            .unwrap();
        let res = shopping_list_routes().with_state(state).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn unknown_preview_source_is_a_bad_request() {
        let (status, body) = post_json(
            "/shopping-lists/preview",
            serde_json::json!({"source": "fridge"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn saving_an_empty_list_is_rejected() {
        let (status, body) = post_json(
            "/shopping-lists",
            serde_json::json!({"name": "Weekly", "items": []}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["items"][0], "Add at least one item");
    }

    #[tokio::test]
    async fn export_requires_a_session() {
        let res = shopping_list_routes()
            .with_state(AppState::fake())
            .oneshot(
                Request::get(format!("/shopping-lists/{}/export/pdf", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
