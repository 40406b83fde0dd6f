use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{
    AssignmentResponse, AssignmentView, CreateAssignmentRequest, WeekPlan, WeekPlanResponse,
    WeekQuery,
};
use super::repo::{self, InsertOutcome};
use crate::{
    auth::{dto::MessageResponse, AuthUser},
    error::{AppError, AppResult},
    state::AppState,
    validation::{parse_week_start, ValidJson, ValidPath, ValidQuery},
};

pub fn meal_plan_routes() -> Router<AppState> {
    Router::new()
        .route("/meal-plan", get(get_week).post(create_assignment))
        .route("/meal-plan/:id", delete(delete_assignment))
}

#[instrument(skip(state))]
pub async fn get_week(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidQuery(query): ValidQuery<WeekQuery>,
) -> AppResult<Json<WeekPlanResponse>> {
    let monday = query.week_start()?;
    let assignments = repo::list_week(&state.db, user_id, monday).await?;
    Ok(Json(WeekPlanResponse {
        success: true,
        data: WeekPlan::build(monday, assignments),
    }))
}

#[instrument(skip(state, payload))]
pub async fn create_assignment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidJson(payload): ValidJson<CreateAssignmentRequest>,
) -> AppResult<(StatusCode, Json<AssignmentResponse>)> {
    // Presence and ranges were checked by `ValidJson`.
    let (Some(recipe_id), Some(day_of_week), Some(meal_type), Ok(monday)) = (
        payload.recipe_id,
        payload.day_of_week,
        payload.meal_type,
        parse_week_start(&payload.week_start_date),
    ) else {
        return Err(AppError::BadRequest("Incomplete meal plan entry".into()));
    };

    match repo::insert(&state.db, user_id, recipe_id, monday, day_of_week, meal_type).await? {
        InsertOutcome::Created(a) => {
            info!(assignment_id = %a.id, %recipe_id, "meal assigned");
            Ok((
                StatusCode::CREATED,
                Json(AssignmentResponse {
                    success: true,
                    data: AssignmentView::from(a),
                }),
            ))
        }
        InsertOutcome::RecipeNotFound => Err(AppError::NotFound("Recipe")),
        InsertOutcome::SlotTaken => Err(AppError::Conflict(
            "This meal slot already has a recipe assigned".into(),
        )),
    }
}

#[instrument(skip(state))]
pub async fn delete_assignment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidPath(id): ValidPath<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    if !repo::delete(&state.db, user_id, id).await? {
        return Err(AppError::NotFound("Meal plan entry"));
    }
    Ok(Json(MessageResponse::ok("Meal removed from the plan")))
}
