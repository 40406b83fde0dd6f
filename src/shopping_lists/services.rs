use std::collections::{BTreeSet, HashMap, HashSet};

use sqlx::PgPool;
use time::Date;
use tracing::{debug, info};
use uuid::Uuid;

use super::aggregate::{aggregate, group_by_category, IngredientLine, ShoppingListItem};
use super::dto::{
    CreateShoppingListRequest, MealSelection, PreviewRequest, PreviewSource, ShoppingListPreview,
    ShoppingListSummary, ShoppingListView, SourceRecipe,
};
use super::repo::{self, RecipeIngredientRow};
use crate::error::{AppError, AppResult};
use crate::meal_plan::repo::{self as meal_plan_repo, Assignment};
use crate::pagination::Pagination;
use crate::validation::parse_week_start;

/// Recipes assigned to the selected slots, counted once per assignment.
pub fn count_selected(assignments: &[Assignment], selections: &[MealSelection]) -> Vec<SourceRecipe> {
    let selected: HashSet<_> = selections
        .iter()
        .map(|s| (s.day_of_week, s.meal_type))
        .collect();

    let mut counts: HashMap<Uuid, SourceRecipe> = HashMap::new();
    for a in assignments
        .iter()
        .filter(|a| selected.contains(&(a.day_of_week, a.meal_type)))
    {
        counts
            .entry(a.recipe_id)
            .or_insert_with(|| SourceRecipe {
                id: a.recipe_id,
                name: a.recipe_name.clone(),
                count: 0,
            })
            .count += 1;
    }

    let mut recipes: Vec<_> = counts.into_values().collect();
    recipes.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    recipes
}

/// Every ingredient row repeated as many times as its recipe was counted.
pub fn expand_lines(recipes: &[SourceRecipe], rows: Vec<RecipeIngredientRow>) -> Vec<IngredientLine> {
    let counts: HashMap<Uuid, u32> = recipes.iter().map(|r| (r.id, r.count)).collect();
    rows.into_iter()
        .flat_map(|row| {
            let n = counts.get(&row.recipe_id).copied().unwrap_or(0) as usize;
            std::iter::repeat(IngredientLine {
                name: row.name,
                quantity: row.quantity,
                unit: row.unit,
            })
            .take(n)
        })
        .collect()
}

pub fn build_preview(
    source: PreviewSource,
    week_start_date: Option<Date>,
    recipes: Vec<SourceRecipe>,
    rows: Vec<RecipeIngredientRow>,
) -> ShoppingListPreview {
    let items = aggregate(expand_lines(&recipes, rows));
    let categories = group_by_category(&items);
    ShoppingListPreview {
        source,
        week_start_date,
        recipes,
        items,
        categories,
    }
}

pub async fn preview(
    db: &PgPool,
    user_id: Uuid,
    request: &PreviewRequest,
) -> AppResult<ShoppingListPreview> {
    match request {
        PreviewRequest::Calendar {
            week_start_date,
            selections,
        } => {
            let monday = parse_week_start(week_start_date)
                .map_err(|msg| AppError::BadRequest(msg.to_string()))?;
            let assignments = meal_plan_repo::list_week(db, user_id, monday).await?;
            let recipes = count_selected(&assignments, selections);
            let ids: Vec<Uuid> = recipes.iter().map(|r| r.id).collect();
            let rows = if ids.is_empty() {
                Vec::new()
            } else {
                repo::ingredients_for_recipes(db, user_id, &ids).await?
            };
            debug!(recipes = recipes.len(), rows = rows.len(), "calendar preview");
            Ok(build_preview(PreviewSource::Calendar, Some(monday), recipes, rows))
        }
        PreviewRequest::Recipes { recipe_ids } => {
            let ids: Vec<Uuid> = recipe_ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
            let names = repo::owned_recipe_names(db, user_id, &ids).await?;
            if names.len() != ids.len() {
                return Err(AppError::NotFound("Recipe"));
            }
            let mut recipes: Vec<SourceRecipe> = names
                .into_iter()
                .map(|(id, name)| SourceRecipe { id, name, count: 1 })
                .collect();
            recipes.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
            let rows = repo::ingredients_for_recipes(db, user_id, &ids).await?;
            debug!(recipes = recipes.len(), rows = rows.len(), "recipe preview");
            Ok(build_preview(PreviewSource::Recipes, None, recipes, rows))
        }
    }
}

fn clean_item(item: &ShoppingListItem) -> ShoppingListItem {
    ShoppingListItem {
        name: item.name.trim().to_string(),
        quantity: item.quantity,
        unit: item
            .unit
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string),
        category: item.category,
        is_checked: item.is_checked,
    }
}

pub async fn create_list(
    db: &PgPool,
    user_id: Uuid,
    request: &CreateShoppingListRequest,
) -> anyhow::Result<ShoppingListView> {
    let items: Vec<ShoppingListItem> = request.items.iter().map(clean_item).collect();
    let row = repo::insert(
        db,
        user_id,
        request.name.trim(),
        request.week_start(),
        &items,
    )
    .await?;
    info!(list_id = %row.id, items = items.len(), "shopping list saved");
    Ok(row.into())
}

pub async fn list_lists(
    db: &PgPool,
    user_id: Uuid,
    page: i64,
    limit: i64,
    offset: i64,
) -> anyhow::Result<(Vec<ShoppingListSummary>, Pagination)> {
    let (rows, total) = repo::list_by_user(db, user_id, limit, offset).await?;
    Ok((
        rows.into_iter().map(ShoppingListSummary::from).collect(),
        Pagination::new(page, limit, total),
    ))
}

pub async fn get_list(db: &PgPool, user_id: Uuid, id: Uuid) -> AppResult<ShoppingListView> {
    let row = repo::find(db, user_id, id)
        .await?
        .ok_or(AppError::NotFound("Shopping list"))?;
    Ok(row.into())
}

pub async fn set_item_checked(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
    index: usize,
    is_checked: bool,
) -> AppResult<ShoppingListView> {
    let list = get_list(db, user_id, id).await?;
    let index = i32::try_from(index)
        .ok()
        .filter(|i| (*i as usize) < list.items.len())
        .ok_or(AppError::NotFound("Shopping list item"))?;

    let row = repo::set_item_checked(db, user_id, id, index, is_checked)
        .await?
        .ok_or(AppError::NotFound("Shopping list item"))?;
    debug!(list_id = %id, index, is_checked, "shopping list item toggled");
    Ok(row.into())
}

pub async fn delete_list(db: &PgPool, user_id: Uuid, id: Uuid) -> AppResult<()> {
    if !repo::delete(db, user_id, id).await? {
        return Err(AppError::NotFound("Shopping list"));
    }
    info!(list_id = %id, "shopping list deleted");
    Ok(())
}
