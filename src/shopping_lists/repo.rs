use anyhow::Context;
use sqlx::{types::Json, FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::aggregate::ShoppingListItem;

#[derive(Debug, Clone, FromRow)]
pub struct RecipeIngredientRow {
    pub recipe_id: Uuid,
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ShoppingListRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub items: Json<Vec<ShoppingListItem>>,
    pub week_start_date: Option<Date>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct ShoppingListSummaryRow {
    pub id: Uuid,
    pub name: String,
    pub week_start_date: Option<Date>,
    pub items_count: i64,
    pub checked_count: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// `(id, name)` of the listed recipes that belong to `user_id`.
pub async fn owned_recipe_names(
    db: &PgPool,
    user_id: Uuid,
    recipe_ids: &[Uuid],
) -> anyhow::Result<Vec<(Uuid, String)>> {
    let rows = sqlx::query_as::<_, (Uuid, String)>(
        "SELECT id, name FROM recipes WHERE user_id = $1 AND id = ANY($2) ORDER BY id",
    )
    .bind(user_id)
    .bind(recipe_ids)
    .fetch_all(db)
    .await
    .context("load recipe names")?;
    Ok(rows)
}

/// Ingredients of the listed recipes, restricted to recipes owned by `user_id`.
pub async fn ingredients_for_recipes(
    db: &PgPool,
    user_id: Uuid,
    recipe_ids: &[Uuid],
) -> anyhow::Result<Vec<RecipeIngredientRow>> {
    let rows = sqlx::query_as::<_, RecipeIngredientRow>(
        r#"
        SELECT i.recipe_id, i.name, i.quantity, i.unit
          FROM ingredients i
          JOIN recipes r ON r.id = i.recipe_id
         WHERE r.user_id = $1 AND i.recipe_id = ANY($2)
         ORDER BY i.recipe_id, i.sort_order, i.id
        "#,
    )
    .bind(user_id)
    .bind(recipe_ids)
    .fetch_all(db)
    .await
    .context("load ingredients for preview")?;
    Ok(rows)
}

const LIST_COLUMNS: &str = "id, user_id, name, items, week_start_date, created_at, updated_at";

pub async fn insert(
    db: &PgPool,
    user_id: Uuid,
    name: &str,
    week_start_date: Option<Date>,
    items: &[ShoppingListItem],
) -> anyhow::Result<ShoppingListRow> {
    let sql = format!(
        "INSERT INTO shopping_lists (user_id, name, week_start_date, items) \
         VALUES ($1, $2, $3, $4) RETURNING {LIST_COLUMNS}"
    );
    let row = sqlx::query_as::<_, ShoppingListRow>(&sql)
        .bind(user_id)
        .bind(name)
        .bind(week_start_date)
        .bind(Json(items))
        .fetch_one(db)
        .await
        .context("insert shopping list")?;
    Ok(row)
}

/// Newest first, with item counts computed in the database.
pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<(Vec<ShoppingListSummaryRow>, i64)> {
    let rows = sqlx::query_as::<_, ShoppingListSummaryRow>(
        r#"
        SELECT s.id, s.name, s.week_start_date, s.created_at, s.updated_at,
               jsonb_array_length(s.items)::bigint AS items_count,
               (SELECT COUNT(*)
                  FROM jsonb_array_elements(s.items) e
                 WHERE (e->>'is_checked')::boolean) AS checked_count
          FROM shopping_lists s
         WHERE s.user_id = $1
         ORDER BY s.created_at DESC, s.id
         LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
    .context("list shopping lists")?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shopping_lists WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(db)
        .await
        .context("count shopping lists")?;

    Ok((rows, total))
}

pub async fn find(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<ShoppingListRow>> {
    let sql = format!("SELECT {LIST_COLUMNS} FROM shopping_lists WHERE id = $1 AND user_id = $2");
    let row = sqlx::query_as::<_, ShoppingListRow>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
        .context("find shopping list")?;
    Ok(row)
}

/// Sets `is_checked` on the item at `index`; `None` when the list or the index does not exist.
pub async fn set_item_checked(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
    index: i32,
    is_checked: bool,
) -> anyhow::Result<Option<ShoppingListRow>> {
    let sql = format!(
        r#"
        UPDATE shopping_lists
           SET items = jsonb_set(items, ARRAY[$3::int::text, 'is_checked'], to_jsonb($4::boolean)),
               updated_at = now()
         WHERE id = $1 AND user_id = $2 AND $3::int < jsonb_array_length(items)
        RETURNING {LIST_COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, ShoppingListRow>(&sql)
        .bind(id)
        .bind(user_id)
        .bind(index)
        .bind(is_checked)
        .fetch_optional(db)
        .await
        .context("update shopping list item")?;
    Ok(row)
}

pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM shopping_lists WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await
        .context("delete shopping list")?;
    Ok(res.rows_affected() == 1)
}
