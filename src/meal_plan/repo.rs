use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use strum::{Display, EnumIter, IntoEnumIterator};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
    Display, EnumIter,
)]
#[sqlx(type_name = "meal_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MealType {
    Breakfast,
    SecondBreakfast,
    Lunch,
    Dinner,
}

impl MealType {
    pub fn all() -> impl Iterator<Item = Self> {
        <Self as IntoEnumIterator>::iter()
    }
}

/// Assignment joined with its recipe's name.
#[derive(Debug, Clone, FromRow)]
pub struct Assignment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub recipe_id: Uuid,
    pub recipe_name: String,
    pub week_start_date: Date,
    pub day_of_week: i16,
    pub meal_type: MealType,
    pub created_at: OffsetDateTime,
}

pub async fn list_week(
    db: &PgPool,
    user_id: Uuid,
    week_start_date: Date,
) -> anyhow::Result<Vec<Assignment>> {
    let rows = sqlx::query_as::<_, Assignment>(
        r#"
        SELECT m.id, m.user_id, m.recipe_id, r.name AS recipe_name,
               m.week_start_date, m.day_of_week, m.meal_type, m.created_at
          FROM meal_plan m
          JOIN recipes r ON r.id = m.recipe_id
         WHERE m.user_id = $1 AND m.week_start_date = $2
         ORDER BY m.day_of_week, m.meal_type
        "#,
    )
    .bind(user_id)
    .bind(week_start_date)
    .fetch_all(db)
    .await
    .context("list meal plan week")?;
    Ok(rows)
}

pub enum InsertOutcome {
    Created(Assignment),
    RecipeNotFound,
    SlotTaken,
}

/// Inserts an assignment for a recipe the user owns.
pub async fn insert(
    db: &PgPool,
    user_id: Uuid,
    recipe_id: Uuid,
    week_start_date: Date,
    day_of_week: i16,
    meal_type: MealType,
) -> anyhow::Result<InsertOutcome> {
    let res = sqlx::query_as::<_, Assignment>(
        r#"
        WITH inserted AS (
            INSERT INTO meal_plan (user_id, recipe_id, week_start_date, day_of_week, meal_type)
            SELECT $1, r.id, $3, $4, $5
              FROM recipes r
             WHERE r.id = $2 AND r.user_id = $1
            RETURNING id, user_id, recipe_id, week_start_date, day_of_week, meal_type, created_at
        )
        SELECT i.id, i.user_id, i.recipe_id, r.name AS recipe_name,
               i.week_start_date, i.day_of_week, i.meal_type, i.created_at
          FROM inserted i
          JOIN recipes r ON r.id = i.recipe_id
        "#,
    )
    .bind(user_id)
    .bind(recipe_id)
    .bind(week_start_date)
    .bind(day_of_week)
    .bind(meal_type)
    .fetch_optional(db)
    .await;

    match res {
        Ok(Some(a)) => Ok(InsertOutcome::Created(a)),
        Ok(None) => Ok(InsertOutcome::RecipeNotFound),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(InsertOutcome::SlotTaken),
        Err(e) => Err(e).context("insert meal plan assignment"),
    }
}

pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM meal_plan WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await
        .context("delete meal plan assignment")?;
    Ok(res.rows_affected() == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    async fn seed_user(db: &PgPool) -> Uuid {
        sqlx::query_scalar("INSERT INTO users (email, password_hash) VALUES ($1, 'x') RETURNING id")
            .bind(format!("{}@example.com", Uuid::new_v4()))
            .fetch_one(db)
            .await
            .unwrap()
    }

    async fn seed_recipe(db: &PgPool, user_id: Uuid, name: &str) -> Uuid {
        sqlx::query_scalar(
            "INSERT INTO recipes (user_id, name, instructions) VALUES ($1, $2, 'Cook it well.') RETURNING id",
        )
        .bind(user_id)
        .bind(name)
        .fetch_one(db)
        .await
        .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn occupied_slot_is_reported(db: PgPool) {
        let user = seed_user(&db).await;
        let soup = seed_recipe(&db, user, "Soup").await;
        let salad = seed_recipe(&db, user, "Salad").await;
        let monday = date!(2024 - 01 - 01);

        let first = insert(&db, user, soup, monday, 3, MealType::Lunch).await.unwrap();
        let InsertOutcome::Created(a) = first else {
            panic!("first assignment should be created");
        };
        assert_eq!(a.recipe_name, "Soup");

        let second = insert(&db, user, salad, monday, 3, MealType::Lunch).await.unwrap();
        assert!(matches!(second, InsertOutcome::SlotTaken));

        let week = list_week(&db, user, monday).await.unwrap();
        assert_eq!(week.len(), 1);
        assert_eq!(week[0].recipe_id, soup);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn foreign_recipe_is_not_found(db: PgPool) {
        let owner = seed_user(&db).await;
        let stranger = seed_user(&db).await;
        let soup = seed_recipe(&db, owner, "Soup").await;

        let res = insert(&db, stranger, soup, date!(2024 - 01 - 01), 1, MealType::Dinner)
            .await
            .unwrap();
        assert!(matches!(res, InsertOutcome::RecipeNotFound));
        assert!(list_week(&db, stranger, date!(2024 - 01 - 01)).await.unwrap().is_empty());
    }

    #[test]
    fn meal_types_in_day_order() {
        let all: Vec<_> = MealType::all().map(|m| m.to_string()).collect();
        assert_eq!(all, ["breakfast", "second_breakfast", "lunch", "dinner"]);
    }

    #[test]
    fn meal_type_json_names() {
        let m: MealType = serde_json::from_str("\"second_breakfast\"").unwrap();
        assert_eq!(m, MealType::SecondBreakfast);
        assert!(serde_json::from_str::<MealType>("\"supper\"").is_err());
    }
}
