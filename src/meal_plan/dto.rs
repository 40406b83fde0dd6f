use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime};
use uuid::Uuid;

use super::repo::{Assignment, MealType};
use crate::dates::{iso_date, week_days};
use crate::validation::{parse_week_start, Validate, ValidationErrors};

#[derive(Debug, Default, Deserialize)]
pub struct WeekQuery {
    pub week_start_date: Option<String>,
}

impl WeekQuery {
    pub fn week_start(&self) -> Result<Date, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        match self.week_start_date.as_deref() {
            None | Some("") => errors.add("week_start_date", "This field is required"),
            Some(raw) => match parse_week_start(raw) {
                Ok(date) => return Ok(date),
                Err(msg) => errors.add("week_start_date", msg),
            },
        }
        Err(errors)
    }
}

pub fn check_day_of_week(errors: &mut ValidationErrors, field: &str, day: i16) {
    if !(1..=7).contains(&day) {
        errors.add(field, "Day of week must be between 1 (Monday) and 7 (Sunday)");
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAssignmentRequest {
    pub recipe_id: Option<Uuid>,
    #[serde(default)]
    pub week_start_date: String,
    pub day_of_week: Option<i16>,
    pub meal_type: Option<MealType>,
}

impl Validate for CreateAssignmentRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.recipe_id.is_none() {
            errors.add("recipe_id", "This field is required");
        }
        if self.week_start_date.trim().is_empty() {
            errors.add("week_start_date", "This field is required");
        } else if let Err(msg) = parse_week_start(&self.week_start_date) {
            errors.add("week_start_date", msg);
        }
        match self.day_of_week {
            None => errors.add("day_of_week", "This field is required"),
            Some(day) => check_day_of_week(&mut errors, "day_of_week", day),
        }
        if self.meal_type.is_none() {
            errors.add("meal_type", "This field is required");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssignmentView {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub recipe_name: String,
    #[serde(with = "iso_date")]
    pub week_start_date: Date,
    pub day_of_week: i16,
    pub meal_type: MealType,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Assignment> for AssignmentView {
    fn from(a: Assignment) -> Self {
        Self {
            id: a.id,
            recipe_id: a.recipe_id,
            recipe_name: a.recipe_name,
            week_start_date: a.week_start_date,
            day_of_week: a.day_of_week,
            meal_type: a.meal_type,
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MealSlot {
    pub meal_type: MealType,
    pub assignment: Option<AssignmentView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayPlan {
    pub day_of_week: i16,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub meals: Vec<MealSlot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeekPlan {
    #[serde(with = "iso_date")]
    pub week_start_date: Date,
    #[serde(with = "iso_date")]
    pub week_end_date: Date,
    pub days: Vec<DayPlan>,
}

impl WeekPlan {
    /// Seven days with all four slots each; empty slots carry `None`.
    pub fn build(monday: Date, assignments: Vec<Assignment>) -> Self {
        let mut views: Vec<AssignmentView> =
            assignments.into_iter().map(AssignmentView::from).collect();

        let days = week_days(monday)
            .map(|(day_of_week, date)| DayPlan {
                day_of_week,
                date,
                meals: MealType::all()
                    .map(|meal_type| {
                        let assignment = views
                            .iter()
                            .position(|a| a.day_of_week == day_of_week && a.meal_type == meal_type)
                            .map(|idx| views.swap_remove(idx));
                        MealSlot {
                            meal_type,
                            assignment,
                        }
                    })
                    .collect(),
            })
            .collect();

        Self {
            week_start_date: monday,
            week_end_date: monday + Duration::days(6),
            days,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WeekPlanResponse {
    pub success: bool,
    pub data: WeekPlan,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssignmentResponse {
    pub success: bool,
    pub data: AssignmentView,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    fn assignment(day: i16, meal_type: MealType) -> Assignment {
        Assignment {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            recipe_id: Uuid::new_v4(),
            recipe_name: format!("recipe {day}"),
            week_start_date: date!(2024 - 01 - 01),
            day_of_week: day,
            meal_type,
            created_at: datetime!(2024-01-01 10:00 UTC),
        }
    }

    #[test]
    fn week_plan_places_assignments_in_slots() {
        let plan = WeekPlan::build(
            date!(2024 - 01 - 01),
            vec![assignment(3, MealType::Lunch), assignment(7, MealType::Breakfast)],
        );
        assert_eq!(plan.week_end_date, date!(2024 - 01 - 07));
        assert_eq!(plan.days.len(), 7);
        assert!(plan.days.iter().all(|d| d.meals.len() == 4));

        let wednesday = &plan.days[2];
        assert_eq!(wednesday.date, date!(2024 - 01 - 03));
        assert_eq!(
            wednesday.meals[2].assignment.as_ref().unwrap().recipe_name,
            "recipe 3"
        );
        assert!(wednesday.meals[0].assignment.is_none());
        assert!(plan.days[6].meals[0].assignment.is_some());
    }

    #[test]
    fn week_query_rejects_tuesday() {
        let q = WeekQuery {
            week_start_date: Some("2024-01-02".into()),
        };
        let errors = q.week_start().unwrap_err();
        assert_eq!(
            errors.field("week_start_date").unwrap(),
            ["Week start date must be a Monday"]
        );
        assert!(WeekQuery::default().week_start().is_err());
    }

    #[test]
    fn create_request_validation() {
        let req: CreateAssignmentRequest = serde_json::from_str(
            r#"{"week_start_date":"2024-01-03","day_of_week":9,"meal_type":"dinner"}"#,
        )
        .unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field("recipe_id").is_some());
        assert!(errors.field("week_start_date").is_some());
        assert!(errors.field("day_of_week").is_some());
        assert!(errors.field("meal_type").is_none());
    }
}
