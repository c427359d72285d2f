use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "Ann Carter",
        "position": "Accountant",
        "salary": 52000.0,
        "is_active": true,
        "hire_date": "2024-01-01",
        "last_activity_date": "2026-08-01T09:30:00",
        "department_id": 3
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Ann Carter")]
    pub name: String,

    #[schema(example = "Accountant", nullable = true)]
    pub position: Option<String>,

    #[schema(example = 52000.0)]
    pub salary: f64,

    #[schema(example = true)]
    pub is_active: bool,

    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub hire_date: NaiveDate,

    #[schema(example = "2026-08-01T09:30:00", value_type = String)]
    pub last_activity_date: NaiveDateTime,

    #[schema(example = 3)]
    pub department_id: u64,
}
