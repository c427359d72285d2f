use crate::{
    auth::auth::AuthUser,
    error::ApiError,
    model::employee::Employee,
    utils::db_utils::{SqlValue, build_update_sql, execute_update},
};
use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "Ann Carter")]
    pub name: String,

    #[schema(example = "Accountant", nullable = true)]
    pub position: Option<String>,

    #[schema(example = 52000.0)]
    pub salary: Option<f64>,

    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub hire_date: Option<NaiveDate>,

    #[schema(example = 3)]
    pub department_id: u64,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateEmployee {
    pub name: Option<String>,
    pub position: Option<String>,
    pub salary: Option<f64>,
    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub hire_date: Option<NaiveDate>,
    pub department_id: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EmployeeQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Pass `expand=department` to join the department name onto each row.
    pub expand: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

#[derive(Serialize, sqlx::FromRow, ToSchema)]
pub struct EmployeeExpanded {
    pub id: u64,
    pub name: String,
    pub position: Option<String>,
    pub salary: f64,
    pub is_active: bool,
    #[schema(value_type = String, format = "date")]
    pub hire_date: NaiveDate,
    #[schema(value_type = String)]
    pub last_activity_date: NaiveDateTime,
    pub department_id: u64,
    #[schema(example = "Engineering")]
    pub department_name: String,
}

#[derive(Serialize, ToSchema)]
pub struct ExpandedListResponse {
    pub data: Vec<EmployeeExpanded>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateSalary {
    #[schema(example = 55000.0)]
    pub salary: f64,
}

#[derive(Deserialize, ToSchema)]
pub struct TransferDepartment {
    #[schema(example = 4)]
    pub department_id: u64,
}

#[derive(Debug, PartialEq, Serialize, ToSchema)]
pub struct Tenure {
    #[schema(example = 2)]
    pub years: i32,
    #[schema(example = 3)]
    pub months: u32,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct SearchQuery {
    #[param(example = "Ann")]
    pub name: String,
}

/// Whole years plus remainder months between hire date and today, with the
/// month difference normalized into [0, 11]. Day-of-month is ignored.
pub fn tenure_between(hire_date: NaiveDate, today: NaiveDate) -> Tenure {
    let mut years = today.year() - hire_date.year();
    let mut months = today.month() as i32 - hire_date.month() as i32;

    if months < 0 {
        years -= 1;
        months += 12;
    }

    Tenure {
        years,
        months: months as u32,
    }
}

async fn department_exists(pool: &MySqlPool, department_id: u64) -> Result<bool, ApiError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM departments WHERE id = ? LIMIT 1)",
    )
    .bind(department_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

async fn fetch_employee(pool: &MySqlPool, id: u64) -> Result<Employee, ApiError> {
    sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Validation failure"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Employee",
    security(("basic_auth" = []))
)]
pub async fn create_employee(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> Result<impl Responder, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("Employee name must not be empty"));
    }

    if let Some(salary) = payload.salary {
        if salary < 0.0 {
            return Err(ApiError::validation("Salary must not be negative"));
        }
    }

    if !department_exists(pool.get_ref(), payload.department_id).await? {
        return Err(ApiError::validation(format!(
            "Department {} does not exist",
            payload.department_id
        )));
    }

    let hire_date = payload
        .hire_date
        .unwrap_or_else(|| Utc::now().date_naive());

    let result = sqlx::query(
        r#"
        INSERT INTO employees
        (name, position, salary, is_active, hire_date, last_activity_date, department_id)
        VALUES (?, ?, ?, TRUE, ?, NOW(), ?)
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.position)
    .bind(payload.salary.unwrap_or(0.0))
    .bind(hire_date)
    .bind(payload.department_id)
    .execute(pool.get_ref())
    .await?;

    let created = fetch_employee(pool.get_ref(), result.last_insert_id()).await?;

    Ok(HttpResponse::Created().json(created))
}

/// List Employees
#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Employee",
    security(("basic_auth" = []))
)]
pub async fn list_employees(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> Result<impl Responder, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees")
        .fetch_one(pool.get_ref())
        .await?;

    debug!(page, per_page, total, expand = ?query.expand, "Fetching employees");

    if query.expand.as_deref() == Some("department") {
        let data = sqlx::query_as::<_, EmployeeExpanded>(
            r#"
            SELECT e.id, e.name, e.position, e.salary, e.is_active,
                   e.hire_date, e.last_activity_date, e.department_id,
                   d.name AS department_name
            FROM employees e
            JOIN departments d ON d.id = e.department_id
            ORDER BY e.id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await?;

        return Ok(HttpResponse::Ok().json(ExpandedListResponse {
            data,
            page,
            per_page,
            total,
        }));
    }

    let data = sqlx::query_as::<_, Employee>(
        "SELECT * FROM employees ORDER BY id DESC LIMIT ? OFFSET ?",
    )
    .bind(per_page as i64)
    .bind(offset as i64)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("basic_auth" = []))
)]
pub async fn get_employee(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    let employee = fetch_employee(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(employee))
}

/// Update Employee (merge of provided fields)
#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    request_body = UpdateEmployee,
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 400, description = "Validation failure"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("basic_auth" = []))
)]
pub async fn update_employee(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateEmployee>,
) -> Result<impl Responder, ApiError> {
    let employee_id = path.into_inner();

    // Existence first, so an empty payload on a missing row is still a 404.
    fetch_employee(pool.get_ref(), employee_id).await?;

    if let Some(salary) = body.salary {
        if salary < 0.0 {
            return Err(ApiError::validation("Salary must not be negative"));
        }
    }

    if let Some(department_id) = body.department_id {
        if !department_exists(pool.get_ref(), department_id).await? {
            return Err(ApiError::validation(format!(
                "Department {} does not exist",
                department_id
            )));
        }
    }

    let mut columns: Vec<(&str, SqlValue)> = Vec::new();
    if let Some(name) = &body.name {
        columns.push(("name", SqlValue::String(name.clone())));
    }
    if let Some(position) = &body.position {
        columns.push(("position", SqlValue::String(position.clone())));
    }
    if let Some(salary) = body.salary {
        columns.push(("salary", SqlValue::F64(salary)));
    }
    if let Some(hire_date) = body.hire_date {
        columns.push(("hire_date", SqlValue::Date(hire_date)));
    }
    if let Some(department_id) = body.department_id {
        columns.push(("department_id", SqlValue::U64(department_id)));
    }

    let update = build_update_sql("employees", columns, "id", employee_id)?;
    execute_update(pool.get_ref(), update).await?;

    let updated = fetch_employee(pool.get_ref(), employee_id).await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// Soft-delete Employee (admin only). Employees are never hard-deleted;
/// a repeated delete leaves the record inactive.
#[utoipa::path(
    delete,
    path = "/api/employees/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee deactivated"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("basic_auth" = []))
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let employee_id = path.into_inner();

    fetch_employee(pool.get_ref(), employee_id).await?;

    sqlx::query(
        r#"
        UPDATE employees
        SET is_active = FALSE, last_activity_date = NOW()
        WHERE id = ?
        "#,
    )
    .bind(employee_id)
    .execute(pool.get_ref())
    .await
    .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Employee deactivated"
    })))
}

/// Update Salary
#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}/salary",
    params(("employee_id", Path, description = "Employee ID")),
    request_body = UpdateSalary,
    responses(
        (status = 200, description = "Salary updated", body = Employee),
        (status = 400, description = "Negative salary rejected"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("basic_auth" = []))
)]
pub async fn update_salary(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateSalary>,
) -> Result<impl Responder, ApiError> {
    let employee_id = path.into_inner();

    if body.salary < 0.0 {
        return Err(ApiError::validation("Salary must not be negative"));
    }

    fetch_employee(pool.get_ref(), employee_id).await?;

    sqlx::query(
        r#"
        UPDATE employees
        SET salary = ?, last_activity_date = NOW()
        WHERE id = ?
        "#,
    )
    .bind(body.salary)
    .bind(employee_id)
    .execute(pool.get_ref())
    .await?;

    let updated = fetch_employee(pool.get_ref(), employee_id).await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// Transfer Employee to another Department
#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}/transfer",
    params(("employee_id", Path, description = "Employee ID")),
    request_body = TransferDepartment,
    responses(
        (status = 200, description = "Employee transferred", body = Employee),
        (status = 404, description = "Employee or department not found")
    ),
    tag = "Employee",
    security(("basic_auth" = []))
)]
pub async fn transfer_department(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<TransferDepartment>,
) -> Result<impl Responder, ApiError> {
    let employee_id = path.into_inner();

    fetch_employee(pool.get_ref(), employee_id).await?;

    if !department_exists(pool.get_ref(), body.department_id).await? {
        return Err(ApiError::not_found("Department not found"));
    }

    sqlx::query(
        r#"
        UPDATE employees
        SET department_id = ?, last_activity_date = NOW()
        WHERE id = ?
        "#,
    )
    .bind(body.department_id)
    .bind(employee_id)
    .execute(pool.get_ref())
    .await?;

    let updated = fetch_employee(pool.get_ref(), employee_id).await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// Tenure: whole years and remainder months since hire
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}/tenure",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Tenure", body = Tenure),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("basic_auth" = []))
)]
pub async fn get_tenure(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    let employee = fetch_employee(pool.get_ref(), path.into_inner()).await?;

    let tenure = tenure_between(employee.hire_date, Utc::now().date_naive());
    Ok(HttpResponse::Ok().json(tenure))
}

/// Search active employees by name substring. Non-admin callers only see
/// their own linked employee record.
#[utoipa::path(
    get,
    path = "/api/employees/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching active employees", body = [Employee]),
        (status = 400, description = "Missing search term")
    ),
    tag = "Employee",
    security(("basic_auth" = []))
)]
pub async fn search_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<SearchQuery>,
) -> Result<impl Responder, ApiError> {
    let term = query.name.trim();
    if term.is_empty() {
        return Err(ApiError::validation("Search term must not be empty"));
    }

    let like = format!("%{}%", term);

    let employees = if auth.is_admin() {
        sqlx::query_as::<_, Employee>(
            r#"
            SELECT * FROM employees
            WHERE is_active = TRUE AND name LIKE ?
            ORDER BY id
            "#,
        )
        .bind(&like)
        .fetch_all(pool.get_ref())
        .await?
    } else {
        sqlx::query_as::<_, Employee>(
            r#"
            SELECT * FROM employees
            WHERE is_active = TRUE AND name LIKE ? AND id = ?
            ORDER BY id
            "#,
        )
        .bind(&like)
        .bind(auth.employee_id)
        .fetch_all(pool.get_ref())
        .await?
    };

    Ok(HttpResponse::Ok().json(employees))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn tenure_counts_years_and_remainder_months() {
        let t = tenure_between(date(2024, 5, 10), date(2026, 8, 23));
        assert_eq!(t, Tenure { years: 2, months: 3 });
    }

    #[test]
    fn tenure_normalizes_when_current_month_precedes_hire_month() {
        // Hired in November, checked in February: 2 years + 3 months.
        let t = tenure_between(date(2023, 11, 1), date(2026, 2, 15));
        assert_eq!(t, Tenure { years: 2, months: 3 });

        let t = tenure_between(date(2025, 12, 1), date(2026, 1, 1));
        assert_eq!(t, Tenure { years: 0, months: 1 });
    }

    #[test]
    fn tenure_same_month_is_zero() {
        let t = tenure_between(date(2026, 8, 1), date(2026, 8, 23));
        assert_eq!(t, Tenure { years: 0, months: 0 });
    }

    #[test]
    fn tenure_months_stay_within_a_year() {
        for month in 1..=12 {
            let t = tenure_between(date(2020, month, 1), date(2026, 6, 1));
            assert!(t.months <= 11, "month diff escaped [0,11]: {:?}", t);
        }
    }
}
