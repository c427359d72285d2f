use crate::{
    auth::auth::AuthUser,
    error::ApiError,
    model::{department::Department, employee::Employee},
    utils::db_utils::{SqlValue, build_update_sql, execute_update},
};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateDepartment {
    #[schema(example = "Engineering")]
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateDepartment {
    #[schema(example = "Engineering")]
    pub name: Option<String>,
}

async fn fetch_department(pool: &MySqlPool, id: u64) -> Result<Department, ApiError> {
    sqlx::query_as::<_, Department>("SELECT id, name FROM departments WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Department not found"))
}

/// List Departments
#[utoipa::path(
    get,
    path = "/api/departments",
    responses(
        (status = 200, description = "All departments", body = [Department]),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Department",
    security(("basic_auth" = []))
)]
pub async fn list_departments(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<impl Responder, ApiError> {
    let departments =
        sqlx::query_as::<_, Department>("SELECT id, name FROM departments ORDER BY id")
            .fetch_all(pool.get_ref())
            .await?;

    Ok(HttpResponse::Ok().json(departments))
}

/// Get Department by ID
#[utoipa::path(
    get,
    path = "/api/departments/{department_id}",
    params(("department_id", Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department found", body = Department),
        (status = 404, description = "Department not found")
    ),
    tag = "Department",
    security(("basic_auth" = []))
)]
pub async fn get_department(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    let department = fetch_department(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(department))
}

/// Create Department
#[utoipa::path(
    post,
    path = "/api/departments",
    request_body = CreateDepartment,
    responses(
        (status = 201, description = "Department created", body = Department),
        (status = 400, description = "Validation failure")
    ),
    tag = "Department",
    security(("basic_auth" = []))
)]
pub async fn create_department(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateDepartment>,
) -> Result<impl Responder, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("Department name must not be empty"));
    }

    let result = sqlx::query("INSERT INTO departments (name) VALUES (?)")
        .bind(&payload.name)
        .execute(pool.get_ref())
        .await?;

    let created = fetch_department(pool.get_ref(), result.last_insert_id()).await?;
    Ok(HttpResponse::Created().json(created))
}

/// Update Department
#[utoipa::path(
    put,
    path = "/api/departments/{department_id}",
    params(("department_id", Path, description = "Department ID")),
    request_body = UpdateDepartment,
    responses(
        (status = 200, description = "Department updated", body = Department),
        (status = 400, description = "Validation failure"),
        (status = 404, description = "Department not found")
    ),
    tag = "Department",
    security(("basic_auth" = []))
)]
pub async fn update_department(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateDepartment>,
) -> Result<impl Responder, ApiError> {
    let department_id = path.into_inner();

    fetch_department(pool.get_ref(), department_id).await?;

    let mut columns: Vec<(&str, SqlValue)> = Vec::new();
    if let Some(name) = &body.name {
        columns.push(("name", SqlValue::String(name.clone())));
    }

    let update = build_update_sql("departments", columns, "id", department_id)?;
    execute_update(pool.get_ref(), update).await?;

    let updated = fetch_department(pool.get_ref(), department_id).await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// Delete Department (hard delete, admin only)
#[utoipa::path(
    delete,
    path = "/api/departments/{department_id}",
    params(("department_id", Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Department not found")
    ),
    tag = "Department",
    security(("basic_auth" = []))
)]
pub async fn delete_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let department_id = path.into_inner();

    let result = sqlx::query("DELETE FROM departments WHERE id = ?")
        .bind(department_id)
        .execute(pool.get_ref())
        .await
        .map_err(ApiError::from)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Department not found").into());
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Department deleted"
    })))
}

/// Employees of a Department (derived back-collection)
#[utoipa::path(
    get,
    path = "/api/departments/{department_id}/employees",
    params(("department_id", Path, description = "Department ID")),
    responses(
        (status = 200, description = "Employees in the department", body = [Employee]),
        (status = 404, description = "Department not found")
    ),
    tag = "Department",
    security(("basic_auth" = []))
)]
pub async fn department_employees(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    let department_id = path.into_inner();

    fetch_department(pool.get_ref(), department_id).await?;

    let employees = sqlx::query_as::<_, Employee>(
        "SELECT * FROM employees WHERE department_id = ? ORDER BY id",
    )
    .bind(department_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(employees))
}
