use crate::{
    auth::password::{hash_password, verify_password},
    error::ApiError,
    model::{role::Role, user::User},
    models::{LoginReqDto, PublicUser, RegisterUserReq},
};
use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, info, instrument};

fn public(user: User) -> PublicUser {
    PublicUser {
        id: user.id,
        email: user.email,
        title: user.title,
        role: user.role,
        employee_id: user.employee_id,
    }
}

async fn fetch_user_by_email(pool: &MySqlPool, email: &str) -> Result<Option<User>, ApiError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, password, title, role, employee_id
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Register a User account for an existing Employee (1:1)
#[utoipa::path(
    post,
    path = "/users/register",
    request_body = RegisterUserReq,
    responses(
        (status = 201, description = "User created", body = PublicUser),
        (status = 400, description = "Validation failure", body = Object, example = json!({
            "message": "User with this email already exists"
        })),
        (status = 404, description = "Employee not found")
    ),
    tag = "User"
)]
pub async fn register(
    payload: web::Json<RegisterUserReq>,
    pool: web::Data<MySqlPool>,
) -> Result<impl Responder, ApiError> {
    let email = payload.email.trim();

    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation(
            "Email, password, and employee_id are required",
        ));
    }

    let role = match &payload.role {
        Some(name) => Role::from_name(name)
            .ok_or_else(|| ApiError::validation(format!("Unknown role '{}'", name)))?,
        None => Role::User,
    };

    let employee_exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM employees WHERE id = ? LIMIT 1)",
    )
    .bind(payload.employee_id)
    .fetch_one(pool.get_ref())
    .await?;

    if !employee_exists {
        return Err(ApiError::not_found(
            "Employee not found. Cannot create user without valid employee",
        ));
    }

    if fetch_user_by_email(pool.get_ref(), email).await?.is_some() {
        return Err(ApiError::validation("User with this email already exists"));
    }

    let employee_taken = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE employee_id = ? LIMIT 1)",
    )
    .bind(payload.employee_id)
    .fetch_one(pool.get_ref())
    .await?;

    if employee_taken {
        return Err(ApiError::validation(
            "This employee already has a user account",
        ));
    }

    let hashed = hash_password(&payload.password)
        .map_err(|_| ApiError::validation("Password could not be hashed"))?;

    let result = sqlx::query(
        r#"
        INSERT INTO users (email, password, title, role, employee_id)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(email)
    .bind(&hashed)
    .bind(&payload.title)
    .bind(role.as_str())
    .bind(payload.employee_id)
    .execute(pool.get_ref())
    .await;

    if let Err(e) = result {
        // Unique-key race between the checks above and the insert.
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.code().as_deref() == Some("23000") {
                return Err(ApiError::validation("Email or employee already registered"));
            }
        }
        return Err(e.into());
    }

    info!(email, employee_id = payload.employee_id, "User registered");

    let user = fetch_user_by_email(pool.get_ref(), email)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(HttpResponse::Created().json(json!({
        "message": "User created successfully",
        "user": public(user)
    })))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/users/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Login successful", body = Object, example = json!({
            "message": "Login successful",
            "user": { "id": 1, "email": "ann@corp.example", "role": "user", "employee_id": 1 }
        })),
        (status = 401, description = "Invalid credentials"),
        (status = 404, description = "User not found")
    ),
    tag = "User"
)]
#[instrument(name = "user_login", skip(pool, payload), fields(email = %payload.email))]
pub async fn login(
    payload: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
) -> Result<impl Responder, ApiError> {
    // 1. Basic validation
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }

    // 2. Fetch user
    debug!("Fetching user from database");

    let user = fetch_user_by_email(pool.get_ref(), payload.email.trim())
        .await?
        .ok_or_else(|| {
            info!("Login failed: user not found");
            ApiError::not_found("User not found")
        })?;

    // 3. Verify password
    if verify_password(&payload.password, &user.password).is_err() {
        info!("Login failed: password mismatch");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    info!(user_id = user.id, "Login successful");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Login successful",
        "user": public(user)
    })))
}
