use crate::auth::auth::AuthUser;
use crate::auth::password::verify_password;
use crate::model::role::Role;
use crate::model::user::User;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::json;
use sqlx::MySqlPool;

/// Split a Basic `Authorization` header value into (email, password).
pub fn decode_basic(header_value: &str) -> Option<(String, String)> {
    let encoded = header_value.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;

    // Password may itself contain ':'; split on the first one only.
    let (email, password) = decoded.split_once(':')?;
    if email.is_empty() {
        return None;
    }

    Some((email.to_string(), password.to_string()))
}

/// Per-request credential gate. Looks the user up by email, verifies the
/// password against the stored hash, and attaches an [`AuthUser`] to the
/// request extensions for handlers to extract.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let pool = req
        .app_data::<Data<MySqlPool>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Database pool missing"))?
        .clone();

    let header_value = match req.headers().get("Authorization") {
        Some(h) => h.to_str().map_err(|_| {
            actix_web::error::ErrorUnauthorized("Invalid Authorization header encoding")
        })?,
        None => {
            let resp =
                HttpResponse::Unauthorized().json(json!({"error": "Missing Authorization header"}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    let (email, password) = match decode_basic(header_value) {
        Some(creds) => creds,
        None => {
            let resp = HttpResponse::Unauthorized()
                .json(json!({"error": "Authorization header must carry Basic credentials"}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, password, title, role, employee_id
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(&email)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch user for auth check");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let user = match user {
        Some(u) => u,
        None => {
            let resp = HttpResponse::Unauthorized().json(json!({"error": "Invalid credentials"}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    if verify_password(&password, &user.password).is_err() {
        let resp = HttpResponse::Unauthorized().json(json!({"error": "Invalid credentials"}));
        return Ok(req.into_response(resp.map_into_boxed_body()));
    }

    let role = match Role::from_name(&user.role) {
        Some(role) => role,
        None => {
            let resp = HttpResponse::Unauthorized().json(json!({"error": "Invalid role"}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    let auth_user = AuthUser {
        user_id: user.id,
        email: user.email,
        role,
        employee_id: user.employee_id,
    };

    req.extensions_mut().insert(auth_user);

    next.call(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic(creds: &str) -> String {
        format!("Basic {}", STANDARD.encode(creds))
    }

    #[test]
    fn decodes_email_and_password() {
        let header = basic("ann@corp.example:s3cret");
        assert_eq!(
            decode_basic(&header),
            Some(("ann@corp.example".to_string(), "s3cret".to_string()))
        );
    }

    #[test]
    fn password_may_contain_colons() {
        let header = basic("ann@corp.example:pa:ss");
        assert_eq!(
            decode_basic(&header),
            Some(("ann@corp.example".to_string(), "pa:ss".to_string()))
        );
    }

    #[test]
    fn rejects_non_basic_schemes() {
        assert_eq!(decode_basic("Bearer abc123"), None);
    }

    #[test]
    fn rejects_garbage_and_empty_email() {
        assert_eq!(decode_basic("Basic %%%%"), None);
        assert_eq!(decode_basic(&basic("no-separator")), None);
        assert_eq!(decode_basic(&basic(":password-only")), None);
    }
}
