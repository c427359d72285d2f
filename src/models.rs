use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct RegisterUserReq {
    #[schema(example = "ann@corp.example", format = "email")]
    pub email: String,
    #[schema(example = "s3cret")]
    pub password: String,
    #[schema(example = "Senior Accountant", nullable = true)]
    pub title: Option<String>,
    #[schema(example = "user", nullable = true)]
    pub role: Option<String>,
    #[schema(example = 1)]
    pub employee_id: u64,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "ann@corp.example", format = "email")]
    pub email: String,
    #[schema(example = "s3cret")]
    pub password: String,
}

/// User fields safe to return to callers; never carries the password hash.
#[derive(Serialize, ToSchema)]
pub struct PublicUser {
    pub id: u64,
    pub email: String,
    pub title: Option<String>,
    pub role: String,
    pub employee_id: u64,
}
