use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterReq {
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane@attendance.com", format = "email")]
    pub email: String,
    #[schema(example = "secret123")]
    pub password: String,
    /// admin | manager | teacher | member, defaults to member
    #[schema(example = "member")]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "jane@attendance.com", format = "email")]
    pub email: String,
    #[schema(example = "secret123")]
    pub password: String,
}

#[derive(FromRow)]
pub struct UserSql {
    pub id: u64, // BIGINT UNSIGNED
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub user_id: u64,
    /// email
    pub sub: String,
    pub name: String,
    pub role: String,
    pub exp: usize,
    pub jti: String,
}
