use crate::{
    api::error::ApiError,
    auth::{
        auth::AuthUser,
        jwt::generate_access_token,
        password::{hash_password, verify_password},
    },
    config::Config,
    db::is_unique_violation,
    model::{role::Role, user::User},
    models::{LoginReqDto, RegisterReq, UserSql},
    utils::email_filter,
};
use actix_web::{HttpResponse, web};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug)]
struct Registration {
    name: String,
    email: String,
    role: Role,
}

fn validate_registration(req: &RegisterReq) -> Result<Registration, ApiError> {
    let name = req.name.trim();
    let email = email_filter::normalize(&req.email);

    if name.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation(
            "Name, email and password are required".into(),
        ));
    }
    if !(2..=100).contains(&name.chars().count()) {
        return Err(ApiError::Validation(
            "Name must be between 2 and 100 characters".into(),
        ));
    }
    if !email.contains('@') {
        return Err(ApiError::Validation("Email must be a valid address".into()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let role = match req.role.as_deref() {
        None => Role::default(),
        Some(raw) => Role::parse(raw.trim())
            .ok_or_else(|| ApiError::Validation(format!("Invalid role '{raw}'")))?,
    };

    Ok(Registration {
        name: name.to_string(),
        email,
        role,
    })
}

/// true  => email AVAILABLE
/// false => email TAKEN
pub async fn is_email_available(email: &str, pool: &MySqlPool) -> Result<bool, ApiError> {
    // Cuckoo filter gives a fast negative
    if !email_filter::might_exist(email) {
        return Ok(true);
    }

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? LIMIT 1)",
    )
    .bind(email)
    .fetch_one(pool)
    .await?;

    Ok(!exists)
}

fn token_for(user: &User, config: &Config) -> Result<String, ApiError> {
    generate_access_token(
        user.id,
        user.email.clone(),
        user.name.clone(),
        user.role.clone(),
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(|e| ApiError::internal("Failed to sign token", e))
}

async fn fetch_user(id: u64, pool: &MySqlPool) -> Result<Option<User>, ApiError> {
    Ok(sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, email, password_hash, role, status, last_login_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?)
}

/// Register a user
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "User registered", body = Object, example = json!({
            "success": true,
            "message": "User registered successfully",
            "data": { "token": "eyJ...", "user": { "id": 7, "name": "Jane Doe", "email": "jane@attendance.com", "role": "member" } }
        })),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn register(
    body: web::Json<RegisterReq>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let user = create_user(&body, pool.get_ref()).await?;
    let token = token_for(&user, &config)?;

    info!(user_id = user.id, role = %user.role, "User registered");

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "User registered successfully",
        "data": { "token": token, "user": user }
    })))
}

/// Validates, hashes and stores a new account. Shared by self-registration
/// and the admin user endpoint.
pub(crate) async fn create_user(req: &RegisterReq, pool: &MySqlPool) -> Result<User, ApiError> {
    let registration = validate_registration(req)?;

    if !is_email_available(&registration.email, pool).await? {
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let hashed = hash_password(&req.password)
        .map_err(|e| ApiError::internal("Failed to hash password", e))?;

    let result = sqlx::query(
        r#"INSERT INTO users (name, email, password_hash, role) VALUES (?, ?, ?, ?)"#,
    )
    .bind(&registration.name)
    .bind(&registration.email)
    .bind(&hashed)
    .bind(registration.role.as_ref())
    .execute(pool)
    .await;

    let id = match result {
        Ok(done) => done.last_insert_id(),
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::Conflict("Email already registered".into()));
        }
        Err(e) => return Err(ApiError::internal("Failed to register user", e)),
    };

    // Keep the filter populated so the next lookup goes to the database
    email_filter::insert(&registration.email);

    fetch_user(id, pool)
        .await?
        .ok_or_else(|| ApiError::Internal("Registered user vanished".into()))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Logged in", body = Object, example = json!({
            "success": true,
            "message": "Login successful",
            "data": { "token": "eyJ...", "user": { "id": 7, "name": "Jane Doe", "email": "jane@attendance.com", "role": "member" } }
        })),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid credentials or inactive account"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, body),
    fields(email = %body.email)
)]
pub async fn login(
    body: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    info!("Login request received");

    let email = email_filter::normalize(&body.email);
    if email.is_empty() || body.password.is_empty() {
        info!("Validation failed: empty email or password");
        return Err(ApiError::Validation("Email and password are required".into()));
    }

    debug!("Fetching user from database");

    let db_user = sqlx::query_as::<_, UserSql>(
        r#"
        SELECT id, name, email, password_hash, role, status
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(&email)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Database error while fetching user");
        ApiError::Internal("Internal Server Error".into())
    })?;

    let Some(db_user) = db_user else {
        info!("Invalid credentials: user not found");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    };

    if db_user.status != "active" {
        info!(user_id = db_user.id, status = %db_user.status, "Login refused: inactive account");
        return Err(ApiError::Unauthorized("Account is not active".into()));
    }

    if let Err(e) = verify_password(&body.password, &db_user.password_hash) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    debug!("Password verified");

    if let Err(e) = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
        .bind(db_user.id)
        .execute(pool.get_ref())
        .await
    {
        // not fatal for the login
        error!(error = %e, "Failed to update last_login_at");
    }

    let user = User {
        id: db_user.id,
        name: db_user.name,
        email: db_user.email,
        password_hash: String::new(),
        role: db_user.role,
        status: db_user.status,
        last_login_at: None,
    };
    let token = token_for(&user, &config)?;

    info!(user_id = user.id, "Login successful");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Login successful",
        "data": { "token": token, "user": user }
    })))
}

/// Current user's profile
#[utoipa::path(
    get,
    path = "/api/auth/profile",
    responses(
        (status = 200, description = "Profile of the caller", body = User),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn profile(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    let user = fetch_user(auth.user_id, pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": { "user": user }
    })))
}
