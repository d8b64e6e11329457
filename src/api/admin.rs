use crate::{
    api::error::ApiError,
    auth::{auth::AuthUser, handlers::create_user},
    model::{organization::Organization, team::Team, user::User},
    models::RegisterReq,
    utils::{
        db_utils::{SqlValue, WhereClause},
        membership_cache,
    },
};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

const ORG_NAME_MAX: usize = 255;
const TEAM_NAME_MAX: usize = 255;
const DEFAULT_TEAM_COLOR: &str = "#3B82F6";
const DEFAULT_MAX_MEMBERS: u32 = 50;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrganization {
    #[schema(example = "Sample Organization")]
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    #[schema(example = "+1-555-0100")]
    pub phone: Option<String>,
    #[schema(example = "info@sample.org", format = "email")]
    pub email: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeam {
    #[schema(example = "Development Team")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = 1)]
    pub organization_id: u64,
    pub manager_id: Option<u64>,
    #[schema(example = 15)]
    pub max_members: Option<u32>,
    #[schema(example = "#10B981")]
    pub color: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TeamQuery {
    pub organization_id: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    /// admin | manager | teacher | member
    pub role: Option<String>,
    /// active | inactive
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignManager {
    #[schema(example = 3)]
    pub manager_id: u64,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddMember {
    #[schema(example = 7)]
    pub user_id: u64,
}

/// Trimmed name of 2..=max characters
fn validate_name(label: &str, raw: &str, max: usize) -> Result<String, ApiError> {
    let name = raw.trim();
    if !(2..=max).contains(&name.chars().count()) {
        return Err(ApiError::Validation(format!(
            "{label} name must be between 2 and {max} characters"
        )));
    }
    Ok(name.to_string())
}

/// `#RRGGBB`
fn validate_color(raw: &str) -> Result<(), ApiError> {
    let valid = raw.len() == 7
        && raw.starts_with('#')
        && raw[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(())
    } else {
        Err(ApiError::Validation(
            "Color must be a hex value like #3B82F6".into(),
        ))
    }
}

async fn row_exists(pool: &MySqlPool, table: &'static str, id: u64) -> Result<bool, ApiError> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?)");
    Ok(sqlx::query_scalar::<_, bool>(&sql)
        .bind(id)
        .fetch_one(pool)
        .await?)
}

async fn ensure_exists(
    pool: &MySqlPool,
    table: &'static str,
    id: u64,
    message: &str,
) -> Result<(), ApiError> {
    if row_exists(pool, table, id).await? {
        Ok(())
    } else {
        Err(ApiError::NotFound(message.to_string()))
    }
}

const TEAM_COLUMNS: &str =
    "id, name, description, organization_id, manager_id, max_members, status, color";

async fn fetch_team(pool: &MySqlPool, id: u64) -> Result<Option<Team>, ApiError> {
    let sql = format!("SELECT {TEAM_COLUMNS} FROM teams WHERE id = ?");
    Ok(sqlx::query_as::<_, Team>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

/// Create an organization
#[utoipa::path(
    post,
    path = "/api/admin/organizations",
    request_body = CreateOrganization,
    responses(
        (status = 201, description = "Organization created", body = Organization),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn create_organization(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<CreateOrganization>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;
    let name = validate_name("Organization", &body.name, ORG_NAME_MAX)?;

    let id = sqlx::query(
        r#"
        INSERT INTO organizations (name, description, address, phone, email, website)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&name)
    .bind(&body.description)
    .bind(&body.address)
    .bind(&body.phone)
    .bind(&body.email)
    .bind(&body.website)
    .execute(pool.get_ref())
    .await?
    .last_insert_id();

    let organization = sqlx::query_as::<_, Organization>(
        r#"
        SELECT id, name, description, address, phone, email, website, status
        FROM organizations WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_one(pool.get_ref())
    .await?;

    info!(organization_id = id, admin_id = auth.user_id, "Organization created");

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Organization created successfully",
        "data": organization
    })))
}

/// List organizations
#[utoipa::path(
    get,
    path = "/api/admin/organizations",
    responses(
        (status = 200, description = "All organizations", body = [Organization]),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn list_organizations(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let organizations = sqlx::query_as::<_, Organization>(
        r#"
        SELECT id, name, description, address, phone, email, website, status
        FROM organizations ORDER BY name
        "#,
    )
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": organizations
    })))
}

/// Create a team inside an organization
#[utoipa::path(
    post,
    path = "/api/admin/teams",
    request_body = CreateTeam,
    responses(
        (status = 201, description = "Team created", body = Team),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Organization or manager not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn create_team(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<CreateTeam>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;
    let name = validate_name("Team", &body.name, TEAM_NAME_MAX)?;
    if let Some(color) = &body.color {
        validate_color(color)?;
    }

    ensure_exists(
        pool.get_ref(),
        "organizations",
        body.organization_id,
        "Organization not found",
    )
    .await?;
    if let Some(manager_id) = body.manager_id {
        ensure_exists(pool.get_ref(), "users", manager_id, "Manager not found").await?;
    }

    let id = sqlx::query(
        r#"
        INSERT INTO teams (name, description, organization_id, manager_id, max_members, color)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&name)
    .bind(&body.description)
    .bind(body.organization_id)
    .bind(body.manager_id)
    .bind(body.max_members.unwrap_or(DEFAULT_MAX_MEMBERS))
    .bind(body.color.as_deref().unwrap_or(DEFAULT_TEAM_COLOR))
    .execute(pool.get_ref())
    .await?
    .last_insert_id();

    let team = fetch_team(pool.get_ref(), id)
        .await?
        .ok_or_else(|| ApiError::Internal("Created team vanished".into()))?;

    info!(team_id = id, organization_id = team.organization_id, "Team created");

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Team created successfully",
        "data": team
    })))
}

/// List teams, optionally of one organization
#[utoipa::path(
    get,
    path = "/api/admin/teams",
    params(TeamQuery),
    responses(
        (status = 200, description = "Teams", body = [Team]),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn list_teams(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<TeamQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let mut clause = WhereClause::new();
    if let Some(organization_id) = query.organization_id {
        clause.push("organization_id = ?", SqlValue::U64(organization_id));
    }
    let sql = format!(
        "SELECT {TEAM_COLUMNS} FROM teams {} ORDER BY name",
        clause.sql()
    );

    let teams = clause
        .bind(sqlx::query_as::<_, Team>(&sql))
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": teams
    })))
}

/// Create a user account
#[utoipa::path(
    post,
    path = "/api/admin/users",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Email already registered")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn create_user_account(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<RegisterReq>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let user = create_user(&body, pool.get_ref()).await?;

    info!(user_id = user.id, admin_id = auth.user_id, role = %user.role, "User created by admin");

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "User created successfully",
        "data": user
    })))
}

/// List users
#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(UserQuery),
    responses(
        (status = 200, description = "Users without password hashes", body = [User]),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn list_users(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let mut clause = WhereClause::new();
    if let Some(role) = &query.role {
        clause.push("role = ?", SqlValue::String(role.trim().to_lowercase()));
    }
    if let Some(status) = &query.status {
        clause.push("status = ?", SqlValue::String(status.trim().to_lowercase()));
    }
    let sql = format!(
        "SELECT id, name, email, '' AS password_hash, role, status, last_login_at \
         FROM users {} ORDER BY name",
        clause.sql()
    );

    let users = clause
        .bind(sqlx::query_as::<_, User>(&sql))
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": users
    })))
}

/// Assign a manager to a team
#[utoipa::path(
    put,
    path = "/api/admin/teams/{id}/manager",
    params(
        ("id", Path, description = "Team ID")
    ),
    request_body = AssignManager,
    responses(
        (status = 200, description = "Manager assigned", body = Team),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Team or user not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn assign_manager(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<AssignManager>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;
    let team_id = path.into_inner();

    ensure_exists(pool.get_ref(), "teams", team_id, "Team not found").await?;
    ensure_exists(pool.get_ref(), "users", body.manager_id, "User not found").await?;

    sqlx::query("UPDATE teams SET manager_id = ? WHERE id = ?")
        .bind(body.manager_id)
        .bind(team_id)
        .execute(pool.get_ref())
        .await?;

    let team = fetch_team(pool.get_ref(), team_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Team not found".into()))?;

    info!(team_id, manager_id = body.manager_id, "Team manager assigned");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Manager assigned successfully",
        "data": team
    })))
}

/// Add a user to a team, reactivating a previous membership
#[utoipa::path(
    post,
    path = "/api/admin/teams/{id}/members",
    params(
        ("id", Path, description = "Team ID")
    ),
    request_body = AddMember,
    responses(
        (status = 201, description = "Member added", body = Object, example = json!({
            "success": true,
            "message": "Member added successfully",
            "data": { "teamId": 1, "userId": 7, "status": "active" }
        })),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Team or user not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn add_team_member(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<AddMember>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;
    let team_id = path.into_inner();

    ensure_exists(pool.get_ref(), "teams", team_id, "Team not found").await?;
    ensure_exists(pool.get_ref(), "users", body.user_id, "User not found").await?;

    sqlx::query(
        r#"
        INSERT INTO team_members (team_id, user_id, status)
        VALUES (?, ?, 'active')
        ON DUPLICATE KEY UPDATE status = 'active'
        "#,
    )
    .bind(team_id)
    .bind(body.user_id)
    .execute(pool.get_ref())
    .await?;

    membership_cache::forget(team_id, body.user_id).await;

    info!(team_id, user_id = body.user_id, "Team member added");

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Member added successfully",
        "data": { "teamId": team_id, "userId": body.user_id, "status": "active" }
    })))
}
