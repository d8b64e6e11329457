use anyhow::{Context, Result};
use sqlx::MySqlPool;
use tracing::info;

pub mod attendance_store;
pub mod directory;

pub use attendance_store::MySqlAttendanceStore;
pub use directory::MySqlDirectory;

/// Duplicate key (MySQL error 1062)
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

/// Missing parent row (MySQL errors 1451/1452)
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_foreign_key_violation(),
        _ => false,
    }
}

pub async fn init_db(database_url: &str) -> Result<MySqlPool> {
    MySqlPool::connect(database_url)
        .await
        .context("Failed to connect to database")
}

const SCHEMA: [(&str, &str); 5] = [
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
            name VARCHAR(100) NOT NULL,
            email VARCHAR(255) NOT NULL,
            password_hash VARCHAR(255) NOT NULL,
            role VARCHAR(20) NOT NULL DEFAULT 'member',
            status VARCHAR(20) NOT NULL DEFAULT 'active',
            last_login_at DATETIME NULL,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
            UNIQUE KEY uq_users_email (email)
        )
        "#,
    ),
    (
        "organizations",
        r#"
        CREATE TABLE IF NOT EXISTS organizations (
            id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            description TEXT NULL,
            address TEXT NULL,
            phone VARCHAR(20) NULL,
            email VARCHAR(255) NULL,
            website VARCHAR(500) NULL,
            status VARCHAR(20) NOT NULL DEFAULT 'active',
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
        )
        "#,
    ),
    (
        "teams",
        r#"
        CREATE TABLE IF NOT EXISTS teams (
            id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            description TEXT NULL,
            organization_id BIGINT UNSIGNED NOT NULL,
            manager_id BIGINT UNSIGNED NULL,
            max_members INT UNSIGNED NULL DEFAULT 50,
            status VARCHAR(20) NOT NULL DEFAULT 'active',
            color VARCHAR(7) NULL DEFAULT '#3B82F6',
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
            CONSTRAINT fk_teams_organization FOREIGN KEY (organization_id) REFERENCES organizations (id),
            CONSTRAINT fk_teams_manager FOREIGN KEY (manager_id) REFERENCES users (id)
        )
        "#,
    ),
    (
        "team_members",
        r#"
        CREATE TABLE IF NOT EXISTS team_members (
            id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
            team_id BIGINT UNSIGNED NOT NULL,
            user_id BIGINT UNSIGNED NOT NULL,
            status VARCHAR(20) NOT NULL DEFAULT 'active',
            joined_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE KEY uq_team_members (team_id, user_id),
            CONSTRAINT fk_team_members_team FOREIGN KEY (team_id) REFERENCES teams (id),
            CONSTRAINT fk_team_members_user FOREIGN KEY (user_id) REFERENCES users (id)
        )
        "#,
    ),
    (
        "attendances",
        r#"
        CREATE TABLE IF NOT EXISTS attendances (
            id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
            user_id BIGINT UNSIGNED NOT NULL,
            team_id BIGINT UNSIGNED NOT NULL,
            date DATE NOT NULL,
            status VARCHAR(20) NOT NULL DEFAULT 'present',
            check_in_time TIME NULL,
            check_out_time TIME NULL,
            work_hours DOUBLE NULL,
            notes TEXT NULL,
            marked_by BIGINT UNSIGNED NOT NULL,
            ip_address VARCHAR(45) NULL,
            location VARCHAR(255) NULL,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
            UNIQUE KEY uq_attendance_natural_key (user_id, team_id, date),
            KEY idx_attendance_team_date (team_id, date),
            CONSTRAINT fk_attendances_user FOREIGN KEY (user_id) REFERENCES users (id),
            CONSTRAINT fk_attendances_team FOREIGN KEY (team_id) REFERENCES teams (id),
            CONSTRAINT fk_attendances_marked_by FOREIGN KEY (marked_by) REFERENCES users (id)
        )
        "#,
    ),
];

/// Creates missing tables, parents before children
pub async fn ensure_schema(pool: &MySqlPool) -> Result<()> {
    for (table, ddl) in SCHEMA {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to create table {table}"))?;
    }
    info!(tables = SCHEMA.len(), "Database schema ready");
    Ok(())
}
