use crate::{
    attendance::{StoreError, store::Directory},
    model::{organization::Organization, team::TeamSummary, user::UserSummary},
    utils::{
        db_utils::{SqlValue, bind_values, placeholders},
        membership_cache,
    },
};
use async_trait::async_trait;
use sqlx::MySqlPool;
use tracing::{debug, error};

/// Team, user and organization lookups backing the attendance core
#[derive(Clone)]
pub struct MySqlDirectory {
    pool: MySqlPool,
}

impl MySqlDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn member_ids(&self, sql: &str, id: u64) -> Result<Vec<u64>, StoreError> {
        sqlx::query_scalar::<_, u64>(sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, id, "Failed to load member ids");
                e.into()
            })
    }
}

#[async_trait]
impl Directory for MySqlDirectory {
    async fn is_active_member(&self, team_id: u64, user_id: u64) -> Result<bool, StoreError> {
        if let Some(active) = membership_cache::get(team_id, user_id).await {
            return Ok(active);
        }

        let active = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM team_members
                WHERE team_id = ? AND user_id = ? AND status = 'active'
            )
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, team_id, user_id, "Failed to check team membership");
            StoreError::from(e)
        })?;

        debug!(team_id, user_id, active, "Membership loaded");
        membership_cache::remember(team_id, user_id, active).await;
        Ok(active)
    }

    async fn find_team(&self, team_id: u64) -> Result<Option<TeamSummary>, StoreError> {
        Ok(
            sqlx::query_as::<_, TeamSummary>("SELECT id, name, color FROM teams WHERE id = ?")
                .bind(team_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_user(&self, user_id: u64) -> Result<Option<UserSummary>, StoreError> {
        Ok(
            sqlx::query_as::<_, UserSummary>("SELECT id, name, email FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_organization(&self, org_id: u64) -> Result<Option<Organization>, StoreError> {
        Ok(sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, name, description, address, phone, email, website, status
            FROM organizations
            WHERE id = ?
            "#,
        )
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn team_member_ids(&self, team_id: u64) -> Result<Vec<u64>, StoreError> {
        self.member_ids(
            "SELECT DISTINCT user_id FROM team_members WHERE team_id = ? ORDER BY user_id",
            team_id,
        )
        .await
    }

    async fn organization_member_ids(&self, org_id: u64) -> Result<Vec<u64>, StoreError> {
        self.member_ids(
            r#"
            SELECT DISTINCT tm.user_id
            FROM team_members tm
            JOIN teams t ON t.id = tm.team_id
            WHERE t.organization_id = ?
            ORDER BY tm.user_id
            "#,
            org_id,
        )
        .await
    }

    async fn user_names(&self, user_ids: &[u64]) -> Result<Vec<UserSummary>, StoreError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT id, name, email FROM users WHERE id IN ({})",
            placeholders(user_ids.len())
        );
        let values = user_ids.iter().copied().map(SqlValue::U64).collect();

        Ok(bind_values(sqlx::query_as::<_, UserSummary>(&sql), values)
            .fetch_all(&self.pool)
            .await?)
    }
}
