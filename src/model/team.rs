use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": 2,
    "name": "Development Team",
    "description": "Software development team",
    "organizationId": 1,
    "managerId": 3,
    "maxMembers": 15,
    "status": "active",
    "color": "#10B981"
}))]
pub struct Team {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub organization_id: u64,
    pub manager_id: Option<u64>,
    pub max_members: Option<u32>,
    pub status: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct TeamSummary {
    pub id: u64,
    pub name: String,
    pub color: Option<String>,
}

impl From<&Team> for TeamSummary {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id,
            name: team.name.clone(),
            color: team.color.clone(),
        }
    }
}
