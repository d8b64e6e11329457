use crate::api::{
    admin::{AddMember, AssignManager, CreateOrganization, CreateTeam},
    attendance::{MarkAttendanceReq, SelfAttendanceData, SelfAttendanceReq, UpdateAttendanceReq},
};
use crate::attendance::{
    bulk::{BulkEntry, BulkError, BulkMarkRequest, BulkOutcome, BulkSummary},
    report::{AttendanceReport, AttendanceStatistics, ReportScope, ScopeInfo, StatusCounts, UserCounts},
    service::SelfAction,
};
use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus},
    organization::Organization,
    role::Role,
    team::{Team, TeamSummary},
    user::User,
};
use crate::models::{LoginReqDto, RegisterReq};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Team Attendance API",
        version = "1.0.0",
        description = r#"
## Team Attendance Service

Tracks daily attendance of users who belong to teams inside organizations.

### Key Features
- **Self-service attendance**
  - Check in and check out once per team and day, with derived work hours
- **Administrative marking**
  - Managers, teachers and admins mark single users or a whole team at once
- **Reports**
  - Per-user statistics and grouped reports for a team, user or organization
- **Administration**
  - Organizations, teams, users and team membership

### Security
All endpoints except `/auth/login` and `/auth/register` require a
**JWT Bearer** token.

### Response Format
Every response carries `success`; failures add a `message`.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::profile,

        crate::api::attendance::self_attendance,
        crate::api::attendance::my_attendance,
        crate::api::attendance::mark_attendance,
        crate::api::attendance::mark_bulk,
        crate::api::attendance::update_attendance,
        crate::api::attendance::team_attendance,
        crate::api::attendance::user_attendance,
        crate::api::attendance::reports,

        crate::api::admin::create_organization,
        crate::api::admin::list_organizations,
        crate::api::admin::create_team,
        crate::api::admin::list_teams,
        crate::api::admin::create_user_account,
        crate::api::admin::list_users,
        crate::api::admin::assign_manager,
        crate::api::admin::add_team_member
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,
            User,
            Role,
            AttendanceRecord,
            AttendanceStatus,
            SelfAction,
            SelfAttendanceReq,
            SelfAttendanceData,
            MarkAttendanceReq,
            UpdateAttendanceReq,
            BulkEntry,
            BulkMarkRequest,
            BulkError,
            BulkSummary,
            BulkOutcome,
            AttendanceStatistics,
            StatusCounts,
            UserCounts,
            ReportScope,
            ScopeInfo,
            AttendanceReport,
            Organization,
            Team,
            TeamSummary,
            CreateOrganization,
            CreateTeam,
            AssignManager,
            AddMember
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and profile"),
        (name = "Attendance", description = "Attendance tracking and reporting APIs"),
        (name = "Admin", description = "Organization, team and user administration"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_attendance_paths_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/attendance/self"));
        assert!(doc.paths.paths.contains_key("/api/attendance/reports"));
        assert!(doc.paths.paths.contains_key("/auth/login"));

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("AttendanceRecord"));
    }
}
