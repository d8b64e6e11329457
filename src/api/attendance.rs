use crate::{
    attendance::{
        AttendanceError, AttendanceService,
        bulk::BulkMarkRequest,
        patch::AttendancePatch,
        report::{AttendanceReport, AttendanceStatistics, GroupBy, ListFilter, ReportScope},
        service::{MarkAttendance, SelfAction, SelfService},
        store::DateRange,
    },
    auth::auth::AuthUser,
    model::attendance::{AttendanceRecord, AttendanceStatus},
};
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelfAttendanceReq {
    /// check-in | check-out
    #[schema(example = "check-in")]
    pub action: Option<String>,
    #[schema(example = 2)]
    pub team_id: Option<u64>,
    pub notes: Option<String>,
    pub location: Option<String>,
}

/// The record with the action performed and the wall-clock time it used
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelfAttendanceData {
    #[serde(flatten)]
    pub record: AttendanceRecord,
    pub action: SelfAction,
    #[schema(example = "09:00:00")]
    pub time: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Only applied together with `endDate`
    #[param(value_type = Option<String>, format = "date", example = "2026-01-01")]
    pub start_date: Option<NaiveDate>,
    #[param(value_type = Option<String>, format = "date", example = "2026-01-31")]
    pub end_date: Option<NaiveDate>,
    /// present | absent | late | leave | half_day
    pub status: Option<String>,
}

impl ListQuery {
    fn filter(&self) -> Result<ListFilter, AttendanceError> {
        Ok(ListFilter {
            start_date: self.start_date,
            end_date: self.end_date,
            status: parse_optional_status(self.status.as_deref())?,
        })
    }

    fn echo(&self) -> serde_json::Value {
        json!({
            "startDate": self.start_date,
            "endDate": self.end_date,
            "status": self.status
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendanceReq {
    pub user_id: Option<u64>,
    pub team_id: Option<u64>,
    #[schema(value_type = Option<String>, format = "date", example = "2026-01-05")]
    pub date: Option<NaiveDate>,
    #[schema(example = "late")]
    pub status: Option<String>,
    #[schema(value_type = Option<String>, example = "09:40:00")]
    pub check_in_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>, example = "17:30:00")]
    pub check_out_time: Option<NaiveTime>,
    pub work_hours: Option<f64>,
    pub notes: Option<String>,
    pub ip_address: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAttendanceReq {
    /// Attendance record id
    pub id: Option<u64>,
    pub status: Option<String>,
    #[schema(value_type = Option<String>, example = "09:00:00")]
    pub check_in_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>, example = "17:00:00")]
    pub check_out_time: Option<NaiveTime>,
    pub work_hours: Option<f64>,
    pub notes: Option<String>,
    /// Written to the audit log only
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// team | user | organization, defaults to team
    pub scope: Option<String>,
    /// Id of the team, user or organization
    pub id: Option<u64>,
    #[param(value_type = Option<String>, format = "date")]
    pub start_date: Option<NaiveDate>,
    #[param(value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,
    /// date | user, defaults to date
    pub group_by: Option<String>,
}

fn parse_status(raw: &str) -> Result<AttendanceStatus, AttendanceError> {
    AttendanceStatus::parse(raw).ok_or_else(|| {
        AttendanceError::validation(format!(
            "Invalid status '{raw}'. Allowed values: {}",
            AttendanceStatus::allowed()
        ))
    })
}

fn parse_optional_status(raw: Option<&str>) -> Result<Option<AttendanceStatus>, AttendanceError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_status(raw).map(Some),
    }
}

/// Blank free-text fields count as not supplied
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn peer_ip(req: &HttpRequest) -> Option<String> {
    req.peer_addr().map(|addr| addr.ip().to_string())
}

/// Self check-in / check-out
#[utoipa::path(
    post,
    path = "/api/attendance/self",
    request_body = SelfAttendanceReq,
    responses(
        (status = 201, description = "Check-in successful", body = SelfAttendanceData),
        (status = 200, description = "Check-out successful", body = SelfAttendanceData),
        (status = 400, description = "Missing fields, unknown action, or no check-in today", body = Object, example = json!({
            "success": false,
            "message": "No check-in record found for today. Please check-in first."
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a member of the team", body = Object, example = json!({
            "success": false,
            "message": "You are not a member of this team"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn self_attendance(
    auth: AuthUser,
    req: HttpRequest,
    service: web::Data<AttendanceService>,
    body: web::Json<SelfAttendanceReq>,
) -> actix_web::Result<HttpResponse> {
    let body = body.into_inner();

    let (Some(raw_action), Some(team_id)) = (body.action.as_deref(), body.team_id) else {
        return Err(AttendanceError::validation("action and teamId are required").into());
    };
    let action = SelfAction::parse(raw_action.trim()).ok_or_else(|| {
        AttendanceError::validation("Invalid action. Use \"check-in\" or \"check-out\"")
    })?;

    let request = SelfService {
        team_id,
        notes: non_blank(body.notes),
        location: non_blank(body.location),
        ip_address: peer_ip(&req),
    };

    let outcome = service.self_service(auth.user_id, action, request).await?;

    let data = SelfAttendanceData {
        record: outcome.record,
        action: outcome.action,
        time: outcome.time.format("%H:%M:%S").to_string(),
    };

    let (mut response, message) = match action {
        SelfAction::CheckIn => (HttpResponse::Created(), "Check-in successful"),
        SelfAction::CheckOut => (HttpResponse::Ok(), "Check-out successful"),
    };

    Ok(response.json(json!({
        "success": true,
        "message": message,
        "data": data
    })))
}

/// Caller's own attendance with statistics
#[utoipa::path(
    get,
    path = "/api/attendance/my-attendance",
    params(ListQuery),
    responses(
        (status = 200, description = "Own records, statistics and today's record", body = Object, example = json!({
            "success": true,
            "data": {
                "attendance": [],
                "statistics": {
                    "totalDays": 0, "presentDays": 0, "absentDays": 0,
                    "lateDays": 0, "attendancePercentage": 0, "totalWorkHours": 0.0
                },
                "todayRecord": null,
                "filters": { "startDate": null, "endDate": null, "status": null }
            }
        })),
        (status = 400, description = "Invalid status filter"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn my_attendance(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    query: web::Query<ListQuery>,
) -> actix_web::Result<HttpResponse> {
    let mine = service.my_attendance(auth.user_id, query.filter()?).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": {
            "attendance": mine.attendance,
            "statistics": mine.statistics,
            "todayRecord": mine.today_record,
            "filters": query.echo()
        }
    })))
}

/// Mark attendance for a user
#[utoipa::path(
    post,
    path = "/api/attendance/mark",
    request_body = MarkAttendanceReq,
    responses(
        (status = 201, description = "Attendance marked", body = AttendanceRecord),
        (status = 400, description = "Missing fields or invalid status"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Manager, teacher or admin role required"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    auth: AuthUser,
    req: HttpRequest,
    service: web::Data<AttendanceService>,
    body: web::Json<MarkAttendanceReq>,
) -> actix_web::Result<HttpResponse> {
    auth.require_staff()?;
    let body = body.into_inner();

    let (Some(user_id), Some(team_id), Some(date), Some(raw_status)) =
        (body.user_id, body.team_id, body.date, body.status.as_deref())
    else {
        return Err(
            AttendanceError::validation("userId, teamId, date, and status are required").into(),
        );
    };
    let status = parse_status(raw_status)?;

    let record = service
        .mark(
            auth.user_id,
            MarkAttendance {
                user_id,
                team_id,
                date,
                status,
                check_in_time: body.check_in_time,
                check_out_time: body.check_out_time,
                work_hours: body.work_hours,
                notes: body.notes,
                ip_address: body.ip_address,
                location: body.location,
                request_ip: peer_ip(&req),
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Attendance marked successfully",
        "data": record
    })))
}

/// Mark attendance for many users of one team and date
#[utoipa::path(
    post,
    path = "/api/attendance/mark-bulk",
    request_body = BulkMarkRequest,
    responses(
        (status = 200, description = "Per-entry results; failed entries are listed in errors", body = Object, example = json!({
            "success": true,
            "message": "Processed 1 attendance records",
            "data": { "results": [], "errors": [{ "userId": 2, "error": "Invalid status 'invalid-status'. Allowed values: present, absent, late, leave, half_day" }] },
            "summary": { "successful": 1, "failed": 1, "total": 2 }
        })),
        (status = 400, description = "Malformed request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Manager, teacher or admin role required")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn mark_bulk(
    auth: AuthUser,
    req: HttpRequest,
    service: web::Data<AttendanceService>,
    body: web::Json<BulkMarkRequest>,
) -> actix_web::Result<HttpResponse> {
    auth.require_staff()?;

    let outcome = service
        .mark_bulk(auth.user_id, peer_ip(&req), body.into_inner())
        .await;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!("Processed {} attendance records", outcome.summary.successful),
        "data": { "results": outcome.results, "errors": outcome.errors },
        "summary": outcome.summary
    })))
}

/// Sparse update of an attendance record
#[utoipa::path(
    put,
    path = "/api/attendance/update",
    request_body = UpdateAttendanceReq,
    responses(
        (status = 200, description = "Attendance updated", body = AttendanceRecord),
        (status = 400, description = "Missing id or invalid status"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Manager, teacher or admin role required"),
        (status = 404, description = "Attendance record not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn update_attendance(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    body: web::Json<UpdateAttendanceReq>,
) -> actix_web::Result<HttpResponse> {
    auth.require_staff()?;
    let body = body.into_inner();

    let id = body
        .id
        .ok_or_else(|| AttendanceError::validation("id is required"))?;

    let patch = AttendancePatch {
        status: parse_optional_status(body.status.as_deref())?,
        check_in_time: body.check_in_time,
        check_out_time: body.check_out_time,
        work_hours: body.work_hours,
        notes: body.notes,
        ..Default::default()
    };

    let record = service.update(auth.user_id, id, patch, body.reason).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Attendance updated successfully",
        "data": record
    })))
}

/// Attendance of one team
#[utoipa::path(
    get,
    path = "/api/attendance/team/{id}",
    params(
        ("id", Path, description = "Team ID"),
        ListQuery
    ),
    responses(
        (status = 200, description = "Team and its records, newest first", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Manager, teacher or admin role required"),
        (status = 404, description = "Team not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn team_attendance(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    path: web::Path<u64>,
    query: web::Query<ListQuery>,
) -> actix_web::Result<HttpResponse> {
    auth.require_staff()?;

    let team = service
        .team_attendance(path.into_inner(), query.filter()?)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": {
            "team": team.team,
            "attendance": team.attendance,
            "filters": query.echo()
        }
    })))
}

/// Attendance of one user with statistics
#[utoipa::path(
    get,
    path = "/api/attendance/user/{id}",
    params(
        ("id", Path, description = "User ID"),
        ListQuery
    ),
    responses(
        (status = 200, description = "Records and statistics", body = AttendanceStatistics),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only the user or staff may read these records")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn user_attendance(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    path: web::Path<u64>,
    query: web::Query<ListQuery>,
) -> actix_web::Result<HttpResponse> {
    let user_id = path.into_inner();
    auth.require_self_or_staff(user_id)?;

    let user = service.user_attendance(user_id, query.filter()?).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": {
            "attendance": user.attendance,
            "statistics": user.statistics,
            "filters": query.echo()
        }
    })))
}

/// Grouped attendance report for a team, user or organization
#[utoipa::path(
    get,
    path = "/api/attendance/reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "Scope, grouped counts and raw records, oldest first", body = AttendanceReport),
        (status = 400, description = "Missing id, unknown scope or groupBy"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Manager, teacher or admin role required"),
        (status = 404, description = "Team, user or organization not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn reports(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    query: web::Query<ReportQuery>,
) -> actix_web::Result<HttpResponse> {
    auth.require_staff()?;

    let scope = match query.scope.as_deref() {
        None => ReportScope::default(),
        Some(raw) => ReportScope::from_str(raw.trim()).map_err(|_| {
            AttendanceError::validation("Invalid scope. Use team, user or organization")
        })?,
    };
    let group_by = match query.group_by.as_deref() {
        None => GroupBy::default(),
        Some(raw) => GroupBy::from_str(raw.trim())
            .map_err(|_| AttendanceError::validation("Invalid groupBy. Use date or user"))?,
    };
    let id = query
        .id
        .ok_or_else(|| AttendanceError::validation("id is required"))?;

    let report = service
        .report(
            scope,
            id,
            DateRange::from_bounds(query.start_date, query.end_date),
            group_by,
        )
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": {
            "scope": report.scope,
            "report": report.report,
            "rawData": report.raw_data,
            "filters": {
                "startDate": query.start_date,
                "endDate": query.end_date,
                "groupBy": group_by.as_ref()
            }
        }
    })))
}
