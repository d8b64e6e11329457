//! Listings, statistics and grouped reports over stored records.

use super::{
    error::AttendanceError,
    hours::round2,
    service::AttendanceService,
    store::{AttendanceFilter, DateRange, RecordOrder},
};
use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus},
    team::TeamSummary,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Date range and status filter shared by the listing endpoints
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ListFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<AttendanceStatus>,
}

impl ListFilter {
    fn to_store(self, order: RecordOrder) -> AttendanceFilter {
        AttendanceFilter {
            date_range: DateRange::from_bounds(self.start_date, self.end_date),
            status: self.status,
            order,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceStatistics {
    pub total_days: usize,
    pub present_days: usize,
    pub absent_days: usize,
    pub late_days: usize,
    pub attendance_percentage: u32,
    pub total_work_hours: f64,
}

pub fn statistics(records: &[AttendanceRecord]) -> AttendanceStatistics {
    let count = |status: AttendanceStatus| records.iter().filter(|r| r.status == status).count();

    let total_days = records.len();
    let present_days = count(AttendanceStatus::Present);
    let attendance_percentage = if total_days == 0 {
        0
    } else {
        (present_days as f64 / total_days as f64 * 100.0).round() as u32
    };

    AttendanceStatistics {
        total_days,
        present_days,
        absent_days: count(AttendanceStatus::Absent),
        late_days: count(AttendanceStatus::Late),
        attendance_percentage,
        total_work_hours: round2(records.iter().filter_map(|r| r.work_hours).sum()),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatusCounts {
    pub present: u32,
    pub absent: u32,
    pub late: u32,
    pub leave: u32,
    pub half_day: u32,
    pub total: u32,
}

impl StatusCounts {
    fn add(&mut self, status: AttendanceStatus) {
        let slot = match status {
            AttendanceStatus::Present => &mut self.present,
            AttendanceStatus::Absent => &mut self.absent,
            AttendanceStatus::Late => &mut self.late,
            AttendanceStatus::Leave => &mut self.leave,
            AttendanceStatus::HalfDay => &mut self.half_day,
        };
        *slot += 1;
        self.total += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UserCounts {
    pub name: String,
    #[serde(flatten)]
    pub counts: StatusCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GroupedReport {
    ByDate(BTreeMap<NaiveDate, StatusCounts>),
    ByUser(BTreeMap<u64, UserCounts>),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum GroupBy {
    #[default]
    Date,
    User,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, EnumString, Display, AsRefStr, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReportScope {
    #[default]
    Team,
    User,
    Organization,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ScopeInfo {
    #[serde(rename = "type")]
    pub kind: ReportScope,
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceReport {
    pub scope: ScopeInfo,
    #[schema(value_type = Object)]
    pub report: GroupedReport,
    pub raw_data: Vec<AttendanceRecord>,
}

#[derive(Debug, Clone)]
pub struct MyAttendance {
    pub attendance: Vec<AttendanceRecord>,
    pub statistics: AttendanceStatistics,
    pub today_record: Option<AttendanceRecord>,
}

#[derive(Debug, Clone)]
pub struct UserAttendance {
    pub attendance: Vec<AttendanceRecord>,
    pub statistics: AttendanceStatistics,
}

#[derive(Debug, Clone)]
pub struct TeamAttendance {
    pub team: TeamSummary,
    pub attendance: Vec<AttendanceRecord>,
}

impl AttendanceService {
    pub async fn my_attendance(
        &self,
        user_id: u64,
        filter: ListFilter,
    ) -> Result<MyAttendance, AttendanceError> {
        let UserAttendance {
            attendance,
            statistics,
        } = self.user_attendance(user_id, filter).await?;

        let today = self.clock.today();
        let today_record = attendance.iter().find(|r| r.date == today).cloned();

        Ok(MyAttendance {
            attendance,
            statistics,
            today_record,
        })
    }

    pub async fn user_attendance(
        &self,
        user_id: u64,
        filter: ListFilter,
    ) -> Result<UserAttendance, AttendanceError> {
        let query = AttendanceFilter {
            user_id: Some(user_id),
            ..filter.to_store(RecordOrder::DateDesc)
        };
        let attendance = self.store.query(&query).await?;
        let statistics = statistics(&attendance);

        Ok(UserAttendance {
            attendance,
            statistics,
        })
    }

    pub async fn team_attendance(
        &self,
        team_id: u64,
        filter: ListFilter,
    ) -> Result<TeamAttendance, AttendanceError> {
        let team = self
            .directory
            .find_team(team_id)
            .await?
            .ok_or_else(|| AttendanceError::not_found("Team not found"))?;

        let query = AttendanceFilter {
            team_id: Some(team_id),
            ..filter.to_store(RecordOrder::DateDescUserAsc)
        };
        let attendance = self.store.query(&query).await?;

        Ok(TeamAttendance { team, attendance })
    }

    /// Records of every user in scope, oldest first, grouped by date or user.
    /// Team and organization scopes select by their members' user ids, so a
    /// member's records from other teams are included.
    pub async fn report(
        &self,
        scope: ReportScope,
        id: u64,
        date_range: Option<DateRange>,
        group_by: GroupBy,
    ) -> Result<AttendanceReport, AttendanceError> {
        let (name, user_ids) = match scope {
            ReportScope::Team => {
                let team = self
                    .directory
                    .find_team(id)
                    .await?
                    .ok_or_else(|| AttendanceError::not_found("Team not found"))?;
                (team.name, self.directory.team_member_ids(id).await?)
            }
            ReportScope::User => {
                let user = self
                    .directory
                    .find_user(id)
                    .await?
                    .ok_or_else(|| AttendanceError::not_found("User not found"))?;
                (user.name, vec![user.id])
            }
            ReportScope::Organization => {
                let org = self
                    .directory
                    .find_organization(id)
                    .await?
                    .ok_or_else(|| AttendanceError::not_found("Organization not found"))?;
                (org.name, self.directory.organization_member_ids(id).await?)
            }
        };

        let query = AttendanceFilter {
            user_ids: Some(user_ids),
            date_range,
            order: RecordOrder::DateAsc,
            ..Default::default()
        };
        let raw_data = self.store.query(&query).await?;

        let report = match group_by {
            GroupBy::Date => GroupedReport::ByDate(group_by_date(&raw_data)),
            GroupBy::User => GroupedReport::ByUser(self.group_by_user(&raw_data).await?),
        };

        Ok(AttendanceReport {
            scope: ScopeInfo {
                kind: scope,
                id,
                name,
            },
            report,
            raw_data,
        })
    }

    async fn group_by_user(
        &self,
        records: &[AttendanceRecord],
    ) -> Result<BTreeMap<u64, UserCounts>, AttendanceError> {
        let mut ids: Vec<u64> = records.iter().map(|r| r.user_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let names: BTreeMap<u64, String> = self
            .directory
            .user_names(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.name))
            .collect();

        let mut groups = BTreeMap::new();
        for record in records {
            groups
                .entry(record.user_id)
                .or_insert_with(|| UserCounts {
                    name: names
                        .get(&record.user_id)
                        .cloned()
                        .unwrap_or_else(|| "Unknown".to_string()),
                    counts: StatusCounts::default(),
                })
                .counts
                .add(record.status);
        }
        Ok(groups)
    }
}

pub fn group_by_date(records: &[AttendanceRecord]) -> BTreeMap<NaiveDate, StatusCounts> {
    let mut groups: BTreeMap<NaiveDate, StatusCounts> = BTreeMap::new();
    for record in records {
        groups.entry(record.date).or_default().add(record.status);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::service::{MarkAttendance, SelfService};
    use crate::attendance::testing::*;
    use std::str::FromStr;

    fn mark(user_id: u64, team_id: u64, d: u32, status: AttendanceStatus) -> MarkAttendance {
        MarkAttendance {
            user_id,
            team_id,
            date: date(d),
            status,
            check_in_time: None,
            check_out_time: None,
            work_hours: None,
            notes: None,
            ip_address: None,
            location: None,
            request_ip: None,
        }
    }

    async fn seed(h: &Harness) {
        use AttendanceStatus::*;
        let rows = [
            (ALICE, DEV_TEAM, 3, Present),
            (ALICE, DEV_TEAM, 4, Late),
            (BOB, DEV_TEAM, 4, Absent),
            (BOB, DEV_TEAM, 2, HalfDay),
            (ALICE, MARKETING_TEAM, 6, Leave),
            (CAROL, MARKETING_TEAM, 4, Present),
            (DAVE, OTHER_ORG_TEAM, 4, Present),
        ];
        for (user, team, d, status) in rows {
            h.service.mark(MANAGER, mark(user, team, d, status)).await.unwrap();
        }
    }

    fn record(status: AttendanceStatus, work_hours: Option<f64>) -> AttendanceRecord {
        let stamp = day().and_hms_opt(0, 0, 0).unwrap();
        AttendanceRecord {
            id: 1,
            user_id: ALICE,
            team_id: DEV_TEAM,
            date: day(),
            status,
            check_in_time: None,
            check_out_time: None,
            work_hours,
            notes: None,
            marked_by: ALICE,
            ip_address: None,
            location: None,
            created_at: stamp,
            updated_at: stamp,
        }
    }

    #[test]
    fn statistics_of_nothing_is_zero() {
        assert_eq!(statistics(&[]), AttendanceStatistics::default());
    }

    #[test]
    fn statistics_rounds_percentage_and_hours() {
        use AttendanceStatus::*;
        let records = vec![
            record(Present, Some(8.0)),
            record(Present, Some(7.83)),
            record(Late, Some(6.5)),
            record(HalfDay, Some(3.333)),
            record(Absent, None),
            record(Leave, None),
        ];

        let stats = statistics(&records);

        assert_eq!(stats.total_days, 6);
        assert_eq!(stats.present_days, 2);
        assert_eq!(stats.absent_days, 1);
        assert_eq!(stats.late_days, 1);
        assert_eq!(stats.attendance_percentage, 33);
        assert_eq!(stats.total_work_hours, 25.66);
    }

    #[test]
    fn two_of_three_present_rounds_up() {
        use AttendanceStatus::*;
        let records = vec![record(Present, None), record(Present, None), record(Absent, None)];
        assert_eq!(statistics(&records).attendance_percentage, 67);
    }

    #[actix_web::test]
    async fn my_attendance_is_newest_first_with_today_record() {
        let h = harness();
        seed(&h).await;
        h.service
            .check_in(
                ALICE,
                SelfService {
                    team_id: DEV_TEAM,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let mine = h.service.my_attendance(ALICE, ListFilter::default()).await.unwrap();

        let dates: Vec<_> = mine.attendance.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![date(6), date(5), date(4), date(3)]);
        assert_eq!(mine.statistics.total_days, 4);
        let today = mine.today_record.unwrap();
        assert_eq!(today.date, day());
        assert_eq!(today.status, AttendanceStatus::Present);
    }

    #[actix_web::test]
    async fn date_range_needs_both_bounds() {
        let h = harness();
        seed(&h).await;

        let only_start = ListFilter {
            start_date: Some(date(4)),
            ..Default::default()
        };
        let all = h.service.user_attendance(ALICE, only_start).await.unwrap();
        assert_eq!(all.attendance.len(), 3);

        let bounded = ListFilter {
            start_date: Some(date(4)),
            end_date: Some(date(5)),
            ..Default::default()
        };
        let some = h.service.user_attendance(ALICE, bounded).await.unwrap();
        assert_eq!(some.attendance.len(), 1);
        assert_eq!(some.statistics.late_days, 1);
    }

    #[actix_web::test]
    async fn team_listing_orders_by_date_then_user() {
        let h = harness();
        seed(&h).await;

        let team = h
            .service
            .team_attendance(DEV_TEAM, ListFilter::default())
            .await
            .unwrap();

        assert_eq!(team.team.name, "Development Team");
        let order: Vec<_> = team
            .attendance
            .iter()
            .map(|r| (r.date, r.user_id))
            .collect();
        assert_eq!(
            order,
            vec![(date(4), ALICE), (date(4), BOB), (date(3), ALICE), (date(2), BOB)]
        );

        let missing = h.service.team_attendance(42, ListFilter::default()).await;
        assert!(matches!(missing, Err(AttendanceError::NotFound(_))));
    }

    #[actix_web::test]
    async fn team_report_selects_members_across_teams() {
        let h = harness();
        seed(&h).await;

        let report = h
            .service
            .report(ReportScope::Team, DEV_TEAM, None, GroupBy::Date)
            .await
            .unwrap();

        assert_eq!(report.scope.name, "Development Team");
        // Alice's marketing leave and Dave's day in another organization
        // count too, membership status is not considered
        let dates: Vec<_> = report.raw_data.iter().map(|r| r.date).collect();
        assert_eq!(dates.first(), Some(&date(2)));
        assert_eq!(dates.last(), Some(&date(6)));

        let GroupedReport::ByDate(groups) = report.report else {
            panic!("expected date grouping");
        };
        let fourth = groups[&date(4)];
        assert_eq!(fourth.late, 1);
        assert_eq!(fourth.absent, 1);
        assert_eq!(fourth.present, 1);
        assert_eq!(fourth.total, 3);
        assert_eq!(groups[&date(6)].leave, 1);
    }

    #[actix_web::test]
    async fn organization_report_groups_by_user_with_names() {
        let h = harness();
        seed(&h).await;

        let report = h
            .service
            .report(ReportScope::Organization, ORG, None, GroupBy::User)
            .await
            .unwrap();

        let GroupedReport::ByUser(groups) = report.report else {
            panic!("expected user grouping");
        };
        assert_eq!(groups.len(), 4);
        assert_eq!(groups[&ALICE].name, "Alice");
        assert_eq!(groups[&ALICE].counts.total, 3);
        assert_eq!(groups[&BOB].counts.half_day, 1);
        assert_eq!(groups[&CAROL].counts.present, 1);
        assert_eq!(groups[&DAVE].counts.total, 1);
        assert!(!groups.contains_key(&MANAGER));

        let other = h
            .service
            .report(ReportScope::Organization, OTHER_ORG, None, GroupBy::Date)
            .await
            .unwrap();
        assert_eq!(other.raw_data.len(), 1);
    }

    #[actix_web::test]
    async fn report_scopes_fail_for_unknown_ids() {
        let h = harness();

        for scope in [ReportScope::Team, ReportScope::User, ReportScope::Organization] {
            let result = h.service.report(scope, 404, None, GroupBy::Date).await;
            assert!(matches!(result, Err(AttendanceError::NotFound(_))), "{scope}");
        }
    }

    #[actix_web::test]
    async fn user_without_records_reports_nothing() {
        let h = harness();
        seed(&h).await;
        let empty = h
            .service
            .report(ReportScope::User, MANAGER, None, GroupBy::Date)
            .await
            .unwrap();
        assert!(empty.raw_data.is_empty());
    }

    #[test]
    fn grouped_report_serializes_as_keyed_object() {
        let mut groups = BTreeMap::new();
        let mut counts = StatusCounts::default();
        counts.add(AttendanceStatus::HalfDay);
        groups.insert(day(), counts);

        let json = serde_json::to_value(GroupedReport::ByDate(groups)).unwrap();
        assert_eq!(json["2026-01-05"]["half_day"], 1);
        assert_eq!(json["2026-01-05"]["total"], 1);
    }

    #[test]
    fn scope_and_grouping_parse_from_query_values() {
        assert_eq!(ReportScope::from_str("organization").unwrap(), ReportScope::Organization);
        assert_eq!(GroupBy::from_str("user").unwrap(), GroupBy::User);
        assert!(GroupBy::from_str("status").is_err());
    }
}
