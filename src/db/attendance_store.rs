use crate::{
    attendance::{
        StoreError,
        store::{AttendanceFilter, AttendanceStore, RecordOrder},
    },
    db::{is_foreign_key_violation, is_unique_violation},
    model::attendance::{AttendanceRecord, AttendanceStatus, NaturalKey, NewAttendance},
    utils::db_utils::{SqlValue, WhereClause, bind_values},
};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::{FromRow, MySqlPool};
use tracing::{debug, error};

const COLUMNS: &str = "id, user_id, team_id, date, status, check_in_time, check_out_time, \
     work_hours, notes, marked_by, ip_address, location, created_at, updated_at";

#[derive(Debug, FromRow)]
struct AttendanceRow {
    id: u64,
    user_id: u64,
    team_id: u64,
    date: NaiveDate,
    status: String,
    check_in_time: Option<NaiveTime>,
    check_out_time: Option<NaiveTime>,
    work_hours: Option<f64>,
    notes: Option<String>,
    marked_by: u64,
    ip_address: Option<String>,
    location: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = StoreError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let status = AttendanceStatus::parse(&row.status).ok_or_else(|| {
            StoreError::Corrupt(format!(
                "attendance {} has unknown status {:?}",
                row.id, row.status
            ))
        })?;

        Ok(AttendanceRecord {
            id: row.id,
            user_id: row.user_id,
            team_id: row.team_id,
            date: row.date,
            status,
            check_in_time: row.check_in_time,
            check_out_time: row.check_out_time,
            work_hours: row.work_hours,
            notes: row.notes,
            marked_by: row.marked_by,
            ip_address: row.ip_address,
            location: row.location,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn order_by(order: RecordOrder) -> &'static str {
    match order {
        RecordOrder::DateDesc => "ORDER BY date DESC, id DESC",
        RecordOrder::DateDescUserAsc => "ORDER BY date DESC, user_id ASC",
        RecordOrder::DateAsc => "ORDER BY date ASC, id ASC",
    }
}

fn where_clause(filter: &AttendanceFilter) -> WhereClause {
    let mut clause = WhereClause::new();
    if let Some(user_id) = filter.user_id {
        clause.push("user_id = ?", SqlValue::U64(user_id));
    }
    if let Some(team_id) = filter.team_id {
        clause.push("team_id = ?", SqlValue::U64(team_id));
    }
    if let Some(user_ids) = &filter.user_ids {
        clause.push_in("user_id", user_ids);
    }
    if let Some(range) = filter.date_range {
        clause.push_between("date", range.start, range.end);
    }
    if let Some(status) = filter.status {
        clause.push("status = ?", SqlValue::String(status.to_string()));
    }
    clause
}

#[derive(Clone)]
pub struct MySqlAttendanceStore {
    pool: MySqlPool,
}

impl MySqlAttendanceStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        condition: &str,
        binds: Vec<SqlValue>,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM attendances WHERE {condition} LIMIT 1");
        let query = bind_values(sqlx::query_as::<_, AttendanceRow>(&sql), binds);

        let row = query.fetch_optional(&self.pool).await.map_err(|e| {
            error!(error = %e, sql = %sql, "Failed to fetch attendance");
            StoreError::from(e)
        })?;

        row.map(AttendanceRecord::try_from).transpose()
    }
}

#[async_trait]
impl AttendanceStore for MySqlAttendanceStore {
    async fn find_by_key(&self, key: &NaturalKey) -> Result<Option<AttendanceRecord>, StoreError> {
        self.fetch_one_where(
            "user_id = ? AND team_id = ? AND date = ?",
            vec![
                SqlValue::U64(key.user_id),
                SqlValue::U64(key.team_id),
                SqlValue::Date(key.date),
            ],
        )
        .await
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<AttendanceRecord>, StoreError> {
        self.fetch_one_where("id = ?", vec![SqlValue::U64(id)]).await
    }

    async fn insert(&self, record: NewAttendance) -> Result<AttendanceRecord, StoreError> {
        let key = record.key();

        let result = sqlx::query(
            r#"
            INSERT INTO attendances
            (user_id, team_id, date, status, check_in_time, check_out_time,
             work_hours, notes, marked_by, ip_address, location)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.user_id)
        .bind(record.team_id)
        .bind(record.date)
        .bind(record.status.as_ref())
        .bind(record.check_in_time)
        .bind(record.check_out_time)
        .bind(record.work_hours)
        .bind(&record.notes)
        .bind(record.marked_by)
        .bind(&record.ip_address)
        .bind(&record.location)
        .execute(&self.pool)
        .await;

        let id = match result {
            Ok(done) => done.last_insert_id(),
            Err(e) if is_unique_violation(&e) => {
                debug!(user_id = key.user_id, team_id = key.team_id, date = %key.date, "Duplicate attendance key");
                return Err(StoreError::Conflict {
                    user_id: key.user_id,
                    team_id: key.team_id,
                    date: key.date,
                });
            }
            Err(e) if is_foreign_key_violation(&e) => {
                debug!(user_id = key.user_id, team_id = key.team_id, "Attendance references a missing row");
                return Err(StoreError::MissingReference("user or team".into()));
            }
            Err(e) => {
                error!(error = %e, user_id = key.user_id, team_id = key.team_id, "Failed to insert attendance");
                return Err(e.into());
            }
        };

        self.find_by_id(id).await?.ok_or(StoreError::Missing(id))
    }

    async fn update(&self, record: &AttendanceRecord) -> Result<AttendanceRecord, StoreError> {
        sqlx::query(
            r#"
            UPDATE attendances
            SET status = ?, check_in_time = ?, check_out_time = ?, work_hours = ?,
                notes = ?, ip_address = ?, location = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(record.status.as_ref())
        .bind(record.check_in_time)
        .bind(record.check_out_time)
        .bind(record.work_hours)
        .bind(&record.notes)
        .bind(&record.ip_address)
        .bind(&record.location)
        .bind(record.id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, record_id = record.id, "Failed to update attendance");
            StoreError::from(e)
        })?;

        // MySQL reports zero affected rows when nothing changed, so existence
        // is decided by reading the row back
        self.find_by_id(record.id)
            .await?
            .ok_or(StoreError::Missing(record.id))
    }

    async fn query(&self, filter: &AttendanceFilter) -> Result<Vec<AttendanceRecord>, StoreError> {
        let clause = where_clause(filter);
        let sql = format!(
            "SELECT {COLUMNS} FROM attendances {} {}",
            clause.sql(),
            order_by(filter.order)
        );
        debug!(sql = %sql, bindings = ?clause.values(), "Querying attendance");

        let rows = clause
            .bind(sqlx::query_as::<_, AttendanceRow>(&sql))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, sql = %sql, "Failed to query attendance");
                StoreError::from(e)
            })?;

        rows.into_iter().map(AttendanceRecord::try_from).collect()
    }
}
