use chrono::NaiveDate;
use sqlx::{MySql, mysql::MySqlArguments, query::QueryAs};

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    U64(u64),
    String(String),
    Date(NaiveDate),
}

/// ===============================
/// Dynamic WHERE clause
/// ===============================
/// Conditions are joined with AND; each `?` placeholder has one entry in
/// `values`, in order.
#[derive(Debug, Default)]
pub struct WhereClause {
    conditions: Vec<String>,
    values: Vec<SqlValue>,
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, condition: &str, value: SqlValue) -> &mut Self {
        self.conditions.push(condition.to_string());
        self.values.push(value);
        self
    }

    pub fn push_between(&mut self, column: &str, start: NaiveDate, end: NaiveDate) -> &mut Self {
        self.conditions.push(format!("{column} BETWEEN ? AND ?"));
        self.values.push(SqlValue::Date(start));
        self.values.push(SqlValue::Date(end));
        self
    }

    /// `column IN (...)`; an empty list can never match
    pub fn push_in(&mut self, column: &str, ids: &[u64]) -> &mut Self {
        if ids.is_empty() {
            self.conditions.push("1 = 0".to_string());
            return self;
        }
        self.conditions
            .push(format!("{column} IN ({})", placeholders(ids.len())));
        self.values.extend(ids.iter().copied().map(SqlValue::U64));
        self
    }

    pub fn sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    pub fn bind<'q, O>(
        &self,
        query: QueryAs<'q, MySql, O, MySqlArguments>,
    ) -> QueryAs<'q, MySql, O, MySqlArguments> {
        bind_values(query, self.values.clone())
    }
}

/// `?, ?, ?` for `n` values
pub fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

pub fn bind_values<'q, O>(
    mut query: QueryAs<'q, MySql, O, MySqlArguments>,
    values: Vec<SqlValue>,
) -> QueryAs<'q, MySql, O, MySqlArguments> {
    for value in values {
        query = match value {
            SqlValue::U64(v) => query.bind(v),
            SqlValue::String(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
        };
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_clause_renders_nothing() {
        assert_eq!(WhereClause::new().sql(), "");
    }

    #[test]
    fn conditions_join_with_and_in_binding_order() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();

        let mut clause = WhereClause::new();
        clause
            .push("team_id = ?", SqlValue::U64(2))
            .push_between("date", start, end)
            .push("status = ?", SqlValue::String("late".into()));

        assert_eq!(
            clause.sql(),
            "WHERE team_id = ? AND date BETWEEN ? AND ? AND status = ?"
        );
        assert_eq!(
            clause.values(),
            &[
                SqlValue::U64(2),
                SqlValue::Date(start),
                SqlValue::Date(end),
                SqlValue::String("late".into()),
            ]
        );
    }

    #[test]
    fn in_list_expands_placeholders() {
        let mut clause = WhereClause::new();
        clause.push_in("user_id", &[3, 5, 8]);
        assert_eq!(clause.sql(), "WHERE user_id IN (?, ?, ?)");
        assert_eq!(clause.values().len(), 3);
    }

    #[test]
    fn empty_in_list_matches_nothing() {
        let mut clause = WhereClause::new();
        clause.push_in("user_id", &[]);
        assert_eq!(clause.sql(), "WHERE 1 = 0");
        assert!(clause.values().is_empty());
    }
}
