use chrono::{DateTime, Utc};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::{Query, QueryAs};
use sqlx::{FromRow, Postgres};
use uuid::Uuid;

/// A value bound to a positional `$n` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    OptionalText(Option<String>),
    Uuid(Uuid),
    UuidList(Vec<Uuid>),
    Timestamp(Option<DateTime<Utc>>),
    BigInt(i64),
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        SqlParam::Text(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        SqlParam::Text(v.to_string())
    }
}

impl From<Option<String>> for SqlParam {
    fn from(v: Option<String>) -> Self {
        SqlParam::OptionalText(v)
    }
}

impl From<Uuid> for SqlParam {
    fn from(v: Uuid) -> Self {
        SqlParam::Uuid(v)
    }
}

impl From<Vec<Uuid>> for SqlParam {
    fn from(v: Vec<Uuid>) -> Self {
        SqlParam::UuidList(v)
    }
}

impl From<DateTime<Utc>> for SqlParam {
    fn from(v: DateTime<Utc>) -> Self {
        SqlParam::Timestamp(Some(v))
    }
}

impl From<Option<DateTime<Utc>>> for SqlParam {
    fn from(v: Option<DateTime<Utc>>) -> Self {
        SqlParam::Timestamp(v)
    }
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        SqlParam::BigInt(v)
    }
}

/// Finished statement: SQL text plus parameters in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlParam>,
}

impl SqlResult {
    pub fn query(&self) -> Query<'_, Postgres, PgArguments> {
        self.params.iter().fold(sqlx::query(&self.query), bind_param_query)
    }

    pub fn query_as<T>(&self) -> QueryAs<'_, Postgres, T, PgArguments>
    where
        T: for<'r> FromRow<'r, PgRow>,
    {
        self.params.iter().fold(sqlx::query_as::<_, T>(&self.query), bind_param_query_as)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatementKind {
    Select,
    Insert,
    Update,
}

/// Accumulates clause fragments for one statement.
///
/// Identifiers are `&'static str` so only compiled-in names can reach the SQL
/// text; every caller-supplied value goes through [`QueryBuilder::param`] and
/// is numbered in the order it was appended.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    kind: StatementKind,
    table: &'static str,
    columns: Vec<&'static str>,
    values: Vec<String>,
    assignments: Vec<String>,
    conditions: Vec<String>,
    order_by: Vec<&'static str>,
    limit: Option<String>,
    offset: Option<String>,
    returning: Option<&'static str>,
    params: Vec<SqlParam>,
}

impl QueryBuilder {
    fn new(kind: StatementKind, table: &'static str) -> Self {
        Self {
            kind,
            table,
            columns: vec![],
            values: vec![],
            assignments: vec![],
            conditions: vec![],
            order_by: vec![],
            limit: None,
            offset: None,
            returning: None,
            params: vec![],
        }
    }

    pub fn select(table: &'static str, columns: &[&'static str]) -> Self {
        let mut builder = Self::new(StatementKind::Select, table);
        builder.columns = columns.to_vec();
        builder
    }

    pub fn insert(table: &'static str) -> Self {
        Self::new(StatementKind::Insert, table)
    }

    pub fn update(table: &'static str) -> Self {
        Self::new(StatementKind::Update, table)
    }

    /// INSERT column bound to a value.
    pub fn value(mut self, column: &'static str, value: impl Into<SqlParam>) -> Self {
        let placeholder = self.param(value.into());
        self.columns.push(column);
        self.values.push(placeholder);
        self
    }

    /// INSERT column set to `now()`.
    pub fn value_now(mut self, column: &'static str) -> Self {
        self.columns.push(column);
        self.values.push("now()".to_string());
        self
    }

    pub fn set(mut self, column: &'static str, value: impl Into<SqlParam>) -> Self {
        let placeholder = self.param(value.into());
        self.assignments.push(format!("{} = {}", column, placeholder));
        self
    }

    /// Appends an assignment only when a value is present.
    pub fn set_if<V: Into<SqlParam>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    pub fn set_now(mut self, column: &'static str) -> Self {
        self.assignments.push(format!("{} = now()", column));
        self
    }

    pub fn where_eq(mut self, column: &'static str, value: impl Into<SqlParam>) -> Self {
        let placeholder = self.param(value.into());
        self.conditions.push(format!("{} = {}", column, placeholder));
        self
    }

    /// Appends an equality condition only when a value is present.
    pub fn where_eq_if<V: Into<SqlParam>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.where_eq(column, v),
            None => self,
        }
    }

    pub fn where_any(mut self, column: &'static str, values: Vec<Uuid>) -> Self {
        let placeholder = self.param(SqlParam::UuidList(values));
        self.conditions.push(format!("{} = ANY({})", column, placeholder));
        self
    }

    pub fn where_null(mut self, column: &'static str) -> Self {
        self.conditions.push(format!("{} IS NULL", column));
        self
    }

    pub fn order_by(mut self, clause: &'static str) -> Self {
        self.order_by.push(clause);
        self
    }

    pub fn limit(mut self, limit: Option<i64>) -> Self {
        if let Some(l) = limit {
            self.limit = Some(self.param(SqlParam::BigInt(l)));
        }
        self
    }

    pub fn offset(mut self, offset: Option<i64>) -> Self {
        if let Some(o) = offset {
            self.offset = Some(self.param(SqlParam::BigInt(o)));
        }
        self
    }

    pub fn returning(mut self, column: &'static str) -> Self {
        self.returning = Some(column);
        self
    }

    pub fn build(self) -> SqlResult {
        let mut parts = vec![];
        match self.kind {
            StatementKind::Select => {
                parts.push(format!("SELECT {} FROM {}", self.columns.join(", "), self.table));
            }
            StatementKind::Insert => {
                parts.push(format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    self.table,
                    self.columns.join(", "),
                    self.values.join(", ")
                ));
            }
            StatementKind::Update => {
                parts.push(format!("UPDATE {} SET {}", self.table, self.assignments.join(", ")));
            }
        }
        if !self.conditions.is_empty() {
            parts.push(format!("WHERE {}", self.conditions.join(" AND ")));
        }
        if !self.order_by.is_empty() {
            parts.push(format!("ORDER BY {}", self.order_by.join(", ")));
        }
        if let Some(limit) = self.limit {
            parts.push(format!("LIMIT {}", limit));
        }
        if let Some(offset) = self.offset {
            parts.push(format!("OFFSET {}", offset));
        }
        if let Some(returning) = self.returning {
            parts.push(format!("RETURNING {}", returning));
        }

        SqlResult { query: parts.join(" "), params: self.params }
    }

    fn param(&mut self, value: SqlParam) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }
}

fn bind_param_query<'q>(
    q: Query<'q, Postgres, PgArguments>,
    v: &'q SqlParam,
) -> Query<'q, Postgres, PgArguments> {
    match v {
        SqlParam::Text(s) => q.bind(s.as_str()),
        SqlParam::OptionalText(s) => q.bind(s.as_deref()),
        SqlParam::Uuid(u) => q.bind(*u),
        SqlParam::UuidList(ids) => q.bind(ids.as_slice()),
        SqlParam::Timestamp(t) => q.bind(*t),
        SqlParam::BigInt(i) => q.bind(*i),
    }
}

fn bind_param_query_as<'q, O>(
    q: QueryAs<'q, Postgres, O, PgArguments>,
    v: &'q SqlParam,
) -> QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v {
        SqlParam::Text(s) => q.bind(s.as_str()),
        SqlParam::OptionalText(s) => q.bind(s.as_deref()),
        SqlParam::Uuid(u) => q.bind(*u),
        SqlParam::UuidList(ids) => q.bind(ids.as_slice()),
        SqlParam::Timestamp(t) => q.bind(*t),
        SqlParam::BigInt(i) => q.bind(*i),
    }
}
