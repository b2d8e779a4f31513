//! Repository layer abstractions and the SQLite reference store.
//!
//! # Responsibility
//! - Define per-entity persistence contracts plus the shared lookups the
//!   integrity rules run against.
//! - Provide the unit-of-work boundary every mutating use case runs in.
//! - Isolate SQL details from service orchestration.
//!
//! # Invariants
//! - `find_*` and list APIs never return soft-deleted rows.
//! - A NULL `is_deleted` column is read as "not deleted".
//! - Unique index violations surface as [`RepoError::UniqueViolation`], not
//!   as opaque database errors.
//!
//! # See also
//! - `crate::db` for schema and migrations.

pub mod bpm_type_repo;
pub mod department_repo;
pub mod link_repo;
pub mod main_title_repo;
pub mod product_type_repo;
pub mod scope_repo;
pub mod service_feature_repo;

use crate::config::NameMatchMode;
use crate::db::DbError;
use crate::model::department::DepartmentId;
use crate::model::kind::ReorderTarget;
use crate::model::main_title::MainTitleId;
use crate::model::scope::ScopeId;
use crate::model::service_feature::ServiceFeatureId;
use crate::model::{AuditFields, EntityKind};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub use bpm_type_repo::BpmTypeRepository;
pub use department_repo::DepartmentRepository;
pub use link_repo::{LinkFilter, LinkRepository};
pub use main_title_repo::{MainTitleFilter, MainTitleOrder, MainTitleRepository};
pub use product_type_repo::{ProductTypeFilter, ProductTypeRepository};
pub use scope_repo::{ScopeFilter, ScopeRepository};
pub use service_feature_repo::ServiceFeatureRepository;

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence error for reference-data storage.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound { kind: EntityKind, id: i64 },
    InvalidData(String),
    /// A partial unique index rejected the write.
    UniqueViolation(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UniqueViolation(message) => write!(f, "unique constraint violated: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, message) = &value {
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
                return Self::UniqueViolation(
                    message.clone().unwrap_or_else(|| failure.to_string()),
                );
            }
        }
        Self::Db(DbError::Sqlite(value))
    }
}

/// Limit/offset slice of an ordered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub limit: u32,
    pub offset: u32,
}

/// Sibling set a name must be unique within.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameScope {
    Global,
    Department(DepartmentId),
    Scope(ScopeId),
}

/// Read-only lookups the integrity rules are evaluated against.
pub trait IntegrityLookup {
    /// `true` when the row exists and is not soft-deleted.
    fn is_active(&self, kind: EntityKind, id: i64) -> RepoResult<bool>;
    /// `true` when a non-deleted sibling other than `exclude_id` has `name`.
    fn name_in_use(
        &self,
        kind: EntityKind,
        name: &str,
        scope: NameScope,
        exclude_id: Option<i64>,
    ) -> RepoResult<bool>;
    fn code_in_use(&self, code: &str, exclude_id: Option<ServiceFeatureId>) -> RepoResult<bool>;
    fn active_link_exists(
        &self,
        main_title_id: MainTitleId,
        service_feature_id: ServiceFeatureId,
    ) -> RepoResult<bool>;
    /// Audit fields of a row, soft-deleted or not.
    fn find_audit(&self, kind: EntityKind, id: i64) -> RepoResult<Option<AuditFields>>;
}

/// Batch display-order access used by bulk reorder.
pub trait DisplayOrderRepository {
    /// Returns the subset of `ids` that exist and are not soft-deleted.
    fn find_active_ids(&self, target: ReorderTarget, ids: &[i64]) -> RepoResult<Vec<i64>>;
    /// Writes each `(id, order)` pair and stamps `modified_at`.
    fn apply_display_orders(
        &self,
        target: ReorderTarget,
        orders: &[(i64, i32)],
        modified_at: DateTime<Utc>,
    ) -> RepoResult<usize>;
}

/// Transaction boundary for read-validate-write sequences.
pub trait UnitOfWork {
    /// Runs `work` in one write transaction; commits on `Ok`, rolls back
    /// on `Err`.
    fn unit_of_work<T, E, F>(&self, work: F) -> Result<T, E>
    where
        Self: Sized,
        E: From<RepoError>,
        F: FnOnce(&Self) -> Result<T, E>;
}

/// Everything the services need from persistence.
pub trait ReferenceStore:
    DepartmentRepository
    + ScopeRepository
    + BpmTypeRepository
    + MainTitleRepository
    + ProductTypeRepository
    + ServiceFeatureRepository
    + LinkRepository
    + IntegrityLookup
    + DisplayOrderRepository
    + UnitOfWork
{
}

impl<T> ReferenceStore for T where
    T: DepartmentRepository
        + ScopeRepository
        + BpmTypeRepository
        + MainTitleRepository
        + ProductTypeRepository
        + ServiceFeatureRepository
        + LinkRepository
        + IntegrityLookup
        + DisplayOrderRepository
        + UnitOfWork
{
}

/// SQLite-backed reference store.
#[derive(Debug, Clone, Copy)]
pub struct SqliteReferenceStore<'conn> {
    conn: &'conn Connection,
    match_mode: NameMatchMode,
}

impl<'conn> SqliteReferenceStore<'conn> {
    pub fn new(conn: &'conn Connection, match_mode: NameMatchMode) -> Self {
        Self { conn, match_mode }
    }

    /// SQL predicate comparing `column` with one bound name.
    pub(crate) fn name_equals_sql(&self, column: &str) -> String {
        match self.match_mode {
            NameMatchMode::Exact => format!("{column} = ?"),
            NameMatchMode::CaseInsensitive => format!("{column} = ? COLLATE NOCASE"),
        }
    }

    /// SQL predicate testing whether `column` contains one bound term.
    pub(crate) fn contains_sql(&self, column: &str) -> String {
        match self.match_mode {
            NameMatchMode::Exact => format!("instr(COALESCE({column}, ''), ?) > 0"),
            NameMatchMode::CaseInsensitive => {
                format!("instr(lower(COALESCE({column}, '')), lower(?)) > 0")
            }
        }
    }
}

impl UnitOfWork for SqliteReferenceStore<'_> {
    fn unit_of_work<T, E, F>(&self, work: F) -> Result<T, E>
    where
        E: From<RepoError>,
        F: FnOnce(&Self) -> Result<T, E>,
    {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(RepoError::from)?;
        let value = work(self)?;
        tx.commit().map_err(RepoError::from)?;
        Ok(value)
    }
}

impl IntegrityLookup for SqliteReferenceStore<'_> {
    fn is_active(&self, kind: EntityKind, id: i64) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            &format!(
                "SELECT EXISTS(
                    SELECT 1 FROM {} WHERE id = ?1 AND COALESCE(is_deleted, 0) = 0
                );",
                kind.table()
            ),
            [id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn name_in_use(
        &self,
        kind: EntityKind,
        name: &str,
        scope: NameScope,
        exclude_id: Option<i64>,
    ) -> RepoResult<bool> {
        let mut filter = SqlFilter::active("t");
        filter.push(self.name_equals_sql("t.name"), [Value::Text(name.to_string())]);
        match scope {
            NameScope::Global => {}
            NameScope::Department(id) => filter.push("t.department_id = ?", [Value::Integer(id)]),
            NameScope::Scope(id) => filter.push("t.scope_id = ?", [Value::Integer(id)]),
        }
        if let Some(id) = exclude_id {
            filter.push("t.id <> ?", [Value::Integer(id)]);
        }

        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} t{});",
            kind.table(),
            filter.where_sql()
        );
        let exists: i64 =
            self.conn
                .query_row(&sql, params_from_iter(filter.values()), |row| row.get(0))?;
        Ok(exists == 1)
    }

    fn code_in_use(&self, code: &str, exclude_id: Option<ServiceFeatureId>) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM service_features
                WHERE code = ?1
                  AND COALESCE(is_deleted, 0) = 0
                  AND (?2 IS NULL OR id <> ?2)
            );",
            params![code, exclude_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn active_link_exists(
        &self,
        main_title_id: MainTitleId,
        service_feature_id: ServiceFeatureId,
    ) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM main_title_service_features
                WHERE main_title_id = ?1
                  AND service_feature_id = ?2
                  AND COALESCE(is_deleted, 0) = 0
            );",
            params![main_title_id, service_feature_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn find_audit(&self, kind: EntityKind, id: i64) -> RepoResult<Option<AuditFields>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM {} t WHERE t.id = ?1;",
            audit_columns("t"),
            kind.table()
        ))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_audit(row, kind)?)),
            None => Ok(None),
        }
    }
}

impl DisplayOrderRepository for SqliteReferenceStore<'_> {
    fn find_active_ids(&self, target: ReorderTarget, ids: &[i64]) -> RepoResult<Vec<i64>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id FROM {} WHERE COALESCE(is_deleted, 0) = 0 AND id IN ({placeholders});",
            target.kind().table()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let found = stmt
            .query_map(params_from_iter(ids.iter()), |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(found)
    }

    fn apply_display_orders(
        &self,
        target: ReorderTarget,
        orders: &[(i64, i32)],
        modified_at: DateTime<Utc>,
    ) -> RepoResult<usize> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "UPDATE {}
             SET display_order = ?1, modified_at = ?2
             WHERE id = ?3 AND COALESCE(is_deleted, 0) = 0;",
            target.kind().table()
        ))?;
        let mut changed = 0;
        for (id, order) in orders {
            changed += stmt.execute(params![order, modified_at, id])?;
        }
        Ok(changed)
    }
}

/// Accumulates `AND`-joined predicates and their bound values.
#[derive(Debug, Default)]
pub(crate) struct SqlFilter {
    clauses: Vec<String>,
    values: Vec<Value>,
}

impl SqlFilter {
    /// Starts with the non-deleted predicate for table alias `alias`.
    pub(crate) fn active(alias: &str) -> Self {
        Self {
            clauses: vec![format!("COALESCE({alias}.is_deleted, 0) = 0")],
            values: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, clause: impl Into<String>, values: impl IntoIterator<Item = Value>) {
        self.clauses.push(clause.into());
        self.values.extend(values);
    }

    pub(crate) fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub(crate) fn values(&self) -> &[Value] {
        &self.values
    }

    /// Bound values followed by `LIMIT/OFFSET` values of `window`.
    pub(crate) fn values_with_window(&self, window: Option<Window>) -> Vec<Value> {
        let mut values = self.values.clone();
        if let Some(window) = window {
            values.push(Value::Integer(i64::from(window.limit)));
            values.push(Value::Integer(i64::from(window.offset)));
        }
        values
    }
}

pub(crate) fn window_sql(window: Option<Window>) -> &'static str {
    if window.is_some() {
        " LIMIT ? OFFSET ?"
    } else {
        ""
    }
}

/// Column list for the audit block of table alias `alias`.
pub(crate) fn audit_columns(alias: &str) -> String {
    format!(
        "{alias}.sequence_tag, {alias}.created_at_epoch_ms, {alias}.correlation_id, \
         {alias}.created_at, {alias}.modified_at, {alias}.is_deleted"
    )
}

pub(crate) fn parse_audit(row: &Row<'_>, kind: EntityKind) -> RepoResult<AuditFields> {
    let correlation_text: String = row.get("correlation_id")?;
    let correlation_id = Uuid::parse_str(&correlation_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{correlation_text}` in {}.correlation_id",
            kind.table()
        ))
    })?;

    let is_deleted = match row.get::<_, Option<i64>>("is_deleted")? {
        None | Some(0) => false,
        Some(1) => true,
        Some(other) => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_deleted value `{other}` in {}.is_deleted",
                kind.table()
            )));
        }
    };

    Ok(AuditFields {
        sequence_tag: row.get("sequence_tag")?,
        created_at_epoch_ms: row.get("created_at_epoch_ms")?,
        correlation_id,
        created_at: row.get("created_at")?,
        modified_at: row.get("modified_at")?,
        is_deleted,
    })
}

pub(crate) fn parse_flag(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

/// Runs a counting query built from `filter`.
pub(crate) fn count_rows(conn: &Connection, from_sql: &str, filter: &SqlFilter) -> RepoResult<u64> {
    let sql = format!("SELECT COUNT(*) {from_sql}{};", filter.where_sql());
    let count: i64 = conn.query_row(&sql, params_from_iter(filter.values()), |row| row.get(0))?;
    u64::try_from(count).map_err(|_| RepoError::InvalidData(format!("negative count `{count}`")))
}
