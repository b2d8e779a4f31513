//! Scope persistence and department-joined scope views.

use super::{
    audit_columns, bool_to_int, count_rows, parse_audit, window_sql, RepoError, RepoResult,
    SqlFilter, SqliteReferenceStore, Window,
};
use crate::model::department::DepartmentId;
use crate::model::scope::{Scope, ScopeId, ScopeView};
use crate::model::EntityKind;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Row};

const SCOPE_VIEW_FROM_SQL: &str = "FROM scopes s JOIN departments d ON d.id = s.department_id";

/// Listing filter for scopes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeFilter {
    pub department_id: Option<DepartmentId>,
    /// Substring of the scope name.
    pub term: Option<String>,
}

pub trait ScopeRepository {
    fn insert_scope(&self, scope: &Scope) -> RepoResult<ScopeId>;
    /// Writes name, department, `modified_at` and `is_deleted`.
    fn update_scope(&self, scope: &Scope) -> RepoResult<()>;
    fn find_scope(&self, id: ScopeId) -> RepoResult<Option<Scope>>;
    fn find_scope_view(&self, id: ScopeId) -> RepoResult<Option<ScopeView>>;
    fn count_scopes(&self, filter: &ScopeFilter) -> RepoResult<u64>;
    /// Ordered by department name, scope name, then id.
    fn list_scope_views(
        &self,
        filter: &ScopeFilter,
        window: Option<Window>,
    ) -> RepoResult<Vec<ScopeView>>;
}

impl SqliteReferenceStore<'_> {
    fn scope_filter(&self, filter: &ScopeFilter) -> SqlFilter {
        let mut sql_filter = SqlFilter::active("s");
        if let Some(department_id) = filter.department_id {
            sql_filter.push("s.department_id = ?", [Value::Integer(department_id)]);
        }
        if let Some(term) = filter.term.as_deref() {
            sql_filter.push(self.contains_sql("s.name"), [Value::Text(term.to_string())]);
        }
        sql_filter
    }
}

impl ScopeRepository for SqliteReferenceStore<'_> {
    fn insert_scope(&self, scope: &Scope) -> RepoResult<ScopeId> {
        let audit = &scope.audit;
        self.conn.execute(
            "INSERT INTO scopes (
                name,
                department_id,
                creator_id,
                sequence_tag,
                created_at_epoch_ms,
                correlation_id,
                created_at,
                modified_at,
                is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                scope.name.as_str(),
                scope.department_id,
                scope.creator_id.as_str(),
                audit.sequence_tag,
                audit.created_at_epoch_ms,
                audit.correlation_id.to_string(),
                audit.created_at,
                audit.modified_at,
                bool_to_int(audit.is_deleted),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_scope(&self, scope: &Scope) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE scopes
             SET name = ?1, department_id = ?2, modified_at = ?3, is_deleted = ?4
             WHERE id = ?5;",
            params![
                scope.name.as_str(),
                scope.department_id,
                scope.audit.modified_at,
                bool_to_int(scope.audit.is_deleted),
                scope.id,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::Scope,
                id: scope.id,
            });
        }
        Ok(())
    }

    fn find_scope(&self, id: ScopeId) -> RepoResult<Option<Scope>> {
        Ok(self.find_scope_view(id)?.map(|view| view.scope))
    }

    fn find_scope_view(&self, id: ScopeId) -> RepoResult<Option<ScopeView>> {
        let mut filter = SqlFilter::active("s");
        filter.push("s.id = ?", [Value::Integer(id)]);
        Ok(query_scope_views(self, &filter, None)?.pop())
    }

    fn count_scopes(&self, filter: &ScopeFilter) -> RepoResult<u64> {
        count_rows(self.conn, SCOPE_VIEW_FROM_SQL, &self.scope_filter(filter))
    }

    fn list_scope_views(
        &self,
        filter: &ScopeFilter,
        window: Option<Window>,
    ) -> RepoResult<Vec<ScopeView>> {
        query_scope_views(self, &self.scope_filter(filter), window)
    }
}

fn query_scope_views(
    store: &SqliteReferenceStore<'_>,
    filter: &SqlFilter,
    window: Option<Window>,
) -> RepoResult<Vec<ScopeView>> {
    let sql = format!(
        "SELECT s.id, s.name, s.department_id, s.creator_id, {}, d.name AS department_name
         {SCOPE_VIEW_FROM_SQL}{}
         ORDER BY d.name ASC, s.name ASC, s.id ASC{};",
        audit_columns("s"),
        filter.where_sql(),
        window_sql(window)
    );
    let mut stmt = store.conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(filter.values_with_window(window)))?;
    let mut views = Vec::new();
    while let Some(row) = rows.next()? {
        views.push(parse_scope_view_row(row)?);
    }
    Ok(views)
}

fn parse_scope_view_row(row: &Row<'_>) -> RepoResult<ScopeView> {
    Ok(ScopeView {
        scope: Scope {
            id: row.get("id")?,
            name: row.get("name")?,
            department_id: row.get("department_id")?,
            creator_id: row.get("creator_id")?,
            audit: parse_audit(row, EntityKind::Scope)?,
        },
        department_name: row.get("department_name")?,
    })
}
