//! Department persistence.

use super::{
    audit_columns, bool_to_int, count_rows, parse_audit, window_sql, RepoError, RepoResult,
    SqlFilter, SqliteReferenceStore, Window,
};
use crate::model::department::{Department, DepartmentId};
use crate::model::EntityKind;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Row};

pub trait DepartmentRepository {
    fn insert_department(&self, department: &Department) -> RepoResult<DepartmentId>;
    /// Writes name, `modified_at` and `is_deleted`.
    fn update_department(&self, department: &Department) -> RepoResult<()>;
    fn find_department(&self, id: DepartmentId) -> RepoResult<Option<Department>>;
    fn count_departments(&self, term: Option<&str>) -> RepoResult<u64>;
    /// Ordered by name, then id.
    fn list_departments(
        &self,
        term: Option<&str>,
        window: Option<Window>,
    ) -> RepoResult<Vec<Department>>;
}

impl SqliteReferenceStore<'_> {
    fn department_filter(&self, term: Option<&str>) -> SqlFilter {
        let mut filter = SqlFilter::active("d");
        if let Some(term) = term {
            filter.push(self.contains_sql("d.name"), [Value::Text(term.to_string())]);
        }
        filter
    }
}

impl DepartmentRepository for SqliteReferenceStore<'_> {
    fn insert_department(&self, department: &Department) -> RepoResult<DepartmentId> {
        let audit = &department.audit;
        self.conn.execute(
            "INSERT INTO departments (
                name,
                creator_id,
                sequence_tag,
                created_at_epoch_ms,
                correlation_id,
                created_at,
                modified_at,
                is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                department.name.as_str(),
                department.creator_id.as_str(),
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

    fn update_department(&self, department: &Department) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE departments
             SET name = ?1, modified_at = ?2, is_deleted = ?3
             WHERE id = ?4;",
            params![
                department.name.as_str(),
                department.audit.modified_at,
                bool_to_int(department.audit.is_deleted),
                department.id,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::Department,
                id: department.id,
            });
        }
        Ok(())
    }

    fn find_department(&self, id: DepartmentId) -> RepoResult<Option<Department>> {
        let mut filter = SqlFilter::active("d");
        filter.push("d.id = ?", [Value::Integer(id)]);
        let mut departments = query_departments(self, &filter, None)?;
        Ok(departments.pop())
    }

    fn count_departments(&self, term: Option<&str>) -> RepoResult<u64> {
        count_rows(self.conn, "FROM departments d", &self.department_filter(term))
    }

    fn list_departments(
        &self,
        term: Option<&str>,
        window: Option<Window>,
    ) -> RepoResult<Vec<Department>> {
        query_departments(self, &self.department_filter(term), window)
    }
}

fn query_departments(
    store: &SqliteReferenceStore<'_>,
    filter: &SqlFilter,
    window: Option<Window>,
) -> RepoResult<Vec<Department>> {
    let sql = format!(
        "SELECT d.id, d.name, d.creator_id, {}
         FROM departments d{}
         ORDER BY d.name ASC, d.id ASC{};",
        audit_columns("d"),
        filter.where_sql(),
        window_sql(window)
    );
    let mut stmt = store.conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(filter.values_with_window(window)))?;
    let mut departments = Vec::new();
    while let Some(row) = rows.next()? {
        departments.push(parse_department_row(row)?);
    }
    Ok(departments)
}

fn parse_department_row(row: &Row<'_>) -> RepoResult<Department> {
    Ok(Department {
        id: row.get("id")?,
        name: row.get("name")?,
        creator_id: row.get("creator_id")?,
        audit: parse_audit(row, EntityKind::Department)?,
    })
}
