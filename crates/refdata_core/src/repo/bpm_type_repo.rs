//! BPM type persistence.

use super::{audit_columns, bool_to_int, parse_audit, RepoError, RepoResult, SqliteReferenceStore};
use crate::model::bpm_type::{BpmType, BpmTypeId};
use crate::model::EntityKind;
use rusqlite::{params, Row};

pub trait BpmTypeRepository {
    fn insert_bpm_type(&self, bpm_type: &BpmType) -> RepoResult<BpmTypeId>;
    fn update_bpm_type(&self, bpm_type: &BpmType) -> RepoResult<()>;
    fn find_bpm_type(&self, id: BpmTypeId) -> RepoResult<Option<BpmType>>;
    /// Non-deleted BPM types ordered by name.
    fn list_bpm_types(&self) -> RepoResult<Vec<BpmType>>;
}

impl BpmTypeRepository for SqliteReferenceStore<'_> {
    fn insert_bpm_type(&self, bpm_type: &BpmType) -> RepoResult<BpmTypeId> {
        let audit = &bpm_type.audit;
        self.conn.execute(
            "INSERT INTO bpm_types (
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
                bpm_type.name.as_str(),
                bpm_type.creator_id.as_str(),
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

    fn update_bpm_type(&self, bpm_type: &BpmType) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE bpm_types SET name = ?1, modified_at = ?2, is_deleted = ?3 WHERE id = ?4;",
            params![
                bpm_type.name.as_str(),
                bpm_type.audit.modified_at,
                bool_to_int(bpm_type.audit.is_deleted),
                bpm_type.id,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::BpmType,
                id: bpm_type.id,
            });
        }
        Ok(())
    }

    fn find_bpm_type(&self, id: BpmTypeId) -> RepoResult<Option<BpmType>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT b.id, b.name, b.creator_id, {}
             FROM bpm_types b
             WHERE b.id = ?1 AND COALESCE(b.is_deleted, 0) = 0;",
            audit_columns("b")
        ))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_bpm_type_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_bpm_types(&self) -> RepoResult<Vec<BpmType>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT b.id, b.name, b.creator_id, {}
             FROM bpm_types b
             WHERE COALESCE(b.is_deleted, 0) = 0
             ORDER BY b.name ASC, b.id ASC;",
            audit_columns("b")
        ))?;
        let mut rows = stmt.query([])?;
        let mut bpm_types = Vec::new();
        while let Some(row) = rows.next()? {
            bpm_types.push(parse_bpm_type_row(row)?);
        }
        Ok(bpm_types)
    }
}

fn parse_bpm_type_row(row: &Row<'_>) -> RepoResult<BpmType> {
    Ok(BpmType {
        id: row.get("id")?,
        name: row.get("name")?,
        creator_id: row.get("creator_id")?,
        audit: parse_audit(row, EntityKind::BpmType)?,
    })
}
