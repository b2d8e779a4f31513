//! Service feature persistence.

use super::{audit_columns, bool_to_int, parse_audit, parse_flag, RepoError, RepoResult, SqliteReferenceStore};
use crate::model::service_feature::{ServiceFeature, ServiceFeatureId};
use crate::model::EntityKind;
use rusqlite::{params, Row};

pub trait ServiceFeatureRepository {
    fn insert_service_feature(&self, feature: &ServiceFeature) -> RepoResult<ServiceFeatureId>;
    fn update_service_feature(&self, feature: &ServiceFeature) -> RepoResult<()>;
    fn find_service_feature(&self, id: ServiceFeatureId) -> RepoResult<Option<ServiceFeature>>;
    /// Ordered by display order, then name.
    fn list_service_features(&self, active_only: bool) -> RepoResult<Vec<ServiceFeature>>;
}

impl ServiceFeatureRepository for SqliteReferenceStore<'_> {
    fn insert_service_feature(&self, feature: &ServiceFeature) -> RepoResult<ServiceFeatureId> {
        let audit = &feature.audit;
        self.conn.execute(
            "INSERT INTO service_features (
                name,
                description,
                code,
                icon,
                color,
                display_order,
                is_active,
                creator_id,
                sequence_tag,
                created_at_epoch_ms,
                correlation_id,
                created_at,
                modified_at,
                is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14);",
            params![
                feature.name.as_str(),
                feature.description.as_deref(),
                feature.code.as_deref(),
                feature.icon.as_deref(),
                feature.color.as_deref(),
                feature.display_order,
                bool_to_int(feature.is_active),
                feature.creator_id.as_str(),
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

    fn update_service_feature(&self, feature: &ServiceFeature) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE service_features
             SET
                name = ?1,
                description = ?2,
                code = ?3,
                icon = ?4,
                color = ?5,
                display_order = ?6,
                is_active = ?7,
                modified_at = ?8,
                is_deleted = ?9
             WHERE id = ?10;",
            params![
                feature.name.as_str(),
                feature.description.as_deref(),
                feature.code.as_deref(),
                feature.icon.as_deref(),
                feature.color.as_deref(),
                feature.display_order,
                bool_to_int(feature.is_active),
                feature.audit.modified_at,
                bool_to_int(feature.audit.is_deleted),
                feature.id,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::ServiceFeature,
                id: feature.id,
            });
        }
        Ok(())
    }

    fn find_service_feature(&self, id: ServiceFeatureId) -> RepoResult<Option<ServiceFeature>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT f.id, f.name, f.description, f.code, f.icon, f.color,
                    f.display_order, f.is_active, f.creator_id, {}
             FROM service_features f
             WHERE f.id = ?1 AND COALESCE(f.is_deleted, 0) = 0;",
            audit_columns("f")
        ))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_service_feature_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_service_features(&self, active_only: bool) -> RepoResult<Vec<ServiceFeature>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT f.id, f.name, f.description, f.code, f.icon, f.color,
                    f.display_order, f.is_active, f.creator_id, {}
             FROM service_features f
             WHERE COALESCE(f.is_deleted, 0) = 0
               AND (?1 = 0 OR f.is_active = 1)
             ORDER BY f.display_order ASC, f.name ASC, f.id ASC;",
            audit_columns("f")
        ))?;
        let mut rows = stmt.query([bool_to_int(active_only)])?;
        let mut features = Vec::new();
        while let Some(row) = rows.next()? {
            features.push(parse_service_feature_row(row)?);
        }
        Ok(features)
    }
}

fn parse_service_feature_row(row: &Row<'_>) -> RepoResult<ServiceFeature> {
    Ok(ServiceFeature {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        code: row.get("code")?,
        icon: row.get("icon")?,
        color: row.get("color")?,
        display_order: row.get("display_order")?,
        is_active: parse_flag(row.get("is_active")?, "service_features.is_active")?,
        creator_id: row.get("creator_id")?,
        audit: parse_audit(row, EntityKind::ServiceFeature)?,
    })
}
