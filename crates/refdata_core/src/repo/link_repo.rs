//! Main title / service feature link persistence.

use super::{
    audit_columns, bool_to_int, parse_audit, parse_flag, RepoError, RepoResult, SqlFilter,
    SqliteReferenceStore,
};
use crate::model::main_title::MainTitleId;
use crate::model::service_feature::{LinkId, LinkView, MainTitleServiceFeature, ServiceFeatureId};
use crate::model::EntityKind;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Row};

/// Listing filter for links. Soft-deleted links are never listed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkFilter {
    pub main_title_id: Option<MainTitleId>,
    pub service_feature_id: Option<ServiceFeatureId>,
    /// Only links whose own `is_active` flag is set.
    pub active_only: bool,
}

impl LinkFilter {
    fn order_by_sql(&self) -> &'static str {
        match (self.main_title_id, self.service_feature_id) {
            (Some(_), _) => "l.display_order ASC, f.name ASC, l.id ASC",
            (None, Some(_)) => "mt.name ASC, l.id ASC",
            (None, None) => "l.main_title_id ASC, l.display_order ASC, l.id ASC",
        }
    }
}

pub trait LinkRepository {
    fn insert_link(&self, link: &MainTitleServiceFeature) -> RepoResult<LinkId>;
    /// Writes activation state, order, notes, timestamps and `is_deleted`.
    fn update_link(&self, link: &MainTitleServiceFeature) -> RepoResult<()>;
    fn find_link(&self, id: LinkId) -> RepoResult<Option<MainTitleServiceFeature>>;
    fn list_link_views(&self, filter: &LinkFilter) -> RepoResult<Vec<LinkView>>;
}

impl LinkRepository for SqliteReferenceStore<'_> {
    fn insert_link(&self, link: &MainTitleServiceFeature) -> RepoResult<LinkId> {
        let audit = &link.audit;
        self.conn.execute(
            "INSERT INTO main_title_service_features (
                main_title_id,
                service_feature_id,
                is_active,
                display_order,
                notes,
                activated_at,
                deactivated_at,
                creator_id,
                sequence_tag,
                created_at_epoch_ms,
                correlation_id,
                created_at,
                modified_at,
                is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14);",
            params![
                link.main_title_id,
                link.service_feature_id,
                bool_to_int(link.is_active),
                link.display_order,
                link.notes.as_deref(),
                link.activated_at,
                link.deactivated_at,
                link.creator_id.as_str(),
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

    fn update_link(&self, link: &MainTitleServiceFeature) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE main_title_service_features
             SET
                is_active = ?1,
                display_order = ?2,
                notes = ?3,
                activated_at = ?4,
                deactivated_at = ?5,
                modified_at = ?6,
                is_deleted = ?7
             WHERE id = ?8;",
            params![
                bool_to_int(link.is_active),
                link.display_order,
                link.notes.as_deref(),
                link.activated_at,
                link.deactivated_at,
                link.audit.modified_at,
                bool_to_int(link.audit.is_deleted),
                link.id,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::MainTitleServiceFeature,
                id: link.id,
            });
        }
        Ok(())
    }

    fn find_link(&self, id: LinkId) -> RepoResult<Option<MainTitleServiceFeature>> {
        let mut filter = SqlFilter::active("l");
        filter.push("l.id = ?", [Value::Integer(id)]);
        Ok(query_link_views(self, &filter, "l.id ASC")?
            .pop()
            .map(|view| view.link))
    }

    fn list_link_views(&self, filter: &LinkFilter) -> RepoResult<Vec<LinkView>> {
        let mut sql_filter = SqlFilter::active("l");
        if let Some(main_title_id) = filter.main_title_id {
            sql_filter.push("l.main_title_id = ?", [Value::Integer(main_title_id)]);
        }
        if let Some(service_feature_id) = filter.service_feature_id {
            sql_filter.push("l.service_feature_id = ?", [Value::Integer(service_feature_id)]);
        }
        if filter.active_only {
            sql_filter.push("l.is_active = 1", std::iter::empty());
        }
        query_link_views(self, &sql_filter, filter.order_by_sql())
    }
}

fn query_link_views(
    store: &SqliteReferenceStore<'_>,
    filter: &SqlFilter,
    order_by: &str,
) -> RepoResult<Vec<LinkView>> {
    let sql = format!(
        "SELECT
            l.id,
            l.main_title_id,
            l.service_feature_id,
            l.is_active,
            l.display_order,
            l.notes,
            l.activated_at,
            l.deactivated_at,
            l.creator_id,
            {},
            mt.name AS main_title_name,
            f.name AS service_feature_name,
            f.code AS service_feature_code
         FROM main_title_service_features l
         JOIN main_titles mt ON mt.id = l.main_title_id
         JOIN service_features f ON f.id = l.service_feature_id{}
         ORDER BY {order_by};",
        audit_columns("l"),
        filter.where_sql()
    );
    let mut stmt = store.conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(filter.values()))?;
    let mut views = Vec::new();
    while let Some(row) = rows.next()? {
        views.push(parse_link_view_row(row)?);
    }
    Ok(views)
}

fn parse_link_view_row(row: &Row<'_>) -> RepoResult<LinkView> {
    Ok(LinkView {
        link: MainTitleServiceFeature {
            id: row.get("id")?,
            main_title_id: row.get("main_title_id")?,
            service_feature_id: row.get("service_feature_id")?,
            is_active: parse_flag(
                row.get("is_active")?,
                "main_title_service_features.is_active",
            )?,
            display_order: row.get("display_order")?,
            notes: row.get("notes")?,
            activated_at: row.get("activated_at")?,
            deactivated_at: row.get("deactivated_at")?,
            creator_id: row.get("creator_id")?,
            audit: parse_audit(row, EntityKind::MainTitleServiceFeature)?,
        },
        main_title_name: row.get("main_title_name")?,
        service_feature_name: row.get("service_feature_name")?,
        service_feature_code: row.get("service_feature_code")?,
    })
}
