//! Product type persistence.

use super::{
    audit_columns, bool_to_int, count_rows, parse_audit, window_sql, RepoError, RepoResult,
    SqlFilter, SqliteReferenceStore, Window,
};
use crate::model::main_title::MainTitleId;
use crate::model::product_type::{ProductType, ProductTypeId, ProductTypeView};
use crate::model::EntityKind;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Row};

const PRODUCT_TYPE_VIEW_FROM_SQL: &str =
    "FROM product_types p LEFT JOIN main_titles mt ON mt.id = p.main_title_id";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductTypeFilter {
    pub main_title_id: Option<MainTitleId>,
    /// Substring of the product type name.
    pub term: Option<String>,
}

pub trait ProductTypeRepository {
    fn insert_product_type(&self, product_type: &ProductType) -> RepoResult<ProductTypeId>;
    fn update_product_type(&self, product_type: &ProductType) -> RepoResult<()>;
    fn find_product_type(&self, id: ProductTypeId) -> RepoResult<Option<ProductType>>;
    fn find_product_type_view(&self, id: ProductTypeId) -> RepoResult<Option<ProductTypeView>>;
    fn count_product_types(&self, filter: &ProductTypeFilter) -> RepoResult<u64>;
    /// Ordered by name, then id.
    fn list_product_type_views(
        &self,
        filter: &ProductTypeFilter,
        window: Option<Window>,
    ) -> RepoResult<Vec<ProductTypeView>>;
}

impl SqliteReferenceStore<'_> {
    fn product_type_filter(&self, filter: &ProductTypeFilter) -> SqlFilter {
        let mut sql_filter = SqlFilter::active("p");
        if let Some(main_title_id) = filter.main_title_id {
            sql_filter.push("p.main_title_id = ?", [Value::Integer(main_title_id)]);
        }
        if let Some(term) = filter.term.as_deref() {
            sql_filter.push(self.contains_sql("p.name"), [Value::Text(term.to_string())]);
        }
        sql_filter
    }
}

impl ProductTypeRepository for SqliteReferenceStore<'_> {
    fn insert_product_type(&self, product_type: &ProductType) -> RepoResult<ProductTypeId> {
        let audit = &product_type.audit;
        self.conn.execute(
            "INSERT INTO product_types (
                name,
                main_title_id,
                sequence_tag,
                created_at_epoch_ms,
                correlation_id,
                created_at,
                modified_at,
                is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                product_type.name.as_str(),
                product_type.main_title_id,
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

    fn update_product_type(&self, product_type: &ProductType) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE product_types
             SET name = ?1, main_title_id = ?2, modified_at = ?3, is_deleted = ?4
             WHERE id = ?5;",
            params![
                product_type.name.as_str(),
                product_type.main_title_id,
                product_type.audit.modified_at,
                bool_to_int(product_type.audit.is_deleted),
                product_type.id,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::ProductType,
                id: product_type.id,
            });
        }
        Ok(())
    }

    fn find_product_type(&self, id: ProductTypeId) -> RepoResult<Option<ProductType>> {
        Ok(self
            .find_product_type_view(id)?
            .map(|view| view.product_type))
    }

    fn find_product_type_view(&self, id: ProductTypeId) -> RepoResult<Option<ProductTypeView>> {
        let mut filter = SqlFilter::active("p");
        filter.push("p.id = ?", [Value::Integer(id)]);
        Ok(query_product_type_views(self, &filter, None)?.pop())
    }

    fn count_product_types(&self, filter: &ProductTypeFilter) -> RepoResult<u64> {
        count_rows(
            self.conn,
            PRODUCT_TYPE_VIEW_FROM_SQL,
            &self.product_type_filter(filter),
        )
    }

    fn list_product_type_views(
        &self,
        filter: &ProductTypeFilter,
        window: Option<Window>,
    ) -> RepoResult<Vec<ProductTypeView>> {
        query_product_type_views(self, &self.product_type_filter(filter), window)
    }
}

fn query_product_type_views(
    store: &SqliteReferenceStore<'_>,
    filter: &SqlFilter,
    window: Option<Window>,
) -> RepoResult<Vec<ProductTypeView>> {
    let sql = format!(
        "SELECT p.id, p.name, p.main_title_id, {}, mt.name AS main_title_name
         {PRODUCT_TYPE_VIEW_FROM_SQL}{}
         ORDER BY p.name ASC, p.id ASC{};",
        audit_columns("p"),
        filter.where_sql(),
        window_sql(window)
    );
    let mut stmt = store.conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(filter.values_with_window(window)))?;
    let mut views = Vec::new();
    while let Some(row) = rows.next()? {
        views.push(parse_product_type_view_row(row)?);
    }
    Ok(views)
}

fn parse_product_type_view_row(row: &Row<'_>) -> RepoResult<ProductTypeView> {
    Ok(ProductTypeView {
        product_type: ProductType {
            id: row.get("id")?,
            name: row.get("name")?,
            main_title_id: row.get("main_title_id")?,
            audit: parse_audit(row, EntityKind::ProductType)?,
        },
        main_title_name: row.get("main_title_name")?,
    })
}
