//! Main title persistence, hierarchy-joined views and amount summaries.
//!
//! # Invariants
//! - Amounts are stored as integer minor units in `amount_minor`.
//! - Views join scope and department names; a soft-deleted parent does not
//!   hide its non-deleted main titles.

use super::{
    audit_columns, bool_to_int, count_rows, parse_audit, window_sql, RepoError, RepoResult,
    SqlFilter, SqliteReferenceStore, Window,
};
use crate::model::bpm_type::BpmTypeId;
use crate::model::department::DepartmentId;
use crate::model::main_title::{
    amount_from_minor, amount_to_minor, max_amount, MainTitle, MainTitleId, MainTitleView,
    ScopeAmountSummary, AMOUNT_SCALE,
};
use crate::model::scope::ScopeId;
use crate::model::EntityKind;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Row};
use rust_decimal::{Decimal, RoundingStrategy};

const MAIN_TITLE_VIEW_FROM_SQL: &str = "FROM main_titles mt
     JOIN scopes s ON s.id = mt.scope_id
     JOIN departments d ON d.id = s.department_id";

/// Listing filter for main titles. All set fields must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MainTitleFilter {
    pub scope_id: Option<ScopeId>,
    pub department_id: Option<DepartmentId>,
    pub bpm_type_id: Option<BpmTypeId>,
    /// Substring of name, description, scope name or department name.
    pub term: Option<String>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
}

/// Sort order for main title listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MainTitleOrder {
    /// Department name, scope name, display order, name.
    #[default]
    Hierarchy,
    /// Display order, name.
    DisplayOrder,
    /// Amount descending, name.
    AmountDesc,
}

impl MainTitleOrder {
    fn order_by_sql(self) -> &'static str {
        match self {
            Self::Hierarchy => "d.name ASC, s.name ASC, mt.display_order ASC, mt.name ASC, mt.id ASC",
            Self::DisplayOrder => "mt.display_order ASC, mt.name ASC, mt.id ASC",
            Self::AmountDesc => "mt.amount_minor DESC, mt.name ASC, mt.id ASC",
        }
    }
}

pub trait MainTitleRepository {
    fn insert_main_title(&self, main_title: &MainTitle) -> RepoResult<MainTitleId>;
    /// Writes every mutable column plus `modified_at` and `is_deleted`.
    fn update_main_title(&self, main_title: &MainTitle) -> RepoResult<()>;
    fn find_main_title(&self, id: MainTitleId) -> RepoResult<Option<MainTitle>>;
    fn find_main_title_view(&self, id: MainTitleId) -> RepoResult<Option<MainTitleView>>;
    fn count_main_titles(&self, filter: &MainTitleFilter) -> RepoResult<u64>;
    fn list_main_title_views(
        &self,
        filter: &MainTitleFilter,
        order: MainTitleOrder,
        window: Option<Window>,
    ) -> RepoResult<Vec<MainTitleView>>;
    /// Per-scope amount statistics, largest total first.
    fn summarize_amounts_by_scope(
        &self,
        filter: &MainTitleFilter,
    ) -> RepoResult<Vec<ScopeAmountSummary>>;
}

impl SqliteReferenceStore<'_> {
    fn main_title_filter(&self, filter: &MainTitleFilter) -> RepoResult<SqlFilter> {
        let mut sql_filter = SqlFilter::active("mt");
        if let Some(scope_id) = filter.scope_id {
            sql_filter.push("mt.scope_id = ?", [Value::Integer(scope_id)]);
        }
        if let Some(department_id) = filter.department_id {
            sql_filter.push("s.department_id = ?", [Value::Integer(department_id)]);
        }
        if let Some(bpm_type_id) = filter.bpm_type_id {
            sql_filter.push("mt.bpm_type_id = ?", [Value::Integer(bpm_type_id)]);
        }
        if let Some(term) = filter.term.as_deref() {
            let clause = format!(
                "({} OR {} OR {} OR {})",
                self.contains_sql("mt.name"),
                self.contains_sql("mt.description"),
                self.contains_sql("s.name"),
                self.contains_sql("d.name")
            );
            sql_filter.push(clause, std::iter::repeat(Value::Text(term.to_string())).take(4));
        }
        if let Some(min) = filter.min_amount {
            sql_filter.push("mt.amount_minor >= ?", [Value::Integer(bound_to_minor(min, false)?)]);
        }
        if let Some(max) = filter.max_amount {
            sql_filter.push("mt.amount_minor <= ?", [Value::Integer(bound_to_minor(max, true)?)]);
        }
        Ok(sql_filter)
    }
}

impl MainTitleRepository for SqliteReferenceStore<'_> {
    fn insert_main_title(&self, main_title: &MainTitle) -> RepoResult<MainTitleId> {
        let audit = &main_title.audit;
        self.conn.execute(
            "INSERT INTO main_titles (
                name,
                description,
                amount_minor,
                scope_id,
                display_order,
                bpm_type_id,
                creator_id,
                sequence_tag,
                created_at_epoch_ms,
                correlation_id,
                created_at,
                modified_at,
                is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13);",
            params![
                main_title.name.as_str(),
                main_title.description.as_deref(),
                to_minor(main_title)?,
                main_title.scope_id,
                main_title.display_order,
                main_title.bpm_type_id,
                main_title.creator_id.as_str(),
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

    fn update_main_title(&self, main_title: &MainTitle) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE main_titles
             SET
                name = ?1,
                description = ?2,
                amount_minor = ?3,
                display_order = ?4,
                bpm_type_id = ?5,
                modified_at = ?6,
                is_deleted = ?7
             WHERE id = ?8;",
            params![
                main_title.name.as_str(),
                main_title.description.as_deref(),
                to_minor(main_title)?,
                main_title.display_order,
                main_title.bpm_type_id,
                main_title.audit.modified_at,
                bool_to_int(main_title.audit.is_deleted),
                main_title.id,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::MainTitle,
                id: main_title.id,
            });
        }
        Ok(())
    }

    fn find_main_title(&self, id: MainTitleId) -> RepoResult<Option<MainTitle>> {
        Ok(self.find_main_title_view(id)?.map(|view| view.main_title))
    }

    fn find_main_title_view(&self, id: MainTitleId) -> RepoResult<Option<MainTitleView>> {
        let mut filter = SqlFilter::active("mt");
        filter.push("mt.id = ?", [Value::Integer(id)]);
        Ok(query_main_title_views(self, &filter, MainTitleOrder::Hierarchy, None)?.pop())
    }

    fn count_main_titles(&self, filter: &MainTitleFilter) -> RepoResult<u64> {
        count_rows(
            self.conn,
            MAIN_TITLE_VIEW_FROM_SQL,
            &self.main_title_filter(filter)?,
        )
    }

    fn list_main_title_views(
        &self,
        filter: &MainTitleFilter,
        order: MainTitleOrder,
        window: Option<Window>,
    ) -> RepoResult<Vec<MainTitleView>> {
        query_main_title_views(self, &self.main_title_filter(filter)?, order, window)
    }

    fn summarize_amounts_by_scope(
        &self,
        filter: &MainTitleFilter,
    ) -> RepoResult<Vec<ScopeAmountSummary>> {
        // Totals of maximal amounts overflow SQLite's 64-bit SUM, so rows are
        // folded into `Decimal` here.
        let sql_filter = self.main_title_filter(filter)?;
        let sql = format!(
            "SELECT
                s.id AS scope_id,
                s.name AS scope_name,
                d.name AS department_name,
                mt.amount_minor
             {MAIN_TITLE_VIEW_FROM_SQL}{}
             ORDER BY s.id ASC;",
            sql_filter.where_sql()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(sql_filter.values()))?;
        let mut groups: Vec<ScopeAmountGroup> = Vec::new();
        while let Some(row) = rows.next()? {
            let scope_id: ScopeId = row.get("scope_id")?;
            let amount = amount_from_minor(row.get("amount_minor")?);
            match groups.last_mut() {
                Some(group) if group.scope_id == scope_id => group.add(amount),
                _ => groups.push(ScopeAmountGroup {
                    scope_id,
                    scope_name: row.get("scope_name")?,
                    department_name: row.get("department_name")?,
                    count: 1,
                    total: amount,
                    min: amount,
                    max: amount,
                }),
            }
        }

        let mut summaries: Vec<ScopeAmountSummary> =
            groups.into_iter().map(ScopeAmountGroup::finish).collect();
        summaries.sort_by(|left, right| {
            right
                .total
                .cmp(&left.total)
                .then_with(|| left.scope_name.cmp(&right.scope_name))
                .then_with(|| left.scope_id.cmp(&right.scope_id))
        });
        Ok(summaries)
    }
}

struct ScopeAmountGroup {
    scope_id: ScopeId,
    scope_name: String,
    department_name: String,
    count: u64,
    total: Decimal,
    min: Decimal,
    max: Decimal,
}

impl ScopeAmountGroup {
    fn add(&mut self, amount: Decimal) {
        self.count += 1;
        self.total += amount;
        self.min = self.min.min(amount);
        self.max = self.max.max(amount);
    }

    fn finish(self) -> ScopeAmountSummary {
        let average = (self.total / Decimal::from(self.count)).round_dp(AMOUNT_SCALE);
        ScopeAmountSummary {
            scope_id: self.scope_id,
            scope_name: self.scope_name,
            department_name: self.department_name,
            count: self.count,
            total: self.total,
            average,
            min: self.min,
            max: self.max,
        }
    }
}

fn query_main_title_views(
    store: &SqliteReferenceStore<'_>,
    filter: &SqlFilter,
    order: MainTitleOrder,
    window: Option<Window>,
) -> RepoResult<Vec<MainTitleView>> {
    let sql = format!(
        "SELECT
            mt.id,
            mt.name,
            mt.description,
            mt.amount_minor,
            mt.scope_id,
            mt.display_order,
            mt.bpm_type_id,
            mt.creator_id,
            {},
            s.name AS scope_name,
            s.department_id AS department_id,
            d.name AS department_name
         {MAIN_TITLE_VIEW_FROM_SQL}{}
         ORDER BY {}{};",
        audit_columns("mt"),
        filter.where_sql(),
        order.order_by_sql(),
        window_sql(window)
    );
    let mut stmt = store.conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(filter.values_with_window(window)))?;
    let mut views = Vec::new();
    while let Some(row) = rows.next()? {
        views.push(parse_main_title_view_row(row)?);
    }
    Ok(views)
}

fn parse_main_title_view_row(row: &Row<'_>) -> RepoResult<MainTitleView> {
    let amount_minor: i64 = row.get("amount_minor")?;
    if amount_minor < 0 {
        return Err(RepoError::InvalidData(format!(
            "negative amount `{amount_minor}` in main_titles.amount_minor"
        )));
    }

    Ok(MainTitleView {
        main_title: MainTitle {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            amount: amount_from_minor(amount_minor),
            scope_id: row.get("scope_id")?,
            display_order: row.get("display_order")?,
            bpm_type_id: row.get("bpm_type_id")?,
            creator_id: row.get("creator_id")?,
            audit: parse_audit(row, EntityKind::MainTitle)?,
        },
        scope_name: row.get("scope_name")?,
        department_id: row.get("department_id")?,
        department_name: row.get("department_name")?,
    })
}

fn to_minor(main_title: &MainTitle) -> RepoResult<i64> {
    amount_to_minor(main_title.amount).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "amount `{}` of main title {} is not storable",
            main_title.amount, main_title.id
        ))
    })
}

/// Converts a filter bound to minor units, rounding towards the inside of
/// the range so sub-cent bounds never admit extra rows.
fn bound_to_minor(bound: Decimal, upper: bool) -> RepoResult<i64> {
    let strategy = if upper {
        RoundingStrategy::ToNegativeInfinity
    } else {
        RoundingStrategy::ToPositiveInfinity
    };
    let limit = max_amount();
    let rounded = bound
        .round_dp_with_strategy(AMOUNT_SCALE, strategy)
        .clamp(-limit, limit);
    amount_to_minor(rounded)
        .ok_or_else(|| RepoError::InvalidData(format!("amount bound `{bound}` is out of range")))
}
