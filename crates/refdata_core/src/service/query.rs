//! Read-side queries over the reference hierarchy.
//!
//! # Responsibility
//! - Expose get, list, page, search and summary reads for every entity.
//! - Apply pagination rules from [`crate::config::PagingConfig`].
//!
//! # Invariants
//! - Soft-deleted rows never appear in results, except through
//!   [`QueryService::audit`].
//! - A blank search term matches everything.
//!
//! # See also
//! - `crate::service::paging`

use super::paging::{page_window, Page, PageRequest};
use super::ServiceResult;
use crate::config::CoreConfig;
use crate::model::bpm_type::{BpmType, BpmTypeId};
use crate::model::department::{Department, DepartmentId};
use crate::model::main_title::{MainTitleId, MainTitleView, ScopeAmountSummary};
use crate::model::product_type::{ProductTypeId, ProductTypeView};
use crate::model::scope::{ScopeId, ScopeView};
use crate::model::service_feature::{LinkView, ServiceFeature, ServiceFeatureId};
use crate::model::{normalize_optional_text, AuditFields, EntityKind};
use crate::repo::{
    LinkFilter, MainTitleFilter, MainTitleOrder, ProductTypeFilter, ReferenceStore, RepoResult,
    ScopeFilter, Window,
};

/// Upper bound for [`QueryService::top_expensive_main_titles`].
pub const TOP_N_MAX: u32 = 100;

pub struct QueryService<S> {
    store: S,
    config: CoreConfig,
}

impl<S: ReferenceStore> QueryService<S> {
    pub fn new(store: S, config: CoreConfig) -> Self {
        Self { store, config }
    }

    /// Counts, then fetches the requested window.
    fn page<T>(
        &self,
        request: PageRequest,
        count: impl FnOnce() -> RepoResult<u64>,
        fetch: impl FnOnce(Window) -> RepoResult<Vec<T>>,
    ) -> ServiceResult<Page<T>> {
        let (page_index, page_size) = request.normalize(&self.config.paging);
        let total_count = count()?;
        let items = match page_window(page_index, page_size) {
            Some(window) => fetch(window)?,
            None => Vec::new(),
        };
        Ok(Page::new(items, page_index, page_size, total_count))
    }

    pub fn department(&self, id: DepartmentId) -> ServiceResult<Option<Department>> {
        Ok(self.store.find_department(id)?)
    }

    pub fn departments(&self) -> ServiceResult<Vec<Department>> {
        Ok(self.store.list_departments(None, None)?)
    }

    pub fn departments_page(&self, request: PageRequest) -> ServiceResult<Page<Department>> {
        self.page(
            request,
            || self.store.count_departments(None),
            |window| self.store.list_departments(None, Some(window)),
        )
    }

    /// Departments whose name contains `term`.
    pub fn search_departments(&self, term: &str) -> ServiceResult<Vec<Department>> {
        let term = normalize_optional_text(Some(term));
        Ok(self.store.list_departments(term.as_deref(), None)?)
    }

    pub fn scope(&self, id: ScopeId) -> ServiceResult<Option<ScopeView>> {
        Ok(self.store.find_scope_view(id)?)
    }

    pub fn scopes(&self) -> ServiceResult<Vec<ScopeView>> {
        Ok(self.store.list_scope_views(&ScopeFilter::default(), None)?)
    }

    pub fn scopes_page(&self, request: PageRequest) -> ServiceResult<Page<ScopeView>> {
        self.scope_page(&ScopeFilter::default(), request)
    }

    pub fn scopes_by_department_page(
        &self,
        department_id: DepartmentId,
        request: PageRequest,
    ) -> ServiceResult<Page<ScopeView>> {
        let filter = ScopeFilter {
            department_id: Some(department_id),
            term: None,
        };
        self.scope_page(&filter, request)
    }

    fn scope_page(&self, filter: &ScopeFilter, request: PageRequest) -> ServiceResult<Page<ScopeView>> {
        self.page(
            request,
            || self.store.count_scopes(filter),
            |window| self.store.list_scope_views(filter, Some(window)),
        )
    }

    /// Scopes whose name contains `term`, optionally within one department.
    pub fn search_scopes(
        &self,
        term: &str,
        department_id: Option<DepartmentId>,
    ) -> ServiceResult<Vec<ScopeView>> {
        let filter = ScopeFilter {
            department_id,
            term: normalize_optional_text(Some(term)),
        };
        Ok(self.store.list_scope_views(&filter, None)?)
    }

    pub fn bpm_types(&self) -> ServiceResult<Vec<BpmType>> {
        Ok(self.store.list_bpm_types()?)
    }

    pub fn main_title(&self, id: MainTitleId) -> ServiceResult<Option<MainTitleView>> {
        Ok(self.store.find_main_title_view(id)?)
    }

    /// Every main title in hierarchy order.
    pub fn main_titles(&self) -> ServiceResult<Vec<MainTitleView>> {
        Ok(self.store.list_main_title_views(
            &MainTitleFilter::default(),
            MainTitleOrder::Hierarchy,
            None,
        )?)
    }

    pub fn main_titles_page(
        &self,
        scope_id: Option<ScopeId>,
        bpm_type_id: Option<BpmTypeId>,
        request: PageRequest,
    ) -> ServiceResult<Page<MainTitleView>> {
        let filter = MainTitleFilter {
            scope_id,
            bpm_type_id,
            ..MainTitleFilter::default()
        };
        self.page(
            request,
            || self.store.count_main_titles(&filter),
            |window| {
                self.store
                    .list_main_title_views(&filter, MainTitleOrder::Hierarchy, Some(window))
            },
        )
    }

    /// Main titles of one scope by display order.
    pub fn main_titles_by_scope(&self, scope_id: ScopeId) -> ServiceResult<Vec<MainTitleView>> {
        let filter = MainTitleFilter {
            scope_id: Some(scope_id),
            ..MainTitleFilter::default()
        };
        Ok(self
            .store
            .list_main_title_views(&filter, MainTitleOrder::DisplayOrder, None)?)
    }

    pub fn main_titles_by_department(
        &self,
        department_id: DepartmentId,
    ) -> ServiceResult<Vec<MainTitleView>> {
        let filter = MainTitleFilter {
            department_id: Some(department_id),
            ..MainTitleFilter::default()
        };
        Ok(self
            .store
            .list_main_title_views(&filter, MainTitleOrder::Hierarchy, None)?)
    }

    /// Filtered search. The term matches name, description, scope name or
    /// department name.
    pub fn search_main_titles(&self, filter: &MainTitleFilter) -> ServiceResult<Vec<MainTitleView>> {
        let filter = MainTitleFilter {
            term: normalize_optional_text(filter.term.as_deref()),
            ..filter.clone()
        };
        Ok(self
            .store
            .list_main_title_views(&filter, MainTitleOrder::Hierarchy, None)?)
    }

    pub fn main_title_summary_by_scope(
        &self,
        filter: &MainTitleFilter,
    ) -> ServiceResult<Vec<ScopeAmountSummary>> {
        Ok(self.store.summarize_amounts_by_scope(filter)?)
    }

    /// The `n` most expensive main titles; `n` is clamped to `1..=100`.
    pub fn top_expensive_main_titles(&self, n: u32) -> ServiceResult<Vec<MainTitleView>> {
        let window = Window {
            limit: n.clamp(1, TOP_N_MAX),
            offset: 0,
        };
        Ok(self.store.list_main_title_views(
            &MainTitleFilter::default(),
            MainTitleOrder::AmountDesc,
            Some(window),
        )?)
    }

    pub fn product_type(&self, id: ProductTypeId) -> ServiceResult<Option<ProductTypeView>> {
        Ok(self.store.find_product_type_view(id)?)
    }

    pub fn product_types(&self) -> ServiceResult<Vec<ProductTypeView>> {
        Ok(self
            .store
            .list_product_type_views(&ProductTypeFilter::default(), None)?)
    }

    pub fn product_types_by_main_title(
        &self,
        main_title_id: MainTitleId,
    ) -> ServiceResult<Vec<ProductTypeView>> {
        let filter = ProductTypeFilter {
            main_title_id: Some(main_title_id),
            term: None,
        };
        Ok(self.store.list_product_type_views(&filter, None)?)
    }

    /// Product types by name, optionally limited to one main title.
    pub fn product_types_page(
        &self,
        main_title_id: Option<MainTitleId>,
        request: PageRequest,
    ) -> ServiceResult<Page<ProductTypeView>> {
        let filter = ProductTypeFilter {
            main_title_id,
            term: None,
        };
        self.page(
            request,
            || self.store.count_product_types(&filter),
            |window| self.store.list_product_type_views(&filter, Some(window)),
        )
    }

    pub fn search_product_types(
        &self,
        term: &str,
        main_title_id: Option<MainTitleId>,
    ) -> ServiceResult<Vec<ProductTypeView>> {
        let filter = ProductTypeFilter {
            main_title_id,
            term: normalize_optional_text(Some(term)),
        };
        Ok(self.store.list_product_type_views(&filter, None)?)
    }

    pub fn service_feature(&self, id: ServiceFeatureId) -> ServiceResult<Option<ServiceFeature>> {
        Ok(self.store.find_service_feature(id)?)
    }

    pub fn service_features(&self) -> ServiceResult<Vec<ServiceFeature>> {
        Ok(self.store.list_service_features(false)?)
    }

    /// Features whose own `is_active` flag is set.
    pub fn active_service_features(&self) -> ServiceResult<Vec<ServiceFeature>> {
        Ok(self.store.list_service_features(true)?)
    }

    pub fn links_by_main_title(
        &self,
        main_title_id: MainTitleId,
        active_only: bool,
    ) -> ServiceResult<Vec<LinkView>> {
        Ok(self.store.list_link_views(&LinkFilter {
            main_title_id: Some(main_title_id),
            service_feature_id: None,
            active_only,
        })?)
    }

    pub fn links_by_service_feature(
        &self,
        service_feature_id: ServiceFeatureId,
        active_only: bool,
    ) -> ServiceResult<Vec<LinkView>> {
        Ok(self.store.list_link_views(&LinkFilter {
            main_title_id: None,
            service_feature_id: Some(service_feature_id),
            active_only,
        })?)
    }

    pub fn links(&self) -> ServiceResult<Vec<LinkView>> {
        Ok(self.store.list_link_views(&LinkFilter::default())?)
    }

    /// Shadow fields of any row, soft-deleted or not.
    pub fn audit(&self, kind: EntityKind, id: i64) -> ServiceResult<Option<AuditFields>> {
        Ok(self.store.find_audit(kind, id)?)
    }
}
