//! Main title, product type and service feature lifecycles.

use super::hierarchy::duplicate_name;
use super::{unique_backstop, LifecycleService, MODULE};
use crate::identity::IdentityLookup;
use crate::model::main_title::{
    MainTitle, MainTitleChanges, MainTitleId, NewMainTitle, MAIN_TITLE_DESCRIPTION_MAX_CHARS,
    MAIN_TITLE_NAME_MAX_CHARS,
};
use crate::model::product_type::{
    ProductType, ProductTypeId, ProductTypeInput, PRODUCT_TYPE_NAME_MAX_CHARS,
};
use crate::model::service_feature::{
    ServiceFeature, ServiceFeatureId, ServiceFeatureInput, SERVICE_FEATURE_CODE_MAX_CHARS,
    SERVICE_FEATURE_COLOR_MAX_CHARS, SERVICE_FEATURE_DESCRIPTION_MAX_CHARS,
    SERVICE_FEATURE_ICON_MAX_CHARS, SERVICE_FEATURE_NAME_MAX_CHARS,
};
use crate::model::{normalize_name, normalize_optional_text, EntityKind, NAME_MIN_CHARS};
use crate::repo::{IntegrityLookup, NameScope, ReferenceStore, RepoError};
use crate::service::integrity::{
    validate_amount_precision, validate_code_unique, validate_non_negative,
    validate_optional_text_length, validate_parent_exists, validate_range,
    validate_scoped_name_unique, validate_text_length, IntegrityViolation,
};
use crate::service::{log_outcome, ServiceError, ServiceResult};
use rust_decimal::Decimal;

/// Normalized main title fields shared by create and update.
struct MainTitleFields {
    name: String,
    description: Option<String>,
    amount: Decimal,
    display_order: Option<i32>,
}

impl MainTitleFields {
    fn new(
        name: &str,
        description: Option<&str>,
        amount: Decimal,
        display_order: Option<i32>,
    ) -> Self {
        Self {
            name: normalize_name(name),
            description: normalize_optional_text(description),
            amount,
            display_order,
        }
    }

    /// Numeric and range checks; run after parent and uniqueness checks.
    fn validate(&self) -> Result<(), IntegrityViolation> {
        validate_non_negative(self.amount)?;
        validate_amount_precision(self.amount)?;
        validate_text_length(
            "name",
            &self.name,
            NAME_MIN_CHARS,
            MAIN_TITLE_NAME_MAX_CHARS,
        )?;
        validate_optional_text_length(
            "description",
            self.description.as_deref(),
            MAIN_TITLE_DESCRIPTION_MAX_CHARS,
        )?;
        if let Some(order) = self.display_order {
            validate_display_order(order)?;
        }
        Ok(())
    }
}

/// Normalized service feature fields shared by create and update.
struct ServiceFeatureFields {
    name: String,
    description: Option<String>,
    code: Option<String>,
    icon: Option<String>,
    color: Option<String>,
    display_order: i32,
    is_active: bool,
}

impl ServiceFeatureFields {
    fn new(input: &ServiceFeatureInput) -> Self {
        Self {
            name: normalize_name(&input.name),
            description: normalize_optional_text(input.description.as_deref()),
            code: normalize_optional_text(input.code.as_deref()),
            icon: normalize_optional_text(input.icon.as_deref()),
            color: normalize_optional_text(input.color.as_deref()),
            display_order: input.display_order,
            is_active: input.is_active,
        }
    }

    fn validate(&self) -> Result<(), IntegrityViolation> {
        validate_text_length(
            "name",
            &self.name,
            NAME_MIN_CHARS,
            SERVICE_FEATURE_NAME_MAX_CHARS,
        )?;
        validate_optional_text_length(
            "description",
            self.description.as_deref(),
            SERVICE_FEATURE_DESCRIPTION_MAX_CHARS,
        )?;
        validate_optional_text_length("code", self.code.as_deref(), SERVICE_FEATURE_CODE_MAX_CHARS)?;
        validate_optional_text_length("icon", self.icon.as_deref(), SERVICE_FEATURE_ICON_MAX_CHARS)?;
        validate_optional_text_length(
            "color",
            self.color.as_deref(),
            SERVICE_FEATURE_COLOR_MAX_CHARS,
        )?;
        validate_display_order(self.display_order)
    }

    /// Rejects a code held by another non-deleted feature.
    fn validate_code<L: IntegrityLookup + ?Sized>(
        &self,
        lookup: &L,
        exclude_id: Option<ServiceFeatureId>,
    ) -> ServiceResult<()> {
        match self.code.as_deref() {
            Some(code) => validate_code_unique(lookup, code, exclude_id),
            None => Ok(()),
        }
    }

    /// Store-level unique violation on a feature write can only be the code.
    fn backstop(&self) -> impl FnOnce(RepoError) -> ServiceError {
        let code = self.code.clone();
        move |err| match (err, code) {
            (RepoError::UniqueViolation(_), Some(code)) => {
                ServiceError::Integrity(IntegrityViolation::DuplicateCode { code })
            }
            (other, _) => ServiceError::Repo(other),
        }
    }
}

fn validate_display_order(order: i32) -> Result<(), IntegrityViolation> {
    validate_range("display_order", i64::from(order), 0, i64::from(i32::MAX))
}

impl<S: ReferenceStore, I: IdentityLookup> LifecycleService<S, I> {
    /// Creates a main title under an existing scope.
    pub fn create_main_title(
        &self,
        session_token: &str,
        input: &NewMainTitle,
    ) -> ServiceResult<MainTitleId> {
        let fields = MainTitleFields::new(
            &input.name,
            input.description.as_deref(),
            input.amount,
            input.display_order,
        );
        let result = self.resolve_creator(session_token).and_then(|creator_id| {
            self.store.unit_of_work(|store| -> ServiceResult<_> {
                validate_parent_exists(store, EntityKind::Scope, input.scope_id)?;
                if let Some(bpm_type_id) = input.bpm_type_id {
                    validate_parent_exists(store, EntityKind::BpmType, bpm_type_id)?;
                }
                validate_scoped_name_unique(
                    store,
                    EntityKind::MainTitle,
                    &fields.name,
                    NameScope::Scope(input.scope_id),
                    None,
                )?;
                fields.validate()?;

                let main_title = MainTitle {
                    id: 0,
                    name: fields.name.clone(),
                    description: fields.description.clone(),
                    amount: fields.amount,
                    scope_id: input.scope_id,
                    display_order: fields.display_order.unwrap_or(0),
                    bpm_type_id: input.bpm_type_id,
                    creator_id,
                    audit: self.shadow.on_create(self.sequence_tag(EntityKind::MainTitle)),
                };
                store
                    .insert_main_title(&main_title)
                    .map_err(unique_backstop(duplicate_name(EntityKind::MainTitle, &fields.name)))
            })
        });
        log_outcome(MODULE, "main_title_create", None, &result);
        result
    }

    /// Replaces the mutable fields of a main title. The scope is fixed.
    pub fn update_main_title(
        &self,
        id: MainTitleId,
        changes: &MainTitleChanges,
    ) -> ServiceResult<bool> {
        let fields = MainTitleFields::new(
            &changes.name,
            changes.description.as_deref(),
            changes.amount,
            changes.display_order,
        );
        let result = self.store.unit_of_work(|store| -> ServiceResult<_> {
            let Some(mut main_title) = store.find_main_title(id)? else {
                return Ok(false);
            };
            if let Some(bpm_type_id) = changes.bpm_type_id {
                validate_parent_exists(store, EntityKind::BpmType, bpm_type_id)?;
            }
            validate_scoped_name_unique(
                store,
                EntityKind::MainTitle,
                &fields.name,
                NameScope::Scope(main_title.scope_id),
                Some(id),
            )?;
            fields.validate()?;

            main_title.name = fields.name.clone();
            main_title.description = fields.description.clone();
            main_title.amount = fields.amount;
            if let Some(order) = fields.display_order {
                main_title.display_order = order;
            }
            main_title.bpm_type_id = changes.bpm_type_id;
            self.shadow.on_update(&mut main_title.audit);
            store
                .update_main_title(&main_title)
                .map_err(unique_backstop(duplicate_name(EntityKind::MainTitle, &fields.name)))?;
            Ok(true)
        });
        log_outcome(MODULE, "main_title_update", Some(id), &result);
        result
    }

    /// Soft-deletes a main title. Its links and product types are kept.
    pub fn soft_delete_main_title(&self, id: MainTitleId) -> ServiceResult<bool> {
        let result = self.store.unit_of_work(|store| -> ServiceResult<_> {
            let Some(mut main_title) = store.find_main_title(id)? else {
                return Ok(false);
            };
            self.shadow.on_soft_delete(&mut main_title.audit);
            store.update_main_title(&main_title)?;
            Ok(true)
        });
        log_outcome(MODULE, "main_title_delete", Some(id), &result);
        result
    }

    /// Creates a product type. No acting user is recorded for product types.
    pub fn create_product_type(&self, input: &ProductTypeInput) -> ServiceResult<ProductTypeId> {
        let name = normalize_name(&input.name);
        let result = self.store.unit_of_work(|store| -> ServiceResult<_> {
            if let Some(main_title_id) = input.main_title_id {
                validate_parent_exists(store, EntityKind::MainTitle, main_title_id)?;
            }
            validate_scoped_name_unique(
                store,
                EntityKind::ProductType,
                &name,
                NameScope::Global,
                None,
            )?;
            validate_text_length("name", &name, NAME_MIN_CHARS, PRODUCT_TYPE_NAME_MAX_CHARS)?;

            let product_type = ProductType {
                id: 0,
                name: name.clone(),
                main_title_id: input.main_title_id,
                audit: self.shadow.on_create(self.sequence_tag(EntityKind::ProductType)),
            };
            store
                .insert_product_type(&product_type)
                .map_err(unique_backstop(duplicate_name(EntityKind::ProductType, &name)))
        });
        log_outcome(MODULE, "product_type_create", None, &result);
        result
    }

    pub fn update_product_type(
        &self,
        id: ProductTypeId,
        input: &ProductTypeInput,
    ) -> ServiceResult<bool> {
        let name = normalize_name(&input.name);
        let result = self.store.unit_of_work(|store| -> ServiceResult<_> {
            let Some(mut product_type) = store.find_product_type(id)? else {
                return Ok(false);
            };
            if let Some(main_title_id) = input.main_title_id {
                validate_parent_exists(store, EntityKind::MainTitle, main_title_id)?;
            }
            validate_scoped_name_unique(
                store,
                EntityKind::ProductType,
                &name,
                NameScope::Global,
                Some(id),
            )?;
            validate_text_length("name", &name, NAME_MIN_CHARS, PRODUCT_TYPE_NAME_MAX_CHARS)?;

            product_type.name = name.clone();
            product_type.main_title_id = input.main_title_id;
            self.shadow.on_update(&mut product_type.audit);
            store
                .update_product_type(&product_type)
                .map_err(unique_backstop(duplicate_name(EntityKind::ProductType, &name)))?;
            Ok(true)
        });
        log_outcome(MODULE, "product_type_update", Some(id), &result);
        result
    }

    pub fn soft_delete_product_type(&self, id: ProductTypeId) -> ServiceResult<bool> {
        let result = self.store.unit_of_work(|store| -> ServiceResult<_> {
            let Some(mut product_type) = store.find_product_type(id)? else {
                return Ok(false);
            };
            self.shadow.on_soft_delete(&mut product_type.audit);
            store.update_product_type(&product_type)?;
            Ok(true)
        });
        log_outcome(MODULE, "product_type_delete", Some(id), &result);
        result
    }

    /// Creates a service feature; a non-blank code must be unique.
    pub fn create_service_feature(
        &self,
        session_token: &str,
        input: &ServiceFeatureInput,
    ) -> ServiceResult<ServiceFeatureId> {
        let fields = ServiceFeatureFields::new(input);
        let result = self.resolve_creator(session_token).and_then(|creator_id| {
            self.store.unit_of_work(|store| -> ServiceResult<_> {
                fields.validate_code(store, None)?;
                fields.validate()?;

                let feature = ServiceFeature {
                    id: 0,
                    name: fields.name.clone(),
                    description: fields.description.clone(),
                    code: fields.code.clone(),
                    icon: fields.icon.clone(),
                    color: fields.color.clone(),
                    display_order: fields.display_order,
                    is_active: fields.is_active,
                    creator_id,
                    audit: self
                        .shadow
                        .on_create(self.sequence_tag(EntityKind::ServiceFeature)),
                };
                store
                    .insert_service_feature(&feature)
                    .map_err(fields.backstop())
            })
        });
        log_outcome(MODULE, "service_feature_create", None, &result);
        result
    }

    pub fn update_service_feature(
        &self,
        id: ServiceFeatureId,
        input: &ServiceFeatureInput,
    ) -> ServiceResult<bool> {
        let fields = ServiceFeatureFields::new(input);
        let result = self.store.unit_of_work(|store| -> ServiceResult<_> {
            let Some(mut feature) = store.find_service_feature(id)? else {
                return Ok(false);
            };
            fields.validate_code(store, Some(id))?;
            fields.validate()?;

            feature.name = fields.name.clone();
            feature.description = fields.description.clone();
            feature.code = fields.code.clone();
            feature.icon = fields.icon.clone();
            feature.color = fields.color.clone();
            feature.display_order = fields.display_order;
            feature.is_active = fields.is_active;
            self.shadow.on_update(&mut feature.audit);
            store
                .update_service_feature(&feature)
                .map_err(fields.backstop())?;
            Ok(true)
        });
        log_outcome(MODULE, "service_feature_update", Some(id), &result);
        result
    }

    /// Soft-deletes a service feature. Existing links are kept.
    pub fn soft_delete_service_feature(&self, id: ServiceFeatureId) -> ServiceResult<bool> {
        let result = self.store.unit_of_work(|store| -> ServiceResult<_> {
            let Some(mut feature) = store.find_service_feature(id)? else {
                return Ok(false);
            };
            self.shadow.on_soft_delete(&mut feature.audit);
            store.update_service_feature(&feature)?;
            Ok(true)
        });
        log_outcome(MODULE, "service_feature_delete", Some(id), &result);
        result
    }
}
