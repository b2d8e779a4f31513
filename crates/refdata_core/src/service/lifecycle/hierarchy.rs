//! Department, scope and BPM type lifecycles.

use super::{unique_backstop, LifecycleService, MODULE};
use crate::identity::IdentityLookup;
use crate::model::bpm_type::{BpmType, BpmTypeId, BPM_TYPE_NAME_MAX_CHARS};
use crate::model::department::{Department, DepartmentId, DEPARTMENT_NAME_MAX_CHARS};
use crate::model::scope::{Scope, ScopeId, SCOPE_NAME_MAX_CHARS};
use crate::model::{normalize_name, EntityKind, NAME_MIN_CHARS};
use crate::repo::{NameScope, ReferenceStore};
use crate::service::integrity::{
    validate_parent_exists, validate_scoped_name_unique, validate_text_length,
    IntegrityViolation,
};
use crate::service::{log_outcome, ServiceResult};

impl<S: ReferenceStore, I: IdentityLookup> LifecycleService<S, I> {
    /// Creates a department with a globally unique name.
    pub fn create_department(
        &self,
        session_token: &str,
        name: &str,
    ) -> ServiceResult<DepartmentId> {
        let name = normalize_name(name);
        let result = self.resolve_creator(session_token).and_then(|creator_id| {
            self.store.unit_of_work(|store| -> ServiceResult<_> {
                validate_scoped_name_unique(
                    store,
                    EntityKind::Department,
                    &name,
                    NameScope::Global,
                    None,
                )?;
                validate_text_length("name", &name, NAME_MIN_CHARS, DEPARTMENT_NAME_MAX_CHARS)?;

                let department = Department {
                    id: 0,
                    name: name.clone(),
                    creator_id,
                    audit: self.shadow.on_create(self.sequence_tag(EntityKind::Department)),
                };
                store
                    .insert_department(&department)
                    .map_err(unique_backstop(duplicate_name(EntityKind::Department, &name)))
            })
        });
        log_outcome(MODULE, "department_create", None, &result);
        result
    }

    pub fn update_department(&self, id: DepartmentId, name: &str) -> ServiceResult<bool> {
        let name = normalize_name(name);
        let result = self.store.unit_of_work(|store| -> ServiceResult<_> {
            let Some(mut department) = store.find_department(id)? else {
                return Ok(false);
            };
            validate_scoped_name_unique(
                store,
                EntityKind::Department,
                &name,
                NameScope::Global,
                Some(id),
            )?;
            validate_text_length("name", &name, NAME_MIN_CHARS, DEPARTMENT_NAME_MAX_CHARS)?;

            department.name = name.clone();
            self.shadow.on_update(&mut department.audit);
            store
                .update_department(&department)
                .map_err(unique_backstop(duplicate_name(EntityKind::Department, &name)))?;
            Ok(true)
        });
        log_outcome(MODULE, "department_update", Some(id), &result);
        result
    }

    /// Soft-deletes a department. Its scopes are left untouched.
    pub fn soft_delete_department(&self, id: DepartmentId) -> ServiceResult<bool> {
        let result = self.store.unit_of_work(|store| -> ServiceResult<_> {
            let Some(mut department) = store.find_department(id)? else {
                return Ok(false);
            };
            self.shadow.on_soft_delete(&mut department.audit);
            store.update_department(&department)?;
            Ok(true)
        });
        log_outcome(MODULE, "department_delete", Some(id), &result);
        result
    }

    /// Creates a scope whose name is unique within its department.
    pub fn create_scope(
        &self,
        session_token: &str,
        department_id: DepartmentId,
        name: &str,
    ) -> ServiceResult<ScopeId> {
        let name = normalize_name(name);
        let result = self.resolve_creator(session_token).and_then(|creator_id| {
            self.store.unit_of_work(|store| -> ServiceResult<_> {
                validate_parent_exists(store, EntityKind::Department, department_id)?;
                validate_scoped_name_unique(
                    store,
                    EntityKind::Scope,
                    &name,
                    NameScope::Department(department_id),
                    None,
                )?;
                validate_text_length("name", &name, NAME_MIN_CHARS, SCOPE_NAME_MAX_CHARS)?;

                let scope = Scope {
                    id: 0,
                    name: name.clone(),
                    department_id,
                    creator_id,
                    audit: self.shadow.on_create(self.sequence_tag(EntityKind::Scope)),
                };
                store
                    .insert_scope(&scope)
                    .map_err(unique_backstop(duplicate_name(EntityKind::Scope, &name)))
            })
        });
        log_outcome(MODULE, "scope_create", None, &result);
        result
    }

    /// Renames a scope. The owning department does not change.
    pub fn update_scope(&self, id: ScopeId, name: &str) -> ServiceResult<bool> {
        let name = normalize_name(name);
        let result = self.store.unit_of_work(|store| -> ServiceResult<_> {
            let Some(mut scope) = store.find_scope(id)? else {
                return Ok(false);
            };
            validate_scoped_name_unique(
                store,
                EntityKind::Scope,
                &name,
                NameScope::Department(scope.department_id),
                Some(id),
            )?;
            validate_text_length("name", &name, NAME_MIN_CHARS, SCOPE_NAME_MAX_CHARS)?;

            scope.name = name.clone();
            self.shadow.on_update(&mut scope.audit);
            store
                .update_scope(&scope)
                .map_err(unique_backstop(duplicate_name(EntityKind::Scope, &name)))?;
            Ok(true)
        });
        log_outcome(MODULE, "scope_update", Some(id), &result);
        result
    }

    pub fn soft_delete_scope(&self, id: ScopeId) -> ServiceResult<bool> {
        let result = self.store.unit_of_work(|store| -> ServiceResult<_> {
            let Some(mut scope) = store.find_scope(id)? else {
                return Ok(false);
            };
            self.shadow.on_soft_delete(&mut scope.audit);
            store.update_scope(&scope)?;
            Ok(true)
        });
        log_outcome(MODULE, "scope_delete", Some(id), &result);
        result
    }

    /// Creates a BPM type. Names are not required to be unique.
    pub fn create_bpm_type(&self, session_token: &str, name: &str) -> ServiceResult<BpmTypeId> {
        let name = normalize_name(name);
        let result = self.resolve_creator(session_token).and_then(|creator_id| {
            self.store.unit_of_work(|store| -> ServiceResult<_> {
                validate_text_length("name", &name, NAME_MIN_CHARS, BPM_TYPE_NAME_MAX_CHARS)?;
                let bpm_type = BpmType {
                    id: 0,
                    name: name.clone(),
                    creator_id,
                    audit: self.shadow.on_create(self.sequence_tag(EntityKind::BpmType)),
                };
                Ok(store.insert_bpm_type(&bpm_type)?)
            })
        });
        log_outcome(MODULE, "bpm_type_create", None, &result);
        result
    }

    pub fn update_bpm_type(&self, id: BpmTypeId, name: &str) -> ServiceResult<bool> {
        let name = normalize_name(name);
        let result = self.store.unit_of_work(|store| -> ServiceResult<_> {
            let Some(mut bpm_type) = store.find_bpm_type(id)? else {
                return Ok(false);
            };
            validate_text_length("name", &name, NAME_MIN_CHARS, BPM_TYPE_NAME_MAX_CHARS)?;
            bpm_type.name = name.clone();
            self.shadow.on_update(&mut bpm_type.audit);
            store.update_bpm_type(&bpm_type)?;
            Ok(true)
        });
        log_outcome(MODULE, "bpm_type_update", Some(id), &result);
        result
    }

    pub fn soft_delete_bpm_type(&self, id: BpmTypeId) -> ServiceResult<bool> {
        let result = self.store.unit_of_work(|store| -> ServiceResult<_> {
            let Some(mut bpm_type) = store.find_bpm_type(id)? else {
                return Ok(false);
            };
            self.shadow.on_soft_delete(&mut bpm_type.audit);
            store.update_bpm_type(&bpm_type)?;
            Ok(true)
        });
        log_outcome(MODULE, "bpm_type_delete", Some(id), &result);
        result
    }
}

pub(super) fn duplicate_name(kind: EntityKind, name: &str) -> IntegrityViolation {
    IntegrityViolation::DuplicateName {
        kind,
        name: name.to_string(),
    }
}
