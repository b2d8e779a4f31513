mod common;

use common::{services, services_with_config, TOKEN, USER};
use refdata_core::config::NamingConfig;
use refdata_core::identity::IdentityError;
use refdata_core::{
    open_db_in_memory, CoreConfig, EntityKind, IntegrityViolation, NameMatchMode, PageRequest,
    ServiceError,
};

#[test]
fn department_create_then_get() {
    let conn = open_db_in_memory().unwrap();
    let svc = services(&conn);

    let id = svc.lifecycle.create_department(TOKEN, "  Finance   Ops ").unwrap();

    let department = svc.query.department(id).unwrap().unwrap();
    assert_eq!(department.name, "Finance Ops");
    assert_eq!(department.creator_id, USER);
    assert!(department.audit.is_active());
}

#[test]
fn duplicate_department_name_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let svc = services(&conn);

    svc.lifecycle.create_department(TOKEN, "Finance").unwrap();
    let err = svc.lifecycle.create_department(TOKEN, "Finance").unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Integrity(IntegrityViolation::DuplicateName {
            kind: EntityKind::Department,
            ..
        })
    ));
    assert!(err.is_rejection());
    assert_eq!(svc.query.departments().unwrap().len(), 1);
}

#[test]
fn deleted_department_frees_its_name() {
    let conn = open_db_in_memory().unwrap();
    let svc = services(&conn);

    let first = svc.lifecycle.create_department(TOKEN, "Finance").unwrap();
    assert!(svc.lifecycle.soft_delete_department(first).unwrap());
    let second = svc.lifecycle.create_department(TOKEN, "Finance").unwrap();

    assert_ne!(first, second);
    assert!(svc.query.department(first).unwrap().is_none());
    assert_eq!(svc.query.departments().unwrap().len(), 1);
}

#[test]
fn soft_delete_is_irreversible_and_hides_row_from_updates() {
    let conn = open_db_in_memory().unwrap();
    let svc = services(&conn);

    let id = svc.lifecycle.create_department(TOKEN, "Finance").unwrap();
    assert!(svc.lifecycle.soft_delete_department(id).unwrap());
    assert!(!svc.lifecycle.soft_delete_department(id).unwrap());
    assert!(!svc.lifecycle.update_department(id, "Renamed").unwrap());

    let audit = svc.query.audit(EntityKind::Department, id).unwrap().unwrap();
    assert!(audit.is_deleted);
}

#[test]
fn update_of_missing_department_returns_false() {
    let conn = open_db_in_memory().unwrap();
    let svc = services(&conn);

    assert!(!svc.lifecycle.update_department(404, "Nobody").unwrap());
    assert!(!svc.lifecycle.soft_delete_department(404).unwrap());
}

#[test]
fn renaming_department_to_its_own_name_is_allowed() {
    let conn = open_db_in_memory().unwrap();
    let svc = services(&conn);

    let id = svc.lifecycle.create_department(TOKEN, "Finance").unwrap();
    svc.clock.advance_secs(60);
    assert!(svc.lifecycle.update_department(id, "Finance").unwrap());

    let department = svc.query.department(id).unwrap().unwrap();
    assert!(department.audit.modified_at > department.audit.created_at);
}

#[test]
fn name_length_bounds_are_enforced() {
    let conn = open_db_in_memory().unwrap();
    let svc = services(&conn);

    let err = svc.lifecycle.create_department(TOKEN, "F").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Integrity(IntegrityViolation::OutOfRange { field: "name", .. })
    ));
    let too_long = "x".repeat(51);
    assert!(svc.lifecycle.create_department(TOKEN, &too_long).is_err());
    assert!(svc
        .lifecycle
        .create_department(TOKEN, &"x".repeat(50))
        .is_ok());
}

#[test]
fn unknown_session_is_rejected_before_any_write() {
    let conn = open_db_in_memory().unwrap();
    let svc = services(&conn);

    let err = svc.lifecycle.create_department("stranger", "Finance").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Identity(IdentityError::UserNotFound)
    ));
    let err = svc.lifecycle.create_department("  ", "Finance").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Identity(IdentityError::MissingSession)
    ));
    assert!(svc.query.departments().unwrap().is_empty());
}

#[test]
fn scope_names_are_unique_per_department_only() {
    let conn = open_db_in_memory().unwrap();
    let svc = services(&conn);

    let finance = svc.lifecycle.create_department(TOKEN, "Finance").unwrap();
    let legal = svc.lifecycle.create_department(TOKEN, "Legal").unwrap();

    svc.lifecycle.create_scope(TOKEN, finance, "Payroll").unwrap();
    svc.lifecycle.create_scope(TOKEN, legal, "Payroll").unwrap();
    let err = svc.lifecycle.create_scope(TOKEN, finance, "Payroll").unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Integrity(IntegrityViolation::DuplicateName {
            kind: EntityKind::Scope,
            ..
        })
    ));
    assert_eq!(svc.query.scopes().unwrap().len(), 2);
}

#[test]
fn scope_under_missing_or_deleted_department_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let svc = services(&conn);

    let err = svc.lifecycle.create_scope(TOKEN, 99, "Payroll").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Integrity(IntegrityViolation::ParentNotFound {
            kind: EntityKind::Department,
            id: 99
        })
    ));

    let finance = svc.lifecycle.create_department(TOKEN, "Finance").unwrap();
    svc.lifecycle.soft_delete_department(finance).unwrap();
    assert!(svc.lifecycle.create_scope(TOKEN, finance, "Payroll").is_err());
}

#[test]
fn deleting_department_does_not_cascade_to_scopes() {
    let conn = open_db_in_memory().unwrap();
    let svc = services(&conn);

    let finance = svc.lifecycle.create_department(TOKEN, "Finance").unwrap();
    let payroll = svc.lifecycle.create_scope(TOKEN, finance, "Payroll").unwrap();
    svc.lifecycle.soft_delete_department(finance).unwrap();

    let view = svc.query.scope(payroll).unwrap().unwrap();
    assert_eq!(view.department_name, "Finance");
    assert!(view.scope.audit.is_active());
}

#[test]
fn scope_rename_checks_siblings_in_same_department() {
    let conn = open_db_in_memory().unwrap();
    let svc = services(&conn);

    let finance = svc.lifecycle.create_department(TOKEN, "Finance").unwrap();
    svc.lifecycle.create_scope(TOKEN, finance, "Payroll").unwrap();
    let budget = svc.lifecycle.create_scope(TOKEN, finance, "Budget").unwrap();

    assert!(svc.lifecycle.update_scope(budget, "Payroll").is_err());
    assert!(svc.lifecycle.update_scope(budget, "Forecast").unwrap());
    assert_eq!(svc.query.scope(budget).unwrap().unwrap().scope.name, "Forecast");
}

#[test]
fn case_insensitive_mode_treats_case_variants_as_duplicates() {
    let conn = open_db_in_memory().unwrap();
    let config = CoreConfig {
        naming: NamingConfig {
            match_mode: NameMatchMode::CaseInsensitive,
        },
        ..CoreConfig::default()
    };
    let svc = services_with_config(&conn, config);

    svc.lifecycle.create_department(TOKEN, "Finance").unwrap();
    assert!(svc.lifecycle.create_department(TOKEN, "FINANCE").is_err());
    assert_eq!(svc.query.search_departments("fin").unwrap().len(), 1);
}

#[test]
fn exact_mode_allows_case_variants() {
    let conn = open_db_in_memory().unwrap();
    let svc = services(&conn);

    svc.lifecycle.create_department(TOKEN, "Finance").unwrap();
    svc.lifecycle.create_department(TOKEN, "FINANCE").unwrap();
    assert_eq!(svc.query.search_departments("Fin").unwrap().len(), 1);
    assert_eq!(svc.query.search_departments("  ").unwrap().len(), 2);
}

#[test]
fn scopes_page_by_department() {
    let conn = open_db_in_memory().unwrap();
    let svc = services(&conn);

    let finance = svc.lifecycle.create_department(TOKEN, "Finance").unwrap();
    let legal = svc.lifecycle.create_department(TOKEN, "Legal").unwrap();
    for name in ["Alpha", "Beta", "Gamma"] {
        svc.lifecycle.create_scope(TOKEN, finance, name).unwrap();
    }
    svc.lifecycle.create_scope(TOKEN, legal, "Contracts").unwrap();

    let page = svc
        .query
        .scopes_by_department_page(finance, PageRequest::new(2, 2))
        .unwrap();
    assert_eq!(page.total_count, 3);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].scope.name, "Gamma");

    let found = svc.query.search_scopes("a", Some(legal)).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].scope.name, "Contracts");
}

#[test]
fn bpm_types_allow_duplicate_names() {
    let conn = open_db_in_memory().unwrap();
    let svc = services(&conn);

    let first = svc.lifecycle.create_bpm_type(TOKEN, "Approval").unwrap();
    svc.lifecycle.create_bpm_type(TOKEN, "Approval").unwrap();
    assert_eq!(svc.query.bpm_types().unwrap().len(), 2);

    assert!(svc.lifecycle.update_bpm_type(first, "Review").unwrap());
    assert!(svc.lifecycle.soft_delete_bpm_type(first).unwrap());
    let names: Vec<String> = svc
        .query
        .bpm_types()
        .unwrap()
        .into_iter()
        .map(|bpm_type| bpm_type.name)
        .collect();
    assert_eq!(names, vec!["Approval".to_string()]);
}
