mod common;

use common::{services, services_with_config, TOKEN};
use refdata_core::config::SequenceTags;
use refdata_core::model::main_title::NewMainTitle;
use refdata_core::model::product_type::ProductTypeInput;
use refdata_core::model::service_feature::{NewLink, ServiceFeatureInput};
use refdata_core::shadow::created_at_from_epoch_ms;
use refdata_core::{open_db_in_memory, CoreConfig, EntityKind};
use std::collections::HashSet;

#[test]
fn every_entity_gets_its_default_sequence_tag() {
    let conn = open_db_in_memory().unwrap();
    let svc = services(&conn);

    let department = svc.lifecycle.create_department(TOKEN, "Finance").unwrap();
    let scope = svc.lifecycle.create_scope(TOKEN, department, "Payroll").unwrap();
    let bpm_type = svc.lifecycle.create_bpm_type(TOKEN, "Approval").unwrap();
    let main_title = svc
        .lifecycle
        .create_main_title(
            TOKEN,
            &NewMainTitle {
                name: "Salaries".to_string(),
                scope_id: scope,
                bpm_type_id: Some(bpm_type),
                ..NewMainTitle::default()
            },
        )
        .unwrap();
    let product_type = svc
        .lifecycle
        .create_product_type(&ProductTypeInput {
            name: "Monthly".to_string(),
            main_title_id: Some(main_title),
        })
        .unwrap();
    let feature = svc
        .lifecycle
        .create_service_feature(TOKEN, &ServiceFeatureInput::named("Support"))
        .unwrap();
    let link = svc
        .association
        .assign(TOKEN, &NewLink::new(main_title, feature))
        .unwrap();

    let expected = [
        (EntityKind::Department, department, 10008),
        (EntityKind::Scope, scope, 10009),
        (EntityKind::BpmType, bpm_type, 10010),
        (EntityKind::ProductType, product_type, 10011),
        (EntityKind::MainTitle, main_title, 10012),
        (EntityKind::ServiceFeature, feature, 10013),
        (EntityKind::MainTitleServiceFeature, link, 10014),
    ];
    let mut correlation_ids = HashSet::new();
    for (kind, id, tag) in expected {
        let audit = svc.query.audit(kind, id).unwrap().unwrap();
        assert_eq!(audit.sequence_tag, tag, "{kind}");
        assert_eq!(audit.created_at_epoch_ms, audit.created_at.timestamp_millis());
        assert_eq!(audit.created_at, audit.modified_at);
        assert!(!audit.is_deleted);
        assert!(correlation_ids.insert(audit.correlation_id), "{kind}");
    }
}

#[test]
fn configured_tags_override_defaults() {
    let conn = open_db_in_memory().unwrap();
    let config = CoreConfig {
        sequence_tags: SequenceTags {
            department: 42,
            ..SequenceTags::default()
        },
        ..CoreConfig::default()
    };
    let svc = services_with_config(&conn, config);

    let id = svc.lifecycle.create_department(TOKEN, "Finance").unwrap();
    let audit = svc.query.audit(EntityKind::Department, id).unwrap().unwrap();
    assert_eq!(audit.sequence_tag, 42);
}

#[test]
fn update_and_delete_only_move_modified_at() {
    let conn = open_db_in_memory().unwrap();
    let svc = services(&conn);
    let id = svc.lifecycle.create_department(TOKEN, "Finance").unwrap();
    let created = svc.query.audit(EntityKind::Department, id).unwrap().unwrap();

    svc.clock.advance_secs(10);
    svc.lifecycle.update_department(id, "Treasury").unwrap();
    let updated = svc.query.audit(EntityKind::Department, id).unwrap().unwrap();
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(updated.created_at_epoch_ms, created.created_at_epoch_ms);
    assert_eq!(updated.correlation_id, created.correlation_id);
    assert!(updated.modified_at > created.modified_at);

    svc.clock.advance_secs(10);
    svc.lifecycle.soft_delete_department(id).unwrap();
    let deleted = svc.query.audit(EntityKind::Department, id).unwrap().unwrap();
    assert!(deleted.is_deleted);
    assert!(deleted.modified_at > updated.modified_at);
    assert_eq!(
        created_at_from_epoch_ms(deleted.created_at_epoch_ms),
        Some(deleted.created_at)
    );
}

#[test]
fn null_is_deleted_reads_as_active() {
    let conn = open_db_in_memory().unwrap();
    let svc = services(&conn);
    let id = svc.lifecycle.create_department(TOKEN, "Finance").unwrap();
    conn.execute("UPDATE departments SET is_deleted = NULL WHERE id = ?1;", [id])
        .unwrap();

    let department = svc.query.department(id).unwrap().unwrap();
    assert!(!department.audit.is_deleted);
    assert!(svc.lifecycle.create_department(TOKEN, "Finance").is_err());
}

#[test]
fn audit_fields_serialize_with_stable_names() {
    let conn = open_db_in_memory().unwrap();
    let svc = services(&conn);
    let id = svc.lifecycle.create_department(TOKEN, "Finance").unwrap();
    let department = svc.query.department(id).unwrap().unwrap();

    let json = serde_json::to_value(&department).unwrap();
    assert_eq!(json["name"], "Finance");
    assert_eq!(json["audit"]["sequence_tag"], 10008);
    assert_eq!(json["audit"]["is_deleted"], false);
    assert!(json["audit"]["correlation_id"].is_string());
}
