#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use refdata_core::config::IdentityConfig;
use refdata_core::shadow::{Clock, CorrelationIdSource};
use refdata_core::{
    AssociationService, CoreConfig, LifecycleService, QueryService, ReorderService, ShadowSync,
    SqliteReferenceStore, StaticIdentityLookup,
};
use rusqlite::Connection;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const TOKEN: &str = "tok";
pub const USER: &str = "user-1";

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()),
        }
    }

    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock().unwrap();
        *now += Duration::seconds(secs);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Deterministic, never-repeating GUIDs.
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl CorrelationIdSource for SequentialIds {
    fn next_id(&self) -> Uuid {
        Uuid::from_u128(u128::from(self.next.fetch_add(1, Ordering::SeqCst)) + 1)
    }
}

pub struct Services<'conn> {
    pub clock: Arc<ManualClock>,
    pub lifecycle: LifecycleService<SqliteReferenceStore<'conn>, StaticIdentityLookup>,
    pub association: AssociationService<SqliteReferenceStore<'conn>, StaticIdentityLookup>,
    pub reorder: ReorderService<SqliteReferenceStore<'conn>>,
    pub query: QueryService<SqliteReferenceStore<'conn>>,
}

pub fn services(conn: &Connection) -> Services<'_> {
    services_with_config(conn, CoreConfig::default())
}

pub fn services_with_config(conn: &Connection, config: CoreConfig) -> Services<'_> {
    let clock = Arc::new(ManualClock::new());
    let shadow = ShadowSync::new(clock.clone(), Arc::new(SequentialIds::default()));
    let store = SqliteReferenceStore::new(conn, config.naming.match_mode);
    let identity =
        StaticIdentityLookup::new(IdentityConfig::default()).with_user(TOKEN, USER);

    Services {
        clock,
        lifecycle: LifecycleService::new(
            store,
            identity.clone(),
            shadow.clone(),
            config.clone(),
        ),
        association: AssociationService::new(store, identity, shadow.clone(), config.clone()),
        reorder: ReorderService::new(store, shadow, config.clone()),
        query: QueryService::new(store, config),
    }
}
