//! Scenario tests for the persisted store and its derived dashboard.
//!
//! Tests cover:
//!  1. Idempotent seeding across re-opens
//!  2. ID monotonicity across deletes
//!  3. Add then delete (idempotent delete)
//!  4. Field defaulting on add
//!  5. Prepend ordering and recent views
//!  6. Dashboard refresh on every mutation
//!  7. Snapshot round-trip and partial import
//!  8. Reset back to first-run state
//!  9. Corrupt-storage fallback
//! 10. Feed folding
//! 11. Write-failure surfacing

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use devmonitor_core::clock::FixedClock;
use devmonitor_core::events::FeedEvent;
use devmonitor_core::medium::{MemoryMedium, StorageMedium};
use devmonitor_core::models::{
    ActivityType, AlertStatus, DeviceRef, DeviceStatus, NewActivity, NewDevice, NewUser, Role,
    SecuritySettings, SecurityStatus, UserPatch, UserRef,
};
use devmonitor_core::monitor::MonitorStore;
use devmonitor_core::seed;
use devmonitor_core::snapshot::Snapshot;
use devmonitor_core::store::StoreError;
use tempfile::tempdir;

fn noon() -> DateTime<Local> {
    Local.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
}

fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(noon()))
}

fn open_store() -> MonitorStore<MemoryMedium> {
    MonitorStore::with_medium(MemoryMedium::new(), fixed_clock()).unwrap()
}

fn shared_store() -> (MonitorStore<Arc<MemoryMedium>>, Arc<MemoryMedium>) {
    let medium = Arc::new(MemoryMedium::new());
    let store = MonitorStore::with_medium(medium.clone(), fixed_clock()).unwrap();
    (store, medium)
}

fn user_ref(email: &str) -> UserRef {
    UserRef {
        id: None,
        email: email.to_string(),
        name: None,
    }
}

fn new_device(name: &str) -> NewDevice {
    NewDevice {
        device_name: name.to_string(),
        device_id: format!("device-{name}"),
        user: user_ref("admin@devmonitor.com"),
        status: None,
    }
}

fn new_activity(activity_type: ActivityType) -> NewActivity {
    NewActivity {
        activity_type,
        user: user_ref("admin@devmonitor.com"),
        device: DeviceRef {
            id: None,
            device_name: "MacBook Pro".into(),
        },
        repository: Some("project-alpha".into()),
        is_suspicious: None,
        metadata: None,
    }
}

// ─── Seeding ────────────────────────────────────────────────────────────────

#[test]
fn seeding_is_idempotent_across_reopens() {
    let dir = tempdir().unwrap();
    {
        let _store = MonitorStore::with_medium(
            devmonitor_core::medium::FileMedium::open(dir.path()).unwrap(),
            fixed_clock(),
        )
        .unwrap();
    }
    let first = std::fs::read(dir.path().join("devmonitor_users.json")).unwrap();
    {
        let _store = MonitorStore::with_medium(
            devmonitor_core::medium::FileMedium::open(dir.path()).unwrap(),
            fixed_clock(),
        )
        .unwrap();
    }
    let second = std::fs::read(dir.path().join("devmonitor_users.json")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn user_edits_survive_reopen() {
    let dir = tempdir().unwrap();
    let medium = devmonitor_core::medium::FileMedium::open(dir.path()).unwrap();
    let store = MonitorStore::with_medium(medium, fixed_clock()).unwrap();
    store.delete_user(1).unwrap();

    let medium = devmonitor_core::medium::FileMedium::open(dir.path()).unwrap();
    let reopened = MonitorStore::with_medium(medium, fixed_clock()).unwrap();
    assert!(reopened.users().iter().all(|u| u.id != 1));
}

// ─── IDs ────────────────────────────────────────────────────────────────────

#[test]
fn ids_stay_monotonic_across_deletes() {
    let store = open_store();
    let a = store.add_device(new_device("a")).unwrap();
    let b = store.add_device(new_device("b")).unwrap();
    assert!(b.id > a.id);

    store.delete_device(b.id).unwrap();
    let c = store.add_device(new_device("c")).unwrap();
    assert!(c.id > b.id, "ids are never reused after deletion");
}

#[test]
fn add_then_delete_device_scenario() {
    let store = open_store();
    let max_before = store.devices().iter().map(|d| d.id).max().unwrap();
    let device = store.add_device(new_device("X")).unwrap();
    assert_eq!(device.id, max_before + 1);

    store.delete_device(device.id).unwrap();
    assert!(store.devices().iter().all(|d| d.id != device.id));

    // second delete of the same id is still a success
    store.delete_device(device.id).unwrap();
}

// ─── Defaults ───────────────────────────────────────────────────────────────

#[test]
fn add_fills_collection_defaults() {
    let store = open_store();

    let device = store.add_device(new_device("fresh")).unwrap();
    assert_eq!(device.status, DeviceStatus::Pending);

    let activity = store.add_activity(new_activity(ActivityType::GitPull)).unwrap();
    assert!(!activity.is_suspicious);
    assert_eq!(activity.timestamp, noon().with_timezone(&Utc));

    let repo = store
        .add_repository(devmonitor_core::models::NewRepository {
            name: "data-pipeline".into(),
            path: "/repos/data-pipeline".into(),
            user: user_ref("admin@devmonitor.com"),
            is_encrypted: None,
            security_status: None,
        })
        .unwrap();
    assert!(!repo.is_encrypted);
    assert_eq!(repo.security_status, SecurityStatus::Secure);

    let alert = store
        .add_alert(devmonitor_core::models::NewAlert {
            severity: devmonitor_core::models::Severity::Warning,
            message: "New device pending authorization".into(),
            activity: Default::default(),
            status: None,
        })
        .unwrap();
    assert_eq!(alert.status, AlertStatus::Unread);
}

#[test]
fn update_missing_id_is_not_found() {
    let store = open_store();
    let err = store.update_user(9999, UserPatch::default()).unwrap_err();
    assert!(matches!(
        err,
        StoreError::NotFound { entity: "user", id: 9999 }
    ));
}

// ─── Ordering and recent views ──────────────────────────────────────────────

#[test]
fn activities_and_alerts_are_prepended() {
    let store = open_store();
    let first = store.add_activity(new_activity(ActivityType::GitPush)).unwrap();
    let second = store.add_activity(new_activity(ActivityType::GitCommit)).unwrap();

    let activities = store.activities();
    assert_eq!(activities[0].id, second.id);
    assert_eq!(activities[1].id, first.id);

    let dashboard = store.dashboard();
    assert_eq!(dashboard.recent_activities[0].id, second.id);
    assert!(dashboard.recent_activities.len() <= 5);
    assert!(dashboard.recent_alerts.len() <= 3);
}

// ─── Dashboard refresh ──────────────────────────────────────────────────────

#[test]
fn every_mutation_refreshes_the_dashboard() {
    let store = open_store();
    let before = store.dashboard();

    store
        .add_user(NewUser {
            name: "Sam Lee".into(),
            email: "sam.lee@example.com".into(),
            role: Role::Viewer,
            status: None,
        })
        .unwrap();
    let after_user = store.dashboard();
    assert_eq!(after_user.overview.total_users, before.overview.total_users + 1);

    store.add_device(new_device("extra")).unwrap();
    let after_device = store.dashboard();
    assert_eq!(
        after_device.overview.total_devices,
        before.overview.total_devices + 1
    );
    // the new device is PENDING, so the score drops
    assert!(after_device.overview.security_score < after_user.overview.security_score);
}

#[test]
fn trend_counts_activities_in_the_trailing_week() {
    let store = open_store();
    // seeds carry 3 activities at 0h/1h/2h before "now"
    store.add_activity(new_activity(ActivityType::GitPush)).unwrap();
    let dashboard = store.dashboard();
    assert_eq!(dashboard.activity_trend.len(), 7);
    let total: usize = dashboard.activity_trend.iter().map(|p| p.count).sum();
    assert_eq!(total, 4);
    assert_eq!(dashboard.activity_trend[6].date, "Today");
    assert_eq!(dashboard.activity_trend[6].count, 4);
}

// ─── Snapshots ──────────────────────────────────────────────────────────────

#[test]
fn import_of_export_round_trips() {
    let store = open_store();
    store.add_device(new_device("kept")).unwrap();
    let snapshot = store.export();

    store.add_device(new_device("discarded")).unwrap();
    store.delete_user(1).unwrap();

    store.import(snapshot.clone()).unwrap();
    assert_eq!(Some(store.users()), snapshot.users);
    assert_eq!(Some(store.devices()), snapshot.devices);
    assert_eq!(Some(store.activities()), snapshot.activities);
    assert_eq!(Some(store.repositories()), snapshot.repositories);
    assert_eq!(Some(store.alerts()), snapshot.alerts);
    assert_eq!(Some(store.security_settings()), snapshot.security_settings);
}

#[test]
fn partial_import_leaves_other_collections_untouched() {
    let store = open_store();
    let devices_before = store.devices();
    let activities_before = store.activities();

    let snapshot = Snapshot {
        users: Some(vec![]),
        ..Default::default()
    };
    store.import(snapshot).unwrap();

    assert!(store.users().is_empty());
    assert_eq!(store.devices(), devices_before);
    assert_eq!(store.activities(), activities_before);
}

// ─── Reset ──────────────────────────────────────────────────────────────────

#[test]
fn reset_restores_first_run_state() {
    let store = open_store();
    store.add_device(new_device("temporary")).unwrap();
    store.delete_user(1).unwrap();

    store.reset().unwrap();
    assert_eq!(store.users(), seed::default_users(noon()));
    assert_eq!(store.devices(), seed::default_devices(noon()));
    assert_eq!(store.activities(), seed::default_activities(noon()));
    assert_eq!(store.repositories(), seed::default_repositories(noon()));
    assert_eq!(store.alerts(), seed::default_alerts(noon()));
    assert_eq!(store.security_settings(), SecuritySettings::default());
}

// ─── Corrupt storage ────────────────────────────────────────────────────────

#[test]
fn corrupt_collection_falls_back_to_defaults() {
    let (store, medium) = shared_store();
    medium.write("devmonitor_devices", "][ not json").unwrap();
    assert_eq!(store.devices(), seed::default_devices(noon()));
}

// ─── Feed folding ───────────────────────────────────────────────────────────

#[test]
fn feed_records_fold_through_the_add_path() {
    let store = open_store();
    let activity: FeedEvent = serde_json::from_str(
        r#"{"kind":"activity","payload":{
            "activityType":"UNAUTHORIZED_ACCESS",
            "user":{"email":"john.doe@example.com"},
            "device":{"deviceName":"Unknown Device"},
            "isSuspicious":true
        }}"#,
    )
    .unwrap();
    let alert: FeedEvent = serde_json::from_str(
        r#"{"kind":"alert","payload":{
            "severity":"CRITICAL",
            "message":"Unauthorized repository access detected"
        }}"#,
    )
    .unwrap();

    let score_before = store.dashboard().overview.security_score;
    store.fold_event(activity).unwrap();
    store.fold_event(alert).unwrap();

    let activities = store.activities();
    assert_eq!(activities[0].activity_type, ActivityType::UnauthorizedAccess);
    assert!(activities[0].is_suspicious);
    let alerts = store.alerts();
    assert_eq!(alerts[0].status, AlertStatus::Unread);
    assert!(store.dashboard().overview.security_score < score_before);
}

// ─── Failure surfacing ──────────────────────────────────────────────────────

struct FlakyMedium {
    inner: MemoryMedium,
    failing: AtomicBool,
}

impl FlakyMedium {
    fn new() -> Self {
        Self {
            inner: MemoryMedium::new(),
            failing: AtomicBool::new(false),
        }
    }
}

impl StorageMedium for FlakyMedium {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        self.inner.read(key)
    }

    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "quota exceeded"));
        }
        self.inner.write(key, value)
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        self.inner.remove(key)
    }
}

#[test]
fn write_failure_is_surfaced_to_the_caller() {
    let medium = Arc::new(FlakyMedium::new());
    let store = MonitorStore::with_medium(medium.clone(), fixed_clock()).unwrap();

    medium.failing.store(true, Ordering::SeqCst);
    let err = store.add_device(new_device("doomed")).unwrap_err();
    assert!(matches!(err, StoreError::WriteFailed { .. }));

    medium.failing.store(false, Ordering::SeqCst);
    store.add_device(new_device("recovered")).unwrap();
}

#[test]
fn settings_validation_rejects_zero_attempts() {
    let store = open_store();
    let err = store
        .update_security_settings(SecuritySettings {
            max_failed_attempts: 0,
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidSettings(_)));

    let updated = store
        .update_security_settings(SecuritySettings {
            max_failed_attempts: 5,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(updated.max_failed_attempts, 5);
    assert_eq!(store.security_settings().max_failed_attempts, 5);
}
