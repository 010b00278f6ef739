//! First-run default datasets and the lazy seeder.
//!
//! Timestamps are derived from the injected clock so a fresh store looks
//! recently active. Seeding runs once, guarded by the initialized flag, and
//! never overwrites existing data afterwards.

use chrono::{DateTime, Duration, Local, Utc};
use serde_json::json;
use tracing::info;

use crate::dashboard;
use crate::medium::StorageMedium;
use crate::models::{
    Activity, ActivityType, Alert, AlertContext, AlertStatus, Device, DeviceRef, DeviceStatus,
    Repository, Role, SecuritySettings, SecurityStatus, Severity, User, UserRef,
};
use crate::store::{
    DocumentStore, StoreError, ACTIVITIES_KEY, ALERTS_KEY, DASHBOARD_KEY, DEVICES_KEY,
    INITIALIZED_KEY, REPOSITORIES_KEY, SECURITY_SETTINGS_KEY, USERS_KEY,
};

/// Seed the six default collections plus the derived dashboard if the store
/// has never been initialized. Idempotent after the first run.
pub fn ensure_seeded<M: StorageMedium>(
    docs: &DocumentStore<M>,
    now: DateTime<Local>,
) -> Result<(), StoreError> {
    if docs.contains(INITIALIZED_KEY) {
        return Ok(());
    }

    let users = default_users(now);
    let devices = default_devices(now);
    let activities = default_activities(now);
    let repositories = default_repositories(now);
    let alerts = default_alerts(now);

    docs.set(USERS_KEY, &users)?;
    docs.set(DEVICES_KEY, &devices)?;
    docs.set(ACTIVITIES_KEY, &activities)?;
    docs.set(REPOSITORIES_KEY, &repositories)?;
    docs.set(ALERTS_KEY, &alerts)?;
    docs.set(SECURITY_SETTINGS_KEY, &SecuritySettings::default())?;

    let dashboard = dashboard::rebuild(&users, &devices, &activities, &repositories, &alerts, now);
    docs.set(DASHBOARD_KEY, &dashboard)?;
    docs.set(INITIALIZED_KEY, &true)?;
    info!("seeded default collections");
    Ok(())
}

fn user_ref(email: &str, name: &str) -> UserRef {
    UserRef {
        id: None,
        email: email.to_string(),
        name: Some(name.to_string()),
    }
}

pub fn default_users(now: DateTime<Local>) -> Vec<User> {
    let utc = now.with_timezone(&Utc);
    let entries = [
        ("Admin User", "admin@devmonitor.com", Role::Admin, 30),
        ("Developer User", "developer@devmonitor.com", Role::Developer, 25),
        ("Viewer User", "viewer@devmonitor.com", Role::Viewer, 20),
        ("John Doe", "john.doe@example.com", Role::Developer, 15),
        ("Jane Smith", "jane.smith@example.com", Role::Developer, 10),
        ("Alex Johnson", "alex.johnson@example.com", Role::Admin, 5),
    ];
    entries
        .iter()
        .enumerate()
        .map(|(i, (name, email, role, days_ago))| User {
            id: i as u64 + 1,
            name: name.to_string(),
            email: email.to_string(),
            role: *role,
            status: "Active".to_string(),
            created_at: utc - Duration::days(*days_ago),
        })
        .collect()
}

pub fn default_devices(now: DateTime<Local>) -> Vec<Device> {
    let utc = now.with_timezone(&Utc);
    let entries = [
        ("MacBook Pro", "device-001", "admin@devmonitor.com", "Admin User", DeviceStatus::Authorized, 0, 30),
        ("Dell Laptop", "device-002", "developer@devmonitor.com", "Developer User", DeviceStatus::Authorized, 1, 25),
        ("HP Workstation", "device-003", "jane.smith@example.com", "Jane Smith", DeviceStatus::Authorized, 2, 20),
        ("iPad Pro", "device-004", "developer@devmonitor.com", "Developer User", DeviceStatus::Pending, 3, 2),
        ("Lenovo Laptop", "device-005", "alex.johnson@example.com", "Alex Johnson", DeviceStatus::Authorized, 4, 15),
        ("Unknown Device", "device-006", "john.doe@example.com", "John Doe", DeviceStatus::Pending, 5, 1),
    ];
    entries
        .iter()
        .enumerate()
        .map(
            |(i, (device_name, device_id, email, name, status, hours_idle, days_ago))| Device {
                id: i as u64 + 1,
                device_name: device_name.to_string(),
                device_id: device_id.to_string(),
                user: user_ref(email, name),
                status: *status,
                last_active: utc - Duration::hours(*hours_idle),
                created_at: utc - Duration::days(*days_ago),
            },
        )
        .collect()
}

pub fn default_activities(now: DateTime<Local>) -> Vec<Activity> {
    let utc = now.with_timezone(&Utc);
    vec![
        Activity {
            id: 1,
            activity_type: ActivityType::GitPush,
            user: UserRef {
                id: Some(1),
                email: "admin@devmonitor.com".into(),
                name: Some("Admin User".into()),
            },
            device: DeviceRef {
                id: Some(1),
                device_name: "MacBook Pro".into(),
            },
            repository: Some("project-alpha".into()),
            timestamp: utc,
            is_suspicious: false,
            metadata: json!({"branch": "main", "commits": 3}),
        },
        Activity {
            id: 2,
            activity_type: ActivityType::GitClone,
            user: UserRef {
                id: Some(2),
                email: "developer@devmonitor.com".into(),
                name: Some("Developer User".into()),
            },
            device: DeviceRef {
                id: Some(2),
                device_name: "Dell Laptop".into(),
            },
            repository: Some("project-beta".into()),
            timestamp: utc - Duration::hours(1),
            is_suspicious: false,
            metadata: json!({"size": "150MB"}),
        },
        Activity {
            id: 3,
            activity_type: ActivityType::RepoCopy,
            user: UserRef {
                id: Some(4),
                email: "john.doe@example.com".into(),
                name: Some("John Doe".into()),
            },
            device: DeviceRef {
                id: Some(6),
                device_name: "Unknown Device".into(),
            },
            repository: Some("secret-project".into()),
            timestamp: utc - Duration::hours(2),
            is_suspicious: true,
            metadata: json!({"destination": "/external/drive"}),
        },
    ]
}

pub fn default_repositories(now: DateTime<Local>) -> Vec<Repository> {
    let utc = now.with_timezone(&Utc);
    let entries = [
        ("project-alpha", true, "admin@devmonitor.com", 0, 60),
        ("project-beta", true, "developer@devmonitor.com", 1, 45),
        ("frontend-app", true, "jane.smith@example.com", 2, 30),
        ("backend-api", true, "alex.johnson@example.com", 3, 25),
        ("secret-project", false, "john.doe@example.com", 4, 20),
    ];
    entries
        .iter()
        .enumerate()
        .map(|(i, (name, encrypted, email, hours_idle, days_ago))| Repository {
            id: i as u64 + 1,
            name: name.to_string(),
            path: format!("/repos/{name}"),
            is_encrypted: *encrypted,
            security_status: SecurityStatus::Secure,
            last_accessed: utc - Duration::hours(*hours_idle),
            last_activity: None,
            created_at: utc - Duration::days(*days_ago),
            user: UserRef {
                id: None,
                email: email.to_string(),
                name: None,
            },
        })
        .collect()
}

pub fn default_alerts(now: DateTime<Local>) -> Vec<Alert> {
    let utc = now.with_timezone(&Utc);
    vec![
        Alert {
            id: 1,
            severity: Severity::Critical,
            message: "Unauthorized repository access detected".into(),
            activity: AlertContext {
                id: Some(3),
                user: Some(user_ref("john.doe@example.com", "John Doe")),
                device: Some(DeviceRef {
                    id: None,
                    device_name: "Unknown Device".into(),
                }),
                repository: Some("secret-project".into()),
            },
            status: AlertStatus::Unread,
            created_at: utc - Duration::hours(2),
        },
        Alert {
            id: 2,
            severity: Severity::Warning,
            message: "New device pending authorization".into(),
            activity: AlertContext {
                id: Some(2),
                user: Some(user_ref("developer@devmonitor.com", "Developer User")),
                device: Some(DeviceRef {
                    id: None,
                    device_name: "iPad Pro".into(),
                }),
                repository: None,
            },
            status: AlertStatus::Unread,
            created_at: utc - Duration::hours(3),
        },
        Alert {
            id: 3,
            severity: Severity::Info,
            message: "Large file commit detected".into(),
            activity: AlertContext {
                id: Some(1),
                user: Some(user_ref("jane.smith@example.com", "Jane Smith")),
                device: Some(DeviceRef {
                    id: None,
                    device_name: "HP Workstation".into(),
                }),
                repository: Some("frontend-app".into()),
            },
            status: AlertStatus::Read,
            created_at: utc - Duration::hours(5),
        },
    ]
}
