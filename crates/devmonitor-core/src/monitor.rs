//! Typed CRUD facade over the document store.
//!
//! Every mutating operation rewrites the derived dashboard document before
//! returning, so reads never observe stale aggregates. Reads never trigger
//! recomputation; a missing or corrupt collection falls back to its default
//! dataset.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::clock::{Clock, SystemClock};
use crate::dashboard::{self, Dashboard};
use crate::events::FeedEvent;
use crate::medium::{FileMedium, StorageMedium};
use crate::models::{
    Activity, Alert, AlertPatch, AlertStatus, Device, DevicePatch, DeviceStatus, NewActivity,
    NewAlert, NewDevice, NewRepository, NewUser, Repository, RepositoryPatch, SecuritySettings,
    SecurityStatus, User, UserPatch,
};
use crate::seed;
use crate::snapshot::Snapshot;
use crate::store::{
    DocumentStore, StoreError, ACTIVITIES_KEY, ALERTS_KEY, ALL_KEYS, DASHBOARD_KEY, DEVICES_KEY,
    REPOSITORIES_KEY, SECURITY_SETTINGS_KEY, USERS_KEY,
};

fn next_id(ids: impl Iterator<Item = u64>) -> u64 {
    ids.max().unwrap_or(0) + 1
}

pub struct MonitorStore<M: StorageMedium> {
    docs: DocumentStore<M>,
    clock: Arc<dyn Clock>,
}

impl MonitorStore<FileMedium> {
    /// Open (and seed, on first run) a file-backed store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let medium = FileMedium::open(dir)?;
        Ok(Self::with_medium(medium, Arc::new(SystemClock))?)
    }
}

impl<M: StorageMedium> MonitorStore<M> {
    pub fn with_medium(medium: M, clock: Arc<dyn Clock>) -> Result<Self, StoreError> {
        let store = Self {
            docs: DocumentStore::new(medium),
            clock,
        };
        seed::ensure_seeded(&store.docs, store.clock.now())?;
        Ok(store)
    }

    fn now_utc(&self) -> DateTime<Utc> {
        self.clock.now().with_timezone(&Utc)
    }

    // ── Users ───────────────────────────────────────────────────────────────

    pub fn users(&self) -> Vec<User> {
        self.docs
            .get(USERS_KEY)
            .unwrap_or_else(|| seed::default_users(self.clock.now()))
    }

    pub fn add_user(&self, input: NewUser) -> Result<User, StoreError> {
        let mut users = self.users();
        let user = User {
            id: next_id(users.iter().map(|u| u.id)),
            name: input.name,
            email: input.email,
            role: input.role,
            status: input.status.unwrap_or_else(|| "Active".to_string()),
            created_at: self.now_utc(),
        };
        users.push(user.clone());
        self.docs.set(USERS_KEY, &users)?;
        self.refresh_dashboard()?;
        Ok(user)
    }

    pub fn update_user(&self, id: u64, patch: UserPatch) -> Result<User, StoreError> {
        let mut users = self.users();
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::NotFound { entity: "user", id })?;
        patch.apply(user);
        let updated = user.clone();
        self.docs.set(USERS_KEY, &users)?;
        self.refresh_dashboard()?;
        Ok(updated)
    }

    /// Deleting a missing id is a no-op success.
    pub fn delete_user(&self, id: u64) -> Result<(), StoreError> {
        let mut users = self.users();
        users.retain(|u| u.id != id);
        self.docs.set(USERS_KEY, &users)?;
        self.refresh_dashboard()
    }

    // ── Devices ─────────────────────────────────────────────────────────────

    pub fn devices(&self) -> Vec<Device> {
        self.docs
            .get(DEVICES_KEY)
            .unwrap_or_else(|| seed::default_devices(self.clock.now()))
    }

    pub fn add_device(&self, input: NewDevice) -> Result<Device, StoreError> {
        let mut devices = self.devices();
        let now = self.now_utc();
        let device = Device {
            id: next_id(devices.iter().map(|d| d.id)),
            device_name: input.device_name,
            device_id: input.device_id,
            user: input.user,
            status: input.status.unwrap_or(DeviceStatus::Pending),
            last_active: now,
            created_at: now,
        };
        devices.push(device.clone());
        self.docs.set(DEVICES_KEY, &devices)?;
        self.refresh_dashboard()?;
        Ok(device)
    }

    pub fn update_device(&self, id: u64, patch: DevicePatch) -> Result<Device, StoreError> {
        let mut devices = self.devices();
        let device = devices
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(StoreError::NotFound {
                entity: "device",
                id,
            })?;
        patch.apply(device);
        let updated = device.clone();
        self.docs.set(DEVICES_KEY, &devices)?;
        self.refresh_dashboard()?;
        Ok(updated)
    }

    pub fn delete_device(&self, id: u64) -> Result<(), StoreError> {
        let mut devices = self.devices();
        devices.retain(|d| d.id != id);
        self.docs.set(DEVICES_KEY, &devices)?;
        self.refresh_dashboard()
    }

    // ── Activities ──────────────────────────────────────────────────────────
    //
    // Append-only: newest records are inserted at the head and there is no
    // update or delete surface.

    pub fn activities(&self) -> Vec<Activity> {
        self.docs
            .get(ACTIVITIES_KEY)
            .unwrap_or_else(|| seed::default_activities(self.clock.now()))
    }

    pub fn add_activity(&self, input: NewActivity) -> Result<Activity, StoreError> {
        let mut activities = self.activities();
        let activity = Activity {
            id: next_id(activities.iter().map(|a| a.id)),
            activity_type: input.activity_type,
            user: input.user,
            device: input.device,
            repository: input.repository,
            timestamp: self.now_utc(),
            is_suspicious: input.is_suspicious.unwrap_or(false),
            metadata: input.metadata.unwrap_or(serde_json::Value::Null),
        };
        activities.insert(0, activity.clone());
        self.docs.set(ACTIVITIES_KEY, &activities)?;
        self.refresh_dashboard()?;
        Ok(activity)
    }

    // ── Repositories ────────────────────────────────────────────────────────

    pub fn repositories(&self) -> Vec<Repository> {
        self.docs
            .get(REPOSITORIES_KEY)
            .unwrap_or_else(|| seed::default_repositories(self.clock.now()))
    }

    pub fn add_repository(&self, input: NewRepository) -> Result<Repository, StoreError> {
        let mut repositories = self.repositories();
        let now = self.now_utc();
        let repository = Repository {
            id: next_id(repositories.iter().map(|r| r.id)),
            name: input.name,
            path: input.path,
            is_encrypted: input.is_encrypted.unwrap_or(false),
            security_status: input.security_status.unwrap_or(SecurityStatus::Secure),
            last_accessed: now,
            last_activity: Some(now),
            created_at: now,
            user: input.user,
        };
        repositories.push(repository.clone());
        self.docs.set(REPOSITORIES_KEY, &repositories)?;
        self.refresh_dashboard()?;
        Ok(repository)
    }

    pub fn update_repository(
        &self,
        id: u64,
        patch: RepositoryPatch,
    ) -> Result<Repository, StoreError> {
        let mut repositories = self.repositories();
        let repository = repositories
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound {
                entity: "repository",
                id,
            })?;
        patch.apply(repository);
        let updated = repository.clone();
        self.docs.set(REPOSITORIES_KEY, &repositories)?;
        self.refresh_dashboard()?;
        Ok(updated)
    }

    pub fn delete_repository(&self, id: u64) -> Result<(), StoreError> {
        let mut repositories = self.repositories();
        repositories.retain(|r| r.id != id);
        self.docs.set(REPOSITORIES_KEY, &repositories)?;
        self.refresh_dashboard()
    }

    // ── Alerts ──────────────────────────────────────────────────────────────

    pub fn alerts(&self) -> Vec<Alert> {
        self.docs
            .get(ALERTS_KEY)
            .unwrap_or_else(|| seed::default_alerts(self.clock.now()))
    }

    pub fn add_alert(&self, input: NewAlert) -> Result<Alert, StoreError> {
        let mut alerts = self.alerts();
        let alert = Alert {
            id: next_id(alerts.iter().map(|a| a.id)),
            severity: input.severity,
            message: input.message,
            activity: input.activity,
            status: input.status.unwrap_or(AlertStatus::Unread),
            created_at: self.now_utc(),
        };
        alerts.insert(0, alert.clone());
        self.docs.set(ALERTS_KEY, &alerts)?;
        self.refresh_dashboard()?;
        Ok(alert)
    }

    pub fn update_alert(&self, id: u64, patch: AlertPatch) -> Result<Alert, StoreError> {
        let mut alerts = self.alerts();
        let alert = alerts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound {
                entity: "alert",
                id,
            })?;
        patch.apply(alert);
        let updated = alert.clone();
        self.docs.set(ALERTS_KEY, &alerts)?;
        self.refresh_dashboard()?;
        Ok(updated)
    }

    pub fn delete_alert(&self, id: u64) -> Result<(), StoreError> {
        let mut alerts = self.alerts();
        alerts.retain(|a| a.id != id);
        self.docs.set(ALERTS_KEY, &alerts)?;
        self.refresh_dashboard()
    }

    // ── Security settings ───────────────────────────────────────────────────

    pub fn security_settings(&self) -> SecuritySettings {
        self.docs.get(SECURITY_SETTINGS_KEY).unwrap_or_default()
    }

    pub fn update_security_settings(
        &self,
        settings: SecuritySettings,
    ) -> Result<SecuritySettings, StoreError> {
        if settings.max_failed_attempts == 0 {
            return Err(StoreError::InvalidSettings(
                "maxFailedAttempts must be at least 1".into(),
            ));
        }
        self.docs.set(SECURITY_SETTINGS_KEY, &settings)?;
        Ok(settings)
    }

    // ── Dashboard ───────────────────────────────────────────────────────────

    pub fn dashboard(&self) -> Dashboard {
        self.docs
            .get(DASHBOARD_KEY)
            .unwrap_or_else(|| self.compute_dashboard())
    }

    fn compute_dashboard(&self) -> Dashboard {
        dashboard::rebuild(
            &self.users(),
            &self.devices(),
            &self.activities(),
            &self.repositories(),
            &self.alerts(),
            self.clock.now(),
        )
    }

    fn refresh_dashboard(&self) -> Result<(), StoreError> {
        let dashboard = self.compute_dashboard();
        self.docs.set(DASHBOARD_KEY, &dashboard)
    }

    // ── Feed folding ────────────────────────────────────────────────────────

    pub fn fold_event(&self, event: FeedEvent) -> Result<(), StoreError> {
        match event {
            FeedEvent::Activity(payload) => {
                self.add_activity(payload)?;
            }
            FeedEvent::Alert(payload) => {
                self.add_alert(payload)?;
            }
        }
        Ok(())
    }

    // ── Snapshots ───────────────────────────────────────────────────────────

    pub fn export(&self) -> Snapshot {
        Snapshot {
            users: Some(self.users()),
            devices: Some(self.devices()),
            activities: Some(self.activities()),
            repositories: Some(self.repositories()),
            alerts: Some(self.alerts()),
            security_settings: Some(self.security_settings()),
            dashboard: Some(self.dashboard()),
        }
    }

    /// Overwrite exactly the keys present in the snapshot; absent keys stay
    /// untouched.
    pub fn import(&self, snapshot: Snapshot) -> Result<(), StoreError> {
        if let Some(users) = snapshot.users {
            self.docs.set(USERS_KEY, &users)?;
        }
        if let Some(devices) = snapshot.devices {
            self.docs.set(DEVICES_KEY, &devices)?;
        }
        if let Some(activities) = snapshot.activities {
            self.docs.set(ACTIVITIES_KEY, &activities)?;
        }
        if let Some(repositories) = snapshot.repositories {
            self.docs.set(REPOSITORIES_KEY, &repositories)?;
        }
        if let Some(alerts) = snapshot.alerts {
            self.docs.set(ALERTS_KEY, &alerts)?;
        }
        if let Some(security_settings) = snapshot.security_settings {
            self.docs.set(SECURITY_SETTINGS_KEY, &security_settings)?;
        }
        if let Some(dashboard) = snapshot.dashboard {
            self.docs.set(DASHBOARD_KEY, &dashboard)?;
        }
        Ok(())
    }

    /// Delete every collection and the initialization flag, then re-seed.
    pub fn reset(&self) -> Result<(), StoreError> {
        for key in ALL_KEYS {
            self.docs.remove(key)?;
        }
        seed::ensure_seeded(&self.docs, self.clock.now())
    }
}
