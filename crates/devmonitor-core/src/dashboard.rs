//! Derived dashboard document: overview counts, a bounded security score and
//! the trailing-week activity trend.
//!
//! The document is a pure function of the five entity collections at the
//! moment of the last mutation. It is rebuilt wholesale on every recompute,
//! never patched in place.

use chrono::{DateTime, Days, Local};
use serde::{Deserialize, Serialize};

use crate::models::{
    Activity, Alert, AlertStatus, Device, DeviceStatus, Repository, SecurityStatus, Severity, User,
};

pub const RECENT_ACTIVITY_LIMIT: usize = 5;
pub const RECENT_ALERT_LIMIT: usize = 3;

const TREND_DAYS: usize = 7;
const DAY_LABELS: [&str; TREND_DAYS] = [
    "6 days ago",
    "5 days ago",
    "4 days ago",
    "3 days ago",
    "2 days ago",
    "Yesterday",
    "Today",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_users: usize,
    pub total_devices: usize,
    pub total_activities: usize,
    pub security_score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityStats {
    pub authorized_devices: usize,
    pub total_devices: usize,
    pub pending_devices: usize,
    pub suspicious_activities: usize,
    pub critical_alerts: usize,
    pub encrypted_repos: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub overview: Overview,
    pub security_stats: SecurityStats,
    pub recent_activities: Vec<Activity>,
    pub recent_alerts: Vec<Alert>,
    pub activity_trend: Vec<TrendPoint>,
}

/// Rebuild the dashboard from the current collections. Recent views rely on
/// the prepend-on-insert ordering of activities and alerts.
pub fn rebuild(
    users: &[User],
    devices: &[Device],
    activities: &[Activity],
    repositories: &[Repository],
    alerts: &[Alert],
    now: DateTime<Local>,
) -> Dashboard {
    Dashboard {
        overview: Overview {
            total_users: users.len(),
            total_devices: devices.len(),
            total_activities: activities.len(),
            security_score: security_score(repositories, devices, alerts),
        },
        security_stats: SecurityStats {
            authorized_devices: devices
                .iter()
                .filter(|d| d.status == DeviceStatus::Authorized)
                .count(),
            total_devices: devices.len(),
            pending_devices: devices
                .iter()
                .filter(|d| d.status == DeviceStatus::Pending)
                .count(),
            suspicious_activities: activities.iter().filter(|a| a.is_suspicious).count(),
            critical_alerts: alerts
                .iter()
                .filter(|a| a.severity == Severity::Critical && a.status == AlertStatus::Unread)
                .count(),
            encrypted_repos: repositories.iter().filter(|r| r.is_encrypted).count(),
        },
        recent_activities: activities.iter().take(RECENT_ACTIVITY_LIMIT).cloned().collect(),
        recent_alerts: alerts.iter().take(RECENT_ALERT_LIMIT).cloned().collect(),
        activity_trend: activity_trend(activities, now),
    }
}

/// Bounded [0, 100] risk summary. Compromised repositories and critical
/// alerts weigh heaviest; the encryption term scales with coverage so
/// partial adoption is rewarded proportionally.
pub fn security_score(repositories: &[Repository], devices: &[Device], alerts: &[Alert]) -> u8 {
    let compromised = repositories
        .iter()
        .filter(|r| r.security_status == SecurityStatus::Compromised)
        .count() as f64;
    let encrypted = repositories.iter().filter(|r| r.is_encrypted).count() as f64;
    let total = repositories.len().max(1) as f64;
    let pending = devices
        .iter()
        .filter(|d| d.status == DeviceStatus::Pending)
        .count() as f64;
    let critical = alerts
        .iter()
        .filter(|a| a.severity == Severity::Critical)
        .count() as f64;

    let mut score = 100.0;
    score -= compromised * 15.0;
    score -= pending * 5.0;
    score -= critical * 10.0;
    score -= (1.0 - encrypted / total) * 20.0;
    score.round().clamp(0.0, 100.0) as u8
}

/// Seven daily buckets covering the trailing week, oldest first. Bucket
/// bounds are closed (00:00:00.000 through 23:59:59.999 local time) and are
/// recomputed on every call so the trend self-corrects across midnight.
pub fn activity_trend(activities: &[Activity], now: DateTime<Local>) -> Vec<TrendPoint> {
    let mut trend = Vec::with_capacity(TREND_DAYS);
    for offset in (0..TREND_DAYS).rev() {
        let day = now.date_naive() - Days::new(offset as u64);
        let start = day.and_hms_opt(0, 0, 0).unwrap();
        let end = day.and_hms_milli_opt(23, 59, 59, 999).unwrap();
        let count = activities
            .iter()
            .filter(|a| {
                let local = a.timestamp.with_timezone(&Local).naive_local();
                local >= start && local <= end
            })
            .count();
        trend.push(TrendPoint {
            date: DAY_LABELS[TREND_DAYS - 1 - offset].to_string(),
            count,
        });
    }
    trend
}
