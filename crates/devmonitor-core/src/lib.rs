//! Persisted document store with derived analytics for the DevMonitor
//! dashboard.
//!
//! Collections (users, devices, activities, repositories, alerts) live as
//! JSON documents in a durable key/value medium. The store seeds itself with
//! default data on first run, exposes typed CRUD per entity, and rewrites a
//! derived dashboard document (counts, bounded security score, trailing-week
//! activity trend) on every mutation.

pub mod clock;
pub mod dashboard;
pub mod events;
pub mod medium;
pub mod models;
pub mod monitor;
pub mod paths;
pub mod seed;
pub mod snapshot;
pub mod store;
