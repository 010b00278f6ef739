//! Records arriving from the real-time feed. They are folded into the store
//! through the same add path as local edits, one at a time, preserving the
//! prepend ordering of activities and alerts.

use serde::{Deserialize, Serialize};

use crate::models::{NewActivity, NewAlert};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "lowercase")]
pub enum FeedEvent {
    Activity(NewActivity),
    Alert(NewAlert),
}
