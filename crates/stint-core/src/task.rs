use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One user-entered to-do item. `id` is the sole lookup key and stays
/// unique within the collection for its lifetime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: u64,

    pub text: String,

    #[serde(default)]
    pub completed: bool,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(text: String, now: DateTime<Utc>, id: u64) -> Self {
        Self {
            id,
            text,
            completed: false,
            created_at: now,
        }
    }
}
