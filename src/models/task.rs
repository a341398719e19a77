use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub profile_id: String,
    pub title: String,
    pub completed: bool,
    /// Completed work sessions credited to this task.
    pub pomodoros: u32,
}

impl Task {
    pub fn new(profile_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            profile_id: profile_id.into(),
            title: title.into(),
            completed: false,
            pomodoros: 0,
        }
    }
}
