use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionKind {
    Work,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Work => "work",
        }
    }
}

/// One persisted slice of history. Only completed work sessions are stored;
/// breaks never produce a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Option<i64>,
    pub profile_id: String,
    /// Stamped when the recorder persists the session, i.e. at work-session
    /// end rather than start.
    pub start_time: DateTime<Utc>,
    /// Rounded focus + distraction minutes; break time is excluded.
    pub duration_minutes: i64,
    /// Mean of the per-second samples, 0-100.
    pub focus_score: u32,
    pub kind: SessionKind,
}
