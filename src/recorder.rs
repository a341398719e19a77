use anyhow::Result;
use chrono::Utc;
use log::{error, warn};

use crate::db::Database;
use crate::engine::WorkSummary;
use crate::models::{Session, SessionKind};

/// Turns a completed work session into a persisted record. Writes are
/// dispatched fire-and-forget: the tick loop never waits on storage, and a
/// failed write only costs that one history entry.
#[derive(Clone)]
pub struct SessionRecorder {
    db: Database,
    profile_id: String,
}

impl SessionRecorder {
    pub fn new(db: Database, profile_id: String) -> Self {
        Self { db, profile_id }
    }

    pub fn record(&self, summary: WorkSummary, task_id: Option<String>) {
        let recorder = self.clone();
        tokio::spawn(async move {
            if let Err(err) = recorder.persist(summary, task_id).await {
                error!("failed to persist completed session: {err:?}");
            }
        });
    }

    async fn persist(&self, summary: WorkSummary, task_id: Option<String>) -> Result<()> {
        let session = Session {
            id: None,
            profile_id: self.profile_id.clone(),
            start_time: Utc::now(),
            duration_minutes: summary.duration_minutes,
            focus_score: summary.focus_score,
            kind: SessionKind::Work,
        };
        self.db.insert_session(&session).await?;

        if let Some(task_id) = task_id {
            // Best-effort side effect, not transactional with the session
            // write; only still-incomplete tasks are credited.
            if let Err(err) = self.db.increment_task_pomodoros(&task_id).await {
                warn!("failed to credit pomodoro to task {task_id}: {err:?}");
            }
        }

        Ok(())
    }
}
