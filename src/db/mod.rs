use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::oneshot;

mod migrations;

use crate::models::{Profile, Session, SessionKind, Settings, Task, DEFAULT_PROFILE_ID};
use migrations::run_migrations;

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum DbCommand {
    Execute(DbTask),
    Shutdown,
}

struct DatabaseInner {
    sender: mpsc::Sender<DbCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(DbCommand::Shutdown) {
                error!("Failed to send shutdown to DB thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join DB thread: {join_err:?}");
            }
        }
    }
}

fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| anyhow!("invalid datetime '{value}': {err}"))
}

fn kind_from_str(value: &str) -> Result<SessionKind> {
    match value {
        "work" => Ok(SessionKind::Work),
        _ => Err(anyhow!("unknown session kind '{value}'")),
    }
}

/// All storage goes through one dedicated worker thread owning the SQLite
/// connection; callers hand it closures and await the reply. Cloning shares
/// the same worker.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
    db_path: Arc<PathBuf>,
}

impl Database {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let (command_tx, command_rx) = mpsc::channel::<DbCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let path_for_thread = db_path.clone();

        let worker = thread::Builder::new()
            .name("studyflow-db".into())
            .spawn(move || {
                let mut conn = match Connection::open(&path_for_thread) {
                    Ok(connection) => connection,
                    Err(err) => {
                        let _ = ready_tx.send(Err(anyhow::Error::new(err)
                            .context("failed to open SQLite database")));
                        return;
                    }
                };

                if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                    error!("Failed to enable WAL mode: {err}");
                }
                if let Err(err) = conn.pragma_update(None, "foreign_keys", "ON") {
                    error!("Failed to enable foreign keys: {err}");
                }

                let init_result =
                    run_migrations(&mut conn).context("failed to run database migrations");
                if ready_tx.send(init_result).is_err() {
                    error!("DB initialization receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        DbCommand::Execute(task) => {
                            task(&mut conn);
                        }
                        DbCommand::Shutdown => break,
                    }
                }

                info!("Database thread shutting down");
            })
            .with_context(|| "failed to spawn database worker thread")?;

        ready_rx
            .recv()
            .context("database worker exited before signaling readiness")??;

        info!("Database initialized at {}", db_path.as_path().display());

        Ok(Self {
            inner: Arc::new(DatabaseInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            db_path: Arc::new(db_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.inner.sender.clone();
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = DbCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                error!("DB caller dropped before receiving result");
            }
        }));

        sender
            .send(command)
            .map_err(|err| anyhow!("failed to send command to DB thread: {err}"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("database thread terminated unexpectedly"))?
    }

    /// Seeds the profile every installation starts with, together with its
    /// settings row. Idempotent.
    pub async fn ensure_default_profile(&self) -> Result<()> {
        self.execute(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO profiles (id, name, avatar, created_at)
                 VALUES (?1, ?2, NULL, ?3)",
                params![DEFAULT_PROFILE_ID, "Default", Utc::now().to_rfc3339()],
            )
            .context("failed to seed default profile")?;
            conn.execute(
                "INSERT OR IGNORE INTO settings (profile_id) VALUES (?1)",
                params![DEFAULT_PROFILE_ID],
            )
            .context("failed to seed default settings")?;
            Ok(())
        })
        .await
    }

    pub async fn list_profiles(&self) -> Result<Vec<Profile>> {
        self.execute(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, name, avatar, created_at FROM profiles ORDER BY created_at")?;
            let mut rows = stmt.query([])?;
            let mut profiles = Vec::new();
            while let Some(row) = rows.next()? {
                profiles.push(Profile {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    avatar: row.get(2)?,
                    created_at: parse_datetime(&row.get::<_, String>(3)?)?,
                });
            }
            Ok(profiles)
        })
        .await
    }

    /// Creates the profile together with its settings row.
    pub async fn create_profile(&self, profile: &Profile) -> Result<()> {
        let record = profile.clone();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO profiles (id, name, avatar, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    record.id,
                    record.name,
                    record.avatar,
                    record.created_at.to_rfc3339(),
                ],
            )
            .with_context(|| "failed to insert profile")?;
            tx.execute(
                "INSERT INTO settings (profile_id) VALUES (?1)",
                params![record.id],
            )
            .with_context(|| "failed to insert profile settings")?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    /// Removes the profile and everything hanging off it: tasks, sessions,
    /// settings. The default profile is protected.
    pub async fn delete_profile(&self, profile_id: &str) -> Result<()> {
        if profile_id == DEFAULT_PROFILE_ID {
            bail!("the default profile cannot be deleted");
        }

        let profile_id = profile_id.to_string();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM tasks WHERE profile_id = ?1",
                params![profile_id],
            )?;
            tx.execute(
                "DELETE FROM sessions WHERE profile_id = ?1",
                params![profile_id],
            )?;
            tx.execute(
                "DELETE FROM settings WHERE profile_id = ?1",
                params![profile_id],
            )?;
            tx.execute("DELETE FROM profiles WHERE id = ?1", params![profile_id])?;
            tx.commit().with_context(|| "failed to delete profile")?;
            Ok(())
        })
        .await
    }

    /// Settings always come back clamped into the supported range.
    pub async fn get_settings(&self, profile_id: &str) -> Result<Settings> {
        let profile_id = profile_id.to_string();
        self.execute(move |conn| {
            let settings = conn
                .query_row(
                    "SELECT profile_id, theme, ai_enabled, notifications_enabled, pomodoro_duration
                     FROM settings WHERE profile_id = ?1",
                    params![profile_id.clone()],
                    |row| {
                        Ok(Settings {
                            profile_id: row.get(0)?,
                            theme: row.get(1)?,
                            ai_enabled: row.get::<_, i64>(2)? != 0,
                            notifications_enabled: row.get::<_, i64>(3)? != 0,
                            pomodoro_duration: row.get(4)?,
                        })
                    },
                )
                .optional()
                .with_context(|| "failed to load settings")?;

            Ok(settings
                .unwrap_or_else(|| Settings::defaults_for(profile_id))
                .clamped())
        })
        .await
    }

    pub async fn update_settings(&self, settings: &Settings) -> Result<()> {
        let record = settings.clone().clamped();
        self.execute(move |conn| {
            conn.execute(
                "UPDATE settings
                 SET theme = ?1,
                     ai_enabled = ?2,
                     notifications_enabled = ?3,
                     pomodoro_duration = ?4
                 WHERE profile_id = ?5",
                params![
                    record.theme,
                    i64::from(record.ai_enabled),
                    i64::from(record.notifications_enabled),
                    record.pomodoro_duration,
                    record.profile_id,
                ],
            )
            .with_context(|| "failed to update settings")?;
            Ok(())
        })
        .await
    }

    pub async fn list_tasks(&self, profile_id: &str) -> Result<Vec<Task>> {
        let profile_id = profile_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, profile_id, title, completed, pomodoros
                 FROM tasks WHERE profile_id = ?1",
            )?;
            let mut rows = stmt.query(params![profile_id])?;
            let mut tasks = Vec::new();
            while let Some(row) = rows.next()? {
                tasks.push(Task {
                    id: row.get(0)?,
                    profile_id: row.get(1)?,
                    title: row.get(2)?,
                    completed: row.get::<_, i64>(3)? != 0,
                    pomodoros: row.get(4)?,
                });
            }
            Ok(tasks)
        })
        .await
    }

    pub async fn upsert_task(&self, task: &Task) -> Result<()> {
        let record = task.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO tasks (id, profile_id, title, completed, pomodoros)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id,
                    record.profile_id,
                    record.title,
                    i64::from(record.completed),
                    record.pomodoros,
                ],
            )
            .with_context(|| "failed to upsert task")?;
            Ok(())
        })
        .await
    }

    pub async fn delete_task(&self, task_id: &str) -> Result<()> {
        let task_id = task_id.to_string();
        self.execute(move |conn| {
            conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])
                .with_context(|| "failed to delete task")?;
            Ok(())
        })
        .await
    }

    /// Credits one completed pomodoro to the task, but only while it is
    /// still incomplete. A missing or finished task is not an error.
    pub async fn increment_task_pomodoros(&self, task_id: &str) -> Result<()> {
        let task_id = task_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "UPDATE tasks SET pomodoros = pomodoros + 1
                 WHERE id = ?1 AND completed = 0",
                params![task_id],
            )
            .with_context(|| "failed to increment task pomodoros")?;
            Ok(())
        })
        .await
    }

    /// Append-only history insert.
    pub async fn insert_session(&self, session: &Session) -> Result<()> {
        let record = session.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO sessions (profile_id, start_time, duration, focus_score, type)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.profile_id,
                    record.start_time.to_rfc3339(),
                    record.duration_minutes,
                    record.focus_score,
                    record.kind.as_str(),
                ],
            )
            .with_context(|| "failed to insert session")?;
            Ok(())
        })
        .await
    }

    /// Most recent first.
    pub async fn list_sessions(&self, profile_id: &str) -> Result<Vec<Session>> {
        let profile_id = profile_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, profile_id, start_time, duration, focus_score, type
                 FROM sessions
                 WHERE profile_id = ?1
                 ORDER BY start_time DESC",
            )?;
            let mut rows = stmt.query(params![profile_id])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(Session {
                    id: Some(row.get(0)?),
                    profile_id: row.get(1)?,
                    start_time: parse_datetime(&row.get::<_, String>(2)?)?,
                    duration_minutes: row.get(3)?,
                    focus_score: row.get(4)?,
                    kind: kind_from_str(&row.get::<_, String>(5)?)?,
                });
            }
            Ok(sessions)
        })
        .await
    }
}
