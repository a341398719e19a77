pub mod attention;
pub mod db;
pub mod engine;
pub mod models;
pub mod notify;
pub mod recorder;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use log::info;

use attention::{AttentionClassifier, InteractionTracker};
use db::Database;
use engine::EngineController;
use notify::Notifier;

/// Top-level application context: owns the database and the engine for the
/// active profile. Explicitly initialized and torn down; there is no
/// ambient global state.
pub struct App {
    pub db: Database,
    pub engine: EngineController,
    pub interactions: InteractionTracker,
}

impl App {
    /// Opens (or creates) the database under `data_dir`, seeds the default
    /// profile, and builds the engine for `profile_id` from its stored
    /// settings. Pass no classifier to run in recency-only mode.
    pub async fn init(
        data_dir: &Path,
        profile_id: &str,
        notifier: Arc<dyn Notifier>,
        classifier: Option<Arc<dyn AttentionClassifier>>,
    ) -> Result<Self> {
        let db = Database::new(data_dir.join("studyflow.sqlite3"))?;
        db.ensure_default_profile().await?;

        let settings = db.get_settings(profile_id).await?;
        let interactions = InteractionTracker::new();
        let engine = EngineController::new(
            db.clone(),
            &settings,
            interactions.clone(),
            notifier,
            classifier,
        );

        info!(
            "engine ready for profile {} ({} min base, ai {})",
            profile_id,
            settings.pomodoro_duration,
            if settings.ai_enabled { "on" } else { "off" }
        );

        Ok(Self {
            db,
            engine,
            interactions,
        })
    }

    /// Halts both engine loops; safe to call more than once.
    pub async fn shutdown(&self) {
        self.engine.shutdown().await;
    }
}
