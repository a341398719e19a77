use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use anyhow::Result;
use log::{error, info};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::attention::{
    resolve, AttentionClassifier, ClassificationSlot, ClassifierController, InteractionTracker,
};
use crate::db::Database;
use crate::models::Settings;
use crate::notify::{EngineEvent, Notifier};
use crate::recorder::SessionRecorder;

use super::state::{EngineSnapshot, EngineState, Phase, TickOutcome, NORMAL_TICK};

struct Ticker {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

/// Drives the session state machine: one serialized tick loop mutates the
/// state, a separate low-frequency poll feeds the classification slot, and
/// manual controls synchronize through the state lock so they always land
/// between ticks.
#[derive(Clone)]
pub struct EngineController {
    state: Arc<Mutex<EngineState>>,
    recorder: SessionRecorder,
    notifier: Arc<dyn Notifier>,
    interactions: InteractionTracker,
    classification: ClassificationSlot,
    classifier_poll: Arc<Mutex<ClassifierController>>,
    classifier: Option<Arc<dyn AttentionClassifier>>,
    ticker: Arc<Mutex<Option<Ticker>>>,
    ai_enabled: bool,
    /// What the user has picked in the task list right now.
    selected_task: Arc<StdMutex<Option<String>>>,
    /// What was picked when the current work session began; this is the
    /// task the recorder credits.
    session_task: Arc<StdMutex<Option<String>>>,
}

impl EngineController {
    pub fn new(
        db: Database,
        settings: &Settings,
        interactions: InteractionTracker,
        notifier: Arc<dyn Notifier>,
        classifier: Option<Arc<dyn AttentionClassifier>>,
    ) -> Self {
        let (classifier_poll, classification) = ClassifierController::new();

        Self {
            state: Arc::new(Mutex::new(EngineState::new(settings.base_duration_seconds()))),
            recorder: SessionRecorder::new(db, settings.profile_id.clone()),
            notifier,
            interactions,
            classification,
            classifier_poll: Arc::new(Mutex::new(classifier_poll)),
            classifier,
            ticker: Arc::new(Mutex::new(None)),
            ai_enabled: settings.ai_enabled,
            selected_task: Arc::new(StdMutex::new(None)),
            session_task: Arc::new(StdMutex::new(None)),
        }
    }

    pub async fn snapshot(&self) -> EngineSnapshot {
        self.state.lock().await.snapshot(self.ai_enabled)
    }

    pub fn record_interaction(&self) {
        self.interactions.record();
    }

    pub fn set_selected_task(&self, task_id: Option<String>) {
        *lock_plain(&self.selected_task) = task_id;
    }

    /// Starts (or resumes) the countdown. Also brings the classification
    /// poll up on first use when a classifier is installed and enabled.
    pub async fn start(&self) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            if state.is_running {
                return Ok(());
            }
            state.start();

            // A fresh work session inherits whatever task is selected now;
            // resuming keeps the one captured at session start.
            if state.phase == Phase::Working {
                let mut session_task = lock_plain(&self.session_task);
                if session_task.is_none() {
                    *session_task = lock_plain(&self.selected_task).clone();
                }
            }
        }

        if self.ai_enabled {
            if let Some(classifier) = &self.classifier {
                let mut poll = self.classifier_poll.lock().await;
                if !poll.is_active() {
                    poll.start(classifier.clone())?;
                }
            }
        }

        self.spawn_ticker().await;
        Ok(())
    }

    /// Stops the countdown without touching the remaining time. The ticker
    /// observes the flag before its next decrement and exits.
    pub async fn pause(&self) {
        self.state.lock().await.pause();
    }

    /// Forces a paused work phase at the base duration and drops the
    /// captured session task.
    pub async fn reset(&self) {
        self.state.lock().await.reset();
        *lock_plain(&self.session_task) = None;
        self.cancel_ticker().await;
    }

    /// Halts both loops deterministically; no state mutation or event
    /// delivery happens afterwards. In-flight classifier calls are
    /// abandoned without waiting.
    pub async fn shutdown(&self) {
        self.cancel_ticker().await;
        if let Err(err) = self.classifier_poll.lock().await.stop().await {
            error!("failed to stop classification poll: {err:?}");
        }
        info!("engine shut down");
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(ticker) = ticker_guard.take() {
            ticker.cancel_token.cancel();
            let _ = ticker.handle.await;
        }

        let state = self.state.clone();
        let recorder = self.recorder.clone();
        let notifier = self.notifier.clone();
        let interactions = self.interactions.clone();
        let classification = self.classification.clone();
        let ai_enabled = self.ai_enabled;
        let selected_task = self.selected_task.clone();
        let session_task = self.session_task.clone();
        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();

        let handle = tokio::spawn(async move {
            let mut wait = NORMAL_TICK;
            loop {
                tokio::select! {
                    () = time::sleep(wait) => {}
                    () = token_clone.cancelled() => break,
                }

                let resolved = resolve(
                    ai_enabled,
                    *classification.borrow(),
                    interactions.idle_seconds(),
                );

                let outcome = {
                    let mut guard = state.lock().await;
                    if !guard.is_running {
                        break;
                    }
                    guard.tick(resolved)
                };

                match outcome {
                    TickOutcome::Ticked { next_tick } => {
                        wait = next_tick;
                    }
                    TickOutcome::AutoPaused => {
                        notifier.notify(EngineEvent::SessionAutoPaused);
                        break;
                    }
                    TickOutcome::WorkComplete(summary) => {
                        let task_id = lock_plain(&session_task).take();
                        notifier.notify(EngineEvent::WorkSessionCompleted {
                            score: summary.focus_score,
                            suggested_break_minutes: summary.break_seconds / 60,
                        });
                        recorder.record(summary, task_id);
                        wait = NORMAL_TICK;
                    }
                    TickOutcome::BreakComplete => {
                        // The next work session credits whatever task is
                        // selected at this moment.
                        *lock_plain(&session_task) = lock_plain(&selected_task).clone();
                        notifier.notify(EngineEvent::BreakCompleted);
                        wait = NORMAL_TICK;
                    }
                }
            }
        });

        *ticker_guard = Some(Ticker {
            handle,
            cancel_token,
        });
    }

    async fn cancel_ticker(&self) {
        if let Some(ticker) = self.ticker.lock().await.take() {
            ticker.cancel_token.cancel();
            let _ = ticker.handle.await;
        }
    }
}

fn lock_plain<T>(mutex: &StdMutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
