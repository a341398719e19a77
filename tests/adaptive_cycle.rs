//! Full work/break cycles driven through the public API with virtual time.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;
use tokio::time::{sleep, Duration};

use studyflow::attention::{AttentionClassifier, AttentionState};
use studyflow::engine::Phase;
use studyflow::models::DEFAULT_PROFILE_ID;
use studyflow::notify::{EngineEvent, Notifier};
use studyflow::App;

struct FixedClassifier(AttentionState);

#[async_trait]
impl AttentionClassifier for FixedClassifier {
    async fn classify(&self) -> Result<AttentionState> {
        Ok(self.0)
    }
}

#[derive(Default)]
struct CollectingNotifier {
    events: Mutex<Vec<EngineEvent>>,
}

impl CollectingNotifier {
    fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Sets the base duration to five minutes and returns a fresh app wired to
/// the given classifier.
async fn five_minute_app(
    dir: &TempDir,
    notifier: Arc<CollectingNotifier>,
    attention: AttentionState,
) -> App {
    let seed = App::init(
        dir.path(),
        DEFAULT_PROFILE_ID,
        Arc::new(studyflow::notify::LogNotifier),
        None,
    )
    .await
    .unwrap();

    let mut settings = seed.db.get_settings(DEFAULT_PROFILE_ID).await.unwrap();
    settings.pomodoro_duration = 5;
    seed.db.update_settings(&settings).await.unwrap();
    seed.shutdown().await;
    drop(seed);

    App::init(
        dir.path(),
        DEFAULT_PROFILE_ID,
        notifier,
        Some(Arc::new(FixedClassifier(attention))),
    )
    .await
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn sustained_focus_grows_the_next_session_and_records_history() {
    let dir = TempDir::new().unwrap();
    let notifier = Arc::new(CollectingNotifier::default());
    let app = five_minute_app(&dir, notifier.clone(), AttentionState::Focus).await;

    app.engine.start().await.unwrap();

    // 300 focused ticks complete the work session, then the break starts.
    sleep(Duration::from_secs(5 * 60 + 2)).await;

    let snapshot = app.engine.snapshot().await;
    assert_eq!(snapshot.phase, Phase::OnBreak);
    assert!(snapshot.is_running);
    assert_eq!(snapshot.adaptive_work_duration_seconds, 10 * 60);

    assert!(notifier.events().contains(&EngineEvent::WorkSessionCompleted {
        score: 100,
        suggested_break_minutes: 5,
    }));

    let mut sessions = Vec::new();
    for _ in 0..100 {
        sessions = app.db.list_sessions(DEFAULT_PROFILE_ID).await.unwrap();
        if !sessions.is_empty() {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].focus_score, 100);
    assert_eq!(sessions[0].duration_minutes, 5);

    // Ride out the five-minute break; work resumes at the grown duration.
    sleep(Duration::from_secs(5 * 60)).await;
    let snapshot = app.engine.snapshot().await;
    assert_eq!(snapshot.phase, Phase::Working);
    assert!(snapshot.is_running);
    assert!(notifier.events().contains(&EngineEvent::BreakCompleted));
    assert_eq!(snapshot.adaptive_work_duration_seconds, 10 * 60);

    app.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn sustained_distraction_stretches_time_and_earns_a_longer_break() {
    let dir = TempDir::new().unwrap();
    let notifier = Arc::new(CollectingNotifier::default());
    let app = five_minute_app(&dir, notifier.clone(), AttentionState::Distract).await;

    app.engine.start().await.unwrap();

    // Distracted ticks land every 1.5 s, so 300 of them take 450 s of wall
    // clock and accumulate 450 weighted distraction seconds.
    sleep(Duration::from_secs(300)).await;
    let snapshot = app.engine.snapshot().await;
    assert_eq!(snapshot.phase, Phase::Working);
    assert!(snapshot.time_left_seconds > 0);

    sleep(Duration::from_secs(152)).await;
    let snapshot = app.engine.snapshot().await;
    assert_eq!(snapshot.phase, Phase::OnBreak);
    // Score 40 shrinks the next session to the five-minute floor.
    assert_eq!(snapshot.adaptive_work_duration_seconds, 5 * 60);

    // 450 distracted seconds add seven recovery minutes to the base break.
    assert!(notifier.events().contains(&EngineEvent::WorkSessionCompleted {
        score: 40,
        suggested_break_minutes: 12,
    }));

    let mut sessions = Vec::new();
    for _ in 0..100 {
        sessions = app.db.list_sessions(DEFAULT_PROFILE_ID).await.unwrap();
        if !sessions.is_empty() {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(sessions[0].duration_minutes, 8);

    app.shutdown().await;
}
