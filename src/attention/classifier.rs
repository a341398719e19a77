use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use log::{info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::AttentionState;

const POLL_INTERVAL_SECS: u64 = 2;
const CLASSIFY_TIMEOUT_SECS: u64 = 5;

/// Opaque attention capability. One call inspects the current camera frame
/// and produces a verdict; an error means "no new result this round",
/// covering transient frame failures and a model that is still loading.
#[async_trait]
pub trait AttentionClassifier: Send + Sync {
    async fn classify(&self) -> Result<AttentionState>;
}

/// Read side of the single shared slot between the poll loop and the tick
/// loop. Holds the latest successful classification, last-write-wins;
/// `None` until the classifier produces its first verdict.
pub type ClassificationSlot = watch::Receiver<Option<AttentionState>>;

/// Owns the low-frequency classification poll task.
pub struct ClassifierController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    slot_tx: watch::Sender<Option<AttentionState>>,
}

impl ClassifierController {
    pub fn new() -> (Self, ClassificationSlot) {
        let (slot_tx, slot_rx) = watch::channel(None);
        (
            Self {
                handle: None,
                cancel_token: None,
                slot_tx,
            },
            slot_rx,
        )
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    pub fn start(&mut self, classifier: Arc<dyn AttentionClassifier>) -> Result<()> {
        if self.handle.is_some() {
            bail!("classification poll already active");
        }

        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();
        let slot = self.slot_tx.clone();

        self.handle = Some(tokio::spawn(poll_loop(classifier, slot, token_clone)));
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("classification poll task failed to join")?;
        }
        Ok(())
    }
}

async fn poll_loop(
    classifier: Arc<dyn AttentionClassifier>,
    slot: watch::Sender<Option<AttentionState>>,
    cancel_token: CancellationToken,
) {
    let mut ticker = interval(Duration::from_secs(POLL_INTERVAL_SECS));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match timeout(Duration::from_secs(CLASSIFY_TIMEOUT_SECS), classifier.classify()).await {
                    Ok(Ok(state)) => {
                        let _ = slot.send(Some(state));
                    }
                    // No new result; the previous slot value stands.
                    Ok(Err(err)) => warn!("classification failed: {err:?}"),
                    Err(_) => warn!("classification timeout (> {CLASSIFY_TIMEOUT_SECS}s)"),
                }
            }
            _ = cancel_token.cancelled() => {
                info!("classification poll shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::{advance, sleep};

    struct ScriptedClassifier {
        script: Vec<Result<AttentionState, ()>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AttentionClassifier for ScriptedClassifier {
        async fn classify(&self) -> Result<AttentionState> {
            let index = self.calls.fetch_add(1, Ordering::SeqCst);
            let step = self
                .script
                .get(index.min(self.script.len() - 1))
                .copied()
                .unwrap_or(Err(()));
            step.map_err(|()| anyhow!("camera not ready"))
        }
    }

    fn scripted(script: Vec<Result<AttentionState, ()>>) -> Arc<ScriptedClassifier> {
        Arc::new(ScriptedClassifier {
            script,
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn slot_tracks_latest_successful_verdict() {
        let (mut controller, slot) = ClassifierController::new();
        controller
            .start(scripted(vec![
                Ok(AttentionState::Focus),
                Ok(AttentionState::Distract),
            ]))
            .unwrap();

        sleep(Duration::from_millis(100)).await;
        assert_eq!(*slot.borrow(), Some(AttentionState::Focus));

        sleep(Duration::from_secs(2)).await;
        assert_eq!(*slot.borrow(), Some(AttentionState::Distract));

        controller.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failure_keeps_previous_verdict() {
        let (mut controller, slot) = ClassifierController::new();
        controller
            .start(scripted(vec![Ok(AttentionState::Focus), Err(())]))
            .unwrap();

        sleep(Duration::from_millis(100)).await;
        assert_eq!(*slot.borrow(), Some(AttentionState::Focus));

        sleep(Duration::from_secs(4)).await;
        assert_eq!(*slot.borrow(), Some(AttentionState::Focus));

        controller.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn slow_initialization_leaves_slot_empty() {
        let (mut controller, slot) = ClassifierController::new();
        controller.start(scripted(vec![Err(()), Err(())])).unwrap();

        advance(Duration::from_secs(5)).await;
        assert_eq!(*slot.borrow(), None);

        controller.stop().await.unwrap();
    }

    #[tokio::test]
    async fn double_start_is_rejected() {
        let (mut controller, _slot) = ClassifierController::new();
        controller.start(scripted(vec![Err(())])).unwrap();
        assert!(controller.start(scripted(vec![Err(())])).is_err());
        controller.stop().await.unwrap();
    }
}
