mod classifier;
mod interaction;
mod resolver;

pub use classifier::{AttentionClassifier, ClassificationSlot, ClassifierController};
pub use interaction::InteractionTracker;
pub use resolver::resolve;

use serde::{Deserialize, Serialize};

/// Classification of user engagement for a single instant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AttentionState {
    Focus,
    Distract,
    Absent,
}
