use log::info;
use serde::Serialize;

/// User-facing engine events. Delivery is fire-and-forget; there is no
/// acknowledgement and no retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EngineEvent {
    SessionAutoPaused,
    WorkSessionCompleted {
        score: u32,
        suggested_break_minutes: u32,
    },
    BreakCompleted,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, event: EngineEvent);
}

/// Default sink that surfaces events through the log only.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: EngineEvent) {
        match event {
            EngineEvent::SessionAutoPaused => info!("session paused: user absent"),
            EngineEvent::WorkSessionCompleted {
                score,
                suggested_break_minutes,
            } => info!("work complete, score {score}%, suggested break {suggested_break_minutes} min"),
            EngineEvent::BreakCompleted => info!("break complete"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_serialize_with_camel_case_kind_tag() {
        let event = EngineEvent::WorkSessionCompleted {
            score: 92,
            suggested_break_minutes: 6,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "kind": "workSessionCompleted",
                "score": 92,
                "suggestedBreakMinutes": 6,
            })
        );

        assert_eq!(
            serde_json::to_value(EngineEvent::SessionAutoPaused).unwrap(),
            json!({ "kind": "sessionAutoPaused" })
        );
    }
}
