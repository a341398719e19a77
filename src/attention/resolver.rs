use super::AttentionState;

// Recency bands for the no-camera fallback: active within 30s counts as
// focused, up to two minutes as distracted, beyond that as absent.
const FOCUS_IDLE_SECS: f64 = 30.0;
const ABSENT_IDLE_SECS: f64 = 120.0;

/// Merges the classifier's latest verdict with interaction recency into the
/// single authoritative state for this tick.
///
/// A camera verdict of `Absent` is ambiguous (it may only mean no fresh
/// classification has arrived), so it is handed to the recency fallback
/// instead of being trusted verbatim. The same fallback covers the
/// classifier-disabled and camera-denied cases.
pub fn resolve(
    ai_enabled: bool,
    latest: Option<AttentionState>,
    idle_seconds: f64,
) -> AttentionState {
    if ai_enabled {
        if let Some(state) = latest {
            if state != AttentionState::Absent {
                return state;
            }
        }
    }

    if idle_seconds < FOCUS_IDLE_SECS {
        AttentionState::Focus
    } else if idle_seconds < ABSENT_IDLE_SECS {
        AttentionState::Distract
    } else {
        AttentionState::Absent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifier_verdict_wins_while_present() {
        let resolved = resolve(true, Some(AttentionState::Distract), 0.0);
        assert_eq!(resolved, AttentionState::Distract);

        let resolved = resolve(true, Some(AttentionState::Focus), 500.0);
        assert_eq!(resolved, AttentionState::Focus);
    }

    #[test]
    fn camera_absence_defers_to_recency() {
        let resolved = resolve(true, Some(AttentionState::Absent), 5.0);
        assert_eq!(resolved, AttentionState::Focus);

        let resolved = resolve(true, Some(AttentionState::Absent), 300.0);
        assert_eq!(resolved, AttentionState::Absent);
    }

    #[test]
    fn disabled_classifier_falls_back_on_idle_bands() {
        assert_eq!(resolve(false, None, 15.0), AttentionState::Focus);
        assert_eq!(resolve(false, None, 45.0), AttentionState::Distract);
        assert_eq!(resolve(false, None, 200.0), AttentionState::Absent);
    }

    #[test]
    fn band_edges_are_half_open() {
        assert_eq!(resolve(false, None, 29.9), AttentionState::Focus);
        assert_eq!(resolve(false, None, 30.0), AttentionState::Distract);
        assert_eq!(resolve(false, None, 119.9), AttentionState::Distract);
        assert_eq!(resolve(false, None, 120.0), AttentionState::Absent);
    }

    #[test]
    fn enabled_but_never_classified_uses_recency() {
        assert_eq!(resolve(true, None, 10.0), AttentionState::Focus);
        assert_eq!(resolve(true, None, 90.0), AttentionState::Distract);
    }
}
