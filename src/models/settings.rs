use serde::{Deserialize, Serialize};

pub const MIN_POMODORO_MINUTES: u32 = 5;
pub const MAX_POMODORO_MINUTES: u32 = 60;
const DEFAULT_POMODORO_MINUTES: u32 = 25;

/// Per-profile preferences. The engine reads `pomodoro_duration` as the seed
/// for its adaptive work duration and `ai_enabled` to gate the classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub profile_id: String,
    pub theme: String,
    pub ai_enabled: bool,
    pub notifications_enabled: bool,
    /// Base work-session length in minutes, kept within [5, 60].
    pub pomodoro_duration: u32,
}

impl Settings {
    pub fn defaults_for(profile_id: impl Into<String>) -> Self {
        Self {
            profile_id: profile_id.into(),
            theme: "indigo".into(),
            ai_enabled: true,
            notifications_enabled: true,
            pomodoro_duration: DEFAULT_POMODORO_MINUTES,
        }
    }

    /// Out-of-range durations are clamped rather than rejected.
    pub fn clamped(mut self) -> Self {
        self.pomodoro_duration = self
            .pomodoro_duration
            .clamp(MIN_POMODORO_MINUTES, MAX_POMODORO_MINUTES);
        self
    }

    pub fn base_duration_seconds(&self) -> u32 {
        self.pomodoro_duration
            .clamp(MIN_POMODORO_MINUTES, MAX_POMODORO_MINUTES)
            * 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_duration_into_supported_range() {
        let low = Settings {
            pomodoro_duration: 1,
            ..Settings::defaults_for("p")
        };
        assert_eq!(low.clamped().pomodoro_duration, MIN_POMODORO_MINUTES);

        let high = Settings {
            pomodoro_duration: 240,
            ..Settings::defaults_for("p")
        };
        assert_eq!(high.clamped().pomodoro_duration, MAX_POMODORO_MINUTES);
    }

    #[test]
    fn default_base_duration_is_twenty_five_minutes() {
        let settings = Settings::defaults_for("p");
        assert_eq!(settings.base_duration_seconds(), 25 * 60);
    }
}
