use std::collections::VecDeque;

use serde::Serialize;
use tokio::time::Duration;

use crate::attention::AttentionState;

// Adaptive-duration controller bounds. The hysteresis only applies at
// session-end recalculation; the settings seed itself is clamped elsewhere.
pub const MIN_WORK_SECS: u32 = 5 * 60;
pub const MAX_WORK_SECS: u32 = 50 * 60;
const WORK_STEP_SECS: u32 = 5 * 60;
pub const BASE_BREAK_SECS: u32 = 5 * 60;

// Scores in (LOWER_BAND, RAISE_BAND] leave the next duration unchanged.
const RAISE_BAND: u32 = 85;
const LOWER_BAND: u32 = 60;

const SAMPLE_CAPACITY: usize = 60;
const FOCUS_SAMPLE: u32 = 100;
const DISTRACT_SAMPLE: u32 = 40;
const ABSENT_SAMPLE: u32 = 0;

pub const NORMAL_TICK: Duration = Duration::from_millis(1000);
// Distraction stretches the wall-clock wait before the next decrement, so
// the countdown advances at 2/3 real-time speed.
const DISTRACT_TICK: Duration = Duration::from_millis(1500);
const DISTRACT_WEIGHT: f64 = 1.5;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Working,
    OnBreak,
}

/// Read-only projection for the UI layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub phase: Phase,
    pub is_running: bool,
    pub time_left_seconds: u32,
    pub adaptive_work_duration_seconds: u32,
    pub resolved_attention: AttentionState,
    pub ai_enabled: bool,
}

/// Totals for a completed work session, handed to the recorder and notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkSummary {
    pub focus_score: u32,
    pub duration_minutes: i64,
    pub break_seconds: u32,
}

/// What one tick did; tells the loop what to dispatch and how long to wait
/// before the next decrement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    AutoPaused,
    Ticked { next_tick: Duration },
    WorkComplete(WorkSummary),
    BreakComplete,
}

/// The live work/break cycle. Owned by a single controller instance and
/// mutated only by its serialized tick loop and manual controls; nothing in
/// here is persisted, so a crash loses the in-progress session.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub phase: Phase,
    pub is_running: bool,
    pub time_left: u32,
    /// The *next* work session's planned length. Survives session
    /// boundaries; only a manual reset re-seeds it from the base.
    pub adaptive_work_duration: u32,
    base_work_duration: u32,
    focus_samples: VecDeque<u32>,
    accumulated_focus: f64,
    accumulated_distract: f64,
    pub last_resolved: AttentionState,
}

impl EngineState {
    pub fn new(base_work_duration_secs: u32) -> Self {
        Self {
            phase: Phase::Working,
            is_running: false,
            time_left: base_work_duration_secs,
            adaptive_work_duration: base_work_duration_secs,
            base_work_duration: base_work_duration_secs,
            focus_samples: VecDeque::with_capacity(SAMPLE_CAPACITY),
            accumulated_focus: 0.0,
            accumulated_distract: 0.0,
            last_resolved: AttentionState::Focus,
        }
    }

    pub fn start(&mut self) {
        self.is_running = true;
    }

    pub fn pause(&mut self) {
        self.is_running = false;
    }

    /// Back to a paused work phase at the settings-seeded base duration,
    /// with every accumulator cleared.
    pub fn reset(&mut self) {
        self.phase = Phase::Working;
        self.is_running = false;
        self.adaptive_work_duration = self.base_work_duration;
        self.time_left = self.base_work_duration;
        self.focus_samples.clear();
        self.accumulated_focus = 0.0;
        self.accumulated_distract = 0.0;
    }

    /// Advances the machine by one second of countdown. Callers must only
    /// invoke this while running, once per (possibly stretched) wall-clock
    /// interval.
    pub fn tick(&mut self, resolved: AttentionState) -> TickOutcome {
        self.last_resolved = resolved;

        let mut next_tick = NORMAL_TICK;
        if self.phase == Phase::Working {
            match resolved {
                AttentionState::Absent => {
                    // Absence pauses before the countdown moves; the sample
                    // for this instant is still captured.
                    self.push_sample(ABSENT_SAMPLE);
                    self.is_running = false;
                    return TickOutcome::AutoPaused;
                }
                AttentionState::Distract => {
                    self.accumulated_distract += DISTRACT_WEIGHT;
                    self.push_sample(DISTRACT_SAMPLE);
                    next_tick = DISTRACT_TICK;
                }
                AttentionState::Focus => {
                    self.accumulated_focus += 1.0;
                    self.push_sample(FOCUS_SAMPLE);
                }
            }
        }

        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            return self.handle_boundary();
        }

        TickOutcome::Ticked { next_tick }
    }

    fn handle_boundary(&mut self) -> TickOutcome {
        match self.phase {
            Phase::Working => {
                let focus_score = self.average_score();

                if focus_score > RAISE_BAND {
                    self.adaptive_work_duration =
                        (self.adaptive_work_duration + WORK_STEP_SECS).min(MAX_WORK_SECS);
                } else if focus_score < LOWER_BAND {
                    self.adaptive_work_duration = self
                        .adaptive_work_duration
                        .saturating_sub(WORK_STEP_SECS)
                        .max(MIN_WORK_SECS);
                }

                // Every full minute of accumulated distraction adds one
                // minute of recovery break, uncapped.
                let fatigue_bonus = (self.accumulated_distract / 60.0).floor() as u32 * 60;
                let break_seconds = BASE_BREAK_SECS + fatigue_bonus;

                let duration_minutes =
                    ((self.accumulated_focus + self.accumulated_distract) / 60.0).round() as i64;

                self.phase = Phase::OnBreak;
                self.time_left = break_seconds;
                self.focus_samples.clear();
                self.accumulated_focus = 0.0;
                self.accumulated_distract = 0.0;

                TickOutcome::WorkComplete(WorkSummary {
                    focus_score,
                    duration_minutes,
                    break_seconds,
                })
            }
            Phase::OnBreak => {
                self.phase = Phase::Working;
                self.time_left = self.adaptive_work_duration;
                TickOutcome::BreakComplete
            }
        }
    }

    /// Mean per-second score for the session so far; an empty buffer reads
    /// as a perfect score rather than failing.
    fn average_score(&self) -> u32 {
        if self.focus_samples.is_empty() {
            return FOCUS_SAMPLE;
        }
        let sum: u32 = self.focus_samples.iter().sum();
        (f64::from(sum) / self.focus_samples.len() as f64).round() as u32
    }

    fn push_sample(&mut self, score: u32) {
        if self.focus_samples.len() == SAMPLE_CAPACITY {
            self.focus_samples.pop_front();
        }
        self.focus_samples.push_back(score);
    }

    pub fn snapshot(&self, ai_enabled: bool) -> EngineSnapshot {
        EngineSnapshot {
            phase: self.phase,
            is_running: self.is_running,
            time_left_seconds: self.time_left,
            adaptive_work_duration_seconds: self.adaptive_work_duration,
            resolved_attention: self.last_resolved,
            ai_enabled,
        }
    }
}
