//! Time-driven morph scheduling for the threads background.
//!
//! The background alternates between the fader logo and the thread animation
//! on a fixed cycle:
//!
//! ```text
//!   hold 0 (pause) ─▶ ease 0→1 (transition) ─▶ hold 1 (pause) ─▶ ease 1→0 (transition)
//!   └──────────────────────────── cycle = 2 * (pause + transition) ──────────────────┘
//! ```
//!
//! Everything here is a pure function of elapsed seconds so a restarted loop
//! never drifts from a running one.

use std::f64::consts::PI;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScheduleError {
    #[error("{field} must be a finite, non-negative duration")]
    InvalidDuration { field: &'static str },
    #[error("transition must be greater than zero")]
    ZeroTransition,
}

/// Cosine ease used for both directions of the morph.
pub fn ease_in_out_sine(x: f32) -> f32 {
    let x = f64::from(x.clamp(0.0, 1.0));
    (-((PI * x).cos() - 1.0) / 2.0) as f32
}

/// Opacity of the static hero logo for a given morph value.
pub fn logo_opacity(morph: f32) -> f32 {
    if morph.is_nan() {
        return 1.0;
    }
    (1.0 - morph).clamp(0.0, 1.0)
}

/// Which presentation the background is showing (or moving towards).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualMode {
    Logo,
    MorphingToThreads,
    Threads,
    MorphingToLogo,
}

impl VisualMode {
    pub fn next(self) -> Self {
        match self {
            VisualMode::Logo => VisualMode::MorphingToThreads,
            VisualMode::MorphingToThreads => VisualMode::Threads,
            VisualMode::Threads => VisualMode::MorphingToLogo,
            VisualMode::MorphingToLogo => VisualMode::Logo,
        }
    }

    pub fn is_transition(self) -> bool {
        matches!(
            self,
            VisualMode::MorphingToThreads | VisualMode::MorphingToLogo
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            VisualMode::Logo => "logo",
            VisualMode::MorphingToThreads => "morphing-to-threads",
            VisualMode::Threads => "threads",
            VisualMode::MorphingToLogo => "morphing-to-logo",
        }
    }
}

/// Fixed pause/transition cycle mapping elapsed time to a morph value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MorphSchedule {
    pause: f64,
    transition: f64,
}

impl Default for MorphSchedule {
    fn default() -> Self {
        Self {
            pause: 2.5,
            transition: 3.5,
        }
    }
}

impl MorphSchedule {
    pub fn new(pause: Duration, transition: Duration) -> Result<Self, ScheduleError> {
        Self::from_secs(pause.as_secs_f64(), transition.as_secs_f64())
    }

    pub fn from_secs(pause: f64, transition: f64) -> Result<Self, ScheduleError> {
        if !pause.is_finite() || pause < 0.0 {
            return Err(ScheduleError::InvalidDuration { field: "pause" });
        }
        if !transition.is_finite() || transition < 0.0 {
            return Err(ScheduleError::InvalidDuration {
                field: "transition",
            });
        }
        if transition == 0.0 {
            return Err(ScheduleError::ZeroTransition);
        }
        Ok(Self { pause, transition })
    }

    pub fn from_config(section: &siteconfig::MorphSection) -> Result<Self, ScheduleError> {
        Self::new(section.pause, section.transition)
    }

    pub fn pause(&self) -> f64 {
        self.pause
    }

    pub fn transition(&self) -> f64 {
        self.transition
    }

    pub fn cycle(&self) -> f64 {
        2.0 * (self.pause + self.transition)
    }

    fn phase(&self, seconds: f64) -> Option<f64> {
        if !seconds.is_finite() {
            return None;
        }
        Some(seconds.rem_euclid(self.cycle()))
    }

    /// Morph value in `[0, 1]` at `seconds` since the loop started.
    pub fn progress(&self, seconds: f64) -> f32 {
        let Some(t) = self.phase(seconds) else {
            return 0.0;
        };
        let (p, m) = (self.pause, self.transition);

        let value = if t < p {
            0.0
        } else if t < p + m {
            ease_in_out_sine(((t - p) / m) as f32)
        } else if t < 2.0 * p + m {
            1.0
        } else {
            1.0 - ease_in_out_sine(((t - 2.0 * p - m) / m) as f32)
        };
        value.clamp(0.0, 1.0)
    }

    pub fn mode_at(&self, seconds: f64) -> VisualMode {
        let Some(t) = self.phase(seconds) else {
            return VisualMode::Logo;
        };
        let (p, m) = (self.pause, self.transition);
        if t < p {
            VisualMode::Logo
        } else if t < p + m {
            VisualMode::MorphingToThreads
        } else if t < 2.0 * p + m {
            VisualMode::Threads
        } else {
            VisualMode::MorphingToLogo
        }
    }
}

/// Reports each visual mode change once, as seen by a frame observer.
#[derive(Debug, Default)]
pub struct ModeTracker {
    current: Option<VisualMode>,
}

impl ModeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<VisualMode> {
        self.current
    }

    pub fn observe(&mut self, mode: VisualMode) -> Option<VisualMode> {
        if self.current == Some(mode) {
            return None;
        }
        self.current = Some(mode);
        Some(mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn starts_at_logo_and_reaches_threads_after_first_transition() {
        let schedule = MorphSchedule::default();
        assert!((schedule.progress(0.0) - 0.0).abs() < EPS);
        assert!((schedule.progress(6.0) - 1.0).abs() < EPS);
        assert!((schedule.progress(6.0 - 1e-3) - 1.0).abs() < 1e-3);
        assert_eq!(schedule.cycle(), 12.0);
    }

    #[test]
    fn progress_repeats_every_cycle() {
        let schedule = MorphSchedule::default();
        let cycle = schedule.cycle();
        let mut t = -30.0_f64;
        while t < 60.0 {
            let a = schedule.progress(t);
            let b = schedule.progress(t + cycle);
            assert!((a - b).abs() < 1e-3, "t={t}: {a} vs {b}");
            t += 0.37;
        }
    }

    #[test]
    fn progress_stays_periodic_after_long_uptime() {
        let schedule = MorphSchedule::default();
        let cycle = schedule.cycle();
        let cycles = 86_400.0 * 40.0;
        for offset in [0.5, 3.1, 4.25, 6.0, 9.7, 11.9] {
            let base = schedule.progress(offset);
            let late = schedule.progress(cycles * cycle + offset);
            assert!((base - late).abs() < 1e-5, "offset={offset}: {base} vs {late}");
            assert_eq!(schedule.mode_at(offset), schedule.mode_at(cycles * cycle + offset));
        }
    }

    #[test]
    fn progress_stays_in_unit_range() {
        let schedule = MorphSchedule::from_secs(0.4, 1.3).unwrap();
        for step in -2000..2000 {
            let value = schedule.progress(f64::from(step) * 0.013);
            assert!((0.0..=1.0).contains(&value), "value {value}");
        }
        assert_eq!(schedule.progress(f64::NAN), 0.0);
        assert_eq!(schedule.progress(f64::INFINITY), 0.0);
    }

    #[test]
    fn holds_between_transitions() {
        let schedule = MorphSchedule::default();
        assert_eq!(schedule.progress(1.0), 0.0);
        assert_eq!(schedule.progress(7.5), 1.0);
        assert!(schedule.progress(4.25) > 0.0 && schedule.progress(4.25) < 1.0);
        assert!((schedule.progress(4.25) - 0.5).abs() < EPS);
        assert!((schedule.progress(10.25) - 0.5).abs() < EPS);
    }

    #[test]
    fn ease_is_monotonic_and_symmetric() {
        let mut last = 0.0;
        for step in 0..=100 {
            let x = step as f32 / 100.0;
            let value = ease_in_out_sine(x);
            assert!(value >= last - f32::EPSILON);
            assert!((value + ease_in_out_sine(1.0 - x) - 1.0).abs() < 1e-5);
            last = value;
        }
    }

    #[test]
    fn transitions_are_monotonic_in_their_direction() {
        let schedule = MorphSchedule::default();
        let mut last = schedule.progress(2.5);
        for step in 1..=35 {
            let value = schedule.progress(2.5 + f64::from(step) * 0.1);
            assert!(value >= last - 1e-5);
            last = value;
        }
        let mut last = schedule.progress(8.5);
        for step in 1..=35 {
            let value = schedule.progress(8.5 + f64::from(step) * 0.1);
            assert!(value <= last + 1e-5);
            last = value;
        }
    }

    #[test]
    fn mode_cycles_through_all_states() {
        let schedule = MorphSchedule::default();
        assert_eq!(schedule.mode_at(0.0), VisualMode::Logo);
        assert_eq!(schedule.mode_at(3.0), VisualMode::MorphingToThreads);
        assert_eq!(schedule.mode_at(7.0), VisualMode::Threads);
        assert_eq!(schedule.mode_at(9.0), VisualMode::MorphingToLogo);
        assert_eq!(schedule.mode_at(12.5), VisualMode::Logo);

        let mut mode = VisualMode::Logo;
        for _ in 0..4 {
            mode = mode.next();
        }
        assert_eq!(mode, VisualMode::Logo);
    }

    #[test]
    fn tracker_reports_each_change_once() {
        let schedule = MorphSchedule::default();
        let mut tracker = ModeTracker::new();
        let mut changes = Vec::new();
        let mut t = 0.0_f64;
        while t < 12.0 {
            if let Some(mode) = tracker.observe(schedule.mode_at(t)) {
                changes.push(mode);
            }
            t += 1.0 / 60.0;
        }
        assert_eq!(
            changes,
            vec![
                VisualMode::Logo,
                VisualMode::MorphingToThreads,
                VisualMode::Threads,
                VisualMode::MorphingToLogo,
            ]
        );
    }

    #[test]
    fn rejects_invalid_durations() {
        assert_eq!(
            MorphSchedule::from_secs(-1.0, 2.0),
            Err(ScheduleError::InvalidDuration { field: "pause" })
        );
        assert_eq!(
            MorphSchedule::from_secs(1.0, 0.0),
            Err(ScheduleError::ZeroTransition)
        );
        assert!(MorphSchedule::from_secs(0.0, 1.0).is_ok());
    }

    #[test]
    fn builds_from_config_section() {
        let config = siteconfig::SiteConfig::default();
        let schedule = MorphSchedule::from_config(&config.morph).unwrap();
        assert_eq!(schedule, MorphSchedule::default());
    }

    #[test]
    fn logo_fades_out_as_threads_appear() {
        assert_eq!(logo_opacity(0.0), 1.0);
        assert_eq!(logo_opacity(1.0), 0.0);
        assert!((logo_opacity(0.25) - 0.75).abs() < EPS);
        assert_eq!(logo_opacity(f32::NAN), 1.0);
    }
}
