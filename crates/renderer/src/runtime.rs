use std::time::Instant;

/// Whether the hero animates or holds a single moment.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RenderPolicy {
    /// Redraw every display frame from the monotonic clock.
    #[default]
    Animate,
    /// Hold every frame at `time` seconds into the morph cycle.
    Still { time: f64 },
}

/// Clock reading handed to [`crate::AnimationState::advance`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    pub seconds: f64,
    pub frame_index: u64,
}

impl TimeSample {
    pub fn new(seconds: f64, frame_index: u64) -> Self {
        Self {
            seconds,
            frame_index,
        }
    }
}

/// Produces one [`TimeSample`] per frame.
pub trait TimeSource: Send {
    fn sample(&mut self) -> TimeSample;
}

/// Time source backed by the system monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
    frame: u64,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
            frame: 0,
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn sample(&mut self) -> TimeSample {
        let elapsed = self.origin.elapsed();
        let sample = TimeSample::new(elapsed.as_secs_f64(), self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Reports the same timestamp every frame; still exports and frozen windows.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeSource {
    time: f64,
    frame: u64,
}

impl FixedTimeSource {
    pub fn new(time: f64) -> Self {
        Self { time, frame: 0 }
    }

    pub fn time(&self) -> f64 {
        self.time
    }
}

impl TimeSource for FixedTimeSource {
    fn sample(&mut self) -> TimeSample {
        let sample = TimeSample::new(self.time, self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

pub type BoxedTimeSource = Box<dyn TimeSource + Send>;

/// Clock matching `policy`, started now.
pub fn time_source_for_policy(policy: &RenderPolicy) -> BoxedTimeSource {
    match policy {
        RenderPolicy::Animate => Box::new(SystemTimeSource::new()),
        RenderPolicy::Still { time } => Box::new(FixedTimeSource::new(*time)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_source_repeats_time_and_counts_frames() {
        let mut source = time_source_for_policy(&RenderPolicy::Still { time: 4.25 });
        let first = source.sample();
        let second = source.sample();
        assert_eq!(first.seconds, 4.25);
        assert_eq!(second.seconds, 4.25);
        assert_eq!(first.frame_index, 0);
        assert_eq!(second.frame_index, 1);
    }

    #[test]
    fn system_source_is_monotonic() {
        let mut source = SystemTimeSource::new();
        let a = source.sample();
        let b = source.sample();
        assert!(b.seconds >= a.seconds);
        assert_eq!(b.frame_index, 1);
    }
}
