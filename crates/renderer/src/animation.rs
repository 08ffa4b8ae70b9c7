//! Per-frame animation state: elapsed time, smoothed pointer, morph value.
//!
//! One [`AnimationState`] belongs to exactly one frame loop. Each call to
//! [`AnimationState::advance`] mutates it once and returns the values the
//! shader needs for that frame. The morph value is optionally handed to a
//! single observer through a latest-value mailbox ([`morph_channel`]).

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use scheduler::MorphSchedule;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, trace};

use crate::runtime::TimeSample;
use crate::types::ThreadsProps;

/// Fraction of the remaining pointer distance covered per frame.
pub const MOUSE_SMOOTHING: f32 = 0.05;
/// Pointer position used when the cursor is absent.
pub const MOUSE_REST: [f32; 2] = [0.5, 0.5];

/// Values consumed by one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    pub time: f32,
    pub mouse: [f32; 2],
    pub morph: f32,
    /// Knob pulse envelope of the active preset.
    pub pulse: f32,
}

/// Exponential follower for the normalized pointer position.
///
/// The step is per frame, not per second, so the follow speed scales with the
/// display refresh rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseSmoother {
    current: [f32; 2],
    target: [f32; 2],
    factor: f32,
}

impl Default for MouseSmoother {
    fn default() -> Self {
        Self::new(MOUSE_SMOOTHING)
    }
}

impl MouseSmoother {
    pub fn new(factor: f32) -> Self {
        Self {
            current: MOUSE_REST,
            target: MOUSE_REST,
            factor: factor.clamp(0.0, 1.0),
        }
    }

    pub fn current(&self) -> [f32; 2] {
        self.current
    }

    pub fn target(&self) -> [f32; 2] {
        self.target
    }

    pub fn set_target(&mut self, target: [f32; 2]) {
        self.target = target;
    }

    pub fn reset_target(&mut self) {
        self.target = MOUSE_REST;
    }

    pub fn step(&mut self) -> [f32; 2] {
        for axis in 0..2 {
            self.current[axis] += self.factor * (self.target[axis] - self.current[axis]);
        }
        self.current
    }

    /// Frames needed to shrink an initial offset to `epsilon` of its size.
    pub fn ticks_to_converge(epsilon: f32, factor: f32) -> u32 {
        if factor >= 1.0 {
            return 1;
        }
        if factor <= 0.0 || epsilon <= 0.0 {
            return u32::MAX;
        }
        if epsilon >= 1.0 {
            return 0;
        }
        (f64::from(epsilon).ln() / f64::from(1.0 - factor).ln()).ceil() as u32
    }
}

/// One published morph value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MorphSample {
    pub time: f64,
    pub progress: f32,
}

/// Producer side of the morph mailbox. Owned by one animation loop.
#[derive(Debug)]
pub struct MorphPublisher {
    tx: Sender<MorphSample>,
    stale: Receiver<MorphSample>,
    subscriber: Weak<()>,
}

/// Consumer side of the morph mailbox.
#[derive(Debug, Clone)]
pub struct MorphSubscriber {
    rx: Receiver<MorphSample>,
    _alive: Arc<()>,
}

/// Creates a single-slot mailbox that always holds the newest morph sample.
pub fn morph_channel() -> (MorphPublisher, MorphSubscriber) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let alive = Arc::new(());
    (
        MorphPublisher {
            tx,
            stale: rx.clone(),
            subscriber: Arc::downgrade(&alive),
        },
        MorphSubscriber { rx, _alive: alive },
    )
}

impl MorphPublisher {
    /// Replaces any unread sample with `sample`. Returns false once the
    /// subscriber is gone.
    pub fn publish(&mut self, sample: MorphSample) -> bool {
        if !self.is_connected() {
            return false;
        }
        let mut pending = sample;
        loop {
            match self.tx.try_send(pending) {
                Ok(()) => return true,
                Err(TrySendError::Full(back)) => {
                    let _ = self.stale.try_recv();
                    pending = back;
                }
                Err(TrySendError::Disconnected(_)) => return false,
            }
        }
    }

    /// The publisher holds a receiver of its own, so liveness is tracked
    /// through the subscriber handles instead of the channel.
    pub fn is_connected(&self) -> bool {
        self.subscriber.strong_count() > 0
    }
}

impl MorphSubscriber {
    /// Newest sample published since the last call, if any.
    pub fn latest(&self) -> Option<MorphSample> {
        self.rx.try_iter().last()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<MorphSample> {
        match self.rx.recv_timeout(timeout) {
            Ok(sample) => Some(sample),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

/// Mutable per-view animation state, advanced once per frame.
#[derive(Debug)]
pub struct AnimationState {
    mouse: MouseSmoother,
    mouse_enabled: bool,
    morph_enabled: bool,
    morph: f32,
    resting_morph: f32,
    preset: crate::types::VisualPreset,
    schedule: MorphSchedule,
    publisher: Option<MorphPublisher>,
    last_time: f64,
}

impl AnimationState {
    pub fn new(props: &ThreadsProps, schedule: MorphSchedule) -> Self {
        let resting_morph = props.preset.resting_morph();
        Self {
            mouse: MouseSmoother::default(),
            mouse_enabled: props.mouse_interaction,
            morph_enabled: props.morph,
            morph: if props.morph { 0.0 } else { resting_morph },
            resting_morph,
            preset: props.preset,
            schedule,
            publisher: None,
            last_time: 0.0,
        }
    }

    pub fn with_publisher(mut self, publisher: Option<MorphPublisher>) -> Self {
        self.publisher = publisher;
        self
    }

    pub fn mouse_enabled(&self) -> bool {
        self.mouse_enabled
    }

    pub fn morph(&self) -> f32 {
        self.morph
    }

    pub fn mouse(&self) -> [f32; 2] {
        self.mouse.current()
    }

    pub fn elapsed(&self) -> f64 {
        self.last_time
    }

    /// New pointer target in normalized coordinates (bottom-left origin).
    pub fn pointer_moved(&mut self, normalized: [f32; 2]) {
        if !self.mouse_enabled {
            return;
        }
        self.mouse.set_target([
            normalized[0].clamp(0.0, 1.0),
            normalized[1].clamp(0.0, 1.0),
        ]);
    }

    pub fn pointer_left(&mut self) {
        if self.mouse_enabled {
            self.mouse.reset_target();
        }
    }

    /// Runs one tick of the update loop.
    pub fn advance(&mut self, sample: TimeSample) -> FrameParams {
        let time = sample.seconds;
        self.last_time = time;

        let mouse = if self.mouse_enabled {
            self.mouse.step()
        } else {
            MOUSE_REST
        };

        if self.morph_enabled {
            self.morph = self.schedule.progress(time);
            if let Some(publisher) = self.publisher.as_mut() {
                let delivered = publisher.publish(MorphSample {
                    time,
                    progress: self.morph,
                });
                if !delivered {
                    debug!("morph observer disconnected; publishing stopped");
                    self.publisher = None;
                }
            }
        } else {
            self.morph = self.resting_morph;
        }

        trace!(frame = sample.frame_index, time, morph = self.morph, "animation tick");

        FrameParams {
            time: time as f32,
            mouse,
            morph: self.morph,
            pulse: self.preset.pulse(time),
        }
    }
}
