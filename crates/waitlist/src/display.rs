//! Counter value paired with the odometer columns that show it.

use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, TryRecvError};

use crate::counter::{CounterPoller, WaitlistCounter, DIGIT_COUNT};
use crate::odometer::Odometer;
use crate::WaitlistError;

/// Renders digits as the odometer reads them, e.g. `0042`.
pub fn format_digits(digits: [u8; DIGIT_COUNT]) -> String {
    digits.iter().map(|d| char::from(b'0' + d % 10)).collect()
}

/// Keeps the odometer targets in step with the counter and reports each
/// value once the columns come to rest on it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CounterDisplay {
    counter: WaitlistCounter,
    odometer: Odometer,
    reported: bool,
}

impl CounterDisplay {
    pub fn new(counter: WaitlistCounter) -> Self {
        let mut display = Self {
            counter,
            odometer: Odometer::default(),
            reported: false,
        };
        display.retarget();
        display
    }

    pub fn counter(&self) -> &WaitlistCounter {
        &self.counter
    }

    pub fn odometer(&self) -> &Odometer {
        &self.odometer
    }

    /// Applies one poll result. Returns whether the displayed count changed.
    pub fn apply_fetch(&mut self, result: Result<u64, WaitlistError>) -> bool {
        let changed = self.counter.apply_fetch(result);
        if changed {
            self.retarget();
        }
        changed
    }

    pub fn record_signup(&mut self) {
        self.counter.record_signup();
        self.retarget();
    }

    /// Applies every result the poller has queued.
    pub fn drain(&mut self, poller: &CounterPoller) -> Result<bool, PollerGone> {
        let mut changed = false;
        loop {
            match poller.results().try_recv() {
                Ok(result) => changed |= self.apply_fetch(result),
                Err(TryRecvError::Empty) => return Ok(changed),
                Err(TryRecvError::Disconnected) => return Err(PollerGone),
            }
        }
    }

    /// Waits up to `timeout` for the next poll result.
    pub fn wait(&mut self, poller: &CounterPoller, timeout: Duration) -> Result<bool, PollerGone> {
        match poller.results().recv_timeout(timeout) {
            Ok(result) => Ok(self.apply_fetch(result)),
            Err(RecvTimeoutError::Timeout) => Ok(false),
            Err(RecvTimeoutError::Disconnected) => Err(PollerGone),
        }
    }

    /// Advances the columns by `dt` seconds. Yields the shown digits the
    /// first time they settle after a change.
    pub fn tick(&mut self, dt: f64) -> Option<[u8; DIGIT_COUNT]> {
        self.odometer.tick(dt);
        if self.reported || !self.odometer.is_settled() {
            return None;
        }
        self.reported = true;
        Some(self.odometer.shown())
    }

    fn retarget(&mut self) {
        self.odometer.set_digits(self.counter.digits());
        self.reported = false;
    }
}

/// The poller thread has exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("waitlist counter poller stopped")]
pub struct PollerGone;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::CountSource;

    const FRAME: f64 = 1.0 / 60.0;

    fn settle(display: &mut CounterDisplay) -> Option<[u8; DIGIT_COUNT]> {
        (0..1200).find_map(|_| display.tick(FRAME))
    }

    #[test]
    fn unknown_count_keeps_rolling() {
        let mut display = CounterDisplay::default();
        assert_eq!(settle(&mut display), None);
        assert!(!display.odometer().is_settled());
    }

    #[test]
    fn fetched_count_settles_and_reports_once() {
        let mut display = CounterDisplay::new(WaitlistCounter::new(0));
        for _ in 0..30 {
            display.tick(FRAME);
        }
        assert!(display.apply_fetch(Ok(42)));
        assert_eq!(settle(&mut display), Some([0, 0, 4, 2]));
        assert_eq!(settle(&mut display), None);
        assert!(!display.apply_fetch(Ok(42)));
        assert_eq!(settle(&mut display), None);
    }

    #[test]
    fn signup_rolls_to_the_next_value() {
        let mut display = CounterDisplay::new(WaitlistCounter::new(0));
        display.apply_fetch(Ok(1299));
        assert_eq!(settle(&mut display), Some([1, 2, 9, 9]));

        display.record_signup();
        assert_eq!(display.counter().display_count(), Some(1300));
        assert_eq!(settle(&mut display), Some([1, 3, 0, 0]));
    }

    #[test]
    fn failed_fetch_leaves_columns_alone() {
        let mut display = CounterDisplay::new(WaitlistCounter::new(0));
        display.apply_fetch(Ok(7));
        settle(&mut display);
        let before = display.odometer().clone();
        assert!(!display.apply_fetch(Err(WaitlistError::MissingEndpoint)));
        assert_eq!(display.odometer(), &before);
        assert_eq!(display.tick(FRAME), None);
    }

    struct Fixed(u64);

    impl CountSource for Fixed {
        fn fetch_count(&self) -> Result<u64, WaitlistError> {
            Ok(self.0)
        }
    }

    #[test]
    fn waits_on_poller_results() {
        let poller = CounterPoller::spawn(Fixed(12), Duration::from_secs(60)).unwrap();
        let mut display = CounterDisplay::new(WaitlistCounter::new(1));
        assert_eq!(display.wait(&poller, Duration::from_secs(5)), Ok(true));
        assert_eq!(display.drain(&poller), Ok(false));
        assert_eq!(settle(&mut display), Some([0, 0, 1, 3]));
    }

    #[test]
    fn formats_digits_without_separators() {
        assert_eq!(format_digits([0, 0, 4, 2]), "0042");
        assert_eq!(format_digits([9, 8, 7, 6]), "9876");
    }
}
