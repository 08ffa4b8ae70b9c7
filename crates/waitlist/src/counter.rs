use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use tracing::{debug, trace, warn};

use crate::client::CountSource;
use crate::WaitlistError;

/// Number of odometer columns.
pub const DIGIT_COUNT: usize = 4;

/// Last known waitlist size plus signups made from this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WaitlistCounter {
    count: Option<u64>,
    increment: u64,
}

impl WaitlistCounter {
    pub fn new(increment: u64) -> Self {
        Self {
            count: None,
            increment,
        }
    }

    pub fn count(&self) -> Option<u64> {
        self.count
    }

    pub fn increment(&self) -> u64 {
        self.increment
    }

    /// Applies one poll result. Failures keep whatever was shown before.
    pub fn apply_fetch(&mut self, result: Result<u64, WaitlistError>) -> bool {
        match result {
            Ok(count) => {
                let changed = self.count != Some(count);
                self.count = Some(count);
                changed
            }
            Err(err) => {
                debug!(error = %err, "waitlist count fetch failed; keeping last value");
                false
            }
        }
    }

    pub fn record_signup(&mut self) {
        self.increment = self.increment.saturating_add(1);
    }

    /// `None` until the first successful fetch.
    pub fn display_count(&self) -> Option<u64> {
        self.count.map(|count| count.saturating_add(self.increment))
    }

    pub fn digits(&self) -> Option<[u8; DIGIT_COUNT]> {
        self.display_count().map(padded_digits)
    }
}

/// Zero-pads to four digits and keeps the leading four characters.
pub fn padded_digits(value: u64) -> [u8; DIGIT_COUNT] {
    let text = format!("{value:04}");
    let mut digits = [0u8; DIGIT_COUNT];
    for (slot, byte) in digits.iter_mut().zip(text.bytes()) {
        *slot = byte - b'0';
    }
    digits
}

/// Background thread that polls a [`CountSource`] on a fixed interval.
///
/// The first fetch happens immediately. The thread exits when the poller is
/// dropped or the result receiver goes away.
#[derive(Debug)]
pub struct CounterPoller {
    results: Receiver<Result<u64, WaitlistError>>,
    stop: Option<Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl CounterPoller {
    pub fn spawn<S>(source: S, interval: Duration) -> std::io::Result<Self>
    where
        S: CountSource + Send + 'static,
    {
        let (result_tx, results) = unbounded();
        let (stop, stop_rx) = bounded::<()>(1);
        let join = thread::Builder::new()
            .name("attosite-counter".into())
            .spawn(move || poll_loop(source, interval, result_tx, stop_rx))?;
        debug!(interval = ?interval, "waitlist counter poller started");
        Ok(Self {
            results,
            stop: Some(stop),
            join: Some(join),
        })
    }

    pub fn results(&self) -> &Receiver<Result<u64, WaitlistError>> {
        &self.results
    }

    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        drop(self.stop.take());
        if let Some(handle) = self.join.take() {
            if handle.join().is_err() {
                warn!("waitlist counter poller panicked");
            }
        }
    }
}

impl Drop for CounterPoller {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

fn poll_loop<S: CountSource>(
    source: S,
    interval: Duration,
    results: Sender<Result<u64, WaitlistError>>,
    stop: Receiver<()>,
) {
    loop {
        let result = source.fetch_count();
        trace!(ok = result.is_ok(), "waitlist count polled");
        if results.send(result).is_err() {
            break;
        }
        match stop.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    debug!("waitlist counter poller stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn display_adds_increment() {
        let mut counter = WaitlistCounter::new(2);
        assert_eq!(counter.display_count(), None);
        assert!(counter.apply_fetch(Ok(41)));
        assert_eq!(counter.display_count(), Some(43));
        assert_eq!(counter.digits(), Some([0, 0, 4, 3]));
    }

    #[test]
    fn failed_fetch_keeps_previous_value() {
        let mut counter = WaitlistCounter::default();
        assert!(!counter.apply_fetch(Err(WaitlistError::MissingEndpoint)));
        assert_eq!(counter.count(), None);

        counter.apply_fetch(Ok(10));
        assert!(!counter.apply_fetch(Err(WaitlistError::MalformedCount("{}".into()))));
        assert_eq!(counter.count(), Some(10));
    }

    #[test]
    fn signup_bumps_local_offset() {
        let mut counter = WaitlistCounter::default();
        counter.apply_fetch(Ok(7));
        counter.record_signup();
        assert_eq!(counter.increment(), 1);
        assert_eq!(counter.display_count(), Some(8));
    }

    #[test]
    fn large_counts_keep_leading_digits() {
        assert_eq!(padded_digits(5), [0, 0, 0, 5]);
        assert_eq!(padded_digits(1234), [1, 2, 3, 4]);
        assert_eq!(padded_digits(98765), [9, 8, 7, 6]);
    }

    struct CountingSource {
        calls: Arc<AtomicUsize>,
    }

    impl CountSource for CountingSource {
        fn fetch_count(&self) -> Result<u64, WaitlistError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) as u64;
            if call == 1 {
                Err(WaitlistError::MalformedCount("oops".into()))
            } else {
                Ok(100 + call)
            }
        }
    }

    #[test]
    fn poller_fetches_immediately_then_on_interval() {
        let calls = Arc::new(AtomicUsize::new(0));
        let poller = CounterPoller::spawn(
            CountingSource {
                calls: Arc::clone(&calls),
            },
            Duration::from_millis(10),
        )
        .unwrap();

        let timeout = Duration::from_secs(5);
        let first = poller.results().recv_timeout(timeout).unwrap();
        assert_eq!(first.unwrap(), 100);
        let second = poller.results().recv_timeout(timeout).unwrap();
        assert!(second.is_err());
        let third = poller.results().recv_timeout(timeout).unwrap();
        assert_eq!(third.unwrap(), 102);

        poller.shutdown();
        let after = calls.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(calls.load(Ordering::SeqCst), after);
    }
}
