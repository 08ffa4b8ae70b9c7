//! Rolling digit columns for the waitlist counter.
//!
//! Positions are measured in digit-cell units of [`DIGIT_HEIGHT`]; a column
//! showing digit `d` sits at `d * DIGIT_HEIGHT` modulo [`CYCLE`]. While the
//! count is unknown each column rolls freely at its own speed. Once a digit
//! arrives the column eases forward to it, always taking one extra turn.

use crate::counter::DIGIT_COUNT;

pub const DIGIT_HEIGHT: f64 = 2.5;
pub const CYCLE: f64 = DIGIT_HEIGHT * 10.0;
/// Free-rolling speed per column, in units per second.
pub const SPEEDS: [f64; DIGIT_COUNT] = [18.0, 22.0, 28.0, 20.0];
pub const EASE_RATE: f64 = 5.0;
const SNAP_DISTANCE: f64 = 0.01;

fn wrap(position: f64) -> f64 {
    position.rem_euclid(CYCLE)
}

#[derive(Debug, Clone, PartialEq)]
pub struct OdometerDigit {
    position: f64,
    target_position: Option<f64>,
    last_digit: Option<u8>,
    speed: f64,
}

impl OdometerDigit {
    pub fn new(speed: f64) -> Self {
        Self {
            position: 0.0,
            target_position: None,
            last_digit: None,
            speed,
        }
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn target_position(&self) -> Option<f64> {
        self.target_position
    }

    pub fn is_settled(&self) -> bool {
        self.target_position == Some(self.position)
    }

    /// `None` returns the column to free rolling. Repeating the current digit
    /// keeps the existing target.
    pub fn set_target(&mut self, digit: Option<u8>) {
        let Some(digit) = digit else {
            self.target_position = None;
            return;
        };
        let digit = digit % 10;
        if self.last_digit == Some(digit) && self.target_position.is_some() {
            return;
        }
        self.last_digit = Some(digit);

        let mut forward = f64::from(digit) * DIGIT_HEIGHT - wrap(self.position);
        if forward <= 0.0 {
            forward += CYCLE;
        }
        self.target_position = Some(self.position + forward + CYCLE);
    }

    pub fn tick(&mut self, dt: f64) {
        let dt = dt.max(0.0);
        match self.target_position {
            Some(target) => {
                let remaining = target - self.position;
                if remaining.abs() < SNAP_DISTANCE {
                    self.position = target;
                } else {
                    self.position += remaining * (EASE_RATE * dt).min(1.0);
                }
            }
            None => self.position += self.speed * dt,
        }
    }

    /// Vertical scroll offset in `[0, CYCLE)`.
    pub fn offset(&self) -> f64 {
        wrap(self.position)
    }

    /// Digit nearest to the current offset.
    pub fn shown_digit(&self) -> u8 {
        ((self.offset() / DIGIT_HEIGHT).round() as u8) % 10
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Odometer {
    digits: [OdometerDigit; DIGIT_COUNT],
}

impl Default for Odometer {
    fn default() -> Self {
        Self {
            digits: SPEEDS.map(OdometerDigit::new),
        }
    }
}

impl Odometer {
    pub fn digits(&self) -> &[OdometerDigit; DIGIT_COUNT] {
        &self.digits
    }

    pub fn set_digits(&mut self, digits: Option<[u8; DIGIT_COUNT]>) {
        for (index, column) in self.digits.iter_mut().enumerate() {
            column.set_target(digits.map(|d| d[index]));
        }
    }

    pub fn tick(&mut self, dt: f64) {
        for column in &mut self.digits {
            column.tick(dt);
        }
    }

    pub fn is_settled(&self) -> bool {
        self.digits.iter().all(OdometerDigit::is_settled)
    }

    pub fn shown(&self) -> [u8; DIGIT_COUNT] {
        let mut shown = [0u8; DIGIT_COUNT];
        for (slot, column) in shown.iter_mut().zip(&self.digits) {
            *slot = column.shown_digit();
        }
        shown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settle(odometer: &mut Odometer) {
        for _ in 0..2_000 {
            odometer.tick(1.0 / 60.0);
            if odometer.is_settled() {
                return;
            }
        }
        panic!("odometer never settled: {odometer:?}");
    }

    #[test]
    fn free_rolls_at_column_speed() {
        let mut digit = OdometerDigit::new(20.0);
        digit.tick(0.5);
        assert!((digit.position() - 10.0).abs() < 1e-9);
        digit.tick(1.0);
        assert!((digit.offset() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn target_is_forward_with_an_extra_turn() {
        let mut digit = OdometerDigit::new(18.0);
        digit.set_target(Some(3));
        assert_eq!(digit.target_position(), Some(7.5 + CYCLE));

        // Already showing the digit: still a full turn forward plus one extra.
        let mut digit = OdometerDigit::new(18.0);
        digit.set_target(Some(0));
        assert_eq!(digit.target_position(), Some(2.0 * CYCLE));
    }

    #[test]
    fn repeated_digit_keeps_target() {
        let mut digit = OdometerDigit::new(18.0);
        digit.set_target(Some(4));
        let target = digit.target_position();
        digit.tick(0.05);
        digit.set_target(Some(4));
        assert_eq!(digit.target_position(), target);
    }

    #[test]
    fn odometer_settles_on_count() {
        let mut odometer = Odometer::default();
        odometer.tick(0.3);
        odometer.set_digits(Some([0, 0, 4, 3]));
        settle(&mut odometer);
        assert_eq!(odometer.shown(), [0, 0, 4, 3]);
        for column in odometer.digits() {
            assert!(column.offset() < CYCLE);
        }
    }

    #[test]
    fn unknown_count_resumes_rolling() {
        let mut odometer = Odometer::default();
        odometer.set_digits(Some([1, 2, 3, 4]));
        settle(&mut odometer);
        odometer.set_digits(None);
        let before = odometer.digits()[2].position();
        odometer.tick(0.1);
        assert!((odometer.digits()[2].position() - before - 2.8).abs() < 1e-9);
    }
}
