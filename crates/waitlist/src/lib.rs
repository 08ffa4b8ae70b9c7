//! Waitlist signup and counter for the atto sound landing page.
//!
//! Both features talk to a single spreadsheet-backed webhook: signups are
//! POSTed as JSON and the current size is read back with a GET. Without an
//! endpoint configured every call fails with [`WaitlistError::MissingEndpoint`]
//! and callers treat it like any other network failure.

pub mod client;
pub mod country;
pub mod counter;
pub mod display;
pub mod form;
pub mod odometer;
pub mod session;

pub use client::{parse_count, CountSource, SignupTransport, WaitlistClient};
pub use country::{find_country_code, CountryCode, COUNTRY_CODES, DEFAULT_COUNTRY_CODE};
pub use counter::{padded_digits, CounterPoller, WaitlistCounter, DIGIT_COUNT};
pub use display::{format_digits, CounterDisplay, PollerGone};
pub use form::{FormError, Platform, SignupForm, SignupRecord};
pub use odometer::{Odometer, OdometerDigit};
pub use session::{SignupSession, SignupStatus, SubmitError};

#[derive(Debug, thiserror::Error)]
pub enum WaitlistError {
    #[error("no waitlist endpoint configured")]
    MissingEndpoint,
    #[error("invalid waitlist endpoint {0}")]
    InvalidEndpoint(String),
    #[error("waitlist request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected waitlist count response: {0}")]
    MalformedCount(String),
}
