use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::country::{find_country_code, DEFAULT_COUNTRY_CODE};

static EMAIL_PATTERN: OnceLock<Regex> = OnceLock::new();
static PHONE_PATTERN: OnceLock<Regex> = OnceLock::new();

fn email_pattern() -> &'static Regex {
    EMAIL_PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap_or_else(|err| panic!("email pattern: {err}"))
    })
}

fn phone_pattern() -> &'static Regex {
    PHONE_PATTERN
        .get_or_init(|| Regex::new(r"^[0-9]{6,15}$").unwrap_or_else(|err| panic!("phone pattern: {err}")))
}

/// Mobile platform the user wants early access on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Ios,
    Android,
}

impl Platform {
    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ios" | "iphone" => Ok(Self::Ios),
            "android" => Ok(Self::Android),
            other => Err(format!(
                "invalid platform '{other}'; expected 'ios' or 'android'"
            )),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Ios => f.write_str("ios"),
            Platform::Android => f.write_str("android"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("first name is required")]
    MissingFirstName,
    #[error("last name is required")]
    MissingLastName,
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("phone number must contain 6 to 15 digits")]
    InvalidPhone,
    #[error("unknown country code '{0}'")]
    UnknownCountryCode(String),
}

/// Editable signup form state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub country_code: String,
    /// Local number as typed; spaces are allowed.
    pub phone: String,
    pub platform: Platform,
}

impl Default for SignupForm {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            phone: String::new(),
            platform: Platform::default(),
        }
    }
}

/// Payload posted to the signup endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRecord {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub os: Platform,
}

pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

/// Phone digits with spaces removed, if the result is a 6..=15 digit number.
pub fn normalize_phone(phone: &str) -> Option<String> {
    let digits: String = phone.chars().filter(|c| *c != ' ').collect();
    phone_pattern().is_match(&digits).then_some(digits)
}

impl SignupForm {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Checks every field and builds the record to submit.
    pub fn validate(&self) -> Result<SignupRecord, FormError> {
        let first_name = self.first_name.trim();
        if first_name.is_empty() {
            return Err(FormError::MissingFirstName);
        }
        let last_name = self.last_name.trim();
        if last_name.is_empty() {
            return Err(FormError::MissingLastName);
        }
        if !is_valid_email(&self.email) {
            return Err(FormError::InvalidEmail(self.email.clone()));
        }
        let digits = normalize_phone(&self.phone).ok_or(FormError::InvalidPhone)?;
        let country = find_country_code(&self.country_code)
            .ok_or_else(|| FormError::UnknownCountryCode(self.country_code.clone()))?;

        Ok(SignupRecord {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: self.email.clone(),
            phone: format!("{}{}", country.code, digits),
            os: self.platform,
        })
    }
}
