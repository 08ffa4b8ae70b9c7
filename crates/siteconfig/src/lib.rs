use std::fmt;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Visual preset rendered by the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    /// Threads that morph into the fader logo and back.
    #[default]
    Morph,
    /// Static logo faders with a pulsing knob envelope.
    Heartbeat,
}

impl PresetName {
    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "morph" | "threads" => Ok(Self::Morph),
            "heartbeat" | "logo" => Ok(Self::Heartbeat),
            other => Err(format!(
                "invalid preset '{other}'; expected 'morph' or 'heartbeat'"
            )),
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresetName::Morph => f.write_str("morph"),
            PresetName::Heartbeat => f.write_str("heartbeat"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    pub version: u32,
    #[serde(default)]
    pub threads: ThreadsSection,
    #[serde(default)]
    pub morph: MorphSection,
    #[serde(default)]
    pub waitlist: WaitlistSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThreadsSection {
    #[serde(default = "default_color")]
    pub color: [f32; 3],
    #[serde(default = "default_amplitude")]
    pub amplitude: f32,
    #[serde(default)]
    pub distance: f32,
    #[serde(default = "default_true")]
    pub mouse: bool,
    #[serde(default = "default_true")]
    pub morph: bool,
    #[serde(default)]
    pub preset: PresetName,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MorphSection {
    #[serde(default = "default_pause", deserialize_with = "deserialize_duration")]
    pub pause: Duration,
    #[serde(
        default = "default_transition",
        deserialize_with = "deserialize_duration"
    )]
    pub transition: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaitlistSection {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(
        default = "default_poll_interval",
        deserialize_with = "deserialize_duration"
    )]
    pub poll_interval: Duration,
    #[serde(default)]
    pub increment: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            version: 1,
            threads: ThreadsSection::default(),
            morph: MorphSection::default(),
            waitlist: WaitlistSection::default(),
        }
    }
}

impl Default for ThreadsSection {
    fn default() -> Self {
        Self {
            color: default_color(),
            amplitude: default_amplitude(),
            distance: 0.0,
            mouse: true,
            morph: true,
            preset: PresetName::default(),
        }
    }
}

impl Default for MorphSection {
    fn default() -> Self {
        Self {
            pause: default_pause(),
            transition: default_transition(),
        }
    }
}

impl Default for WaitlistSection {
    fn default() -> Self {
        Self {
            endpoint: None,
            poll_interval: default_poll_interval(),
            increment: 0,
        }
    }
}

fn default_color() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn default_amplitude() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_pause() -> Duration {
    Duration::from_secs_f32(2.5)
}

fn default_transition() -> Duration {
    Duration::from_secs_f32(3.5)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(10)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if !v.is_finite() || v.is_sign_negative() {
                return Err(E::custom("duration must be a non-negative number"));
            }
            Ok(Duration::from_secs_f64(v))
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl SiteConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: SiteConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Endpoint URL with surrounding whitespace removed; blank values count as absent.
    pub fn endpoint(&self) -> Option<&str> {
        self.waitlist
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        for (index, channel) in self.threads.color.iter().enumerate() {
            if !channel.is_finite() || !(0.0..=1.0).contains(channel) {
                return Err(ConfigError::Invalid(format!(
                    "threads.color[{index}] must be within 0.0..=1.0 (got {channel})"
                )));
            }
        }

        if !self.threads.amplitude.is_finite() || self.threads.amplitude < 0.0 {
            return Err(ConfigError::Invalid(
                "threads.amplitude must be a non-negative number".into(),
            ));
        }

        if !self.threads.distance.is_finite() {
            return Err(ConfigError::Invalid(
                "threads.distance must be a finite number".into(),
            ));
        }

        if self.morph.transition.is_zero() {
            return Err(ConfigError::Invalid(
                "morph.transition must be greater than zero".into(),
            ));
        }

        if self.waitlist.poll_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "waitlist.poll_interval must be greater than zero".into(),
            ));
        }

        if let Some(endpoint) = self.endpoint() {
            if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
                return Err(ConfigError::Invalid(format!(
                    "waitlist.endpoint '{endpoint}' must be an http(s) URL"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version = 1

[threads]
color = [0.9, 0.8, 1.0]
amplitude = 1.5
distance = 0.1
mouse = false
preset = "heartbeat"

[morph]
pause = "2s"
transition = 4

[waitlist]
endpoint = "https://script.example.com/exec"
poll_interval = "30s"
increment = 2
"#;

    #[test]
    fn parses_sample_config() {
        let config = SiteConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.threads.color, [0.9, 0.8, 1.0]);
        assert!(!config.threads.mouse);
        assert!(config.threads.morph);
        assert_eq!(config.threads.preset, PresetName::Heartbeat);
        assert_eq!(config.morph.pause, Duration::from_secs(2));
        assert_eq!(config.morph.transition, Duration::from_secs(4));
        assert_eq!(config.endpoint(), Some("https://script.example.com/exec"));
        assert_eq!(config.waitlist.poll_interval, Duration::from_secs(30));
        assert_eq!(config.waitlist.increment, 2);
    }

    #[test]
    fn minimal_config_uses_landing_defaults() {
        let config = SiteConfig::from_toml_str("version = 1").unwrap();
        assert_eq!(config.threads.color, [1.0, 1.0, 1.0]);
        assert_eq!(config.threads.amplitude, 1.0);
        assert_eq!(config.morph.pause, Duration::from_secs_f32(2.5));
        assert_eq!(config.morph.transition, Duration::from_secs_f32(3.5));
        assert_eq!(config.waitlist.poll_interval, Duration::from_secs(10));
        assert!(config.endpoint().is_none());
    }

    #[test]
    fn fractional_seconds_are_accepted() {
        let config = SiteConfig::from_toml_str(
            r#"
version = 1

[morph]
pause = 0.5
transition = "750ms"
"#,
        )
        .unwrap();
        assert_eq!(config.morph.pause, Duration::from_millis(500));
        assert_eq!(config.morph.transition, Duration::from_millis(750));
    }

    #[test]
    fn blank_endpoint_counts_as_missing() {
        let config = SiteConfig::from_toml_str(
            r#"
version = 1

[waitlist]
endpoint = "   "
"#,
        )
        .unwrap();
        assert!(config.endpoint().is_none());
    }

    #[test]
    fn rejects_zero_transition() {
        let err = SiteConfig::from_toml_str(
            r#"
version = 1

[morph]
transition = 0
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_out_of_range_color() {
        let err = SiteConfig::from_toml_str(
            r#"
version = 1

[threads]
color = [1.0, 2.0, 0.0]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_version() {
        let err = SiteConfig::from_toml_str("version = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn parses_preset_aliases() {
        assert_eq!(PresetName::parse("Threads"), Ok(PresetName::Morph));
        assert_eq!(PresetName::parse("logo"), Ok(PresetName::Heartbeat));
        assert!(PresetName::parse("sparkle").is_err());
    }
}
