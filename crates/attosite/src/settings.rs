use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use renderer::ThreadsProps;
use scheduler::MorphSchedule;
use siteconfig::SiteConfig;
use tracing::debug;

use crate::cli::{GlobalArgs, VisualArgs};
use crate::paths::AppPaths;

/// Configuration after the file and command-line flags have been merged.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: SiteConfig,
    pub source: Option<PathBuf>,
}

impl Settings {
    /// Loads the explicit `--config` file, or the user config file when it
    /// exists, or built-in defaults.
    pub fn load(paths: &AppPaths, global: &GlobalArgs) -> Result<Self> {
        let (mut config, source) = match global.config.as_deref() {
            Some(path) => (read_config(path)?, Some(path.to_path_buf())),
            None => {
                let path = paths.config_file();
                if path.is_file() {
                    (read_config(&path)?, Some(path))
                } else {
                    debug!(path = %path.display(), "no config file; using defaults");
                    (SiteConfig::default(), None)
                }
            }
        };

        if let Some(endpoint) = global.endpoint.as_ref() {
            config.waitlist.endpoint = Some(endpoint.clone());
        }
        config
            .validate()
            .context("invalid settings after applying command-line overrides")?;

        Ok(Self { config, source })
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.config.endpoint()
    }

    pub fn apply_visual(&mut self, visual: &VisualArgs) -> Result<()> {
        let threads = &mut self.config.threads;
        if let Some(color) = visual.color {
            threads.color = color;
        }
        if let Some(amplitude) = visual.amplitude {
            threads.amplitude = amplitude;
        }
        if let Some(distance) = visual.distance {
            threads.distance = distance;
        }
        if let Some(preset) = visual.preset {
            threads.preset = preset;
        }
        if visual.no_mouse {
            threads.mouse = false;
        }
        if visual.no_morph {
            threads.morph = false;
        }
        if let Some(pause) = visual.pause {
            self.config.morph.pause = seconds(pause, "pause")?;
        }
        if let Some(transition) = visual.transition {
            self.config.morph.transition = seconds(transition, "transition")?;
        }
        self.config
            .validate()
            .context("invalid visual overrides")?;
        Ok(())
    }

    pub fn props(&self) -> ThreadsProps {
        ThreadsProps::from_config(&self.config.threads)
    }

    pub fn schedule(&self) -> Result<MorphSchedule> {
        MorphSchedule::from_config(&self.config.morph).context("invalid morph timing")
    }
}

fn read_config(path: &Path) -> Result<SiteConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config = SiteConfig::from_toml_str(&raw)
        .with_context(|| format!("failed to load config file {}", path.display()))?;
    debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

fn seconds(value: f64, field: &str) -> Result<std::time::Duration> {
    std::time::Duration::try_from_secs_f64(value)
        .with_context(|| format!("morph {field} must be a non-negative number of seconds"))
}
