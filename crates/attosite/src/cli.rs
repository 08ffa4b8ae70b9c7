use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use siteconfig::PresetName;
use waitlist::Platform;

#[derive(Parser, Debug)]
#[command(
    name = "attosite",
    author,
    version,
    about = "atto sound landing hero and waitlist tools",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Read settings from this TOML file instead of the user config file.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Waitlist webhook URL used for signups and the counter.
    #[arg(long, global = true, env = "ATTOSITE_ENDPOINT", value_name = "URL")]
    pub endpoint: Option<String>,
}

/// Overrides for the `[threads]` config section.
#[derive(Args, Debug, Clone, Default)]
pub struct VisualArgs {
    /// Thread colour as `#rrggbb` or `r,g,b` in 0.0-1.0.
    #[arg(long, value_name = "COLOR", value_parser = parse_color)]
    pub color: Option<[f32; 3]>,

    /// Noise amplitude applied to the threads.
    #[arg(long, value_name = "AMOUNT")]
    pub amplitude: Option<f32>,

    /// Vertical spread between neighbouring threads.
    #[arg(long, value_name = "AMOUNT")]
    pub distance: Option<f32>,

    /// `morph` (threads and logo) or `heartbeat` (pulsing logo).
    #[arg(long, value_name = "NAME", value_parser = PresetName::parse)]
    pub preset: Option<PresetName>,

    /// Ignore the pointer.
    #[arg(long)]
    pub no_mouse: bool,

    /// Hold the resting pose instead of cycling between logo and threads.
    #[arg(long)]
    pub no_morph: bool,

    /// Morph pause in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub pause: Option<f64>,

    /// Morph transition length in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub transition: Option<f64>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub visual: VisualArgs,

    /// Initial window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Freeze the animation at this timestamp (seconds).
    #[arg(long, value_name = "SECONDS")]
    pub still_time: Option<f64>,

    /// Poll the waitlist counter while the window is open.
    #[arg(long)]
    pub counter: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render one frame on the CPU and write it as PNG.
    Snapshot(SnapshotArgs),
    /// Write the static logo as SVG.
    Logo(LogoArgs),
    /// Submit a waitlist signup.
    Signup(SignupArgs),
    /// Show the current waitlist size.
    Waitlist(WaitlistArgs),
    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args, Debug)]
pub struct SnapshotArgs {
    #[arg(long, short, value_name = "PATH")]
    pub output: PathBuf,

    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size, default_value = "1280x720")]
    pub size: (u32, u32),

    /// Seconds into the animation.
    #[arg(long, value_name = "SECONDS", default_value_t = 0.0)]
    pub time: f64,

    #[command(flatten)]
    pub visual: VisualArgs,
}

#[derive(Args, Debug)]
pub struct LogoArgs {
    /// Destination file; prints to stdout when omitted.
    #[arg(long, short, value_name = "PATH")]
    pub output: Option<PathBuf>,

    #[arg(long, value_name = "COLOR", value_parser = parse_color)]
    pub color: Option<[f32; 3]>,
}

#[derive(Args, Debug)]
pub struct SignupArgs {
    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub last_name: String,
    #[arg(long)]
    pub email: String,
    /// Local number; spaces are ignored.
    #[arg(long)]
    pub phone: String,
    /// Dial code (`+44`) or country prefix (`UK`).
    #[arg(long, default_value = waitlist::DEFAULT_COUNTRY_CODE)]
    pub country: String,
    #[arg(long, value_name = "ios|android", value_parser = Platform::parse, default_value = "ios")]
    pub os: Platform,
}

#[derive(Args, Debug)]
pub struct WaitlistArgs {
    /// Keep polling and print every update.
    #[arg(long)]
    pub watch: bool,

    /// Polling interval for `--watch` (e.g. `10s`).
    #[arg(long, value_name = "DURATION", value_parser = humantime_duration)]
    pub interval: Option<std::time::Duration>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print where the config file is looked up.
    Where,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(raw: &str) -> Result<(u32, u32), String> {
    let (width, height) = raw
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{raw}'"))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width in '{raw}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height in '{raw}'"))?;
    if width == 0 || height == 0 {
        return Err(format!("size must be non-zero, got '{raw}'"));
    }
    Ok((width, height))
}

pub fn parse_color(raw: &str) -> Result<[f32; 3], String> {
    let trimmed = raw.trim();
    if let Some(hex) = trimmed.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(format!("expected #rrggbb, got '{raw}'"));
        }
        let mut color = [0.0f32; 3];
        for (index, slot) in color.iter_mut().enumerate() {
            let byte = u8::from_str_radix(&hex[index * 2..index * 2 + 2], 16)
                .map_err(|_| format!("invalid hex colour '{raw}'"))?;
            *slot = f32::from(byte) / 255.0;
        }
        return Ok(color);
    }

    let parts: Vec<&str> = trimmed.split(',').map(str::trim).collect();
    let [r, g, b] = parts.as_slice() else {
        return Err(format!("expected #rrggbb or r,g,b, got '{raw}'"));
    };
    let mut color = [0.0f32; 3];
    for (slot, part) in color.iter_mut().zip([r, g, b]) {
        let value: f32 = part
            .parse()
            .map_err(|_| format!("invalid colour component '{part}'"))?;
        if !(0.0..=1.0).contains(&value) {
            return Err(format!("colour component {value} outside 0.0-1.0"));
        }
        *slot = value;
    }
    Ok(color)
}

fn humantime_duration(raw: &str) -> Result<std::time::Duration, String> {
    let duration = humantime::parse_duration(raw.trim()).map_err(|err| err.to_string())?;
    if duration.is_zero() {
        return Err("interval must be greater than zero".into());
    }
    Ok(duration)
}
