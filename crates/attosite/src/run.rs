use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use renderer::{morph_channel, RenderPolicy, RendererConfig, WindowRuntime};
use scheduler::{logo_opacity, ModeTracker};
use tracing_subscriber::EnvFilter;
use waitlist::{format_digits, CounterDisplay, CounterPoller, WaitlistClient, WaitlistCounter};

use crate::cli::RunArgs;
use crate::settings::Settings;

/// Loop period while waiting on morph samples; also the odometer step.
const TICK: Duration = Duration::from_millis(33);

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run(args: RunArgs, mut settings: Settings) -> Result<()> {
    settings.apply_visual(&args.visual)?;
    let schedule = settings.schedule()?;
    let policy = match args.still_time {
        Some(time) => RenderPolicy::Still { time },
        None => RenderPolicy::Animate,
    };
    let mut config = RendererConfig {
        props: settings.props(),
        schedule,
        policy,
        ..RendererConfig::default()
    };
    if let Some(size) = args.size {
        config.surface_size = size;
    }

    let mut poller = if args.counter {
        start_counter(&settings)?
    } else {
        None
    };
    let mut display = CounterDisplay::new(WaitlistCounter::new(settings.config.waitlist.increment));

    tracing::info!(
        preset = %settings.config.threads.preset,
        morph = config.props.morph,
        mouse = config.props.mouse_interaction,
        size = ?config.surface_size,
        "starting atto sound hero"
    );
    let (publisher, subscriber) = morph_channel();
    let runtime = WindowRuntime::spawn(config, Some(publisher))
        .context("failed to start hero window")?;

    let mut tracker = ModeTracker::new();
    let mut last_tick = Instant::now();
    while !runtime.is_finished() {
        if let Some(sample) = subscriber.recv_timeout(TICK) {
            if let Some(mode) = tracker.observe(schedule.mode_at(sample.time)) {
                tracing::info!(
                    mode = mode.label(),
                    logo_opacity = logo_opacity(sample.progress),
                    "hero mode changed"
                );
            }
        }
        let now = Instant::now();
        let dt = now.duration_since(last_tick).as_secs_f64();
        last_tick = now;
        if let Some(active) = poller.as_ref() {
            match display.drain(active) {
                Ok(true) => {
                    let count = display.counter().display_count();
                    tracing::debug!(count = ?count, "waitlist count updated")
                }
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(error = %err, "waitlist counter hidden");
                    poller = None;
                    continue;
                }
            }
            if let Some(digits) = display.tick(dt) {
                let count = display.counter().display_count();
                tracing::info!(
                    count = ?count,
                    digits = %format_digits(digits),
                    "waitlist odometer settled"
                );
            }
        }
    }

    drop(poller);
    runtime.join()
}

fn start_counter(settings: &Settings) -> Result<Option<CounterPoller>> {
    let Some(endpoint) = settings.endpoint() else {
        tracing::warn!("--counter requested but no waitlist endpoint configured; counter hidden");
        return Ok(None);
    };
    let client = WaitlistClient::new(Some(endpoint)).context("invalid waitlist endpoint")?;
    let poller = CounterPoller::spawn(client, settings.config.waitlist.poll_interval)
        .context("failed to start waitlist counter")?;
    Ok(Some(poller))
}
