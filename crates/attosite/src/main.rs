mod cli;
mod paths;
mod run;
mod settings;

use std::fs;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use cli::{Command, ConfigAction, LogoArgs, SignupArgs, SnapshotArgs, WaitlistArgs};
use paths::AppPaths;
use renderer::{export_png, logo_svg, StillRequest};
use settings::Settings;
use waitlist::{
    format_digits, CountSource, CounterDisplay, CounterPoller, SignupForm, SignupSession,
    SubmitError, WaitlistClient, WaitlistCounter,
};

/// Odometer step while watching the counter.
const ODOMETER_TICK: Duration = Duration::from_millis(33);

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    let paths = AppPaths::discover()?;
    let settings = Settings::load(&paths, &cli.global)?;

    match cli.command {
        Some(Command::Snapshot(args)) => run_snapshot(settings, args),
        Some(Command::Logo(args)) => run_logo(&settings, args),
        Some(Command::Signup(args)) => run_signup(&settings, args),
        Some(Command::Waitlist(args)) => run_waitlist(&settings, args),
        Some(Command::Config { action }) => match action {
            ConfigAction::Where => run_config_where(&paths, &settings),
        },
        None => run::run(cli.run, settings),
    }
}

fn run_snapshot(mut settings: Settings, args: SnapshotArgs) -> Result<()> {
    settings.apply_visual(&args.visual)?;
    let (width, height) = args.size;
    let request = StillRequest {
        width,
        height,
        time: args.time,
        props: settings.props(),
        schedule: settings.schedule()?,
    };
    export_png(&request, &args.output)?;
    println!("Wrote {}x{} frame to {}", width, height, args.output.display());
    Ok(())
}

fn run_logo(settings: &Settings, args: LogoArgs) -> Result<()> {
    let color = args.color.unwrap_or(settings.config.threads.color);
    let svg = logo_svg(color);
    match args.output {
        Some(path) => {
            fs::write(&path, svg)
                .with_context(|| format!("failed to write logo to {}", path.display()))?;
            println!("Wrote logo to {}", path.display());
        }
        None => print!("{svg}"),
    }
    Ok(())
}

fn run_signup(settings: &Settings, args: SignupArgs) -> Result<()> {
    let form = SignupForm {
        first_name: args.first_name,
        last_name: args.last_name,
        email: args.email,
        country_code: args.country,
        phone: args.phone,
        platform: args.os,
    };
    if let Err(err) = form.validate() {
        bail!("signup rejected: {err}");
    }
    let client = WaitlistClient::new(settings.endpoint())?;

    let mut seeded = WaitlistCounter::new(settings.config.waitlist.increment);
    seeded.apply_fetch(client.fetch_count());
    let counter = Arc::new(Mutex::new(seeded));
    let on_success = Arc::clone(&counter);
    let mut session = SignupSession::new(form).with_on_success(move || {
        if let Ok(mut counter) = on_success.lock() {
            counter.record_signup();
        }
        println!("You're on the list.");
    });
    match session.submit(&client) {
        Ok(()) => {
            let shown = counter.lock().ok().and_then(|counter| counter.display_count());
            if let Some(count) = shown {
                println!("{count} on the waitlist");
            }
            Ok(())
        }
        Err(SubmitError::Form(err)) => bail!("signup rejected: {err}"),
        Err(err) => Err(anyhow::Error::new(err).context("signup failed; please try again")),
    }
}

fn run_waitlist(settings: &Settings, args: WaitlistArgs) -> Result<()> {
    let client = WaitlistClient::new(settings.endpoint())?;
    let mut counter = WaitlistCounter::new(settings.config.waitlist.increment);

    if !args.watch {
        let count = client
            .fetch_count()
            .context("failed to fetch waitlist count")?;
        counter.apply_fetch(Ok(count));
        print_count(&counter);
        return Ok(());
    }

    if client.endpoint().is_none() {
        return Err(waitlist::WaitlistError::MissingEndpoint.into());
    }
    let interval: Duration = args
        .interval
        .unwrap_or(settings.config.waitlist.poll_interval);
    let poller = CounterPoller::spawn(client, interval).context("failed to start poller")?;
    let mut display = CounterDisplay::new(counter);
    let mut last_tick = Instant::now();
    while display.wait(&poller, ODOMETER_TICK).is_ok() {
        let now = Instant::now();
        let settled = display.tick(now.duration_since(last_tick).as_secs_f64());
        last_tick = now;
        if let (Some(digits), Some(count)) = (settled, display.counter().display_count()) {
            println!("{} ({count} on the waitlist)", format_digits(digits));
        }
    }
    Ok(())
}

fn print_count(counter: &WaitlistCounter) {
    match (counter.display_count(), counter.digits()) {
        (Some(count), Some(digits)) => {
            println!("{} ({count} on the waitlist)", format_digits(digits));
        }
        _ => println!("----"),
    }
}

fn run_config_where(paths: &AppPaths, settings: &Settings) -> Result<()> {
    let file = paths.config_file();
    println!("Configuration:");
    println!("  config dir: {}", paths.config_dir().display());
    println!(
        "  config file: {} ({})",
        file.display(),
        if file.is_file() { "present" } else { "missing" }
    );
    if let Some(source) = &settings.source {
        println!("  loaded from: {}", source.display());
    }
    match settings.endpoint() {
        Some(endpoint) => println!("  endpoint: {endpoint}"),
        None => println!("  endpoint: (not configured; waitlist features disabled)"),
    }
    Ok(())
}
