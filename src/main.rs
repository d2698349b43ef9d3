//! emuhost CLI - drives the test tone emulator through the host

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::{bounded, Receiver};
use std::thread;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use emuhost::audio::{AudioDriver, PacedDriver};
use emuhost::clock::FrameTimer;
use emuhost::config::{Args, Command, HostInit, HostSettings};
use emuhost::hooks::TracingHooks;
use emuhost::input::{InputEvent, Key};
use emuhost::tone::ToneEmulator;
use emuhost::video::HeadlessDisplay;
use emuhost::{Host, RunStats};

/// Longest wall-clock step handed to the run loop
const MAX_DELTA_MS: f64 = 100.0;

fn main() -> Result<()> {
    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => HostSettings::load(path)?,
        None => HostSettings::load_default()?,
    };

    init_logging(&args, &settings)?;

    match args.command.unwrap_or_default() {
        Command::Run {
            seconds,
            frames,
            tone,
            pause_at,
            native,
        } => {
            let mut init = settings.to_host_init();
            if let Some(frames) = frames {
                init.audio_frames = frames;
            }
            let options = RunOptions {
                seconds,
                tone,
                pause_at,
            };
            cmd_run(init, options, native)
        }
        Command::Config => {
            print!("{}", HostSettings::sample_config());
            Ok(())
        }
    }
}

fn init_logging(args: &Args, settings: &HostSettings) -> Result<()> {
    let level = if args.verbose == 0 && !args.quiet {
        settings.log_level.clone()
    } else {
        args.log_level().to_string()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let log_file = args
        .log
        .clone()
        .or_else(|| (!settings.log_file.is_empty()).then(|| settings.log_file.clone()));

    if let Some(log_file) = log_file {
        let file = std::fs::File::create(&log_file)
            .with_context(|| format!("Failed to create log file '{}'", log_file))?;
        subscriber.with_writer(file).with_ansi(false).init();
    } else {
        subscriber.init();
    }

    Ok(())
}

struct RunOptions {
    seconds: Option<f64>,
    tone: f64,
    pause_at: Option<f64>,
}

/// Run the test tone emulator until the time limit or Ctrl+C
fn cmd_run(init: HostInit, options: RunOptions, native: bool) -> Result<()> {
    let (stop_tx, stop_rx) = bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = stop_tx.try_send(());
    })
    .context("Failed to install Ctrl+C handler")?;

    if native {
        #[cfg(feature = "cpal")]
        {
            return run_host(init, &options, &mut emuhost::audio::cpal::CpalDriver, stop_rx);
        }
        #[cfg(not(feature = "cpal"))]
        {
            anyhow::bail!("native audio requires building with the \"cpal\" feature");
        }
    }

    run_host(init, &options, &mut PacedDriver::default(), stop_rx)
}

fn run_host<A: AudioDriver>(
    init: HostInit,
    options: &RunOptions,
    driver: &mut A,
    stop_rx: Receiver<()>,
) -> Result<()> {
    let emulator = ToneEmulator::new(
        init.cycles_per_second,
        init.audio_frequency,
        init.audio_frames as usize,
        options.tone,
    );

    let mut host = match Host::new(
        init,
        emulator,
        driver,
        HeadlessDisplay::default(),
        TracingHooks::default(),
    ) {
        Ok(host) => host,
        Err(e) => {
            error!("Failed to start host: {}", e);
            return Err(e.into());
        }
    };

    if let Some((width, height)) = host.display().window_size() {
        info!("Headless window {}x{}", width, height);
    }
    info!("Running. Press Ctrl+C to stop.");

    let refresh_ms = host.monitor_refresh_ms();
    let mut timer = FrameTimer::new(MAX_DELTA_MS);
    let mut totals = RunStats::default();
    let mut pause_toggles = options
        .pause_at
        .map(|at| vec![(at + 1.0) * 1000.0, at * 1000.0])
        .unwrap_or_default();

    loop {
        if stop_rx.try_recv().is_ok() {
            info!("Received Ctrl+C, stopping...");
            break;
        }

        let now_ms = host.time_ms();
        if options.seconds.is_some_and(|limit| now_ms >= limit * 1000.0) {
            break;
        }

        let mut events = Vec::new();
        if pause_toggles.last().is_some_and(|&at| now_ms >= at) {
            pause_toggles.pop();
            events.push(InputEvent::KeyDown(Key::Space));
            events.push(InputEvent::KeyUp(Key::Space));
        }
        if !host.handle_input(events) {
            break;
        }

        let stats = host.run_ms(timer.tick());
        totals.frames += stats.frames;
        totals.audio_queued += stats.audio_queued;
        totals.audio_dropped += stats.audio_dropped;

        thread::sleep(timer.remaining(refresh_ms));
    }

    info!(
        "Stopped after {:.1}s: {} frames, {} audio buffers queued, {} dropped, playback started {} times",
        host.time_ms() / 1000.0,
        totals.frames,
        totals.audio_queued,
        totals.audio_dropped,
        host.hooks().ready_count
    );

    Ok(())
}
