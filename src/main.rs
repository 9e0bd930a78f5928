use anyhow::{Context, Result};
use audiocheck::{AudioBackend, AudioCheck, AudioMeter, Config, CpalBackend};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::{Level, info, warn};

/// Microphone and speaker check
#[derive(Parser, Debug)]
#[command(name = "audiocheck", version)]
struct Args {
    /// JSON file overriding the default tunables
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List capture and output devices
    Devices,
    /// Live level meter on a capture device
    Meter {
        #[arg(long)]
        device: Option<String>,
        /// Stop after this many seconds, runs until Ctrl-C otherwise
        #[arg(long)]
        seconds: Option<f32>,
        /// Print one JSON snapshot per tick instead of the meter line
        #[arg(long)]
        json: bool,
    },
    /// Steady tone on one or both speakers
    Tone {
        #[arg(value_enum)]
        channel: Channel,
        #[arg(long)]
        freq: Option<f32>,
        #[arg(long, default_value_t = 2.0)]
        seconds: f32,
        #[arg(long)]
        device: Option<String>,
    },
    /// Frequency sweep panned from left to right
    Sweep {
        #[arg(long)]
        device: Option<String>,
    },
    /// Tone alternating between left and right
    Alternate {
        #[arg(long)]
        interval_ms: Option<u64>,
        #[arg(long, default_value_t = 4.0)]
        seconds: f32,
        #[arg(long)]
        device: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Channel {
    Left,
    Right,
    Both,
}

impl Channel {
    fn gains(self) -> (f32, f32) {
        match self {
            Channel::Left => (1.0, 0.0),
            Channel::Right => (0.0, 1.0),
            Channel::Both => (1.0, 1.0),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so the meter line owns stdout
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };

    let mut check = AudioCheck::new(Box::new(CpalBackend::new()), config)?;
    let result = run(&mut check, args.command).await;
    if let Some(summary) = check.shutdown() {
        summary.print_summary();
    }
    result
}

async fn run(check: &mut AudioCheck, command: Command) -> Result<()> {
    match command {
        Command::Devices => list_devices(check.backend()),
        Command::Meter {
            device,
            seconds,
            json,
        } => run_meter(check, device.as_deref(), seconds, json).await,
        Command::Tone {
            channel,
            freq,
            seconds,
            device,
        } => {
            check.set_output_device(device.as_deref());
            let (left, right) = channel.gains();
            let freq = freq.unwrap_or(check.config().tone.frequency_hz);
            check
                .play_tone(left, right, freq, Instant::now())
                .context("starting tone")?;
            println!("Playing {} Hz on {:?} for {:.1}s", freq, channel, seconds);
            run_tone(check, Some(seconds)).await
        }
        Command::Sweep { device } => {
            check.set_output_device(device.as_deref());
            check.start_sweep(Instant::now()).context("starting sweep")?;
            let tone = &check.config().tone;
            println!(
                "Sweeping {} Hz -> {} Hz, left -> right",
                tone.sweep_start_hz, tone.sweep_end_hz
            );
            run_tone(check, None).await
        }
        Command::Alternate {
            interval_ms,
            seconds,
            device,
        } => {
            check.set_output_device(device.as_deref());
            let interval_ms = interval_ms.unwrap_or(check.config().tone.alternate_interval_ms);
            check
                .start_alternate(interval_ms, Instant::now())
                .context("starting alternate tone")?;
            println!("Alternating left/right every {} ms", interval_ms);
            run_tone(check, Some(seconds)).await
        }
    }
}

fn list_devices(backend: &dyn AudioBackend) -> Result<()> {
    println!("Input devices:");
    for device in backend.input_devices()? {
        device.print_summary();
    }
    println!("Output devices:");
    for device in backend.output_devices()? {
        device.print_summary();
    }
    Ok(())
}

async fn run_meter(
    check: &mut AudioCheck,
    device: Option<&str>,
    seconds: Option<f32>,
    json: bool,
) -> Result<()> {
    let started = Instant::now();
    check
        .start_metering(device, started)
        .context("starting microphone test")?;
    let deadline = seconds.map(|s| started + Duration::from_secs_f32(s.max(0.0)));

    let mut meter = AudioMeter::new();
    let mut ticker = interval(check.config().meter.tick_interval());
    info!("Audio monitoring is LIVE");

    let outcome = loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => break Ok(()),
        }
        let now = Instant::now();
        if deadline.is_some_and(|deadline| now >= deadline) {
            break Ok(());
        }
        match check.tick(now) {
            Ok(Some(snapshot)) if json => println!("{}", serde_json::to_string(&snapshot)?),
            Ok(Some(snapshot)) => meter.display(&snapshot)?,
            Ok(None) => {}
            Err(e) => break Err(e),
        }
    };

    meter.finish()?;
    if let Err(e) = outcome {
        warn!("metering ended: {}", e);
        return Err(e.into());
    }
    Ok(())
}

/// Keep the tone alive until it ends, the time limit passes, or Ctrl-C.
async fn run_tone(check: &mut AudioCheck, seconds: Option<f32>) -> Result<()> {
    let started = Instant::now();
    let deadline = seconds.map(|s| started + Duration::from_secs_f32(s.max(0.0)));
    let mut ticker = interval(check.config().meter.tick_interval());

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }
        let now = Instant::now();
        if check.poll_tones(now) || !check.tones().is_active() {
            info!("tone finished");
            break;
        }
        if deadline.is_some_and(|deadline| now >= deadline) {
            break;
        }
    }
    check.stop_tone();
    Ok(())
}
