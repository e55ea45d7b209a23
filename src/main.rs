//! Gesture Driver - servo gesture emulation engine
//!
//! Drives two servos through human-like gesture sequences, chosen either
//! manually over stdin or autonomously by a semi-Markov process.

use gesture_driver::app::cli::{Cli, Commands, ConfigAction};
use gesture_driver::app::config::Config;
use gesture_driver::control::arbiter::Arbiter;
use gesture_driver::gesture::steps::GestureKind;
use gesture_driver::hal::sim::{SimPotBank, SimServoBank};
use gesture_driver::time::clock::{Clock, MonotonicClock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first so we can use --verbose to set log level
    let cli = Cli::parse_args();

    // Initialize tracing (--verbose enables debug-level output)
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // Load config
    let config = if let Some(path) = &cli.config {
        Config::load(path)?
    } else {
        Config::load_default()?
    };

    match cli.command {
        Commands::Run {
            autonomous,
            seed,
            duration,
        } => run_loop(autonomous, seed, duration, &config)?,
        Commands::Validate { config_file } => {
            Config::load(&config_file)?;
            println!("Validation PASSED: {}", config_file.display());
        }
        Commands::Init { force } => run_init(force, &config)?,
        Commands::Config { action } => run_config(action, &config)?,
    }

    Ok(())
}

fn run_loop(autonomous: bool, seed: Option<u64>, duration: u64, config: &Config) -> anyhow::Result<()> {
    let seed = seed.unwrap_or(config.control.seed);
    info!(seed, tick_ms = config.control.tick_interval_ms, "starting control loop");

    let mut arbiter = Arbiter::new(config.gestures.clone(), config.smm, seed);

    // No hardware layer in this build: loopback servos and centered pots.
    let mut servos = SimServoBank::new();
    let pots = SimPotBank::centered();
    let clock = MonotonicClock::new();

    print_banner();

    if autonomous {
        arbiter.set_autonomous(true, clock.now_ms());
    }

    // Stdin commands arrive over a channel so the loop never blocks.
    let (tx, rx) = mpsc::channel::<char>();
    std::thread::spawn(move || {
        let mut line = String::new();
        loop {
            line.clear();
            if std::io::stdin().read_line(&mut line).is_err() {
                break;
            }
            for c in line.trim().chars() {
                if tx.send(c).is_err() {
                    return;
                }
            }
        }
    });

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_handler = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_handler.store(true, Ordering::SeqCst);
    })?;

    let started = std::time::Instant::now();

    loop {
        if stop_flag.load(Ordering::SeqCst) {
            break;
        }
        if duration > 0 && started.elapsed().as_secs() >= duration {
            break;
        }

        let now = clock.now_ms();

        // Commands are processed synchronously at the top of a tick.
        let mut quit = false;
        for c in rx.try_iter() {
            match c.to_ascii_lowercase() {
                's' => arbiter.request_gesture(GestureKind::Scroll),
                'l' => arbiter.request_gesture(GestureKind::Like),
                'd' => arbiter.request_gesture(GestureKind::Dubious),
                'm' => {
                    let enable = !arbiter.autonomous();
                    arbiter.set_autonomous(enable, now);
                }
                'r' => arbiter.reset(now),
                'q' => quit = true,
                other => warn!(command = %other, "unknown command"),
            }
        }
        if quit {
            break;
        }

        arbiter.tick(now, &mut servos, &pots);

        std::thread::sleep(std::time::Duration::from_millis(
            config.control.tick_interval_ms,
        ));
    }

    let (y, z) = arbiter.pose();
    info!(
        elapsed_secs = format_args!("{:.1}", started.elapsed().as_secs_f64()),
        events = arbiter.smm().event_count(),
        final_y = y,
        final_z = z,
        "control loop stopped"
    );

    Ok(())
}

fn print_banner() {
    println!("=================================");
    println!("Gesture Driver");
    println!("=================================");
    println!("Commands (newline-terminated):");
    println!("  s - start Scroll gesture");
    println!("  l - start Like gesture");
    println!("  d - start Dubious gesture");
    println!("  m - toggle semi-Markov mode");
    println!("  r - reset and enable knobs");
    println!("  q - quit");
    println!("=================================");
}

fn run_init(force: bool, config: &Config) -> anyhow::Result<()> {
    let config_path = Config::default_path();

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {:?}. Use --force to overwrite.",
            config_path
        );
    }

    config.save_default()?;
    println!("Created config at {:?}", config_path);
    println!("\nConfig content:\n{}", config.to_toml()?);

    Ok(())
}

fn run_config(action: ConfigAction, config: &Config) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            println!("Configuration ({:?}):\n", Config::default_path());
            println!("{}", config.to_toml()?);
        }
        ConfigAction::Reset { force } => {
            let config_path = Config::default_path();

            if config_path.exists() && !force {
                println!("Config exists at {:?}", config_path);
                println!("Use --force to reset to defaults");
                return Ok(());
            }

            Config::default().save_default()?;
            println!("Configuration reset to defaults at {:?}", config_path);
        }
    }

    Ok(())
}
