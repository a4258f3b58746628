#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions)]
//! Controller binary: stdin commands in, stdout telemetry/replies out.

mod cli;
mod error_fmt;

use std::io::{self, BufReader};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use eyre::{Result, WrapErr};
use ramen_config::Config;
use ramen_core::{CommandLink, Machine};
use ramen_traits::{Clock, Hal, MonotonicClock};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() {
    let args = cli::Cli::parse();
    let _ = color_eyre::install();

    match run(&args) {
        Ok(()) => {}
        Err(err) => {
            if args.json {
                eprintln!("{}", error_fmt::format_error_json(&err));
            } else {
                eprintln!("{}", error_fmt::humanize(&err));
            }
            std::process::exit(1);
        }
    }
}

fn init_tracing(args: &cli::Cli, cfg: &Config) {
    let level = args
        .log_level
        .clone()
        .or_else(|| cfg.logging.level.clone())
        .unwrap_or_else(|| "info".to_owned());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr; stdout is the wire.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if args.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(args: &cli::Cli) -> Result<Config> {
    let mut cfg = if args.config.exists() {
        Config::load(&args.config)?
    } else {
        Config::default()
    };
    if let Some(ms) = args.tick_ms {
        cfg.engine.tick_ms = ms;
    }
    cfg.validate().wrap_err("invalid engine tunables")?;
    Ok(cfg)
}

fn build_hal() -> Result<Arc<dyn Hal>> {
    #[cfg(feature = "hardware")]
    {
        let hal = ramen_hardware::rpi::GpioHal::new().wrap_err("open gpio")?;
        Ok(Arc::new(hal))
    }
    #[cfg(not(feature = "hardware"))]
    {
        Ok(Arc::new(ramen_hardware::SimulatedHal::new()))
    }
}

fn run(args: &cli::Cli) -> Result<()> {
    let cfg = load_config(args)?;
    init_tracing(args, &cfg);
    if !args.config.exists() {
        info!(path = %args.config.display(), "config file not found, using defaults");
    }

    let hal = build_hal()?;
    let clock = Arc::new(MonotonicClock::new());
    let mut machine = Machine::new(hal, clock.clone(), cfg.pins, cfg.engine);

    if args.no_encoder {
        info!("encoder disabled by flag");
    } else if let Err(e) = machine.attach_encoder() {
        // A dead encoder costs the lift angle, not the machine.
        warn!(error = %e, "encoder setup failed, continuing without it");
    }

    let stop = Arc::new(AtomicBool::new(false));
    let stop_handler = stop.clone();
    ctrlc::set_handler(move || {
        stop_handler.store(true, Ordering::Relaxed);
    })
    .wrap_err("install signal handler")?;

    let link = CommandLink::spawn(BufReader::new(io::stdin()));
    let tick = Duration::from_millis(machine.tick_ms());
    let mut remaining = args.ticks;

    info!(tick_ms = machine.tick_ms(), "controller running");
    while !stop.load(Ordering::Relaxed) {
        while let Some(line) = link.poll() {
            for reply in machine.handle_line(&line)? {
                println!("{reply}");
            }
        }

        if let Some(line) = machine.tick()? {
            println!("{line}");
        }

        if let Some(n) = remaining.as_mut() {
            *n = n.saturating_sub(1);
            if *n == 0 {
                break;
            }
        }
        clock.sleep(tick);
    }

    machine.stop_all()?;
    info!("controller stopped");
    Ok(())
}
