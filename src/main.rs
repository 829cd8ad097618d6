//! tonematch - Ear-training tone engine

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;
use tonematch::config;
use tonematch::engine::{self, ToneEngine};
use tonematch::{Effect, EffectParams};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Commands};

/// How often the monitor line is refreshed while playing
const MONITOR_INTERVAL: Duration = Duration::from_millis(100);

enum Event {
    Finished,
    Interrupted,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Play {
            config: config_path,
            params,
            monitor,
        } => {
            let cfg = config::load_or_default(&config_path)?;
            let params = params.apply(cfg.params);
            print_params(&params);

            let mut engine = ToneEngine::with_output_device(cfg);
            engine.initialize();
            if engine.is_inert() {
                bail!("no audio output available");
            }

            let (tx, rx) = mpsc::channel();
            let interrupt = tx.clone();
            ctrlc::set_handler(move || {
                let _ = interrupt.send(Event::Interrupted);
            })
            .context("failed to install Ctrl-C handler")?;

            engine.play(params, move || {
                let _ = tx.send(Event::Finished);
            });

            let tap = engine.monitor_tap();
            loop {
                match rx.recv_timeout(MONITOR_INTERVAL) {
                    Ok(Event::Finished) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                    Ok(Event::Interrupted) => {
                        info!("interrupted; stopping session");
                        engine.stop();
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        if !monitor {
                            continue;
                        }
                        let time = engine.current_time().unwrap_or_default();
                        match tap.as_ref().and_then(|tap| tap.dominant_frequency()) {
                            Some(freq) => println!("  {:5.2}s  {:7.1} Hz", time, freq),
                            None => println!("  {:5.2}s        -", time),
                        }
                    }
                }
            }

            println!("Done.");
        }

        Commands::Render {
            config: config_path,
            output,
            params,
        } => {
            let cfg = config::load_or_default(&config_path)?;
            let params = params.apply(cfg.params);
            print_params(&params);

            println!("Rendering to {:?}...", output);
            let summary = engine::render_to_wav(&cfg, params, &output)?;
            println!(
                "Rendered {:.2}s ({} samples at {} Hz) to {:?}",
                summary.duration_secs(),
                summary.samples,
                summary.sample_rate,
                output
            );
        }

        Commands::Devices => {
            println!("Available audio devices:\n");

            if let Some(name) = engine::default_device_name() {
                println!("Default output: {}\n", name);
            }

            println!("Output devices:");
            let devices = engine::list_output_devices();
            if devices.is_empty() {
                println!("  (none)");
            }
            for (name, config) in devices {
                println!(
                    "  - {} ({} Hz, {} ch)",
                    name, config.sample_rate.0, config.channels
                );
            }
        }

        Commands::Check { config: config_path } => {
            println!("Checking configuration at {:?}...", config_path);

            match config::load_config(&config_path) {
                Ok(cfg) => {
                    println!("Configuration is valid!");
                    println!("  Sample rate: {} Hz", cfg.audio.sample_rate);
                    println!("  Buffer size: {}", cfg.audio.buffer_size);
                    println!(
                        "  Device: {}",
                        cfg.audio.device.as_deref().unwrap_or("(default)")
                    );
                    println!("  Master volume: {:.0}%", cfg.engine.master_volume * 100.0);
                    println!("  Root: {} Hz", cfg.engine.root_frequency);
                    println!("  FFT size: {}", cfg.monitor.fft_size);
                    print_params(&cfg.params);
                }
                Err(e) => {
                    println!("Configuration is invalid: {:#}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Init => {
            let example_config = include_str!("../tonematch.example.yaml");

            let path = Path::new("tonematch.yaml");
            if path.exists() {
                println!("tonematch.yaml already exists. Not overwriting.");
            } else {
                std::fs::write(path, example_config)?;
                println!("Created tonematch.yaml with example configuration.");
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_params(params: &EffectParams) {
    println!("Effect parameters:");
    for effect in Effect::ALL {
        println!("  {:<18} {:.2}", effect.label(), params.get(effect));
    }
}
