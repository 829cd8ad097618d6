//! CLI interface for tonematch

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tonematch::{Effect, EffectParams};

/// Play a fixed arpeggio through a parameterized effects chain
#[derive(Parser)]
#[command(name = "tonematch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play one session on the output device
    Play {
        /// Configuration file path
        #[arg(short, long, default_value = "tonematch.yaml")]
        config: PathBuf,

        #[command(flatten)]
        params: ParamArgs,

        /// Print the dominant frequency from the monitor tap while playing
        #[arg(short, long)]
        monitor: bool,
    },

    /// Render one session to a WAV file
    Render {
        /// Configuration file path
        #[arg(short, long, default_value = "tonematch.yaml")]
        config: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        params: ParamArgs,
    },

    /// List available output devices
    Devices,

    /// Validate a configuration file
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "tonematch.yaml")]
        config: PathBuf,
    },

    /// Generate an example configuration file
    Init,
}

/// Effect parameter overrides, each in [0, 1]
#[derive(Args, Debug, Default)]
pub struct ParamArgs {
    /// Waveshaper drive
    #[arg(long)]
    pub distortion: Option<f64>,

    /// Tremolo depth
    #[arg(long)]
    pub tremolo: Option<f64>,

    /// Vibrato depth
    #[arg(long)]
    pub vibrato: Option<f64>,

    /// Echo delay time
    #[arg(long)]
    pub delay_time: Option<f64>,

    /// Echo feedback
    #[arg(long)]
    pub delay_feedback: Option<f64>,
}

impl ParamArgs {
    /// Apply the overrides on top of `base`
    pub fn apply(&self, base: EffectParams) -> EffectParams {
        [
            (Effect::Distortion, self.distortion),
            (Effect::TremoloDepth, self.tremolo),
            (Effect::VibratoDepth, self.vibrato),
            (Effect::DelayTime, self.delay_time),
            (Effect::DelayFeedback, self.delay_feedback),
        ]
        .into_iter()
        .fold(base, |params, (effect, value)| match value {
            Some(value) => params.with(effect, value),
            None => params,
        })
    }
}
