//! tonematch - Ear-training tone engine
//!
//! Plays a fixed six-note arpeggio through a chain of effects (distortion,
//! tremolo, vibrato, feedback delay) whose settings come from five continuous
//! controls. Each play builds a fresh graph, runs for a fixed duration, and
//! reports completion exactly once.

pub mod config;
pub mod effects;
pub mod engine;
pub mod error;
pub mod params;
pub mod synth;

pub use config::TonematchConfig;
pub use engine::{MonitorTap, ToneEngine};
pub use error::EngineError;
pub use params::{Effect, EffectParams};
