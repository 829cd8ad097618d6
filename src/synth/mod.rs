//! Synthesis primitives
//!
//! Contains oscillators, LFOs, note envelopes, and voice implementations.

mod oscillator;
mod lfo;
mod voice;
mod envelope;

pub use oscillator::{detune_ratio, Oscillator, Waveform};
pub use lfo::Lfo;
pub use voice::{NoteVoice, Voice};
pub use envelope::{EnvelopeStage, NoteEnvelope, FLOOR as ENVELOPE_FLOOR};
