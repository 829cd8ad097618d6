//! Playback session
//!
//! Everything one `play` call creates: the effect graph with its voices and
//! LFOs, the auto-stop deadline, and the completion callback. Teardown goes
//! through [`PlaybackSession::finish`] whether the deadline passed or the
//! session was stopped early, so both paths halt the same set of nodes.

use super::graph::{EffectGraph, Topology};

/// Callback fired once when a session ends
pub type OnComplete = Box<dyn FnOnce() + Send + 'static>;

/// One play-through of the phrase
pub struct PlaybackSession {
    id: u64,
    graph: EffectGraph,
    started_at: u64,
    deadline: u64,
    on_complete: Option<OnComplete>,
}

impl PlaybackSession {
    /// Create a session
    ///
    /// # Arguments
    /// * `started_at` - Frame of the first note
    /// * `deadline` - Frame at which the session tears itself down
    pub fn new(
        id: u64,
        graph: EffectGraph,
        started_at: u64,
        deadline: u64,
        on_complete: OnComplete,
    ) -> Self {
        Self {
            id,
            graph,
            started_at,
            deadline,
            on_complete: Some(on_complete),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn deadline(&self) -> u64 {
        self.deadline
    }

    pub fn topology(&self) -> Topology {
        self.graph.topology()
    }

    pub fn running_oscillators(&self, frame: u64) -> usize {
        self.graph.running_oscillators(frame)
    }

    /// Whether the auto-stop deadline has been reached at `frame`
    pub fn is_due(&self, frame: u64) -> bool {
        frame >= self.deadline
    }

    /// Render the session's output for `frame`
    pub fn process(&mut self, frame: u64) -> f64 {
        self.graph.process(frame)
    }

    /// Halt every voice and LFO.
    ///
    /// Consumes the session, so the completion callback can only be taken
    /// once.
    pub fn finish(mut self) -> FinishedSession {
        self.graph.halt();
        FinishedSession {
            id: self.id,
            started_at: self.started_at,
            graph: self.graph,
            on_complete: self.on_complete,
        }
    }
}

/// A torn-down session whose callback has not run yet
pub struct FinishedSession {
    id: u64,
    started_at: u64,
    graph: EffectGraph,
    on_complete: Option<OnComplete>,
}

impl FinishedSession {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Seconds between the session's start and `frame`
    pub fn elapsed(&self, frame: u64, sample_rate: f64) -> f64 {
        frame.saturating_sub(self.started_at) as f64 / sample_rate
    }

    /// Oscillators still running after teardown; always zero
    pub fn running_oscillators(&self, frame: u64) -> usize {
        self.graph.running_oscillators(frame)
    }

    /// Run the completion callback. Call with no engine lock held.
    pub fn complete(self) {
        if let Some(on_complete) = self.on_complete {
            on_complete();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::schedule::NoteSchedule;
    use crate::params::{Effect, EffectParams};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn session(params: EffectParams, calls: Arc<AtomicUsize>) -> PlaybackSession {
        let schedule = NoteSchedule::from_config(&EngineConfig::default());
        let graph = EffectGraph::build(&params, &schedule, 100, 8000.0);
        PlaybackSession::new(7, graph, 100, 500, Box::new(move || {
            calls.fetch_add(1, Ordering::SeqCst);
        }))
    }

    #[test]
    fn test_session_deadline() {
        let session = session(EffectParams::default(), Arc::new(AtomicUsize::new(0)));
        assert_eq!(session.id(), 7);
        assert!(!session.is_due(499));
        assert!(session.is_due(500));
    }

    #[test]
    fn test_finish_halts_every_oscillator() {
        let calls = Arc::new(AtomicUsize::new(0));
        let params = EffectParams::default()
            .with(Effect::TremoloDepth, 1.0)
            .with(Effect::VibratoDepth, 1.0);
        let session = session(params, calls.clone());
        assert_eq!(session.running_oscillators(100), 8);

        let finished = session.finish();
        assert_eq!(finished.id(), 7);
        // Notes are still scheduled at frame 100, so only a halt stops them
        assert_eq!(finished.running_oscillators(100), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        finished.complete();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_elapsed_since_start() {
        let finished = session(EffectParams::default(), Arc::new(AtomicUsize::new(0))).finish();
        assert_eq!(finished.elapsed(4100, 8000.0), 0.5);
        assert_eq!(finished.elapsed(0, 8000.0), 0.0);
    }
}
