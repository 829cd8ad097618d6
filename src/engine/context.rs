//! Audio processing context
//!
//! Owns the sample clock every session is scheduled against, the persistent
//! master gain stage and monitor tap, and the slot holding the active
//! session. Hosts pull audio out of it block by block.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use tracing::info;

use super::monitor::MonitorTap;
use super::session::{FinishedSession, PlaybackSession};

/// Power state of the context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Clock halted, output silent
    Suspended,
    Running,
    /// Torn down; never runs again
    Closed,
}

/// Context shared between the engine and the host's render thread
pub type SharedContext = Arc<Mutex<AudioContext>>;

/// The processing context
pub struct AudioContext {
    sample_rate: u32,
    frame: u64,
    state: ContextState,
    master_gain: f64,
    tap: MonitorTap,
    session: Option<PlaybackSession>,
    /// Mono copy of the last block, fed to the tap
    block: Vec<f32>,
}

impl AudioContext {
    /// Create a suspended context
    pub fn new(sample_rate: u32, master_gain: f64, tap: MonitorTap) -> Self {
        Self {
            sample_rate,
            frame: 0,
            state: ContextState::Suspended,
            master_gain,
            tap,
            session: None,
            block: Vec::new(),
        }
    }

    pub fn into_shared(self) -> SharedContext {
        Arc::new(Mutex::new(self))
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Frames rendered since creation
    pub fn current_frame(&self) -> u64 {
        self.frame
    }

    /// Seconds rendered since creation
    pub fn current_time(&self) -> f64 {
        self.frame as f64 / self.sample_rate as f64
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    pub fn set_state(&mut self, state: ContextState) {
        if self.state != ContextState::Closed {
            self.state = state;
        }
    }

    pub fn master_gain(&self) -> f64 {
        self.master_gain
    }

    pub fn tap(&self) -> &MonitorTap {
        &self.tap
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    /// Make `session` the active one, returning whatever it displaced
    pub fn install(&mut self, session: PlaybackSession) -> Option<PlaybackSession> {
        self.session.replace(session)
    }

    /// Remove the active session
    pub fn take_session(&mut self) -> Option<PlaybackSession> {
        self.session.take()
    }

    /// Render one interleaved block of `channels` channels.
    ///
    /// Every channel gets the same mono signal. When the active session's
    /// deadline passes inside the block it is torn down here and handed
    /// back, for the caller to complete once the context lock has been
    /// released.
    pub fn render(&mut self, out: &mut [f32], channels: usize) -> Option<FinishedSession> {
        if self.state != ContextState::Running {
            out.fill(0.0);
            return None;
        }

        let mut finished = None;
        self.block.clear();

        for frame_out in out.chunks_mut(channels.max(1)) {
            let sample = self
                .session
                .as_mut()
                .map_or(0.0, |session| session.process(self.frame));
            let sample = (sample * self.master_gain) as f32;

            frame_out.fill(sample);
            self.block.push(sample);
            self.frame += 1;

            if self.session.as_ref().is_some_and(|s| s.is_due(self.frame)) {
                if let Some(session) = self.session.take() {
                    let done = session.finish();
                    info!(
                        session = done.id(),
                        elapsed_secs = done.elapsed(self.frame, self.sample_rate as f64),
                        "session finished"
                    );
                    finished = Some(done);
                }
            }
        }

        self.tap.feed(&self.block);
        finished
    }
}

/// Lock the context, recovering from poisoning
pub fn lock(context: &SharedContext) -> MutexGuard<'_, AudioContext> {
    context.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Lock the context without blocking; `None` if someone else holds it
pub fn try_lock(context: &SharedContext) -> Option<MutexGuard<'_, AudioContext>> {
    match context.try_lock() {
        Ok(guard) => Some(guard),
        Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
        Err(TryLockError::WouldBlock) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, MonitorConfig};
    use crate::engine::graph::EffectGraph;
    use crate::engine::schedule::NoteSchedule;
    use crate::params::{Effect, EffectParams};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const RATE: u32 = 8000;

    fn context() -> AudioContext {
        let tap = MonitorTap::new(&MonitorConfig::default(), RATE);
        AudioContext::new(RATE, 0.4, tap)
    }

    fn session(start: u64, deadline: u64, calls: Arc<AtomicUsize>) -> PlaybackSession {
        session_with(EffectParams::default(), start, deadline, calls)
    }

    fn session_with(
        params: EffectParams,
        start: u64,
        deadline: u64,
        calls: Arc<AtomicUsize>,
    ) -> PlaybackSession {
        let schedule = NoteSchedule::from_config(&EngineConfig::default());
        let graph = EffectGraph::build(&params, &schedule, start, RATE as f64);
        PlaybackSession::new(1, graph, start, deadline, Box::new(move || {
            calls.fetch_add(1, Ordering::SeqCst);
        }))
    }

    #[test]
    fn test_suspended_context_is_silent_and_frozen() {
        let mut ctx = context();
        let calls = Arc::new(AtomicUsize::new(0));
        ctx.install(session(0, 10, calls.clone()));

        let mut out = vec![1.0f32; 64];
        assert!(ctx.render(&mut out, 1).is_none());
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(ctx.current_frame(), 0);
    }

    #[test]
    fn test_running_context_advances_clock() {
        let mut ctx = context();
        ctx.set_state(ContextState::Running);
        let mut out = vec![0.0f32; 800];
        ctx.render(&mut out, 2);
        assert_eq!(ctx.current_frame(), 400);
        assert!((ctx.current_time() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_channels_carry_same_signal() {
        let mut ctx = context();
        ctx.set_state(ContextState::Running);
        ctx.install(session(0, 8000, Arc::new(AtomicUsize::new(0))));

        let mut out = vec![0.0f32; 1600];
        ctx.render(&mut out, 2);
        for frame in out.chunks(2) {
            assert_eq!(frame[0], frame[1]);
        }
        assert!(out.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn test_master_gain_bounds_output() {
        let mut ctx = context();
        ctx.set_state(ContextState::Running);
        ctx.install(session(0, 8000, Arc::new(AtomicUsize::new(0))));

        let mut out = vec![0.0f32; 4000];
        ctx.render(&mut out, 1);
        // Voice peak 0.3 through master 0.4; notes overlap during release
        let peak = out.iter().fold(0.0f32, |a, &b| a.max(b.abs()));
        assert!(peak > 0.05 && peak < 0.3, "peak {}", peak);
    }

    #[test]
    fn test_deadline_tears_down_inside_block() {
        let mut ctx = context();
        ctx.set_state(ContextState::Running);
        let calls = Arc::new(AtomicUsize::new(0));
        ctx.install(session(0, 100, calls.clone()));

        let mut out = vec![0.0f32; 64];
        assert!(ctx.render(&mut out, 1).is_none());
        assert!(ctx.session().is_some());

        let finished = ctx.render(&mut out, 1).expect("session due in second block");
        assert!(ctx.session().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        finished.complete();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Later blocks have nothing to finish
        assert!(ctx.render(&mut out, 1).is_none());
    }

    #[test]
    fn test_deadline_halts_modulated_session() {
        let mut ctx = context();
        ctx.set_state(ContextState::Running);
        let params = EffectParams::default()
            .with(Effect::TremoloDepth, 0.8)
            .with(Effect::VibratoDepth, 0.8);
        ctx.install(session_with(params, 0, 100, Arc::new(AtomicUsize::new(0))));
        assert_eq!(ctx.session().unwrap().running_oscillators(0), 8);

        let mut out = vec![0.0f32; 128];
        let finished = ctx.render(&mut out, 1).expect("session due");
        // The notes would otherwise keep running well past frame 128
        assert_eq!(finished.running_oscillators(ctx.current_frame()), 0);
        assert_eq!(finished.running_oscillators(0), 0);
    }

    #[test]
    fn test_tap_sees_master_output() {
        let mut ctx = context();
        ctx.set_state(ContextState::Running);
        ctx.install(session(0, 8000, Arc::new(AtomicUsize::new(0))));

        let mut out = vec![0.0f32; 2048];
        ctx.render(&mut out, 1);
        assert_eq!(ctx.tap().time_domain_data(), out);
    }

    #[test]
    fn test_closed_is_terminal() {
        let mut ctx = context();
        ctx.set_state(ContextState::Closed);
        ctx.set_state(ContextState::Running);
        assert_eq!(ctx.state(), ContextState::Closed);
    }

    #[test]
    fn test_try_lock_reports_contention() {
        let shared = context().into_shared();
        let guard = lock(&shared);
        assert!(try_lock(&shared).is_none());
        drop(guard);
        assert!(try_lock(&shared).is_some());
    }
}
