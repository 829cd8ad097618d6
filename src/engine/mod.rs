//! Tone engine
//!
//! Renders the fixed phrase through a per-play effect graph and manages one
//! playback session at a time.
//!
//! The engine owns an [`AudioHost`] and, once initialized, the processing
//! context that host pulls from. Every `play` builds a fresh graph, anchors
//! its notes and LFOs on the context's sample clock, and arms an auto-stop
//! deadline on that same clock. `stop` tears the session down early. Either
//! way the caller's completion callback runs exactly once.
//!
//! If the host cannot provide an output the engine goes inert: `play` and
//! `stop` become silent no-ops for the engine's lifetime. There is no audio
//! state to lose in that mode, so nothing is reported beyond a warning.

mod context;
mod graph;
mod host;
mod monitor;
mod player;
mod recorder;
mod schedule;
mod session;

pub use context::{AudioContext, ContextState, SharedContext};
pub use graph::{EffectGraph, Topology, VIBRATO_CENTS, VIBRATO_RATE};
pub use host::{AudioHost, OfflineHost};
pub use monitor::MonitorTap;
pub use player::{default_device_name, list_output_devices, CpalHost};
pub use recorder::{render_to_wav, Recorder, RenderSummary};
pub use schedule::{pentatonic_scale, seconds_to_frames, NoteSchedule, SCALE_RATIOS};
pub use session::{FinishedSession, OnComplete, PlaybackSession};

use crate::config::TonematchConfig;
use crate::error::EngineError;
use crate::params::EffectParams;
use tracing::{debug, info, warn};

use context::lock;

enum Status {
    Uninitialized,
    Ready(EngineState),
    /// No output could be opened; every operation is a no-op
    Inert,
}

/// Process-lifetime audio state created by `initialize`
struct EngineState {
    context: SharedContext,
    tap: MonitorTap,
}

/// The tone engine
pub struct ToneEngine {
    config: TonematchConfig,
    schedule: NoteSchedule,
    host: Box<dyn AudioHost>,
    status: Status,
    next_session: u64,
}

impl ToneEngine {
    /// Create an engine that will output through `host`. Nothing is opened
    /// until the first `initialize` or `play`.
    pub fn new(config: TonematchConfig, host: Box<dyn AudioHost>) -> Self {
        let schedule = NoteSchedule::from_config(&config.engine);
        Self {
            config,
            schedule,
            host,
            status: Status::Uninitialized,
            next_session: 0,
        }
    }

    /// Engine driven by [`ToneEngine::render`] at the configured sample rate
    pub fn offline(config: TonematchConfig) -> Self {
        let host = OfflineHost::new(config.audio.sample_rate);
        Self::new(config, Box::new(host))
    }

    /// Engine playing through the configured cpal output device
    pub fn with_output_device(config: TonematchConfig) -> Self {
        let host = CpalHost::new(config.audio.device.clone());
        Self::new(config, Box::new(host))
    }

    pub fn config(&self) -> &TonematchConfig {
        &self.config
    }

    /// Create the processing context on first call; afterwards only resume
    /// it if it was suspended.
    pub fn initialize(&mut self) {
        if matches!(self.status, Status::Uninitialized) {
            self.status = match self.open() {
                Ok(state) => Status::Ready(state),
                Err(err) => {
                    warn!(host = self.host.name(), error = %err, "audio output unavailable; tone engine disabled");
                    Status::Inert
                }
            };
        }

        if let Status::Ready(state) = &self.status {
            let mut ctx = lock(&state.context);
            if ctx.state() == ContextState::Suspended {
                match self.host.resume() {
                    Ok(()) => {
                        ctx.set_state(ContextState::Running);
                        debug!(time = ctx.current_time(), "audio context resumed");
                    }
                    Err(err) => warn!(error = %err, "failed to resume audio context"),
                }
            }
        }
    }

    fn open(&mut self) -> Result<EngineState, EngineError> {
        let sample_rate = self.host.open()?;
        let tap = MonitorTap::new(&self.config.monitor, sample_rate);
        let context =
            AudioContext::new(sample_rate, self.config.engine.master_volume, tap.clone()).into_shared();
        self.host.start(context.clone())?;

        info!(host = self.host.name(), sample_rate, "audio context created");
        Ok(EngineState { context, tap })
    }

    /// Stop any active session, close the output, and drop the context.
    ///
    /// A later `initialize` builds a new one. An inert engine stays inert.
    pub fn shutdown(&mut self) {
        self.stop();
        if let Status::Ready(state) = &self.status {
            self.host.close();
            lock(&state.context).set_state(ContextState::Closed);
            self.status = Status::Uninitialized;
            info!("tone engine shut down");
        }
    }

    /// Put the context into the suspended power state
    pub fn suspend(&mut self) {
        if let Status::Ready(state) = &self.status {
            let mut ctx = lock(&state.context);
            if ctx.state() != ContextState::Running {
                return;
            }
            match self.host.suspend() {
                Ok(()) => ctx.set_state(ContextState::Suspended),
                Err(err) => warn!(error = %err, "failed to suspend audio context"),
            }
        }
    }

    /// Play the phrase through an effect graph built from `params`.
    ///
    /// Any active session is stopped first, firing its callback. Returns
    /// immediately; `on_complete` runs once when this session ends, either
    /// at its deadline or on `stop`. Parameters are clamped to [0, 1].
    pub fn play<F>(&mut self, params: EffectParams, on_complete: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.initialize();
        self.stop();

        let Status::Ready(state) = &self.status else {
            debug!("tone engine inert; play ignored");
            return;
        };

        let params = params.clamped();
        let mut ctx = lock(&state.context);
        let now = ctx.current_frame();
        let sample_rate = ctx.sample_rate() as f64;

        let graph = EffectGraph::build(&params, &self.schedule, now, sample_rate);
        let duration = self.schedule.total_duration(params.delay_active());
        let deadline = now.saturating_add(seconds_to_frames(duration, sample_rate));

        self.next_session += 1;
        let id = self.next_session;
        let session = PlaybackSession::new(id, graph, now, deadline, Box::new(on_complete));
        info!(session = id, duration_secs = duration, topology = ?session.topology(), "session started");

        let displaced = ctx.install(session);
        drop(ctx);

        if let Some(displaced) = displaced {
            displaced.finish().complete();
        }
    }

    /// End the active session now. No-op when nothing is playing.
    pub fn stop(&mut self) {
        let Status::Ready(state) = &self.status else {
            return;
        };

        let (session, frame, sample_rate) = {
            let mut ctx = lock(&state.context);
            let Some(session) = ctx.take_session() else {
                return;
            };
            (session, ctx.current_frame(), ctx.sample_rate() as f64)
        };

        let finished = session.finish();
        info!(
            session = finished.id(),
            elapsed_secs = finished.elapsed(frame, sample_rate),
            "session stopped"
        );
        finished.complete();
    }

    /// Handle to the monitoring tap, once the context exists
    pub fn monitor_tap(&self) -> Option<MonitorTap> {
        match &self.status {
            Status::Ready(state) => Some(state.tap.clone()),
            _ => None,
        }
    }

    /// Render the next block of mono output.
    ///
    /// For hosts with no device of their own. Completion callbacks due in
    /// this block run before it returns.
    pub fn render(&self, out: &mut [f32]) {
        let Status::Ready(state) = &self.status else {
            out.fill(0.0);
            return;
        };

        let finished = lock(&state.context).render(out, 1);
        if let Some(finished) = finished {
            finished.complete();
        }
    }

    pub fn is_playing(&self) -> bool {
        self.with_context(|ctx| ctx.session().is_some()).unwrap_or(false)
    }

    /// True once a failed initialization has disabled the engine
    pub fn is_inert(&self) -> bool {
        matches!(self.status, Status::Inert)
    }

    pub fn context_state(&self) -> Option<ContextState> {
        self.with_context(AudioContext::state)
    }

    /// Seconds on the context clock
    pub fn current_time(&self) -> Option<f64> {
        self.with_context(AudioContext::current_time)
    }

    /// Stages present in the active session's graph
    pub fn topology(&self) -> Option<Topology> {
        self.with_context(|ctx| ctx.session().map(PlaybackSession::topology))
            .flatten()
    }

    /// Voices and LFOs still running in the active session
    pub fn running_oscillators(&self) -> usize {
        self.with_context(|ctx| {
            ctx.session()
                .map_or(0, |s| s.running_oscillators(ctx.current_frame()))
        })
        .unwrap_or(0)
    }

    /// Context time at which the active session tears itself down
    pub fn session_deadline(&self) -> Option<f64> {
        self.with_context(|ctx| {
            ctx.session()
                .map(|s| s.deadline() as f64 / ctx.sample_rate() as f64)
        })
        .flatten()
    }

    fn with_context<T>(&self, f: impl FnOnce(&AudioContext) -> T) -> Option<T> {
        match &self.status {
            Status::Ready(state) => Some(f(&lock(&state.context))),
            _ => None,
        }
    }
}

impl Drop for ToneEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
