//! Audio hosts
//!
//! A host is whatever pulls rendered audio out of the processing context: a
//! real output device, or nothing at all when the caller drives rendering
//! itself (offline rendering and tests).

use crate::error::EngineError;

use super::context::SharedContext;

/// The seam between the processing context and an output
pub trait AudioHost {
    /// Name for logs
    fn name(&self) -> &str;

    /// Probe the output and report its sample rate
    fn open(&mut self) -> Result<u32, EngineError>;

    /// Begin pulling audio from `context`
    fn start(&mut self, context: SharedContext) -> Result<(), EngineError>;

    /// Leave the suspended power state
    fn resume(&mut self) -> Result<(), EngineError>;

    /// Enter the suspended power state
    fn suspend(&mut self) -> Result<(), EngineError>;

    /// Release the output. Closing twice is fine.
    fn close(&mut self);
}

/// Host with no device; rendering is driven through `ToneEngine::render`
pub struct OfflineHost {
    sample_rate: u32,
}

impl OfflineHost {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

impl AudioHost for OfflineHost {
    fn name(&self) -> &str {
        "offline"
    }

    fn open(&mut self) -> Result<u32, EngineError> {
        Ok(self.sample_rate)
    }

    fn start(&mut self, _context: SharedContext) -> Result<(), EngineError> {
        Ok(())
    }

    fn resume(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    fn suspend(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    fn close(&mut self) {}
}
