//! Feedback echo
//!
//! Dry and wet paths run in parallel into one output. The wet path reads a
//! delay line whose input is the stage input plus the delayed signal scaled
//! by the feedback gain.

/// Gain of the dry path
pub const DRY_GAIN: f64 = 1.0;

/// Gain of the wet path
pub const WET_GAIN: f64 = 0.5;

/// Fixed-length circular delay line
pub struct DelayLine {
    buffer: Vec<f64>,
    pos: usize,
}

impl DelayLine {
    /// A delay line of `delay_samples` (at least one)
    pub fn new(delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; delay_samples.max(1)],
            pos: 0,
        }
    }

    /// Delay length in samples
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Output of the line for this sample
    pub fn read(&self) -> f64 {
        self.buffer[self.pos]
    }

    /// Feed this sample's input and advance
    pub fn write(&mut self, sample: f64) {
        self.buffer[self.pos] = sample;
        self.pos = (self.pos + 1) % self.buffer.len();
    }
}

/// Delay stage with feedback loop and dry/wet mix
pub struct FeedbackDelay {
    line: DelayLine,
    feedback: f64,
}

impl FeedbackDelay {
    /// Create a delay of `delay_seconds` with the given feedback gain
    pub fn new(delay_seconds: f64, feedback: f64, sample_rate: f64) -> Self {
        let delay_samples = (delay_seconds * sample_rate).round().max(1.0) as usize;
        Self {
            line: DelayLine::new(delay_samples),
            feedback,
        }
    }

    /// Delay length in samples
    pub fn delay_samples(&self) -> usize {
        self.line.len()
    }

    /// Feedback gain
    pub fn feedback(&self) -> f64 {
        self.feedback
    }

    /// Process one sample
    pub fn process(&mut self, input: f64) -> f64 {
        let delayed = self.line.read();
        self.line.write(input + delayed * self.feedback);
        input * DRY_GAIN + delayed * WET_GAIN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_line_delays_by_length() {
        let mut line = DelayLine::new(3);
        let mut out = Vec::new();
        for x in [1.0, 2.0, 3.0, 4.0, 5.0] {
            out.push(line.read());
            line.write(x);
        }
        assert_eq!(out, vec![0.0, 0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_zero_length_becomes_one() {
        assert_eq!(DelayLine::new(0).len(), 1);
    }

    #[test]
    fn test_echo_train_decays_by_feedback() {
        // 4-sample delay at 1 kHz, feedback 0.5
        let mut delay = FeedbackDelay::new(0.004, 0.5, 1000.0);
        assert_eq!(delay.delay_samples(), 4);

        let mut out = vec![delay.process(1.0)];
        for _ in 0..12 {
            out.push(delay.process(0.0));
        }

        assert_eq!(out[0], 1.0); // dry
        assert_eq!(out[4], 0.5); // first echo, wet gain
        assert_eq!(out[8], 0.25); // second echo, feedback
        assert_eq!(out[12], 0.125);
        assert_eq!(out[1], 0.0);
    }

    #[test]
    fn test_no_feedback_single_echo() {
        let mut delay = FeedbackDelay::new(0.002, 0.0, 1000.0);
        let out: Vec<f64> = std::iter::once(1.0)
            .chain(std::iter::repeat(0.0).take(6))
            .map(|x| delay.process(x))
            .collect();
        assert_eq!(out, vec![1.0, 0.0, 0.5, 0.0, 0.0, 0.0, 0.0]);
    }
}
