/*
Audio Clock
===========

Every timestamp in the engine (envelope stages, note-on times, lookahead
windows, disposal deadlines) is in AUDIO-CLOCK seconds: the number of frames
the render pipeline has actually produced divided by the sample rate.

    now = frames_rendered / sample_rate

Wall-clock timers drift and jitter against the audio device, and keep running
while audio is suspended. The audio clock does neither: it advances exactly
as far as audio has been rendered, and not at all while suspended.

The clock never goes backwards. Re-opening the pipeline at another sample rate
folds the time so far into a base offset and counts frames from there:

    now = base + frames_since_rate_change / sample_rate
*/

/// Monotonic time source tied to the render pipeline.
pub trait AudioClock {
    /// Seconds of audio rendered so far.
    fn now(&self) -> f64;

    fn is_running(&self) -> bool;
}

/// Counts rendered frames.
#[derive(Debug, Clone)]
pub struct SampleClock {
    sample_rate: f32,
    base: f64,
    frames: u64,
    running: bool,
}

impl SampleClock {
    /// A suspended clock at time zero.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            base: 0.0,
            frames: 0,
            running: false,
        }
    }

    pub fn resume(&mut self) {
        self.running = true;
    }

    pub fn suspend(&mut self) {
        self.running = false;
    }

    /// Account for `frames` rendered frames. Ignored while suspended.
    pub fn advance(&mut self, frames: usize) {
        if self.running {
            self.frames += frames as u64;
        }
    }

    /// Switch to `sample_rate`, keeping the time reached so far.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        if sample_rate == self.sample_rate {
            return;
        }
        self.base = self.now();
        self.frames = 0;
        self.sample_rate = sample_rate;
    }

    /// Frames rendered at the current sample rate.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}

impl AudioClock for SampleClock {
    fn now(&self) -> f64 {
        self.base + self.frames as f64 / self.sample_rate as f64
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
