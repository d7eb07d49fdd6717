/// Whatever provides the audio pipeline: a device stream, or nothing at all.
///
/// `open` is called once at initialisation and answers with the sample rate
/// the pipeline runs at, or why there is no pipeline.
pub trait AudioHost {
    fn open(&mut self) -> Result<f32, String>;

    fn name(&self) -> &str;
}

/// Renders into memory as fast as it is pulled. Used for offline playback,
/// benchmarks and tests.
#[derive(Debug, Clone)]
pub struct OfflineHost {
    sample_rate: f32,
}

impl OfflineHost {
    pub fn new(sample_rate: f32) -> Self {
        Self { sample_rate }
    }
}

impl AudioHost for OfflineHost {
    fn open(&mut self) -> Result<f32, String> {
        if self.sample_rate.is_finite() && self.sample_rate > 0.0 {
            Ok(self.sample_rate)
        } else {
            Err(format!("invalid sample rate {}", self.sample_rate))
        }
    }

    fn name(&self) -> &str {
        "offline"
    }
}

/// A host that is never available (no device, or audio blocked).
#[derive(Debug, Clone)]
pub struct UnavailableHost {
    reason: String,
}

impl UnavailableHost {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl AudioHost for UnavailableHost {
    fn open(&mut self) -> Result<f32, String> {
        Err(self.reason.clone())
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

/// Level statistics accumulated over rendered blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenderStats {
    pub peak: f32,
    pub rms: f32,
    pub frames: u64,
    sum_squares: f64,
}

impl RenderStats {
    /// Stats of a single buffer
    pub fn from_buffer(buffer: &[f32]) -> Self {
        let mut stats = Self::default();
        stats.accumulate(buffer);
        stats
    }

    pub fn accumulate(&mut self, buffer: &[f32]) {
        if buffer.is_empty() {
            return;
        }
        self.peak = buffer.iter().fold(self.peak, |acc, &x| acc.max(x.abs()));
        self.sum_squares += buffer.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>();
        self.frames += buffer.len() as u64;
        self.rms = (self.sum_squares / self.frames as f64).sqrt() as f32;
    }

    pub fn is_silent(&self) -> bool {
        self.peak == 0.0
    }
}
