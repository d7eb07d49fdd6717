/// Context passed to graph nodes during rendering
///
/// - sample_rate: Audio sample rate (e.g., 48000.0)
/// - time: audio-clock time of the first sample in the block (seconds)
/// - pitch: per-sample played frequency in Hz (glide and vibrato applied);
///   empty for nodes that don't follow the keyboard
pub struct RenderCtx<'a> {
    pub sample_rate: f32,
    pub time: f64,
    pub pitch: &'a [f32],
}

impl<'a> RenderCtx<'a> {
    /// Context for nodes that ignore pitch (filters, LFOs)
    pub fn new(sample_rate: f32, time: f64) -> Self {
        Self {
            sample_rate,
            time,
            pitch: &[],
        }
    }

    /// Context carrying a per-sample frequency curve
    pub fn with_pitch(sample_rate: f32, time: f64, pitch: &'a [f32]) -> Self {
        Self {
            sample_rate,
            time,
            pitch,
        }
    }

    /// Audio-clock time of sample `index` within the block.
    #[inline]
    pub fn sample_time(&self, index: usize) -> f64 {
        self.time + index as f64 / self.sample_rate as f64
    }

    /// Played frequency at sample `index`, holding the last value past the end.
    #[inline]
    pub fn pitch_at(&self, index: usize) -> Option<f32> {
        self.pitch
            .get(index)
            .or_else(|| self.pitch.last())
            .copied()
    }
}

/// Core trait for audio processing graph nodes
///
/// Sources overwrite `out`; processors (filters) transform it in place.
pub trait GraphNode: Send {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx);

    /// Return to the state of a freshly started note.
    ///
    /// Default implementation does nothing (stateless nodes).
    fn reset(&mut self) {}
}
