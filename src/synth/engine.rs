use std::collections::BTreeMap;

use crate::synth::deferred::DeferredQueue;
use crate::synth::params::SynthParams;
use crate::synth::voice::{Voice, VoiceHandle, VoiceState};

/// Owns every live voice and tears each one down once its release has rendered.
///
/// Callers only ever hold `VoiceHandle`s. Disposal is deferred to
/// `release end + disposal margin` and happens in `collect_disposed`, which
/// the engine poll calls with the current clock time.
pub struct VoiceEngine {
    sample_rate: f32,
    voices: BTreeMap<VoiceHandle, Voice>,
    disposals: DeferredQueue<VoiceHandle>,
    disposal_margin: f64,
    next_id: u64,
    last_frequency: Option<f32>,
}

impl VoiceEngine {
    pub fn new(sample_rate: f32, disposal_margin_secs: f64) -> Self {
        Self {
            sample_rate,
            voices: BTreeMap::new(),
            disposals: DeferredQueue::new(),
            disposal_margin: disposal_margin_secs.max(0.0),
            next_id: 0,
            last_frequency: None,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Build a voice for `frequency` starting at clock time `at`.
    pub fn start(&mut self, frequency: f32, params: &SynthParams, at: f64) -> VoiceHandle {
        self.spawn(frequency, params, at, true)
    }

    /// Like `start`, but the voice is not a glide origin for later notes
    /// (metronome clicks).
    pub fn start_oneshot(&mut self, frequency: f32, params: &SynthParams, at: f64) -> VoiceHandle {
        self.spawn(frequency, params, at, false)
    }

    fn spawn(&mut self, frequency: f32, params: &SynthParams, at: f64, melodic: bool) -> VoiceHandle {
        let params = params.clone().sanitized();
        let frequency = if frequency.is_finite() && frequency > 0.0 {
            frequency
        } else {
            log::debug!("frequency {frequency} out of range, using A4");
            440.0
        };

        self.next_id += 1;
        let handle = VoiceHandle(self.next_id);
        let voice = Voice::new(frequency, &params, at, self.last_frequency);
        log::trace!(
            "voice {} start {:.2} Hz at {:.4}s ({} sub-voices)",
            handle.id(),
            frequency,
            at,
            voice.sub_voice_count()
        );

        self.voices.insert(handle, voice);
        if melodic {
            self.last_frequency = Some(frequency);
        }
        handle
    }

    /// Release `handle` at `at` with its own release time.
    ///
    /// Returns false for unknown, disposed or already-released handles.
    pub fn stop(&mut self, handle: VoiceHandle, at: f64) -> bool {
        self.stop_with_release(handle, at, None)
    }

    /// Release with an explicit release time (panic stops use a few ms).
    pub fn stop_with_release(
        &mut self,
        handle: VoiceHandle,
        at: f64,
        release: Option<f32>,
    ) -> bool {
        let Some(voice) = self.voices.get_mut(&handle) else {
            log::debug!("stop on stale voice {}", handle.id());
            return false;
        };
        if !voice.release(at, release) {
            log::debug!("voice {} already releasing", handle.id());
            return false;
        }

        let due = voice.release_end().unwrap_or(at) + self.disposal_margin;
        self.disposals.push(due, handle);
        log::trace!("voice {} release at {:.4}s, dispose at {:.4}s", handle.id(), at, due);
        true
    }

    /// Fade `handle` out over `release` seconds from `at`, overriding any
    /// slower release already in progress.
    pub fn silence(&mut self, handle: VoiceHandle, at: f64, release: f32) -> bool {
        let Some(voice) = self.voices.get_mut(&handle) else {
            return false;
        };
        let due = voice.silence(at, release) + self.disposal_margin;
        self.disposals.push(due, handle);
        true
    }

    /// Drop every voice whose disposal time has passed and return their handles.
    pub fn collect_disposed(&mut self, now: f64) -> Vec<VoiceHandle> {
        let mut disposed = Vec::new();
        while let Some(handle) = self.disposals.pop_due(now) {
            if self.voices.remove(&handle).is_some() {
                disposed.push(handle);
            }
        }
        if !disposed.is_empty() {
            log::trace!("disposed {} voices at {now:.4}s", disposed.len());
        }
        disposed
    }

    /// Tear down everything immediately (subsystem shutdown).
    pub fn dispose_all(&mut self) {
        self.voices.clear();
        self.disposals.clear();
    }

    /// Lifecycle state of `handle` at clock time `now`.
    pub fn state(&self, handle: VoiceHandle, now: f64) -> VoiceState {
        self.voices
            .get(&handle)
            .map_or(VoiceState::Disposed, |v| v.state_at(now))
    }

    pub fn is_live(&self, handle: VoiceHandle) -> bool {
        self.voices.contains_key(&handle)
    }

    pub fn voice(&self, handle: VoiceHandle) -> Option<&Voice> {
        self.voices.get(&handle)
    }

    /// Every live handle, releasing ones included.
    pub fn handles(&self) -> impl Iterator<Item = VoiceHandle> + '_ {
        self.voices.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn pending_disposals(&self) -> usize {
        self.disposals.len()
    }

    /// Frequency of the most recently started voice (glide origin).
    pub fn last_frequency(&self) -> Option<f32> {
        self.last_frequency
    }

    /// Overwrite `out` with the sum of all voices; `out[0]` is at `start_time`.
    pub fn render(&mut self, out: &mut [f32], start_time: f64) {
        out.fill(0.0);
        for voice in self.voices.values_mut() {
            voice.render_add(out, start_time, self.sample_rate);
        }
    }
}
