/*
Audio Engine Context
====================

`AudioEngine` owns everything that makes sound or decides when sound happens.
There is no ambient global state; hosts hold one engine and drive it with two
calls:

  audio callback ──▶ render(out)   voices → master gain → out, clock += frames
  poll timer ──────▶ poll()        marks, disposal, input, lookahead schedule

    ┌──────────────────────── AudioEngine ────────────────────────┐
    │ SampleClock ◀── render          Transport ── Timeline ──┐   │
    │ VoiceEngine ◀── start/stop ──── dispatch ◀── Lookahead ◀┘   │
    │ VoiceRegistry (live set, keyed by board key, note or click) │
    │ Sequence · NoteHistory · SequenceEditor                     │
    └─────────────────────────────────────────────────────────────┘

Status machine:

    Uninitialized ──initialize(host)──▶ Ready
          │                               │
          └──────── open fails ─────▶ Unavailable

Anything that would produce audio checks the status first and fails with
`AudioUnavailable` without touching any state.

Note flags (`is_sounding`, the attached voice) and paint callbacks follow the
audio, not the poll: dispatch queues a mark at the event's clock time and the
mark is applied by the first poll at or after it.
*/

pub mod clock;
pub mod config;
mod editing;
pub mod host;
mod playback;
pub mod registry;
pub mod scheduler;
pub mod transport;

use std::collections::HashMap;

use crate::dsp::mix::apply_gain;
use crate::error::{EngineError, Result};
use crate::sequencing::editor::SequenceEditor;
use crate::sequencing::history::NoteHistory;
use crate::sequencing::note::{NoteEvent, NoteId};
use crate::sequencing::pitch::{BoardLayout, BoardPosition, FretboardLayout, Pitch, PitchMapping};
use crate::sequencing::sequence::Sequence;
use crate::sequencing::time_signature::{Tempo, TimeSignature};
use crate::synth::deferred::DeferredQueue;
use crate::synth::engine::VoiceEngine;
use crate::synth::message::{MessageReceiver, PerformanceMessage};
use crate::synth::params::SynthParams;
use crate::synth::voice::{VoiceHandle, VoiceState};

pub use clock::{AudioClock, SampleClock};
pub use config::{EngineConfig, MetronomeConfig};
pub use host::{AudioHost, OfflineHost, RenderStats, UnavailableHost};
pub use registry::{VoiceKey, VoiceRegistry};
pub use scheduler::{EventKind, LookaheadScheduler, ScheduledEvent, Timeline};
pub use transport::{Transport, TransportState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    Uninitialized,
    Ready,
    Unavailable,
}

/// Song position reported once per UI frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackPosition {
    pub seconds: f64,
    /// 1-based
    pub bar: u32,
    /// 1-based
    pub beat: u32,
}

/// Called with `(position, sounding)` whenever a key should be lit or unlit.
pub type PaintCallback = Box<dyn FnMut(BoardPosition, bool) + Send>;

enum Mark {
    On { note: NoteId, voice: VoiceHandle },
    Off { note: NoteId },
}

impl Mark {
    fn note(&self) -> NoteId {
        match self {
            Mark::On { note, .. } | Mark::Off { note } => *note,
        }
    }
}

pub struct AudioEngine {
    config: EngineConfig,
    status: EngineStatus,
    clock: SampleClock,
    voices: Option<VoiceEngine>,
    registry: VoiceRegistry,
    scheduler: LookaheadScheduler,
    transport: Transport,
    sequence: Sequence,
    history: NoteHistory,
    editor: SequenceEditor,
    params: SynthParams,
    layout: Box<dyn BoardLayout>,
    mapping: PitchMapping,
    marks: DeferredQueue<Mark>,
    metronome: bool,
    paint: Option<PaintCallback>,
    input: Option<Box<dyn MessageReceiver>>,
    recording_keys: HashMap<BoardPosition, (f64, Pitch)>,
}

fn ready(status: EngineStatus, voices: &mut Option<VoiceEngine>) -> Result<&mut VoiceEngine> {
    match (status, voices.as_mut()) {
        (EngineStatus::Ready, Some(voices)) => Ok(voices),
        (EngineStatus::Unavailable, _) => Err(EngineError::unavailable("audio subsystem unavailable")),
        _ => Err(EngineError::unavailable("audio engine not initialised")),
    }
}

fn paint(callback: &mut Option<PaintCallback>, position: Option<BoardPosition>, sounding: bool) {
    if let (Some(callback), Some(position)) = (callback.as_mut(), position) {
        callback(position, sounding);
    }
}

impl AudioEngine {
    pub fn new(config: EngineConfig) -> Self {
        let tempo = Tempo::new(config.bpm, TimeSignature::new(config.beats_per_bar));
        Self {
            status: EngineStatus::Uninitialized,
            clock: SampleClock::new(config.sample_rate),
            voices: None,
            registry: VoiceRegistry::new(),
            scheduler: LookaheadScheduler::new(config.lookahead_secs, config.poll_interval()),
            transport: Transport::new(),
            sequence: Sequence::new(tempo, config.bars),
            history: NoteHistory::new(config.history_limit),
            editor: SequenceEditor::new(config.min_note_duration_secs),
            params: SynthParams::default(),
            layout: Box::new(FretboardLayout::standard_guitar()),
            mapping: PitchMapping::new(),
            marks: DeferredQueue::new(),
            metronome: config.metronome.enabled,
            paint: None,
            input: None,
            recording_keys: HashMap::new(),
            config,
        }
    }

    /// Bring up the audio pipeline through `host`.
    pub fn initialize(&mut self, host: &mut dyn AudioHost) -> Result<()> {
        if self.status == EngineStatus::Ready {
            return Ok(());
        }
        match host.open() {
            Ok(sample_rate) => {
                // Time carries over a shutdown; only the rate may change
                self.clock.set_sample_rate(sample_rate);
                self.clock.resume();
                self.voices = Some(VoiceEngine::new(sample_rate, self.config.disposal_margin_secs));
                self.status = EngineStatus::Ready;
                log::info!("audio ready on {} host at {sample_rate} Hz", host.name());
                Ok(())
            }
            Err(reason) => {
                self.status = EngineStatus::Unavailable;
                log::warn!("audio unavailable on {} host: {reason}", host.name());
                Err(EngineError::unavailable(reason))
            }
        }
    }

    /// Stop everything and release the pipeline. No voice outlives this.
    pub fn shutdown(&mut self) {
        self.kill_all_voices();
        self.scheduler.stop();
        self.transport.stop();
        if let Some(mut voices) = self.voices.take() {
            voices.dispose_all();
        }
        self.clock.suspend();
        self.status = EngineStatus::Uninitialized;
        log::info!("audio engine shut down");
    }

    pub fn status(&self) -> EngineStatus {
        self.status
    }

    /// Current audio-clock time in seconds.
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn start_voice(&mut self, frequency: f32, params: &SynthParams) -> Result<VoiceHandle> {
        let now = self.clock.now();
        let handle = ready(self.status, &mut self.voices)?.start(frequency, params, now);
        self.registry.register(handle, None);
        Ok(handle)
    }

    /// Release a voice now. False for stale or already-released handles.
    pub fn stop_voice(&mut self, handle: VoiceHandle) -> bool {
        let now = self.clock.now();
        self.voices.as_mut().is_some_and(|v| v.stop(handle, now))
    }

    /// Panic stop: every voice fades out within the panic release, every
    /// key and note is unlit, and nothing stays registered.
    pub fn kill_all_voices(&mut self) {
        let now = self.clock.now();
        let release = self.config.panic_release_secs;

        let held: Vec<BoardPosition> = self
            .registry
            .keys_where(|k| matches!(k, VoiceKey::Board(_)))
            .into_iter()
            .filter_map(|(key, _)| match key {
                VoiceKey::Board(position) => Some(position),
                VoiceKey::Note(_) | VoiceKey::Click(_) => None,
            })
            .collect();
        self.registry.drain();

        let mut silenced = 0;
        if let Some(voices) = self.voices.as_mut() {
            let handles: Vec<VoiceHandle> = voices.handles().collect();
            for handle in handles {
                if voices.silence(handle, now, release) {
                    silenced += 1;
                }
            }
        }

        let mut unlit = held;
        for note in self.sequence.notes_mut() {
            if note.is_sounding() {
                note.mark_silent();
                unlit.extend(note.position);
            }
        }
        for position in unlit {
            paint(&mut self.paint, Some(position), false);
        }

        self.marks.clear();
        self.recording_keys.clear();
        if silenced > 0 {
            log::info!("killed {silenced} voices");
        }
    }

    /// Sound the key at `position`. `Ok(None)` if the layout has no pitch there.
    pub fn press_key(&mut self, position: BoardPosition) -> Result<Option<VoiceHandle>> {
        let Some(pitch) = self.layout.pitch_at(position) else {
            log::debug!("no pitch at {position}");
            return Ok(None);
        };
        let now = self.clock.now();
        let voices = ready(self.status, &mut self.voices)?;
        let handle = voices.start(pitch.frequency(), &self.params, now);
        if let Some(previous) = self.registry.register(handle, Some(VoiceKey::Board(position))) {
            voices.stop(previous, now);
        }
        paint(&mut self.paint, Some(position), true);

        if self.transport.is_recording() {
            self.start_note_recording(position)?;
        }
        Ok(Some(handle))
    }

    /// Release the key at `position`. False if nothing was sounding there.
    pub fn release_key(&mut self, position: BoardPosition) -> bool {
        let now = self.clock.now();
        let released = match self.registry.release_key(VoiceKey::Board(position)) {
            Some(handle) => self.voices.as_mut().is_some_and(|v| v.stop(handle, now)),
            None => false,
        };
        paint(&mut self.paint, Some(position), false);

        if self.recording_keys.contains_key(&position) {
            self.stop_note_recording(position);
        }
        released
    }

    /// Render the next block. Silence until the engine is ready.
    pub fn render(&mut self, out: &mut [f32]) {
        let start = self.clock.now();
        match self.voices.as_mut() {
            Some(voices) if self.status == EngineStatus::Ready => {
                voices.render(out, start);
                apply_gain(out, self.config.master_gain);
            }
            _ => out.fill(0.0),
        }
        self.clock.advance(out.len());
    }

    /// One scheduler tick. Call every `poll_interval` of wall time.
    pub fn poll(&mut self) {
        let now = self.clock.now();
        self.apply_marks(now);

        if let Some(voices) = self.voices.as_mut() {
            for handle in voices.collect_disposed(now) {
                self.registry.unregister(handle);
            }
        }

        self.drain_input();

        if self.transport.is_playing() {
            let timeline = self.timeline();
            let events = self
                .scheduler
                .poll(now, &timeline, self.sequence.notes(), self.metronome);
            for event in events {
                self.dispatch(event, now);
            }
            self.apply_marks(now);

            let song_time = timeline.song_time(now);
            if !self.transport.is_recording() && song_time >= self.sequence.length_secs() {
                log::info!("end of song at {song_time:.3}s");
                self.stop_playback();
            }
        }
    }

    pub fn set_synth_params(&mut self, params: SynthParams) {
        self.params = params.sanitized();
    }

    pub fn synth_params(&self) -> &SynthParams {
        &self.params
    }

    pub fn set_paint_callback(&mut self, callback: impl FnMut(BoardPosition, bool) + Send + 'static) {
        self.paint = Some(Box::new(callback));
    }

    pub fn set_layout(&mut self, layout: Box<dyn BoardLayout>) {
        self.layout = layout;
    }

    pub fn set_pitch_mapping(&mut self, mapping: PitchMapping) {
        self.mapping = mapping;
    }

    /// Drain `input` on every poll.
    pub fn attach_input(&mut self, input: impl MessageReceiver + 'static) {
        self.input = Some(Box::new(input));
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    pub fn scheduler(&self) -> &LookaheadScheduler {
        &self.scheduler
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn registry(&self) -> &VoiceRegistry {
        &self.registry
    }

    pub fn voice_state(&self, handle: VoiceHandle) -> VoiceState {
        let now = self.clock.now();
        self.voices
            .as_ref()
            .map_or(VoiceState::Disposed, |v| v.state(handle, now))
    }

    /// Voices still owned by the voice engine, releasing ones included.
    pub fn live_voice_count(&self) -> usize {
        self.voices.as_ref().map_or(0, VoiceEngine::len)
    }

    fn timeline(&self) -> Timeline {
        Timeline {
            anchor: self.transport.anchor(),
            seconds_per_beat: self.sequence.tempo.seconds_per_beat(),
            beats_per_bar: self.sequence.tempo.signature.beats_per_bar,
        }
    }

    fn apply_marks(&mut self, now: f64) {
        while let Some(mark) = self.marks.pop_due(now) {
            match mark {
                Mark::On { note, voice } => {
                    // Voice may already be gone after a panic or a short note
                    if !self.voices.as_ref().is_some_and(|v| v.is_live(voice)) {
                        continue;
                    }
                    if let Some(event) = self.sequence.note_mut(note) {
                        event.mark_sounding(voice);
                        paint(&mut self.paint, event.position, true);
                    }
                }
                Mark::Off { note } => {
                    if let Some(event) = self.sequence.note_mut(note) {
                        if event.is_sounding() {
                            event.mark_silent();
                            paint(&mut self.paint, event.position, false);
                        }
                    }
                }
            }
        }
    }

    fn drain_input(&mut self) {
        let Some(mut input) = self.input.take() else {
            return;
        };
        while let Some(message) = input.pop() {
            match message {
                PerformanceMessage::KeyDown { position } => {
                    if let Err(err) = self.press_key(position) {
                        log::warn!("key {position} ignored: {err}");
                    }
                }
                PerformanceMessage::KeyUp { position } => {
                    self.release_key(position);
                }
                PerformanceMessage::AllNotesOff => self.kill_all_voices(),
            }
        }
        self.input = Some(input);
    }

    fn dispatch(&mut self, event: ScheduledEvent, now: f64) {
        let at = event.at.max(now);
        match event.kind {
            EventKind::NoteOn(id) => self.note_on(id, at),
            EventKind::NoteOff(id) => self.note_off(id, at),
            EventKind::Tick { accent } => self.click(accent, at),
        }
    }

    /// Pitch a recorded note should sound at, through the mapping and layout.
    fn resolve_pitch(&self, note: &NoteEvent) -> Option<Pitch> {
        if let Some(position) = self.mapping.get(note.pitch) {
            return self.layout.pitch_at(position);
        }
        match note.position {
            Some(position) => self.layout.pitch_at(position),
            None => Some(note.pitch),
        }
    }

    fn note_on(&mut self, id: NoteId, at: f64) {
        let Some(note) = self.sequence.note(id) else {
            return;
        };
        let Some(pitch) = self.resolve_pitch(note) else {
            log::warn!(
                "note {} ({}) no longer resolves to a pitch, skipped",
                id.0,
                note.pitch
            );
            return;
        };
        let Some(voices) = self.voices.as_mut() else {
            return;
        };

        let handle = voices.start(pitch.frequency(), &self.params, at);
        if let Some(previous) = self.registry.register(handle, Some(VoiceKey::Note(id))) {
            voices.stop(previous, at);
        }
        self.marks.push(at, Mark::On { note: id, voice: handle });
        log::debug!("note {} on at {at:.4}s as voice {}", id.0, handle.id());
    }

    fn note_off(&mut self, id: NoteId, at: f64) {
        if let Some(handle) = self.registry.release_key(VoiceKey::Note(id)) {
            if let Some(voices) = self.voices.as_mut() {
                voices.stop(handle, at);
            }
        }
        self.marks.push(at, Mark::Off { note: id });
    }

    fn click(&mut self, accent: bool, at: f64) {
        let Some(voices) = self.voices.as_mut() else {
            return;
        };
        let metronome = &self.config.metronome;
        let handle = voices.start_oneshot(metronome.frequency(accent), &metronome.click_params(), at);
        voices.stop(handle, at + metronome.click_secs as f64);
        self.registry.register(handle, Some(VoiceKey::Click(handle.id())));
    }

    /// Stop every voice started by playback (recorded notes and metronome
    /// clicks, including ones still ahead in the lookahead window) and unlight
    /// the notes.
    fn silence_notes(&mut self) {
        let now = self.clock.now();
        let release = self.config.panic_release_secs;

        let keyed = self
            .registry
            .keys_where(|k| matches!(k, VoiceKey::Note(_) | VoiceKey::Click(_)));
        for (key, handle) in keyed {
            self.registry.release_key(key);
            if let Some(voices) = self.voices.as_mut() {
                voices.silence(handle, now, release);
            }
        }

        let mut unlit = Vec::new();
        for note in self.sequence.notes_mut() {
            if !note.is_sounding() {
                continue;
            }
            if let (Some(handle), Some(voices)) = (note.mark_silent(), self.voices.as_mut()) {
                voices.silence(handle, now, release);
            }
            unlit.extend(note.position);
        }
        for position in unlit {
            paint(&mut self.paint, Some(position), false);
        }
        self.marks.clear();
    }

    /// Stop the voices of the notes `ids` now, unlight them and drop their
    /// pending marks. The scheduler does not revisit them until their next
    /// note-on comes into the window.
    fn silence_listed(&mut self, ids: &[NoteId]) {
        if ids.is_empty() {
            return;
        }
        let now = self.clock.now();
        let release = self.config.panic_release_secs;

        for &id in ids {
            let keyed = self.registry.release_key(VoiceKey::Note(id));
            let (attached, lit) = match self.sequence.note_mut(id) {
                Some(note) => {
                    let lit = note.is_sounding().then_some(note.position).flatten();
                    (note.mark_silent(), lit)
                }
                None => (None, None),
            };

            if let Some(voices) = self.voices.as_mut() {
                for handle in keyed.into_iter().chain(attached) {
                    voices.silence(handle, now, release);
                }
            }
            paint(&mut self.paint, lit, false);
        }
        self.marks.retain(|mark| !ids.contains(&mark.note()));
    }
}
