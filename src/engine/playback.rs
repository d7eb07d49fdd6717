use crate::error::Result;
use crate::sequencing::note::NoteId;
use crate::sequencing::pitch::BoardPosition;
use crate::sequencing::time_signature::clamp_bpm;

use super::clock::AudioClock;
use super::registry::VoiceKey;
use super::transport::TransportState;
use super::{ready, AudioEngine, Mark, PlaybackPosition};

impl AudioEngine {
    /// Play from the cue point. Fails fast when audio is not ready.
    pub fn start_playback(&mut self) -> Result<()> {
        ready(self.status, &mut self.voices)?;
        if self.transport.is_playing() {
            return Ok(());
        }
        if self.transport.is_stepping() {
            self.exit_step_mode();
        }

        let now = self.clock.now();
        let anchor = self.transport.start(now);
        self.scheduler.start(now);
        log::info!(
            "playback from {:.3}s at {} bpm",
            now - anchor,
            self.sequence.tempo.bpm()
        );
        Ok(())
    }

    /// Stop playing, silence every note voice and rewind to zero.
    pub fn stop_playback(&mut self) {
        self.finish_held_notes();
        self.silence_notes();
        self.scheduler.stop();
        let was_playing = self.transport.is_playing();
        self.transport.stop();
        if was_playing {
            log::info!("playback stopped");
        }
    }

    /// Continue from song time `seconds`. Notes already under way at that
    /// point are not restarted.
    pub fn jump_to_time(&mut self, seconds: f64) {
        let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        self.silence_notes();
        let now = self.clock.now();
        self.transport.rebind(now, seconds);
        self.scheduler.resync(now);
        log::debug!("jump to {seconds:.3}s");
    }

    /// Jump to the start of 1-based `bar` and `beat`.
    pub fn jump_to_position(&mut self, bar: u32, beat: u32) {
        let seconds = self.sequence.tempo.position_to_seconds(bar, beat);
        self.jump_to_time(seconds);
    }

    /// Record over playback, starting playback if needed.
    pub fn start_recording(&mut self) -> Result<()> {
        self.start_playback()?;
        self.transport.set_recording(true);
        log::info!("recording");
        Ok(())
    }

    /// Stop recording; keys still held become notes ending now.
    pub fn stop_recording(&mut self) {
        self.finish_held_notes();
        if self.transport.is_recording() {
            self.transport.set_recording(false);
            log::info!("recording stopped");
        }
    }

    /// Mark the press time of a key while recording. `Ok(false)` when not
    /// recording or the key has no pitch.
    pub fn start_note_recording(&mut self, position: BoardPosition) -> Result<bool> {
        ready(self.status, &mut self.voices)?;
        if !self.transport.is_recording() {
            return Ok(false);
        }
        let Some(pitch) = self.layout.pitch_at(position) else {
            log::warn!("cannot record {position}: no pitch there");
            return Ok(false);
        };
        let start = self.transport.song_time(self.clock.now());
        self.recording_keys.insert(position, (start, pitch));
        Ok(true)
    }

    /// Turn a held key into a recorded note. Each note is one undoable edit.
    pub fn stop_note_recording(&mut self, position: BoardPosition) -> Option<NoteId> {
        let (start, pitch) = self.recording_keys.remove(&position)?;
        let end = self.transport.song_time(self.clock.now());
        let duration = (end - start).max(self.config.min_note_duration_secs);

        self.history.record(self.sequence.snapshot());
        let id = self.sequence.insert_note(pitch, start, duration);
        if let Some(note) = self.sequence.note_mut(id) {
            note.position = Some(position);
        }
        log::info!("recorded {pitch} at {start:.3}s for {duration:.3}s");
        Some(id)
    }

    /// Change tempo, keeping every note and the play position on its beat.
    pub fn set_tempo(&mut self, bpm: f64) {
        let old = self.sequence.tempo.bpm();
        let bpm = clamp_bpm(bpm);
        if bpm == old {
            return;
        }
        let factor = old / bpm;

        self.silence_notes();
        let now = self.clock.now();
        let song_time = self.transport.song_time(now) * factor;
        self.sequence.rescale_tempo(bpm);
        for (start, _) in self.recording_keys.values_mut() {
            *start *= factor;
        }
        // Snapshots hold seconds at the old tempo
        self.history.clear();

        self.transport.rebind(now, song_time);
        self.scheduler.resync(now);
        log::info!("tempo {old} -> {bpm} bpm");
    }

    pub fn toggle_metronome(&mut self, enabled: bool) {
        self.metronome = enabled;
        log::debug!("metronome {}", if enabled { "on" } else { "off" });
    }

    pub fn metronome_enabled(&self) -> bool {
        self.metronome
    }

    /// Leave continuous playback and advance only on `step`, starting at the
    /// beat containing the current position.
    pub fn enter_step_mode(&mut self) {
        let song_time = self.transport.song_time(self.clock.now());
        self.stop_playback();
        let beat = self.sequence.tempo.seconds_to_beats(song_time).floor().max(0.0) as u64;
        self.transport.enter_step(beat);
        log::debug!("step mode at beat {beat}");
    }

    /// Sound every note that starts in the current beat, for its own duration,
    /// then move to the next beat. Returns how many notes sounded.
    pub fn step(&mut self) -> Result<usize> {
        ready(self.status, &mut self.voices)?;
        let Some(beat) = self.transport.advance_step() else {
            return Ok(0);
        };
        let spb = self.sequence.tempo.seconds_per_beat();
        let (from, to) = (beat as f64 * spb, (beat + 1) as f64 * spb);
        let slice: Vec<(NoteId, f64)> = self
            .sequence
            .notes()
            .iter()
            .filter(|n| n.start >= from && n.start < to)
            .map(|n| (n.id, n.duration))
            .collect();

        let now = self.clock.now();
        for &(id, duration) in &slice {
            self.note_on(id, now);
            let off = now + duration;
            // Keep the key registered so a later silence still finds it
            if let (Some(handle), Some(voices)) =
                (self.registry.handle_for(VoiceKey::Note(id)), self.voices.as_mut())
            {
                voices.stop(handle, off);
            }
            self.marks.push(off, Mark::Off { note: id });
        }
        self.apply_marks(now);
        Ok(slice.len())
    }

    pub fn exit_step_mode(&mut self) {
        if let TransportState::Stepping { beat } = self.transport.state() {
            self.silence_notes();
            let seconds = self.sequence.tempo.beats_to_seconds(beat as f64);
            self.transport.exit_step(seconds);
        }
    }

    /// Position for progress display while playing.
    pub fn frame(&self) -> Option<PlaybackPosition> {
        if !self.transport.is_playing() {
            return None;
        }
        let seconds = self.transport.song_time(self.clock.now());
        let (bar, beat) = self.sequence.tempo.seconds_to_position(seconds);
        Some(PlaybackPosition { seconds, bar, beat })
    }

    fn finish_held_notes(&mut self) {
        let held: Vec<BoardPosition> = self.recording_keys.keys().copied().collect();
        for position in held {
            self.stop_note_recording(position);
        }
    }
}
