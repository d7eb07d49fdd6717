use tabsynth::dsp::envelope::Adsr;
use tabsynth::dsp::oscillator::Waveform;
use tabsynth::engine::{
    AudioEngine, EngineConfig, EngineStatus, OfflineHost, RenderStats, UnavailableHost, VoiceKey,
};
use tabsynth::sequencing::{BoardPosition, DragKind, NoteEvent};
use tabsynth::synth::{SynthParams, Voice, VoiceState};
use tabsynth::EngineError;

const SAMPLE_RATE: f32 = 48_000.0;
const CHUNK: usize = 1_200; // 25 ms, one poll interval

fn engine(config: EngineConfig) -> AudioEngine {
    let mut engine = AudioEngine::new(config);
    engine
        .initialize(&mut OfflineHost::new(SAMPLE_RATE))
        .expect("offline host opens");
    engine
}

/// Render and poll in poll-interval steps until `secs` more clock time has passed.
fn run(engine: &mut AudioEngine, secs: f64) {
    let mut block = vec![0.0f32; CHUNK];
    let target = engine.now() + secs;
    while engine.now() < target - 1e-9 {
        engine.render(&mut block);
        engine.poll();
    }
}

fn sounding(engine: &AudioEngine) -> Vec<&NoteEvent> {
    engine
        .sequence()
        .notes()
        .iter()
        .filter(|n| n.is_sounding())
        .collect()
}

fn plain_sine() -> SynthParams {
    let mut params = SynthParams::default();
    params.osc1.waveform = Waveform::Sine;
    params.osc1.mix_level = 1.0;
    params.osc2.mix_level = 0.0;
    params.filters.clear();
    params.amp_envelope = Adsr::new(0.0, 0.0, 1.0, 0.1);
    params
}

const TWO_NOTES: &str = r#"{
    "tempo": 120,
    "bars": 8,
    "notes": [
        { "note": "C", "octave": 3, "startTime": 0.0, "duration": 1.0 },
        { "note": "E", "octave": 3, "startTime": 0.0, "duration": 1.0 }
    ]
}"#;

#[test]
fn recorded_note_plays_back_and_is_disposed() {
    let mut engine = engine(EngineConfig::default().disposal_margin(0.05));
    let mut params = SynthParams::default();
    params.amp_envelope = Adsr::new(0.005, 0.05, 0.8, 0.02);
    engine.set_synth_params(params);

    // Record (3,5) from song time 0.0 for 0.5s at 120 bpm
    let position = BoardPosition::new(3, 5);
    engine.start_recording().expect("ready");
    engine.press_key(position).expect("ready");
    run(&mut engine, 0.5);
    engine.release_key(position);
    engine.stop_playback();

    let note = &engine.sequence().notes()[0];
    assert_eq!(note.position, Some(position));
    assert!(note.start.abs() < 1e-9, "start {}", note.start);
    assert!((note.duration - 0.5).abs() < 1e-6, "duration {}", note.duration);

    engine.start_playback().expect("ready");
    engine.poll();

    run(&mut engine, 0.25);
    let note = &engine.sequence().notes()[0];
    assert!(note.is_sounding(), "sounding at 0.25s");
    let handle = note.voice().expect("sounding note has a voice");

    run(&mut engine, 0.35);
    let note = &engine.sequence().notes()[0];
    assert!(!note.is_sounding(), "silent at 0.6s");
    assert_eq!(note.voice(), None);
    assert_eq!(engine.voice_state(handle), VoiceState::Disposed);
}

#[test]
fn unison_keeps_the_single_voice_peak() {
    let mut unison = plain_sine();
    unison.unison.enabled = true;
    unison.unison.voice_count = 4;

    let mut peaks = Vec::new();
    for params in [plain_sine(), unison] {
        let mut engine = engine(EngineConfig::default());
        engine.start_voice(440.0, &params).expect("ready");
        let mut out = vec![0.0f32; 4_800];
        engine.render(&mut out);
        peaks.push(out.iter().fold(0.0f32, |acc, &s| acc.max(s.abs())));
    }

    let (single, unison) = (peaks[0], peaks[1]);
    assert!((single - 0.8).abs() < 0.01, "single voice peak {single}");
    assert!(
        unison <= single + 1e-3 && unison > 0.9 * single,
        "unison peak {unison} vs single {single}"
    );
}

#[test]
fn jump_silences_sounding_notes_and_resyncs() {
    let mut engine = engine(EngineConfig::default());
    engine.load_sequence(TWO_NOTES).expect("valid sequence");
    engine.start_playback().expect("ready");
    engine.poll();
    run(&mut engine, 0.2);
    assert_eq!(sounding(&engine).len(), 2);

    engine.jump_to_time(10.0);
    assert!(sounding(&engine).is_empty());
    assert_eq!(engine.scheduler().next_event_time(), engine.now());
    assert_eq!(engine.scheduler().horizon(), engine.now());
    let frame = engine.frame().expect("still playing");
    assert!((frame.seconds - 10.0).abs() < 1e-9);

    // Notes behind the jump point never come back
    run(&mut engine, 0.2);
    assert!(sounding(&engine).is_empty());
    assert_eq!(engine.live_voice_count(), 0);
}

#[test]
fn kill_all_is_complete_and_idempotent() {
    let mut engine = engine(EngineConfig::default().metronome(true));
    engine.kill_all_voices();
    assert!(engine.registry().is_empty());

    engine.load_sequence(TWO_NOTES).expect("valid sequence");
    engine.start_playback().expect("ready");
    engine.poll();
    run(&mut engine, 0.1);
    engine.press_key(BoardPosition::new(5, 0)).expect("ready");
    engine.start_voice(330.0, &plain_sine()).expect("ready");
    assert!(engine.registry().len() >= 4);

    engine.kill_all_voices();
    assert!(engine.registry().is_empty());
    assert!(sounding(&engine).is_empty());

    engine.kill_all_voices();
    assert!(engine.registry().is_empty());

    // Panic release is a few ms; everything is gone after the margin
    engine.stop_playback();
    run(&mut engine, 0.2);
    assert_eq!(engine.live_voice_count(), 0);
}

#[test]
fn undo_then_redo_is_identity() {
    let mut engine = engine(EngineConfig::default());
    engine.load_sequence(TWO_NOTES).expect("valid sequence");

    let id = engine.sequence().notes()[0].id;
    engine.select_note(id, false);
    engine.begin_edit(DragKind::Move);
    engine.update_edit(0.5, 1);
    assert!(engine.commit_edit());

    let before = engine.sequence().notes().to_vec();
    assert!(engine.undo());
    assert_ne!(engine.sequence().notes(), before.as_slice());
    assert!(engine.redo());
    assert_eq!(engine.sequence().notes(), before.as_slice());
}

#[test]
fn resize_left_respects_the_floor_and_keeps_the_end() {
    let mut engine = engine(EngineConfig::default());
    engine.load_sequence(TWO_NOTES).expect("valid sequence");
    let id = engine.sequence().notes()[0].id;
    engine.select_note(id, false);

    engine.begin_edit(DragKind::ResizeLeft);
    for delta in [0.2, 0.9, 5.0] {
        engine.update_edit(delta, 0);
        let note = engine.sequence().note(id).expect("note exists");
        assert!(note.duration >= 0.05 - 1e-9, "duration {} at {delta}", note.duration);
        assert!((note.end() - 1.0).abs() < 1e-9, "end {} at {delta}", note.end());
    }
    assert!(engine.commit_edit());
}

#[test]
fn polling_twice_schedules_nothing_new() {
    let mut engine = engine(EngineConfig::default().metronome(true));
    engine.load_sequence(TWO_NOTES).expect("valid sequence");
    engine.start_playback().expect("ready");

    engine.poll();
    let voices = engine.live_voice_count();
    let next = engine.scheduler().next_event_time();
    assert_eq!(voices, 3, "two notes and a click");

    engine.poll();
    assert_eq!(engine.live_voice_count(), voices);
    assert_eq!(engine.scheduler().next_event_time(), next);
}

#[test]
fn unavailable_audio_fails_fast() {
    let mut engine = AudioEngine::new(EngineConfig::default());
    let err = engine.initialize(&mut UnavailableHost::new("no output device"));
    assert!(matches!(err, Err(EngineError::AudioUnavailable { .. })));
    assert_eq!(engine.status(), EngineStatus::Unavailable);

    assert!(matches!(
        engine.start_playback(),
        Err(EngineError::AudioUnavailable { .. })
    ));
    assert!(engine.start_voice(440.0, &plain_sine()).is_err());
    assert!(engine.press_key(BoardPosition::new(0, 0)).is_err());
    assert!(engine.start_note_recording(BoardPosition::new(0, 0)).is_err());
    assert_eq!(engine.live_voice_count(), 0);
    assert!(engine.registry().is_empty());
    assert!(!engine.transport().is_playing());
}

#[test]
fn amplitude_envelope_stays_in_unit_range() {
    let shapes = [
        Adsr::new(0.0, 0.0, 1.0, 0.0),
        Adsr::new(0.01, 0.1, 0.5, 0.2),
        Adsr::new(0.3, 0.0, 0.0, 1.0),
        Adsr::new(0.05, 0.5, 1.0, 0.05),
    ];
    for adsr in shapes {
        let mut params = plain_sine();
        params.amp_envelope = adsr;
        let voice = Voice::new(440.0, &params, 0.0, None);

        for i in 0..200 {
            let t = i as f64 * 0.005;
            let gain = voice.gain_at(t);
            assert!((0.0..=1.0 + 1e-6).contains(&gain), "{adsr:?} gain {gain} at {t}");
        }
        // A zero decay drops to sustain at the attack end itself
        let attack_end = (adsr.attack as f64 - 1e-7).max(0.0);
        let peak = voice.gain_at(attack_end);
        assert!((peak - 1.0).abs() < 1e-4, "{adsr:?} peak {peak}");
    }
}

/// Render `secs` of audio without polling and return its level stats.
fn render_only(engine: &mut AudioEngine, secs: f64) -> RenderStats {
    let mut block = vec![0.0f32; CHUNK];
    let mut stats = RenderStats::default();
    let target = engine.now() + secs;
    while engine.now() < target - 1e-9 {
        engine.render(&mut block);
        stats.accumulate(&block);
    }
    stats
}

const LONG_NOTE: &str = r#"{
    "tempo": 120,
    "bars": 8,
    "notes": [{ "note": "A", "octave": 2, "startTime": 0.0, "duration": 2.0 }]
}"#;

#[test]
fn shortening_a_sounding_note_behind_the_playhead_stops_it() {
    let mut engine = engine(EngineConfig::default().metronome(false));
    engine.load_sequence(LONG_NOTE).expect("valid sequence");
    engine.start_playback().expect("ready");
    engine.poll();
    run(&mut engine, 1.0);
    assert_eq!(sounding(&engine).len(), 1);

    let id = engine.sequence().notes()[0].id;
    engine.select_note(id, false);
    assert!(engine.begin_edit(DragKind::ResizeRight));
    engine.update_edit(-1.5, 0);
    assert!(engine.commit_edit());

    let note = engine.sequence().note(id).expect("still there");
    assert!((note.end() - 0.5).abs() < 1e-12);
    assert!(sounding(&engine).is_empty());

    // 5 ms panic fade plus the 0.1 s disposal margin
    run(&mut engine, 0.5);
    assert!(engine.transport().is_playing());
    assert!(sounding(&engine).is_empty());
    assert_eq!(engine.live_voice_count(), 0);
    assert!(engine.registry().is_empty());
}

#[test]
fn stop_cancels_clicks_already_in_the_lookahead_window() {
    let mut engine = engine(EngineConfig::default().metronome(true));
    engine.start_playback().expect("ready");
    engine.poll();
    // The poll near 0.425 s has scheduled the beat at 0.5 s
    run(&mut engine, 0.45);
    let pending = engine
        .registry()
        .keys_where(|k| matches!(k, VoiceKey::Click(_)));
    assert!(!pending.is_empty(), "beat 2 click should be scheduled");

    engine.stop_playback();
    assert!(engine
        .registry()
        .keys_where(|k| matches!(k, VoiceKey::Click(_)))
        .is_empty());

    let after = render_only(&mut engine, 0.15);
    assert!(after.peak < 1e-3, "peak after stop {}", after.peak);
}

#[test]
fn jump_drops_clicks_from_the_old_timeline() {
    let mut engine = engine(EngineConfig::default().metronome(true));
    engine.start_playback().expect("ready");
    engine.poll();
    run(&mut engine, 0.45);

    // Next beat on the new timeline is 0.4 s away, well past 0.6 s
    engine.jump_to_time(0.1);
    let after = render_only(&mut engine, 0.15);
    assert!(after.peak < 1e-3, "old beat sounded after jump: {}", after.peak);
    assert!(engine.transport().is_playing());
}
