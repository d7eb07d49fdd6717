//! Benchmarks for scheduling: lookahead polls over a dense sequence, and a
//! full render + poll cycle of the engine.

use std::hint::black_box;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion};
use tabsynth::engine::{AudioEngine, EngineConfig, LookaheadScheduler, OfflineHost, Timeline};
use tabsynth::sequencing::{NoteEvent, NoteId, Pitch};

use crate::BLOCK_SIZES;

/// Sixteenth notes at 120 bpm for `bars` bars.
fn dense_notes(bars: u64) -> Vec<NoteEvent> {
    (0..bars * 16)
        .map(|i| NoteEvent::new(NoteId(i), Pitch::from_midi(40 + (i % 24) as i32), i as f64 * 0.125, 0.1))
        .collect()
}

fn dense_json(bars: u64) -> String {
    let notes: Vec<String> = dense_notes(bars)
        .iter()
        .map(|n| {
            format!(
                r#"{{ "note": "{}", "octave": {}, "startTime": {}, "duration": {} }}"#,
                n.pitch.class, n.pitch.octave, n.start, n.duration
            )
        })
        .collect();
    format!(r#"{{ "tempo": 120, "bars": {bars}, "notes": [{}] }}"#, notes.join(","))
}

pub fn bench_playback(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/playback");

    let notes = dense_notes(64);
    let timeline = Timeline {
        anchor: 0.0,
        seconds_per_beat: 0.5,
        beats_per_bar: 4,
    };
    let mut scheduler = LookaheadScheduler::new(0.1, Duration::from_millis(25));
    let mut now = 0.0;
    scheduler.start(now);
    group.bench_function("poll_1024_notes", |b| {
        b.iter(|| {
            now += 0.025;
            black_box(scheduler.poll(now, &timeline, &notes, true));
        })
    });

    for &size in BLOCK_SIZES {
        let mut engine = AudioEngine::new(EngineConfig::default().bars(512));
        let mut buffer = vec![0.0f32; size];
        let ready = engine.initialize(&mut OfflineHost::new(48_000.0)).is_ok()
            && engine.load_sequence(&dense_json(512)).is_ok()
            && engine.start_playback().is_ok();
        if !ready {
            continue;
        }

        group.bench_with_input(BenchmarkId::new("render_and_poll", size), &size, |b, _| {
            b.iter(|| {
                engine.render(black_box(&mut buffer));
                engine.poll();
            })
        });
    }

    group.finish();
}
