use std::time::Duration;

use crate::sequencing::note::{NoteEvent, NoteId};

/*
Lookahead Scheduling
====================

The host calls `poll` every `poll_interval` of wall time. Each poll looks a
fixed window ahead on the AUDIO clock and hands back every event whose
timestamp falls in the part of that window not yet covered:

  clock ──────────────────────────────────────────────────────────────▶
           now            now + lookahead
            │◀── window ──▶│
  poll n:   [horizon ......)              events here are emitted
  poll n+1:        [horizon ......)       only the new slice is examined

Events carry the absolute clock time they must sound at, so a late or early
poll changes nothing audible: only the timestamp matters. `horizon` never moves
backwards, which makes a second poll without clock movement emit nothing.

Seeking and tempo changes call `resync(now)`. Both `next_event_time` and
`horizon` snap to `now`, so no backlog of stale events fires in a burst.

Metronome ticks land on the beat grid anchored at song time zero:

    beat k at clock time  anchor + k × seconds_per_beat
*/

/// Maps song time onto the audio clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timeline {
    /// Clock time of song time zero.
    pub anchor: f64,
    pub seconds_per_beat: f64,
    pub beats_per_bar: u32,
}

impl Timeline {
    pub fn clock_time(&self, song_time: f64) -> f64 {
        self.anchor + song_time
    }

    pub fn song_time(&self, clock_time: f64) -> f64 {
        clock_time - self.anchor
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    NoteOn(NoteId),
    NoteOff(NoteId),
    Tick { accent: bool },
}

/// An event due at absolute clock time `at`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledEvent {
    pub at: f64,
    pub kind: EventKind,
}

#[derive(Debug, Clone)]
pub struct LookaheadScheduler {
    lookahead: f64,
    poll_interval: Duration,
    next_event_time: f64,
    horizon: f64,
    running: bool,
}

impl LookaheadScheduler {
    pub fn new(lookahead_secs: f64, poll_interval: Duration) -> Self {
        Self {
            lookahead: lookahead_secs.max(0.0),
            poll_interval,
            next_event_time: 0.0,
            horizon: 0.0,
            running: false,
        }
    }

    pub fn start(&mut self, now: f64) {
        self.running = true;
        self.resync(now);
    }

    /// Cancel polling. Later polls return nothing until `start`.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Forget everything scheduled ahead and restart the window at `now`.
    pub fn resync(&mut self, now: f64) {
        self.next_event_time = now;
        self.horizon = now;
        log::debug!("scheduler resync at {now:.4}s");
    }

    /// Events due in the uncovered part of `[now, now + lookahead)`, in
    /// non-decreasing time order.
    pub fn poll(
        &mut self,
        now: f64,
        timeline: &Timeline,
        notes: &[NoteEvent],
        metronome: bool,
    ) -> Vec<ScheduledEvent> {
        if !self.running {
            return Vec::new();
        }

        let window_start = self.horizon;
        let window_end = now + self.lookahead;
        let in_window = |t: f64| t >= window_start && t < window_end;
        let mut events = Vec::new();

        for note in notes {
            let on = timeline.clock_time(note.start);
            let off = timeline.clock_time(note.end());
            if in_window(on) {
                events.push(ScheduledEvent {
                    at: on,
                    kind: EventKind::NoteOn(note.id),
                });
            }
            if in_window(off) {
                events.push(ScheduledEvent {
                    at: off,
                    kind: EventKind::NoteOff(note.id),
                });
            }
        }

        let spb = timeline.seconds_per_beat;
        if spb > 0.0 {
            while self.next_event_time < window_end {
                // Snap to the first grid beat at or after next_event_time
                let beat = ((self.next_event_time - timeline.anchor) / spb - 1e-6)
                    .ceil()
                    .max(0.0);
                let at = timeline.anchor + beat * spb;
                if at >= window_end {
                    break;
                }
                if metronome {
                    let accent = (beat as u64) % timeline.beats_per_bar.max(1) as u64 == 0;
                    events.push(ScheduledEvent {
                        at,
                        kind: EventKind::Tick { accent },
                    });
                }
                self.next_event_time = at + spb;
            }
        }

        self.horizon = self.horizon.max(window_end);
        events.sort_by(|a, b| a.at.total_cmp(&b.at));
        if !events.is_empty() {
            log::trace!(
                "poll {now:.4}s: {} events in [{window_start:.4}, {window_end:.4})",
                events.len()
            );
        }
        events
    }

    /// Clock time of the next metronome slot not yet scheduled.
    pub fn next_event_time(&self) -> f64 {
        self.next_event_time
    }

    /// End of the window already examined.
    pub fn horizon(&self) -> f64 {
        self.horizon
    }

    pub fn lookahead(&self) -> f64 {
        self.lookahead
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}
