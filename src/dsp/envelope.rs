use serde::{Deserialize, Serialize};

use crate::dsp::param::AudioParam;

/*
ADSR Envelopes as Automation
============================

An ADSR envelope describes how a parameter moves over the life of a note:

  Level
   peak ┐     ╱╲
        │    ╱  ╲___________
  floor'│   ╱               ╲
        │  ╱                 ╲
   from └─╱───────────────────╲──→ Time
        Attack Decay  Sustain  Release
         (A)   (D)      (S)      (R)

Rather than stepping a state machine every sample, the envelope is written
onto an `AudioParam` timeline the moment the note starts:

    Set(t0, from)
    Linear(t0 + A, peak)
    Linear(t0 + A + D, sustain_level)

and the sustain level simply holds until a release is scheduled. Release is
written later, at note-off, starting from the value the parameter actually has
at that moment (see `dsp/param.rs`, cancel and hold).

For amplitude, `from = 0`, `peak = 1`, `sustain_level = sustain`. The same
shape drives filter cutoff with `from = base`, `peak = base·(1 + amount)` and
`sustain_level = base·(1 + amount·sustain)`.

All ramps are LINEAR, like the classic analog-style envelopes: predictable and
punchy. Zero-length stages become instantaneous Set events so a zero attack
really does start at full level.
*/

/// Envelope timing and sustain fraction. Times are in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Adsr {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for Adsr {
    fn default() -> Self {
        Self {
            attack: 0.01,
            decay: 0.1,
            sustain: 0.7,
            release: 0.3,
        }
    }
}

impl Adsr {
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
        .sanitized()
    }

    /// Clamp every field into its valid range. Non-finite times become zero.
    pub fn sanitized(self) -> Self {
        fn time(t: f32) -> f32 {
            if t.is_finite() {
                t.max(0.0)
            } else {
                0.0
            }
        }

        let sustain = if self.sustain.is_finite() {
            self.sustain.clamp(0.0, 1.0)
        } else {
            1.0
        };

        Self {
            attack: time(self.attack),
            decay: time(self.decay),
            sustain,
            release: time(self.release),
        }
    }

    /// Seconds from note start until the sustain stage is reached.
    pub fn onset_duration(&self) -> f32 {
        self.attack + self.decay
    }

    /// Write the attack and decay stages onto `param`, starting at `t0`.
    pub fn schedule_onset(
        &self,
        param: &mut AudioParam,
        t0: f64,
        from: f32,
        peak: f32,
        sustain_level: f32,
    ) {
        let attack_end = t0 + self.attack as f64;
        let decay_end = attack_end + self.decay as f64;

        param.set_value_at_time(from, t0);
        if self.attack > 0.0 {
            param.linear_ramp_to_value_at_time(peak, attack_end);
        } else {
            param.set_value_at_time(peak, t0);
        }

        if self.decay > 0.0 {
            param.linear_ramp_to_value_at_time(sustain_level, decay_end);
        } else {
            param.set_value_at_time(sustain_level, attack_end);
        }
    }

    /// Ramp `param` from its current value at `at` to `target` over `release`.
    ///
    /// Returns the value the release started from.
    pub fn schedule_release(param: &mut AudioParam, at: f64, target: f32, release: f32) -> f32 {
        let start = param.cancel_and_hold_at_time(at);
        if release > 0.0 {
            param.linear_ramp_to_value_at_time(target, at + release as f64);
        } else {
            param.set_value_at_time(target, at);
        }
        start
    }

    /// Amplitude level `elapsed` seconds after note start, gate held.
    pub fn level_at(&self, elapsed: f32) -> f32 {
        if elapsed < 0.0 {
            return 0.0;
        }
        if elapsed < self.attack {
            return elapsed / self.attack;
        }

        let into_decay = elapsed - self.attack;
        if into_decay < self.decay {
            let progress = into_decay / self.decay;
            return 1.0 - (1.0 - self.sustain) * progress;
        }

        self.sustain
    }
}
