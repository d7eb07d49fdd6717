/*
Parameter Automation
====================

A voice never changes its gain, cutoff, or pitch by poking a value at "some
point soon". Instead every moving parameter owns a timeline of automation
events expressed in audio-clock seconds, and the renderer asks "what is the
value at time t?" for each sample (or block). Scheduling ahead of time is then
exact: an envelope that starts at t0 starts at t0, no matter when the code that
scheduled it happened to run.

Event kinds
-----------

  Set(t, v)            Jump to v at time t and hold.
  Linear(t, v)         Ramp linearly from the previous event to v, arriving at t.
  Exponential(t, v)    Ramp geometrically from the previous event to v, arriving at t.

A ramp always starts from the event before it: its (time, value) pair is the
origin. With no earlier event the ramp starts from the parameter's default at
time 0.

    value
      1 ┤      ╱‾‾‾‾╲______            Set(0, 0)
        │     ╱             ╲          Linear(0.01, 1)
      s ┤    ╱               ╲         Linear(0.11, s)
        │   ╱                 ╲        ...
      0 ┼──╱───────────────────╲──→ t


Cancel and hold
---------------

Releasing a note must start from whatever the parameter is doing RIGHT NOW,
not from the value it was scheduled to reach. `cancel_and_hold_at_time(t)`
evaluates the timeline at t, drops every event at or after t (including the
ramp currently in flight), and pins the captured value with a Set event. A
release ramp scheduled afterwards therefore starts exactly where the sound is.


Exponential ramps from zero
---------------------------

A geometric curve cannot leave 0. Rather than holding 0 and jumping at the end,
ramps whose origin is ≤ 0 start from `EXP_RAMP_FLOOR`. For pitch glides this
means a note that glides "from nothing" sweeps up audibly from a
silence-equivalent frequency, which is the instrument's established behaviour.
*/

/// Origin used by exponential ramps that would otherwise start at or below zero.
pub const EXP_RAMP_FLOOR: f32 = 1.0e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Automation {
    Set { time: f64, value: f32 },
    Linear { time: f64, value: f32 },
    Exponential { time: f64, value: f32 },
}

impl Automation {
    fn time(&self) -> f64 {
        match *self {
            Automation::Set { time, .. }
            | Automation::Linear { time, .. }
            | Automation::Exponential { time, .. } => time,
        }
    }

    fn value(&self) -> f32 {
        match *self {
            Automation::Set { value, .. }
            | Automation::Linear { value, .. }
            | Automation::Exponential { value, .. } => value,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AudioParam {
    default_value: f32,
    events: Vec<Automation>,
}

impl AudioParam {
    pub fn new(default_value: f32) -> Self {
        Self {
            default_value,
            events: Vec::with_capacity(8),
        }
    }

    pub fn default_value(&self) -> f32 {
        self.default_value
    }

    pub fn set_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(Automation::Set { time, value });
    }

    pub fn linear_ramp_to_value_at_time(&mut self, value: f32, end_time: f64) {
        self.insert(Automation::Linear {
            time: end_time,
            value,
        });
    }

    pub fn exponential_ramp_to_value_at_time(&mut self, value: f32, end_time: f64) {
        self.insert(Automation::Exponential {
            time: end_time,
            value,
        });
    }

    /// Drop every event scheduled at or after `from`.
    pub fn cancel_scheduled_values(&mut self, from: f64) {
        self.events.retain(|e| e.time() < from);
    }

    /// Capture the value at `time`, drop everything from `time` on, and hold
    /// the captured value. Returns the captured value.
    pub fn cancel_and_hold_at_time(&mut self, time: f64) -> f32 {
        let held = self.value_at(time);
        self.cancel_scheduled_values(time);
        self.set_value_at_time(held, time);
        held
    }

    /// Number of pending automation events (for tests and diagnostics).
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Evaluate the timeline at `time`.
    pub fn value_at(&self, time: f64) -> f32 {
        // Index of the first event strictly after `time`
        let next_index = self.events.partition_point(|e| e.time() <= time);

        let (origin_time, origin_value) = match next_index.checked_sub(1) {
            Some(i) => (self.events[i].time(), self.events[i].value()),
            None => (0.0, self.default_value),
        };

        match self.events.get(next_index) {
            Some(Automation::Linear { time: end, value }) => {
                let span = end - origin_time;
                if span <= 0.0 {
                    return *value;
                }
                let progress = ((time - origin_time) / span).clamp(0.0, 1.0) as f32;
                origin_value + (value - origin_value) * progress
            }
            Some(Automation::Exponential { time: end, value }) => {
                let span = end - origin_time;
                if span <= 0.0 {
                    return *value;
                }
                let progress = ((time - origin_time) / span).clamp(0.0, 1.0) as f32;
                let start = if origin_value <= 0.0 {
                    EXP_RAMP_FLOOR
                } else {
                    origin_value
                };
                let target = value.max(EXP_RAMP_FLOOR);
                start * (target / start).powf(progress)
            }
            _ => origin_value,
        }
    }

    /// Fill `out` with per-sample values starting at `start_time`.
    pub fn render(&self, out: &mut [f32], start_time: f64, sample_rate: f32) {
        let dt = 1.0 / sample_rate as f64;
        for (i, sample) in out.iter_mut().enumerate() {
            *sample = self.value_at(start_time + i as f64 * dt);
        }
    }

    fn insert(&mut self, event: Automation) {
        // Events at the same time keep insertion order
        let at = self.events.partition_point(|e| e.time() <= event.time());
        self.events.insert(at, event);
    }
}
