//! Signal summing and gain primitives.

/*
Summing Voices
==============

Mixing is addition. Every bus in the engine (oscillators into a sub-voice,
sub-voices into a voice, voices into the master) is a running sum:

    out[i] += gain · src[i]

Summing N signals at unit gain can reach N× full scale, so anything that sums
a variable number of copies pre-scales each copy. Unison does exactly this with
gain = 1/N, which keeps a 4-voice unison patch peaking where the single-voice
patch does (plus a little ripple where detuned copies beat against each other).

    1 voice   ████████████  peak 1.0
    4 voices  ███ ███ ███ ███  (each 0.25)  peak ≈ 1.0

Parallel filters are averaged rather than summed for the same reason.
*/

/// Accumulate `src` into `acc` scaled by `gain`.
#[inline]
pub fn sum_scaled_in_place(acc: &mut [f32], src: &[f32], gain: f32) {
    for (a, &s) in acc.iter_mut().zip(src.iter()) {
        *a += s * gain;
    }
}

/// Accumulate `src` into `acc` at unit gain.
#[inline]
pub fn sum_in_place(acc: &mut [f32], src: &[f32]) {
    sum_scaled_in_place(acc, src, 1.0);
}

/// Scale a buffer in place.
#[inline]
pub fn apply_gain(buffer: &mut [f32], gain: f32) {
    for sample in buffer.iter_mut() {
        *sample *= gain;
    }
}

/// Multiply `buffer` sample-by-sample with `gains`.
#[inline]
pub fn apply_gain_curve(buffer: &mut [f32], gains: &[f32]) {
    for (sample, &g) in buffer.iter_mut().zip(gains.iter()) {
        *sample *= g;
    }
}

/// Largest absolute sample value.
pub fn peak(buffer: &[f32]) -> f32 {
    buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()))
}
