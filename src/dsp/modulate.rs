//! Block-rate modulation helpers.

/*
Block-Rate Modulation
=====================

Recomputing filter coefficients every sample is wasteful when the thing moving
the cutoff is an envelope or a 5 Hz LFO. Voices therefore render in short
CONTROL BLOCKS (at most `CONTROL_BLOCK` samples) and move the filter once per
block, using the block's average target cutoff:

    block   |------ 64 samples ------|------ 64 samples ------|
    cutoff  |  avg(env · lfo) = 1.2k |  avg(env · lfo) = 1.4k |

At 48 kHz a 64-sample block is 1.3 ms, far finer than any envelope stage or
LFO period this instrument uses, so the stepping is inaudible.

Gain and pitch are NOT block-rate: they are evaluated per sample from their
automation timelines because stepping them would click.

The target is responsible for clamping. `SVFilter` clamps cutoff to
[MIN_CUTOFF_HZ, 0.49·fs] when it computes coefficients.
*/

/// Largest span of samples rendered with one set of filter coefficients.
pub const CONTROL_BLOCK: usize = 64;

/// Average of a modulator signal over a block.
#[inline]
pub fn block_average(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f32>() / samples.len() as f32
}
