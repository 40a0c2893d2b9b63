// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use sample_array::SampleArray;

use crate::link_list::LLElement;
use crate::pulse::{Alignment, Pulse};
use crate::{Error, Result};

/// Fit `pulse` into a block of `block_length` samples.
///
/// Padding below `cutoff` samples (`2 * cutoff` for center alignment) is
/// merged into the waveform, producing a single entry of `block_length`.
/// Longer padding is emitted as separate time-amplitude zero entries next to
/// the unpadded pulse. Returns the waveform the pulse entry refers to
/// together with the entries, in playback order.
pub fn align(
    pulse: &Pulse,
    block_length: usize,
    alignment: Alignment,
    cutoff: usize,
) -> Result<(SampleArray, Vec<LLElement>)> {
    let pulse_length = pulse.len();
    let Some(pad) = block_length.checked_sub(pulse_length) else {
        return Err(Error::PulseExceedsBlock {
            pulse_length,
            block_length,
        });
    };
    let samples = pulse.samples();

    let (before, after) = match alignment {
        Alignment::Left => (0, pad),
        Alignment::Right => (pad, 0),
        Alignment::Center => (pad / 2, pad - pad / 2),
    };
    let merge_below = match alignment {
        Alignment::Center => cutoff.saturating_mul(2),
        Alignment::Left | Alignment::Right => cutoff,
    };

    if pad == 0 || pad < merge_below {
        let shape = samples.padded(before, after);
        let entry = LLElement::for_pulse(shape.content_hash(), block_length, pulse);
        return Ok((shape, vec![entry]));
    }

    let shape = samples.clone();
    let mut entries = Vec::with_capacity(3);
    if before > 0 {
        entries.push(LLElement::padding(before));
    }
    // Kept even when empty so that its frame change is not lost.
    entries.push(LLElement::for_pulse(
        shape.content_hash(),
        pulse_length,
        pulse,
    ));
    if after > 0 {
        entries.push(LLElement::padding(after));
    }
    Ok((shape, entries))
}
