// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::str::FromStr;

use indexmap::IndexMap;
use sample_array::SampleArray;

use crate::channel::ChannelId;
use crate::{Error, Result};

/// Placement of a pulse inside a block that is longer than the pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Right,
    Center,
}

impl Alignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Right => "right",
            Alignment::Center => "center",
        }
    }
}

impl FromStr for Alignment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "left" => Ok(Alignment::Left),
            "right" => Ok(Alignment::Right),
            "center" => Ok(Alignment::Center),
            _ => Err(Error::InvalidAlignmentPolicy {
                block: None,
                policy: s.to_string(),
            }),
        }
    }
}

/// A sampled waveform with its phase and frame bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct Pulse {
    samples: SampleArray,
    /// Phase offset in radians, applied to this pulse only
    phase: f64,
    /// Frame rotation in radians, applied to every later pulse on the channel
    frame_change: f64,
    alignment: Alignment,
}

impl Pulse {
    pub fn new(samples: impl Into<SampleArray>) -> Self {
        Pulse {
            samples: samples.into(),
            phase: 0.0,
            frame_change: 0.0,
            alignment: Alignment::Left,
        }
    }

    /// A pulse without samples that only rotates the frame.
    pub fn frame_change_only(frame_change: f64) -> Self {
        Pulse::new(SampleArray::default()).with_frame_change(frame_change)
    }

    pub fn with_phase(mut self, phase: f64) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_frame_change(mut self, frame_change: f64) -> Self {
        self.frame_change = frame_change;
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn samples(&self) -> &SampleArray {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn frame_change(&self) -> f64 {
        self.frame_change
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }
}

/// Pulses that start together, at most one per channel.
///
/// The block lasts as long as its longest pulse. Shorter pulses are placed
/// according to the block's [`Alignment`]; channels without a pulse idle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    label: Option<String>,
    pulses: IndexMap<ChannelId, Pulse>,
    alignment: Alignment,
}

impl Block {
    pub fn new() -> Self {
        Block::default()
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Add `pulse` on `channel`, replacing any pulse already there.
    pub fn with_pulse(mut self, channel: impl Into<ChannelId>, pulse: Pulse) -> Self {
        self.pulses.insert(channel.into(), pulse);
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Set the alignment from its textual name.
    pub fn with_alignment_policy(self, policy: &str) -> Result<Self> {
        match policy.parse() {
            Ok(alignment) => Ok(self.with_alignment(alignment)),
            Err(_) => Err(Error::InvalidAlignmentPolicy {
                block: self.label.clone(),
                policy: policy.to_string(),
            }),
        }
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    pub fn channels_used(&self) -> impl Iterator<Item = &ChannelId> {
        self.pulses.keys()
    }

    pub fn pulse_for(&self, channel: &ChannelId) -> Option<&Pulse> {
        self.pulses.get(channel)
    }

    pub fn pulses(&self) -> impl Iterator<Item = (&ChannelId, &Pulse)> {
        self.pulses.iter()
    }

    /// Length of the longest pulse, zero for an empty block.
    pub fn duration_in_samples(&self) -> usize {
        self.pulses.values().map(Pulse::len).max().unwrap_or(0)
    }
}

/// Element of a user sequence: either a complete block or a bare pulse.
#[derive(Debug, Clone, PartialEq)]
pub enum SequenceItem {
    Pulse { channel: ChannelId, pulse: Pulse },
    Block(Block),
}

impl SequenceItem {
    pub fn pulse(channel: impl Into<ChannelId>, pulse: Pulse) -> Self {
        SequenceItem::Pulse {
            channel: channel.into(),
            pulse,
        }
    }

    /// Promote a bare pulse to a single-channel block carrying the pulse's alignment.
    pub fn into_block(self) -> Block {
        match self {
            SequenceItem::Block(block) => block,
            SequenceItem::Pulse { channel, pulse } => {
                let alignment = pulse.alignment();
                Block::new()
                    .with_alignment(alignment)
                    .with_pulse(channel, pulse)
            }
        }
    }
}

impl From<Block> for SequenceItem {
    fn from(block: Block) -> Self {
        SequenceItem::Block(block)
    }
}

pub fn normalize(items: Vec<SequenceItem>) -> Vec<Block> {
    items.into_iter().map(SequenceItem::into_block).collect()
}
