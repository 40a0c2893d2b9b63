// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Compiler from block-structured pulse sequences to per-channel link lists.
//!
//! A program is one or more sequences of [`Block`]s. Each sequence is lowered
//! into one [`MiniLinkList`] per channel, all of equal total length, while the
//! sample data is deduplicated into a shared [`WaveformLibrary`] keyed by
//! content hash. The entry points are [`compile_program`] for logical channels
//! and [`compile_to_hardware`] for the physical channels of a
//! [`channel_library::ChannelLibrary`].

mod channel;
mod compile;
mod hardware;
mod link_list;
pub(crate) mod passes;
mod pulse;
pub mod settings;
mod waveform_library;

use std::fmt;

pub use channel::ChannelId;
pub use compile::{
    LinkListProgram, Sequences, compile_program, compile_program_with_library, compile_sequence,
};
pub use hardware::{compile_to_hardware, map_to_physical};
pub use link_list::{LLElement, MiniLinkList};
pub use passes::align::align;
pub use pulse::{Alignment, Block, Pulse, SequenceItem, normalize};
pub use sample_array::{ContentHash, SampleArray};
pub use settings::CompilerSettings;
pub use waveform_library::{WaveformKey, WaveformLibrary, taz_key};

/// How a channel of a later sequence differs from the first sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMismatch {
    /// Present in the first sequence but not in this one
    Missing,
    /// Present in this sequence but not in the first one
    Unexpected,
}

impl fmt::Display for ChannelMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelMismatch::Missing => write!(f, "missing"),
            ChannelMismatch::Unexpected => write!(f, "not used by the first sequence"),
        }
    }
}

fn describe_block(block: &Option<String>) -> String {
    match block {
        Some(label) => format!(" on block '{label}'"),
        None => String::new(),
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(
        "Sequence {sequence_index} does not address the same channels as sequence 0: channel '{channel}' is {mismatch}."
    )]
    ChannelSetMismatch {
        sequence_index: usize,
        channel: ChannelId,
        mismatch: ChannelMismatch,
    },

    #[error("Sequence {sequence_index} does not address any channel.")]
    EmptyChannelSet { sequence_index: usize },

    #[error(
        "Invalid alignment policy '{policy}'{}. Expected one of 'left', 'right' or 'center'.",
        describe_block(.block)
    )]
    InvalidAlignmentPolicy {
        block: Option<String>,
        policy: String,
    },

    #[error(
        "Entry {entry_index} on channel '{channel}' is marked as time-amplitude but its waveform is not constant."
    )]
    NonCollapsibleConstant {
        channel: ChannelId,
        entry_index: usize,
    },

    #[error("Waveform {key} on channel '{channel}' already refers to different samples.")]
    HashCollision { channel: ChannelId, key: WaveformKey },

    #[error("Pulse of {pulse_length} samples does not fit into a block of {block_length} samples.")]
    PulseExceedsBlock {
        pulse_length: usize,
        block_length: usize,
    },

    #[error("Waveform {key} referenced on channel '{channel}' is not in the waveform library.")]
    UnknownWaveform { channel: ChannelId, key: WaveformKey },

    #[error("Logical channel '{0}' is not mapped to a physical channel.")]
    UnmappedChannel(ChannelId),

    #[error(
        "Logical channels '{first}' and '{second}' both map onto physical channel '{physical}'."
    )]
    PhysicalChannelConflict {
        physical: ChannelId,
        first: ChannelId,
        second: ChannelId,
    },

    #[error(transparent)]
    ChannelLibrary(#[from] channel_library::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    pub fn new<T: fmt::Display>(msg: T) -> Self {
        Error::Anyhow(anyhow::anyhow!(msg.to_string()))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
