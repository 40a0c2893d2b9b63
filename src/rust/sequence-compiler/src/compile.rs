// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use indexmap::{IndexMap, IndexSet};
use sequence_log::{debug, info, warn};
use serde::Serialize;

use crate::channel::ChannelId;
use crate::link_list::MiniLinkList;
use crate::passes::build_link_list::{build_link_lists, find_unique_channels};
use crate::passes::frame_changes::apply_frame_changes_all;
use crate::pulse::{Block, SequenceItem, normalize};
use crate::settings::CompilerSettings;
use crate::waveform_library::WaveformLibrary;
use crate::{ChannelMismatch, Error, Result};

/// Program input: one sequence or several sharing the same channels.
#[derive(Debug, Clone, PartialEq)]
pub enum Sequences {
    Single(Vec<SequenceItem>),
    Many(Vec<Vec<SequenceItem>>),
}

impl Sequences {
    fn into_blocks(self) -> Vec<Vec<Block>> {
        match self {
            Sequences::Single(items) => vec![normalize(items)],
            Sequences::Many(sequences) => sequences.into_iter().map(normalize).collect(),
        }
    }
}

impl From<Vec<SequenceItem>> for Sequences {
    fn from(items: Vec<SequenceItem>) -> Self {
        Sequences::Single(items)
    }
}

impl From<Vec<Vec<SequenceItem>>> for Sequences {
    fn from(sequences: Vec<Vec<SequenceItem>>) -> Self {
        Sequences::Many(sequences)
    }
}

impl From<Vec<Block>> for Sequences {
    fn from(blocks: Vec<Block>) -> Self {
        Sequences::Single(blocks.into_iter().map(SequenceItem::Block).collect())
    }
}

impl From<Vec<Vec<Block>>> for Sequences {
    fn from(sequences: Vec<Vec<Block>>) -> Self {
        Sequences::Many(
            sequences
                .into_iter()
                .map(|blocks| blocks.into_iter().map(SequenceItem::Block).collect())
                .collect(),
        )
    }
}

/// Compiled program: for every channel one link list per sequence, plus the
/// waveforms they refer to.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LinkListProgram {
    link_lists: IndexMap<ChannelId, Vec<MiniLinkList>>,
    waveforms: WaveformLibrary,
}

impl LinkListProgram {
    pub(crate) fn from_parts(
        link_lists: IndexMap<ChannelId, Vec<MiniLinkList>>,
        waveforms: WaveformLibrary,
    ) -> Self {
        LinkListProgram {
            link_lists,
            waveforms,
        }
    }

    pub fn into_parts(self) -> (IndexMap<ChannelId, Vec<MiniLinkList>>, WaveformLibrary) {
        (self.link_lists, self.waveforms)
    }

    pub fn link_lists(&self) -> &IndexMap<ChannelId, Vec<MiniLinkList>> {
        &self.link_lists
    }

    /// Link lists of `channel`, indexed by sequence.
    pub fn channel(&self, channel: &str) -> Option<&[MiniLinkList]> {
        self.link_lists.get(channel).map(Vec::as_slice)
    }

    pub fn channels(&self) -> impl Iterator<Item = &ChannelId> {
        self.link_lists.keys()
    }

    pub fn waveforms(&self) -> &WaveformLibrary {
        &self.waveforms
    }

    pub fn num_sequences(&self) -> usize {
        self.link_lists.values().next().map_or(0, Vec::len)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Anyhow(e.into()))
    }
}

/// Lower a single normalized sequence and rotate it into its frames.
///
/// Only the waveforms that are actually played end up in `library`; the
/// aligned shapes before rotation live in a scratch library for the duration
/// of the call.
pub fn compile_sequence(
    sequence: &[Block],
    library: &mut WaveformLibrary,
    settings: &CompilerSettings,
) -> Result<IndexMap<ChannelId, MiniLinkList>> {
    let mut sources = WaveformLibrary::new();
    let mut link_lists = build_link_lists(sequence, &mut sources, settings)?;
    apply_frame_changes_all(&mut link_lists, &sources, library, settings)?;
    Ok(link_lists)
}

fn validate_channel_sets(sequences: &[Vec<Block>]) -> Result<IndexSet<ChannelId>> {
    let channel_sets: Vec<IndexSet<ChannelId>> =
        sequences.iter().map(|s| find_unique_channels(s)).collect();
    if let Some(sequence_index) = channel_sets.iter().position(IndexSet::is_empty) {
        return Err(Error::EmptyChannelSet { sequence_index });
    }
    let Some((prototype, rest)) = channel_sets.split_first() else {
        return Ok(IndexSet::new());
    };
    for (offset, channels) in rest.iter().enumerate() {
        let sequence_index = offset + 1;
        let mismatch = prototype
            .iter()
            .find(|c| !channels.contains(*c))
            .map(|c| (c, ChannelMismatch::Missing))
            .or_else(|| {
                channels
                    .iter()
                    .find(|c| !prototype.contains(*c))
                    .map(|c| (c, ChannelMismatch::Unexpected))
            });
        if let Some((channel, mismatch)) = mismatch {
            return Err(Error::ChannelSetMismatch {
                sequence_index,
                channel: channel.clone(),
                mismatch,
            });
        }
    }
    Ok(prototype.clone())
}

/// Compile a program starting from an empty waveform library.
pub fn compile_program(
    sequences: impl Into<Sequences>,
    settings: &CompilerSettings,
) -> Result<LinkListProgram> {
    compile_program_with_library(sequences, WaveformLibrary::new(), settings)
}

/// Compile a program, adding its waveforms to `library`.
///
/// All sequences must address the same, non-empty set of channels as the
/// first one. This is checked before any sequence is compiled, so a mismatch
/// produces no output.
pub fn compile_program_with_library(
    sequences: impl Into<Sequences>,
    mut library: WaveformLibrary,
    settings: &CompilerSettings,
) -> Result<LinkListProgram> {
    let mut settings = settings.clone();
    for change in settings.sanitize() {
        warn!(
            "Setting '{}' changed from {} to {}: {}",
            change.field,
            change.original,
            change.sanitized,
            change.reason
        );
    }

    let sequences = sequences.into().into_blocks();
    let channels = validate_channel_sets(&sequences)?;

    let mut link_lists: IndexMap<ChannelId, Vec<MiniLinkList>> = channels
        .into_iter()
        .map(|channel| (channel, Vec::with_capacity(sequences.len())))
        .collect();
    for (sequence_index, sequence) in sequences.iter().enumerate() {
        let compiled = compile_sequence(sequence, &mut library, &settings)?;
        debug!(
            "Compiled sequence {} with {} block(s).",
            sequence_index,
            sequence.len()
        );
        for (channel, link_list) in compiled {
            let per_sequence = link_lists
                .get_mut(&channel)
                .ok_or_else(|| Error::new(format!("Channel '{channel}' was not validated")))?;
            per_sequence.push(link_list);
        }
    }

    let num_waveforms: usize = library.channels().map(|c| library.num_waveforms(c)).sum();
    info!(
        "Compiled {} sequence(s) on {} channel(s) into {} waveform(s).",
        sequences.len(),
        link_lists.len(),
        num_waveforms
    );
    Ok(LinkListProgram::from_parts(link_lists, library))
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use num_complex::Complex64;
    use proptest::prelude::*;
    use sample_array::SampleArray;

    use super::*;
    use crate::pulse::{Alignment, Pulse};
    use crate::waveform_library::taz_key;

    fn square(amplitude: f64, length: usize) -> Pulse {
        Pulse::new(SampleArray::constant(Complex64::new(amplitude, 0.0), length))
    }

    fn gaussian(length: usize) -> Pulse {
        let center = length as f64 / 2.0;
        let sigma = length as f64 / 6.0;
        Pulse::new(SampleArray::from_real(
            (0..length).map(|i| (-((i as f64 - center) / sigma).powi(2) / 2.0).exp()),
        ))
    }

    fn assert_sync(program: &LinkListProgram) {
        for sequence_index in 0..program.num_sequences() {
            let totals: Vec<usize> = program
                .link_lists()
                .values()
                .map(|lls| lls[sequence_index].total_length())
                .collect();
            assert!(
                totals.windows(2).all(|w| w[0] == w[1]),
                "channels out of sync in sequence {sequence_index}: {totals:?}"
            );
        }
    }

    fn assert_keys_resolve(program: &LinkListProgram) {
        for (channel, lls) in program.link_lists() {
            for entry in lls.iter().flat_map(|ll| ll.iter()) {
                assert!(
                    program.waveforms().get(channel, &entry.waveform_key).is_some(),
                    "missing waveform on {channel}"
                );
            }
        }
    }

    #[test]
    fn test_two_constant_blocks() {
        let sequence = vec![
            SequenceItem::pulse("A", square(1.0, 10).with_alignment(Alignment::Left)),
            SequenceItem::pulse("A", square(0.5, 5)),
        ];
        let program = compile_program(sequence, &CompilerSettings::default()).unwrap();
        let a = &program.channel("A").unwrap()[0];
        let lengths: Vec<_> = a.iter().map(|e| e.length).collect();
        assert_eq!(lengths, vec![10, 5]);
        assert!(a.iter().all(|e| e.is_time_amplitude));
        assert!(program.waveforms().num_waveforms(&ChannelId::from("A")) <= 3);
    }

    #[test]
    fn test_zero_blocks_contribute_nothing() {
        let sequence = vec![
            Block::new().with_pulse("q1", gaussian(8)),
            Block::new()
                .with_pulse("q1", Pulse::frame_change_only(0.3))
                .with_pulse("q2", Pulse::frame_change_only(0.3)),
            Block::new().with_pulse("q2", gaussian(8)),
        ];
        let program = compile_program(sequence, &CompilerSettings::default()).unwrap();
        for lls in program.link_lists().values() {
            assert_eq!(lls[0].len(), 2);
            assert_eq!(lls[0].total_length(), 16);
        }
    }

    #[test]
    fn test_constant_pulse_and_padding() {
        let sequence = vec![
            Block::new()
                .with_pulse("q1", square(1.0, 10))
                .with_pulse("q2", square(1.0, 5)),
        ];
        let program = compile_program(sequence, &CompilerSettings::default()).unwrap();

        let q1 = &program.channel("q1").unwrap()[0];
        assert_eq!(q1.len(), 1);
        assert_eq!(q1.entries()[0].length, 10);
        assert!(q1.entries()[0].is_time_amplitude);

        // pad = 5 < 12 so the padding is merged, and the padded shape is not constant
        let q2 = &program.channel("q2").unwrap()[0];
        assert_eq!(q2.len(), 1);
        assert_eq!(q2.entries()[0].length, 10);
        assert!(!q2.entries()[0].is_time_amplitude);
        let stored = program
            .waveforms()
            .get(&ChannelId::from("q2"), &q2.entries()[0].waveform_key)
            .unwrap();
        assert_eq!(stored.len(), 10);

        let q1_stored = program
            .waveforms()
            .get(&ChannelId::from("q1"), &q1.entries()[0].waveform_key)
            .unwrap();
        assert_eq!(q1_stored, &SampleArray::constant(Complex64::new(1.0, 0.0), 1));
        assert_sync(&program);
    }

    #[test]
    fn test_constant_pulse_and_split_padding() {
        let sequence = vec![
            Block::new()
                .with_pulse("q1", square(1.0, 40))
                .with_pulse("q2", square(1.0, 10)),
        ];
        let program = compile_program(sequence, &CompilerSettings::default()).unwrap();
        let q2 = &program.channel("q2").unwrap()[0];
        let lengths: Vec<_> = q2.iter().map(|e| e.length).collect();
        assert_eq!(lengths, vec![10, 30]);
        assert!(q2.iter().all(|e| e.is_time_amplitude));
        assert_eq!(q2.entries()[1].waveform_key, taz_key());
        assert_sync(&program);
    }

    #[test]
    fn test_frame_change_carries_into_next_block() {
        let sequence = vec![
            SequenceItem::pulse("q1", gaussian(16).with_frame_change(PI / 2.0)),
            SequenceItem::pulse("q1", gaussian(16)),
        ];
        let program = compile_program(sequence, &CompilerSettings::default()).unwrap();
        let q1 = &program.channel("q1").unwrap()[0];
        let first = q1.entries()[0].waveform_key;
        let second = q1.entries()[1].waveform_key;
        assert_ne!(first, second);
        assert_eq!(first, gaussian(16).samples().content_hash());
        let rotated = program
            .waveforms()
            .get(&ChannelId::from("q1"), &second)
            .unwrap();
        let original = gaussian(16);
        let want = original.samples().as_slice()[8] * Complex64::new(0.0, 1.0);
        assert!((rotated.as_slice()[8] - want).norm() < 1e-12);
    }

    #[test]
    fn test_multiple_sequences_share_library() {
        let seq = || {
            vec![
                Block::new()
                    .with_pulse("q1", gaussian(20))
                    .with_pulse("M-q1", square(0.5, 60)),
            ]
        };
        let program = compile_program(vec![seq(), seq(), seq()], &CompilerSettings::default())
            .unwrap();
        assert_eq!(program.num_sequences(), 3);
        let q1 = program.channel("q1").unwrap();
        assert_eq!(q1[0], q1[1]);
        assert_eq!(q1[1], q1[2]);
        // TAZ plus one gaussian, for all three sequences
        assert_eq!(program.waveforms().num_waveforms(&ChannelId::from("q1")), 2);
        assert_sync(&program);
        assert_keys_resolve(&program);
    }

    #[test]
    fn test_channel_set_mismatch() {
        let first = vec![
            Block::new()
                .with_pulse("q1", gaussian(8))
                .with_pulse("q2", gaussian(8)),
        ];
        let second = vec![Block::new().with_pulse("q1", gaussian(8))];
        let err = compile_program(vec![first.clone(), second], &CompilerSettings::default())
            .unwrap_err();
        match err {
            Error::ChannelSetMismatch {
                sequence_index,
                channel,
                mismatch,
            } => {
                assert_eq!(sequence_index, 1);
                assert_eq!(channel.as_str(), "q2");
                assert_eq!(mismatch, ChannelMismatch::Missing);
            }
            other => panic!("unexpected error: {other}"),
        }

        let third = vec![
            Block::new()
                .with_pulse("q1", gaussian(8))
                .with_pulse("q2", gaussian(8))
                .with_pulse("q3", gaussian(8)),
        ];
        let err = compile_program(vec![first.clone(), first, third], &CompilerSettings::default())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ChannelSetMismatch {
                sequence_index: 2,
                mismatch: ChannelMismatch::Unexpected,
                ..
            }
        ));
    }

    #[test]
    fn test_channel_order_may_differ_between_sequences() {
        let first = vec![
            Block::new().with_pulse("q1", gaussian(8)),
            Block::new().with_pulse("q2", gaussian(8)),
        ];
        let second = vec![
            Block::new().with_pulse("q2", gaussian(8)),
            Block::new().with_pulse("q1", gaussian(8)),
        ];
        let program =
            compile_program(vec![first, second], &CompilerSettings::default()).unwrap();
        let channels: Vec<_> = program.channels().map(ChannelId::as_str).collect();
        assert_eq!(channels, vec!["q1", "q2"]);
        assert_sync(&program);
    }

    #[test]
    fn test_preseeded_library_is_extended() {
        let settings = CompilerSettings::default();
        let first = compile_program(vec![Block::new().with_pulse("q1", gaussian(12))], &settings)
            .unwrap();
        let (_, library) = first.into_parts();
        let second = compile_program_with_library(
            vec![Block::new().with_pulse("q1", gaussian(14))],
            library,
            &settings,
        )
        .unwrap();
        // TAZ plus both gaussians
        assert_eq!(second.waveforms().num_waveforms(&ChannelId::from("q1")), 3);
    }

    #[test]
    fn test_sequences_without_channels_are_rejected() {
        let settings = CompilerSettings::default();
        let err = compile_program(vec![vec![Block::new()], vec![Block::new()]], &settings)
            .unwrap_err();
        assert!(matches!(err, Error::EmptyChannelSet { sequence_index: 0 }));

        // a label alone does not address a channel
        let err = compile_program(vec![Block::new().with_label("idle")], &settings).unwrap_err();
        assert!(matches!(err, Error::EmptyChannelSet { sequence_index: 0 }));

        let sequences = vec![
            vec![Block::new().with_pulse("q1", square(1.0, 4))],
            Vec::new(),
        ];
        let err = compile_program(sequences, &settings).unwrap_err();
        assert!(matches!(err, Error::EmptyChannelSet { sequence_index: 1 }));
    }

    #[test]
    fn test_no_sequences_compile_to_empty_program() {
        let program =
            compile_program(Vec::<Vec<Block>>::new(), &CompilerSettings::default()).unwrap();
        assert_eq!(program.num_sequences(), 0);
        assert!(program.waveforms().is_empty());
    }

    #[test]
    fn test_to_json() {
        let program = compile_program(
            vec![Block::new().with_pulse("q1", square(0.5, 4))],
            &CompilerSettings::default(),
        )
        .unwrap();
        let json: serde_json::Value = serde_json::from_str(&program.to_json().unwrap()).unwrap();
        assert_eq!(json["link_lists"]["q1"][0][0]["length"], 4);
        assert_eq!(json["link_lists"]["q1"][0][0]["is_time_amplitude"], true);
        assert!(json["waveforms"]["q1"].is_object());
    }

    #[test]
    fn test_sequences_compile_on_separate_threads() {
        let settings = CompilerSettings::default();
        let make = |amplitude: f64| {
            vec![
                Block::new()
                    .with_alignment(Alignment::Center)
                    .with_pulse("q1", square(amplitude, 30))
                    .with_pulse("q2", gaussian(10)),
            ]
        };
        let expected = compile_program(make(0.25), &settings).unwrap();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let settings = settings.clone();
                let sequence = make(0.25);
                std::thread::spawn(move || compile_program(sequence, &settings))
            })
            .collect();
        for handle in handles {
            let program = handle.join().unwrap().unwrap();
            assert_eq!(program, expected);
        }
    }

    fn arb_pulse() -> impl Strategy<Value = Pulse> {
        (
            prop::collection::vec(-1.0f64..1.0, 0..40),
            prop::sample::select(vec![Alignment::Left, Alignment::Right, Alignment::Center]),
            prop::sample::select(vec![0.0, 0.5, -1.25]),
        )
            .prop_map(|(samples, alignment, frame_change)| {
                Pulse::new(SampleArray::from_real(samples))
                    .with_alignment(alignment)
                    .with_frame_change(frame_change)
            })
    }

    fn arb_block() -> impl Strategy<Value = Block> {
        (
            prop::collection::vec(prop::option::of(arb_pulse()), 3),
            prop::sample::select(vec![Alignment::Left, Alignment::Right, Alignment::Center]),
        )
            .prop_map(|(pulses, alignment)| {
                pulses.into_iter().zip(["q1", "q2", "M-q1"]).fold(
                    Block::new().with_alignment(alignment),
                    |block, (pulse, channel)| match pulse {
                        Some(pulse) => block.with_pulse(channel, pulse),
                        None => block,
                    },
                )
            })
    }

    proptest! {
        #[test]
        fn test_channels_stay_in_sync(
            blocks in prop::collection::vec(arb_block(), 0..12),
            cutoff in 0usize..20,
        ) {
            let expected: usize = blocks.iter().map(Block::duration_in_samples).sum();
            let settings = CompilerSettings::new(cutoff, true);
            if find_unique_channels(&blocks).is_empty() {
                let rejected = matches!(
                    compile_program(blocks, &settings),
                    Err(Error::EmptyChannelSet { sequence_index: 0 })
                );
                prop_assert!(rejected);
                return Ok(());
            }
            let program = compile_program(blocks, &settings).unwrap();
            for lls in program.link_lists().values() {
                prop_assert_eq!(lls[0].total_length(), expected);
            }
            assert_keys_resolve(&program);
        }
    }
}
