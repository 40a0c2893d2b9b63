// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use indexmap::{IndexMap, IndexSet};
use sequence_log::{debug, warn};

use crate::Result;
use crate::channel::ChannelId;
use crate::link_list::{LLElement, MiniLinkList};
use crate::passes::align::align;
use crate::pulse::Block;
use crate::settings::CompilerSettings;
use crate::waveform_library::WaveformLibrary;

/// Channels addressed by any block of `sequence`, in order of first use.
pub(crate) fn find_unique_channels(sequence: &[Block]) -> IndexSet<ChannelId> {
    sequence
        .iter()
        .flat_map(Block::channels_used)
        .cloned()
        .collect()
}

/// Lower one sequence into a link list per channel.
///
/// Every block contributes exactly its duration to every channel, so all
/// returned link lists have the same total length. Blocks of zero duration
/// are dropped.
pub(crate) fn build_link_lists(
    sequence: &[Block],
    library: &mut WaveformLibrary,
    settings: &CompilerSettings,
) -> Result<IndexMap<ChannelId, MiniLinkList>> {
    let mut link_lists: IndexMap<ChannelId, MiniLinkList> = find_unique_channels(sequence)
        .into_iter()
        .map(|channel| {
            library.register_channel(&channel);
            (channel, MiniLinkList::new())
        })
        .collect();

    for (block_index, block) in sequence.iter().enumerate() {
        let block_length = block.duration_in_samples();
        if block_length == 0 {
            let dropped_frame_changes = block
                .pulses()
                .filter(|(_, pulse)| pulse.frame_change() != 0.0)
                .count();
            if dropped_frame_changes > 0 {
                warn!(
                    "Dropping zero-length block {} ({:?}) with {} frame change(s).",
                    block_index,
                    block.label().unwrap_or("unlabelled"),
                    dropped_frame_changes
                );
            }
            continue;
        }
        for (channel, link_list) in link_lists.iter_mut() {
            match block.pulse_for(channel) {
                Some(pulse) => {
                    let (shape, entries) = align(
                        pulse,
                        block_length,
                        block.alignment(),
                        settings.padding_cutoff(),
                    )?;
                    library.insert(channel, shape)?;
                    link_list.extend(entries);
                }
                None => link_list.push(LLElement::padding(block_length)),
            }
        }
    }

    for (channel, link_list) in link_lists.iter() {
        debug!(
            "Channel '{}': {} entries, {} samples.",
            channel,
            link_list.len(),
            link_list.total_length()
        );
    }
    Ok(link_lists)
}
