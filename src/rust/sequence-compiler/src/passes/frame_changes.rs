// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use indexmap::IndexMap;
use sequence_log::{diagnostic, error};

use crate::channel::ChannelId;
use crate::link_list::MiniLinkList;
use crate::settings::CompilerSettings;
use crate::waveform_library::WaveformLibrary;
use crate::{Error, Result};

/// Rotate every entry of `link_list` into its frame and collapse constant waveforms.
///
/// Unrotated shapes are read from `sources`, the played waveforms are written
/// to `library`. The frame starts at zero and accumulates the frame change of
/// each entry after that entry has been processed. Since lookups go through the
/// unrotated key, applying the pass again yields the same keys.
pub(crate) fn apply_frame_changes(
    channel: &ChannelId,
    link_list: &mut MiniLinkList,
    sources: &WaveformLibrary,
    library: &mut WaveformLibrary,
    settings: &CompilerSettings,
) -> Result<()> {
    library.register_channel(channel);
    let mut frame = 0.0;
    for (entry_index, entry) in link_list.iter_mut().enumerate() {
        let shape = sources.require(channel, &entry.source_key())?;
        let is_constant = shape.is_constant();
        if entry.is_time_amplitude && !is_constant {
            error!(
                "Entry {} on channel '{}' is time-amplitude with {} non-constant samples.",
                entry_index,
                channel,
                shape.len()
            );
            return Err(Error::NonCollapsibleConstant {
                channel: channel.clone(),
                entry_index,
            });
        }
        let shape = if is_constant && (entry.is_time_amplitude || settings.detect_time_amplitude())
        {
            entry.is_time_amplitude = true;
            shape.truncated(1)
        } else {
            shape.clone()
        };
        entry.waveform_key = library.insert(channel, shape.rotated(entry.phase + frame))?;
        frame += entry.frame_change;
    }
    diagnostic!(
        "Channel '{}' ends in frame {} with {} waveform(s).",
        channel,
        frame,
        library.num_waveforms(channel)
    );
    Ok(())
}

pub(crate) fn apply_frame_changes_all(
    link_lists: &mut IndexMap<ChannelId, MiniLinkList>,
    sources: &WaveformLibrary,
    library: &mut WaveformLibrary,
    settings: &CompilerSettings,
) -> Result<()> {
    for (channel, link_list) in link_lists.iter_mut() {
        apply_frame_changes(channel, link_list, sources, library, settings)?;
    }
    Ok(())
}
