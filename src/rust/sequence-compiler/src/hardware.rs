// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use channel_library::ChannelLibrary;
use indexmap::IndexMap;
use sequence_log::info;

use crate::channel::ChannelId;
use crate::compile::{LinkListProgram, Sequences, compile_program};
use crate::settings::CompilerSettings;
use crate::waveform_library::WaveformLibrary;
use crate::{Error, Result};

fn physical_id(library: &ChannelLibrary, logical: &ChannelId) -> Result<ChannelId> {
    use channel_library::Error as LibraryError;

    match library.physical_channel_for(logical.as_str()) {
        Ok(physical) => Ok(ChannelId::from(physical.label.as_str())),
        Err(LibraryError::UnknownChannel { .. } | LibraryError::UnmappedChannel(_)) => {
            Err(Error::UnmappedChannel(logical.clone()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Re-key a compiled program from logical to physical channels.
///
/// Link lists and waveforms move together with their channel. Two logical
/// channels that end up on the same physical output are rejected.
pub fn map_to_physical(
    program: LinkListProgram,
    library: &ChannelLibrary,
) -> Result<LinkListProgram> {
    let (link_lists, waveforms) = program.into_parts();
    let mut logical_waveforms = waveforms.into_channels();
    let mut sources: IndexMap<ChannelId, ChannelId> = IndexMap::new();
    let mut mapped_link_lists = IndexMap::with_capacity(link_lists.len());
    let mut mapped_waveforms = IndexMap::with_capacity(logical_waveforms.len());

    let mut claim = |physical: &ChannelId, logical: &ChannelId| -> Result<()> {
        if let Some(first) = sources.insert(physical.clone(), logical.clone()) {
            return Err(Error::PhysicalChannelConflict {
                physical: physical.clone(),
                first,
                second: logical.clone(),
            });
        }
        Ok(())
    };

    for (logical, per_sequence) in link_lists {
        let physical = physical_id(library, &logical)?;
        claim(&physical, &logical)?;
        if let Some(waveforms) = logical_waveforms.shift_remove(&logical) {
            mapped_waveforms.insert(physical.clone(), waveforms);
        }
        info!("Mapped logical channel '{}' onto '{}'.", logical, physical);
        mapped_link_lists.insert(physical, per_sequence);
    }
    // Channels only present in a pre-seeded waveform library.
    for (logical, waveforms) in logical_waveforms {
        let physical = physical_id(library, &logical)?;
        claim(&physical, &logical)?;
        mapped_waveforms.insert(physical, waveforms);
    }

    Ok(LinkListProgram::from_parts(
        mapped_link_lists,
        WaveformLibrary::from_channels(mapped_waveforms),
    ))
}

/// Compile a program and key the result by physical channel.
pub fn compile_to_hardware(
    sequences: impl Into<Sequences>,
    library: &ChannelLibrary,
    settings: &CompilerSettings,
) -> Result<LinkListProgram> {
    let program = compile_program(sequences, settings)?;
    map_to_physical(program, library)
}
