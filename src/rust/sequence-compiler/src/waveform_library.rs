// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::sync::LazyLock;

use indexmap::IndexMap;
use sample_array::{ContentHash, SampleArray};
use serde::Serialize;

use crate::channel::ChannelId;
use crate::{Error, Result};

pub type WaveformKey = ContentHash;

static TAZ_KEY: LazyLock<WaveformKey> = LazyLock::new(|| SampleArray::zeros(1).content_hash());

/// Key of the single zero sample every channel starts with.
pub fn taz_key() -> WaveformKey {
    *TAZ_KEY
}

/// Deduplicated sample data, per channel, keyed by content hash.
///
/// Every registered channel holds the reserved zero waveform under
/// [`taz_key`]. Inserting the same samples twice yields the same key and
/// stores them once.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct WaveformLibrary {
    channels: IndexMap<ChannelId, IndexMap<WaveformKey, SampleArray>>,
}

impl WaveformLibrary {
    pub fn new() -> Self {
        WaveformLibrary::default()
    }

    pub(crate) fn from_channels(
        channels: IndexMap<ChannelId, IndexMap<WaveformKey, SampleArray>>,
    ) -> Self {
        WaveformLibrary { channels }
    }

    pub(crate) fn into_channels(self) -> IndexMap<ChannelId, IndexMap<WaveformKey, SampleArray>> {
        self.channels
    }

    /// Add `channel` with the reserved zero waveform. Returns `false` if it was already present.
    pub fn register_channel(&mut self, channel: &ChannelId) -> bool {
        if self.channels.contains_key(channel) {
            return false;
        }
        let mut waveforms = IndexMap::new();
        waveforms.insert(taz_key(), SampleArray::zeros(1));
        self.channels.insert(channel.clone(), waveforms);
        true
    }

    /// Store `samples` on `channel` and return their key.
    ///
    /// The channel is registered on first use.
    pub fn insert(&mut self, channel: &ChannelId, samples: SampleArray) -> Result<WaveformKey> {
        self.register_channel(channel);
        let key = samples.content_hash();
        let waveforms = self
            .channels
            .get_mut(channel)
            .ok_or_else(|| Error::new(format!("Channel '{channel}' vanished from the library")))?;
        match waveforms.get(&key) {
            Some(existing) if existing.content_eq(&samples) => {}
            Some(_) => {
                return Err(Error::HashCollision {
                    channel: channel.clone(),
                    key,
                });
            }
            None => {
                waveforms.insert(key, samples);
            }
        }
        Ok(key)
    }

    pub fn get(&self, channel: &ChannelId, key: &WaveformKey) -> Option<&SampleArray> {
        self.channels.get(channel)?.get(key)
    }

    pub(crate) fn require(&self, channel: &ChannelId, key: &WaveformKey) -> Result<&SampleArray> {
        self.get(channel, key).ok_or_else(|| Error::UnknownWaveform {
            channel: channel.clone(),
            key: *key,
        })
    }

    pub fn contains_channel(&self, channel: &ChannelId) -> bool {
        self.channels.contains_key(channel)
    }

    pub fn channels(&self) -> impl Iterator<Item = &ChannelId> {
        self.channels.keys()
    }

    /// Waveforms of `channel` in insertion order.
    pub fn waveforms(
        &self,
        channel: &ChannelId,
    ) -> Option<impl Iterator<Item = (&WaveformKey, &SampleArray)>> {
        self.channels.get(channel).map(|w| w.iter())
    }

    /// Number of distinct waveforms stored for `channel`.
    pub fn num_waveforms(&self, channel: &ChannelId) -> usize {
        self.channels.get(channel).map_or(0, IndexMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
