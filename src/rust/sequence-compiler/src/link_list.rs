// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;

use crate::pulse::Pulse;
use crate::waveform_library::{WaveformKey, taz_key};

/// One playback instruction of a channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LLElement {
    /// Key of the waveform to play, rotated into the current frame
    pub waveform_key: WaveformKey,
    /// Key of the waveform before phase and frame rotation
    #[serde(skip)]
    source_key: WaveformKey,
    /// Duration in samples
    pub length: usize,
    pub repeat: u32,
    /// Play a single stored sample for `length` samples
    pub is_time_amplitude: bool,
    pub has_trigger: bool,
    pub trigger_delay_1: usize,
    pub trigger_delay_2: usize,
    pub phase: f64,
    pub frame_change: f64,
}

impl LLElement {
    pub(crate) fn for_pulse(key: WaveformKey, length: usize, pulse: &Pulse) -> Self {
        LLElement {
            waveform_key: key,
            source_key: key,
            length,
            repeat: 1,
            is_time_amplitude: false,
            has_trigger: false,
            trigger_delay_1: 0,
            trigger_delay_2: 0,
            phase: pulse.phase(),
            frame_change: pulse.frame_change(),
        }
    }

    /// Zero output for `length` samples.
    pub fn padding(length: usize) -> Self {
        let key = taz_key();
        LLElement {
            waveform_key: key,
            source_key: key,
            length,
            repeat: 1,
            is_time_amplitude: true,
            has_trigger: false,
            trigger_delay_1: 0,
            trigger_delay_2: 0,
            phase: 0.0,
            frame_change: 0.0,
        }
    }

    pub fn source_key(&self) -> WaveformKey {
        self.source_key
    }

    pub fn is_padding(&self) -> bool {
        self.source_key == taz_key()
    }
}

/// The link list of one channel for one sequence.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct MiniLinkList(Vec<LLElement>);

impl MiniLinkList {
    pub fn new() -> Self {
        MiniLinkList::default()
    }

    pub fn push(&mut self, entry: LLElement) {
        self.0.push(entry);
    }

    pub fn entries(&self) -> &[LLElement] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LLElement> {
        self.0.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, LLElement> {
        self.0.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Playback duration in samples.
    pub fn total_length(&self) -> usize {
        self.0
            .iter()
            .map(|entry| entry.length * entry.repeat as usize)
            .sum()
    }
}

impl Extend<LLElement> for MiniLinkList {
    fn extend<I: IntoIterator<Item = LLElement>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl FromIterator<LLElement> for MiniLinkList {
    fn from_iter<I: IntoIterator<Item = LLElement>>(iter: I) -> Self {
        MiniLinkList(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a MiniLinkList {
    type Item = &'a LLElement;
    type IntoIter = std::slice::Iter<'a, LLElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
