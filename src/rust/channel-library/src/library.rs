// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use indexmap::IndexMap;
use sequence_log::info;

use crate::channel::{
    LogicalChannel, LogicalChannelKind, PhysicalChannel, PhysicalChannelKind, Transmitter,
};
use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq)]
struct LibraryData {
    logical: IndexMap<String, LogicalChannel>,
    physical: IndexMap<String, PhysicalChannel>,
    transmitters: IndexMap<String, Transmitter>,
}

impl LibraryData {
    fn contains(&self, label: &str) -> bool {
        self.logical.contains_key(label)
            || self.physical.contains_key(label)
            || self.transmitters.contains_key(label)
    }

    fn ensure_unique(&self, label: &str) -> Result<()> {
        if self.contains(label) {
            return Err(Error::DuplicateLabel(label.to_string()));
        }
        Ok(())
    }

    fn logical_of_kind(&self, label: &str, kind: LogicalChannelKind) -> Result<&LogicalChannel> {
        self.logical
            .get(label)
            .filter(|ch| ch.kind == kind)
            .ok_or_else(|| Error::UnknownChannel {
                label: label.to_string(),
                kind: kind.as_str(),
            })
    }

    fn transmitter(&self, label: &str) -> Result<&Transmitter> {
        self.transmitters
            .get(label)
            .ok_or_else(|| Error::UnknownChannel {
                label: label.to_string(),
                kind: "transmitter",
            })
    }

    fn physical(&self, label: &str) -> Result<&PhysicalChannel> {
        self.physical
            .get(label)
            .ok_or_else(|| Error::UnknownChannel {
                label: label.to_string(),
                kind: "physical channel",
            })
    }

    /// The first I/Q output of a transmitter.
    fn primary_quadrature(&self, transmitter: &str) -> Result<&PhysicalChannel> {
        let transmitter = self.transmitter(transmitter)?;
        transmitter
            .channels
            .iter()
            .filter_map(|label| self.physical.get(label))
            .find(|ch| ch.kind == PhysicalChannelKind::Quadrature)
            .ok_or_else(|| {
                Error::new(format!(
                    "Transmitter '{}' has no quadrature channel.",
                    transmitter.label
                ))
            })
    }

    fn sorted_logical(&self, kind: LogicalChannelKind) -> Vec<&LogicalChannel> {
        let mut out: Vec<_> = self.logical.values().filter(|ch| ch.kind == kind).collect();
        out.sort_by(|a, b| a.label.cmp(&b.label));
        out
    }

    fn validate(&self) -> Result<()> {
        for channel in self.logical.values() {
            if let Some(physical) = &channel.physical
                && !self.physical.contains_key(physical)
            {
                return Err(Error::new(format!(
                    "Logical channel '{}' refers to unknown physical channel '{}'.",
                    channel.label, physical
                )));
            }
        }
        for transmitter in self.transmitters.values() {
            for channel in transmitter.channels.iter() {
                match self.physical.get(channel) {
                    Some(ch) if ch.instrument == transmitter.label => {}
                    _ => {
                        return Err(Error::new(format!(
                            "Transmitter '{}' lists channel '{}' which it does not own.",
                            transmitter.label, channel
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Immutable snapshot of the channel metadata.
///
/// Cloning is cheap; all clones share the same data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelLibrary {
    data: Arc<LibraryData>,
}

impl ChannelLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start staging changes on top of this snapshot.
    pub fn begin(&self) -> Transaction {
        Transaction {
            base: self.clone(),
            working: LibraryData::clone(&self.data),
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.data.contains(label)
    }

    pub fn qubit(&self, label: &str) -> Result<&LogicalChannel> {
        self.data.logical_of_kind(label, LogicalChannelKind::Qubit)
    }

    pub fn measurement(&self, label: &str) -> Result<&LogicalChannel> {
        self.data
            .logical_of_kind(label, LogicalChannelKind::Measurement)
    }

    pub fn marker(&self, label: &str) -> Result<&LogicalChannel> {
        self.data.logical_of_kind(label, LogicalChannelKind::Marker)
    }

    pub fn transmitter(&self, label: &str) -> Result<&Transmitter> {
        self.data.transmitter(label)
    }

    pub fn physical_channel(&self, label: &str) -> Result<&PhysicalChannel> {
        self.data.physical(label)
    }

    pub fn logical_channel(&self, label: &str) -> Option<&LogicalChannel> {
        self.data.logical.get(label)
    }

    /// Resolve the physical channel a logical channel is played on.
    pub fn physical_channel_for(&self, logical: &str) -> Result<&PhysicalChannel> {
        let channel = self
            .data
            .logical
            .get(logical)
            .ok_or_else(|| Error::UnknownChannel {
                label: logical.to_string(),
                kind: "logical channel",
            })?;
        let physical = channel
            .physical
            .as_deref()
            .ok_or_else(|| Error::UnmappedChannel(logical.to_string()))?;
        self.data.physical(physical)
    }

    pub fn qubits(&self) -> Vec<&LogicalChannel> {
        self.data.sorted_logical(LogicalChannelKind::Qubit)
    }

    pub fn measurements(&self) -> Vec<&LogicalChannel> {
        self.data.sorted_logical(LogicalChannelKind::Measurement)
    }

    pub fn markers(&self) -> Vec<&LogicalChannel> {
        self.data.sorted_logical(LogicalChannelKind::Marker)
    }

    pub fn transmitters(&self) -> Vec<&Transmitter> {
        let mut out: Vec<_> = self.data.transmitters.values().collect();
        out.sort_by(|a, b| a.label.cmp(&b.label));
        out
    }

    pub fn physical_channels(&self) -> Vec<&PhysicalChannel> {
        let mut out: Vec<_> = self.data.physical.values().collect();
        out.sort_by(|a, b| a.label.cmp(&b.label));
        out
    }
}

/// Staged changes to a [`ChannelLibrary`].
///
/// Nothing is visible to other holders of the base snapshot until [`Transaction::commit`]
/// returns the new snapshot.
#[derive(Debug)]
pub struct Transaction {
    base: ChannelLibrary,
    working: LibraryData,
}

impl Transaction {
    fn add_transmitter(
        &mut self,
        label: &str,
        model: &str,
        address: &str,
        translator: &str,
        outputs: &[(String, u8, PhysicalChannelKind)],
    ) -> Result<&Transmitter> {
        self.working.ensure_unique(label)?;
        for (channel_label, ..) in outputs.iter() {
            self.working.ensure_unique(channel_label)?;
        }
        for (channel_label, index, kind) in outputs.iter() {
            self.working.physical.insert(
                channel_label.clone(),
                PhysicalChannel {
                    label: channel_label.clone(),
                    instrument: label.to_string(),
                    index: *index,
                    kind: *kind,
                    translator: translator.to_string(),
                },
            );
        }
        let transmitter = Transmitter {
            label: label.to_string(),
            model: model.to_string(),
            address: address.to_string(),
            trigger_source: "external".to_string(),
            channels: outputs.iter().map(|(l, ..)| l.clone()).collect(),
        };
        let entry = self
            .working
            .transmitters
            .entry(label.to_string())
            .or_insert(transmitter);
        Ok(entry)
    }

    /// Add an APS2 transmitter with one I/Q output and four markers.
    pub fn new_aps2(&mut self, label: &str, address: &str) -> Result<&Transmitter> {
        let mut outputs = vec![(format!("{label}-1"), 0, PhysicalChannelKind::Quadrature)];
        outputs.extend(
            (0..4).map(|i| (format!("{label}-m{}", i + 1), i, PhysicalChannelKind::Marker)),
        );
        self.add_transmitter(label, "APS2", address, "APS2Pattern", &outputs)
    }

    /// Add an APS transmitter with two I/Q outputs and four markers.
    pub fn new_aps(&mut self, label: &str, address: &str) -> Result<&Transmitter> {
        let mut outputs = vec![
            (format!("{label}-12"), 0, PhysicalChannelKind::Quadrature),
            (format!("{label}-34"), 1, PhysicalChannelKind::Quadrature),
        ];
        outputs.extend(
            (0..4).map(|i| (format!("{label}-{}m1", i + 1), i, PhysicalChannelKind::Marker)),
        );
        self.add_transmitter(label, "APS", address, "APSPattern", &outputs)
    }

    pub fn new_qubit(&mut self, label: &str) -> Result<&LogicalChannel> {
        self.add_logical(label, LogicalChannelKind::Qubit, None)
    }

    /// Add a logical marker channel played on the physical marker output `physical`.
    pub fn new_marker(&mut self, label: &str, physical: &str) -> Result<&LogicalChannel> {
        let phys = self.working.physical(physical)?;
        if phys.kind != PhysicalChannelKind::Marker {
            return Err(Error::new(format!(
                "Cannot attach marker '{label}' to '{physical}', which is not a marker output."
            )));
        }
        self.add_logical(label, LogicalChannelKind::Marker, Some(physical.to_string()))
    }

    fn add_logical(
        &mut self,
        label: &str,
        kind: LogicalChannelKind,
        physical: Option<String>,
    ) -> Result<&LogicalChannel> {
        self.working.ensure_unique(label)?;
        let channel = LogicalChannel {
            label: label.to_string(),
            kind,
            physical,
        };
        Ok(self
            .working
            .logical
            .entry(label.to_string())
            .or_insert(channel))
    }

    /// Drive `qubit` from the first I/Q output of `transmitter`.
    pub fn set_control(&mut self, qubit: &str, transmitter: &str) -> Result<()> {
        self.working
            .logical_of_kind(qubit, LogicalChannelKind::Qubit)?;
        let physical = self.working.primary_quadrature(transmitter)?.label.clone();
        if let Some(channel) = self.working.logical.get_mut(qubit) {
            channel.physical = Some(physical);
        }
        Ok(())
    }

    /// Create (or re-target) the measurement channel `M-<qubit>` on the first I/Q output
    /// of `transmitter`.
    pub fn set_measure(&mut self, qubit: &str, transmitter: &str) -> Result<&LogicalChannel> {
        self.working
            .logical_of_kind(qubit, LogicalChannelKind::Qubit)?;
        let physical = self.working.primary_quadrature(transmitter)?.label.clone();
        let label = format!("M-{qubit}");
        if let Some(existing) = self.working.logical.get(&label) {
            if existing.kind != LogicalChannelKind::Measurement {
                return Err(Error::DuplicateLabel(label));
            }
        } else {
            self.working.ensure_unique(&label)?;
        }
        let channel = self
            .working
            .logical
            .entry(label.clone())
            .or_insert(LogicalChannel {
                label,
                kind: LogicalChannelKind::Measurement,
                physical: None,
            });
        channel.physical = Some(physical);
        Ok(channel)
    }

    /// Validate the staged changes and publish them as a new snapshot.
    pub fn commit(self) -> Result<ChannelLibrary> {
        self.working.validate()?;
        info!(
            "Committed channel library: {} logical channels, {} physical channels, {} transmitters",
            self.working.logical.len(),
            self.working.physical.len(),
            self.working.transmitters.len()
        );
        Ok(ChannelLibrary {
            data: Arc::new(self.working),
        })
    }

    /// Discard the staged changes.
    pub fn rollback(self) -> ChannelLibrary {
        self.base
    }
}
