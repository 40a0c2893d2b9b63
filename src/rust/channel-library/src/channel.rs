// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PhysicalChannelKind {
    /// I/Q pair driven with complex samples
    Quadrature,
    /// Digital marker output
    Marker,
}

/// An output of an AWG instrument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhysicalChannel {
    pub label: String,
    /// Label of the owning instrument
    pub instrument: String,
    /// Index of the output on the instrument
    pub index: u8,
    pub kind: PhysicalChannelKind,
    /// Name of the hardware packer responsible for this channel
    pub translator: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogicalChannelKind {
    Qubit,
    Measurement,
    Marker,
}

impl LogicalChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalChannelKind::Qubit => "qubit",
            LogicalChannelKind::Measurement => "measurement",
            LogicalChannelKind::Marker => "marker",
        }
    }
}

/// A channel that pulse sequences address by label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogicalChannel {
    pub label: String,
    pub kind: LogicalChannelKind,
    /// Label of the physical channel this channel is played on, if assigned
    pub physical: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transmitter {
    pub label: String,
    pub model: String,
    pub address: String,
    pub trigger_source: String,
    /// Labels of the physical channels, in output order
    pub channels: Vec<String>,
}
