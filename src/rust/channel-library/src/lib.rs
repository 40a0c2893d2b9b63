// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Channel metadata context.
//!
//! Which logical channels (qubits, measurements, markers) exist and which
//! physical AWG channel each of them drives. The context is an explicit value:
//! a [`ChannelLibrary`] is an immutable snapshot, and changes are staged in a
//! [`Transaction`] that either commits into a new snapshot or rolls back to the
//! original one.

mod channel;
mod library;
mod store;

pub use channel::{
    LogicalChannel, LogicalChannelKind, PhysicalChannel, PhysicalChannelKind, Transmitter,
};
pub use library::{ChannelLibrary, Transaction};
pub use store::{ChannelLibraryStore, WORKING_LIBRARY_NAME};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("A channel or instrument labelled '{0}' already exists.")]
    DuplicateLabel(String),

    #[error("Expected to find a single {kind} '{label}' but found none.")]
    UnknownChannel { label: String, kind: &'static str },

    #[error("Logical channel '{0}' is not mapped to a physical channel.")]
    UnmappedChannel(String),

    #[error("Cannot save as '{0}' since that is the name of the working library.")]
    ReservedName(String),

    #[error("No saved channel library '{name}' at index {index}.")]
    UnknownLibrary { name: String, index: usize },

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    pub fn new<T: std::fmt::Display>(msg: T) -> Self {
        Error::Anyhow(anyhow::anyhow!(msg.to_string()))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
