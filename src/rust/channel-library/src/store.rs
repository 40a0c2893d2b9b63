// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use indexmap::IndexMap;

use crate::library::ChannelLibrary;
use crate::{Error, Result};

/// Name under which the library currently being edited is known.
pub const WORKING_LIBRARY_NAME: &str = "working";

/// In-memory collection of named channel library snapshots.
///
/// Every `save_as` under an existing name adds a new version; versions are
/// never overwritten.
#[derive(Debug, Default)]
pub struct ChannelLibraryStore {
    saved: IndexMap<String, Vec<ChannelLibrary>>,
}

impl ChannelLibraryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_as(&mut self, name: &str, library: &ChannelLibrary) -> Result<()> {
        if name == WORKING_LIBRARY_NAME {
            return Err(Error::ReservedName(name.to_string()));
        }
        self.saved
            .entry(name.to_string())
            .or_default()
            .push(library.clone());
        Ok(())
    }

    /// Load a saved snapshot. `index = 1` is the most recent version, `index = 2`
    /// the one before, and so on.
    pub fn load(&self, name: &str, index: usize) -> Result<ChannelLibrary> {
        let unknown = || Error::UnknownLibrary {
            name: name.to_string(),
            index,
        };
        let versions = self.saved.get(name).ok_or_else(unknown)?;
        if index == 0 || index > versions.len() {
            return Err(unknown());
        }
        Ok(versions[versions.len() - index].clone())
    }

    /// Remove all versions saved under `name`. Returns whether anything was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.saved.shift_remove(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.saved.keys().map(String::as_str).collect()
    }

    pub fn versions(&self, name: &str) -> usize {
        self.saved.get(name).map_or(0, Vec::len)
    }
}
