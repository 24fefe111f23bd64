/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Machine definition loading.
//!
//! The expected YAML structure is:
//! ```yaml
//! machines:
//!   m1:
//!     cores: 4
//!     description: "build host"
//!   m2: 2        # shorthand: just the core count
//!   m3:          # no value: default core count
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::pool::{MachineDef, DEFAULT_MACHINE_CORES};

// ── Private YAML deserialization types ────────────────────────────────────────

/// Top-level wrapper that maps directly onto the YAML file layout.
#[derive(Debug, Deserialize)]
struct MachineConfigFile {
    #[serde(default)]
    machines: BTreeMap<String, Option<MachineConfigEntry>>,
}

/// Per-machine value as it appears in the YAML file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MachineConfigEntry {
    Cores(u32),
    Detailed {
        #[serde(default = "default_machine_cores")]
        cores: u32,
        #[serde(default)]
        description: Option<String>,
    },
}

fn default_machine_cores() -> u32 {
    DEFAULT_MACHINE_CORES
}

// ── MachineConfig ─────────────────────────────────────────────────────────────

/// One loaded machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineConfig {
    pub name: String,
    pub cores: u32,
    pub description: String,
}

impl MachineConfig {
    /// The definition the resource pool is built from.
    pub fn to_def(&self) -> MachineDef {
        MachineDef::new(self.name.clone(), self.cores)
    }
}

// ── MachineConfigManager ──────────────────────────────────────────────────────

/// Loads and manages machine definitions from a YAML file.
#[derive(Debug, Default)]
pub struct MachineConfigManager {
    /// Map of machine name → [`MachineConfig`], sorted by name.
    machines: BTreeMap<String, MachineConfig>,

    /// Set to `true` after a successful load.
    loaded: bool,
}

impl MachineConfigManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `path` and populates the internal machine map.
    ///
    /// Calling this method a second time replaces all previously loaded
    /// machines.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, the YAML is structurally
    /// invalid, or it defines no machines.
    pub fn load_from_file(&mut self, path: &Path) -> Result<()> {
        info!("Loading machine configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open machine file: {}", path.display()))?;

        self.load_from_str(&content)
            .with_context(|| format!("Invalid machine file: {}", path.display()))
    }

    /// Same as [`load_from_file`](Self::load_from_file) for in-memory YAML.
    pub fn load_from_str(&mut self, content: &str) -> Result<()> {
        // Reset state before (re-)loading
        self.machines.clear();
        self.loaded = false;

        let file: MachineConfigFile =
            serde_yaml::from_str(content).context("Failed to parse machine YAML")?;

        if file.machines.is_empty() {
            bail!("no machines defined");
        }

        for (name, entry) in file.machines {
            let (cores, description) = match entry {
                None => (DEFAULT_MACHINE_CORES, None),
                Some(MachineConfigEntry::Cores(cores)) => (cores, None),
                Some(MachineConfigEntry::Detailed { cores, description }) => (cores, description),
            };

            let machine = MachineConfig {
                name: name.clone(),
                cores,
                description: description.unwrap_or_default(),
            };
            debug!("  Machine: {} | Cores: {}", machine.name, machine.cores);
            self.machines.insert(name, machine);
        }

        self.loaded = true;
        info!(
            "Successfully loaded {} machine definition(s)",
            self.machines.len()
        );
        Ok(())
    }

    /// Returns the machine called `name`, or `None`.
    pub fn get_machine(&self, name: &str) -> Option<&MachineConfig> {
        self.machines.get(name)
    }

    /// Machine definitions sorted by name, ready for
    /// [`ResourcePool::new`](crate::pool::ResourcePool::new).
    pub fn machine_defs(&self) -> Vec<MachineDef> {
        self.machines.values().map(MachineConfig::to_def).collect()
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    /// Returns `true` after a successful load.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
