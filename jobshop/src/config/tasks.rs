/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Task definition loading.
//!
//! The expected YAML structure is:
//! ```yaml
//! jobs:
//!   build:
//!     compile:
//!       duration: 3
//!       cores: 2            # optional
//!       parents: []
//!     link:
//!       duration: 2
//!       parents: [compile]  # a map keyed by parent name is accepted too
//! ```
//!
//! Task names are global: the job a task is declared under is kept for
//! display only.  `duration` may be omitted when durations are randomised
//! afterwards; see [`TaskConfigManager::missing_durations`].

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::task::{TaskDef, DEFAULT_TASK_CORES};

// ── Private YAML deserialization types ────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TaskConfigFile {
    #[serde(default)]
    jobs: BTreeMap<String, Option<BTreeMap<String, Option<TaskConfigEntry>>>>,
}

#[derive(Debug, Default, Deserialize)]
struct TaskConfigEntry {
    duration: Option<u64>,
    cores: Option<u32>,
    #[serde(default)]
    parents: Option<ParentList>,
}

/// `parents:` as a sequence of names or as a map whose keys are the names.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ParentList {
    Names(Vec<String>),
    Keyed(BTreeMap<String, serde_yaml::Value>),
}

impl ParentList {
    fn into_names(self) -> Vec<String> {
        match self {
            ParentList::Names(names) => names,
            ParentList::Keyed(map) => map.into_keys().collect(),
        }
    }
}

// ── TaskConfigManager ─────────────────────────────────────────────────────────

/// Loads task definitions from a YAML task file.
#[derive(Debug)]
pub struct TaskConfigManager {
    /// Loaded definitions, jobs in name order, tasks in name order per job.
    tasks: Vec<TaskDef>,

    /// Tasks whose file entry had no `duration`.
    missing_durations: Vec<String>,

    /// Core count for tasks that do not set `cores`.
    default_cores: u32,

    loaded: bool,
}

impl Default for TaskConfigManager {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            missing_durations: Vec::new(),
            default_cores: DEFAULT_TASK_CORES,
            loaded: false,
        }
    }
}

impl TaskConfigManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `cores` for tasks whose entry omits `cores`.
    pub fn with_default_cores(mut self, cores: u32) -> Self {
        self.default_cores = cores;
        self
    }

    /// Parses `path` and replaces any previously loaded tasks.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, the YAML is structurally
    /// invalid, the file defines no jobs, or a job has no tasks.
    pub fn load_from_file(&mut self, path: &Path) -> Result<()> {
        info!("Loading task configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open task file: {}", path.display()))?;

        self.load_from_str(&content)
            .with_context(|| format!("Invalid task file: {}", path.display()))
    }

    /// Same as [`load_from_file`](Self::load_from_file) for in-memory YAML.
    pub fn load_from_str(&mut self, content: &str) -> Result<()> {
        self.tasks.clear();
        self.missing_durations.clear();
        self.loaded = false;

        let file: TaskConfigFile =
            serde_yaml::from_str(content).context("Failed to parse task YAML")?;

        if file.jobs.is_empty() {
            bail!("no jobs defined");
        }

        let mut tasks = Vec::new();
        let mut missing = Vec::new();

        for (job, entries) in file.jobs {
            let entries = entries.unwrap_or_default();
            if entries.is_empty() {
                bail!("job '{}' must contain at least one task", job);
            }

            for (name, entry) in entries {
                let entry = entry.unwrap_or_default();
                if entry.duration.is_none() {
                    missing.push(name.clone());
                }

                let def = TaskDef::new(name, entry.duration.unwrap_or(0))
                    .with_job(job.clone())
                    .with_cores(entry.cores.unwrap_or(self.default_cores))
                    .with_parents(entry.parents.map(ParentList::into_names).unwrap_or_default());

                debug!(
                    "  Task: {} | Job: {} | Duration: {} | Cores: {} | Parents: {:?}",
                    def.name, def.job, def.duration, def.cores, def.parents
                );
                tasks.push(def);
            }
        }

        self.tasks = tasks;
        self.missing_durations = missing;
        self.loaded = true;
        info!("Successfully loaded {} task definition(s)", self.tasks.len());
        Ok(())
    }

    /// Loaded definitions, ready for [`TaskGraph::build`](crate::graph::TaskGraph::build).
    pub fn task_defs(&self) -> &[TaskDef] {
        &self.tasks
    }

    /// Hand the loaded definitions over, leaving the manager empty.
    pub fn take_task_defs(&mut self) -> Vec<TaskDef> {
        self.loaded = false;
        self.missing_durations.clear();
        std::mem::take(&mut self.tasks)
    }

    /// Names of tasks that did not specify a duration.
    pub fn missing_durations(&self) -> &[String] {
        &self.missing_durations
    }

    pub fn get_task(&self, name: &str) -> Option<&TaskDef> {
        self.tasks.iter().find(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
