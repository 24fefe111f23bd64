/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Core task data structures for the jobshop scheduler.
//!
//! Three types model the three stages of the scheduling pipeline:
//!
//! ```text
//! task file  ──(config)──►  TaskDef  ──(graph)──►  Task  ──(scheduler)──►  ScheduleEntry
//!                            ↑ input               ↑ arena node             ↑ output
//!                            names only            index links, mutable     immutable, commit order
//! ```
//!
//! # Ownership model
//! `Task` nodes live in the arena of a [`TaskGraph`](crate::graph::TaskGraph)
//! and refer to each other through [`TaskId`] indices, never through
//! references.  The graph is **moved** into the scheduler for one run; the
//! scheduler fills `state`, `start`, `finish` and `machine` in place and
//! produces a [`Schedule`] as the final step.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::pool::MachineId;

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Cores a task requires when its definition does not say otherwise.
pub const DEFAULT_TASK_CORES: u32 = 2;

// ── Identifiers ───────────────────────────────────────────────────────────────

/// Stable arena index of a [`Task`] inside its [`TaskGraph`](crate::graph::TaskGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub usize);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ── Task lifecycle ────────────────────────────────────────────────────────────

/// Where a task is in the scheduling state machine.
///
/// ```text
/// Blocked ──(last parent done)──► Ready ──(dispatched)──► Running ──(popped)──► Done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskState {
    /// At least one parent has not finished yet.
    #[default]
    Blocked,
    /// Every parent has finished; waiting for a machine.
    Ready,
    /// Holding cores on a machine until the clock reaches its finish time.
    Running,
    /// Finished and removed from active tracking.
    Done,
}

// ── TaskDef (input) ───────────────────────────────────────────────────────────

/// Raw task definition as supplied by the configuration layer.
///
/// Parents are referenced by name; they are resolved into [`TaskId`] links
/// by [`TaskGraph::build`](crate::graph::TaskGraph::build).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDef {
    /// Unique task name across the whole workload.
    pub name: String,

    /// Job the task was declared under.  Informational only.
    pub job: String,

    /// Execution time in abstract time units.  Must be positive.
    pub duration: u64,

    /// Cores held on one machine while the task runs.  Must be positive.
    pub cores: u32,

    /// Names of the tasks that must finish before this one may start.
    pub parents: Vec<String>,
}

impl TaskDef {
    /// A root task with the default core requirement.
    pub fn new(name: impl Into<String>, duration: u64) -> Self {
        Self {
            name: name.into(),
            job: String::new(),
            duration,
            cores: DEFAULT_TASK_CORES,
            parents: Vec::new(),
        }
    }

    pub fn with_parents<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parents = parents.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cores(mut self, cores: u32) -> Self {
        self.cores = cores;
        self
    }

    pub fn with_job(mut self, job: impl Into<String>) -> Self {
        self.job = job.into();
        self
    }
}

// ── Task (arena node / working copy) ──────────────────────────────────────────

/// Internal task representation used during scheduling.
///
/// # Lifecycle
/// Created by [`TaskGraph::build`](crate::graph::TaskGraph::build) from a
/// [`TaskDef`], labelled with its critical-path length by
/// [`critical_path::analyze`](crate::critical_path::analyze), then mutated
/// in place by the scheduler as it moves through [`TaskState`].
#[derive(Debug, Clone)]
pub struct Task {
    // ── Identity ──────────────────────────────────────────────────────────────
    pub name: String,
    pub job: String,

    // ── Requirements ──────────────────────────────────────────────────────────
    pub duration: u64,
    pub cores: u32,

    // ── Graph links ───────────────────────────────────────────────────────────
    /// Tasks this one depends on.  Never mutated after construction, so the
    /// finished schedule can still be audited against it.
    pub parents: BTreeSet<TaskId>,

    /// Inverse of `parents`.
    pub children: BTreeSet<TaskId>,

    /// Parents that have not reached [`TaskState::Done`] yet.  The task
    /// becomes ready when this drops to zero.
    pub pending_parents: usize,

    // ── Priority ──────────────────────────────────────────────────────────────
    /// Longest duration-weighted path from this task to any leaf, including
    /// its own duration.  Zero until the analyzer runs.
    pub critical_path: u64,

    // ── Assignment (filled by the scheduler) ──────────────────────────────────
    pub state: TaskState,
    pub start: Option<u64>,
    pub finish: Option<u64>,
    pub machine: Option<MachineId>,
}

impl Task {
    pub(crate) fn from_def(def: TaskDef, parents: BTreeSet<TaskId>) -> Self {
        let state = if parents.is_empty() {
            TaskState::Ready
        } else {
            TaskState::Blocked
        };
        Self {
            name: def.name,
            job: def.job,
            duration: def.duration,
            cores: def.cores,
            pending_parents: parents.len(),
            parents,
            children: BTreeSet::new(),
            critical_path: 0,
            state,
            start: None,
            finish: None,
            machine: None,
        }
    }

    /// Depends on nothing.
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Nothing depends on it.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_ready(&self) -> bool {
        self.state == TaskState::Ready
    }

    /// Returns `true` once the scheduler has committed the task to a machine.
    pub fn is_scheduled(&self) -> bool {
        self.machine.is_some() && self.start.is_some() && self.finish.is_some()
    }
}

// ── ScheduleEntry (output) ────────────────────────────────────────────────────

/// One committed assignment, appended in commit order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    pub task: String,
    pub start: u64,
    pub finish: u64,
    pub machine: String,
    pub cores: u32,
}

// ── Schedule ──────────────────────────────────────────────────────────────────

/// Final scheduling result: every entry in commit order plus the makespan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule {
    pub makespan: u64,
    pub entries: Vec<ScheduleEntry>,
}

impl Schedule {
    /// Wrap `entries` and compute the makespan as their maximum finish time.
    ///
    /// Entries committed in the same dispatch step are not ordered by finish
    /// time, so the last entry is not necessarily the latest one.
    pub fn from_entries(entries: Vec<ScheduleEntry>) -> Self {
        let makespan = entries.iter().map(|e| e.finish).max().unwrap_or(0);
        Self { makespan, entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for `task`, if it was scheduled.
    pub fn entry(&self, task: &str) -> Option<&ScheduleEntry> {
        self.entries.iter().find(|e| e.task == task)
    }

    /// Entries grouped by machine, each group kept in commit order.
    ///
    /// `BTreeMap` so machines are always listed alphabetically.
    pub fn by_machine(&self) -> BTreeMap<&str, Vec<&ScheduleEntry>> {
        let mut map: BTreeMap<&str, Vec<&ScheduleEntry>> = BTreeMap::new();
        for entry in &self.entries {
            map.entry(entry.machine.as_str()).or_default().push(entry);
        }
        map
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
