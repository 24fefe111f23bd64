/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error types for the jobshop scheduler.
//!
//! Two error types model the two failure layers:
//!
//! * [`AccountingFault`] — why a core reservation or release on a single
//!   machine was refused (low-level, carries exact core counts).
//! * [`SchedulerError`] — top-level failure returned from graph construction,
//!   pool construction and [`Scheduler::schedule()`](super::Scheduler::schedule).
//!
//! Every input-related variant names the offending task or machine.

use thiserror::Error;

// ── Resource accounting ───────────────────────────────────────────────────────

/// Detailed reason why the resource pool refused a core adjustment.
///
/// Carried inside [`SchedulerError::ResourceAccounting`].  Never produced by a
/// correct engine; its presence means the available-core invariant would have
/// been broken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountingFault {
    /// More cores requested than the machine currently has free.
    Overcommit { requested: u32, available: u32 },

    /// More cores released than the machine currently has in use.
    OverRelease { released: u32, in_use: u32 },

    /// The machine id does not belong to this pool.
    UnknownMachine { index: usize },
}

impl std::fmt::Display for AccountingFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountingFault::Overcommit {
                requested,
                available,
            } => write!(
                f,
                "requested {} core(s) but only {} available",
                requested, available
            ),

            AccountingFault::OverRelease { released, in_use } => write!(
                f,
                "released {} core(s) but only {} in use",
                released, in_use
            ),

            AccountingFault::UnknownMachine { index } => {
                write!(f, "machine index {} is not part of this pool", index)
            }
        }
    }
}

// ── Top-level scheduler errors ────────────────────────────────────────────────

/// Top-level error type of the scheduling core.
///
/// All variants except `TimeOverflow` and `ResourceAccounting` are structural
/// preconditions on the input and are reported before the simulation loop
/// starts:
///
/// | Variant | Raised by |
/// |---|---|
/// | `NoTasks` / `DuplicateTask` / `MissingDependency` / `CyclicDependency` | `TaskGraph::build` |
/// | `InvalidDuration` / `InvalidCoreCount` | `TaskGraph::build` |
/// | `NoMachines` / `DuplicateMachine` / `InvalidMachineCapacity` | `ResourcePool::new` |
/// | `Unschedulable` | pre-flight feasibility check |
/// | `TimeOverflow` | critical-path analysis / simulation |
/// | `ResourceAccounting` | `ResourcePool::reserve` / `release` |
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The task set is empty.
    #[error("no tasks provided — task list is empty")]
    NoTasks,

    /// The machine set is empty.
    #[error("no machines provided — machine list is empty")]
    NoMachines,

    /// Two task definitions share the same identifier.
    #[error("task '{task}' is defined more than once")]
    DuplicateTask { task: String },

    /// Two machine definitions share the same identifier.
    #[error("machine '{machine}' is defined more than once")]
    DuplicateMachine { machine: String },

    /// A task names a parent that is not part of the task set.
    #[error("task '{task}' depends on '{parent}', which is not defined")]
    MissingDependency { task: String, parent: String },

    /// The dependency graph contains at least one cycle.
    ///
    /// `tasks` lists (sorted) every task that could not be topologically
    /// ordered: the members of the cycle(s) and anything downstream of them.
    #[error("dependency cycle detected among tasks: {}", .tasks.join(", "))]
    CyclicDependency { tasks: Vec<String> },

    /// A task has a zero (or missing) duration.
    #[error("task '{task}' has no positive duration")]
    InvalidDuration { task: String },

    /// A task requires zero cores.
    #[error("task '{task}' must require at least one core")]
    InvalidCoreCount { task: String },

    /// A machine has zero cores.
    #[error("machine '{machine}' must have at least one core")]
    InvalidMachineCapacity { machine: String },

    /// A task needs more cores than the largest machine provides, so it could
    /// never be dispatched.
    #[error(
        "task '{task}' requires {required} core(s) but the largest machine only has {max_capacity}"
    )]
    Unschedulable {
        task: String,
        required: u32,
        max_capacity: u32,
    },

    /// A critical-path length or finish time involving `task` does not fit
    /// in the `u64` clock.
    #[error("time of task '{task}' overflows the scheduler clock")]
    TimeOverflow { task: String },

    /// The pool refused a core adjustment on `machine`.
    #[error("resource accounting failed on machine '{machine}': {fault}")]
    ResourceAccounting {
        machine: String,
        fault: AccountingFault,
    },
}

// ── Tests ─────────────────────────────────────────────────────────────────────
