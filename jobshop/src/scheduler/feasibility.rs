/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Schedulability checks and schedule auditing.
//!
//! Three independent helpers bracket a scheduling run:
//!
//! * [`check_schedulable`] runs **before** the simulation and rejects task
//!   sets that could never finish (a task wider than every machine).
//! * [`makespan_lower_bound`] gives the best makespan any schedule could
//!   reach, used to log how far the greedy result is from it.
//! * [`audit`] runs **after** the simulation and re-checks every
//!   invariant of the produced schedule from scratch.
//!
//! # Lower bound
//! No schedule can finish before either
//!
//! $$\max_{r \in roots} cp(r) \quad\text{or}\quad \left\lceil \frac{\sum_t d_t \cdot c_t}{\sum_m C_m} \right\rceil$$
//!
//! (the longest dependency chain, or the total core-time spread perfectly
//! over every core).  The greedy schedule is often well above this bound on
//! wide graphs; the bound is a diagnostic only.

use std::collections::HashMap;

use crate::graph::TaskGraph;
use crate::pool::ResourcePool;
use crate::task::{Schedule, ScheduleEntry};

use super::SchedulerError;

// ── Pre-flight ────────────────────────────────────────────────────────────────

/// Fail with [`SchedulerError::Unschedulable`] if any task needs more cores
/// than the largest machine has.  Checked in arena order, so the first
/// offending task is reported.
pub fn check_schedulable(graph: &TaskGraph, pool: &ResourcePool) -> Result<(), SchedulerError> {
    let max_capacity = pool.max_capacity();
    match graph.tasks().iter().find(|t| t.cores > max_capacity) {
        Some(task) => Err(SchedulerError::Unschedulable {
            task: task.name.clone(),
            required: task.cores,
            max_capacity,
        }),
        None => Ok(()),
    }
}

/// Makespan no schedule can beat.  Requires critical-path labels.
pub fn makespan_lower_bound(graph: &TaskGraph, pool: &ResourcePool) -> u64 {
    let chain = graph
        .roots()
        .map(|id| graph[id].critical_path)
        .max()
        .unwrap_or(0);

    let work: u64 = graph
        .tasks()
        .iter()
        .map(|t| t.duration.saturating_mul(u64::from(t.cores)))
        .fold(0u64, u64::saturating_add);
    let capacity = pool.total_capacity();
    let spread = if capacity == 0 { 0 } else { work.div_ceil(capacity) };

    chain.max(spread)
}

// ── Audit ─────────────────────────────────────────────────────────────────────

/// One broken schedule invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditViolation {
    /// A task of the graph has no entry.
    Missing { task: String },

    /// A task has more than one entry.
    Duplicated { task: String },

    /// An entry names a task or machine that does not exist.
    Unknown { task: String, machine: String },

    /// `finish != start + duration`.
    WrongDuration {
        task: String,
        start: u64,
        finish: u64,
        duration: u64,
    },

    /// A task started before one of its parents finished.
    Precedence {
        task: String,
        start: u64,
        parent: String,
        parent_finish: u64,
    },

    /// Cores in use on a machine exceeded its capacity.
    CapacityExceeded {
        machine: String,
        at: u64,
        in_use: u64,
        capacity: u32,
    },

    /// Reported makespan differs from the maximum finish time.
    WrongMakespan { reported: u64, actual: u64 },
}

impl std::fmt::Display for AuditViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditViolation::Missing { task } => write!(f, "task '{}' was never scheduled", task),
            AuditViolation::Duplicated { task } => {
                write!(f, "task '{}' was scheduled more than once", task)
            }
            AuditViolation::Unknown { task, machine } => write!(
                f,
                "entry '{}' on '{}' refers to an unknown task or machine",
                task, machine
            ),
            AuditViolation::WrongDuration {
                task,
                start,
                finish,
                duration,
            } => write!(
                f,
                "task '{}' runs {}..{} but its duration is {}",
                task, start, finish, duration
            ),
            AuditViolation::Precedence {
                task,
                start,
                parent,
                parent_finish,
            } => write!(
                f,
                "task '{}' starts at {} before parent '{}' finishes at {}",
                task, start, parent, parent_finish
            ),
            AuditViolation::CapacityExceeded {
                machine,
                at,
                in_use,
                capacity,
            } => write!(
                f,
                "machine '{}' uses {} core(s) at t={} but has only {}",
                machine, in_use, at, capacity
            ),
            AuditViolation::WrongMakespan { reported, actual } => write!(
                f,
                "makespan reported as {} but latest finish is {}",
                reported, actual
            ),
        }
    }
}

/// Re-check `schedule` against the graph and pool it was produced from.
///
/// Returns every violation found; an empty vector means the schedule is
/// valid.  Capacity is checked per machine over half-open `[start, finish)`
/// intervals, so a task may start on cores freed at the same instant.
pub fn audit(graph: &TaskGraph, pool: &ResourcePool, schedule: &Schedule) -> Vec<AuditViolation> {
    let mut violations = Vec::new();

    // ── Exactly once ──────────────────────────────────────────────────────────
    let mut by_task: HashMap<&str, &ScheduleEntry> = HashMap::with_capacity(schedule.len());
    for entry in &schedule.entries {
        if graph.get(&entry.task).is_none() || pool.id_of(&entry.machine).is_none() {
            violations.push(AuditViolation::Unknown {
                task: entry.task.clone(),
                machine: entry.machine.clone(),
            });
            continue;
        }
        if by_task.insert(entry.task.as_str(), entry).is_some() {
            violations.push(AuditViolation::Duplicated {
                task: entry.task.clone(),
            });
        }
    }

    // ── Timing and precedence ─────────────────────────────────────────────────
    for task in graph.tasks() {
        let Some(entry) = by_task.get(task.name.as_str()) else {
            violations.push(AuditViolation::Missing {
                task: task.name.clone(),
            });
            continue;
        };

        if entry.finish != entry.start.saturating_add(task.duration) {
            violations.push(AuditViolation::WrongDuration {
                task: task.name.clone(),
                start: entry.start,
                finish: entry.finish,
                duration: task.duration,
            });
        }

        for &parent in &task.parents {
            let parent = &graph[parent];
            if let Some(parent_entry) = by_task.get(parent.name.as_str()) {
                if entry.start < parent_entry.finish {
                    violations.push(AuditViolation::Precedence {
                        task: task.name.clone(),
                        start: entry.start,
                        parent: parent.name.clone(),
                        parent_finish: parent_entry.finish,
                    });
                }
            }
        }
    }

    // ── Capacity ──────────────────────────────────────────────────────────────
    for (machine_name, entries) in schedule.by_machine() {
        let Some(id) = pool.id_of(machine_name) else {
            continue;
        };
        let capacity = pool.machine(id).capacity;

        // (time, delta): releases sort before acquisitions at the same instant.
        let mut events: Vec<(u64, i64)> = Vec::with_capacity(entries.len() * 2);
        for entry in entries {
            events.push((entry.start, i64::from(entry.cores)));
            events.push((entry.finish, -i64::from(entry.cores)));
        }
        events.sort_unstable();

        let mut in_use: i64 = 0;
        for (at, delta) in events {
            in_use += delta;
            if in_use > i64::from(capacity) {
                violations.push(AuditViolation::CapacityExceeded {
                    machine: machine_name.to_string(),
                    at,
                    in_use: in_use as u64,
                    capacity,
                });
                break;
            }
        }
    }

    // ── Makespan ──────────────────────────────────────────────────────────────
    let actual = schedule.entries.iter().map(|e| e.finish).max().unwrap_or(0);
    if schedule.makespan != actual {
        violations.push(AuditViolation::WrongMakespan {
            reported: schedule.makespan,
            actual,
        });
    }

    violations
}

// ── Tests ─────────────────────────────────────────────────────────────────────
