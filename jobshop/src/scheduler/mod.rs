/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Critical-path list scheduler.
//!
//! [`Scheduler`] turns a set of task definitions and machine definitions into
//! a [`Schedule`]: every task assigned a machine, a start time and a finish
//! time, such that dependencies are respected and no machine ever runs more
//! cores than it has.
//!
//! # Pipeline
//!
//! | Step | Module | Fails with |
//! |---|---|---|
//! | Build and validate the graph | [`graph`](crate::graph) | `NoTasks`, `DuplicateTask`, `MissingDependency`, `CyclicDependency`, ... |
//! | Build the machine pool | [`pool`](crate::pool) | `NoMachines`, `DuplicateMachine`, `InvalidMachineCapacity` |
//! | Pre-flight check | [`feasibility`] | `Unschedulable` |
//! | Label critical paths | [`critical_path`](crate::critical_path) | `TimeOverflow` |
//! | Simulate | [`engine`] | `TimeOverflow` |
//! | Audit (optional) | [`feasibility`] | logged only |
//!
//! `Scheduler` holds no per-run state: everything a run mutates is created
//! inside [`Scheduler::schedule`] and dropped at the end of the call.
//!
//! # Example
//! ```rust
//! use jobshop::pool::MachineDef;
//! use jobshop::scheduler::Scheduler;
//! use jobshop::task::TaskDef;
//!
//! let tasks = vec![
//!     TaskDef::new("a", 2),
//!     TaskDef::new("b", 3).with_parents(["a"]),
//! ];
//! let machines = vec![MachineDef::new("m1", 2)];
//!
//! let schedule = Scheduler::default().schedule(tasks, machines).unwrap();
//! assert_eq!(schedule.makespan, 5);
//! ```

pub mod engine;
pub mod error;
pub mod feasibility;

pub use error::{AccountingFault, SchedulerError};

use tracing::{info, warn};

use crate::critical_path;
use crate::graph::TaskGraph;
use crate::pool::{MachineDef, ResourcePool};
use crate::task::{Schedule, TaskDef};

use engine::{Simulation, SimulationOutcome};
use feasibility::{audit, check_schedulable, makespan_lower_bound};

// ── Configuration ─────────────────────────────────────────────────────────────

/// Knobs for a [`Scheduler`].
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Re-check the finished schedule and log any violation with `warn!`.
    pub verify: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { verify: true }
    }
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

/// The jobshop list scheduler.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    // ── Public entry points ───────────────────────────────────────────────────

    /// Build the graph and pool from raw definitions, then schedule.
    ///
    /// # Errors
    /// Any [`SchedulerError`] raised while validating the input.  All of them
    /// are reported before the first simulation step.
    pub fn schedule(
        &self,
        tasks: Vec<TaskDef>,
        machines: Vec<MachineDef>,
    ) -> Result<Schedule, SchedulerError> {
        let graph = TaskGraph::build(tasks)?;
        let pool = ResourcePool::new(machines)?;
        self.schedule_graph(graph, pool)
    }

    /// Schedule an already-built graph on an already-built pool.
    pub fn schedule_graph(
        &self,
        graph: TaskGraph,
        pool: ResourcePool,
    ) -> Result<Schedule, SchedulerError> {
        self.run(graph, pool).map(|outcome| outcome.schedule)
    }

    /// Like [`schedule_graph`](Self::schedule_graph) but also hands back the
    /// final graph and pool for inspection.
    pub fn run(
        &self,
        mut graph: TaskGraph,
        pool: ResourcePool,
    ) -> Result<SimulationOutcome, SchedulerError> {
        // ── Preconditions ─────────────────────────────────────────────────────
        check_schedulable(&graph, &pool)?;

        // ── Priorities ────────────────────────────────────────────────────────
        let longest = critical_path::analyze(&mut graph)?;
        let lower_bound = makespan_lower_bound(&graph, &pool);
        let chain = critical_path::critical_chain(&graph)
            .into_iter()
            .map(|id| graph[id].name.as_str())
            .collect::<Vec<_>>()
            .join(" → ");

        info!(
            task_count = graph.len(),
            machine_count = pool.len(),
            total_cores = pool.total_capacity(),
            longest_path = longest,
            lower_bound,
            "=== Scheduler::run() ==="
        );
        info!(%chain, "critical chain");

        // ── Simulation ────────────────────────────────────────────────────────
        let outcome = Simulation::new(graph, pool).run()?;

        // ── Post-schedule audit ───────────────────────────────────────────────
        if self.config.verify {
            self.verify(&outcome);
        }

        info!(
            entries = outcome.schedule.len(),
            makespan = outcome.schedule.makespan,
            lower_bound,
            "=== Scheduling complete ==="
        );
        if outcome.schedule.makespan > lower_bound {
            info!(
                gap = outcome.schedule.makespan - lower_bound,
                "makespan above lower bound"
            );
        }

        Ok(outcome)
    }

    fn verify(&self, outcome: &SimulationOutcome) {
        let violations = audit(&outcome.graph, &outcome.pool, &outcome.schedule);
        if violations.is_empty() {
            info!("schedule audit passed");
        }
        for violation in &violations {
            warn!(%violation, "schedule audit failed");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn machines(defs: &[(&str, u32)]) -> Vec<MachineDef> {
        defs.iter().map(|&(n, c)| MachineDef::new(n, c)).collect()
    }

    // ── Reference scenarios ───────────────────────────────────────────────────

    #[test]
    fn independent_tasks_share_one_four_core_machine() {
        let tasks = vec![TaskDef::new("A", 3), TaskDef::new("B", 5)];
        let schedule = Scheduler::default()
            .schedule(tasks, machines(&[("m1", 4)]))
            .unwrap();

        let a = schedule.entry("A").unwrap();
        let b = schedule.entry("B").unwrap();
        assert_eq!((a.start, a.finish), (0, 3));
        assert_eq!((b.start, b.finish), (0, 5));
        assert_eq!(a.machine, "m1");
        assert_eq!(b.machine, "m1");
        assert_eq!(schedule.makespan, 5);
    }

    #[test]
    fn dependent_task_waits_for_parent() {
        let tasks = vec![TaskDef::new("A", 2), TaskDef::new("B", 3).with_parents(["A"])];
        let schedule = Scheduler::default()
            .schedule(tasks, machines(&[("m1", 2)]))
            .unwrap();

        let a = schedule.entry("A").unwrap();
        let b = schedule.entry("B").unwrap();
        assert_eq!((a.start, a.finish), (0, 2));
        assert_eq!((b.start, b.finish), (2, 5));
        assert_eq!(schedule.makespan, 5);
    }

    #[test]
    fn four_core_task_on_two_core_machines_is_unschedulable() {
        let tasks = vec![TaskDef::new("wide", 1).with_cores(4)];
        let err = Scheduler::default()
            .schedule(tasks, machines(&[("m1", 2), ("m2", 2)]))
            .unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::Unschedulable {
                required: 4,
                max_capacity: 2,
                ..
            }
        ));
    }

    #[test]
    fn mutual_parents_are_rejected_as_cycle() {
        let tasks = vec![
            TaskDef::new("A", 1).with_parents(["B"]),
            TaskDef::new("B", 1).with_parents(["A"]),
        ];
        let err = Scheduler::default()
            .schedule(tasks, machines(&[("m1", 2)]))
            .unwrap_err();
        assert!(matches!(err, SchedulerError::CyclicDependency { .. }));
    }

    #[test]
    fn huge_durations_overflow_instead_of_saturating() {
        let tasks = vec![
            TaskDef::new("a", u64::MAX - 1),
            TaskDef::new("b", 5).with_parents(["a"]),
        ];
        let err = Scheduler::default()
            .schedule(tasks, machines(&[("m1", 2)]))
            .unwrap_err();
        assert!(matches!(err, SchedulerError::TimeOverflow { .. }));
    }

    #[test]
    fn largest_representable_finish_is_still_scheduled() {
        let tasks = vec![
            TaskDef::new("a", u64::MAX - 5),
            TaskDef::new("b", 5).with_parents(["a"]),
        ];
        let schedule = Scheduler::default()
            .schedule(tasks, machines(&[("m1", 2)]))
            .unwrap();
        let b = schedule.entry("b").unwrap();
        assert_eq!(b.finish - b.start, 5);
        assert_eq!(schedule.makespan, u64::MAX);
    }

    // ── General ───────────────────────────────────────────────────────────────

    #[test]
    fn empty_tasks_returns_no_tasks_error() {
        let err = Scheduler::default()
            .schedule(vec![], machines(&[("m1", 2)]))
            .unwrap_err();
        assert!(matches!(err, SchedulerError::NoTasks));
    }

    #[test]
    fn empty_machines_returns_no_machines_error() {
        let err = Scheduler::default()
            .schedule(vec![TaskDef::new("a", 1)], vec![])
            .unwrap_err();
        assert!(matches!(err, SchedulerError::NoMachines));
    }

    #[test]
    fn run_returns_finished_graph_and_idle_pool() {
        let graph = TaskGraph::build(vec![
            TaskDef::new("a", 1),
            TaskDef::new("b", 1).with_parents(["a"]),
        ])
        .unwrap();
        let pool = ResourcePool::new(machines(&[("m1", 2)])).unwrap();

        let outcome = Scheduler::default().run(graph, pool).unwrap();
        assert!(outcome.pool.is_idle());
        assert_eq!(outcome.graph.get("a").unwrap().critical_path, 2);
        assert!(audit(&outcome.graph, &outcome.pool, &outcome.schedule).is_empty());
    }

    #[test]
    fn makespan_is_never_below_root_critical_path() {
        let tasks = vec![
            TaskDef::new("r1", 2),
            TaskDef::new("r2", 1),
            TaskDef::new("x", 4).with_parents(["r1"]),
            TaskDef::new("y", 2).with_parents(["r1", "r2"]),
            TaskDef::new("z", 3).with_parents(["x", "y"]),
        ];
        let graph = TaskGraph::build(tasks).unwrap();
        let pool = ResourcePool::new(machines(&[("m1", 2), ("m2", 4)])).unwrap();
        let outcome = Scheduler::default().run(graph, pool).unwrap();

        for root in outcome.graph.roots() {
            assert!(outcome.schedule.makespan >= outcome.graph[root].critical_path);
        }
    }

    #[test]
    fn scheduler_is_deterministic() {
        // Same input 20 times must produce an identical schedule.
        let tasks = || {
            vec![
                TaskDef::new("a", 3),
                TaskDef::new("b", 3),
                TaskDef::new("c", 3),
                TaskDef::new("d", 2).with_parents(["a", "b"]),
                TaskDef::new("e", 2).with_parents(["c"]),
            ]
        };
        let reference = Scheduler::default()
            .schedule(tasks(), machines(&[("m1", 2), ("m2", 2)]))
            .unwrap();

        for _ in 0..19 {
            let again = Scheduler::default()
                .schedule(tasks(), machines(&[("m1", 2), ("m2", 2)]))
                .unwrap();
            assert_eq!(
                again, reference,
                "scheduler produced different output on repeated identical input"
            );
        }
    }
}
