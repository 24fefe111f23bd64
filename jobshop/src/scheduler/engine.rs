/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Discrete-event list-scheduling loop.
//!
//! ```text
//!            ┌──────────── dispatch ◄────────────┐
//!            ▼                                   │
//!  ready (max-heap by cp) ──► running (min-heap by finish) ──► complete
//!            ▲                                                   │
//!            └──────────────── unblock children ◄────────────────┘
//! ```
//!
//! All state lives in one [`Simulation`] value created per run; nothing is
//! shared between runs.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use tracing::{debug, trace};

use super::SchedulerError;
use crate::graph::TaskGraph;
use crate::pool::{MachineId, ResourcePool};
use crate::task::{Schedule, ScheduleEntry, TaskId, TaskState};

// ── Ready-set ordering ────────────────────────────────────────────────────────

/// Ready task ordered by priority: longest critical path first, then task
/// name ascending, then arena index ascending.
#[derive(Debug, PartialEq, Eq)]
struct ReadyTask {
    critical_path: u64,
    name: String,
    id: TaskId,
}

impl PartialOrd for ReadyTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReadyTask {
    fn cmp(&self, other: &Self) -> Ordering {
        // Larger critical path wins; on ties the smaller name / id wins
        // (reversed for the max-heap).
        self.critical_path
            .cmp(&other.critical_path)
            .then_with(|| other.name.cmp(&self.name))
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// Running task key: `(finish, commit sequence, id)`, wrapped in `Reverse`
/// so the heap pops the earliest finish, and among equal finishes the task
/// committed first.
type RunningKey = Reverse<(u64, usize, TaskId)>;

// ── Simulation ────────────────────────────────────────────────────────────────

/// Everything one scheduling run produced.
#[derive(Debug)]
pub struct SimulationOutcome {
    pub schedule: Schedule,
    /// The graph with every task `Done` and its start / finish / machine set.
    pub graph: TaskGraph,
    /// The pool, back to fully idle.
    pub pool: ResourcePool,
    /// Number of completion events processed (equals the task count).
    pub events: usize,
}

/// Per-run scheduling state.
pub struct Simulation {
    graph: TaskGraph,
    pool: ResourcePool,
    ready: BinaryHeap<ReadyTask>,
    running: BinaryHeap<RunningKey>,
    clock: u64,
    entries: Vec<ScheduleEntry>,
    remaining: usize,
}

impl Simulation {
    /// Seed the ready set with every task that has no parents.
    ///
    /// `graph` must already carry critical-path labels; otherwise all
    /// priorities tie and the order degrades to alphabetical.
    pub fn new(graph: TaskGraph, pool: ResourcePool) -> Self {
        let ready: BinaryHeap<ReadyTask> = graph
            .ids()
            .filter(|&id| graph[id].is_ready())
            .map(|id| ReadyTask {
                critical_path: graph[id].critical_path,
                name: graph[id].name.clone(),
                id,
            })
            .collect();
        let remaining = graph.len();

        Self {
            graph,
            pool,
            ready,
            running: BinaryHeap::new(),
            clock: 0,
            entries: Vec::with_capacity(remaining),
            remaining,
        }
    }

    /// Run until every task has finished.
    ///
    /// # Errors
    /// * [`SchedulerError::Unschedulable`] if tasks remain but nothing is
    ///   running and nothing can be dispatched.  Unreachable when the
    ///   pre-flight feasibility check passed.
    /// * [`SchedulerError::TimeOverflow`] if a finish time does not fit in
    ///   `u64`.
    /// * [`SchedulerError::ResourceAccounting`] if the pool refuses a
    ///   reservation or release.
    pub fn run(mut self) -> Result<SimulationOutcome, SchedulerError> {
        self.dispatch()?;

        let mut events = 0usize;
        while self.remaining > 0 {
            let Some(Reverse((finish, _, id))) = self.running.pop() else {
                return Err(self.stalled());
            };
            self.complete(id, finish)?;
            events += 1;
            self.dispatch()?;
        }

        Ok(SimulationOutcome {
            schedule: Schedule::from_entries(self.entries),
            graph: self.graph,
            pool: self.pool,
            events,
        })
    }

    /// Try every ready task, highest priority first.
    ///
    /// Tasks that do not fit anywhere stay ready; a lower-priority task that
    /// needs fewer cores may still be dispatched in the same step.
    fn dispatch(&mut self) -> Result<usize, SchedulerError> {
        let mut deferred: Vec<ReadyTask> = Vec::new();
        let mut dispatched = 0usize;

        while let Some(candidate) = self.ready.pop() {
            let cores = self.graph[candidate.id].cores;
            match self.pool.find_machine(cores) {
                Some(machine) => {
                    self.start(candidate.id, machine)?;
                    dispatched += 1;
                }
                None => deferred.push(candidate),
            }
        }

        self.ready.extend(deferred);

        if dispatched > 0 {
            debug!(
                clock = self.clock,
                dispatched,
                still_ready = self.ready.len(),
                running = self.running.len(),
                "dispatch step"
            );
        }
        Ok(dispatched)
    }

    /// `Ready → Running`: reserve cores and commit the schedule entry.
    fn start(&mut self, id: TaskId, machine: MachineId) -> Result<(), SchedulerError> {
        let start = self.clock;
        let cores = self.graph[id].cores;
        let finish = start.checked_add(self.graph[id].duration).ok_or_else(|| {
            SchedulerError::TimeOverflow {
                task: self.graph[id].name.clone(),
            }
        })?;
        self.pool.reserve(machine, cores)?;

        let task = self.graph.task_mut(id);
        task.state = TaskState::Running;
        task.start = Some(start);
        task.finish = Some(finish);
        task.machine = Some(machine);

        let machine_name = self.pool.machine(machine).name.clone();
        debug!(
            task = %task.name,
            machine = %machine_name,
            start,
            finish,
            cores,
            critical_path = task.critical_path,
            "task started"
        );

        let seq = self.entries.len();
        self.entries.push(ScheduleEntry {
            task: task.name.clone(),
            start,
            finish,
            machine: machine_name,
            cores,
        });
        self.running.push(Reverse((finish, seq, id)));
        Ok(())
    }

    /// `Running → Done`: advance the clock, release cores, unblock children.
    fn complete(&mut self, id: TaskId, finish: u64) -> Result<(), SchedulerError> {
        self.clock = finish;

        let task = self.graph.task_mut(id);
        task.state = TaskState::Done;
        let cores = task.cores;
        let machine = task.machine;
        let children: Vec<TaskId> = task.children.iter().copied().collect();

        if let Some(machine) = machine {
            self.pool.release(machine, cores)?;
        }
        self.remaining -= 1;

        trace!(task = %self.graph[id].name, clock = self.clock, "task finished");

        for child in children {
            let task = self.graph.task_mut(child);
            task.pending_parents = task.pending_parents.saturating_sub(1);
            if task.pending_parents == 0 && task.state == TaskState::Blocked {
                task.state = TaskState::Ready;
                trace!(task = %task.name, clock = self.clock, "task unblocked");
                self.ready.push(ReadyTask {
                    critical_path: task.critical_path,
                    name: task.name.clone(),
                    id: child,
                });
            }
        }
        Ok(())
    }

    /// Error for a run that cannot make progress.
    fn stalled(&self) -> SchedulerError {
        let max_capacity = self.pool.max_capacity();
        let stuck = self
            .ready
            .peek()
            .map(|r| r.id)
            .or_else(|| self.graph.ids().find(|&id| self.graph[id].state != TaskState::Done));

        match stuck {
            Some(id) => SchedulerError::Unschedulable {
                task: self.graph[id].name.clone(),
                required: self.graph[id].cores,
                max_capacity,
            },
            None => SchedulerError::NoTasks,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::critical_path;
    use crate::pool::MachineDef;
    use crate::task::TaskDef;

    fn run(tasks: Vec<TaskDef>, machines: &[(&str, u32)]) -> SimulationOutcome {
        let mut graph = TaskGraph::build(tasks).unwrap();
        critical_path::analyze(&mut graph).unwrap();
        let pool = ResourcePool::new(
            machines
                .iter()
                .map(|&(n, c)| MachineDef::new(n, c))
                .collect(),
        )
        .unwrap();
        Simulation::new(graph, pool).run().unwrap()
    }

    fn ready(cp: u64, name: &str, id: usize) -> ReadyTask {
        ReadyTask {
            critical_path: cp,
            name: name.into(),
            id: TaskId(id),
        }
    }

    // ── ReadyTask ordering ────────────────────────────────────────────────────

    #[test]
    fn ready_heap_pops_longest_critical_path_first() {
        let mut heap: BinaryHeap<ReadyTask> =
            vec![ready(3, "a", 0), ready(9, "b", 1), ready(5, "c", 2)].into_iter().collect();
        let order: Vec<String> = std::iter::from_fn(|| heap.pop().map(|r| r.name)).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
    }

    #[test]
    fn ready_heap_breaks_ties_by_name() {
        let mut heap: BinaryHeap<ReadyTask> =
            vec![ready(4, "zeta", 0), ready(4, "alpha", 1)].into_iter().collect();
        assert_eq!(heap.pop().unwrap().name, "alpha");
    }

    // ── Loop behaviour ────────────────────────────────────────────────────────

    #[test]
    fn every_task_is_committed_once_and_pool_ends_idle() {
        let outcome = run(
            vec![
                TaskDef::new("a", 1),
                TaskDef::new("b", 2).with_parents(["a"]),
                TaskDef::new("c", 3).with_parents(["a"]),
                TaskDef::new("d", 1).with_parents(["b", "c"]),
            ],
            &[("m1", 2), ("m2", 2)],
        );

        assert_eq!(outcome.schedule.len(), 4);
        assert_eq!(outcome.events, 4);
        assert!(outcome.pool.is_idle());
        assert!(outcome
            .graph
            .tasks()
            .iter()
            .all(|t| t.state == TaskState::Done && t.is_scheduled()));
    }

    #[test]
    fn long_chain_is_dispatched_before_short_one() {
        // One 2-core machine: only one task at a time.  `long` heads a longer
        // critical path so it must go first even though `short` sorts first.
        let outcome = run(
            vec![
                TaskDef::new("short", 1),
                TaskDef::new("long", 1),
                TaskDef::new("tail", 5).with_parents(["long"]),
            ],
            &[("m1", 2)],
        );
        assert_eq!(outcome.schedule.entries[0].task, "long");
        assert_eq!(outcome.schedule.entry("tail").unwrap().start, 1);
        assert_eq!(outcome.schedule.entry("short").unwrap().start, 6);
        assert_eq!(outcome.schedule.makespan, 7);
    }

    #[test]
    fn smaller_task_fills_gap_left_by_blocked_big_one() {
        // `big` (4 cores) cannot start while `hog` holds 2 of the 4 cores, but
        // `small` (2 cores) can use the remaining 2 in the same step.
        let outcome = run(
            vec![
                TaskDef::new("hog", 4),
                TaskDef::new("big", 3).with_cores(4),
                TaskDef::new("small", 1),
            ],
            &[("m1", 4)],
        );
        let s = &outcome.schedule;
        assert_eq!(s.entry("hog").unwrap().start, 0);
        assert_eq!(s.entry("small").unwrap().start, 0);
        assert_eq!(s.entry("big").unwrap().start, 4);
        assert_eq!(s.makespan, 7);
    }

    #[test]
    fn simultaneous_finishes_complete_in_commit_order() {
        let outcome = run(
            vec![
                TaskDef::new("a", 2),
                TaskDef::new("b", 2),
                TaskDef::new("after_a", 1).with_parents(["a"]),
                TaskDef::new("after_b", 1).with_parents(["b"]),
            ],
            &[("m1", 4)],
        );
        let s = &outcome.schedule;
        assert_eq!(s.entry("after_a").unwrap().start, 2);
        assert_eq!(s.entry("after_b").unwrap().start, 2);
        assert_eq!(s.makespan, 3);
    }

    #[test]
    fn two_core_task_leaves_four_core_machine_for_wide_task() {
        // `narrow` sorts first on a cp tie; it must take the 2-core machine
        // so that `wide` still finds all 4 cores free at t=0.
        let outcome = run(
            vec![
                TaskDef::new("narrow", 3),
                TaskDef::new("wide", 3).with_cores(4),
            ],
            &[("big", 4), ("small", 2)],
        );
        let s = &outcome.schedule;
        assert_eq!(s.entry("narrow").unwrap().machine, "small");
        assert_eq!(s.entry("wide").unwrap().machine, "big");
        assert_eq!(s.entry("wide").unwrap().start, 0);
        assert_eq!(s.makespan, 3);
    }

    #[test]
    fn lowest_fit_is_rechecked_after_release() {
        // `next` becomes ready when `first` frees 2 cores on `big`; the index
        // must reflect that release so `next` lands there at t=1.
        let outcome = run(
            vec![
                TaskDef::new("first", 1),
                TaskDef::new("anchor", 5),
                TaskDef::new("hold", 5),
                TaskDef::new("next", 1).with_parents(["first"]),
            ],
            &[("big", 4), ("small", 2)],
        );
        let s = &outcome.schedule;
        // cp ties at 5 go to `anchor` (tightest fit: `small`) then `hold`.
        assert_eq!(s.entry("anchor").unwrap().machine, "small");
        assert_eq!(s.entry("hold").unwrap().machine, "big");
        assert_eq!(s.entry("first").unwrap().machine, "big");
        // After `first` finishes, `big` has 2 free and `small` none.
        assert_eq!(s.entry("next").unwrap().start, 1);
        assert_eq!(s.entry("next").unwrap().machine, "big");
    }

    #[test]
    fn finish_time_overflow_is_an_error() {
        // Independent tasks, so critical paths fit; only the second start
        // on the single machine overflows the clock.
        let half = u64::MAX / 2 + 1;
        let mut graph =
            TaskGraph::build(vec![TaskDef::new("a", half), TaskDef::new("b", half)]).unwrap();
        critical_path::analyze(&mut graph).unwrap();
        let pool = ResourcePool::new(vec![MachineDef::new("m1", 2)]).unwrap();

        let err = Simulation::new(graph, pool).run().unwrap_err();
        assert!(matches!(err, SchedulerError::TimeOverflow { ref task } if task == "b"));
    }

    #[test]
    fn stalled_run_reports_unschedulable() {
        // Bypasses the pre-flight check on purpose.
        let graph = TaskGraph::build(vec![TaskDef::new("big", 1).with_cores(8)]).unwrap();
        let pool = ResourcePool::new(vec![MachineDef::new("m1", 2)]).unwrap();
        let err = Simulation::new(graph, pool).run().unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::Unschedulable {
                required: 8,
                max_capacity: 2,
                ..
            }
        ));
    }
}
