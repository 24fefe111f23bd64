/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Dependency graph construction and validation.
//!
//! [`TaskGraph`] is an arena: tasks live in a `Vec<Task>` in input order and
//! link to each other through [`TaskId`] index sets.  Parent links come
//! straight from the definitions; child links are their inverse.
//!
//! Construction validates the whole graph before anything else may look at
//! it, so every later stage can rely on:
//!
//! * unique task names,
//! * every parent name resolving to a task,
//! * positive durations and core counts,
//! * no cycles (checked with Kahn's algorithm; the resulting order is kept
//!   and reused by the critical-path analyzer).

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::ops::Index;

use tracing::{debug, info};

use crate::scheduler::SchedulerError;
use crate::task::{Task, TaskDef, TaskId};

// ── TaskGraph ─────────────────────────────────────────────────────────────────

/// Validated, acyclic set of tasks with resolved parent/child links.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    tasks: Vec<Task>,
    index: HashMap<String, TaskId>,
    /// Roots first; every task appears after all of its parents.
    topo_order: Vec<TaskId>,
}

impl TaskGraph {
    /// Build the graph from raw definitions.
    ///
    /// Arena order follows `defs`.  A parent listed twice by the same task is
    /// counted once.
    ///
    /// # Errors
    /// * [`SchedulerError::NoTasks`] for an empty input.
    /// * [`SchedulerError::DuplicateTask`] if a name appears twice.
    /// * [`SchedulerError::InvalidDuration`] / [`SchedulerError::InvalidCoreCount`]
    ///   for zero durations or core requirements.
    /// * [`SchedulerError::MissingDependency`] if a parent is not defined.
    /// * [`SchedulerError::CyclicDependency`] if the links contain a cycle.
    pub fn build(defs: Vec<TaskDef>) -> Result<Self, SchedulerError> {
        if defs.is_empty() {
            return Err(SchedulerError::NoTasks);
        }

        // ── Pass 1: identities and per-task checks ────────────────────────────
        let mut index: HashMap<String, TaskId> = HashMap::with_capacity(defs.len());
        for (i, def) in defs.iter().enumerate() {
            if def.duration == 0 {
                return Err(SchedulerError::InvalidDuration {
                    task: def.name.clone(),
                });
            }
            if def.cores == 0 {
                return Err(SchedulerError::InvalidCoreCount {
                    task: def.name.clone(),
                });
            }
            if index.insert(def.name.clone(), TaskId(i)).is_some() {
                return Err(SchedulerError::DuplicateTask {
                    task: def.name.clone(),
                });
            }
        }

        // ── Pass 2: resolve parent names into index links ─────────────────────
        let mut resolved: Vec<BTreeSet<TaskId>> = Vec::with_capacity(defs.len());
        for def in &defs {
            let mut parents = BTreeSet::new();
            for parent in &def.parents {
                let id = index
                    .get(parent)
                    .copied()
                    .ok_or_else(|| SchedulerError::MissingDependency {
                        task: def.name.clone(),
                        parent: parent.clone(),
                    })?;
                parents.insert(id);
            }
            resolved.push(parents);
        }

        let mut tasks: Vec<Task> = defs
            .into_iter()
            .zip(resolved)
            .map(|(def, parents)| Task::from_def(def, parents))
            .collect();

        // ── Pass 3: children as the inverse of parents ────────────────────────
        for child in 0..tasks.len() {
            let parents: Vec<TaskId> = tasks[child].parents.iter().copied().collect();
            for parent in parents {
                tasks[parent.0].children.insert(TaskId(child));
            }
        }

        let topo_order = topological_order(&tasks)?;

        let graph = Self {
            tasks,
            index,
            topo_order,
        };

        info!(
            task_count = graph.len(),
            roots = graph.roots().count(),
            leaves = graph.leaves().count(),
            "task graph built"
        );

        Ok(graph)
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// All tasks in arena order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Arena ids in order.
    pub fn ids(&self) -> impl Iterator<Item = TaskId> {
        (0..self.tasks.len()).map(TaskId)
    }

    /// Returns the [`TaskId`] registered for `name`, or `None`.
    pub fn id_of(&self, name: &str) -> Option<TaskId> {
        self.index.get(name).copied()
    }

    /// Returns the task called `name`, or `None`.
    pub fn get(&self, name: &str) -> Option<&Task> {
        self.id_of(name).map(|id| &self.tasks[id.0])
    }

    pub(crate) fn task_mut(&mut self, id: TaskId) -> &mut Task {
        &mut self.tasks[id.0]
    }

    /// Tasks with no parents.
    pub fn roots(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.ids().filter(|&id| self[id].is_root())
    }

    /// Tasks with no children.
    pub fn leaves(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.ids().filter(|&id| self[id].is_leaf())
    }

    /// Roots first; every task appears after all of its parents.
    pub fn topological_order(&self) -> &[TaskId] {
        &self.topo_order
    }
}

impl Index<TaskId> for TaskGraph {
    type Output = Task;

    fn index(&self, id: TaskId) -> &Task {
        &self.tasks[id.0]
    }
}

// ── Kahn's algorithm ──────────────────────────────────────────────────────────

/// Order `tasks` so that every parent precedes its children.
///
/// The queue is seeded with roots in arena order and processed FIFO, so the
/// result is deterministic for a given input order.  Any task left with a
/// non-zero in-degree sits on (or downstream of) a cycle.
fn topological_order(tasks: &[Task]) -> Result<Vec<TaskId>, SchedulerError> {
    let mut in_degree: Vec<usize> = tasks.iter().map(|t| t.parents.len()).collect();

    let mut queue: VecDeque<TaskId> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, &degree)| degree == 0)
        .map(|(i, _)| TaskId(i))
        .collect();

    let mut order: Vec<TaskId> = Vec::with_capacity(tasks.len());

    while let Some(id) = queue.pop_front() {
        order.push(id);
        for &child in &tasks[id.0].children {
            let degree = &mut in_degree[child.0];
            *degree -= 1;
            if *degree == 0 {
                queue.push_back(child);
            }
        }
    }

    if order.len() != tasks.len() {
        let mut stuck: Vec<String> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &degree)| degree > 0)
            .map(|(i, _)| tasks[i].name.clone())
            .collect();
        stuck.sort();
        debug!(unordered = ?stuck, "topological sort left tasks unordered");
        return Err(SchedulerError::CyclicDependency { tasks: stuck });
    }

    Ok(order)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskState;

    fn names(graph: &TaskGraph, ids: impl Iterator<Item = TaskId>) -> Vec<String> {
        ids.map(|id| graph[id].name.clone()).collect()
    }

    /// ```text
    /// a ──► b ──► d
    ///  └──► c ──┘
    /// ```
    fn diamond() -> Vec<TaskDef> {
        vec![
            TaskDef::new("a", 1),
            TaskDef::new("b", 2).with_parents(["a"]),
            TaskDef::new("c", 3).with_parents(["a"]),
            TaskDef::new("d", 4).with_parents(["b", "c"]),
        ]
    }

    // ── Construction ──────────────────────────────────────────────────────────

    #[test]
    fn children_are_inverse_of_parents() {
        let graph = TaskGraph::build(diamond()).unwrap();
        let a = graph.id_of("a").unwrap();
        let d = graph.id_of("d").unwrap();

        assert_eq!(names(&graph, graph[a].children.iter().copied()), vec!["b", "c"]);
        assert_eq!(names(&graph, graph[d].parents.iter().copied()), vec!["b", "c"]);
        assert!(graph[d].children.is_empty());
    }

    #[test]
    fn roots_start_ready_and_others_blocked() {
        let graph = TaskGraph::build(diamond()).unwrap();
        assert_eq!(graph.get("a").unwrap().state, TaskState::Ready);
        assert_eq!(graph.get("b").unwrap().state, TaskState::Blocked);
        assert_eq!(graph.get("d").unwrap().pending_parents, 2);
    }

    #[test]
    fn roots_and_leaves_are_reported() {
        let graph = TaskGraph::build(diamond()).unwrap();
        assert_eq!(names(&graph, graph.roots()), vec!["a"]);
        assert_eq!(names(&graph, graph.leaves()), vec!["d"]);
    }

    #[test]
    fn duplicate_parent_reference_counts_once() {
        let graph = TaskGraph::build(vec![
            TaskDef::new("a", 1),
            TaskDef::new("b", 1).with_parents(["a", "a"]),
        ])
        .unwrap();
        assert_eq!(graph.get("b").unwrap().pending_parents, 1);
    }

    #[test]
    fn topological_order_places_parents_first() {
        let graph = TaskGraph::build(vec![
            TaskDef::new("d", 4).with_parents(["b", "c"]),
            TaskDef::new("c", 3).with_parents(["a"]),
            TaskDef::new("b", 2).with_parents(["a"]),
            TaskDef::new("a", 1),
        ])
        .unwrap();

        let order = graph.topological_order();
        assert_eq!(order.len(), 4);
        let position = |name: &str| {
            let id = graph.id_of(name).unwrap();
            order.iter().position(|&x| x == id).unwrap()
        };
        assert!(position("a") < position("b"));
        assert!(position("a") < position("c"));
        assert!(position("b") < position("d"));
        assert!(position("c") < position("d"));
    }

    // ── Validation ────────────────────────────────────────────────────────────

    #[test]
    fn empty_input_returns_no_tasks() {
        let err = TaskGraph::build(vec![]).unwrap_err();
        assert!(matches!(err, SchedulerError::NoTasks));
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let err = TaskGraph::build(vec![TaskDef::new("a", 1), TaskDef::new("a", 2)]).unwrap_err();
        assert!(matches!(err, SchedulerError::DuplicateTask { ref task } if task == "a"));
    }

    #[test]
    fn missing_parent_is_rejected() {
        let err = TaskGraph::build(vec![TaskDef::new("b", 1).with_parents(["ghost"])]).unwrap_err();
        match err {
            SchedulerError::MissingDependency { task, parent } => {
                assert_eq!(task, "b");
                assert_eq!(parent, "ghost");
            }
            other => panic!("expected MissingDependency, got {other}"),
        }
    }

    #[test]
    fn zero_duration_is_rejected() {
        let err = TaskGraph::build(vec![TaskDef::new("a", 0)]).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidDuration { .. }));
    }

    #[test]
    fn zero_cores_is_rejected() {
        let err = TaskGraph::build(vec![TaskDef::new("a", 1).with_cores(0)]).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidCoreCount { .. }));
    }

    #[test]
    fn two_task_cycle_is_rejected() {
        let err = TaskGraph::build(vec![
            TaskDef::new("a", 1).with_parents(["b"]),
            TaskDef::new("b", 1).with_parents(["a"]),
        ])
        .unwrap_err();
        match err {
            SchedulerError::CyclicDependency { tasks } => assert_eq!(tasks, vec!["a", "b"]),
            other => panic!("expected CyclicDependency, got {other}"),
        }
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let err = TaskGraph::build(vec![TaskDef::new("a", 1).with_parents(["a"])]).unwrap_err();
        assert!(matches!(err, SchedulerError::CyclicDependency { .. }));
    }

    #[test]
    fn cycle_report_includes_downstream_tasks_only() {
        // root ──► x ⇄ y ──► tail
        let err = TaskGraph::build(vec![
            TaskDef::new("root", 1),
            TaskDef::new("x", 1).with_parents(["root", "y"]),
            TaskDef::new("y", 1).with_parents(["x"]),
            TaskDef::new("tail", 1).with_parents(["y"]),
        ])
        .unwrap_err();
        match err {
            SchedulerError::CyclicDependency { tasks } => {
                assert_eq!(tasks, vec!["tail", "x", "y"]);
            }
            other => panic!("expected CyclicDependency, got {other}"),
        }
    }
}
