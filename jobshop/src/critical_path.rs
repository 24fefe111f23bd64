/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Critical-path (longest remaining path) labelling.
//!
//! For every task `t`:
//!
//! ```text
//! cp(t) = duration(t) + max { cp(c) : c ∈ children(t) }      (0 if t is a leaf)
//! ```
//!
//! The graph's topological order is walked backwards, so every child is
//! final before any of its parents is visited.  Each task is visited exactly
//! once and nothing recurses, which keeps the pass linear in the number of
//! edges.

use tracing::{debug, info};

use crate::graph::TaskGraph;
use crate::scheduler::SchedulerError;
use crate::task::TaskId;

/// Label every task in `graph` with its critical-path length.
///
/// Returns the longest critical path in the graph (the largest label, which
/// always belongs to a root).
///
/// # Errors
/// [`SchedulerError::TimeOverflow`] naming the first task whose label does
/// not fit in `u64`.
pub fn analyze(graph: &mut TaskGraph) -> Result<u64, SchedulerError> {
    let order: Vec<TaskId> = graph.topological_order().iter().rev().copied().collect();
    let mut longest = 0u64;

    for id in order {
        let downstream = graph[id]
            .children
            .iter()
            .map(|&child| graph[child].critical_path)
            .max()
            .unwrap_or(0);

        let task = graph.task_mut(id);
        task.critical_path = task
            .duration
            .checked_add(downstream)
            .ok_or_else(|| SchedulerError::TimeOverflow {
                task: task.name.clone(),
            })?;
        longest = longest.max(task.critical_path);

        debug!(
            task = %task.name,
            duration = task.duration,
            critical_path = task.critical_path,
            "critical path labelled"
        );
    }

    info!(longest, "critical path analysis done");
    Ok(longest)
}

/// The chain of tasks realising the longest critical path, root to leaf.
///
/// Starts at the root with the largest label and repeatedly follows the child
/// with the largest label.  Ties go to the alphabetically smaller name.
/// Only meaningful after [`analyze`] has run.
pub fn critical_chain(graph: &TaskGraph) -> Vec<TaskId> {
    let pick = |candidates: &mut dyn Iterator<Item = TaskId>| {
        candidates.max_by(|&a, &b| {
            graph[a]
                .critical_path
                .cmp(&graph[b].critical_path)
                .then_with(|| graph[b].name.cmp(&graph[a].name))
        })
    };

    let mut chain = Vec::new();
    let mut current = pick(&mut graph.roots());
    while let Some(id) = current {
        chain.push(id);
        current = pick(&mut graph[id].children.iter().copied());
    }
    chain
}

// ── Tests ─────────────────────────────────────────────────────────────────────
