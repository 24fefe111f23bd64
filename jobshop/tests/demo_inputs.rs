/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;

use jobshop::config::{MachineConfigManager, TaskConfigManager};
use jobshop::durations;
use jobshop::scheduler::Scheduler;

fn demo(file: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join(file)
}

fn load() -> (TaskConfigManager, MachineConfigManager) {
    let mut tasks = TaskConfigManager::new();
    tasks.load_from_file(&demo("tasks.yaml")).unwrap();
    let mut machines = MachineConfigManager::new();
    machines.load_from_file(&demo("machines.yaml")).unwrap();
    (tasks, machines)
}

#[test]
fn demo_workload_schedules() {
    let (mut tasks, machines) = load();
    assert!(tasks.missing_durations().is_empty());

    let schedule = Scheduler::default()
        .schedule(tasks.take_task_defs(), machines.machine_defs())
        .unwrap();

    assert_eq!(schedule.len(), 7);
    // fetch → compile_core → link → unit_tests → package is the longest chain.
    assert_eq!(schedule.makespan, 2 + 6 + 2 + 4 + 2);
    assert_eq!(schedule.entry("fetch").unwrap().start, 0);
    assert_eq!(schedule.entry("compile_core").unwrap().machine, "m1");
}

#[test]
fn demo_workload_with_random_durations() {
    let (mut tasks, machines) = load();
    let mut defs = tasks.take_task_defs();
    durations::randomize(&mut defs, 1..=5, Some(7)).unwrap();

    let schedule = Scheduler::default()
        .schedule(defs, machines.machine_defs())
        .unwrap();
    assert_eq!(schedule.len(), 7);
    assert!(schedule.entries.iter().all(|e| (1..=5).contains(&(e.finish - e.start))));
}
