/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! jobshop – critical-path list scheduler for multi-core machines
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── task            – TaskDef / Task / ScheduleEntry / Schedule
//! ├── graph           – dependency graph builder (arena + Kahn's order)
//! ├── critical_path   – longest path to any leaf, per task
//! ├── pool            – machines and core accounting
//! ├── scheduler/      – discrete-event list scheduler
//! │   ├── engine        – ready heap, running heap, clock
//! │   ├── feasibility   – pre-flight check, lower bound, audit
//! │   └── error         – SchedulerError
//! ├── config/         – YAML task and machine files
//! ├── durations       – random duration assignment
//! └── export          – Gantt CSV and YAML report
//! ```

pub mod config;
pub mod critical_path;
pub mod durations;
pub mod export;
pub mod graph;
pub mod pool;
pub mod scheduler;
pub mod task;
