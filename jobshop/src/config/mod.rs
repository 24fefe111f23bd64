/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! YAML input loading.
//!
//! | File | Manager | Produces |
//! |---|---|---|
//! | task file (`jobs:`) | [`TaskConfigManager`] | `Vec<TaskDef>` |
//! | machine file (`machines:`) | [`MachineConfigManager`] | `Vec<MachineDef>` |
//!
//! Both managers report I/O and parse failures through `anyhow` with the file
//! path attached.  Structural checks on the loaded definitions (duplicates,
//! missing parents, cycles, zero values) are left to the scheduler.

pub mod machines;
pub mod tasks;

pub use machines::{MachineConfig, MachineConfigManager};
pub use tasks::TaskConfigManager;
