/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Machine resource pool.
//!
//! The pool owns every [`Machine`] of a run and tracks how many cores each
//! one has free.  Lookups always try the machine with the **fewest** free
//! cores that still fits the request, so large machines stay free for large
//! requests later on.
//!
//! Instead of re-sorting the machine list after every change, the pool keeps
//! an ordered index of `(available_cores, MachineId)` pairs.  The `MachineId`
//! component breaks ties by pool order, which keeps lookups deterministic.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::scheduler::{AccountingFault, SchedulerError};

/// Cores a machine has when its definition does not say otherwise.
pub const DEFAULT_MACHINE_CORES: u32 = 2;

// ── Identifiers & definitions ─────────────────────────────────────────────────

/// Stable index of a [`Machine`] inside its [`ResourcePool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MachineId(pub usize);

/// Raw machine definition as supplied by the configuration layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineDef {
    pub name: String,
    pub cores: u32,
}

impl MachineDef {
    pub fn new(name: impl Into<String>, cores: u32) -> Self {
        Self {
            name: name.into(),
            cores,
        }
    }
}

// ── Machine ───────────────────────────────────────────────────────────────────

/// One identical multi-core machine.
///
/// `available` is private so it can only change through the pool, which
/// guarantees `0 ≤ available ≤ capacity`.
#[derive(Debug, Clone)]
pub struct Machine {
    pub name: String,
    pub capacity: u32,
    available: u32,
}

impl Machine {
    pub fn available(&self) -> u32 {
        self.available
    }

    pub fn in_use(&self) -> u32 {
        self.capacity - self.available
    }

    pub fn is_idle(&self) -> bool {
        self.available == self.capacity
    }
}

// ── ResourcePool ──────────────────────────────────────────────────────────────

/// Ordered collection of machines with in-place core accounting.
#[derive(Debug, Clone)]
pub struct ResourcePool {
    machines: Vec<Machine>,
    /// `(available, id)` for every machine; iteration order is the lookup order.
    by_available: BTreeSet<(u32, MachineId)>,
}

impl ResourcePool {
    /// Build a pool from machine definitions.  Pool order follows `defs`.
    ///
    /// # Errors
    /// * [`SchedulerError::NoMachines`] for an empty input.
    /// * [`SchedulerError::InvalidMachineCapacity`] for a zero-core machine.
    /// * [`SchedulerError::DuplicateMachine`] if a name appears twice.
    pub fn new(defs: Vec<MachineDef>) -> Result<Self, SchedulerError> {
        if defs.is_empty() {
            return Err(SchedulerError::NoMachines);
        }

        let mut machines: Vec<Machine> = Vec::with_capacity(defs.len());
        let mut by_available = BTreeSet::new();

        for def in defs {
            if def.cores == 0 {
                return Err(SchedulerError::InvalidMachineCapacity { machine: def.name });
            }
            if machines.iter().any(|m| m.name == def.name) {
                return Err(SchedulerError::DuplicateMachine { machine: def.name });
            }

            let id = MachineId(machines.len());
            by_available.insert((def.cores, id));
            info!(machine = %def.name, cores = def.cores, "machine initialised");
            machines.push(Machine {
                name: def.name,
                capacity: def.cores,
                available: def.cores,
            });
        }

        Ok(Self {
            machines,
            by_available,
        })
    }

    // ── Lookup ────────────────────────────────────────────────────────────────

    /// The first machine, in ascending free-core order, with at least `cores`
    /// free.  Returns `None` if no machine currently qualifies.
    pub fn find_machine(&self, cores: u32) -> Option<MachineId> {
        self.by_available
            .range((cores, MachineId(0))..)
            .next()
            .map(|&(_, id)| id)
    }

    // ── Accounting ────────────────────────────────────────────────────────────

    /// Take `cores` from machine `id`.
    ///
    /// # Errors
    /// [`SchedulerError::ResourceAccounting`] if the machine does not have
    /// that many cores free; the pool is left unchanged.
    pub fn reserve(&mut self, id: MachineId, cores: u32) -> Result<(), SchedulerError> {
        let machine = Self::machine_entry(&mut self.machines, id)?;
        if cores > machine.available {
            return Err(SchedulerError::ResourceAccounting {
                machine: machine.name.clone(),
                fault: AccountingFault::Overcommit {
                    requested: cores,
                    available: machine.available,
                },
            });
        }

        self.by_available.remove(&(machine.available, id));
        machine.available -= cores;
        self.by_available.insert((machine.available, id));

        debug!(
            machine = %machine.name,
            reserved = cores,
            available = machine.available,
            "cores reserved"
        );
        Ok(())
    }

    /// Give `cores` back to machine `id`.
    ///
    /// # Errors
    /// [`SchedulerError::ResourceAccounting`] if that would push the machine
    /// above its capacity; the pool is left unchanged.
    pub fn release(&mut self, id: MachineId, cores: u32) -> Result<(), SchedulerError> {
        let machine = Self::machine_entry(&mut self.machines, id)?;
        if cores > machine.in_use() {
            return Err(SchedulerError::ResourceAccounting {
                machine: machine.name.clone(),
                fault: AccountingFault::OverRelease {
                    released: cores,
                    in_use: machine.in_use(),
                },
            });
        }

        self.by_available.remove(&(machine.available, id));
        machine.available += cores;
        self.by_available.insert((machine.available, id));

        debug!(
            machine = %machine.name,
            released = cores,
            available = machine.available,
            "cores released"
        );
        Ok(())
    }

    fn machine_entry(machines: &mut [Machine], id: MachineId) -> Result<&mut Machine, SchedulerError> {
        let count = machines.len();
        machines
            .get_mut(id.0)
            .ok_or_else(|| SchedulerError::ResourceAccounting {
                machine: format!("<{} of {}>", id.0, count),
                fault: AccountingFault::UnknownMachine { index: id.0 },
            })
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    /// Machine `id`.
    ///
    /// # Panics
    /// Panics if `id` was not issued by this pool.
    pub fn machine(&self, id: MachineId) -> &Machine {
        &self.machines[id.0]
    }

    /// All machines in pool order.
    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    pub fn id_of(&self, name: &str) -> Option<MachineId> {
        self.machines.iter().position(|m| m.name == name).map(MachineId)
    }

    /// Capacity of the largest machine.
    pub fn max_capacity(&self) -> u32 {
        self.machines.iter().map(|m| m.capacity).max().unwrap_or(0)
    }

    /// Sum of all machine capacities.
    pub fn total_capacity(&self) -> u64 {
        self.machines.iter().map(|m| u64::from(m.capacity)).sum()
    }

    /// `true` when every machine has all of its cores free.
    pub fn is_idle(&self) -> bool {
        self.machines.iter().all(Machine::is_idle)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
