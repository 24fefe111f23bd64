/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Random task durations.
//!
//! Used when the task file carries no durations (or they should be ignored):
//! every task gets a uniform integer duration drawn from a range.  A seed
//! makes the draw reproducible.

use std::ops::RangeInclusive;

use anyhow::{ensure, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::task::TaskDef;

/// Range used when none is given.
pub const DEFAULT_DURATION_RANGE: RangeInclusive<u64> = 1..=10;

/// Replace every duration in `tasks` with a value drawn from `range`.
///
/// With `seed = None` the generator is seeded from OS entropy.
///
/// # Errors
/// Fails if `range` is empty or allows a zero duration.
pub fn randomize(tasks: &mut [TaskDef], range: RangeInclusive<u64>, seed: Option<u64>) -> Result<()> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    info!(
        task_count = tasks.len(),
        min = range.start(),
        max = range.end(),
        seed = ?seed,
        "assigning random durations"
    );
    randomize_with(tasks, range, &mut rng)
}

/// [`randomize`] with a caller-supplied generator.
pub fn randomize_with<R: Rng>(
    tasks: &mut [TaskDef],
    range: RangeInclusive<u64>,
    rng: &mut R,
) -> Result<()> {
    ensure!(
        *range.start() >= 1,
        "minimum duration must be at least 1, got {}",
        range.start()
    );
    ensure!(
        range.start() <= range.end(),
        "minimum duration {} exceeds maximum {}",
        range.start(),
        range.end()
    );

    for task in tasks.iter_mut() {
        task.duration = rng.random_range(range.clone());
        debug!(task = %task.name, duration = task.duration, "random duration");
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
