/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, NaiveDateTime};
use clap::Parser;
use tracing::{error, info, warn};

use jobshop::config::{MachineConfigManager, TaskConfigManager};
use jobshop::durations;
use jobshop::export;
use jobshop::scheduler::{Scheduler, SchedulerConfig};
use jobshop::task::{Schedule, DEFAULT_TASK_CORES};

// ── CLI argument definition ───────────────────────────────────────────────────

/// Critical-path list scheduler for multi-core machines.
///
/// Example:
///   jobshop --tasks demos/tasks.yaml --machines demos/machines.yaml \
///           --gantt-csv gantt.csv
#[derive(Debug, Parser)]
#[command(
    name = "jobshop",
    about = "Critical-path list scheduler for multi-core machines",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML task file (`jobs:` → tasks).
    #[arg(short = 't', long = "tasks")]
    tasks: PathBuf,

    /// Path to the YAML machine file (`machines:`).
    #[arg(short = 'm', long = "machines")]
    machines: PathBuf,

    /// Ignore file durations and draw each one at random.
    #[arg(short = 'r', long = "random-durations", default_value_t = false)]
    random_durations: bool,

    /// Seed for --random-durations; OS entropy when omitted.
    #[arg(long = "seed")]
    seed: Option<u64>,

    /// Smallest random duration.
    #[arg(long = "min-duration", default_value_t = *durations::DEFAULT_DURATION_RANGE.start())]
    min_duration: u64,

    /// Largest random duration.
    #[arg(long = "max-duration", default_value_t = *durations::DEFAULT_DURATION_RANGE.end())]
    max_duration: u64,

    /// Cores for tasks that do not set `cores`.
    #[arg(long = "default-cores", default_value_t = DEFAULT_TASK_CORES)]
    default_cores: u32,

    /// Write a Gantt chart CSV to this path.
    #[arg(long = "gantt-csv")]
    gantt_csv: Option<PathBuf>,

    /// Wall-clock time of t=0 in the Gantt CSV (RFC 3339); defaults to now.
    #[arg(long = "gantt-start", value_parser = parse_gantt_start)]
    gantt_start: Option<NaiveDateTime>,

    /// Write the schedule as YAML to this path.
    #[arg(long = "report")]
    report: Option<PathBuf>,

    /// Skip the post-schedule audit.
    #[arg(long = "no-verify", default_value_t = false)]
    no_verify: bool,
}

fn parse_gantt_start(value: &str) -> Result<NaiveDateTime, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.naive_local())
        .map_err(|e| format!("expected an RFC 3339 timestamp: {e}"))
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialise structured logging.
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!(
        tasks            = %cli.tasks.display(),
        machines         = %cli.machines.display(),
        random_durations = cli.random_durations,
        seed             = ?cli.seed,
        default_cores    = cli.default_cores,
        "Configuration"
    );

    if let Err(e) = run(&cli) {
        error!("{:#}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    // ── Load inputs ───────────────────────────────────────────────────────────
    let mut task_config = TaskConfigManager::new().with_default_cores(cli.default_cores);
    task_config.load_from_file(&cli.tasks)?;

    let mut machine_config = MachineConfigManager::new();
    machine_config.load_from_file(&cli.machines)?;

    // ── Durations ─────────────────────────────────────────────────────────────
    if !cli.random_durations && !task_config.missing_durations().is_empty() {
        bail!(
            "tasks without a duration: {} (set one or pass --random-durations)",
            task_config.missing_durations().join(", ")
        );
    }

    let mut tasks = task_config.take_task_defs();
    if cli.random_durations {
        durations::randomize(&mut tasks, cli.min_duration..=cli.max_duration, cli.seed)
            .context("Cannot assign random durations")?;
    }

    // ── Schedule ──────────────────────────────────────────────────────────────
    let scheduler = Scheduler::new(SchedulerConfig {
        verify: !cli.no_verify,
    });
    let schedule = scheduler
        .schedule(tasks, machine_config.machine_defs())
        .context("Scheduling failed")?;

    log_schedule(&schedule);

    // ── Outputs ───────────────────────────────────────────────────────────────
    if let Some(path) = &cli.gantt_csv {
        let anchor = cli.gantt_start.unwrap_or_else(|| Local::now().naive_local());
        export::write_gantt_csv(path, &schedule, anchor)?;
    }
    if let Some(path) = &cli.report {
        export::write_report(path, &schedule)?;
    }
    if cli.gantt_csv.is_none() && cli.report.is_none() {
        warn!("No output file requested, schedule was only logged");
    }

    Ok(())
}

fn log_schedule(schedule: &Schedule) {
    info!("Schedule ({} task(s)):", schedule.len());
    for (machine, entries) in schedule.by_machine() {
        info!("  [{machine}]");
        for entry in entries {
            info!(
                "    {task:<24} {start:>6} → {finish:<6} cores={cores}",
                task = entry.task,
                start = entry.start,
                finish = entry.finish,
                cores = entry.cores,
            );
        }
    }
    info!("Makespan: {}", schedule.makespan);
}
