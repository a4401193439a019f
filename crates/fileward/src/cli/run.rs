//! `run`, `reconcile` and `sweep` commands.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use fileward::{try_lock_pass, CancelToken, CleanerConfig, PassPlan, PassReport, Steps};
use std::path::Path;
use tracing::info;

use super::context::{cancel_on_interrupt, open_context, runtime};
use super::output::{format_timestamp, plural, print_json, print_table};

#[derive(Debug, Clone, Default, Args)]
pub struct PassArgs {
    /// Show what would be moved and purged without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

fn command_name(steps: Steps) -> &'static str {
    match steps {
        Steps::All => "run",
        Steps::Reconcile => "reconcile",
        Steps::Sweep => "sweep",
    }
}

pub fn run(steps: Steps, args: PassArgs, config_path: Option<&Path>) -> Result<()> {
    let config = CleanerConfig::load(config_path).context("Failed to load configuration")?;
    let rt = runtime()?;

    rt.block_on(async {
        let cancel = CancelToken::new();
        let ctx = open_context(&config, cancel.clone()).await?;
        let now = Utc::now();

        if args.dry_run {
            let plan = ctx.plan(steps, now).await?;
            return print_plan(&plan, args.json);
        }

        let _lock = try_lock_pass(&config.folders.quarantine, command_name(steps))?;
        cancel_on_interrupt(&cancel);

        let report = ctx
            .run(steps, now)
            .await
            .with_context(|| format!("{} failed", command_name(steps)))?;
        info!(moved = report.moved, purged = report.purged, "Command complete");
        print_report(&report, args.json)
    })
}

fn print_report(report: &PassReport, json: bool) -> Result<()> {
    if json {
        return print_json(report);
    }

    if matches!(report.steps, Steps::All | Steps::Reconcile) {
        println!(
            "Reconciled: {} known, {} local, {} quarantined",
            report.known,
            report.local,
            plural(report.moved, "file"),
        );
        if !report.moved_files.is_empty() {
            let rows = report
                .moved_files
                .iter()
                .map(|file| {
                    vec![
                        file.id.to_string(),
                        file.name.to_string(),
                        format_timestamp(file.quarantined_at),
                    ]
                })
                .collect();
            print_table(&["ID", "FILE", "QUARANTINED"], rows);
        }
    }

    if matches!(report.steps, Steps::All | Steps::Sweep) {
        println!("Purged: {}", plural(report.purged, "file"));
        if !report.purged_files.is_empty() {
            let rows = report
                .purged_files
                .iter()
                .map(|file| {
                    vec![
                        file.id.to_string(),
                        file.name.clone(),
                        format_timestamp(file.quarantined_at),
                        if file.file_was_present { "deleted" } else { "already gone" }.to_string(),
                    ]
                })
                .collect();
            print_table(&["ID", "FILE", "QUARANTINED", "FILE STATE"], rows);
        }
    }

    println!("Done in {} ms", report.duration_ms);
    Ok(())
}

fn print_plan(plan: &PassPlan, json: bool) -> Result<()> {
    if json {
        return print_json(plan);
    }

    println!("DRY RUN: nothing will be changed");
    if matches!(plan.steps, Steps::All | Steps::Reconcile) {
        println!(
            "Would quarantine {} ({} known, {} local)",
            plural(plan.to_quarantine.len(), "file"),
            plan.known,
            plan.local
        );
        for name in &plan.to_quarantine {
            println!("  {}", name);
        }
    }
    if matches!(plan.steps, Steps::All | Steps::Sweep) {
        println!(
            "Would purge {} older than {} days",
            plural(plan.to_purge.len(), "file"),
            plan.retention_days
        );
        for record in &plan.to_purge {
            println!(
                "  [{}] {} (quarantined {})",
                record.id,
                record.file_name,
                format_timestamp(record.quarantined_at)
            );
        }
    }
    Ok(())
}
