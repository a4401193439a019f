//! `status` command: read-only view of quarantine.
//!
//! Reports each record with its age and whether its file is still present,
//! plus files sitting in the quarantine directory with no record. Nothing is
//! repaired.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use fileward::{list_local, CancelToken, CleanerConfig, FileName};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

use super::context::{open_context, runtime};
use super::output::{age_days, format_age, format_timestamp, plural, print_json, print_table};

#[derive(Debug)]
pub struct StatusArgs {
    pub json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordStatus {
    id: i64,
    file_name: String,
    quarantined_at: DateTime<Utc>,
    age_days: i64,
    /// `None` when the stored name is not a valid file name.
    file_present: Option<bool>,
    due: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport {
    quarantine_dir: String,
    retention_days: u32,
    records: Vec<RecordStatus>,
    /// Files in the quarantine directory without a record.
    unrecorded_files: Vec<String>,
}

pub fn run(args: StatusArgs, config_path: Option<&Path>) -> Result<()> {
    let config = CleanerConfig::load(config_path).context("Failed to load configuration")?;
    let rt = runtime()?;

    let report = rt.block_on(async {
        let ctx = open_context(&config, CancelToken::new()).await?;
        let records = ctx.records().await?;
        Ok::<_, anyhow::Error>(build_report(&config, records, Utc::now())?)
    })?;

    if args.json {
        return print_json(&report);
    }

    println!(
        "Quarantine: {} (retention {} days)",
        report.quarantine_dir, report.retention_days
    );
    if report.records.is_empty() {
        println!("No quarantine records.");
    } else {
        let rows = report
            .records
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.file_name.clone(),
                    format_timestamp(r.quarantined_at),
                    format_age(r.age_days),
                    match r.file_present {
                        Some(true) => "yes",
                        Some(false) => "no",
                        None => "invalid name",
                    }
                    .to_string(),
                    if r.due { "yes" } else { "" }.to_string(),
                ]
            })
            .collect();
        print_table(&["ID", "FILE", "QUARANTINED", "AGE", "PRESENT", "DUE"], rows);
    }

    if !report.unrecorded_files.is_empty() {
        println!();
        println!(
            "{} in quarantine without a record:",
            plural(report.unrecorded_files.len(), "file")
        );
        for name in &report.unrecorded_files {
            println!("  {}", name);
        }
    }
    Ok(())
}

fn build_report(
    config: &CleanerConfig,
    records: Vec<fileward::storage::QuarantineRecord>,
    now: DateTime<Utc>,
) -> Result<StatusReport> {
    let quarantine = &config.folders.quarantine;
    let cutoff = fileward::storage::retention_cutoff(now, config.retention_days);

    let on_disk = if quarantine.is_dir() {
        list_local(quarantine)?
    } else {
        Default::default()
    };

    let mut recorded = HashSet::new();
    let records = records
        .into_iter()
        .map(|record| {
            let file_present = FileName::parse(record.file_name.as_str()).ok().map(|name| {
                let present = on_disk.contains(&name);
                recorded.insert(name.key().to_string());
                present
            });
            RecordStatus {
                id: record.id.get(),
                age_days: age_days(record.quarantined_at, now),
                due: record.quarantined_at <= cutoff,
                file_name: record.file_name,
                quarantined_at: record.quarantined_at,
                file_present,
            }
        })
        .collect();

    let unrecorded_files = on_disk
        .iter()
        .filter(|name| !recorded.contains(name.key()))
        .map(|name| name.to_string())
        .collect();

    Ok(StatusReport {
        quarantine_dir: quarantine.display().to_string(),
        retention_days: config.retention_days,
        records,
        unrecorded_files,
    })
}
