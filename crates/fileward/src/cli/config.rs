//! `config` command: show the resolved configuration.
//!
//! The database URL is printed with credentials masked.

use anyhow::{Context, Result};
use fileward::config::default_config_path;
use fileward::CleanerConfig;
use fileward_db::redact_url;
use fileward_logging::{fileward_home, logs_dir};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct ConfigArgs {
    pub json: bool,
}

pub fn run(args: ConfigArgs, config_path: Option<&Path>) -> Result<()> {
    let path: PathBuf = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(default_config_path);
    let config = CleanerConfig::load(config_path).context("Failed to load configuration")?;
    let lock_path = fileward::lock::lock_path_for(&config.folders.quarantine);

    if args.json {
        let value = serde_json::json!({
            "home": fileward_home().to_string_lossy(),
            "config_file": {
                "path": path.to_string_lossy(),
                "exists": path.exists(),
            },
            "logs": logs_dir().to_string_lossy(),
            "database": {
                "url": redact_url(&config.database_url),
                "inventory_view": config.inventory_view.to_string(),
                "inventory_column": config.inventory_column.to_string(),
                "quarantine_table": config.quarantine_table.to_string(),
            },
            "folders": {
                "source": config.folders.source.to_string_lossy(),
                "source_exists": config.folders.source.is_dir(),
                "quarantine": config.folders.quarantine.to_string_lossy(),
                "quarantine_exists": config.folders.quarantine.is_dir(),
            },
            "retention_days": config.retention_days,
            "lock_file": lock_path.to_string_lossy(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("FILEWARD CONFIGURATION");
    println!("======================");
    println!();
    println!(
        "Config file: {} ({})",
        path.display(),
        if path.exists() { "exists" } else { "not found, using environment" }
    );
    println!("Logs:        {}", logs_dir().display());
    println!();
    println!("Database:    {}", redact_url(&config.database_url));
    println!(
        "  Inventory: {}.{}",
        config.inventory_view, config.inventory_column
    );
    println!("  Quarantine table: {}", config.quarantine_table);
    println!();
    println!("Source:      {}{}", config.folders.source.display(), missing_marker(&config.folders.source));
    println!(
        "Quarantine:  {}{}",
        config.folders.quarantine.display(),
        missing_marker(&config.folders.quarantine)
    );
    println!("Lock file:   {}", lock_path.display());
    println!();
    println!("Retention:   {} days", config.retention_days);

    Ok(())
}

fn missing_marker(path: &Path) -> &'static str {
    if path.is_dir() {
        ""
    } else {
        " (not found)"
    }
}
