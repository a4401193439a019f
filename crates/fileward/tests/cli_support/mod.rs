#![allow(dead_code)]

use fileward_db::FilewardDb;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub fn fileward_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_fileward"))
}

/// A home directory, an inventory database, a source folder and a config
/// file wiring them together.
pub struct Workspace {
    pub home: TempDir,
    pub source: PathBuf,
    pub quarantine: PathBuf,
    pub db_path: PathBuf,
    pub config_path: PathBuf,
}

impl Workspace {
    pub fn new(known: &[&str], files: &[&str]) -> Self {
        let home = TempDir::new().expect("create temp home");
        let source = home.path().join("uploads");
        let quarantine = home.path().join("quarantine");
        let db_path = home.path().join("records.sqlite3");
        let config_path = home.path().join("config.toml");

        fs::create_dir_all(&source).expect("create source");
        for file in files {
            fs::write(source.join(file), file.as_bytes()).expect("write source file");
        }
        seed_inventory(&db_path, known);

        fs::write(
            &config_path,
            format!(
                "[database]\nurl = {:?}\ninventory_view = \"known_files\"\n\n[folders]\nsource = {:?}\nquarantine = {:?}\n\n[retention]\ndays = 30\n",
                format!("sqlite:{}", db_path.display()),
                source.display().to_string(),
                quarantine.display().to_string(),
            ),
        )
        .expect("write config");

        Self {
            home,
            source,
            quarantine,
            db_path,
            config_path,
        }
    }

    pub fn envs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("FILEWARD_HOME", self.home.path().to_string_lossy().to_string()),
            ("RUST_LOG", "error".to_string()),
        ]
    }

    pub fn run(&self, args: &[&str], extra_env: &[(&str, &str)]) -> Output {
        let mut cmd = Command::new(fileward_bin());
        cmd.args(args);
        cmd.env_remove("FILEWARD_CONFIG")
            .env_remove("FILEWARD_DATABASE_URL")
            .env_remove("FILEWARD_SOURCE_DIR")
            .env_remove("FILEWARD_QUARANTINE_DIR")
            .env_remove("FILEWARD_RETENTION_DAYS");
        for (key, value) in self.envs() {
            cmd.env(key, value);
        }
        for (key, value) in extra_env {
            cmd.env(key, value);
        }
        cmd.output().expect("failed to execute fileward CLI")
    }

    pub fn run_json(&self, args: &[&str], extra_env: &[(&str, &str)]) -> serde_json::Value {
        let output = self.run(args, extra_env);
        assert_cli_success(&output, args);
        parse_json(&output)
    }
}

fn seed_inventory(db_path: &Path, known: &[&str]) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("build runtime");
    rt.block_on(async {
        let db = FilewardDb::open_path(db_path).await.expect("open inventory db");
        sqlx::query("CREATE TABLE documents (id INTEGER PRIMARY KEY, file_name TEXT)")
            .execute(db.pool())
            .await
            .expect("create documents");
        sqlx::query("CREATE VIEW known_files AS SELECT file_name FROM documents")
            .execute(db.pool())
            .await
            .expect("create view");
        for name in known {
            sqlx::query("INSERT INTO documents (file_name) VALUES (?)")
                .bind(*name)
                .execute(db.pool())
                .await
                .expect("insert known file");
        }
        db.close().await;
    });
}

pub fn assert_cli_success(output: &Output, args: &[&str]) {
    assert!(
        output.status.success(),
        "command failed: {}\nstdout:\n{}\nstderr:\n{}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

pub fn parse_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json_start = stdout.find(|c: char| c == '{' || c == '[').unwrap_or_else(|| {
        panic!(
            "no JSON payload found in output\nstdout:\n{}\nstderr:\n{}",
            stdout,
            String::from_utf8_lossy(&output.stderr)
        )
    });
    let mut deserializer = serde_json::Deserializer::from_str(&stdout[json_start..]);
    serde_json::Value::deserialize(&mut deserializer).unwrap_or_else(|err| {
        panic!(
            "failed to parse JSON output: {}\nstdout:\n{}\nstderr:\n{}",
            err,
            stdout,
            String::from_utf8_lossy(&output.stderr)
        )
    })
}
