//! Pass orchestration: reconcile, then sweep.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, Instrument};

use crate::cancel::CancelToken;
use crate::config::{CleanerConfig, Folders};
use crate::error::{CleanerError, Result};
use crate::lister::list_local;
use crate::names::FileName;
use crate::reconcile::{MovedFile, Reconciler};
use crate::storage::{InventorySource, QuarantineRecord, QuarantineStore};
use crate::sweep::{PurgedFile, RetentionSweeper};

/// Which halves of a pass to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Steps {
    All,
    Reconcile,
    Sweep,
}

impl Steps {
    fn reconciles(self) -> bool {
        matches!(self, Steps::All | Steps::Reconcile)
    }

    fn sweeps(self) -> bool {
        matches!(self, Steps::All | Steps::Sweep)
    }
}

/// Everything a pass needs, built once per invocation.
pub struct PassContext {
    inventory: Arc<dyn InventorySource>,
    store: Arc<dyn QuarantineStore>,
    folders: Folders,
    retention_days: u32,
    cancel: CancelToken,
}

/// Counts and details of a completed pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassReport {
    pub steps: Steps,
    pub started_at: DateTime<Utc>,
    pub known: usize,
    pub local: usize,
    pub moved: usize,
    pub purged: usize,
    pub moved_files: Vec<MovedFile>,
    pub purged_files: Vec<PurgedFile>,
    pub duration_ms: u64,
}

/// What a pass would do, computed without mutating anything.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassPlan {
    pub steps: Steps,
    pub known: usize,
    pub local: usize,
    pub retention_days: u32,
    pub to_quarantine: Vec<FileName>,
    pub to_purge: Vec<QuarantineRecord>,
}

impl PassContext {
    pub fn new(
        inventory: Arc<dyn InventorySource>,
        store: Arc<dyn QuarantineStore>,
        folders: Folders,
        retention_days: u32,
    ) -> Self {
        Self {
            inventory,
            store,
            folders,
            retention_days,
            cancel: CancelToken::new(),
        }
    }

    /// Build from resolved configuration.
    pub fn from_config(
        config: &CleanerConfig,
        inventory: Arc<dyn InventorySource>,
        store: Arc<dyn QuarantineStore>,
    ) -> Self {
        Self::new(
            inventory,
            store,
            config.folders.clone(),
            config.retention_days,
        )
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn folders(&self) -> &Folders {
        &self.folders
    }

    pub fn retention_days(&self) -> u32 {
        self.retention_days
    }

    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(self.folders.clone(), Arc::clone(&self.store))
            .with_cancel(self.cancel.clone())
    }

    pub fn sweeper(&self) -> RetentionSweeper {
        RetentionSweeper::new(self.folders.quarantine.clone(), Arc::clone(&self.store))
            .with_cancel(self.cancel.clone())
    }

    /// Run the selected steps. A reconcile failure stops the pass before the
    /// sweep.
    pub async fn run(&self, steps: Steps, now: DateTime<Utc>) -> Result<PassReport> {
        let span = info_span!("pass", steps = ?steps);
        self.run_inner(steps, now).instrument(span).await
    }

    async fn run_inner(&self, steps: Steps, now: DateTime<Utc>) -> Result<PassReport> {
        let start = Instant::now();
        let mut report = PassReport {
            steps,
            started_at: now,
            known: 0,
            local: 0,
            moved: 0,
            purged: 0,
            moved_files: Vec::new(),
            purged_files: Vec::new(),
            duration_ms: 0,
        };

        info!(
            source = %self.folders.source.display(),
            quarantine = %self.folders.quarantine.display(),
            retention_days = self.retention_days,
            "Pass started"
        );

        if steps.reconciles() {
            let known = self.inventory.list_known().await?;
            let local = list_local(&self.folders.source)?;
            report.known = known.len();
            report.local = local.len();

            let reconciled = self.reconciler().reconcile(&known, &local).await?;
            report.moved = reconciled.count();
            report.moved_files = reconciled.moved;
        }

        if steps.sweeps() {
            let swept = self.sweeper().sweep(now, self.retention_days).await?;
            report.purged = swept.count();
            report.purged_files = swept.purged;
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            known = report.known,
            local = report.local,
            moved = report.moved,
            purged = report.purged,
            duration_ms = report.duration_ms,
            "Pass finished"
        );
        Ok(report)
    }

    /// Compute what [`PassContext::run`] would do. Reads only.
    pub async fn plan(&self, steps: Steps, now: DateTime<Utc>) -> Result<PassPlan> {
        let mut plan = PassPlan {
            steps,
            known: 0,
            local: 0,
            retention_days: self.retention_days,
            to_quarantine: Vec::new(),
            to_purge: Vec::new(),
        };

        if steps.reconciles() {
            let known = self.inventory.list_known().await?;
            let local = list_local(&self.folders.source)?;
            plan.known = known.len();
            plan.local = local.len();
            plan.to_quarantine = Reconciler::plan(&known, &local);
        }

        if steps.sweeps() {
            plan.to_purge = self
                .store
                .list_older_than(self.retention_days, now)
                .await
                .map_err(|source| CleanerError::QueryFailed { source })?;
        }

        Ok(plan)
    }

    /// Every quarantine record, for status reporting.
    pub async fn records(&self) -> Result<Vec<QuarantineRecord>> {
        self.store
            .list_all()
            .await
            .map_err(|source| CleanerError::Store { source })
    }
}

/// One full pass: reconcile followed by a retention sweep.
pub async fn run_pass(ctx: &PassContext, now: DateTime<Utc>) -> Result<PassReport> {
    ctx.run(Steps::All, now).await
}
