//! Pipeline orchestrator: ties extraction → cleaning → scoring → reporting →
//! upserting together.
//!
//! ## Run modes
//!
//! `validate()` — offline mode: score every page in the input directory and
//!   write the two JSON artifacts. No network.
//!
//! `load()` — validate, then upsert each record into the destination store.
//!   Upserts are awaited one at a time on purpose: the throttle is a fixed
//!   inter-batch delay, not parallelism. Re-running the same input is safe
//!   because the upsert is idempotent by key.

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::clean;
use crate::config::AppConfig;
use crate::extract::Extractor;
use crate::loader::{discover_html_files, read_page, source_name};
use crate::models::{CleanedBroker, ValidationResult};
use crate::report::BatchReport;
use crate::score;
use crate::storage::{BrokerStore, side_rows, to_broker_row};

pub struct Pipeline {
    config: AppConfig,
    extractor: Extractor,
}

pub struct ValidationOutcome {
    pub report: BatchReport,
    pub cleaned: Vec<CleanedBroker>,
    pub read_errors: usize,
}

#[derive(Debug, Default)]
pub struct LoadStats {
    pub upserted: usize,
    pub failed: usize,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Result<Self> {
        Ok(Self {
            extractor: Extractor::new().context("Failed to build extractor")?,
            config,
        })
    }

    /// Extract, clean and score every page under `dir`; write both report
    /// artifacts. Unreadable files are logged and skipped.
    pub fn validate(&self, dir: &Path) -> Result<ValidationOutcome> {
        let files = discover_html_files(dir)?;
        info!("Found {} review pages in {:?}", files.len(), dir);

        let mut cleaned = Vec::new();
        let mut read_errors = 0usize;

        for path in &files {
            let html = match read_page(path) {
                Ok(h) => h,
                Err(e) => {
                    warn!("{:#}", e);
                    read_errors += 1;
                    continue;
                }
            };

            let raw = self.extractor.extract(&html, &source_name(path));
            cleaned.push(clean::clean(&raw));
        }

        let results: Vec<ValidationResult> = cleaned.iter().map(score::score).collect();
        let report = BatchReport::build(&cleaned, &results);
        report.write_artifacts(&cleaned, &self.config.report.dir)?;

        Ok(ValidationOutcome { report, cleaned, read_errors })
    }

    /// Full run: validate, then upsert every record.
    pub async fn load(&self, dir: &Path, store: &dyn BrokerStore) -> Result<(ValidationOutcome, LoadStats)> {
        let outcome = self.validate(dir)?;
        let stats = self.load_records(&outcome.cleaned, store).await;
        Ok((outcome, stats))
    }

    /// Upsert records one at a time in fixed-size batches with a fixed sleep
    /// between batches. A record failure is logged and counted; the loop
    /// always continues — there is no retry and no rollback.
    pub async fn load_records(
        &self,
        records: &[CleanedBroker],
        store: &dyn BrokerStore,
    ) -> LoadStats {
        let batch_size = self.config.loader.batch_size.max(1);
        let delay = Duration::from_millis(self.config.loader.batch_delay_ms);

        let mut stats = LoadStats::default();

        for (i, batch) in records.chunks(batch_size).enumerate() {
            if i > 0 {
                tokio::time::sleep(delay).await;
            }

            for record in batch {
                match self.load_one(record, store).await {
                    Ok(slug) => {
                        stats.upserted += 1;
                        info!("upserted {}", slug);
                    }
                    Err(e) => {
                        stats.failed += 1;
                        warn!(
                            "{}: {:#}",
                            record.name.as_deref().unwrap_or("<unnamed>"),
                            e
                        );
                    }
                }
            }
        }

        stats
    }

    async fn load_one(
        &self,
        record: &CleanedBroker,
        store: &dyn BrokerStore,
    ) -> Result<String, crate::error::PipelineError> {
        let row = to_broker_row(record, Utc::now())?;
        let slug = row.slug.clone();

        let id = store.upsert_broker(&row).await?;

        // Side tables only after the parent upsert succeeded. Each failure is
        // independent — no rollback of the parent or of sibling tables.
        let (regs, instruments, payments, channels) = side_rows(record, id);
        if let Err(e) = store.insert_regulations(&regs).await {
            warn!("{}: regulations insert failed: {:#}", slug, e);
        }
        if let Err(e) = store.insert_instruments(&instruments).await {
            warn!("{}: instruments insert failed: {:#}", slug, e);
        }
        if let Err(e) = store.insert_payment_methods(&payments).await {
            warn!("{}: payment methods insert failed: {:#}", slug, e);
        }
        if let Err(e) = store.insert_support_channels(&channels).await {
            warn!("{}: support channels insert failed: {:#}", slug, e);
        }

        Ok(slug)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
