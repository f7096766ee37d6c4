//! Batch validation report: aggregates per-record results and writes the two
//! JSON artifacts (validation report + cleaned data).

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::models::{CleanedBroker, QualityTier, ValidationResult};

pub const VALIDATION_REPORT_FILE: &str = "validation-report.json";
pub const CLEANED_DATA_FILE: &str = "cleaned-brokers.json";

/// Minimum valid fraction for a run to count as an overall success.
pub const PASS_RATE: f64 = 0.80;

// ── Report shapes ────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Serialize)]
pub struct TierHistogram {
    pub excellent: usize,
    pub good: usize,
    pub acceptable: usize,
    pub poor: usize,
    pub very_poor: usize,
}

impl TierHistogram {
    fn bump(&mut self, tier: QualityTier) {
        match tier {
            QualityTier::Excellent => self.excellent += 1,
            QualityTier::Good => self.good += 1,
            QualityTier::Acceptable => self.acceptable += 1,
            QualityTier::Poor => self.poor += 1,
            QualityTier::VeryPoor => self.very_poor += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    /// Arithmetic means, unrounded until serialization.
    pub average_quality: f64,
    pub average_completeness: f64,
    pub tiers: TierHistogram,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RecordDetail {
    pub source_file: String,
    pub name: Option<String>,
    #[serde(flatten)]
    pub result: ValidationResult,
}

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub generated_at: String,
    pub summary: BatchSummary,
    pub records: Vec<RecordDetail>,
}

/// Cleaned-data artifact: the normalized records plus the same summary.
#[derive(Debug, Serialize)]
struct CleanedArtifact<'a> {
    generated_at: &'a str,
    summary: &'a BatchSummary,
    brokers: &'a [CleanedBroker],
}

// ── Aggregation ──────────────────────────────────────────────────────────────

impl BatchReport {
    pub fn build(records: &[CleanedBroker], results: &[ValidationResult]) -> Self {
        let total = results.len();
        let valid = results.iter().filter(|r| r.is_valid).count();

        let mut tiers = TierHistogram::default();
        let mut quality_sum = 0u64;
        let mut completeness_sum = 0u64;
        for r in results {
            tiers.bump(r.tier);
            quality_sum += r.quality_score as u64;
            completeness_sum += r.completeness as u64;
        }

        let average_quality = if total > 0 {
            quality_sum as f64 / total as f64
        } else {
            0.0
        };
        let average_completeness = if total > 0 {
            completeness_sum as f64 / total as f64
        } else {
            0.0
        };

        let summary = BatchSummary {
            total,
            valid,
            invalid: total - valid,
            average_quality,
            average_completeness,
            tiers,
            recommendations: recommendations(total, valid, average_quality, average_completeness),
        };

        let details = records
            .iter()
            .zip(results.iter())
            .map(|(rec, res)| RecordDetail {
                source_file: rec.source_file.clone(),
                name: rec.name.clone(),
                result: res.clone(),
            })
            .collect();

        BatchReport {
            generated_at: Utc::now().to_rfc3339(),
            summary,
            records: details,
        }
    }

    /// Valid fraction; drives the process exit code.
    pub fn validation_rate(&self) -> f64 {
        if self.summary.total == 0 {
            return 0.0;
        }
        self.summary.valid as f64 / self.summary.total as f64
    }

    pub fn passed(&self) -> bool {
        self.validation_rate() >= PASS_RATE
    }

    /// Write both artifacts. A write failure aborts the batch run.
    pub fn write_artifacts(
        &self,
        cleaned: &[CleanedBroker],
        dir: &Path,
    ) -> Result<(PathBuf, PathBuf)> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("could not create report dir {:?}", dir))?;

        let report_path = dir.join(VALIDATION_REPORT_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&report_path, json)
            .with_context(|| format!("could not write {:?}", report_path))?;

        let data_path = dir.join(CLEANED_DATA_FILE);
        let artifact = CleanedArtifact {
            generated_at: &self.generated_at,
            summary: &self.summary,
            brokers: cleaned,
        };
        let json = serde_json::to_string_pretty(&artifact)?;
        std::fs::write(&data_path, json)
            .with_context(|| format!("could not write {:?}", data_path))?;

        info!("Wrote {:?} and {:?}", report_path, data_path);
        Ok((report_path, data_path))
    }
}

fn recommendations(
    total: usize,
    valid: usize,
    average_quality: f64,
    average_completeness: f64,
) -> Vec<String> {
    let mut recs = Vec::new();

    if average_quality < 60.0 {
        recs.push(
            "average quality below acceptable — review extraction patterns".to_string(),
        );
    }
    if average_completeness < 70.0 {
        recs.push(
            "average completeness below 70% — review missing-field handling".to_string(),
        );
    }
    if total > 0 && (total - valid) as f64 / total as f64 > 0.20 {
        recs.push(
            "more than 20% of records invalid — review source page quality".to_string(),
        );
    }

    recs
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn result(quality: u8, completeness: u8, is_valid: bool) -> ValidationResult {
        ValidationResult {
            is_valid,
            errors: if is_valid { vec![] } else { vec!["name is missing".into()] },
            warnings: vec![],
            quality_score: quality,
            completeness,
            tier: QualityTier::from_score(quality),
        }
    }

    fn record(name: &str) -> CleanedBroker {
        CleanedBroker {
            source_file: format!("{name}.html"),
            name: Some(name.to_string()),
            ..CleanedBroker::default()
        }
    }

    #[test]
    fn test_average_is_arithmetic_mean() {
        let records = vec![record("a"), record("b"), record("c")];
        let results = vec![
            result(90, 80, true),
            result(75, 70, true),
            result(40, 30, true),
        ];
        let report = BatchReport::build(&records, &results);

        // (90 + 75 + 40) / 3, unrounded.
        assert!((report.summary.average_quality - 205.0 / 3.0).abs() < 1e-9);
        assert!((report.summary.average_completeness - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_tier_histogram() {
        let records = vec![record("a"), record("b"), record("c"), record("d")];
        let results = vec![
            result(95, 90, true),
            result(95, 90, true),
            result(62, 50, true),
            result(10, 5, false),
        ];
        let report = BatchReport::build(&records, &results);

        assert_eq!(report.summary.tiers.excellent, 2);
        assert_eq!(report.summary.tiers.acceptable, 1);
        assert_eq!(report.summary.tiers.very_poor, 1);
        assert_eq!(report.summary.valid, 3);
        assert_eq!(report.summary.invalid, 1);
    }

    #[test]
    fn test_recommendation_thresholds() {
        let records = vec![record("a"), record("b")];

        // Healthy batch: no recommendations.
        let results = vec![result(90, 90, true), result(80, 80, true)];
        let report = BatchReport::build(&records, &results);
        assert!(report.summary.recommendations.is_empty());

        // Low quality + low completeness + high invalid fraction: all three.
        let results = vec![result(30, 40, false), result(50, 50, true)];
        let report = BatchReport::build(&records, &results);
        assert_eq!(report.summary.recommendations.len(), 3);
    }

    #[test]
    fn test_validation_rate_gate() {
        let records: Vec<CleanedBroker> = (0..5).map(|i| record(&format!("b{i}"))).collect();

        let results: Vec<ValidationResult> = (0..5).map(|i| result(70, 70, i != 0)).collect();
        let report = BatchReport::build(&records, &results);
        assert!((report.validation_rate() - 0.8).abs() < 1e-9);
        assert!(report.passed());

        let results: Vec<ValidationResult> = (0..5).map(|i| result(70, 70, i >= 2)).collect();
        let report = BatchReport::build(&records, &results);
        assert!(!report.passed());
    }

    #[test]
    fn test_artifacts_written() {
        let dir = std::env::temp_dir().join("fxbroker-etl-report-test");
        let _ = std::fs::remove_dir_all(&dir);

        let records = vec![record("a")];
        let results = vec![result(90, 90, true)];
        let report = BatchReport::build(&records, &results);

        let (report_path, data_path) = report.write_artifacts(&records, &dir).unwrap();
        assert!(report_path.exists());
        assert!(data_path.exists());

        let body = std::fs::read_to_string(&data_path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["summary"]["total"], 1);
        assert_eq!(parsed["brokers"][0]["name"], "a");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
