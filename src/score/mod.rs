//! Quality scorer: rule-driven, per-field, additively weighted.
//!
//! The weight table and range thresholds are inherited policy — preserved
//! exactly for output compatibility, not derived from anything.

use url::Url;

use crate::clean::PLATFORM_ALLOW_LIST;
use crate::models::{CleanedBroker, QualityTier, ValidationResult};

// ── Policy constants ─────────────────────────────────────────────────────────

pub const WEIGHT_NAME: u32 = 20;
pub const WEIGHT_REGULATION: u32 = 10;
pub const WEIGHT_RATING: u32 = 10;
pub const WEIGHT_MIN_DEPOSIT: u32 = 8;
pub const WEIGHT_MAX_LEVERAGE: u32 = 8;
pub const WEIGHT_PLATFORMS: u32 = 8;
pub const POINTS_PER_PLATFORM: u32 = 2;
pub const WEIGHT_SPREAD: u32 = 6;
pub const WEIGHT_WEBSITE: u32 = 5;
pub const WEIGHT_PROS: u32 = 5;
pub const WEIGHT_CONS: u32 = 5;

/// Sum of all weights. The denominator is fixed regardless of which fields a
/// record actually carries.
pub const MAX_POSSIBLE_POINTS: u32 = WEIGHT_NAME
    + WEIGHT_REGULATION
    + WEIGHT_RATING
    + WEIGHT_MIN_DEPOSIT
    + WEIGHT_MAX_LEVERAGE
    + WEIGHT_PLATFORMS
    + WEIGHT_SPREAD
    + WEIGHT_WEBSITE
    + WEIGHT_PROS
    + WEIGHT_CONS;

pub const RATING_VALID: (f64, f64) = (1.0, 5.0);
pub const DEPOSIT_VALID: (f64, f64) = (0.0, 100_000.0);
pub const LEVERAGE_VALID: (f64, f64) = (1.0, 3000.0);
pub const SPREAD_VALID: (f64, f64) = (0.0, 10.0);

pub const MIN_NAME_LEN: usize = 2;

// ── Scoring ──────────────────────────────────────────────────────────────────

/// Score one cleaned record. A missing/short name makes the record invalid
/// but scoring still runs — low validity never short-circuits the rubric.
pub fn score(record: &CleanedBroker) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut earned = 0u32;

    // name — the only required field
    match record.name.as_deref() {
        None => errors.push("name is missing".to_string()),
        Some(n) if n.len() < MIN_NAME_LEN => {
            errors.push(format!("name '{n}' is too short"));
        }
        Some(n) => {
            if name_pattern_ok(n) {
                earned += WEIGHT_NAME;
            } else {
                errors.push(format!("name '{n}' contains disallowed characters"));
            }
        }
    }

    if record.regulatory_bodies.as_deref().is_some_and(|v| !v.is_empty()) {
        earned += WEIGHT_REGULATION;
    }

    earned += numeric_points(
        record.overall_rating,
        RATING_VALID,
        WEIGHT_RATING,
        "overall_rating",
        &mut warnings,
    );
    earned += numeric_points(
        record.min_deposit,
        DEPOSIT_VALID,
        WEIGHT_MIN_DEPOSIT,
        "min_deposit",
        &mut warnings,
    );
    earned += numeric_points(
        record.max_leverage,
        LEVERAGE_VALID,
        WEIGHT_MAX_LEVERAGE,
        "max_leverage",
        &mut warnings,
    );
    earned += numeric_points(
        record.spread_from,
        SPREAD_VALID,
        WEIGHT_SPREAD,
        "spread_from",
        &mut warnings,
    );

    if let Some(platforms) = record.platforms.as_deref() {
        let mut recognized = 0u32;
        for p in platforms {
            if PLATFORM_ALLOW_LIST.contains(&p.as_str()) {
                recognized += 1;
            } else {
                warnings.push(format!("unrecognized platform token '{p}'"));
            }
        }
        earned += (recognized * POINTS_PER_PLATFORM).min(WEIGHT_PLATFORMS);
    }

    if let Some(u) = record.website_url.as_deref() {
        if website_ok(u) {
            earned += WEIGHT_WEBSITE;
        } else {
            warnings.push(format!("website_url '{u}' is not a valid http(s) url"));
        }
    }

    if record.pros.as_deref().is_some_and(|v| !v.is_empty()) {
        earned += WEIGHT_PROS;
    }
    if record.cons.as_deref().is_some_and(|v| !v.is_empty()) {
        earned += WEIGHT_CONS;
    }

    let quality_score =
        ((100.0 * earned as f64 / MAX_POSSIBLE_POINTS as f64).round()) as u8;
    let completeness = completeness(record);

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
        warnings,
        quality_score,
        completeness,
        tier: QualityTier::from_score(quality_score),
    }
}

fn numeric_points(
    value: Option<f64>,
    valid: (f64, f64),
    weight: u32,
    field: &str,
    warnings: &mut Vec<String>,
) -> u32 {
    match value {
        None => 0,
        Some(v) if (valid.0..=valid.1).contains(&v) => weight,
        Some(v) => {
            warnings.push(format!("{field} {v} outside [{}, {}]", valid.0, valid.1));
            0
        }
    }
}

fn name_pattern_ok(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| {
            c.is_ascii_alphanumeric() || c.is_whitespace() || matches!(c, '-' | '.' | '&')
        })
}

fn website_ok(u: &str) -> bool {
    matches!(Url::parse(u), Ok(parsed) if matches!(parsed.scheme(), "http" | "https"))
}

// ── Completeness ──────────────────────────────────────────────────────────────

/// Percentage of *attempted* fields (carried at all by the record) that are
/// non-empty. This measures extraction yield, not coverage of the full schema.
fn completeness(record: &CleanedBroker) -> u8 {
    let mut attempted = 0u32;
    let mut present = 0u32;

    let mut tally = |att: bool, pres: bool| {
        if att {
            attempted += 1;
            if pres {
                present += 1;
            }
        }
    };

    let text = |f: &Option<String>| (f.is_some(), f.as_deref().is_some_and(|s| !s.is_empty()));
    let list =
        |f: &Option<Vec<String>>| (f.is_some(), f.as_deref().is_some_and(|v| !v.is_empty()));

    let (a, p) = text(&record.name);
    tally(a, p);
    let (a, p) = text(&record.website_url);
    tally(a, p);
    let (a, p) = text(&record.headquarters);
    tally(a, p);
    let (a, p) = text(&record.spread_type);
    tally(a, p);

    tally(record.founded_year.is_some(), record.founded_year.is_some());
    tally(record.overall_rating.is_some(), record.overall_rating.is_some());
    tally(record.min_deposit.is_some(), record.min_deposit.is_some());
    tally(record.max_leverage.is_some(), record.max_leverage.is_some());
    tally(record.spread_from.is_some(), record.spread_from.is_some());
    tally(record.instruments_total.is_some(), record.instruments_total.is_some());

    let (a, p) = list(&record.platforms);
    tally(a, p);
    let (a, p) = list(&record.regulatory_bodies);
    tally(a, p);
    let (a, p) = list(&record.instrument_types);
    tally(a, p);
    let (a, p) = list(&record.account_types);
    tally(a, p);
    let (a, p) = list(&record.deposit_methods);
    tally(a, p);
    let (a, p) = list(&record.support_languages);
    tally(a, p);
    let (a, p) = list(&record.pros);
    tally(a, p);
    let (a, p) = list(&record.cons);
    tally(a, p);

    // A boolean is a value either way once attempted.
    tally(record.cfds_available.is_some(), record.cfds_available.is_some());
    tally(record.demo_account.is_some(), record.demo_account.is_some());
    tally(record.islamic_account.is_some(), record.islamic_account.is_some());
    tally(record.copy_trading.is_some(), record.copy_trading.is_some());

    if attempted == 0 {
        return 0;
    }
    ((100.0 * present as f64 / attempted as f64).round()) as u8
}

// ── Tests ─────────────────────────────────────────────────────────────────────
