use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Raw extracted record ──────────────────────────────────────────────────────

/// Extractor output: every field optional, values as matched on the page.
///
/// Numeric fields are already parsed and range-filtered except `max_leverage`,
/// which stays the raw matched text ("1:400") until cleaning. Vocabulary list
/// fields and availability booleans are always attempted, so they are `Some`
/// even when empty/false.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawBroker {
    pub source_file: String,
    pub name: Option<String>,
    pub website_url: Option<String>,
    pub headquarters: Option<String>,
    pub founded_year: Option<i32>,
    pub overall_rating: Option<f64>,
    pub min_deposit: Option<f64>,
    pub max_leverage: Option<String>,
    pub spread_from: Option<f64>,
    pub spread_type: Option<String>,
    pub instruments_total: Option<i64>,
    pub platforms: Option<Vec<String>>,
    pub regulatory_bodies: Option<Vec<String>>,
    pub instrument_types: Option<Vec<String>>,
    pub account_types: Option<Vec<String>>,
    pub deposit_methods: Option<Vec<String>>,
    pub support_languages: Option<Vec<String>>,
    pub pros: Option<Vec<String>>,
    pub cons: Option<Vec<String>>,
    pub cfds_available: Option<bool>,
    pub demo_account: Option<bool>,
    pub islamic_account: Option<bool>,
    pub copy_trading: Option<bool>,
}

// ── Cleaned record ────────────────────────────────────────────────────────────

/// Normalizer output. Same shape as [`RawBroker`] with values normalized:
/// title-cased name, allow-listed platforms, coerced numerics. A field whose
/// coercion fails is dropped to `None`, not zeroed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanedBroker {
    pub source_file: String,
    pub name: Option<String>,
    pub website_url: Option<String>,
    pub headquarters: Option<String>,
    pub founded_year: Option<i32>,
    pub overall_rating: Option<f64>,
    pub min_deposit: Option<f64>,
    pub max_leverage: Option<f64>,
    pub spread_from: Option<f64>,
    pub spread_type: Option<String>,
    pub instruments_total: Option<i64>,
    pub platforms: Option<Vec<String>>,
    pub regulatory_bodies: Option<Vec<String>>,
    pub instrument_types: Option<Vec<String>>,
    pub account_types: Option<Vec<String>>,
    pub deposit_methods: Option<Vec<String>>,
    pub support_languages: Option<Vec<String>>,
    pub pros: Option<Vec<String>>,
    pub cons: Option<Vec<String>>,
    pub cfds_available: Option<bool>,
    pub demo_account: Option<bool>,
    pub islamic_account: Option<bool>,
    pub copy_trading: Option<bool>,
}

// ── Validation result ─────────────────────────────────────────────────────────

/// Quality tier buckets, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityTier {
    Excellent,
    Good,
    Acceptable,
    Poor,
    VeryPoor,
}

impl QualityTier {
    pub fn from_score(score: u8) -> Self {
        match score {
            90.. => QualityTier::Excellent,
            75.. => QualityTier::Good,
            60.. => QualityTier::Acceptable,
            40.. => QualityTier::Poor,
            _ => QualityTier::VeryPoor,
        }
    }
}

/// Computed fresh per record per validation run; never stored or mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub quality_score: u8,
    pub completeness: u8,
    pub tier: QualityTier,
}

// ── Persisted destination row ─────────────────────────────────────────────────

/// Destination `brokers` table shape. `id`/`created_at` are generated by the
/// datastore; `slug` is the natural upsert key, derived from the name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerRow {
    pub slug: String,
    pub name: String,
    pub website_url: Option<String>,
    pub headquarters: Option<String>,
    pub founded_year: Option<i32>,
    pub avg_rating: Option<f64>,
    pub min_deposit: Option<f64>,
    pub max_leverage: Option<f64>,
    pub spread_from: Option<f64>,
    pub spread_type: Option<String>,
    pub instruments_total: Option<i64>,
    pub platforms: Vec<String>,
    pub account_types: Vec<String>,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub trust_score: i32,
    pub cfds_available: bool,
    pub demo_account: bool,
    pub islamic_account: bool,
    pub copy_trading: bool,
    pub is_active: bool,
    pub featured: bool,
    pub updated_at: DateTime<Utc>,
}

// ── Side-table rows ───────────────────────────────────────────────────────────

// One-to-many, insert-only, keyed by the parent broker's generated id.

#[derive(Debug, Clone, Serialize)]
pub struct RegulationRow {
    pub broker_id: i64,
    pub regulator: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstrumentRow {
    pub broker_id: i64,
    pub instrument_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentMethodRow {
    pub broker_id: i64,
    pub method: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SupportChannelRow {
    pub broker_id: i64,
    pub language: String,
}
