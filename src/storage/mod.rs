//! Destination datastore client: Supabase PostgREST tables.
//!
//! One `brokers` parent table upserted by natural key, plus insert-only side
//! tables keyed by the parent's generated id. Each call is an independent
//! request — there is no transaction across records or across side tables.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::clean::slugify;
use crate::config::{SupabaseConfig, UpsertKey};
use crate::error::PipelineError;
use crate::models::{
    BrokerRow, CleanedBroker, InstrumentRow, PaymentMethodRow, RegulationRow, SupportChannelRow,
};

pub const BROKERS_TABLE: &str = "brokers";
pub const REGULATIONS_TABLE: &str = "broker_regulations";
pub const INSTRUMENTS_TABLE: &str = "broker_instruments";
pub const PAYMENT_METHODS_TABLE: &str = "broker_payment_methods";
pub const SUPPORT_CHANNELS_TABLE: &str = "broker_support_channels";

// Fixed literals for destination columns the record cannot supply.
pub const DEFAULT_TRUST_SCORE: i32 = 75;
pub const DEFAULT_DEMO_ACCOUNT: bool = true;

// ── Row mapping ──────────────────────────────────────────────────────────────

/// Map a cleaned record onto the destination schema: rename
/// `overall_rating → avg_rating`, derive the slug, fill fixed defaults.
pub fn to_broker_row(
    record: &CleanedBroker,
    now: DateTime<Utc>,
) -> Result<BrokerRow, PipelineError> {
    let name = record.name.clone().ok_or(PipelineError::Unnamed)?;
    let slug = slugify(&name);
    if slug.is_empty() {
        return Err(PipelineError::Unnamed);
    }

    Ok(BrokerRow {
        slug,
        name,
        website_url: record.website_url.clone(),
        headquarters: record.headquarters.clone(),
        founded_year: record.founded_year,
        avg_rating: record.overall_rating,
        min_deposit: record.min_deposit,
        max_leverage: record.max_leverage,
        spread_from: record.spread_from,
        spread_type: record.spread_type.clone(),
        instruments_total: record.instruments_total,
        platforms: record.platforms.clone().unwrap_or_default(),
        account_types: record.account_types.clone().unwrap_or_default(),
        pros: record.pros.clone().unwrap_or_default(),
        cons: record.cons.clone().unwrap_or_default(),
        trust_score: DEFAULT_TRUST_SCORE,
        cfds_available: record.cfds_available.unwrap_or(false),
        demo_account: record.demo_account.unwrap_or(DEFAULT_DEMO_ACCOUNT),
        islamic_account: record.islamic_account.unwrap_or(false),
        copy_trading: record.copy_trading.unwrap_or(false),
        is_active: true,
        featured: false,
        updated_at: now,
    })
}

/// Side rows for a record, keyed by the parent's generated id.
pub fn side_rows(
    record: &CleanedBroker,
    broker_id: i64,
) -> (
    Vec<RegulationRow>,
    Vec<InstrumentRow>,
    Vec<PaymentMethodRow>,
    Vec<SupportChannelRow>,
) {
    let regs = record
        .regulatory_bodies
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|r| RegulationRow { broker_id, regulator: r.clone() })
        .collect();

    let instruments = record
        .instrument_types
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|i| InstrumentRow { broker_id, instrument_type: i.clone() })
        .collect();

    let payments = record
        .deposit_methods
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|m| PaymentMethodRow { broker_id, method: m.clone() })
        .collect();

    let channels = record
        .support_languages
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|l| SupportChannelRow { broker_id, language: l.clone() })
        .collect();

    (regs, instruments, payments, channels)
}

// ── Store trait ──────────────────────────────────────────────────────────────

/// Swappable destination abstraction.
#[async_trait]
pub trait BrokerStore: Send + Sync {
    /// Insert-or-update by natural key; returns the row's generated id.
    async fn upsert_broker(&self, row: &BrokerRow) -> Result<i64, PipelineError>;

    async fn insert_regulations(&self, rows: &[RegulationRow]) -> Result<(), PipelineError>;
    async fn insert_instruments(&self, rows: &[InstrumentRow]) -> Result<(), PipelineError>;
    async fn insert_payment_methods(&self, rows: &[PaymentMethodRow])
    -> Result<(), PipelineError>;
    async fn insert_support_channels(&self, rows: &[SupportChannelRow])
    -> Result<(), PipelineError>;
}

// ── Supabase implementation ──────────────────────────────────────────────────

pub struct SupabaseStore {
    client: reqwest::Client,
    base_url: String,
    upsert_key: UpsertKey,
}

impl SupabaseStore {
    pub fn new(config: &SupabaseConfig, upsert_key: UpsertKey) -> Result<Self> {
        config.ensure_credentials()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(&config.service_key).context("invalid service key")?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.service_key))
                .context("invalid service key")?,
        );

        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: format!("{}/rest/v1", config.url.trim_end_matches('/')),
            upsert_key,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    async fn post_rows(
        &self,
        table: &str,
        query: &[(&str, &str)],
        prefer: &str,
        body: &Value,
    ) -> Result<Value, PipelineError> {
        debug!("POST {} ({})", table, prefer);

        let resp = self
            .client
            .post(self.table_url(table))
            .query(query)
            .header("Prefer", prefer)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PipelineError::Api { status: status.as_u16(), body });
        }

        if prefer.contains("return=representation") {
            Ok(resp.json().await?)
        } else {
            Ok(Value::Null)
        }
    }

    async fn insert_minimal<T: serde::Serialize>(
        &self,
        table: &str,
        rows: &[T],
    ) -> Result<(), PipelineError> {
        if rows.is_empty() {
            return Ok(());
        }
        let body = serde_json::to_value(rows)?;
        self.post_rows(table, &[], "return=minimal", &body).await?;
        Ok(())
    }
}

#[async_trait]
impl BrokerStore for SupabaseStore {
    async fn upsert_broker(&self, row: &BrokerRow) -> Result<i64, PipelineError> {
        let body = Value::Array(vec![serde_json::to_value(row)?]);
        let returned = self
            .post_rows(
                BROKERS_TABLE,
                &[("on_conflict", self.upsert_key.column())],
                "resolution=merge-duplicates,return=representation",
                &body,
            )
            .await?;

        returned
            .get(0)
            .and_then(|r| r.get("id"))
            .and_then(Value::as_i64)
            .ok_or(PipelineError::MissingId)
    }

    async fn insert_regulations(&self, rows: &[RegulationRow]) -> Result<(), PipelineError> {
        self.insert_minimal(REGULATIONS_TABLE, rows).await
    }

    async fn insert_instruments(&self, rows: &[InstrumentRow]) -> Result<(), PipelineError> {
        self.insert_minimal(INSTRUMENTS_TABLE, rows).await
    }

    async fn insert_payment_methods(
        &self,
        rows: &[PaymentMethodRow],
    ) -> Result<(), PipelineError> {
        self.insert_minimal(PAYMENT_METHODS_TABLE, rows).await
    }

    async fn insert_support_channels(
        &self,
        rows: &[SupportChannelRow],
    ) -> Result<(), PipelineError> {
        self.insert_minimal(SUPPORT_CHANNELS_TABLE, rows).await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn cleaned() -> CleanedBroker {
        CleanedBroker {
            source_file: "ig-group.html".into(),
            name: Some("IG Group".into()),
            overall_rating: Some(4.5),
            min_deposit: Some(250.0),
            regulatory_bodies: Some(vec!["FCA".into(), "ASIC".into()]),
            deposit_methods: Some(vec!["paypal".into()]),
            support_languages: Some(vec!["english".into()]),
            ..CleanedBroker::default()
        }
    }

    #[test]
    fn test_row_mapping_renames_and_defaults() {
        let now = Utc::now();
        let row = to_broker_row(&cleaned(), now).unwrap();

        assert_eq!(row.slug, "ig-group");
        assert_eq!(row.name, "IG Group");
        assert_eq!(row.avg_rating, Some(4.5));
        assert_eq!(row.trust_score, DEFAULT_TRUST_SCORE);
        assert!(row.demo_account);
        assert!(row.is_active);
        assert!(!row.featured);

        // The wire payload uses the destination column name.
        let json = serde_json::to_value(&row).unwrap();
        assert!(json.get("avg_rating").is_some());
        assert!(json.get("overall_rating").is_none());
    }

    #[test]
    fn test_row_mapping_is_deterministic() {
        let now = Utc::now();
        let a = to_broker_row(&cleaned(), now).unwrap();
        let b = to_broker_row(&cleaned(), now).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unnamed_record_rejected() {
        let now = Utc::now();
        let record = CleanedBroker::default();
        assert!(matches!(
            to_broker_row(&record, now),
            Err(PipelineError::Unnamed)
        ));

        let record = CleanedBroker {
            name: Some("!!!".into()),
            ..CleanedBroker::default()
        };
        assert!(matches!(
            to_broker_row(&record, now),
            Err(PipelineError::Unnamed)
        ));
    }

    #[test]
    fn test_side_rows_keyed_by_parent() {
        let (regs, instruments, payments, channels) = side_rows(&cleaned(), 42);
        assert_eq!(regs.len(), 2);
        assert!(regs.iter().all(|r| r.broker_id == 42));
        assert!(instruments.is_empty());
        assert_eq!(payments.len(), 1);
        assert_eq!(channels.len(), 1);
    }

    #[test]
    fn test_store_requires_credentials() {
        let cfg = SupabaseConfig::default();
        assert!(SupabaseStore::new(&cfg, UpsertKey::Slug).is_err());
    }
}
