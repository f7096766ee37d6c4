//! Normalizer/cleaner: [`RawBroker`] → [`CleanedBroker`].
//!
//! Cleaning is idempotent — running it over an already-cleaned record yields
//! the same record. A numeric field that fails coercion is dropped entirely,
//! never zeroed.

use crate::models::{CleanedBroker, RawBroker};

/// Platform tokens accepted into a cleaned record, canonical lowercase.
pub const PLATFORM_ALLOW_LIST: &[&str] = &[
    "mt4", "mt5", "ctrader", "webtrader", "tradingview", "proprietary", "mobile",
];

/// Hard cap on pros/cons entries.
pub const MAX_PROS_CONS: usize = 5;

// ── Field cleaners ────────────────────────────────────────────────────────────

/// Trim, collapse internal whitespace, strip characters outside
/// `[a-zA-Z0-9\s\-.&]`, then title-case each word.
pub fn clean_name(name: &str) -> String {
    let filtered: String = name
        .chars()
        .filter(|c| {
            c.is_ascii_alphanumeric() || c.is_whitespace() || matches!(c, '-' | '.' | '&')
        })
        .collect();

    filtered
        .split_whitespace()
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn title_case_word(w: &str) -> String {
    let mut chars = w.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

/// Lowercase, trim, keep only allow-listed tokens, dedupe preserving
/// first-seen order.
pub fn clean_platforms(raw: &[String]) -> Vec<String> {
    let mut kept: Vec<String> = Vec::new();
    for p in raw {
        let p = p.trim().to_lowercase();
        if PLATFORM_ALLOW_LIST.contains(&p.as_str()) && !kept.contains(&p) {
            kept.push(p);
        }
    }
    kept
}

/// Coerce a leverage string: "1:400" → 400, "400" → 400, "1 : 30" → 30.
pub fn parse_leverage(s: &str) -> Option<f64> {
    let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }
    let tail = match compact.rsplit_once(':') {
        Some((_, t)) => t,
        None => compact.as_str(),
    };
    tail.replace(',', "").parse::<f64>().ok().filter(|v| *v > 0.0)
}

/// Drop empty entries and trim the rest.
pub fn clean_list(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Slug for the upsert key: lowercase, non-alphanumeric runs collapsed to a
/// single hyphen, leading/trailing hyphens stripped.
pub fn slugify(name: &str) -> String {
    let mut out = String::new();
    let mut gap = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if gap && !out.is_empty() {
                out.push('-');
            }
            gap = false;
            out.push(c.to_ascii_lowercase());
        } else {
            gap = true;
        }
    }
    out
}

// ── Record cleaner ────────────────────────────────────────────────────────────

pub fn clean(raw: &RawBroker) -> CleanedBroker {
    let trimmed = |s: &Option<String>| -> Option<String> {
        s.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    };

    let capped = |l: &Option<Vec<String>>| -> Option<Vec<String>> {
        l.as_deref().map(|v| {
            let mut v = clean_list(v);
            v.truncate(MAX_PROS_CONS);
            v
        })
    };

    CleanedBroker {
        source_file: raw.source_file.clone(),
        name: raw
            .name
            .as_deref()
            .map(clean_name)
            .filter(|n| !n.is_empty()),
        website_url: trimmed(&raw.website_url),
        headquarters: trimmed(&raw.headquarters),
        founded_year: raw.founded_year,
        overall_rating: raw.overall_rating,
        min_deposit: raw.min_deposit,
        max_leverage: raw.max_leverage.as_deref().and_then(parse_leverage),
        spread_from: raw.spread_from,
        spread_type: trimmed(&raw.spread_type).map(|s| s.to_lowercase()),
        instruments_total: raw.instruments_total,
        platforms: raw.platforms.as_deref().map(clean_platforms),
        regulatory_bodies: raw.regulatory_bodies.as_deref().map(|v| clean_list(v)),
        instrument_types: raw.instrument_types.as_deref().map(|v| clean_list(v)),
        account_types: raw.account_types.as_deref().map(|v| clean_list(v)),
        deposit_methods: raw.deposit_methods.as_deref().map(|v| clean_list(v)),
        support_languages: raw.support_languages.as_deref().map(|v| clean_list(v)),
        pros: capped(&raw.pros),
        cons: capped(&raw.cons),
        cfds_available: raw.cfds_available,
        demo_account: raw.demo_account,
        islamic_account: raw.islamic_account,
        copy_trading: raw.copy_trading,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Feed a cleaned record back through as if it were raw.
    fn rewrap(c: &CleanedBroker) -> RawBroker {
        RawBroker {
            source_file: c.source_file.clone(),
            name: c.name.clone(),
            website_url: c.website_url.clone(),
            headquarters: c.headquarters.clone(),
            founded_year: c.founded_year,
            overall_rating: c.overall_rating,
            min_deposit: c.min_deposit,
            max_leverage: c.max_leverage.map(|v| v.to_string()),
            spread_from: c.spread_from,
            spread_type: c.spread_type.clone(),
            instruments_total: c.instruments_total,
            platforms: c.platforms.clone(),
            regulatory_bodies: c.regulatory_bodies.clone(),
            instrument_types: c.instrument_types.clone(),
            account_types: c.account_types.clone(),
            deposit_methods: c.deposit_methods.clone(),
            support_languages: c.support_languages.clone(),
            pros: c.pros.clone(),
            cons: c.cons.clone(),
            cfds_available: c.cfds_available,
            demo_account: c.demo_account,
            islamic_account: c.islamic_account,
            copy_trading: c.copy_trading,
        }
    }

    #[test]
    fn test_clean_is_idempotent() {
        let raw = RawBroker {
            source_file: "x.html".into(),
            name: Some("  example   BROKER & co!! ".into()),
            max_leverage: Some("1:500".into()),
            platforms: Some(vec!["MT4".into(), "madeup".into(), "cTrader".into()]),
            pros: Some(vec![
                "a".into(), "".into(), " b ".into(), "c".into(), "d".into(),
                "e".into(), "f".into(),
            ]),
            ..RawBroker::default()
        };

        let once = clean(&raw);
        let twice = clean(&rewrap(&once));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_platform_allow_list_filtering() {
        let raw = vec!["MT4".to_string(), "madeupplatform".to_string(), "cTrader".to_string()];
        assert_eq!(clean_platforms(&raw), vec!["mt4", "ctrader"]);
    }

    #[test]
    fn test_platform_dedupe_keeps_first_seen() {
        let raw = vec!["mt5".to_string(), "MT4".to_string(), "mt5".to_string()];
        assert_eq!(clean_platforms(&raw), vec!["mt5", "mt4"]);
    }

    #[test]
    fn test_slugify_determinism() {
        assert_eq!(slugify("IG Group"), "ig-group");
        assert_eq!(slugify("FP Markets!!"), "fp-markets");
        assert_eq!(slugify("FP Markets!!"), slugify("FP Markets!!"));
        assert_eq!(slugify("  eToro  "), "etoro");
    }

    #[test]
    fn test_parse_leverage() {
        assert_eq!(parse_leverage("1:400"), Some(400.0));
        assert_eq!(parse_leverage("400"), Some(400.0));
        assert_eq!(parse_leverage("1 : 30"), Some(30.0));
        assert_eq!(parse_leverage("unlimited"), None);
        assert_eq!(parse_leverage(""), None);
    }

    #[test]
    fn test_failed_coercion_drops_field() {
        let raw = RawBroker {
            name: Some("Test".into()),
            max_leverage: Some("flexible".into()),
            ..RawBroker::default()
        };
        let cleaned = clean(&raw);
        assert_eq!(cleaned.max_leverage, None);
    }

    #[test]
    fn test_pros_capped_at_five() {
        let raw = RawBroker {
            pros: Some((1..=8).map(|i| format!("pro {i}")).collect()),
            ..RawBroker::default()
        };
        let cleaned = clean(&raw);
        assert_eq!(cleaned.pros.as_ref().map(Vec::len), Some(5));
    }

    #[test]
    fn test_clean_name_strips_disallowed_chars() {
        assert_eq!(clean_name("  pepperstone™  (AU) "), "Pepperstone Au");
        assert_eq!(clean_name("B&M-Trading.com"), "B&m-trading.com");
    }
}
