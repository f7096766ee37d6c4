//! Field extraction: turns one review page into a [`RawBroker`].
//!
//! Per field, an ordered rule table (regex over the flattened page text, or
//! CSS selectors over the DOM) is tried in sequence; the first successful
//! pattern wins. Extraction never fails — a missed field is `None` and the
//! caller decides what to do downstream.

pub mod rules;

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use regex::Regex;
use scraper::{Html, Selector};

use self::rules::*;
use crate::clean::title_case_word;
use crate::models::RawBroker;

pub struct Extractor {
    rating: Vec<Regex>,
    min_deposit: Vec<Regex>,
    leverage: Vec<Regex>,
    spread: Vec<Regex>,
    spread_type: Vec<Regex>,
    founded: Vec<Regex>,
    headquarters: Vec<Regex>,
    instruments_total: Vec<Regex>,
    website: Vec<Regex>,
}

fn compile(patterns: &[&str]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Regex::new(p).with_context(|| format!("invalid pattern: {p}")))
        .collect()
}

impl Extractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            rating: compile(RATING_PATTERNS)?,
            min_deposit: compile(MIN_DEPOSIT_PATTERNS)?,
            leverage: compile(LEVERAGE_PATTERNS)?,
            spread: compile(SPREAD_PATTERNS)?,
            spread_type: compile(SPREAD_TYPE_PATTERNS)?,
            founded: compile(FOUNDED_PATTERNS)?,
            headquarters: compile(HEADQUARTERS_PATTERNS)?,
            instruments_total: compile(INSTRUMENTS_TOTAL_PATTERNS)?,
            website: compile(WEBSITE_PATTERNS)?,
        })
    }

    pub fn extract(&self, html: &str, source_file: &str) -> RawBroker {
        let doc = Html::parse_document(html);
        let text = flatten_text(&doc);
        let lower = text.to_lowercase();
        let this_year = Utc::now().year();

        RawBroker {
            source_file: source_file.to_string(),
            name: extract_name(&doc),
            website_url: first_capture(&self.website, html),
            headquarters: first_capture(&self.headquarters, &text)
                .map(|s| s.trim().to_string()),
            founded_year: first_number(&self.founded, &text)
                .map(|y| y as i32)
                .filter(|y| (FOUNDED_MIN_YEAR..=this_year).contains(y)),
            overall_rating: first_number(&self.rating, &text)
                .filter(|r| (RATING_RANGE.0..=RATING_RANGE.1).contains(r)),
            min_deposit: first_number(&self.min_deposit, &text)
                .filter(|d| (DEPOSIT_RANGE.0..=DEPOSIT_RANGE.1).contains(d)),
            max_leverage: first_capture(&self.leverage, &text),
            spread_from: first_number(&self.spread, &text)
                .filter(|s| (SPREAD_RANGE.0..=SPREAD_RANGE.1).contains(s)),
            spread_type: first_capture(&self.spread_type, &text)
                .map(|s| s.to_lowercase()),
            instruments_total: first_number(&self.instruments_total, &text)
                .map(|n| n as i64)
                .filter(|n| (INSTRUMENTS_RANGE.0..=INSTRUMENTS_RANGE.1).contains(n)),
            platforms: Some(vocab_list(&lower, PLATFORM_VOCAB)),
            regulatory_bodies: Some(regulator_list(&text)),
            instrument_types: Some(vocab_list(&lower, INSTRUMENT_TYPE_VOCAB)),
            account_types: Some(vocab_list(&lower, ACCOUNT_TYPE_VOCAB)),
            deposit_methods: Some(vocab_list(&lower, DEPOSIT_METHOD_VOCAB)),
            support_languages: Some(vocab_list(&lower, LANGUAGE_VOCAB)),
            pros: select_list(&doc, PROS_SELECTORS),
            cons: select_list(&doc, CONS_SELECTORS),
            cfds_available: Some(lower.contains(CFD_KEYWORD)),
            demo_account: Some(lower.contains(DEMO_KEYWORD)),
            islamic_account: Some(lower.contains(ISLAMIC_KEYWORD)),
            copy_trading: Some(lower.contains(COPY_TRADING_KEYWORD)),
        }
    }
}

// ── Text helpers ──────────────────────────────────────────────────────────────

/// Flatten the document into whitespace-normalized running text.
fn flatten_text(doc: &Html) -> String {
    let mut out = String::new();
    for piece in doc.root_element().text() {
        let t = piece.trim();
        if t.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(t);
    }
    out
}

/// First capture group of the first matching pattern.
fn first_capture(patterns: &[Regex], text: &str) -> Option<String> {
    for re in patterns {
        if let Some(caps) = re.captures(text) {
            if let Some(m) = caps.get(1) {
                return Some(m.as_str().trim().to_string());
            }
        }
    }
    None
}

/// First pattern whose capture parses as a number, commas stripped.
fn first_number(patterns: &[Regex], text: &str) -> Option<f64> {
    for re in patterns {
        let Some(caps) = re.captures(text) else { continue };
        let Some(m) = caps.get(1) else { continue };
        if let Ok(n) = m.as_str().replace(',', "").parse::<f64>() {
            return Some(n);
        }
    }
    None
}

// ── Name ─────────────────────────────────────────────────────────────────────

fn extract_name(doc: &Html) -> Option<String> {
    for sel_str in NAME_SELECTORS {
        let Ok(sel) = Selector::parse(sel_str) else { continue };
        let Some(el) = doc.select(&sel).next() else { continue };
        let raw = el.text().collect::<String>();
        let name = strip_name_noise(&raw);
        if name.len() >= 2 {
            return Some(name);
        }
    }
    None
}

/// Drop the filler words review pages put around broker names, then
/// title-case the remainder word by word.
///
/// "review" and "forex" go unconditionally; "broker" goes only when leading
/// or right after "forex" — stripping it everywhere would mangle names that
/// legitimately contain the word ("Example Broker Review" → "Example Broker").
fn strip_name_noise(raw: &str) -> String {
    let head = raw.split(['|', '–']).next().unwrap_or(raw);
    let words: Vec<&str> = head.split_whitespace().collect();

    let mut kept: Vec<String> = Vec::new();
    for (i, w) in words.iter().enumerate() {
        if w.eq_ignore_ascii_case("review") || w.eq_ignore_ascii_case("forex") {
            continue;
        }
        if w.eq_ignore_ascii_case("broker")
            && (i == 0 || words[i - 1].eq_ignore_ascii_case("forex"))
        {
            continue;
        }
        kept.push(title_case_word(w));
    }
    kept.join(" ")
}

// ── List helpers ─────────────────────────────────────────────────────────────

/// Collect canonical tokens whose aliases appear in the page, vocabulary
/// order, not document order.
fn vocab_list(lower_text: &str, vocab: &[(&str, &[&str])]) -> Vec<String> {
    vocab
        .iter()
        .filter(|(_, aliases)| aliases.iter().any(|a| lower_text.contains(a)))
        .map(|(canon, _)| canon.to_string())
        .collect()
}

/// Regulator acronyms are matched case-sensitively against the original text.
fn regulator_list(text: &str) -> Vec<String> {
    REGULATOR_VOCAB
        .iter()
        .filter(|r| text.contains(**r))
        .map(|r| r.to_string())
        .collect()
}

/// First selector that yields any non-empty items wins.
fn select_list(doc: &Html, selectors: &[&str]) -> Option<Vec<String>> {
    for sel_str in selectors {
        let Ok(sel) = Selector::parse(sel_str) else { continue };
        let items: Vec<String> = doc
            .select(&sel)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if !items.is_empty() {
            return Some(items);
        }
    }
    None
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> Extractor {
        Extractor::new().unwrap()
    }

    #[test]
    fn test_end_to_end_fragment() {
        let html = r#"
            <html><body>
            <h1>Example Broker Review</h1>
            <p>The minimum deposit $250 gets you started with leverage 1:400.</p>
            <p>Regulated by the FCA.</p>
            </body></html>
        "#;
        let raw = extractor().extract(html, "example.html");

        assert_eq!(raw.name.as_deref(), Some("Example Broker"));
        assert_eq!(raw.min_deposit, Some(250.0));
        assert_eq!(raw.max_leverage.as_deref(), Some("1:400"));
        assert_eq!(raw.regulatory_bodies, Some(vec!["FCA".to_string()]));
    }

    #[test]
    fn test_first_pattern_wins() {
        // Both the "minimum deposit" and "deposit from" patterns match; the
        // earlier table entry wins even though the later number differs.
        let html = "<p>minimum deposit $100. Accounts with deposit from $500 exist.</p>";
        let raw = extractor().extract(html, "t.html");
        assert_eq!(raw.min_deposit, Some(100.0));
    }

    #[test]
    fn test_boolean_containment_false_positive() {
        // "CFDs are complex instruments" risk copy still flips the flag.
        let html = "<p>76% of retail accounts lose money trading CFDs with this provider.</p>";
        let raw = extractor().extract(html, "t.html");
        assert_eq!(raw.cfds_available, Some(true));
    }

    #[test]
    fn test_founded_year_range_sanity() {
        // Matches the pattern but fails the [1970, current_year] sanity range.
        let raw = extractor().extract("<p>founded in 1950</p>", "t.html");
        assert_eq!(raw.founded_year, None);

        let raw = extractor().extract("<p>founded in 2010</p>", "t.html");
        assert_eq!(raw.founded_year, Some(2010));
    }

    #[test]
    fn test_vocab_order_not_document_order() {
        let html = "<p>Trade on cTrader or MetaTrader 4 today.</p>";
        let raw = extractor().extract(html, "t.html");
        assert_eq!(
            raw.platforms,
            Some(vec!["mt4".to_string(), "ctrader".to_string()])
        );
    }

    #[test]
    fn test_name_strips_noise_words() {
        let html = "<h1>XM Forex Broker Review</h1>";
        let raw = extractor().extract(html, "t.html");
        assert_eq!(raw.name.as_deref(), Some("Xm"));
    }

    #[test]
    fn test_pros_cons_selectors() {
        let html = r#"
            <ul class="pros"><li>Low fees</li><li>Fast support</li></ul>
            <ul class="cons"><li>No crypto</li></ul>
        "#;
        let raw = extractor().extract(html, "t.html");
        assert_eq!(
            raw.pros,
            Some(vec!["Low fees".to_string(), "Fast support".to_string()])
        );
        assert_eq!(raw.cons, Some(vec!["No crypto".to_string()]));
    }

    #[test]
    fn test_missing_fields_are_none() {
        let raw = extractor().extract("<p>nothing useful here</p>", "t.html");
        assert_eq!(raw.min_deposit, None);
        assert_eq!(raw.overall_rating, None);
        assert_eq!(raw.founded_year, None);
        assert_eq!(raw.platforms, Some(vec![]));
    }
}
