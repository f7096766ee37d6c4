//! Per-field extraction rule tables.
//!
//! Every table is ordered: earlier patterns are assumed higher precision and
//! the first successful one wins, even when a later pattern would match a more
//! precise value. Keeping the tables in one place makes the precedence policy
//! visible and testable instead of scattering pattern literals across call
//! sites.

// ── Name ─────────────────────────────────────────────────────────────────────

/// Heading candidates for the broker name, tried in order.
pub const NAME_SELECTORS: &[&str] = &[
    "h1",
    ".review-header h2",
    ".broker-name",
    "title",
];

// ── Numeric text patterns ────────────────────────────────────────────────────

pub const RATING_PATTERNS: &[&str] = &[
    r"(?i)rating[:\s]*([0-9](?:\.[0-9])?)\s*(?:/|out of)\s*5",
    r"(?i)rated\s+([0-9](?:\.[0-9])?)\s*stars?",
    r"(?i)score[:\s]*([0-9](?:\.[0-9])?)\s*/\s*5",
];

pub const MIN_DEPOSIT_PATTERNS: &[&str] = &[
    r"(?i)minimum deposit(?:\s+(?:is|of))?[:\s]*\$?\s*([0-9][0-9,]*(?:\.[0-9]+)?)",
    r"(?i)min\.?\s*deposit[:\s]*\$?\s*([0-9][0-9,]*(?:\.[0-9]+)?)",
    r"(?i)deposit(?:s)?\s+(?:start(?:ing)?\s+)?from\s*\$?\s*([0-9][0-9,]*(?:\.[0-9]+)?)",
];

/// Leverage is captured as raw text ("1:400" or "400"); the cleaner coerces.
pub const LEVERAGE_PATTERNS: &[&str] = &[
    r"(?i)(?:max(?:imum)?\s+)?leverage(?:\s+(?:is|of|up\s+to))?[:\s]*((?:1\s*:\s*)?[0-9]{1,4})",
    r"(?i)up to\s+(1\s*:\s*[0-9]{1,4})",
];

pub const SPREAD_PATTERNS: &[&str] = &[
    r"(?i)spreads?\s+from\s+([0-9]+(?:\.[0-9]+)?)\s*pips?",
    r"(?i)spreads?\s+(?:as\s+low\s+as\s+)?([0-9]+(?:\.[0-9]+)?)\s*pips?",
    r"(?i)([0-9]+(?:\.[0-9]+)?)\s*pips?\s+spreads?",
];

pub const SPREAD_TYPE_PATTERNS: &[&str] = &[
    r"(?i)\b(fixed|variable|floating|raw)\s+spreads?",
];

pub const FOUNDED_PATTERNS: &[&str] = &[
    r"(?i)founded(?:\s+in)?[:\s]*((?:19|20)[0-9]{2})",
    r"(?i)established(?:\s+in)?[:\s]*((?:19|20)[0-9]{2})",
    r"(?i)(?:operating\s+)?since\s+((?:19|20)[0-9]{2})",
];

pub const HEADQUARTERS_PATTERNS: &[&str] = &[
    r"(?i)headquarter(?:s|ed)(?:\s+in)?[:\s]*([A-Z][A-Za-z ,'-]{2,50})",
    r"(?i)based in\s+([A-Z][A-Za-z ,'-]{2,50})",
];

pub const INSTRUMENTS_TOTAL_PATTERNS: &[&str] = &[
    r"(?i)([0-9][0-9,]{0,6})\+?\s*(?:tradeable|tradable|trading)?\s*instruments",
    r"(?i)over\s+([0-9][0-9,]{0,6})\s+markets",
];

/// Website patterns run against the raw HTML, not the flattened text, since
/// the link target lives in an href attribute.
pub const WEBSITE_PATTERNS: &[&str] = &[
    r#"(?i)href="(https?://[^"]+)"[^>]*>\s*(?:visit|official)"#,
    r"(?i)website[:\s]+(https?://[^\s<>\x22]+)",
];

// ── Availability keywords ────────────────────────────────────────────────────

// Case-insensitive containment over the whole document. The keyword appearing
// inside unrelated copy still counts — a known false-positive source that
// must be preserved, not fixed.
pub const CFD_KEYWORD: &str = "cfd";
pub const DEMO_KEYWORD: &str = "demo";
pub const ISLAMIC_KEYWORD: &str = "islamic";
pub const COPY_TRADING_KEYWORD: &str = "copy trading";

// ── Fixed vocabularies ───────────────────────────────────────────────────────

// List fields collect matches in vocabulary order, not document order.

/// Canonical platform token plus the page aliases that imply it.
pub const PLATFORM_VOCAB: &[(&str, &[&str])] = &[
    ("mt4", &["mt4", "metatrader 4", "metatrader4"]),
    ("mt5", &["mt5", "metatrader 5", "metatrader5"]),
    ("ctrader", &["ctrader"]),
    ("webtrader", &["webtrader", "web trader"]),
    ("tradingview", &["tradingview"]),
    ("proprietary", &["proprietary platform", "proprietary app"]),
    ("mobile", &["mobile app", "mobile trading"]),
];

/// Regulator acronyms, matched case-sensitively against the original text so
/// that e.g. "mas" inside a word does not count.
pub const REGULATOR_VOCAB: &[&str] = &[
    "FCA", "CySEC", "ASIC", "FSCA", "FINMA", "BaFin", "CFTC", "NFA", "DFSA",
    "MAS", "IIROC", "FMA", "CBI", "SCB",
];

pub const INSTRUMENT_TYPE_VOCAB: &[(&str, &[&str])] = &[
    ("forex", &["forex pairs", "currency pairs", "fx pairs"]),
    ("stocks", &["stocks", "shares", "equities"]),
    ("indices", &["indices"]),
    ("commodities", &["commodities"]),
    ("cryptocurrencies", &["crypto", "cryptocurrencies"]),
    ("etfs", &["etfs", "etf trading"]),
    ("bonds", &["bonds"]),
];

pub const ACCOUNT_TYPE_VOCAB: &[(&str, &[&str])] = &[
    ("standard", &["standard account"]),
    ("raw", &["raw account", "raw spread account"]),
    ("pro", &["pro account", "professional account"]),
    ("ecn", &["ecn account"]),
    ("micro", &["micro account", "cent account"]),
    ("vip", &["vip account"]),
];

pub const DEPOSIT_METHOD_VOCAB: &[(&str, &[&str])] = &[
    ("bank transfer", &["bank transfer", "wire transfer", "bank wire"]),
    ("credit card", &["credit card", "visa", "mastercard"]),
    ("debit card", &["debit card"]),
    ("paypal", &["paypal"]),
    ("skrill", &["skrill"]),
    ("neteller", &["neteller"]),
    ("crypto", &["bitcoin", "crypto deposit", "usdt"]),
];

pub const LANGUAGE_VOCAB: &[(&str, &[&str])] = &[
    ("english", &["english"]),
    ("spanish", &["spanish"]),
    ("french", &["french"]),
    ("german", &["german"]),
    ("italian", &["italian"]),
    ("portuguese", &["portuguese"]),
    ("arabic", &["arabic"]),
    ("chinese", &["chinese", "mandarin"]),
    ("japanese", &["japanese"]),
    ("russian", &["russian"]),
];

// ── Pros / cons ──────────────────────────────────────────────────────────────

pub const PROS_SELECTORS: &[&str] = &[
    ".pros li",
    ".pros-list li",
    "ul.pros li",
    "#pros li",
];

pub const CONS_SELECTORS: &[&str] = &[
    ".cons li",
    ".cons-list li",
    "ul.cons li",
    "#cons li",
];

// ── Numeric sanity ranges ────────────────────────────────────────────────────

// A match outside its range does not "succeed"; the next pattern is tried.
pub const RATING_RANGE: (f64, f64) = (0.0, 5.0);
pub const DEPOSIT_RANGE: (f64, f64) = (0.0, 1_000_000.0);
pub const SPREAD_RANGE: (f64, f64) = (0.0, 50.0);
pub const FOUNDED_MIN_YEAR: i32 = 1970;
pub const INSTRUMENTS_RANGE: (i64, i64) = (1, 100_000);
