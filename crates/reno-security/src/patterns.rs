//! Detection tables for personal and business identifiers
//!
//! Each category is one compiled pattern. Lexicon categories are built from
//! plain word lists so new terms never touch control flow.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Email,
    Phone,
    Url,
    BusinessName,
    Keyword,
    PersonalName,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Url => "url",
            Self::BusinessName => "business_name",
            Self::Keyword => "keyword",
            Self::PersonalName => "personal_name",
        }
    }
}

/// Company-form suffixes. Also part of [`KEYWORDS`].
pub const BUSINESS_SUFFIXES: &[&str] = &[
    "bv",
    "b.v.",
    "ltd",
    "limited",
    "corp",
    "corporation",
    "inc",
    "incorporated",
    "llc",
    "cv",
    "vof",
];

/// Contact and company vocabulary, matched case-insensitively as whole words.
pub const KEYWORDS: &[&str] = &[
    "bedrijf",
    "company",
    "bv",
    "b.v.",
    "ltd",
    "limited",
    "corp",
    "corporation",
    "inc",
    "incorporated",
    "llc",
    "gmbh",
    "cv",
    "vof",
    "eenmanszaak",
    "contact",
    "bel",
    "call",
    "phone",
    "telefoon",
    "mail",
    "email",
    "website",
    "site",
    "portfolio",
    "facebook",
    "instagram",
    "linkedin",
    "kvk",
    "btw",
    "vat",
    "chamber",
    "kamer",
    "handel",
];

/// Common given names, matched only in capitalized form.
pub const GIVEN_NAMES: &[&str] = &[
    "jan", "piet", "kees", "henk", "bert", "cor", "wim", "ton", "rob", "mark", "peter", "paul",
    "john", "erik", "marco", "dennis", "patrick", "michael", "sandra", "ingrid", "marieke",
    "susan", "nicole", "linda", "patricia", "maria", "anna", "marianne", "caroline", "monique",
    "anja", "brigitte",
];

lazy_static! {
    pub static ref EMAIL: Regex =
        Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap();

    /// Optional country code, optional area code, then a
    /// digit-bounded run of at least six digits and separators. Long numbers
    /// in prices or addresses are redacted too.
    pub static ref PHONE: Regex = Regex::new(
        r"(?:\+?\d{1,4}[-.\s]?)?(?:\(?\d{2,4}\)?[-.\s]?)?\d[\d\s.-]{4,}\d"
    )
    .unwrap();

    pub static ref URL: Regex = Regex::new(r"https?://\S+|www\.\S+").unwrap();

    /// A word followed by a company-form suffix, with or without a space.
    pub static ref BUSINESS_NAME: Regex = Regex::new(&format!(
        r"(?i)\b\w+\s*(?:{})",
        alternation(BUSINESS_SUFFIXES.iter().copied(), Bounds::Trailing)
    ))
    .unwrap();

    pub static ref DEFAULT_KEYWORDS: Regex =
        keyword_pattern(KEYWORDS.iter().copied()).unwrap();

    pub static ref DEFAULT_NAMES: Regex = name_pattern(GIVEN_NAMES.iter().copied()).unwrap();
}

/// Case-insensitive whole-word match on any of `words`.
pub fn keyword_pattern<'a>(words: impl IntoIterator<Item = &'a str>) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"(?i)(?:{})", alternation(words, Bounds::Both)))
}

/// Case-sensitive whole-word match on the capitalized form of `names`.
pub fn name_pattern<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<Regex, regex::Error> {
    let capitalized: Vec<String> = names.into_iter().map(capitalize).collect();
    Regex::new(&format!(
        r"(?:{})",
        alternation(capitalized.iter().map(String::as_str), Bounds::Both)
    ))
}

#[derive(Clone, Copy)]
enum Bounds {
    Both,
    Trailing,
}

/// Escape `word` and add `\b` only on requested sides that are word
/// characters; "b.v." takes no boundary after its last dot.
fn bounded(word: &str, bounds: Bounds) -> String {
    let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
    let lead = matches!(bounds, Bounds::Both) && is_word(word.chars().next());
    let trail = is_word(word.chars().last());

    format!(
        "{}{}{}",
        if lead { r"\b" } else { "" },
        regex::escape(word),
        if trail { r"\b" } else { "" }
    )
}

/// Longest first, so a shorter term never shadows a longer one at the same position.
fn alternation<'a>(words: impl IntoIterator<Item = &'a str>, bounds: Bounds) -> String {
    let mut words: Vec<&str> = words
        .into_iter()
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .collect();
    words.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    words.dedup();
    words
        .into_iter()
        .map(|word| bounded(word, bounds))
        .collect::<Vec<_>>()
        .join("|")
}

fn capitalize(word: &str) -> String {
    let lower = word.trim().to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
