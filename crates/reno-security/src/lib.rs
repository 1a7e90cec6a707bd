//! Anonymity sanitizer for chat messages
//!
//! While a match is anonymous, contact details and identity hints are
//! replaced with a bullet token before a message is stored.

pub mod patterns;

use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use patterns::Category;

pub const REDACTION_TOKEN: &str = "•••";
pub const BUSINESS_NAME_MARKER: &str = "(business name)";

lazy_static::lazy_static! {
    static ref TOKEN_RUN: Regex = Regex::new(r"•••(?:\s*•••)+").unwrap();
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionInfo {
    pub category: Category,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sanitized {
    pub text: String,
    pub is_filtered: bool,
    pub redactions: Vec<RedactionInfo>,
}

struct Rule {
    category: Category,
    pattern: Regex,
    replacement: String,
}

/// Ordered redaction rules
pub struct Sanitizer {
    rules: Vec<Rule>,
}

impl Sanitizer {
    pub fn new() -> Self {
        Self::from_parts(
            patterns::DEFAULT_KEYWORDS.clone(),
            patterns::DEFAULT_NAMES.clone(),
        )
    }

    /// Default lexicons extended with extra keywords and given names.
    pub fn with_extra_terms(keywords: &[String], names: &[String]) -> Result<Self, regex::Error> {
        if keywords.is_empty() && names.is_empty() {
            return Ok(Self::new());
        }

        let keyword_pattern = patterns::keyword_pattern(
            patterns::KEYWORDS
                .iter()
                .copied()
                .chain(keywords.iter().map(String::as_str)),
        )?;
        let name_pattern = patterns::name_pattern(
            patterns::GIVEN_NAMES
                .iter()
                .copied()
                .chain(names.iter().map(String::as_str)),
        )?;

        Ok(Self::from_parts(keyword_pattern, name_pattern))
    }

    fn from_parts(keywords: Regex, names: Regex) -> Self {
        let token = REDACTION_TOKEN.to_string();

        // Order matters: contact details go first so their fragments never
        // reach the word rules, and company compounds are taken whole before
        // the bare suffix keyword would leave the company name behind.
        let rules = vec![
            Rule {
                category: Category::Email,
                pattern: patterns::EMAIL.clone(),
                replacement: token.clone(),
            },
            Rule {
                category: Category::Phone,
                pattern: patterns::PHONE.clone(),
                replacement: token.clone(),
            },
            Rule {
                category: Category::Url,
                pattern: patterns::URL.clone(),
                replacement: token.clone(),
            },
            Rule {
                category: Category::BusinessName,
                pattern: patterns::BUSINESS_NAME.clone(),
                replacement: format!("{} {}", REDACTION_TOKEN, BUSINESS_NAME_MARKER),
            },
            Rule {
                category: Category::Keyword,
                pattern: keywords,
                replacement: token.clone(),
            },
            Rule {
                category: Category::PersonalName,
                pattern: names,
                replacement: token,
            },
        ];

        Self { rules }
    }

    /// Redact `content` when `anonymous`; otherwise return it untouched.
    pub fn sanitize(&self, content: &str, anonymous: bool) -> Sanitized {
        if !anonymous {
            return Sanitized {
                text: content.to_string(),
                is_filtered: false,
                redactions: Vec::new(),
            };
        }

        let mut result = content.to_string();
        let mut redactions = Vec::new();

        for rule in &self.rules {
            let count = rule.pattern.find_iter(&result).count();

            if count > 0 {
                result = rule
                    .pattern
                    .replace_all(&result, NoExpand(&rule.replacement))
                    .into_owned();

                redactions.push(RedactionInfo {
                    category: rule.category,
                    count,
                });
            }
        }

        let collapsed = TOKEN_RUN.replace_all(&result, REDACTION_TOKEN);
        let text = collapsed.trim().to_string();

        if !redactions.is_empty() {
            debug!(
                categories = ?redactions.iter().map(|r| r.category.as_str()).collect::<Vec<_>>(),
                "message redacted"
            );
        }

        Sanitized {
            text,
            is_filtered: !redactions.is_empty(),
            redactions,
        }
    }

    /// Whether `sanitize(content, true)` would redact anything.
    pub fn contains_personal_info(&self, content: &str) -> bool {
        self.rules.iter().any(|rule| rule.pattern.is_match(content))
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new()
    }
}
