//! Local regex entity extraction, used when the model is unavailable
//! or its reply has no usable object.
//!
//! Only emails, phone numbers, amounts and dates are recognized; names,
//! addresses and other are always empty.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::ExtractedEntities;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap()
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{3}[-. ]?\d{3}[-. ]?\d{4}\b").unwrap());

static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\s?\d+(?:,\d{3})*(?:\.\d{2})?|\d+(?:,\d{3})*(?:\.\d{2})?\s?(?:USD|EUR|INR|Rs)")
        .unwrap()
});

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b\d{1,2}[/-]\d{1,2}[/-]\d{2,4}\b|\b(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]* \d{1,2},? \d{4}\b",
    )
    .unwrap()
});

fn find_all(re: &Regex, text: &str) -> Vec<String> {
    re.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

pub fn extract_entities_fallback(text: &str) -> ExtractedEntities {
    ExtractedEntities {
        emails: find_all(&EMAIL_RE, text),
        phone_numbers: find_all(&PHONE_RE, text),
        amounts: find_all(&AMOUNT_RE, text),
        dates: find_all(&DATE_RE, text),
        ..Default::default()
    }
}
