use crate::models::enums::DocumentType;

/// Documents shorter than this (in words) with no keyword hit are notes.
pub const NOTE_WORD_THRESHOLD: usize = 50;

/// Keyword rules, checked in order; the first hit wins.
const KEYWORD_RULES: &[(DocumentType, &[&str])] = &[
    (
        DocumentType::Receipt,
        &["receipt", "total", "tax", "payment", "invoice"],
    ),
    (
        DocumentType::Form,
        &["form", "application", "signature", "date of birth"],
    ),
    (
        DocumentType::Letter,
        &["letter", "dear", "sincerely", "regards"],
    ),
];

/// Label recognized text by case-insensitive keyword match.
/// Total: every input maps to exactly one label, never `Unknown`.
pub fn classify_document(text: &str) -> DocumentType {
    let lower = text.to_lowercase();

    for (label, keywords) in KEYWORD_RULES {
        if keywords.iter().any(|k| lower.contains(k)) {
            return *label;
        }
    }

    if text.split_whitespace().count() < NOTE_WORD_THRESHOLD {
        DocumentType::Note
    } else {
        DocumentType::Document
    }
}
