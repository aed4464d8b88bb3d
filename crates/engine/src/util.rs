//! Internal helpers for input normalization.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and normalization so the engine enforces consistent invariants.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{EngineError, ResultEngine};

/// Trim and collapse inner whitespace; rejects empty input.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return Err(EngineError::Validation(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(collapsed)
}

/// Trim optional text, mapping blank input to `None`.
pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Uniqueness key for a display name: diacritics stripped, lowercase,
/// punctuation folded into single spaces.
pub(crate) fn normalize_name_key(display: &str) -> ResultEngine<String> {
    let mut out = String::new();
    let mut prev_space = false;
    for ch in display.trim().nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            prev_space = false;
        } else if !out.is_empty() && !prev_space {
            out.push(' ');
            prev_space = true;
        }
    }
    let normalized = out.trim();
    if normalized.is_empty() {
        return Err(EngineError::Validation(format!(
            "name '{display}' has no letters or digits"
        )));
    }
    Ok(normalized.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_name_collapses_whitespace() {
        assert_eq!(
            normalize_required_name("  Main   bank ", "account").unwrap(),
            "Main bank"
        );
        assert_eq!(
            normalize_required_name("   ", "account"),
            Err(EngineError::Validation(
                "account name must not be empty".to_string()
            ))
        );
    }

    #[test]
    fn name_key_strips_diacritics_and_case() {
        assert_eq!(normalize_name_key("Café  Élite!").unwrap(), "cafe elite");
        assert_eq!(normalize_name_key("ACME, Inc.").unwrap(), "acme inc");
        assert!(normalize_name_key("--").is_err());
    }
}
