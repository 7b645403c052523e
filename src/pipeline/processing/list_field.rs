//! Parsing of multi-valued fields that the source CSVs encode as strings.
//!
//! Two shapes occur:
//! - separator lists such as `Ben / Narrator; Himself` (credit characters)
//! - bracket lists such as `['drama', 'comedy']` (title genres and countries)

use thiserror::Error;

/// Canonical element separator of separator-mode fields
pub const SEPARATOR: char = '/';

/// Alternate spellings folded into [`SEPARATOR`] before splitting
const ALTERNATE_SEPARATORS: [&str; 2] = [" / ", ";"];

const QUOTES: [char; 2] = ['\'', '"'];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListFieldError {
    #[error("unbalanced brackets in list field {0:?}")]
    UnbalancedBrackets(String),
}

/// How a list-valued field is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFieldMode {
    Separator,
    BracketList,
}

impl ListFieldMode {
    /// Split a raw field into its trimmed elements, in source order.
    ///
    /// Null, blank and `[]` inputs yield an empty list and never error.
    pub fn parse(self, raw: Option<&str>) -> Result<Vec<String>, ListFieldError> {
        let raw = match raw.map(str::trim) {
            Some(s) if !s.is_empty() => s,
            _ => return Ok(Vec::new()),
        };

        match self {
            ListFieldMode::Separator => Ok(parse_separated(raw)),
            ListFieldMode::BracketList => parse_bracketed(raw),
        }
    }

    /// Encode elements back into this field shape
    pub fn render(self, items: &[String]) -> String {
        match self {
            ListFieldMode::Separator => items.join(&SEPARATOR.to_string()),
            ListFieldMode::BracketList => {
                let quoted: Vec<String> = items.iter().map(|i| format!("'{}'", i)).collect();
                format!("[{}]", quoted.join(", "))
            }
        }
    }
}

fn parse_separated(raw: &str) -> Vec<String> {
    let unified = ALTERNATE_SEPARATORS
        .iter()
        .fold(raw.to_string(), |acc, alt| acc.replace(alt, "/"));

    unified
        .split(SEPARATOR)
        .map(|item| item.trim().to_string())
        .collect()
}

fn parse_bracketed(raw: &str) -> Result<Vec<String>, ListFieldError> {
    if raw.starts_with('[') != raw.ends_with(']') {
        return Err(ListFieldError::UnbalancedBrackets(raw.to_string()));
    }

    let body: String = raw
        .trim_matches(|c| c == '[' || c == ']')
        .chars()
        .filter(|c| !QUOTES.contains(c))
        .collect();

    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    // Elements are split on the comma alone so that both "a, b" and "a,b" work
    Ok(body.split(',').map(|item| item.trim().to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_null_and_blank_inputs_are_empty() {
        for mode in [ListFieldMode::Separator, ListFieldMode::BracketList] {
            assert_eq!(mode.parse(None).unwrap(), Vec::<String>::new());
            assert_eq!(mode.parse(Some("")).unwrap(), Vec::<String>::new());
            assert_eq!(mode.parse(Some("   ")).unwrap(), Vec::<String>::new());
        }
        assert!(ListFieldMode::BracketList.parse(Some("[]")).unwrap().is_empty());
    }

    #[test]
    fn test_separator_mode_folds_alternates() {
        let parsed = ListFieldMode::Separator.parse(Some("A/B; C")).unwrap();
        assert_eq!(parsed, strings(&["A", "B", "C"]));

        let parsed = ListFieldMode::Separator
            .parse(Some("Ben / Narrator;Himself "))
            .unwrap();
        assert_eq!(parsed, strings(&["Ben", "Narrator", "Himself"]));
    }

    #[test]
    fn test_separator_mode_keeps_empty_elements() {
        // Empty labels are discarded later, by entity extraction
        let parsed = ListFieldMode::Separator.parse(Some("A//B")).unwrap();
        assert_eq!(parsed, strings(&["A", "", "B"]));
    }

    #[test]
    fn test_bracket_mode_strips_brackets_and_quotes() {
        let parsed = ListFieldMode::BracketList
            .parse(Some("['drama', 'comedy']"))
            .unwrap();
        assert_eq!(parsed, strings(&["drama", "comedy"]));

        let parsed = ListFieldMode::BracketList
            .parse(Some("['Drama','Comedy']"))
            .unwrap();
        assert_eq!(parsed, strings(&["Drama", "Comedy"]));

        let parsed = ListFieldMode::BracketList
            .parse(Some(r#"["US", "GB"]"#))
            .unwrap();
        assert_eq!(parsed, strings(&["US", "GB"]));
    }

    #[test]
    fn test_bracket_mode_rejects_unbalanced_brackets() {
        let err = ListFieldMode::BracketList
            .parse(Some("['drama'"))
            .unwrap_err();
        assert_eq!(err, ListFieldError::UnbalancedBrackets("['drama'".to_string()));
        assert!(ListFieldMode::BracketList.parse(Some("drama]")).is_err());
    }

    #[test]
    fn test_parse_is_idempotent_under_render() {
        let cases = [
            (ListFieldMode::Separator, "A/B; C"),
            (ListFieldMode::Separator, "Ben / Narrator;;Himself"),
            (ListFieldMode::Separator, " / "),
            (ListFieldMode::BracketList, "['drama', 'comedy']"),
            (ListFieldMode::BracketList, "['a', '']"),
            (ListFieldMode::BracketList, "[]"),
        ];

        for (mode, raw) in cases {
            let first = mode.parse(Some(raw)).unwrap();
            let rendered = mode.render(&first);
            let second = mode.parse(Some(&rendered)).unwrap();
            assert_eq!(first, second, "mode {:?} input {:?}", mode, raw);
        }
    }
}
