//! Mathematics Subject Classification codes in free-text comments.

use once_cell::sync::Lazy;
use regex::Regex;

// Two digits, an uppercase letter, two digits: 05A15, 05E05, 11B65.
static MSC_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{2}[A-Z]\d{2}").unwrap());

fn is_alnum_at(c: Option<char>) -> bool {
    c.is_some_and(char::is_alphanumeric)
}

/// Every MSC code in `text`, sorted and deduplicated.
///
/// Codes are accepted anywhere, with or without a "Primary"/"MSC" lead-in,
/// but never as a slice of a longer alphanumeric run such as `2005A1500`.
pub fn extract_msc_codes(text: &str) -> Vec<String> {
    let mut codes: Vec<String> = MSC_CODE
        .find_iter(text)
        .filter(|m| {
            let before = text[..m.start()].chars().next_back();
            let after = text[m.end()..].chars().next();
            !is_alnum_at(before) && !is_alnum_at(after)
        })
        .map(|m| m.as_str().to_string())
        .collect();
    codes.sort();
    codes.dedup();
    codes
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_primary_secondary() {
        assert_eq!(
            extract_msc_codes("Primary 05E05; Secondary 05A19"),
            vec!["05A19", "05E05"]
        );
    }

    #[test]
    fn test_free_form_comments() {
        assert_eq!(
            extract_msc_codes("25 pages, 3 figures. MSC2020: 05A15, 05A05,05A15 (and 11B65)"),
            vec!["05A05", "05A15", "11B65"]
        );
    }

    #[test]
    fn test_embedded_runs_are_ignored() {
        assert!(extract_msc_codes("see 2005A1500 and x05A15").is_empty());
        assert!(extract_msc_codes("05a15 is lowercase").is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(extract_msc_codes("").is_empty());
        assert!(extract_msc_codes("12 pages, to appear in EJC").is_empty());
    }

    proptest! {
        #[test]
        fn prop_primary_secondary_anywhere(prefix in "[ -~]{0,40}", suffix in "[ -~]{0,40}") {
            let text = format!("{prefix} Primary 05E05; Secondary 05A19 {suffix}");
            let codes = extract_msc_codes(&text);
            prop_assert!(codes.contains(&"05A19".to_string()));
            prop_assert!(codes.contains(&"05E05".to_string()));
        }

        #[test]
        fn prop_no_letters_no_codes(text in "[0-9 ,.;:()a-z-]{0,80}") {
            prop_assert!(extract_msc_codes(&text).is_empty());
        }

        #[test]
        fn prop_output_sorted_and_unique(text in "[0-9A-Z ,;]{0,80}") {
            let codes = extract_msc_codes(&text);
            prop_assert!(codes.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
