use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

static NON_SLUG_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9\s-]").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static HYPHEN_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").unwrap());

/// Strip diacritics: `Erdős` → `Erdos`, `García` → `Garcia`.
pub fn strip_accents(text: &str) -> String {
    text.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

/// URL-friendly author slug: `Per Alexandersson` → `per-alexandersson`.
pub fn slugify(name: &str) -> String {
    let lowered = strip_accents(name).to_lowercase();
    let kept = NON_SLUG_CHARS.replace_all(&lowered, "");
    let hyphenated = WHITESPACE_RUN.replace_all(kept.trim(), "-");
    HYPHEN_RUN.replace_all(&hyphenated, "-").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_accents() {
        assert_eq!(strip_accents("Erdős"), "Erdos");
        assert_eq!(strip_accents("García"), "Garcia");
        assert_eq!(strip_accents("Möbius"), "Mobius");
        assert_eq!(strip_accents("plain"), "plain");
    }

    #[test]
    fn test_slugify_simple_name() {
        assert_eq!(slugify("Per Alexandersson"), "per-alexandersson");
    }

    #[test]
    fn test_slugify_accents_and_punctuation() {
        assert_eq!(slugify("Paul Erdős"), "paul-erdos");
        assert_eq!(slugify("J. M. O'Neill"), "j-m-oneill");
        assert_eq!(slugify("  Anne -- Schilling "), "anne-schilling");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify(""), "");
    }
}
