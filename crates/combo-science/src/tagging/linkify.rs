use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::dictionary::KeywordDictionary;

/// An abstract with keyword links inserted, and the canonical terms that
/// were linked in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Linked {
    pub html: String,
    pub terms: Vec<String>,
}

struct Target {
    canonical: String,
    url: String,
    tag: Option<String>,
}

struct Candidate {
    surface: String,
    target: usize,
}

/// Longest-match, first-occurrence keyword linker built from a
/// [`KeywordDictionary`].
pub struct Linkifier {
    targets: Vec<Target>,
    /// Candidates bucketed by first character, longest first.
    by_first_char: HashMap<char, Vec<Candidate>>,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

impl Linkifier {
    pub fn new(dictionary: &KeywordDictionary) -> Self {
        let mut targets = Vec::with_capacity(dictionary.len());
        let mut by_first_char: HashMap<char, Vec<Candidate>> = HashMap::new();

        for entry in dictionary.iter() {
            let target = targets.len();
            targets.push(Target {
                canonical: entry.canonical.clone(),
                url: entry.url.clone(),
                tag: entry.tag.clone(),
            });
            for surface in entry.surface_forms() {
                if let Some(first) = surface.chars().next() {
                    by_first_char.entry(first).or_default().push(Candidate {
                        surface: surface.to_string(),
                        target,
                    });
                }
            }
        }

        for bucket in by_first_char.values_mut() {
            bucket.sort_by(|a, b| {
                b.surface
                    .chars()
                    .count()
                    .cmp(&a.surface.chars().count())
                    .then_with(|| a.surface.cmp(&b.surface))
            });
        }

        Self {
            targets,
            by_first_char,
        }
    }

    /// Longest candidate starting at byte `pos` whose span sits on word
    /// boundaries.
    fn match_at(&self, text: &str, pos: usize, first: char) -> Option<&Candidate> {
        if text[..pos].chars().next_back().is_some_and(is_word_char) {
            return None;
        }
        let rest = &text[pos..];
        self.by_first_char.get(&first)?.iter().find(|candidate| {
            rest.starts_with(candidate.surface.as_str())
                && !rest[candidate.surface.len()..]
                    .chars()
                    .next()
                    .is_some_and(is_word_char)
        })
    }

    /// Wrap the first occurrence of each dictionary term in `text` as
    /// `<a href="URL" class="keyword-link">…</a>`.
    ///
    /// Later occurrences of an already linked term stay plain text but still
    /// consume their span. Text outside links is copied unchanged.
    pub fn linkify(&self, text: &str) -> Linked {
        let (html, linked) = self.scan(text);
        let terms = linked
            .into_iter()
            .map(|target| self.targets[target].canonical.clone())
            .collect();
        Linked { html, terms }
    }

    /// Tag names of the dictionary entries linked in `text`.
    pub fn tags_for(&self, text: &str) -> Vec<String> {
        let (_, linked) = self.scan(text);
        let mut tags: Vec<String> = Vec::new();
        for target in linked {
            if let Some(tag) = &self.targets[target].tag {
                if !tags.contains(tag) {
                    tags.push(tag.clone());
                }
            }
        }
        tags
    }

    /// Rendered html and the linked target indices in first-seen order.
    fn scan(&self, text: &str) -> (String, Vec<usize>) {
        let mut html = String::with_capacity(text.len());
        let mut linked: Vec<usize> = Vec::new();
        let mut seen: HashSet<usize> = HashSet::new();

        let mut copied_to = 0;
        let mut pos = 0;
        while let Some(c) = text[pos..].chars().next() {
            let Some(candidate) = self.match_at(text, pos, c) else {
                pos += c.len_utf8();
                continue;
            };

            let end = pos + candidate.surface.len();
            html.push_str(&text[copied_to..pos]);
            let matched = &text[pos..end];
            if seen.insert(candidate.target) {
                html.push_str("<a href=\"");
                html.push_str(&escape_attr(&self.targets[candidate.target].url));
                html.push_str("\" class=\"keyword-link\">");
                html.push_str(matched);
                html.push_str("</a>");
                linked.push(candidate.target);
            } else {
                html.push_str(matched);
            }
            pos = end;
            copied_to = end;
        }
        html.push_str(&text[copied_to..]);

        (html, linked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tagging::dictionary::DictionaryEntry;
    use proptest::prelude::*;

    fn dictionary() -> KeywordDictionary {
        KeywordDictionary::from_entries([
            DictionaryEntry::new("Schur functions", "https://example.org/schur")
                .with_tag("schur")
                .with_variants(["Schur function"]),
            DictionaryEntry::new("Macdonald polynomials", "https://example.org/mac?a=1&b=2")
                .with_tag("macdonald"),
            DictionaryEntry::new("polynomials", "https://example.org/poly"),
            DictionaryEntry::new("LLT", "https://example.org/llt").with_tag("llt"),
        ])
        .unwrap()
    }

    #[test]
    fn test_first_occurrence_only() {
        let linker = Linkifier::new(&dictionary());
        let out = linker.linkify("Schur functions are related to Schur function theory");
        assert_eq!(
            out.html,
            "<a href=\"https://example.org/schur\" class=\"keyword-link\">Schur functions</a> \
             are related to Schur function theory"
        );
        assert_eq!(out.terms, vec!["Schur functions"]);
    }

    #[test]
    fn test_longest_match_wins() {
        let linker = Linkifier::new(&dictionary());
        let out = linker.linkify("On Macdonald polynomials.");
        assert_eq!(
            out.html,
            "On <a href=\"https://example.org/mac?a=1&amp;b=2\" class=\"keyword-link\">\
             Macdonald polynomials</a>."
        );
        assert_eq!(out.terms, vec!["Macdonald polynomials"]);
    }

    #[test]
    fn test_shorter_term_linked_elsewhere() {
        let linker = Linkifier::new(&dictionary());
        let out = linker.linkify("Macdonald polynomials and other polynomials");
        assert_eq!(out.terms, vec!["Macdonald polynomials", "polynomials"]);
        assert_eq!(out.html.matches("keyword-link").count(), 2);
    }

    #[test]
    fn test_word_boundaries() {
        let linker = Linkifier::new(&dictionary());
        assert!(linker.linkify("LLTs and xLLT and LLT_2").terms.is_empty());
        assert_eq!(linker.linkify("(LLT)").terms, vec!["LLT"]);
    }

    #[test]
    fn test_case_sensitive() {
        let linker = Linkifier::new(&dictionary());
        assert!(linker.linkify("schur functions").terms.is_empty());
    }

    #[test]
    fn test_empty_and_unmatched_text_unchanged() {
        let linker = Linkifier::new(&dictionary());
        assert_eq!(linker.linkify("").html, "");
        let text = "Nothing  here,\n  <b>at</b> all — é";
        assert_eq!(linker.linkify(text).html, text);
    }

    #[test]
    fn test_tags_for_skips_untagged_entries() {
        let linker = Linkifier::new(&dictionary());
        let tags = linker.tags_for("LLT polynomials, Schur functions and Macdonald polynomials");
        assert_eq!(tags, vec!["llt", "schur", "macdonald"]);
    }

    #[test]
    fn test_tags_for_shared_tag_reported_once() {
        let dict = KeywordDictionary::from_entries([
            DictionaryEntry::new("Dyck paths", "u1").with_tag("lattice-paths"),
            DictionaryEntry::new("Motzkin paths", "u2").with_tag("lattice-paths"),
            DictionaryEntry::new("tableaux", "u3"),
        ])
        .unwrap();
        let linker = Linkifier::new(&dict);
        let text = "Motzkin paths, tableaux and Dyck paths";
        assert_eq!(linker.tags_for(text), vec!["lattice-paths"]);
        assert_eq!(linker.linkify(text).terms, vec!["Motzkin paths", "tableaux", "Dyck paths"]);
    }

    fn strip_links(html: &str) -> String {
        let mut out = String::new();
        let mut rest = html;
        while let Some(start) = rest.find("<a href=\"") {
            out.push_str(&rest[..start]);
            let after_open = &rest[start..];
            let Some(close) = after_open.find('>') else { break };
            let inner = &after_open[close + 1..];
            let Some(end) = inner.find("</a>") else { break };
            out.push_str(&inner[..end]);
            rest = &inner[end + 4..];
        }
        out.push_str(rest);
        out
    }

    proptest! {
        #[test]
        fn prop_text_preserved_outside_links(text in "[A-Za-z ,.()\n]{0,120}") {
            let linker = Linkifier::new(&dictionary());
            let out = linker.linkify(&text);
            prop_assert_eq!(strip_links(&out.html), text);
        }

        #[test]
        fn prop_each_term_linked_at_most_once(words in proptest::collection::vec(
            prop_oneof![
                Just("Schur functions"),
                Just("Schur function"),
                Just("polynomials"),
                Just("Macdonald polynomials"),
                Just("and"),
            ],
            0..12,
        )) {
            let linker = Linkifier::new(&dictionary());
            let out = linker.linkify(&words.join(" "));
            let mut seen = out.terms.clone();
            seen.sort();
            seen.dedup();
            prop_assert_eq!(seen.len(), out.terms.len());
            prop_assert_eq!(out.html.matches("<a ").count(), out.terms.len());
        }
    }
}
