use std::collections::{HashMap, HashSet};
use std::io::Write;

use serde::{Deserialize, Serialize};

use super::text::{is_stopword, tokenize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryOptions {
    /// Minimum number of papers a phrase must appear in.
    pub min_count: usize,
    /// Longest phrase, in words.
    pub max_ngram: usize,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            min_count: 5,
            max_ngram: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordCandidate {
    pub phrase: String,
    pub paper_count: usize,
    pub word_count: usize,
}

/// All n-grams of `tokens` for n in `1..=max_n`, shortest first.
pub fn ngrams(tokens: &[String], max_n: usize) -> Vec<String> {
    let mut out = Vec::new();
    for n in 1..=max_n.min(tokens.len()) {
        out.extend(tokens.windows(n).map(|w| w.join(" ")));
    }
    out
}

/// A phrase is a candidate when none of its words is a single letter or a
/// stopword.
pub fn is_useful(phrase: &str) -> bool {
    phrase
        .split_whitespace()
        .all(|w| w.chars().count() > 1 && !is_stopword(w))
}

/// Rank phrases by the number of documents they appear in. Each document
/// counts at most once per phrase.
pub fn discover<I, S>(documents: I, options: &DiscoveryOptions) -> Vec<KeywordCandidate>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut documents_seen = 0usize;

    for document in documents {
        documents_seen += 1;
        let tokens = tokenize(document.as_ref());
        let unique: HashSet<String> = ngrams(&tokens, options.max_ngram)
            .into_iter()
            .filter(|p| is_useful(p))
            .collect();
        for phrase in unique {
            *counts.entry(phrase).or_default() += 1;
        }
    }

    let mut candidates: Vec<KeywordCandidate> = counts
        .into_iter()
        .filter(|(_, n)| *n >= options.min_count)
        .map(|(phrase, paper_count)| KeywordCandidate {
            word_count: phrase.split_whitespace().count(),
            phrase,
            paper_count,
        })
        .collect();
    candidates.sort_by(|a, b| {
        b.paper_count
            .cmp(&a.paper_count)
            .then_with(|| a.phrase.cmp(&b.phrase))
    });

    tracing::info!(
        documents = documents_seen,
        candidates = candidates.len(),
        min_count = options.min_count,
        "keyword discovery finished"
    );
    candidates
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Write `phrase,paper_count,word_count` rows with a header line.
pub fn write_csv<W: Write>(mut writer: W, candidates: &[KeywordCandidate]) -> std::io::Result<()> {
    writeln!(writer, "phrase,paper_count,word_count")?;
    for c in candidates {
        writeln!(writer, "{},{},{}", csv_field(&c.phrase), c.paper_count, c.word_count)?;
    }
    writer.flush()
}
