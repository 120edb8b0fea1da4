use chrono::Datelike;
use combo_core::models::Paper;
use combo_core::text::strip_accents;
use once_cell::sync::Lazy;
use regex::Regex;

use super::Citable;

static CAPITAL_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]+").unwrap());

/// Brace capitals so BibTeX styles keep their case. The first character is
/// left alone; acronyms become one group.
///
/// `A formula for Macdonald polynomials using LLT polynomials` becomes
/// `A formula for {M}acdonald polynomials using {LLT} polynomials`.
pub fn protect_capitals(title: &str) -> String {
    let mut chars = title.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let rest = chars.as_str();
    let protected = CAPITAL_RUN.replace_all(rest, "{$0}");
    format!("{first}{protected}")
}

/// `LastnameLastname2024x`: accent-folded alphanumeric last names, the year,
/// and an `x` for preprint entries.
pub fn cite_key(authors: &[String], year: i32, published: bool) -> String {
    let suffix = if published { "" } else { "x" };
    if authors.is_empty() {
        return format!("arxiv{year}{suffix}");
    }
    let last_names: String = authors
        .iter()
        .filter_map(|a| a.split_whitespace().last())
        .flat_map(|last| strip_accents(last).chars().filter(|c| c.is_alphanumeric()).collect::<Vec<_>>())
        .collect();
    format!("{last_names}{year}{suffix}")
}

fn author_field(authors: &[String]) -> String {
    if authors.is_empty() {
        "Unknown".to_string()
    } else {
        authors.join(" and ")
    }
}

fn push_field(bib: &mut String, name: &str, value: &str) {
    bib.push_str(&format!(",\n  {name} = {{{value}}}"));
}

pub fn arxiv_entry(paper: &Paper) -> String {
    let year = paper.published.year();
    let eprint = paper.versionless_id();

    let mut bib = format!("@article{{{}", cite_key(&paper.authors, year, false));
    push_field(&mut bib, "Author", &author_field(&paper.authors));
    push_field(&mut bib, "Title", &protect_capitals(&paper.title));
    push_field(&mut bib, "Year", &year.to_string());
    push_field(&mut bib, "Eprint", eprint);
    push_field(&mut bib, "url", &format!("https://arxiv.org/abs/{eprint}"));
    push_field(&mut bib, "journal", "arXiv e-prints");
    if let Some(journal_ref) = paper.journal_ref.as_deref().filter(|j| !j.is_empty()) {
        push_field(&mut bib, "journalref", journal_ref);
    }
    if let Some(doi) = paper.doi.as_deref().filter(|d| !d.is_empty()) {
        push_field(&mut bib, "doi", doi);
    }
    bib.push_str("\n}");
    bib
}

pub fn published_entry(paper: &Paper, doi: &str) -> String {
    let year = paper.published.year();

    let mut bib = format!("@article{{{}", cite_key(&paper.authors, year, true));
    push_field(&mut bib, "Author", &author_field(&paper.authors));
    push_field(&mut bib, "Title", &protect_capitals(&paper.title));
    push_field(&mut bib, "Year", &year.to_string());
    push_field(&mut bib, "journal", paper.journal_ref.as_deref().unwrap_or(""));
    push_field(&mut bib, "doi", doi);
    push_field(&mut bib, "url", &format!("https://doi.org/{doi}"));
    bib.push_str("\n}");
    bib
}

/// Preprint entries for every paper, each followed by its published entry
/// when there is one.
pub fn author_bibliography(papers: &[Paper]) -> String {
    let mut entries = Vec::with_capacity(papers.len());
    for paper in papers {
        entries.push(paper.to_bibtex());
        entries.extend(paper.to_published_bibtex());
    }
    entries.join("\n\n")
}
