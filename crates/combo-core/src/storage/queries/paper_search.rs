use rusqlite::{Connection, params};

use crate::error::Result;
use crate::models::{Page, Paper, page_offset};
use crate::storage::repositories::{PAPER_COLUMNS, attach_authors, row_to_paper};

/// Words shorter than this fall below the full-text tokenizer's usefulness
/// and switch the whole query to substring matching.
const MIN_FTS_WORD_LEN: usize = 3;

pub struct PaperSearchQuery<'a> {
    conn: &'a Connection,
}

impl<'a> PaperSearchQuery<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Search titles and abstracts (all words required) plus author names.
    pub fn search(&self, query: &str, page: usize, per_page: usize) -> Result<Page<Paper>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Page::empty(per_page));
        }

        let author_pattern = like_pattern(query);
        let offset = page_offset(page, per_page) as i64;

        let (total, items) = match fts_expression(query) {
            Some(fts) => {
                let filter = "p.id IN (SELECT rowid FROM papers_fts WHERE papers_fts MATCH ?1)
                              OR a.name LIKE ?2 ESCAPE '\\'";
                let total = self.count(filter, params![fts, author_pattern])?;
                let items = self.select(
                    filter,
                    params![fts, author_pattern, per_page as i64, offset],
                    3,
                )?;
                (total, items)
            }
            None => {
                let filter = "p.title LIKE ?1 ESCAPE '\\'
                              OR p.abstract LIKE ?1 ESCAPE '\\'
                              OR a.name LIKE ?1 ESCAPE '\\'";
                let total = self.count(filter, params![author_pattern])?;
                let items = self.select(filter, params![author_pattern, per_page as i64, offset], 2)?;
                (total, items)
            }
        };

        Ok(Page::new(items, total, page.max(1), per_page))
    }

    fn count(&self, filter: &str, params: impl rusqlite::Params) -> Result<usize> {
        let sql = format!(
            "SELECT COUNT(DISTINCT p.id)
             FROM papers p
             LEFT JOIN paper_authors pa ON p.id = pa.paper_id
             LEFT JOIN authors a ON pa.author_id = a.id
             WHERE {filter}"
        );
        let total: i64 = self.conn.query_row(&sql, params, |row| row.get(0))?;
        Ok(total as usize)
    }

    /// `limit_param` is the index of the LIMIT placeholder; OFFSET follows it.
    fn select(&self, filter: &str, params: impl rusqlite::Params, limit_param: usize) -> Result<Vec<Paper>> {
        let offset_param = limit_param + 1;
        let sql = format!(
            "SELECT DISTINCT {PAPER_COLUMNS}
             FROM papers p
             LEFT JOIN paper_authors pa ON p.id = pa.paper_id
             LEFT JOIN authors a ON pa.author_id = a.id
             WHERE {filter}
             ORDER BY p.published_date DESC, p.id DESC
             LIMIT ?{limit_param} OFFSET ?{offset_param}"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut papers = stmt
            .query_map(params, row_to_paper)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        attach_authors(self.conn, &mut papers)?;
        Ok(papers)
    }
}

/// FTS5 expression requiring every word, or `None` when any word is too
/// short for the full-text index.
pub fn fts_expression(query: &str) -> Option<String> {
    let words: Vec<&str> = query.split_whitespace().collect();
    if words.is_empty() || words.iter().any(|w| w.chars().count() < MIN_FTS_WORD_LEN) {
        return None;
    }
    Some(
        words
            .iter()
            .map(|w| format!("\"{}\"", w.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(" "),
    )
}

/// `%query%` with LIKE wildcards in the query escaped.
pub fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewPaper;
    use crate::storage::database::run_migrations;
    use crate::storage::repositories::{PaperRepository, SqlitePaperRepository};
    use chrono::{TimeZone, Utc};

    fn seeded() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let repo = SqlitePaperRepository::new(&conn);

        let mut a = NewPaper::new(
            "2404.00001",
            "Macdonald polynomials and LLT positivity",
            Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap(),
        );
        a.abstract_text = "We study Macdonald polynomials via LLT polynomials.".into();
        a.authors = vec!["Jim Haglund".into()];
        repo.upsert(&a).unwrap();

        let mut b = NewPaper::new(
            "2404.00002",
            "Pattern avoidance in permutations",
            Utc.with_ymd_and_hms(2024, 4, 2, 0, 0, 0).unwrap(),
        );
        b.abstract_text = "Counting 132-avoiding permutations by q-analogues.".into();
        b.authors = vec!["Sergey Kitaev".into()];
        repo.upsert(&b).unwrap();
        conn
    }

    #[test]
    fn test_fts_expression() {
        assert_eq!(fts_expression("Schur functions").as_deref(), Some("\"Schur\" \"functions\""));
        assert_eq!(fts_expression("q analog"), None);
        assert_eq!(fts_expression("   "), None);
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_x"), "%50\\%\\_x%");
    }

    #[test]
    fn test_fulltext_search_requires_all_words() {
        let conn = seeded();
        let search = PaperSearchQuery::new(&conn);

        let hits = search.search("Macdonald positivity", 1, 20).unwrap();
        assert_eq!(hits.total, 1);
        assert_eq!(hits.items[0].arxiv_id, "2404.00001");

        let none = search.search("Macdonald permutations", 1, 20).unwrap();
        assert_eq!(none.total, 0);
    }

    #[test]
    fn test_short_words_fall_back_to_like() {
        let conn = seeded();
        let hits = PaperSearchQuery::new(&conn).search("by q-analogues", 1, 20).unwrap();
        assert_eq!(hits.total, 1);
        assert_eq!(hits.items[0].arxiv_id, "2404.00002");
    }

    #[test]
    fn test_author_names_match() {
        let conn = seeded();
        let hits = PaperSearchQuery::new(&conn).search("Kitaev", 1, 20).unwrap();
        assert_eq!(hits.total, 1);
        assert_eq!(hits.items[0].authors, vec!["Sergey Kitaev"]);
    }

    #[test]
    fn test_empty_query_is_empty_page() {
        let conn = seeded();
        let hits = PaperSearchQuery::new(&conn).search("  ", 1, 20).unwrap();
        assert!(hits.items.is_empty());
        assert_eq!(hits.total, 0);
    }
}
