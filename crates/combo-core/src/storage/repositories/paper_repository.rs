use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};

use crate::error::Result;
use crate::models::{NewPaper, Page, Paper, page_offset, strip_version};
use crate::text::slugify;

use super::Repository;

/// Column list shared by every query that materialises a [`Paper`].
/// Must stay in sync with [`row_to_paper`].
pub(crate) const PAPER_COLUMNS: &str = "p.id, p.arxiv_id, p.title, p.abstract, p.published_date,
     p.updated_date, p.comment, p.journal_ref, p.doi, p.primary_category, p.categories";

/// Build a [`Paper`] from a row selected with [`PAPER_COLUMNS`]. Authors are
/// filled in afterwards by [`attach_authors`].
pub(crate) fn row_to_paper(row: &rusqlite::Row) -> rusqlite::Result<Paper> {
    let categories_str: String = row.get(10)?;
    Ok(Paper {
        id: row.get(0)?,
        arxiv_id: row.get(1)?,
        title: row.get(2)?,
        abstract_text: row.get(3)?,
        authors: Vec::new(),
        published: row.get(4)?,
        updated: row.get(5)?,
        comment: row.get(6)?,
        journal_ref: row.get(7)?,
        doi: row.get(8)?,
        primary_category: row.get(9)?,
        categories: serde_json::from_str(&categories_str).unwrap_or_default(),
    })
}

/// Attach ordered author names to a batch of papers with a single query.
pub(crate) fn attach_authors(conn: &Connection, papers: &mut [Paper]) -> Result<()> {
    if papers.is_empty() {
        return Ok(());
    }

    let placeholders = vec!["?"; papers.len()].join(",");
    let sql = format!(
        "SELECT pa.paper_id, a.name
         FROM authors a
         JOIN paper_authors pa ON a.id = pa.author_id
         WHERE pa.paper_id IN ({placeholders})
         ORDER BY pa.paper_id, pa.author_order"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(papers.iter().map(|p| p.id)), |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut by_paper: HashMap<i64, Vec<String>> = HashMap::new();
    for row in rows {
        let (paper_id, name) = row?;
        by_paper.entry(paper_id).or_default().push(name);
    }

    for paper in papers.iter_mut() {
        paper.authors = by_paper.remove(&paper.id).unwrap_or_default();
    }
    Ok(())
}

pub trait PaperRepository: Repository<Entity = Paper, Id = i64> {
    /// Insert or update a paper keyed on its version-less arXiv id, rewriting
    /// its author list and full-text row. Returns the paper's row id.
    fn upsert(&self, paper: &NewPaper) -> Result<i64>;
    /// Look a paper up by arXiv id, with or without a version suffix.
    fn find_by_arxiv_id(&self, arxiv_id: &str) -> Result<Option<Paper>>;
    fn list_recent(&self, page: usize, per_page: usize) -> Result<Page<Paper>>;
    fn count(&self) -> Result<usize>;
    fn list_ids(&self) -> Result<Vec<i64>>;
    fn random_arxiv_id(&self) -> Result<Option<String>>;
    fn latest_published(&self) -> Result<Option<DateTime<Utc>>>;
    /// `(title, abstract)` of every paper, for offline text analysis.
    fn texts(&self) -> Result<Vec<(String, String)>>;
}

pub struct SqlitePaperRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqlitePaperRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn replace_authors(&self, paper_id: i64, authors: &[String]) -> Result<()> {
        self.conn
            .execute("DELETE FROM paper_authors WHERE paper_id = ?1", params![paper_id])?;

        let mut insert_author = self.conn.prepare_cached(
            "INSERT INTO authors(name, slug) VALUES (?1, ?2) ON CONFLICT(name) DO NOTHING",
        )?;
        let mut author_id = self
            .conn
            .prepare_cached("SELECT id FROM authors WHERE name = ?1")?;
        let mut link = self.conn.prepare_cached(
            "INSERT OR IGNORE INTO paper_authors(paper_id, author_id, author_order)
             VALUES (?1, ?2, ?3)",
        )?;

        let names = authors.iter().map(|a| a.trim()).filter(|a| !a.is_empty());
        for (order, name) in names.enumerate() {
            insert_author.execute(params![name, slugify(name)])?;
            let id: i64 = author_id.query_row(params![name], |row| row.get(0))?;
            link.execute(params![paper_id, id, order as i64])?;
        }
        Ok(())
    }

    fn replace_fts_row(&self, paper_id: i64, paper: &NewPaper) -> Result<()> {
        self.conn
            .execute("DELETE FROM papers_fts WHERE rowid = ?1", params![paper_id])?;
        self.conn.execute(
            "INSERT INTO papers_fts(rowid, title, abstract) VALUES (?1, ?2, ?3)",
            params![paper_id, paper.title, paper.abstract_text],
        )?;
        Ok(())
    }

    fn query_papers(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Paper>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut papers = stmt
            .query_map(params, row_to_paper)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        attach_authors(self.conn, &mut papers)?;
        Ok(papers)
    }
}

impl<'a> Repository for SqlitePaperRepository<'a> {
    type Entity = Paper;
    type Id = i64;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>> {
        let sql = format!("SELECT {PAPER_COLUMNS} FROM papers p WHERE p.id = ?1");
        Ok(self.query_papers(&sql, params![id])?.into_iter().next())
    }

    fn delete(&self, id: &Self::Id) -> Result<bool> {
        self.conn
            .execute("DELETE FROM papers_fts WHERE rowid = ?1", params![id])?;
        let deleted = self.conn.execute("DELETE FROM papers WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}

impl<'a> PaperRepository for SqlitePaperRepository<'a> {
    fn upsert(&self, paper: &NewPaper) -> Result<i64> {
        let base_id = strip_version(paper.arxiv_id.trim());
        let categories = serde_json::to_string(&paper.categories)?;
        let updated = paper.updated.unwrap_or(paper.published);

        self.conn.execute(
            "INSERT INTO papers
                (arxiv_id, arxiv_base_id, title, abstract, published_date, updated_date,
                 comment, journal_ref, doi, primary_category, categories)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(arxiv_base_id) DO UPDATE SET
                arxiv_id         = excluded.arxiv_id,
                title            = excluded.title,
                abstract         = excluded.abstract,
                published_date   = excluded.published_date,
                updated_date     = excluded.updated_date,
                comment          = excluded.comment,
                journal_ref      = excluded.journal_ref,
                doi              = excluded.doi,
                primary_category = excluded.primary_category,
                categories       = excluded.categories",
            params![
                paper.arxiv_id.trim(),
                base_id,
                paper.title,
                paper.abstract_text,
                paper.published,
                updated,
                paper.comment,
                paper.journal_ref,
                paper.doi,
                paper.primary_category,
                categories,
            ],
        )?;

        let id: i64 = self.conn.query_row(
            "SELECT id FROM papers WHERE arxiv_base_id = ?1",
            params![base_id],
            |row| row.get(0),
        )?;

        self.replace_authors(id, &paper.authors)?;
        self.replace_fts_row(id, paper)?;
        Ok(id)
    }

    fn find_by_arxiv_id(&self, arxiv_id: &str) -> Result<Option<Paper>> {
        let sql = format!("SELECT {PAPER_COLUMNS} FROM papers p WHERE p.arxiv_base_id = ?1");
        let base_id = strip_version(arxiv_id.trim());
        Ok(self.query_papers(&sql, params![base_id])?.into_iter().next())
    }

    fn list_recent(&self, page: usize, per_page: usize) -> Result<Page<Paper>> {
        let total = self.count()?;
        let sql = format!(
            "SELECT {PAPER_COLUMNS} FROM papers p
             ORDER BY p.published_date DESC, p.id DESC
             LIMIT ?1 OFFSET ?2"
        );
        let items = self.query_papers(
            &sql,
            params![per_page as i64, page_offset(page, per_page) as i64],
        )?;
        Ok(Page::new(items, total, page.max(1), per_page))
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM papers", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn list_ids(&self) -> Result<Vec<i64>> {
        let mut stmt = self.conn.prepare("SELECT id FROM papers ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn random_arxiv_id(&self) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT arxiv_id FROM papers ORDER BY RANDOM() LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn latest_published(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .conn
            .query_row("SELECT MAX(published_date) FROM papers", [], |row| row.get(0))?)
    }

    fn texts(&self) -> Result<Vec<(String, String)>> {
        let mut stmt = self.conn.prepare("SELECT title, abstract FROM papers ORDER BY id")?;
        let texts = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(texts)
    }
}
