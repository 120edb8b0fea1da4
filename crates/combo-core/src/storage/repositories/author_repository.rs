use rusqlite::{Connection, OptionalExtension, params};

use crate::error::Result;
use crate::models::{Author, Page, Paper, page_offset};
use crate::storage::database::backfill_slugs;

use super::paper_repository::{PAPER_COLUMNS, attach_authors, row_to_paper};

pub trait AuthorRepository {
    /// Resolve an author page key: slug first, then exact name (old-style
    /// links that used the raw name).
    fn find_by_slug_or_name(&self, key: &str) -> Result<Option<Author>>;
    fn papers_by_author(&self, author_id: i64, page: usize, per_page: usize) -> Result<Page<Paper>>;
    /// Every paper by the author, newest first.
    fn all_papers_by_author(&self, author_id: i64) -> Result<Vec<Paper>>;
    fn count(&self) -> Result<usize>;
    fn backfill_slugs(&self) -> Result<usize>;
}

pub struct SqliteAuthorRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteAuthorRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn find_one(&self, sql: &str, key: &str) -> Result<Option<Author>> {
        Ok(self
            .conn
            .query_row(sql, params![key], |row| {
                Ok(Author {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    slug: row.get(2)?,
                })
            })
            .optional()?)
    }
}

impl<'a> AuthorRepository for SqliteAuthorRepository<'a> {
    fn find_by_slug_or_name(&self, key: &str) -> Result<Option<Author>> {
        if let Some(author) = self.find_one("SELECT id, name, slug FROM authors WHERE slug = ?1", key)? {
            return Ok(Some(author));
        }
        self.find_one("SELECT id, name, slug FROM authors WHERE name = ?1", key)
    }

    fn papers_by_author(&self, author_id: i64, page: usize, per_page: usize) -> Result<Page<Paper>> {
        let total: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM paper_authors WHERE author_id = ?1",
            params![author_id],
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {PAPER_COLUMNS}
             FROM papers p
             JOIN paper_authors pa ON p.id = pa.paper_id
             WHERE pa.author_id = ?1
             ORDER BY p.published_date DESC, p.id DESC
             LIMIT ?2 OFFSET ?3"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut items = stmt
            .query_map(
                params![author_id, per_page as i64, page_offset(page, per_page) as i64],
                row_to_paper,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        attach_authors(self.conn, &mut items)?;

        Ok(Page::new(items, total as usize, page.max(1), per_page))
    }

    fn all_papers_by_author(&self, author_id: i64) -> Result<Vec<Paper>> {
        let sql = format!(
            "SELECT {PAPER_COLUMNS}
             FROM papers p
             JOIN paper_authors pa ON p.id = pa.paper_id
             WHERE pa.author_id = ?1
             ORDER BY p.published_date DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut papers = stmt
            .query_map(params![author_id], row_to_paper)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        attach_authors(self.conn, &mut papers)?;
        Ok(papers)
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM authors", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn backfill_slugs(&self) -> Result<usize> {
        backfill_slugs(self.conn)
    }
}
