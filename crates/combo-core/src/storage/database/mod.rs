mod connection;
mod migrations;
mod schema;

pub use connection::ConnectionPool;
pub use migrations::{Migration, backfill_slugs, get_applied_versions, run_migrations};
pub use schema::SCHEMA_VERSION;

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
pub use rusqlite::Connection;

use crate::error::{ComboError, Result};
use crate::models::{Author, NewPaper, Page, Paper, Tag, TagCount, TagType};

use super::queries::{BrowseQuery, CatalogueStats, CatalogueStatsQuery, PaperSearchQuery};
use super::repositories::{
    AuthorRepository, PaperRepository, Repository, SqliteAuthorRepository,
    SqlitePaperRepository, SqliteTagRepository, TagRepository,
};

pub fn open_database(path: &Path) -> Result<ConnectionPool> {
    let pool = ConnectionPool::open(path)?;
    {
        let conn = pool.get_connection();
        migrations::run_migrations(&conn)?;
    }
    Ok(pool)
}

pub fn open_in_memory() -> Result<ConnectionPool> {
    let pool = ConnectionPool::open_in_memory()?;
    {
        let conn = pool.get_connection();
        migrations::run_migrations(&conn)?;
    }
    Ok(pool)
}

/// The catalogue database. Every method takes the connection lock for its
/// own duration; use [`Database::transaction`] to group several writes.
pub struct Database {
    pool: ConnectionPool,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let pool = open_database(path)?;
        tracing::debug!(path = %path.display(), "opened catalogue database");
        Ok(Self { pool })
    }

    pub fn open_in_memory() -> Result<Self> {
        let pool = open_in_memory()?;
        Ok(Self { pool })
    }

    pub fn path(&self) -> Option<&str> {
        self.pool.path()
    }

    /// Run `f` inside one transaction. It commits when `f` returns `Ok` and
    /// rolls back otherwise.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.pool.get_connection();
        let tx = conn.unchecked_transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Run `f` against the connection without opening a transaction.
    pub fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.pool.get_connection();
        f(&conn)
    }

    // Papers

    pub fn upsert_paper(&self, paper: &NewPaper) -> Result<i64> {
        self.transaction(|conn| SqlitePaperRepository::new(conn).upsert(paper))
    }

    pub fn get_paper(&self, arxiv_id: &str) -> Result<Paper> {
        self.find_paper(arxiv_id)?
            .ok_or_else(|| ComboError::PaperNotFound(arxiv_id.to_string()))
    }

    pub fn find_paper(&self, arxiv_id: &str) -> Result<Option<Paper>> {
        let conn = self.pool.get_connection();
        SqlitePaperRepository::new(&conn).find_by_arxiv_id(arxiv_id)
    }

    pub fn get_paper_by_id(&self, id: i64) -> Result<Paper> {
        let conn = self.pool.get_connection();
        SqlitePaperRepository::new(&conn)
            .find_by_id(&id)?
            .ok_or_else(|| ComboError::PaperNotFound(id.to_string()))
    }

    pub fn delete_paper(&self, arxiv_id: &str) -> Result<()> {
        self.transaction(|conn| {
            let repo = SqlitePaperRepository::new(conn);
            let paper = repo
                .find_by_arxiv_id(arxiv_id)?
                .ok_or_else(|| ComboError::PaperNotFound(arxiv_id.to_string()))?;
            repo.delete(&paper.id)?;
            Ok(())
        })
    }

    pub fn list_recent(&self, page: usize, per_page: usize) -> Result<Page<Paper>> {
        let conn = self.pool.get_connection();
        SqlitePaperRepository::new(&conn).list_recent(page, per_page)
    }

    pub fn count_papers(&self) -> Result<usize> {
        let conn = self.pool.get_connection();
        SqlitePaperRepository::new(&conn).count()
    }

    pub fn list_paper_ids(&self) -> Result<Vec<i64>> {
        let conn = self.pool.get_connection();
        SqlitePaperRepository::new(&conn).list_ids()
    }

    pub fn random_arxiv_id(&self) -> Result<Option<String>> {
        let conn = self.pool.get_connection();
        SqlitePaperRepository::new(&conn).random_arxiv_id()
    }

    pub fn latest_published(&self) -> Result<Option<DateTime<Utc>>> {
        let conn = self.pool.get_connection();
        SqlitePaperRepository::new(&conn).latest_published()
    }

    pub fn paper_texts(&self) -> Result<Vec<(String, String)>> {
        let conn = self.pool.get_connection();
        SqlitePaperRepository::new(&conn).texts()
    }

    pub fn search(&self, query: &str, page: usize, per_page: usize) -> Result<Page<Paper>> {
        let conn = self.pool.get_connection();
        PaperSearchQuery::new(&conn).search(query, page, per_page)
    }

    // Authors

    pub fn find_author(&self, key: &str) -> Result<Author> {
        let conn = self.pool.get_connection();
        SqliteAuthorRepository::new(&conn)
            .find_by_slug_or_name(key)?
            .ok_or_else(|| ComboError::AuthorNotFound(key.to_string()))
    }

    pub fn count_authors(&self) -> Result<usize> {
        let conn = self.pool.get_connection();
        SqliteAuthorRepository::new(&conn).count()
    }

    pub fn papers_by_author(&self, author_id: i64, page: usize, per_page: usize) -> Result<Page<Paper>> {
        let conn = self.pool.get_connection();
        SqliteAuthorRepository::new(&conn).papers_by_author(author_id, page, per_page)
    }

    pub fn all_papers_by_author(&self, author_id: i64) -> Result<Vec<Paper>> {
        let conn = self.pool.get_connection();
        SqliteAuthorRepository::new(&conn).all_papers_by_author(author_id)
    }

    pub fn backfill_author_slugs(&self) -> Result<usize> {
        self.transaction(|conn| SqliteAuthorRepository::new(conn).backfill_slugs())
    }

    // Browsing

    pub fn counts_for_year(&self, year: i32) -> Result<BTreeMap<NaiveDate, u32>> {
        let conn = self.pool.get_connection();
        BrowseQuery::new(&conn).counts_for_year(year)
    }

    pub fn available_years(&self) -> Result<Vec<(i32, u32)>> {
        let conn = self.pool.get_connection();
        BrowseQuery::new(&conn).available_years()
    }

    pub fn papers_on(&self, day: NaiveDate) -> Result<Vec<Paper>> {
        let conn = self.pool.get_connection();
        BrowseQuery::new(&conn).papers_on(day)
    }

    // Tags

    pub fn list_tags(&self, tag_type: Option<TagType>) -> Result<Vec<TagCount>> {
        let conn = self.pool.get_connection();
        SqliteTagRepository::new(&conn).list_with_counts(tag_type)
    }

    pub fn tags_for_paper(&self, paper_id: i64) -> Result<Vec<Tag>> {
        let conn = self.pool.get_connection();
        SqliteTagRepository::new(&conn).tags_for_paper(paper_id)
    }

    /// Attach a tag to the paper with the given arXiv id. Returns `false`
    /// when the paper already carried it.
    pub fn add_tag(&self, arxiv_id: &str, name: &str, tag_type: TagType) -> Result<bool> {
        self.transaction(|conn| {
            let paper = SqlitePaperRepository::new(conn)
                .find_by_arxiv_id(arxiv_id)?
                .ok_or_else(|| ComboError::PaperNotFound(arxiv_id.to_string()))?;
            SqliteTagRepository::new(conn).add_paper_tag(paper.id, name, tag_type)
        })
    }

    pub fn remove_tag(&self, arxiv_id: &str, name: &str, tag_type: TagType) -> Result<bool> {
        self.transaction(|conn| {
            let paper = SqlitePaperRepository::new(conn)
                .find_by_arxiv_id(arxiv_id)?
                .ok_or_else(|| ComboError::PaperNotFound(arxiv_id.to_string()))?;
            SqliteTagRepository::new(conn).remove_paper_tag(paper.id, name, tag_type)
        })
    }

    /// Delete a tag and every association to it.
    pub fn delete_tag(&self, name: &str, tag_type: TagType) -> Result<()> {
        self.transaction(|conn| {
            let repo = SqliteTagRepository::new(conn);
            let tag = repo
                .find(name, tag_type)?
                .ok_or_else(|| ComboError::TagNotFound(format!("{tag_type}:{name}")))?;
            repo.delete(&tag.id)?;
            Ok(())
        })
    }

    pub fn papers_with_tag(
        &self,
        name: &str,
        tag_type: TagType,
        page: usize,
        per_page: usize,
    ) -> Result<Page<Paper>> {
        let conn = self.pool.get_connection();
        SqliteTagRepository::new(&conn).papers_with_tag(name, tag_type, page, per_page)
    }

    pub fn stats(&self) -> Result<CatalogueStats> {
        let conn = self.pool.get_connection();
        CatalogueStatsQuery::new(&conn).get_stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn paper(id: &str) -> NewPaper {
        let mut p = NewPaper::new(id, format!("Title {id}"), Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap());
        p.authors = vec!["Ann Author".into()];
        p
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("combo.db");
        let db = Database::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(db.path().map(str::to_string), Some(path.to_string_lossy().into_owned()));
    }

    #[test]
    fn test_get_paper_ignores_version() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_paper(&paper("2406.01234v2")).unwrap();
        let found = db.get_paper("2406.01234").unwrap();
        assert_eq!(found.arxiv_id, "2406.01234v2");
        assert!(matches!(db.get_paper("2406.99999"), Err(ComboError::PaperNotFound(_))));
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let db = Database::open_in_memory().unwrap();
        let result: Result<()> = db.transaction(|conn| {
            SqlitePaperRepository::new(conn).upsert(&paper("2406.00001"))?;
            Err(ComboError::ValidationError("abort".into()))
        });
        assert!(result.is_err());
        assert_eq!(db.count_papers().unwrap(), 0);
    }

    #[test]
    fn test_tag_round_trip_by_arxiv_id() {
        let db = Database::open_in_memory().unwrap();
        let id = db.upsert_paper(&paper("2406.00002")).unwrap();

        assert!(db.add_tag("2406.00002", "favourites", TagType::Personal).unwrap());
        assert!(!db.add_tag("2406.00002v1", "favourites", TagType::Personal).unwrap());
        assert_eq!(db.tags_for_paper(id).unwrap().len(), 1);

        db.delete_tag("favourites", TagType::Personal).unwrap();
        assert!(db.tags_for_paper(id).unwrap().is_empty());
        assert!(matches!(
            db.delete_tag("favourites", TagType::Personal),
            Err(ComboError::TagNotFound(_))
        ));
    }

    #[test]
    fn test_delete_paper() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_paper(&paper("2406.00003")).unwrap();
        db.delete_paper("2406.00003").unwrap();
        assert_eq!(db.count_papers().unwrap(), 0);
        assert!(db.delete_paper("2406.00003").is_err());
    }

    #[test]
    fn test_find_author_by_slug() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_paper(&paper("2406.00004")).unwrap();
        let author = db.find_author("ann-author").unwrap();
        assert_eq!(db.all_papers_by_author(author.id).unwrap().len(), 1);
        assert!(matches!(db.find_author("zed"), Err(ComboError::AuthorNotFound(_))));
    }
}
