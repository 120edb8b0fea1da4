use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::error::Result;
use crate::models::TagType;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogueStats {
    pub papers: usize,
    pub authors: usize,
    pub published: usize,
    pub latest_published: Option<DateTime<Utc>>,
    /// Distinct tags per type, in `TagType::ALL` order.
    pub tags: Vec<(TagType, usize)>,
}

pub struct CatalogueStatsQuery<'a> {
    conn: &'a Connection,
}

impl<'a> CatalogueStatsQuery<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn count(&self, sql: &str) -> Result<usize> {
        Ok(self
            .conn
            .query_row(sql, [], |row| row.get::<_, i64>(0).map(|n| n as usize))?)
    }

    pub fn get_stats(&self) -> Result<CatalogueStats> {
        let papers = self.count("SELECT COUNT(*) FROM papers")?;
        let authors = self.count("SELECT COUNT(*) FROM authors")?;
        let published = self.count(
            "SELECT COUNT(*) FROM papers
             WHERE (journal_ref IS NOT NULL AND journal_ref != '')
                OR (doi IS NOT NULL AND doi != '')",
        )?;
        let latest_published: Option<DateTime<Utc>> =
            self.conn
                .query_row("SELECT MAX(published_date) FROM papers", [], |row| row.get(0))?;

        let mut stmt = self
            .conn
            .prepare("SELECT COUNT(*) FROM tags WHERE tag_type = ?1")?;
        let mut tags = Vec::with_capacity(TagType::ALL.len());
        for tag_type in TagType::ALL {
            let n: i64 = stmt.query_row([tag_type.as_str()], |row| row.get(0))?;
            tags.push((tag_type, n as usize));
        }

        Ok(CatalogueStats {
            papers,
            authors,
            published,
            latest_published,
            tags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewPaper;
    use crate::storage::database::run_migrations;
    use crate::storage::repositories::{
        PaperRepository, SqlitePaperRepository, SqliteTagRepository, TagRepository,
    };
    use chrono::TimeZone;

    #[test]
    fn test_stats_on_empty_catalogue() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let stats = CatalogueStatsQuery::new(&conn).get_stats().unwrap();
        assert_eq!(stats.papers, 0);
        assert_eq!(stats.latest_published, None);
        assert!(stats.tags.iter().all(|(_, n)| *n == 0));
    }

    #[test]
    fn test_stats_counts() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let papers = SqlitePaperRepository::new(&conn);
        let latest = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();

        let mut a = NewPaper::new("2405.00001", "A", latest);
        a.authors = vec!["Ann One".into(), "Bo Two".into()];
        a.journal_ref = Some("J. Comb. 1 (2024)".into());
        let id = papers.upsert(&a).unwrap();
        papers
            .upsert(&NewPaper::new(
                "2301.00001",
                "B",
                Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            ))
            .unwrap();
        SqliteTagRepository::new(&conn)
            .add_paper_tag(id, "to-read", TagType::Personal)
            .unwrap();

        let stats = CatalogueStatsQuery::new(&conn).get_stats().unwrap();
        assert_eq!(stats.papers, 2);
        assert_eq!(stats.authors, 2);
        assert_eq!(stats.published, 1);
        assert_eq!(stats.latest_published, Some(latest));
        assert!(stats.tags.contains(&(TagType::Personal, 1)));
    }
}
