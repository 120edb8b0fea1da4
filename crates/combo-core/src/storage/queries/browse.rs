use std::collections::BTreeMap;

use chrono::NaiveDate;
use rusqlite::{Connection, params};

use crate::error::Result;
use crate::models::Paper;
use crate::storage::repositories::{PAPER_COLUMNS, attach_authors, row_to_paper};

/// Date-based browsing: per-day counts for a calendar year and the papers
/// published on one day.
pub struct BrowseQuery<'a> {
    conn: &'a Connection,
}

impl<'a> BrowseQuery<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn counts_for_year(&self, year: i32) -> Result<BTreeMap<NaiveDate, u32>> {
        let mut stmt = self.conn.prepare(
            "SELECT date(published_date) AS day, COUNT(*)
             FROM papers
             WHERE strftime('%Y', published_date) = ?1
             GROUP BY day",
        )?;
        let rows = stmt.query_map(params![format!("{year:04}")], |row| {
            Ok((row.get::<_, NaiveDate>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut counts = BTreeMap::new();
        for row in rows {
            let (day, count) = row?;
            counts.insert(day, count as u32);
        }
        Ok(counts)
    }

    /// `(year, paper_count)` pairs, newest year first.
    pub fn available_years(&self) -> Result<Vec<(i32, u32)>> {
        let mut stmt = self.conn.prepare(
            "SELECT CAST(strftime('%Y', published_date) AS INTEGER) AS year, COUNT(*)
             FROM papers
             GROUP BY year
             ORDER BY year DESC",
        )?;
        let years = stmt
            .query_map([], |row| Ok((row.get::<_, i32>(0)?, row.get::<_, i64>(1)? as u32)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(years)
    }

    pub fn papers_on(&self, day: NaiveDate) -> Result<Vec<Paper>> {
        let sql = format!(
            "SELECT {PAPER_COLUMNS} FROM papers p
             WHERE date(p.published_date) = ?1
             ORDER BY p.id DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut papers = stmt
            .query_map(params![day], row_to_paper)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        attach_authors(self.conn, &mut papers)?;
        Ok(papers)
    }
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
        let dates = [(2023, 12, 31), (2024, 1, 2), (2024, 1, 2), (2024, 3, 5)];
        for (i, (y, m, d)) in dates.into_iter().enumerate() {
            repo.upsert(&NewPaper::new(
                format!("2401.1000{i}"),
                format!("P{i}"),
                Utc.with_ymd_and_hms(y, m, d, 20, 30, 0).unwrap(),
            ))
            .unwrap();
        }
        conn
    }

    #[test]
    fn test_counts_for_year() {
        let conn = seeded();
        let counts = BrowseQuery::new(&conn).counts_for_year(2024).unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[&NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()], 2);
        assert_eq!(counts[&NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()], 1);
    }

    #[test]
    fn test_available_years_newest_first() {
        let conn = seeded();
        let years = BrowseQuery::new(&conn).available_years().unwrap();
        assert_eq!(years, vec![(2024, 3), (2023, 1)]);
    }

    #[test]
    fn test_papers_on_day() {
        let conn = seeded();
        let papers = BrowseQuery::new(&conn)
            .papers_on(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
            .unwrap();
        let ids: Vec<_> = papers.iter().map(|p| p.arxiv_id.as_str()).collect();
        assert_eq!(ids, vec!["2401.10002", "2401.10001"]);
    }
}
