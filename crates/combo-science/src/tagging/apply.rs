use combo_core::{
    ComboError, Connection, Database, NewPaper, PaperRepository, Repository,
    SqlitePaperRepository, SqliteTagRepository, TagRepository, TagType,
};
use serde::Serialize;

use crate::error::Result;

use super::derive::{DEFAULT_EXCLUDED_CATEGORY, DerivedTags, derive_tags_excluding};
use super::linkify::Linkifier;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestOutcome {
    pub paper_id: i64,
    pub arxiv_tags: usize,
    pub msc_tags: usize,
    /// Keyword tags newly attached from the abstract.
    pub keyword_tags: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BackfillReport {
    pub processed: usize,
    pub failed: usize,
    pub failures: Vec<(i64, String)>,
}

/// Keeps a paper's `arxiv` and `msc` tags in step with its metadata.
///
/// Every write goes through one transaction per paper: the derived tag set
/// is either fully replaced or left as it was. `personal` and `other` tags
/// are never removed.
pub struct TagApplier {
    excluded_categories: Vec<String>,
    linkifier: Option<Linkifier>,
}

impl Default for TagApplier {
    fn default() -> Self {
        Self {
            excluded_categories: vec![DEFAULT_EXCLUDED_CATEGORY.to_string()],
            linkifier: None,
        }
    }
}

impl TagApplier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_excluded_categories(mut self, excluded: Vec<String>) -> Self {
        self.excluded_categories = excluded;
        self
    }

    /// Also attach the dictionary tags of keywords found in each abstract.
    pub fn with_linkifier(mut self, linkifier: Linkifier) -> Self {
        self.linkifier = Some(linkifier);
        self
    }

    pub fn derive(&self, categories: &[String], comment: Option<&str>) -> DerivedTags {
        derive_tags_excluding(categories, comment, &self.excluded_categories)
    }

    /// Upsert `paper` and rebuild its derived tags in one transaction.
    pub fn ingest(&self, db: &Database, paper: &NewPaper) -> Result<IngestOutcome> {
        let outcome = db.transaction(|conn| {
            let paper_id = SqlitePaperRepository::new(conn).upsert(paper)?;
            self.apply(conn, paper_id, &paper.categories, paper.comment.as_deref(), &paper.abstract_text)
        })?;
        tracing::debug!(
            arxiv_id = %paper.arxiv_id,
            arxiv = outcome.arxiv_tags,
            msc = outcome.msc_tags,
            keywords = outcome.keyword_tags,
            "ingested paper"
        );
        Ok(outcome)
    }

    /// Recompute derived tags for a stored paper.
    pub fn retag(&self, db: &Database, paper_id: i64) -> Result<IngestOutcome> {
        Ok(db.transaction(|conn| self.retag_in(conn, paper_id))?)
    }

    fn retag_in(&self, conn: &Connection, paper_id: i64) -> combo_core::Result<IngestOutcome> {
        let paper = SqlitePaperRepository::new(conn)
            .find_by_id(&paper_id)?
            .ok_or_else(|| ComboError::PaperNotFound(paper_id.to_string()))?;
        self.apply(conn, paper.id, &paper.categories, paper.comment.as_deref(), &paper.abstract_text)
    }

    fn apply(
        &self,
        conn: &Connection,
        paper_id: i64,
        categories: &[String],
        comment: Option<&str>,
        abstract_text: &str,
    ) -> combo_core::Result<IngestOutcome> {
        let derived = self.derive(categories, comment);
        let tags = SqliteTagRepository::new(conn);
        tags.replace_derived_tags(paper_id, &derived.to_pairs())?;

        let mut keyword_tags = 0;
        if let Some(linkifier) = &self.linkifier {
            for tag in linkifier.tags_for(abstract_text) {
                if tags.add_paper_tag(paper_id, &tag, TagType::Other)? {
                    keyword_tags += 1;
                }
            }
        }

        Ok(IngestOutcome {
            paper_id,
            arxiv_tags: derived.arxiv.len(),
            msc_tags: derived.msc.len(),
            keyword_tags,
        })
    }

    /// Retag every stored paper, one transaction each. A failing paper is
    /// logged and counted; papers already processed keep their new tags.
    pub fn backfill(&self, db: &Database) -> Result<BackfillReport> {
        let ids = db.list_paper_ids()?;
        let mut report = BackfillReport::default();

        for id in ids {
            match db.transaction(|conn| self.retag_in(conn, id)) {
                Ok(_) => report.processed += 1,
                Err(e) => {
                    tracing::warn!(paper_id = id, "skipping paper during tag backfill: {e}");
                    report.failed += 1;
                    report.failures.push((id, e.to_string()));
                }
            }
        }

        tracing::info!(
            processed = report.processed,
            failed = report.failed,
            "tag backfill finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tagging::dictionary::{DictionaryEntry, KeywordDictionary};
    use chrono::{TimeZone, Utc};

    fn paper() -> NewPaper {
        let mut p = NewPaper::new(
            "2405.01234v1",
            "LLT polynomials",
            Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap(),
        );
        p.categories = vec!["math.CO".into(), "math.RT".into()];
        p.comment = Some("Primary 05E05; Secondary 05A19".into());
        p.abstract_text = "We study LLT polynomials and Schur functions.".into();
        p
    }

    fn names(db: &Database, paper_id: i64) -> Vec<(String, TagType)> {
        db.tags_for_paper(paper_id)
            .unwrap()
            .into_iter()
            .map(|t| (t.name, t.tag_type))
            .collect()
    }

    #[test]
    fn test_ingest_applies_derived_tags() {
        let db = Database::open_in_memory().unwrap();
        let outcome = TagApplier::new().ingest(&db, &paper()).unwrap();
        assert_eq!(outcome.arxiv_tags, 1);
        assert_eq!(outcome.msc_tags, 2);
        assert_eq!(
            names(&db, outcome.paper_id),
            vec![
                ("math.RT".to_string(), TagType::Arxiv),
                ("05A19".to_string(), TagType::Msc),
                ("05E05".to_string(), TagType::Msc),
            ]
        );
    }

    #[test]
    fn test_changed_comment_replaces_msc_tags() {
        let db = Database::open_in_memory().unwrap();
        let applier = TagApplier::new();
        let first = applier.ingest(&db, &paper()).unwrap();

        let mut revised = paper();
        revised.arxiv_id = "2405.01234v2".into();
        revised.comment = Some("MSC 05E10".into());
        revised.categories = vec!["math.CO".into()];
        let second = applier.ingest(&db, &revised).unwrap();

        assert_eq!(first.paper_id, second.paper_id);
        assert_eq!(names(&db, second.paper_id), vec![("05E10".to_string(), TagType::Msc)]);
    }

    #[test]
    fn test_keyword_tags_attached_as_other() {
        let dict = KeywordDictionary::from_entries([
            DictionaryEntry::new("LLT polynomials", "https://example.org/llt").with_tag("llt"),
            DictionaryEntry::new("Schur functions", "https://example.org/schur"),
        ])
        .unwrap();
        let db = Database::open_in_memory().unwrap();
        let applier = TagApplier::new().with_linkifier(Linkifier::new(&dict));

        let outcome = applier.ingest(&db, &paper()).unwrap();
        assert_eq!(outcome.keyword_tags, 1);
        assert!(names(&db, outcome.paper_id).contains(&("llt".to_string(), TagType::Other)));

        let again = applier.ingest(&db, &paper()).unwrap();
        assert_eq!(again.keyword_tags, 0);
        assert!(names(&db, outcome.paper_id).contains(&("llt".to_string(), TagType::Other)));
    }

    #[test]
    fn test_retag_missing_paper() {
        let db = Database::open_in_memory().unwrap();
        let err = TagApplier::new().retag(&db, 42).unwrap_err();
        assert!(matches!(err, crate::ScienceError::Core(ComboError::PaperNotFound(_))));
    }
}
