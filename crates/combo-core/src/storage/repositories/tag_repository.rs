use std::str::FromStr;

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{ComboError, Result};
use crate::models::{Page, Paper, Tag, TagCount, TagType, page_offset};

use super::Repository;
use super::paper_repository::{PAPER_COLUMNS, attach_authors, row_to_paper};

pub trait TagRepository: Repository<Entity = Tag, Id = i64> {
    /// Idempotent upsert keyed on `(name, tag_type)`.
    fn get_or_create(&self, name: &str, tag_type: TagType) -> Result<Tag>;
    fn find(&self, name: &str, tag_type: TagType) -> Result<Option<Tag>>;
    /// Replace every `arxiv` / `msc` association of a paper with `tags`.
    /// All-or-nothing; other tag types are left alone.
    fn replace_derived_tags(&self, paper_id: i64, tags: &[(String, TagType)]) -> Result<()>;
    /// Returns `true` when the association did not exist before.
    fn add_paper_tag(&self, paper_id: i64, name: &str, tag_type: TagType) -> Result<bool>;
    fn remove_paper_tag(&self, paper_id: i64, name: &str, tag_type: TagType) -> Result<bool>;
    fn tags_for_paper(&self, paper_id: i64) -> Result<Vec<Tag>>;
    fn list_with_counts(&self, tag_type: Option<TagType>) -> Result<Vec<TagCount>>;
    fn papers_with_tag(
        &self,
        name: &str,
        tag_type: TagType,
        page: usize,
        per_page: usize,
    ) -> Result<Page<Paper>>;
}

pub struct SqliteTagRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteTagRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn row_to_tag(row: &rusqlite::Row) -> rusqlite::Result<Tag> {
        let type_str: String = row.get(2)?;
        let tag_type = TagType::from_str(&type_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, e.into())
        })?;
        Ok(Tag {
            id: row.get(0)?,
            name: row.get(1)?,
            tag_type,
        })
    }

    fn replace_derived_inner(&self, paper_id: i64, tags: &[(String, TagType)]) -> Result<()> {
        self.conn.execute(
            "DELETE FROM paper_tags
             WHERE paper_id = ?1
               AND tag_id IN (SELECT id FROM tags WHERE tag_type IN ('arxiv', 'msc'))",
            params![paper_id],
        )?;

        for (name, tag_type) in tags {
            let tag = self.get_or_create(name, *tag_type)?;
            self.conn.execute(
                "INSERT OR IGNORE INTO paper_tags(paper_id, tag_id) VALUES (?1, ?2)",
                params![paper_id, tag.id],
            )?;
        }
        Ok(())
    }
}

impl<'a> Repository for SqliteTagRepository<'a> {
    type Entity = Tag;
    type Id = i64;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, tag_type FROM tags WHERE id = ?1",
                params![id],
                Self::row_to_tag,
            )
            .optional()?)
    }

    fn delete(&self, id: &Self::Id) -> Result<bool> {
        let deleted = self.conn.execute("DELETE FROM tags WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}

impl<'a> TagRepository for SqliteTagRepository<'a> {
    fn get_or_create(&self, name: &str, tag_type: TagType) -> Result<Tag> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ComboError::ValidationError("tag name must not be empty".into()));
        }

        self.conn.execute(
            "INSERT INTO tags(name, tag_type) VALUES (?1, ?2)
             ON CONFLICT(name, tag_type) DO NOTHING",
            params![name, tag_type.as_str()],
        )?;
        self.find(name, tag_type)?
            .ok_or_else(|| ComboError::TagNotFound(format!("{tag_type}:{name}")))
    }

    fn find(&self, name: &str, tag_type: TagType) -> Result<Option<Tag>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, tag_type FROM tags WHERE name = ?1 AND tag_type = ?2",
                params![name.trim(), tag_type.as_str()],
                Self::row_to_tag,
            )
            .optional()?)
    }

    fn replace_derived_tags(&self, paper_id: i64, tags: &[(String, TagType)]) -> Result<()> {
        if let Some((name, tag_type)) = tags.iter().find(|(_, t)| !t.is_derived()) {
            return Err(ComboError::ValidationError(format!(
                "{tag_type} tag '{name}' is not derived from paper metadata"
            )));
        }

        // A savepoint nests inside a caller's transaction and is a
        // transaction of its own otherwise.
        self.conn.execute_batch("SAVEPOINT replace_derived_tags")?;
        match self.replace_derived_inner(paper_id, tags) {
            Ok(()) => {
                self.conn.execute_batch("RELEASE replace_derived_tags")?;
                Ok(())
            }
            Err(e) => {
                if let Err(rollback) = self.conn.execute_batch(
                    "ROLLBACK TO replace_derived_tags; RELEASE replace_derived_tags",
                ) {
                    tracing::warn!(paper_id, "failed to roll back tag replacement: {rollback}");
                }
                Err(e)
            }
        }
    }

    fn add_paper_tag(&self, paper_id: i64, name: &str, tag_type: TagType) -> Result<bool> {
        let tag = self.get_or_create(name, tag_type)?;
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO paper_tags(paper_id, tag_id) VALUES (?1, ?2)",
            params![paper_id, tag.id],
        )?;
        Ok(inserted > 0)
    }

    fn remove_paper_tag(&self, paper_id: i64, name: &str, tag_type: TagType) -> Result<bool> {
        let Some(tag) = self.find(name, tag_type)? else {
            return Ok(false);
        };
        let removed = self.conn.execute(
            "DELETE FROM paper_tags WHERE paper_id = ?1 AND tag_id = ?2",
            params![paper_id, tag.id],
        )?;
        Ok(removed > 0)
    }

    fn tags_for_paper(&self, paper_id: i64) -> Result<Vec<Tag>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.id, t.name, t.tag_type
             FROM tags t
             JOIN paper_tags pt ON pt.tag_id = t.id
             WHERE pt.paper_id = ?1
             ORDER BY t.tag_type, t.name",
        )?;
        let tags = stmt
            .query_map(params![paper_id], Self::row_to_tag)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(tags)
    }

    fn list_with_counts(&self, tag_type: Option<TagType>) -> Result<Vec<TagCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.name, t.tag_type, COUNT(pt.paper_id)
             FROM tags t
             LEFT JOIN paper_tags pt ON pt.tag_id = t.id
             WHERE ?1 IS NULL OR t.tag_type = ?1
             GROUP BY t.id
             ORDER BY COUNT(pt.paper_id) DESC, t.name",
        )?;

        let rows = stmt.query_map(params![tag_type.map(TagType::as_str)], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut counts = Vec::new();
        for row in rows {
            let (name, type_str, count) = row?;
            let tag_type = TagType::from_str(&type_str).map_err(ComboError::ValidationError)?;
            counts.push(TagCount {
                name,
                tag_type,
                paper_count: count as u32,
            });
        }
        Ok(counts)
    }

    fn papers_with_tag(
        &self,
        name: &str,
        tag_type: TagType,
        page: usize,
        per_page: usize,
    ) -> Result<Page<Paper>> {
        let Some(tag) = self.find(name, tag_type)? else {
            return Ok(Page::empty(per_page));
        };

        let total: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM paper_tags WHERE tag_id = ?1",
            params![tag.id],
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {PAPER_COLUMNS}
             FROM papers p
             JOIN paper_tags pt ON pt.paper_id = p.id
             WHERE pt.tag_id = ?1
             ORDER BY p.published_date DESC, p.id DESC
             LIMIT ?2 OFFSET ?3"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut items = stmt
            .query_map(
                params![tag.id, per_page as i64, page_offset(page, per_page) as i64],
                row_to_paper,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        attach_authors(self.conn, &mut items)?;

        Ok(Page::new(items, total as usize, page.max(1), per_page))
    }
}
