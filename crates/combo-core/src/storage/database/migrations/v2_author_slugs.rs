use rusqlite::{Connection, params};

use super::Migration;
use crate::error::Result;
use crate::text::slugify;

pub struct V2AuthorSlugs;

impl Migration for V2AuthorSlugs {
    fn version(&self) -> u32 {
        2
    }

    fn description(&self) -> &'static str {
        "Add slug column to authors and populate it"
    }

    fn up(&self, conn: &Connection) -> Result<()> {
        let has_slug: bool = conn
            .prepare("SELECT 1 FROM pragma_table_info('authors') WHERE name='slug'")?
            .exists([])?;

        if !has_slug {
            conn.execute_batch(
                "
                ALTER TABLE authors ADD COLUMN slug TEXT;
                CREATE INDEX IF NOT EXISTS idx_authors_slug ON authors(slug);
                ",
            )?;
        }
        backfill_slugs(conn)?;
        Ok(())
    }
}

/// Fill in every NULL author slug. Names that slugify to nothing are
/// skipped and keep resolving by exact name. Returns the number of rows
/// updated.
pub fn backfill_slugs(conn: &Connection) -> Result<usize> {
    let pending: Vec<(i64, String)> = {
        let mut stmt = conn.prepare("SELECT id, name FROM authors WHERE slug IS NULL")?;
        stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?
    };

    let mut update = conn.prepare("UPDATE authors SET slug = ?1 WHERE id = ?2")?;
    let mut updated = 0;
    for (id, name) in &pending {
        let slug = slugify(name);
        if slug.is_empty() {
            tracing::warn!(author_id = id, name = %name, "author name has no slug form");
            continue;
        }
        update.execute(params![slug, id])?;
        updated += 1;
    }
    Ok(updated)
}
