use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: u32 = 2;

pub fn apply_pragmas(conn: &Connection, wal: bool) -> Result<()> {
    if wal {
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    }
    conn.execute_batch(
        "
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        ",
    )?;
    Ok(())
}

pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS papers (
            id               INTEGER PRIMARY KEY,
            arxiv_id         TEXT NOT NULL,
            arxiv_base_id    TEXT NOT NULL UNIQUE,
            title            TEXT NOT NULL,
            abstract         TEXT NOT NULL DEFAULT '',
            published_date   TEXT NOT NULL,
            updated_date     TEXT NOT NULL,
            comment          TEXT,
            journal_ref      TEXT,
            doi              TEXT,
            primary_category TEXT NOT NULL,
            categories       TEXT NOT NULL DEFAULT '[]'
        );

        CREATE TABLE IF NOT EXISTS authors (
            id   INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS paper_authors (
            paper_id     INTEGER NOT NULL REFERENCES papers(id) ON DELETE CASCADE,
            author_id    INTEGER NOT NULL REFERENCES authors(id) ON DELETE CASCADE,
            author_order INTEGER NOT NULL,
            PRIMARY KEY (paper_id, author_id)
        );

        CREATE TABLE IF NOT EXISTS tags (
            id       INTEGER PRIMARY KEY,
            name     TEXT NOT NULL,
            tag_type TEXT NOT NULL CHECK(tag_type IN ('msc', 'arxiv', 'personal', 'other')),
            UNIQUE (name, tag_type)
        );

        CREATE TABLE IF NOT EXISTS paper_tags (
            paper_id INTEGER NOT NULL REFERENCES papers(id) ON DELETE CASCADE,
            tag_id   INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
            PRIMARY KEY (paper_id, tag_id)
        );
        ",
    )?;
    Ok(())
}

pub fn create_indexes(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_papers_published   ON papers(published_date);
        CREATE INDEX IF NOT EXISTS idx_paper_authors_auth ON paper_authors(author_id);
        CREATE INDEX IF NOT EXISTS idx_paper_tags_tag     ON paper_tags(tag_id);
        ",
    )?;
    Ok(())
}

pub fn create_fts_table(conn: &Connection) -> Result<()> {
    let has_fts: bool = conn
        .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name='papers_fts'")?
        .exists([])?;

    if !has_fts {
        conn.execute_batch("CREATE VIRTUAL TABLE papers_fts USING fts5(title, abstract);")?;
    }
    Ok(())
}
