pub mod calendar;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod text;

pub use config::AppConfig;
pub use error::{ComboError, ExitCode, Result};
pub use models::*;

pub use storage::database::{Connection, ConnectionPool, Database, open_database, open_in_memory};

pub use storage::repositories::{
    AuthorRepository, PaperRepository, Repository, SqliteAuthorRepository,
    SqlitePaperRepository, SqliteTagRepository, TagRepository,
};

pub use storage::queries::{BrowseQuery, CatalogueStats, CatalogueStatsQuery, PaperSearchQuery};
