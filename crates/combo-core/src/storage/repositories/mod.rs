mod author_repository;
mod paper_repository;
mod tag_repository;

pub use author_repository::{AuthorRepository, SqliteAuthorRepository};
pub use paper_repository::{PaperRepository, SqlitePaperRepository};
pub use tag_repository::{SqliteTagRepository, TagRepository};

pub(crate) use paper_repository::{PAPER_COLUMNS, attach_authors, row_to_paper};

use crate::error::Result;

pub trait Repository {
    type Entity;
    type Id;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>>;
    fn delete(&self, id: &Self::Id) -> Result<bool>;
}
