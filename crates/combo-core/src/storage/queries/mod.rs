mod browse;
mod paper_search;
mod stats;

pub use browse::BrowseQuery;
pub use paper_search::{PaperSearchQuery, fts_expression, like_pattern};
pub use stats::{CatalogueStats, CatalogueStatsQuery};
