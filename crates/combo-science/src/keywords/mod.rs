//! Offline keyword discovery: rank recurring phrases across abstracts for
//! manual curation into the keyword dictionary.

pub mod discover;
pub mod text;

pub use discover::{DiscoveryOptions, KeywordCandidate, discover, is_useful, ngrams, write_csv};
pub use text::{singularize, strip_latex, tokenize};
