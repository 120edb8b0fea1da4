//! combo science: MSC extraction, keyword linking and tagging, keyword
//! discovery, identifier parsing and BibTeX export.

pub mod error;
pub mod formats;
pub mod identifiers;
pub mod keywords;
pub mod tagging;

pub use error::{Result, ScienceError};
pub use formats::Citable;
pub use identifiers::{ArxivId, BibInput, Doi};
pub use tagging::{
    BackfillReport, DerivedTags, DictionaryEntry, IngestOutcome, KeywordDictionary, Linked,
    Linkifier, TagApplier, derive_tags, extract_msc_codes,
};
