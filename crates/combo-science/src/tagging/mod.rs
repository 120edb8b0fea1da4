//! Tag derivation from paper metadata and keyword linking in abstracts.

pub mod apply;
pub mod derive;
pub mod dictionary;
pub mod linkify;
pub mod msc;

pub use apply::{BackfillReport, IngestOutcome, TagApplier};
pub use derive::{DEFAULT_EXCLUDED_CATEGORY, DerivedTags, derive_tags, derive_tags_excluding};
pub use dictionary::{DictionaryEntry, KeywordDictionary};
pub use linkify::{Linked, Linkifier};
pub use msc::extract_msc_codes;
