pub mod bibtex;

use combo_core::models::Paper;

pub trait Citable {
    /// The preprint entry.
    fn to_bibtex(&self) -> String;
    /// The journal entry, when the work has been published with a DOI.
    fn to_published_bibtex(&self) -> Option<String>;
}

impl Citable for Paper {
    fn to_bibtex(&self) -> String {
        bibtex::arxiv_entry(self)
    }

    fn to_published_bibtex(&self) -> Option<String> {
        self.doi
            .as_deref()
            .map(str::trim)
            .filter(|doi| !doi.is_empty())
            .map(|doi| bibtex::published_entry(self, doi))
    }
}
