pub mod arxiv;
pub mod doi;
pub mod input;

pub use arxiv::ArxivId;
pub use doi::Doi;
pub use input::BibInput;
