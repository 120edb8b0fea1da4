pub mod author;
pub mod page;
pub mod paper;
pub mod tag;

pub use author::*;
pub use page::*;
pub use paper::*;
pub use tag::*;
