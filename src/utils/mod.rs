//! Utils Module
pub mod fs;
pub mod truncate;

pub use fs::{FileStore, LocalFileStore};
pub use truncate::{preview, truncate_text, TruncationPolicy};
