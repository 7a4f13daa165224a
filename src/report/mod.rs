//! Report module - run summaries, group profiles and JSON export

pub mod export;
pub mod profile;
pub mod summary;

pub use export::*;
pub use profile::*;
pub use summary::*;
