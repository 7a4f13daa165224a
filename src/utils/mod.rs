//! Terminal helpers shared by the CLI and reports

pub mod format;
pub mod progress;
pub mod styling;

pub use format::*;
pub use progress::*;
pub use styling::*;
