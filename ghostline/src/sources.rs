//! Local suggestion sources.
//!
//! Every matcher is a pure function over the analyzed context and a snapshot
//! of its data, and yields at most one full-line candidate that strictly
//! extends the input.

pub mod command;
pub mod filesystem;
pub mod history;

pub use command::match_command;
pub use filesystem::{DirectorySnapshot, match_filesystem};
pub use history::match_history;
