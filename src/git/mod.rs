//! Git integration through the external `git` tool
//!
//! Builds the read-only history query run in each repository and parses the
//! lines it prints. Nothing here touches repository state.

/// History query construction
pub mod history;
/// Parsing of history query output lines
pub mod parser;

pub use history::{GitLogCommand, HistoryCommand};
pub use parser::{extract_branch, parse_commit_line};
