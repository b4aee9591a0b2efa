//! Test utilities for pbxgen.
//!
//! Provides source-tree fixtures for scanning and generation tests, plus an
//! error formatting helper for stable assertions.

pub mod error;
pub mod tree;

pub use error::display_error_chain;
pub use tree::SourceTree;

/// Lines of `text` sorted, for comparisons that ignore entry order.
#[must_use]
pub fn sorted_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.lines().collect();
    lines.sort_unstable();
    lines
}
