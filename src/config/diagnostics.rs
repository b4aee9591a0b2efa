//! Turns scaffold configuration parse failures into `miette` diagnostics.
//!
//! `serde_saphyr` reports a line and column; this module maps them back onto
//! the source buffer so the rendered report can underline the offending
//! character, and adds a hint for the YAML mistakes people make most often.

// The unused_assignments lint fires on miette/thiserror derive expansions in
// some Rust versions only, so `#[expect]` is not usable here.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use miette::{Diagnostic, NamedSource, SourceSpan};
use serde_saphyr::{Error as YamlError, Location};
use thiserror::Error;

const YAML_HINTS: [(&str, &str); 4] = [
    (
        "did not find expected '-'",
        "Start list items with '-' and ensure proper indentation.",
    ),
    (
        "mapping values are not allowed",
        "Check for a stray ':' or add quotes around values where needed.",
    ),
    (
        "unknown field",
        "Check the key against the documented pbxgen.yml fields.",
    ),
    (
        "invalid type",
        "Quote version numbers such as \"16.0\" so they stay strings.",
    ),
];

/// Byte offset of a 1-based `line`/`column` pair, clamped to the buffer.
fn byte_index(src: &str, line: u64, column: u64) -> usize {
    let target_line = usize::try_from(line.saturating_sub(1)).unwrap_or(usize::MAX);
    let target_column = usize::try_from(column.saturating_sub(1)).unwrap_or(usize::MAX);
    let mut offset = 0usize;
    for (idx, segment) in src.split_inclusive('\n').enumerate() {
        if idx == target_line {
            let line_text = segment.trim_end_matches(['\n', '\r']);
            let column_offset = line_text
                .char_indices()
                .nth(target_column)
                .map_or(line_text.len(), |(byte_idx, _)| byte_idx);
            return offset + column_offset;
        }
        offset += segment.len();
    }
    src.len()
}

fn to_span(src: &str, loc: Location) -> SourceSpan {
    let at = byte_index(src, loc.line(), loc.column());
    let len = usize::from(src.as_bytes().get(at).is_some_and(|b| *b != b'\n'));
    SourceSpan::new(at.into(), len)
}

fn has_tab_indent(src: &str, loc: Option<Location>) -> bool {
    let Some(loc) = loc else { return false };
    let line_idx = usize::try_from(loc.line().saturating_sub(1)).unwrap_or(usize::MAX);
    src.lines()
        .nth(line_idx)
        .unwrap_or("")
        .chars()
        .take_while(|c| c.is_whitespace())
        .any(|c| c == '\t')
}

fn hint_for(err_str: &str, src: &str, loc: Option<Location>) -> Option<String> {
    if has_tab_indent(src, loc) {
        return Some("Use spaces for indentation; tabs are invalid in YAML.".into());
    }
    let lower = err_str.to_lowercase();
    YAML_HINTS
        .iter()
        .find(|(needle, _)| lower.contains(*needle))
        .map(|(_, hint)| (*hint).into())
}

#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(pbxgen::config::yaml))]
struct YamlDiagnostic {
    #[source_code]
    src: NamedSource<String>,
    #[label("parse error here")]
    span: Option<SourceSpan>,
    #[help]
    help: Option<String>,
    #[source]
    source: YamlError,
    message: String,
}

/// Wrap a YAML error for the configuration named `name` with source context.
#[must_use]
pub fn map_yaml_error(
    err: YamlError,
    src: &str,
    name: &str,
) -> Box<dyn Diagnostic + Send + Sync + 'static> {
    let loc = err.location();
    let (line, col, span) = loc.map_or((1, 1, None), |l| {
        (l.line(), l.column(), Some(to_span(src, l)))
    });
    let err_str = err.to_string();
    let help = hint_for(&err_str, src, loc);
    let message = format!("{name}: YAML error at line {line}, column {col}: {err_str}");
    Box::new(YamlDiagnostic {
        src: NamedSource::new(name, src.to_owned()),
        span,
        help,
        source: err,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a: 1\nbc: 2\n", 2, 1, 5)]
    #[case("a: 1\r\nbc: 2\r\n", 2, 2, 7)]
    #[case("a: 1\n", 9, 1, 5)]
    #[case("a: 1\n", 1, 99, 4)]
    fn byte_index_clamps_to_the_buffer(
        #[case] src: &str,
        #[case] line: u64,
        #[case] column: u64,
        #[case] expected: usize,
    ) {
        assert_eq!(byte_index(src, line, column), expected);
    }

    #[test]
    fn tab_indentation_gets_a_hint() {
        let src = "\tproject: \"unterminated";
        let err = serde_saphyr::from_str::<crate::config::Scaffold>(src)
            .expect_err("expected parse error");
        let diag = map_yaml_error(err, src, "pbxgen.yml");
        let help = diag.help().map(|h| h.to_string()).unwrap_or_default();
        assert!(help.contains("Use spaces"), "help: {help}");
    }
}
