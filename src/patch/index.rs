//! Line-indexed view of an existing manifest.
//!
//! The index is built in a single pass over the manifest lines. It records
//! where each `/* Begin X section */` and `/* End X section */` marker sits,
//! the identifier on every entry line, and for multi-line entries the span of
//! each list attribute together with their scalar attributes. It assumes the
//! tab indentation the IDE (and [`crate::pbx_gen`]) writes.

use crate::token::Token;
use std::collections::{HashMap, HashSet};

/// Inclusive line span of a section or list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    /// Line holding the opening marker.
    pub(crate) open: usize,
    /// Line holding the closing marker, if one was found.
    pub(crate) close: Option<usize>,
}

/// One object entry found in a section.
#[derive(Debug, Clone)]
pub(crate) struct IndexedEntry<'a> {
    pub(crate) id: Token,
    pub(crate) comment: Option<&'a str>,
    pub(crate) section: &'a str,
    scalars: HashMap<&'a str, &'a str>,
    lists: HashMap<&'a str, Span>,
}

impl<'a> IndexedEntry<'a> {
    /// Closing line of the list attribute `key`.
    pub(crate) fn list_close(&self, key: &str) -> Option<usize> {
        self.lists.get(key).and_then(|span| span.close)
    }

    /// Unquoted scalar attribute `key`.
    pub(crate) fn scalar(&self, key: &str) -> Option<&'a str> {
        self.scalars.get(key).copied()
    }
}

/// Section and entry positions of a manifest.
#[derive(Debug)]
pub(crate) struct SectionIndex<'a> {
    lines: Vec<&'a str>,
    sections: HashMap<&'a str, Span>,
    entries: Vec<IndexedEntry<'a>>,
    ids: HashSet<Token>,
}

enum Nested<'a> {
    List(&'a str, usize),
    Map,
}

impl<'a> SectionIndex<'a> {
    /// Index `text`.
    pub(crate) fn parse(text: &'a str) -> Self {
        let lines: Vec<&'a str> = text.split_inclusive('\n').collect();
        let mut index = Self {
            lines: Vec::new(),
            sections: HashMap::new(),
            entries: Vec::new(),
            ids: HashSet::new(),
        };
        let mut section: Option<&'a str> = None;
        let mut open_entry: Option<IndexedEntry<'a>> = None;
        let mut nested: Option<Nested<'a>> = None;

        for (number, raw) in lines.iter().enumerate() {
            let line = raw.trim_end_matches(['\n', '\r']);
            if let Some(name) = marker(line, "/* Begin ") {
                section = Some(name);
                index.sections.insert(
                    name,
                    Span {
                        open: number,
                        close: None,
                    },
                );
                continue;
            }
            if let Some(name) = marker(line, "/* End ") {
                if let Some(span) = index.sections.get_mut(name) {
                    span.close = Some(number);
                }
                section = None;
                continue;
            }
            let Some(current) = section else { continue };

            if let Some(entry) = open_entry.as_mut() {
                if line == "\t\t};" {
                    index.finish(open_entry.take());
                    nested = None;
                    continue;
                }
                match nested {
                    Some(Nested::List(key, open)) => {
                        if line == "\t\t\t);" {
                            entry.lists.insert(
                                key,
                                Span {
                                    open,
                                    close: Some(number),
                                },
                            );
                            nested = None;
                        }
                    }
                    Some(Nested::Map) => {
                        if line == "\t\t\t};" {
                            nested = None;
                        }
                    }
                    None => nested = attribute(entry, line, number),
                }
                continue;
            }

            if let Some((entry, multiline)) = entry_header(line, current) {
                if multiline {
                    open_entry = Some(entry);
                } else {
                    index.finish(Some(entry));
                }
            }
        }
        index.lines = lines;
        index
    }

    fn finish(&mut self, entry: Option<IndexedEntry<'a>>) {
        if let Some(entry) = entry {
            self.ids.insert(entry.id.clone());
            self.entries.push(entry);
        }
    }

    /// Lines of the manifest including their terminators.
    pub(crate) fn lines(&self) -> &[&'a str] {
        &self.lines
    }

    /// Span of the section named `isa`.
    pub(crate) fn section(&self, isa: &str) -> Option<Span> {
        self.sections.get(isa).copied()
    }

    /// Whether an entry with identifier `id` exists anywhere.
    pub(crate) fn contains(&self, id: &Token) -> bool {
        self.ids.contains(id)
    }

    /// Entries of the section named `isa`, in file order.
    pub(crate) fn entries_in<'s>(&'s self, isa: &'s str) -> impl Iterator<Item = &'s IndexedEntry<'a>> {
        self.entries.iter().filter(move |entry| entry.section == isa)
    }

    /// The entry with identifier `id`.
    pub(crate) fn entry(&self, id: &Token) -> Option<&IndexedEntry<'a>> {
        self.entries.iter().find(|entry| &entry.id == id)
    }
}

/// Name inside a `/* Begin X section */` or `/* End X section */` marker.
fn marker<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    line.strip_prefix(prefix)?.strip_suffix(" section */")
}

/// Parse an entry header such as `\t\tID /* name */ = {`.
///
/// Returns the entry and whether its body continues on following lines.
fn entry_header<'a>(line: &'a str, section: &'a str) -> Option<(IndexedEntry<'a>, bool)> {
    let body = line.strip_prefix("\t\t")?;
    if body.starts_with('\t') {
        return None;
    }
    let (raw_id, after_id) = body.split_once(' ')?;
    let id = Token::parse(raw_id).ok()?;
    let (comment, assignment) = match after_id.strip_prefix("/* ") {
        Some(commented) => {
            let (text, after) = commented.split_once(" */ ")?;
            (Some(text), after)
        }
        None => (None, after_id),
    };
    let inline_body = assignment.strip_prefix("= {")?;
    let entry = IndexedEntry {
        id,
        comment,
        section,
        scalars: HashMap::new(),
        lists: HashMap::new(),
    };
    Some((entry, inline_body.is_empty()))
}

/// Record a top-level attribute line of a multi-line entry and report
/// whether it opens a nested value.
fn attribute<'a>(entry: &mut IndexedEntry<'a>, line: &'a str, number: usize) -> Option<Nested<'a>> {
    let body = line.strip_prefix("\t\t\t")?;
    if body.starts_with('\t') {
        return None;
    }
    let (key, value) = body.split_once(" = ")?;
    match value {
        "(" => Some(Nested::List(key, number)),
        "{" => Some(Nested::Map),
        _ => {
            let bare = value.strip_suffix(';').unwrap_or(value);
            let unquoted = bare
                .strip_prefix('"')
                .and_then(|inner| inner.strip_suffix('"'))
                .unwrap_or(bare);
            entry.scalars.insert(key, unquoted);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "// !$*UTF8*$!\n{\n\tobjects = {\n\n/* Begin PBXBuildFile section */\n\t\tAAAAAAAAAAAAAAAAAAAAAAAA /* a.swift in Sources */ = {isa = PBXBuildFile; fileRef = BBBBBBBBBBBBBBBBBBBBBBBB /* a.swift */; };\n/* End PBXBuildFile section */\n\n/* Begin PBXGroup section */\n\t\tCCCCCCCCCCCCCCCCCCCCCCCC /* Models */ = {\n\t\t\tisa = PBXGroup;\n\t\t\tchildren = (\n\t\t\t\tBBBBBBBBBBBBBBBBBBBBBBBB /* a.swift */,\n\t\t\t);\n\t\t\tpath = Models;\n\t\t\tsourceTree = \"<group>\";\n\t\t};\n/* End PBXGroup section */\n\t};\n}\n";

    fn token(raw: &str) -> Token {
        Token::parse(raw).expect("valid token")
    }

    #[test]
    fn sections_and_entries_are_located() {
        let index = SectionIndex::parse(SAMPLE);
        let build = index.section("PBXBuildFile").expect("build file section");
        assert_eq!(build.open, 4);
        assert_eq!(build.close, Some(6));
        assert!(index.contains(&token("AAAAAAAAAAAAAAAAAAAAAAAA")));
        assert!(!index.contains(&token("BBBBBBBBBBBBBBBBBBBBBBBB")));
        assert!(index.section("PBXSourcesBuildPhase").is_none());
    }

    #[test]
    fn group_lists_and_scalars_are_recorded() {
        let index = SectionIndex::parse(SAMPLE);
        let group = index
            .entries_in("PBXGroup")
            .next()
            .expect("one group entry");
        assert_eq!(group.comment, Some("Models"));
        assert_eq!(group.list_close("children"), Some(13));
        assert_eq!(group.scalar("path"), Some("Models"));
        assert_eq!(group.scalar("sourceTree"), Some("<group>"));
        assert_eq!(index.lines().get(13).copied(), Some("\t\t\t);\n"));
    }
}
