//! Unit tests for the incremental patcher.

use super::*;
use crate::config::Scaffold;
use crate::graph::Graph;
use crate::pbx_gen::generate;
use crate::scan::SourceFiles;
use rstest::rstest;

fn files(paths: &[&str]) -> SourceFiles {
    paths
        .iter()
        .map(|path| {
            let path = Utf8PathBuf::from(*path);
            let name = path.file_name().unwrap_or_default().to_owned();
            (path, name)
        })
        .collect()
}

fn manifest(paths: &[&str], scaffold: &Scaffold) -> String {
    let graph = Graph::build(&files(paths), scaffold).expect("build graph");
    generate(&graph).expect("generate manifest")
}

fn lines_after<'t>(text: &'t str, marker: &str) -> impl Iterator<Item = &'t str> {
    text.lines().skip_while(move |line| *line != marker).skip(1)
}

fn occurrences(text: &str, needle: &str) -> usize {
    text.matches(needle).count()
}

#[test]
fn new_entries_land_directly_after_the_section_markers() {
    let text = manifest(&["A/x.swift"], &Scaffold::default());
    let outcome = patch(&text, &[NewFile::new("A/y.swift")], &PatchOptions::default())
        .expect("patch");
    let first_build = lines_after(&outcome.text, "/* Begin PBXBuildFile section */")
        .next()
        .expect("line after build file marker");
    assert!(first_build.contains("/* y.swift in Sources */"), "{first_build}");
    let first_ref = lines_after(&outcome.text, "/* Begin PBXFileReference section */")
        .next()
        .expect("line after file reference marker");
    assert!(first_ref.contains("/* y.swift */ = {isa = PBXFileReference;"), "{first_ref}");
}

#[test]
fn sources_item_is_appended_after_existing_members() {
    let text = manifest(&["A/x.swift"], &Scaffold::default());
    let outcome = patch(&text, &[NewFile::new("A/y.swift")], &PatchOptions::default())
        .expect("patch");
    let phase: Vec<&str> = lines_after(&outcome.text, "/* Begin PBXSourcesBuildPhase section */")
        .take_while(|line| !line.starts_with("/* End"))
        .collect();
    let close = phase
        .iter()
        .position(|line| *line == "\t\t\t);")
        .expect("files list closes");
    let x = phase.iter().position(|line| line.contains("x.swift in Sources"));
    let y = phase.iter().position(|line| line.contains("y.swift in Sources"));
    assert_eq!(y, Some(close - 1));
    assert!(x < y);
}

#[test]
fn patched_entries_match_full_generation() {
    let text = manifest(&["A/x.swift"], &Scaffold::default());
    let outcome = patch(&text, &[NewFile::new("A/y.swift")], &PatchOptions::default())
        .expect("patch");
    let generated = manifest(&["A/x.swift", "A/y.swift"], &Scaffold::default());
    for line in outcome.text.lines().filter(|line| line.contains("y.swift")) {
        assert!(
            generated.lines().any(|candidate| candidate == line),
            "patched line not produced by generation: {line}"
        );
    }
    assert_eq!(occurrences(&outcome.text, "y.swift"), occurrences(&generated, "y.swift"));
}

#[test]
fn content_derived_patching_is_idempotent() {
    let text = manifest(&["A/x.swift"], &Scaffold::default());
    let request = [NewFile::new("A/y.swift"), NewFile::new("B/z.swift")];
    let once = patch(&text, &request, &PatchOptions::default()).expect("first patch");
    let twice = patch(&once.text, &request, &PatchOptions::default()).expect("second patch");
    assert_eq!(once.added.len(), 2);
    assert!(twice.added.is_empty());
    assert_eq!(twice.skipped.len(), 2);
    assert_eq!(once.text, twice.text);
}

#[test]
fn existing_and_repeated_files_are_skipped() {
    let text = manifest(&["A/x.swift"], &Scaffold::default());
    let request = [
        NewFile::new("A/x.swift"),
        NewFile::new("A/y.swift"),
        NewFile::new("A/y.swift"),
    ];
    let outcome = patch(&text, &request, &PatchOptions::default()).expect("patch");
    assert_eq!(outcome.added, [Utf8PathBuf::from("A/y.swift")]);
    assert_eq!(
        outcome.skipped,
        [Utf8PathBuf::from("A/x.swift"), Utf8PathBuf::from("A/y.swift")]
    );
}

#[test]
fn current_directory_components_do_not_defeat_deduplication() {
    let text = manifest(&["Models/User.swift"], &Scaffold::default());
    let outcome = patch(
        &text,
        &[NewFile::new("./Models/User.swift"), NewFile::new("Models/./Order.swift")],
        &PatchOptions::default(),
    )
    .expect("patch");
    assert_eq!(outcome.skipped, [Utf8PathBuf::from("Models/User.swift")]);
    assert_eq!(outcome.added, [Utf8PathBuf::from("Models/Order.swift")]);
    assert_eq!(occurrences(&outcome.text, "/* User.swift */ = {isa = PBXFileReference;"), 1);
    let generated = manifest(&["Models/Order.swift", "Models/User.swift"], &Scaffold::default());
    for line in outcome.text.lines().filter(|line| line.contains("Order.swift")) {
        assert!(
            generated.lines().any(|candidate| candidate == line),
            "normalised file rendered differently: {line}"
        );
    }
}

#[rstest]
#[case("../Outside.swift")]
#[case("/abs/Root.swift")]
#[case("Models/..")]
#[case(".")]
fn paths_outside_the_source_root_are_rejected(#[case] raw: &str) {
    let text = manifest(&["Models/User.swift"], &Scaffold::default());
    let err = patch(&text, &[NewFile::new(raw)], &PatchOptions::default())
        .expect_err("path must stay inside the source root");
    assert!(matches!(err, PatchError::InvalidPath { .. }), "got {err:?}");
}

#[test]
fn random_strategy_duplicates_on_every_run() {
    let text = manifest(&["A/x.swift"], &Scaffold::default());
    let options = PatchOptions {
        strategy: IdStrategy::Random,
        ..PatchOptions::default()
    };
    let request = [NewFile::new("A/y.swift"), NewFile::new("A/w.swift")];
    let once = patch(&text, &request, &options).expect("first patch");
    let twice = patch(&once.text, &request, &options).expect("second patch");
    assert_eq!(twice.added.len(), 2);
    let build_entries = occurrences(&twice.text, "in Sources */ = {isa = PBXBuildFile;");
    assert_eq!(build_entries, 1 + 2 * request.len());
}

#[test]
fn missing_anchor_aborts_without_output() {
    let text = manifest(&["A/x.swift"], &Scaffold::default());
    let broken = text.replace("/* Begin PBXSourcesBuildPhase section */\n", "");
    let err = patch(&broken, &[NewFile::new("A/y.swift")], &PatchOptions::default())
        .expect_err("sources anchor is gone");
    assert!(
        matches!(err, PatchError::SectionNotFound { ref section } if section == "PBXSourcesBuildPhase"),
        "got {err:?}"
    );
}

#[test]
fn first_file_can_be_added_to_an_empty_project() {
    let text = manifest(&[], &Scaffold::default());
    assert!(text.contains("/* Begin PBXBuildFile section */\n/* End PBXBuildFile section */\n"));
    let outcome = patch(&text, &[NewFile::new("Main.swift")], &PatchOptions::default())
        .expect("empty sections still anchor insertions");
    assert_eq!(outcome.added, [Utf8PathBuf::from("Main.swift")]);
    let generated = manifest(&["Main.swift"], &Scaffold::default());
    let mut patched: Vec<&str> = outcome.text.lines().collect();
    let mut expected: Vec<&str> = generated.lines().collect();
    patched.sort_unstable();
    expected.sort_unstable();
    assert_eq!(patched, expected);
}

#[test]
fn missing_build_file_section_is_reported() {
    let text = manifest(&["A/x.swift"], &Scaffold::default());
    let broken = text.replace("/* Begin PBXBuildFile section */\n", "");
    let err = patch(&broken, &[NewFile::new("A/y.swift")], &PatchOptions::default())
        .expect_err("build file anchor is gone");
    assert!(matches!(err, PatchError::SectionNotFound { ref section } if section == "PBXBuildFile"));
}

#[test]
fn file_joins_the_group_of_its_directory() {
    let text = manifest(&["A/x.swift", "B/z.swift"], &Scaffold::default());
    let outcome = patch(&text, &[NewFile::new("B/w.swift")], &PatchOptions::default())
        .expect("patch");
    let group_b: Vec<&str> = outcome
        .text
        .lines()
        .skip_while(|line| !(line.contains("/* B */ = {")))
        .take_while(|line| *line != "\t\t};")
        .collect();
    assert!(group_b.iter().any(|line| line.contains("/* w.swift */,")), "{group_b:?}");
}

#[test]
fn root_level_files_join_the_source_group() {
    let scaffold = Scaffold::default();
    let text = manifest(&["A/x.swift"], &scaffold);
    let outcome = patch(&text, &[NewFile::new("Main.swift")], &PatchOptions::default())
        .expect("patch");
    let header = format!("\t\t{} /* ", scaffold.ids.source_group);
    let body: Vec<&str> = outcome
        .text
        .lines()
        .skip_while(|line| !line.starts_with(header.as_str()))
        .take_while(|line| *line != "\t\t};")
        .collect();
    assert!(body.iter().any(|line| line.contains("/* Main.swift */,")), "{body:?}");
}

#[rstest]
#[case(NewFile::new("Elsewhere/n.swift").in_group("A"), "A")]
#[case(NewFile::new("B/n.swift").in_group("B"), "B")]
fn explicit_group_names_are_honoured(#[case] file: NewFile, #[case] group: &str) {
    let text = manifest(&["A/x.swift", "B/z.swift"], &Scaffold::default());
    let outcome = patch(&text, &[file], &PatchOptions::default()).expect("patch");
    let header = format!("/* {group} */ = {{");
    let body: Vec<&str> = outcome
        .text
        .lines()
        .skip_while(|line| !line.contains(header.as_str()))
        .take_while(|line| *line != "\t\t};")
        .collect();
    assert!(body.iter().any(|line| line.contains("/* n.swift */,")), "{body:?}");
}

#[test]
fn unknown_group_is_an_error() {
    let text = manifest(&["A/x.swift"], &Scaffold::default());
    let err = patch(
        &text,
        &[NewFile::new("A/y.swift").in_group("Nope")],
        &PatchOptions::default(),
    )
    .expect_err("group does not exist");
    assert!(matches!(err, PatchError::GroupNotFound { .. }), "got {err:?}");
}

#[test]
fn shared_group_names_resolve_by_directory() {
    let text = manifest(
        &["Services/Shared/a.swift", "Views/Shared/b.swift"],
        &Scaffold::default(),
    );
    let placed = patch(
        &text,
        &[NewFile::new("Views/Shared/c.swift").in_group("Shared")],
        &PatchOptions::default(),
    )
    .expect("directory disambiguates");
    assert_eq!(placed.added.len(), 1);

    let err = patch(
        &text,
        &[NewFile::new("Other/d.swift").in_group("Shared")],
        &PatchOptions::default(),
    )
    .expect_err("two groups named Shared");
    assert!(
        matches!(err, PatchError::AmbiguousGroup { count: 2, .. }),
        "got {err:?}"
    );
}

#[test]
fn empty_request_returns_the_manifest_unchanged() {
    let text = manifest(&["A/x.swift"], &Scaffold::default());
    let outcome = patch(&text, &[], &PatchOptions::default()).expect("patch");
    assert_eq!(outcome.text, text);
}
