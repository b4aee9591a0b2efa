//! Project bundle layout.

use super::RunnerError;
use super::file_io::write_atomic;
use std::path::{Path, PathBuf};

/// Name of the manifest inside a project bundle.
pub const MANIFEST_FILE: &str = "project.pbxproj";

const WORKSPACE_CONTENTS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Workspace
   version = "1.0">
   <FileRef
      location = "self:">
   </FileRef>
</Workspace>
"#;

const WORKSPACE_CHECKS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>IDEDidComputeMac32BitWarning</key>
	<true/>
</dict>
</plist>
"#;

/// `<output>/<name>.xcodeproj`.
#[must_use]
pub fn bundle_path(output: &Path, name: &str) -> PathBuf {
    output.join(format!("{name}.xcodeproj"))
}

/// Resolve `path` to a manifest: bundles resolve to the manifest inside them.
#[must_use]
pub fn manifest_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(MANIFEST_FILE)
    } else {
        path.to_path_buf()
    }
}

/// Write the auxiliary workspace files of the bundle at `bundle`.
///
/// # Errors
///
/// Returns [`RunnerError::WriteFailure`] when a file cannot be written.
pub fn write_workspace(bundle: &Path) -> Result<(), RunnerError> {
    let workspace = bundle.join("project.xcworkspace");
    write_atomic(&workspace.join("contents.xcworkspacedata"), WORKSPACE_CONTENTS)?;
    write_atomic(
        &workspace.join("xcshareddata").join("IDEWorkspaceChecks.plist"),
        WORKSPACE_CHECKS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, ensure};
    use std::fs;

    #[test]
    fn workspace_files_are_written_inside_the_bundle() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let bundle = bundle_path(dir.path(), "Demo");
        write_workspace(&bundle)?;
        let contents =
            fs::read_to_string(bundle.join("project.xcworkspace/contents.xcworkspacedata"))?;
        ensure!(contents.contains("location = \"self:\""));
        ensure!(
            bundle
                .join("project.xcworkspace/xcshareddata/IDEWorkspaceChecks.plist")
                .is_file()
        );
        Ok(())
    }

    #[test]
    fn bundles_resolve_to_their_manifest() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let bundle = bundle_path(dir.path(), "Demo");
        fs::create_dir_all(&bundle)?;
        ensure!(manifest_path(&bundle) == bundle.join(MANIFEST_FILE));
        let file = bundle.join(MANIFEST_FILE);
        ensure!(manifest_path(&file) == file);
        Ok(())
    }
}
