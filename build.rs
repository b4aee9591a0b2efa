//! Build script rendering the `pbxgen(1)` manual page, plus one page per
//! command, from the CLI definition.

use clap::CommandFactory;
use clap_mangen::Man;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

#[path = "src/cli.rs"]
#[expect(
    dead_code,
    reason = "Only type definitions are needed for man page generation"
)]
mod cli;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Regenerate the manual page when the CLI or metadata changes.
    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-env-changed=CARGO_PKG_VERSION");
    println!("cargo:rerun-if-env-changed=CARGO_PKG_NAME");
    println!("cargo:rerun-if-env-changed=CARGO_BIN_NAME");
    println!("cargo:rerun-if-env-changed=CARGO_PKG_DESCRIPTION");
    println!("cargo:rerun-if-env-changed=CARGO_PKG_AUTHORS");

    // Packagers expect man pages inside the crate directory under target/.
    let out_dir = PathBuf::from("target/generated-man");
    if out_dir.exists() {
        fs::remove_dir_all(&out_dir)?;
    }
    fs::create_dir_all(&out_dir)?;

    // The top-level page documents the entire command interface.
    let cmd = cli::Cli::command();
    let name = cmd.get_name().to_owned();
    let cargo_bin = env::var("CARGO_BIN_NAME")
        .or_else(|_| env::var("CARGO_PKG_NAME"))
        .unwrap_or_else(|_| name.clone());
    if name != cargo_bin {
        return Err(format!(
            "CLI name '{name}' differs from Cargo bin/package name '{cargo_bin}'; packaging expects {cargo_bin}.1"
        )
        .into());
    }
    // Each pbxgen command also gets its own `pbxgen-<command>.1` page.
    for required in SUBCOMMANDS {
        if cmd.find_subcommand(required).is_none() {
            return Err(format!("CLI is missing the '{required}' command").into());
        }
    }
    for sub in cmd.get_subcommands() {
        let title = format!("{cargo_bin}-{}", sub.get_name());
        let page = Man::new(sub.clone()).title(title.as_str());
        render(&page, &out_dir.join(format!("{title}.1")))?;
    }
    render(&Man::new(cmd), &out_dir.join(format!("{cargo_bin}.1")))
}

const SUBCOMMANDS: [&str; 2] = ["generate", "patch"];

fn render(man: &Man, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    fs::write(path, buf)?;
    Ok(())
}
