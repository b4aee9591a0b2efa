//! pbxgen core library.
//!
//! This library generates Xcode `project.pbxproj` manifests from a source
//! tree and patches existing manifests with new files. Generation flows
//! through [`scan`], [`graph`] and [`pbx_gen`]; incremental updates go
//! through [`patch`]. Node identifiers come from [`token`], and the fixed
//! parts of a project are described by [`config`].

pub mod cli;
pub mod config;
pub mod graph;
pub mod patch;
pub mod pbx_gen;
pub mod runner;
pub mod scan;
pub mod token;
