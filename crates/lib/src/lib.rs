//! buildpack-lib: Build and test pipelines driven by buildpacks
//!
//! A buildpack is a directory of files plus a `cmds.yml` naming four stage
//! commands. This crate provides the pieces that apply one to a repository:
//! - `workspace`: allocates a fresh directory per run
//! - `fetch`: clones a repository or copies a local tree
//! - `buildpack`: resolves a buildpack and links its files into a workspace
//! - `runner`: runs a command line, streaming its output to the log
//! - `pipeline`: composes the above into the Build and Test flows

pub mod buildpack;
pub mod config;
pub mod consts;
pub mod fetch;
pub mod pipeline;
pub mod platform;
pub mod runner;
pub mod util;
pub mod workspace;
