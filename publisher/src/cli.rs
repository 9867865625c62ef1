//! CLI argument definitions for the `modpack` tool.
//!
//! The entrypoint only orchestrates; argument parsing lives here so it can be
//! tested without running a build.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Build modpack manifests and publish them as GitHub releases.
#[derive(Parser, Debug)]
#[command(name = "modpack")]
#[command(version, about)]
#[command(long_about = concat!(
    "Build modpack manifests and publish them as GitHub releases.\n\n",
    "`build` scans the modpack tree, fingerprints every file with SHA-1, bumps ",
    "the patch version and writes the manifest and version file. `release` ",
    "packages the files the manifest lists and publishes them, together with ",
    "the manifest and version file, as a GitHub release.\n\n",
    "Settings are read from modpack.toml in the working directory when present.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Build the manifest for the current directory:\n",
    "    $ modpack build\n\n",
    "  Build and publish in one go (requires GITHUB_TOKEN):\n",
    "    $ modpack release --build\n\n",
    "  Use an explicit settings file with debug logging:\n",
    "    $ modpack --config pack/modpack.toml -vv build",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Settings file (defaults to modpack.toml).
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Only report errors.
    #[arg(short, long, global = true, conflicts_with = "verbosity")]
    pub quiet: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Scan the tree and write a new manifest and version.
    Build,

    /// Package and publish the current build as a release.
    Release(ReleaseArgs),
}

/// Arguments for the release command.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseArgs {
    /// Run a build before publishing.
    #[arg(long)]
    pub build: bool,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
