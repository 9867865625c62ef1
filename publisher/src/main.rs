//! `modpack` CLI entrypoint.
//!
//! `build` writes a fresh manifest and version file for the modpack tree.
//! `release` publishes the current build as a GitHub release.

use chrono::Utc;
use clap::Parser;
use modpack::builder::{BuildParams, build_manifest};
use modpack::config::{Config, load_config};
use modpack::notifier::notifier_for;
use modpack_publisher::cli::{Cli, Command, ReleaseArgs};
use modpack_publisher::error::Result;
use modpack_publisher::logging;
use modpack_publisher::publish::{publish_release, read_token};
use modpack_publisher::release::GithubReleaseApi;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbosity, cli.quiet);
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    let config = load_config(Config::default(), cli.config.as_deref())?;
    let mut sink = std::io::sink();
    let progress: &mut dyn Write = if cli.quiet { &mut sink } else { stderr };

    match &cli.command {
        Command::Build => run_build(&config, progress),
        Command::Release(args) => run_release(&config, args, progress),
    }
}

fn run_build(config: &Config, progress: &mut dyn Write) -> Result<()> {
    let output = build_manifest(&BuildParams::from_config(config))?;
    if output.version_source.is_fallback() {
        write_stderr_line(
            progress,
            format!(
                "No valid version in {}; counting from {}",
                output.version_path, output.previous_version
            ),
        );
    }
    write_stderr_line(
        progress,
        format!(
            "Built {} {} ({} files) -> {}",
            output.manifest.modpack_name,
            output.version(),
            output.manifest.files.len(),
            output.manifest_path
        ),
    );
    Ok(())
}

fn run_release(config: &Config, args: &ReleaseArgs, progress: &mut dyn Write) -> Result<()> {
    // Checked first so a missing token never leaves a half-finished build.
    let token = read_token()?;

    if args.build {
        run_build(config, progress)?;
    }

    let api = GithubReleaseApi::new(config.release.repository.clone(), token);
    let outcome = publish_release(config, &api, Utc::now(), progress)?;
    if let Some(url) = &outcome.release.html_url {
        write_stderr_line(progress, format!("Release page: {url}"));
    }

    notifier_for(config.release.notify).notify();
    Ok(())
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            1
        }
    }
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}
