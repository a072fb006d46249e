//! Prompt extractor CLI entrypoint.
//!
//! Resolves the run configuration once, wires the system tools into the
//! pipeline and processes every file given on the command line. Only
//! configuration errors change the exit status.

use clap::Parser;
use prompt_extract::cli::Cli;
use prompt_extract::config::{RunConfig, recipient_from_env};
use prompt_extract::error::Result;
use prompt_extract::logging;
use prompt_extract::output::{DryRunInfo, summary_message, write_stderr_line};
use prompt_extract::pipeline::{Collaborators, Pipeline};
use prompt_extract::retention::ConsolePrompt;
use prompt_extract::tools::{
    CommandExecutor, ExternalCompressor, GpgEncryptor, ImageMagickConverter,
    SystemCommandExecutor,
};
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    if let Err(err) = logging::init(cli.verbosity, cli.quiet) {
        write_stderr_line(&mut stderr, format!("logging unavailable: {err}"));
    }

    let executor = SystemCommandExecutor;
    let run_result = run(&cli, recipient_from_env(), &executor, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(
    cli: &Cli,
    env_recipient: Option<String>,
    executor: &dyn CommandExecutor,
    stderr: &mut dyn Write,
) -> Result<()> {
    let config = RunConfig::resolve(cli, env_recipient, executor)?;
    let converter = ImageMagickConverter::detect(executor);

    // Dry-run mode: show what would be done without side effects
    if cli.dry_run {
        let info = DryRunInfo {
            config: &config,
            converter: converter.program(),
            files: &cli.files,
        };
        write_stderr_line(stderr, info.display_text());
        return Ok(());
    }

    let compressor = ExternalCompressor::new(executor);
    let encryptor = GpgEncryptor::new(executor);
    let prompt = ConsolePrompt::stdio();
    let tools = Collaborators {
        compressor: &compressor,
        encryptor: &encryptor,
        converter: &converter,
        decisions: &prompt,
    };

    let summary = Pipeline::new(&config, tools).run(&cli.files);
    if !cli.quiet {
        write_stderr_line(stderr, summary_message(&summary));
    }
    Ok(())
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, err);
            1
        }
    }
}
