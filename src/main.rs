use apk_repack::cli::commands::{ConfigCommand, RunCommand};
use apk_repack::cli::output::*;
use apk_repack::cli::{Cli, Command};
use apk_repack::core::config::ToolsConfig;
use apk_repack::core::{error_chain, PatchOptions, PipelineOptions, RepackPipeline, RunReport};
use apk_repack::execution::ExecutionEngine;
use apk_repack::tools::Toolbox;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{}", e))
        .context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Run(cmd) => run_repack(cmd).await?,
        Command::Config(cmd) => show_config(cmd)?,
    }

    Ok(())
}

/// Scratch directory for one run; temporary ones are removed on drop
///
/// An explicit directory is only created by the prerequisite check, so a
/// run that fails its prerequisites leaves the filesystem untouched.
enum Scratch {
    Kept(PathBuf),
    Temporary(tempfile::TempDir),
}

impl Scratch {
    fn prepare(requested: Option<&PathBuf>) -> Result<Self> {
        match requested {
            Some(dir) => Ok(Scratch::Kept(dir.clone())),
            None => {
                let dir = tempfile::Builder::new()
                    .prefix("apk-repack-")
                    .tempdir()
                    .context("Failed to create temporary directory")?;
                Ok(Scratch::Temporary(dir))
            }
        }
    }

    fn path(&self) -> PathBuf {
        match self {
            Scratch::Kept(dir) => dir.clone(),
            Scratch::Temporary(dir) => dir.path().to_path_buf(),
        }
    }
}

async fn run_repack(cmd: &RunCommand) -> Result<()> {
    let config = ToolsConfig::load(cmd.tools.as_deref()).context("Failed to load tool configuration")?;
    let scratch = Scratch::prepare(cmd.tmp_dir.as_ref())?;

    let options = PipelineOptions {
        input_path: cmd.input.clone(),
        tmp_dir: scratch.path(),
        output_path: cmd.output.clone(),
        skip_patches: cmd.skip_patches,
        wait: cmd.wait,
        patch: PatchOptions {
            debuggable: cmd.debuggable,
            certificate_path: cmd.certificate.clone(),
        },
        tools: Toolbox::from_config(&config),
    };

    let pipeline = RepackPipeline::new(options);
    let engine = ExecutionEngine::new();

    let term = report_term(cmd.json);
    let console = Arc::new(ConsoleOutput::with_term(term.clone()));
    engine.add_event_handler(move |event| console.handle(event));

    let mut report = RunReport::new(pipeline.run_id());
    let result = pipeline.execute(&engine, &mut report).await;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    match result {
        Ok(()) => {
            term.write_line(&format!(
                "\n{} Signed APK written to {}",
                CHECK,
                style(cmd.output.display()).bold()
            ))?;
            Ok(())
        }
        Err(e) => {
            term.write_line(&format!(
                "\n{} {} {}",
                CROSS,
                style(&e.step).bold(),
                style("failed").red()
            ))?;
            for record in &report.records {
                term.write_line(&format!(
                    "  {}{} {}",
                    "  ".repeat(record.depth),
                    record.title,
                    format_step_state(&record.state)
                ))?;
            }
            error!("{}", error_chain(&e));
            if let Scratch::Kept(dir) = &scratch {
                term.write_line(&format!(
                    "{} Intermediate files kept in {}",
                    INFO,
                    style(dir.display()).dim()
                ))?;
            }
            drop(scratch);
            std::process::exit(1);
        }
    }
}

fn show_config(cmd: &ConfigCommand) -> Result<()> {
    let term = report_term(cmd.json);
    term.write_line(&format!("{} Validating tool configuration...", INFO))?;

    match ToolsConfig::load(cmd.tools.as_deref()) {
        Ok(config) => {
            term.write_line(&format!("{} Tool configuration is valid!", CHECK))?;
            term.write_line(&format!("  Java: {}", style(config.java.display()).bold()))?;
            term.write_line(&format!("  apktool: {}", style(config.apktool.display()).cyan()))?;
            term.write_line(&format!(
                "  uber-apk-signer: {}",
                style(config.uber_apk_signer.display()).cyan()
            ))?;
            if config.patch_command.is_empty() {
                term.write_line(&format!("  Patch command: {}", style("none").dim()))?;
            } else {
                term.write_line(&format!(
                    "  Patch command: {}",
                    style(config.patch_command.join(" ")).cyan()
                ))?;
            }

            if cmd.json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            Ok(())
        }
        Err(e) => {
            term.write_line(&format!("{} Validation failed:", CROSS))?;
            term.write_line(&format!("  {}", style(format!("{:#}", e)).red()))?;
            std::process::exit(1);
        }
    }
}
