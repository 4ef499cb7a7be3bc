//! Command-line interface for the Falcon accelerator program compiler.
//!
//! Emits sign/verify programs, lists existing artifacts and runs the
//! dataflow checker over freshly compiled programs.

#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use falconhw_cli::{commands, logging, OutputFormat};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "falconhw",
    about = "Compiles Falcon signing and verification into accelerator programs",
    version
)]
struct Cli {
    /// Global log level (trace|debug|info|warn|error); defaults to RUST_LOG or info
    #[arg(
        long,
        global = true,
        value_parser = ["trace", "debug", "info", "warn", "error"],
    )]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Compile a program and write it out
    Emit(EmitArgs),
    /// List a literal array or binary image
    Disasm(DisasmArgs),
    /// Compile a program and run the dataflow checker over it
    Check(CheckArgs),
}

#[derive(clap::Args, Debug, Clone)]
struct EmitArgs {
    /// Program to emit (sign|verify)
    program: String,
    /// Polynomial degree, a power of two from 2 to 1024
    #[arg(long, default_value_t = 512)]
    degree: u32,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Sv)]
    format: OutputFormat,
    /// Write to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
struct DisasmArgs {
    /// Literal array (.sv) or binary image
    path: PathBuf,
}

#[derive(clap::Args, Debug, Clone)]
struct CheckArgs {
    /// Program to check (sign|verify)
    program: String,
    /// Polynomial degree
    #[arg(long, default_value_t = 512)]
    degree: u32,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_with_level(cli.log_level.as_deref());

    match cli.command {
        Command::Emit(args) => {
            let bytes = commands::emit_program(&args.program, args.degree, args.format)?;
            match args.output {
                Some(path) => {
                    fs::write(&path, &bytes)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!(path = %path.display(), bytes = bytes.len(), "wrote program");
                }
                None => io::stdout()
                    .write_all(&bytes)
                    .context("failed to write to stdout")?,
            }
        }
        Command::Disasm(args) => {
            let bytes = fs::read(&args.path)
                .with_context(|| format!("failed to read {}", args.path.display()))?;
            print!("{}", commands::disasm(&bytes)?);
        }
        Command::Check(args) => {
            print!("{}", commands::check(&args.program, args.degree)?);
        }
    }
    Ok(())
}
