//! makopjltest CLI tool
//!
//! Reports the PJL duplex settings and the print tickets of every job in a
//! directory of print files, optionally writing each job as a PDF.

use anyhow::Context;
use clap::Parser;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use pjl_ticket_report::config::{RunOptions, DEFAULT_PDF_DIR};
use pjl_ticket_report::driver::{process_directory, Engine};
use pjl_ticket_report::Error;

/// makopjltest - Report PJL settings and print tickets of print jobs
#[derive(Parser)]
#[command(name = "makopjltest")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Report every job in a directory
    makopjltest jobs

    # Report and write jobs/PDF/<name>.pdf for each job
    makopjltest jobs -c

    # Verbose diagnostics on stderr
    RUST_LOG=debug makopjltest jobs")]
struct Cli {
    /// Directory of print files (not searched recursively)
    directory: PathBuf,

    /// Convert each parsed job to PDF
    #[arg(short = 'c', long)]
    convert: bool,

    /// Name of the PDF output directory created inside <DIRECTORY>
    #[arg(long, default_value = DEFAULT_PDF_DIR)]
    pdf_dir: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        match e.downcast_ref::<Error>() {
            Some(error) => {
                eprintln!("Exception thrown: {}", error);
                process::exit(exit_code(error));
            }
            None => {
                eprintln!("Error: {:#}", e);
                process::exit(1);
            }
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let options = RunOptions {
        directory: cli.directory,
        convert: cli.convert,
        pdf_dir_name: cli.pdf_dir,
    };

    let mut engine = Engine::new();
    engine.enable_all_features();

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let result = process_directory(&engine, &options, &mut out);
    out.flush().context("Failed to flush report to stdout")?;
    result?;

    Ok(())
}

/// Library error code where wide exit codes are accepted, 1 elsewhere
#[cfg(windows)]
fn exit_code(error: &Error) -> i32 {
    error.code() as i32
}

#[cfg(not(windows))]
fn exit_code(_error: &Error) -> i32 {
    1
}
