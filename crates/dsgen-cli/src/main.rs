mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use dsgen_core::{CoreError, Session, Table, session_json_schema};
use dsgen_generate::{
    Driver, FileSink, GenerationError, RunReport, SyntheticRowProducer, TableStatus,
};
use logging::init_logging;
use thiserror::Error;

#[derive(Debug, Error)]
enum CliError {
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("logging error: {0}")]
    Logging(String),
}

#[derive(Parser, Debug)]
#[command(name = "dsgen", version, about = "Benchmark table generator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate table files.
    Generate(GenerateArgs),
    /// List the table catalog.
    Tables(TablesArgs),
    /// Print the JSON Schema of the session config file.
    Schema,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Session config file (TOML). Flags override its values.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Generate only this table.
    #[arg(long)]
    table: Option<Table>,
    /// Scale factor.
    #[arg(long)]
    scale: Option<f64>,
    /// Output directory, created when missing.
    #[arg(long, value_name = "DIR")]
    dir: Option<String>,
    /// File name suffix.
    #[arg(long)]
    suffix: Option<String>,
    /// Number of chunks each table is split into.
    #[arg(long)]
    parallelism: Option<u64>,
    /// Chunk to generate, 1-based.
    #[arg(long)]
    chunk: Option<u64>,
    /// Generate every chunk concurrently.
    #[arg(long, default_value_t = false)]
    all_chunks: bool,
    /// Generate child tables on their own instead of with their parent.
    #[arg(long, default_value_t = false)]
    no_family: bool,
    /// Remove existing output files first.
    #[arg(long, default_value_t = false)]
    overwrite: bool,
    /// Update run number.
    #[arg(long)]
    update: Option<u32>,
    /// Producer seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Print the run report as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
    /// Append JSON logs to this file instead of stderr.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct TablesArgs {
    /// Scale factor used for row counts.
    #[arg(long, default_value_t = 1.0)]
    scale: f64,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Tables(args) => {
            print!("{}", render_tables(args.scale));
            Ok(())
        }
        Command::Schema => print_schema(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_generate(args: GenerateArgs) -> Result<(), CliError> {
    init_logging(args.log_file.as_deref())?;

    let session = resolve_session(&args)?;
    std::fs::create_dir_all(&session.target_directory)?;

    let producer = SyntheticRowProducer::new(session.seed, session.scale, session.row_format());
    let driver = Driver::new(producer, FileSink::new());
    let report = driver.run(&session)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_report(&report));
    }
    Ok(())
}

/// Session from the config file (or defaults) with flags applied on top.
fn resolve_session(args: &GenerateArgs) -> Result<Session, CliError> {
    let mut session = match &args.config {
        Some(path) => Session::load(path)?,
        None => Session::default(),
    };

    if let Some(table) = args.table {
        session.table = Some(table);
    }
    if let Some(scale) = args.scale {
        session.scale = scale;
    }
    if let Some(dir) = &args.dir {
        session.target_directory = dir.clone();
    }
    if let Some(suffix) = &args.suffix {
        session.suffix = suffix.clone();
    }
    if let Some(parallelism) = args.parallelism {
        session.parallelism = parallelism;
    }
    if let Some(chunk) = args.chunk {
        session.chunk_number = chunk;
    }
    if let Some(update) = args.update {
        session.update = Some(update);
    }
    if let Some(seed) = args.seed {
        session.seed = seed;
    }
    session.generate_all_chunks |= args.all_chunks;
    session.overwrite |= args.overwrite;
    if args.no_family {
        session.family_run = false;
    }

    session.validate()?;
    Ok(session)
}

fn render_report(report: &RunReport) -> String {
    let mut out = String::new();
    for table in &report.tables {
        match table.status {
            TableStatus::Generated => {
                out.push_str(&format!(
                    "{:<24} chunk {:<4} rows {:<20} {}\n",
                    table.table,
                    table.chunk,
                    table.range.to_string(),
                    table.locations.join(", ")
                ));
            }
            TableStatus::Skipped => {
                out.push_str(&format!(
                    "{:<24} chunk {:<4} skipped (generated with its parent)\n",
                    table.table, table.chunk
                ));
            }
        }
    }
    out.push_str(&format!(
        "run {}: {} table chunk(s) in {} ms\n",
        report.run_id,
        report.generated().count(),
        report.duration_ms
    ));
    out
}

fn render_tables(scale: f64) -> String {
    let mut out = String::new();
    for table in Table::ALL {
        let family = match (table.child(), table.as_child()) {
            (Some(child), _) => format!("parent of {child}"),
            (None, Some(child)) => format!("child of {}", child.parent()),
            (None, None) => String::new(),
        };
        out.push_str(&format!(
            "{:<24}{:>14}  {}\n",
            table.name(),
            table.row_count(scale),
            family
        ));
    }
    out
}

fn print_schema() -> Result<(), CliError> {
    let schema = session_json_schema();
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
