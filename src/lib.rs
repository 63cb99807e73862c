pub mod category;
pub mod cli;
pub mod columns;
pub mod config;
pub mod data;
pub mod error;
pub mod frame;
pub mod io_utils;
pub mod manual;
pub mod movements;
pub mod pipeline;
pub mod preview;
pub mod reconcile;
pub mod report;
pub mod table;
pub mod template;

use std::{env, fs, path::Path, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use encoding_rs::Encoding;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{AggregateArgs, Cli, Commands, OutputFormat, ReconcileArgs},
    error::TableKind,
    frame::{LoadOptions, RawTable},
    pipeline::ReconInputs,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("line_recon", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Reconcile(args) => handle_reconcile(&args),
        Commands::Aggregate(args) => handle_aggregate(&args),
        Commands::Template(args) => template::execute(&args),
        Commands::Preview(args) => preview::execute(&args),
    }
}

fn load_table(
    kind: TableKind,
    path: &Path,
    sheet: Option<&str>,
    delimiter: Option<u8>,
    encoding: &'static Encoding,
) -> Result<RawTable> {
    info!(
        "Reading {kind} table from '{}' using delimiter '{}'",
        path.display(),
        printable_delimiter(io_utils::resolve_input_delimiter(path, delimiter))
    );
    let table = RawTable::load(
        kind,
        path,
        &LoadOptions {
            delimiter,
            encoding: Some(encoding),
            sheet: sheet.map(str::to_string),
        },
    )?;
    debug!(
        "{kind} table has {} row(s) and columns {:?}",
        table.len(),
        table.headers()
    );
    Ok(table)
}

/// Explicit `--format` wins; otherwise `.json` outputs get JSON, other files
/// delimited text, and stdout an aligned table.
fn resolve_format(format: Option<OutputFormat>, output: Option<&Path>) -> OutputFormat {
    if let Some(format) = format {
        return format;
    }
    match output.filter(|p| !io_utils::is_dash(p)) {
        Some(path)
            if path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json")) =>
        {
            OutputFormat::Json
        }
        Some(_) => OutputFormat::Csv,
        None => OutputFormat::Table,
    }
}

fn emit_text(text: &str, output: Option<&Path>) -> Result<()> {
    match output.filter(|p| !io_utils::is_dash(p)) {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("Writing output to {path:?}"))
        }
        None => {
            print!("{text}");
            Ok(())
        }
    }
}

fn handle_reconcile(args: &ReconcileArgs) -> Result<()> {
    let config = args.settings.to_config()?;
    io_utils::ensure_single_stdin(&[
        args.sources.movements.as_path(),
        args.sources.mapping.as_path(),
        args.manual.as_path(),
    ])?;
    let encoding = io_utils::resolve_encoding(args.read.input_encoding.as_deref())?;
    let delimiter = args.read.delimiter;
    let inputs = ReconInputs {
        movements: load_table(
            TableKind::Movements,
            &args.sources.movements,
            args.sources.movements_sheet.as_deref(),
            delimiter,
            encoding,
        )?,
        mapping: load_table(
            TableKind::Mapping,
            &args.sources.mapping,
            args.sources.mapping_sheet.as_deref(),
            delimiter,
            encoding,
        )?,
        manual: load_table(
            TableKind::Manual,
            &args.manual,
            args.manual_sheet.as_deref(),
            delimiter,
            encoding,
        )?,
    };

    let report = pipeline::run(&inputs, &config)?;
    let output = args.output.as_deref();
    match resolve_format(args.format, output) {
        OutputFormat::Table => emit_text(
            &report::render_report(&report, args.only_differences),
            output,
        )?,
        OutputFormat::Csv => {
            let delimiter = io_utils::resolve_output_delimiter(
                output,
                None,
                io_utils::DEFAULT_CSV_DELIMITER,
            );
            report::write_report_delimited(&report, output, delimiter, args.only_differences)?;
        }
        OutputFormat::Json => report::write_json(&report, output)?,
    }
    if let Some(path) = output {
        info!("Reconciliation written to {path:?}");
    }
    Ok(())
}

fn handle_aggregate(args: &AggregateArgs) -> Result<()> {
    let config = args.settings.to_config()?;
    io_utils::ensure_single_stdin(&[
        args.sources.movements.as_path(),
        args.sources.mapping.as_path(),
    ])?;
    let encoding = io_utils::resolve_encoding(args.read.input_encoding.as_deref())?;
    let movements = load_table(
        TableKind::Movements,
        &args.sources.movements,
        args.sources.movements_sheet.as_deref(),
        args.read.delimiter,
        encoding,
    )?;
    let mapping = load_table(
        TableKind::Mapping,
        &args.sources.mapping,
        args.sources.mapping_sheet.as_deref(),
        args.read.delimiter,
        encoding,
    )?;
    let (rows, diagnostics) = pipeline::aggregate_authoritative(&movements, &mapping, &config)?;
    debug!("Aggregation diagnostics: {diagnostics:?}");

    let output = args.output.as_deref();
    match resolve_format(args.format, output) {
        OutputFormat::Table => emit_text(&report::render_aggregates(&rows), output)?,
        OutputFormat::Csv => {
            let delimiter = io_utils::resolve_output_delimiter(
                output,
                None,
                io_utils::DEFAULT_CSV_DELIMITER,
            );
            report::write_aggregates_delimited(&rows, output, delimiter)?;
        }
        OutputFormat::Json => report::write_json(&rows, output)?,
    }
    info!("Aggregated {} (line, material) pair(s)", rows.len());
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
