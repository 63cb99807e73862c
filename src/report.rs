//! Rendering and writing of reconciliation results.
//!
//! The core hands over plain numbers; this module is the only place that
//! formats them for people (two decimals, thousands separators, a `*` marker
//! on flagged rows) or serializes them for other tools.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};

use crate::{
    io_utils,
    reconcile::{AggregatedQuantity, ReconReport, ReconStatus, ReconciledRow},
    table::{self, Align},
};

pub const RECONCILED_HEADERS: [&str; 7] = [
    "line",
    "category",
    "material",
    "qty_authoritative",
    "qty_manual",
    "variance",
    "flagged",
];

pub const AGGREGATE_HEADERS: [&str; 4] = ["line", "category", "material", "quantity"];

/// Formats like `1,234.50`; negative zero prints as `0.00`.
pub fn format_quantity(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (integral, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(integral.len() + integral.len() / 3);
    for (idx, digit) in integral.chars().enumerate() {
        if idx > 0 && (integral.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let is_zero = fixed.chars().all(|c| c == '0' || c == '.');
    if value < 0.0 && !is_zero {
        format!("-{grouped}.{fraction}")
    } else {
        format!("{grouped}.{fraction}")
    }
}

fn selected_rows(report: &ReconReport, only_differences: bool) -> Vec<&ReconciledRow> {
    report
        .rows
        .iter()
        .filter(|row| !only_differences || row.flagged)
        .collect()
}

fn status_label(status: ReconStatus) -> &'static str {
    match status {
        ReconStatus::Match => "MATCH",
        ReconStatus::Unmatch => "UNMATCH",
    }
}

pub fn render_report(report: &ReconReport, only_differences: bool) -> String {
    let headers = ["line", "category", "material", "authoritative", "manual", "variance", ""]
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();
    let rows = selected_rows(report, only_differences)
        .into_iter()
        .map(|row| {
            vec![
                row.line.clone(),
                row.category.to_string(),
                row.material.clone(),
                format_quantity(row.qty_authoritative),
                format_quantity(row.qty_manual),
                format_quantity(row.variance),
                if row.flagged { "*".into() } else { String::new() },
            ]
        })
        .collect::<Vec<_>>();
    let aligns = [
        Align::Left,
        Align::Left,
        Align::Left,
        Align::Right,
        Align::Right,
        Align::Right,
        Align::Left,
    ];
    let mut output = table::render_aligned(&headers, &rows, &aligns);
    output.push('\n');
    output.push_str(&format!(
        "Total variance: {}\n",
        format_quantity(report.total_variance)
    ));
    output.push_str(&format!(
        "Status: {} ({} of {} pair(s) differ by more than {})\n",
        status_label(report.status),
        report.flagged_count(),
        report.rows.len(),
        report.tolerance
    ));
    output
}

pub fn write_report_delimited(
    report: &ReconReport,
    path: Option<&Path>,
    delimiter: u8,
    only_differences: bool,
) -> Result<()> {
    let mut writer = io_utils::open_csv_writer(path, delimiter)?;
    writer
        .write_record(RECONCILED_HEADERS)
        .context("Writing reconciliation headers")?;
    for row in selected_rows(report, only_differences) {
        writer
            .write_record([
                row.line.clone(),
                row.category.to_string(),
                row.material.clone(),
                row.qty_authoritative.to_string(),
                row.qty_manual.to_string(),
                row.variance.to_string(),
                row.flagged.to_string(),
            ])
            .context("Writing reconciliation row")?;
    }
    writer.flush().context("Flushing reconciliation output")?;
    Ok(())
}

pub fn render_aggregates(rows: &[AggregatedQuantity]) -> String {
    let headers = AGGREGATE_HEADERS.iter().map(|h| h.to_string()).collect::<Vec<_>>();
    let body = rows
        .iter()
        .map(|row| {
            vec![
                row.line.clone(),
                row.category.map(|c| c.to_string()).unwrap_or_default(),
                row.material.clone(),
                format_quantity(row.quantity),
            ]
        })
        .collect::<Vec<_>>();
    table::render_aligned(
        &headers,
        &body,
        &[Align::Left, Align::Left, Align::Left, Align::Right],
    )
}

pub fn write_aggregates_delimited(
    rows: &[AggregatedQuantity],
    path: Option<&Path>,
    delimiter: u8,
) -> Result<()> {
    let mut writer = io_utils::open_csv_writer(path, delimiter)?;
    writer
        .write_record(AGGREGATE_HEADERS)
        .context("Writing aggregate headers")?;
    for row in rows {
        writer
            .write_record([
                row.line.clone(),
                row.category.map(|c| c.to_string()).unwrap_or_default(),
                row.material.clone(),
                row.quantity.to_string(),
            ])
            .context("Writing aggregate row")?;
    }
    writer.flush().context("Flushing aggregate output")?;
    Ok(())
}

/// Pretty-printed JSON to `path`, or stdout when absent or `-`.
pub fn write_json<T: serde::Serialize>(value: &T, path: Option<&Path>) -> Result<()> {
    let mut writer: Box<dyn Write> = match path {
        Some(p) if !io_utils::is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(io::stdout()),
    };
    serde_json::to_writer_pretty(&mut writer, value).context("Serializing JSON output")?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
