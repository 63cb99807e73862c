//! Zero-filled manual entry grids derived from the authoritative movements.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::TemplateArgs,
    error::TableKind,
    frame::{LoadOptions, RawTable},
    io_utils, pipeline,
    reconcile::AggregatedQuantity,
};

pub const LINE_HEADER: &str = "Line";

/// Grid headers and rows: one row per line, one column per material, every
/// quantity cell `0`. Both axes are sorted ascending.
pub fn build_template(aggregates: &[AggregatedQuantity]) -> (Vec<String>, Vec<Vec<String>>) {
    let lines = aggregates
        .iter()
        .map(|row| row.line.as_str())
        .collect::<BTreeSet<_>>();
    let materials = aggregates
        .iter()
        .map(|row| row.material.as_str())
        .collect::<BTreeSet<_>>();

    let mut headers = Vec::with_capacity(materials.len() + 1);
    headers.push(LINE_HEADER.to_string());
    headers.extend(materials.iter().map(|m| m.to_string()));

    let rows = lines
        .into_iter()
        .map(|line| {
            let mut row = Vec::with_capacity(headers.len());
            row.push(line.to_string());
            row.extend(std::iter::repeat_n("0".to_string(), materials.len()));
            row
        })
        .collect();
    (headers, rows)
}

pub fn execute(args: &TemplateArgs) -> Result<()> {
    let config = args.settings.to_config()?;
    io_utils::ensure_single_stdin(&[
        args.sources.movements.as_path(),
        args.sources.mapping.as_path(),
    ])?;
    let encoding = io_utils::resolve_encoding(args.read.input_encoding.as_deref())?;
    let movements = RawTable::load(
        TableKind::Movements,
        &args.sources.movements,
        &LoadOptions {
            delimiter: args.read.delimiter,
            encoding: Some(encoding),
            sheet: args.sources.movements_sheet.clone(),
        },
    )?;
    let mapping = RawTable::load(
        TableKind::Mapping,
        &args.sources.mapping,
        &LoadOptions {
            delimiter: args.read.delimiter,
            encoding: Some(encoding),
            sheet: args.sources.mapping_sheet.clone(),
        },
    )?;
    let (aggregates, _) = pipeline::aggregate_authoritative(&movements, &mapping, &config)?;
    let (headers, rows) = build_template(&aggregates);

    let output = args.output.as_deref();
    let delimiter = io_utils::resolve_output_delimiter(
        output,
        args.output_delimiter,
        io_utils::DEFAULT_TSV_DELIMITER,
    );
    let mut writer = io_utils::open_csv_writer(output, delimiter)?;
    writer
        .write_record(&headers)
        .context("Writing template headers")?;
    for row in &rows {
        writer.write_record(row).context("Writing template row")?;
    }
    writer.flush().context("Flushing template output")?;
    info!(
        "Template with {} line(s) and {} material(s) written",
        rows.len(),
        headers.len() - 1
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agg(line: &str, material: &str) -> AggregatedQuantity {
        AggregatedQuantity {
            line: line.into(),
            material: material.into(),
            quantity: 3.0,
            category: None,
        }
    }

    #[test]
    fn grid_covers_every_line_and_material_sorted() {
        let (headers, rows) = build_template(&[
            agg("LINE 02", "40002"),
            agg("LINE 01", "40001"),
            agg("LINE 02", "40001"),
        ]);
        assert_eq!(headers, vec!["Line", "40001", "40002"]);
        assert_eq!(
            rows,
            vec![
                vec!["LINE 01", "0", "0"],
                vec!["LINE 02", "0", "0"],
            ]
        );
    }

    #[test]
    fn empty_aggregates_give_header_only() {
        let (headers, rows) = build_template(&[]);
        assert_eq!(headers, vec!["Line"]);
        assert!(rows.is_empty());
    }
}
