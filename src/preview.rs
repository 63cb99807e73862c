use anyhow::Result;
use log::{info, warn};

use crate::{
    cli::PreviewArgs,
    columns::RoleKeywords,
    error::{ReconError, TableKind},
    frame::{LoadOptions, RawTable},
    io_utils, manual,
    movements::{MappingColumns, MovementColumns},
    table::{self, Align},
};

/// First `limit` rows of `table` as display strings, padded to the header width.
pub fn preview_rows(table: &RawTable, limit: usize) -> Vec<Vec<String>> {
    table
        .rows()
        .iter()
        .take(limit)
        .map(|row| row.iter().map(|cell| cell.as_display()).collect())
        .collect()
}

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let config = args.settings.to_config()?;
    let encoding = io_utils::resolve_encoding(args.read.input_encoding.as_deref())?;
    let kind = TableKind::from(args.source);
    let table = RawTable::load(
        kind,
        &args.input,
        &LoadOptions {
            delimiter: args.read.delimiter,
            encoding: Some(encoding),
            sheet: args.sheet.clone(),
        },
    )?;

    let rows = preview_rows(&table, args.rows);
    table::print_table(table.headers(), &rows, &[Align::Left]);
    info!(
        "Displayed {} of {} row(s) from {:?}",
        rows.len(),
        table.len(),
        args.input
    );
    log_detected_columns(&table, &config.keywords, config.manual_line_column.as_deref());
    Ok(())
}

fn log_detected_columns(
    table: &RawTable,
    keywords: &RoleKeywords,
    manual_line_column: Option<&str>,
) {
    let headers = table.headers();
    match table.kind() {
        TableKind::Movements => match MovementColumns::resolve(table, keywords) {
            Ok(cols) => info!(
                "Detected material '{}', order '{}', quantity '{}'",
                headers[cols.material], headers[cols.order], headers[cols.quantity]
            ),
            Err(missing) => warn!("{}", ReconError::InputShape(missing)),
        },
        TableKind::Mapping => match MappingColumns::resolve(table, keywords) {
            Ok(cols) => info!(
                "Detected order '{}', line '{}'",
                headers[cols.order], headers[cols.line]
            ),
            Err(missing) => warn!("{}", ReconError::InputShape(missing)),
        },
        TableKind::Manual => match manual::find_line_column(table, manual_line_column) {
            Ok(idx) => info!(
                "Detected line column '{}' and {} material column(s)",
                headers[idx],
                table.width() - 1
            ),
            Err(missing) => warn!("{}", ReconError::InputShape(vec![missing])),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_limits_rows_and_renders_cells() {
        let table = RawTable::from_strings(
            TableKind::Manual,
            &["Line", "40001"],
            &[&["A", "1"], &["B", ""], &["C", "3"]],
        );
        let rows = preview_rows(&table, 2);
        assert_eq!(rows, vec![vec!["A", "1"], vec!["B", ""]]);
    }
}
