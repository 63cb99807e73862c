//! Manual-source aggregation for wide line × material grids.
//!
//! Users paste the grid repeatedly across entry sessions, so both axes can
//! carry duplicates: material columns arrive as `40001`, `40001.1`, ... and
//! the same line can appear on several rows. Duplicates are never
//! overwritten; they are summed in two explicit passes:
//!
//! 1. [`collapse_duplicate_columns`] sums columns that share a material id.
//! 2. [`collapse_duplicate_rows`] sums long-format rows that share a
//!    (line, material) key.

use std::{
    collections::{BTreeMap, HashMap},
    sync::LazyLock,
};

use log::{debug, info};
use regex::Regex;

use crate::{
    config::ReconConfig,
    data::{normalize_id, try_parse_quantity},
    error::MissingColumn,
    frame::{Cell, RawTable},
    reconcile::{AggregatedQuantity, Diagnostics},
};

static DUPLICATE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.\d+$").expect("duplicate suffix pattern compiles"));

/// Recovers the label a reader suffixed to keep headers unique.
pub fn strip_duplicate_suffix(label: &str) -> &str {
    match DUPLICATE_SUFFIX.find(label) {
        Some(found) => &label[..found.start()],
        None => label,
    }
}

/// Locates the line column: a configured header, else the first header
/// mentioning "line", else the second column.
pub fn find_line_column(table: &RawTable, configured: Option<&str>) -> Result<usize, MissingColumn> {
    if let Some(name) = configured {
        let wanted = name.trim().to_lowercase();
        return table
            .headers()
            .iter()
            .position(|h| h.trim().to_lowercase() == wanted)
            .ok_or_else(|| MissingColumn::new(table.kind(), format!("line ('{name}')")));
    }
    if let Some(idx) = table
        .headers()
        .iter()
        .position(|h| h.to_lowercase().contains("line"))
    {
        return Ok(idx);
    }
    if table.width() >= 2 {
        Ok(1)
    } else {
        Err(MissingColumn::new(table.kind(), "line"))
    }
}

/// Wide grid after the horizontal pass: one column per distinct material.
#[derive(Debug, Clone, PartialEq)]
pub struct CollapsedGrid {
    pub materials: Vec<String>,
    pub lines: Vec<Cell>,
    pub values: Vec<Vec<f64>>,
}

impl CollapsedGrid {
    /// Reshapes to (line, material, quantity) triples with normalized text.
    /// Rows without a line label are skipped and counted.
    pub fn melt(&self, diagnostics: &mut Diagnostics) -> Vec<(String, String, f64)> {
        let mut long = Vec::with_capacity(self.lines.len() * self.materials.len());
        for (line_cell, values) in self.lines.iter().zip(&self.values) {
            let line = normalize_id(line_cell);
            if line.is_empty() {
                diagnostics.manual_rows_without_line += 1;
                continue;
            }
            for (material, quantity) in self.materials.iter().zip(values) {
                long.push((line.clone(), material.trim().to_string(), *quantity));
            }
        }
        long
    }
}

/// Pass 1: parses every material cell and sums columns sharing a material id,
/// keeping first-appearance column order.
pub fn collapse_duplicate_columns(
    table: &RawTable,
    line_column: usize,
    config: &ReconConfig,
    diagnostics: &mut Diagnostics,
) -> CollapsedGrid {
    let mut materials: Vec<String> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut column_slots: Vec<(usize, usize)> = Vec::new();

    for (idx, header) in table.headers().iter().enumerate() {
        if idx == line_column {
            continue;
        }
        let material = strip_duplicate_suffix(header.trim()).to_string();
        if config.ignore_non_material_columns && !config.accepts_material(&material) {
            debug!("Ignoring manual column '{header}' outside accepted prefixes");
            diagnostics.manual_columns_ignored += 1;
            continue;
        }
        let slot = *slots.entry(material.clone()).or_insert_with(|| {
            materials.push(material);
            materials.len() - 1
        });
        column_slots.push((idx, slot));
    }

    let mut lines = Vec::with_capacity(table.len());
    let mut values = Vec::with_capacity(table.len());
    for row in table.rows() {
        let mut sums = vec![0.0; materials.len()];
        for &(column, slot) in &column_slots {
            let quantity = match try_parse_quantity(&row[column]) {
                Some(value) => value,
                None => {
                    diagnostics.manual_coerced_cells += 1;
                    0.0
                }
            };
            sums[slot] += quantity;
        }
        lines.push(row[line_column].clone());
        values.push(sums);
    }

    CollapsedGrid {
        materials,
        lines,
        values,
    }
}

/// Pass 2: sums long-format rows sharing a (line, material) key.
pub fn collapse_duplicate_rows(long: Vec<(String, String, f64)>) -> Vec<AggregatedQuantity> {
    let mut totals: BTreeMap<(String, String), f64> = BTreeMap::new();
    for (line, material, quantity) in long {
        *totals.entry((line, material)).or_insert(0.0) += quantity;
    }
    totals
        .into_iter()
        .map(|((line, material), quantity)| AggregatedQuantity {
            line,
            material,
            quantity,
            category: None,
        })
        .collect()
}

/// Runs both passes over a manual grid whose line column is already known.
pub fn aggregate_manual(
    table: &RawTable,
    line_column: usize,
    config: &ReconConfig,
    diagnostics: &mut Diagnostics,
) -> Vec<AggregatedQuantity> {
    let grid = collapse_duplicate_columns(table, line_column, config, diagnostics);
    debug!(
        "Manual grid: {} column(s) collapsed to {} material(s)",
        table.width().saturating_sub(1),
        grid.materials.len()
    );
    let long = grid.melt(diagnostics);
    let rows = collapse_duplicate_rows(long);
    if diagnostics.manual_coerced_cells > 0 {
        info!(
            "{} manual cell(s) could not be read as quantities and count as zero",
            diagnostics.manual_coerced_cells
        );
    }
    rows
}
