//! End-to-end reconciliation over already-ingested tables.
//!
//! Column resolution happens for every table before any data is touched, so
//! a run with several unusable inputs reports all missing columns at once and
//! never produces partial output.

use log::{debug, info};

use crate::{
    config::ReconConfig,
    error::{MissingColumn, ReconError},
    frame::RawTable,
    manual,
    movements::{self, MappingColumns, MovementColumns, OrderLineMap},
    reconcile::{self, AggregatedQuantity, Diagnostics, ReconReport},
};

/// The three tables a reconciliation run consumes.
#[derive(Debug, Clone)]
pub struct ReconInputs {
    pub movements: RawTable,
    pub mapping: RawTable,
    pub manual: RawTable,
}

struct SourceColumns {
    movements: MovementColumns,
    mapping: MappingColumns,
}

fn resolve_source_columns(
    movements: &RawTable,
    mapping: &RawTable,
    config: &ReconConfig,
    missing: &mut Vec<MissingColumn>,
) -> Option<SourceColumns> {
    let movement_columns = match MovementColumns::resolve(movements, &config.keywords) {
        Ok(columns) => Some(columns),
        Err(absent) => {
            missing.extend(absent);
            None
        }
    };
    let mapping_columns = match MappingColumns::resolve(mapping, &config.keywords) {
        Ok(columns) => Some(columns),
        Err(absent) => {
            missing.extend(absent);
            None
        }
    };
    Some(SourceColumns {
        movements: movement_columns?,
        mapping: mapping_columns?,
    })
}

fn aggregate_with_columns(
    movements: &RawTable,
    mapping: &RawTable,
    columns: &SourceColumns,
    config: &ReconConfig,
    diagnostics: &mut Diagnostics,
) -> Vec<AggregatedQuantity> {
    let records = movements::read_movements(movements, &columns.movements, diagnostics);
    let map = OrderLineMap::from_table(mapping, &columns.mapping, config.shorten_line_labels);
    debug!(
        "Order mapping holds {} order(s) from {} row(s)",
        map.len(),
        mapping.len()
    );
    movements::aggregate_movements(&records, &map, config, diagnostics)
}

/// Authoritative quantities per (line, material), without a manual grid.
pub fn aggregate_authoritative(
    movements: &RawTable,
    mapping: &RawTable,
    config: &ReconConfig,
) -> Result<(Vec<AggregatedQuantity>, Diagnostics), ReconError> {
    config.validate()?;
    let mut missing = Vec::new();
    let Some(columns) = resolve_source_columns(movements, mapping, config, &mut missing) else {
        return Err(ReconError::InputShape(missing));
    };
    let mut diagnostics = Diagnostics::default();
    let rows = aggregate_with_columns(movements, mapping, &columns, config, &mut diagnostics);
    Ok((rows, diagnostics))
}

/// Full run: authoritative aggregation, manual aggregation, reconciliation.
pub fn run(inputs: &ReconInputs, config: &ReconConfig) -> Result<ReconReport, ReconError> {
    config.validate()?;
    let mut missing = Vec::new();
    let columns = resolve_source_columns(&inputs.movements, &inputs.mapping, config, &mut missing);
    let line_column =
        match manual::find_line_column(&inputs.manual, config.manual_line_column.as_deref()) {
            Ok(idx) => Some(idx),
            Err(absent) => {
                missing.push(absent);
                None
            }
        };
    let (Some(columns), Some(line_column)) = (columns, line_column) else {
        return Err(ReconError::InputShape(missing));
    };

    let mut diagnostics = Diagnostics::default();
    let authoritative = aggregate_with_columns(
        &inputs.movements,
        &inputs.mapping,
        &columns,
        config,
        &mut diagnostics,
    );
    let manual_rows = manual::aggregate_manual(&inputs.manual, line_column, config, &mut diagnostics);
    info!(
        "Aggregated {} authoritative and {} manual (line, material) pair(s)",
        authoritative.len(),
        manual_rows.len()
    );

    let rows = reconcile::reconcile(&authoritative, &manual_rows, config);
    let report = reconcile::build_report(rows, config, diagnostics);
    info!(
        "Reconciled {} pair(s); {} differ beyond tolerance {}",
        report.rows.len(),
        report.flagged_count(),
        report.tolerance
    );
    Ok(report)
}
