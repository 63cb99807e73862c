mod common;

use common::{MANUAL_CSV, MAPPING_CSV, MOVEMENTS_CSV};
use line_recon::{
    category::LineCategory,
    config::ReconConfig,
    error::{ReconError, TableKind},
    frame::RawTable,
    pipeline::{self, ReconInputs},
    reconcile::{ReconStatus, ReconciledRow},
};

fn table(kind: TableKind, text: &str, delimiter: u8) -> RawTable {
    RawTable::from_delimited(kind, text, delimiter).expect("parse table")
}

fn standard_inputs() -> ReconInputs {
    ReconInputs {
        movements: table(TableKind::Movements, MOVEMENTS_CSV, b','),
        mapping: table(TableKind::Mapping, MAPPING_CSV, b','),
        manual: table(TableKind::Manual, MANUAL_CSV, b','),
    }
}

fn find<'a>(rows: &'a [ReconciledRow], line: &str, material: &str) -> &'a ReconciledRow {
    rows.iter()
        .find(|r| r.line == line && r.material == material)
        .unwrap_or_else(|| panic!("missing pair ({line}, {material})"))
}

#[test]
fn matching_quantities_reconcile_to_zero() {
    let inputs = ReconInputs {
        movements: table(
            TableKind::Movements,
            "Material,Order,Quantity\n40001,A1,100\n",
            b',',
        ),
        mapping: table(TableKind::Mapping, "Order,Line\nA1,LINE 01\n", b','),
        manual: table(TableKind::Manual, "Line,40001\nLINE 01,100\n", b','),
    };
    let report = pipeline::run(&inputs, &ReconConfig::default()).expect("run");
    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].variance, 0.0);
    assert!(!report.rows[0].flagged);
    assert_eq!(report.total_variance, 0.0);
    assert_eq!(report.status, ReconStatus::Match);
}

#[test]
fn short_manual_entry_is_flagged() {
    let inputs = ReconInputs {
        movements: table(
            TableKind::Movements,
            "Material,Order,Quantity\n40001,A1,100\n",
            b',',
        ),
        mapping: table(TableKind::Mapping, "Order,Line\nA1,LINE 01\n", b','),
        manual: table(TableKind::Manual, "Line,40001\nLINE 01,90\n", b','),
    };
    let report = pipeline::run(&inputs, &ReconConfig::default()).expect("run");
    assert_eq!(report.rows[0].variance, 10.0);
    assert!(report.rows[0].flagged);
    assert_eq!(report.status, ReconStatus::Unmatch);
}

#[test]
fn standard_scenario_joins_both_sides() {
    let report = pipeline::run(&standard_inputs(), &ReconConfig::default()).expect("run");

    let keys = report
        .rows
        .iter()
        .map(|r| (r.category, r.line.as_str(), r.material.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(
        keys,
        vec![
            (LineCategory::Back, "LINE 40", "40001"),
            (LineCategory::Back, "LINE 40", "40002"),
            (LineCategory::Back, "Unknown Line", "40003"),
            (LineCategory::Front, "LINE 01", "40001"),
            (LineCategory::Front, "LINE 01", "40002"),
        ]
    );

    let line01 = find(&report.rows, "LINE 01", "40001");
    assert_eq!(line01.qty_authoritative, 100.0);
    assert_eq!(line01.qty_manual, 90.0);
    assert!(line01.flagged);

    let hinge = find(&report.rows, "LINE 40", "40002");
    assert_eq!(hinge.qty_authoritative, 1250.5);
    assert_eq!(hinge.qty_manual, 1250.5);
    assert!(!hinge.flagged);

    let unmapped = find(&report.rows, "Unknown Line", "40003");
    assert_eq!(unmapped.qty_manual, 0.0);
    assert_eq!(unmapped.variance, 3.0);

    assert!(report.rows.iter().all(|r| r.material != "39999"));
    assert_eq!(report.total_variance, 13.0);
    assert_eq!(report.flagged_count(), 2);

    let diagnostics = &report.diagnostics;
    assert_eq!(diagnostics.movement_rows, 5);
    assert_eq!(diagnostics.rows_outside_prefixes, 1);
    assert_eq!(diagnostics.unmapped_rows, 1);
}

#[test]
fn manual_only_pairs_are_kept() {
    let inputs = ReconInputs {
        movements: table(
            TableKind::Movements,
            "Material,Order,Quantity\n40001,A1,5\n",
            b',',
        ),
        mapping: table(TableKind::Mapping, "Order,Line\nA1,LINE 02\n", b','),
        manual: table(TableKind::Manual, "Line,40001,40009\nLINE 02,5,4\n", b','),
    };
    let report = pipeline::run(&inputs, &ReconConfig::default()).expect("run");
    let extra = find(&report.rows, "LINE 02", "40009");
    assert_eq!(extra.qty_authoritative, 0.0);
    assert_eq!(extra.variance, -4.0);
    assert_eq!(extra.category, LineCategory::Front);
}

#[test]
fn pasted_tsv_with_repeated_headers_collapses() {
    let inputs = ReconInputs {
        movements: table(
            TableKind::Movements,
            "Material\tOrder\tMenge\n40001\tA1\t25\n",
            b'\t',
        ),
        mapping: table(TableKind::Mapping, "Order\tLine\nA1\tLINE 03\n", b'\t'),
        manual: table(
            TableKind::Manual,
            "No\tLine\t40001\t40001\n1\tLINE 03\t10\t15\n",
            b'\t',
        ),
    };
    let report = pipeline::run(&inputs, &ReconConfig::default()).expect("run");
    let row = find(&report.rows, "LINE 03", "40001");
    assert_eq!(row.qty_manual, 25.0);
    assert_eq!(row.variance, 0.0);
    // "No" is not a material but the grid keeps it unless told otherwise.
    assert!(report.rows.iter().any(|r| r.material == "No"));
}

#[test]
fn duplicate_mapping_orders_keep_first_line() {
    let inputs = ReconInputs {
        movements: table(
            TableKind::Movements,
            "Material,Order,Quantity\n40001,A1,7\n",
            b',',
        ),
        mapping: table(
            TableKind::Mapping,
            "Order,Line\nA1,LINE 05\nA1,LINE 06\n",
            b',',
        ),
        manual: table(TableKind::Manual, "Line,40001\nLINE 05,7\n", b','),
    };
    let report = pipeline::run(&inputs, &ReconConfig::default()).expect("run");
    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].line, "LINE 05");
    assert_eq!(report.diagnostics.duplicate_mapping_orders, 1);
}

#[test]
fn shortened_labels_meet_manual_labels() {
    let mut config = ReconConfig::default();
    config.shorten_line_labels = true;
    let inputs = ReconInputs {
        movements: table(
            TableKind::Movements,
            "Material,Order,Quantity\n40001,A1,2\n",
            b',',
        ),
        mapping: table(
            TableKind::Mapping,
            "Order,Line\nA1,PT ABC ASSEMBLY LINE 12\n",
            b',',
        ),
        manual: table(TableKind::Manual, "Line,40001\nLINE 12,2\n", b','),
    };
    let report = pipeline::run(&inputs, &config).expect("run");
    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.status, ReconStatus::Match);
}

#[test]
fn missing_columns_fail_without_output() {
    let inputs = ReconInputs {
        movements: table(TableKind::Movements, "Material,Order\n40001,A1\n", b','),
        mapping: table(TableKind::Mapping, "Order,Line\nA1,LINE 01\n", b','),
        manual: table(TableKind::Manual, "Line,40001\nLINE 01,1\n", b','),
    };
    let err = pipeline::run(&inputs, &ReconConfig::default()).expect_err("shape error");
    assert!(matches!(err, ReconError::InputShape(_)));
    assert!(err.to_string().contains("movements: quantity"));
}

#[test]
fn authoritative_aggregation_stands_alone() {
    let inputs = standard_inputs();
    let (rows, diagnostics) =
        pipeline::aggregate_authoritative(&inputs.movements, &inputs.mapping, &ReconConfig::default())
            .expect("aggregate");
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.category.is_some()));
    assert_eq!(diagnostics.coerced_quantities, 0);
}
