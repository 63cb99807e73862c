//! Authoritative-source aggregation: goods movements per production order,
//! mapped onto production lines and summed per (line, material).

use std::collections::{BTreeMap, HashMap, hash_map::Entry};

use log::{debug, info};

use crate::{
    category::categorize,
    columns::{RoleKeywords, SemanticRole, resolve_roles},
    config::ReconConfig,
    data::{normalize_id, shorten_line_label, try_parse_quantity},
    error::MissingColumn,
    frame::RawTable,
    reconcile::{AggregatedQuantity, Diagnostics},
};

const MOVEMENT_ROLES: [SemanticRole; 3] = [
    SemanticRole::MaterialId,
    SemanticRole::OrderId,
    SemanticRole::Quantity,
];
const MAPPING_ROLES: [SemanticRole; 2] = [SemanticRole::OrderId, SemanticRole::Line];

#[derive(Debug, Clone, PartialEq)]
pub struct MovementRecord {
    pub material: String,
    pub order: String,
    pub quantity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementColumns {
    pub material: usize,
    pub order: usize,
    pub quantity: usize,
}

impl MovementColumns {
    pub fn resolve(table: &RawTable, keywords: &RoleKeywords) -> Result<Self, Vec<MissingColumn>> {
        let resolution = resolve_roles(table.headers(), &MOVEMENT_ROLES, keywords);
        match (
            resolution.index(SemanticRole::MaterialId),
            resolution.index(SemanticRole::OrderId),
            resolution.index(SemanticRole::Quantity),
        ) {
            (Some(material), Some(order), Some(quantity)) => Ok(Self {
                material,
                order,
                quantity,
            }),
            _ => Err(resolution.missing_columns(table.kind())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingColumns {
    pub order: usize,
    pub line: usize,
}

impl MappingColumns {
    pub fn resolve(table: &RawTable, keywords: &RoleKeywords) -> Result<Self, Vec<MissingColumn>> {
        let resolution = resolve_roles(table.headers(), &MAPPING_ROLES, keywords);
        match (
            resolution.index(SemanticRole::OrderId),
            resolution.index(SemanticRole::Line),
        ) {
            (Some(order), Some(line)) => Ok(Self { order, line }),
            _ => Err(resolution.missing_columns(table.kind())),
        }
    }
}

/// Normalizes every movement row. Unreadable quantities become zero and are
/// counted in `diagnostics.coerced_quantities`.
pub fn read_movements(
    table: &RawTable,
    columns: &MovementColumns,
    diagnostics: &mut Diagnostics,
) -> Vec<MovementRecord> {
    table
        .rows()
        .iter()
        .map(|row| {
            let quantity = match try_parse_quantity(&row[columns.quantity]) {
                Some(value) => value,
                None => {
                    diagnostics.coerced_quantities += 1;
                    0.0
                }
            };
            MovementRecord {
                material: normalize_id(&row[columns.material]),
                order: normalize_id(&row[columns.order]),
                quantity,
            }
        })
        .collect()
}

/// Order → line lookup. When an order appears more than once the first
/// occurrence wins.
#[derive(Debug, Clone, Default)]
pub struct OrderLineMap {
    lines: HashMap<String, String>,
    duplicates: usize,
}

impl OrderLineMap {
    pub fn from_table(table: &RawTable, columns: &MappingColumns, shorten_labels: bool) -> Self {
        let mut map = OrderLineMap::default();
        for row in table.rows() {
            let order = normalize_id(&row[columns.order]);
            if order.is_empty() {
                continue;
            }
            let mut line = normalize_id(&row[columns.line]);
            if line.is_empty() {
                continue;
            }
            if shorten_labels {
                line = shorten_line_label(&line);
            }
            map.insert(order, line);
        }
        if map.duplicates > 0 {
            debug!(
                "Mapping table repeats {} order id(s); first occurrence kept",
                map.duplicates
            );
        }
        map
    }

    pub fn insert(&mut self, order: String, line: String) {
        match self.lines.entry(order) {
            Entry::Occupied(_) => self.duplicates += 1,
            Entry::Vacant(slot) => {
                slot.insert(line);
            }
        }
    }

    pub fn line_for(&self, order: &str) -> Option<&str> {
        self.lines.get(order).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

/// Filters to accepted materials, assigns lines, and sums per (line, material).
pub fn aggregate_movements(
    records: &[MovementRecord],
    mapping: &OrderLineMap,
    config: &ReconConfig,
    diagnostics: &mut Diagnostics,
) -> Vec<AggregatedQuantity> {
    diagnostics.movement_rows += records.len();
    diagnostics.duplicate_mapping_orders += mapping.duplicates();

    let mut totals: BTreeMap<(String, String), f64> = BTreeMap::new();
    let mut dropped = 0usize;
    for record in records {
        if !config.accepts_material(&record.material) {
            dropped += 1;
            continue;
        }
        let line = match mapping.line_for(&record.order) {
            Some(line) => line.to_string(),
            None => {
                diagnostics.unmapped_rows += 1;
                config.unmapped_line_label.clone()
            }
        };
        *totals.entry((line, record.material.clone())).or_insert(0.0) += record.quantity;
    }
    diagnostics.rows_outside_prefixes += dropped;

    if dropped > 0 {
        info!(
            "Material filter dropped {} movement row(s) outside prefix(es) {:?}",
            dropped, config.material_prefixes
        );
    }
    if diagnostics.unmapped_rows > 0 {
        info!(
            "{} movement row(s) have no line mapping and were assigned to '{}'",
            diagnostics.unmapped_rows, config.unmapped_line_label
        );
    }

    totals
        .into_iter()
        .map(|((line, material), quantity)| AggregatedQuantity {
            category: Some(categorize(Some(line.as_str()))),
            line,
            material,
            quantity,
        })
        .collect()
}
