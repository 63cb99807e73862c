//! Outer join of the authoritative and manual aggregates with variance.
//!
//! Both inputs are unique per (line, material). Every key present on either
//! side appears exactly once in the output; a missing side counts as zero.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    category::{LineCategory, categorize},
    config::ReconConfig,
    data::round_quantity,
};

/// Summed quantity for one (line, material) pair. The authoritative side
/// carries a category; the manual side leaves it to the reconciler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedQuantity {
    pub line: String,
    pub material: String,
    pub quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<LineCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledRow {
    pub line: String,
    pub category: LineCategory,
    pub material: String,
    pub qty_authoritative: f64,
    pub qty_manual: f64,
    pub variance: f64,
    /// `|variance|` exceeds the configured tolerance.
    pub flagged: bool,
}

/// Counts of values the pipeline coerced silently instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub movement_rows: usize,
    pub rows_outside_prefixes: usize,
    pub unmapped_rows: usize,
    pub duplicate_mapping_orders: usize,
    pub coerced_quantities: usize,
    pub manual_coerced_cells: usize,
    pub manual_rows_without_line: usize,
    pub manual_columns_ignored: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconStatus {
    Match,
    Unmatch,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconReport {
    pub rows: Vec<ReconciledRow>,
    pub total_variance: f64,
    pub tolerance: f64,
    pub status: ReconStatus,
    pub diagnostics: Diagnostics,
}

impl ReconReport {
    pub fn flagged_rows(&self) -> impl Iterator<Item = &ReconciledRow> {
        self.rows.iter().filter(|row| row.flagged)
    }

    pub fn flagged_count(&self) -> usize {
        self.flagged_rows().count()
    }
}

type PairKey = (String, String);

pub fn reconcile(
    authoritative: &[AggregatedQuantity],
    manual: &[AggregatedQuantity],
    config: &ReconConfig,
) -> Vec<ReconciledRow> {
    let mut joined: BTreeMap<PairKey, (Option<&AggregatedQuantity>, f64)> = BTreeMap::new();
    for entry in authoritative {
        let slot = joined
            .entry((entry.line.clone(), entry.material.clone()))
            .or_insert((None, 0.0));
        slot.0 = Some(entry);
    }
    for entry in manual {
        let slot = joined
            .entry((entry.line.clone(), entry.material.clone()))
            .or_insert((None, 0.0));
        slot.1 += entry.quantity;
    }

    let round = |value: f64| match config.round_places {
        Some(places) => round_quantity(value, places),
        None => value,
    };

    let mut rows = joined
        .into_iter()
        .map(|((line, material), (auth, manual_qty))| {
            let category = auth
                .and_then(|a| a.category)
                .unwrap_or_else(|| categorize(Some(line.as_str())));
            let qty_authoritative = round(auth.map(|a| a.quantity).unwrap_or(0.0));
            let qty_manual = round(manual_qty);
            // Subtracting rounded values reintroduces float noise.
            let variance = round(qty_authoritative - qty_manual);
            ReconciledRow {
                flagged: config.is_material_difference(variance),
                line,
                category,
                material,
                qty_authoritative,
                qty_manual,
                variance,
            }
        })
        .collect::<Vec<_>>();

    rows.sort_by(|a, b| {
        a.category
            .label()
            .cmp(b.category.label())
            .then_with(|| a.line.cmp(&b.line))
            .then_with(|| a.material.cmp(&b.material))
    });
    rows
}

/// Wraps reconciled rows with the total variance and overall status.
pub fn build_report(rows: Vec<ReconciledRow>, config: &ReconConfig, diagnostics: Diagnostics) -> ReconReport {
    let total_variance = rows.iter().map(|row| row.variance).sum::<f64>();
    let total_variance = match config.round_places {
        Some(places) => round_quantity(total_variance, places),
        None => total_variance,
    };
    let status = if rows.iter().any(|row| row.flagged) {
        ReconStatus::Unmatch
    } else {
        ReconStatus::Match
    };
    ReconReport {
        rows,
        total_variance,
        tolerance: config.tolerance,
        status,
        diagnostics,
    }
}
