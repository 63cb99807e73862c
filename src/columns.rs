//! Column discovery for arbitrary user-supplied headers.
//!
//! Exports rarely agree on header spelling (`Material`, `Matnr`, `Qty in Un.
//! of Entry`, ...). Each [`SemanticRole`] carries a priority-ordered keyword
//! list; [`resolve`] picks the first keyword with an exact case-insensitive
//! match, falling back to the first header (in column order) containing the
//! keyword.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::error::{MissingColumn, TableKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticRole {
    MaterialId,
    OrderId,
    Quantity,
    Line,
}

impl SemanticRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticRole::MaterialId => "material_id",
            SemanticRole::OrderId => "order_id",
            SemanticRole::Quantity => "quantity",
            SemanticRole::Line => "line",
        }
    }

    pub fn default_keywords(&self) -> &'static [&'static str] {
        match self {
            SemanticRole::MaterialId => &["Material", "Material Number", "Matnr"],
            SemanticRole::OrderId => &["Order", "IO", "Process Order", "Aufnr"],
            SemanticRole::Quantity => &["Quantity", "Qty", "Menge", "Qty in Un. of Entry"],
            SemanticRole::Line => &["Line", "Work Center", "Production Line"],
        }
    }
}

impl fmt::Display for SemanticRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword lists per role, defaulting to [`SemanticRole::default_keywords`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleKeywords {
    pub material_id: Vec<String>,
    pub order_id: Vec<String>,
    pub quantity: Vec<String>,
    pub line: Vec<String>,
}

impl Default for RoleKeywords {
    fn default() -> Self {
        let owned = |role: SemanticRole| {
            role.default_keywords()
                .iter()
                .map(|k| k.to_string())
                .collect::<Vec<_>>()
        };
        Self {
            material_id: owned(SemanticRole::MaterialId),
            order_id: owned(SemanticRole::OrderId),
            quantity: owned(SemanticRole::Quantity),
            line: owned(SemanticRole::Line),
        }
    }
}

impl RoleKeywords {
    pub fn for_role(&self, role: SemanticRole) -> &[String] {
        match role {
            SemanticRole::MaterialId => &self.material_id,
            SemanticRole::OrderId => &self.order_id,
            SemanticRole::Quantity => &self.quantity,
            SemanticRole::Line => &self.line,
        }
    }
}

/// Finds the header matching the first satisfiable keyword.
///
/// Exact (trimmed, case-insensitive) matches win over substring matches for
/// the same keyword; among substring matches the leftmost header wins, not
/// the closest one.
pub fn resolve<S: AsRef<str>>(headers: &[String], candidates: &[S]) -> Option<String> {
    let lowered = headers
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect::<Vec<_>>();
    for candidate in candidates {
        let key = candidate.as_ref().trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        if let Some(idx) = lowered.iter().position(|h| *h == key) {
            return Some(headers[idx].clone());
        }
        if let Some(idx) = lowered.iter().position(|h| h.contains(&key)) {
            return Some(headers[idx].clone());
        }
    }
    None
}

/// Outcome of resolving several roles against one table.
#[derive(Debug, Clone, Default)]
pub struct RoleResolution {
    found: BTreeMap<SemanticRole, usize>,
    missing: Vec<SemanticRole>,
}

impl RoleResolution {
    pub fn index(&self, role: SemanticRole) -> Option<usize> {
        self.found.get(&role).copied()
    }

    pub fn missing(&self) -> &[SemanticRole] {
        &self.missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn missing_columns(&self, table: TableKind) -> Vec<MissingColumn> {
        self.missing
            .iter()
            .map(|role| MissingColumn::new(table, role.as_str()))
            .collect()
    }
}

/// Resolves every role, recording all misses instead of stopping at the first.
pub fn resolve_roles(
    headers: &[String],
    roles: &[SemanticRole],
    keywords: &RoleKeywords,
) -> RoleResolution {
    let mut resolution = RoleResolution::default();
    for role in roles {
        match resolve(headers, keywords.for_role(*role))
            .and_then(|header| headers.iter().position(|h| *h == header))
        {
            Some(idx) => {
                resolution.found.insert(*role, idx);
            }
            None => resolution.missing.push(*role),
        }
    }
    resolution
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn exact_match_beats_earlier_substring() {
        let cols = headers(&["Material Description", "Material", "Qty"]);
        assert_eq!(resolve(&cols, &["Material"]), Some("Material".to_string()));
    }

    #[test]
    fn exact_match_is_trimmed_and_case_insensitive() {
        let cols = headers(&["  ORDER ", "Line"]);
        assert_eq!(resolve(&cols, &["order"]), Some("  ORDER ".to_string()));
    }

    #[test]
    fn substring_match_prefers_column_order() {
        let cols = headers(&["Quantity in Unit", "Qty"]);
        assert_eq!(resolve(&cols, &["Quantity", "Qty"]), Some("Quantity in Unit".to_string()));
    }

    #[test]
    fn later_keyword_exact_match_loses_to_earlier_keyword_substring() {
        let cols = headers(&["Total Qty", "Menge"]);
        assert_eq!(
            resolve(&cols, &["Qty", "Menge"]),
            Some("Total Qty".to_string())
        );
    }

    #[test]
    fn absent_role_returns_none() {
        let cols = headers(&["Plant", "Batch"]);
        assert_eq!(resolve(&cols, &["Material", "Matnr"]), None);
    }

    #[test]
    fn resolve_roles_collects_every_miss() {
        let cols = headers(&["Order", "Batch"]);
        let resolution = resolve_roles(
            &cols,
            &[SemanticRole::MaterialId, SemanticRole::OrderId, SemanticRole::Quantity],
            &RoleKeywords::default(),
        );
        assert_eq!(resolution.index(SemanticRole::OrderId), Some(0));
        assert_eq!(
            resolution.missing(),
            [SemanticRole::MaterialId, SemanticRole::Quantity]
        );
        let missing = resolution.missing_columns(TableKind::Movements);
        assert_eq!(missing[0].role, "material_id");
        assert!(!resolution.is_complete());
    }
}
