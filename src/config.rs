//! Run configuration: accepted material prefixes, variance tolerance, label
//! handling, and column keywords.
//!
//! Settings come from three layers: built-in defaults, an optional YAML file
//! (`--config`), and command-line overrides, in increasing precedence.

use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{columns::RoleKeywords, error::ReconError};

pub const DEFAULT_TOLERANCE: f64 = 0.001;
pub const DEFAULT_ROUND_PLACES: u32 = 3;
pub const DEFAULT_UNMAPPED_LINE: &str = "Unknown Line";
pub const DEFAULT_MATERIAL_PREFIX: &str = "40";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconConfig {
    /// Materials are in scope when their id starts with any of these.
    pub material_prefixes: Vec<String>,
    /// Variances whose magnitude exceeds this are flagged.
    pub tolerance: f64,
    /// Reduce mapping-table line labels to their last two tokens.
    pub shorten_line_labels: bool,
    /// Line assigned to movements whose order has no mapping entry.
    pub unmapped_line_label: String,
    /// Decimal places quantities are rounded to before subtracting; `None`
    /// compares raw sums.
    pub round_places: Option<u32>,
    /// Drop manual-grid columns whose material id is outside the accepted
    /// prefixes instead of summing them in as zero-coerced quantities.
    pub ignore_non_material_columns: bool,
    /// Header of the manual grid's line column, bypassing detection.
    pub manual_line_column: Option<String>,
    pub keywords: RoleKeywords,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            material_prefixes: vec![DEFAULT_MATERIAL_PREFIX.to_string()],
            tolerance: DEFAULT_TOLERANCE,
            shorten_line_labels: false,
            unmapped_line_label: DEFAULT_UNMAPPED_LINE.to_string(),
            round_places: Some(DEFAULT_ROUND_PLACES),
            ignore_non_material_columns: false,
            manual_line_column: None,
            keywords: RoleKeywords::default(),
        }
    }
}

impl ReconConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let config: ReconConfig = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing config YAML {path:?}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = self.to_yaml_string()?;
        let mut file =
            File::create(path).with_context(|| format!("Creating config file {path:?}"))?;
        file.write_all(serialized.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Serializing config to YAML")
    }

    pub fn accepts_material(&self, material: &str) -> bool {
        self.material_prefixes
            .iter()
            .filter(|prefix| !prefix.is_empty())
            .any(|prefix| material.starts_with(prefix.as_str()))
    }

    pub fn is_material_difference(&self, variance: f64) -> bool {
        variance.abs() > self.tolerance
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let prefixes = self
            .material_prefixes
            .iter()
            .filter(|p| !p.trim().is_empty())
            .count();
        if prefixes == 0 {
            return Err(ReconError::Config(
                "at least one material prefix is required".into(),
            ));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ReconError::Config(format!(
                "tolerance must be a non-negative number, got {}",
                self.tolerance
            )));
        }
        if self.unmapped_line_label.trim().is_empty() {
            return Err(ReconError::Config(
                "unmapped line label cannot be empty".into(),
            ));
        }
        for (role, list) in [
            ("material_id", &self.keywords.material_id),
            ("order_id", &self.keywords.order_id),
            ("quantity", &self.keywords.quantity),
            ("line", &self.keywords.line),
        ] {
            if list.iter().all(|k| k.trim().is_empty()) {
                return Err(ReconError::Config(format!(
                    "keyword list for '{role}' cannot be empty"
                )));
            }
        }
        Ok(())
    }
}
