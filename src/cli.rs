use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{config::ReconConfig, error::TableKind};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Reconcile production movement exports against manual line/material grids",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compare authoritative movement quantities with a manual entry grid
    Reconcile(ReconcileArgs),
    /// Sum authoritative movement quantities per line and material
    Aggregate(AggregateArgs),
    /// Write a zero-filled manual entry grid for the lines and materials in the movements
    Template(TemplateArgs),
    /// Preview how an input table is read and which columns are detected
    Preview(PreviewArgs),
}

#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Movement export (csv, tsv, txt, xlsx, xls, xlsb, ods or '-' for stdin)
    #[arg(long = "movements")]
    pub movements: PathBuf,
    /// Order to production line mapping table
    #[arg(long = "mapping")]
    pub mapping: PathBuf,
    /// Worksheet to read from a movements workbook (defaults to the first sheet)
    #[arg(long = "movements-sheet")]
    pub movements_sheet: Option<String>,
    /// Worksheet to read from a mapping workbook (defaults to the first sheet)
    #[arg(long = "mapping-sheet")]
    pub mapping_sheet: Option<String>,
}

#[derive(Debug, Args, Default)]
pub struct ReadArgs {
    /// Delimiter for text inputs (supports ',', 'tab', ';', '|'); inferred from the extension otherwise
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of text inputs (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args, Default)]
pub struct ConfigArgs {
    /// YAML configuration file; command-line options take precedence
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Accepted material id prefixes (repeatable or comma-separated)
    #[arg(long = "prefix", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub prefixes: Vec<String>,
    /// Variances with a larger magnitude are flagged
    #[arg(long)]
    pub tolerance: Option<f64>,
    /// Reduce mapping line labels to their last two words
    #[arg(long = "shorten-lines")]
    pub shorten_lines: bool,
    /// Line label for movements whose order is not in the mapping
    #[arg(long = "unmapped-label")]
    pub unmapped_label: Option<String>,
    /// Decimal places quantities are rounded to before comparison
    #[arg(long = "round-places", conflicts_with = "no_rounding")]
    pub round_places: Option<u32>,
    /// Compare raw sums without rounding
    #[arg(long = "no-rounding")]
    pub no_rounding: bool,
    /// Drop manual grid columns whose header is not an accepted material id
    #[arg(long = "ignore-non-material-columns")]
    pub ignore_non_material_columns: bool,
    /// Header of the manual grid's line column (detected when omitted)
    #[arg(long = "manual-line-column")]
    pub manual_line_column: Option<String>,
}

impl ConfigArgs {
    /// Layers command-line overrides on top of the config file or defaults.
    pub fn to_config(&self) -> Result<ReconConfig> {
        let mut config = match &self.config {
            Some(path) => ReconConfig::load(path)
                .with_context(|| format!("Loading configuration from {path:?}"))?,
            None => ReconConfig::default(),
        };
        let prefixes = self
            .prefixes
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(|p| p.to_string())
            .collect::<Vec<_>>();
        if !prefixes.is_empty() {
            config.material_prefixes = prefixes;
        }
        if let Some(tolerance) = self.tolerance {
            config.tolerance = tolerance;
        }
        if self.shorten_lines {
            config.shorten_line_labels = true;
        }
        if let Some(label) = &self.unmapped_label {
            config.unmapped_line_label = label.clone();
        }
        if self.no_rounding {
            config.round_places = None;
        } else if let Some(places) = self.round_places {
            config.round_places = Some(places);
        }
        if self.ignore_non_material_columns {
            config.ignore_non_material_columns = true;
        }
        if let Some(column) = &self.manual_line_column {
            config.manual_line_column = Some(column.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    #[command(flatten)]
    pub sources: SourceArgs,
    /// Manual entry grid: line labels in one column, one column per material
    #[arg(long = "manual")]
    pub manual: PathBuf,
    /// Worksheet to read from a manual workbook (defaults to the first sheet)
    #[arg(long = "manual-sheet")]
    pub manual_sheet: Option<String>,
    /// Output file (stdout if omitted); .json writes JSON, anything else delimited text
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Output format (defaults to table on stdout, or by extension with --output)
    #[arg(long = "format", value_enum)]
    pub format: Option<OutputFormat>,
    /// Only emit rows whose variance exceeds the tolerance
    #[arg(long = "only-differences")]
    pub only_differences: bool,
    #[command(flatten)]
    pub read: ReadArgs,
    #[command(flatten)]
    pub settings: ConfigArgs,
}

#[derive(Debug, Args)]
pub struct AggregateArgs {
    #[command(flatten)]
    pub sources: SourceArgs,
    /// Output file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Output format (defaults to table on stdout, or by extension with --output)
    #[arg(long = "format", value_enum)]
    pub format: Option<OutputFormat>,
    #[command(flatten)]
    pub read: ReadArgs,
    #[command(flatten)]
    pub settings: ConfigArgs,
}

#[derive(Debug, Args)]
pub struct TemplateArgs {
    #[command(flatten)]
    pub sources: SourceArgs,
    /// Output file for the grid (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Delimiter for the grid (defaults to tab, or by the output extension)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    #[command(flatten)]
    pub read: ReadArgs,
    #[command(flatten)]
    pub settings: ConfigArgs,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum PreviewSource {
    Movements,
    Mapping,
    Manual,
}

impl From<PreviewSource> for TableKind {
    fn from(value: PreviewSource) -> Self {
        match value {
            PreviewSource::Movements => TableKind::Movements,
            PreviewSource::Mapping => TableKind::Mapping,
            PreviewSource::Manual => TableKind::Manual,
        }
    }
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Input table to preview
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Which kind of table the input is, used for column detection
    #[arg(long = "as", value_enum, default_value = "manual")]
    pub source: PreviewSource,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// Worksheet to read from a workbook (defaults to the first sheet)
    #[arg(long)]
    pub sheet: Option<String>,
    #[command(flatten)]
    pub read: ReadArgs,
    #[command(flatten)]
    pub settings: ConfigArgs,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" | "\\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_delimiter_accepts_names_and_characters() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter("semicolon"), Ok(b';'));
        assert_eq!(parse_delimiter(":"), Ok(b':'));
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("é").is_err());
    }

    #[test]
    fn overrides_replace_defaults() {
        let args = ConfigArgs {
            prefixes: vec!["40".into(), " 70 ".into()],
            tolerance: Some(0.01),
            shorten_lines: true,
            no_rounding: true,
            unmapped_label: Some("No Line".into()),
            ..ConfigArgs::default()
        };
        let config = args.to_config().expect("config");
        assert_eq!(config.material_prefixes, vec!["40", "70"]);
        assert_eq!(config.tolerance, 0.01);
        assert!(config.shorten_line_labels);
        assert_eq!(config.round_places, None);
        assert_eq!(config.unmapped_line_label, "No Line");
    }

    #[test]
    fn negative_tolerance_is_rejected() {
        let args = ConfigArgs {
            tolerance: Some(-0.5),
            ..ConfigArgs::default()
        };
        assert!(args.to_config().is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
