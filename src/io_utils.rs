//! I/O utilities for delimited reading, writing, encoding, and delimiter resolution.
//!
//! All file I/O in line-recon flows through this module. It provides:
//!
//! - **Delimiter resolution**: extension-based auto-detection (`.csv` → comma,
//!   `.tsv`/`.txt` → tab, stdin → tab since pasted spreadsheet selections are
//!   tab separated) with manual override support.
//! - **Workbook detection**: spreadsheet extensions are routed to `calamine`
//!   by [`crate::frame`].
//! - **Encoding**: input decoding via `encoding_rs`, defaulting to UTF-8.
//! - **stdin/stdout**: the `-` path convention routes through standard streams.

use std::{
    fs::File,
    io::{self, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow, bail};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

/// Stdin can only be drained once per run.
pub fn ensure_single_stdin(paths: &[&Path]) -> Result<()> {
    if paths.iter().filter(|p| is_dash(p)).count() > 1 {
        bail!("At most one input may be read from stdin ('-')");
    }
    Ok(())
}

pub fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            WORKBOOK_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    if let Some(delim) = provided {
        return delim;
    }
    if is_dash(path) {
        return DEFAULT_TSV_DELIMITER;
    }
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") || ext.eq_ignore_ascii_case("txt") => {
            DEFAULT_TSV_DELIMITER
        }
        _ => DEFAULT_CSV_DELIMITER,
    }
}

pub fn resolve_output_delimiter(path: Option<&Path>, provided: Option<u8>, fallback: u8) -> u8 {
    if let Some(delim) = provided {
        return delim;
    }
    if let Some(path) = path {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") || ext.eq_ignore_ascii_case("txt") => {
                return DEFAULT_TSV_DELIMITER;
            }
            Some(ext) if ext.eq_ignore_ascii_case("csv") => return DEFAULT_CSV_DELIMITER,
            _ => {}
        }
    }
    fallback
}

/// Reader for header-first delimited text. Rows may be ragged: pasted
/// selections frequently drop trailing empty cells.
pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

/// Reads a whole input into memory, from stdin when `path` is `-`.
pub fn read_input_bytes(path: &Path) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    if is_dash(path) {
        io::stdin().lock().read_to_end(&mut buffer)?;
    } else {
        File::open(path)?.read_to_end(&mut buffer)?;
    }
    Ok(buffer)
}

pub fn open_csv_writer(path: Option<&Path>, delimiter: u8) -> Result<csv::Writer<Box<dyn Write>>> {
    let base: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(io::stdout()),
    };

    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true);
    Ok(builder.from_writer(base))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn stdin_and_text_files_default_to_tab() {
        assert_eq!(resolve_input_delimiter(Path::new("-"), None), b'\t');
        assert_eq!(resolve_input_delimiter(Path::new("grid.TXT"), None), b'\t');
        assert_eq!(resolve_input_delimiter(Path::new("mb51.csv"), None), b',');
        assert_eq!(resolve_input_delimiter(Path::new("mb51.csv"), Some(b';')), b';');
    }

    #[test]
    fn two_stdin_inputs_are_rejected() {
        let dash = Path::new("-");
        let file = Path::new("a.csv");
        assert!(ensure_single_stdin(&[dash, file]).is_ok());
        assert!(ensure_single_stdin(&[dash, file, dash]).is_err());
    }

    #[test]
    fn workbook_extensions_are_case_insensitive() {
        assert!(is_workbook(&PathBuf::from("MB51.XLSX")));
        assert!(is_workbook(&PathBuf::from("mapping.xls")));
        assert!(!is_workbook(&PathBuf::from("mapping.csv")));
        assert!(!is_workbook(Path::new("-")));
    }

    #[test]
    fn output_delimiter_follows_extension_then_fallback() {
        assert_eq!(resolve_output_delimiter(Some(Path::new("out.tsv")), None, b','), b'\t');
        assert_eq!(resolve_output_delimiter(Some(Path::new("out.dat")), None, b','), b',');
        assert_eq!(resolve_output_delimiter(None, Some(b'|'), b','), b'|');
    }

    #[test]
    fn decode_bytes_handles_latin1() {
        let encoding = resolve_encoding(Some("latin1")).expect("latin1 label");
        let decoded = decode_bytes(&[0x4c, 0xed, 0x6e, 0x65], encoding).expect("decode");
        assert_eq!(decoded, "Líne");
        assert!(resolve_encoding(Some("no-such-encoding")).is_err());
    }
}
