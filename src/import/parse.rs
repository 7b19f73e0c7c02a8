use calamine::{Data, Reader, Xlsx};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Cursor;
use tracing::{debug, warn};

use super::columns::canonical;
use super::values::serial_to_iso;
use super::{ImportError, ImportFormat};

/// One data row: canonical column name → cell text, plus its sheet row number
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportRow {
    pub row: usize,
    pub values: BTreeMap<String, String>,
}

impl ImportRow {
    pub fn new(row: usize) -> Self {
        Self { row, values: BTreeMap::new() }
    }

    pub fn with(mut self, column: &str, value: &str) -> Self {
        self.values.insert(canonical(column), value.to_string());
        self
    }

    /// Trimmed, non-empty cell value
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(|v| v.trim()).filter(|v| !v.is_empty())
    }

    fn is_blank(&self) -> bool {
        self.values.values().all(|v| v.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseWarning {
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Parsed {
    pub headers: Vec<String>,
    pub rows: Vec<ImportRow>,
    pub warnings: Vec<ParseWarning>,
}

pub fn parse(bytes: &[u8], format: ImportFormat) -> Result<Parsed, ImportError> {
    let table = match format {
        ImportFormat::Csv => read_csv(bytes)?,
        ImportFormat::Xlsx => read_xlsx(bytes)?,
    };
    let parsed = build(table)?;
    debug!("Parsed {} rows ({} warnings)", parsed.rows.len(), parsed.warnings.len());
    Ok(parsed)
}

/// (sheet row number, cells) in file order
type Table = Vec<(usize, Vec<String>)>;

fn read_csv(bytes: &[u8]) -> Result<Table, ImportError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let mut table = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let line = record.position().map(|p| p.line() as usize).unwrap_or(index + 1);
        table.push((line, record.iter().map(str::to_string).collect()));
    }
    Ok(table)
}

fn read_xlsx(bytes: &[u8]) -> Result<Table, ImportError> {
    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes.to_vec())).map_err(|e| ImportError::Spreadsheet(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ImportError::MissingHeader)?
        .map_err(|e| ImportError::Spreadsheet(e.to_string()))?;

    let first_row = range.start().map(|(r, _)| r as usize).unwrap_or(0);
    Ok(range
        .rows()
        .enumerate()
        .map(|(i, cells)| (first_row + i + 1, cells.iter().map(cell_text).collect()))
        .collect())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        // whole floats are phone numbers and plain amounts more often than not
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => serial_to_iso(dt.as_f64()).unwrap_or_else(|| dt.as_f64().to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => {
            warn!("Spreadsheet cell error: {:?}", e);
            String::new()
        }
    }
}

/// First non-empty row is the header; blank rows are skipped with a warning.
fn build(table: Table) -> Result<Parsed, ImportError> {
    let mut rows = table.into_iter();
    let headers: Vec<String> = loop {
        match rows.next() {
            Some((_, cells)) if cells.iter().any(|c| !c.trim().is_empty()) => {
                break cells.iter().map(|c| canonical(c)).collect();
            }
            Some(_) => continue,
            None => return Err(ImportError::MissingHeader),
        }
    };

    let mut parsed = Parsed { headers: headers.clone(), ..Default::default() };
    for (line, cells) in rows {
        let mut row = ImportRow::new(line);
        for (header, cell) in headers.iter().zip(cells.iter()) {
            if header.is_empty() {
                continue;
            }
            // a repeated header keeps its first non-empty value
            let slot = row.values.entry(header.clone()).or_default();
            if slot.trim().is_empty() {
                *slot = cell.trim().to_string();
            }
        }
        if row.is_blank() {
            warn!("Skipping blank import row {}", line);
            parsed.warnings.push(ParseWarning { row: line, message: "blank row skipped".to_string() });
            continue;
        }
        parsed.rows.push(row);
    }
    Ok(parsed)
}
