use std::path::Path;

use crate::audit::config_reader::InputType;
use crate::audit::*;
use snafu::prelude::*;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Reads a whole spreadsheet: the first row is the header.
pub fn read_table(
    path: &str,
    input_type: InputType,
    worksheet_name: &Option<String>,
) -> AuditResult<RawTable> {
    info!("Attempting to read {:?} file {:?}", input_type, path);
    if !Path::new(path).exists() {
        whatever!("File not found: {:?}", path)
    }
    let table = match input_type {
        InputType::Xlsx => crate::audit::io_excel::read_excel_table(path, worksheet_name)?,
        InputType::Csv => crate::audit::io_csv::read_csv_table(path)?,
    };
    info!(
        "Read {} rows and {} columns from {}",
        table.len(),
        table.headers.len(),
        simplify_file_name(path)
    );
    Ok(table)
}

/// Splits the first row off as the header.
pub fn split_header(mut rows: Vec<Vec<Cell>>) -> RawTable {
    if rows.is_empty() {
        return RawTable::new(vec![], vec![]);
    }
    let header = rows.remove(0);
    let headers: Vec<String> = header.iter().map(|c| c.display()).collect();
    // Rows without any content are dropped, as spreadsheets often end with blank lines.
    let rows: Vec<Vec<Cell>> = rows
        .into_iter()
        .filter(|r| r.iter().any(|c| !c.is_empty()))
        .collect();
    RawTable::new(headers, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_blank_rows() {
        let t = split_header(vec![
            vec![Cell::text(" Documento "), Cell::text("Sexo")],
            vec![Cell::Number(12.0), Cell::text("Femenino")],
            vec![Cell::Empty, Cell::text("  ")],
        ]);
        assert_eq!(t.headers, vec!["Documento".to_string(), "Sexo".to_string()]);
        assert_eq!(t.len(), 1);
        assert!(split_header(vec![]).headers.is_empty());
    }

    #[test]
    fn missing_file() {
        let res = read_table("/nonexistent/encuesta.csv", InputType::Csv, &None);
        assert!(matches!(res, Err(AuditError::Whatever { .. })));
    }

    #[test]
    fn file_names() {
        assert_eq!(simplify_file_name("a/b/encuesta.xlsx"), "encuesta.xlsx");
    }
}
