// Primitives for reading Excel workbooks.

use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::audit::io_common::split_header;
use crate::audit::*;
use snafu::prelude::*;

/// Reads the given worksheet, or the first one.
pub fn read_excel_table(path: &str, worksheet_name: &Option<String>) -> AuditResult<RawTable> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match worksheet_name {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { path, name })?
            .context(OpeningExcelSnafu { path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?,
    };

    let rows: Vec<Vec<Cell>> = wrange
        .rows()
        .map(|row| row.iter().map(to_cell).collect())
        .collect();
    debug!("read_excel_table: {} rows in {:?}", rows.len(), path);
    Ok(split_header(rows))
}

fn to_cell(elt: &DataType) -> Cell {
    match elt {
        DataType::String(s) => Cell::text(s),
        DataType::Float(f) => Cell::Number(*f),
        DataType::Int(i) => Cell::Number(*i as f64),
        DataType::Bool(b) => Cell::Bool(*b),
        DataType::DateTime(f) => match from_serial(*f) {
            Some(d) => Cell::Date(d),
            None => Cell::Number(*f),
        },
        // Error cells are treated as missing values.
        _ => Cell::Empty,
    }
}
