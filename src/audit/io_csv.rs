// Primitives for reading CSV files.

use crate::audit::io_common::split_header;
use crate::audit::*;
use snafu::prelude::*;

/// Reads a CSV file with a header row. All the fields are read as text.
pub fn read_csv_table(path: &str) -> AuditResult<RawTable> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        // The index starts at 1 to respect most conventions in the spreadsheet world
        let lineno = idx + 1;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        rows.push(line.iter().map(Cell::text).collect());
    }
    debug!("read_csv_table: {} lines in {:?}", rows.len(), path);
    Ok(split_header(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_simple_file() {
        let dir = std::env::temp_dir().join("census_audit_csv_test");
        fs::create_dir_all(&dir).unwrap();
        let p = dir.join("encuesta.csv");
        fs::write(
            &p,
            "Cedula de jefe(a) de Familia,Documento,Primer Nombre\n10,10,Ana\n10,11,\n",
        )
        .unwrap();
        let table = read_csv_table(&p.display().to_string()).unwrap();
        assert_eq!(table.headers.len(), 3);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, 2), Cell::Text("Ana".to_string()));
        assert_eq!(table.cell(1, 2), Cell::Empty);
        assert_eq!(table.cell(1, 1).as_identifier(), Some("11".to_string()));
    }
}
