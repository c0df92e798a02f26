// Writing the formatted survey.

use rust_xlsxwriter::{Format, Workbook};

use crate::audit::*;
use snafu::prelude::*;

/// Writes the records in the layout of `OUTPUT_COLUMNS`.
///
/// The format follows the extension of the path: `.csv` for CSV, Excel otherwise.
pub fn write_normalized(records: &[NormalizedRecord], path: &str) -> AuditResult<()> {
    let is_csv = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    let rows: Vec<Vec<Cell>> = records.iter().map(|r| r.to_row()).collect();
    if is_csv {
        write_csv(&rows, path)
    } else {
        write_xlsx(&rows, path)
    }
}

fn write_xlsx(rows: &[Vec<Cell>], path: &str) -> AuditResult<()> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name("Datos")
        .context(WritingXlsxSnafu { path })?;

    for (col, name) in OUTPUT_COLUMNS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *name, &bold)
            .context(WritingXlsxSnafu { path })?;
    }
    for (idx, row) in rows.iter().enumerate() {
        let r = (idx + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let c = col as u16;
            match cell {
                Cell::Number(n) => {
                    worksheet
                        .write_number(r, c, *n)
                        .context(WritingXlsxSnafu { path })?;
                }
                Cell::Empty => {}
                // Dates are written as DD/MM/YYYY text.
                other => {
                    worksheet
                        .write_string(r, c, other.display())
                        .context(WritingXlsxSnafu { path })?;
                }
            }
        }
    }
    workbook.save(path).context(WritingXlsxSnafu { path })?;
    debug!("write_xlsx: {} rows written to {:?}", rows.len(), path);
    Ok(())
}

fn write_csv(rows: &[Vec<Cell>], path: &str) -> AuditResult<()> {
    let mut wtr = csv::Writer::from_path(path).context(WritingCsvSnafu { path })?;
    wtr.write_record(OUTPUT_COLUMNS)
        .context(WritingCsvSnafu { path })?;
    for row in rows.iter() {
        let fields: Vec<String> = row.iter().map(|c| c.display()).collect();
        wtr.write_record(&fields)
            .context(WritingCsvSnafu { path })?;
    }
    wtr.flush().context(WritingReportSnafu { path })?;
    debug!("write_csv: {} rows written to {:?}", rows.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn survey() -> Vec<NormalizedRecord> {
        let mut head = PersonRecord::new("10", "10", "ana", "", "ruiz", "");
        head.sex = Cell::text("Femenino");
        head.birth_date = Cell::text("05/03/1980");
        let child = PersonRecord::new("10", "11", "tom", "", "ruiz", "");
        normalize_records(&[head, child])
    }

    #[test]
    fn csv_output() {
        let dir = std::env::temp_dir().join("census_audit_writer_test");
        fs::create_dir_all(&dir).unwrap();
        let p = dir.join("formateado.csv").display().to_string();
        write_normalized(&survey(), &p).unwrap();

        let content = fs::read_to_string(&p).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Cedula de jefe(a) de Familia,VIVIENDA,INTEGRANTES,FAMILIA"));
        assert!(lines[1].starts_with("10,1,1,1,Ana,,Ruiz,"));
        assert!(lines[1].contains(",F,05/03/1980,"));
        assert!(lines[2].starts_with("10,1,2,1,Tom,,Ruiz,"));
    }

    #[test]
    fn xlsx_output() {
        let dir = std::env::temp_dir().join("census_audit_writer_test");
        fs::create_dir_all(&dir).unwrap();
        let p = dir.join("formateado.xlsx").display().to_string();
        write_normalized(&survey(), &p).unwrap();

        let table = crate::audit::io_excel::read_excel_table(&p, &None).unwrap();
        assert_eq!(table.headers.len(), OUTPUT_COLUMNS.len());
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(1, 10).as_identifier(), Some("11".to_string()));
    }
}
