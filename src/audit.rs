use log::{debug, info, warn};

use household_audit::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::{Args, Command};

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;
mod report_json;
mod report_txt;
mod writer;

use crate::audit::config_reader::*;
use crate::audit::io_common::read_table;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AuditError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The worksheet {name} is missing in {path}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("The file {path} has no worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing the workbook {path}"))]
    WritingXlsx {
        source: rust_xlsxwriter::XlsxError,
        path: String,
    },
    #[snafu(display("Error writing the file {path}"))]
    WritingCsv { source: csv::Error, path: String },
    #[snafu(display("Error writing the report {path}"))]
    WritingReport {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error processing {path}: {source}"))]
    Engine { source: AuditErrors, path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type AuditResult<T> = Result<T, AuditError>;

/// The independent steps of a run.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Stage {
    Format,
    Audit,
    Compare,
}

fn stages(command: Option<Command>) -> Vec<Stage> {
    match command {
        Some(Command::Format) => vec![Stage::Format],
        Some(Command::Audit) => vec![Stage::Audit],
        Some(Command::Compare) => vec![Stage::Compare],
        Some(Command::All) | None => vec![Stage::Format, Stage::Audit, Stage::Compare],
    }
}

/// Runs the stages requested on the command line.
///
/// A failing stage does not prevent the next ones from running. The error is
/// reported and the run fails at the end.
pub fn run(args: &Args) -> AuditResult<()> {
    let settings = Settings::resolve(args)?;
    info!("settings: {:?}", settings);

    let mut failed: Vec<Stage> = Vec::new();
    for stage in stages(args.command) {
        info!("Running stage {:?}", stage);
        let res = match stage {
            Stage::Format => run_format(&settings),
            Stage::Audit => run_audit(&settings, args.reference.clone()),
            Stage::Compare => run_compare(&settings),
        };
        if let Err(e) = res {
            warn!("Stage {:?} failed: {:?}", stage, e);
            eprintln!("Error during {:?}: {}", stage, e);
            failed.push(stage);
        }
    }
    if !failed.is_empty() {
        whatever!("The following stages failed: {:?}", failed)
    }
    Ok(())
}

fn read_survey(settings: &Settings) -> AuditResult<(String, RawTable)> {
    let path = match &settings.survey_file {
        Some(p) => p.clone(),
        None => whatever!("No survey file given: use --input or surveyFile in the configuration"),
    };
    let table = read_table(
        &path,
        settings.input_type_of(&path)?,
        &settings.excel_worksheet_name,
    )?;
    Ok((path, table))
}

/// Writes the survey in the standardized layout.
pub fn run_format(settings: &Settings) -> AuditResult<()> {
    let (path, table) = read_survey(settings)?;
    let records = normalize_table(&table).context(EngineSnafu { path })?;
    debug!("run_format: {} normalized records", records.len());
    let out = settings.formatted_file.clone();
    create_parent(&out)?;
    writer::write_normalized(&records, &out)?;
    println!("Archivo formateado y guardado exitosamente en '{}'.", out);
    Ok(())
}

/// Runs the household and duplicate checks and writes their reports.
pub fn run_audit(settings: &Settings, check_summary_path: Option<String>) -> AuditResult<()> {
    let (path, table) = read_survey(settings)?;
    let report = household_audit::run_audit(&table, &settings.rules).context(EngineSnafu { path })?;

    info!(
        "audit: {} multi-member households, {} single-member households, {} warnings, {} duplicate rows",
        report.households.multi_member.len(),
        report.households.single_member.len(),
        report.households.warnings.len(),
        report.duplicates.rows.len()
    );

    for format in settings.report_formats.iter() {
        match format {
            ReportFormat::Json => {
                let dir = settings.report_dir("reportes_json")?;
                for (name, js) in report_json::audit_reports(&report) {
                    report_json::write_json(&dir.join(format!("{}.json", name)), &js)?;
                }
            }
            ReportFormat::Txt => {
                let dir = settings.report_dir("reportes_txt")?;
                for (name, text) in report_txt::audit_reports(&report) {
                    report_txt::write_txt(&dir.join(format!("{}.txt", name)), &text)?;
                }
            }
        }
    }
    println!("{}", report_txt::summary_table(&report));

    if let Some(summary_p) = check_summary_path {
        let summary_js = report_json::summary_js(&report);
        check_reference(&summary_js, &summary_p)?;
    }
    Ok(())
}

/// Compares the old database with the survey and writes the comparison report.
pub fn run_compare(settings: &Settings) -> AuditResult<()> {
    let old_path = match &settings.old_database_file {
        Some(p) => p.clone(),
        None => whatever!(
            "No old database given: use --old or oldDatabaseFile in the configuration"
        ),
    };
    let old_table = read_table(
        &old_path,
        settings.input_type_of(&old_path)?,
        &settings.excel_worksheet_name,
    )?;
    let (path, new_table) = read_survey(settings)?;
    let diff = run_snapshot_diff(&old_table, &new_table, &settings.rules).context(EngineSnafu {
        path: format!("{} / {}", old_path, path),
    })?;

    info!(
        "compare: {} families, {} flagged as missing, {} orphaned members",
        diff.families.len(),
        diff.summary.flagged_missing,
        diff.orphaned.len()
    );

    for format in settings.report_formats.iter() {
        let dir = settings.report_dir("reportes_avanzados")?;
        match format {
            ReportFormat::Json => report_json::write_json(
                &dir.join("reporte_comparacion.json"),
                &report_json::comparison_js(&diff),
            )?,
            ReportFormat::Txt => report_txt::write_txt(
                &dir.join("reporte_comparacion.txt"),
                &report_txt::comparison_txt(&diff),
            )?,
        }
    }
    println!(
        "Total de personas faltantes: {} ({} señaladas)",
        diff.summary.total_missing, diff.summary.flagged_missing
    );
    Ok(())
}

fn check_reference(summary_js: &JSValue, summary_p: &str) -> AuditResult<()> {
    let pretty_js_stats = serde_json::to_string_pretty(summary_js).context(ParsingJsonSnafu {})?;
    let summary_ref = read_summary(summary_p)?;
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference summary");
        print_diff(
            pretty_js_summary_ref.as_str(),
            pretty_js_stats.as_ref(),
            "\n",
        );
        whatever!("Difference detected between calculated summary and reference summary")
    }
    info!("The summary matches the reference {}", summary_p);
    Ok(())
}

fn create_parent(path: &str) -> AuditResult<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context(WritingReportSnafu { path })?;
        }
    }
    Ok(())
}

impl Settings {
    fn report_dir(&self, name: &str) -> AuditResult<PathBuf> {
        let dir: PathBuf = [self.output_directory.as_str(), name].iter().collect();
        fs::create_dir_all(&dir).context(WritingReportSnafu {
            path: dir.display().to_string(),
        })?;
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_runs_every_stage() {
        assert_eq!(
            stages(None),
            vec![Stage::Format, Stage::Audit, Stage::Compare]
        );
        assert_eq!(stages(Some(Command::All)), stages(None));
        assert_eq!(stages(Some(Command::Compare)), vec![Stage::Compare]);
    }

    #[test]
    fn missing_survey_is_reported() {
        let settings = Settings {
            survey_file: None,
            ..Settings::default()
        };
        let res = run_format(&settings);
        assert!(matches!(res, Err(AuditError::Whatever { .. })));
    }

    #[test]
    fn compare_requires_old_database() {
        let settings = Settings {
            survey_file: Some("survey.csv".to_string()),
            old_database_file: None,
            ..Settings::default()
        };
        assert!(matches!(
            run_compare(&settings),
            Err(AuditError::Whatever { .. })
        ));
    }

    #[test]
    fn reference_mismatch_fails() {
        let dir = std::env::temp_dir().join("census_audit_reference_test");
        fs::create_dir_all(&dir).unwrap();
        let p = dir.join("reference.json");
        fs::write(&p, r#"{"total_personas": 3}"#).unwrap();
        let p = p.display().to_string();

        assert!(check_reference(&serde_json::json!({"total_personas": 3}), &p).is_ok());
        assert!(check_reference(&serde_json::json!({"total_personas": 4}), &p).is_err());
    }
}
