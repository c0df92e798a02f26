use clap::{Parser, Subcommand};

/// Formats a household census survey, checks the consistency of its families and compares
/// it with an older database.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Option<Command>,

    /// (file path, optional) A JSON file with the settings of the run. The options passed on the
    /// command line override the values of this file.
    #[clap(short, long, global = true, value_parser)]
    pub config: Option<String>,

    /// (file path, xlsx or csv) The survey to process.
    #[clap(short, long, global = true, value_parser)]
    pub input: Option<String>,

    /// (file path, xlsx or csv) The old database used by the comparison.
    #[clap(long, global = true, value_parser)]
    pub old: Option<String>,

    /// (directory, default 'reportes') Where the reports are written.
    #[clap(short, long, global = true, value_parser)]
    pub out: Option<String>,

    /// (file path, xlsx or csv) Where the formatted survey is written. By default,
    /// datos_formateados.xlsx in the output directory.
    #[clap(long, global = true, value_parser)]
    pub formatted: Option<String>,

    /// (xlsx or csv) The type of the input files. By default, inferred from the file extensions.
    #[clap(long, global = true, value_parser)]
    pub input_type: Option<String>,

    /// (default: the first worksheet) When using an Excel file, the name of the worksheet to use.
    #[clap(long, global = true, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (documentAndName or documentOnly) How duplicated persons are recognized.
    #[clap(long, global = true, value_parser)]
    pub duplicate_policy: Option<String>,

    /// (json or txt, can be repeated) The formats of the reports. All of them by default.
    #[clap(long = "format", global = true, value_parser)]
    pub formats: Option<Vec<String>>,

    /// (file path) A reference file with the expected summary of the checks, in JSON format.
    /// If provided, the run fails when the computed summary differs from it.
    #[clap(short, long, global = true, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, global = true, takes_value = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Writes the survey in the standardized layout.
    Format,
    /// Checks the families and looks for duplicated persons.
    Audit,
    /// Compares the old database with the survey.
    Compare,
    /// Runs all the steps (default).
    All,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_after_subcommand() {
        let args = Args::parse_from([
            "census-audit",
            "audit",
            "--input",
            "encuesta.xlsx",
            "--format",
            "json",
            "--verbose",
        ]);
        assert_eq!(args.command, Some(Command::Audit));
        assert_eq!(args.input, Some("encuesta.xlsx".to_string()));
        assert_eq!(args.formats, Some(vec!["json".to_string()]));
        assert!(args.verbose);
    }

    #[test]
    fn no_subcommand() {
        let args = Args::parse_from(["census-audit", "-i", "a.csv", "--old", "b.csv"]);
        assert_eq!(args.command, None);
        assert_eq!(args.old, Some("b.csv".to_string()));
    }
}
