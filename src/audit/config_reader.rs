// Reading the configuration file and merging it with the command line.

use crate::audit::*;

use serde::{Deserialize, Serialize};
use snafu::prelude::*;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuditConfig {
    #[serde(rename = "surveyFile")]
    pub survey_file: Option<String>,
    #[serde(rename = "oldDatabaseFile")]
    pub old_database_file: Option<String>,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "formattedFile")]
    pub formatted_file: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "inputType")]
    pub input_type: Option<String>,
    #[serde(rename = "duplicatePolicy")]
    pub duplicate_policy: Option<String>,
    #[serde(rename = "nameSpacing")]
    pub name_spacing: Option<String>,
    #[serde(rename = "reportFormats")]
    pub report_formats: Option<Vec<String>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum InputType {
    Xlsx,
    Csv,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ReportFormat {
    Json,
    Txt,
}

pub const DEFAULT_OUTPUT_DIRECTORY: &str = "reportes";
pub const DEFAULT_FORMATTED_FILE: &str = "datos_formateados.xlsx";

/// The settings of a run, after merging the configuration file with the command line.
///
/// Paths in the configuration file are relative to the directory of that file.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Settings {
    pub survey_file: Option<String>,
    pub old_database_file: Option<String>,
    pub output_directory: String,
    pub formatted_file: String,
    pub excel_worksheet_name: Option<String>,
    /// When missing, the type is inferred from the extension of each file.
    pub input_type: Option<InputType>,
    pub rules: AuditRules,
    pub report_formats: Vec<ReportFormat>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            survey_file: None,
            old_database_file: None,
            output_directory: DEFAULT_OUTPUT_DIRECTORY.to_string(),
            formatted_file: [DEFAULT_OUTPUT_DIRECTORY, DEFAULT_FORMATTED_FILE]
                .iter()
                .collect::<PathBuf>()
                .display()
                .to_string(),
            excel_worksheet_name: None,
            input_type: None,
            rules: AuditRules::DEFAULT_RULES,
            report_formats: vec![ReportFormat::Json, ReportFormat::Txt],
        }
    }
}

impl Settings {
    pub fn resolve(args: &Args) -> AuditResult<Settings> {
        let (config, root) = match &args.config {
            Some(config_path) => {
                let config = read_config(config_path)?;
                let root = Path::new(config_path)
                    .parent()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                (config, root)
            }
            None => (AuditConfig::default(), String::new()),
        };
        Settings::merge(args, &config, &root)
    }

    /// Command line options take precedence over the configuration file.
    pub fn merge(args: &Args, config: &AuditConfig, root: &str) -> AuditResult<Settings> {
        let from_config = |p: &Option<String>| p.as_ref().map(|s| relative_to(root, s));

        let survey_file = args.input.clone().or_else(|| from_config(&config.survey_file));
        let old_database_file = args
            .old
            .clone()
            .or_else(|| from_config(&config.old_database_file));
        let output_directory = args
            .out
            .clone()
            .or_else(|| from_config(&config.output_directory))
            .unwrap_or_else(|| DEFAULT_OUTPUT_DIRECTORY.to_string());
        let formatted_file = args
            .formatted
            .clone()
            .or_else(|| from_config(&config.formatted_file))
            .unwrap_or_else(|| relative_to(&output_directory, DEFAULT_FORMATTED_FILE));
        let excel_worksheet_name = args
            .excel_worksheet_name
            .clone()
            .or_else(|| config.excel_worksheet_name.clone());

        let input_type = match args.input_type.as_ref().or(config.input_type.as_ref()) {
            Some(s) => Some(parse_input_type(s)?),
            None => None,
        };

        let duplicate_policy = match args
            .duplicate_policy
            .as_ref()
            .or(config.duplicate_policy.as_ref())
        {
            Some(s) => parse_duplicate_policy(s)?,
            None => AuditRules::DEFAULT_RULES.duplicate_policy,
        };
        let name_spacing = match config.name_spacing.as_ref() {
            Some(s) => parse_name_spacing(s)?,
            None => AuditRules::DEFAULT_RULES.name_spacing,
        };

        let format_names = args.formats.clone().or_else(|| config.report_formats.clone());
        let report_formats = match format_names {
            Some(names) => {
                let mut res: Vec<ReportFormat> = Vec::new();
                for name in names.iter() {
                    let f = parse_report_format(name)?;
                    if !res.contains(&f) {
                        res.push(f);
                    }
                }
                res
            }
            None => vec![ReportFormat::Json, ReportFormat::Txt],
        };

        Ok(Settings {
            survey_file,
            old_database_file,
            output_directory,
            formatted_file,
            excel_worksheet_name,
            input_type,
            rules: AuditRules {
                duplicate_policy,
                name_spacing,
            },
            report_formats,
        })
    }

    /// The type of the given input file: the configured one, or else csv for a `.csv`
    /// extension and Excel for anything else.
    pub fn input_type_of(&self, path: &str) -> AuditResult<InputType> {
        if let Some(t) = self.input_type {
            return Ok(t);
        }
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        match ext.as_deref() {
            Some("csv") => Ok(InputType::Csv),
            _ => Ok(InputType::Xlsx),
        }
    }
}

fn relative_to(root: &str, path: &str) -> String {
    if root.is_empty() || Path::new(path).is_absolute() {
        path.to_string()
    } else {
        [root, path].iter().collect::<PathBuf>().display().to_string()
    }
}

pub fn parse_input_type(s: &str) -> AuditResult<InputType> {
    match s {
        "xlsx" | "excel" => Ok(InputType::Xlsx),
        "csv" => Ok(InputType::Csv),
        x => whatever!("Input type not implemented {:?}", x),
    }
}

pub fn parse_duplicate_policy(s: &str) -> AuditResult<DuplicatePolicy> {
    match s {
        "documentAndName" => Ok(DuplicatePolicy::DocumentAndName),
        "documentOnly" => Ok(DuplicatePolicy::DocumentOnly),
        x => whatever!(
            "Unknown duplicate policy {:?}: expected documentAndName or documentOnly",
            x
        ),
    }
}

pub fn parse_name_spacing(s: &str) -> AuditResult<NameSpacing> {
    match s {
        "collapse" => Ok(NameSpacing::Collapse),
        "legacy" => Ok(NameSpacing::Legacy),
        x => whatever!("Unknown name spacing {:?}: expected collapse or legacy", x),
    }
}

pub fn parse_report_format(s: &str) -> AuditResult<ReportFormat> {
    match s {
        "json" => Ok(ReportFormat::Json),
        "txt" => Ok(ReportFormat::Txt),
        "pdf" => whatever!("PDF reports are not supported: use json or txt"),
        x => whatever!("Unknown report format {:?}", x),
    }
}

pub fn read_config(path: &str) -> AuditResult<AuditConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: AuditConfig = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> AuditResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read content: {:?}", contents);
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}
