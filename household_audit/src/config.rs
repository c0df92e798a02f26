// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

use chrono::NaiveDate;

/// The content of one cell of the source spreadsheet.
///
/// The readers (Excel, CSV) are expected to convert their own cell types into this one.
#[derive(PartialEq, Debug, Clone, Default)]
pub enum Cell {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Bool(bool),
    #[default]
    Empty,
}

impl Cell {
    /// Builds a text cell, mapping blank strings to `Cell::Empty`.
    pub fn text(s: &str) -> Cell {
        if s.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// The textual rendering of the cell. Whole numbers are written without
    /// a fractional part and dates use the DD/MM/YYYY form.
    pub fn display(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
            Cell::Date(d) => d.format(DATE_FORMAT).to_string(),
            Cell::Bool(b) => b.to_string(),
            Cell::Empty => String::new(),
        }
    }

    /// The identifier form of a cell: converted to a string and trimmed.
    ///
    /// This is the only place where identifiers get compared, so that a document
    /// number read as `1234.0` from a spreadsheet equals the text `"1234"`.
    pub fn as_identifier(&self) -> Option<String> {
        let s = self.display();
        let s = s.trim();
        if s.is_empty() {
            None
        } else {
            Some(s.to_string())
        }
    }
}

/// Format used for all the dates written by this crate.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// A whole dataset: a header row and the rows of cells.
///
/// Header names are trimmed at construction.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> RawTable {
        RawTable {
            headers: headers.iter().map(|h| h.trim().to_string()).collect(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize, AuditErrors> {
        if self.headers.is_empty() {
            return Err(AuditErrors::MissingHeader);
        }
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| AuditErrors::MissingColumn {
                column: name.to_string(),
            })
    }

    /// Returns the cell at the given row and column, or an empty cell for short rows.
    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .cloned()
            .unwrap_or(Cell::Empty)
    }
}

// The column names of the survey spreadsheet.
pub const COL_FAMILY_HEAD: &str = "Cedula de jefe(a) de Familia";
pub const COL_DOCUMENT: &str = "Documento";
pub const COL_FIRST_NAME: &str = "Primer Nombre";
pub const COL_MIDDLE_NAME: &str = "Segundo Nombre";
pub const COL_LAST_NAME: &str = "Primer Apellido";
pub const COL_SECOND_LAST_NAME: &str = "Segundo Apellido";
pub const COL_RELATIONSHIP: &str = "Parentesco";
pub const COL_ID_TYPE: &str = "Tipo de identificación";
pub const COL_SEX: &str = "Sexo";
pub const COL_BIRTH_DATE: &str = "Fecha de nacimiento";
pub const COL_EDUCATION: &str = "Escolaridad";
pub const COL_OCCUPATION: &str = "Ocupación";
pub const COL_MARITAL_STATUS: &str = "Estado civil";
pub const COL_ADDRESS: &str = "Dirección";
pub const COL_PHONE: &str = "Teléfono";
pub const COL_LIVE_CHILDREN: &str = "Hijos nacidos vivos";
pub const COL_SURVIVING_CHILDREN: &str = "Hijos sobrevivientes";
pub const COL_LAST_CHILD_BIRTH: &str = "Fecha de nacimiento del último hijo nacido vivo";
pub const COL_DEATHS_PRIOR_YEAR: &str = "Personas fallecidas en el año anterior";

/// One person of the survey, as read from the spreadsheet.
///
/// Identifiers are already normalized with `Cell::as_identifier`. All the other
/// fields keep the raw cell content.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct PersonRecord {
    pub family_head_id: Option<String>,
    pub document_id: Option<String>,
    pub first_name: Cell,
    pub middle_name: Cell,
    pub last_name: Cell,
    pub second_last_name: Cell,
    pub relationship: Cell,
    pub id_type: Cell,
    pub sex: Cell,
    pub birth_date: Cell,
    pub education: Cell,
    pub occupation: Cell,
    pub marital_status: Cell,
    pub address: Cell,
    pub phone: Cell,
    pub live_children: Cell,
    pub surviving_children: Cell,
    pub last_child_birth_date: Cell,
    pub deaths_prior_year: Cell,
}

impl PersonRecord {
    /// A record with only the identity fields filled in.
    pub fn new(
        family_head_id: &str,
        document_id: &str,
        first_name: &str,
        middle_name: &str,
        last_name: &str,
        second_last_name: &str,
    ) -> PersonRecord {
        PersonRecord {
            family_head_id: Cell::text(family_head_id).as_identifier(),
            document_id: Cell::text(document_id).as_identifier(),
            first_name: Cell::text(first_name),
            middle_name: Cell::text(middle_name),
            last_name: Cell::text(last_name),
            second_last_name: Cell::text(second_last_name),
            ..PersonRecord::default()
        }
    }

    /// Reads all the person records of a survey table.
    ///
    /// Every column of the survey schema must be present.
    pub fn from_table(table: &RawTable) -> Result<Vec<PersonRecord>, AuditErrors> {
        let col = |name: &str| table.column_index(name);
        let head = col(COL_FAMILY_HEAD)?;
        let doc = col(COL_DOCUMENT)?;
        let first = col(COL_FIRST_NAME)?;
        let middle = col(COL_MIDDLE_NAME)?;
        let last = col(COL_LAST_NAME)?;
        let second_last = col(COL_SECOND_LAST_NAME)?;
        let relationship = col(COL_RELATIONSHIP)?;
        let id_type = col(COL_ID_TYPE)?;
        let sex = col(COL_SEX)?;
        let birth_date = col(COL_BIRTH_DATE)?;
        let education = col(COL_EDUCATION)?;
        let occupation = col(COL_OCCUPATION)?;
        let marital_status = col(COL_MARITAL_STATUS)?;
        let address = col(COL_ADDRESS)?;
        let phone = col(COL_PHONE)?;
        let live_children = col(COL_LIVE_CHILDREN)?;
        let surviving_children = col(COL_SURVIVING_CHILDREN)?;
        let last_child = col(COL_LAST_CHILD_BIRTH)?;
        let deaths = col(COL_DEATHS_PRIOR_YEAR)?;

        let res = (0..table.len())
            .map(|r| PersonRecord {
                family_head_id: table.cell(r, head).as_identifier(),
                document_id: table.cell(r, doc).as_identifier(),
                first_name: table.cell(r, first),
                middle_name: table.cell(r, middle),
                last_name: table.cell(r, last),
                second_last_name: table.cell(r, second_last),
                relationship: table.cell(r, relationship),
                id_type: table.cell(r, id_type),
                sex: table.cell(r, sex),
                birth_date: table.cell(r, birth_date),
                education: table.cell(r, education),
                occupation: table.cell(r, occupation),
                marital_status: table.cell(r, marital_status),
                address: table.cell(r, address),
                phone: table.cell(r, phone),
                live_children: table.cell(r, live_children),
                surviving_children: table.cell(r, surviving_children),
                last_child_birth_date: table.cell(r, last_child),
                deaths_prior_year: table.cell(r, deaths),
            })
            .collect();
        Ok(res)
    }

    /// The family head id, with the empty string standing for a missing value.
    pub fn head_key(&self) -> &str {
        self.family_head_id.as_deref().unwrap_or("")
    }

    pub fn document_key(&self) -> &str {
        self.document_id.as_deref().unwrap_or("")
    }

    /// True when this record declares itself as the head of its family.
    pub fn is_self_head(&self) -> bool {
        match (&self.family_head_id, &self.document_id) {
            (Some(h), Some(d)) => h == d,
            _ => false,
        }
    }

    /// First name, middle name, first surname, second surname joined by spaces.
    pub fn full_name(&self, spacing: NameSpacing) -> String {
        full_name(
            &[
                &self.first_name,
                &self.middle_name,
                &self.last_name,
                &self.second_last_name,
            ],
            spacing,
        )
    }

    /// The short display name: first name and first surname.
    pub fn short_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.display().trim(),
            self.last_name.display().trim()
        )
    }
}

/// Joins name parts with single spaces. Missing parts are rendered empty.
pub fn full_name(parts: &[&Cell], spacing: NameSpacing) -> String {
    let trimmed: Vec<String> = parts
        .iter()
        .map(|c| c.display().trim().to_string())
        .collect();
    let joined = trimmed.join(" ");
    match spacing {
        NameSpacing::Collapse => joined.split_whitespace().collect::<Vec<&str>>().join(" "),
        NameSpacing::Legacy => joined.trim().to_string(),
    }
}

// ******** Output data structures *********

/// A member of a household, as listed in the reports.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Member {
    pub document_id: String,
    pub full_name: String,
}

/// A family with exactly one registered head.
///
/// The head is also listed in `members`.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Household {
    pub family_head_id: String,
    pub head: Member,
    pub members: Vec<Member>,
}

impl Household {
    pub fn is_multi_member(&self) -> bool {
        self.members.len() > 1
    }
}

/// Detail used by all the warnings about families with several heads.
pub const AMBIGUOUS_HEAD_DETAIL: &str =
    "Múltiples jefes de familia identificados con la misma cédula.";

/// A structural problem found in the family graph.
///
/// Two kinds of warnings share this shape:
/// - ambiguous heads: `person` lists the candidate heads and `detail` is `AMBIGUOUS_HEAD_DETAIL`
/// - headless members: `person` is the full name of the member and `detail` its document.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Warning {
    pub family_head_id: String,
    pub person: String,
    pub detail: String,
}

impl Warning {
    pub fn is_ambiguous_head(&self) -> bool {
        self.detail == AMBIGUOUS_HEAD_DETAIL
    }
}

/// The classification of one group of records sharing a family head id.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum HouseholdKind {
    MultiMember,
    SingleMember,
    /// No record of the group declares itself as the head.
    Headless,
    /// More than one record of the group declares itself as the head.
    AmbiguousHead,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct GroupOutcome {
    pub family_head_id: String,
    pub kind: HouseholdKind,
    pub size: usize,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct HouseholdReport {
    /// Households with more than one member, in order of first appearance.
    pub multi_member: Vec<Household>,
    /// Heads registered without any other member.
    pub single_member: Vec<Household>,
    /// De-duplicated warnings, in order of first appearance.
    pub warnings: Vec<Warning>,
    pub outcomes: Vec<GroupOutcome>,
    pub total_persons: usize,
}

/// One row of the duplicates report.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DuplicateRecord {
    pub family_head_id: String,
    pub full_name: String,
    pub document_id: String,
    /// See `CountSemantics` for the meaning of this number.
    pub count: usize,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum CountSemantics {
    /// Number of distinct documents registered under the same full name.
    DistinctDocumentsPerName,
    /// Number of rows sharing the document, the full name and the family head.
    RowsPerEntry,
}

impl CountSemantics {
    pub fn label(&self) -> &'static str {
        match self {
            CountSemantics::DistinctDocumentsPerName => "Cantidad_Docs_Repetido",
            CountSemantics::RowsPerEntry => "Cantidad",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DuplicateReport {
    pub policy: DuplicatePolicy,
    pub count_semantics: CountSemantics,
    pub rows: Vec<DuplicateRecord>,
}

/// Everything computed from one survey file.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AuditReport {
    pub households: HouseholdReport,
    pub duplicates: DuplicateReport,
    pub total_persons: usize,
}

/// Errors that prevent an operation from completing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum AuditErrors {
    /// A column required by the schema is not in the header.
    MissingColumn { column: String },
    /// The table has no header row.
    MissingHeader,
}

impl Error for AuditErrors {}

impl Display for AuditErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditErrors::MissingColumn { column } => {
                write!(f, "missing column in the input data: '{}'", column)
            }
            AuditErrors::MissingHeader => write!(f, "the input data has no header row"),
        }
    }
}

// ********* Configuration **********

/// How duplicated persons are recognized.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum DuplicatePolicy {
    /// A full name registered more than once, whether with the same document
    /// or with different documents.
    DocumentAndName,
    /// A document registered more than once.
    DocumentOnly,
}

/// How the name parts are joined into a full name.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum NameSpacing {
    /// Runs of whitespace (missing middle names) collapse to a single space.
    Collapse,
    /// Only leading and trailing whitespace are removed: "Ana  Ruiz" stays with two spaces.
    Legacy,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AuditRules {
    pub duplicate_policy: DuplicatePolicy,
    pub name_spacing: NameSpacing,
}

impl AuditRules {
    pub const DEFAULT_RULES: AuditRules = AuditRules {
        duplicate_policy: DuplicatePolicy::DocumentAndName,
        name_spacing: NameSpacing::Collapse,
    };
}

impl Default for AuditRules {
    fn default() -> Self {
        AuditRules::DEFAULT_RULES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_compare_across_types() {
        assert_eq!(Cell::Number(1234.0).as_identifier(), Some("1234".to_string()));
        assert_eq!(
            Cell::Text(" 1234 ".to_string()).as_identifier(),
            Some("1234".to_string())
        );
        assert_eq!(Cell::Text("  ".to_string()).as_identifier(), None);
        assert_eq!(Cell::Empty.as_identifier(), None);
    }

    #[test]
    fn full_name_spacing() {
        let p = PersonRecord::new("1", "1", " Ana ", "", "Ruiz", "");
        assert_eq!(p.full_name(NameSpacing::Collapse), "Ana Ruiz");
        assert_eq!(p.full_name(NameSpacing::Legacy), "Ana  Ruiz");
        assert_eq!(p.short_name(), "Ana Ruiz");
    }

    #[test]
    fn headers_are_trimmed() {
        let t = RawTable::new(vec![" Documento ".to_string()], vec![]);
        assert_eq!(t.column_index(COL_DOCUMENT), Ok(0));
        assert_eq!(
            t.column_index(COL_SEX),
            Err(AuditErrors::MissingColumn {
                column: "Sexo".to_string()
            })
        );
    }

    #[test]
    fn self_head_requires_both_ids() {
        assert!(PersonRecord::new("7", "7", "A", "", "B", "").is_self_head());
        assert!(!PersonRecord::new("", "", "A", "", "B", "").is_self_head());
        assert!(!PersonRecord::new("7", "8", "A", "", "B", "").is_self_head());
    }
}
