use chrono::{Duration, NaiveDate, NaiveDateTime};
use log::{debug, info};

use crate::config::*;
use crate::identity::assign_identities;

// ********* Recoding tables *********
// Exact, case-sensitive matches on the trimmed value. Values outside a table have no code.

pub const RELATIONSHIP_CODES: &[(&str, &str)] = &[
    ("Jefe(a) de Familia", "JF"),
    ("Cónyuge", "CY"),
    ("Esposo(a)", "CY"),
    ("Compañero(a)", "CY"),
    ("Hijo(a)", "HJ"),
    ("Hijastro(a)", "HS"),
    ("Padre", "PD"),
    ("Madre", "MD"),
    ("Hermano(a)", "HR"),
    ("Nieto(a)", "NT"),
    ("Abuelo(a)", "AB"),
    ("Tío(a)", "TI"),
    ("Sobrino(a)", "SB"),
    ("Primo(a)", "PR"),
    ("Suegro(a)", "SG"),
    ("Yerno", "YN"),
    ("Nuera", "YN"),
    ("Cuñado(a)", "CU"),
    ("Otro pariente", "OP"),
    ("No pariente", "NP"),
];

pub const ID_TYPE_CODES: &[(&str, &str)] = &[
    ("Cédula de ciudadanía", "CC"),
    ("Tarjeta de identidad", "TI"),
    ("Registro civil", "RC"),
    ("Cédula de extranjería", "CE"),
    ("Pasaporte", "PA"),
    ("Permiso especial de permanencia", "PE"),
    ("Sin identificación", "SI"),
];

pub const SEX_CODES: &[(&str, &str)] = &[("Femenino", "F"), ("Masculino", "M")];

pub const EDUCATION_CODES: &[(&str, &str)] = &[
    ("Ninguno", "NG"),
    ("Preescolar", "PE"),
    ("Primaria incompleta", "PI"),
    ("Primaria completa", "PC"),
    ("Secundaria incompleta", "SI"),
    ("Secundaria completa", "SC"),
    ("Técnico", "TC"),
    ("Tecnólogo", "TG"),
    ("Universitario", "UN"),
    ("Posgrado", "PG"),
];

pub const MARITAL_STATUS_CODES: &[(&str, &str)] = &[
    ("Soltero(a)", "SO"),
    ("Casado(a)", "CA"),
    ("Unión libre", "UL"),
    ("Separado(a)", "SE"),
    ("Divorciado(a)", "DI"),
    ("Viudo(a)", "VI"),
];

/// A closed lookup table from survey answers to short codes.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct Recoding {
    pub name: &'static str,
    pub table: &'static [(&'static str, &'static str)],
}

impl Recoding {
    /// The code of a cell, or `None` for non-text cells and unknown answers.
    pub fn code(&self, value: &Cell) -> Option<&'static str> {
        let s = match value {
            Cell::Text(s) => s.trim(),
            _ => return None,
        };
        let res = self
            .table
            .iter()
            .find(|(answer, _)| *answer == s)
            .map(|(_, code)| *code);
        if res.is_none() {
            debug!("Recoding {}: no code for {:?}", self.name, s);
        }
        res
    }
}

pub const RELATIONSHIP: Recoding = Recoding {
    name: "relationship",
    table: RELATIONSHIP_CODES,
};
pub const ID_TYPE: Recoding = Recoding {
    name: "id_type",
    table: ID_TYPE_CODES,
};
pub const SEX: Recoding = Recoding {
    name: "sex",
    table: SEX_CODES,
};
pub const EDUCATION: Recoding = Recoding {
    name: "education",
    table: EDUCATION_CODES,
};
pub const MARITAL_STATUS: Recoding = Recoding {
    name: "marital_status",
    table: MARITAL_STATUS_CODES,
};

// ********* Names and dates *********

/// Lower-cases a name and capitalizes the first letter of every word.
/// Non-text cells are returned unchanged.
pub fn title_case(value: &Cell) -> Cell {
    match value {
        Cell::Text(s) => {
            let mut res = String::with_capacity(s.len());
            let mut at_word_start = true;
            for c in s.chars() {
                if c.is_whitespace() {
                    at_word_start = true;
                    res.push(c);
                } else if at_word_start {
                    at_word_start = false;
                    res.extend(c.to_uppercase());
                } else {
                    res.extend(c.to_lowercase());
                }
            }
            Cell::Text(res)
        }
        x => x.clone(),
    }
}

const TEXT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d", "%d.%m.%Y"];
const TEXT_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Parses a date permissively. Anything that cannot be read as a date gives `None`.
///
/// Numbers are read as spreadsheet serial dates. Text dates are read day first.
pub fn parse_date(value: &Cell) -> Option<NaiveDate> {
    match value {
        Cell::Date(d) => Some(*d),
        Cell::Number(n) => from_serial(*n),
        Cell::Text(s) => {
            let s = s.trim();
            TEXT_DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
                .or_else(|| {
                    TEXT_DATETIME_FORMATS
                        .iter()
                        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                        .map(|dt| dt.date())
                })
        }
        _ => None,
    }
}

/// Converts a spreadsheet serial number (days since 1899-12-30) to a date.
pub fn from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > 2_958_465.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|epoch| epoch.checked_add_signed(Duration::days(serial.trunc() as i64)))
}

pub fn format_date(date: &Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

// ********* Normalized records *********

/// The output columns, in order.
pub const OUTPUT_COLUMNS: [&str; 22] = [
    COL_FAMILY_HEAD,
    "VIVIENDA",
    "INTEGRANTES",
    "FAMILIA",
    "PRIMER NOMBRE",
    "SEGUNDO NOMBRE",
    "PRIMER APELLIDO",
    "SEGUNDO APELLIDO",
    "PARENTESCO",
    "TIPO IDENTIFICACION",
    "NUMERO DOCUMENTO",
    "SEXO",
    "FECHA NACIMIENTO",
    "ESCOLARIDAD",
    "OCUPACION",
    "ESTADO CIVIL",
    "DIRECCION",
    "TELEFONO",
    "CANTIDAD DE HIJOS NACIDOS VIVOS",
    "NUMERO DE HIJOS SOBREVIVIENTES",
    "FECHA DE NACIMIENTO DEL ULTIMO HIJO NACIDO VIVO",
    "CUANTAS PERSONAS FALLECIERON EL AÑO ANTERIOR",
];

/// A person record in the standardized schema.
#[derive(PartialEq, Debug, Clone)]
pub struct NormalizedRecord {
    pub family_head_id: Option<String>,
    pub housing_unit_number: u32,
    pub member_sequence: u32,
    pub family_number: u32,
    pub first_name: Cell,
    pub middle_name: Cell,
    pub last_name: Cell,
    pub second_last_name: Cell,
    pub relationship: Option<&'static str>,
    pub id_type: Option<&'static str>,
    pub document_id: Option<String>,
    pub sex: Option<&'static str>,
    pub birth_date: Option<NaiveDate>,
    pub education: Option<&'static str>,
    pub occupation: Cell,
    pub marital_status: Option<&'static str>,
    pub address: Cell,
    pub phone: Cell,
    pub live_children: Cell,
    pub surviving_children: Cell,
    pub last_child_birth_date: Option<NaiveDate>,
    pub deaths_prior_year: Cell,
}

impl NormalizedRecord {
    /// The cells of the record, in the order of `OUTPUT_COLUMNS`.
    pub fn to_row(&self) -> Vec<Cell> {
        let id = |x: &Option<String>| x.clone().map(Cell::Text).unwrap_or(Cell::Empty);
        let code = |x: Option<&str>| x.map(|s| Cell::Text(s.to_string())).unwrap_or(Cell::Empty);
        let date = |x: &Option<NaiveDate>| x.map(Cell::Date).unwrap_or(Cell::Empty);
        vec![
            id(&self.family_head_id),
            Cell::Number(self.housing_unit_number as f64),
            Cell::Number(self.member_sequence as f64),
            Cell::Number(self.family_number as f64),
            self.first_name.clone(),
            self.middle_name.clone(),
            self.last_name.clone(),
            self.second_last_name.clone(),
            code(self.relationship),
            code(self.id_type),
            id(&self.document_id),
            code(self.sex),
            date(&self.birth_date),
            code(self.education),
            self.occupation.clone(),
            code(self.marital_status),
            self.address.clone(),
            self.phone.clone(),
            self.live_children.clone(),
            self.surviving_children.clone(),
            date(&self.last_child_birth_date),
            self.deaths_prior_year.clone(),
        ]
    }
}

/// Normalizes already-read person records.
pub fn normalize_records(records: &[PersonRecord]) -> Vec<NormalizedRecord> {
    let identities = assign_identities(records);
    records
        .iter()
        .zip(identities.iter())
        .map(|(r, ident)| NormalizedRecord {
            family_head_id: r.family_head_id.clone(),
            housing_unit_number: ident.housing_unit_number,
            member_sequence: ident.member_sequence,
            family_number: ident.family_number,
            first_name: title_case(&r.first_name),
            middle_name: title_case(&r.middle_name),
            last_name: title_case(&r.last_name),
            second_last_name: title_case(&r.second_last_name),
            relationship: RELATIONSHIP.code(&r.relationship),
            id_type: ID_TYPE.code(&r.id_type),
            document_id: r.document_id.clone(),
            sex: SEX.code(&r.sex),
            birth_date: parse_date(&r.birth_date),
            education: EDUCATION.code(&r.education),
            occupation: r.occupation.clone(),
            marital_status: MARITAL_STATUS.code(&r.marital_status),
            address: r.address.clone(),
            phone: r.phone.clone(),
            live_children: r.live_children.clone(),
            surviving_children: r.surviving_children.clone(),
            last_child_birth_date: parse_date(&r.last_child_birth_date),
            deaths_prior_year: r.deaths_prior_year.clone(),
        })
        .collect()
}

/// Reads a survey table and converts it to the standardized schema.
///
/// Fails if any column of the survey schema is missing. Extra columns are dropped.
pub fn normalize_table(table: &RawTable) -> Result<Vec<NormalizedRecord>, AuditErrors> {
    let records = PersonRecord::from_table(table)?;
    let res = normalize_records(&records);
    let unmapped_sex = res.iter().filter(|r| r.sex.is_none()).count();
    info!(
        "normalize_table: {} records normalized ({} without sex code)",
        res.len(),
        unmapped_sex
    );
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn recoding_known_and_unknown() {
        assert_eq!(SEX.code(&text("Femenino")), Some("F"));
        assert_eq!(SEX.code(&text("Marciano")), None);
        assert_eq!(SEX.code(&text("femenino")), None);
        assert_eq!(SEX.code(&Cell::Empty), None);
        assert_eq!(RELATIONSHIP.code(&text("Hijo(a) ")), Some("HJ"));
        assert_eq!(MARITAL_STATUS.code(&text("Unión libre")), Some("UL"));
    }

    #[test]
    fn title_case_names() {
        assert_eq!(title_case(&text("mARÍA  josé")), text("María  José"));
        assert_eq!(title_case(&Cell::Number(3.0)), Cell::Number(3.0));
        assert_eq!(title_case(&Cell::Empty), Cell::Empty);
    }

    #[test]
    fn permissive_dates() {
        let d = NaiveDate::from_ymd_opt(1990, 4, 3);
        assert_eq!(parse_date(&text("1990-04-03")), d);
        assert_eq!(parse_date(&text("03/04/1990")), d);
        assert_eq!(parse_date(&text("1990-04-03 00:00:00")), d);
        assert_eq!(parse_date(&Cell::Number(32966.0)), d);
        assert_eq!(parse_date(&text("no sabe")), None);
        assert_eq!(parse_date(&Cell::Empty), None);
        assert_eq!(format_date(&d), "03/04/1990");
        assert_eq!(format_date(&None), "");
    }

    fn survey_table() -> RawTable {
        let mut headers: Vec<String> = vec![
            COL_FAMILY_HEAD,
            COL_DOCUMENT,
            COL_FIRST_NAME,
            COL_MIDDLE_NAME,
            COL_LAST_NAME,
            COL_SECOND_LAST_NAME,
            COL_RELATIONSHIP,
            COL_ID_TYPE,
            COL_SEX,
            COL_BIRTH_DATE,
            COL_EDUCATION,
            COL_OCCUPATION,
            COL_MARITAL_STATUS,
            COL_ADDRESS,
            COL_PHONE,
            COL_LIVE_CHILDREN,
            COL_SURVIVING_CHILDREN,
            COL_LAST_CHILD_BIRTH,
            COL_DEATHS_PRIOR_YEAR,
        ]
        .iter()
        .map(|s| format!(" {} ", s))
        .collect();
        headers.push("Marca temporal".to_string());
        let row = |head: f64, doc: f64, name: &str, sex: &str| {
            vec![
                Cell::Number(head),
                Cell::Number(doc),
                text(name),
                Cell::Empty,
                text("RUIZ"),
                Cell::Empty,
                text("Hijo(a)"),
                text("Cédula de ciudadanía"),
                text(sex),
                text("1990-04-03"),
                text("Primaria completa"),
                text("Agricultor"),
                text("Soltero(a)"),
                text("Vereda Mirabel"),
                Cell::Number(3001234567.0),
                Cell::Number(0.0),
                Cell::Number(0.0),
                text("sin dato"),
                Cell::Number(0.0),
                text("2024-01-01"),
            ]
        };
        RawTable::new(
            headers,
            vec![
                row(1.0, 1.0, "ana", "Femenino"),
                row(1.0, 2.0, "TOM", "Marciano"),
                row(3.0, 3.0, "eli", "Masculino"),
            ],
        )
    }

    #[test]
    fn normalize_survey_table() {
        let res = normalize_table(&survey_table()).unwrap();
        assert_eq!(res.len(), 3);
        assert_eq!(res[1].first_name, text("Tom"));
        assert_eq!(res[1].last_name, text("Ruiz"));
        assert_eq!(res[1].sex, None);
        assert_eq!(res[0].sex, Some("F"));
        assert_eq!(res[1].member_sequence, 2);
        assert_eq!(res[2].family_number, 2);
        assert_eq!(res[2].document_id, Some("3".to_string()));
        assert_eq!(res[0].last_child_birth_date, None);

        let row = res[0].to_row();
        assert_eq!(row.len(), OUTPUT_COLUMNS.len());
        assert_eq!(row[0], text("1"));
        assert_eq!(row[12], Cell::Date(NaiveDate::from_ymd_opt(1990, 4, 3).unwrap()));
    }

    #[test]
    fn missing_column_fails() {
        let mut t = survey_table();
        t.headers[8] = "Genero".to_string();
        assert_eq!(
            normalize_table(&t),
            Err(AuditErrors::MissingColumn {
                column: COL_SEX.to_string()
            })
        );
    }
}
