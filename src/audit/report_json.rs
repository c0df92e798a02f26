// The reports in JSON format.

use serde_json::json;
use serde_json::Map as JSMap;

use crate::audit::*;
use snafu::prelude::*;

pub const TITLE_MULTI_MEMBER: &str = "REPORTE DE FAMILIAS CON MÁS DE UN MIEMBRO";
pub const TITLE_SINGLE_MEMBER: &str = "REPORTE DE JEFES DE FAMILIA REGISTRADOS SIN OTROS MIEMBROS";
pub const TITLE_WARNINGS: &str = "REPORTE DE ADVERTENCIAS EN LOS REGISTROS DE FAMILIA";
pub const TITLE_DUPLICATES: &str = "REPORTE DE PERSONAS REPETIDAS EN EL REGISTRO";
pub const TITLE_COMPARISON: &str = "REPORTE AVANZADO DE COMPARACIÓN DE BASES DE DATOS";

pub const DESCRIPTION_SINGLE_MEMBER: &str = "Esta tabla muestra a los jefes de familia que se registraron como el único miembro de su núcleo familiar. Esto podría indicar que faltan miembros por registrar o que realmente son familias unipersonales.";
pub const DESCRIPTION_WARNINGS: &str = "No se encontró ningún jefe de familia asociado a estas personas, o varias personas se registraron como jefe de la misma familia. Se recomienda revisar la cédula del jefe de familia.";

/// The file names and contents of the reports of the checks.
pub fn audit_reports(report: &AuditReport) -> Vec<(&'static str, JSValue)> {
    let total = report.total_persons;
    vec![
        (
            "reporte_familias",
            multi_member_js(&report.households.multi_member, total),
        ),
        (
            "reporte_1_miembro",
            single_member_js(&report.households.single_member, total),
        ),
        (
            "reporte_advertencias",
            warnings_js(&report.households.warnings, total),
        ),
        ("reporte_repetidos", duplicates_js(&report.duplicates, total)),
    ]
}

fn member_js(m: &Member) -> JSValue {
    json!({
        "Documento": m.document_id,
        "Nombre Completo Persona": m.full_name
    })
}

pub fn multi_member_js(households: &[Household], total_persons: usize) -> JSValue {
    let families: Vec<JSValue> = households
        .iter()
        .map(|h| {
            json!({
                "cedula_jefe_familia": h.family_head_id,
                "jefe_de_familia": {
                    "documento": h.head.document_id,
                    "nombre_completo": h.head.full_name
                },
                "miembros_de_familia": h.members.iter().map(member_js).collect::<Vec<JSValue>>()
            })
        })
        .collect();
    json!({
        "titulo": TITLE_MULTI_MEMBER,
        "total_familias": households.len(),
        "total_personas_en_familias": households.iter().map(|h| h.members.len()).sum::<usize>(),
        "total_personas_analizadas": total_persons,
        "familias": families
    })
}

pub fn single_member_js(households: &[Household], total_persons: usize) -> JSValue {
    let heads: Vec<JSValue> = households
        .iter()
        .map(|h| {
            json!({
                "cedula_jefe": h.head.document_id,
                "nombre_jefe": h.head.full_name
            })
        })
        .collect();
    json!({
        "titulo": TITLE_SINGLE_MEMBER,
        "descripcion": DESCRIPTION_SINGLE_MEMBER,
        "total_jefes_solos": households.len(),
        "total_personas_analizadas": total_persons,
        "jefes_de_familia_solos": heads
    })
}

pub fn warnings_js(warnings: &[Warning], total_persons: usize) -> JSValue {
    let entries: Vec<JSValue> = warnings
        .iter()
        .map(|w| {
            if w.is_ambiguous_head() {
                json!({
                    "tipo": "jefes_multiples",
                    "cedula_jefe_familia": w.family_head_id,
                    "jefes_registrados": w.person,
                    "mensaje": w.detail
                })
            } else {
                json!({
                    "tipo": "sin_jefe",
                    "cedula_jefe_familia": w.family_head_id,
                    "nombre_completo_persona": w.person,
                    "cedula_persona": w.detail
                })
            }
        })
        .collect();
    json!({
        "titulo": TITLE_WARNINGS,
        "descripcion": DESCRIPTION_WARNINGS,
        "total_advertencias": warnings.len(),
        "total_personas_analizadas": total_persons,
        "advertencias": entries
    })
}

pub fn duplicates_description(report: &DuplicateReport, total_persons: usize) -> String {
    let criterion = match report.policy {
        DuplicatePolicy::DocumentAndName => "por su nombre completo",
        DuplicatePolicy::DocumentOnly => "por su número de documento",
    };
    format!(
        "Este reporte muestra las personas que aparecen más de una vez en el registro, identificadas {}. Se encontraron {} registros repetidos de un total de {} personas.",
        criterion,
        report.rows.len(),
        total_persons
    )
}

pub fn duplicates_js(report: &DuplicateReport, total_persons: usize) -> JSValue {
    let rows: Vec<JSValue> = report
        .rows
        .iter()
        .map(|r| {
            json!({
                "cedula_jefe_familia": r.family_head_id,
                "nombre_completo_persona": r.full_name,
                "cedula_persona": r.document_id,
                "cantidad_repeticiones": r.count
            })
        })
        .collect();
    json!({
        "titulo": TITLE_DUPLICATES,
        "descripcion": duplicates_description(report, total_persons),
        "criterio_cantidad": report.count_semantics.label(),
        "total_registros_repetidos": report.rows.len(),
        "total_personas_analizadas": total_persons,
        "personas_repetidas": rows
    })
}

/// All the reports of the checks in a single document, used for the comparison with a reference.
pub fn summary_js(report: &AuditReport) -> JSValue {
    let mut js = JSMap::new();
    for (name, content) in audit_reports(report) {
        js.insert(name.to_string(), content);
    }
    JSValue::Object(js)
}

fn diff_member_js(m: &DiffMember) -> JSValue {
    json!({
        "documento": m.document_id,
        "nombre_completo": m.full_name,
        "parentesco_nueva_db": m.relationship
    })
}

pub fn comparison_js(diff: &SnapshotDiff) -> JSValue {
    let s = &diff.summary;
    let families: Vec<JSValue> = diff
        .families
        .iter()
        .map(|f| {
            let head = match &f.head {
                Some(h) => json!({"documento": h.document_id, "nombre": h.full_name}),
                None => JSValue::Null,
            };
            json!({
                "familia_antigua": f.old_family_id,
                "jefe_nueva_db": head,
                "miembros_vieja": f.old_members.iter().map(diff_member_js).collect::<Vec<JSValue>>(),
                "miembros_nueva": f.new_members.iter().map(diff_member_js).collect::<Vec<JSValue>>(),
                "faltantes": f.missing.iter().map(diff_member_js).collect::<Vec<JSValue>>()
            })
        })
        .collect();
    let orphaned: Vec<JSValue> = diff
        .orphaned
        .iter()
        .map(|o| {
            json!({
                "familia_antigua": o.old_family_id,
                "documento": o.document_id,
                "nombre_completo": o.full_name,
                "parentesco_nueva_db": o.relationship
            })
        })
        .collect();
    json!({
        "titulo": TITLE_COMPARISON,
        "resumen": {
            "total_familias_comparadas_vieja": s.old_families,
            "total_familias_comparadas": s.new_families,
            "total_personas_vieja": s.old_persons,
            "total_personas_nueva": s.new_persons,
            "total_personas_faltantes": s.total_missing,
            "total_personas_senaladas": s.flagged_missing
        },
        "reporte_por_familia": families,
        "advertencias_viejas": orphaned
    })
}

pub fn write_json(path: &Path, js: &JSValue) -> AuditResult<()> {
    let path_s = path.display().to_string();
    let pretty = serde_json::to_string_pretty(js).context(ParsingJsonSnafu {})?;
    fs::write(path, pretty).context(WritingReportSnafu { path: path_s.clone() })?;
    println!("El reporte ha sido guardado en '{}'.", path_s);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use household_audit::builder::Builder;

    fn report() -> AuditReport {
        let mut builder = Builder::new(&AuditRules::DEFAULT_RULES).unwrap();
        builder.add_person_simple("1", "1", &["Ana", "", "Ruiz"]).unwrap();
        builder.add_person_simple("1", "2", &["Tom", "", "Ruiz"]).unwrap();
        builder.add_person_simple("3", "3", &["Eli", "", "Paz"]).unwrap();
        builder.add_person_simple("9", "4", &["Luz", "", "Paz"]).unwrap();
        builder.add_person_simple("5", "5", &["Eli", "", "Paz"]).unwrap();
        builder.audit().unwrap()
    }

    #[test]
    fn multi_member_report() {
        let js = multi_member_js(&report().households.multi_member, 5);
        assert_eq!(js["titulo"], TITLE_MULTI_MEMBER);
        assert_eq!(js["total_familias"], 1);
        assert_eq!(js["total_personas_en_familias"], 2);
        assert_eq!(js["familias"][0]["cedula_jefe_familia"], "1");
        assert_eq!(js["familias"][0]["jefe_de_familia"]["nombre_completo"], "Ana Ruiz");
        assert_eq!(
            js["familias"][0]["miembros_de_familia"][1]["Nombre Completo Persona"],
            "Tom Ruiz"
        );
    }

    #[test]
    fn warnings_and_duplicates() {
        let r = report();
        let warnings = warnings_js(&r.households.warnings, r.total_persons);
        assert_eq!(warnings["total_advertencias"], 1);
        assert_eq!(warnings["advertencias"][0]["tipo"], "sin_jefe");
        assert_eq!(warnings["advertencias"][0]["cedula_persona"], "4");

        let dups = duplicates_js(&r.duplicates, r.total_persons);
        assert_eq!(dups["criterio_cantidad"], "Cantidad_Docs_Repetido");
        assert_eq!(dups["total_registros_repetidos"], 2);
        assert_eq!(dups["personas_repetidas"][0]["nombre_completo_persona"], "Eli Paz");
        assert_eq!(dups["personas_repetidas"][0]["cantidad_repeticiones"], 2);
    }

    #[test]
    fn summary_has_all_reports() {
        let js = summary_js(&report());
        for name in [
            "reporte_familias",
            "reporte_1_miembro",
            "reporte_advertencias",
            "reporte_repetidos",
        ] {
            assert!(js.get(name).is_some(), "missing {}", name);
        }
    }

    #[test]
    fn comparison_report() {
        let old = vec![
            OldPerson::new("A", "1", "Ana", "Ruiz"),
            OldPerson::new("A", "7", "Leo", "Ruiz"),
            OldPerson::new("B", "8", "Sol", "Paz"),
        ];
        let new = vec![
            PersonRecord::new("1", "1", "Ana", "", "Ruiz", ""),
            PersonRecord::new("1", "2", "Tom", "", "Ruiz", ""),
        ];
        let diff = diff_snapshots(&old, &new, &AuditRules::DEFAULT_RULES);
        let js = comparison_js(&diff);
        assert_eq!(js["titulo"], TITLE_COMPARISON);
        assert_eq!(js["resumen"]["total_personas_vieja"], 3);
        assert_eq!(js["reporte_por_familia"][0]["jefe_nueva_db"]["documento"], "1");
        assert_eq!(js["reporte_por_familia"][0]["faltantes"][0]["documento"], "7");
        assert_eq!(
            js["reporte_por_familia"][0]["faltantes"][0]["parentesco_nueva_db"],
            NOT_FOUND
        );
        assert_eq!(js["advertencias_viejas"][0]["familia_antigua"], "B");
    }
}
