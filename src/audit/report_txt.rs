// The reports in plain text, with tables.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::{ASCII_FULL, UTF8_FULL};
use comfy_table::{CellAlignment, ContentArrangement, Table};

use crate::audit::*;
use snafu::prelude::*;

fn banner(title: &str) -> String {
    format!("{} {} {}\n\n", "=".repeat(20), title, "=".repeat(20))
}

fn grid(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(header);
    table
}

/// The file names and contents of the reports of the checks.
pub fn audit_reports(report: &AuditReport) -> Vec<(&'static str, String)> {
    let total = report.total_persons;
    vec![
        (
            "reporte_familias",
            multi_member_txt(&report.households.multi_member, total),
        ),
        (
            "reporte_1_miembro",
            single_member_txt(&report.households.single_member, total),
        ),
        (
            "reporte_advertencias",
            warnings_txt(&report.households.warnings, total),
        ),
        ("reporte_repetidos", duplicates_txt(&report.duplicates, total)),
    ]
}

pub fn multi_member_txt(households: &[Household], total_persons: usize) -> String {
    let mut res = banner("FAMILIAS CON MAS DE 1 MIEMBRO REGISTRADO");
    res.push_str("Esta tabla muestra a las familias por jefe de las mismas\n");
    res.push_str(&format!(
        "\nSe encontraron {} familias con más de 1 miembro registrado de un total de {} personas.\n",
        households.len(),
        total_persons
    ));
    for h in households.iter() {
        res.push_str(&format!(
            "\n{} Familia con Cédula de Jefe(a) de Familia: {} {}\n",
            "=".repeat(30),
            h.family_head_id,
            "=".repeat(30)
        ));
        res.push_str("\nMiembros de la Familia:\n");
        let mut table = grid(vec!["Documento", "Nombre Completo Persona"]);
        for m in h.members.iter() {
            table.add_row(vec![m.document_id.clone(), m.full_name.clone()]);
        }
        res.push_str(&format!("{}\n", table));
    }
    res
}

pub fn single_member_txt(households: &[Household], total_persons: usize) -> String {
    let mut res = banner("JEFES DE FAMILIA REGISTRADOS SIN OTROS MIEMBROS");
    res.push_str("Esta tabla muestra a los jefes de familia que se registraron como el único miembro de su núcleo familiar.\nEsto podría indicar que faltan miembros por registrar o que realmente son familias unipersonales.\n\n");
    let mut table = grid(vec!["Cédula del Jefe", "Nombre del Jefe"]);
    for h in households.iter() {
        table.add_row(vec![h.head.document_id.clone(), h.head.full_name.clone()]);
    }
    res.push_str(&table.to_string());
    res.push_str(&format!(
        "\n\nSe encontraron {} jefes de familia registrados sin otros miembros de un total de {} personas en el registro.\n",
        households.len(),
        total_persons
    ));
    res
}

pub fn warnings_txt(warnings: &[Warning], total_persons: usize) -> String {
    let mut res = banner("REPORTE DE ADVERTENCIAS EN LOS REGISTROS DE FAMILIA");
    res.push_str("Personas sin ningún jefe de familia asociado, o familias con varios jefes registrados. Se recomienda revisar la cédula del jefe de familia.\n\n");
    res.push_str(&format!(
        "Se encontraron {} advertencias de un total de {} personas en el registro.\n",
        warnings.len(),
        total_persons
    ));
    if warnings.is_empty() {
        res.push_str("No se encontraron advertencias en los registros de familia.\n");
        return res;
    }
    let mut table = grid(vec![
        "Cédula de Jefe de familia",
        "Nombre Completo (Persona)",
        "Cédula (Persona)",
        "Mensaje",
    ]);
    for w in warnings.iter() {
        if w.is_ambiguous_head() {
            table.add_row(vec![
                w.family_head_id.clone(),
                w.person.clone(),
                String::new(),
                w.detail.clone(),
            ]);
        } else {
            table.add_row(vec![
                w.family_head_id.clone(),
                w.person.clone(),
                w.detail.clone(),
                "Sin jefe de familia registrado".to_string(),
            ]);
        }
    }
    res.push_str(&table.to_string());
    res.push('\n');
    res
}

pub fn duplicates_txt(report: &DuplicateReport, total_persons: usize) -> String {
    let mut res = banner("REPORTE DE PERSONAS REPETIDAS EN EL REGISTRO");
    res.push_str(&crate::audit::report_json::duplicates_description(
        report,
        total_persons,
    ));
    res.push_str("\n\n");
    if report.rows.is_empty() {
        res.push_str("No se encontraron personas repetidas en el registro.\n");
        return res;
    }
    let mut table = grid(vec![
        COL_FAMILY_HEAD,
        "Nombre Completo Persona",
        "Cedula Persona",
        report.count_semantics.label(),
    ]);
    for r in report.rows.iter() {
        table.add_row(vec![
            r.family_head_id.clone(),
            r.full_name.clone(),
            r.document_id.clone(),
            r.count.to_string(),
        ]);
    }
    if let Some(col) = table.column_mut(3) {
        col.set_cell_alignment(CellAlignment::Right);
    }
    res.push_str(&table.to_string());
    res.push('\n');
    res
}

pub fn comparison_txt(diff: &SnapshotDiff) -> String {
    let s = &diff.summary;
    let mut res = banner(crate::audit::report_json::TITLE_COMPARISON);
    res.push_str("Resumen de la comparación\n");
    let mut summary = grid(vec!["Concepto", "Total"]);
    summary.add_row(vec![
        "Familias en la base de datos antigua".to_string(),
        s.old_families.to_string(),
    ]);
    summary.add_row(vec![
        "Jefes de familia en la base de datos nueva".to_string(),
        s.new_families.to_string(),
    ]);
    summary.add_row(vec![
        "Personas en la base de datos antigua".to_string(),
        s.old_persons.to_string(),
    ]);
    summary.add_row(vec![
        "Personas en la base de datos nueva".to_string(),
        s.new_persons.to_string(),
    ]);
    summary.add_row(vec![
        "Total de personas faltantes".to_string(),
        s.total_missing.to_string(),
    ]);
    summary.add_row(vec![
        "Personas señaladas como faltantes".to_string(),
        s.flagged_missing.to_string(),
    ]);
    res.push_str(&format!("{}\n", summary));

    for f in diff.families.iter() {
        res.push_str(&format!(
            "\n{} Familia antigua: {} {}\n",
            "=".repeat(30),
            f.old_family_id,
            "=".repeat(30)
        ));
        if let Some(h) = &f.head {
            res.push_str(&format!(
                "Jefe(a) en la nueva base de datos: {} ({})\n",
                h.full_name, h.document_id
            ));
        }
        res.push_str("\nMiembros (base antigua):\n");
        res.push_str(&format!("{}\n", members_table(&f.old_members)));
        res.push_str("\nMiembros (base nueva):\n");
        res.push_str(&format!("{}\n", members_table(&f.new_members)));
        if f.missing.is_empty() {
            res.push_str("\nNo faltan miembros en esta familia.\n");
        } else {
            res.push_str("\nMiembros faltantes:\n");
            res.push_str(&format!("{}\n", members_table(&f.missing)));
        }
    }

    if !diff.orphaned.is_empty() {
        res.push_str(&format!(
            "\n{} Miembros de la DB Antigua sin Jefe de Familia Correspondiente en la Nueva DB {}\n",
            "=".repeat(10),
            "=".repeat(10)
        ));
        let mut table = grid(vec![
            "Documento",
            "Nombre Completo",
            "Familia Antigua (ID)",
            "Parentesco (Nueva DB)",
        ]);
        for o in diff.orphaned.iter() {
            table.add_row(vec![
                o.document_id.clone(),
                o.full_name.clone(),
                o.old_family_id.clone(),
                o.relationship.clone(),
            ]);
        }
        res.push_str(&format!("{}\n", table));
    }
    res
}

fn members_table(members: &[DiffMember]) -> Table {
    let mut table = grid(vec!["Documento", "Nombre Completo", "Parentesco (Nueva DB)"]);
    for m in members.iter() {
        table.add_row(vec![
            m.document_id.clone(),
            m.full_name.clone(),
            m.relationship.clone(),
        ]);
    }
    table
}

/// The counts of the checks, printed at the end of a run.
pub fn summary_table(report: &AuditReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Reporte", "Total"]);
    let h = &report.households;
    table.add_row(vec![
        "Personas analizadas".to_string(),
        report.total_persons.to_string(),
    ]);
    table.add_row(vec![
        "Familias con más de un miembro".to_string(),
        h.multi_member.len().to_string(),
    ]);
    table.add_row(vec![
        "Jefes de familia sin otros miembros".to_string(),
        h.single_member.len().to_string(),
    ]);
    table.add_row(vec!["Advertencias".to_string(), h.warnings.len().to_string()]);
    table.add_row(vec![
        "Registros repetidos".to_string(),
        report.duplicates.rows.len().to_string(),
    ]);
    if let Some(col) = table.column_mut(1) {
        col.set_cell_alignment(CellAlignment::Right);
    }
    table
}

pub fn write_txt(path: &Path, text: &str) -> AuditResult<()> {
    let path_s = path.display().to_string();
    fs::write(path, text).context(WritingReportSnafu { path: path_s.clone() })?;
    println!("El reporte ha sido guardado en '{}'.", path_s);
    Ok(())
}
