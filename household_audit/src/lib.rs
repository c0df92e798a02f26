mod config;
mod duplicates;
mod households;
mod identity;
mod normalize;
mod snapshot;

pub mod builder;
pub mod manual;

use log::{debug, info};

pub use crate::config::*;
pub use crate::duplicates::find_duplicates;
pub use crate::households::{build_households, dedup_warnings};
pub use crate::identity::{assign_identities, FamilyGroup, FamilyIndex, Identity};
pub use crate::normalize::{
    format_date, from_serial, normalize_records, normalize_table, parse_date, title_case,
    NormalizedRecord, Recoding, EDUCATION, ID_TYPE, MARITAL_STATUS, OUTPUT_COLUMNS, RELATIONSHIP,
    SEX,
};
pub use crate::snapshot::{
    diff_snapshots, DiffMember, FamilyDiff, HeadInfo, OldPerson, OrphanedMember, SnapshotDiff,
    SnapshotSummary, NOT_FOUND, OLD_COLUMNS,
};

/// Runs the household and duplicate checks over a survey table.
///
/// Arguments:
/// * `table` the survey, with all the columns of the survey schema
/// * `rules` the policies for duplicate detection and name comparison
pub fn run_audit(table: &RawTable, rules: &AuditRules) -> Result<AuditReport, AuditErrors> {
    info!(
        "Processing {:?} rows, {:?} columns, rules: {:?}",
        table.len(),
        table.headers.len(),
        rules
    );
    let records = PersonRecord::from_table(table)?;
    audit_records(&records, rules)
}

/// Runs the household and duplicate checks over person records.
pub fn audit_records(
    records: &[PersonRecord],
    rules: &AuditRules,
) -> Result<AuditReport, AuditErrors> {
    let households = build_households(records, rules);
    let duplicates = find_duplicates(records, rules);
    debug!(
        "audit_records: {} outcomes, {} duplicate rows",
        households.outcomes.len(),
        duplicates.rows.len()
    );
    Ok(AuditReport {
        households,
        duplicates,
        total_persons: records.len(),
    })
}

/// Compares an old database table with the survey table.
pub fn run_snapshot_diff(
    old: &RawTable,
    new: &RawTable,
    rules: &AuditRules,
) -> Result<SnapshotDiff, AuditErrors> {
    let old_persons = OldPerson::from_table(old)?;
    let new_persons = PersonRecord::from_table(new)?;
    info!(
        "Comparing {:?} old records with {:?} new records",
        old_persons.len(),
        new_persons.len()
    );
    Ok(diff_snapshots(&old_persons, &new_persons, rules))
}

#[cfg(test)]
mod tests {
    use super::builder::Builder;
    use super::*;

    #[test]
    fn audit_through_builder() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut builder = Builder::new(&AuditRules::DEFAULT_RULES).unwrap();
        builder.add_person_simple("1", "1", &["Ana", "", "Ruiz"]).unwrap();
        builder.add_person_simple("1", "2", &["Tom", "", "Ruiz"]).unwrap();
        builder.add_person_simple("3", "3", &["Eli", "", "Paz"]).unwrap();
        let report = builder.audit().unwrap();

        assert_eq!(report.total_persons, 3);
        let multi = &report.households.multi_member;
        assert_eq!(multi.len(), 1);
        assert_eq!(multi[0].family_head_id, "1");
        let names: Vec<&str> = multi[0].members.iter().map(|m| m.full_name.as_str()).collect();
        assert_eq!(names, vec!["Ana Ruiz", "Tom Ruiz"]);
        assert_eq!(report.households.single_member.len(), 1);
        assert_eq!(report.households.single_member[0].head.full_name, "Eli Paz");
        assert!(report.households.warnings.is_empty());
        assert!(report.duplicates.rows.is_empty());
    }

    #[test]
    fn empty_survey() {
        let builder = Builder::new(&AuditRules::DEFAULT_RULES).unwrap();
        let report = builder.audit().unwrap();
        assert_eq!(report.total_persons, 0);
        assert!(report.households.multi_member.is_empty());
        assert!(report.households.single_member.is_empty());
        assert!(report.households.warnings.is_empty());
        assert!(report.duplicates.rows.is_empty());
    }

    #[test]
    fn header_only_survey() {
        let headers: Vec<String> = [
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
        .map(|s| s.to_string())
        .collect();
        let table = RawTable::new(headers, vec![]);
        let rules = AuditRules::DEFAULT_RULES;

        assert_eq!(normalize_table(&table).unwrap().len(), 0);
        let report = run_audit(&table, &rules).unwrap();
        assert_eq!(report.total_persons, 0);
        assert!(report.households.outcomes.is_empty());
        assert!(report.duplicates.rows.is_empty());
    }

    #[test]
    fn policy_switch_through_builder() {
        let mut builder = Builder::new(&AuditRules::DEFAULT_RULES).unwrap();
        builder.add_person_simple("1", "1", &["Ana", "", "Ruiz"]).unwrap();
        builder.add_person_simple("1", "1", &["Anna", "", "Ruiz"]).unwrap();
        let by_name = builder.audit().unwrap();
        assert!(by_name.duplicates.rows.is_empty());

        let builder = builder
            .rules(&AuditRules {
                duplicate_policy: DuplicatePolicy::DocumentOnly,
                ..AuditRules::DEFAULT_RULES
            })
            .unwrap();
        let by_doc = builder.audit().unwrap();
        assert_eq!(by_doc.duplicates.rows.len(), 2);
        assert_eq!(by_doc.duplicates.count_semantics, CountSemantics::RowsPerEntry);
    }

    #[test]
    fn table_without_header() {
        let table = RawTable::new(vec![], vec![vec![Cell::Number(1.0)]]);
        assert_eq!(
            run_audit(&table, &AuditRules::DEFAULT_RULES),
            Err(AuditErrors::MissingHeader)
        );
    }
}
