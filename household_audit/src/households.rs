use log::{debug, info};
use std::collections::HashSet;

use crate::config::*;
use crate::identity::{FamilyGroup, FamilyIndex};

/// Builds the family graph from the declared family heads and classifies every family.
///
/// For each group of records sharing a family head id:
/// - exactly one record that is its own head: a single- or multi-member household
/// - several such records: one ambiguous head warning for the group
/// - none: one warning per member whose declared head is not the head of any family
pub fn build_households(records: &[PersonRecord], rules: &AuditRules) -> HouseholdReport {
    let index = FamilyIndex::build(records);
    let known_heads = known_heads(records);
    debug!("build_households: {} known heads", known_heads.len());

    let mut report = HouseholdReport {
        total_persons: records.len(),
        ..HouseholdReport::default()
    };
    let mut warnings: Vec<Warning> = Vec::new();

    for group in index.groups() {
        let kind = classify_group(records, group, &known_heads, rules, &mut report, &mut warnings);
        debug!(
            "build_households: family {:?} ({} records): {:?}",
            group.family_head_id,
            group.rows.len(),
            kind
        );
        report.outcomes.push(GroupOutcome {
            family_head_id: group.family_head_id.clone(),
            kind,
            size: group.rows.len(),
        });
    }

    report.warnings = dedup_warnings(warnings);
    info!(
        "build_households: {} persons, {} multi-member households, {} single-member households, {} warnings",
        report.total_persons,
        report.multi_member.len(),
        report.single_member.len(),
        report.warnings.len()
    );
    report
}

/// The documents of all the records that declare themselves as heads.
fn known_heads(records: &[PersonRecord]) -> HashSet<String> {
    records
        .iter()
        .filter(|r| r.is_self_head())
        .filter_map(|r| r.document_id.clone())
        .collect()
}

fn classify_group(
    records: &[PersonRecord],
    group: &FamilyGroup,
    known_heads: &HashSet<String>,
    rules: &AuditRules,
    report: &mut HouseholdReport,
    warnings: &mut Vec<Warning>,
) -> HouseholdKind {
    let rows: Vec<&PersonRecord> = group.rows.iter().map(|idx| &records[*idx]).collect();
    let heads: Vec<&PersonRecord> = rows.iter().filter(|r| r.is_self_head()).cloned().collect();

    match heads.as_slice() {
        [head] => {
            let household = Household {
                family_head_id: group.family_head_id.clone(),
                head: member_of(head, rules),
                members: rows.iter().map(|r| member_of(r, rules)).collect(),
            };
            if household.is_multi_member() {
                report.multi_member.push(household);
                HouseholdKind::MultiMember
            } else {
                report.single_member.push(household);
                HouseholdKind::SingleMember
            }
        }
        [] => {
            for r in rows.iter() {
                if let Some(w) = headless_warning(r, known_heads, rules) {
                    warnings.push(w);
                }
            }
            HouseholdKind::Headless
        }
        _ => {
            let names: Vec<String> = heads.iter().map(|h| h.short_name()).collect();
            warnings.push(Warning {
                family_head_id: group.family_head_id.clone(),
                person: names.join(", "),
                detail: AMBIGUOUS_HEAD_DETAIL.to_string(),
            });
            HouseholdKind::AmbiguousHead
        }
    }
}

// A member is flagged when it declares a head that is not the head of any family.
// Records without a declared head, and heads themselves, are never flagged.
fn headless_warning(
    r: &PersonRecord,
    known_heads: &HashSet<String>,
    rules: &AuditRules,
) -> Option<Warning> {
    let head_id = r.family_head_id.as_ref()?;
    if known_heads.contains(head_id) || r.is_self_head() {
        return None;
    }
    Some(Warning {
        family_head_id: head_id.clone(),
        person: r.full_name(rules.name_spacing),
        detail: r.document_key().to_string(),
    })
}

fn member_of(r: &PersonRecord, rules: &AuditRules) -> Member {
    Member {
        document_id: r.document_key().to_string(),
        full_name: r.full_name(rules.name_spacing),
    }
}

/// Removes the repeated warnings, keeping the first occurrence of each.
pub fn dedup_warnings(warnings: Vec<Warning>) -> Vec<Warning> {
    let mut seen: HashSet<Warning> = HashSet::new();
    let mut res: Vec<Warning> = Vec::new();
    for w in warnings {
        if !seen.contains(&w) {
            seen.insert(w.clone());
            res.push(w);
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(head: &str, doc: &str, first: &str, last: &str) -> PersonRecord {
        PersonRecord::new(head, doc, first, "", last, "")
    }

    fn build(records: &[PersonRecord]) -> HouseholdReport {
        build_households(records, &AuditRules::DEFAULT_RULES)
    }

    #[test]
    fn multi_and_single_member_households() {
        let report = build(&[
            p("1", "1", "Ana", "Ruiz"),
            p("1", "2", "Tom", "Ruiz"),
            p("3", "3", "Eli", "Paz"),
        ]);
        assert_eq!(report.multi_member.len(), 1);
        let h = &report.multi_member[0];
        assert_eq!(h.family_head_id, "1");
        assert_eq!(
            h.head,
            Member {
                document_id: "1".to_string(),
                full_name: "Ana Ruiz".to_string()
            }
        );
        let names: Vec<&str> = h.members.iter().map(|m| m.full_name.as_str()).collect();
        assert_eq!(names, vec!["Ana Ruiz", "Tom Ruiz"]);

        assert_eq!(report.single_member.len(), 1);
        assert_eq!(report.single_member[0].family_head_id, "3");
        assert_eq!(report.single_member[0].members.len(), 1);
        assert!(report.warnings.is_empty());
        assert_eq!(report.total_persons, 3);
    }

    #[test]
    fn headless_member() {
        let report = build(&[p("1", "1", "Ana", "Ruiz"), p("9", "5", "Leo", "Gil")]);
        assert_eq!(
            report.warnings,
            vec![Warning {
                family_head_id: "9".to_string(),
                person: "Leo Gil".to_string(),
                detail: "5".to_string(),
            }]
        );
        assert!(!report.warnings[0].is_ambiguous_head());
        assert_eq!(report.outcomes[1].kind, HouseholdKind::Headless);
    }

    #[test]
    fn ambiguous_head() {
        let mut second = p("4", "4", "Rosa", "Paz");
        second.middle_name = Cell::text("Elena");
        let report = build(&[p("4", "4", "Eli", "Paz"), second, p("4", "6", "Ivan", "Paz")]);
        assert_eq!(report.warnings.len(), 1);
        let w = &report.warnings[0];
        assert!(w.is_ambiguous_head());
        assert_eq!(w.family_head_id, "4");
        assert_eq!(w.person, "Eli Paz, Rosa Paz");
        assert!(report.multi_member.is_empty());
        assert!(report.single_member.is_empty());
    }

    #[test]
    fn repeated_warnings_are_reported_once() {
        let report = build(&[p("9", "5", "Leo", "Gil"), p("9", "5", "Leo", "Gil")]);
        assert_eq!(report.warnings.len(), 1);

        let w = Warning {
            family_head_id: "1".to_string(),
            person: "A".to_string(),
            detail: "2".to_string(),
        };
        let other = Warning {
            detail: "3".to_string(),
            ..w.clone()
        };
        assert_eq!(
            dedup_warnings(vec![w.clone(), other.clone(), w.clone()]),
            vec![w, other]
        );
    }

    #[test]
    fn records_without_head_are_not_flagged() {
        let report = build(&[p("", "5", "Leo", "Gil")]);
        assert!(report.warnings.is_empty());
        assert_eq!(report.outcomes[0].kind, HouseholdKind::Headless);
    }

    #[test]
    fn numeric_and_text_ids_match() {
        let mut head = p("", "", "Ana", "Ruiz");
        head.family_head_id = Cell::Number(12.0).as_identifier();
        head.document_id = Cell::Text("12 ".to_string()).as_identifier();
        let report = build(&[head, p("12", "13", "Tom", "Ruiz")]);
        assert_eq!(report.multi_member.len(), 1);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn classification_is_exhaustive() {
        let records = vec![
            p("1", "1", "A", "A"),
            p("1", "2", "B", "A"),
            p("3", "3", "C", "C"),
            p("9", "5", "D", "D"),
            p("9", "6", "E", "D"),
            p("4", "4", "F", "F"),
            p("4", "4", "G", "F"),
        ];
        let report = build(&records);
        assert_eq!(report.outcomes.len(), 4);
        let kinds: Vec<HouseholdKind> = report.outcomes.iter().map(|o| o.kind).collect();
        assert_eq!(
            kinds,
            vec![
                HouseholdKind::MultiMember,
                HouseholdKind::SingleMember,
                HouseholdKind::Headless,
                HouseholdKind::AmbiguousHead
            ]
        );
        let total: usize = report.outcomes.iter().map(|o| o.size).sum();
        assert_eq!(total, records.len());
        assert_eq!(report.warnings.len(), 3);
    }
}
