use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};

use crate::config::*;

// The columns of the old database, in order.
pub const OLD_COLUMNS: [&str; 4] = ["FAMILIA", "NUMERO DOCUMENTO", "NOMBRE", "APELLIDOS"];

/// Marker used when a document of the old database is not in the new one.
pub const NOT_FOUND: &str = "No encontrado";

/// A person of the old database.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct OldPerson {
    pub family_id: Option<String>,
    pub document_id: Option<String>,
    pub first_name: Cell,
    pub surnames: Cell,
}

impl OldPerson {
    pub fn new(family_id: &str, document_id: &str, first_name: &str, surnames: &str) -> OldPerson {
        OldPerson {
            family_id: Cell::text(family_id).as_identifier(),
            document_id: Cell::text(document_id).as_identifier(),
            first_name: Cell::text(first_name),
            surnames: Cell::text(surnames),
        }
    }

    /// Reads the old database. The four columns of `OLD_COLUMNS` are required.
    pub fn from_table(table: &RawTable) -> Result<Vec<OldPerson>, AuditErrors> {
        let family = table.column_index(OLD_COLUMNS[0])?;
        let doc = table.column_index(OLD_COLUMNS[1])?;
        let first = table.column_index(OLD_COLUMNS[2])?;
        let surnames = table.column_index(OLD_COLUMNS[3])?;
        let res = (0..table.len())
            .map(|r| OldPerson {
                family_id: table.cell(r, family).as_identifier(),
                document_id: table.cell(r, doc).as_identifier(),
                first_name: table.cell(r, first),
                surnames: table.cell(r, surnames),
            })
            .collect();
        Ok(res)
    }

    pub fn full_name(&self, spacing: NameSpacing) -> String {
        full_name(&[&self.first_name, &self.surnames], spacing)
    }
}

/// A person listed in a family comparison.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DiffMember {
    pub document_id: String,
    pub full_name: String,
    /// Relationship to the head as registered in the new database, or `NOT_FOUND`.
    pub relationship: String,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct HeadInfo {
    pub document_id: String,
    pub full_name: String,
}

/// The comparison of one family of the old database with its household in the new one.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FamilyDiff {
    pub old_family_id: String,
    pub head: Option<HeadInfo>,
    pub old_members: Vec<DiffMember>,
    pub new_members: Vec<DiffMember>,
    /// Old members absent from the new household.
    pub missing: Vec<DiffMember>,
}

/// A member of an old family whose members are all absent from the heads of the new database.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct OrphanedMember {
    pub old_family_id: String,
    pub document_id: String,
    pub full_name: String,
    pub relationship: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct SnapshotSummary {
    pub old_families: usize,
    pub new_families: usize,
    pub old_persons: usize,
    pub new_persons: usize,
    /// Difference between the number of rows of both databases. Zero when no member is missing.
    pub total_missing: i64,
    /// Number of members actually flagged as missing.
    pub flagged_missing: usize,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct SnapshotDiff {
    pub summary: SnapshotSummary,
    pub families: Vec<FamilyDiff>,
    pub orphaned: Vec<OrphanedMember>,
}

// Lookups over the new database, built once.
struct NewIndex<'a> {
    heads: HashSet<&'a str>,
    names: HashMap<&'a str, String>,
    relationships: HashMap<&'a str, String>,
    households: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> NewIndex<'a> {
    fn build(new: &'a [PersonRecord], spacing: NameSpacing) -> NewIndex<'a> {
        let mut index = NewIndex {
            heads: HashSet::new(),
            names: HashMap::new(),
            relationships: HashMap::new(),
            households: HashMap::new(),
        };
        for r in new.iter() {
            if let Some(head) = r.family_head_id.as_deref() {
                index.heads.insert(head);
            }
            let doc = match r.document_id.as_deref() {
                Some(d) => d,
                None => continue,
            };
            // Later rows win for repeated documents.
            index.names.insert(doc, r.full_name(spacing));
            let relationship = r.relationship.display().trim().to_string();
            if !relationship.is_empty() {
                index.relationships.insert(doc, relationship);
            }
            if let Some(head) = r.family_head_id.as_deref() {
                let members = index.households.entry(head).or_insert_with(Vec::new);
                if !members.contains(&doc) {
                    members.push(doc);
                }
            }
        }
        index
    }

    fn relationship(&self, doc: &str) -> String {
        self.relationships
            .get(doc)
            .cloned()
            .unwrap_or_else(|| NOT_FOUND.to_string())
    }

    fn name(&self, doc: &str) -> String {
        self.names
            .get(doc)
            .cloned()
            .unwrap_or_else(|| NOT_FOUND.to_string())
    }
}

/// Compares an old extraction of the population with the current survey.
///
/// Each old family is matched with the household of the new database headed by the first
/// of its members (in order) that is a family head in the new database. Old members absent
/// from that household are reported as missing. Old families where no member heads a new
/// household are reported as orphaned.
pub fn diff_snapshots(old: &[OldPerson], new: &[PersonRecord], rules: &AuditRules) -> SnapshotDiff {
    let spacing = rules.name_spacing;
    let new_index = NewIndex::build(new, spacing);

    // Old families, in order of first appearance, with their documents in order.
    let mut family_order: Vec<&str> = Vec::new();
    let mut families: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut old_names: HashMap<&str, String> = HashMap::new();
    for p in old.iter() {
        let fam = p.family_id.as_deref().unwrap_or("");
        let doc = p.document_id.as_deref().unwrap_or("");
        if !families.contains_key(fam) {
            family_order.push(fam);
        }
        families.entry(fam).or_insert_with(Vec::new).push(doc);
        old_names.insert(doc, p.full_name(spacing));
    }
    let old_name = |doc: &str| {
        old_names
            .get(doc)
            .cloned()
            .unwrap_or_else(|| format!("Nombre no encontrado (Doc: {})", doc))
    };

    let mut res = SnapshotDiff {
        summary: SnapshotSummary {
            old_families: family_order.len(),
            new_families: new_index.heads.len(),
            old_persons: old.len(),
            new_persons: new.len(),
            ..SnapshotSummary::default()
        },
        ..SnapshotDiff::default()
    };

    for fam in family_order.iter() {
        let old_docs: &Vec<&str> = match families.get(fam) {
            Some(docs) => docs,
            None => continue,
        };
        let head_doc = old_docs.iter().find(|d| new_index.heads.contains(*d));

        let head_doc: &str = match head_doc {
            Some(h) => *h,
            None => {
                debug!("diff_snapshots: old family {:?} has no head in the new database", fam);
                for &doc in old_docs.iter() {
                    res.orphaned.push(OrphanedMember {
                        old_family_id: fam.to_string(),
                        document_id: doc.to_string(),
                        full_name: old_name(doc),
                        relationship: new_index.relationship(doc),
                    });
                }
                continue;
            }
        };

        let new_docs: &[&str] = new_index
            .households
            .get(head_doc)
            .map(|v| v.as_slice())
            .unwrap_or(&[]);
        let new_doc_set: HashSet<&str> = new_docs.iter().cloned().collect();

        let old_members: Vec<DiffMember> = old_docs
            .iter()
            .map(|&doc| DiffMember {
                document_id: doc.to_string(),
                full_name: old_name(doc),
                relationship: new_index.relationship(doc),
            })
            .collect();
        let missing: Vec<DiffMember> = old_members
            .iter()
            .filter(|m| !new_doc_set.contains(m.document_id.as_str()))
            .cloned()
            .collect();
        let new_members: Vec<DiffMember> = new_docs
            .iter()
            .map(|&doc| DiffMember {
                document_id: doc.to_string(),
                full_name: new_index.name(doc),
                relationship: new_index.relationship(doc),
            })
            .collect();

        debug!(
            "diff_snapshots: old family {:?} -> head {:?}: {} old, {} new, {} missing",
            fam,
            head_doc,
            old_members.len(),
            new_members.len(),
            missing.len()
        );
        res.summary.flagged_missing += missing.len();
        res.families.push(FamilyDiff {
            old_family_id: fam.to_string(),
            head: Some(HeadInfo {
                document_id: head_doc.to_string(),
                full_name: new_index.name(head_doc),
            }),
            old_members,
            new_members,
            missing,
        });
    }

    // The total is the row count difference between both databases, only reported
    // when some member is missing.
    if res.summary.flagged_missing > 0 {
        res.summary.total_missing = old.len() as i64 - new.len() as i64;
    }
    if res.summary.total_missing != res.summary.flagged_missing as i64 {
        warn!(
            "diff_snapshots: row count difference ({}) differs from the flagged missing members ({})",
            res.summary.total_missing, res.summary.flagged_missing
        );
    }

    info!(
        "diff_snapshots: {} old families compared, {} orphaned members, {} missing members",
        res.families.len(),
        res.orphaned.len(),
        res.summary.flagged_missing
    );
    res
}
