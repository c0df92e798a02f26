use log::{debug, info};
use std::collections::{HashMap, HashSet};

use crate::config::*;

// The identity of one record, as seen by the duplicate detection.
#[derive(Debug, Clone)]
struct Identity<'a> {
    family_head_id: &'a str,
    full_name: String,
    document_id: &'a str,
}

// Key of one row in the duplicates report.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
struct EntryKey(String, String, String);

impl DuplicatePolicy {
    /// The records sharing this key are candidates for duplication.
    fn collision_key<'a>(&self, id: &'a Identity) -> &'a str {
        match self {
            DuplicatePolicy::DocumentAndName => id.full_name.as_str(),
            DuplicatePolicy::DocumentOnly => id.document_id,
        }
    }

    /// The colliding records sharing this key are reported as a single row.
    fn entry_key(&self, id: &Identity) -> EntryKey {
        match self {
            DuplicatePolicy::DocumentAndName => {
                EntryKey(id.full_name.clone(), id.document_id.to_string(), String::new())
            }
            DuplicatePolicy::DocumentOnly => EntryKey(
                id.document_id.to_string(),
                id.full_name.clone(),
                id.family_head_id.to_string(),
            ),
        }
    }

    pub fn count_semantics(&self) -> CountSemantics {
        match self {
            DuplicatePolicy::DocumentAndName => CountSemantics::DistinctDocumentsPerName,
            DuplicatePolicy::DocumentOnly => CountSemantics::RowsPerEntry,
        }
    }
}

/// Finds the persons registered more than once.
///
/// With `DocumentAndName`, a full name that appears more than once is reported, whether
/// the same document is repeated or different documents were used. Each (name, document)
/// pair is one row, counted with the number of distinct documents for that name.
///
/// With `DocumentOnly`, a document that appears more than once is reported, one row per
/// (document, name, family head), counted with the number of such rows.
///
/// Records without a document are ignored.
pub fn find_duplicates(records: &[PersonRecord], rules: &AuditRules) -> DuplicateReport {
    let policy = rules.duplicate_policy;
    let identities: Vec<Identity> = records
        .iter()
        .filter(|r| r.document_id.is_some())
        .map(|r| Identity {
            family_head_id: r.head_key(),
            full_name: r.full_name(rules.name_spacing),
            document_id: r.document_key(),
        })
        .collect();

    let mut collisions: HashMap<&str, usize> = HashMap::new();
    for id in identities.iter() {
        *collisions.entry(policy.collision_key(id)).or_insert(0) += 1;
    }

    let selected: Vec<&Identity> = identities
        .iter()
        .filter(|id| collisions.get(policy.collision_key(id)).cloned().unwrap_or(0) > 1)
        .collect();
    debug!(
        "find_duplicates: {:?}: {} colliding records",
        policy,
        selected.len()
    );

    let mut positions: HashMap<EntryKey, usize> = HashMap::new();
    let mut rows: Vec<DuplicateRecord> = Vec::new();
    for id in selected.iter() {
        let key = policy.entry_key(id);
        match positions.get(&key) {
            Some(pos) => rows[*pos].count += 1,
            None => {
                positions.insert(key, rows.len());
                rows.push(DuplicateRecord {
                    family_head_id: id.family_head_id.to_string(),
                    full_name: id.full_name.clone(),
                    document_id: id.document_id.to_string(),
                    count: 1,
                });
            }
        }
    }

    let count_semantics = policy.count_semantics();
    if count_semantics == CountSemantics::DistinctDocumentsPerName {
        let mut docs_per_name: HashMap<&str, HashSet<&str>> = HashMap::new();
        for id in selected.iter() {
            docs_per_name
                .entry(id.full_name.as_str())
                .or_insert_with(HashSet::new)
                .insert(id.document_id);
        }
        for row in rows.iter_mut() {
            row.count = docs_per_name
                .get(row.full_name.as_str())
                .map(|docs| docs.len())
                .unwrap_or(0);
        }
    }

    info!(
        "find_duplicates: {:?}: {} duplicated entries out of {} records",
        policy,
        rows.len(),
        records.len()
    );
    DuplicateReport {
        policy,
        count_semantics,
        rows,
    }
}
