use log::{debug, info};
use std::collections::HashMap;

use crate::config::*;

/// The records of one family, identified by the family head id they declare.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FamilyGroup {
    pub family_head_id: String,
    /// Positions of the records in the input, in their original order.
    pub rows: Vec<usize>,
}

/// Enumeration of the distinct family head ids, in order of first appearance.
///
/// Built with a single pass over the records. A missing head id is its own group,
/// keyed by the empty string.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct FamilyIndex {
    groups: Vec<FamilyGroup>,
    positions: HashMap<String, usize>,
}

impl FamilyIndex {
    pub fn build(records: &[PersonRecord]) -> FamilyIndex {
        let mut index = FamilyIndex::default();
        for (row, r) in records.iter().enumerate() {
            let key = r.head_key();
            match index.positions.get(key) {
                Some(pos) => index.groups[*pos].rows.push(row),
                None => {
                    index.positions.insert(key.to_string(), index.groups.len());
                    index.groups.push(FamilyGroup {
                        family_head_id: key.to_string(),
                        rows: vec![row],
                    });
                }
            }
        }
        debug!(
            "FamilyIndex::build: {} records, {} families",
            records.len(),
            index.groups.len()
        );
        index
    }

    pub fn groups(&self) -> &[FamilyGroup] {
        &self.groups
    }

    /// The 1-based number of a family head id.
    pub fn number_of(&self, family_head_id: &str) -> Option<u32> {
        self.positions
            .get(family_head_id)
            .map(|pos| (*pos + 1) as u32)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// The synthetic identifiers computed for one record.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct Identity {
    pub family_number: u32,
    // Currently the same mapping as the family number.
    pub housing_unit_number: u32,
    /// Position of the record within its family, starting at 1.
    pub member_sequence: u32,
}

/// Computes the family number, housing unit number and member sequence of every record.
///
/// The result is aligned with the input.
pub fn assign_identities(records: &[PersonRecord]) -> Vec<Identity> {
    let index = FamilyIndex::build(records);
    let mut running: HashMap<&str, u32> = HashMap::new();
    let mut res: Vec<Identity> = Vec::with_capacity(records.len());
    for r in records.iter() {
        let key = r.head_key();
        let seq = running.entry(key).or_insert(0);
        *seq += 1;
        // The index was built from the same records.
        let family_number = index.number_of(key).unwrap_or(0);
        res.push(Identity {
            family_number,
            housing_unit_number: housing_unit_of(&index, key),
            member_sequence: *seq,
        });
    }
    info!(
        "assign_identities: {} records in {} families",
        records.len(),
        index.len()
    );
    res
}

fn housing_unit_of(index: &FamilyIndex, family_head_id: &str) -> u32 {
    index.number_of(family_head_id).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<PersonRecord> {
        vec![
            PersonRecord::new("10", "10", "Ana", "", "Ruiz", ""),
            PersonRecord::new("20", "20", "Eli", "", "Paz", ""),
            PersonRecord::new("10", "11", "Tom", "", "Ruiz", ""),
            PersonRecord::new("30", "31", "Leo", "", "Gil", ""),
            PersonRecord::new("10", "12", "Sol", "", "Ruiz", ""),
            PersonRecord::new("20", "21", "Ivan", "", "Paz", ""),
        ]
    }

    #[test]
    fn families_numbered_by_first_appearance() {
        let ids = assign_identities(&sample());
        let fams: Vec<u32> = ids.iter().map(|i| i.family_number).collect();
        assert_eq!(fams, vec![1, 2, 1, 3, 1, 2]);
    }

    #[test]
    fn housing_unit_matches_family_number() {
        for i in assign_identities(&sample()) {
            assert_eq!(i.family_number, i.housing_unit_number);
        }
    }

    #[test]
    fn member_sequence_has_no_gaps() {
        let records = sample();
        let ids = assign_identities(&records);
        let index = FamilyIndex::build(&records);
        for g in index.groups() {
            let seqs: Vec<u32> = g.rows.iter().map(|r| ids[*r].member_sequence).collect();
            let expected: Vec<u32> = (1..=g.rows.len() as u32).collect();
            assert_eq!(seqs, expected);
        }
    }

    #[test]
    fn missing_head_is_its_own_family() {
        let records = vec![
            PersonRecord::new("", "1", "A", "", "B", ""),
            PersonRecord::new("5", "5", "C", "", "D", ""),
            PersonRecord::new("", "2", "E", "", "F", ""),
        ];
        let ids = assign_identities(&records);
        assert_eq!(ids[0].family_number, 1);
        assert_eq!(ids[2].family_number, 1);
        assert_eq!(ids[2].member_sequence, 2);
        assert_eq!(ids[1].family_number, 2);
    }

    #[test]
    fn empty_input() {
        assert!(assign_identities(&[]).is_empty());
        assert!(FamilyIndex::build(&[]).is_empty());
    }
}
