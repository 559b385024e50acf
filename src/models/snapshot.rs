//! Read-only run input.
//!
//! A `Snapshot` bundles the people, blocks, rotations, and absences fetched
//! once per run from the external directory, with lookup indexes built at
//! construction. Blocks are kept sorted by start date so block adjacency
//! (consecutive-block rules, proximity scoring) is well defined.

use std::collections::HashMap;

use super::{Absence, AbsenceKind, Block, Person, Rotation};

/// Immutable input for a scheduling run.
#[derive(Debug, Clone)]
pub struct Snapshot {
    people: Vec<Person>,
    blocks: Vec<Block>,
    rotations: Vec<Rotation>,
    absences: Vec<Absence>,
    person_idx: HashMap<String, usize>,
    block_idx: HashMap<String, usize>,
    rotation_idx: HashMap<String, usize>,
}

impl Snapshot {
    /// Builds a snapshot; blocks are sorted by start date.
    pub fn new(
        people: Vec<Person>,
        mut blocks: Vec<Block>,
        rotations: Vec<Rotation>,
        absences: Vec<Absence>,
    ) -> Self {
        blocks.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));

        let person_idx = people
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();
        let block_idx = blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (b.id.clone(), i))
            .collect();
        let rotation_idx = rotations
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();

        Self {
            people,
            blocks,
            rotations,
            absences,
            person_idx,
            block_idx,
            rotation_idx,
        }
    }

    /// All people.
    pub fn people(&self) -> &[Person] {
        &self.people
    }

    /// All blocks, sorted by start date.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// All rotations.
    pub fn rotations(&self) -> &[Rotation] {
        &self.rotations
    }

    /// All absences.
    pub fn absences(&self) -> &[Absence] {
        &self.absences
    }

    /// Looks up a person by id.
    pub fn person(&self, id: &str) -> Option<&Person> {
        self.person_idx.get(id).map(|&i| &self.people[i])
    }

    /// Looks up a block by id.
    pub fn block(&self, id: &str) -> Option<&Block> {
        self.block_idx.get(id).map(|&i| &self.blocks[i])
    }

    /// Looks up a rotation by id.
    pub fn rotation(&self, id: &str) -> Option<&Rotation> {
        self.rotation_idx.get(id).map(|&i| &self.rotations[i])
    }

    /// Position of a block in start-date order.
    pub fn block_position(&self, id: &str) -> Option<usize> {
        self.block_idx.get(id).copied()
    }

    /// Absences of the given kind for a person that overlap a block.
    pub fn absences_overlapping<'a>(
        &'a self,
        person_id: &'a str,
        block: &'a Block,
        kind: AbsenceKind,
    ) -> impl Iterator<Item = &'a Absence> {
        self.absences.iter().filter(move |a| {
            a.person_id == person_id && a.kind == kind && a.overlaps(block.start, block.end)
        })
    }

    /// Whether a person has a blocking absence overlapping the block.
    pub fn is_blocked(&self, person_id: &str, block: &Block) -> bool {
        self.absences_overlapping(person_id, block, AbsenceKind::Blocking)
            .next()
            .is_some()
    }

    /// Whether a person has a reduced-availability absence overlapping the block.
    pub fn is_reduced(&self, person_id: &str, block: &Block) -> bool {
        self.absences_overlapping(person_id, block, AbsenceKind::ReducedAvailability)
            .next()
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActivityType;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample() -> Snapshot {
        Snapshot::new(
            vec![Person::resident("R01", 1), Person::faculty("F01")],
            vec![
                // Deliberately out of order; Snapshot sorts by start.
                Block::new("B02", d(2025, 7, 29), d(2025, 8, 25)),
                Block::new("B01", d(2025, 7, 1), d(2025, 7, 28)),
            ],
            vec![Rotation::new("wards", ActivityType::InpatientCore)],
            vec![
                Absence::blocking("R01", d(2025, 7, 5), d(2025, 7, 10)),
                Absence::reduced("F01", d(2025, 8, 1), d(2025, 8, 10)),
            ],
        )
    }

    #[test]
    fn test_blocks_sorted_by_start() {
        let s = sample();
        assert_eq!(s.blocks()[0].id, "B01");
        assert_eq!(s.block_position("B01"), Some(0));
        assert_eq!(s.block_position("B02"), Some(1));
    }

    #[test]
    fn test_lookup() {
        let s = sample();
        assert!(s.person("R01").is_some());
        assert!(s.person("R99").is_none());
        assert!(s.rotation("wards").is_some());
    }

    #[test]
    fn test_absence_queries() {
        let s = sample();
        let b1 = s.block("B01").unwrap().clone();
        let b2 = s.block("B02").unwrap().clone();
        assert!(s.is_blocked("R01", &b1));
        assert!(!s.is_blocked("R01", &b2));
        assert!(s.is_reduced("F01", &b2));
        assert!(!s.is_reduced("F01", &b1));
    }
}
