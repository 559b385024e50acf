//! Candidate domain and availability matrix.
//!
//! The candidate domain is the working set of the feasibility pipeline:
//! every (person, block, rotation) triple still considered assignable,
//! with a priority weight (higher = less preferred). The domain only ever
//! shrinks after seeding; weights only ever grow. Keys are held in a
//! `BTreeMap` so iteration order, and therefore every downstream count and
//! report, is deterministic.

use std::collections::BTreeMap;

use crate::config::WeightPenalties;
use crate::models::Snapshot;

/// Identity of one candidate assignment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CandidateKey {
    /// Candidate person.
    pub person_id: String,
    /// Candidate block.
    pub block_id: String,
    /// Candidate rotation.
    pub rotation_id: String,
}

impl CandidateKey {
    /// Creates a candidate key.
    pub fn new(
        person_id: impl Into<String>,
        block_id: impl Into<String>,
        rotation_id: impl Into<String>,
    ) -> Self {
        Self {
            person_id: person_id.into(),
            block_id: block_id.into(),
            rotation_id: rotation_id.into(),
        }
    }
}

/// The shrinking set of assignable (person, block, rotation) triples.
#[derive(Debug, Clone, Default)]
pub struct CandidateDomain {
    candidates: BTreeMap<CandidateKey, f64>,
}

impl CandidateDomain {
    /// Creates an empty domain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of remaining candidates.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether the domain is empty.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Inserts a candidate with the given weight.
    pub fn insert(&mut self, key: CandidateKey, weight: f64) {
        self.candidates.insert(key, weight);
    }

    /// Removes a candidate. Returns whether it was present.
    pub fn remove(&mut self, key: &CandidateKey) -> bool {
        self.candidates.remove(key).is_some()
    }

    /// Whether a candidate is still in the domain.
    pub fn contains(&self, key: &CandidateKey) -> bool {
        self.candidates.contains_key(key)
    }

    /// Priority weight of a candidate.
    pub fn weight(&self, key: &CandidateKey) -> Option<f64> {
        self.candidates.get(key).copied()
    }

    /// Adds to a candidate's weight, if present.
    pub fn add_weight(&mut self, key: &CandidateKey, delta: f64) {
        if let Some(w) = self.candidates.get_mut(key) {
            *w += delta;
        }
    }

    /// Iterates candidates in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&CandidateKey, f64)> {
        self.candidates.iter().map(|(k, &w)| (k, w))
    }

    /// Iterates candidate keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &CandidateKey> {
        self.candidates.keys()
    }

    /// Candidates on a (block, rotation) slot, in person order.
    pub fn on_slot<'a>(
        &'a self,
        block_id: &'a str,
        rotation_id: &'a str,
    ) -> impl Iterator<Item = &'a CandidateKey> {
        self.candidates
            .keys()
            .filter(move |k| k.block_id == block_id && k.rotation_id == rotation_id)
    }

    /// Removes every candidate failing the predicate. Returns removed count.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&CandidateKey) -> bool,
    {
        let before = self.candidates.len();
        self.candidates.retain(|k, _| keep(k));
        before - self.candidates.len()
    }
}

/// Seeds the full availability grid: every active person crossed with every
/// block and rotation, at weight zero.
pub fn seed_domain(snapshot: &Snapshot) -> CandidateDomain {
    let mut domain = CandidateDomain::new();
    for person in snapshot.people().iter().filter(|p| p.active) {
        for block in snapshot.blocks() {
            for rotation in snapshot.rotations() {
                domain.insert(
                    CandidateKey::new(&person.id, &block.id, &rotation.id),
                    0.0,
                );
            }
        }
    }
    domain
}

/// Applies approved absences to the seeded domain.
///
/// A blocking absence overlapping a block eliminates the person's
/// candidates on full-presence rotations in that block; on sessional
/// rotations it attaches a weight penalty instead, since missed sessions
/// are made up within the block. A reduced-availability absence never
/// eliminates; it attaches a smaller penalty (the duty-hour rule applies
/// its cap reduction separately).
///
/// # Returns
/// The number of candidates eliminated.
pub fn apply_absences(
    domain: &mut CandidateDomain,
    snapshot: &Snapshot,
    penalties: &WeightPenalties,
) -> usize {
    let mut removed = 0;
    for person in snapshot.people().iter().filter(|p| p.active) {
        for block in snapshot.blocks() {
            let blocked = snapshot.is_blocked(&person.id, block);
            let reduced = snapshot.is_reduced(&person.id, block);
            if !blocked && !reduced {
                continue;
            }
            for rotation in snapshot.rotations() {
                let key = CandidateKey::new(&person.id, &block.id, &rotation.id);
                if blocked {
                    if rotation.activity.requires_full_presence() {
                        if domain.remove(&key) {
                            removed += 1;
                        }
                        continue;
                    }
                    domain.add_weight(&key, penalties.blocking_sessional);
                }
                if reduced {
                    domain.add_weight(&key, penalties.reduced_availability);
                }
            }
        }
    }
    removed
}
