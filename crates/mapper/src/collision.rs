//! Key collision detection
//!
//! Folding triples is last-write-wins, so two slots sharing a key lose data
//! silently. This module reports those overwrites so callers can log them.

use std::fmt;

use contracts::{FlatEvent, KeyPolicy, Triple};

/// Which mapping a triple belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripleGroup {
    Attributes,
    Traits,
}

impl TripleGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attributes => "attributes",
            Self::Traits => "traits",
        }
    }
}

impl fmt::Display for TripleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One slot overwritten by a later slot with the same key
///
/// Slots are 1-based, matching the wire names (`atrk1`, `uatrk3`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCollision {
    pub group: TripleGroup,
    pub key: String,
    pub overwritten_slot: usize,
    pub winning_slot: usize,
}

/// List every overwrite the given policy would perform on `flat`
pub fn key_collisions(flat: &FlatEvent, policy: KeyPolicy) -> Vec<KeyCollision> {
    let mut collisions = collect(TripleGroup::Attributes, &flat.attribute_triples(), policy);
    collisions.extend(collect(TripleGroup::Traits, &flat.trait_triples(), policy));
    collisions
}

fn collect(group: TripleGroup, triples: &[Triple<'_>], policy: KeyPolicy) -> Vec<KeyCollision> {
    let mut collisions = Vec::new();
    for (later, triple) in triples.iter().enumerate() {
        if policy == KeyPolicy::SkipEmptyKeys && triple.key.is_empty() {
            continue;
        }
        // only the nearest earlier slot is reported, it already shadows the rest
        if let Some(earlier) = triples[..later].iter().rposition(|t| t.key == triple.key) {
            collisions.push(KeyCollision {
                group,
                key: triple.key.to_string(),
                overwritten_slot: earlier + 1,
                winning_slot: later + 1,
            });
        }
    }
    collisions
}
