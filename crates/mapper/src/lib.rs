//! # Mapper
//!
//! Schema mapping module.
//!
//! Responsibilities:
//! - Rename the abbreviated scalar fields of a `FlatEvent`
//! - Fold attribute / trait triples into keyed mappings
//! - Report slots that were overwritten while folding
//!
//! Mapping is pure and total: every `FlatEvent` maps to a `NestedEvent`.
//!
//! ```
//! use contracts::FlatEvent;
//!
//! let flat = FlatEvent { ev: "click".into(), ..Default::default() };
//! let nested = mapper::map_event(flat);
//! assert_eq!(nested.event, "click");
//! ```

mod collision;

pub use collision::{key_collisions, KeyCollision, TripleGroup};
pub use contracts::KeyPolicy;

use contracts::{FlatEvent, NestedEvent, Triple, TypedMap, TypedValue};

/// Map with the default [`KeyPolicy::LastWriteWins`]
pub fn map_event(flat: FlatEvent) -> NestedEvent {
    Mapper::default().map(flat)
}

/// Schema mapper parameterised by a key policy
#[derive(Debug, Clone, Copy, Default)]
pub struct Mapper {
    policy: KeyPolicy,
}

impl Mapper {
    pub fn new(policy: KeyPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> KeyPolicy {
        self.policy
    }

    /// Reshape a flat event into a nested one
    pub fn map(&self, flat: FlatEvent) -> NestedEvent {
        let attributes = self.fold(&flat.attribute_triples());
        let traits = self.fold(&flat.trait_triples());

        NestedEvent {
            event: flat.ev,
            event_type: flat.et,
            app_id: flat.id,
            user_id: flat.uid,
            message_id: flat.mid,
            page_title: flat.t,
            page_url: flat.p,
            browser_language: flat.l,
            screen_size: flat.sc,
            attributes,
            traits,
        }
    }

    fn fold(&self, triples: &[Triple<'_>]) -> TypedMap {
        let mut map = TypedMap::new();
        for triple in triples {
            if self.policy == KeyPolicy::SkipEmptyKeys && triple.key.is_empty() {
                continue;
            }
            map.insert(
                triple.key.to_string(),
                TypedValue::new(triple.value, triple.kind),
            );
        }
        map
    }
}
