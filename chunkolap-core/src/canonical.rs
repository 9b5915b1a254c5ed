//! Canonical overlap keys.
//!
//! Every (idA, idB, orientation) triple has exactly one canonical form, which
//! is the only form ever used as a cache key:
//!
//! - Antinormal is rewritten as Normal with the operands swapped.
//! - Normal is canonical as given.
//! - Innie and Outtie are self-symmetric under operand swap, so the lower id
//!   always comes first.

use crate::types::{ChunkId, Orientation};
use serde::{Deserialize, Serialize};

/// A pair of chunks and their relative orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OverlapSpec {
    pub id_a: ChunkId,
    pub id_b: ChunkId,
    pub orientation: Orientation,
}

/// Result of canonicalizing a spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canonical {
    pub spec: OverlapSpec,
    /// True when the input already was in canonical form.
    pub was_canonical: bool,
}

impl OverlapSpec {
    pub fn new(id_a: ChunkId, id_b: ChunkId, orientation: Orientation) -> Self {
        Self { id_a, id_b, orientation }
    }

    /// Map this spec to its canonical form.
    pub fn canonicalize(self) -> Canonical {
        canonicalize(self.id_a, self.id_b, self.orientation)
    }

    pub fn is_canonical(&self) -> bool {
        self.canonicalize().was_canonical
    }

    /// (smaller id, larger id), independent of operand order.
    pub fn id_range(&self) -> (ChunkId, ChunkId) {
        (self.id_a.min(self.id_b), self.id_a.max(self.id_b))
    }
}

impl std::fmt::Display for OverlapSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{},{})", self.id_a, self.id_b, self.orientation)
    }
}

pub fn canonicalize(id_a: ChunkId, id_b: ChunkId, orientation: Orientation) -> Canonical {
    let (spec, was_canonical) = match orientation {
        Orientation::Antinormal => (OverlapSpec::new(id_b, id_a, Orientation::Normal), false),
        Orientation::Normal => (OverlapSpec::new(id_a, id_b, orientation), true),
        Orientation::Innie | Orientation::Outtie => {
            if id_a > id_b {
                (OverlapSpec::new(id_b, id_a, orientation), false)
            } else {
                (OverlapSpec::new(id_a, id_b, orientation), true)
            }
        }
    };
    Canonical { spec, was_canonical }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn orientation_strategy() -> impl Strategy<Value = Orientation> {
        prop_oneof![
            Just(Orientation::Normal),
            Just(Orientation::Innie),
            Just(Orientation::Outtie),
            Just(Orientation::Antinormal),
        ]
    }

    #[test]
    fn test_antinormal_becomes_swapped_normal() {
        let canonical = canonicalize(7, 3, Orientation::Antinormal);
        assert_eq!(canonical.spec, OverlapSpec::new(3, 7, Orientation::Normal));
        assert!(!canonical.was_canonical);
    }

    #[test]
    fn test_normal_is_canonical_in_either_order() {
        assert!(canonicalize(9, 2, Orientation::Normal).was_canonical);
        assert!(canonicalize(2, 9, Orientation::Normal).was_canonical);
    }

    #[test]
    fn test_symmetric_orientations_order_ids() {
        let innie = canonicalize(9, 2, Orientation::Innie);
        assert_eq!(innie.spec, OverlapSpec::new(2, 9, Orientation::Innie));
        assert!(!innie.was_canonical);

        let outtie = canonicalize(2, 9, Orientation::Outtie);
        assert_eq!(outtie.spec, OverlapSpec::new(2, 9, Orientation::Outtie));
        assert!(outtie.was_canonical);

        // equal ids are already ordered
        assert!(canonicalize(4, 4, Orientation::Innie).was_canonical);
    }

    proptest! {
        #[test]
        fn prop_canonicalize_is_idempotent(a in 0u32..1000, b in 0u32..1000, o in orientation_strategy()) {
            let first = canonicalize(a, b, o);
            let second = first.spec.canonicalize();
            prop_assert_eq!(second.spec, first.spec);
            prop_assert!(second.was_canonical);
            prop_assert_ne!(first.spec.orientation, Orientation::Antinormal);
        }

        #[test]
        fn prop_flag_matches_ordering_rule(a in 0u32..1000, b in 0u32..1000, o in orientation_strategy()) {
            let expected = match o {
                Orientation::Antinormal => false,
                Orientation::Normal => true,
                Orientation::Innie | Orientation::Outtie => a <= b,
            };
            prop_assert_eq!(canonicalize(a, b, o).was_canonical, expected);
        }
    }
}
