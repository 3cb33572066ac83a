//! Surface slot identifiers
//!
//! The player owns exactly two media surfaces. At any moment one of them is
//! active (visible, playing) and the other is standby (hidden, idle or primed
//! at time zero). `Slot` names them and `SlotPair` holds one value per slot.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// One of the two surface slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Primary,
    Secondary,
}

impl Slot {
    /// Both slots, in pool order
    pub const ALL: [Slot; 2] = [Slot::Primary, Slot::Secondary];

    /// The opposite slot
    pub fn other(self) -> Slot {
        match self {
            Slot::Primary => Slot::Secondary,
            Slot::Secondary => Slot::Primary,
        }
    }

    fn index(self) -> usize {
        match self {
            Slot::Primary => 0,
            Slot::Secondary => 1,
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Slot::Primary => write!(f, "primary"),
            Slot::Secondary => write!(f, "secondary"),
        }
    }
}

/// Fixed two-element pool indexed by `Slot`
///
/// Serializes as `[primary, secondary]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotPair<T> {
    items: [T; 2],
}

impl<T> SlotPair<T> {
    pub fn new(primary: T, secondary: T) -> Self {
        Self {
            items: [primary, secondary],
        }
    }

    /// Build both entries from their slot
    pub fn from_fn(mut f: impl FnMut(Slot) -> T) -> Self {
        Self::new(f(Slot::Primary), f(Slot::Secondary))
    }

    pub fn get(&self, slot: Slot) -> &T {
        &self.items[slot.index()]
    }

    pub fn get_mut(&mut self, slot: Slot) -> &mut T {
        &mut self.items[slot.index()]
    }

    /// Convert each entry, keeping its slot
    pub fn map<U>(self, mut f: impl FnMut(Slot, T) -> U) -> SlotPair<U> {
        let [primary, secondary] = self.items;
        SlotPair::new(f(Slot::Primary, primary), f(Slot::Secondary, secondary))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Slot, &T)> {
        Slot::ALL.into_iter().zip(self.items.iter())
    }
}

impl<T> Index<Slot> for SlotPair<T> {
    type Output = T;

    fn index(&self, slot: Slot) -> &T {
        self.get(slot)
    }
}

impl<T> IndexMut<Slot> for SlotPair<T> {
    fn index_mut(&mut self, slot: Slot) -> &mut T {
        self.get_mut(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_is_an_involution() {
        for slot in Slot::ALL {
            assert_ne!(slot.other(), slot);
            assert_eq!(slot.other().other(), slot);
        }
    }

    #[test]
    fn test_pair_indexing() {
        let mut pair = SlotPair::new("a", "b");
        assert_eq!(pair[Slot::Primary], "a");
        assert_eq!(pair[Slot::Secondary], "b");

        pair[Slot::Secondary] = "c";
        assert_eq!(*pair.get(Slot::Secondary), "c");
    }

    #[test]
    fn test_pair_map_keeps_slot() {
        let pair = SlotPair::from_fn(|slot| slot.to_string());
        let mapped = pair.map(|slot, name| format!("{}:{}", slot.other(), name));
        assert_eq!(mapped[Slot::Primary], "secondary:primary");
        assert_eq!(mapped[Slot::Secondary], "primary:secondary");
    }

    #[test]
    fn test_slot_serde_lowercase() {
        let json = serde_json::to_string(&Slot::Secondary).unwrap();
        assert_eq!(json, "\"secondary\"");
        let parsed: Slot = serde_json::from_str("\"primary\"").unwrap();
        assert_eq!(parsed, Slot::Primary);
    }
}
