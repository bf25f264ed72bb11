//! Foot parts, compact foot sets, and per-foot column placement.
//!
//! - `Foot`: which part of which foot rests on a column (ordinals 0..=4 are part of the
//!   parity interchange format, see `engine::persist`).
//! - `FootSet`: a bitset over `Foot` ordinals, used for `moved_feet`/`hold_feet`.
//! - `FootPlacement`: inverse view of a column array (foot part → column).

use serde::{Deserialize, Serialize};

use crate::error::ParityError;

/// A foot part. `None` marks an empty column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum Foot {
    #[default]
    None = 0,
    LeftHeel = 1,
    LeftToe = 2,
    RightHeel = 3,
    RightToe = 4,
}

/// The four real foot parts, in permutation order.
pub const FEET: [Foot; 4] = [Foot::LeftHeel, Foot::LeftToe, Foot::RightHeel, Foot::RightToe];

/// Single-character labels indexed by ordinal.
pub const FEET_LABELS: [&str; 5] = [".", "L", "l", "R", "r"];

impl Foot {
    #[inline]
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Heel ↔ toe of the same foot; `None` maps to itself.
    #[inline]
    pub fn other_part(self) -> Foot {
        match self {
            Foot::None => Foot::None,
            Foot::LeftHeel => Foot::LeftToe,
            Foot::LeftToe => Foot::LeftHeel,
            Foot::RightHeel => Foot::RightToe,
            Foot::RightToe => Foot::RightHeel,
        }
    }

    #[inline]
    pub fn is_left(self) -> bool {
        matches!(self, Foot::LeftHeel | Foot::LeftToe)
    }

    #[inline]
    pub fn is_right(self) -> bool {
        matches!(self, Foot::RightHeel | Foot::RightToe)
    }

    #[inline]
    pub fn is_heel(self) -> bool {
        matches!(self, Foot::LeftHeel | Foot::RightHeel)
    }

    #[inline]
    pub fn is_toe(self) -> bool {
        matches!(self, Foot::LeftToe | Foot::RightToe)
    }

    /// The heel of the same foot (identity for heels and `None`).
    #[inline]
    pub fn heel(self) -> Foot {
        if self.is_toe() {
            self.other_part()
        } else {
            self
        }
    }

    pub fn label(self) -> &'static str {
        FEET_LABELS[self as usize]
    }

    pub fn from_label(label: &str) -> Option<Foot> {
        match label {
            "L" => Some(Foot::LeftHeel),
            "l" => Some(Foot::LeftToe),
            "R" => Some(Foot::RightHeel),
            "r" => Some(Foot::RightToe),
            "." => Some(Foot::None),
            _ => None,
        }
    }
}

impl From<Foot> for u8 {
    fn from(f: Foot) -> u8 {
        f as u8
    }
}

impl TryFrom<u8> for Foot {
    type Error = ParityError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Foot::None),
            1 => Ok(Foot::LeftHeel),
            2 => Ok(Foot::LeftToe),
            3 => Ok(Foot::RightHeel),
            4 => Ok(Foot::RightToe),
            other => Err(ParityError::InvalidFoot(other)),
        }
    }
}

/// Fixed-size set of foot parts (bit `i` ↔ ordinal `i`); serialized as a list of ordinals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Vec<Foot>", from = "Vec<Foot>")]
pub struct FootSet(u8);

impl FootSet {
    #[inline]
    pub fn new() -> Self {
        Self(0)
    }

    #[inline]
    pub fn insert(&mut self, f: Foot) {
        self.0 |= 1 << f.ordinal();
    }

    #[inline]
    pub fn contains(&self, f: Foot) -> bool {
        self.0 & (1 << f.ordinal()) != 0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// True if either part of the left foot is in the set.
    #[inline]
    pub fn has_left(&self) -> bool {
        self.contains(Foot::LeftHeel) || self.contains(Foot::LeftToe)
    }

    #[inline]
    pub fn has_right(&self) -> bool {
        self.contains(Foot::RightHeel) || self.contains(Foot::RightToe)
    }

    /// Members in ordinal order.
    pub fn iter(&self) -> impl Iterator<Item = Foot> + '_ {
        [Foot::None, Foot::LeftHeel, Foot::LeftToe, Foot::RightHeel, Foot::RightToe]
            .into_iter()
            .filter(move |f| self.contains(*f))
    }
}

impl FromIterator<Foot> for FootSet {
    fn from_iter<I: IntoIterator<Item = Foot>>(iter: I) -> Self {
        let mut s = FootSet::new();
        for f in iter {
            s.insert(f);
        }
        s
    }
}

impl From<Vec<Foot>> for FootSet {
    fn from(feet: Vec<Foot>) -> Self {
        feet.into_iter().collect()
    }
}

impl From<FootSet> for Vec<Foot> {
    fn from(set: FootSet) -> Self {
        set.iter().collect()
    }
}

/// Column index of each foot part (last occurrence wins, like a scan over columns).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FootPlacement {
    pub left_heel: Option<usize>,
    pub left_toe: Option<usize>,
    pub right_heel: Option<usize>,
    pub right_toe: Option<usize>,
}

impl FootPlacement {
    pub fn from_columns(columns: &[Foot]) -> Self {
        let mut p = FootPlacement::default();
        for (i, f) in columns.iter().enumerate() {
            match f {
                Foot::None => {}
                Foot::LeftHeel => p.left_heel = Some(i),
                Foot::LeftToe => p.left_toe = Some(i),
                Foot::RightHeel => p.right_heel = Some(i),
                Foot::RightToe => p.right_toe = Some(i),
            }
        }
        p
    }

    #[inline]
    pub fn get(&self, f: Foot) -> Option<usize> {
        match f {
            Foot::None => None,
            Foot::LeftHeel => self.left_heel,
            Foot::LeftToe => self.left_toe,
            Foot::RightHeel => self.right_heel,
            Foot::RightToe => self.right_toe,
        }
    }

    #[inline]
    pub fn left_bracket(&self) -> bool {
        self.left_heel.is_some() && self.left_toe.is_some()
    }

    #[inline]
    pub fn right_bracket(&self) -> bool {
        self.right_heel.is_some() && self.right_toe.is_some()
    }
}

/// First column holding `foot`, if any.
#[inline]
pub fn column_of(columns: &[Foot], foot: Foot) -> Option<usize> {
    columns.iter().position(|&f| f == foot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_part_is_an_involution() {
        for f in [Foot::None, Foot::LeftHeel, Foot::LeftToe, Foot::RightHeel, Foot::RightToe] {
            assert_eq!(f.other_part().other_part(), f);
        }
        assert_eq!(Foot::LeftHeel.other_part(), Foot::LeftToe);
        assert_eq!(Foot::RightToe.other_part(), Foot::RightHeel);
    }

    #[test]
    fn foot_set_behaves_like_a_small_set() {
        let mut s = FootSet::new();
        assert!(s.is_empty());
        s.insert(Foot::RightToe);
        s.insert(Foot::LeftHeel);
        s.insert(Foot::RightToe);
        assert_eq!(s.len(), 2);
        assert!(s.has_left() && s.has_right());
        assert_eq!(s.iter().collect::<Vec<_>>(), vec![Foot::LeftHeel, Foot::RightToe]);
        let t: FootSet = [Foot::RightToe, Foot::LeftHeel].into_iter().collect();
        assert_eq!(s, t);
    }

    #[test]
    fn foot_serializes_as_ordinal() {
        let row = vec![Foot::None, Foot::LeftToe, Foot::RightHeel];
        let s = serde_json::to_string(&row).unwrap();
        assert_eq!(s, "[0,2,3]");
        let back: Vec<Foot> = serde_json::from_str(&s).unwrap();
        assert_eq!(back, row);
        assert!(serde_json::from_str::<Vec<Foot>>("[5]").is_err());
    }

    #[test]
    fn placement_tracks_brackets() {
        let cols = [Foot::LeftHeel, Foot::LeftToe, Foot::None, Foot::RightHeel];
        let p = FootPlacement::from_columns(&cols);
        assert!(p.left_bracket());
        assert!(!p.right_bracket());
        assert_eq!(p.get(Foot::RightHeel), Some(3));
        assert_eq!(column_of(&cols, Foot::LeftToe), Some(1));
    }
}
