//! Day labels.
//!
//! A [`Day`] is stored as an ordinal (0 = `A`) and rendered as a letter only
//! at the boundary (`Display`, `FromStr`, serde). Ordering by ordinal is the
//! same as ordering by character code.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// Number of distinct day letters (`A`..=`Z`).
pub const DAY_LETTERS: usize = 26;

/// Maximum number of day columns a program can declare.
pub const MAX_DAYS: usize = 7;

/// A day grouping key within a program. Not a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Day(pub(crate) u8);

impl Day {
    pub const A: Day = Day(0);

    pub fn from_index(index: usize) -> Result<Day, CoreError> {
        if index < DAY_LETTERS {
            Ok(Day(index as u8))
        } else {
            Err(CoreError::DayOutOfRange { index })
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn letter(self) -> char {
        (b'A' + self.0) as char
    }

    /// The following letter, if any.
    pub fn next(self) -> Option<Day> {
        Day::from_index(self.index() + 1).ok()
    }

    /// `A, B, C, ...` of length `n` (capped at [`DAY_LETTERS`]).
    pub fn sequence(n: usize) -> Vec<Day> {
        (0..n.min(DAY_LETTERS)).map(|i| Day(i as u8)).collect()
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for Day {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_uppercase() => Ok(Day(c as u8 - b'A')),
            _ => Err(CoreError::InvalidDayLabel {
                label: s.to_string(),
            }),
        }
    }
}

impl Serialize for Day {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Day {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_follow_ordinals() {
        assert_eq!(Day::A.letter(), 'A');
        assert_eq!(Day::from_index(2).unwrap().to_string(), "C");
        assert_eq!(Day::from_index(25).unwrap().letter(), 'Z');
        assert!(Day::from_index(26).is_err());
    }

    #[test]
    fn parse_accepts_single_uppercase_letter() {
        assert_eq!("B".parse::<Day>().unwrap(), Day(1));
        assert_eq!(" D ".parse::<Day>().unwrap(), Day(3));
        assert!("b".parse::<Day>().is_err());
        assert!("AB".parse::<Day>().is_err());
        assert!("".parse::<Day>().is_err());
        assert!("Ñ".parse::<Day>().is_err());
    }

    #[test]
    fn ordering_matches_character_code() {
        let mut days: Vec<Day> = ["C", "A", "B"].iter().map(|s| s.parse().unwrap()).collect();
        days.sort();
        assert_eq!(days, Day::sequence(3));
    }

    #[test]
    fn next_stops_at_z() {
        assert_eq!(Day::A.next(), Some(Day(1)));
        assert_eq!(Day(25).next(), None);
    }

    #[test]
    fn days_render_as_letters_in_json() {
        insta::assert_json_snapshot!(Day::sequence(3), @r###"
        [
          "A",
          "B",
          "C"
        ]
        "###);
    }
}
