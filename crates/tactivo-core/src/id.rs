//! Stable ID newtypes for programs, assignment rows and catalog entries.
//!
//! Persisted identifiers wrap the `i64` primary keys of the row store. Rows
//! and programs created on the client carry a [`TempId`] until their first
//! successful insert; [`RowKey`] and [`ProgramKey`] hold exactly one of the
//! two identities and render as plain strings at the boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::CoreError;

/// Persisted program identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProgramId(pub i64);

/// Persisted program-exercise row identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowId(pub i64);

/// Exercise catalog entry identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExerciseId(pub i64);

/// Client (profile) that owns programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientId(pub i64);

/// Tenant that owns clients and the exercise catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompanyId(pub i64);

/// Client-generated identity for entities not yet persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TempId(pub Uuid);

impl TempId {
    pub fn new() -> Self {
        TempId(Uuid::new_v4())
    }
}

impl Default for TempId {
    fn default() -> Self {
        Self::new()
    }
}

// Display implementations -- just print the inner value.

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ExerciseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

const TEMP_ROW_PREFIX: &str = "tpe-";
const TEMP_PROGRAM_PREFIX: &str = "t-";

/// Identity of a program-exercise assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowKey {
    Persisted(RowId),
    Temp(TempId),
}

impl RowKey {
    /// A fresh client-side key.
    pub fn temp() -> Self {
        RowKey::Temp(TempId::new())
    }

    pub fn row_id(&self) -> Option<RowId> {
        match self {
            RowKey::Persisted(id) => Some(*id),
            RowKey::Temp(_) => None,
        }
    }

    pub fn is_temp(&self) -> bool {
        matches!(self, RowKey::Temp(_))
    }
}

impl From<RowId> for RowKey {
    fn from(id: RowId) -> Self {
        RowKey::Persisted(id)
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Persisted(id) => write!(f, "{}", id),
            RowKey::Temp(tmp) => write!(f, "{}{}", TEMP_ROW_PREFIX, tmp),
        }
    }
}

impl FromStr for RowKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidKey { key: s.to_string() };
        match s.strip_prefix(TEMP_ROW_PREFIX) {
            Some(rest) => Uuid::parse_str(rest)
                .map(|u| RowKey::Temp(TempId(u)))
                .map_err(|_| invalid()),
            None => s
                .parse::<i64>()
                .map(|n| RowKey::Persisted(RowId(n)))
                .map_err(|_| invalid()),
        }
    }
}

impl Serialize for RowKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RowKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Identity of a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProgramKey {
    Persisted(ProgramId),
    Temp(TempId),
}

impl ProgramKey {
    pub fn temp() -> Self {
        ProgramKey::Temp(TempId::new())
    }

    pub fn program_id(&self) -> Option<ProgramId> {
        match self {
            ProgramKey::Persisted(id) => Some(*id),
            ProgramKey::Temp(_) => None,
        }
    }

    pub fn is_temp(&self) -> bool {
        matches!(self, ProgramKey::Temp(_))
    }
}

impl From<ProgramId> for ProgramKey {
    fn from(id: ProgramId) -> Self {
        ProgramKey::Persisted(id)
    }
}

impl fmt::Display for ProgramKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramKey::Persisted(id) => write!(f, "{}", id),
            ProgramKey::Temp(tmp) => write!(f, "{}{}", TEMP_PROGRAM_PREFIX, tmp),
        }
    }
}

impl FromStr for ProgramKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidKey { key: s.to_string() };
        match s.strip_prefix(TEMP_PROGRAM_PREFIX) {
            Some(rest) => Uuid::parse_str(rest)
                .map(|u| ProgramKey::Temp(TempId(u)))
                .map_err(|_| invalid()),
            None => s
                .parse::<i64>()
                .map(|n| ProgramKey::Persisted(ProgramId(n)))
                .map_err(|_| invalid()),
        }
    }
}

impl Serialize for ProgramKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ProgramKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_key_renders_persisted_as_number() {
        assert_eq!(RowKey::Persisted(RowId(42)).to_string(), "42");
        assert_eq!("42".parse::<RowKey>().unwrap(), RowKey::Persisted(RowId(42)));
    }

    #[test]
    fn row_key_temp_roundtrips_through_prefix() {
        let key = RowKey::temp();
        let rendered = key.to_string();
        assert!(rendered.starts_with("tpe-"));
        assert_eq!(rendered.parse::<RowKey>().unwrap(), key);
    }

    #[test]
    fn program_key_uses_its_own_prefix() {
        let key = ProgramKey::temp();
        assert!(key.to_string().starts_with("t-"));
        assert!(key.to_string().parse::<RowKey>().is_err());
        assert_eq!(key.to_string().parse::<ProgramKey>().unwrap(), key);
    }

    #[test]
    fn garbage_keys_are_rejected() {
        assert!(matches!(
            "tpe-not-a-uuid".parse::<RowKey>(),
            Err(CoreError::InvalidKey { .. })
        ));
        assert!("abc".parse::<ProgramKey>().is_err());
    }

    #[test]
    fn keys_serialize_as_strings() {
        let json = serde_json::to_string(&RowKey::Persisted(RowId(7))).unwrap();
        assert_eq!(json, "\"7\"");
        let back: ProgramKey = serde_json::from_str("\"9\"").unwrap();
        assert_eq!(back, ProgramKey::Persisted(ProgramId(9)));
    }

    #[test]
    fn row_id_accessor() {
        assert_eq!(RowKey::Persisted(RowId(3)).row_id(), Some(RowId(3)));
        assert!(RowKey::temp().row_id().is_none());
        assert!(ProgramKey::temp().program_id().is_none());
    }
}
