use std::fmt;

use crate::errors::StoreError;

/// Kind used by the sample programs when none is given.
pub const DEFAULT_KIND: &str = "Entity";

/// Address of a single record: a fixed kind namespace plus a caller-chosen name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    kind: String,
    name: String,
}

impl RecordKey {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Result<Self, StoreError> {
        let kind = kind.into();
        let name = name.into();

        if kind.trim().is_empty() {
            return Err(StoreError::Rejected("record key kind must not be empty".into()));
        }
        if name.is_empty() {
            return Err(StoreError::Rejected("record key name must not be empty".into()));
        }

        Ok(Self { kind, name })
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// The stored entity. Overwritten wholesale on every persist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub value: String,
}

impl Record {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }
}
