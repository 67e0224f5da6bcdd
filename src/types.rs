use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tenant (account) identifier — the partition key for every index.
pub type TenantId = String;
/// Record identifier, unique within a tenant and record kind.
pub type RecordId = String;

/// Category of record. Each kind gets its own index per tenant, so a formula
/// and a job may share an ID without colliding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Formula,
    Job,
}

impl RecordKind {
    pub const ALL: [RecordKind; 2] = [RecordKind::Formula, RecordKind::Job];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Formula => "formula",
            RecordKind::Job => "job",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "formula" | "formulas" => Ok(RecordKind::Formula),
            "job" | "jobs" => Ok(RecordKind::Job),
            other => Err(format!("unknown record kind: {}", other)),
        }
    }
}

/// A record as returned by the record store.
///
/// `body` is indexed as-is: no schema is enforced, whatever fields the store
/// returns are flattened into searchable text at index time. The document is
/// a snapshot, later changes to the store are only seen on the next upsert or
/// rebuild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub body: serde_json::Value,
}

impl Record {
    pub fn new(id: impl Into<RecordId>, body: serde_json::Value) -> Self {
        Record {
            id: id.into(),
            body,
        }
    }

    /// Build a record from any serializable value, using `id` as the key.
    pub fn from_serializable<T: Serialize + ?Sized>(
        id: impl Into<RecordId>,
        value: &T,
    ) -> crate::error::Result<Self> {
        Ok(Record {
            id: id.into(),
            body: serde_json::to_value(value)?,
        })
    }
}
