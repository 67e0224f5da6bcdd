//! Typed records for the two indexed kinds.
//!
//! The index itself is schemaless; these structs are the shapes the record
//! store normally hands back, and convert into [`Record`] for indexing.

use crate::error::Result;
use crate::types::{Record, RecordId, RecordKind};
use serde::{Deserialize, Serialize};

/// A colorant or base and the amount used in a formula.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub amount: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Formula {
    pub id: RecordId,
    pub name: String,
    pub number: String,
    pub notes: String,
    /// IDs of jobs this formula was used on.
    pub jobs: Vec<RecordId>,
    pub colorants: Vec<Component>,
    pub bases: Vec<Component>,
    pub created: i64,
    pub modified: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: RecordId,
    pub name: String,
    pub contact_name: String,
    pub contact_info: String,
    pub street: String,
    pub street2: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub notes: String,
    /// IDs of formulas used on this job.
    pub formulas: Vec<RecordId>,
    pub created: i64,
    pub modified: i64,
}

/// Implemented by typed records that can be fed to the index.
pub trait Indexable: Serialize {
    const KIND: RecordKind;

    fn record_id(&self) -> &str;

    fn to_record(&self) -> Result<Record> {
        Record::from_serializable(self.record_id(), self)
    }
}

impl Indexable for Formula {
    const KIND: RecordKind = RecordKind::Formula;

    fn record_id(&self) -> &str {
        &self.id
    }
}

impl Indexable for Job {
    const KIND: RecordKind = RecordKind::Job;

    fn record_id(&self) -> &str {
        &self.id
    }
}
