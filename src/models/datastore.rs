//! Full snapshot of the scheduling data.

use serde::{Deserialize, Serialize};

use super::{Shift, Staff};
use crate::scheduling::RequirementMatrix;

/// The root datastore containing all scheduling data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Datastore {
    pub schema_version: i32,
    pub generated_at: String,
    pub revision_id: i64,
    pub staff: Vec<Staff>,
    pub requirements: RequirementMatrix,
    pub schedule: Vec<Shift>,
}

/// Revision information for change detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionInfo {
    pub revision_id: i64,
    pub generated_at: String,
}
