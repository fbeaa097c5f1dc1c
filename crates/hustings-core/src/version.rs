//! Version snapshots — one immutable captured state of a person's record.
//!
//! Snapshots are written once when an edit is committed and never change
//! afterwards. The exported form carries no entity id of its own; the id of
//! the person the snapshot belonged to is read from the payload's `id` key.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// Leading phrase of the provenance text written when one person is merged
/// into another.
pub const MERGE_SOURCE_PREFIX: &str = "After merging person ";

// ─── Wire record ─────────────────────────────────────────────────────────────

/// A version exactly as it appears in an exported history list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionRecord {
  pub version_id:         String,
  pub timestamp:          NaiveDateTime,
  #[serde(default)]
  pub information_source: String,
  pub data:               Value,
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSnapshot {
  pub version_id:         String,
  /// Microsecond precision; the only ordering key for a person's history.
  pub timestamp:          NaiveDateTime,
  /// The person this snapshot belonged to when it was captured.
  pub entity_id:          String,
  pub information_source: String,
  pub data:               Value,
}

impl VersionSnapshot {
  /// Lift a wire record into a snapshot, reading `entity_id` from
  /// `data.id`. Integer ids are accepted as well as strings.
  pub fn from_record(record: VersionRecord) -> Result<Self> {
    let entity_id = match record.data.get("id") {
      Some(Value::String(s)) if !s.is_empty() => s.clone(),
      Some(Value::Number(n)) => n.to_string(),
      _ => {
        return Err(Error::MissingEntityId {
          version_id: record.version_id,
        });
      }
    };
    Ok(Self {
      version_id: record.version_id,
      timestamp: record.timestamp,
      entity_id,
      information_source: record.information_source,
      data: record.data,
    })
  }

  /// The donor person id if this version's provenance records a merge.
  ///
  /// Matches only at the start of the text, and only the run of ASCII
  /// digits directly after the prefix.
  pub fn merged_from(&self) -> Option<&str> {
    let rest = self.information_source.strip_prefix(MERGE_SOURCE_PREFIX)?;
    let end = rest
      .find(|c: char| !c.is_ascii_digit())
      .unwrap_or(rest.len());
    (end > 0).then(|| &rest[..end])
  }
}

impl TryFrom<VersionRecord> for VersionSnapshot {
  type Error = Error;

  fn try_from(record: VersionRecord) -> Result<Self> {
    Self::from_record(record)
  }
}

/// Parse an exported JSON array of version records.
pub fn parse_versions(json: &str) -> Result<Vec<VersionSnapshot>> {
  let records: Vec<VersionRecord> = serde_json::from_str(json)?;
  records.into_iter().map(VersionSnapshot::from_record).collect()
}

// ─── Tests ───────────────────────────────────────────────────────────────────
