//! Version diffs: the patch operations that turn a parent version's payload
//! into its child's.
//!
//! Review rules inspect the diff against the temporal parent to tell, for
//! example, whether a statement to voters or a name was edited.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::history::VersionGraph;

/// The kind of change a [`PatchOp`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
  Add,
  Remove,
  Replace,
}

/// One change to a single path. Paths are `/`-joined object keys without a
/// leading slash, e.g. `biography` or `extra_fields/favourite_biscuits`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOp {
  pub op:    OpKind,
  pub path:  String,
  /// The new value; absent for `remove`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub value: Option<Value>,
}

impl PatchOp {
  /// True if this op touches `path` or anything below it.
  pub fn touches(&self, path: &str) -> bool {
    self.path == path
      || self
        .path
        .strip_prefix(path)
        .is_some_and(|rest| rest.starts_with('/'))
  }
}

/// The changes a version made relative to one parent. A root version is
/// diffed against an empty record and has no parent id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentDiff {
  pub parent_version_id: Option<String>,
  pub ops:               Vec<PatchOp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionDiff {
  pub version_id:   String,
  pub parent_diffs: Vec<ParentDiff>,
}

impl VersionDiff {
  /// Ops against the temporal parent (always the first parent).
  pub fn primary_ops(&self) -> &[PatchOp] {
    self
      .parent_diffs
      .first()
      .map(|d| d.ops.as_slice())
      .unwrap_or_default()
  }
}

/// Compute the ops that turn `parent` into `child`.
///
/// Objects are walked key by key in sorted order; every other value,
/// arrays included, is compared whole.
pub fn diff_values(parent: &Value, child: &Value) -> Vec<PatchOp> {
  let mut ops = Vec::new();
  diff_at("", parent, child, &mut ops);
  ops
}

fn diff_at(path: &str, parent: &Value, child: &Value, ops: &mut Vec<PatchOp>) {
  match (parent, child) {
    (Value::Object(a), Value::Object(b)) => diff_objects(path, a, b, ops),
    _ if parent == child => {}
    _ => ops.push(PatchOp {
      op:    OpKind::Replace,
      path:  path.to_string(),
      value: Some(child.clone()),
    }),
  }
}

fn diff_objects(
  path: &str,
  parent: &Map<String, Value>,
  child: &Map<String, Value>,
  ops: &mut Vec<PatchOp>,
) {
  let keys: BTreeSet<&String> = parent.keys().chain(child.keys()).collect();
  for key in keys {
    let sub = if path.is_empty() {
      key.clone()
    } else {
      format!("{path}/{key}")
    };
    match (parent.get(key), child.get(key)) {
      (Some(a), Some(b)) => diff_at(&sub, a, b, ops),
      (None, Some(b)) => ops.push(PatchOp {
        op:    OpKind::Add,
        path:  sub,
        value: Some(b.clone()),
      }),
      (Some(_), None) => ops.push(PatchOp {
        op:    OpKind::Remove,
        path:  sub,
        value: None,
      }),
      (None, None) => {}
    }
  }
}

/// Diff every version in `graph` against each of its parents, newest first.
pub fn version_diffs(graph: &VersionGraph) -> Vec<VersionDiff> {
  let empty = Value::Object(Map::new());
  let parents = graph.parent_map();

  graph
    .versions()
    .iter()
    .rev()
    .map(|version| {
      let parent_ids = parents.parents(&version.version_id).unwrap_or_default();
      let parent_diffs = if parent_ids.is_empty() {
        vec![ParentDiff {
          parent_version_id: None,
          ops:               diff_values(&empty, &version.data),
        }]
      } else {
        parent_ids
          .iter()
          .map(|parent_id| {
            let base = graph
              .snapshot(parent_id)
              .map(|p| &p.data)
              .unwrap_or(&empty);
            ParentDiff {
              parent_version_id: Some(parent_id.clone()),
              ops:               diff_values(base, &version.data),
            }
          })
          .collect()
      };
      VersionDiff {
        version_id: version.version_id.clone(),
        parent_diffs,
      }
    })
    .collect()
}

// ─── Tests ───────────────────────────────────────────────────────────────────
