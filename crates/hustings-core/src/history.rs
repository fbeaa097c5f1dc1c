//! Edit lineage for a person whose history may span several person ids.
//!
//! When two people are merged, the surviving record keeps the donor's
//! versions alongside its own, and the first version written after the merge
//! carries provenance text naming the donor. Rebuilding the lineage means
//! linking each person id's versions into a chain and then attaching every
//! merge version to the tip of the donor's chain.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result, diff::VersionDiff, version::VersionSnapshot};

// ─── ParentMap ───────────────────────────────────────────────────────────────

/// `version_id` → parent version ids.
///
/// A root version has no parents, an ordinary edit has one (the previous
/// version of the same person id) and a merge version has two: its own
/// previous version followed by the donor's last version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParentMap(BTreeMap<String, Vec<String>>);

impl ParentMap {
  pub fn parents(&self, version_id: &str) -> Option<&[String]> {
    self.0.get(version_id).map(Vec::as_slice)
  }

  /// Versions that start a chain: the first version of each person id.
  pub fn roots(&self) -> impl Iterator<Item = &str> {
    self
      .0
      .iter()
      .filter(|(_, parents)| parents.is_empty())
      .map(|(id, _)| id.as_str())
  }

  /// Versions that joined two chains.
  pub fn merges(&self) -> impl Iterator<Item = &str> {
    self
      .0
      .iter()
      .filter(|(_, parents)| parents.len() > 1)
      .map(|(id, _)| id.as_str())
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
    self.0.iter().map(|(id, p)| (id.as_str(), p.as_slice()))
  }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Rebuild the parent map for one person's full version list.
///
/// Input order does not matter; versions are ordered by timestamp (stable,
/// so equal timestamps keep their input order). Fails with
/// [`Error::BogusMerge`] unless there is exactly one resolved merge per
/// person id beyond the first.
pub fn build_parent_map(versions: &[VersionSnapshot]) -> Result<ParentMap> {
  let mut ordered: Vec<&VersionSnapshot> = versions.iter().collect();
  ordered.sort_by_key(|v| v.timestamp);
  link(&ordered)
}

/// `ordered` must already be in chronological order.
fn link(ordered: &[&VersionSnapshot]) -> Result<ParentMap> {
  let Some(earliest) = ordered.first() else {
    return Ok(ParentMap::default());
  };

  // A repeated version id would become its own parent; only the earliest
  // copy takes part in the lineage.
  let mut seen = HashSet::new();
  let ordered: Vec<&VersionSnapshot> = ordered
    .iter()
    .copied()
    .filter(|v| {
      let first = seen.insert(v.version_id.as_str());
      if !first {
        debug!(version_id = %v.version_id, "duplicate version id ignored");
      }
      first
    })
    .collect();

  let mut parents: BTreeMap<String, Vec<String>> = BTreeMap::new();
  let mut chains: HashMap<&str, Vec<&str>> = HashMap::new();

  for version in &ordered {
    let chain = chains.entry(version.entity_id.as_str()).or_default();
    let temporal = chain
      .last()
      .map(|prev| vec![prev.to_string()])
      .unwrap_or_default();
    parents.insert(version.version_id.clone(), temporal);
    chain.push(version.version_id.as_str());
  }

  let mut merges = 0;
  for version in &ordered {
    let Some(donor) = version.merged_from() else {
      continue;
    };
    if donor == version.entity_id {
      debug!(
        version_id = %version.version_id,
        donor,
        "merge text names its own person; treating as ordinary edit"
      );
      continue;
    }
    // For a while merges did not carry the donor's history across; such a
    // version is just an ordinary edit.
    let Some(donor_tip) = chains.get(donor).and_then(|c| c.last()) else {
      debug!(
        version_id = %version.version_id,
        donor,
        "merge donor has no history here; treating as ordinary edit"
      );
      continue;
    };
    merges += 1;
    if let Some(p) = parents.get_mut(version.version_id.as_str()) {
      p.push(donor_tip.to_string());
    }
  }

  let entities = chains.len();
  if merges + 1 != entities {
    return Err(Error::BogusMerge {
      canonical_entity_id: earliest.entity_id.clone(),
      merges,
      entities,
    });
  }

  Ok(ParentMap(parents))
}

// ─── VersionGraph ────────────────────────────────────────────────────────────

/// A person's versions in chronological order together with their lineage.
#[derive(Debug, Clone)]
pub struct VersionGraph {
  versions: Vec<VersionSnapshot>,
  parents:  ParentMap,
}

impl VersionGraph {
  pub fn build(mut versions: Vec<VersionSnapshot>) -> Result<Self> {
    versions.sort_by_key(|v| v.timestamp);
    let ordered: Vec<&VersionSnapshot> = versions.iter().collect();
    let parents = link(&ordered)?;
    Ok(Self { versions, parents })
  }

  /// Oldest first.
  pub fn versions(&self) -> &[VersionSnapshot] { &self.versions }

  pub fn parent_map(&self) -> &ParentMap { &self.parents }

  pub fn snapshot(&self, version_id: &str) -> Option<&VersionSnapshot> {
    self.versions.iter().find(|v| v.version_id == version_id)
  }

  pub fn latest(&self) -> Option<&VersionSnapshot> { self.versions.last() }

  /// The person id of the earliest version.
  pub fn canonical_entity_id(&self) -> Option<&str> {
    self.versions.first().map(|v| v.entity_id.as_str())
  }

  /// Diff of every version against each of its parents, newest first.
  pub fn diffs(&self) -> Vec<VersionDiff> { crate::diff::version_diffs(self) }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::{DateTime, NaiveDateTime};
  use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
  use serde_json::json;

  use super::*;

  fn at(secs: i64) -> NaiveDateTime {
    DateTime::from_timestamp(1_430_000_000 + secs, 0)
      .unwrap()
      .naive_utc()
  }

  fn version(id: &str, secs: i64, entity: &str, source: &str) -> VersionSnapshot {
    VersionSnapshot {
      version_id:         id.into(),
      timestamp:          at(secs),
      entity_id:          entity.into(),
      information_source: source.into(),
      data:               json!({ "id": entity }),
    }
  }

  fn edit(id: &str, secs: i64, entity: &str) -> VersionSnapshot {
    version(id, secs, entity, "Manual edit")
  }

  /// Person 100 absorbs person 200 at `b2`.
  fn merged_history() -> Vec<VersionSnapshot> {
    vec![
      edit("a1", 0, "200"),
      edit("b1", 10, "100"),
      edit("a2", 20, "200"),
      version("b2", 30, "100", "After merging person 200"),
      edit("b3", 40, "100"),
    ]
  }

  #[test]
  fn empty_input_gives_empty_map() {
    let map = build_parent_map(&[]).unwrap();
    assert!(map.is_empty());
  }

  #[test]
  fn single_person_is_a_linear_chain() {
    let versions: Vec<_> = (0..5)
      .map(|i| edit(&format!("v{i}"), i * 10, "2009"))
      .rev()
      .collect();
    let map = build_parent_map(&versions).unwrap();

    assert_eq!(map.len(), 5);
    assert_eq!(map.parents("v0"), Some(&[][..]));
    for i in 1..5 {
      let expected = vec![format!("v{}", i - 1)];
      assert_eq!(map.parents(&format!("v{i}")), Some(expected.as_slice()));
    }
    assert_eq!(map.roots().collect::<Vec<_>>(), vec!["v0"]);
    assert_eq!(map.merges().count(), 0);
  }

  #[test]
  fn merge_version_gets_donor_tip_as_second_parent() {
    let map = build_parent_map(&merged_history()).unwrap();

    assert_eq!(
      map.parents("b2").unwrap(),
      &["b1".to_string(), "a2".to_string()]
    );
    assert_eq!(map.parents("a2").unwrap(), &["a1".to_string()]);
    assert_eq!(map.parents("b3").unwrap(), &["b2".to_string()]);
    assert_eq!(map.merges().collect::<Vec<_>>(), vec!["b2"]);
    let mut roots: Vec<_> = map.roots().collect();
    roots.sort();
    assert_eq!(roots, vec!["a1", "b1"]);
  }

  #[test]
  fn merge_with_unknown_donor_is_an_ordinary_edit() {
    let versions = vec![
      edit("v1", 0, "100"),
      version("v2", 10, "100", "After merging person 999"),
      edit("v3", 20, "100"),
    ];
    let map = build_parent_map(&versions).unwrap();
    assert_eq!(map.parents("v2").unwrap(), &["v1".to_string()]);
    assert_eq!(map.merges().count(), 0);
  }

  #[test]
  fn second_person_without_merge_is_bogus() {
    let versions = vec![
      edit("a1", 0, "200"),
      edit("b1", 10, "100"),
      edit("b2", 20, "100"),
    ];
    let err = build_parent_map(&versions).unwrap_err();
    assert!(matches!(
      err,
      Error::BogusMerge { ref canonical_entity_id, merges: 0, entities: 2 }
        if canonical_entity_id == "200"
    ));
  }

  #[test]
  fn repeated_merge_text_for_same_donor_is_bogus() {
    let mut versions = merged_history();
    versions.push(version(
      "b4",
      50,
      "100",
      "After merging person 200 (again)",
    ));
    let err = build_parent_map(&versions).unwrap_err();
    assert!(matches!(err, Error::BogusMerge { merges: 2, entities: 2, .. }));
  }

  #[test]
  fn bogus_merge_message_names_counts() {
    let versions = vec![edit("a1", 0, "7"), edit("b1", 10, "8")];
    let err = build_parent_map(&versions).unwrap_err();
    assert_eq!(
      err.to_string(),
      "bogus merge version for person with ID 7; there were 0 merge \
       versions and 2 person IDs"
    );
  }

  #[test]
  fn three_people_two_merges() {
    let versions = vec![
      edit("c1", 0, "300"),
      edit("a1", 5, "200"),
      edit("b1", 10, "100"),
      version("b2", 20, "100", "After merging person 200"),
      version("b3", 30, "100", "After merging person 300"),
    ];
    let map = build_parent_map(&versions).unwrap();
    assert_eq!(
      map.parents("b2").unwrap(),
      &["b1".to_string(), "a1".to_string()]
    );
    assert_eq!(
      map.parents("b3").unwrap(),
      &["b2".to_string(), "c1".to_string()]
    );
  }

  #[test]
  fn merge_naming_own_person_is_not_a_merge() {
    let versions = vec![
      edit("a1", 0, "200"),
      edit("b1", 10, "100"),
      version("b2", 20, "100", "After merging person 100"),
    ];
    let err = build_parent_map(&versions).unwrap_err();
    assert!(matches!(err, Error::BogusMerge { merges: 0, entities: 2, .. }));

    let single = vec![
      edit("b1", 10, "100"),
      version("b2", 20, "100", "After merging person 100"),
    ];
    let map = build_parent_map(&single).unwrap();
    assert_eq!(map.parents("b2").unwrap(), &["b1".to_string()]);
  }

  #[test]
  fn duplicate_version_id_keeps_earliest_copy() {
    let versions = vec![
      edit("v1", 0, "100"),
      edit("v2", 10, "100"),
      edit("v2", 20, "100"),
      edit("v3", 30, "100"),
    ];
    let map = build_parent_map(&versions).unwrap();
    assert_eq!(map.len(), 3);
    assert_eq!(map.parents("v2").unwrap(), &["v1".to_string()]);
    assert_eq!(map.parents("v3").unwrap(), &["v2".to_string()]);
  }

  #[test]
  fn equal_timestamps_keep_input_order() {
    let versions = vec![edit("first", 0, "1"), edit("second", 0, "1")];
    let map = build_parent_map(&versions).unwrap();
    assert_eq!(map.parents("second").unwrap(), &["first".to_string()]);
  }

  #[test]
  fn shuffled_input_gives_identical_map() {
    let versions = merged_history();
    let expected = build_parent_map(&versions).unwrap();

    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..20 {
      let mut shuffled = versions.clone();
      shuffled.shuffle(&mut rng);
      assert_eq!(build_parent_map(&shuffled).unwrap(), expected);
    }
  }

  #[test]
  fn graph_exposes_sorted_versions_and_canonical_id() {
    let mut versions = merged_history();
    versions.reverse();
    let graph = VersionGraph::build(versions).unwrap();

    assert_eq!(graph.canonical_entity_id(), Some("200"));
    assert_eq!(graph.latest().map(|v| v.version_id.as_str()), Some("b3"));
    assert_eq!(graph.versions()[0].version_id, "a1");
    assert!(graph.snapshot("a2").is_some());
    assert!(graph.snapshot("zz").is_none());
    assert_eq!(graph.parent_map(), &build_parent_map(&merged_history()).unwrap());
  }

  #[test]
  fn parent_map_serialises_as_object() {
    let map = build_parent_map(&merged_history()).unwrap();
    let value = serde_json::to_value(&map).unwrap();
    assert_eq!(value["b2"], json!(["b1", "a2"]));
    assert_eq!(value["a1"], json!([]));
  }
}
