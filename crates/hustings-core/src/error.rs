//! Error types for `hustings-core`.

use thiserror::Error;

/// The error a [`crate::review::DecisionRule`] raises when it fails outright
/// instead of returning [`crate::review::Verdict::Undecided`].
pub type RuleFailure = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// The merge-count / entity-count invariant failed while reconciling a
  /// person's history. Either a merge was never recorded, or a version's
  /// source text only looks like a merge.
  #[error(
    "bogus merge version for person with ID {canonical_entity_id}; there \
     were {merges} merge versions and {entities} person IDs"
  )]
  BogusMerge {
    canonical_entity_id: String,
    merges:              usize,
    entities:            usize,
  },

  #[error("rule {rule_type} failed: {source}")]
  RuleEvaluation {
    rule_type: &'static str,
    #[source]
    source:    RuleFailure,
  },

  #[error("override rule {rule_type} returned needs-review")]
  OverrideFlagged { rule_type: &'static str },

  #[error("rule {rule_type} can flag edits and cannot be used as an override")]
  FlaggingOverride { rule_type: &'static str },

  #[error("rule type {rule_type} is configured more than once")]
  DuplicateRule { rule_type: &'static str },

  #[error("version {version_id} has no usable `data.id`")]
  MissingEntityId { version_id: String },

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
