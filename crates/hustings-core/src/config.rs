//! Review thresholds.
//!
//! Passed explicitly to [`crate::review::ReviewPipeline::standard`]; every
//! field has a default so a partial config file is enough.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::review::event::ActionType;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
  /// A user's first this-many edits are flagged.
  pub first_edits:               u32,
  /// Reverts within the window at which further reverts are flagged.
  pub max_reverts:               u32,
  pub revert_window_hours:       u32,
  /// Approved edits of a flagged type after which a user stops being
  /// flagged for it.
  pub previously_approved_count: u32,
  pub bot_usernames:             BTreeSet<String>,
  pub no_review_action_types:    Vec<ActionType>,
}

impl Default for ReviewConfig {
  fn default() -> Self {
    Self {
      first_edits:               3,
      max_reverts:               2,
      revert_window_hours:       24,
      previously_approved_count: 20,
      bot_usernames:             ["CandidateBot", "TwitterBot", "ResultsBot"]
        .into_iter()
        .map(String::from)
        .collect(),
      no_review_action_types:    vec![ActionType::PhotoUpload],
    }
  }
}
