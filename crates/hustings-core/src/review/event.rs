//! The edit event a review pipeline judges.
//!
//! Everything a rule may look at is gathered here by the caller before
//! evaluation; rules never fetch anything themselves.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::diff::PatchOp;

/// The kind of logged action that produced the edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionType {
  PersonCreate,
  PersonUpdate,
  PersonRevert,
  PersonMerge,
  PhotoUpload,
  PhotoApprove,
  PhotoReject,
  CandidacyCreate,
  CandidacyDelete,
  #[serde(other)]
  Other,
}

/// The user who made the edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
  pub username:                       String,
  /// Logged actions by this user, this one included.
  #[serde(default)]
  pub edit_count:                     u32,
  /// Member of the very-trusted group.
  #[serde(default)]
  pub very_trusted:                   bool,
  /// Earlier edits of the event's `flagged_type` by this user that a
  /// moderator has already ruled on.
  #[serde(default)]
  pub approved_edits_of_flagged_type: u32,
}

/// What is known about the person whose record was edited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonContext {
  #[serde(default)]
  pub death_date:                        Option<NaiveDate>,
  #[serde(default)]
  pub liable_to_vandalism:               bool,
  /// Standing in a current election whose candidate list is locked.
  #[serde(default)]
  pub standing_in_locked_current_ballot: bool,
  /// When reverts of this person's record happened, this event included
  /// if it is one.
  #[serde(default)]
  pub recent_reverts:                    Vec<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditEvent {
  pub action_type:  ActionType,
  pub occurred_at:  DateTime<Utc>,
  #[serde(default)]
  pub user:         Option<Actor>,
  #[serde(default)]
  pub person:       Option<PersonContext>,
  #[serde(default)]
  pub flagged_type: Option<String>,
  /// Diff of the new version against its temporal parent.
  #[serde(default)]
  pub changes:      Vec<PatchOp>,
}

impl EditEvent {
  pub fn new(action_type: ActionType, occurred_at: DateTime<Utc>) -> Self {
    Self {
      action_type,
      occurred_at,
      user: None,
      person: None,
      flagged_type: None,
      changes: Vec::new(),
    }
  }

  pub fn username(&self) -> Option<&str> {
    self.user.as_ref().map(|u| u.username.as_str())
  }
}
