//! The built-in review rules and their fixed order.

use std::collections::BTreeSet;

use chrono::TimeDelta;
use serde::Serialize;

use super::{
  DecisionRule, Verdict,
  event::{ActionType, EditEvent},
};
use crate::{config::ReviewConfig, diff::OpKind, error::RuleFailure};

// ─── Catalogue ───────────────────────────────────────────────────────────────

/// The stored key and user-facing label of a built-in rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuleInfo {
  pub rule_type: &'static str,
  pub label:     &'static str,
}

pub const NEVER_NEEDS_REVIEW: RuleInfo = RuleInfo {
  rule_type: "edit_types_that_never_need_review",
  label:     "Type of edit that never needs a review",
};
pub const VERY_TRUSTED_USER: RuleInfo = RuleInfo {
  rule_type: "no_review_needed_due_to_user_being_very_trusted",
  label:     "Edit made by very trusted user",
};
pub const BOT_USER: RuleInfo = RuleInfo {
  rule_type: "no_review_needed_due_to_user_being_a_bot",
  label:     "Edit made by bot",
};
pub const HIGH_PROFILE: RuleInfo = RuleInfo {
  rule_type: "needs_review_due_to_high_profile",
  label:     "Edit of a candidate whose record may be particularly liable to \
              vandalism",
};
pub const CANDIDATE_DIED: RuleInfo = RuleInfo {
  rule_type: "needs_review_due_to_candidate_having_died",
  label:     "Edit of a candidate who has died",
};
pub const FIRST_EDITS: RuleInfo = RuleInfo {
  rule_type: "needs_review_due_to_first_edits",
  label:     "First edits by user",
};
pub const STATEMENT_EDIT: RuleInfo = RuleInfo {
  rule_type: "needs_review_due_to_statement_edit",
  label:     "Edit of a statement to voters",
};
pub const CURRENT_NAME_CHANGE: RuleInfo = RuleInfo {
  rule_type: "needs_review_due_to_current_candidate_name_change",
  label:     "Edit of name of current candidate",
};
pub const TOO_MANY_REVERTS: RuleInfo = RuleInfo {
  rule_type: "needs_review_due_to_too_many_reverts",
  label:     "Too many reverts in 24 hours",
};
pub const PREVIOUSLY_APPROVED: RuleInfo = RuleInfo {
  rule_type: "made_enough_previously_approved_edits_of_type",
  label:     "Made enough approved edits of type",
};

/// Every built-in rule, primary rules first in evaluation order.
pub const ALL: &[RuleInfo] = &[
  NEVER_NEEDS_REVIEW,
  VERY_TRUSTED_USER,
  BOT_USER,
  HIGH_PROFILE,
  CANDIDATE_DIED,
  FIRST_EDITS,
  STATEMENT_EDIT,
  CURRENT_NAME_CHANGE,
  TOO_MANY_REVERTS,
  PREVIOUSLY_APPROVED,
];

/// Find a built-in rule by its stored key.
pub fn lookup(rule_type: &str) -> Option<&'static RuleInfo> {
  ALL.iter().find(|r| r.rule_type == rule_type)
}

/// The primary rules, in evaluation order.
pub fn primary(config: &ReviewConfig) -> Vec<Box<dyn DecisionRule>> {
  vec![
    Box::new(NeverNeedsReview {
      action_types: config.no_review_action_types.clone(),
    }),
    Box::new(VeryTrustedUser),
    Box::new(BotUser {
      usernames: config.bot_usernames.clone(),
    }),
    Box::new(HighProfileCandidate),
    Box::new(CandidateDied),
    Box::new(FirstEdits {
      threshold: config.first_edits,
    }),
    Box::new(StatementEdit),
    Box::new(CurrentCandidateNameChange),
    Box::new(TooManyReverts {
      max:          config.max_reverts,
      window_hours: config.revert_window_hours,
    }),
  ]
}

/// The override rules, in evaluation order.
pub fn overrides(config: &ReviewConfig) -> Vec<Box<dyn DecisionRule>> {
  vec![Box::new(PreviouslyApprovedEditsOfType {
    threshold: config.previously_approved_count,
  })]
}

// ─── Clearing rules ──────────────────────────────────────────────────────────

/// Some kinds of action are never worth a moderator's time.
pub struct NeverNeedsReview {
  pub action_types: Vec<ActionType>,
}

impl DecisionRule for NeverNeedsReview {
  fn rule_type(&self) -> &'static str { NEVER_NEEDS_REVIEW.rule_type }

  fn label(&self) -> &'static str { NEVER_NEEDS_REVIEW.label }

  fn may_flag(&self) -> bool { false }

  fn decide(&self, event: &EditEvent) -> Result<Verdict, RuleFailure> {
    if self.action_types.contains(&event.action_type) {
      return Ok(Verdict::NoReviewNeeded);
    }
    Ok(Verdict::Undecided)
  }
}

pub struct VeryTrustedUser;

impl DecisionRule for VeryTrustedUser {
  fn rule_type(&self) -> &'static str { VERY_TRUSTED_USER.rule_type }

  fn label(&self) -> &'static str { VERY_TRUSTED_USER.label }

  fn may_flag(&self) -> bool { false }

  fn decide(&self, event: &EditEvent) -> Result<Verdict, RuleFailure> {
    match &event.user {
      Some(user) if user.very_trusted => Ok(Verdict::NoReviewNeeded),
      _ => Ok(Verdict::Undecided),
    }
  }
}

pub struct BotUser {
  pub usernames: BTreeSet<String>,
}

impl DecisionRule for BotUser {
  fn rule_type(&self) -> &'static str { BOT_USER.rule_type }

  fn label(&self) -> &'static str { BOT_USER.label }

  fn may_flag(&self) -> bool { false }

  fn decide(&self, event: &EditEvent) -> Result<Verdict, RuleFailure> {
    match event.username() {
      Some(name) if self.usernames.contains(name) => {
        Ok(Verdict::NoReviewNeeded)
      }
      _ => Ok(Verdict::Undecided),
    }
  }
}

/// Clears users who have already had plenty of edits of the flagged type
/// approved. Runs as an override, after the primary rules.
pub struct PreviouslyApprovedEditsOfType {
  pub threshold: u32,
}

impl DecisionRule for PreviouslyApprovedEditsOfType {
  fn rule_type(&self) -> &'static str { PREVIOUSLY_APPROVED.rule_type }

  fn label(&self) -> &'static str { PREVIOUSLY_APPROVED.label }

  fn may_flag(&self) -> bool { false }

  fn decide(&self, event: &EditEvent) -> Result<Verdict, RuleFailure> {
    if event.flagged_type.is_none() {
      return Ok(Verdict::Undecided);
    }
    let Some(user) = &event.user else {
      return Ok(Verdict::Undecided);
    };
    if user.approved_edits_of_flagged_type >= self.threshold {
      return Ok(Verdict::NoReviewNeeded);
    }
    Ok(Verdict::Undecided)
  }
}

// ─── Flagging rules ──────────────────────────────────────────────────────────

/// People whose records attract vandalism.
pub struct HighProfileCandidate;

impl DecisionRule for HighProfileCandidate {
  fn rule_type(&self) -> &'static str { HIGH_PROFILE.rule_type }

  fn label(&self) -> &'static str { HIGH_PROFILE.label }

  fn decide(&self, event: &EditEvent) -> Result<Verdict, RuleFailure> {
    match &event.person {
      Some(person) if person.liable_to_vandalism => Ok(Verdict::NeedsReview),
      _ => Ok(Verdict::Undecided),
    }
  }
}

pub struct CandidateDied;

impl DecisionRule for CandidateDied {
  fn rule_type(&self) -> &'static str { CANDIDATE_DIED.rule_type }

  fn label(&self) -> &'static str { CANDIDATE_DIED.label }

  fn decide(&self, event: &EditEvent) -> Result<Verdict, RuleFailure> {
    match &event.person {
      Some(person) if person.death_date.is_some() => Ok(Verdict::NeedsReview),
      _ => Ok(Verdict::Undecided),
    }
  }
}

pub struct FirstEdits {
  pub threshold: u32,
}

impl DecisionRule for FirstEdits {
  fn rule_type(&self) -> &'static str { FIRST_EDITS.rule_type }

  fn label(&self) -> &'static str { FIRST_EDITS.label }

  fn description(&self, event: &EditEvent) -> String {
    format!(
      "One of the first {n} edits of user {username}",
      n = self.threshold,
      username = event.username().unwrap_or("(anonymous)"),
    )
  }

  fn decide(&self, event: &EditEvent) -> Result<Verdict, RuleFailure> {
    match &event.user {
      Some(user) if user.edit_count < self.threshold => {
        Ok(Verdict::NeedsReview)
      }
      _ => Ok(Verdict::Undecided),
    }
  }
}

/// Statements to voters live under `biography`.
pub struct StatementEdit;

impl DecisionRule for StatementEdit {
  fn rule_type(&self) -> &'static str { STATEMENT_EDIT.rule_type }

  fn label(&self) -> &'static str { STATEMENT_EDIT.label }

  fn decide(&self, event: &EditEvent) -> Result<Verdict, RuleFailure> {
    if event.person.is_none() {
      return Ok(Verdict::Undecided);
    }
    if event.changes.iter().any(|op| op.touches("biography")) {
      return Ok(Verdict::NeedsReview);
    }
    Ok(Verdict::Undecided)
  }
}

/// Renaming someone who is already on a locked ballot paper.
pub struct CurrentCandidateNameChange;

impl DecisionRule for CurrentCandidateNameChange {
  fn rule_type(&self) -> &'static str { CURRENT_NAME_CHANGE.rule_type }

  fn label(&self) -> &'static str { CURRENT_NAME_CHANGE.label }

  fn decide(&self, event: &EditEvent) -> Result<Verdict, RuleFailure> {
    let (Some(_), Some(person)) = (&event.user, &event.person) else {
      return Ok(Verdict::Undecided);
    };
    if !person.standing_in_locked_current_ballot {
      return Ok(Verdict::Undecided);
    }
    let renamed = event
      .changes
      .iter()
      .any(|op| op.path == "name" && op.op == OpKind::Replace);
    if renamed {
      return Ok(Verdict::NeedsReview);
    }
    Ok(Verdict::Undecided)
  }
}

/// Repeated reverts of one person within a short window suggest an edit war.
pub struct TooManyReverts {
  pub max:          u32,
  pub window_hours: u32,
}

impl DecisionRule for TooManyReverts {
  fn rule_type(&self) -> &'static str { TOO_MANY_REVERTS.rule_type }

  fn label(&self) -> &'static str { TOO_MANY_REVERTS.label }

  fn description(&self, _event: &EditEvent) -> String {
    format!("Too many reverted edits in {} hours", self.window_hours)
  }

  fn decide(&self, event: &EditEvent) -> Result<Verdict, RuleFailure> {
    if event.action_type != ActionType::PersonRevert {
      return Ok(Verdict::Undecided);
    }
    let Some(person) = &event.person else {
      return Ok(Verdict::Undecided);
    };
    // `None` when the window reaches past the earliest representable time;
    // every earlier revert then counts.
    let since = TimeDelta::try_hours(i64::from(self.window_hours))
      .and_then(|window| event.occurred_at.checked_sub_signed(window));
    let recent = person
      .recent_reverts
      .iter()
      .filter(|at| since.is_none_or(|s| **at > s) && **at <= event.occurred_at)
      .count();
    if recent >= self.max as usize {
      return Ok(Verdict::NeedsReview);
    }
    Ok(Verdict::Undecided)
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
