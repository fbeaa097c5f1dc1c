//! Review decisions: does a human need to look at this edit?
//!
//! A [`ReviewPipeline`] holds two ordered lists of [`DecisionRule`]s. The
//! primary rules run first and the first one with an opinion wins. The
//! override rules always run afterwards and may only clear an edit, never
//! flag it. When no rule has an opinion the edit needs no review.

pub mod event;
pub mod rules;

use std::{collections::HashSet, fmt};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Error, Result, config::ReviewConfig, error::RuleFailure};
use event::EditEvent;

// ─── Verdict ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
  Undecided,
  NeedsReview,
  NoReviewNeeded,
}

impl Verdict {
  pub fn is_decided(self) -> bool { self != Self::Undecided }
}

// ─── Rule trait ──────────────────────────────────────────────────────────────

/// A stateless policy over an [`EditEvent`].
///
/// Rules must return [`Verdict::Undecided`] when the context they need is
/// missing. Returning `Err` aborts the whole evaluation.
pub trait DecisionRule: Send + Sync {
  /// Unique key, stored alongside the verdict.
  fn rule_type(&self) -> &'static str;

  /// Short user-facing explanation.
  fn label(&self) -> &'static str;

  /// Explanation for this particular event. Defaults to the label.
  fn description(&self, _event: &EditEvent) -> String {
    self.label().to_string()
  }

  /// Whether this rule can ever return [`Verdict::NeedsReview`]. Rules that
  /// can are not accepted as overrides.
  fn may_flag(&self) -> bool { true }

  fn decide(&self, event: &EditEvent) -> Result<Verdict, RuleFailure>;
}

// ─── Decision ────────────────────────────────────────────────────────────────

/// The pipeline's answer and the rule responsible for it. `rule` is `None`
/// when nothing fired and the default applied, or when a failed evaluation
/// was forced to review with [`Decision::or_flag`].
#[derive(Clone, Copy)]
pub struct Decision<'r> {
  pub verdict: Verdict,
  pub rule:    Option<&'r dyn DecisionRule>,
}

impl<'r> Decision<'r> {
  pub fn needs_review(&self) -> bool { self.verdict == Verdict::NeedsReview }

  pub fn rule_type(&self) -> Option<&'static str> {
    self.rule.map(|r| r.rule_type())
  }

  /// The deciding rule's explanation for `event`.
  pub fn reason(&self, event: &EditEvent) -> Option<String> {
    self.rule.map(|r| r.description(event))
  }

  /// Collapse a failed evaluation into a forced review so nothing is
  /// published unchecked.
  pub fn or_flag(result: Result<Decision<'r>>) -> Decision<'r> {
    result.unwrap_or_else(|e| {
      warn!(error = %e, "review evaluation failed; forcing review");
      Decision {
        verdict: Verdict::NeedsReview,
        rule:    None,
      }
    })
  }
}

impl fmt::Debug for Decision<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Decision")
      .field("verdict", &self.verdict)
      .field("rule", &self.rule_type())
      .finish()
  }
}

// ─── Evaluation ──────────────────────────────────────────────────────────────

fn run(rule: &dyn DecisionRule, event: &EditEvent) -> Result<Verdict> {
  let verdict = rule.decide(event).map_err(|source| Error::RuleEvaluation {
    rule_type: rule.rule_type(),
    source,
  })?;
  debug!(rule = rule.rule_type(), ?verdict, "rule evaluated");
  Ok(verdict)
}

/// Evaluate `event` against `primary` then `overrides`.
///
/// Primary rules short-circuit on the first decided verdict. Override rules
/// run regardless; the first that clears the edit replaces the result. An
/// override that flags is an error.
pub fn evaluate<'r>(
  event: &EditEvent,
  primary: &'r [Box<dyn DecisionRule>],
  overrides: &'r [Box<dyn DecisionRule>],
) -> Result<Decision<'r>> {
  let mut decision = Decision {
    verdict: Verdict::NoReviewNeeded,
    rule:    None,
  };

  for rule in primary {
    let verdict = run(rule.as_ref(), event)?;
    if verdict.is_decided() {
      decision = Decision {
        verdict,
        rule: Some(rule.as_ref()),
      };
      break;
    }
  }

  for rule in overrides {
    match run(rule.as_ref(), event)? {
      Verdict::Undecided => {}
      Verdict::NoReviewNeeded => {
        decision = Decision {
          verdict: Verdict::NoReviewNeeded,
          rule:    Some(rule.as_ref()),
        };
        break;
      }
      Verdict::NeedsReview => {
        return Err(Error::OverrideFlagged {
          rule_type: rule.rule_type(),
        });
      }
    }
  }

  Ok(decision)
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

/// A validated, immutable rule configuration. Safe to share across threads.
pub struct ReviewPipeline {
  primary:   Vec<Box<dyn DecisionRule>>,
  overrides: Vec<Box<dyn DecisionRule>>,
}

impl ReviewPipeline {
  /// Rejects overrides that could flag an edit and rule types that appear
  /// more than once.
  pub fn new(
    primary: Vec<Box<dyn DecisionRule>>,
    overrides: Vec<Box<dyn DecisionRule>>,
  ) -> Result<Self> {
    if let Some(rule) = overrides.iter().find(|r| r.may_flag()) {
      return Err(Error::FlaggingOverride {
        rule_type: rule.rule_type(),
      });
    }
    let mut seen = HashSet::new();
    for rule in primary.iter().chain(&overrides) {
      if !seen.insert(rule.rule_type()) {
        return Err(Error::DuplicateRule {
          rule_type: rule.rule_type(),
        });
      }
    }
    Ok(Self { primary, overrides })
  }

  /// The built-in rule set, in its fixed order.
  pub fn standard(config: &ReviewConfig) -> Result<Self> {
    Self::new(rules::primary(config), rules::overrides(config))
  }

  pub fn primary(&self) -> &[Box<dyn DecisionRule>] { &self.primary }

  pub fn overrides(&self) -> &[Box<dyn DecisionRule>] { &self.overrides }

  pub fn evaluate(&self, event: &EditEvent) -> Result<Decision<'_>> {
    evaluate(event, &self.primary, &self.overrides)
  }
}

impl fmt::Debug for ReviewPipeline {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let types = |rules: &[Box<dyn DecisionRule>]| {
      rules.iter().map(|r| r.rule_type()).collect::<Vec<_>>()
    };
    f.debug_struct("ReviewPipeline")
      .field("primary", &types(&self.primary))
      .field("overrides", &types(&self.overrides))
      .finish()
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
