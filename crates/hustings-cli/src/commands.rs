//! Subcommand implementations. Each reads its input file, runs the core and
//! prints JSON to stdout.

use std::path::Path;

use anyhow::{Context as _, Result, bail};
use hustings_core::{
  Decision, ReviewConfig, ReviewPipeline, VersionGraph, parse_versions,
  review::{
    event::EditEvent,
    rules::{RuleInfo, lookup},
  },
};
use serde::Serialize;

// ─── history ──────────────────────────────────────────────────────────────────

pub fn history(path: &Path, diffs: bool) -> Result<()> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading versions from {}", path.display()))?;
  println!("{}", history_json(&raw, diffs)?);
  Ok(())
}

/// The parent map, or every version's diffs, of an export as pretty JSON.
pub fn history_json(raw: &str, diffs: bool) -> Result<String> {
  let versions = parse_versions(raw).context("parsing versions")?;
  let count = versions.len();
  let graph = VersionGraph::build(versions).context("reconciling history")?;

  tracing::info!(
    versions = count,
    merges = graph.parent_map().merges().count(),
    person = graph.canonical_entity_id().unwrap_or("-"),
    "history reconciled"
  );

  let out = if diffs {
    serde_json::to_string_pretty(&graph.diffs())?
  } else {
    serde_json::to_string_pretty(graph.parent_map())?
  };
  Ok(out)
}

// ─── review ───────────────────────────────────────────────────────────────────

/// What gets stored in the moderation queue.
#[derive(Debug, Serialize, PartialEq)]
pub struct Outcome {
  pub verdict:   hustings_core::Verdict,
  pub rule_type: Option<&'static str>,
  pub reason:    Option<String>,
}

impl Outcome {
  pub fn new(decision: &Decision<'_>, event: &EditEvent) -> Self {
    Self {
      verdict:   decision.verdict,
      rule_type: decision.rule_type(),
      reason:    decision.reason(event),
    }
  }
}

pub fn review(path: &Path, config: &ReviewConfig) -> Result<()> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading edit event from {}", path.display()))?;
  let event: EditEvent =
    serde_json::from_str(&raw).context("parsing edit event")?;
  let pipeline =
    ReviewPipeline::standard(config).context("building review pipeline")?;

  match pipeline.evaluate(&event) {
    Ok(decision) => {
      println!(
        "{}",
        serde_json::to_string_pretty(&Outcome::new(&decision, &event))?
      );
      Ok(())
    }
    Err(e) => {
      let forced = Decision::or_flag(Err(e));
      println!(
        "{}",
        serde_json::to_string_pretty(&Outcome::new(&forced, &event))?
      );
      bail!("review evaluation failed; edit forced into review")
    }
  }
}

// ─── rules ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, PartialEq)]
pub struct RuleRow {
  pub rule_type: &'static str,
  pub label:     &'static str,
  pub stage:     &'static str,
}

pub fn rules(config: &ReviewConfig, rule_type: Option<&str>) -> Result<()> {
  let out = match rule_type {
    Some(rule_type) => serde_json::to_string_pretty(describe_rule(rule_type)?)?,
    None => {
      let pipeline =
        ReviewPipeline::standard(config).context("building review pipeline")?;
      serde_json::to_string_pretty(&rule_rows(&pipeline))?
    }
  };
  println!("{out}");
  Ok(())
}

/// Primary rules first, then overrides, each in evaluation order.
pub fn rule_rows(pipeline: &ReviewPipeline) -> Vec<RuleRow> {
  pipeline
    .primary()
    .iter()
    .map(|r| (r, "primary"))
    .chain(pipeline.overrides().iter().map(|r| (r, "override")))
    .map(|(r, stage)| RuleRow {
      rule_type: r.rule_type(),
      label: r.label(),
      stage,
    })
    .collect()
}

/// Label of a stored rule key.
pub fn describe_rule(rule_type: &str) -> Result<&'static RuleInfo> {
  match lookup(rule_type) {
    Some(info) => Ok(info),
    None => bail!("unknown rule type {rule_type:?}"),
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use hustings_core::{
    Verdict,
    review::{
      event::{ActionType, Actor},
      rules::{FIRST_EDITS, PREVIOUSLY_APPROVED},
    },
  };
  use serde_json::json;

  use super::*;

  fn event(edit_count: u32) -> EditEvent {
    let mut event: EditEvent = serde_json::from_value(json!({
      "action_type": "person-update",
      "occurred_at": "2024-05-01T09:30:00Z",
    }))
    .unwrap();
    event.user = Some(Actor {
      username: "newbie".into(),
      edit_count,
      very_trusted: false,
      approved_edits_of_flagged_type: 0,
    });
    event
  }

  #[test]
  fn outcome_carries_rule_and_reason() {
    let pipeline = ReviewPipeline::standard(&ReviewConfig::default()).unwrap();
    let event = event(1);
    let decision = pipeline.evaluate(&event).unwrap();
    let outcome = Outcome::new(&decision, &event);

    assert_eq!(outcome.verdict, Verdict::NeedsReview);
    assert_eq!(outcome.rule_type, Some(FIRST_EDITS.rule_type));
    assert_eq!(
      serde_json::to_value(&outcome).unwrap(),
      json!({
        "verdict": "needs_review",
        "rule_type": "needs_review_due_to_first_edits",
        "reason": "One of the first 3 edits of user newbie",
      })
    );
  }

  #[test]
  fn default_outcome_has_no_rule() {
    let pipeline = ReviewPipeline::standard(&ReviewConfig::default()).unwrap();
    let event = event(10);
    assert_eq!(event.action_type, ActionType::PersonUpdate);
    let decision = pipeline.evaluate(&event).unwrap();
    assert_eq!(Outcome::new(&decision, &event), Outcome {
      verdict:   Verdict::NoReviewNeeded,
      rule_type: None,
      reason:    None,
    });
  }

  const EXPORT: &str = r#"[
    {
      "version_id": "b2",
      "timestamp": "2015-05-08T09:00:00",
      "information_source": "After merging person 4322",
      "data": { "id": "2009", "name": "Tessa Jowell", "email": "t@example.com" }
    },
    {
      "version_id": "a1",
      "timestamp": "2015-05-07T08:00:00",
      "information_source": "Imported",
      "data": { "id": "4322", "email": "t@example.com" }
    },
    {
      "version_id": "b1",
      "timestamp": "2015-05-06T07:00:00",
      "information_source": "New person",
      "data": { "id": "2009", "name": "Tessa Jowell" }
    }
  ]"#;

  #[test]
  fn history_prints_parent_map() {
    let out: serde_json::Value =
      serde_json::from_str(&history_json(EXPORT, false).unwrap()).unwrap();
    assert_eq!(
      out,
      json!({ "a1": [], "b1": [], "b2": ["b1", "a1"] })
    );
  }

  #[test]
  fn history_diffs_are_newest_first() {
    let out: serde_json::Value =
      serde_json::from_str(&history_json(EXPORT, true).unwrap()).unwrap();
    let diffs = out.as_array().unwrap();
    assert_eq!(diffs.len(), 3);
    assert_eq!(diffs[0]["version_id"], "b2");
    assert_eq!(diffs[0]["parent_diffs"].as_array().unwrap().len(), 2);
  }

  #[test]
  fn bogus_history_error_names_the_step() {
    let raw = r#"[
      { "version_id": "a1", "timestamp": "2015-05-07T08:00:00",
        "information_source": "Imported", "data": { "id": "4322" } },
      { "version_id": "b1", "timestamp": "2015-05-06T07:00:00",
        "information_source": "New person", "data": { "id": "2009" } }
    ]"#;
    let err = history_json(raw, false).unwrap_err();
    let chain = format!("{err:#}");
    assert!(chain.starts_with("reconciling history: "), "{chain}");
    assert!(chain.contains("bogus merge version"), "{chain}");
  }

  #[test]
  fn rule_rows_list_primary_before_overrides() {
    let pipeline = ReviewPipeline::standard(&ReviewConfig::default()).unwrap();
    let rows = rule_rows(&pipeline);
    assert_eq!(rows.len(), 10);
    let first_override = rows.iter().position(|r| r.stage == "override").unwrap();
    assert_eq!(first_override, 9);
    assert_eq!(rows[9].rule_type, PREVIOUSLY_APPROVED.rule_type);
    assert!(rows[..9].iter().all(|r| r.stage == "primary"));
  }

  #[test]
  fn describe_rule_resolves_stored_keys() {
    assert_eq!(
      describe_rule("needs_review_due_to_first_edits").unwrap().label,
      FIRST_EDITS.label
    );
    let err = describe_rule("no_such_rule").unwrap_err();
    assert!(err.to_string().contains("no_such_rule"));
  }
}
