//! Core of the candidate database's edit history and moderation logic.
//!
//! Two pure, synchronous pieces live here:
//!
//! - [`history`] rebuilds the lineage of a person's versions, including the
//!   edges created when two people were merged.
//! - [`review`] decides whether an edit needs a moderator, by running an
//!   ordered list of rules.
//!
//! Loading versions and gathering the counts rules look at is the caller's
//! job; nothing in this crate does I/O.

pub mod config;
pub mod diff;
pub mod error;
pub mod history;
pub mod review;
pub mod version;

pub use config::ReviewConfig;
pub use error::{Error, Result};
pub use history::{ParentMap, VersionGraph, build_parent_map};
pub use review::{Decision, DecisionRule, ReviewPipeline, Verdict};
pub use version::{VersionSnapshot, parse_versions};
