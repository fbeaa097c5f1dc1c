//! Review configuration loading.

use std::path::Path;

use anyhow::{Context as _, Result};
use hustings_core::ReviewConfig;

/// Layer `HUSTINGS_*` environment variables over the (optional) TOML file at
/// `path`. Missing keys fall back to [`ReviewConfig::default`].
pub fn load(path: &Path) -> Result<ReviewConfig> {
  let settings = config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix("HUSTINGS")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("bot_usernames")
        .with_list_parse_key("no_review_action_types"),
    )
    .build()
    .with_context(|| format!("failed to read config file {}", path.display()))?;

  let config: ReviewConfig = settings
    .try_deserialize()
    .context("failed to deserialise ReviewConfig")?;
  tracing::debug!(?config, "loaded review config");
  Ok(config)
}
