// src/config/validate.rs

use regex::Regex;

use crate::config::model::ConfigFile;
use crate::errors::{PlandagError, Result};

/// Run basic semantic validation against a loaded configuration.
///
/// This checks:
/// - `[state].max_age_days >= 1` and `[state].lock_timeout_ms >= 1`
/// - the research marker and both fallback agents are non-empty
/// - there is at least one research keyword and none is blank
/// - the keyword set compiles into a matcher
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    validate_state(cfg)?;
    validate_decompose(cfg)?;
    Ok(())
}

fn validate_state(cfg: &ConfigFile) -> Result<()> {
    if cfg.state.max_age_days == 0 {
        return Err(PlandagError::ConfigError(
            "[state].max_age_days must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.state.lock_timeout_ms == 0 {
        return Err(PlandagError::ConfigError(
            "[state].lock_timeout_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_decompose(cfg: &ConfigFile) -> Result<()> {
    let d = &cfg.decompose;

    let named = [
        ("research_marker", &d.research_marker),
        ("research_fallback", &d.research_fallback),
        ("implementation_fallback", &d.implementation_fallback),
    ];
    for (field, value) in named {
        if value.trim().is_empty() {
            return Err(PlandagError::ConfigError(format!(
                "[decompose].{field} must not be empty"
            )));
        }
    }

    if d.research_keywords.is_empty() {
        return Err(PlandagError::ConfigError(
            "[decompose].research_keywords must contain at least one keyword".to_string(),
        ));
    }
    if d.research_keywords.iter().any(|k| k.trim().is_empty()) {
        return Err(PlandagError::ConfigError(
            "[decompose].research_keywords must not contain blank entries".to_string(),
        ));
    }

    keyword_regex(&d.research_keywords)
        .map_err(|e| PlandagError::ConfigError(format!("invalid research keywords: {e}")))?;

    Ok(())
}

/// Substring matcher for any of `keywords`, lowercased.
///
/// Match it against lowercased text. Regex case folding is not used: it
/// would also fold characters like `ſ` that plain lowercasing leaves alone.
pub fn keyword_regex(keywords: &[String]) -> std::result::Result<Regex, regex::Error> {
    let alternation = keywords
        .iter()
        .map(|k| regex::escape(&k.trim().to_lowercase()))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?:{alternation})"))
}
