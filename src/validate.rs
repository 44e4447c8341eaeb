use std::path::Path;

use serde_json::Value;
use tracing::warn;

use crate::error::{Error, Result};
use crate::sift::sift;

/// The fine-tuning endpoint rejects corpora smaller than this.
pub const MIN_EXAMPLES: usize = 10;

/// Re-parse the persisted corpus independently of whatever produced it and
/// return the valid-example count. Malformed lines are skipped and logged;
/// only a missing file or too few valid lines is fatal.
pub fn validate_corpus(path: &Path) -> Result<usize> {
    if !path.exists() {
        return Err(Error::NotFound(path.display().to_string()));
    }

    let content = std::fs::read_to_string(path)?;
    let lines: Vec<(usize, &str)> = content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .collect();

    if lines.len() < MIN_EXAMPLES {
        return Err(Error::InsufficientData(lines.len()));
    }

    let sifted = sift(lines, |(index, line)| {
        check_line(line).map_err(|reason| {
            Error::RecordParse(format!("line {}: {reason}", index + 1))
        })
    });

    for reason in &sifted.reasons {
        warn!("skipping {reason}");
    }

    if sifted.accepted.len() < MIN_EXAMPLES {
        return Err(Error::InsufficientData(sifted.accepted.len()));
    }

    Ok(sifted.accepted.len())
}

/// Structural check for one line: parseable JSON with a `messages` array of
/// at least two entries, containing at least one user and one assistant turn.
fn check_line(line: &str) -> std::result::Result<(), String> {
    let value: Value = serde_json::from_str(line).map_err(|e| e.to_string())?;

    let messages = value
        .get("messages")
        .and_then(Value::as_array)
        .ok_or("missing messages array")?;

    if messages.len() < 2 {
        return Err(format!("only {} messages", messages.len()));
    }

    let has_role = |role: &str| {
        messages
            .iter()
            .any(|m| m.get("role").and_then(Value::as_str) == Some(role))
    };
    if !has_role("user") || !has_role("assistant") {
        return Err("missing user or assistant message".into());
    }

    Ok(())
}

// ── Tests ──
