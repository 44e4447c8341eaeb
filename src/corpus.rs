use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// System turn baked into every training record. Must match what the chat
/// surface expects the tuned model to have been trained with.
pub const RECORD_SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Answer questions accurately based on the website content.";

/// One accepted question/answer pair from the synthesizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// The unit persisted to the corpus file, one JSON value per line. The
/// supervised fine-tuning endpoint requires exactly this chat shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingRecord {
    pub messages: Vec<Message>,
}

impl TrainingRecord {
    pub fn from_pair(pair: QaPair) -> Self {
        Self {
            messages: vec![
                Message {
                    role: Role::System,
                    content: RECORD_SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: Role::User,
                    content: pair.question,
                },
                Message {
                    role: Role::Assistant,
                    content: pair.answer,
                },
            ],
        }
    }
}

/// Wrap accepted pairs into training records, preserving order.
pub fn assemble(pairs: Vec<QaPair>) -> Vec<TrainingRecord> {
    pairs.into_iter().map(TrainingRecord::from_pair).collect()
}

/// Serialize records as line-delimited JSON: one self-contained value per
/// line, no surrounding array.
pub fn to_jsonl(records: &[TrainingRecord]) -> Result<String> {
    let lines: Vec<String> = records
        .iter()
        .map(serde_json::to_string)
        .collect::<std::result::Result<_, _>>()?;
    Ok(lines.join("\n"))
}

/// Write the corpus artifact, overwriting any prior file at the path.
pub fn write_corpus(path: &Path, records: &[TrainingRecord]) -> Result<()> {
    std::fs::write(path, to_jsonl(records)?)?;
    Ok(())
}

// ── Tests ──
