use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::corpus::QaPair;
use crate::error::{Error, Result};
use crate::openai::{ChatMessage, ChatRequest, ChatResponse, Client};
use crate::sift::{sift, Sifted};

/// Fixed per-token rates for the generation model, dollars per million.
const INPUT_RATE_PER_MTOK: f64 = 1.25;
const OUTPUT_RATE_PER_MTOK: f64 = 10.0;

const SYNTH_SYSTEM_PROMPT: &str = "You are an expert at creating training data for AI chatbots. \
    Always return valid JSON. Output your final JSON response directly without any reasoning or explanation.";

/// Result of one generation call: accepted pairs, dropped-item count, and
/// the dollar cost of the call.
pub struct Synthesis {
    pub pairs: Vec<QaPair>,
    pub discarded: usize,
    pub cost: f64,
}

/// Ask the generation model for `count` Q&A pairs grounded in the formatted
/// content block. One request; any transport, auth, or parse failure aborts
/// the run. Individual malformed pairs are dropped, not fatal.
pub async fn synthesize(
    client: &Client,
    model: &str,
    content_block: &str,
    count: usize,
) -> Result<Synthesis> {
    let user_prompt = build_request_prompt(content_block, count);
    let messages = [
        ChatMessage::system(SYNTH_SYSTEM_PROMPT),
        ChatMessage::user(user_prompt),
    ];
    let request = ChatRequest {
        model,
        messages: &messages,
        temperature: None,
        response_format: Some(output_schema()),
    };

    let response: ChatResponse = client
        .post_json("/chat/completions", &request)
        .await
        .map_err(|e| Error::Generation(e.to_string()))?;

    let cost = response
        .usage
        .as_ref()
        .map(|u| request_cost(u.prompt_tokens, u.completion_tokens))
        .unwrap_or(0.0);

    let content = response
        .content()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| Error::Generation("no content generated in response".into()))?;

    let sifted = parse_generated(content)?;
    if sifted.skipped > 0 {
        warn!("discarded {} generated pairs with missing fields", sifted.skipped);
    }
    info!("generated {} training examples", sifted.accepted.len());

    Ok(Synthesis {
        pairs: sifted.accepted,
        discarded: sifted.skipped,
        cost,
    })
}

/// Cost of one call from reported token usage.
pub fn request_cost(prompt_tokens: u64, completion_tokens: u64) -> f64 {
    (prompt_tokens as f64 * INPUT_RATE_PER_MTOK + completion_tokens as f64 * OUTPUT_RATE_PER_MTOK)
        / 1_000_000.0
}

fn build_request_prompt(content_block: &str, count: usize) -> String {
    format!(
        "Based on the website content below, generate {count} diverse, natural Q&A pairs \
         for training a customer service chatbot.\n\n\
         Website Content:\n{content_block}\n\n\
         Create varied questions a real customer might ask, including:\n\
         - Company/business information\n\
         - Services or products offered\n\
         - Contact and support questions\n\
         - General greetings and conversational questions\n\
         - FAQ-style questions\n\n\
         Make questions natural and human-like. Generate accurate answers based ONLY on the \
         provided website content. Keep answers concise but informative.\n\n\
         Return a JSON object with a \"training_data\" array containing the Q&A pairs."
    )
}

/// Structured-output constraint: a single object holding a `training_data`
/// array of question/answer pairs. Downstream parsing assumes compliance.
fn output_schema() -> serde_json::Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "training_data_generation",
            "schema": {
                "type": "object",
                "properties": {
                    "training_data": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "question": {
                                    "type": "string",
                                    "description": "A natural question a customer might ask"
                                },
                                "answer": {
                                    "type": "string",
                                    "description": "An accurate answer based on the website content"
                                }
                            },
                            "required": ["question", "answer"]
                        }
                    }
                },
                "required": ["training_data"]
            }
        }
    })
}

#[derive(Deserialize)]
struct GeneratedBatch {
    #[serde(default)]
    training_data: Vec<CandidatePair>,
}

#[derive(Deserialize)]
struct CandidatePair {
    #[serde(default)]
    question: String,
    #[serde(default)]
    answer: String,
}

/// Parse the model's JSON text and keep only pairs with both fields
/// non-empty. The batch itself failing to parse is fatal.
fn parse_generated(content: &str) -> Result<Sifted<QaPair, &'static str>> {
    let batch: GeneratedBatch = serde_json::from_str(content)
        .map_err(|e| Error::Generation(format!("generated content is not valid JSON: {e}")))?;

    Ok(sift(batch.training_data, |item| {
        if item.question.is_empty() {
            return Err("empty question");
        }
        if item.answer.is_empty() {
            return Err("empty answer");
        }
        Ok(QaPair {
            question: item.question,
            answer: item.answer,
        })
    }))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_batch_is_fully_accepted() {
        let content = serde_json::to_string(&json!({
            "training_data": (0..5).map(|n| json!({
                "question": format!("Question {n}?"),
                "answer": format!("Answer {n}.")
            })).collect::<Vec<_>>()
        }))
        .unwrap();

        let sifted = parse_generated(&content).unwrap();
        assert_eq!(sifted.accepted.len(), 5);
        assert_eq!(sifted.skipped, 0);
    }

    #[test]
    fn pair_with_empty_answer_is_dropped() {
        let content = r#"{"training_data":[
            {"question":"What do you offer?","answer":"Web development."},
            {"question":"Where are you based?","answer":""},
            {"answer":"An orphaned answer."}
        ]}"#;

        let sifted = parse_generated(content).unwrap();
        assert_eq!(sifted.accepted.len(), 1);
        assert_eq!(sifted.skipped, 2);
        assert_eq!(sifted.accepted[0].question, "What do you offer?");
        assert!(sifted.reasons.contains(&"empty answer"));
        assert!(sifted.reasons.contains(&"empty question"));
    }

    #[test]
    fn unparseable_content_is_a_generation_error() {
        let result = parse_generated("Sure! Here are your Q&A pairs: ...");
        assert!(matches!(result, Err(Error::Generation(_))));
    }

    #[test]
    fn missing_training_data_array_yields_empty_batch() {
        let sifted = parse_generated("{}").unwrap();
        assert!(sifted.accepted.is_empty());
    }

    #[test]
    fn cost_uses_fixed_per_token_rates() {
        assert_eq!(request_cost(1_000_000, 0), 1.25);
        assert_eq!(request_cost(0, 1_000_000), 10.0);
        let cost = request_cost(200_000, 50_000);
        assert!((cost - 0.75).abs() < 1e-9);
    }

    #[test]
    fn request_prompt_embeds_content_and_count() {
        let prompt = build_request_prompt("URL: https://acme.test/", 50);
        assert!(prompt.contains("generate 50 diverse"));
        assert!(prompt.contains("URL: https://acme.test/"));
        assert!(prompt.contains("based ONLY on the provided website content"));
    }

    #[test]
    fn output_schema_requires_both_fields() {
        let schema = output_schema();
        assert_eq!(schema["type"], "json_schema");
        assert_eq!(
            schema["json_schema"]["schema"]["properties"]["training_data"]["items"]["required"],
            json!(["question", "answer"])
        );
    }
}
