use std::io::{BufRead, Write};

use tracing::error;

use crate::error::Result;
use crate::openai::{ApiFailure, ChatMessage, ChatRequest, ChatResponse, Client};

/// Guard rail for the tuned model: answer only from training data, admit
/// gaps instead of guessing.
const CHAT_SYSTEM_PROMPT: &str = "You are a helpful assistant answering questions about the \
    website content you were trained on.\n\n\
    IMPORTANT INSTRUCTIONS:\n\
    - Only answer questions based on information you were specifically trained on\n\
    - If you don't know something or weren't trained on specific information, say \
    \"I don't have that specific information in my training data\"\n\
    - Never make up or guess information\n\
    - Be accurate and only provide information you're confident about";

/// Factual answers over creative ones.
const CHAT_TEMPERATURE: f32 = 0.1;

/// Prepend the guard-rail system message unless the history already
/// carries one.
fn ensure_system_prompt(history: &mut Vec<ChatMessage>) {
    if !history.iter().any(|m| m.role == "system") {
        history.insert(0, ChatMessage::system(CHAT_SYSTEM_PROMPT));
    }
}

/// Map upstream failures to the distinct operator-facing messages; anything
/// unrecognized gets the generic one.
fn friendly_api_error(failure: &ApiFailure) -> &'static str {
    match failure.status {
        Some(401) => "Authentication failed. Check your API key configuration.",
        Some(404) => "Model not found. Check your fine-tuned model id.",
        Some(429) => "Rate limit reached. Please try again later.",
        _ => "An error occurred. Please try again.",
    }
}

/// Interactive loop against the fine-tuned model. Ends on `exit` or EOF.
pub async fn run(client: &Client, model: &str) -> Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let mut history: Vec<ChatMessage> = Vec::new();
    ensure_system_prompt(&mut history);

    println!("Chatting with {model}. Type 'exit' to quit.");
    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "exit" {
            break;
        }

        history.push(ChatMessage::user(input));
        let request = ChatRequest {
            model,
            messages: &history,
            temperature: Some(CHAT_TEMPERATURE),
            response_format: None,
        };

        match client.post_json::<_, ChatResponse>("/chat/completions", &request).await {
            Ok(response) => {
                let reply = response.content().unwrap_or_default().trim().to_string();
                println!("{reply}\n");
                history.push(ChatMessage::assistant(reply));
            }
            Err(failure) => {
                error!("chat request failed: {failure}");
                println!("{}\n", friendly_api_error(&failure));
                // Drop the unanswered turn so history matches what the
                // model has actually seen.
                history.pop();
            }
        }
    }

    Ok(())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_is_prepended_once() {
        let mut history = vec![ChatMessage::user("hello")];
        ensure_system_prompt(&mut history);
        ensure_system_prompt(&mut history);

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, "system");
        assert_eq!(history[1].role, "user");
    }

    #[test]
    fn existing_system_message_is_kept() {
        let mut history = vec![ChatMessage::system("custom"), ChatMessage::user("hello")];
        ensure_system_prompt(&mut history);

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "custom");
    }

    #[test]
    fn upstream_statuses_map_to_distinct_messages() {
        let failure = |status| ApiFailure {
            status: Some(status),
            message: String::new(),
        };
        assert!(friendly_api_error(&failure(401)).contains("Authentication"));
        assert!(friendly_api_error(&failure(404)).contains("Model not found"));
        assert!(friendly_api_error(&failure(429)).contains("Rate limit"));
        assert_eq!(
            friendly_api_error(&failure(500)),
            "An error occurred. Please try again."
        );
        assert_eq!(
            friendly_api_error(&ApiFailure {
                status: None,
                message: "connection refused".into()
            }),
            "An error occurred. Please try again."
        );
    }
}
