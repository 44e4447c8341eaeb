use crate::extract::ExtractedContent;

/// Serialize extracted pages into one prompt block. Field order is fixed and
/// the output is deterministic for identical input, since it is embedded
/// verbatim in the generation request.
pub fn format_content(contents: &[ExtractedContent]) -> String {
    let separator = format!("\n{}\n", "=".repeat(50));
    contents
        .iter()
        .map(format_one)
        .collect::<Vec<_>>()
        .join(&separator)
}

fn format_one(content: &ExtractedContent) -> String {
    let mut out = format!(
        "URL: {}\nContent Type: {}\nTitle: {}\n\n",
        content.url, content.content_type, content.title
    );

    if !content.meta_description.is_empty() {
        out.push_str(&format!("Description: {}\n\n", content.meta_description));
    }

    if !content.headings.is_empty() {
        out.push_str("Headings:\n");
        for heading in &content.headings {
            out.push_str(&format!("- {heading}\n"));
        }
        out.push('\n');
    }

    if !content.paragraphs.is_empty() {
        out.push_str(&format!("Content:\n{}\n\n", content.paragraphs.join("\n\n")));
    }

    if !content.list_items.is_empty() {
        out.push_str("Features/Services:\n");
        for item in &content.list_items {
            out.push_str(&format!("- {item}\n"));
        }
        out.push('\n');
    }

    out
}

// ── Tests ──
