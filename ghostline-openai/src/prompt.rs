use ghostline_types::PredictorContext;
use serde_json::Value;

pub const SYSTEM_PROMPT: &str = r#"You are an inline completion engine for an interactive terminal. Given a user's partially typed command you must propose the most accurate continuation possible, leaning on the provided command history when relevant. Output only a single line containing the completed command. The line must:
- Start with the exact user input (do not change or reformat it).
- Append only the minimal additional characters needed to form a plausible next command.
- Contain no commentary, explanations, code fences, or markdown formatting.
- Avoid trailing whitespace or surrounding quotes.
If no meaningful continuation exists, return the user input unchanged."#;

pub fn build_user_payload(context: &PredictorContext) -> String {
    let mut payload = String::new();
    payload.push_str(&format!("Shell: {}\n", context.shell));
    payload.push_str(&format!("WorkingDirectory: {}\n", context.working_directory));
    if let Some(last) = &context.last_command {
        payload.push_str(&format!("LastCommand: {last}\n"));
    }

    if !context.history_excerpt.is_empty() {
        payload.push_str("RecentHistory:\n");
        for entry in &context.history_excerpt {
            payload.push_str("- ");
            payload.push_str(entry);
            payload.push('\n');
        }
    }

    payload.push_str("UserInput: ");
    payload.push_str(&context.partial_input);
    payload.push('\n');
    payload.push_str(
        "Return only the best single-line completion. The output must begin with the provided input and add characters at the end.",
    );
    payload
}

/// Pull the assistant text out of a chat-completions response.
pub fn extract_message_content(response: &Value) -> Option<String> {
    let choice = response.get("choices")?.get(0)?;
    let message = choice.get("message")?;
    collect_text_segments(message.get("content")?)
}

fn collect_text_segments(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.to_string()),
        Value::Array(items) => {
            let combined: String = items.iter().filter_map(collect_text_segments).collect();
            if combined.is_empty() {
                None
            } else {
                Some(combined)
            }
        }
        Value::Object(map) => ["text", "content", "value"]
            .iter()
            .find_map(|key| map.get(*key))
            .and_then(collect_text_segments),
        _ => None,
    }
}
