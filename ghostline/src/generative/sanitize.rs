const QUOTES: [char; 3] = ['"', '\'', '`'];
const FENCE: &str = "```";

/// Reduce raw model output to a single candidate line.
///
/// Keeps only the first line, unwrapping a fenced block to its first inner
/// line, and strips one leading and one trailing quote character.
pub fn clean_response(raw: &str) -> String {
    let mut text = raw.trim_start_matches(['\r', '\n']);
    if let Some(after) = text.strip_prefix(FENCE) {
        text = match after.split_once('\n') {
            Some((_lang, body)) => body,
            None => after,
        };
    }

    let line = text.lines().next().unwrap_or_default().trim_end();
    let line = line.strip_suffix(FENCE).unwrap_or(line);
    let line = line.strip_prefix(QUOTES).unwrap_or(line);
    let line = line.strip_suffix(QUOTES).unwrap_or(line);
    line.to_string()
}
