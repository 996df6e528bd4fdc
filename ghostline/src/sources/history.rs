/// Most recent history entry that extends the whole input line.
///
/// `history` is in execution order, so the scan runs from the end.
pub fn match_history(input: &str, history: &[String]) -> Option<String> {
    if input.is_empty() {
        return None;
    }
    history
        .iter()
        .rev()
        .find(|entry| entry.len() > input.len() && entry.starts_with(input))
        .cloned()
}
