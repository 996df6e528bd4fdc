use crate::context::CompletionContext;

/// Complete a bare command name from the PATH executable list.
///
/// Only applies to the first, non path-like token. The returned line is the
/// input with the rest of the executable name appended.
pub fn match_command(
    input: &str,
    context: &CompletionContext,
    executables: &[String],
) -> Option<String> {
    if !context.is_first_token || context.path_like {
        return None;
    }
    let token = context.current_token.as_str();
    let name = executables
        .iter()
        .find(|name| name.len() > token.len() && name.starts_with(token))?;
    Some(format!("{input}{}", &name[token.len()..]))
}
