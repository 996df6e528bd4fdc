use super::Rejection;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Longest suffix accepted while the user is still typing the first word.
pub const MAX_SINGLE_TOKEN_SUFFIX: usize = 24;

/// Characters that could turn a completed word into a compound command.
const SHELL_METACHARACTERS: [char; 8] = ['|', '&', ';', '<', '>', '`', '\'', '"'];

static BUILTINS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        ".", "alias", "bg", "cd", "dirs", "echo", "eval", "exec", "exit", "export", "false",
        "fg", "history", "jobs", "popd", "pushd", "pwd", "read", "set", "source", "test", "true",
        "type", "unalias", "unset", "wait",
    ]
    .into_iter()
    .collect()
});

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(name)
}

/// First executable name of `line`, skipping a leading `sudo`.
pub fn primary_command(line: &str) -> Option<&str> {
    let mut tokens = line.split_whitespace();
    match tokens.next()? {
        "sudo" => tokens.next(),
        first => Some(first),
    }
}

/// Guard applied while the input is still a single bare word.
///
/// The model must only finish that word; anything that adds arguments or
/// shell syntax is refused.
pub fn check_single_token(cleaned: &str, suffix: &str) -> Result<(), Rejection> {
    if suffix.chars().any(char::is_whitespace) {
        return Err(Rejection::UnsafeSingleToken("suffix contains whitespace"));
    }
    if suffix.chars().count() > MAX_SINGLE_TOKEN_SUFFIX {
        return Err(Rejection::UnsafeSingleToken("suffix is too long"));
    }
    if cleaned.split_whitespace().count() > 1 {
        return Err(Rejection::UnsafeSingleToken("more than one token"));
    }
    if cleaned.contains(SHELL_METACHARACTERS) {
        return Err(Rejection::UnsafeSingleToken("shell metacharacter"));
    }
    Ok(())
}
