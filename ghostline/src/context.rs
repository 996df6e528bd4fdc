//! Lexical analysis of the partially typed command line.
//!
//! The line is never complete while the user is typing, so the scanner
//! tolerates unterminated quotes and a trailing backslash. Only the token
//! under the cursor (always the last one) matters for completion.

/// Structured view of the token being completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionContext {
    /// Raw text after the last unquoted, unescaped whitespace.
    pub current_token: String,
    /// True when nothing but whitespace precedes the current token.
    pub is_first_token: bool,
    /// Token starts with `.`, `~` or `/`, or contains `/`.
    pub path_like: bool,
    /// Absolute directory (with a trailing `/`) the token points into.
    pub target_directory: Option<String>,
    /// Part of the unescaped token after its last `/`.
    pub file_prefix: String,
}

impl CompletionContext {
    /// The current token with quotes and escapes removed, as the shell would
    /// see the word.
    pub fn unescaped_token(&self) -> String {
        unescape_word(&self.current_token)
    }

    /// Quote `text` so that appending it to the current token adds exactly
    /// those characters to the word.
    pub fn escape_completion(&self, text: &str) -> String {
        match open_quote(&self.current_token) {
            Some('\'') => text.replace('\'', "'\\''"),
            Some(_) => backslash_escape(text, |ch| matches!(ch, '"' | '\\' | '$' | '`')),
            None => backslash_escape(text, |ch| {
                ch.is_whitespace() || SHELL_SPECIAL.contains(&ch)
            }),
        }
    }
}

fn backslash_escape(text: &str, special: impl Fn(char) -> bool) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if special(ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

const SHELL_SPECIAL: [char; 17] = [
    '\\', '\'', '"', '`', '$', '&', '|', ';', '<', '>', '(', ')', '*', '?', '[', ']', '#',
];

/// Analyze `input` for completion.
///
/// `cwd` resolves relative paths and `home` resolves a leading `~/`. Returns
/// `None` when the current token is empty, e.g. the line ends in whitespace.
pub fn analyze(input: &str, cwd: &str, home: Option<&str>) -> Option<CompletionContext> {
    let start = token_start(input);
    let current_token = &input[start..];
    if current_token.is_empty() {
        return None;
    }

    let mut context = CompletionContext {
        current_token: current_token.to_string(),
        is_first_token: input[..start].trim().is_empty(),
        path_like: is_path_like(current_token),
        target_directory: None,
        file_prefix: String::new(),
    };
    let (target_directory, file_prefix) =
        resolve_file_context(&context.unescaped_token(), cwd, home);
    context.target_directory = target_directory;
    context.file_prefix = file_prefix;
    Some(context)
}

/// Byte offset at which the last token starts.
fn token_start(input: &str) -> usize {
    let mut in_single = false;
    let mut in_double = false;
    let mut escaped = false;
    let mut start = 0;

    for (idx, ch) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if !in_single => escaped = true,
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            c if c.is_whitespace() && !in_single && !in_double => start = idx + c.len_utf8(),
            _ => {}
        }
    }
    start
}

fn is_path_like(token: &str) -> bool {
    token.starts_with(['.', '~', '/']) || token.contains('/')
}

/// `word` is the token with quotes and escapes already removed.
fn resolve_file_context(word: &str, cwd: &str, home: Option<&str>) -> (Option<String>, String) {
    match word.rfind('/') {
        Some(idx) => {
            let (dir, prefix) = word.split_at(idx + 1);
            (resolve_directory(dir, cwd, home), prefix.to_string())
        }
        None => (resolve_directory("", cwd, home), word.to_string()),
    }
}

fn resolve_directory(dir: &str, cwd: &str, home: Option<&str>) -> Option<String> {
    if let Some(rest) = dir.strip_prefix('~') {
        // `~user/` would need a passwd lookup
        if !rest.is_empty() && !rest.starts_with('/') {
            return None;
        }
        let home = home?.trim_end_matches('/');
        return Some(format!("{home}{rest}"));
    }
    if dir.starts_with('/') {
        return Some(dir.to_string());
    }
    if cwd.is_empty() {
        return None;
    }
    Some(format!("{}/{}", cwd.trim_end_matches('/'), dir))
}

/// Quote the word is still inside at its end, if any.
fn open_quote(word: &str) -> Option<char> {
    let mut in_single = false;
    let mut in_double = false;
    let mut escaped = false;

    for ch in word.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if !in_single => escaped = true,
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            _ => {}
        }
    }
    if in_single {
        Some('\'')
    } else if in_double {
        Some('"')
    } else {
        None
    }
}

fn unescape_word(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut in_single = false;
    let mut in_double = false;
    let mut escaped = false;

    for ch in word.chars() {
        if escaped {
            out.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            '\\' if !in_single => escaped = true,
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            _ => out.push(ch),
        }
    }
    out
}
