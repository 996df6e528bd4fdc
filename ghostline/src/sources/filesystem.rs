use crate::context::CompletionContext;
use ghostline_types::DirEntry;

/// Listing of one absolute directory, keyed by the path it was requested for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectorySnapshot {
    pub path: String,
    pub entries: Vec<DirEntry>,
}

impl DirectorySnapshot {
    pub fn new(path: impl Into<String>, entries: Vec<DirEntry>) -> Self {
        Self {
            path: path.into(),
            entries,
        }
    }
}

/// Complete a file name inside the context's target directory.
///
/// Requires a snapshot for exactly that directory and a non-empty prefix.
/// Directories get a trailing `/`. The appended text is quoted to match the
/// token, so `my\ fi` continues as `le.txt` and `my` as `\ file.txt`.
pub fn match_filesystem(
    input: &str,
    context: &CompletionContext,
    snapshot: Option<&DirectorySnapshot>,
) -> Option<String> {
    let target = context.target_directory.as_deref()?;
    let snapshot = snapshot.filter(|snapshot| snapshot.path == target)?;
    let prefix = context.file_prefix.as_str();
    if prefix.is_empty() {
        return None;
    }

    snapshot.entries.iter().find_map(|entry| {
        let rest = entry.name.strip_prefix(prefix)?;
        let suffix = if entry.is_directory {
            format!("{rest}/")
        } else {
            rest.to_string()
        };
        if suffix.is_empty() {
            return None;
        }
        Some(format!("{input}{}", context.escape_completion(&suffix)))
    })
}
