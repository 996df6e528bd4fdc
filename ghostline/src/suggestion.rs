use crate::context::{CompletionContext, analyze};
use crate::sources::{DirectorySnapshot, match_command, match_filesystem, match_history};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionSource {
    History,
    Command,
    Filesystem,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionState {
    pub full: String,
    pub source: SuggestionSource,
}

impl SuggestionState {
    fn new(full: String, source: SuggestionSource) -> Self {
        Self { full, source }
    }
}

/// Tracks the line being typed on one pane and the single suggestion for it.
///
/// The active suggestion always strictly extends the input; anything else is
/// dropped before it can reach the screen.
#[derive(Debug, Default)]
pub struct SuggestionEngine {
    input: String,
    active: Option<SuggestionState>,
    history: Arc<Vec<String>>,
    executables: Arc<Vec<String>>,
    directory: Option<DirectorySnapshot>,
    cwd: String,
    home: Option<String>,
}

impl SuggestionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn on_char(&mut self, ch: char) {
        self.input.push(ch);
        self.retain_continuation();
    }

    pub fn on_backspace(&mut self) {
        if self.input.pop().is_some() {
            self.retain_continuation();
        }
    }

    /// Submit the line: returns it and starts a fresh one.
    pub fn on_enter(&mut self) -> String {
        self.active = None;
        std::mem::take(&mut self.input)
    }

    pub fn clear(&mut self) {
        self.input.clear();
        self.active = None;
    }

    pub fn clear_suggestion(&mut self) {
        self.active = None;
    }

    /// Ghost text: the part of the suggestion beyond what was typed.
    pub fn suggestion(&self) -> &str {
        match &self.active {
            Some(state) if is_continuation(&state.full, &self.input) => {
                &state.full[self.input.len()..]
            }
            _ => "",
        }
    }

    pub fn full_suggestion(&self) -> Option<&str> {
        self.active.as_ref().map(|state| state.full.as_str())
    }

    pub fn source(&self) -> Option<SuggestionSource> {
        self.active.as_ref().map(|state| state.source)
    }

    /// Take the suggestion: returns the text to insert and makes the full
    /// suggestion the new input. Without a suggestion nothing changes.
    pub fn accept(&mut self) -> String {
        let suffix = self.suggestion().to_string();
        if suffix.is_empty() {
            return suffix;
        }
        self.input.push_str(&suffix);
        self.active = None;
        suffix
    }

    /// Offer a candidate from any source. Returns whether it was taken.
    pub fn offer(&mut self, full: String, source: SuggestionSource) -> bool {
        if !is_continuation(&full, &self.input) {
            warn!(
                input = %self.input,
                candidate = %full,
                ?source,
                "dropping suggestion that does not extend the input"
            );
            return false;
        }
        self.active = Some(SuggestionState::new(full, source));
        true
    }

    /// Recompute the suggestion from the local sources.
    pub fn refresh_local(&mut self) -> Option<&SuggestionState> {
        self.active = self.local_candidate();
        self.active.as_ref()
    }

    /// Best local candidate by source priority.
    ///
    /// A bare first word prefers history, then PATH executables. Anything
    /// else prefers the filesystem and falls back to history.
    pub fn local_candidate(&self) -> Option<SuggestionState> {
        let input = self.input.as_str();
        let history = || {
            match_history(input, &self.history)
                .map(|full| SuggestionState::new(full, SuggestionSource::History))
        };
        let Some(context) = self.context() else {
            return history();
        };

        if context.is_first_token && !context.path_like {
            history().or_else(|| {
                match_command(input, &context, &self.executables)
                    .map(|full| SuggestionState::new(full, SuggestionSource::Command))
            })
        } else {
            match_filesystem(input, &context, self.directory.as_ref())
                .map(|full| SuggestionState::new(full, SuggestionSource::Filesystem))
                .or_else(history)
        }
    }

    pub fn context(&self) -> Option<CompletionContext> {
        analyze(&self.input, &self.cwd, self.home.as_deref())
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn set_history(&mut self, history: Vec<String>) {
        self.history = Arc::new(history);
    }

    pub fn set_executables(&mut self, executables: Vec<String>) {
        self.executables = Arc::new(executables);
    }

    pub fn directory(&self) -> Option<&DirectorySnapshot> {
        self.directory.as_ref()
    }

    pub fn set_directory(&mut self, snapshot: DirectorySnapshot) {
        self.directory = Some(snapshot);
    }

    pub fn working_directory(&self) -> &str {
        &self.cwd
    }

    pub fn set_working_directory(&mut self, cwd: String) {
        if cwd != self.cwd {
            self.directory = None;
        }
        self.cwd = cwd;
    }

    pub fn set_home(&mut self, home: String) {
        self.home = Some(home);
    }

    fn retain_continuation(&mut self) {
        if let Some(state) = &self.active
            && !is_continuation(&state.full, &self.input)
        {
            self.active = None;
        }
    }
}

fn is_continuation(full: &str, input: &str) -> bool {
    full.len() > input.len() && full.starts_with(input)
}
