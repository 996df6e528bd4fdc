//! Event router: feeds keystrokes to the suggestion engine and the
//! generative engine for one terminal pane.
//!
//! All state is mutated on the caller's event path. Slow work (snapshot
//! refresh, directory listings, model queries, debounce timers) runs on
//! spawned tasks that report back through [`RouterMessage`]s; every response
//! is re-checked against the live input before it is applied.

use crate::collaborator::Collaborator;
use crate::config::GhostConfig;
use crate::generative::{GenerativeEngine, PendingQuery, QueryOutcome, Rejection, Trigger, evaluate};
use crate::sources::DirectorySnapshot;
use crate::suggestion::{SuggestionEngine, SuggestionSource};
use ghostline_types::{DirEntry, PredictorContext, SessionId};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Which sources produce suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// History, command names and the filesystem only.
    History,
    /// The generative model only.
    #[serde(alias = "llm")]
    Model,
    /// Local sources first; the model fills in when they have nothing.
    #[default]
    Hybrid,
}

impl std::str::FromStr for SourceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "history" => Ok(SourceMode::History),
            "model" | "llm" => Ok(SourceMode::Model),
            "hybrid" => Ok(SourceMode::Hybrid),
            _ => Err(format!(
                "Invalid source mode: {s}. Valid modes are: history, model, hybrid"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Backspace,
    Submit,
    Accept,
    Clear,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyOutcome {
    /// Suffix taken from the suggestion and forwarded to the session.
    pub accepted: Option<String>,
    /// Line handed over on submit.
    pub submitted: Option<String>,
}

/// Results of background work, delivered back to the event path.
#[derive(Debug)]
pub enum RouterMessage {
    History(Vec<String>),
    Executables(Vec<String>),
    Home(String),
    WorkingDirectory(String),
    /// Listing for `query.directory`, requested while the line read
    /// `query.input`. `None` when the listing failed.
    Directory {
        query: PendingQuery,
        entries: Option<Vec<DirEntry>>,
    },
    DebounceElapsed {
        generation: u64,
    },
    Generative {
        query: PendingQuery,
        verdict: Result<String, Rejection>,
    },
}

pub struct EventRouter {
    session: SessionId,
    mode: SourceMode,
    config: GhostConfig,
    engine: SuggestionEngine,
    generative: GenerativeEngine,
    collaborator: Arc<dyn Collaborator>,
    tx: UnboundedSender<RouterMessage>,
    rx: UnboundedReceiver<RouterMessage>,
    debounce: Option<JoinHandle<()>>,
    /// Bumped on every input change; a debounce tick from an older
    /// generation is ignored.
    generation: u64,
    inflight: Option<JoinHandle<()>>,
    pending_listing: Option<PendingQuery>,
    refreshers: Vec<JoinHandle<()>>,
    closed: bool,
}

impl EventRouter {
    pub fn new(session: SessionId, collaborator: Arc<dyn Collaborator>, config: GhostConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            session,
            mode: config.mode,
            config,
            engine: SuggestionEngine::new(),
            generative: GenerativeEngine::new(),
            collaborator,
            tx,
            rx,
            debounce: None,
            generation: 0,
            inflight: None,
            pending_listing: None,
            refreshers: Vec::new(),
            closed: false,
        }
    }

    /// Start the periodic snapshot refresh and fetch the working directory.
    pub fn start(&mut self) {
        let collaborator = self.collaborator.clone();
        let tx = self.tx.clone();
        let period = self.config.history_refresh();
        self.refreshers.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                match collaborator.get_history().await {
                    Ok(history) => {
                        if tx.send(RouterMessage::History(history)).is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!("history refresh failed: {err:#}"),
                }
            }
        }));

        let collaborator = self.collaborator.clone();
        let tx = self.tx.clone();
        let period = self.config.path_refresh();
        self.refreshers.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                match collaborator.get_home_directory().await {
                    Ok(home) => {
                        if tx.send(RouterMessage::Home(home)).is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!("home directory lookup failed: {err:#}"),
                }
                match collaborator.get_path_executables().await {
                    Ok(executables) => {
                        if tx.send(RouterMessage::Executables(executables)).is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!("PATH refresh failed: {err:#}"),
                }
            }
        }));

        self.refresh_working_directory();
    }

    /// Abort timers and background tasks. Messages still queued are ignored.
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.cancel_debounce();
        if let Some(task) = self.inflight.take() {
            task.abort();
        }
        for task in self.refreshers.drain(..) {
            task.abort();
        }
        debug!("router for session {} shut down", self.session);
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn mode(&self) -> SourceMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: SourceMode) {
        if self.mode != mode {
            debug!(?mode, "source mode changed");
            self.mode = mode;
            self.on_input_changed();
        }
    }

    pub fn input(&self) -> &str {
        self.engine.input()
    }

    /// Text to draw after the cursor.
    pub fn ghost_text(&self) -> &str {
        self.engine.suggestion()
    }

    pub fn full_suggestion(&self) -> Option<&str> {
        self.engine.full_suggestion()
    }

    pub fn source(&self) -> Option<SuggestionSource> {
        self.engine.source()
    }

    pub fn engine(&self) -> &SuggestionEngine {
        &self.engine
    }

    pub fn generative(&self) -> &GenerativeEngine {
        &self.generative
    }

    pub async fn handle_key(&mut self, key: KeyInput) -> KeyOutcome {
        match key {
            KeyInput::Char(ch) => {
                self.engine.on_char(ch);
                self.on_input_changed();
                KeyOutcome::default()
            }
            KeyInput::Backspace => {
                self.engine.on_backspace();
                self.on_input_changed();
                KeyOutcome::default()
            }
            KeyInput::Submit => {
                self.reset_line();
                let line = self.engine.on_enter();
                self.refresh_working_directory();
                KeyOutcome {
                    submitted: Some(line),
                    ..Default::default()
                }
            }
            KeyInput::Accept => {
                let suffix = self.engine.accept();
                if suffix.is_empty() {
                    return KeyOutcome::default();
                }
                self.generation += 1;
                self.cancel_debounce();
                self.generative.clear_current();
                if let Err(err) = self.collaborator.write_to_session(self.session, &suffix).await {
                    warn!("failed to forward accepted text to {}: {err:#}", self.session);
                }
                KeyOutcome {
                    accepted: Some(suffix),
                    ..Default::default()
                }
            }
            KeyInput::Clear => {
                self.reset_line();
                self.engine.clear();
                KeyOutcome::default()
            }
        }
    }

    /// Wait for the next background result. Never yields `None` while the
    /// router is alive since it keeps a sender itself.
    pub async fn next_message(&mut self) -> Option<RouterMessage> {
        self.rx.recv().await
    }

    /// Apply every message that is already queued. Returns how many were
    /// handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.rx.try_recv() {
            self.handle_message(message);
            handled += 1;
        }
        handled
    }

    pub fn handle_message(&mut self, message: RouterMessage) {
        if self.closed {
            return;
        }
        match message {
            RouterMessage::History(history) => {
                debug!("history snapshot: {} entries", history.len());
                self.engine.set_history(history);
            }
            RouterMessage::Executables(executables) => {
                debug!("PATH snapshot: {} executables", executables.len());
                self.engine.set_executables(executables);
            }
            RouterMessage::Home(home) => self.engine.set_home(home),
            RouterMessage::WorkingDirectory(cwd) => self.engine.set_working_directory(cwd),
            RouterMessage::Directory { query, entries } => self.on_listing(query, entries),
            RouterMessage::DebounceElapsed { generation } => {
                if generation != self.generation {
                    return;
                }
                self.debounce = None;
                if self.wants_generative() {
                    self.fire_generative();
                }
            }
            RouterMessage::Generative { query, verdict } => self.on_generative(query, verdict),
        }
    }

    fn on_input_changed(&mut self) {
        self.generation += 1;
        self.cancel_debounce();
        match self.mode {
            SourceMode::History => {
                self.request_listing();
                self.recompute_local();
            }
            SourceMode::Model => self.request_generative(),
            SourceMode::Hybrid => {
                self.request_listing();
                if !self.recompute_local() {
                    self.request_generative();
                }
            }
        }
    }

    fn reset_line(&mut self) {
        self.generation += 1;
        self.cancel_debounce();
        self.generative.clear_current();
        self.pending_listing = None;
    }

    /// Offer the best local candidate. Without one, a model suggestion that
    /// still extends the input is kept.
    fn recompute_local(&mut self) -> bool {
        match self.engine.local_candidate() {
            Some(state) => self.engine.offer(state.full, state.source),
            None => {
                if self.mode == SourceMode::History
                    || self.engine.source() != Some(SuggestionSource::Model)
                {
                    self.engine.clear_suggestion();
                }
                false
            }
        }
    }

    fn wants_generative(&self) -> bool {
        match self.mode {
            SourceMode::History => false,
            SourceMode::Model => true,
            SourceMode::Hybrid => matches!(self.engine.source(), None | Some(SuggestionSource::Model)),
        }
    }

    /// Offer a cached verdict right away, otherwise wait for the input to
    /// settle.
    fn request_generative(&mut self) {
        let input = self.engine.input();
        if input.trim().is_empty() {
            self.drop_model_suggestion();
            return;
        }
        match self.generative.cached(input) {
            Some(hit) => {
                let hit = hit.map(str::to_string);
                self.apply_generative(hit);
            }
            None => self.arm_debounce(),
        }
    }

    fn arm_debounce(&mut self) {
        self.cancel_debounce();
        let generation = self.generation;
        let delay = self.config.debounce();
        let tx = self.tx.clone();
        self.debounce = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(RouterMessage::DebounceElapsed { generation });
        }));
    }

    fn cancel_debounce(&mut self) {
        if let Some(timer) = self.debounce.take() {
            timer.abort();
        }
    }

    fn fire_generative(&mut self) {
        let input = self.engine.input().to_string();
        if input.trim().is_empty() {
            return;
        }
        match self.generative.trigger(&input, self.engine.working_directory()) {
            Trigger::Cached(hit) => self.apply_generative(hit),
            Trigger::Busy(_) => debug!(input = %input, "generative query still in flight"),
            Trigger::Dispatch(query) => self.dispatch(query),
        }
    }

    fn dispatch(&mut self, query: PendingQuery) {
        let context = self.predictor_context(&query.input);
        let collaborator = self.collaborator.clone();
        let allow_list = self.generative.allow_list();
        let tx = self.tx.clone();
        self.inflight = Some(tokio::spawn(async move {
            let verdict = match collaborator.query_generative_completion(&context).await {
                Ok(raw) => evaluate(&query.input, &raw, &allow_list, collaborator.as_ref()).await,
                Err(err) => {
                    warn!("generative query failed: {err:#}");
                    Err(Rejection::Predictor(err.to_string()))
                }
            };
            let _ = tx.send(RouterMessage::Generative { query, verdict });
        }));
    }

    fn on_generative(&mut self, query: PendingQuery, verdict: Result<String, Rejection>) {
        self.inflight = None;
        let live = self.engine.input().to_string();
        match self.generative.finish(&query, verdict, &live) {
            QueryOutcome::Accepted(full) => {
                if self.wants_generative() {
                    self.apply_generative(Some(full));
                }
            }
            QueryOutcome::Rejected(_) => self.drop_model_suggestion(),
            QueryOutcome::Superseded => {
                if self.debounce.is_none() && self.wants_generative() {
                    self.request_generative();
                }
            }
        }
    }

    fn apply_generative(&mut self, full: Option<String>) {
        match full {
            Some(full) => {
                if self.wants_generative() {
                    self.engine.offer(full, SuggestionSource::Model);
                }
            }
            None => self.drop_model_suggestion(),
        }
    }

    fn drop_model_suggestion(&mut self) {
        if self.engine.source() == Some(SuggestionSource::Model) {
            self.engine.clear_suggestion();
        }
    }

    fn predictor_context(&self, input: &str) -> PredictorContext {
        let history = self.engine.history();
        let excerpt_start = history.len().saturating_sub(self.config.history_excerpt);
        PredictorContext {
            shell: self.config.shell.clone(),
            working_directory: self.engine.working_directory().to_string(),
            last_command: history.last().cloned(),
            partial_input: input.to_string(),
            history_excerpt: history[excerpt_start..].to_vec(),
        }
    }

    /// Ask for the listing of the directory the current token points into.
    /// Identical requests are not repeated while one is in flight.
    fn request_listing(&mut self) {
        let Some(context) = self.engine.context() else {
            return;
        };
        // a bare first word completes from history and PATH only
        if context.is_first_token && !context.path_like {
            return;
        }
        let Some(directory) = context.target_directory else {
            return;
        };
        let query = PendingQuery {
            input: self.engine.input().to_string(),
            directory,
        };
        if self.pending_listing.as_ref() == Some(&query) {
            return;
        }
        let include_hidden = self.config.include_hidden || context.file_prefix.starts_with('.');
        self.pending_listing = Some(query.clone());

        let collaborator = self.collaborator.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let entries = match collaborator
                .list_directory(&query.directory, include_hidden)
                .await
            {
                Ok(entries) => Some(entries),
                Err(err) => {
                    warn!("listing {} failed: {err:#}", query.directory);
                    None
                }
            };
            let _ = tx.send(RouterMessage::Directory { query, entries });
        });
    }

    fn on_listing(&mut self, query: PendingQuery, entries: Option<Vec<DirEntry>>) {
        if self.pending_listing.as_ref() == Some(&query) {
            self.pending_listing = None;
        }
        if query.input != self.engine.input() {
            debug!(query = %query.input, "discarding stale directory listing");
            return;
        }
        let Some(entries) = entries else {
            return;
        };
        self.engine
            .set_directory(DirectorySnapshot::new(query.directory, entries));
        if self.mode != SourceMode::Model && self.recompute_local() {
            self.cancel_debounce();
        }
    }

    fn refresh_working_directory(&self) {
        let collaborator = self.collaborator.clone();
        let tx = self.tx.clone();
        let session = self.session;
        tokio::spawn(async move {
            match collaborator.get_working_directory(session).await {
                Ok(cwd) => {
                    let _ = tx.send(RouterMessage::WorkingDirectory(cwd));
                }
                Err(err) => warn!("working directory lookup for {session} failed: {err:#}"),
            }
        });
    }
}

impl Drop for EventRouter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests;
