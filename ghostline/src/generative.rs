//! Generative completion: turns raw model output into a suggestion that is
//! safe to offer for insertion.
//!
//! One query is in flight at a time. The engine itself never awaits the
//! model; the router dispatches the query, runs [`evaluate`] off the event
//! path and hands the verdict back through [`GenerativeEngine::finish`].

use crate::collaborator::Collaborator;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

pub mod allow_list;
pub mod policy;
pub mod sanitize;

pub use allow_list::AllowListCache;
pub use sanitize::clean_response;

/// Why a model response was not offered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("response is empty")]
    Empty,
    #[error("response does not echo the input")]
    PrefixMismatch,
    #[error("response adds nothing to the input")]
    NoContinuation,
    #[error("response contains control character {0:?}")]
    ControlCharacter(char),
    #[error("single-token guard: {0}")]
    UnsafeSingleToken(&'static str),
    #[error("response has no command")]
    MissingCommand,
    #[error("command `{0}` is neither builtin nor on PATH")]
    UnknownCommand(String),
    #[error("predictor failed: {0}")]
    Predictor(String),
}

/// Input captured when a query was dispatched, used to detect staleness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuery {
    pub input: String,
    pub directory: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QueryPhase {
    #[default]
    Idle,
    Querying(PendingQuery),
}

/// Result of asking the engine for a suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// The exact input was answered before; `None` means it was rejected.
    Cached(Option<String>),
    /// A query is already in flight; the last suggestion is returned as is.
    Busy(Option<String>),
    /// The caller must run this query and report back.
    Dispatch(PendingQuery),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Accepted(String),
    Rejected(Rejection),
    /// The input moved on while the query was in flight.
    Superseded,
}

#[derive(Debug, Default)]
pub struct GenerativeEngine {
    phase: QueryPhase,
    current: Option<String>,
    responses: HashMap<String, Option<String>>,
    allow_list: Arc<AllowListCache>,
}

impl GenerativeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_list(&self) -> Arc<AllowListCache> {
        self.allow_list.clone()
    }

    pub fn phase(&self) -> &QueryPhase {
        &self.phase
    }

    pub fn is_querying(&self) -> bool {
        matches!(self.phase, QueryPhase::Querying(_))
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn clear_current(&mut self) {
        self.current = None;
    }

    /// Cached verdict for exactly `input`, if any.
    pub fn cached(&self, input: &str) -> Option<Option<&str>> {
        self.responses.get(input).map(Option::as_deref)
    }

    pub fn trigger(&mut self, input: &str, directory: &str) -> Trigger {
        if let Some(hit) = self.responses.get(input) {
            self.current = hit.clone();
            return Trigger::Cached(hit.clone());
        }
        if self.is_querying() {
            return Trigger::Busy(self.current.clone());
        }
        let query = PendingQuery {
            input: input.to_string(),
            directory: directory.to_string(),
        };
        debug!(input, "generative query dispatched");
        self.phase = QueryPhase::Querying(query.clone());
        Trigger::Dispatch(query)
    }

    /// Record the verdict for `query` and apply it if `live_input` still
    /// matches what was asked.
    pub fn finish(
        &mut self,
        query: &PendingQuery,
        verdict: Result<String, Rejection>,
        live_input: &str,
    ) -> QueryOutcome {
        if self.phase == QueryPhase::Querying(query.clone()) {
            self.phase = QueryPhase::Idle;
        }
        if !matches!(verdict, Err(Rejection::Predictor(_))) {
            self.responses
                .insert(query.input.clone(), verdict.clone().ok());
        }

        if live_input != query.input {
            debug!(query = %query.input, live = live_input, "generative response superseded");
            return QueryOutcome::Superseded;
        }

        match verdict {
            Ok(full) => {
                self.current = Some(full.clone());
                QueryOutcome::Accepted(full)
            }
            Err(rejection) => {
                debug!(input = %query.input, "generative response rejected: {rejection}");
                self.current = None;
                QueryOutcome::Rejected(rejection)
            }
        }
    }
}

/// A response that passed every check that does not need the collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub line: String,
    pub command: String,
}

/// Shape checks on the raw response: echo, continuation, control characters,
/// single-token guard and presence of a primary command.
pub fn check_response(input: &str, raw: &str) -> Result<Candidate, Rejection> {
    let cleaned = clean_response(raw);
    if cleaned.trim().is_empty() {
        return Err(Rejection::Empty);
    }
    // painted verbatim and written to the session on accept
    if let Some(ch) = cleaned.chars().find(|ch| ch.is_control()) {
        return Err(Rejection::ControlCharacter(ch));
    }
    let suffix = cleaned
        .strip_prefix(input)
        .ok_or(Rejection::PrefixMismatch)?;
    if suffix.is_empty() {
        return Err(Rejection::NoContinuation);
    }

    if !input.chars().any(char::is_whitespace) {
        policy::check_single_token(&cleaned, suffix)?;
    }

    let command = policy::primary_command(&cleaned)
        .ok_or(Rejection::MissingCommand)?
        .to_string();
    Ok(Candidate {
        line: cleaned,
        command,
    })
}

/// Full validation of one model response for `input`.
pub async fn evaluate(
    input: &str,
    raw: &str,
    allow_list: &AllowListCache,
    collaborator: &dyn Collaborator,
) -> Result<String, Rejection> {
    let candidate = check_response(input, raw)?;
    if policy::is_builtin(&candidate.command)
        || allow_list.resolve(&candidate.command, collaborator).await
    {
        Ok(candidate.line)
    } else {
        Err(Rejection::UnknownCommand(candidate.command))
    }
}
