//! Recording collaborator used by the unit tests.

use crate::collaborator::Collaborator;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use ghostline_types::{DirEntry, PredictorContext, SessionId};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

#[derive(Default)]
pub struct MockCollaborator {
    history: Mutex<Vec<String>>,
    executables: Vec<String>,
    on_path: HashSet<String>,
    directories: HashMap<String, Vec<DirEntry>>,
    responses: HashMap<String, String>,
    query_delay: Duration,
    fail_path_lookups: bool,
    home: String,
    cwd: String,
    queries: Mutex<Vec<PredictorContext>>,
    path_lookups: Mutex<Vec<String>>,
    listings: Mutex<Vec<(String, bool)>>,
    writes: Mutex<Vec<(SessionId, String)>>,
}

impl MockCollaborator {
    pub fn new() -> Self {
        Self {
            home: "/home/u".to_string(),
            cwd: "/home/u".to_string(),
            ..Default::default()
        }
    }

    pub fn with_history(self, lines: &[&str]) -> Self {
        *self.history.lock() = lines.iter().map(|line| line.to_string()).collect();
        self
    }

    pub fn with_executables(mut self, names: &[&str]) -> Self {
        self.executables = names.iter().map(|name| name.to_string()).collect();
        self
    }

    pub fn with_on_path(mut self, names: &[&str]) -> Self {
        self.on_path = names.iter().map(|name| name.to_string()).collect();
        self
    }

    pub fn with_directory(mut self, path: &str, entries: Vec<DirEntry>) -> Self {
        self.directories.insert(path.to_string(), entries);
        self
    }

    pub fn with_response(mut self, input: &str, raw: &str) -> Self {
        self.responses.insert(input.to_string(), raw.to_string());
        self
    }

    pub fn with_query_delay(mut self, delay: Duration) -> Self {
        self.query_delay = delay;
        self
    }

    pub fn failing_path_lookups(mut self) -> Self {
        self.fail_path_lookups = true;
        self
    }

    pub fn set_history(&self, lines: &[&str]) {
        *self.history.lock() = lines.iter().map(|line| line.to_string()).collect();
    }

    pub fn queries(&self) -> Vec<PredictorContext> {
        self.queries.lock().clone()
    }

    pub fn path_lookups(&self) -> Vec<String> {
        self.path_lookups.lock().clone()
    }

    pub fn listings(&self) -> Vec<(String, bool)> {
        self.listings.lock().clone()
    }

    pub fn writes(&self) -> Vec<(SessionId, String)> {
        self.writes.lock().clone()
    }
}

#[async_trait]
impl Collaborator for MockCollaborator {
    async fn get_history(&self) -> Result<Vec<String>> {
        Ok(self.history.lock().clone())
    }

    async fn get_path_executables(&self) -> Result<Vec<String>> {
        Ok(self.executables.clone())
    }

    async fn get_home_directory(&self) -> Result<String> {
        Ok(self.home.clone())
    }

    async fn get_working_directory(&self, _session: SessionId) -> Result<String> {
        Ok(self.cwd.clone())
    }

    async fn list_directory(&self, path: &str, include_hidden: bool) -> Result<Vec<DirEntry>> {
        self.listings.lock().push((path.to_string(), include_hidden));
        self.directories
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("no such directory: {path}"))
    }

    async fn is_executable_on_path(&self, name: &str) -> Result<bool> {
        self.path_lookups.lock().push(name.to_string());
        if self.fail_path_lookups {
            return Err(anyhow!("lookup failed"));
        }
        Ok(self.on_path.contains(name))
    }

    async fn query_generative_completion(&self, context: &PredictorContext) -> Result<String> {
        self.queries.lock().push(context.clone());
        if !self.query_delay.is_zero() {
            tokio::time::sleep(self.query_delay).await;
        }
        self.responses
            .get(&context.partial_input)
            .cloned()
            .ok_or_else(|| anyhow!("no response for {}", context.partial_input))
    }

    async fn write_to_session(&self, session: SessionId, text: &str) -> Result<()> {
        self.writes.lock().push((session, text.to_string()));
        Ok(())
    }
}
