use super::Collaborator;
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use ghostline_openai::PredictorClient;
use ghostline_types::{DirEntry, GhostError, PredictorContext, SessionId};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Text accepted by the user, on its way to the session's shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionWrite {
    pub session: SessionId,
    pub text: String,
}

/// Collaborator backed by the local machine: history file, `$PATH`, the real
/// filesystem and an OpenAI-compatible predictor.
pub struct LocalCollaborator {
    predictor: PredictorClient,
    history_file: Option<PathBuf>,
    submitted: Mutex<Vec<String>>,
    sink: Mutex<Option<UnboundedSender<SessionWrite>>>,
}

impl LocalCollaborator {
    pub fn new(predictor: PredictorClient) -> Self {
        Self {
            predictor,
            history_file: default_history_file(),
            submitted: Mutex::new(Vec::new()),
            sink: Mutex::new(None),
        }
    }

    pub fn with_history_file(mut self, path: Option<PathBuf>) -> Self {
        self.history_file = path;
        self
    }

    /// Route `write_to_session` output to `sink`.
    pub fn attach_session(&self, sink: UnboundedSender<SessionWrite>) {
        *self.sink.lock() = Some(sink);
    }

    /// Remember a line submitted in this process so it shows up in history.
    pub fn record_command(&self, line: &str) {
        let line = line.trim_end();
        if !line.trim().is_empty() {
            self.submitted.lock().push(line.to_string());
        }
    }
}

#[async_trait]
impl Collaborator for LocalCollaborator {
    async fn get_history(&self) -> Result<Vec<String>> {
        let mut lines = match &self.history_file {
            Some(path) if path.exists() => {
                let raw = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("failed to read history {}", path.display()))?;
                parse_history(&String::from_utf8_lossy(&raw))
            }
            _ => Vec::new(),
        };
        lines.extend(self.submitted.lock().iter().cloned());
        Ok(lines)
    }

    async fn get_path_executables(&self) -> Result<Vec<String>> {
        let path_var = std::env::var_os("PATH").unwrap_or_default();
        let mut seen = HashSet::new();
        let mut executables = Vec::new();

        for dir in std::env::split_paths(&path_var) {
            let names = match list_executables(&dir).await {
                Ok(names) => names,
                Err(err) => {
                    debug!("skip PATH entry {}: {err}", dir.display());
                    continue;
                }
            };
            for name in names {
                if seen.insert(name.clone()) {
                    executables.push(name);
                }
            }
        }
        Ok(executables)
    }

    async fn get_home_directory(&self) -> Result<String> {
        let home = dirs::home_dir()
            .ok_or_else(|| GhostError::Config("home directory is unknown".to_string()))?;
        Ok(home.to_string_lossy().into_owned())
    }

    async fn get_working_directory(&self, session: SessionId) -> Result<String> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        debug!("working directory for session {session}: {}", cwd.display());
        Ok(cwd.to_string_lossy().into_owned())
    }

    async fn list_directory(&self, path: &str, include_hidden: bool) -> Result<Vec<DirEntry>> {
        let mut reader = tokio::fs::read_dir(path)
            .await
            .with_context(|| format!("failed to list {path}"))?;
        let mut entries = Vec::new();

        while let Some(entry) = reader.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !include_hidden && name.starts_with('.') {
                continue;
            }
            // follow symlinks so a link to a directory completes with `/`
            let is_directory = match tokio::fs::metadata(entry.path()).await {
                Ok(meta) => meta.is_dir(),
                Err(_) => entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false),
            };
            entries.push(DirEntry { name, is_directory });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn is_executable_on_path(&self, name: &str) -> Result<bool> {
        let name = name.to_string();
        let found = tokio::task::spawn_blocking(move || which::which(name).is_ok()).await?;
        Ok(found)
    }

    async fn query_generative_completion(&self, context: &PredictorContext) -> Result<String> {
        self.predictor.complete(context).await
    }

    async fn write_to_session(&self, session: SessionId, text: &str) -> Result<()> {
        let sink = self
            .sink
            .lock()
            .clone()
            .ok_or(GhostError::SessionDetached(session))?;
        sink.send(SessionWrite {
            session,
            text: text.to_string(),
        })
        .map_err(|_| GhostError::SessionDetached(session))?;
        Ok(())
    }
}

fn default_history_file() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("HISTFILE") {
        return Some(PathBuf::from(path));
    }
    let home = dirs::home_dir()?;
    [".zsh_history", ".bash_history"]
        .iter()
        .map(|name| home.join(name))
        .find(|path| path.exists())
}

/// Split a history file into command lines, oldest first.
fn parse_history(content: &str) -> Vec<String> {
    content
        .lines()
        .map(strip_zsh_extended)
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// `: 1700000000:0;git status` -> `git status`
fn strip_zsh_extended(line: &str) -> &str {
    let Some(rest) = line.strip_prefix(": ") else {
        return line;
    };
    match rest.split_once(';') {
        Some((meta, command))
            if meta
                .split(':')
                .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit())) =>
        {
            command
        }
        _ => line,
    }
}

async fn list_executables(dir: &Path) -> Result<Vec<String>> {
    let mut reader = tokio::fs::read_dir(dir).await?;
    let mut names = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        let Ok(meta) = tokio::fs::metadata(entry.path()).await else {
            continue;
        };
        if meta.is_file() && meta.permissions().mode() & 0o111 != 0 {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}
