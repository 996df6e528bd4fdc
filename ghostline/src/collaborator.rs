//! Boundary to everything the engine does not own: shell history, PATH,
//! the filesystem, the generative model and the running shell session.
//!
//! Every call may be slow or fail. Callers treat an error as "no data from
//! this source" and never surface it to the user.

use anyhow::Result;
use async_trait::async_trait;
use ghostline_types::{DirEntry, PredictorContext, SessionId};

pub mod local;

pub use local::LocalCollaborator;

#[async_trait]
pub trait Collaborator: Send + Sync {
    /// Previously executed command lines, most recent last.
    async fn get_history(&self) -> Result<Vec<String>>;

    /// Executable names in PATH search order.
    async fn get_path_executables(&self) -> Result<Vec<String>>;

    async fn get_home_directory(&self) -> Result<String>;

    async fn get_working_directory(&self, session: SessionId) -> Result<String>;

    async fn list_directory(&self, path: &str, include_hidden: bool) -> Result<Vec<DirEntry>>;

    async fn is_executable_on_path(&self, name: &str) -> Result<bool>;

    /// Raw, unvalidated model output for the partial line.
    async fn query_generative_completion(&self, context: &PredictorContext) -> Result<String>;

    /// Forward accepted text to the shell running in `session`.
    async fn write_to_session(&self, session: SessionId, text: &str) -> Result<()>;
}
