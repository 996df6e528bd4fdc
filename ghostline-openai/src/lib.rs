mod client;
mod config;
mod prompt;

pub use crate::client::PredictorClient;
pub use crate::config::{DEFAULT_BASE_URL, DEFAULT_MODEL, PredictorConfig};
pub use crate::prompt::{SYSTEM_PROMPT, build_user_payload, extract_message_content};
