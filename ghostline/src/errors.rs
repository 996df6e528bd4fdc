use ghostline_types::GhostError;
use tracing::debug;

/// Display error in a user-friendly format without stack traces.
pub fn display_user_error(err: &anyhow::Error) {
    eprintln!("{}", user_message(err));
}

fn user_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<GhostError>() {
        Some(GhostError::Config(msg)) => format!("ghostline: invalid configuration: {msg}"),
        Some(GhostError::Io(io)) if io.kind() == std::io::ErrorKind::BrokenPipe => {
            debug!("output closed: {io}");
            "ghostline: output closed".to_string()
        }
        _ => format!("ghostline: {err:#}"),
    }
}
