use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use dayreport_core::{Identity, Session, SessionStore, TransportEvent, TransportListener};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Session persisted between CLI invocations.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoredSession {
    pub api_url: String,
    pub session: Session,
    pub saved_at: DateTime<Utc>,
}

pub fn exit_error(message: &str, docs_hint: Option<&str>) -> ! {
    let mut err = json!({
        "error": "cli_error",
        "message": message
    });
    if let Some(hint) = docs_hint {
        err["docs_hint"] = json!(hint);
    }
    eprintln!(
        "{}",
        serde_json::to_string_pretty(&err).unwrap_or_else(|_| message.to_string())
    );
    std::process::exit(1);
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn config_path() -> PathBuf {
    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dayreport");
    config_dir.join("session.json")
}

pub fn load_session(path: &Path) -> Option<StoredSession> {
    let data = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&data).ok()
}

pub fn save_session(path: &Path, stored: &StoredSession) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let data = serde_json::to_string_pretty(stored)?;

    // Bearer token inside: owner read/write only
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(data.as_bytes())?;

    Ok(())
}

/// Returns whether a stored session existed.
pub fn remove_session(path: &Path) -> std::io::Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    std::fs::remove_file(path)?;
    Ok(true)
}

/// Session store seeded from disk. A session saved for a different API URL
/// is ignored.
pub fn restore_session_store(path: &Path, api_url: &str) -> SessionStore {
    match load_session(path) {
        Some(stored) if stored.api_url == api_url => SessionStore::restore(stored.session),
        Some(stored) => {
            tracing::debug!(stored_api_url = %stored.api_url, "ignoring session for another API");
            SessionStore::new()
        }
        None => SessionStore::new(),
    }
}

/// Deletes the persisted session once the backend rejects its token.
pub struct SessionFileListener {
    pub file: PathBuf,
}

impl TransportListener for SessionFileListener {
    fn on_transport_event(&self, event: &TransportEvent) {
        match event {
            TransportEvent::Unauthorized { path } => match remove_session(&self.file) {
                Ok(true) => tracing::warn!(%path, "stored session rejected, removed"),
                Ok(false) => {}
                Err(e) => tracing::error!(error = %e, "failed to remove stored session"),
            },
        }
    }
}

pub fn require_identity(store: &SessionStore) -> Identity {
    store.identity().unwrap_or_else(|| {
        exit_error(
            "Not logged in.",
            Some("Run `dayreport login --username <name>` first."),
        )
    })
}

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

// Permission bits are unix-only; elsewhere `mode` does nothing.
#[cfg(not(unix))]
trait OpenOptionsExt {
    fn mode(&mut self, _mode: u32) -> &mut Self;
}

#[cfg(not(unix))]
impl OpenOptionsExt for std::fs::OpenOptions {
    fn mode(&mut self, _mode: u32) -> &mut Self {
        self
    }
}
