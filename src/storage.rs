//! Local persistence for the helpdesk.
//!
//! Everything lives in one `SQLite` file:
//!
//! ```text
//! <path>  (default ~/.helpdesk/helpdesk.sqlite)
//!   ticket          # Tickets, mutated in place
//!   reply           # Agent replies, append-only
//!   article         # Knowledge base
//!   suggestion      # One row per triage run
//!   audit_log       # Append-only audit trail
//!   triage_config   # Singleton row, absent until first `config set`
//! ```
//!
//! Each operation opens its own connection. There is no transaction spanning
//! several calls: a failed write leaves earlier writes in place.

mod article;
mod audit;
mod policy;
mod suggestion;
mod ticket;

use std::fs;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use jiff::Timestamp;
use rusqlite::Connection;
use uuid::Uuid;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("ticket not found: {0}")]
    TicketNotFound(Uuid),

    #[error("article not found: {0}")]
    ArticleNotFound(Uuid),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

pub type Result<T> = core::result::Result<T, StorageError>;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS ticket (
        id                  TEXT PRIMARY KEY,
        title               TEXT NOT NULL,
        description         TEXT NOT NULL,
        category            TEXT NOT NULL,
        status              TEXT NOT NULL,
        created_by          TEXT NOT NULL,
        assignee            TEXT,
        agent_suggestion_id TEXT,
        created_at          TEXT NOT NULL,
        updated_at          TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS reply (
        id         TEXT PRIMARY KEY,
        ticket_id  TEXT NOT NULL REFERENCES ticket (id),
        author     TEXT NOT NULL,
        body       TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS article (
        id         TEXT PRIMARY KEY,
        title      TEXT NOT NULL,
        body       TEXT NOT NULL,
        tags       TEXT NOT NULL,
        status     TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS suggestion (
        id                 TEXT PRIMARY KEY,
        ticket_id          TEXT NOT NULL REFERENCES ticket (id),
        predicted_category TEXT NOT NULL,
        article_ids        TEXT NOT NULL,
        draft_reply        TEXT NOT NULL,
        confidence         REAL NOT NULL,
        auto_closed        INTEGER NOT NULL,
        model_info         TEXT NOT NULL,
        created_at         TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS audit_log (
        seq         INTEGER PRIMARY KEY AUTOINCREMENT,
        ticket_id   TEXT NOT NULL REFERENCES ticket (id),
        trace_id    TEXT NOT NULL,
        actor       TEXT NOT NULL,
        action      TEXT NOT NULL,
        meta        TEXT NOT NULL,
        recorded_at INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS audit_log_by_ticket
        ON audit_log (ticket_id, seq);

    CREATE TABLE IF NOT EXISTS triage_config (
        id                   INTEGER PRIMARY KEY CHECK (id = 1),
        auto_close_enabled   INTEGER NOT NULL,
        confidence_threshold REAL NOT NULL,
        sla_hours            INTEGER NOT NULL
    );
";

/// `SQLite`-backed storage for every helpdesk record.
///
/// Cheap to clone: it only holds the database path.
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    /// Opens (or creates) the database at `path` and applies the schema.
    ///
    /// The parent directory is created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let storage = Self { path };
        storage.open()?.execute_batch(SCHEMA)?;
        Ok(storage)
    }

    /// Returns the default database path: `~/.helpdesk/helpdesk.sqlite`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".helpdesk").join("helpdesk.sqlite"))
    }

    /// Opens a fresh connection with foreign keys enforced.
    ///
    /// The busy timeout lets queue workers and the CLI share the file.
    fn open(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(conn)
    }
}

fn parse_uuid(value: &str, what: &str) -> Result<Uuid> {
    value
        .parse::<Uuid>()
        .map_err(|e| StorageError::Corrupt(format!("invalid {what}: {e}")))
}

fn parse_timestamp(value: &str, what: &str) -> Result<Timestamp> {
    value
        .parse::<Timestamp>()
        .map_err(|e| StorageError::Corrupt(format!("invalid {what}: {e}")))
}

/// Parses one of the model's string-backed enums.
fn parse_enum<T: FromStr<Err = String>>(value: &str) -> Result<T> {
    value.parse::<T>().map_err(StorageError::Corrupt)
}
