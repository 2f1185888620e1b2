//! Latest-run publication and record persistence.
//!
//! The parse worker is the only writer of the latest value; the query
//! server only reads it. Values are swapped whole through a
//! [`tokio::sync::watch`] channel, so readers never see a half-written
//! record (they may see a stale one).

pub mod record;
pub mod store;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;

pub use record::{RunRecord, deep_merge};
pub use store::RunStore;

/// What the parser is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParserStatus {
    /// Waiting for the game to create its log.
    LogFileMissing,
    /// The log exists but no run was read yet.
    LogFileEmpty,
    /// Following the log.
    Listening,
    /// At least one run was published.
    RunPublished,
}

impl ParserStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LogFileMissing => "LogFileMissing",
            Self::LogFileEmpty => "LogFileEmpty",
            Self::Listening => "Listening",
            Self::RunPublished => "RunPublished",
        }
    }
}

/// Snapshot served by the query endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Latest {
    pub status: ParserStatus,
    /// Last rendered record, if any run was published.
    pub record: Option<Value>,
    pub published_at: Option<DateTime<Local>>,
}

/// Single-writer holder of the latest published run.
#[derive(Debug)]
pub struct Publisher {
    tx: watch::Sender<Latest>,
    template: Value,
}

impl Publisher {
    /// Creates a publisher rendering records on top of `template`.
    #[must_use]
    pub fn new(template: Value) -> Self {
        let (tx, _) = watch::channel(Latest {
            status: ParserStatus::LogFileEmpty,
            record: None,
            published_at: None,
        });
        Self { tx, template }
    }

    #[must_use]
    pub const fn template(&self) -> &Value {
        &self.template
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Latest> {
        self.tx.subscribe()
    }

    #[must_use]
    pub fn latest(&self) -> Latest {
        self.tx.borrow().clone()
    }

    pub fn set_status(&self, status: ParserStatus) {
        self.tx.send_if_modified(|latest| {
            let changed = latest.status != status;
            latest.status = status;
            changed
        });
    }

    /// Replaces the latest record.
    pub fn publish(&self, record: Value) {
        self.tx.send_modify(|latest| {
            latest.status = ParserStatus::RunPublished;
            latest.record = Some(record);
            latest.published_at = Some(Local::now());
        });
    }

    /// Body of the "most recent run" endpoint: the last record, or the
    /// template carrying the parser status while there is none.
    #[must_use]
    pub fn last_run_body(&self) -> Value {
        let latest = self.tx.borrow();
        latest
            .record
            .clone()
            .unwrap_or_else(|| record::status_only(&self.template, latest.status))
    }
}
