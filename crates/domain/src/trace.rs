use serde::Serialize;

/// Structured trace events emitted across all SessionKeep crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    StoreProbed {
        store: String,
        available: bool,
    },
    StoreDisabled {
        store: String,
        reason: String,
    },
    SessionResolved {
        storage_name: String,
        session_id: String,
        source: String,
    },
    SessionRenewed {
        storage_name: String,
        old_session_id: Option<String>,
        new_session_id: String,
    },
    SessionBackedUp {
        storage_name: String,
        session_id: Option<String>,
    },
    UserCreated {
        user_id: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "sk_event");
    }
}
