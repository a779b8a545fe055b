use serde::Serialize;

use crate::codec::SessionRecord;

/// The in-memory session.  All fields are unset until the manager first
/// hydrates or renews it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: Option<String>,
    pub acquisition_date: Option<i64>,
    pub renewal_date: Option<i64>,
}

impl Session {
    pub fn is_set(&self) -> bool {
        self.id.is_some()
    }

    pub fn to_record(&self) -> Option<SessionRecord> {
        Some(SessionRecord {
            id: self.id.clone()?,
            acquisition_date: self.acquisition_date?,
            renewal_date: self.renewal_date?,
        })
    }
}

impl From<SessionRecord> for Session {
    fn from(record: SessionRecord) -> Self {
        Self {
            id: Some(record.id),
            acquisition_date: Some(record.acquisition_date),
            renewal_date: Some(record.renewal_date),
        }
    }
}
