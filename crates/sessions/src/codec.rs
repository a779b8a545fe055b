//! Text form of a persisted session: `<id>|<acquisitionMs>|<renewalMs>`.

use serde::Serialize;

use sk_domain::diagnostics::{DiagnosticEvent, DiagnosticId, DiagnosticSink};
use sk_domain::error::{Error, Result};

pub const RECORD_SEPARATOR: char = '|';

/// A session as written to a store.  Both dates are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRecord {
    pub id: String,
    pub acquisition_date: i64,
    pub renewal_date: i64,
}

pub fn encode(record: &SessionRecord) -> String {
    format!(
        "{}{sep}{}{sep}{}",
        record.id,
        record.acquisition_date,
        record.renewal_date,
        sep = RECORD_SEPARATOR
    )
}

/// Whatever could be read out of a stored value.  Fields are filled as far
/// as parsing got; only a valid result should be trusted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedRecord {
    pub id: String,
    pub acquisition_date: i64,
    pub renewal_date: i64,
    pub is_valid: bool,
}

impl DecodedRecord {
    pub fn record(&self) -> Option<SessionRecord> {
        self.is_valid.then(|| SessionRecord {
            id: self.id.clone(),
            acquisition_date: self.acquisition_date,
            renewal_date: self.renewal_date,
        })
    }
}

/// Decode a stored value.  Never fails: problems are reported to `sink`
/// and come back as an invalid record.
pub fn decode(text: &str, sink: &dyn DiagnosticSink) -> DecodedRecord {
    let mut decoded = DecodedRecord::default();
    match read_fields(text, &mut decoded) {
        Ok(()) => decoded.is_valid = true,
        Err(e) => report(sink, &e),
    }
    decoded
}

fn read_fields(text: &str, out: &mut DecodedRecord) -> Result<()> {
    let tokens: Vec<&str> = text.split(RECORD_SEPARATOR).collect();
    if tokens.len() < 2 {
        return Err(Error::ParseException {
            value: text.to_owned(),
            message: "expected id and acquisition date".into(),
        });
    }

    out.id = tokens[0].to_owned();
    out.acquisition_date = coerce_date(tokens.get(1).copied());
    out.renewal_date = coerce_date(tokens.get(2).copied());

    if out.acquisition_date <= 0 {
        return Err(Error::MalformedRecord("acquisition date is 0".into()));
    }
    if out.renewal_date <= 0 {
        return Err(Error::MalformedRecord("renewal date is 0".into()));
    }
    Ok(())
}

/// Anything that is not a finite number reads as 0.  A positive fraction
/// rounds up so it never collapses to the invalid 0.
fn coerce_date(token: Option<&str>) -> i64 {
    token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .and_then(|t| t.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .map(|v| if v > 0.0 { v.ceil() as i64 } else { v as i64 })
        .unwrap_or(0)
}

fn report(sink: &dyn DiagnosticSink, e: &Error) {
    let event = match e {
        Error::MalformedRecord(_) => DiagnosticEvent::warning(
            DiagnosticId::SessionDateIsZero,
            format!("{e}, session will be reset"),
        ),
        _ => DiagnosticEvent::critical(
            DiagnosticId::ErrorParsingSessionRecord,
            "Error parsing session record, session will be reset",
        )
        .with_exception(e),
    };
    sink.record(event);
}
