//! Splitting and joining `;`-separated cookie strings.

use std::collections::HashMap;

use chrono::DateTime;

/// Written as `expires` to delete a cookie.
pub const EXPIRED_DATE: &str = "Thu, 01 Jan 1970 00:00:01 GMT";

/// Ordered `name[=value]` segments of a cookie assignment.  The first
/// segment of a caller-supplied value is the value itself and is kept as a
/// bare segment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CookieParts {
    parts: Vec<(String, Option<String>)>,
}

impl CookieParts {
    pub fn parse(value: &str) -> Self {
        // The leading value segment is kept even when empty so the
        // formatted assignment never starts with an attribute.
        let parts = value
            .trim()
            .split(';')
            .enumerate()
            .filter(|(i, part)| *i == 0 || !part.is_empty())
            .map(|(_, part)| part)
            .map(|part| match part.find('=') {
                Some(idx) => (part[..idx].trim().to_owned(), Some(part[idx + 1..].to_owned())),
                None => (part.to_owned(), None),
            })
            .collect();
        Self { parts }
    }

    /// Case-insensitive; cookie attribute names are not case-sensitive.
    pub fn contains(&self, name: &str) -> bool {
        self.parts.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    pub fn push(&mut self, name: impl Into<String>, value: Option<String>) {
        self.parts.push((name.into(), value));
    }

    /// Add `name=value` only when no segment of that name exists yet.
    pub fn push_absent(&mut self, name: &str, value: Option<String>) {
        if !self.contains(name) {
            self.push(name, value);
        }
    }

    /// Join back into `a=b;flag;c=d`.
    pub fn format(&self) -> String {
        self.parts
            .iter()
            .map(|(k, v)| match v {
                Some(v) => format!("{k}={v}"),
                None => k.clone(),
            })
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// Map every `name=value` in a full jar string.  Values are trimmed; when a
/// name repeats, the last occurrence wins.
pub fn parse_cookie_string(raw: &str) -> HashMap<String, String> {
    let mut values = HashMap::new();
    for part in raw.split(';') {
        let (name, value) = match part.find('=') {
            Some(idx) => (part[..idx].trim(), part[idx + 1..].trim()),
            None => (part.trim(), ""),
        };
        if !name.is_empty() {
            values.insert(name.to_owned(), value.to_owned());
        }
    }
    values
}

/// HTTP date for an `expires` attribute, e.g. `Tue, 14 Nov 2023 22:43:20 GMT`.
pub fn http_date(epoch_ms: i64) -> Option<String> {
    DateTime::from_timestamp_millis(epoch_ms)
        .map(|d| d.format("%a, %d %b %Y %H:%M:%S GMT").to_string())
}
