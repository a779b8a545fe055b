use std::collections::BTreeMap;

use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// A cookie as the jar keeps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub value: String,
    /// Attributes in the order they were written (`path`, `max-age`, ...).
    pub attributes: Vec<(String, Option<String>)>,
    /// Absolute expiry; `None` for a session cookie.
    pub expires_at_ms: Option<i64>,
}

impl StoredCookie {
    /// Case-insensitive attribute lookup.  Flag attributes yield `Some("")`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_deref().unwrap_or(""))
    }

    fn is_live(&self, now_ms: i64) -> bool {
        self.expires_at_ms.map_or(true, |at| at > now_ms)
    }
}

/// Browser-like jar semantics shared by the memory and file backends.
///
/// Cookies are keyed by name only; domain and path are recorded but do not
/// scope lookups.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CookieJar {
    entries: BTreeMap<String, StoredCookie>,
}

impl CookieJar {
    /// Apply one assignment.  `max-age` wins over `expires`; a deadline at or
    /// before `now_ms` removes the cookie.
    pub fn apply(&mut self, name: &str, assignment: &str, now_ms: i64) {
        let mut segments = assignment.split(';');
        let value = segments.next().unwrap_or_default().trim().to_owned();

        let mut attributes = Vec::new();
        let mut max_age = None;
        let mut expires = None;
        for segment in segments {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let (key, val) = match segment.split_once('=') {
                Some((k, v)) => (k.trim().to_owned(), Some(v.trim().to_owned())),
                None => (segment.to_owned(), None),
            };
            if key.eq_ignore_ascii_case("max-age") {
                max_age = val.as_deref().and_then(|v| v.parse::<f64>().ok());
            } else if key.eq_ignore_ascii_case("expires") {
                expires = val
                    .as_deref()
                    .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
                    .map(|d| d.timestamp_millis());
            }
            attributes.push((key, val));
        }

        let expires_at_ms = match max_age {
            Some(secs) => Some(now_ms.saturating_add((secs * 1000.0) as i64)),
            None => expires,
        };

        if expires_at_ms.is_some_and(|at| at <= now_ms) {
            self.entries.remove(name);
            return;
        }

        self.entries.insert(
            name.to_owned(),
            StoredCookie {
                value,
                attributes,
                expires_at_ms,
            },
        );
    }

    /// Render the live cookies the way `document.cookie` reads.
    pub fn render(&self, now_ms: i64) -> String {
        self.entries
            .iter()
            .filter(|(_, c)| c.is_live(now_ms))
            .map(|(name, c)| format!("{name}={}", c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn get(&self, name: &str, now_ms: i64) -> Option<&StoredCookie> {
        self.entries.get(name).filter(|c| c.is_live(now_ms))
    }

    /// Drop every cookie whose deadline has passed.
    pub fn purge_expired(&mut self, now_ms: i64) {
        self.entries.retain(|_, c| c.is_live(now_ms));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn max_age_sets_deadline() {
        let mut jar = CookieJar::default();
        jar.apply("a", "v1;max-age=10;path=/", NOW);
        let c = jar.get("a", NOW).unwrap();
        assert_eq!(c.value, "v1");
        assert_eq!(c.expires_at_ms, Some(NOW + 10_000));
        assert_eq!(c.attribute("path"), Some("/"));
        assert!(jar.get("a", NOW + 10_000).is_none());
    }

    #[test]
    fn past_expiry_deletes() {
        let mut jar = CookieJar::default();
        jar.apply("a", "v1;path=/", NOW);
        jar.apply("a", ";path=/;expires=Thu, 01 Jan 1970 00:00:01 GMT", NOW);
        assert!(jar.is_empty());
    }

    #[test]
    fn render_joins_live_cookies() {
        let mut jar = CookieJar::default();
        jar.apply("a", "1", NOW);
        jar.apply("b", "2;max-age=1", NOW);
        assert_eq!(jar.render(NOW), "a=1; b=2");
        assert_eq!(jar.render(NOW + 5_000), "a=1");
    }
}
