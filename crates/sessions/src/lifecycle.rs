//! Session expiry.
//!
//! A session ends when it has lived longer than the expiration window since
//! acquisition, or has gone unused for longer than the renewal window.  A
//! date in the future means the clock moved backwards and the session is
//! not trusted either.  With an expiration window of 0 none of these apply
//! and a session lives until its id is lost.

use sk_domain::config::SessionPolicy;

use crate::session::Session;

/// Why a session must be replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpiryReason {
    NoSession,
    ClockSkew { date: i64, now: i64 },
    AcquisitionExpired { age_ms: i64, limit_ms: i64 },
    RenewalExpired { idle_ms: i64, limit_ms: i64 },
}

impl std::fmt::Display for ExpiryReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSession => write!(f, "no session"),
            Self::ClockSkew { date, now } => {
                write!(f, "session date {date} is after now ({now})")
            }
            Self::AcquisitionExpired { age_ms, limit_ms } => {
                write!(f, "acquired {age_ms}ms ago (limit {limit_ms}ms)")
            }
            Self::RenewalExpired { idle_ms, limit_ms } => {
                write!(f, "idle for {idle_ms}ms (limit {limit_ms}ms)")
            }
        }
    }
}

/// `Some(reason)` when `session` has to be renewed at `now`.
pub fn check_expiry(
    session: &Session,
    now: i64,
    policy: &dyn SessionPolicy,
) -> Option<ExpiryReason> {
    let (Some(_), Some(acquired), Some(renewed)) =
        (&session.id, session.acquisition_date, session.renewal_date)
    else {
        return Some(ExpiryReason::NoSession);
    };

    let expiration = policy.session_expiration_ms();
    if expiration <= 0 {
        return None;
    }

    for date in [acquired, renewed] {
        if now < date {
            return Some(ExpiryReason::ClockSkew { date, now });
        }
    }

    let age_ms = now.saturating_sub(acquired);
    if age_ms > expiration {
        return Some(ExpiryReason::AcquisitionExpired {
            age_ms,
            limit_ms: expiration,
        });
    }

    let renewal = policy.session_renewal_ms();
    let idle_ms = now.saturating_sub(renewed);
    if idle_ms > renewal {
        return Some(ExpiryReason::RenewalExpired {
            idle_ms,
            limit_ms: renewal,
        });
    }

    None
}
