//! Expiration handling: the canonical HTTP-date format and the
//! relative-offset engine.
//!
//! An absolute instant is canonicalized to `Wdy, DD-Mon-YYYY HH:MM:SS GMT`
//! at assignment time. Raw strings are handed to the cookie's
//! [`ExpiryEngine`]; the default engine, [`DeltaExpiry`], resolves the
//! relative grammar cookie engines traditionally understand:
//!
//! | input  | meaning                      |
//! |--------|------------------------------|
//! | `+30s` | 30 seconds from now          |
//! | `+10m` | ten minutes from now         |
//! | `+1h`  | one hour from now            |
//! | `-1d`  | yesterday                    |
//! | `now`  | immediately                  |
//! | `+3M`  | in three months (30-day)     |
//! | `+10y` | in ten years time (365-day)  |
//!
//! Anything else, an already-absolute HTTP date included, is stored
//! verbatim.

use std::sync::Arc;
use std::time::SystemTime;

use lazy_static::lazy_static;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, UtcOffset};

/// The canonical cookie date pattern, `Wdy, DD-Mon-YYYY HH:MM:SS GMT`.
pub const COOKIE_DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[weekday repr:short], [day]-[month repr:short]-[year] [hour]:[minute]:[second] GMT"
);

/// Formats an instant as a canonical cookie date, converting to UTC first.
pub fn format_cookie_date(at: OffsetDateTime) -> String {
    at.to_offset(UtcOffset::UTC)
        .format(COOKIE_DATE_FORMAT)
        .expect("the canonical cookie date pattern formats any instant")
}

/// Resolves a raw expiration string into the value to store.
///
/// The cookie core hands every raw string to this delegate unchanged and
/// stores whatever comes back. Implementations must synchronize
/// internally; the method takes `&self`.
pub trait ExpiryEngine: Send + Sync {
    fn compute_expiry(&self, raw: &str) -> String;
}

/// A handle to an expiry engine.
pub type ExpiryEngineHandle = Arc<dyn ExpiryEngine + Send + Sync>;

lazy_static! {
    static ref DEFAULT_ENGINE: ExpiryEngineHandle = Arc::new(DeltaExpiry::new());
}

/// The process-wide shared default engine.
pub(crate) fn default_engine() -> ExpiryEngineHandle {
    DEFAULT_ENGINE.clone()
}

/// Expiration input, resolved at the API edge: an absolute instant or a
/// raw string for the engine.
#[derive(Debug, Clone)]
pub enum ExpiresInput {
    Absolute(OffsetDateTime),
    Raw(String),
}

impl From<OffsetDateTime> for ExpiresInput {
    fn from(at: OffsetDateTime) -> Self {
        ExpiresInput::Absolute(at)
    }
}

impl From<SystemTime> for ExpiresInput {
    fn from(at: SystemTime) -> Self {
        ExpiresInput::Absolute(OffsetDateTime::from(at))
    }
}

impl From<&str> for ExpiresInput {
    fn from(raw: &str) -> Self {
        ExpiresInput::Raw(raw.to_string())
    }
}

impl From<String> for ExpiresInput {
    fn from(raw: String) -> Self {
        ExpiresInput::Raw(raw)
    }
}

/// The stock relative-offset engine.
///
/// Offsets need an explicit sign (or the word `now`); a missing unit
/// letter means seconds. Months and years are fixed 30-day and 365-day
/// spans, not calendar arithmetic.
#[derive(Debug, Clone, Default)]
pub struct DeltaExpiry {
    /// Fixed resolution instant; `None` means the current time.
    anchor: Option<OffsetDateTime>,
}

impl DeltaExpiry {
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine that resolves offsets against `at` instead of the
    /// current time. Deterministic; meant for tests and replays.
    pub fn anchored(at: OffsetDateTime) -> Self {
        DeltaExpiry { anchor: Some(at) }
    }

    fn reference_time(&self) -> OffsetDateTime {
        self.anchor.unwrap_or_else(OffsetDateTime::now_utc)
    }
}

impl ExpiryEngine for DeltaExpiry {
    fn compute_expiry(&self, raw: &str) -> String {
        match parse_offset(raw) {
            Some(seconds) => {
                format_cookie_date(self.reference_time() + Duration::seconds(seconds))
            }
            None => {
                log::trace!("expiration {:?} is not a relative offset, keeping verbatim", raw);
                raw.to_string()
            }
        }
    }
}

/// Parses `now` or `[+-]N[smhdMy]` into an offset in seconds.
fn parse_offset(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("now") {
        return Some(0);
    }

    let (sign, rest) = match raw.as_bytes().first()? {
        b'+' => (1, &raw[1..]),
        b'-' => (-1, &raw[1..]),
        _ => return None,
    };

    let (digits, unit) = match rest.chars().last() {
        Some(c) if c.is_ascii_alphabetic() => (&rest[..rest.len() - 1], Some(c)),
        Some(_) => (rest, None),
        None => return None,
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let count: i64 = digits.parse().ok()?;
    let unit_seconds = match unit {
        None | Some('s') => 1,
        Some('m') => 60,
        Some('h') => 3_600,
        Some('d') => 86_400,
        Some('M') => 2_592_000,
        Some('y') => 31_536_000,
        Some(_) => return None,
    };

    Some(sign * count * unit_seconds)
}
