//! Expiry instant derivation from a grant duration.

use chrono::{DateTime, Duration, Utc};

use crate::GrantDuration;

/// Converts a duration into an absolute expiry instant.
///
/// Returns `None` when every component is absent or zero. Otherwise the
/// expiry is `now + years*365d + months*30d + days*1d`. The 365/30-day
/// approximation is deliberate; it is not calendar-accurate.
#[must_use]
pub fn expiry_at(now: DateTime<Utc>, duration: &GrantDuration) -> Option<DateTime<Utc>> {
    if duration.is_empty() {
        return None;
    }

    let days = i64::from(duration.days.unwrap_or(0))
        + i64::from(duration.months.unwrap_or(0)) * 30
        + i64::from(duration.years.unwrap_or(0)) * 365;

    now.checked_add_signed(Duration::days(days))
}
