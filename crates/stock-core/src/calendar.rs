//! Trading-day approximation for US equities.
//!
//! Weekends are skipped; exchange holidays and early closes are not modelled.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;

pub const EXCHANGE_TZ: Tz = chrono_tz::America::New_York;

/// Local time after which today's session is treated as closed and settled
/// (16:00 close plus a short buffer).
pub const SESSION_CUTOFF_HOUR: u32 = 16;
pub const SESSION_CUTOFF_MINUTE: u32 = 10;

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Roll back one day at a time until `date` is a weekday.
pub fn roll_back_to_weekday(mut date: NaiveDate) -> NaiveDate {
    while is_weekend(date) {
        date -= Duration::days(1);
    }
    date
}

/// The weekday strictly before `date`.
pub fn previous_weekday(date: NaiveDate) -> NaiveDate {
    roll_back_to_weekday(date - Duration::days(1))
}

/// Most recent session considered closed as of `now`.
///
/// Weekends map to the preceding Friday. On a weekday before 16:10 New York
/// time the previous weekday is used, since today's bar is not final yet.
pub fn reference_trading_date(now: DateTime<Utc>) -> NaiveDate {
    let local = now.with_timezone(&EXCHANGE_TZ);
    let today = local.date_naive();
    let date = roll_back_to_weekday(today);

    let cutoff = NaiveTime::from_hms_opt(SESSION_CUTOFF_HOUR, SESSION_CUTOFF_MINUTE, 0)
        .unwrap_or(NaiveTime::MIN);
    if date == today && local.time() < cutoff {
        return previous_weekday(date);
    }
    date
}
