//! Next occurrence of a daily wall-clock time.

use crate::error::{KelimeError, Result};
use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone};

/// Longest local-time gap searched when the target falls inside a DST jump.
const MAX_GAP_MINUTES: i64 = 24 * 60;

/// The next `hour:minute:00` in `now`'s time zone.
///
/// Targets today when `now` is strictly earlier than today's `hour:minute`,
/// otherwise tomorrow. A target inside a DST gap resolves to the first valid
/// local instant after the gap; an ambiguous target (DST fold) resolves to
/// the earlier instant.
pub fn next_daily_occurrence<Tz: TimeZone>(
    now: &DateTime<Tz>,
    hour: u32,
    minute: u32,
) -> Result<DateTime<Tz>> {
    let tz = now.timezone();
    let today = now.date_naive();

    let target = resolve_local(&tz, at(today, hour, minute)?)?;
    if *now < target {
        return Ok(target);
    }

    let tomorrow = today
        .succ_opt()
        .ok_or_else(|| KelimeError::Scheduler("date out of range".to_owned()))?;
    resolve_local(&tz, at(tomorrow, hour, minute)?)
}

/// `next_daily_occurrence(now, ..) - now`, clamped at zero.
pub fn delay_until_next(now: &DateTime<impl TimeZone>, hour: u32, minute: u32) -> Result<Duration> {
    let target = next_daily_occurrence(now, hour, minute)?;
    Ok((target - now.clone()).max(Duration::zero()))
}

fn at(date: NaiveDate, hour: u32, minute: u32) -> Result<NaiveDateTime> {
    date.and_hms_opt(hour, minute, 0).ok_or_else(|| {
        KelimeError::Validation(format!("invalid send time {hour:02}:{minute:02}"))
    })
}

fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Result<DateTime<Tz>> {
    let mut candidate = naive;
    for _ in 0..=MAX_GAP_MINUTES {
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(t) => return Ok(t),
            LocalResult::Ambiguous(earliest, _) => return Ok(earliest),
            LocalResult::None => candidate += Duration::minutes(1),
        }
    }
    Err(KelimeError::Scheduler(format!(
        "no valid local time near {naive}"
    )))
}
