// ABOUTME: Calendar-day window computation for conversation summaries
// ABOUTME: Maps "today" in a given time zone onto an inclusive UTC range
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Granularity used to walk out of a DST gap
const GAP_STEP_MINUTES: i64 = 1;
/// Longest gap walked before giving up (one day of steps)
const MAX_GAP_STEPS: i64 = 24 * 60;

/// Inclusive `[00:00:00.000, 23:59:59.999]` of the day containing `now` in `tz`
///
/// A start boundary that falls into a DST gap moves forward to the first
/// local time that exists; an end boundary moves backward to the last one.
/// If no valid local time is found within a day the naive time is read as UTC.
#[must_use]
pub fn day_window<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let local_day = now.with_timezone(tz).date_naive();
    let start_naive = local_day.and_time(NaiveTime::MIN);
    let end_naive = local_day.and_time(
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN),
    );

    let step = Duration::minutes(GAP_STEP_MINUTES);
    let start = resolve_local(tz, start_naive, step, LocalResult::earliest);
    let end = resolve_local(tz, end_naive, -step, LocalResult::latest);

    (start, end)
}

fn resolve_local<Tz: TimeZone>(
    tz: &Tz,
    naive: NaiveDateTime,
    step: Duration,
    pick: fn(LocalResult<DateTime<Tz>>) -> Option<DateTime<Tz>>,
) -> DateTime<Utc> {
    let mut candidate = naive;
    for _ in 0..=MAX_GAP_STEPS {
        if let Some(dt) = pick(tz.from_local_datetime(&candidate)) {
            return dt.with_timezone(&Utc);
        }
        match candidate.checked_add_signed(step) {
            Some(next) => candidate = next,
            None => break,
        }
    }
    naive_as_utc(naive)
}

fn naive_as_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&naive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_utc_day_window() {
        let (start, end) = day_window(utc("2025-03-14T15:30:00Z"), &Utc);
        assert_eq!(start, utc("2025-03-14T00:00:00Z"));
        assert_eq!(end, utc("2025-03-14T23:59:59.999Z"));
        assert_eq!(end - start, Duration::days(1) - Duration::milliseconds(1));
    }

    #[test]
    fn test_offset_day_window_follows_local_date() {
        // 02:00 UTC is still the previous evening at UTC-5
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let (start, end) = day_window(utc("2025-03-14T02:00:00Z"), &tz);
        assert_eq!(start, utc("2025-03-13T05:00:00Z"));
        assert_eq!(end, utc("2025-03-14T04:59:59.999Z"));
    }

    /// Zone at UTC-4 that springs forward to UTC-3 at local midnight on
    /// 2025-09-07, so 00:00 to 00:59 that day never happens
    #[derive(Debug, Clone, Copy)]
    struct MidnightGap;

    impl MidnightGap {
        fn transition() -> NaiveDateTime {
            utc("2025-09-07T04:00:00Z").naive_utc()
        }

        fn before() -> FixedOffset {
            FixedOffset::west_opt(4 * 3600).unwrap()
        }

        fn after() -> FixedOffset {
            FixedOffset::west_opt(3 * 3600).unwrap()
        }
    }

    impl TimeZone for MidnightGap {
        type Offset = FixedOffset;

        fn from_offset(_offset: &FixedOffset) -> Self {
            Self
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_time(NaiveTime::MIN))
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let valid: Vec<FixedOffset> = [Self::before(), Self::after()]
                .into_iter()
                .filter(|offset| {
                    let as_utc = *local - Duration::seconds(i64::from(offset.local_minus_utc()));
                    (as_utc < Self::transition()) == (*offset == Self::before())
                })
                .collect();
            match valid.as_slice() {
                [] => LocalResult::None,
                [only] => LocalResult::Single(*only),
                [first, second, ..] => LocalResult::Ambiguous(*first, *second),
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_time(NaiveTime::MIN))
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            if *utc < Self::transition() {
                Self::before()
            } else {
                Self::after()
            }
        }
    }

    #[test]
    fn test_skipped_midnight_starts_at_first_valid_instant() {
        let (start, end) = day_window(utc("2025-09-07T15:00:00Z"), &MidnightGap);

        // local 01:00 at UTC-3
        assert_eq!(start, utc("2025-09-07T04:00:00Z"));
        assert_eq!(end, utc("2025-09-08T02:59:59.999Z"));

        // 23:30 the previous evening stays out of the window
        assert!(utc("2025-09-07T03:30:00Z") < start);
    }

    #[test]
    fn test_day_before_transition_unaffected() {
        let (start, end) = day_window(utc("2025-09-06T15:00:00Z"), &MidnightGap);
        assert_eq!(start, utc("2025-09-06T04:00:00Z"));
        assert_eq!(end, utc("2025-09-07T03:59:59.999Z"));
    }

    #[test]
    fn test_now_is_inside_window() {
        let now = utc("2025-07-01T23:59:59.500Z");
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let (start, end) = day_window(now, &tz);
        assert!(start <= now && now <= end);
    }
}
