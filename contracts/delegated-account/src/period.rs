//! Budget window arithmetic on UTC ledger timestamps.

use crate::types::Period;

const MINUTE: u64 = 60;
const HOUR: u64 = 3_600;
const DAY: u64 = 86_400;

/// Window start reported for `Period::Forever`. Non-zero so it never reads as an
/// absent ledger row.
pub const FOREVER_WINDOW_START: u64 = 1;

/// Returns the start of the `period` window that contains `now`.
pub fn window_start(now: u64, period: Period) -> u64 {
    match period {
        Period::Minute => now - now % MINUTE,
        Period::Hour => now - now % HOUR,
        Period::Day => now - now % DAY,
        Period::Week => {
            let days = now / DAY;
            // 1970-01-01 was a Thursday; Monday-based weekday index.
            let weekday = (days + 3) % 7;
            days.saturating_sub(weekday) * DAY
        }
        Period::Month => {
            let (year, month, _) = civil_from_days(now / DAY);
            days_from_civil(year, month, 1) * DAY
        }
        Period::Year => {
            let (year, _, _) = civil_from_days(now / DAY);
            days_from_civil(year, 1, 1) * DAY
        }
        Period::Forever => FOREVER_WINDOW_START,
    }
}

/// Days since 1970-01-01 to (year, month, day) in the proleptic Gregorian calendar.
fn civil_from_days(days: u64) -> (u64, u64, u64) {
    let z = days + 719_468;
    let era = z / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + u64::from(month <= 2);
    (year, month, day)
}

/// Inverse of `civil_from_days` for dates on or after 1970-01-01.
fn days_from_civil(year: u64, month: u64, day: u64) -> u64 {
    let year = if month <= 2 { year - 1 } else { year };
    let era = year / 400;
    let yoe = year - era * 400;
    let mp = if month > 2 { month - 3 } else { month + 9 };
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

#[cfg(test)]
mod test {
    use super::*;

    const ALL_PERIODS: [Period; 7] = [
        Period::Minute,
        Period::Hour,
        Period::Day,
        Period::Week,
        Period::Month,
        Period::Year,
        Period::Forever,
    ];

    // 2024-03-15T12:34:56Z, a Friday in a leap year.
    const MID_MARCH_2024: u64 = 1_710_506_096;

    #[test]
    fn test_fixed_windows() {
        assert_eq!(window_start(MID_MARCH_2024, Period::Minute), 1_710_506_040);
        assert_eq!(window_start(MID_MARCH_2024, Period::Hour), 1_710_504_000);
        assert_eq!(window_start(MID_MARCH_2024, Period::Day), 1_710_460_800);
    }

    #[test]
    fn test_week_starts_on_monday() {
        // Monday 2024-03-11
        assert_eq!(window_start(MID_MARCH_2024, Period::Week), 1_710_115_200);
        // Sunday 2021-01-03 belongs to the week of Monday 2020-12-28
        assert_eq!(window_start(1_609_668_000, Period::Week), 1_609_113_600);
        // 1970-01-05 is the first Monday after the epoch
        assert_eq!(window_start(345_600, Period::Week), 345_600);
    }

    #[test]
    fn test_month_and_year_are_calendar_aware() {
        assert_eq!(window_start(MID_MARCH_2024, Period::Month), 1_709_251_200);
        assert_eq!(window_start(MID_MARCH_2024, Period::Year), 1_704_067_200);

        // Last second of leap day still belongs to February
        assert_eq!(window_start(1_709_251_199, Period::Month), 1_706_745_600);
        // New Year's Eve
        assert_eq!(window_start(1_735_689_599, Period::Month), 1_733_011_200);
        assert_eq!(window_start(1_735_689_599, Period::Year), 1_704_067_200);
    }

    #[test]
    fn test_forever_is_constant_and_non_zero() {
        assert_eq!(window_start(0, Period::Forever), FOREVER_WINDOW_START);
        assert_eq!(window_start(MID_MARCH_2024, Period::Forever), FOREVER_WINDOW_START);
    }

    #[test]
    fn test_window_start_bounded_and_idempotent() {
        let samples: [u64; 8] = [
            1,
            59,
            345_600,
            1_609_668_000,
            1_672_531_200,
            1_709_251_199,
            MID_MARCH_2024,
            4_102_444_799,
        ];
        for now in samples {
            for period in ALL_PERIODS {
                let start = window_start(now, period);
                assert!(start <= now);
                assert_eq!(window_start(start, period), start);
            }
        }

        // Forever keeps its non-zero constant, so t = 0 is the one point above the bound.
        for period in ALL_PERIODS {
            let start = window_start(0, period);
            if period == Period::Forever {
                assert!(start > 0);
            } else {
                assert_eq!(start, 0);
            }
        }
    }

    #[test]
    fn test_calendar_round_trip() {
        for days in [0u64, 59, 365, 11_016, 19_797, 20_088, 47_482] {
            let (year, month, day) = civil_from_days(days);
            assert_eq!(days_from_civil(year, month, day), days);
        }
    }
}
