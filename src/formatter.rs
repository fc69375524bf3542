use core::fmt::Display;

use crate::error::ClockError;

pub const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Largest offset (either direction) accepted for a slot.
pub const MAX_OFFSET_HOURS: i32 = 48;

const SECS_PER_HOUR: i64 = 3_600;

/// Pad the rendered value with leading zeros up to `width` characters.
pub fn zero_fill(value: impl Display, width: usize) -> String {
    format!("{:0>width$}", value, width = width)
}

/// Break down `epoch_seconds + offset_hours` into UTC calendar fields.
fn shifted_fields(epoch_seconds: i64, offset_hours: i32) -> Result<libc::tm, ClockError> {
    let err = ClockError::Format {
        epoch_seconds,
        offset_hours,
    };
    if offset_hours.unsigned_abs() > MAX_OFFSET_HOURS as u32 {
        return Err(err);
    }
    let shifted = epoch_seconds
        .checked_add(offset_hours as i64 * SECS_PER_HOUR)
        .ok_or_else(|| err.clone())?;
    let t: libc::time_t = shifted.try_into().map_err(|_| err.clone())?;

    let mut tm: libc::tm = unsafe { std::mem::zeroed() };
    // Safety: both pointers refer to live locals for the duration of the call.
    let res = unsafe { libc::gmtime_r(&t, &mut tm) };
    if res.is_null() {
        return Err(err);
    }
    Ok(tm)
}

/// Time of day as "H:MM" (hour unpadded, 24h).
pub fn time_string(epoch_seconds: i64, offset_hours: i32) -> Result<String, ClockError> {
    let tm = shifted_fields(epoch_seconds, offset_hours)?;
    Ok(format!("{}:{}", tm.tm_hour, zero_fill(tm.tm_min, 2)))
}

/// Date as "DOW DD", e.g. "Tue 07".
pub fn date_string(epoch_seconds: i64, offset_hours: i32) -> Result<String, ClockError> {
    let tm = shifted_fields(epoch_seconds, offset_hours)?;
    let dow = usize::try_from(tm.tm_wday)
        .ok()
        .and_then(|i| DAY_NAMES.get(i))
        .ok_or(ClockError::Format {
            epoch_seconds,
            offset_hours,
        })?;
    Ok(format!("{} {}", dow, zero_fill(tm.tm_mday, 2)))
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-01-01T00:00:00Z, a Monday
    const NEW_YEAR_2024: i64 = 1_704_067_200;
    // 2023-11-14T22:13:20Z, a Tuesday
    const BILLENNIUM_AND_A_HALF: i64 = 1_700_000_000;

    #[test]
    fn zero_fill_pads_to_width() {
        assert_eq!(zero_fill(5, 2), "05");
        assert_eq!(zero_fill(42, 2), "42");
        assert_eq!(zero_fill(123, 2), "123");
        assert_eq!(zero_fill("7", 3), "007");
    }

    #[test]
    fn epoch_zero_is_thursday_midnight() {
        assert_eq!(time_string(0, 0).unwrap(), "0:00");
        assert_eq!(date_string(0, 0).unwrap(), "Thu 01");
    }

    #[test]
    fn hour_unpadded_minute_padded() {
        assert_eq!(time_string(BILLENNIUM_AND_A_HALF, 0).unwrap(), "22:13");
        assert_eq!(date_string(BILLENNIUM_AND_A_HALF, 0).unwrap(), "Tue 14");
        // 09:05 the same day
        let morning = NEW_YEAR_2024 + 9 * 3_600 + 5 * 60;
        assert_eq!(time_string(morning, 0).unwrap(), "9:05");
    }

    #[test]
    fn positive_offset_rolls_into_next_day() {
        assert_eq!(time_string(BILLENNIUM_AND_A_HALF, 2).unwrap(), "0:13");
        assert_eq!(date_string(BILLENNIUM_AND_A_HALF, 2).unwrap(), "Wed 15");
    }

    #[test]
    fn minute_before_midnight_across_offsets() {
        let e = NEW_YEAR_2024 - 60; // Sun 2023-12-31 23:59 UTC
        assert_eq!(time_string(e, 0).unwrap(), "23:59");
        assert_eq!(date_string(e, 0).unwrap(), "Sun 31");

        assert_eq!(time_string(e, -1).unwrap(), "22:59");
        assert_eq!(date_string(e, -1).unwrap(), "Sun 31");

        assert_eq!(time_string(e, 1).unwrap(), "0:59");
        assert_eq!(date_string(e, 1).unwrap(), "Mon 01");
    }

    #[test]
    fn negative_offset_rolls_back_a_day() {
        assert_eq!(time_string(NEW_YEAR_2024, -1).unwrap(), "23:00");
        assert_eq!(date_string(NEW_YEAR_2024, -1).unwrap(), "Sun 31");
        assert_eq!(date_string(NEW_YEAR_2024, -25).unwrap(), "Sat 30");
    }

    #[test]
    fn large_offsets_go_through_calendar() {
        // +14 (Kiribati) and -12 land on different calendar days
        assert_eq!(date_string(NEW_YEAR_2024, 14).unwrap(), "Mon 01");
        assert_eq!(date_string(NEW_YEAR_2024, -12).unwrap(), "Sun 31");
        assert_eq!(date_string(NEW_YEAR_2024, 48).unwrap(), "Wed 03");
    }

    #[test]
    fn weekday_matches_day_count() {
        // 1970-01-01 was a Thursday (index 4); walk a few thousand days.
        for day in (0..20_000i64).step_by(37) {
            for offset in [-11, -3, 0, 5, 13] {
                let e = day * 86_400 + 12 * 3_600;
                let shifted_days = (e + offset as i64 * 3_600).div_euclid(86_400);
                let expected = DAY_NAMES[((shifted_days + 4).rem_euclid(7)) as usize];
                let got = date_string(e, offset).unwrap();
                assert!(got.starts_with(expected), "{} vs {}", got, expected);
            }
        }
    }

    #[test]
    fn time_matches_arithmetic() {
        for e in (NEW_YEAR_2024..NEW_YEAR_2024 + 2 * 86_400).step_by(997) {
            for offset in [-7, 0, 9] {
                let secs_of_day = (e + offset as i64 * 3_600).rem_euclid(86_400);
                let expected = format!("{}:{:02}", secs_of_day / 3_600, (secs_of_day / 60) % 60);
                assert_eq!(time_string(e, offset).unwrap(), expected);
            }
        }
    }

    #[test]
    fn repeated_calls_are_identical() {
        let a = (time_string(NEW_YEAR_2024, 3), date_string(NEW_YEAR_2024, 3));
        let b = (time_string(NEW_YEAR_2024, 3), date_string(NEW_YEAR_2024, 3));
        assert_eq!(a, b);
    }

    #[test]
    fn out_of_range_offset_is_rejected() {
        assert_eq!(
            time_string(NEW_YEAR_2024, 49),
            Err(ClockError::Format {
                epoch_seconds: NEW_YEAR_2024,
                offset_hours: 49
            })
        );
        assert!(date_string(NEW_YEAR_2024, -100).is_err());
        assert!(time_string(i64::MAX, 1).is_err());
        assert!(time_string(0, i32::MIN).is_err());
        assert!(date_string(0, i32::MAX).is_err());
    }
}
