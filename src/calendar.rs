//! Hijri display-string adjustment.
//!
//! The Hijri date arrives from the timings API as a pre-formatted string
//! ("DD Month, YYYY AH"). Moon-sighting differences mean users may want
//! the displayed day shifted by ±1 or ±2 without refetching.

/// Assumed Hijri month length for the display offset.
pub const HIJRI_MONTH_DAYS: i32 = 30;

/// Applies a cosmetic ±day offset to a Hijri date string of the form
/// `"DD Month, YYYY"` with an optional suffix (e.g. `" AH"`).
///
/// Known limitation: every month is assumed to have 30 days and the month
/// and year are never rolled over. The offset is a display-only
/// correction, not calendar arithmetic; a date like `"1 Ramadan, 1445 AH"`
/// adjusted by -1 yields `"30 Ramadan, 1445 AH"`, not a Sha'ban date.
/// Strings that do not match the expected shape are returned unchanged.
pub fn adjust_hijri_date(value: &str, adjustment: i32) -> String {
    if adjustment == 0 {
        return value.to_string();
    }

    let Some((day_part, rest)) = value.split_once(' ') else {
        return value.to_string();
    };
    let Ok(day) = day_part.trim().parse::<i32>() else {
        return value.to_string();
    };

    let mut day = day + adjustment;
    while day <= 0 {
        day += HIJRI_MONTH_DAYS;
    }
    while day > HIJRI_MONTH_DAYS {
        day -= HIJRI_MONTH_DAYS;
    }

    format!("{day} {rest}")
}
