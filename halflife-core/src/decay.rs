//! Exponential decay of a single dose.
//!
//! Two separate notions of time are used here and they are never derived
//! from one another:
//!
//! - **Elapsed hours** is continuous time between two instants and drives the
//!   decay curve `N(t) = N0 * (1/2)^(t / t_half)`.
//! - **Calendar days** are wall-clock dates in the evaluation zone and drive
//!   the same-day rule and the "days ago" figure.

use chrono::{DateTime, TimeZone, Utc};

use crate::model::{DecayedDose, Dose};

/// Half-life of the tracked substance.
pub const HALF_LIFE_DAYS: f64 = 6.5;

pub const HALF_LIFE_HOURS: f64 = HALF_LIFE_DAYS * 24.0;

/// Amount left from `initial` after `elapsed_hours` of elimination.
pub fn remaining_amount(initial: f64, elapsed_hours: f64) -> f64 {
    initial * 0.5_f64.powf(elapsed_hours / HALF_LIFE_HOURS)
}

/// Evaluate how much of `dose` is still active at `as_of`.
///
/// Calendar days are taken in the time zone of `as_of`. A dose evaluated on
/// its own calendar day is reported as fully intact regardless of the hour,
/// so a morning dose does not show as partly gone by the evening. An instant
/// before the dose (on an earlier day) leaves nothing active.
///
/// Never fails: every figure is clamped into its valid range.
pub fn evaluate<Tz: TimeZone>(dose: &Dose, as_of: &DateTime<Tz>) -> DecayedDose {
    let taken = dose.timestamp.with_timezone(&as_of.timezone());
    if is_same_day(&taken, as_of) {
        return DecayedDose::intact(dose);
    }

    let hours = elapsed_hours(&dose.timestamp, as_of);
    let current_amount = if hours < 0 || dose.amount <= 0.0 {
        0.0
    } else {
        remaining_amount(dose.amount, hours as f64).clamp(0.0, dose.amount)
    };
    let percentage_remaining = if dose.amount > 0.0 {
        (current_amount / dose.amount * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };

    DecayedDose {
        dose: dose.clone(),
        current_amount,
        percentage_remaining,
        elapsed_days: whole_days_between(&taken, as_of).max(0),
    }
}

/// Whole hours from `from` to `to`, truncated toward zero. Negative when `to`
/// is earlier.
pub fn elapsed_hours<Tz: TimeZone>(from: &DateTime<Utc>, to: &DateTime<Tz>) -> i64 {
    (to.with_timezone(&Utc) - *from).num_hours()
}

/// Whether both instants fall on the same wall-clock date.
pub fn is_same_day<Tz: TimeZone>(a: &DateTime<Tz>, b: &DateTime<Tz>) -> bool {
    a.date_naive() == b.date_naive()
}

/// Full wall-clock days from `earlier` to `later`.
///
/// Counts date boundaries, then drops the last one if the time of day has not
/// come round yet: 09:00 Monday to 08:00 Wednesday is one day, to 09:00
/// Wednesday is two. Using wall-clock dates keeps the count stable across
/// DST shifts where a day is not 24 hours long.
pub fn whole_days_between<Tz: TimeZone>(earlier: &DateTime<Tz>, later: &DateTime<Tz>) -> i64 {
    let mut days = (later.date_naive() - earlier.date_naive()).num_days();
    let (from_time, to_time) = (earlier.time(), later.time());
    if days > 0 && to_time < from_time {
        days -= 1;
    } else if days < 0 && to_time > from_time {
        days += 1;
    }
    days
}
