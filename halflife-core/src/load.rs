//! Total active load across a dose log.

use chrono::{DateTime, Days, Duration, TimeZone, Utc};

use crate::decay::evaluate;
use crate::model::{DailyLoad, DayLoad, Dose};

/// Length of the trailing history shown by default.
pub const DEFAULT_HISTORY_DAYS: u32 = 14;

/// Whether `dose` counts towards the load of `target`'s calendar day.
///
/// Doses from later days are not part of that day's picture at all, which
/// keeps historical snapshots from showing doses that had not been taken yet.
pub fn is_eligible<Tz: TimeZone>(dose: &Dose, target: &DateTime<Tz>) -> bool {
    dose.timestamp.with_timezone(&target.timezone()).date_naive() <= target.date_naive()
}

/// Evaluate every eligible dose at `target` and sum what is still active.
///
/// All doses share the same evaluation instant, so the snapshot is internally
/// consistent. Input order is preserved in the result.
pub fn aggregate<Tz: TimeZone>(doses: &[Dose], target: &DateTime<Tz>) -> DailyLoad {
    let decayed: Vec<_> = doses
        .iter()
        .filter(|dose| is_eligible(dose, target))
        .map(|dose| evaluate(dose, target))
        .collect();

    let total_load = decayed.iter().map(|d| d.current_amount).sum();

    DailyLoad {
        date: target.date_naive(),
        as_of: target.with_timezone(&Utc),
        total_load,
        doses: decayed,
    }
}

/// Load for each of the `days` calendar days ending on `end`'s day, oldest
/// first.
///
/// Each day is evaluated at the same wall-clock time as `end`. The last point
/// is flagged as today.
pub fn trailing_history<Tz: TimeZone>(doses: &[Dose], end: &DateTime<Tz>, days: u32) -> Vec<DayLoad> {
    (0..days)
        .rev()
        .map(|back| {
            let target = days_before(end, back);
            let mut point = DayLoad::from(&aggregate(doses, &target));
            point.is_today = back == 0;
            point
        })
        .collect()
}

fn days_before<Tz: TimeZone>(end: &DateTime<Tz>, back: u32) -> DateTime<Tz> {
    // Calendar arithmetic fails when the wall-clock time does not exist on the
    // target day (DST gap); fall back to fixed 24h steps there.
    end.clone()
        .checked_sub_days(Days::new(u64::from(back)))
        .unwrap_or_else(|| end.clone() - Duration::days(i64::from(back)))
}
