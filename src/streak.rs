use chrono::{DateTime, Days, NaiveDate, TimeZone};
use serde::Serialize;
use std::collections::BTreeSet;

/// Upper bound on how many days the backward walk may count.
pub const MAX_LOOKBACK_DAYS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreakStatus {
    pub completed_on_reference_date: bool,
    pub streak: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayMark {
    pub date: NaiveDate,
    pub completed: bool,
}

/// Calendar day of a timestamp, taken in the timestamp's own offset.
pub fn calendar_day<Tz: TimeZone>(at: &DateTime<Tz>) -> NaiveDate {
    at.date_naive()
}

pub fn normalize_days<'a, Tz, I>(timestamps: I) -> BTreeSet<NaiveDate>
where
    Tz: TimeZone + 'a,
    I: IntoIterator<Item = &'a DateTime<Tz>>,
{
    timestamps.into_iter().map(calendar_day).collect()
}

/// Streak anchored at `reference`: consecutive completed days ending there.
/// A missing reference day yields zero no matter what came before it.
pub fn streak_status(days: &BTreeSet<NaiveDate>, reference: NaiveDate) -> StreakStatus {
    let completed_on_reference_date = days.contains(&reference);

    let mut streak = 0u32;
    let mut cursor = Some(reference);
    while let Some(day) = cursor {
        if streak >= MAX_LOOKBACK_DAYS || !days.contains(&day) {
            break;
        }
        streak += 1;
        cursor = day.pred_opt();
    }

    StreakStatus {
        completed_on_reference_date,
        streak,
    }
}

/// Longest run of consecutive days anywhere in the set.
pub fn longest_streak(days: &BTreeSet<NaiveDate>) -> u32 {
    let mut best = 0u32;
    let mut run = 0u32;
    let mut previous: Option<NaiveDate> = None;

    for &day in days {
        run = match previous.and_then(|prev| prev.succ_opt()) {
            Some(next) if next == day => run + 1,
            _ => 1,
        };
        best = best.max(run);
        previous = Some(day);
    }

    best
}

/// Seven markers ending at `reference`, oldest first. Days before the
/// earliest representable date are left out.
pub fn week_marks(days: &BTreeSet<NaiveDate>, reference: NaiveDate) -> Vec<DayMark> {
    (0..7u64)
        .rev()
        .filter_map(|offset| reference.checked_sub_days(Days::new(offset)))
        .map(|date| DayMark {
            date,
            completed: days.contains(&date),
        })
        .collect()
}

/// Sets membership of `day`. `None` flips it. Returns the resulting state.
pub fn apply_toggle(days: &mut BTreeSet<NaiveDate>, day: NaiveDate, completed: Option<bool>) -> bool {
    let target = completed.unwrap_or(!days.contains(&day));
    if target {
        days.insert(day);
    } else {
        days.remove(&day);
    }
    target
}
