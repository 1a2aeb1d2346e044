use crate::errors::{optional, required, AppError, Result};
use crate::models::{AppData, CalendarEvent, DayCell, EventPatch, MonthView, NewEvent};
use crate::table::Order;
use chrono::{Datelike, Days, Months, NaiveDate};
use tracing::info;
use uuid::Uuid;

pub fn list(data: &AppData, owner: Uuid) -> Vec<CalendarEvent> {
    data.events.select(owner, |e| e.start, Order::Asc, None)
}

/// Events touching `day`, by start time.
pub fn on_day(data: &AppData, owner: Uuid, day: NaiveDate) -> Vec<CalendarEvent> {
    list(data, owner)
        .into_iter()
        .filter(|event| covers(event, day))
        .collect()
}

pub fn create(data: &mut AppData, owner: Uuid, input: NewEvent) -> Result<CalendarEvent> {
    let event = CalendarEvent {
        id: Uuid::new_v4(),
        user_id: owner,
        title: required("title", &input.title)?,
        description: optional(input.description),
        start: input.start,
        end: input.end,
        all_day: input.all_day,
        color: optional(input.color),
        category: optional(input.category),
    };
    check_range(&event)?;
    let event = data.events.insert(event);
    info!(event_id = %event.id, "event created");
    Ok(event)
}

pub fn update(data: &mut AppData, owner: Uuid, id: Uuid, patch: EventPatch) -> Result<CalendarEvent> {
    let mut event = data.events.get(owner, id)?.clone();
    if let Some(title) = patch.title {
        event.title = required("title", &title)?;
    }
    if let Some(description) = patch.description {
        event.description = optional(Some(description));
    }
    if let Some(start) = patch.start {
        event.start = start;
    }
    if let Some(end) = patch.end {
        event.end = end;
    }
    if let Some(all_day) = patch.all_day {
        event.all_day = all_day;
    }
    if let Some(color) = patch.color {
        event.color = optional(Some(color));
    }
    if let Some(category) = patch.category {
        event.category = optional(Some(category));
    }
    check_range(&event)?;

    *data.events.get_mut(owner, id)? = event.clone();
    Ok(event)
}

pub fn delete(data: &mut AppData, owner: Uuid, id: Uuid) -> Result<()> {
    data.events.delete(owner, id)?;
    info!(event_id = %id, "event deleted");
    Ok(())
}

/// Sunday-first grid for one month, padded to whole weeks.
pub fn month_view(events: &[CalendarEvent], year: i32, month: u32) -> Result<MonthView> {
    if !(1..=12).contains(&month) {
        return Err(AppError::bad_request("month must be between 1 and 12"));
    }
    let out_of_range = || AppError::bad_request(format!("year {year} is outside the supported calendar"));
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(out_of_range)?;
    let days_in_month = days_in_month(first).ok_or_else(out_of_range)?;
    let leading = u64::from(first.weekday().num_days_from_sunday());
    let total_cells = (days_in_month + leading + 6) / 7 * 7;
    let grid_start = first
        .checked_sub_days(Days::new(leading))
        .ok_or_else(out_of_range)?;
    // The grid's last cell must exist as well.
    grid_start
        .checked_add_days(Days::new(total_cells - 1))
        .ok_or_else(out_of_range)?;

    let cells: Vec<DayCell> = (0..total_cells)
        .filter_map(|offset| grid_start.checked_add_days(Days::new(offset)))
        .map(|date| {
            let in_month = date.month() == month && date.year() == year;
            let events = if in_month {
                events.iter().filter(|e| covers(e, date)).cloned().collect()
            } else {
                Vec::new()
            };
            DayCell {
                date,
                in_month,
                events,
            }
        })
        .collect();

    Ok(MonthView {
        year,
        month,
        weeks: cells.chunks(7).map(<[DayCell]>::to_vec).collect(),
    })
}

fn days_in_month(first: NaiveDate) -> Option<u64> {
    let next = first.checked_add_months(Months::new(1))?;
    u64::try_from((next - first).num_days()).ok()
}

fn covers(event: &CalendarEvent, day: NaiveDate) -> bool {
    event.start.date() <= day && day <= event.end.date()
}

fn check_range(event: &CalendarEvent) -> Result<()> {
    if event.end < event.start {
        return Err(AppError::bad_request("event cannot end before it starts"));
    }
    Ok(())
}
