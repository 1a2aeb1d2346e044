use crate::errors::{optional, required, AppError, Result};
use crate::models::{
    AppData, CategorySummary, Habit, HabitPatch, HabitView, NewHabit, ToggleRequest,
};
use crate::streak::{apply_toggle, streak_status, week_marks};
use crate::table::Order;
use chrono::{NaiveDate, Utc};
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

pub const DEFAULT_CATEGORY: &str = "General";

/// Built-in category palette.
pub const DEFAULT_CATEGORIES: [(&str, &str); 5] = [
    ("Health", "#8B5CF6"),
    ("Productivity", "#3B82F6"),
    ("Learning", "#14B8A6"),
    ("Mindfulness", "#F97316"),
    ("Fitness", "#EF4444"),
];

pub fn view(habit: &Habit, reference: NaiveDate) -> HabitView {
    let status = streak_status(&habit.completed_dates, reference);
    HabitView::new(habit, reference, status, week_marks(&habit.completed_dates, reference))
}

/// Habits with their streak as of `reference`, newest first.
pub fn list(data: &AppData, owner: Uuid, reference: NaiveDate) -> Vec<HabitView> {
    data.habits
        .select(owner, |h| h.created_at, Order::Desc, None)
        .iter()
        .map(|habit| view(habit, reference))
        .collect()
}

pub fn create(data: &mut AppData, owner: Uuid, input: NewHabit, today: NaiveDate) -> Result<HabitView> {
    let habit = Habit {
        id: Uuid::new_v4(),
        user_id: owner,
        name: required("habit name", &input.name)?,
        description: optional(input.description),
        category: optional(input.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        frequency: input.frequency,
        color: optional(input.color),
        reminder_time: input.reminder_time,
        created_at: Utc::now(),
        completed_dates: Default::default(),
    };
    let habit = data.habits.insert(habit);
    info!(habit_id = %habit.id, "habit created");
    Ok(view(&habit, today))
}

pub fn update(
    data: &mut AppData,
    owner: Uuid,
    id: Uuid,
    patch: HabitPatch,
    today: NaiveDate,
) -> Result<HabitView> {
    let name = patch
        .name
        .as_deref()
        .map(|name| required("habit name", name))
        .transpose()?;

    let habit = data.habits.get_mut(owner, id)?;
    if let Some(name) = name {
        habit.name = name;
    }
    if let Some(description) = patch.description {
        habit.description = optional(Some(description));
    }
    if let Some(category) = patch.category {
        habit.category = optional(Some(category)).unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
    }
    if let Some(frequency) = patch.frequency {
        habit.frequency = frequency;
    }
    if let Some(color) = patch.color {
        habit.color = optional(Some(color));
    }
    if let Some(reminder_time) = patch.reminder_time {
        habit.reminder_time = Some(reminder_time);
    }
    Ok(view(habit, today))
}

/// Deleting a habit takes its completion history with it.
pub fn delete(data: &mut AppData, owner: Uuid, id: Uuid) -> Result<()> {
    let habit = data.habits.delete(owner, id)?;
    info!(habit_id = %habit.id, completions = habit.completed_dates.len(), "habit deleted");
    Ok(())
}

/// Marks or unmarks one day. `request.date` defaults to `today`; a missing
/// `request.completed` flips the current state.
pub fn toggle(
    data: &mut AppData,
    owner: Uuid,
    id: Uuid,
    request: ToggleRequest,
    today: NaiveDate,
) -> Result<HabitView> {
    let day = request.date.unwrap_or(today);
    if day > today {
        return Err(AppError::bad_request("cannot complete a habit in the future"));
    }

    let habit = data.habits.get_mut(owner, id)?;
    let completed = apply_toggle(&mut habit.completed_dates, day, request.completed);
    info!(habit_id = %habit.id, %day, completed, "habit toggled");
    Ok(view(habit, today))
}

/// Completion days, most recent first.
pub fn completions(data: &AppData, owner: Uuid, id: Uuid) -> Result<Vec<NaiveDate>> {
    let habit = data.habits.get(owner, id)?;
    Ok(habit.completed_dates.iter().rev().copied().collect())
}

/// Default palette first, then any custom categories in use.
pub fn categories(data: &AppData, owner: Uuid) -> Vec<CategorySummary> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for habit in data.habits.owned_by(owner) {
        *counts.entry(habit.category.as_str()).or_default() += 1;
    }

    let mut summaries: Vec<CategorySummary> = DEFAULT_CATEGORIES
        .iter()
        .map(|(name, color)| CategorySummary {
            name: name.to_string(),
            color: Some(color.to_string()),
            habit_count: counts.remove(name).unwrap_or(0),
        })
        .collect();
    summaries.extend(counts.into_iter().map(|(name, habit_count)| CategorySummary {
        name: name.to_string(),
        color: None,
        habit_count,
    }));
    summaries
}
