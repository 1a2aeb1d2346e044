use super::pages::{after_submit, to_login};
use super::today;
use crate::auth::CurrentUser;
use crate::errors::{optional, AppError, Result};
use crate::models::{
    Frequency, JournalPatch, Mood, NewEvent, NewHabit, NewJournalEntry, NewTask, Priority,
};
use crate::state::AppState;
use crate::ui::Page;
use crate::{calendar, habits, journal, tasks};
use axum::{
    extract::{Path, State},
    response::Response,
    Form,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use uuid::Uuid;

/// Browsers submit empty inputs as empty strings, so every optional field
/// arrives as a `String` and is interpreted here.
#[derive(Debug, Deserialize)]
pub struct HabitForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub reminder_time: String,
}

#[derive(Debug, Deserialize)]
pub struct JournalForm {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub mood: String,
    #[serde(default)]
    pub tags: String,
}

#[derive(Debug, Deserialize)]
pub struct TaskForm {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Deserialize)]
pub struct EventForm {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start: String,
    #[serde(default)]
    pub end: String,
    pub all_day: Option<String>,
    #[serde(default)]
    pub color: String,
}

impl HabitForm {
    fn into_new(self) -> Result<NewHabit> {
        let reminder_time = optional(Some(self.reminder_time))
            .map(|value| {
                NaiveTime::parse_from_str(&value, "%H:%M")
                    .map_err(|_| AppError::bad_request("reminder time must look like 07:30"))
            })
            .transpose()?;
        Ok(NewHabit {
            name: self.name,
            description: Some(self.description),
            category: Some(self.category),
            frequency: self.frequency,
            color: Some(self.color),
            reminder_time,
        })
    }
}

impl JournalForm {
    fn mood(&self) -> Option<Mood> {
        optional(Some(self.mood.clone())).map(Mood::from)
    }

    fn tags(&self) -> Vec<String> {
        self.tags.split(',').map(str::to_string).collect()
    }

    fn into_new(self) -> NewJournalEntry {
        NewJournalEntry {
            mood: self.mood(),
            tags: self.tags(),
            title: self.title,
            content: self.content,
        }
    }

    fn into_patch(self) -> JournalPatch {
        JournalPatch {
            mood: self.mood(),
            tags: Some(self.tags()),
            title: Some(self.title),
            content: Some(self.content),
        }
    }
}

impl TaskForm {
    fn into_new(self) -> Result<NewTask> {
        let due_date = optional(Some(self.due_date))
            .map(|value| {
                NaiveDate::parse_from_str(&value, "%Y-%m-%d")
                    .map_err(|_| AppError::bad_request("due date must look like 2026-01-31"))
            })
            .transpose()?;
        Ok(NewTask {
            title: self.title,
            description: Some(self.description),
            due_date,
            priority: self.priority,
            category: Some(self.category),
            completed: false,
        })
    }
}

/// Accepts `datetime-local` values, with or without seconds.
fn parse_local(field: &str, value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| AppError::bad_request(format!("{field} must look like 2026-01-31T09:00")))
}

impl EventForm {
    fn into_new(self) -> Result<NewEvent> {
        let start = parse_local("start", &self.start)?;
        let end = match optional(Some(self.end)) {
            Some(end) => parse_local("end", &end)?,
            None => start,
        };
        Ok(NewEvent {
            title: self.title,
            description: Some(self.description),
            start,
            end,
            all_day: self.all_day.is_some(),
            color: Some(self.color),
            category: None,
        })
    }
}

pub async fn create_habit(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Form(form): Form<HabitForm>,
) -> Response {
    let Some(user) = user else {
        return to_login();
    };
    let owner = user.id();
    let result = match form.into_new() {
        Ok(input) => {
            state
                .store
                .mutate(|data| habits::create(data, owner, input, today()))
                .await
        }
        Err(err) => Err(err),
    };
    after_submit(Page::Habits, result.err())
}

pub async fn delete_habit(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Response {
    let Some(user) = user else {
        return to_login();
    };
    let owner = user.id();
    let result = state.store.mutate(|data| habits::delete(data, owner, id)).await;
    after_submit(Page::Habits, result.err())
}

pub async fn create_entry(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Form(form): Form<JournalForm>,
) -> Response {
    let Some(user) = user else {
        return to_login();
    };
    let owner = user.id();
    let input = form.into_new();
    let result = state
        .store
        .mutate(|data| journal::create(data, owner, input))
        .await;
    after_submit(Page::Journal, result.err())
}

pub async fn update_entry(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Path(id): Path<Uuid>,
    Form(form): Form<JournalForm>,
) -> Response {
    let Some(user) = user else {
        return to_login();
    };
    let owner = user.id();
    let patch = form.into_patch();
    let result = state
        .store
        .mutate(|data| journal::update(data, owner, id, patch))
        .await;
    after_submit(Page::Journal, result.err())
}

pub async fn delete_entry(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Response {
    let Some(user) = user else {
        return to_login();
    };
    let owner = user.id();
    let result = state.store.mutate(|data| journal::delete(data, owner, id)).await;
    after_submit(Page::Journal, result.err())
}

pub async fn create_task(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Form(form): Form<TaskForm>,
) -> Response {
    let Some(user) = user else {
        return to_login();
    };
    let owner = user.id();
    let result = match form.into_new() {
        Ok(input) => state.store.mutate(|data| tasks::create(data, owner, input)).await,
        Err(err) => Err(err),
    };
    after_submit(Page::Tasks, result.err())
}

pub async fn delete_task(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Response {
    let Some(user) = user else {
        return to_login();
    };
    let owner = user.id();
    let result = state.store.mutate(|data| tasks::delete(data, owner, id)).await;
    after_submit(Page::Tasks, result.err())
}

pub async fn create_event(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Form(form): Form<EventForm>,
) -> Response {
    let Some(user) = user else {
        return to_login();
    };
    let owner = user.id();
    let result = match form.into_new() {
        Ok(input) => {
            state
                .store
                .mutate(|data| calendar::create(data, owner, input))
                .await
        }
        Err(err) => Err(err),
    };
    after_submit(Page::Calendar, result.err())
}

pub async fn delete_event(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Response {
    let Some(user) = user else {
        return to_login();
    };
    let owner = user.id();
    let result = state.store.mutate(|data| calendar::delete(data, owner, id)).await;
    after_submit(Page::Calendar, result.err())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_habit_fields_are_dropped_by_create() {
        let form = HabitForm {
            name: "Stretch".into(),
            description: "   ".into(),
            category: String::new(),
            frequency: Frequency::Weekly,
            color: String::new(),
            reminder_time: "07:30".into(),
        };
        let input = form.into_new().unwrap();
        assert_eq!(input.reminder_time, NaiveTime::from_hms_opt(7, 30, 0));

        let mut data = crate::models::AppData::default();
        let view = habits::create(&mut data, Uuid::new_v4(), input, today()).unwrap();
        assert_eq!(view.category, habits::DEFAULT_CATEGORY);
        assert_eq!(view.description, None);
        assert_eq!(view.color, None);
    }

    #[test]
    fn journal_form_splits_tags_and_reads_mood() {
        let form = JournalForm {
            title: "Evening".into(),
            content: "Quiet day.".into(),
            mood: " Happy ".into(),
            tags: "rest, , walk".into(),
        };
        let entry = form.into_new();
        assert_eq!(entry.mood, Some(Mood::Happy));
        assert_eq!(entry.tags.len(), 3);
    }

    #[test]
    fn task_form_rejects_malformed_due_dates() {
        let form = TaskForm {
            title: "Pay rent".into(),
            description: String::new(),
            due_date: "tomorrow".into(),
            priority: Priority::High,
            category: String::new(),
        };
        assert!(matches!(form.into_new(), Err(AppError::Validation(_))));
    }

    #[test]
    fn event_form_defaults_end_to_start() {
        let form = EventForm {
            title: "Dentist".into(),
            description: String::new(),
            start: "2026-04-02T09:15".into(),
            end: String::new(),
            all_day: Some("on".into()),
            color: String::new(),
        };
        let event = form.into_new().unwrap();
        assert_eq!(event.start, event.end);
        assert!(event.all_day);
        assert!(parse_local("start", "April 2nd").is_err());
    }
}
