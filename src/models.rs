use crate::streak::{DayMark, StreakStatus};
use crate::table::{Record, Table};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    #[serde(default)]
    pub users: BTreeMap<Uuid, User>,
    #[serde(default)]
    pub habits: Table<Habit>,
    #[serde(default)]
    pub journal: Table<JournalEntry>,
    #[serde(default)]
    pub tasks: Table<Task>,
    #[serde(default)]
    pub events: Table<CalendarEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Google,
    Github,
}

impl OAuthProvider {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "google" => Some(Self::Google),
            "github" => Some(Self::Github),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Github => "github",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::Github => "GitHub",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Credential {
    Password { hash: String },
    OAuth { provider: OAuthProvider },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub credential: Credential,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user: PublicUser,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
    Custom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    #[serde(default)]
    pub frequency: Frequency,
    pub color: Option<String>,
    pub reminder_time: Option<NaiveTime>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_dates: BTreeSet<NaiveDate>,
}

impl Record for Habit {
    const NAME: &'static str = "habit";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Uuid {
        self.user_id
    }
}

#[derive(Debug, Deserialize)]
pub struct NewHabit {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub frequency: Frequency,
    pub color: Option<String>,
    pub reminder_time: Option<NaiveTime>,
}

/// Absent fields are left alone; an empty string clears an optional field.
#[derive(Debug, Deserialize, Default)]
pub struct HabitPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub frequency: Option<Frequency>,
    pub color: Option<String>,
    pub reminder_time: Option<NaiveTime>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ToggleRequest {
    pub date: Option<NaiveDate>,
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub frequency: Frequency,
    pub color: Option<String>,
    pub reminder_time: Option<NaiveTime>,
    pub created_at: DateTime<Utc>,
    pub reference_date: NaiveDate,
    pub completed_today: bool,
    pub streak: u32,
    pub week: Vec<DayMarkView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayMarkView {
    pub date: NaiveDate,
    pub completed: bool,
}

impl From<DayMark> for DayMarkView {
    fn from(mark: DayMark) -> Self {
        Self {
            date: mark.date,
            completed: mark.completed,
        }
    }
}

impl HabitView {
    pub fn new(habit: &Habit, reference_date: NaiveDate, status: StreakStatus, week: Vec<DayMark>) -> Self {
        Self {
            id: habit.id,
            name: habit.name.clone(),
            description: habit.description.clone(),
            category: habit.category.clone(),
            frequency: habit.frequency,
            color: habit.color.clone(),
            reminder_time: habit.reminder_time,
            created_at: habit.created_at,
            reference_date,
            completed_today: status.completed_on_reference_date,
            streak: status.streak,
            week: week.into_iter().map(DayMarkView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategorySummary {
    pub name: String,
    pub color: Option<String>,
    pub habit_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Mood {
    Happy,
    Neutral,
    Sad,
    Excited,
    Tired,
    Other(String),
}

impl From<String> for Mood {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "happy" => Self::Happy,
            "neutral" => Self::Neutral,
            "sad" => Self::Sad,
            "excited" => Self::Excited,
            "tired" => Self::Tired,
            _ => Self::Other(value.trim().to_string()),
        }
    }
}

impl From<Mood> for String {
    fn from(mood: Mood) -> Self {
        mood.to_string()
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Happy => f.write_str("happy"),
            Self::Neutral => f.write_str("neutral"),
            Self::Sad => f.write_str("sad"),
            Self::Excited => f.write_str("excited"),
            Self::Tired => f.write_str("tired"),
            Self::Other(tag) => f.write_str(tag),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub mood: Option<Mood>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for JournalEntry {
    const NAME: &'static str = "journal entry";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Uuid {
        self.user_id
    }
}

#[derive(Debug, Deserialize)]
pub struct NewJournalEntry {
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub mood: Option<Mood>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct JournalPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub mood: Option<Mood>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Priority,
    pub category: Option<String>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Task {
    const NAME: &'static str = "task";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Uuid {
        self.user_id
    }
}

#[derive(Debug, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Priority,
    pub category: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(default)]
    pub all_day: bool,
    pub color: Option<String>,
    pub category: Option<String>,
}

impl Record for CalendarEvent {
    const NAME: &'static str = "event";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Uuid {
        self.user_id
    }
}

#[derive(Debug, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(default)]
    pub all_day: bool,
    pub color: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub all_day: Option<bool>,
    pub color: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub in_month: bool,
    pub events: Vec<CalendarEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    pub weeks: Vec<Vec<DayCell>>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListQuery {
    pub limit: Option<usize>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub completed: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WeeklyPoint {
    pub week: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub completed: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskSummary {
    pub total: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    Habit,
    Journal,
    Todo,
    General,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: AchievementCategory,
    pub progress: u32,
    pub target: u32,
    pub earned: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InsightsResponse {
    pub reference_date: NaiveDate,
    pub daily_completions: Vec<DailyPoint>,
    pub weekly_totals: Vec<WeeklyPoint>,
    pub completion_rate: u32,
    pub categories: Vec<CategorySummary>,
    pub tasks: TaskSummary,
    pub achievements: Vec<Achievement>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub date: NaiveDate,
    pub habits: Vec<HabitView>,
    pub habits_completed_today: usize,
    pub recent_entries: Vec<JournalEntry>,
    pub open_tasks: Vec<Task>,
    pub todays_events: Vec<CalendarEvent>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}
