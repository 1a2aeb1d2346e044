use crate::models::{
    Achievement, AchievementCategory, AppData, DailyPoint, DashboardResponse, Habit,
    InsightsResponse, TaskSummary, WeeklyPoint,
};
use crate::{calendar, habits, journal, tasks};
use crate::streak::{calendar_day, longest_streak, normalize_days};
use chrono::{DateTime, Datelike, Days, Local, NaiveDate};
use uuid::Uuid;

const DAILY_WINDOW: u64 = 31;
const WEEK_COUNT: u64 = 8;
const RATE_WINDOW: u64 = 7;
const DASHBOARD_ENTRIES: usize = 3;
const DASHBOARD_TASKS: usize = 5;

pub fn build_dashboard_at(today: NaiveDate, data: &AppData, owner: Uuid) -> DashboardResponse {
    let habits = habits::list(data, owner, today);
    let habits_completed_today = habits.iter().filter(|h| h.completed_today).count();

    DashboardResponse {
        date: today,
        habits,
        habits_completed_today,
        recent_entries: journal::list(data, owner, Some(DASHBOARD_ENTRIES)),
        open_tasks: tasks::open(data, owner, DASHBOARD_TASKS),
        todays_events: calendar::on_day(data, owner, today),
    }
}

pub fn build_insights_at(today: NaiveDate, data: &AppData, owner: Uuid) -> InsightsResponse {
    let owned: Vec<&Habit> = data.habits.owned_by(owner).collect();

    let daily_completions = days_back(today, DAILY_WINDOW)
        .map(|date| DailyPoint {
            date,
            completed: completed_on(&owned, date),
        })
        .collect();

    let current_week_start = week_start(today);
    let weekly_totals = (0..WEEK_COUNT)
        .rev()
        .filter_map(|offset| current_week_start.checked_sub_days(Days::new(offset * 7)))
        .map(|start| {
            let week: Vec<NaiveDate> = (0..7)
                .map_while(|day| start.checked_add_days(Days::new(day)))
                .collect();
            WeeklyPoint {
                week: week_label(start),
                start_date: start,
                end_date: week.last().copied().unwrap_or(start),
                completed: week.iter().map(|day| completed_on(&owned, *day)).sum(),
            }
        })
        .collect();

    let possible = owned.len() as i64 * RATE_WINDOW as i64;
    let done: i64 = days_back(today, RATE_WINDOW)
        .map(|date| completed_on(&owned, date) as i64)
        .sum();
    let completion_rate = if possible == 0 {
        0
    } else {
        ((done * 100 + possible / 2) / possible) as u32
    };

    let categories = habits::categories(data, owner)
        .into_iter()
        .filter(|category| category.habit_count > 0)
        .collect();

    let task_summary = TaskSummary {
        total: data.tasks.owned_by(owner).count(),
        completed: data.tasks.owned_by(owner).filter(|t| t.completed).count(),
    };

    InsightsResponse {
        reference_date: today,
        daily_completions,
        weekly_totals,
        completion_rate,
        categories,
        tasks: task_summary,
        achievements: achievements(data, owner),
    }
}

pub fn achievements(data: &AppData, owner: Uuid) -> Vec<Achievement> {
    let best_habit_run = data
        .habits
        .owned_by(owner)
        .map(|habit| longest_streak(&habit.completed_dates))
        .max()
        .unwrap_or(0);

    let written: Vec<DateTime<Local>> = data
        .journal
        .owned_by(owner)
        .map(|entry| entry.created_at.with_timezone(&Local))
        .collect();
    let journal_days = normalize_days(&written);

    let completed_tasks = data.tasks.owned_by(owner).filter(|t| t.completed).count() as u32;

    let mut active_days = journal_days.clone();
    for habit in data.habits.owned_by(owner) {
        active_days.extend(habit.completed_dates.iter().copied());
    }
    active_days.extend(
        data.tasks
            .owned_by(owner)
            .map(|task| calendar_day(&task.created_at.with_timezone(&Local))),
    );

    vec![
        achievement(
            "seven-day-streak",
            "7-Day Streak",
            "Complete a habit for 7 consecutive days",
            AchievementCategory::Habit,
            best_habit_run,
            7,
        ),
        achievement(
            "journal-master",
            "Journal Master",
            "Write in your journal on 10 different days",
            AchievementCategory::Journal,
            journal_days.len() as u32,
            10,
        ),
        achievement(
            "task-champion",
            "Task Champion",
            "Complete 50 tasks",
            AchievementCategory::Todo,
            completed_tasks,
            50,
        ),
        achievement(
            "thirty-day-milestone",
            "30-Day Milestone",
            "Stay active for 30 consecutive days",
            AchievementCategory::General,
            longest_streak(&active_days),
            30,
        ),
    ]
}

fn achievement(
    id: &str,
    name: &str,
    description: &str,
    category: AchievementCategory,
    progress: u32,
    target: u32,
) -> Achievement {
    Achievement {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        category,
        progress: progress.min(target),
        target,
        earned: progress >= target,
    }
}

fn completed_on(habits: &[&Habit], date: NaiveDate) -> usize {
    habits
        .iter()
        .filter(|habit| habit.completed_dates.contains(&date))
        .count()
}

/// `count` days ending at `today`, oldest first, clipped at the calendar's
/// lower bound.
fn days_back(today: NaiveDate, count: u64) -> impl Iterator<Item = NaiveDate> {
    (0..count)
        .rev()
        .filter_map(move |offset| today.checked_sub_days(Days::new(offset)))
}

fn week_start(date: NaiveDate) -> NaiveDate {
    let back = Days::new(u64::from(date.weekday().num_days_from_monday()));
    date.checked_sub_days(back).unwrap_or(date)
}

fn week_label(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewHabit, NewJournalEntry, NewTask, ToggleRequest};
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
    }

    fn add_habit(data: &mut AppData, owner: Uuid, name: &str, days_back: &[i64]) -> Uuid {
        let habit = habits::create(
            data,
            owner,
            NewHabit {
                name: name.into(),
                description: None,
                category: Some("Health".into()),
                frequency: Default::default(),
                color: None,
                reminder_time: None,
            },
            today(),
        )
        .unwrap();
        for offset in days_back {
            let request = ToggleRequest {
                date: Some(today() - Duration::days(*offset)),
                completed: Some(true),
            };
            habits::toggle(data, owner, habit.id, request, today()).unwrap();
        }
        habit.id
    }

    #[test]
    fn series_have_fixed_lengths() {
        let data = AppData::default();
        let insights = build_insights_at(today(), &data, Uuid::new_v4());
        assert_eq!(insights.daily_completions.len(), 31);
        assert_eq!(insights.weekly_totals.len(), 8);
        assert_eq!(insights.completion_rate, 0);
        assert!(insights.categories.is_empty());
        assert_eq!(insights.daily_completions.last().unwrap().date, today());
    }

    #[test]
    fn earliest_date_clips_series_instead_of_overflowing() {
        let insights = build_insights_at(NaiveDate::MIN, &AppData::default(), Uuid::new_v4());
        assert_eq!(insights.daily_completions.len(), 1);
        assert_eq!(insights.daily_completions[0].date, NaiveDate::MIN);
        assert!(insights.weekly_totals.len() <= 1);
    }

    #[test]
    fn counts_completions_per_day_and_week() {
        let mut data = AppData::default();
        let owner = Uuid::new_v4();
        add_habit(&mut data, owner, "Water", &[0, 1, 2]);
        add_habit(&mut data, owner, "Read", &[0, 8]);

        let insights = build_insights_at(today(), &data, owner);
        assert_eq!(insights.daily_completions.last().unwrap().completed, 2);

        // 2026-01-05 is a Monday, so the current week holds only today.
        let current = insights.weekly_totals.last().unwrap();
        assert_eq!(current.week, "2026-W02");
        assert_eq!(current.completed, 2);
        let previous = &insights.weekly_totals[6];
        assert_eq!(previous.completed, 2);

        // 4 of 14 habit-days in the last week.
        assert_eq!(insights.completion_rate, 29);
        assert_eq!(insights.categories.len(), 1);
        assert_eq!(insights.categories[0].name, "Health");
        assert_eq!(insights.categories[0].habit_count, 2);
    }

    #[test]
    fn achievements_track_progress() {
        let mut data = AppData::default();
        let owner = Uuid::new_v4();
        add_habit(&mut data, owner, "Water", &[0, 1, 2, 3, 4, 5, 6, 7]);
        journal::create(
            &mut data,
            owner,
            NewJournalEntry {
                title: "Today".into(),
                content: String::new(),
                mood: None,
                tags: vec![],
            },
        )
        .unwrap();
        let task = tasks::create(
            &mut data,
            owner,
            NewTask {
                title: "Ship".into(),
                description: None,
                due_date: None,
                priority: Default::default(),
                category: None,
                completed: true,
            },
        )
        .unwrap();
        assert!(task.completed);

        let list = achievements(&data, owner);
        let streak = list.iter().find(|a| a.id == "seven-day-streak").unwrap();
        assert!(streak.earned);
        assert_eq!(streak.progress, 7);

        let journal = list.iter().find(|a| a.id == "journal-master").unwrap();
        assert_eq!(journal.progress, 1);
        assert!(!journal.earned);

        let tasks = list.iter().find(|a| a.id == "task-champion").unwrap();
        assert_eq!(tasks.progress, 1);

        let active = list.iter().find(|a| a.id == "thirty-day-milestone").unwrap();
        assert!(active.progress >= 8);
        assert!(!active.earned);
    }

    #[test]
    fn other_users_data_is_excluded() {
        let mut data = AppData::default();
        let owner = Uuid::new_v4();
        add_habit(&mut data, owner, "Water", &[0]);

        let insights = build_insights_at(today(), &data, Uuid::new_v4());
        assert_eq!(insights.daily_completions.last().unwrap().completed, 0);
        assert!(insights.achievements.iter().all(|a| a.progress == 0));
    }

    #[test]
    fn dashboard_caps_lists() {
        let mut data = AppData::default();
        let owner = Uuid::new_v4();
        add_habit(&mut data, owner, "Water", &[0, 1]);
        add_habit(&mut data, owner, "Read", &[1]);
        for n in 0..7 {
            let title = format!("task {n}");
            tasks::create(
                &mut data,
                owner,
                NewTask {
                    title,
                    description: None,
                    due_date: None,
                    priority: Default::default(),
                    category: None,
                    completed: false,
                },
            )
            .unwrap();
        }

        let dashboard = build_dashboard_at(today(), &data, owner);
        assert_eq!(dashboard.habits.len(), 2);
        assert_eq!(dashboard.habits_completed_today, 1);
        assert_eq!(dashboard.open_tasks.len(), 5);
        assert!(dashboard.recent_entries.is_empty());
        assert!(dashboard.todays_events.is_empty());
    }
}
