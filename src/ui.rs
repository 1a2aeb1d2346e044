use crate::models::{
    CalendarEvent, CategorySummary, DashboardResponse, HabitView, InsightsResponse, JournalEntry, MonthView,
    OAuthProvider, PublicUser, Task,
};
use std::collections::BTreeSet;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Login,
    Signup,
    AuthCallback,
    Dashboard,
    Journal,
    Tasks,
    Habits,
    Insights,
    Calendar,
}

impl Page {
    pub const ALL: [Page; 10] = [
        Page::Home,
        Page::Login,
        Page::Signup,
        Page::AuthCallback,
        Page::Dashboard,
        Page::Journal,
        Page::Tasks,
        Page::Habits,
        Page::Insights,
        Page::Calendar,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Page::Home => "/",
            Page::Login => "/auth/login",
            Page::Signup => "/auth/signup",
            Page::AuthCallback => "/auth/callback",
            Page::Dashboard => "/dashboard",
            Page::Journal => "/journal",
            Page::Tasks => "/tasks",
            Page::Habits => "/habits",
            Page::Insights => "/insights",
            Page::Calendar => "/calendar",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Page::Home => "Journalix",
            Page::Login => "Sign in",
            Page::Signup => "Create account",
            Page::AuthCallback => "Signing in",
            Page::Dashboard => "Dashboard",
            Page::Journal => "Journal",
            Page::Tasks => "Tasks",
            Page::Habits => "Habits",
            Page::Insights => "Insights",
            Page::Calendar => "Calendar",
        }
    }

    pub fn requires_session(self) -> bool {
        !matches!(
            self,
            Page::Home | Page::Login | Page::Signup | Page::AuthCallback
        )
    }
}

pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn layout(page: Page, user: Option<&PublicUser>, body: &str) -> String {
    let mut nav = String::new();
    if let Some(user) = user {
        for item in Page::ALL.into_iter().filter(|p| p.requires_session()) {
            let class = if item == page { " class=\"active\"" } else { "" };
            let _ = write!(nav, "<a href=\"{}\"{class}>{}</a>", item.path(), item.title());
        }
        let _ = write!(
            nav,
            "<form method=\"post\" action=\"/auth/signout\"><span>{}</span><button>Sign out</button></form>",
            escape(&user.name)
        );
    } else {
        nav.push_str("<a href=\"/auth/login\">Sign in</a><a href=\"/auth/signup\">Sign up</a>");
    }

    LAYOUT_HTML
        .replace("{{TITLE}}", page.title())
        .replace("{{NAV}}", &nav)
        .replace("{{BODY}}", body)
}

fn notice(error: Option<&str>) -> String {
    error
        .map(|message| format!("<p class=\"error\">{}</p>", escape(message)))
        .unwrap_or_default()
}

pub fn render_home(user: Option<&PublicUser>) -> String {
    let cta = match user {
        Some(_) => "<a class=\"button\" href=\"/dashboard\">Open dashboard</a>",
        None => "<a class=\"button\" href=\"/auth/signup\">Get started</a>",
    };
    let body = format!(
        "<section class=\"hero\"><h1>Journalix</h1>\
         <p>Habits, journal, tasks and calendar in one place.</p>{cta}</section>"
    );
    layout(Page::Home, user, &body)
}

pub fn render_login(error: Option<&str>) -> String {
    let mut body = format!("<h1>Welcome back!</h1>{}", notice(error));
    body.push_str(
        "<form class=\"card\" method=\"post\" action=\"/auth/login\">\
         <label>Email<input type=\"email\" name=\"email\" required></label>\
         <label>Password<input type=\"password\" name=\"password\" required></label>\
         <button>Sign in</button></form>",
    );
    body.push_str(&provider_links());
    body.push_str("<p>No account yet? <a href=\"/auth/signup\">Sign up</a></p>");
    layout(Page::Login, None, &body)
}

pub fn render_signup(error: Option<&str>) -> String {
    let mut body = format!("<h1>Join Journalix</h1>{}", notice(error));
    body.push_str(
        "<form class=\"card\" method=\"post\" action=\"/auth/signup\">\
         <label>Name<input name=\"name\" required></label>\
         <label>Email<input type=\"email\" name=\"email\" required></label>\
         <label>Password<input type=\"password\" name=\"password\" minlength=\"8\" required></label>\
         <button>Create account</button></form>",
    );
    body.push_str(&provider_links());
    body.push_str("<p>Already registered? <a href=\"/auth/login\">Sign in</a></p>");
    layout(Page::Signup, None, &body)
}

fn provider_links() -> String {
    [OAuthProvider::Google, OAuthProvider::Github]
        .into_iter()
        .map(|p| {
            format!(
                "<a class=\"button secondary\" href=\"/auth/oauth/{}\">Continue with {}</a>",
                p.as_str(),
                p.label()
            )
        })
        .collect()
}

/// Stand-in for the provider's consent screen.
pub fn render_consent(provider: OAuthProvider, state: &str) -> String {
    let body = format!(
        "<h1>Continue with {label}</h1>\
         <form class=\"card\" method=\"get\" action=\"/auth/callback\">\
         <input type=\"hidden\" name=\"provider\" value=\"{provider}\">\
         <input type=\"hidden\" name=\"state\" value=\"{state}\">\
         <label>{label} email<input type=\"email\" name=\"email\" required></label>\
         <label>Display name<input name=\"name\"></label>\
         <button>Authorize</button></form>",
        label = provider.label(),
        provider = provider.as_str(),
        state = escape(state),
    );
    layout(Page::AuthCallback, None, &body)
}

/// `full` adds the week strip and the delete control.
fn habit_rows(habits: &[HabitView], full: bool) -> String {
    if habits.is_empty() {
        return "<p class=\"muted\">No habits yet.</p>".to_string();
    }
    let mut out = String::from("<ul class=\"list\">");
    for habit in habits {
        let color = habit.color.as_deref().map(escape).unwrap_or_else(|| "#8B5CF6".into());
        let label = if habit.completed_today { "Undo" } else { "Done" };
        let _ = write!(
            out,
            "<li><span class=\"dot\" style=\"background:{color}\"></span>\
             <strong>{}</strong> <span class=\"muted\">{}</span> \
             <span class=\"badge\">{} day streak</span>",
            escape(&habit.name),
            escape(&habit.category),
            habit.streak
        );
        if full {
            out.push_str("<span class=\"week\">");
            for mark in &habit.week {
                let class = if mark.completed { "on" } else { "off" };
                let _ = write!(out, "<i class=\"{class}\" title=\"{}\"></i>", mark.date);
            }
            out.push_str("</span>");
        }
        let _ = write!(
            out,
            "<form method=\"post\" action=\"/habits/{}/toggle\"><button>{label}</button></form>",
            habit.id
        );
        if full {
            out.push_str(&delete_button(&format!("/habits/{}/delete", habit.id)));
        }
        out.push_str("</li>");
    }
    out.push_str("</ul>");
    out
}

fn delete_button(action: &str) -> String {
    format!(
        "<form method=\"post\" action=\"{action}\"><button class=\"secondary\">Delete</button></form>"
    )
}

fn task_rows(tasks: &[Task], editable: bool) -> String {
    if tasks.is_empty() {
        return "<p class=\"muted\">Nothing to do.</p>".to_string();
    }
    let mut out = String::from("<ul class=\"list\">");
    for task in tasks {
        let class = if task.completed { "done" } else { "" };
        let due = task
            .due_date
            .map(|d| format!(" <span class=\"muted\">due {d}</span>"))
            .unwrap_or_default();
        let _ = write!(
            out,
            "<li class=\"{class}\"><span class=\"badge {p}\">{p}</span> {}{due}\
             <form method=\"post\" action=\"/tasks/{}/toggle\"><button>{}</button></form>",
            escape(&task.title),
            task.id,
            if task.completed { "Reopen" } else { "Complete" },
            p = task.priority.as_str(),
        );
        if editable {
            out.push_str(&delete_button(&format!("/tasks/{}/delete", task.id)));
        }
        out.push_str("</li>");
    }
    out.push_str("</ul>");
    out
}

fn entry_cards(entries: &[JournalEntry], editable: bool) -> String {
    if entries.is_empty() {
        return "<p class=\"muted\">No entries yet.</p>".to_string();
    }
    let mut out = String::new();
    for entry in entries {
        let mood = entry
            .mood
            .as_ref()
            .map(|m| format!("<span class=\"badge\">{}</span>", escape(&m.to_string())))
            .unwrap_or_default();
        let tags: String = entry
            .tags
            .iter()
            .map(|t| format!("<span class=\"tag\">#{}</span>", escape(t)))
            .collect();
        let _ = write!(
            out,
            "<article class=\"card\"><h3>{} {mood}</h3><p class=\"muted\">{}</p><p>{}</p>{tags}",
            escape(&entry.title),
            entry.created_at.format("%Y-%m-%d %H:%M"),
            escape(&entry.content)
        );
        if editable {
            let _ = write!(
                out,
                "<details><summary>Edit</summary>{}</details>{}",
                journal_form(&format!("/journal/{}", entry.id), Some(entry)),
                delete_button(&format!("/journal/{}/delete", entry.id))
            );
        }
        out.push_str("</article>");
    }
    out
}

pub fn render_dashboard(user: &PublicUser, dashboard: &DashboardResponse) -> String {
    let events: String = dashboard
        .todays_events
        .iter()
        .map(|e| format!("<li>{} {}</li>", e.start.format("%H:%M"), escape(&e.title)))
        .collect();
    let body = format!(
        "<h1>Hello, {name}</h1><p class=\"muted\">{date}</p>\
         <section><h2>Habits <small>{done}/{total} today</small></h2>{habits}</section>\
         <section><h2>Recent journal</h2>{entries}</section>\
         <section><h2>Open tasks</h2>{tasks}</section>\
         <section><h2>Today</h2><ul class=\"list\">{events}</ul></section>",
        name = escape(&user.name),
        date = dashboard.date.format("%A, %B %-d, %Y"),
        done = dashboard.habits_completed_today,
        total = dashboard.habits.len(),
        habits = habit_rows(&dashboard.habits, false),
        entries = entry_cards(&dashboard.recent_entries, false),
        tasks = task_rows(&dashboard.open_tasks, false),
    );
    layout(Page::Dashboard, Some(user), &body)
}

pub fn render_habits(
    user: &PublicUser,
    habits: &[HabitView],
    categories: &[CategorySummary],
    error: Option<&str>,
) -> String {
    let chips: String = categories
        .iter()
        .map(|c| {
            format!(
                "<span class=\"tag\" style=\"border-color:{}\">{} ({})</span>",
                escape(c.color.as_deref().unwrap_or("#999")),
                escape(&c.name),
                c.habit_count
            )
        })
        .collect();
    let body = format!(
        "<h1>Habits</h1>{}<p>{chips}</p>{}{}",
        notice(error),
        HABIT_FORM_HTML,
        habit_rows(habits, true)
    );
    layout(Page::Habits, Some(user), &body)
}

/// Entry form, prefilled when editing.
fn journal_form(action: &str, entry: Option<&JournalEntry>) -> String {
    let title = entry.map(|e| escape(&e.title)).unwrap_or_default();
    let content = entry.map(|e| escape(&e.content)).unwrap_or_default();
    let mood = entry
        .and_then(|e| e.mood.as_ref())
        .map(|m| escape(&m.to_string()))
        .unwrap_or_default();
    let tags = entry
        .map(|e| escape(&e.tags.iter().cloned().collect::<Vec<_>>().join(", ")))
        .unwrap_or_default();
    let button = if entry.is_some() { "Save" } else { "Add entry" };
    format!(
        "<form class=\"card\" method=\"post\" action=\"{action}\">\
         <label>Title<input name=\"title\" value=\"{title}\" required></label>\
         <label>Entry<textarea name=\"content\" rows=\"4\">{content}</textarea></label>\
         <label>Mood<input name=\"mood\" value=\"{mood}\" list=\"moods\"></label>\
         <label>Tags<input name=\"tags\" value=\"{tags}\" placeholder=\"comma separated\"></label>\
         <button>{button}</button></form>"
    )
}

pub fn render_journal(user: &PublicUser, entries: &[JournalEntry], error: Option<&str>) -> String {
    let body = format!(
        "<h1>Journal</h1>{}<p><a href=\"/api/journal/export\">Export as text</a></p>\
         <datalist id=\"moods\"><option value=\"happy\"><option value=\"neutral\">\
         <option value=\"sad\"><option value=\"excited\"><option value=\"tired\"></datalist>{}{}",
        notice(error),
        journal_form(Page::Journal.path(), None),
        entry_cards(entries, true)
    );
    layout(Page::Journal, Some(user), &body)
}

pub fn render_tasks(user: &PublicUser, tasks: &[Task], error: Option<&str>) -> String {
    let body = format!(
        "<h1>Tasks</h1>{}{}{}",
        notice(error),
        TASK_FORM_HTML,
        task_rows(tasks, true)
    );
    layout(Page::Tasks, Some(user), &body)
}

pub fn render_insights(user: &PublicUser, insights: &InsightsResponse) -> String {
    let mut body = format!(
        "<h1>Insights</h1><div class=\"stats\">\
         <div class=\"card\"><h3>{}%</h3><p>habit completion, last 7 days</p></div>\
         <div class=\"card\"><h3>{}/{}</h3><p>tasks completed</p></div></div>",
        insights.completion_rate, insights.tasks.completed, insights.tasks.total
    );

    let peak = insights
        .daily_completions
        .iter()
        .map(|p| p.completed)
        .max()
        .unwrap_or(0)
        .max(1);
    body.push_str("<h2>Last 31 days</h2><div class=\"bars\">");
    for point in &insights.daily_completions {
        let _ = write!(
            body,
            "<i style=\"height:{}%\" title=\"{}: {}\"></i>",
            point.completed * 100 / peak,
            point.date,
            point.completed
        );
    }
    body.push_str("</div><h2>Weekly totals</h2><table><tr><th>Week</th><th>Completed</th></tr>");
    for week in &insights.weekly_totals {
        let _ = write!(body, "<tr><td>{}</td><td>{}</td></tr>", week.week, week.completed);
    }
    body.push_str("</table><h2>Categories</h2><ul class=\"list\">");
    for category in &insights.categories {
        let _ = write!(body, "<li>{}: {}</li>", escape(&category.name), category.habit_count);
    }
    body.push_str("</ul><h2>Achievements</h2><div class=\"stats\">");
    for achievement in &insights.achievements {
        let class = if achievement.earned { "card earned" } else { "card" };
        let _ = write!(
            body,
            "<div class=\"{class}\"><h3>{}</h3><p>{}</p>\
             <progress max=\"{}\" value=\"{}\"></progress></div>",
            escape(&achievement.name),
            escape(&achievement.description),
            achievement.target,
            achievement.progress
        );
    }
    body.push_str("</div>");
    layout(Page::Insights, Some(user), &body)
}

const CELL_EVENT_LIMIT: usize = 3;

pub fn render_calendar(user: &PublicUser, month: &MonthView, error: Option<&str>) -> String {
    let (prev_year, prev_month) = if month.month == 1 { (month.year - 1, 12) } else { (month.year, month.month - 1) };
    let (next_year, next_month) = if month.month == 12 { (month.year + 1, 1) } else { (month.year, month.month + 1) };

    let mut body = format!(
        "<h1>{}-{:02}</h1>{}<p><a href=\"/calendar?year={prev_year}&month={prev_month}\">&larr;</a> \
         <a href=\"/calendar?year={next_year}&month={next_month}\">&rarr;</a></p>\
         <table class=\"month\"><tr><th>Sun</th><th>Mon</th><th>Tue</th><th>Wed</th>\
         <th>Thu</th><th>Fri</th><th>Sat</th></tr>",
        month.year,
        month.month,
        notice(error)
    );
    for week in &month.weeks {
        body.push_str("<tr>");
        for cell in week {
            if !cell.in_month {
                body.push_str("<td class=\"muted\"></td>");
                continue;
            }
            let _ = write!(body, "<td><b>{}</b>", cell.date.format("%-d"));
            for event in cell.events.iter().take(CELL_EVENT_LIMIT) {
                let color = event.color.as_deref().map(escape).unwrap_or_else(|| "#3B82F6".into());
                let _ = write!(
                    body,
                    "<div class=\"event\" style=\"background:{color}\">{}</div>",
                    escape(&event.title)
                );
            }
            if cell.events.len() > CELL_EVENT_LIMIT {
                let _ = write!(body, "<div class=\"muted\">+{} more</div>", cell.events.len() - CELL_EVENT_LIMIT);
            }
            body.push_str("</td>");
        }
        body.push_str("</tr>");
    }
    body.push_str("</table>");

    let mut listed = BTreeSet::new();
    let mut events: Vec<&CalendarEvent> = month
        .weeks
        .iter()
        .flatten()
        .flat_map(|cell| &cell.events)
        .filter(|event| listed.insert(event.id))
        .collect();
    events.sort_by_key(|event| event.start);
    body.push_str("<h2>Events this month</h2><ul class=\"list\">");
    for event in events {
        let _ = write!(
            body,
            "<li>{} <strong>{}</strong>{}</li>",
            event.start.format("%b %-d %H:%M"),
            escape(&event.title),
            delete_button(&format!("/calendar/events/{}/delete", event.id))
        );
    }
    body.push_str("</ul>");
    body.push_str(EVENT_FORM_HTML);
    layout(Page::Calendar, Some(user), &body)
}

const HABIT_FORM_HTML: &str = r##"<form class="card" method="post" action="/habits">
  <label>Name<input name="name" required></label>
  <label>Description<input name="description"></label>
  <label>Category<input name="category" list="categories" placeholder="General"></label>
  <datalist id="categories">
    <option value="Health"><option value="Productivity"><option value="Learning">
    <option value="Mindfulness"><option value="Fitness">
  </datalist>
  <label>Frequency<select name="frequency">
    <option value="daily">Daily</option><option value="weekly">Weekly</option><option value="custom">Custom</option>
  </select></label>
  <label>Color<input type="color" name="color" value="#8b5cf6"></label>
  <label>Reminder<input type="time" name="reminder_time"></label>
  <button>Add habit</button>
</form>"##;

const TASK_FORM_HTML: &str = r##"<form class="card" method="post" action="/tasks">
  <label>Title<input name="title" required></label>
  <label>Description<input name="description"></label>
  <label>Due<input type="date" name="due_date"></label>
  <label>Priority<select name="priority">
    <option value="low">Low</option><option value="medium" selected>Medium</option><option value="high">High</option>
  </select></label>
  <label>Category<input name="category"></label>
  <button>Add task</button>
</form>"##;

const EVENT_FORM_HTML: &str = r##"<form class="card" method="post" action="/calendar/events">
  <label>Title<input name="title" required></label>
  <label>Description<input name="description"></label>
  <label>Starts<input type="datetime-local" name="start" required></label>
  <label>Ends<input type="datetime-local" name="end"></label>
  <label><input type="checkbox" name="all_day"> All day</label>
  <label>Color<input type="color" name="color" value="#3b82f6"></label>
  <button>Add event</button>
</form>"##;

const LAYOUT_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}} · Journalix</title>
  <style>
    :root {
      --bg: #f7f5fb;
      --ink: #24212b;
      --muted: #6d6878;
      --accent: #8b5cf6;
      --card: #ffffff;
      --line: #e4e0ec;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      background: var(--bg);
      color: var(--ink);
      font-family: "Inter", "Segoe UI", sans-serif;
    }

    nav {
      display: flex;
      gap: 16px;
      align-items: center;
      padding: 14px 28px;
      background: var(--card);
      border-bottom: 1px solid var(--line);
    }

    nav a {
      color: var(--muted);
      text-decoration: none;
    }

    nav a.active {
      color: var(--accent);
      font-weight: 600;
    }

    nav form {
      margin-left: auto;
      display: flex;
      gap: 10px;
      align-items: center;
    }

    main {
      width: min(960px, 100%);
      margin: 0 auto;
      padding: 28px;
    }

    .card {
      background: var(--card);
      border: 1px solid var(--line);
      border-radius: 14px;
      padding: 18px;
      margin-bottom: 14px;
    }

    .card.earned {
      border-color: var(--accent);
    }

    form.card label {
      display: grid;
      gap: 6px;
      margin-bottom: 12px;
    }

    input,
    select,
    textarea {
      padding: 9px 12px;
      border: 1px solid var(--line);
      border-radius: 8px;
      font: inherit;
    }

    button,
    .button {
      border: 0;
      border-radius: 8px;
      padding: 8px 14px;
      background: var(--accent);
      color: #fff;
      font: inherit;
      cursor: pointer;
      text-decoration: none;
      display: inline-block;
      margin: 4px 6px 4px 0;
    }

    .button.secondary,
    button.secondary {
      background: var(--ink);
    }

    .list {
      list-style: none;
      padding: 0;
    }

    .list li {
      display: flex;
      gap: 10px;
      align-items: center;
      padding: 10px 0;
      border-bottom: 1px solid var(--line);
    }

    .list li form {
      margin-left: auto;
    }

    .list li.done {
      text-decoration: line-through;
      color: var(--muted);
    }

    .dot {
      width: 12px;
      height: 12px;
      border-radius: 50%;
    }

    .badge,
    .tag {
      font-size: 0.8rem;
      padding: 2px 8px;
      border-radius: 999px;
      border: 1px solid var(--line);
      margin-right: 4px;
    }

    .badge.high {
      border-color: #ef4444;
    }

    .week i {
      display: inline-block;
      width: 14px;
      height: 14px;
      border-radius: 50%;
      margin-right: 3px;
      background: var(--line);
    }

    .week i.on {
      background: var(--accent);
    }

    .muted {
      color: var(--muted);
    }

    .error {
      color: #b91c1c;
    }

    .stats {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
      gap: 14px;
    }

    .bars {
      display: flex;
      align-items: flex-end;
      gap: 3px;
      height: 120px;
    }

    .bars i {
      flex: 1;
      min-height: 2px;
      background: var(--accent);
      border-radius: 3px 3px 0 0;
    }

    table {
      width: 100%;
      border-collapse: collapse;
    }

    td,
    th {
      border: 1px solid var(--line);
      padding: 6px;
      vertical-align: top;
    }

    .month td {
      height: 90px;
      width: 14%;
    }

    .event {
      color: #fff;
      font-size: 0.75rem;
      border-radius: 4px;
      padding: 1px 4px;
      margin-top: 2px;
    }

    .hero {
      text-align: center;
      padding: 80px 0;
    }
  </style>
</head>
<body>
  <nav><a href="/"><strong>Journalix</strong></a>{{NAV}}</nav>
  <main>{{BODY}}</main>
</body>
</html>
"##;
