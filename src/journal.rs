use crate::errors::{required, Result};
use crate::models::{AppData, JournalEntry, JournalPatch, NewJournalEntry};
use crate::streak::calendar_day;
use crate::table::Order;
use chrono::{Local, Utc};
use std::collections::BTreeSet;
use std::fmt::Write;
use tracing::info;
use uuid::Uuid;

pub fn list(data: &AppData, owner: Uuid, limit: Option<usize>) -> Vec<JournalEntry> {
    data.journal.select(owner, |e| e.created_at, Order::Desc, limit)
}

pub fn get(data: &AppData, owner: Uuid, id: Uuid) -> Result<JournalEntry> {
    data.journal.get(owner, id).cloned()
}

pub fn create(data: &mut AppData, owner: Uuid, input: NewJournalEntry) -> Result<JournalEntry> {
    let now = Utc::now();
    let entry = JournalEntry {
        id: Uuid::new_v4(),
        user_id: owner,
        title: required("title", &input.title)?,
        content: input.content,
        mood: input.mood,
        tags: clean_tags(input.tags),
        created_at: now,
        updated_at: now,
    };
    let entry = data.journal.insert(entry);
    info!(entry_id = %entry.id, "journal entry created");
    Ok(entry)
}

pub fn update(data: &mut AppData, owner: Uuid, id: Uuid, patch: JournalPatch) -> Result<JournalEntry> {
    let title = patch
        .title
        .as_deref()
        .map(|title| required("title", title))
        .transpose()?;

    let entry = data.journal.get_mut(owner, id)?;
    if let Some(title) = title {
        entry.title = title;
    }
    if let Some(content) = patch.content {
        entry.content = content;
    }
    if let Some(mood) = patch.mood {
        entry.mood = Some(mood);
    }
    if let Some(tags) = patch.tags {
        entry.tags = clean_tags(tags);
    }
    entry.updated_at = Utc::now();
    Ok(entry.clone())
}

pub fn delete(data: &mut AppData, owner: Uuid, id: Uuid) -> Result<()> {
    data.journal.delete(owner, id)?;
    info!(entry_id = %id, "journal entry deleted");
    Ok(())
}

/// Plain-text dump of the entries in the order given.
pub fn export_text(entries: &[JournalEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let date = calendar_day(&entry.created_at.with_timezone(&Local));
        let mood = entry
            .mood
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "Not specified".to_string());
        let _ = write!(
            out,
            "Date: {date}\nTitle: {}\nMood: {mood}\n\n{}\n\n---\n\n",
            entry.title, entry.content
        );
    }
    out
}

fn clean_tags(tags: Vec<String>) -> BTreeSet<String> {
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::models::Mood;

    fn entry(title: &str) -> NewJournalEntry {
        NewJournalEntry {
            title: title.into(),
            content: "Slept well, long walk.".into(),
            mood: Some(Mood::Happy),
            tags: vec![" walk ".into(), "".into(), "walk".into(), "sleep".into()],
        }
    }

    #[test]
    fn create_cleans_tags_and_requires_title() {
        let mut data = AppData::default();
        let owner = Uuid::new_v4();
        let created = create(&mut data, owner, entry("Monday")).unwrap();
        assert_eq!(created.tags.len(), 2);
        assert!(created.tags.contains("walk"));

        assert!(matches!(
            create(&mut data, owner, entry("  ")),
            Err(AppError::Validation(_))
        ));
        assert_eq!(list(&data, owner, None).len(), 1);
    }

    #[test]
    fn list_is_newest_first_and_limited() {
        let mut data = AppData::default();
        let owner = Uuid::new_v4();
        for title in ["one", "two", "three"] {
            create(&mut data, owner, entry(title)).unwrap();
        }
        let ordered = list(&data, owner, None);
        assert!(ordered.windows(2).all(|w| w[0].created_at >= w[1].created_at));
        assert_eq!(list(&data, owner, Some(2)).len(), 2);
        assert!(list(&data, Uuid::new_v4(), None).is_empty());
    }

    #[test]
    fn update_touches_only_given_fields() {
        let mut data = AppData::default();
        let owner = Uuid::new_v4();
        let created = create(&mut data, owner, entry("Draft")).unwrap();

        let patch = JournalPatch {
            mood: Some(Mood::from("grateful".to_string())),
            ..Default::default()
        };
        let updated = update(&mut data, owner, created.id, patch).unwrap();
        assert_eq!(updated.title, "Draft");
        assert_eq!(updated.mood, Some(Mood::Other("grateful".into())));
        assert!(updated.updated_at >= created.updated_at);

        delete(&mut data, owner, created.id).unwrap();
        assert!(get(&data, owner, created.id).is_err());
    }

    #[test]
    fn export_lists_each_entry() {
        let mut data = AppData::default();
        let owner = Uuid::new_v4();
        create(&mut data, owner, entry("First")).unwrap();
        let mut quiet = entry("Second");
        quiet.mood = None;
        create(&mut data, owner, quiet).unwrap();

        let text = export_text(&list(&data, owner, None));
        assert_eq!(text.matches("---").count(), 2);
        assert!(text.contains("Title: First\nMood: happy"));
        assert!(text.contains("Title: Second\nMood: Not specified"));
    }

    #[test]
    fn mood_accepts_free_tags() {
        let mood: Mood = serde_json::from_str("\"Excited\"").unwrap();
        assert_eq!(mood, Mood::Excited);
        let mood: Mood = serde_json::from_str("\"calm\"").unwrap();
        assert_eq!(serde_json::to_string(&mood).unwrap(), "\"calm\"");
    }
}
