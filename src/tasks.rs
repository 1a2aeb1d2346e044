use crate::errors::{optional, required, Result};
use crate::models::{AppData, NewTask, Task, TaskPatch};
use crate::table::Order;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

pub fn list(data: &AppData, owner: Uuid, limit: Option<usize>) -> Vec<Task> {
    data.tasks.select(owner, |t| t.created_at, Order::Desc, limit)
}

/// Incomplete tasks, newest first.
pub fn open(data: &AppData, owner: Uuid, limit: usize) -> Vec<Task> {
    list(data, owner, None)
        .into_iter()
        .filter(|task| !task.completed)
        .take(limit)
        .collect()
}

pub fn create(data: &mut AppData, owner: Uuid, input: NewTask) -> Result<Task> {
    let now = Utc::now();
    let task = Task {
        id: Uuid::new_v4(),
        user_id: owner,
        title: required("title", &input.title)?,
        description: optional(input.description),
        due_date: input.due_date,
        priority: input.priority,
        category: optional(input.category),
        completed: input.completed,
        created_at: now,
        updated_at: now,
    };
    let task = data.tasks.insert(task);
    info!(task_id = %task.id, "task created");
    Ok(task)
}

pub fn update(data: &mut AppData, owner: Uuid, id: Uuid, patch: TaskPatch) -> Result<Task> {
    let title = patch
        .title
        .as_deref()
        .map(|title| required("title", title))
        .transpose()?;

    let task = data.tasks.get_mut(owner, id)?;
    if let Some(title) = title {
        task.title = title;
    }
    if let Some(description) = patch.description {
        task.description = optional(Some(description));
    }
    if let Some(due_date) = patch.due_date {
        task.due_date = Some(due_date);
    }
    if let Some(priority) = patch.priority {
        task.priority = priority;
    }
    if let Some(category) = patch.category {
        task.category = optional(Some(category));
    }
    if let Some(completed) = patch.completed {
        task.completed = completed;
    }
    task.updated_at = Utc::now();
    Ok(task.clone())
}

pub fn toggle(data: &mut AppData, owner: Uuid, id: Uuid) -> Result<Task> {
    let task = data.tasks.get_mut(owner, id)?;
    task.completed = !task.completed;
    task.updated_at = Utc::now();
    info!(task_id = %task.id, completed = task.completed, "task toggled");
    Ok(task.clone())
}

pub fn delete(data: &mut AppData, owner: Uuid, id: Uuid) -> Result<()> {
    data.tasks.delete(owner, id)?;
    info!(task_id = %id, "task deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::models::Priority;

    fn task(title: &str) -> NewTask {
        NewTask {
            title: title.into(),
            description: Some("  ".into()),
            due_date: None,
            priority: Priority::High,
            category: None,
            completed: false,
        }
    }

    #[test]
    fn create_and_toggle() {
        let mut data = AppData::default();
        let owner = Uuid::new_v4();
        let created = create(&mut data, owner, task("Pay bills")).unwrap();
        assert_eq!(created.description, None);
        assert_eq!(created.priority, Priority::High);

        assert!(toggle(&mut data, owner, created.id).unwrap().completed);
        assert!(!toggle(&mut data, owner, created.id).unwrap().completed);
    }

    #[test]
    fn blank_title_is_rejected() {
        let mut data = AppData::default();
        assert!(matches!(
            create(&mut data, Uuid::new_v4(), task("")),
            Err(AppError::Validation(_))
        ));
        assert!(data.tasks.is_empty());
    }

    #[test]
    fn open_skips_completed() {
        let mut data = AppData::default();
        let owner = Uuid::new_v4();
        let done = create(&mut data, owner, task("Done")).unwrap();
        create(&mut data, owner, task("Open")).unwrap();
        toggle(&mut data, owner, done.id).unwrap();

        let open = open(&data, owner, 5);
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].title, "Open");
    }

    #[test]
    fn update_and_delete_respect_ownership() {
        let mut data = AppData::default();
        let owner = Uuid::new_v4();
        let created = create(&mut data, owner, task("Call doctor")).unwrap();

        let patch = TaskPatch {
            priority: Some(Priority::Low),
            completed: Some(true),
            ..Default::default()
        };
        assert!(update(&mut data, Uuid::new_v4(), created.id, TaskPatch::default()).is_err());
        let updated = update(&mut data, owner, created.id, patch).unwrap();
        assert_eq!(updated.priority, Priority::Low);
        assert!(updated.completed);

        delete(&mut data, owner, created.id).unwrap();
        assert!(list(&data, owner, None).is_empty());
    }
}
