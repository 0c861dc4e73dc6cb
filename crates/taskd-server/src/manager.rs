use tracing::instrument;

use taskd_core::{NewTask, Task, TaskPatch, TaskStats};
use taskd_store::{StoreError, TaskRepo};

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Business-rule layer between transport and storage: validates input,
/// merges partial updates, defaults the completed flag. Absence is `None`,
/// never an error.
pub struct TaskManager {
    repo: TaskRepo,
}

impl TaskManager {
    pub fn new(repo: TaskRepo) -> Self {
        Self { repo }
    }

    pub fn list_all(&self) -> Result<Vec<Task>, TaskError> {
        Ok(self.repo.list_all()?)
    }

    /// Non-positive ids short-circuit without a store lookup.
    pub fn get_by_id(&self, id: i64) -> Result<Option<Task>, TaskError> {
        if id <= 0 {
            return Ok(None);
        }
        Ok(self.repo.find_by_id(id)?)
    }

    pub fn list_by_completed(&self, completed: bool) -> Result<Vec<Task>, TaskError> {
        Ok(self.repo.find_by_completed(completed)?)
    }

    /// Blank search text falls back to listing everything.
    pub fn search_by_title(&self, title: &str) -> Result<Vec<Task>, TaskError> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return self.list_all();
        }
        Ok(self.repo.search_by_title(trimmed)?)
    }

    #[instrument(skip(self, new))]
    pub fn create(&self, new: NewTask) -> Result<Task, TaskError> {
        let title = match new.title.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => return Err(TaskError::Validation("title is required".into())),
        };

        let task = Task {
            id: 0,
            title,
            description: new.description,
            completed: new.completed.unwrap_or(false),
            created_at: String::new(),
            updated_at: String::new(),
        };
        Ok(self.repo.save(task)?)
    }

    /// Merge non-absent patch fields into the existing record and persist.
    /// A blank patch title is ignored rather than rejected.
    #[instrument(skip(self, patch))]
    pub fn update(&self, id: i64, patch: TaskPatch) -> Result<Option<Task>, TaskError> {
        if id <= 0 {
            return Ok(None);
        }
        let Some(mut task) = self.repo.find_by_id(id)? else {
            return Ok(None);
        };

        if let Some(title) = patch.title.as_deref().map(str::trim) {
            if !title.is_empty() {
                task.title = title.to_string();
            }
        }
        if let Some(description) = patch.description {
            task.description = Some(description);
        }
        if let Some(completed) = patch.completed {
            task.completed = completed;
        }

        Ok(Some(self.repo.save(task)?))
    }

    #[instrument(skip(self))]
    pub fn delete(&self, id: i64) -> Result<bool, TaskError> {
        if id <= 0 {
            return Ok(false);
        }
        Ok(self.repo.delete_by_id(id)?)
    }

    /// Set the completed flag, defaulting to true when no flag is given.
    #[instrument(skip(self))]
    pub fn set_completed(&self, id: i64, completed: Option<bool>) -> Result<Option<Task>, TaskError> {
        if id <= 0 {
            return Ok(None);
        }
        let Some(mut task) = self.repo.find_by_id(id)? else {
            return Ok(None);
        };

        task.completed = completed.unwrap_or(true);
        Ok(Some(self.repo.save(task)?))
    }

    pub fn count_completed(&self) -> Result<i64, TaskError> {
        Ok(self.repo.count_by_completed(true)?)
    }

    pub fn count_pending(&self) -> Result<i64, TaskError> {
        Ok(self.repo.count_by_completed(false)?)
    }

    pub fn stats(&self) -> Result<TaskStats, TaskError> {
        Ok(TaskStats {
            completed: self.count_completed()?,
            pending: self.count_pending()?,
        })
    }
}
