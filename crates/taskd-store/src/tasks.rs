use chrono::Utc;
use tracing::instrument;

use taskd_core::Task;

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

const TASK_COLUMNS: &str = "id, title, description, completed, created_at, updated_at";

/// Persistence for the tasks table. Performs no validation — that is the
/// manager's responsibility.
pub struct TaskRepo {
    db: Database,
}

impl TaskRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// List all tasks, ordered by id.
    #[instrument(skip(self))]
    pub fn list_all(&self) -> Result<Vec<Task>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY id"))?;
            let mut rows = stmt.query([])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(row_to_task(row)?);
            }
            Ok(results)
        })
    }

    /// List tasks filtered by the completed flag.
    #[instrument(skip(self))]
    pub fn find_by_completed(&self, completed: bool) -> Result<Vec<Task>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks WHERE completed = ?1 ORDER BY id"
            ))?;
            let mut rows = stmt.query([completed])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(row_to_task(row)?);
            }
            Ok(results)
        })
    }

    /// Case-sensitive unanchored substring search on title.
    #[instrument(skip(self))]
    pub fn search_by_title(&self, substring: &str) -> Result<Vec<Task>, StoreError> {
        let pattern = format!("%{}%", row_helpers::escape_like(substring));
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks WHERE title LIKE ?1 ESCAPE '\\' ORDER BY id"
            ))?;
            let mut rows = stmt.query([pattern])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(row_to_task(row)?);
            }
            Ok(results)
        })
    }

    /// Look up a task by id. Absence is `None`, not an error.
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: i64) -> Result<Option<Task>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"))?;
            let mut rows = stmt.query([id])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_task(row)?)),
                None => Ok(None),
            }
        })
    }

    /// Insert or update. `id == 0` means insert: the store assigns the id
    /// and both timestamps. Otherwise the row is updated in place with a
    /// fresh `updated_at`; `created_at` is never touched.
    #[instrument(skip(self, task), fields(task_id = task.id))]
    pub fn save(&self, mut task: Task) -> Result<Task, StoreError> {
        let now = Utc::now().to_rfc3339();
        self.db.with_conn(move |conn| {
            if task.id == 0 {
                conn.execute(
                    "INSERT INTO tasks (title, description, completed, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![task.title, task.description, task.completed, now, now],
                )?;
                task.id = conn.last_insert_rowid();
                task.created_at = now.clone();
                task.updated_at = now;
            } else {
                conn.execute(
                    "UPDATE tasks SET title = ?1, description = ?2, completed = ?3, updated_at = ?4
                     WHERE id = ?5",
                    rusqlite::params![task.title, task.description, task.completed, now, task.id],
                )?;
                task.updated_at = now;
            }
            Ok(task)
        })
    }

    /// Delete by id. Returns true iff a row existed and was removed.
    #[instrument(skip(self))]
    pub fn delete_by_id(&self, id: i64) -> Result<bool, StoreError> {
        self.db.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
            Ok(affected > 0)
        })
    }

    /// Count tasks with the given completed flag.
    #[instrument(skip(self))]
    pub fn count_by_completed(&self, completed: bool) -> Result<i64, StoreError> {
        self.db.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM tasks WHERE completed = ?1",
                [completed],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }
}

fn row_to_task(row: &rusqlite::Row<'_>) -> Result<Task, StoreError> {
    Ok(Task {
        id: row_helpers::get(row, 0, "tasks", "id")?,
        title: row_helpers::get(row, 1, "tasks", "title")?,
        description: row_helpers::get_opt(row, 2, "tasks", "description")?,
        completed: row_helpers::get(row, 3, "tasks", "completed")?,
        created_at: row_helpers::get(row, 4, "tasks", "created_at")?,
        updated_at: row_helpers::get(row, 5, "tasks", "updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> TaskRepo {
        TaskRepo::new(Database::in_memory().unwrap())
    }

    fn draft(title: &str) -> Task {
        Task {
            id: 0,
            title: title.to_string(),
            description: None,
            completed: false,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn save_inserts_and_assigns_id() {
        let repo = repo();
        let task = repo.save(draft("Buy milk")).unwrap();
        assert!(task.id > 0);
        assert!(!task.created_at.is_empty());
        assert_eq!(task.created_at, task.updated_at);
    }

    #[test]
    fn ids_are_unique_and_increasing() {
        let repo = repo();
        let a = repo.save(draft("a")).unwrap();
        let b = repo.save(draft("b")).unwrap();
        assert_ne!(a.id, b.id);
        assert!(b.id > a.id);
    }

    #[test]
    fn save_update_preserves_created_at() {
        let repo = repo();
        let mut task = repo.save(draft("original")).unwrap();
        let created = task.created_at.clone();

        std::thread::sleep(std::time::Duration::from_millis(5));
        task.title = "renamed".into();
        let updated = repo.save(task).unwrap();

        assert_eq!(updated.created_at, created);
        assert!(updated.updated_at >= created);

        let fetched = repo.find_by_id(updated.id).unwrap().unwrap();
        assert_eq!(fetched.title, "renamed");
        assert_eq!(fetched.created_at, created);
    }

    #[test]
    fn find_by_id_absent_is_none() {
        let repo = repo();
        assert!(repo.find_by_id(999).unwrap().is_none());
    }

    #[test]
    fn find_by_completed_filters() {
        let repo = repo();
        let mut done = repo.save(draft("done")).unwrap();
        repo.save(draft("pending")).unwrap();
        done.completed = true;
        repo.save(done).unwrap();

        let completed = repo.find_by_completed(true).unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].title, "done");

        let pending = repo.find_by_completed(false).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].title, "pending");
    }

    #[test]
    fn search_is_substring_and_case_sensitive() {
        let repo = repo();
        repo.save(draft("Buy milk")).unwrap();
        repo.save(draft("buy bread")).unwrap();

        let hits = repo.search_by_title("Buy").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Buy milk");

        let hits = repo.search_by_title("uy").unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn search_escapes_like_wildcards() {
        let repo = repo();
        repo.save(draft("100% done")).unwrap();
        repo.save(draft("100x done")).unwrap();

        let hits = repo.search_by_title("100%").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "100% done");
    }

    #[test]
    fn delete_by_id_reports_existence() {
        let repo = repo();
        let task = repo.save(draft("ephemeral")).unwrap();
        assert!(repo.delete_by_id(task.id).unwrap());
        assert!(!repo.delete_by_id(task.id).unwrap());
        assert!(repo.find_by_id(task.id).unwrap().is_none());
    }

    #[test]
    fn count_by_completed() {
        let repo = repo();
        repo.save(draft("a")).unwrap();
        let mut b = repo.save(draft("b")).unwrap();
        b.completed = true;
        repo.save(b).unwrap();

        assert_eq!(repo.count_by_completed(true).unwrap(), 1);
        assert_eq!(repo.count_by_completed(false).unwrap(), 1);
    }

    #[test]
    fn description_roundtrips_including_empty() {
        let repo = repo();
        let mut task = draft("with desc");
        task.description = Some("details".into());
        let saved = repo.save(task).unwrap();
        assert_eq!(saved.description.as_deref(), Some("details"));

        let mut saved = saved;
        saved.description = Some(String::new());
        let saved = repo.save(saved).unwrap();
        let fetched = repo.find_by_id(saved.id).unwrap().unwrap();
        assert_eq!(fetched.description.as_deref(), Some(""));
    }
}
