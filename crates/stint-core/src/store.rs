use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::filter::Filter;
use crate::notify::{Notice, Severity};
use crate::storage::Storage;
use crate::task::Task;

pub const TASKS_KEY: &str = "tasks";

/// What a mutating operation did. `changed` is false for silent no-ops
/// (missing id, empty add, nothing to clear) so callers and tests can
/// assert exactly what happened.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub changed: bool,
    pub notice: Option<Notice>,
    pub celebrate: bool,
    pub task_id: Option<u64>,
}

impl Outcome {
    fn noop() -> Self {
        Self::default()
    }

    fn rejected(key: &'static str) -> Self {
        Self {
            changed: false,
            notice: Some(Notice::new(key, Severity::Warning)),
            celebrate: false,
            task_id: None,
        }
    }
}

/// Counts for the current filter: `(active, total)` under `All`, the
/// matching count under `Active` / `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountSummary {
    All { active: usize, total: usize },
    Active { count: usize },
    Completed { count: usize },
}

/// Owns the ordered task collection (front = newest) and the storage it
/// persists to. Every mutation writes the collection back before returning.
#[derive(Debug)]
pub struct TaskStore<S: Storage> {
    storage: S,
    tasks: Vec<Task>,
}

impl<S: Storage> TaskStore<S> {
    /// Loads the collection from storage. An absent key or a payload that
    /// fails to parse both yield an empty collection; the corrupt case is
    /// logged rather than surfaced.
    #[tracing::instrument(skip(storage))]
    pub fn open(storage: S) -> anyhow::Result<Self> {
        let tasks = match storage.get(TASKS_KEY)? {
            None => vec![],
            Some(raw) => match serde_json::from_str::<Vec<Task>>(&raw) {
                Ok(tasks) => tasks,
                Err(err) => {
                    warn!(error = %err, "stored tasks are not valid JSON; starting empty");
                    vec![]
                }
            },
        };

        info!(count = tasks.len(), "loaded task collection");
        Ok(Self { storage, tasks })
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    fn persist(&mut self) -> anyhow::Result<()> {
        let payload =
            serde_json::to_string(&self.tasks).context("failed to serialize task collection")?;
        self.storage.set(TASKS_KEY, &payload)
    }

    /// Fresh unique id: creation timestamp in milliseconds, bumped past any
    /// id already in the collection (same-millisecond adds collide).
    fn next_id(&self, now: DateTime<Utc>) -> u64 {
        let mut candidate = now.timestamp_millis().max(0) as u64;
        while self.tasks.iter().any(|t| t.id == candidate) {
            candidate += 1;
        }
        candidate
    }

    #[tracing::instrument(skip(self, text))]
    pub fn add(&mut self, text: &str, now: DateTime<Utc>) -> anyhow::Result<Outcome> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            debug!("rejected add with empty text");
            return Ok(Outcome::rejected("notificationEnterTask"));
        }

        let id = self.next_id(now);
        self.tasks.insert(0, Task::new(trimmed.to_string(), now, id));
        self.persist()?;

        info!(id, "task added");
        Ok(Outcome {
            changed: true,
            notice: Some(Notice::new("notificationTaskAdded", Severity::Success)),
            celebrate: false,
            task_id: Some(id),
        })
    }

    /// Flips `completed` on the matching task. Completing celebrates and
    /// notifies; un-completing is silent. Missing id is a silent no-op.
    #[tracing::instrument(skip(self))]
    pub fn toggle_complete(&mut self, id: u64) -> anyhow::Result<Outcome> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            debug!(id, "toggle target not found; ignoring");
            return Ok(Outcome::noop());
        };

        task.completed = !task.completed;
        let completed = task.completed;
        self.persist()?;

        info!(id, completed, "task toggled");
        Ok(Outcome {
            changed: true,
            notice: completed
                .then(|| Notice::new("notificationTaskCompleted", Severity::Success)),
            celebrate: completed,
            task_id: Some(id),
        })
    }

    /// Replaces the task text in place; an empty replacement is an implicit
    /// delete request. Missing id is a silent no-op.
    #[tracing::instrument(skip(self, new_text))]
    pub fn edit(&mut self, id: u64, new_text: &str) -> anyhow::Result<Outcome> {
        let trimmed = new_text.trim();
        if trimmed.is_empty() {
            debug!(id, "empty edit treated as delete");
            return self.delete(id);
        }

        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            debug!(id, "edit target not found; ignoring");
            return Ok(Outcome::noop());
        };

        task.text = trimmed.to_string();
        self.persist()?;

        info!(id, "task updated");
        Ok(Outcome {
            changed: true,
            notice: Some(Notice::new("notificationTaskUpdated", Severity::Info)),
            celebrate: false,
            task_id: Some(id),
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn delete(&mut self, id: u64) -> anyhow::Result<Outcome> {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            debug!(id, "delete target not found; ignoring");
            return Ok(Outcome::noop());
        }

        self.persist()?;

        info!(id, "task deleted");
        Ok(Outcome {
            changed: true,
            notice: Some(Notice::new("notificationTaskDeleted", Severity::Danger)),
            celebrate: false,
            task_id: Some(id),
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn clear_completed(&mut self) -> anyhow::Result<Outcome> {
        if !self.tasks.iter().any(|t| t.completed) {
            debug!("nothing completed to clear");
            return Ok(Outcome::rejected("notificationNoCompleted"));
        }

        let before = self.tasks.len();
        self.tasks.retain(|t| !t.completed);
        self.persist()?;

        info!(removed = before - self.tasks.len(), "cleared completed tasks");
        Ok(Outcome {
            changed: true,
            notice: Some(Notice::new("notificationCleared", Severity::Info)),
            celebrate: false,
            task_id: None,
        })
    }

    /// Seeds a couple of example tasks at the front, for the first-run
    /// empty state.
    #[tracing::instrument(skip(self))]
    pub fn add_samples(&mut self, now: DateTime<Utc>) -> anyhow::Result<Outcome> {
        for text in ["Buy groceries", "Complete project presentation"] {
            let id = self.next_id(now);
            self.tasks.insert(0, Task::new(text.to_string(), now, id));
        }
        self.persist()?;

        info!("sample tasks added");
        Ok(Outcome {
            changed: true,
            notice: Some(Notice::new("notificationTaskAdded", Severity::Success)),
            celebrate: false,
            task_id: None,
        })
    }

    /// Pure projection: the subsequence matching `filter`, in collection
    /// order (front = newest).
    pub fn filtered_view(&self, filter: Filter) -> Vec<&Task> {
        self.tasks.iter().filter(|t| filter.matches(t)).collect()
    }

    /// Pure projection: the counts the current filter needs.
    pub fn counts(&self, filter: Filter) -> CountSummary {
        let active = self.tasks.iter().filter(|t| !t.completed).count();
        match filter {
            Filter::All => CountSummary::All {
                active,
                total: self.tasks.len(),
            },
            Filter::Active => CountSummary::Active { count: active },
            Filter::Completed => CountSummary::Completed {
                count: self.tasks.len() - active,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    use super::{CountSummary, TaskStore};
    use crate::filter::Filter;
    use crate::notify::Severity;
    use crate::storage::FileStorage;

    fn open_store(dir: &std::path::Path) -> TaskStore<FileStorage> {
        let storage = FileStorage::open(dir).expect("open storage");
        TaskStore::open(storage).expect("open store")
    }

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).single().expect("valid date")
    }

    #[test]
    fn adds_are_most_recent_first_and_empty_adds_rejected() {
        let temp = tempdir().expect("tempdir");
        let mut store = open_store(temp.path());

        assert!(store.add("first", now()).expect("add").changed);
        assert!(store.add("second", now()).expect("add").changed);

        let rejected = store.add("   ", now()).expect("add");
        assert!(!rejected.changed);
        assert_eq!(
            rejected.notice.expect("notice").severity,
            Severity::Warning
        );

        let texts: Vec<&str> = store.tasks().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["second", "first"]);
    }

    #[test]
    fn ids_stay_unique_within_the_same_millisecond() {
        let temp = tempdir().expect("tempdir");
        let mut store = open_store(temp.path());

        let at = now();
        let a = store.add("a", at).expect("add").task_id.expect("id");
        let b = store.add("b", at).expect("add").task_id.expect("id");
        assert_ne!(a, b);
    }

    #[test]
    fn toggle_is_its_own_inverse() {
        let temp = tempdir().expect("tempdir");
        let mut store = open_store(temp.path());

        let id = store.add("walk dog", now()).expect("add").task_id.expect("id");
        let original = store.tasks()[0].clone();

        let done = store.toggle_complete(id).expect("toggle");
        assert!(done.celebrate);
        assert!(store.tasks()[0].completed);

        let undone = store.toggle_complete(id).expect("toggle");
        assert!(!undone.celebrate);
        assert_eq!(undone.notice, None);
        assert_eq!(store.tasks()[0], original);
    }

    #[test]
    fn toggle_of_unknown_id_is_a_silent_noop() {
        let temp = tempdir().expect("tempdir");
        let mut store = open_store(temp.path());
        store.add("x", now()).expect("add");

        let outcome = store.toggle_complete(999).expect("toggle");
        assert!(!outcome.changed);
        assert_eq!(outcome.notice, None);
    }

    #[test]
    fn edit_replaces_text_and_touches_nothing_else() {
        let temp = tempdir().expect("tempdir");
        let mut store = open_store(temp.path());

        let id = store.add("draft mail", now()).expect("add").task_id.expect("id");
        store.toggle_complete(id).expect("toggle");

        let outcome = store.edit(id, "  send mail  ").expect("edit");
        assert!(outcome.changed);

        let task = &store.tasks()[0];
        assert_eq!(task.text, "send mail");
        assert_eq!(task.id, id);
        assert!(task.completed);
    }

    #[test]
    fn empty_edit_is_equivalent_to_delete() {
        let temp = tempdir().expect("tempdir");
        let mut store = open_store(temp.path());

        let id = store.add("ephemeral", now()).expect("add").task_id.expect("id");
        store.add("keeper", now()).expect("add");

        let outcome = store.edit(id, "   ").expect("edit");
        assert!(outcome.changed);
        assert_eq!(
            outcome.notice.expect("notice").key,
            "notificationTaskDeleted"
        );
        assert_eq!(store.tasks().len(), 1);
        assert!(store.tasks().iter().all(|t| t.id != id));
    }

    #[test]
    fn clear_completed_without_completed_warns_and_mutates_nothing() {
        let temp = tempdir().expect("tempdir");
        let mut store = open_store(temp.path());
        store.add("pending", now()).expect("add");

        let outcome = store.clear_completed().expect("clear");
        assert!(!outcome.changed);
        assert_eq!(
            outcome.notice.expect("notice").key,
            "notificationNoCompleted"
        );
        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn clear_completed_removes_exactly_the_completed_subset() {
        let temp = tempdir().expect("tempdir");
        let mut store = open_store(temp.path());

        let a = store.add("a", now()).expect("add").task_id.expect("id");
        store.add("b", now()).expect("add");
        let c = store.add("c", now()).expect("add").task_id.expect("id");
        store.toggle_complete(a).expect("toggle");
        store.toggle_complete(c).expect("toggle");

        let outcome = store.clear_completed().expect("clear");
        assert!(outcome.changed);

        let texts: Vec<&str> = store.tasks().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["b"]);
    }

    #[test]
    fn filtered_views_partition_and_counts_track_state() {
        let temp = tempdir().expect("tempdir");
        let mut store = open_store(temp.path());

        let id = store.add("Buy milk", now()).expect("add").task_id.expect("id");
        assert_eq!(
            store.counts(Filter::All),
            CountSummary::All { active: 1, total: 1 }
        );

        store.toggle_complete(id).expect("toggle");
        assert_eq!(
            store.counts(Filter::All),
            CountSummary::All { active: 0, total: 1 }
        );
        assert_eq!(store.counts(Filter::Active), CountSummary::Active { count: 0 });
        assert_eq!(
            store.counts(Filter::Completed),
            CountSummary::Completed { count: 1 }
        );

        assert_eq!(store.filtered_view(Filter::Active).len(), 0);
        assert_eq!(store.filtered_view(Filter::Completed).len(), 1);
        assert_eq!(store.filtered_view(Filter::All).len(), 1);

        let outcome = store.clear_completed().expect("clear");
        assert!(outcome.changed);
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn collection_roundtrips_through_storage() {
        let temp = tempdir().expect("tempdir");

        let snapshot = {
            let mut store = open_store(temp.path());
            let id = store.add("persist me", now()).expect("add").task_id.expect("id");
            store.add("and me", now()).expect("add");
            store.toggle_complete(id).expect("toggle");
            store.tasks().to_vec()
        };

        let reopened = open_store(temp.path());
        assert_eq!(reopened.tasks(), snapshot.as_slice());
    }

    #[test]
    fn corrupt_stored_tasks_load_as_empty() {
        let temp = tempdir().expect("tempdir");
        std::fs::write(temp.path().join("tasks"), "{not json").expect("write");

        let store = open_store(temp.path());
        assert!(store.tasks().is_empty());
    }
}
