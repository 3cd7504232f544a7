//! In-memory view of the task list ahead of server confirmation.
//!
//! Mutations are applied immediately; the next authoritative list replaces
//! everything through [`TaskProjection::reset`]. There is no merge step.
//!
//! This is the contract for the browser side; server-rendered pages only ever
//! show the reset state built from the authoritative list.

use chrono::Utc;

use crate::models::{Task, TaskPatch, TaskStatus};

pub const TEMP_ID_PREFIX: &str = "temp-";

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Add(TaskPatch),
    Update { id: String, patch: TaskPatch },
    Delete { id: String },
}

/// In-flight request markers. They only disable controls; requests are not serialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pending {
    pub adding: bool,
    pub updating: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TaskProjection {
    tasks: Vec<Task>,
    pending: Pending,
}

impl TaskProjection {
    pub fn new(authoritative: Vec<Task>) -> Self {
        Self {
            tasks: authoritative,
            pending: Pending::default(),
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn pending(&self) -> Pending {
        self.pending
    }

    pub fn set_adding(&mut self, adding: bool) {
        self.pending.adding = adding;
    }

    pub fn set_updating(&mut self, updating: bool) {
        self.pending.updating = updating;
    }

    pub fn apply(&mut self, mutation: Mutation) {
        match mutation {
            Mutation::Add(patch) => {
                let task = Task {
                    id: self.temporary_id(),
                    title: patch.title.unwrap_or_default(),
                    status: patch.status.unwrap_or_default(),
                    created_at: Utc::now(),
                    owner: String::new(),
                };
                self.tasks.insert(0, task);
            }
            Mutation::Update { id, patch } => {
                if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
                    patch.apply_to(task);
                }
            }
            Mutation::Delete { id } => {
                self.tasks.retain(|t| t.id != id);
            }
        }
    }

    /// Re-fetch wins: optimistic rows are dropped, pending markers cleared.
    pub fn reset(&mut self, authoritative: Vec<Task>) {
        self.tasks = authoritative;
        self.pending = Pending::default();
    }

    pub fn count(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status == status).count()
    }

    pub fn is_temporary(task: &Task) -> bool {
        task.id.starts_with(TEMP_ID_PREFIX)
    }

    fn temporary_id(&self) -> String {
        let mut millis = Utc::now().timestamp_millis();
        loop {
            let id = format!("{}{}", TEMP_ID_PREFIX, millis);
            if !self.tasks.iter().any(|t| t.id == id) {
                return id;
            }
            millis += 1;
        }
    }
}
