pub mod task;
pub mod user;

pub use task::{NewTask, Task, TaskPatch, TaskStatus};
pub use user::{Credentials, Session, User};
