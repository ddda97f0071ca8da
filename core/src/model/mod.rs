pub mod task;

pub use task::{NewTask, Status, Task, TaskId, TaskPatch};
