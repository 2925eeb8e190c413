//! View-state containers
//!
//! Each screen owns one container. All changes go through its `apply`
//! method; the async helpers call a service and feed the outcome back into
//! `apply`, so a renderer only ever needs to read the current state.

mod login;
mod new_task;
mod register;
mod session;
mod task_list;

pub use login::{LoginEvent, LoginState, LoginStatus};
pub use new_task::{NewTaskEvent, NewTaskForm, NewTaskStatus};
pub use register::{RegisterEvent, RegisterState, RegisterStatus};
pub use session::{SessionEvent, SessionState, SessionStatus};
pub use task_list::{TaskListEvent, TaskListState, TaskListStatus};
