pub mod list;
pub mod refresh_token;
pub mod task;
pub mod user;

pub use list::{CreateListRequest, List, UpdateListRequest};
pub use refresh_token::{RefreshTokenRecord, RefreshTokenStatus, StoredRefreshToken};
pub use task::{CreateTaskRequest, NewTask, Task, UpdateTaskRequest};
pub use user::{NewUser, User};
