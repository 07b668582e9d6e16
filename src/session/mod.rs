//! Per-user session state and the actions that change it.

mod controller;
mod manager;
mod pruning;
mod reducer;
mod store;

pub use controller::{Action, UploadedFile, ViewController};
pub use manager::{SessionHandle, SessionManager};
pub use pruning::{PruneResult, PruningConfig, SessionPruner};
pub use reducer::{Mutation, reduce};
pub use store::{Notice, NoticeLevel, Page, SessionState, SessionStore, StagedFile, ViewState};
