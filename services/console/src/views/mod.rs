//! Thin list-view consumers of the polling layer. Rendering only; all data
//! behavior lives in the core `ResourcePool`.

pub mod quiz_list;
pub mod user_list;

pub use quiz_list::QuizListView;
pub use user_list::UserListView;
