//! # View Models
//!
//! Front-end independent state behind each screen. They read through the
//! [`Library`](crate::Library) cache and turn results into display strings
//! and [`Notice`]s, leaving rendering to the front-end.
//!
//! - [`catalog`] - book/member tables, search, paging, editors
//! - [`issue`] - issue form selectors and submit
//! - [`returns`] - open-loan table and return action
//! - [`dashboard`] - counters and the overdue report
//! - [`notice`] - success/error notices

pub mod catalog;
pub mod dashboard;
pub mod issue;
pub mod notice;
pub mod returns;

pub use catalog::{EditMode, TableState};
pub use dashboard::DashboardView;
pub use issue::IssueForm;
pub use notice::{Notice, NoticeKind};
pub use returns::ReturnTable;
