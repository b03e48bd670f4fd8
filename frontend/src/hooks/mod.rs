//! Custom Yew hooks for the console.
//!
//! These hooks encapsulate reusable state logic to keep pages focused on layout.

mod use_entity_list;
mod use_notice;

pub use use_entity_list::{report_error, use_entity_list, ListAction, ListState, UseEntityList};
pub use use_notice::{use_notice, Notice, NoticeKind, UseNotice};
