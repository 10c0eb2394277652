//! Transient success/error notifications.

use serde::Serialize;

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

/// A toast-style message produced by a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    /// Server or validation message, if any.
    pub detail: Option<String>,
}

impl Notice {
    pub fn success(title: impl Into<String>) -> Self {
        Notice {
            kind: NoticeKind::Success,
            title: title.into(),
            detail: None,
        }
    }

    /// Error notice carrying the failure's message as detail.
    pub fn failure(title: impl Into<String>, error: &ClientError) -> Self {
        Notice {
            kind: NoticeKind::Error,
            title: title.into(),
            detail: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind == NoticeKind::Success
    }
}
