//! 用户可见提示。
//!
//! 轻提示（toast）展示固定时长后自动消失；阻塞提示（prompt）需要用户处理，没有时长。

use std::time::{Duration, Instant};

use super::IntakeError;

pub const DETECTION_COMPLETE: &str = "Detection complete!";
pub const PROCESSING_FAILED: &str =
    "Could not process this image. Try a different format or smaller image.";
pub const CHOOSE_IMAGE_FIRST: &str = "Please choose an image first.";
pub const DETECTION_IN_PROGRESS: &str = "Detection already in progress.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Toast,
    Prompt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    /// 仅 toast 有效。
    pub duration: Option<Duration>,
}

impl Notice {
    pub fn toast(message: impl Into<String>, duration: Duration) -> Self {
        Self {
            kind: NoticeKind::Toast,
            message: message.into(),
            duration: Some(duration),
        }
    }

    pub fn prompt(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Prompt,
            message: message.into(),
            duration: None,
        }
    }

    pub fn detection_complete(duration: Duration) -> Self {
        Self::toast(DETECTION_COMPLETE, duration)
    }

    /// 按错误类型选择提示：未选图为阻塞提示，请求进行中单独提示，其余统一为通用失败 toast。
    ///
    /// 具体错误细节只进日志，不展示给用户。
    pub fn for_error(error: &IntakeError, duration: Duration) -> Self {
        match error {
            IntakeError::NoFileSelected => Self::prompt(CHOOSE_IMAGE_FIRST),
            IntakeError::Busy => Self::toast(DETECTION_IN_PROGRESS, duration),
            _ => Self::toast(PROCESSING_FAILED, duration),
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.kind == NoticeKind::Prompt
    }
}

/// 已展示的提示及其展示时刻。
#[derive(Debug, Clone)]
pub struct ShownNotice {
    pub notice: Notice,
    pub shown_at: Instant,
}

impl ShownNotice {
    pub fn new(notice: Notice, shown_at: Instant) -> Self {
        Self { notice, shown_at }
    }

    /// `now` 时刻是否仍可见。阻塞提示一直可见，直到被新提示替换。
    pub fn is_visible_at(&self, now: Instant) -> bool {
        match self.notice.duration {
            Some(duration) => now.saturating_duration_since(self.shown_at) < duration,
            None => true,
        }
    }
}
