//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载图片接入链路（读取 / 解码 / 缩放 / 上传）中的所有错误来源。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! `code()` / `stage()` 提供稳定的机器可读标识，便于日志与上层展示层分流。

/// 图片接入统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("解码错误：{0}")]
    Decode(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("网络错误：{0}")]
    Network(String),

    /// 服务端返回非 2xx 状态。`message` 为响应正文（或兜底文案）。
    #[error("上传失败（HTTP {status}）：{message}")]
    Upload { status: u16, message: String },

    #[error("超时错误：{0}")]
    Timeout(String),

    #[error("未选择图片")]
    NoFileSelected,

    #[error("已有检测请求进行中")]
    Busy,

    #[error("配置错误：{0}")]
    Config(String),
}

impl IntakeError {
    /// 稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "E_DECODE",
            Self::InvalidFormat(_) => "E_INVALID_FORMAT",
            Self::FileSystem(_) => "E_FILE_SYSTEM",
            Self::ResourceLimit(_) => "E_RESOURCE_LIMIT",
            Self::Network(_) => "E_NETWORK",
            Self::Upload { .. } => "E_UPLOAD",
            Self::Timeout(_) => "E_TIMEOUT",
            Self::NoFileSelected => "E_NO_FILE",
            Self::Busy => "E_BUSY",
            Self::Config(_) => "E_CONFIG",
        }
    }

    /// 出错阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::FileSystem(_) | Self::NoFileSelected => "load",
            Self::Decode(_) | Self::InvalidFormat(_) | Self::ResourceLimit(_) => "decode",
            Self::Network(_) | Self::Upload { .. } | Self::Timeout(_) | Self::Busy => "upload",
            Self::Config(_) => "config",
        }
    }

    /// 是否属于“图片不可读”类错误（解码前后的格式问题）。
    pub fn is_unreadable_image(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::InvalidFormat(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_error_carries_status_and_body() {
        let err = IntakeError::Upload {
            status: 500,
            message: "server error".to_string(),
        };

        assert_eq!(err.code(), "E_UPLOAD");
        assert_eq!(err.stage(), "upload");
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("server error"));
    }

    #[test]
    fn decode_and_format_errors_are_unreadable_image() {
        assert!(IntakeError::Decode("x".into()).is_unreadable_image());
        assert!(IntakeError::InvalidFormat("x".into()).is_unreadable_image());
        assert!(!IntakeError::Network("x".into()).is_unreadable_image());
    }
}
