//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义应用级 `AppError` 枚举，命令行入口的所有命令函数统一返回 `Result<T, AppError>`，
//! 替代分散的 `.map_err(|e| e.to_string())`、`expect()` 等不一致模式。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `IntakeError` / `std::io::Error` 提供 `From` 转换，无需手动 map。
//! - `exit_code` 区分“需要用户处理的阻塞提示”与一般失败。

use crate::intake::IntakeError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 图片接入流水线错误（读取 / 解码 / 上传）
    #[error("{0}")]
    Intake(#[from] IntakeError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 设置文件不可用
    #[error("设置文件错误: {0}")]
    Settings(String),
}

impl AppError {
    /// 进程退出码：阻塞提示（未选图）为 2，其余失败为 1。
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Intake(IntakeError::NoFileSelected) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_selection_has_distinct_exit_code() {
        assert_eq!(AppError::from(IntakeError::NoFileSelected).exit_code(), 2);
        assert_eq!(AppError::from(IntakeError::Busy).exit_code(), 1);
        assert_eq!(AppError::Settings("bad".into()).exit_code(), 1);
    }
}
