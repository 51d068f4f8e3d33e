//! # 图片接入模块（intake）
//!
//! ## 设计思路
//!
//! 该模块将“选图 → 解码展示 → 缩放编码 → 上传检测 → 展示结果”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `commands`：命令行入参/出参适配（薄封装）
//! - `session`：会话状态（当前图片、展示槽、加载态、提示）与用户动作
//! - `handler`：配置管理与单阶段执行
//! - `loader`：本地文件读取、签名校验、Base64 解析
//! - `pipeline`：解码、像素限制、降采样、JPEG 编码
//! - `uploader`：multipart 上传与响应解析
//! - `display`：单写者展示槽
//! - `notice`：用户可见提示
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 调用链
//!
//! ```text
//! main.rs（clap 参数）
//!    ↓
//! commands.rs（参数适配 + 输出落盘）
//!    ↓
//! session.rs（用户动作：acquire / detect）
//!    ├─ handler.rs + loader.rs（读取 + 解码）
//!    ├─ handler.rs + pipeline.rs（缩放 + JPEG）
//!    ├─ uploader.rs（POST /detect）
//!    └─ display.rs / notice.rs（提交展示 + 提示）
//! ```

pub mod commands;
mod config;
mod display;
mod error;
mod handler;
mod loader;
mod notice;
mod pipeline;
mod session;
mod source;
mod uploader;

pub use config::{
    IntakeConfig, ResizeFilter, DEFAULT_ENDPOINT, JPEG_QUALITY, MAX_TARGET_DIMENSION,
    NOTICE_DURATION_MS, UPLOAD_FIELD, UPLOAD_FILE_NAME,
};
pub use display::{DisplayOrigin, DisplaySlot, DisplayedImage};
pub use error::IntakeError;
pub use handler::IntakeHandler;
pub use notice::{
    Notice, NoticeKind, ShownNotice, CHOOSE_IMAGE_FIRST, DETECTION_COMPLETE,
    DETECTION_IN_PROGRESS, PROCESSING_FAILED,
};
pub use pipeline::target_dimensions;
pub use session::IntakeSession;
pub use source::{DecodedBitmap, DetectionResult, SourceFile, UploadPayload};
