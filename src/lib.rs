//! # 车牌检测图片接入客户端 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                命令行 (clap, main.rs)                     │
//! │      inspect ── prepare ── detect                        │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↕ Result<T, AppError>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            库 (plate_intake)                     │
//! │                                                          │
//! │  ┌─ error ────── AppError (统一错误类型)                  │
//! │  ├─ settings ─── JSON 设置文件 + 命令行覆盖               │
//! │  └─ intake ───── 选图·解码·缩放·上传·展示                  │
//! │       ├─ session       当前图片 / 展示槽 / 加载态 / 提示   │
//! │       ├─ pipeline      解码 + 降采样 + JPEG               │
//! │       └─ uploader      POST /detect (multipart)          │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↕ HTTP
//!   检测服务 /detect → {"image_base64": "..."}
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，命令函数的返回类型 |
//! | [`settings`] | 设置文件加载与命令行覆盖 |
//! | [`intake`] | 图片接入流水线与会话状态 |

pub mod error;
pub mod intake;
pub mod settings;
