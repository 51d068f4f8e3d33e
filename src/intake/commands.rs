//! # 命令层
//!
//! ## 设计思路
//!
//! 命令层仅做参数接收、调用会话与结果落盘，不承载业务逻辑。
//! 所有实际处理交由 `IntakeSession`，保持命令函数薄、稳定、易测试。
//! 读取与解码都经由会话完成，失败时会话负责留下用户提示。

use std::path::Path;

use super::{DisplayedImage, IntakeError, IntakeSession};
use crate::error::AppError;

/// `inspect` 命令输出。
#[derive(Debug, Clone)]
pub struct InspectReport {
    pub name: String,
    pub media_type: String,
    pub width: u32,
    pub height: u32,
    pub size_bytes: usize,
}

/// `prepare` 命令输出。
#[derive(Debug, Clone)]
pub struct PrepareReport {
    pub width: u32,
    pub height: u32,
    pub size_bytes: usize,
}

/// 选图并展示原图；指定 `output` 时将展示内容写盘。
pub async fn inspect_image(
    session: &IntakeSession,
    path: &Path,
    output: Option<&Path>,
) -> Result<InspectReport, AppError> {
    let shown = session.acquire_path(path).await?;

    let file = session
        .current_file()?
        .ok_or_else(|| IntakeError::ResourceLimit("选图后当前图片为空".to_string()))?;
    let (width, height) = session.current_dimensions()?.unwrap_or_default();

    if let Some(output) = output {
        write_displayed(&shown, output).await?;
    }

    Ok(InspectReport {
        name: file.name,
        media_type: file.media_type,
        width,
        height,
        size_bytes: file.bytes.len(),
    })
}

/// 生成上传载荷并写盘。
pub async fn prepare_image(
    session: &IntakeSession,
    path: &Path,
    output: &Path,
) -> Result<PrepareReport, AppError> {
    let payload = session.prepare_path(path).await?;

    tokio::fs::write(output, &payload.bytes).await?;
    log::info!("💾 上传载荷已写入: {}", output.display());

    Ok(PrepareReport {
        width: payload.width,
        height: payload.height,
        size_bytes: payload.bytes.len(),
    })
}

/// 执行检测；`path` 为空等同于未选择图片。成功后将结果图写入 `output`。
pub async fn detect_image(
    session: &IntakeSession,
    path: Option<&Path>,
    output: &Path,
) -> Result<DisplayedImage, AppError> {
    if let Some(path) = path {
        session.acquire_path(path).await?;
    }

    let shown = session.detect().await?;
    write_displayed(&shown, output).await?;

    Ok(shown)
}

async fn write_displayed(shown: &DisplayedImage, output: &Path) -> Result<(), AppError> {
    tokio::fs::write(output, &shown.bytes).await?;
    log::info!(
        "💾 展示内容已写入: {}（{:?}, generation={}）",
        output.display(),
        shown.origin,
        shown.generation
    );
    Ok(())
}
