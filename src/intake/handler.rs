//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `IntakeHandler` 只负责配置管理与单个阶段的执行，不持有任何展示状态。
//! 展示槽、加载态与提示由上层 `IntakeSession` 负责。
//!
//! ## 实现思路
//!
//! - 配置通过 `Arc<RwLock<IntakeConfig>>` 支持运行时替换。
//! - 单次操作内使用“同一配置快照”，避免处理中途配置漂移。
//! - 解码 / 缩放 / 编码属于 CPU 密集，放到 `spawn_blocking` 中执行。

use std::sync::{Arc, RwLock};
use std::time::Instant;

use super::source::{DecodedBitmap, SourceFile, UploadPayload};
use super::{IntakeConfig, IntakeError};

/// 图片接入处理器。
pub struct IntakeHandler {
    pub(super) config: Arc<RwLock<IntakeConfig>>,
}

impl IntakeHandler {
    /// 根据初始配置创建处理器，配置非法时直接拒绝。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use plate_intake::intake::{IntakeConfig, IntakeHandler};
    ///
    /// let handler = IntakeHandler::new(IntakeConfig::default())?;
    /// # Ok::<(), plate_intake::intake::IntakeError>(())
    /// ```
    pub fn new(config: IntakeConfig) -> Result<Self, IntakeError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
        })
    }

    /// 获取配置快照。
    ///
    /// 作用：保证单次操作链路使用一致参数。
    pub fn config_snapshot(&self) -> Result<IntakeConfig, IntakeError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| IntakeError::ResourceLimit("配置读取锁已中毒".to_string()))
    }

    /// 整体替换配置。
    pub fn set_config(&self, config: IntakeConfig) -> Result<(), IntakeError> {
        config.validate()?;

        let mut current = self
            .config
            .write()
            .map_err(|_| IntakeError::ResourceLimit("配置写入锁已中毒".to_string()))?;

        log::info!(
            "⚙️ 已更新接入配置：endpoint={} max_dim={} quality={} filter={:?}",
            Self::redact_url_for_log(&config.endpoint),
            config.max_target_dimension,
            config.jpeg_quality,
            config.resize_filter
        );
        *current = config;

        Ok(())
    }

    /// 解码用户选择的文件。
    pub async fn decode(&self, file: &SourceFile) -> Result<DecodedBitmap, IntakeError> {
        let config = self.config_snapshot()?;
        let bytes = file.bytes.clone();
        let start = Instant::now();

        let bitmap = tokio::task::spawn_blocking(move || Self::decode_bitmap(&bytes, &config))
            .await
            .map_err(|e| IntakeError::Decode(format!("解码任务异常终止：{}", e)))??;

        log::info!(
            "✅ 图片解码成功 - 文件: {} 类型: {} 尺寸: {}x{} 耗时: {}ms",
            file.name,
            file.media_type,
            bitmap.width(),
            bitmap.height(),
            start.elapsed().as_millis()
        );

        Ok(bitmap)
    }

    /// 重新解码文件并生成上传载荷（限制最长边 + JPEG 重新编码）。
    pub async fn prepare_upload(&self, file: &SourceFile) -> Result<UploadPayload, IntakeError> {
        let config = self.config_snapshot()?;
        Self::prepare_upload_with_config(file, config).await
    }

    /// 使用调用方持有的配置快照生成上传载荷，供检测链路与上传共用同一快照。
    pub(super) async fn prepare_upload_with_config(
        file: &SourceFile,
        config: IntakeConfig,
    ) -> Result<UploadPayload, IntakeError> {
        let bytes = file.bytes.clone();
        let start = Instant::now();

        let payload = tokio::task::spawn_blocking(move || {
            let bitmap = Self::decode_bitmap(&bytes, &config)?;
            Self::encode_upload_payload(&bitmap, &config)
        })
        .await
        .map_err(|e| IntakeError::Decode(format!("编码任务异常终止：{}", e)))??;

        log::info!(
            "📦 上传载荷就绪 - 文件: {} 输出: {}x{} {}KB 耗时: {}ms",
            file.name,
            payload.width,
            payload.height,
            payload.bytes.len() / 1024,
            start.elapsed().as_millis()
        );

        Ok(payload)
    }
}
