//! # 加载与校验模块
//!
//! ## 设计思路
//!
//! 统一处理本地文件读取与检测结果（Base64）解析，并在“尽可能早”的阶段执行输入校验。
//! 目标是尽快失败，减少不必要内存与 CPU 消耗。
//!
//! ## 实现思路
//!
//! - 文件：存在性 + metadata 体积限制 + 异步读取 + 文件签名校验。
//! - Base64：Data URL / 纯 Base64 解析 + 解码前体积估算。

use base64::{Engine as _, engine::general_purpose};
use std::path::Path;

use super::source::SourceFile;
use super::{IntakeConfig, IntakeError, IntakeHandler};

impl IntakeHandler {
    /// 从本地路径读取用户选择的图片。
    pub async fn open_source(&self, path: impl AsRef<Path>) -> Result<SourceFile, IntakeError> {
        let config = self.config_snapshot()?;
        Self::load_from_file(path.as_ref(), &config).await
    }

    pub(super) async fn load_from_file(
        path: &Path,
        config: &IntakeConfig,
    ) -> Result<SourceFile, IntakeError> {
        log::info!("📁 开始读取本地图片 - 路径: {}", path.display());

        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                IntakeError::FileSystem(format!("文件不存在：{}", path.display()))
            } else {
                IntakeError::FileSystem(format!("无法读取文件信息：{}", e))
            }
        })?;

        if !metadata.is_file() {
            return Err(IntakeError::FileSystem(format!("不是文件：{}", path.display())));
        }

        if metadata.len() > config.max_file_size {
            return Err(IntakeError::ResourceLimit(format!(
                "文件过大：{:.2} MB（限制：{:.2} MB）",
                metadata.len() as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| IntakeError::FileSystem(format!("无法读取图片文件：{}", e)))?;
        Self::validate_image_signature(&bytes)?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        Ok(SourceFile::from_bytes(name, bytes))
    }

    /// 通过文件签名（magic bytes）校验输入是否为图片。
    pub(super) fn validate_image_signature(bytes: &[u8]) -> Result<(), IntakeError> {
        if bytes.is_empty() {
            return Err(IntakeError::InvalidFormat("图片内容为空".to_string()));
        }

        let kind = infer::get(bytes)
            .ok_or_else(|| IntakeError::InvalidFormat("无法识别图片类型".to_string()))?;

        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(IntakeError::InvalidFormat(format!(
                "文件签名不是图片类型：{}",
                kind.mime_type()
            )));
        }

        Ok(())
    }

    fn estimate_base64_decoded_upper_bound_len(base64_data: &str) -> Result<u64, IntakeError> {
        let len = base64_data.trim().len() as u64;
        let groups = len
            .checked_add(3)
            .ok_or_else(|| IntakeError::ResourceLimit("Base64 输入长度溢出".to_string()))?
            / 4;

        groups
            .checked_mul(3)
            .ok_or_else(|| IntakeError::ResourceLimit("Base64 解码体积估算溢出".to_string()))
    }

    /// 解析 Base64 输入（支持 Data URL / 纯 Base64），解码前按上限拒绝超大输入。
    pub(super) fn parse_base64_with_limit(
        data: &str,
        max_size: u64,
    ) -> Result<Vec<u8>, IntakeError> {
        let normalized = data.trim();

        let base64_data = if normalized.starts_with("data:") {
            let base64_start = normalized
                .find(";base64,")
                .ok_or_else(|| IntakeError::InvalidFormat("缺少 base64 标记".to_string()))?;
            &normalized[base64_start + 8..]
        } else {
            normalized
        };

        if base64_data.is_empty() {
            return Err(IntakeError::InvalidFormat("Base64 内容为空".to_string()));
        }

        let estimated_len = Self::estimate_base64_decoded_upper_bound_len(base64_data)?;
        if estimated_len > max_size {
            return Err(IntakeError::ResourceLimit(format!(
                "Base64 预计解码体积过大：{:.2} MB（限制：{:.2} MB）",
                estimated_len as f64 / 1024.0 / 1024.0,
                max_size as f64 / 1024.0 / 1024.0
            )));
        }

        general_purpose::STANDARD
            .decode(base64_data)
            .map_err(|e| IntakeError::Decode(format!("Base64 解码失败：{}", e)))
    }

    /// 去掉 query / fragment 后再写日志。
    pub(super) fn redact_url_for_log(url: &str) -> String {
        let Ok(parsed) = reqwest::Url::parse(url) else {
            return "<invalid-url>".to_string();
        };

        let host = parsed.host_str().unwrap_or("<unknown-host>");
        let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();
        let path = parsed.path();

        format!("{}://{}{}{}", parsed.scheme(), host, port, path)
    }
}
