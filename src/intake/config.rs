//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有参数集中到 `IntakeConfig`。`Default` 即为产品固定取值：
//! 最长边 1200 像素、JPEG 质量 0.82、提示时长 2500 毫秒。
//! 允许通过 JSON 设置文件覆盖，便于联调不同的检测服务地址。
//!
//! ## 实现思路
//!
//! - `#[serde(default)]`：设置文件只需写出要覆盖的字段。
//! - `validate` 统一做取值范围检查，加载与运行时修改都走同一入口。

use fast_image_resize as fr;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use super::IntakeError;

/// 上传前缩放的最长边上限（像素）。
pub const MAX_TARGET_DIMENSION: u32 = 1200;
/// JPEG 重新编码质量（对应 0.82）。
pub const JPEG_QUALITY: u8 = 82;
/// 提示消息展示时长（毫秒）。
pub const NOTICE_DURATION_MS: u64 = 2500;
/// 默认检测服务地址。
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/detect";
/// multipart 字段名。
pub const UPLOAD_FIELD: &str = "file";
/// multipart 文件名。
pub const UPLOAD_FILE_NAME: &str = "upload.jpg";

/// 降采样滤镜。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    Nearest,
    Bilinear,
    CatmullRom,
    Lanczos3,
}

impl ResizeFilter {
    pub(crate) fn to_fast_filter(self) -> fr::FilterType {
        match self {
            Self::Nearest => fr::FilterType::Box,
            Self::Bilinear => fr::FilterType::Bilinear,
            Self::CatmullRom => fr::FilterType::CatmullRom,
            Self::Lanczos3 => fr::FilterType::Lanczos3,
        }
    }

    pub(crate) fn to_image_filter(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Bilinear => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// 图片接入配置。
///
/// 字段覆盖读取、解码、缩放编码、上传与提示五个阶段。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// 检测服务地址（完整 URL）。
    pub endpoint: String,
    /// multipart 字段名。
    pub upload_field: String,
    /// multipart 文件名。
    pub upload_file_name: String,
    /// 上传图片最长边上限（像素）。
    pub max_target_dimension: u32,
    /// JPEG 编码质量（1~100）。
    pub jpeg_quality: u8,
    /// 降采样滤镜。
    pub resize_filter: ResizeFilter,
    /// 提示消息展示时长（毫秒）。
    pub notice_duration_ms: u64,
    /// 读取本地文件时允许的最大体积（字节）。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 上传请求总超时（秒）。`None` 表示无限等待。
    pub request_timeout_secs: Option<u64>,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            upload_field: UPLOAD_FIELD.to_string(),
            upload_file_name: UPLOAD_FILE_NAME.to_string(),
            max_target_dimension: MAX_TARGET_DIMENSION,
            jpeg_quality: JPEG_QUALITY,
            resize_filter: ResizeFilter::Bilinear,
            notice_duration_ms: NOTICE_DURATION_MS,
            max_file_size: 50 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            request_timeout_secs: None,
        }
    }
}

impl IntakeConfig {
    /// 校验取值范围。
    pub fn validate(&self) -> Result<(), IntakeError> {
        let endpoint = reqwest::Url::parse(&self.endpoint)
            .map_err(|e| IntakeError::Config(format!("endpoint 格式错误：{}", e)))?;
        if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
            return Err(IntakeError::Config("endpoint 仅支持 HTTP/HTTPS".to_string()));
        }
        if self.upload_field.trim().is_empty() {
            return Err(IntakeError::Config("upload_field 不能为空".to_string()));
        }
        if self.upload_file_name.trim().is_empty() {
            return Err(IntakeError::Config("upload_file_name 不能为空".to_string()));
        }
        if !(16..=16_384).contains(&self.max_target_dimension) {
            return Err(IntakeError::Config(
                "max_target_dimension 必须在 16~16384 像素之间".to_string(),
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(IntakeError::Config("jpeg_quality 必须在 1~100 之间".to_string()));
        }
        if !(100..=60_000).contains(&self.notice_duration_ms) {
            return Err(IntakeError::Config(
                "notice_duration_ms 必须在 100~60000 毫秒之间".to_string(),
            ));
        }
        if self.max_file_size == 0 {
            return Err(IntakeError::Config("max_file_size 必须大于 0".to_string()));
        }
        if self.max_decoded_pixels == 0 {
            return Err(IntakeError::Config("max_decoded_pixels 必须大于 0".to_string()));
        }
        if matches!(self.request_timeout_secs, Some(0)) {
            return Err(IntakeError::Config("request_timeout_secs 不能为 0".to_string()));
        }

        Ok(())
    }
}
