//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“用户输入”和“流水线中间结果”解耦：
//! - `SourceFile` 表示用户选中的原始文件（只读）
//! - `DecodedBitmap` 表示解码后的像素数据
//! - `UploadPayload` 表示缩放并重新编码后、可直接上传的 JPEG
//! - `DetectionResult` 表示检测服务返回的图片字节

use bytes::Bytes;
use image::DynamicImage;

/// 用户选择的图片文件。
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// 文件名（仅用于日志）。
    pub name: String,
    /// 声明的媒体类型，如 `image/png`。
    pub media_type: String,
    /// 原始字节。
    pub bytes: Bytes,
}

impl SourceFile {
    /// 由内存字节构造，媒体类型通过文件签名推断。
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        let media_type = infer::get(&bytes)
            .map(|kind| kind.mime_type().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        Self {
            name: name.into(),
            media_type,
            bytes,
        }
    }
}

/// 解码后的位图。
#[derive(Debug, Clone)]
pub struct DecodedBitmap {
    pub(crate) image: DynamicImage,
}

impl DecodedBitmap {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }
}

/// 上传载荷：JPEG 字节与编码尺寸。
#[derive(Debug, Clone)]
pub struct UploadPayload {
    pub bytes: Bytes,
    pub width: u32,
    pub height: u32,
}

impl UploadPayload {
    pub const MEDIA_TYPE: &'static str = "image/jpeg";
}

/// 检测服务返回的图片。
#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub bytes: Bytes,
}
