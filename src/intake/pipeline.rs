//! # 解码与变换流水线模块
//!
//! ## 设计思路
//!
//! 将“字节 → 位图 → 缩放 → JPEG”的过程集中管理，并在关键节点增加资源上限控制。
//! 优先做尺寸检查，再进行完整解码，降低超大输入触发高内存开销的风险。
//!
//! ## 实现思路
//!
//! 1. 文件签名校验 + 读取 header 尺寸与 EXIF 方向
//! 2. 按（校正方向后的）像素上限快速拒绝
//! 3. 完整解码并按 EXIF 方向摆正
//! 4. 透明通道合成到黑色背景
//! 5. 按最长边计算缩放比例（不放大）
//! 6. 降采样（fast_image_resize，失败回退 `imageops::resize`）
//! 7. 无论是否缩放都重新编码为 JPEG，以控制上传体积

use fast_image_resize as fr;
use image::codecs::jpeg::JpegEncoder;
use image::metadata::Orientation;
use image::{DynamicImage, ImageBuffer, ImageDecoder, ImageReader, Rgb, RgbImage};
use std::io::Cursor;

use super::config::ResizeFilter;
use super::source::{DecodedBitmap, UploadPayload};
use super::{IntakeConfig, IntakeError, IntakeHandler};

/// 计算上传尺寸：`scale = min(1, max_target / max(w, h))`，四舍五入且每边至少 1 像素。
pub fn target_dimensions(width: u32, height: u32, max_target: u32) -> (u32, u32) {
    let max_side = width.max(height);
    if max_side == 0 || max_side <= max_target {
        return (width, height);
    }

    let scale = max_target as f64 / max_side as f64;
    let scaled = |side: u32| ((side as f64 * scale).round() as u32).clamp(1, max_target);

    (scaled(width), scaled(height))
}

/// EXIF 方向含 90° 旋转时宽高互换。
fn oriented_dimensions((width, height): (u32, u32), orientation: Orientation) -> (u32, u32) {
    match orientation {
        Orientation::Rotate90
        | Orientation::Rotate270
        | Orientation::Rotate90FlipH
        | Orientation::Rotate270FlipH => (height, width),
        _ => (width, height),
    }
}

/// 转为 RGB；带透明通道时按 alpha 合成到黑色背景（与浏览器 canvas 导出 JPEG 一致）。
fn flatten_onto_black(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    ImageBuffer::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

impl IntakeHandler {
    /// 将原始字节解码为位图。
    pub(super) fn decode_bitmap(
        bytes: &[u8],
        config: &IntakeConfig,
    ) -> Result<DecodedBitmap, IntakeError> {
        Self::validate_image_signature(bytes)?;

        let mut decoder = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| IntakeError::InvalidFormat(format!("无法识别图片格式：{}", e)))?
            .into_decoder()
            .map_err(|e| IntakeError::InvalidFormat(format!("无法读取图片头：{}", e)))?;

        let orientation = match decoder.orientation() {
            Ok(orientation) => orientation,
            Err(err) => {
                log::warn!("⚠️ EXIF 方向读取失败，按原方向处理：{}", err);
                Orientation::NoTransforms
            }
        };

        let (header_width, header_height) = oriented_dimensions(decoder.dimensions(), orientation);
        Self::validate_pixel_limits(config, header_width, header_height)?;

        let mut image = DynamicImage::from_decoder(decoder)
            .map_err(|e| IntakeError::Decode(format!("图片解码失败：{}", e)))?;
        if orientation != Orientation::NoTransforms {
            log::debug!("🔄 按 EXIF 方向摆正图片：{:?}", orientation);
            image.apply_orientation(orientation);
        }

        Self::validate_pixel_limits(config, image.width(), image.height())?;

        Ok(DecodedBitmap { image })
    }

    /// 缩放并重新编码为上传载荷。
    pub(super) fn encode_upload_payload(
        bitmap: &DecodedBitmap,
        config: &IntakeConfig,
    ) -> Result<UploadPayload, IntakeError> {
        let (width, height) = (bitmap.width(), bitmap.height());
        let (target_width, target_height) =
            target_dimensions(width, height, config.max_target_dimension);

        let flattened = flatten_onto_black(&bitmap.image);
        let rgb = if (target_width, target_height) == (width, height) {
            flattened
        } else {
            log::info!(
                "🧩 上传前降采样：{}x{} -> {}x{}（filter={:?}）",
                width,
                height,
                target_width,
                target_height,
                config.resize_filter
            );

            match Self::resize_with_fast_image_resize(
                &flattened,
                target_width,
                target_height,
                config.resize_filter,
            ) {
                Ok(resized) => resized,
                Err(err) => {
                    log::warn!("⚠️ fast_image_resize 降采样失败，回退 imageops::resize：{}", err);
                    image::imageops::resize(
                        &flattened,
                        target_width,
                        target_height,
                        config.resize_filter.to_image_filter(),
                    )
                }
            }
        };

        let bytes = Self::encode_jpeg(&rgb, config.jpeg_quality)?;

        Ok(UploadPayload {
            bytes: bytes.into(),
            width: rgb.width(),
            height: rgb.height(),
        })
    }

    fn validate_pixel_limits(
        config: &IntakeConfig,
        width: u32,
        height: u32,
    ) -> Result<(), IntakeError> {
        let pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| IntakeError::ResourceLimit("图片像素数溢出".to_string()))?;

        if pixels == 0 {
            return Err(IntakeError::Decode("图片尺寸为 0".to_string()));
        }

        if pixels > config.max_decoded_pixels {
            return Err(IntakeError::ResourceLimit(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, config.max_decoded_pixels
            )));
        }

        Ok(())
    }

    fn resize_with_fast_image_resize(
        src: &RgbImage,
        target_width: u32,
        target_height: u32,
        filter: ResizeFilter,
    ) -> Result<RgbImage, IntakeError> {
        let (src_width, src_height) = src.dimensions();

        let src_image = fr::images::Image::from_vec_u8(
            src_width,
            src_height,
            src.as_raw().clone(),
            fr::PixelType::U8x3,
        )
        .map_err(|e| IntakeError::Decode(format!("构建源图像缓冲失败：{}", e)))?;

        let mut dst_image = fr::images::Image::new(target_width, target_height, fr::PixelType::U8x3);

        let mut resizer = fr::Resizer::new();
        let options = fr::ResizeOptions::new()
            .resize_alg(fr::ResizeAlg::Convolution(filter.to_fast_filter()));

        resizer
            .resize(&src_image, &mut dst_image, Some(&options))
            .map_err(|e| IntakeError::Decode(format!("fast_image_resize 执行失败：{}", e)))?;

        ImageBuffer::<Rgb<u8>, Vec<u8>>::from_raw(target_width, target_height, dst_image.into_vec())
            .ok_or_else(|| IntakeError::Decode("fast_image_resize 输出缓冲长度异常".to_string()))
    }

    fn encode_jpeg(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>, IntakeError> {
        let mut buffer = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
        encoder
            .encode_image(rgb)
            .map_err(|e| IntakeError::Decode(format!("JPEG 编码失败：{}", e)))?;

        Ok(buffer)
    }
}
