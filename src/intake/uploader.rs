//! # 上传模块
//!
//! ## 设计思路
//!
//! 将 JPEG 载荷以 multipart 形式提交到检测服务，并把响应中的 Base64 图片还原为字节。
//! 不做重试：任何失败都直接返回给调用方，由展示层统一提示。
//!
//! ## 实现思路
//!
//! - 单字段 multipart：字段名 `file`，文件名 `upload.jpg`，类型 `image/jpeg`。
//! - 非 2xx：优先取 JSON 中的 `error` 字段，其次取响应正文，最后回退 `Upload failed`。
//! - 2xx：解析 `{"image_base64": "..."}`，Base64 解码并校验文件签名。

use serde::Deserialize;
use std::time::Duration;

use super::source::{DetectionResult, UploadPayload};
use super::{IntakeConfig, IntakeError, IntakeHandler};

const UPLOAD_FAILED_FALLBACK: &str = "Upload failed";

#[derive(Debug, Deserialize)]
struct DetectResponse {
    image_base64: String,
}

#[derive(Debug, Deserialize)]
struct DetectErrorBody {
    error: String,
}

impl IntakeHandler {
    /// 提交载荷到检测服务，返回检测结果图片。
    ///
    /// 只负责网络交互，不修改展示状态。
    pub async fn submit(&self, payload: &UploadPayload) -> Result<DetectionResult, IntakeError> {
        let config = self.config_snapshot()?;
        Self::submit_with_config(payload, &config).await
    }

    pub(super) async fn submit_with_config(
        payload: &UploadPayload,
        config: &IntakeConfig,
    ) -> Result<DetectionResult, IntakeError> {
        let endpoint = Self::redact_url_for_log(&config.endpoint);
        log::info!(
            "📤 开始上传 - 端点: {} 载荷: {}x{} {}KB",
            endpoint,
            payload.width,
            payload.height,
            payload.bytes.len() / 1024
        );

        let client = Self::build_http_client(config)?;

        let part = reqwest::multipart::Part::bytes(payload.bytes.to_vec())
            .file_name(config.upload_file_name.clone())
            .mime_str(UploadPayload::MEDIA_TYPE)
            .map_err(|e| IntakeError::Network(format!("构建 multipart 失败：{}", e)))?;
        let form = reqwest::multipart::Form::new().part(config.upload_field.clone(), part);

        let response = client
            .post(config.endpoint.as_str())
            .multipart(form)
            .send()
            .await
            .map_err(|e| Self::map_reqwest_error(e, config))?;

        let status = response.status();
        log::debug!("📡 检测服务响应 - HTTP {}", status.as_u16());

        if !status.is_success() {
            let text = match response.text().await {
                Ok(text) => text,
                Err(err) => {
                    log::warn!("⚠️ 读取错误响应正文失败：{}", err);
                    String::new()
                }
            };

            return Err(IntakeError::Upload {
                status: status.as_u16(),
                message: Self::upload_error_message(&text),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Self::map_reqwest_error(e, config))?;

        let parsed: DetectResponse = serde_json::from_slice(&body)
            .map_err(|e| IntakeError::InvalidFormat(format!("检测响应不是有效 JSON：{}", e)))?;

        let bytes = Self::parse_base64_with_limit(&parsed.image_base64, config.max_file_size)?;
        Self::validate_image_signature(&bytes)?;

        log::debug!("✅ 检测结果解码完成 - {} bytes", bytes.len());

        Ok(DetectionResult {
            bytes: bytes.into(),
        })
    }

    fn build_http_client(config: &IntakeConfig) -> Result<reqwest::Client, IntakeError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        builder
            .build()
            .map_err(|e| IntakeError::Network(format!("无法创建 HTTP 客户端：{}", e)))
    }

    /// 从错误响应正文中提取展示给日志的消息。
    fn upload_error_message(body: &str) -> String {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return UPLOAD_FAILED_FALLBACK.to_string();
        }

        match serde_json::from_str::<DetectErrorBody>(trimmed) {
            Ok(parsed) if !parsed.error.trim().is_empty() => parsed.error,
            _ => trimmed.to_string(),
        }
    }

    /// 统一映射 reqwest 错误到业务错误。
    fn map_reqwest_error(e: reqwest::Error, config: &IntakeConfig) -> IntakeError {
        let redacted = Self::redact_url_for_log(&config.endpoint);
        let err_msg = e.to_string().replace(config.endpoint.as_str(), &redacted);

        if e.is_timeout() {
            IntakeError::Timeout(format!(
                "上传超时（{}秒）",
                config.request_timeout_secs.unwrap_or_default()
            ))
        } else if e.is_connect() {
            IntakeError::Network(format!("无法连接：{}", err_msg))
        } else {
            IntakeError::Network(format!("请求失败：{}", err_msg))
        }
    }
}
