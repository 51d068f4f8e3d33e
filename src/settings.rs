//! 设置文件加载。
//!
//! 设置文件为 JSON，字段与 `IntakeConfig` 一致，缺省字段保持默认值。

use std::fs;
use std::path::Path;

use crate::error::AppError;
use crate::intake::IntakeConfig;

/// 读取设置文件；`path` 为空时返回默认配置。
pub fn load_config(path: Option<&Path>) -> Result<IntakeConfig, AppError> {
    let Some(path) = path else {
        return Ok(IntakeConfig::default());
    };

    let content = fs::read_to_string(path)
        .map_err(|e| AppError::Settings(format!("读取设置文件 '{}' 失败: {}", path.display(), e)))?;

    let config = serde_json::from_str::<IntakeConfig>(&content)
        .map_err(|e| AppError::Settings(format!("解析设置文件失败: {}", e)))?;

    config.validate()?;
    log::info!("⚙️ 已加载设置文件: {}", path.display());

    Ok(config)
}

/// 在设置基础上应用命令行覆盖项。
pub fn apply_overrides(mut config: IntakeConfig, endpoint: Option<String>) -> Result<IntakeConfig, AppError> {
    if let Some(endpoint) = endpoint {
        config.endpoint = endpoint;
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::IntakeError;
    use std::io::Write;

    #[test]
    fn missing_path_yields_defaults() {
        let config = load_config(None).expect("defaults should load");
        assert_eq!(config.max_target_dimension, 1200);
    }

    #[test]
    fn settings_file_overrides_selected_fields() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file failed");
        write!(file, r#"{{ "jpeg_quality": 70, "request_timeout_secs": 30 }}"#)
            .expect("write settings failed");

        let config = load_config(Some(file.path())).expect("settings should load");
        assert_eq!(config.jpeg_quality, 70);
        assert_eq!(config.request_timeout_secs, Some(30));
        assert_eq!(config.upload_file_name, "upload.jpg");
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file failed");
        write!(file, r#"{{ "jpeg_quality": 0 }}"#).expect("write settings failed");

        let result = load_config(Some(file.path()));
        assert!(matches!(result, Err(AppError::Intake(IntakeError::Config(_)))));

        let mut broken = tempfile::NamedTempFile::new().expect("create temp file failed");
        write!(broken, "not json").expect("write settings failed");
        assert!(matches!(load_config(Some(broken.path())), Err(AppError::Settings(_))));
    }

    #[test]
    fn endpoint_override_is_validated() {
        let config = apply_overrides(IntakeConfig::default(), Some("http://10.0.0.5:9000/detect".into()))
            .expect("override should apply");
        assert_eq!(config.endpoint, "http://10.0.0.5:9000/detect");

        let result = apply_overrides(IntakeConfig::default(), Some("nope".into()));
        assert!(result.is_err());
    }
}
