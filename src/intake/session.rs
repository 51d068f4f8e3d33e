//! # 会话层
//!
//! ## 设计思路
//!
//! `IntakeSession` 对应一次用户会话中的全部可变状态：
//! 当前选中的文件与位图、展示槽、加载态、最近一次提示。
//! 每个用户动作（选图 / 检测）都在这里完成“执行 → 提交展示 → 提示”的闭环，
//! 错误不会越过单次动作向外传播，结束后总是回到空闲态。
//!
//! ## 实现思路
//!
//! - 选图：解码成功后，在同一把锁内替换“当前图片”并刷新展示槽。
//! - 检测：`LoadingGuard`（RAII）负责进入 / 退出加载态，任何返回路径都会清除。
//!   加载中再次触发检测会被 `IntakeError::Busy` 拒绝。
//! - 展示槽采用后写者胜出，写入代号可通过 `DisplaySlot::generation` 观测。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::config::NOTICE_DURATION_MS;
use super::display::{DisplayOrigin, DisplaySlot, DisplayedImage};
use super::notice::{Notice, ShownNotice};
use super::source::{DecodedBitmap, SourceFile, UploadPayload};
use super::{IntakeConfig, IntakeError, IntakeHandler};

/// 当前选中的图片。
struct CurrentImage {
    file: SourceFile,
    bitmap: DecodedBitmap,
}

/// 加载态守卫：构造时占用，析构时释放。
struct LoadingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> LoadingGuard<'a> {
    fn try_enter(flag: &'a AtomicBool) -> Result<Self, IntakeError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| IntakeError::Busy)?;
        Ok(Self { flag })
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// 图片接入会话。
pub struct IntakeSession {
    handler: IntakeHandler,
    display: DisplaySlot,
    current: Mutex<Option<CurrentImage>>,
    loading: AtomicBool,
    notice: Mutex<Option<ShownNotice>>,
}

impl IntakeSession {
    /// 使用默认配置创建会话。
    pub fn new() -> Result<Self, IntakeError> {
        Self::with_config(IntakeConfig::default())
    }

    /// 使用自定义配置创建会话。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use plate_intake::intake::{IntakeConfig, IntakeSession};
    ///
    /// let mut config = IntakeConfig::default();
    /// config.endpoint = "http://127.0.0.1:8000/detect".to_string();
    /// let session = IntakeSession::with_config(config)?;
    /// # Ok::<(), plate_intake::intake::IntakeError>(())
    /// ```
    pub fn with_config(config: IntakeConfig) -> Result<Self, IntakeError> {
        Ok(Self {
            handler: IntakeHandler::new(config)?,
            display: DisplaySlot::new(),
            current: Mutex::new(None),
            loading: AtomicBool::new(false),
            notice: Mutex::new(None),
        })
    }

    pub fn handler(&self) -> &IntakeHandler {
        &self.handler
    }

    pub fn display(&self) -> &DisplaySlot {
        &self.display
    }

    /// 当前是否有检测请求在途。
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// 当前选中图片的尺寸。
    pub fn current_dimensions(&self) -> Result<Option<(u32, u32)>, IntakeError> {
        Ok(self
            .lock_current()?
            .as_ref()
            .map(|c| (c.bitmap.width(), c.bitmap.height())))
    }

    /// 当前选中的文件。
    pub fn current_file(&self) -> Result<Option<SourceFile>, IntakeError> {
        Ok(self.lock_current()?.as_ref().map(|c| c.file.clone()))
    }

    /// 当前展示内容。
    pub fn displayed(&self) -> Result<Option<DisplayedImage>, IntakeError> {
        self.display.current()
    }

    /// 最近一次提示（不论是否已过期）。
    pub fn last_notice(&self) -> Result<Option<Notice>, IntakeError> {
        Ok(self.lock_notice()?.as_ref().map(|s| s.notice.clone()))
    }

    /// `now` 时刻仍应展示的提示。
    pub fn visible_notice_at(&self, now: Instant) -> Result<Option<Notice>, IntakeError> {
        Ok(self
            .lock_notice()?
            .as_ref()
            .filter(|s| s.is_visible_at(now))
            .map(|s| s.notice.clone()))
    }

    /// 读取本地文件并选中。
    pub async fn acquire_path(
        &self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<DisplayedImage, IntakeError> {
        match self.handler.open_source(path).await {
            Ok(file) => self.acquire(file).await,
            Err(err) => Err(self.fail(err)),
        }
    }

    /// 读取本地文件并生成上传载荷，不改变选中图片与展示；失败时给出通用失败提示。
    pub async fn prepare_path(
        &self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<UploadPayload, IntakeError> {
        let file = match self.handler.open_source(path).await {
            Ok(file) => file,
            Err(err) => return Err(self.fail(err)),
        };

        self.handler
            .prepare_upload(&file)
            .await
            .map_err(|err| self.fail(err))
    }

    /// 选图：解码并以原图刷新展示。
    ///
    /// 解码失败时保持原有选中图片与展示不变，并给出通用失败提示。
    pub async fn acquire(&self, file: SourceFile) -> Result<DisplayedImage, IntakeError> {
        let bitmap = match self.handler.decode(&file).await {
            Ok(bitmap) => bitmap,
            Err(err) => return Err(self.fail(err)),
        };

        let mut current = self.lock_current()?;
        let generation = self.display.replace(DisplayOrigin::Original, file.bytes.clone())?;
        *current = Some(CurrentImage { file, bitmap });
        drop(current);

        log::debug!("🖼️ 已展示原图 - generation={}", generation);
        self.displayed_generation(generation)
    }

    /// 检测：对当前选中的文件执行缩放上传，成功后以结果图刷新展示。
    pub async fn detect(&self) -> Result<DisplayedImage, IntakeError> {
        let selected = self.current_file()?;
        self.detect_file(selected).await
    }

    /// 检测指定文件；`None` 表示用户尚未选择图片，此时不发起任何网络请求。
    pub async fn detect_file(
        &self,
        selected: Option<SourceFile>,
    ) -> Result<DisplayedImage, IntakeError> {
        let Some(file) = selected else {
            return Err(self.fail(IntakeError::NoFileSelected));
        };

        let guard = match LoadingGuard::try_enter(&self.loading) {
            Ok(guard) => guard,
            Err(err) => return Err(self.fail(err)),
        };

        let total_start = Instant::now();
        let result = self.run_detection(&file).await;
        drop(guard);

        match result {
            Ok(generation) => {
                log::info!(
                    "✅ 检测完成 - 文件: {} total={}ms",
                    file.name,
                    total_start.elapsed().as_millis()
                );
                self.show(Notice::detection_complete(self.notice_duration()));
                self.displayed_generation(generation)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    async fn run_detection(&self, file: &SourceFile) -> Result<u64, IntakeError> {
        let config = self.handler.config_snapshot()?;

        let prepare_start = Instant::now();
        let payload = IntakeHandler::prepare_upload_with_config(file, config.clone()).await?;
        let prepare_elapsed = prepare_start.elapsed();

        let upload_start = Instant::now();
        let result = IntakeHandler::submit_with_config(&payload, &config).await?;
        let upload_elapsed = upload_start.elapsed();

        log::info!(
            "⏱️ 检测阶段耗时 - prepare={}ms upload={}ms",
            prepare_elapsed.as_millis(),
            upload_elapsed.as_millis()
        );

        self.display.replace(DisplayOrigin::Detection, result.bytes)
    }

    /// 记录错误细节并给出对应提示，返回原错误供调用方继续传递。
    fn fail(&self, err: IntakeError) -> IntakeError {
        match &err {
            IntakeError::NoFileSelected | IntakeError::Busy => {
                log::warn!("⚠️ {} [{}]", err, err.code());
            }
            _ => log::error!("❌ 操作失败 - stage={} code={}：{}", err.stage(), err.code(), err),
        }

        self.show(Notice::for_error(&err, self.notice_duration()));
        err
    }

    fn show(&self, notice: Notice) {
        log::info!("💬 {}", notice.message);
        match self.lock_notice() {
            Ok(mut guard) => *guard = Some(ShownNotice::new(notice, Instant::now())),
            Err(err) => log::warn!("⚠️ 提示写入失败：{}", err),
        }
    }

    fn notice_duration(&self) -> Duration {
        let millis = self
            .handler
            .config_snapshot()
            .map(|config| config.notice_duration_ms)
            .unwrap_or(NOTICE_DURATION_MS);
        Duration::from_millis(millis)
    }

    /// 取回指定代号的展示内容；若已被更新的写入覆盖，则返回最新内容。
    fn displayed_generation(&self, generation: u64) -> Result<DisplayedImage, IntakeError> {
        let current = self
            .display
            .current()?
            .ok_or_else(|| IntakeError::ResourceLimit("展示槽为空".to_string()))?;

        if current.generation != generation {
            log::debug!(
                "↪️ 展示已被更新的写入覆盖 - mine={} current={}",
                generation,
                current.generation
            );
        }
        Ok(current)
    }

    fn lock_current(&self) -> Result<std::sync::MutexGuard<'_, Option<CurrentImage>>, IntakeError> {
        self.current
            .lock()
            .map_err(|_| IntakeError::ResourceLimit("当前图片锁已中毒".to_string()))
    }

    fn lock_notice(&self) -> Result<std::sync::MutexGuard<'_, Option<ShownNotice>>, IntakeError> {
        self.notice
            .lock()
            .map_err(|_| IntakeError::ResourceLimit("提示状态锁已中毒".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::notice::{CHOOSE_IMAGE_FIRST, DETECTION_IN_PROGRESS, PROCESSING_FAILED};
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;

    fn jpeg_file(width: u32, height: u32) -> SourceFile {
        let img = ImageBuffer::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 128]));
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut cursor, ImageFormat::Jpeg)
            .expect("failed to encode test image");
        SourceFile::from_bytes("test.jpg", cursor.into_inner())
    }

    fn unreachable_config() -> IntakeConfig {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind failed");
        let port = listener.local_addr().expect("read local addr failed").port();
        drop(listener);

        let mut config = IntakeConfig::default();
        config.endpoint = format!("http://127.0.0.1:{}/detect", port);
        config
    }

    #[test]
    fn loading_guard_rejects_reentry_and_releases_on_drop() {
        let flag = AtomicBool::new(false);

        let guard = LoadingGuard::try_enter(&flag).expect("first enter should succeed");
        assert!(matches!(LoadingGuard::try_enter(&flag), Err(IntakeError::Busy)));
        drop(guard);

        assert!(!flag.load(Ordering::Acquire));
        assert!(LoadingGuard::try_enter(&flag).is_ok());
    }

    #[tokio::test]
    async fn acquire_displays_original() {
        let session = IntakeSession::new().expect("session init failed");
        let file = jpeg_file(64, 48);
        let original = file.bytes.clone();

        let shown = session.acquire(file).await.expect("acquire should succeed");

        assert_eq!(shown.origin, DisplayOrigin::Original);
        assert_eq!(shown.bytes, original);
        assert_eq!(session.current_dimensions().expect("dims"), Some((64, 48)));
    }

    #[tokio::test]
    async fn failed_acquire_keeps_previous_image() {
        let session = IntakeSession::new().expect("session init failed");
        session.acquire(jpeg_file(32, 32)).await.expect("acquire should succeed");
        let before = session.display().generation().expect("generation");

        let result = session
            .acquire(SourceFile::from_bytes("broken.png", b"\x89PNG\r\n\x1a\nbroken".to_vec()))
            .await;

        assert!(result.is_err_and(|e| e.is_unreadable_image()));
        assert_eq!(session.display().generation().expect("generation"), before);
        assert_eq!(session.current_dimensions().expect("dims"), Some((32, 32)));
        assert_eq!(
            session.last_notice().expect("notice").map(|n| n.message),
            Some(PROCESSING_FAILED.to_string())
        );
    }

    #[tokio::test]
    async fn detect_without_selection_prompts() {
        let session = IntakeSession::with_config(unreachable_config()).expect("session init failed");

        let result = session.detect().await;

        assert!(matches!(result, Err(IntakeError::NoFileSelected)));
        let notice = session.last_notice().expect("notice").expect("notice should be shown");
        assert!(notice.is_blocking());
        assert_eq!(notice.message, CHOOSE_IMAGE_FIRST);
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn detect_network_failure_clears_loading_and_keeps_display() {
        let session = IntakeSession::with_config(unreachable_config()).expect("session init failed");
        session.acquire(jpeg_file(40, 30)).await.expect("acquire should succeed");
        let before = session.displayed().expect("displayed").expect("slot filled");

        let result = session.detect().await;

        assert!(matches!(result, Err(IntakeError::Network(_))));
        assert!(!session.is_loading());
        let after = session.displayed().expect("displayed").expect("slot filled");
        assert_eq!(after.generation, before.generation);
        assert_eq!(after.origin, DisplayOrigin::Original);
        assert_eq!(
            session.last_notice().expect("notice").map(|n| n.message),
            Some(PROCESSING_FAILED.to_string())
        );
    }

    #[tokio::test]
    async fn detect_while_loading_is_rejected() {
        let session = IntakeSession::with_config(unreachable_config()).expect("session init failed");
        let _held = LoadingGuard::try_enter(&session.loading).expect("enter should succeed");

        let result = session.detect_file(Some(jpeg_file(16, 16))).await;

        assert!(matches!(result, Err(IntakeError::Busy)));
        assert_eq!(
            session.last_notice().expect("notice").map(|n| n.message),
            Some(DETECTION_IN_PROGRESS.to_string())
        );
    }

    #[tokio::test]
    async fn visible_notice_expires() {
        let session = IntakeSession::new().expect("session init failed");
        let _ = session.detect_file(None).await;
        let _ = session
            .acquire(SourceFile::from_bytes("x.txt", b"plain text".to_vec()))
            .await;

        let now = Instant::now();
        assert!(session.visible_notice_at(now).expect("notice").is_some());
        assert!(session
            .visible_notice_at(now + Duration::from_millis(2600))
            .expect("notice")
            .is_none());
    }
}
