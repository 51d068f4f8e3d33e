//! # 展示槽模块
//!
//! ## 设计思路
//!
//! 当前展示的图片只有一份，由 `DisplaySlot` 独占持有。
//! 任何完成的操作（选图、检测返回）都以“整体替换”的方式提交，
//! 并拿到单调递增的代号（generation），使“后写者胜出”成为显式、可测试的行为。
//!
//! ## 实现思路
//!
//! - `Mutex<Option<DisplayedImage>>` + 代号计数，替换在锁内一次完成。
//! - `replace_if_current` 提供比较后替换，供需要丢弃过期结果的调用方使用。

use bytes::Bytes;
use std::sync::Mutex;

use super::IntakeError;

/// 展示内容来源。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayOrigin {
    /// 用户选择的原图（全分辨率）。
    Original,
    /// 检测服务返回的结果图。
    Detection,
}

/// 当前展示的图片。
#[derive(Debug, Clone)]
pub struct DisplayedImage {
    pub origin: DisplayOrigin,
    /// 编码后的图片字节，可直接写盘或交给渲染层。
    pub bytes: Bytes,
    /// 替换时分配的代号，越大越新。
    pub generation: u64,
}

#[derive(Debug, Default)]
struct SlotState {
    current: Option<DisplayedImage>,
    next_generation: u64,
}

/// 单写者展示槽。
#[derive(Debug, Default)]
pub struct DisplaySlot {
    state: Mutex<SlotState>,
}

impl DisplaySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// 整体替换当前展示内容，返回新代号。
    pub fn replace(&self, origin: DisplayOrigin, bytes: Bytes) -> Result<u64, IntakeError> {
        let mut state = self.lock()?;
        Ok(Self::commit(&mut state, origin, bytes))
    }

    /// 仅当当前代号仍为 `expected` 时替换；否则丢弃并返回 `None`。
    pub fn replace_if_current(
        &self,
        expected: u64,
        origin: DisplayOrigin,
        bytes: Bytes,
    ) -> Result<Option<u64>, IntakeError> {
        let mut state = self.lock()?;
        let current = state.current.as_ref().map(|c| c.generation).unwrap_or(0);
        if current != expected {
            log::debug!("🗑️ 丢弃过期展示结果 - expected={} current={}", expected, current);
            return Ok(None);
        }

        Ok(Some(Self::commit(&mut state, origin, bytes)))
    }

    /// 当前展示内容快照。
    pub fn current(&self) -> Result<Option<DisplayedImage>, IntakeError> {
        Ok(self.lock()?.current.clone())
    }

    /// 当前代号；尚未展示过任何内容时为 0。
    pub fn generation(&self) -> Result<u64, IntakeError> {
        Ok(self
            .lock()?
            .current
            .as_ref()
            .map(|c| c.generation)
            .unwrap_or(0))
    }

    fn commit(state: &mut SlotState, origin: DisplayOrigin, bytes: Bytes) -> u64 {
        state.next_generation = state.next_generation.saturating_add(1);
        let generation = state.next_generation;
        state.current = Some(DisplayedImage {
            origin,
            bytes,
            generation,
        });
        generation
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, SlotState>, IntakeError> {
        self.state
            .lock()
            .map_err(|_| IntakeError::ResourceLimit("展示槽锁已中毒".to_string()))
    }
}
