//! # 加载标志
//!
//! 同一会话同一时间只允许一个外部请求在途。
//!
//! - 获取使用 `compare_exchange`，已被占用时返回 `EditorError::Busy`。
//! - `LoadingGuard` 采用 RAII 模式：构造时占用，`Drop` 时释放，
//!   成功、失败、提前返回都会走到 `Drop`。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::EditorError;

#[derive(Debug, Clone, Default)]
pub struct LoadingFlag(Arc<AtomicBool>);

impl LoadingFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn try_acquire(&self) -> Result<LoadingGuard, EditorError> {
        self.0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| EditorError::Busy)?;
        log::debug!("⏳ 已占用加载标志");
        Ok(LoadingGuard(Arc::clone(&self.0)))
    }
}

/// 加载标志的 RAII 守卫
#[derive(Debug)]
pub struct LoadingGuard(Arc<AtomicBool>);

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
        log::debug!("✅ 已释放加载标志");
    }
}
