//! 停止フラグ（Application層）
//!
//! オペレータ割り込み（Ctrl-C）と制御ループの間で共有される停止要求。
//! `Arc<AtomicBool>`を使用したロックフリー設計により、
//! 制御ループは数CPUサイクルで状態を確認できます。

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// 停止フラグ（シグナルハンドラと制御ループで共有、ロックフリー）
///
/// 外部から起こせる唯一の状態遷移で、Running → Stopped の
/// グレースフル停止を要求する。進行中のイテレーションは破棄されない。
#[derive(Clone)]
pub struct ShutdownFlag {
    requested: Arc<AtomicBool>,
}

impl ShutdownFlag {
    /// 新しいShutdownFlagを作成（停止未要求の状態）
    pub fn new() -> Self {
        Self {
            requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 停止を要求する（シグナルハンドラから呼ばれる）
    pub fn request_stop(&self) {
        self.requested.store(true, Ordering::Relaxed);
    }

    /// 停止が要求されたかを確認（ロックフリー、超高速）
    #[inline]
    pub fn is_stop_requested(&self) -> bool {
        self.requested.load(Ordering::Relaxed)
    }
}

impl Default for ShutdownFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_flag_starts_clear() {
        let flag = ShutdownFlag::new();
        assert!(!flag.is_stop_requested());
    }

    #[test]
    fn test_shutdown_flag_request_is_visible_through_clones() {
        let flag = ShutdownFlag::new();
        let clone = flag.clone();

        clone.request_stop();
        assert!(flag.is_stop_requested());
        assert!(clone.is_stop_requested());
    }
}
