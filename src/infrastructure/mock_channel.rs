//! モックチャネルアダプタ
//!
//! テスト・開発用のチャネル実装。送信データを共有ログに記録し、
//! 実際のシリアル送信は行わない。

use crate::domain::{parse_move, ChannelPort, DomainError, DomainResult};
use std::sync::{Arc, Mutex};

/// モックチャネルアダプタ
pub struct MockChannelAdapter {
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    connected: bool,
}

impl MockChannelAdapter {
    /// 新しいモックチャネルアダプタを作成
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            connected: true,
        }
    }

    /// 送信ログへの共有ハンドルを取得（検証用）
    pub fn sent_log(&self) -> Arc<Mutex<Vec<Vec<u8>>>> {
        Arc::clone(&self.sent)
    }
}

impl Default for MockChannelAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelPort for MockChannelAdapter {
    fn write(&mut self, bytes: &[u8]) -> DomainResult<()> {
        if !self.connected {
            return Err(DomainError::Communication(
                "Mock channel already closed".to_string(),
            ));
        }

        match parse_move(bytes) {
            Some(offset) => {
                tracing::debug!("MockChannel: MOVE dx={} dy={}", offset.dx, offset.dy)
            }
            None => tracing::debug!("MockChannel: {} raw bytes", bytes.len()),
        }

        self.sent
            .lock()
            .map_err(|_| DomainError::Communication("Sent log poisoned".to_string()))?
            .push(bytes.to_vec());
        Ok(())
    }

    fn close(&mut self) -> DomainResult<()> {
        if self.connected {
            self.connected = false;
            tracing::info!("MockChannel: Closed");
        }
        Ok(())
    }
}
