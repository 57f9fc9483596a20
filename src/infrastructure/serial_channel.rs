//! シリアルチャネルアダプタ
//!
//! serialportを使用したアクチュエータとの通信実装。
//! バインダは候補ポートを昇順に試行し、最初に成功したポートを使用する。
//! 候補が尽きた場合は初期化エラー（制御ループはRunningに入らない）。

use crate::domain::{ChannelPort, CommunicationConfig, DomainError, DomainResult};
use serialport::SerialPort;
use std::io::Write;

/// シリアルチャネルアダプタ
///
/// close()後のハンドルは`None`になり、以降のwriteは通信エラー。
pub struct SerialChannelAdapter {
    port: Option<Box<dyn SerialPort>>,
    port_name: String,
}

impl SerialChannelAdapter {
    /// 候補ポートのスキャンでチャネルを確立する
    ///
    /// # Arguments
    /// - `config`: スキャン範囲・ボーレート・安定待ち時間
    ///
    /// # Returns
    /// - `Ok(SerialChannelAdapter)`: 最初に開けたポートで確立
    /// - `Err(DomainError::Initialization)`: 全候補で失敗
    ///
    /// # 設計ノート
    /// 接続直後はデバイス側のリセットが完了していないことがあるため、
    /// 設定された安定待ち時間を挟んでから使用可能とする。
    pub fn bind(config: &CommunicationConfig) -> DomainResult<Self> {
        for name in config.candidate_ports() {
            match serialport::new(&name, config.baud_rate)
                .timeout(config.write_timeout())
                .open()
            {
                Ok(port) => {
                    tracing::info!("Connected to {} at {} baud", name, config.baud_rate);
                    std::thread::sleep(config.settle_delay());
                    return Ok(Self {
                        port: Some(port),
                        port_name: name,
                    });
                }
                Err(e) => {
                    tracing::debug!("Port {} unavailable: {}", name, e);
                }
            }
        }

        Err(DomainError::Initialization(format!(
            "No serial endpoint found (scanned ports {}..={})",
            config.scan_first, config.scan_last
        )))
    }

    /// 使用中のポート名を取得
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl ChannelPort for SerialChannelAdapter {
    /// コマンドバイト列を送信
    ///
    /// 失敗は呼び出し側でログされ、コマンドは破棄される（再送なし）。
    fn write(&mut self, bytes: &[u8]) -> DomainResult<()> {
        let port = self.port.as_mut().ok_or_else(|| {
            DomainError::Communication(format!("Channel {} already closed", self.port_name))
        })?;

        port.write_all(bytes)
            .and_then(|_| port.flush())
            .map_err(|e| {
                DomainError::Communication(format!(
                    "Serial write failed on {}: {}",
                    self.port_name, e
                ))
            })
    }

    /// チャネルを閉じる（冪等、ハンドルのDropでOS側が解放）
    fn close(&mut self) -> DomainResult<()> {
        if self.port.take().is_some() {
            tracing::info!("Closed serial channel {}", self.port_name);
        }
        Ok(())
    }
}
