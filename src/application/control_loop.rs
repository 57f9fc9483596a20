//! 制御ループモジュール
//!
//! 単一スレッドの協調的な同期ループで知覚→作動パイプラインを駆動する。
//! フレーム取得 → ROI抽出 → 色分割 → マスク整形 → ターゲット選択 →
//! コマンド送信を1イテレーションとして、フレームソースが供給できる
//! 最大レートで回す。イテレーション間の固定イールドはCPUのビジー
//! スピンを避けるためだけのもので、検出レートの律速はフレームソース側。

use crate::application::shutdown::ShutdownFlag;
use crate::application::stats::{StatKind, StatsCollector};
use crate::domain::{encode_move, ChannelPort, ControlConfig, DomainResult, FrameSourcePort};
use crate::infrastructure::vision::ColorTargetDetector;
use std::time::{Duration, Instant};

/// 制御ループの状態
///
/// Uninitialized → Running → Stopped の一方向遷移。
/// 両バインダが成功した場合のみRunningに入る（失敗時はmain側で
/// 報告され、ループは構築されない）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// 構築済み、未実行
    Uninitialized,
    /// イテレーション実行中
    Running,
    /// 停止済み（リソース解放済み）
    Stopped,
}

/// 制御ループ実行コンテキスト
///
/// すべてのパイプライン段を単独で所有する。イテレーション間で共有される
/// 可変状態は統計のみで、検出設定は起動後不変。
pub struct ControlLoop<F, H>
where
    F: FrameSourcePort,
    H: ChannelPort,
{
    frames: F,
    channel: H,
    detector: ColorTargetDetector,
    yield_interval: Duration,
    stats: StatsCollector,
    state: LoopState,
}

impl<F, H> ControlLoop<F, H>
where
    F: FrameSourcePort,
    H: ChannelPort,
{
    /// 新しいControlLoopを作成
    ///
    /// バインダ成功済みの両リソースの所有権を受け取る。
    pub fn new(frames: F, channel: H, detector: ColorTargetDetector, config: &ControlConfig) -> Self {
        Self {
            frames,
            channel,
            detector,
            yield_interval: config.yield_interval(),
            stats: StatsCollector::new(config.stats_interval()),
            state: LoopState::Uninitialized,
        }
    }

    /// 現在の状態を取得
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// ループを実行する（ブロッキング）
    ///
    /// 停止フラグが立つまでイテレーションを繰り返し、停止時に
    /// リソースを解放してStoppedへ遷移する。1イテレーションの失敗で
    /// ループは止まらない（ログして続行）。
    pub fn run(&mut self, shutdown: &ShutdownFlag) -> DomainResult<()> {
        self.state = LoopState::Running;
        tracing::info!("Control loop running");

        while !shutdown.is_stop_requested() {
            self.iterate();
            // ビジースピン回避のための固定イールド
            std::thread::sleep(self.yield_interval);
        }

        tracing::info!("Stop requested, shutting down");
        self.release();
        Ok(())
    }

    /// 1イテレーション: 取得→検出→送信
    ///
    /// 1イテレーションにつき送信されるコマンドは最大1つ。
    fn iterate(&mut self) {
        let frame = match self.frames.latest_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                // 新しいフレームなし: 正常な定常状態
                return;
            }
            Err(e) => {
                tracing::debug!("Frame fetch failed, skipping iteration: {}", e);
                return;
            }
        };

        self.stats.record_frame();

        let detect_started = Instant::now();
        let offset = self.detector.detect(&frame);
        self.stats
            .record_duration(StatKind::Detect, detect_started.elapsed());

        // ターゲット不在なら送信なし（エラーではない）
        if let Some(offset) = offset {
            let command = encode_move(offset);
            let send_started = Instant::now();
            match self.channel.write(&command) {
                Ok(()) => {
                    self.stats.record_command();
                    self.stats
                        .record_duration(StatKind::Transmit, send_started.elapsed());
                    self.stats
                        .record_duration(StatKind::EndToEnd, frame.timestamp.elapsed());
                }
                Err(e) => {
                    // 失敗したコマンドは破棄される（再送・キューなし）
                    tracing::warn!("Command dropped: {}", e);
                }
            }
        }

        if self.stats.should_report() {
            self.stats.report_and_reset();
        }
    }

    /// リソースを解放してStoppedへ遷移
    ///
    /// フレームソース停止 → チャネルクローズの順。片方の失敗が
    /// もう片方の解放を妨げないよう個別にガードする。
    fn release(&mut self) {
        if let Err(e) = self.frames.stop() {
            tracing::warn!("Failed to stop frame source: {}", e);
        }
        if let Err(e) = self.channel.close() {
            tracing::warn!("Failed to close channel: {}", e);
        }
        self.state = LoopState::Stopped;
        tracing::info!("Control loop stopped");
    }

    /// 停止後にリソースを取り戻す（検証用）
    pub fn into_parts(self) -> (F, H) {
        (self.frames, self.channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DetectConfig, DomainError, Frame};
    use std::sync::{Arc, Mutex};

    // モック実装

    /// 用意した取得結果を順に返し、尽きたら停止フラグを立てるソース
    struct ScriptedFrameSource {
        script: Vec<DomainResult<Frame>>,
        shutdown: ShutdownFlag,
        stopped: bool,
    }

    impl FrameSourcePort for ScriptedFrameSource {
        fn latest_frame(&mut self) -> DomainResult<Option<Frame>> {
            if self.script.is_empty() {
                self.shutdown.request_stop();
                return Ok(None);
            }
            self.script.remove(0).map(Some)
        }

        fn stop(&mut self) -> DomainResult<()> {
            self.stopped = true;
            Ok(())
        }
    }

    struct RecordingChannel {
        sent: Arc<Mutex<Vec<Vec<u8>>>>,
        closed: bool,
        fail_writes: bool,
    }

    impl RecordingChannel {
        fn new(fail_writes: bool) -> Self {
            Self {
                sent: Arc::new(Mutex::new(Vec::new())),
                closed: false,
                fail_writes,
            }
        }
    }

    impl ChannelPort for RecordingChannel {
        fn write(&mut self, bytes: &[u8]) -> DomainResult<()> {
            if self.fail_writes {
                return Err(DomainError::Communication("Injected failure".to_string()));
            }
            self.sent.lock().unwrap().push(bytes.to_vec());
            Ok(())
        }

        fn close(&mut self) -> DomainResult<()> {
            self.closed = true;
            Ok(())
        }
    }

    /// band1既定レンジに入るターゲット色を描いたフレーム
    fn frame_with_target() -> Frame {
        let mut frame = Frame::new(vec![0u8; 200 * 200 * 3], 200, 200);
        for y in 95..105u32 {
            for x in 95..105u32 {
                let idx = ((y * 200 + x) * 3) as usize;
                frame.data[idx..idx + 3].copy_from_slice(&[200, 74, 187]);
            }
        }
        frame
    }

    fn make_loop(
        script: Vec<DomainResult<Frame>>,
        shutdown: &ShutdownFlag,
        fail_writes: bool,
    ) -> ControlLoop<ScriptedFrameSource, RecordingChannel> {
        let source = ScriptedFrameSource {
            script,
            shutdown: shutdown.clone(),
            stopped: false,
        };
        let channel = RecordingChannel::new(fail_writes);
        let mut config = ControlConfig::default();
        config.yield_interval_us = 10; // テストを高速化
        ControlLoop::new(source, channel, ColorTargetDetector::new(&DetectConfig::default()), &config)
    }

    #[test]
    fn test_loop_state_transitions() {
        let shutdown = ShutdownFlag::new();
        let mut control = make_loop(vec![], &shutdown, false);

        assert_eq!(control.state(), LoopState::Uninitialized);
        control.run(&shutdown).expect("Run should succeed");
        assert_eq!(control.state(), LoopState::Stopped);
    }

    #[test]
    fn test_one_command_per_frame_with_target() {
        let shutdown = ShutdownFlag::new();
        let frames = vec![Ok(frame_with_target()), Ok(frame_with_target())];
        let mut control = make_loop(frames, &shutdown, false);

        control.run(&shutdown).expect("Run should succeed");

        let (source, channel) = control.into_parts();
        assert!(source.stopped);
        assert!(channel.closed);
        // フレーム2枚 → コマンド2つ（各イテレーション最大1つ）
        assert_eq!(channel.sent.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_fetch_error_skips_iteration_and_loop_continues() {
        let shutdown = ShutdownFlag::new();
        let script = vec![
            Ok(frame_with_target()),
            Err(DomainError::Capture("Injected fetch failure".to_string())),
            Ok(frame_with_target()),
        ];
        let mut control = make_loop(script, &shutdown, false);

        // 取得失敗はそのイテレーションをスキップするだけで、後続の
        // フレームは通常どおり処理される
        control.run(&shutdown).expect("Run should succeed");
        assert_eq!(control.state(), LoopState::Stopped);

        let (source, channel) = control.into_parts();
        assert!(source.stopped);
        assert!(channel.closed);
        assert_eq!(channel.sent.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_empty_scene_sends_nothing() {
        let shutdown = ShutdownFlag::new();
        let frames = vec![Ok(Frame::new(vec![0u8; 200 * 200 * 3], 200, 200))];
        let mut control = make_loop(frames, &shutdown, false);

        control.run(&shutdown).expect("Run should succeed");

        let (_, channel) = control.into_parts();
        assert!(channel.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_write_failure_does_not_stop_loop() {
        let shutdown = ShutdownFlag::new();
        let frames = vec![
            Ok(frame_with_target()),
            Ok(frame_with_target()),
            Ok(frame_with_target()),
        ];
        let mut control = make_loop(frames, &shutdown, true);

        // 全書き込みが失敗してもループは全フレームを消費して正常停止する
        control.run(&shutdown).expect("Run should succeed");

        let (source, channel) = control.into_parts();
        assert!(source.stopped);
        assert!(channel.closed);
        assert!(channel.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_immediate_shutdown_releases_resources() {
        let shutdown = ShutdownFlag::new();
        shutdown.request_stop();

        let mut control = make_loop(vec![Ok(frame_with_target())], &shutdown, false);
        control.run(&shutdown).expect("Run should succeed");

        let (source, channel) = control.into_parts();
        // 1イテレーションも回らずに解放される
        assert!(source.stopped);
        assert!(channel.closed);
        assert!(channel.sent.lock().unwrap().is_empty());
    }
}
