//! 模擬フレームソース
//!
//! 実キャプチャデバイスなしでパイプライン全体を動かすための
//! 合成フレーム生成器。設定された目標レートでフレームを供給し、
//! band1既定レンジに入る色のターゲット矩形を描画する。

use crate::domain::{CaptureConfig, DomainError, DomainResult, Frame, FrameSourcePort};
use std::time::{Duration, Instant};

/// band1既定レンジ（H145-150）に入るターゲット色、BGR順
const TARGET_BGR: [u8; 3] = [200, 74, 187];

/// 背景色（無彩色、どのバンドにも一致しない）、BGR順
const BACKGROUND_BGR: [u8; 3] = [40, 40, 40];

/// 模擬フレームソース
///
/// `latest_frame()`は非ブロッキング: 前回のフレームから目標レート分の
/// 間隔が経過していなければ即座に`None`を返す。
pub struct SimulatedFrameSource {
    width: u32,
    height: u32,
    frame_interval: Duration,
    target_size: u32,
    target_dx: i32,
    target_dy: i32,
    last_frame_at: Option<Instant>,
    running: bool,
}

impl SimulatedFrameSource {
    /// キャプチャセッションを開始する（バインダ）
    ///
    /// # Returns
    /// - `Ok(SimulatedFrameSource)`: セッション開始
    /// - `Err(DomainError::Initialization)`: 設定が不正
    pub fn start(config: &CaptureConfig) -> DomainResult<Self> {
        if config.target_fps == 0 {
            return Err(DomainError::Initialization(
                "Target FPS must be greater than 0".to_string(),
            ));
        }
        if config.frame_width == 0 || config.frame_height == 0 {
            return Err(DomainError::Initialization(
                "Frame dimensions must be greater than 0".to_string(),
            ));
        }

        tracing::info!(
            "Simulated capture started: {}x{} @ {} fps",
            config.frame_width,
            config.frame_height,
            config.target_fps
        );

        Ok(Self {
            width: config.frame_width,
            height: config.frame_height,
            frame_interval: config.frame_interval(),
            target_size: config.sim.target_size,
            target_dx: config.sim.target_dx,
            target_dy: config.sim.target_dy,
            last_frame_at: None,
            running: true,
        })
    }

    /// 合成シーンを描画する
    fn paint(&self) -> Frame {
        let mut data = Vec::with_capacity((self.width * self.height * 3) as usize);
        for _ in 0..self.width * self.height {
            data.extend_from_slice(&BACKGROUND_BGR);
        }
        let mut frame = Frame::new(data, self.width, self.height);

        // フレーム中心 + 設定オフセットにターゲット矩形を置く
        let cx = self.width as i64 / 2 + self.target_dx as i64;
        let cy = self.height as i64 / 2 + self.target_dy as i64;
        let half = self.target_size as i64 / 2;

        for y in cy - half..cy - half + self.target_size as i64 {
            for x in cx - half..cx - half + self.target_size as i64 {
                if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
                    continue;
                }
                let idx = ((y as u32 * self.width + x as u32) * 3) as usize;
                frame.data[idx..idx + 3].copy_from_slice(&TARGET_BGR);
            }
        }
        frame
    }
}

impl FrameSourcePort for SimulatedFrameSource {
    fn latest_frame(&mut self) -> DomainResult<Option<Frame>> {
        if !self.running {
            return Ok(None);
        }

        let now = Instant::now();
        if let Some(last) = self.last_frame_at {
            if now.duration_since(last) < self.frame_interval {
                // 新しいフレームはまだない（ブロックしない）
                return Ok(None);
            }
        }

        self.last_frame_at = Some(now);
        Ok(Some(self.paint()))
    }

    fn stop(&mut self) -> DomainResult<()> {
        if self.running {
            self.running = false;
            tracing::info!("Simulated capture stopped");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::DetectConfig;
    use crate::infrastructure::vision::ColorTargetDetector;

    fn small_config() -> CaptureConfig {
        let mut config = CaptureConfig::default();
        config.frame_width = 200;
        config.frame_height = 200;
        config
    }

    #[test]
    fn test_start_rejects_zero_fps() {
        let mut config = small_config();
        config.target_fps = 0;
        assert!(SimulatedFrameSource::start(&config).is_err());
    }

    #[test]
    fn test_latest_frame_paces_to_target_rate() {
        let mut source = SimulatedFrameSource::start(&small_config()).expect("Start should succeed");

        let first = source.latest_frame().expect("Fetch should succeed");
        assert!(first.is_some());

        // 直後の呼び出しはフレーム間隔内なのでNone
        let second = source.latest_frame().expect("Fetch should succeed");
        assert!(second.is_none());
    }

    #[test]
    fn test_stopped_source_yields_no_frames() {
        let mut source = SimulatedFrameSource::start(&small_config()).expect("Start should succeed");
        source.stop().expect("Stop should succeed");
        assert!(source.latest_frame().expect("Fetch should succeed").is_none());
        // stopは冪等
        assert!(source.stop().is_ok());
    }

    #[test]
    fn test_painted_target_is_detectable() {
        let mut source = SimulatedFrameSource::start(&small_config()).expect("Start should succeed");
        let frame = source
            .latest_frame()
            .expect("Fetch should succeed")
            .expect("First frame should exist");
        assert!(frame.is_well_formed());

        // 既定バンドの検出器で合成ターゲットが見つかる
        let detector = ColorTargetDetector::new(&DetectConfig::default());
        let offset = detector.detect(&frame).expect("Target should be detected");

        // ターゲット中心は中心+(20,-10)、矩形12x12 → ROIローカル(64,34)起点。
        // 既定の膨張（2x2カーネル2回、下右方向に2px）で(64,34)起点の14x14、
        // 上辺中央(71,34) → (21,-16)
        assert_eq!(offset, crate::domain::AimOffset::new(21, -16));
    }
}
