mod application;
mod domain;
mod infrastructure;
mod logging;

use crate::application::control_loop::ControlLoop;
use crate::application::shutdown::ShutdownFlag;
use crate::domain::config::{AppConfig, TransportKind};
use crate::domain::ports::ChannelPort;
use crate::infrastructure::mock_channel::MockChannelAdapter;
use crate::infrastructure::serial_channel::SerialChannelAdapter;
use crate::infrastructure::sim_frame_source::SimulatedFrameSource;
use crate::infrastructure::vision::ColorTargetDetector;
use crate::logging::init_logging;
use std::path::PathBuf;

fn main() {
    // ログシステムの初期化（非同期ファイル出力）
    let log_dir = PathBuf::from("logs");
    let _guard = init_logging("info", false, Some(log_dir));
    // 注意: _guardはmain終了まで保持する必要がある（Dropでログスレッドが終了）

    tracing::info!("chromatrack starting...");

    match run() {
        Ok(_) => {
            tracing::info!("chromatrack terminated gracefully.");
        }
        Err(e) => {
            tracing::error!("Fatal error: {:?}", e);
            std::process::exit(1);
        }
    }
}

/// アプリケーションのメイン処理
fn run() -> anyhow::Result<()> {
    // 設定ファイルの読み込み（存在しない場合はデフォルト設定を使用）
    let config = match AppConfig::from_file("config.toml") {
        Ok(config) => {
            tracing::info!("Loaded configuration from config.toml");
            config
        }
        Err(e) => {
            tracing::warn!("Failed to load config.toml: {:?}, using defaults", e);
            AppConfig::default()
        }
    };

    config.validate()?;

    tracing::info!("Configuration validated successfully");
    tracing::info!(
        "Capture: {:?} {}x{} @ {} fps",
        config.capture.source,
        config.capture.frame_width,
        config.capture.frame_height,
        config.capture.target_fps
    );
    tracing::info!(
        "Detect: ROI={}px, min_area={}, dilate={}x{} x{}",
        config.detect.roi_size,
        config.detect.min_target_area,
        config.detect.dilate_kernel,
        config.detect.dilate_kernel,
        config.detect.dilate_iterations
    );

    // Ctrl+Cで協調的に停止
    let shutdown = ShutdownFlag::new();
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            tracing::info!("Interrupt received, requesting stop");
            shutdown.request_stop();
        })?;
    }

    // チャネルのバインド（失敗したら起動しない）
    tracing::info!("Binding {:?} channel...", config.communication.transport);
    let mut channel: Box<dyn ChannelPort> = match config.communication.transport {
        TransportKind::Serial => match SerialChannelAdapter::bind(&config.communication) {
            Ok(adapter) => {
                tracing::info!("Serial channel bound on {}", adapter.port_name());
                Box::new(adapter)
            }
            Err(e) => {
                tracing::error!("Initialization failed: {}", e);
                return Err(e.into());
            }
        },
        TransportKind::Mock => Box::new(MockChannelAdapter::new()),
    };

    // フレームソースの開始（失敗したらバインド済みチャネルを解放して終了）
    tracing::info!("Starting frame source...");
    let frames = match SimulatedFrameSource::start(&config.capture) {
        Ok(source) => source,
        Err(e) => {
            tracing::error!("Initialization failed: {}", e);
            if let Err(close_err) = channel.close() {
                tracing::warn!("Failed to close channel: {}", close_err);
            }
            return Err(e.into());
        }
    };

    let detector = ColorTargetDetector::new(&config.detect);

    tracing::info!("Starting control loop (single-threaded)...");

    // 制御ループの起動（ブロッキング）
    let mut control = ControlLoop::new(frames, channel, detector, &config.control);
    control.run(&shutdown)?;

    Ok(())
}
