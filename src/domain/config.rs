//! 設定管理
//!
//! TOML設定ファイルの読み込みとDomain型への変換。

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::domain::{ColorBand, DomainError, DomainResult};

/// フレームソースの種別
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CaptureSource {
    /// 合成フレーム生成器（実キャプチャデバイス不要）
    #[default]
    Simulated,
}

/// 送信トランスポートの種別
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// シリアルポートスキャンによる実トランスポート
    #[default]
    Serial,
    /// ログ出力のみのモックトランスポート（開発・検証用）
    Mock,
}

/// アプリケーション設定のルート構造
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppConfig {
    /// キャプチャ設定
    pub capture: CaptureConfig,
    /// 検出設定
    pub detect: DetectConfig,
    /// チャネル通信設定
    pub communication: CommunicationConfig,
    /// 制御ループ設定
    pub control: ControlConfig,
}

/// キャプチャ設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CaptureConfig {
    /// フレームソース
    ///
    /// 選択肢: "simulated"
    pub source: CaptureSource,

    /// 目標キャプチャレート（フレーム/秒）
    ///
    /// デフォルト: 144
    pub target_fps: u32,

    /// フレーム幅（ピクセル）
    pub frame_width: u32,

    /// フレーム高さ（ピクセル）
    pub frame_height: u32,

    /// 合成シーン設定（source = "simulated" の場合のみ有効）
    pub sim: SimSceneConfig,
}

impl CaptureConfig {
    /// デフォルトの目標キャプチャレート
    pub const DEFAULT_TARGET_FPS: u32 = 144;
    /// デフォルトのフレーム幅
    pub const DEFAULT_FRAME_WIDTH: u32 = 1920;
    /// デフォルトのフレーム高さ
    pub const DEFAULT_FRAME_HEIGHT: u32 = 1080;

    /// フレーム間隔をDurationとして取得
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.target_fps.max(1)))
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            source: CaptureSource::default(),
            target_fps: Self::DEFAULT_TARGET_FPS,
            frame_width: Self::DEFAULT_FRAME_WIDTH,
            frame_height: Self::DEFAULT_FRAME_HEIGHT,
            sim: SimSceneConfig::default(),
        }
    }
}

/// 合成シーン設定
///
/// 模擬フレームソースが描画するターゲット矩形の配置。
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SimSceneConfig {
    /// ターゲット矩形の一辺（ピクセル）
    pub target_size: u32,

    /// フレーム中心からのターゲット中心オフセットX（ピクセル、±値）
    pub target_dx: i32,

    /// フレーム中心からのターゲット中心オフセットY（ピクセル、±値）
    pub target_dy: i32,
}

impl Default for SimSceneConfig {
    fn default() -> Self {
        Self {
            target_size: 12,
            target_dx: 20,
            target_dy: -10,
        }
    }
}

/// 検出設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DetectConfig {
    /// ROIの一辺（ピクセル）
    ///
    /// ROIは常にフレーム中心に配置される正方形。
    /// 注意: フレームサイズを超える場合は起動時にエラーになります
    pub roi_size: u32,

    /// 最小検出面積（ピクセル数）
    ///
    /// 候補領域の面積がこの値を**厳密に超える**場合のみ採用される
    /// （面積がちょうどこの値の候補は棄却）。
    pub min_target_area: u32,

    /// 膨張カーネルの一辺（ピクセル）
    pub dilate_kernel: u32,

    /// 膨張の反復回数（0 = 膨張なし）
    pub dilate_iterations: u32,

    /// カラーバンド1（包括HSVレンジ）
    pub band1: ColorBandConfig,

    /// カラーバンド2（包括HSVレンジ）
    ///
    /// 色相折り返し境界付近の色を偽陰性なしでカバーするため、
    /// 同一ターゲット色の2つ目の見え方を指定する。
    pub band2: ColorBandConfig,
}

impl DetectConfig {
    /// デフォルトのROIサイズ
    pub const DEFAULT_ROI_SIZE: u32 = 100;
    /// デフォルトの最小検出面積
    pub const DEFAULT_MIN_TARGET_AREA: u32 = 5;
    /// デフォルトの膨張カーネルサイズ
    pub const DEFAULT_DILATE_KERNEL: u32 = 2;
    /// デフォルトの膨張反復回数
    pub const DEFAULT_DILATE_ITERATIONS: u32 = 2;
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            roi_size: Self::DEFAULT_ROI_SIZE,
            min_target_area: Self::DEFAULT_MIN_TARGET_AREA,
            dilate_kernel: Self::DEFAULT_DILATE_KERNEL,
            dilate_iterations: Self::DEFAULT_DILATE_ITERATIONS,
            band1: ColorBandConfig {
                h_min: 145,
                h_max: 150,
                s_min: 115,
                s_max: 200,
                v_min: 125,
                v_max: 255,
            },
            band2: ColorBandConfig {
                h_min: 30,
                h_max: 31,
                s_min: 165,
                s_max: 255,
                v_min: 159,
                v_max: 255,
            },
        }
    }
}

/// カラーバンド設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ColorBandConfig {
    /// H（色相）の最小値
    ///
    /// OpenCV準拠: H [0-180]
    pub h_min: u8,

    /// H（色相）の最大値
    pub h_max: u8,

    /// S（彩度）の最小値
    pub s_min: u8,

    /// S（彩度）の最大値
    pub s_max: u8,

    /// V（明度）の最小値
    pub v_min: u8,

    /// V（明度）の最大値
    pub v_max: u8,
}

impl From<ColorBandConfig> for ColorBand {
    fn from(config: ColorBandConfig) -> Self {
        ColorBand::new(
            config.h_min,
            config.h_max,
            config.s_min,
            config.s_max,
            config.v_min,
            config.v_max,
        )
    }
}

/// チャネル通信設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CommunicationConfig {
    /// トランスポート
    ///
    /// 選択肢: "serial", "mock"
    pub transport: TransportKind,

    /// シンボルレート（ボー）
    pub baud_rate: u32,

    /// スキャンする最初のポート番号（昇順、最初に成功したポートを使用）
    pub scan_first: u8,

    /// スキャンする最後のポート番号（この番号を含む）
    pub scan_last: u8,

    /// 接続後の安定待ち時間（ミリ秒）
    pub settle_delay_ms: u64,

    /// 書き込みタイムアウト（ミリ秒）
    pub write_timeout_ms: u64,
}

impl CommunicationConfig {
    /// デフォルトのシンボルレート
    pub const DEFAULT_BAUD_RATE: u32 = 115_200;
    /// デフォルトのスキャン開始ポート番号
    pub const DEFAULT_SCAN_FIRST: u8 = 2;
    /// デフォルトのスキャン終了ポート番号
    pub const DEFAULT_SCAN_LAST: u8 = 10;
    /// デフォルトの安定待ち時間（ミリ秒）
    pub const DEFAULT_SETTLE_DELAY_MS: u64 = 2000;
    /// デフォルトの書き込みタイムアウト（ミリ秒）
    pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 100;

    /// 安定待ち時間をDurationとして取得
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// 書き込みタイムアウトをDurationとして取得
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    /// スキャン対象のポート名リストを昇順で生成
    pub fn candidate_ports(&self) -> Vec<String> {
        (self.scan_first..=self.scan_last).map(port_name).collect()
    }
}

#[cfg(windows)]
fn port_name(n: u8) -> String {
    format!("COM{}", n)
}

#[cfg(not(windows))]
fn port_name(n: u8) -> String {
    format!("/dev/ttyACM{}", n)
}

impl Default for CommunicationConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            baud_rate: Self::DEFAULT_BAUD_RATE,
            scan_first: Self::DEFAULT_SCAN_FIRST,
            scan_last: Self::DEFAULT_SCAN_LAST,
            settle_delay_ms: Self::DEFAULT_SETTLE_DELAY_MS,
            write_timeout_ms: Self::DEFAULT_WRITE_TIMEOUT_MS,
        }
    }
}

/// 制御ループ設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ControlConfig {
    /// イテレーション間の固定イールド時間（マイクロ秒）
    ///
    /// ホストCPUのビジースピンを避けるためだけの待機で、検出レートの
    /// 律速はフレームソース側。デフォルト: 1000（約1ms）
    pub yield_interval_us: u64,

    /// 統計情報の出力間隔（秒）
    pub stats_interval_sec: u64,
}

impl ControlConfig {
    /// デフォルトのイールド時間（マイクロ秒）
    pub const DEFAULT_YIELD_INTERVAL_US: u64 = 1000;
    /// デフォルトの統計出力間隔（秒）
    pub const DEFAULT_STATS_INTERVAL_SEC: u64 = 10;

    /// イールド時間をDurationとして取得
    pub fn yield_interval(&self) -> Duration {
        Duration::from_micros(self.yield_interval_us)
    }

    /// 統計出力間隔をDurationとして取得
    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_sec)
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            yield_interval_us: Self::DEFAULT_YIELD_INTERVAL_US,
            stats_interval_sec: Self::DEFAULT_STATS_INTERVAL_SEC,
        }
    }
}

impl AppConfig {
    /// TOMLファイルから設定を読み込む
    pub fn from_file<P: AsRef<Path>>(path: P) -> DomainResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DomainError::Configuration(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| DomainError::Configuration(format!("Failed to parse config file: {}", e)))
    }

    /// デフォルト設定をTOMLファイルに書き出す
    pub fn write_default<P: AsRef<Path>>(path: P) -> DomainResult<()> {
        let config = Self::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| DomainError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| DomainError::Configuration(format!("Failed to write config file: {}", e)))
    }

    /// 設定の妥当性を検証
    pub fn validate(&self) -> DomainResult<()> {
        // ROIの検証
        if self.detect.roi_size == 0 {
            return Err(DomainError::Configuration(
                "ROI size must be greater than 0".to_string(),
            ));
        }
        if self.detect.roi_size > self.capture.frame_width
            || self.detect.roi_size > self.capture.frame_height
        {
            return Err(DomainError::Configuration(format!(
                "ROI size {} exceeds frame dimensions {}x{}",
                self.detect.roi_size, self.capture.frame_width, self.capture.frame_height
            )));
        }

        // カラーバンドの検証
        for (name, band) in [("band1", &self.detect.band1), ("band2", &self.detect.band2)] {
            if band.h_min > 180 || band.h_max > 180 || band.h_min > band.h_max {
                return Err(DomainError::Configuration(format!(
                    "Invalid {} H range (must be 0-180, min <= max)",
                    name
                )));
            }
            if band.s_min > band.s_max || band.v_min > band.v_max {
                return Err(DomainError::Configuration(format!(
                    "Invalid {} S/V range (min must be <= max)",
                    name
                )));
            }
        }

        // 膨張カーネルの検証
        if self.detect.dilate_kernel == 0 {
            return Err(DomainError::Configuration(
                "Dilation kernel size must be greater than 0".to_string(),
            ));
        }

        // キャプチャレートの検証
        if self.capture.target_fps == 0 {
            return Err(DomainError::Configuration(
                "Target FPS must be greater than 0".to_string(),
            ));
        }

        // 通信設定の検証
        if self.communication.baud_rate == 0 {
            return Err(DomainError::Configuration(
                "Baud rate must be greater than 0".to_string(),
            ));
        }
        if self.communication.scan_first > self.communication.scan_last {
            return Err(DomainError::Configuration(
                "Port scan range is empty (scan_first > scan_last)".to_string(),
            ));
        }

        Ok(())
    }
}
