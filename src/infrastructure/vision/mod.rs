//! 色検出パイプライン
//!
//! ROI抽出 → HSV分割 → マスク整形 → ターゲット選択 の知覚パイプライン。
//! データは前方にのみ流れ、後段から前段へのフィードバックはない。

pub mod contour;
pub mod morphology;
pub mod region;
pub mod segment;

use crate::domain::{AimOffset, ColorBand, DetectConfig, Frame};

/// 色ターゲット検出器
///
/// 設定（ROIサイズ、2バンド、膨張パラメータ、面積ゲート）は
/// 起動後不変。検出器自体は状態を持たず、イテレーションごとに
/// フレームからオフセットを導出する。
pub struct ColorTargetDetector {
    roi_size: u32,
    bands: [ColorBand; 2],
    dilate_kernel: u32,
    dilate_iterations: u32,
    min_target_area: u32,
}

impl ColorTargetDetector {
    /// 設定から検出器を作成
    pub fn new(config: &DetectConfig) -> Self {
        Self {
            roi_size: config.roi_size,
            bands: [config.band1.clone().into(), config.band2.clone().into()],
            dilate_kernel: config.dilate_kernel,
            dilate_iterations: config.dilate_iterations,
            min_target_area: config.min_target_area,
        }
    }

    /// フレームから照準オフセットを導出する
    ///
    /// ターゲット不在（ROI切り出し不可、候補なし、面積ゲート不通過）は
    /// すべて `None`。正常系の定常状態であり、エラーではない。
    pub fn detect(&self, frame: &Frame) -> Option<AimOffset> {
        let roi = match region::extract_centered(frame, self.roi_size) {
            Some(roi) => roi,
            None => {
                tracing::debug!(
                    "ROI {}x{} not extractable from {}x{} frame, skipping iteration",
                    self.roi_size,
                    self.roi_size,
                    frame.width,
                    frame.height
                );
                return None;
            }
        };

        // バンドごとにマスク生成と膨張を行い、その後OR結合する
        let mask1 = morphology::dilate(
            &segment::band_mask(&roi, &self.bands[0]),
            self.dilate_kernel,
            self.dilate_iterations,
        );
        let mask2 = morphology::dilate(
            &segment::band_mask(&roi, &self.bands[1]),
            self.dilate_kernel,
            self.dilate_iterations,
        );
        let combined = segment::combine_or(&mask1, &mask2);

        let blobs = contour::find_blobs(&combined);
        contour::select_target(&blobs, self.min_target_area, self.roi_size)
    }
}
